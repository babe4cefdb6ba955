//! Outbound proxy settings for calls to the contracts service.

use serde::{Deserialize, Serialize};

const ENV_HTTP_PROXY: &str = "JUJU_CHARM_HTTP_PROXY";
const ENV_HTTPS_PROXY: &str = "JUJU_CHARM_HTTPS_PROXY";
const ENV_NO_PROXY: &str = "JUJU_CHARM_NO_PROXY";

/// Proxy configuration. Empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    pub http_proxy: String,
    pub https_proxy: String,
    pub no_proxy: String,
}

impl ProxySettings {
    /// Merge explicit settings with the model proxy environment.
    ///
    /// Each field falls back to its environment variable independently.
    /// Returns `None` when every field ends up empty.
    pub fn resolve(explicit: &ProxySettings) -> Option<Self> {
        Self::resolve_with(explicit, |key| std::env::var(key).ok())
    }

    /// Like [`ProxySettings::resolve`] with a custom environment lookup.
    pub fn resolve_with(
        explicit: &ProxySettings,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<Self> {
        let pick = |value: &str, key: &str| {
            if value.is_empty() {
                lookup(key).unwrap_or_default()
            } else {
                value.to_string()
            }
        };
        let settings = Self {
            http_proxy: pick(&explicit.http_proxy, ENV_HTTP_PROXY),
            https_proxy: pick(&explicit.https_proxy, ENV_HTTPS_PROXY),
            no_proxy: pick(&explicit.no_proxy, ENV_NO_PROXY),
        };
        if settings.is_empty() {
            None
        } else {
            Some(settings)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.http_proxy.is_empty() && self.https_proxy.is_empty() && self.no_proxy.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_empty_resolves_to_none() {
        assert!(ProxySettings::resolve_with(&ProxySettings::default(), |_| None).is_none());
    }

    #[test]
    fn explicit_values_win_over_environment() {
        let explicit = ProxySettings {
            http_proxy: "http://explicit:3128".into(),
            ..Default::default()
        };
        let resolved = ProxySettings::resolve_with(&explicit, |key| match key {
            ENV_HTTP_PROXY => Some("http://env:3128".into()),
            ENV_NO_PROXY => Some("localhost".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(resolved.http_proxy, "http://explicit:3128");
        assert_eq!(resolved.https_proxy, "");
        assert_eq!(resolved.no_proxy, "localhost");
    }
}
