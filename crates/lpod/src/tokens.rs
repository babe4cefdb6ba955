//! Token client construction.
//!
//! The contracts client is only built when an action needs it, so a bad
//! proxy or CA setting cannot fail unrelated events.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::warn;

use lpo_actions::{ActionResult, ContractsClient, TokenService};
use lpo_core::schema::{CONTRACTS_CA, CONTRACTS_URL};
use lpo_core::{ConfigOptions, DEFAULT_CONTRACTS_URL};
use lpo_relations::ProxySettings;

/// Builds a [`TokenService`] from the current options.
pub trait TokenClientFactory {
    type Client: TokenService;

    fn build(&self, options: &ConfigOptions) -> ActionResult<Self::Client>;
}

/// Factory for the reqwest-backed [`ContractsClient`].
///
/// Proxies come from the `JUJU_CHARM_*` environment; `contracts.ca` is
/// trusted as an extra root when it decodes.
#[derive(Debug, Clone, Default)]
pub struct ContractsFactory {
    pub proxy: ProxySettings,
}

impl TokenClientFactory for ContractsFactory {
    type Client = ContractsClient;

    fn build(&self, options: &ConfigOptions) -> ActionResult<ContractsClient> {
        let base_url = options.get_str(CONTRACTS_URL).unwrap_or(DEFAULT_CONTRACTS_URL);
        let ca = options.get_str(CONTRACTS_CA).and_then(|encoded| {
            BASE64
                .decode(encoded.trim())
                .inspect_err(|e| warn!(error = %e, "contracts.ca is not valid base64; ignoring"))
                .ok()
        });
        let proxy = ProxySettings::resolve(&self.proxy);
        ContractsClient::new(base_url, proxy.as_ref(), ca.as_deref())
    }
}
