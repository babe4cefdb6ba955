//! Option → environment variable mapping.
//!
//! The patch server reads its settings from `LP_*` variables. Option keys
//! map deterministically: `patch-storage.type` → `LP_PATCH_STORAGE_TYPE`.

use std::collections::BTreeMap;

use crate::config::ConfigOptions;

/// Namespace token prefixed to every variable.
pub const ENV_PREFIX: &str = "LP_";

/// Values computed outside the option set, keyed by final variable name.
pub type EnvOverrides = BTreeMap<String, String>;

/// Derive the variable name for an option key.
pub fn env_key(option_key: &str) -> String {
    let mut key = String::with_capacity(ENV_PREFIX.len() + option_key.len());
    key.push_str(ENV_PREFIX);
    for c in option_key.chars() {
        match c {
            '-' | '.' => key.push('_'),
            c => key.extend(c.to_uppercase()),
        }
    }
    key
}

/// Map options plus overrides into the workload environment.
///
/// Overrides win over same-named derived keys.
pub fn map_config_to_env(
    options: &ConfigOptions,
    overrides: &EnvOverrides,
) -> BTreeMap<String, String> {
    let mut env: BTreeMap<String, String> = options
        .iter()
        .map(|(key, value)| (env_key(key), value.to_string()))
        .collect();
    env.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;

    #[test]
    fn key_mapping() {
        assert_eq!(env_key("a-b.c"), "LP_A_B_C");
        assert_eq!(
            env_key("patch-storage.postgres-connection-string"),
            "LP_PATCH_STORAGE_POSTGRES_CONNECTION_STRING"
        );
        assert_eq!(env_key("external_hostname"), "LP_EXTERNAL_HOSTNAME");
    }

    #[test]
    fn every_option_is_mapped() {
        let options = ConfigOptions::default()
            .with(SERVER_URL_TEMPLATE, "http://localhost/{filename}")
            .unwrap();
        let env = map_config_to_env(&options, &EnvOverrides::new());

        assert_eq!(env.len(), options.iter().count());
        assert_eq!(env["LP_SERVER_URL_TEMPLATE"], "http://localhost/{filename}");
        assert_eq!(env["LP_SERVER_IS_HOSTED"], "true");
        assert_eq!(env["LP_PATCH_CACHE_CACHE_SIZE"], "128");
    }

    #[test]
    fn overrides_take_precedence() {
        let options = ConfigOptions::default()
            .with(PATCH_STORAGE_POSTGRES_CONNECTION_STRING, "postgres://from-config")
            .unwrap();
        let mut overrides = EnvOverrides::new();
        overrides.insert(
            "LP_PATCH_STORAGE_POSTGRES_CONNECTION_STRING".to_string(),
            "postgresql://override".to_string(),
        );
        overrides.insert("LP_SERVER_IS_LEADER".to_string(), "true".to_string());

        let env = map_config_to_env(&options, &overrides);
        assert_eq!(env["LP_PATCH_STORAGE_POSTGRES_CONNECTION_STRING"], "postgresql://override");
        assert_eq!(env["LP_SERVER_IS_LEADER"], "true");
    }
}
