//! Option document parser.
//!
//! Options are supplied as a TOML document. Dotted keys may be written
//! quoted (`"server.is-hosted" = true`) or as nested tables
//! (`[server]` / `is-hosted = true`); both flatten to the same key.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::schema::{self, OptionDefault, OptionKind};

/// Errors raised while loading or updating options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown config option: {0}")]
    UnknownOption(String),

    #[error("config option {key} expects a {expected} value")]
    WrongKind { key: String, expected: &'static str },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// A scalar option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl ConfigValue {
    fn kind(&self) -> OptionKind {
        match self {
            ConfigValue::Bool(_) => OptionKind::Bool,
            ConfigValue::Int(_) => OptionKind::Int,
            ConfigValue::Str(_) => OptionKind::String,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Int(i) => write!(f, "{i}"),
            ConfigValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Str(s.to_string())
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Int(i)
    }
}

/// The full option set seen by one reconciliation pass.
///
/// Always holds every declared option that has a value: schema defaults
/// are filled in for anything the document leaves out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigOptions {
    values: BTreeMap<String, ConfigValue>,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        let values = schema::OPTIONS
            .iter()
            .filter_map(|spec| {
                let value = match spec.default {
                    OptionDefault::Unset => return None,
                    OptionDefault::Str(s) => ConfigValue::Str(s.to_string()),
                    OptionDefault::Bool(b) => ConfigValue::Bool(b),
                    OptionDefault::Int(i) => ConfigValue::Int(i),
                };
                Some((spec.key.to_string(), value))
            })
            .collect();
        Self { values }
    }
}

impl ConfigOptions {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let options = Self::from_toml_str(&content)?;
        debug!(?path, count = options.values.len(), "config options loaded");
        Ok(options)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let table: toml::Table = toml::from_str(content)?;
        let mut flat = Vec::new();
        flatten("", &table, &mut flat);

        let mut options = Self::default();
        for (key, value) in flat {
            let value = match value {
                toml::Value::String(s) => ConfigValue::Str(s),
                toml::Value::Boolean(b) => ConfigValue::Bool(b),
                toml::Value::Integer(i) => ConfigValue::Int(i),
                _ => {
                    let expected = schema::lookup(&key)
                        .map(|spec| spec.kind.label())
                        .ok_or_else(|| ConfigError::UnknownOption(key.clone()))?;
                    return Err(ConfigError::WrongKind { key, expected });
                }
            };
            options.set(&key, value)?;
        }
        Ok(options)
    }

    /// Set a single option, validating it against the schema.
    pub fn set(&mut self, key: &str, value: impl Into<ConfigValue>) -> ConfigResult<()> {
        let spec =
            schema::lookup(key).ok_or_else(|| ConfigError::UnknownOption(key.to_string()))?;
        let value = value.into();
        if value.kind() != spec.kind {
            return Err(ConfigError::WrongKind {
                key: key.to_string(),
                expected: spec.kind.label(),
            });
        }
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Builder-style variant of [`ConfigOptions::set`].
    pub fn with(mut self, key: &str, value: impl Into<ConfigValue>) -> ConfigResult<Self> {
        self.set(key, value)?;
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// A string option, treating the empty string as unset.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(ConfigValue::Str(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key) {
            Some(ConfigValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut Vec<(String, toml::Value)>) {
    for (key, value) in table {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(inner) => flatten(&full, inner, out),
            other => out.push((full, other.clone())),
        }
    }
}
