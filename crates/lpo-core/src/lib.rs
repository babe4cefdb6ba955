//! lpo-core — shared types for the livepatch operator.
//!
//! # Components
//!
//! - **`schema`** — the fixed option schema (keys, kinds, defaults)
//! - **`config`** — `ConfigOptions`, loaded from a TOML document
//! - **`env`** — option → `LP_*` environment mapping
//! - **`types`** — `UnitStatus` and shared constants

pub mod config;
pub mod env;
pub mod schema;
pub mod types;

pub use config::{ConfigError, ConfigOptions, ConfigValue};
pub use env::{ENV_PREFIX, EnvOverrides, map_config_to_env};
pub use types::*;
