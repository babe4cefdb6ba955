//! Option schema for the patch server.
//!
//! Every option the operator accepts is listed here with its kind and
//! default. Config documents are validated against this table, so an
//! option never reaches the environment mapper unless it is declared.

/// Scalar kind of a config option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Bool,
    Int,
}

impl OptionKind {
    pub fn label(&self) -> &'static str {
        match self {
            OptionKind::String => "string",
            OptionKind::Bool => "boolean",
            OptionKind::Int => "integer",
        }
    }
}

/// Default value of an option. `Unset` string options are simply absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionDefault {
    Unset,
    Str(&'static str),
    Bool(bool),
    Int(i64),
}

/// A single declared option.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub key: &'static str,
    pub kind: OptionKind,
    pub default: OptionDefault,
}

const fn opt(key: &'static str, kind: OptionKind, default: OptionDefault) -> OptionSpec {
    OptionSpec { key, kind, default }
}

pub const AUTH_BASIC_ENABLED: &str = "auth.basic.enabled";
pub const AUTH_SSO_ENABLED: &str = "auth.sso.enabled";
pub const AUTH_SSO_URL: &str = "auth.sso.url";
pub const CONTRACTS_ENABLED: &str = "contracts.enabled";
pub const CONTRACTS_URL: &str = "contracts.url";
pub const CONTRACTS_CA: &str = "contracts.ca";
pub const EXTERNAL_HOSTNAME: &str = "external_hostname";
pub const PATCH_CACHE_ENABLED: &str = "patch-cache.enabled";
pub const PATCH_CACHE_SIZE: &str = "patch-cache.cache-size";
pub const PATCH_CACHE_TTL: &str = "patch-cache.cache-ttl";
pub const PATCH_STORAGE_TYPE: &str = "patch-storage.type";
pub const PATCH_STORAGE_FILESYSTEM_PATH: &str = "patch-storage.filesystem-path";
pub const PATCH_STORAGE_POSTGRES_CONNECTION_STRING: &str =
    "patch-storage.postgres-connection-string";
pub const PATCH_SYNC_ENABLED: &str = "patch-sync.enabled";
pub const SERVER_BURST_LIMIT: &str = "server.burst-limit";
pub const SERVER_CONCURRENCY_LIMIT: &str = "server.concurrency-limit";
pub const SERVER_IS_HOSTED: &str = "server.is-hosted";
pub const SERVER_LOG_LEVEL: &str = "server.log-level";
pub const SERVER_URL_TEMPLATE: &str = "server.url-template";

/// All options, sorted by key.
pub const OPTIONS: &[OptionSpec] = &[
    opt(AUTH_BASIC_ENABLED, OptionKind::Bool, OptionDefault::Bool(false)),
    opt(AUTH_SSO_ENABLED, OptionKind::Bool, OptionDefault::Bool(false)),
    opt(AUTH_SSO_URL, OptionKind::String, OptionDefault::Unset),
    opt(CONTRACTS_CA, OptionKind::String, OptionDefault::Unset),
    opt(CONTRACTS_ENABLED, OptionKind::Bool, OptionDefault::Bool(false)),
    opt(CONTRACTS_URL, OptionKind::String, OptionDefault::Unset),
    opt(EXTERNAL_HOSTNAME, OptionKind::String, OptionDefault::Unset),
    opt(PATCH_CACHE_SIZE, OptionKind::Int, OptionDefault::Int(128)),
    opt(PATCH_CACHE_TTL, OptionKind::String, OptionDefault::Str("1h")),
    opt(PATCH_CACHE_ENABLED, OptionKind::Bool, OptionDefault::Bool(false)),
    opt(PATCH_STORAGE_FILESYSTEM_PATH, OptionKind::String, OptionDefault::Str("/srv/")),
    opt(PATCH_STORAGE_POSTGRES_CONNECTION_STRING, OptionKind::String, OptionDefault::Unset),
    opt(PATCH_STORAGE_TYPE, OptionKind::String, OptionDefault::Str("filesystem")),
    opt(PATCH_SYNC_ENABLED, OptionKind::Bool, OptionDefault::Bool(false)),
    opt(SERVER_BURST_LIMIT, OptionKind::Int, OptionDefault::Int(500)),
    opt(SERVER_CONCURRENCY_LIMIT, OptionKind::Int, OptionDefault::Int(50)),
    opt(SERVER_IS_HOSTED, OptionKind::Bool, OptionDefault::Bool(true)),
    opt(SERVER_LOG_LEVEL, OptionKind::String, OptionDefault::Str("info")),
    opt(SERVER_URL_TEMPLATE, OptionKind::String, OptionDefault::Unset),
];

/// Look up an option by key.
pub fn lookup(key: &str) -> Option<&'static OptionSpec> {
    OPTIONS.iter().find(|spec| spec.key == key)
}
