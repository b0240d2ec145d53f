//! Runtime configuration: the resolved record and the resolver that builds it.
//!
//! The record is produced by [`ConfigResolver`] from either a remote config
//! endpoint or local environment variables, cached for five minutes, and
//! shared as an immutable `Arc<AppConfig>`.

pub mod env;
pub mod remote;
pub mod resolver;
pub mod secret;

use serde::Serialize;

pub use env::{EnvSource, ProcessEnv};
pub use remote::{HttpRemoteConfig, RemoteConfig, RemoteConfigError, RemoteConfigSource};
pub use resolver::{Clock, ConfigResolver, SystemClock, CACHE_TTL};

/// Default SMTP submission port when none is configured.
pub const DEFAULT_SMTP_PORT: u16 = 587;
/// Default HTTP listen port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 3000;

/// Mail server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Fully-resolved runtime configuration.
///
/// Never patched in place: a refresh builds a new record and swaps it into
/// the cache wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the hosted data store (REST + auth).
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Elevated (service-role) key. `None` means only anonymous access.
    pub supabase_service_key: Option<String>,
    /// Direct Postgres connection string, given or derived from `supabase_url`.
    pub database_url: Option<String>,
    pub session_secret: String,
    pub stripe_public_key: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub smtp: SmtpConfig,
    /// HTTP listen port.
    pub port: u16,
    pub remote_config_url: Option<String>,
}

impl AppConfig {
    /// Key used against the data store: the elevated key when present,
    /// otherwise the anonymous one.
    pub fn data_store_key(&self) -> &str {
        self.supabase_service_key
            .as_deref()
            .unwrap_or(&self.supabase_anon_key)
    }

    pub fn has_elevated_credentials(&self) -> bool {
        self.supabase_service_key.is_some()
    }
}

/// Where the cached record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Remote,
    Local,
    None,
}

impl ConfigSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::Remote => "remote",
            ConfigSource::Local => "local",
            ConfigSource::None => "none",
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the resolver cache. Reading it never triggers I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigStatus {
    pub initialized: bool,
    pub source: ConfigSource,
    pub has_elevated_credentials: bool,
}

#[cfg(test)]
impl AppConfig {
    /// Minimal record for unit tests: no secrets, no external services.
    pub fn test_default() -> Self {
        Self {
            supabase_url: "http://localhost:0".into(),
            supabase_anon_key: "anon".into(),
            supabase_service_key: None,
            database_url: None,
            session_secret: "test-secret".into(),
            stripe_public_key: None,
            stripe_secret_key: None,
            smtp: SmtpConfig { host: None, port: DEFAULT_SMTP_PORT, user: None, password: None },
            port: DEFAULT_PORT,
            remote_config_url: None,
        }
    }
}
