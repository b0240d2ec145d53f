//! Configuration resolution with a time-bounded cache.
//!
//! Order of preference on every [`ConfigResolver::resolve`] call:
//!
//! 1. cached record younger than [`CACHE_TTL`] (no I/O)
//! 2. remote config endpoint, when `CONFIG_API_URL` is set
//! 3. local environment variables
//!
//! A remote failure of any kind is logged and falls through to step 3. Only
//! a local environment missing the data-store URL or anonymous key is an
//! error for the caller.
//!
//! The cache slot sits behind a mutex that is never held across an await.
//! Concurrent callers that miss at the same time each perform their own
//! fetch; the last one to finish wins the slot.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use reqwest::Url;
use tracing::{debug, error, info, warn};

use crate::error::AppError;

use super::env::{EnvSource, ProcessEnv};
use super::remote::{HttpRemoteConfig, RemoteConfig, RemoteConfigError, RemoteConfigSource};
use super::{AppConfig, ConfigSource, ConfigStatus, DEFAULT_PORT, DEFAULT_SMTP_PORT, SmtpConfig, secret};

/// How long a resolved record is served from cache.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

const KEY_REMOTE_URL: &str = "CONFIG_API_URL";
const KEY_SUPABASE_URL: &str = "SUPABASE_URL";
const KEY_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
const KEYS_SUPABASE_SERVICE_KEY: &[&str] = &["SUPABASE_SERVICE_KEY", "SUPABASE_SERVICE_ROLE_KEY"];

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Monotonic time source for cache ageing.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// ── Cache slot ────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct CacheEntry {
    config: Option<Arc<AppConfig>>,
    built_at: Option<Instant>,
    source: ConfigSource,
}

impl CacheEntry {
    const EMPTY: CacheEntry = CacheEntry { config: None, built_at: None, source: ConfigSource::None };
}

// ── Resolver ──────────────────────────────────────────────────────────────────

/// Builds and caches the runtime [`AppConfig`].
///
/// All I/O and time are injected so tests control them without touching
/// process-global state.
pub struct ConfigResolver<R = HttpRemoteConfig, E = ProcessEnv, C = SystemClock> {
    remote: R,
    env: E,
    clock: C,
    cache: Mutex<CacheEntry>,
}

impl ConfigResolver {
    /// Resolver over the real process environment and a reqwest client.
    pub fn from_process(timeout_seconds: u64) -> Result<Self, AppError> {
        let remote = HttpRemoteConfig::new(timeout_seconds)
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(Self::new(remote, ProcessEnv, SystemClock))
    }
}

impl<R, E, C> ConfigResolver<R, E, C>
where
    R: RemoteConfigSource,
    E: EnvSource,
    C: Clock,
{
    pub fn new(remote: R, env: E, clock: C) -> Self {
        Self { remote, env, clock, cache: Mutex::new(CacheEntry::EMPTY) }
    }

    /// Return the cached record if fresh, otherwise rebuild it from the
    /// remote endpoint or the local environment.
    pub async fn resolve(&self) -> Result<Arc<AppConfig>, AppError> {
        if let Some(config) = self.cached() {
            debug!("serving cached config");
            return Ok(config);
        }

        if let Some(base_url) = self.env.get(KEY_REMOTE_URL) {
            match self.fetch_remote(&base_url).await {
                Ok(config) => {
                    info!(source = "remote", url = %base_url, "config resolved");
                    return Ok(self.store(config, ConfigSource::Remote));
                }
                Err(e) => {
                    warn!(source = "remote", url = %base_url, error = %e, "remote config unavailable, using local environment");
                }
            }
        }

        match self.build_local() {
            Ok(config) => {
                info!(source = "local", "config resolved");
                Ok(self.store(config, ConfigSource::Local))
            }
            Err(e) => {
                error!(source = "local", error = %e, "local config incomplete");
                Err(e)
            }
        }
    }

    /// Drop the cached record unconditionally.
    pub fn invalidate(&self) {
        *self.slot() = CacheEntry::EMPTY;
        debug!("config cache invalidated");
    }

    pub async fn force_refresh(&self) -> Result<Arc<AppConfig>, AppError> {
        self.invalidate();
        self.resolve().await
    }

    pub fn status(&self) -> ConfigStatus {
        let slot = self.slot();
        ConfigStatus {
            initialized: slot.config.is_some(),
            source: slot.source,
            has_elevated_credentials: slot
                .config
                .as_ref()
                .is_some_and(|c| c.has_elevated_credentials()),
        }
    }

    // ── internals ─────────────────────────────────────────────────────────────

    fn slot(&self) -> std::sync::MutexGuard<'_, CacheEntry> {
        // Every write replaces the whole entry, so a poisoned slot is still
        // a consistent one.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached(&self) -> Option<Arc<AppConfig>> {
        let slot = self.slot();
        match (&slot.config, slot.built_at) {
            (Some(config), Some(built_at))
                if self.clock.now().saturating_duration_since(built_at) < CACHE_TTL =>
            {
                Some(Arc::clone(config))
            }
            _ => None,
        }
    }

    fn store(&self, config: AppConfig, source: ConfigSource) -> Arc<AppConfig> {
        let config = Arc::new(config);
        *self.slot() = CacheEntry {
            config: Some(Arc::clone(&config)),
            built_at: Some(self.clock.now()),
            source,
        };
        config
    }

    async fn fetch_remote(&self, base_url: &str) -> Result<AppConfig, RemoteConfigError> {
        let remote = self.remote.fetch(base_url).await?;
        self.build_from_remote(remote, base_url)
    }

    fn build_from_remote(&self, remote: RemoteConfig, base_url: &str) -> Result<AppConfig, RemoteConfigError> {
        let supabase_url = non_empty(remote.supabase_url);
        let supabase_anon_key = non_empty(remote.supabase_anon_key);
        let (supabase_url, supabase_anon_key) = match (supabase_url, supabase_anon_key) {
            (Some(url), Some(key)) => (url, key),
            (url, key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push("supabase_url");
                }
                if key.is_none() {
                    missing.push("supabase_anon_key");
                }
                return Err(RemoteConfigError::MissingFields(missing));
            }
        };

        Ok(AppConfig {
            database_url: derive_database_url(&supabase_url),
            supabase_service_key: non_empty(remote.supabase_service_key),
            session_secret: non_empty(remote.session_secret).unwrap_or_else(secret::generate),
            stripe_public_key: non_empty(remote.stripe_public_key),
            stripe_secret_key: non_empty(remote.stripe_secret_key),
            smtp: SmtpConfig {
                host: non_empty(remote.smtp_host),
                port: remote.smtp_port.unwrap_or(DEFAULT_SMTP_PORT),
                user: non_empty(remote.smtp_user),
                password: non_empty(remote.smtp_password),
            },
            port: self.listen_port(),
            remote_config_url: Some(base_url.to_string()),
            supabase_url,
            supabase_anon_key,
        })
    }

    fn build_local(&self) -> Result<AppConfig, AppError> {
        let supabase_url = self.env.get(KEY_SUPABASE_URL);
        let supabase_anon_key = self.env.get(KEY_SUPABASE_ANON_KEY);
        let (supabase_url, supabase_anon_key) = match (supabase_url, supabase_anon_key) {
            (Some(url), Some(key)) => (url, key),
            (url, key) => {
                let missing: Vec<&str> = [(KEY_SUPABASE_URL, url.is_none()), (KEY_SUPABASE_ANON_KEY, key.is_none())]
                    .into_iter()
                    .filter_map(|(name, absent)| absent.then_some(name))
                    .collect();
                return Err(AppError::Config(format!(
                    "missing required configuration: {}",
                    missing.join(", ")
                )));
            }
        };

        let smtp_port = match self.env.get("SMTP_PORT") {
            Some(raw) => raw.parse::<u16>().unwrap_or_else(|_| {
                warn!(value = %raw, "SMTP_PORT is not a valid port, using {DEFAULT_SMTP_PORT}");
                DEFAULT_SMTP_PORT
            }),
            None => DEFAULT_SMTP_PORT,
        };

        Ok(AppConfig {
            supabase_url,
            supabase_anon_key,
            supabase_service_key: self.env.first_of(KEYS_SUPABASE_SERVICE_KEY),
            database_url: self.env.get("DATABASE_URL"),
            session_secret: self.env.get("SESSION_SECRET").unwrap_or_else(secret::generate),
            stripe_public_key: self.env.get("STRIPE_PUBLIC_KEY"),
            stripe_secret_key: self.env.get("STRIPE_SECRET_KEY"),
            smtp: SmtpConfig {
                host: self.env.get("SMTP_HOST"),
                port: smtp_port,
                user: self.env.get("SMTP_USER"),
                password: self.env.get("SMTP_PASSWORD"),
            },
            port: self.listen_port(),
            remote_config_url: self.env.get(KEY_REMOTE_URL),
        })
    }

    fn listen_port(&self) -> u16 {
        match self.env.get("PORT") {
            Some(raw) => raw.parse::<u16>().unwrap_or_else(|_| {
                warn!(value = %raw, "PORT is not a valid port, using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Direct Postgres connection string for a data-store URL.
///
/// Hosted projects (`https://<ref>.supabase.co`) map to
/// `db.<ref>.supabase.co`; any other host is used as-is.
pub fn derive_database_url(supabase_url: &str) -> Option<String> {
    let url = Url::parse(supabase_url).ok()?;
    let host = url.host_str()?;
    let db_host = match host.strip_suffix(".supabase.co") {
        Some(project_ref) if !project_ref.is_empty() && !project_ref.contains('.') => {
            format!("db.{project_ref}.supabase.co")
        }
        _ => host.to_string(),
    };
    Some(format!("postgresql://postgres@{db_host}:5432/postgres"))
}
