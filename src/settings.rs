//! Server settings loaded from TOML with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `FENCESITE_HOST` and `FENCESITE_LOG_LEVEL` env overrides.
//! A missing file yields the built-in defaults; a malformed one is an error.
//!
//! Secrets and data-store credentials never live here. They are resolved at
//! runtime by [`crate::config::ConfigResolver`].

use std::{env, fs, io::ErrorKind, path::Path};

use serde::Deserialize;

use crate::error::AppError;

/// Fully-resolved server settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Interface the HTTP listener binds to. The port comes from the
    /// resolved runtime configuration (`PORT`).
    pub host: String,
    pub log_level: String,
    /// Timeout applied to every outbound HTTP request (remote config and
    /// data store).
    pub http_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            log_level: default_log_level(),
            http_timeout_seconds: default_http_timeout_seconds(),
        }
    }
}

/// Raw TOML shape, the `serde` target before resolution.
#[derive(Deserialize, Default)]
struct RawSettings {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    http: RawHttp,
}

#[derive(Deserialize)]
struct RawServer {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

impl Default for RawServer {
    fn default() -> Self {
        Self { host: default_host(), log_level: default_log_level() }
    }
}

#[derive(Deserialize)]
struct RawHttp {
    #[serde(default = "default_http_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawHttp {
    fn default() -> Self {
        Self { timeout_seconds: default_http_timeout_seconds() }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_http_timeout_seconds() -> u64 { 30 }

/// Load settings from `config/default.toml`, then apply env-var overrides.
pub fn load() -> Result<Settings, AppError> {
    let host_override = env::var("FENCESITE_HOST").ok();
    let log_level_override = env::var("FENCESITE_LOG_LEVEL").ok();
    load_from(
        Path::new("config/default.toml"),
        host_override.as_deref(),
        log_level_override.as_deref(),
    )
}

/// Internal loader. Accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    host_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Settings, AppError> {
    let parsed: RawSettings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw)
            .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?,
        Err(e) if e.kind() == ErrorKind::NotFound => RawSettings::default(),
        Err(e) => {
            return Err(AppError::Config(format!("cannot read {}: {e}", path.display())));
        }
    };

    let host = host_override
        .filter(|h| !h.is_empty())
        .map(ToString::to_string)
        .unwrap_or(parsed.server.host);
    let log_level = log_level_override
        .filter(|l| !l.is_empty())
        .map(ToString::to_string)
        .unwrap_or(parsed.server.log_level);

    Ok(Settings {
        host,
        log_level,
        http_timeout_seconds: parsed.http.timeout_seconds,
    })
}
