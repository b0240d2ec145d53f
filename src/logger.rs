//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after server settings are loaded. A valid
//! `RUST_LOG` always wins; the configured level (`FENCESITE_LOG_LEVEL` or
//! `[server] log_level`) is used otherwise.

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Initialise the global tracing subscriber, writing to stderr.
pub fn init(level: &str) -> Result<(), AppError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(rust_log.as_deref(), level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(())
}

/// Pick the filter: `rust_log` when it parses, else `level`.
///
/// `level` takes full `EnvFilter` syntax, so `"debug"` and
/// `"info,fencesite=debug"` are both accepted. It is only validated when
/// `rust_log` does not apply.
pub fn build_filter(rust_log: Option<&str>, level: &str) -> Result<EnvFilter, AppError> {
    if let Some(filter) = rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
    {
        return Ok(filter);
    }

    if level.trim().is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    EnvFilter::try_new(level).map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))
}
