//! fencesite backend entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load server settings
//!   3. Init logger once
//!   4. Resolve runtime config (remote endpoint or environment)
//!   5. Build the pricing store from the resolved credentials
//!   6. Serve HTTP until Ctrl-C

use std::sync::Arc;

use tracing::{info, warn};

use fencesite::config::ConfigResolver;
use fencesite::error::AppError;
use fencesite::pricing::{PostgrestStore, PricingService};
use fencesite::{http, logger, settings};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let settings = settings::load()?;
    logger::init(&settings.log_level)?;

    let resolver = ConfigResolver::from_process(settings.http_timeout_seconds)?;
    let config = resolver.resolve().await?;
    let status = resolver.status();

    info!(
        source = %status.source,
        elevated = status.has_elevated_credentials,
        port = config.port,
        "config loaded"
    );
    if config.stripe_secret_key.is_none() {
        warn!("STRIPE_SECRET_KEY not set, payments disabled");
    }

    let store = PostgrestStore::from_config(&config, settings.http_timeout_seconds);
    let service = Arc::new(PricingService::new(store));
    let router = http::build_router(service);

    let bind_addr = format!("{}:{}", settings.host, config.port);
    http::serve(&bind_addr, router, shutdown_signal()).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl-C received, shutting down"),
        Err(e) => warn!("failed to listen for Ctrl-C: {e}"),
    }
}
