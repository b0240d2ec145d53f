//! HTTP surface: axum router and server loop.
//!
//! ## URL layout
//!
//! ```text
//! GET|POST|OPTIONS /functions/v1/get-pricing   pricing table (edge-function path)
//! GET|POST|OPTIONS /api/pricing                same handler
//! GET              /api/health                 liveness
//! ```

mod pricing;

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json, Router,
    routing::get,
};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::AppError;
use crate::pricing::{PricingService, PricingStore};

pub use pricing::{CACHE_CONTROL_VALUE, cors_layer};

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into handlers via [`axum::extract::State`].
///
/// Cheap to clone; the service is reference-counted.
pub struct ApiState<S> {
    pub pricing: Arc<PricingService<S>>,
}

impl<S> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self { pricing: Arc::clone(&self.pricing) }
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router<S>(service: Arc<PricingService<S>>) -> Router
where
    S: PricingStore + Send + Sync + 'static,
{
    let pricing_routes = get(pricing::get_pricing::<S>)
        .post(pricing::get_pricing::<S>)
        .options(pricing::preflight);

    // Routes added after `.layer` are not wrapped, so health stays CORS-free.
    Router::new()
        .route("/functions/v1/get-pricing", pricing_routes.clone())
        .route("/api/pricing", pricing_routes)
        .layer(cors_layer())
        .route("/api/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .with_state(ApiState { pricing: service })
}

// ── Server loop ───────────────────────────────────────────────────────────────

/// Bind `bind_addr` and serve `router` until `shutdown` resolves.
pub async fn serve<F>(bind_addr: &str, router: Router, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, "http server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::Server(format!("axum server error: {e}")))?;

    info!("http server shut down");
    Ok(())
}
