//! Pricing endpoint handlers.
//!
//! Always answers `200`. Failures inside the lookup are reported in the JSON
//! body (`data.fallback`, `data.source`), never through the status code.
//! CORS headers come from [`cors_layer`], applied to the pricing routes.

use axum::{
    Json,
    extract::State,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use tower_http::cors::{Any, CorsLayer};

use crate::pricing::PricingStore;

use super::ApiState;

/// Browsers may reuse live pricing for 5 minutes, shared caches for 30.
pub const CACHE_CONTROL_VALUE: &str = "public, max-age=300, s-maxage=1800";

/// Open CORS for the pricing routes: any origin, the data-store client
/// headers, and the methods the endpoint answers.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

/// GET|POST: pricing table.
pub(super) async fn get_pricing<S>(State(state): State<ApiState<S>>) -> Response
where
    S: PricingStore + Send + Sync + 'static,
{
    let envelope = state.pricing.get_pricing().await;
    let cacheable = envelope.is_cacheable();

    let mut response = (StatusCode::OK, Json(envelope)).into_response();
    if cacheable {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));
    }
    response
}

/// OPTIONS without `Access-Control-Request-Method`: empty success.
/// Real preflights are answered by the CORS layer before reaching here.
pub(super) async fn preflight() -> StatusCode {
    StatusCode::OK
}
