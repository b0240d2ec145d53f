//! Integration tests for the pricing HTTP endpoint.
//!
//! Run with:
//!   cargo test --test test_pricing_endpoint

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use fencesite::http::{CACHE_CONTROL_VALUE, build_router};
use fencesite::pricing::{PricingRow, PricingService, PricingStore, StoreError, fallback_table};

// ── helpers ──────────────────────────────────────────────────────────────────

struct RowsStore(Value);

impl PricingStore for RowsStore {
    async fn fetch_rows(&self) -> Result<Vec<PricingRow>, StoreError> {
        Ok(serde_json::from_value(self.0.clone()).expect("valid rows"))
    }
}

struct DownStore;

impl PricingStore for DownStore {
    async fn fetch_rows(&self) -> Result<Vec<PricingRow>, StoreError> {
        Err(StoreError::Request("error trying to connect: tcp connect error: Connection refused".into()))
    }
}

fn router<S: PricingStore + Send + Sync + 'static>(store: Option<S>) -> Router {
    build_router(Arc::new(PricingService::new(store)))
}

async fn call(router: Router, method: Method, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    send(router, Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()).await
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
    (status, headers, body)
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("json body")
}

fn sample_rows() -> Value {
    json!([
        { "id": 1, "servicetype": "Timber Fence", "name": "Paling", "height": 1.2, "totallmincgst": "150.00", "code": "TF12", "created_at": "2024-03-01T00:00:00Z" },
        { "id": 2, "servicetype": "Aluminium Fence", "name": "Slat", "height": 1.8, "totallmincgst": "220.00", "code": null, "created_at": "2024-03-01T00:00:00Z" }
    ])
}

// ── live data ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn live_rows_are_served_with_cache_headers() {
    let (status, headers, body) =
        call(router(Some(RowsStore(sample_rows()))), Method::GET, "/functions/v1/get-pricing").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::CACHE_CONTROL], CACHE_CONTROL_VALUE);

    let v = json_body(&body);
    assert_eq!(v["success"], true);
    assert_eq!(v["data"]["pricing"]["timber"]["1.2"].as_f64(), Some(150.0));
    assert_eq!(v["data"]["pricing"]["aluminum"]["1.8"].as_f64(), Some(220.0));
    assert_eq!(v["data"]["fallback"], false);
    assert_eq!(v["data"]["source"], "database");
    assert_eq!(v["data"]["rawData"][0]["code"], "TF12");
}

#[tokio::test]
async fn odd_cell_type_does_not_discard_live_rows() {
    let rows = json!([
        { "servicetype": "Timber Fence", "height": 1.2, "totallmincgst": "150.00" },
        { "servicetype": "PVC Fence", "height": 1.5, "totallmincgst": true }
    ]);
    let (status, headers, body) = call(router(Some(RowsStore(rows))), Method::GET, "/api/pricing").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CACHE_CONTROL], CACHE_CONTROL_VALUE);
    let v = json_body(&body);
    assert_eq!(v["data"]["source"], "database");
    assert_eq!(v["data"]["pricing"]["timber"]["1.2"].as_f64(), Some(150.0));
    assert_eq!(v["data"]["pricing"]["pvc"]["1.5"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn post_and_api_alias_behave_like_get() {
    for (method, uri) in [(Method::POST, "/functions/v1/get-pricing"), (Method::GET, "/api/pricing")] {
        let (status, _, body) = call(router(Some(RowsStore(sample_rows()))), method, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["data"]["source"], "database");
    }
}

// ── degraded paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn store_failure_still_returns_200_with_fallback() {
    let (status, headers, body) = call(router(Some(DownStore)), Method::GET, "/functions/v1/get-pricing").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(headers.get(header::CACHE_CONTROL).is_none());

    let v = json_body(&body);
    assert_eq!(v["success"], true);
    assert_eq!(v["data"]["fallback"], true);
    assert_eq!(v["data"]["source"], "fallback-db-error");
    assert!(v["data"]["error"].as_str().unwrap().contains("Connection refused"));
    assert_eq!(v["data"]["pricing"], serde_json::to_value(fallback_table()).unwrap());
}

#[tokio::test]
async fn empty_store_returns_fallback_table() {
    let (status, _, body) = call(router(Some(RowsStore(json!([])))), Method::GET, "/api/pricing").await;

    assert_eq!(status, StatusCode::OK);
    let v = json_body(&body);
    assert_eq!(v["data"]["fallback"], true);
    assert_eq!(v["data"]["source"], "fallback-no-data");
    assert_eq!(v["data"]["pricing"], serde_json::to_value(fallback_table()).unwrap());
}

#[tokio::test]
async fn unconfigured_store_returns_fallback_table() {
    let (status, _, body) = call(router::<DownStore>(None), Method::GET, "/api/pricing").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["data"]["source"], "fallback-config-missing");
}

// ── CORS / misc ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn bare_options_is_empty_success() {
    let (status, headers, body) =
        call(router(Some(DownStore)), Method::OPTIONS, "/functions/v1/get-pricing").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn browser_preflight_lists_allowed_headers_and_methods() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/pricing")
        .header(header::ORIGIN, "https://fences.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "apikey, content-type")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(router(Some(DownStore)), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let allow_headers = headers[header::ACCESS_CONTROL_ALLOW_HEADERS].to_str().unwrap().to_string();
    for name in ["authorization", "x-client-info", "apikey", "content-type"] {
        assert!(allow_headers.contains(name), "missing {name} in {allow_headers}");
    }
    let allow_methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap().to_string();
    for method in ["GET", "POST", "OPTIONS"] {
        assert!(allow_methods.contains(method), "missing {method} in {allow_methods}");
    }
}

#[tokio::test]
async fn cross_origin_get_carries_allow_origin() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/functions/v1/get-pricing")
        .header(header::ORIGIN, "https://fences.example")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(router(Some(RowsStore(sample_rows()))), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::CACHE_CONTROL], CACHE_CONTROL_VALUE);
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, _, body) = call(router(Some(DownStore)), Method::GET, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({ "status": "ok" }));
}

#[tokio::test]
async fn unsupported_method_is_rejected() {
    let (status, _, _) = call(router(Some(DownStore)), Method::DELETE, "/api/pricing").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
