//! Remote config endpoint client.
//!
//! `GET <base>/config` with `Accept: application/json`. The body carries the
//! same settings as the local environment under snake_case keys. All wire
//! handling stays in this module; the resolver only sees [`RemoteConfig`].

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, header::ACCEPT};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RemoteConfigError {
    #[error("remote config request failed: {0}")]
    Request(String),
    #[error("remote config returned HTTP {0}")]
    Status(u16),
    #[error("remote config body invalid: {0}")]
    Decode(String),
    #[error("remote config missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

// ── Wire type ─────────────────────────────────────────────────────────────────

/// Body returned by the remote config endpoint. Every field is optional on
/// the wire; the resolver enforces which ones are required.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RemoteConfig {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub supabase_service_key: Option<String>,
    pub session_secret: Option<String>,
    pub stripe_public_key: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub smtp_host: Option<String>,
    #[serde(default, deserialize_with = "de_port")]
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

/// The endpoint has been seen to send the port both as a number and as a
/// string; anything unparseable is treated as absent.
fn de_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Num(u64),
        Text(String),
    }

    Ok(match Option::<PortValue>::deserialize(deserializer)? {
        Some(PortValue::Num(n)) => u16::try_from(n).ok(),
        Some(PortValue::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

// ── Source trait ──────────────────────────────────────────────────────────────

/// Anything that can fetch a [`RemoteConfig`] from a base URL.
///
/// Kept as a trait so the resolver can be driven by a fake in tests.
pub trait RemoteConfigSource {
    fn fetch(
        &self,
        base_url: &str,
    ) -> impl Future<Output = Result<RemoteConfig, RemoteConfigError>> + Send;
}

/// reqwest-backed source. Cheap to clone; `reqwest::Client` is an `Arc`
/// internally.
#[derive(Debug, Clone)]
pub struct HttpRemoteConfig {
    client: Client,
}

impl HttpRemoteConfig {
    pub fn new(timeout_seconds: u64) -> Result<Self, RemoteConfigError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| RemoteConfigError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

/// `<base>/config`, tolerating a trailing slash on the base.
pub fn config_endpoint(base_url: &str) -> String {
    format!("{}/config", base_url.trim_end_matches('/'))
}

impl RemoteConfigSource for HttpRemoteConfig {
    async fn fetch(&self, base_url: &str) -> Result<RemoteConfig, RemoteConfigError> {
        let url = config_endpoint(base_url);
        debug!(%url, "fetching remote config");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RemoteConfigError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteConfigError::Status(status.as_u16()));
        }

        response
            .json::<RemoteConfig>()
            .await
            .map_err(|e| RemoteConfigError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::{HeaderMap, StatusCode}, routing::get};
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        assert_eq!(config_endpoint("https://cfg.example/"), "https://cfg.example/config");
        assert_eq!(config_endpoint("https://cfg.example"), "https://cfg.example/config");
    }

    #[test]
    fn port_accepts_number_or_string() {
        let a: RemoteConfig = serde_json::from_value(json!({ "smtp_port": 465 })).unwrap();
        let b: RemoteConfig = serde_json::from_value(json!({ "smtp_port": "2525" })).unwrap();
        let c: RemoteConfig = serde_json::from_value(json!({ "smtp_port": "nope" })).unwrap();
        let d: RemoteConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(a.smtp_port, Some(465));
        assert_eq!(b.smtp_port, Some(2525));
        assert_eq!(c.smtp_port, None);
        assert_eq!(d.smtp_port, None);
    }

    #[tokio::test]
    async fn fetch_parses_body_and_sends_accept() {
        let router = Router::new().route(
            "/config",
            get(|headers: HeaderMap| async move {
                let accept = headers
                    .get(ACCEPT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                axum::Json(json!({
                    "supabase_url": "https://abc.supabase.co",
                    "supabase_anon_key": "anon",
                    "smtp_host": accept,
                }))
            }),
        );
        let base = serve(router).await;

        let cfg = HttpRemoteConfig::new(5).unwrap().fetch(&base).await.unwrap();
        assert_eq!(cfg.supabase_url.as_deref(), Some("https://abc.supabase.co"));
        assert_eq!(cfg.supabase_anon_key.as_deref(), Some("anon"));
        assert_eq!(cfg.smtp_host.as_deref(), Some("application/json"));
        assert_eq!(cfg.session_secret, None);
    }

    #[tokio::test]
    async fn non_success_status_is_error() {
        let router = Router::new().route(
            "/config",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let base = serve(router).await;

        let err = HttpRemoteConfig::new(5).unwrap().fetch(&base).await.unwrap_err();
        assert!(matches!(err, RemoteConfigError::Status(503)));
    }

    #[tokio::test]
    async fn unreachable_host_is_request_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = HttpRemoteConfig::new(2)
            .unwrap()
            .fetch(&format!("http://{addr}"))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteConfigError::Request(_)));
    }
}
