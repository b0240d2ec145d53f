//! Read access to the `pricing` relation.
//!
//! The hosted data store exposes tables through a PostgREST API, so the
//! query is a plain HTTP GET:
//!
//! ```text
//! GET <supabase_url>/rest/v1/pricing?select=*&order=servicetype.asc,height.asc
//! apikey: <key>
//! Authorization: Bearer <key>
//! ```

use std::cmp::Ordering;
use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url, header::ACCEPT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AppConfig;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("pricing query failed: {0}")]
    Request(String),
    #[error("pricing query returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("pricing rows could not be decoded: {0}")]
    Decode(String),
}

// ── Row ───────────────────────────────────────────────────────────────────────

/// A column the store may hand back as either a JSON number or a string.
///
/// Anything else (bool, object, array) lands in `Other` so that one odd
/// cell never fails the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumOrText {
    Num(f64),
    Text(String),
    Other(serde_json::Value),
}

impl NumOrText {
    /// Numeric value, if there is a finite one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumOrText::Num(n) => Some(*n),
            NumOrText::Text(s) => s.trim().parse::<f64>().ok(),
            NumOrText::Other(_) => None,
        }
        .filter(|n| n.is_finite())
    }
}

/// Accept a label column as text; numbers are rendered, anything else is
/// treated as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// One row of the `pricing` relation, echoed back verbatim in responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRow {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub servicetype: Option<String>,
    #[serde(default)]
    pub name: Option<serde_json::Value>,
    #[serde(default)]
    pub height: Option<NumOrText>,
    /// Total per linear metre including GST.
    #[serde(default)]
    pub totallmincgst: Option<NumOrText>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<serde_json::Value>,
}

impl PricingRow {
    pub fn label(&self) -> &str {
        self.servicetype.as_deref().unwrap_or_default()
    }
}

/// Sort by `servicetype` then numeric `height`, both ascending.
///
/// Labels compare case-insensitively first, the way the store's collation
/// does, with byte order only breaking ties between case variants. The sort
/// is stable, so rows equal on every key keep their store order.
pub fn sort_rows(rows: &mut [PricingRow]) {
    rows.sort_by(|a, b| {
        compare_labels(a.label(), b.label()).then_with(|| {
            let ha = a.height.as_ref().and_then(NumOrText::as_f64);
            let hb = b.height.as_ref().and_then(NumOrText::as_f64);
            match (ha, hb) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        })
    });
}

fn compare_labels(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

// ── Store trait ───────────────────────────────────────────────────────────────

/// Source of raw pricing rows.
pub trait PricingStore {
    fn fetch_rows(&self) -> impl Future<Output = Result<Vec<PricingRow>, StoreError>> + Send;
}

/// PostgREST-backed store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(base_url: &str, api_key: &str, timeout_seconds: u64) -> Result<Self, StoreError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| StoreError::Request(format!("invalid data store url '{base_url}': {e}")))?;
        // Join relative to any path prefix (self-hosted stores behind a proxy).
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut endpoint = base
            .join("rest/v1/pricing")
            .map_err(|e| StoreError::Request(format!("invalid data store url '{base_url}': {e}")))?;
        endpoint
            .query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "servicetype.asc,height.asc");

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| StoreError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, endpoint, api_key: api_key.to_string() })
    }

    /// Store for the resolved config, or `None` when its credentials cannot
    /// be used. The caller then serves the fallback table.
    pub fn from_config(config: &AppConfig, timeout_seconds: u64) -> Option<Self> {
        let key = config.data_store_key();
        if config.supabase_url.is_empty() || key.is_empty() {
            warn!("data store credentials missing, pricing will use fallback table");
            return None;
        }
        match Self::new(&config.supabase_url, key, timeout_seconds) {
            Ok(store) => Some(store),
            Err(e) => {
                warn!(error = %e, "data store unusable, pricing will use fallback table");
                None
            }
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl PricingStore for PostgrestStore {
    async fn fetch_rows(&self) -> Result<Vec<PricingRow>, StoreError> {
        debug!(url = %self.endpoint, "querying pricing rows");

        let response = self
            .client
            .get(self.endpoint.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status: status.as_u16(), body });
        }

        response
            .json::<Vec<PricingRow>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}
