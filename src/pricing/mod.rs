//! Pricing lookup: data-store rows normalized into the canonical table.
//!
//! [`PricingService::get_pricing`] never fails. Internally every request
//! ends in a [`PricingOutcome`], either live data or a fallback with an
//! explicit [`FallbackReason`]. Only at the last step is that collapsed into
//! the single [`PricingEnvelope`] shape the site consumes.

pub mod category;
pub mod fallback;
pub mod store;
pub mod table;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, warn};

pub use category::Category;
pub use fallback::fallback_table;
pub use store::{PostgrestStore, PricingRow, PricingStore, StoreError};
pub use table::{CategoryPricing, PricingTable};

/// Name of the relation the rows come from, echoed in every response.
pub const PRICING_TABLE: &str = "pricing";

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Why the fallback table was served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// No usable data-store credentials.
    ConfigMissing,
    /// The query failed; the message is passed through for diagnostics.
    DbError(String),
    /// The query succeeded but returned no rows.
    NoData,
}

impl FallbackReason {
    pub fn source(&self) -> &'static str {
        match self {
            FallbackReason::ConfigMissing => "fallback-config-missing",
            FallbackReason::DbError(_) => "fallback-db-error",
            FallbackReason::NoData => "fallback-no-data",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PricingOutcome {
    Database {
        table: PricingTable,
        rows: Vec<PricingRow>,
        unmapped_labels: Vec<String>,
    },
    Fallback(FallbackReason),
}

pub const DATABASE_SOURCE: &str = "database";

impl PricingOutcome {
    pub fn into_envelope(self, now: DateTime<Utc>) -> PricingEnvelope {
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let data = match self {
            PricingOutcome::Database { table, rows, unmapped_labels } => PricingData {
                pricing: table,
                table: PRICING_TABLE,
                row_count: rows.len(),
                raw_data: rows,
                fallback: false,
                source: DATABASE_SOURCE,
                timestamp,
                error: None,
                unmapped_labels,
            },
            PricingOutcome::Fallback(reason) => PricingData {
                pricing: fallback_table().clone(),
                table: PRICING_TABLE,
                row_count: 0,
                raw_data: Vec::new(),
                fallback: true,
                source: reason.source(),
                timestamp,
                error: match reason {
                    FallbackReason::DbError(message) => Some(message),
                    _ => None,
                },
                unmapped_labels: Vec::new(),
            },
        };
        PricingEnvelope { success: true, data }
    }
}

// ── Response shape ────────────────────────────────────────────────────────────

/// External response. `success` is always `true`; degraded results are
/// flagged through `data.fallback` and `data.source`.
#[derive(Debug, Clone, Serialize)]
pub struct PricingEnvelope {
    pub success: bool,
    pub data: PricingData,
}

impl PricingEnvelope {
    /// Live data may be cached downstream; fallback responses may not.
    pub fn is_cacheable(&self) -> bool {
        !self.data.fallback
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingData {
    pub pricing: PricingTable,
    pub table: &'static str,
    pub row_count: usize,
    pub raw_data: Vec<PricingRow>,
    pub fallback: bool,
    pub source: &'static str,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmapped_labels: Vec<String>,
}

// ── Service ───────────────────────────────────────────────────────────────────

/// Builds pricing responses from an optional store.
///
/// `None` means the data store is not configured; every call then serves the
/// fallback table.
#[derive(Debug)]
pub struct PricingService<S> {
    store: Option<S>,
}

impl<S: PricingStore> PricingService<S> {
    pub fn new(store: Option<S>) -> Self {
        Self { store }
    }

    pub async fn get_pricing(&self) -> PricingEnvelope {
        let outcome = self.outcome().await;
        let envelope = outcome.into_envelope(Utc::now());
        info!(
            source = envelope.data.source,
            fallback = envelope.data.fallback,
            rows = envelope.data.row_count,
            "pricing served"
        );
        envelope
    }

    /// Run the lookup and report what happened, without shaping a response.
    pub async fn outcome(&self) -> PricingOutcome {
        let Some(store) = self.store.as_ref() else {
            warn!("pricing store not configured");
            return PricingOutcome::Fallback(FallbackReason::ConfigMissing);
        };

        let mut rows = match store.fetch_rows().await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "pricing query failed");
                return PricingOutcome::Fallback(FallbackReason::DbError(e.to_string()));
            }
        };

        if rows.is_empty() {
            warn!("pricing query returned no rows");
            return PricingOutcome::Fallback(FallbackReason::NoData);
        }

        store::sort_rows(&mut rows);
        let normalized = table::normalize(&rows);
        let mut table = normalized.table;
        table.merge_descriptions(fallback_table());

        PricingOutcome::Database {
            table,
            rows,
            unmapped_labels: normalized.unmapped_labels,
        }
    }
}
