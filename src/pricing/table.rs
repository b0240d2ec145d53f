//! Canonical pricing table and row normalization.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::category::{Category, classify};
use super::store::{NumOrText, PricingRow};

/// Prices for one category, keyed by height.
///
/// Serialized flat, so heights sit next to the metadata keys:
/// `{ "1.2": 150, "1.8": 185, "perMeter": true, "description": "…" }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPricing {
    #[serde(flatten)]
    pub prices: BTreeMap<String, f64>,
    pub per_meter: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<String>,
}

impl CategoryPricing {
    pub fn per_meter() -> Self {
        Self { prices: BTreeMap::new(), per_meter: true, description: None, materials: None }
    }

    pub fn price(&self, height: &str) -> Option<f64> {
        self.prices.get(height).copied()
    }
}

/// Category → per-height prices. Keys are always canonical categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PricingTable(BTreeMap<Category, CategoryPricing>);

impl PricingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: Category) -> Option<&CategoryPricing> {
        self.0.get(&category)
    }

    pub fn insert(&mut self, category: Category, pricing: CategoryPricing) {
        self.0.insert(category, pricing);
    }

    /// Set `price` at `height`, creating a per-metre entry for a category
    /// seen for the first time. Existing prices at the same height are
    /// overwritten.
    pub fn set_price(&mut self, category: Category, height: String, price: f64) {
        self.0
            .entry(category)
            .or_insert_with(CategoryPricing::per_meter)
            .prices
            .insert(height, price);
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy `description` and `materials` from `reference` into every
    /// category present in both tables. Prices are left untouched.
    pub fn merge_descriptions(&mut self, reference: &PricingTable) {
        for (category, pricing) in self.0.iter_mut() {
            if let Some(known) = reference.get(*category) {
                pricing.description = known.description.clone();
                pricing.materials = known.materials.clone();
            }
        }
    }
}

/// Table built from raw rows plus the labels that fell through to the
/// default category.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub table: PricingTable,
    pub unmapped_labels: Vec<String>,
}

/// Render a height the way the site keys it: shortest decimal form,
/// integers without a fractional part (`1.2` → `"1.2"`, `2.0` → `"2"`).
///
/// `None` for heights that are not numbers; such keys would collide with the
/// metadata fields flattened beside them.
pub fn height_key(height: &NumOrText) -> Option<String> {
    height.as_f64().map(format_number)
}

fn format_number(n: f64) -> String {
    // f64's Display already omits a trailing ".0" and uses shortest form.
    if n == 0.0 { "0".to_string() } else { n.to_string() }
}

/// Price of a row; anything non-numeric counts as 0.
pub fn row_price(row: &PricingRow) -> f64 {
    row.totallmincgst
        .as_ref()
        .and_then(NumOrText::as_f64)
        .unwrap_or(0.0)
}

/// Fold rows into a table. Rows must already be in their final order;
/// later rows win on identical (category, height).
pub fn normalize(rows: &[PricingRow]) -> Normalized {
    let mut table = PricingTable::new();
    let mut unmapped_labels: Vec<String> = Vec::new();

    for row in rows {
        let label = row.label();
        let classification = classify(label);
        if classification.defaulted && !unmapped_labels.iter().any(|l| l == label) {
            warn!(servicetype = %label, category = %classification.category, "unrecognised service type, using default category");
            unmapped_labels.push(label.to_string());
        }

        let Some(height) = row.height.as_ref() else {
            warn!(servicetype = %label, id = ?row.id, "pricing row without height skipped");
            continue;
        };
        let Some(key) = height_key(height) else {
            warn!(servicetype = %label, id = ?row.id, height = ?height, "pricing row with non-numeric height skipped");
            continue;
        };

        let price = row_price(row);
        debug!(servicetype = %label, category = %classification.category, height = %key, price, "pricing row mapped");
        table.set_price(classification.category, key, price);
    }

    Normalized { table, unmapped_labels }
}
