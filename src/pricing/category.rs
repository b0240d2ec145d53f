//! Canonical fence categories and the label → category rules.
//!
//! Raw `servicetype` labels are free text typed into the data store. They
//! are classified by walking [`LABEL_RULES`] in order; the first rule that
//! matches wins. Labels no rule recognises default to [`Category::Timber`]
//! and are reported as unmapped so they can be fixed upstream.

use serde::Serialize;

/// One of the four fixed pricing-table keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Timber,
    Aluminum,
    Pvc,
    Rural,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Timber, Category::Aluminum, Category::Pvc, Category::Rural];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Timber => "timber",
            Category::Aluminum => "aluminum",
            Category::Pvc => "pvc",
            Category::Rural => "rural",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category used when no rule matches.
pub const DEFAULT_CATEGORY: Category = Category::Timber;

/// Labels as they appear in the pricing sheet, matched verbatim.
const EXACT_LABELS: &[(&str, Category)] = &[
    ("Timber Fence", Category::Timber),
    ("Timber Fencing", Category::Timber),
    ("Timber Paling", Category::Timber),
    ("Hardwood Paling", Category::Timber),
    ("Treated Pine", Category::Timber),
    ("Aluminium Fence", Category::Aluminum),
    ("Aluminium Fencing", Category::Aluminum),
    ("Aluminum Fence", Category::Aluminum),
    ("Pool Fence", Category::Aluminum),
    ("Pool Fencing", Category::Aluminum),
    ("PVC Fence", Category::Pvc),
    ("PVC Fencing", Category::Pvc),
    ("Vinyl Fence", Category::Pvc),
    ("Rural Fence", Category::Rural),
    ("Rural Fencing", Category::Rural),
    ("Farm Fence", Category::Rural),
    ("Post and Rail", Category::Rural),
    ("Ringlock", Category::Rural),
];

/// A single classification rule.
#[derive(Debug, Clone, Copy)]
pub enum LabelRule {
    /// Verbatim lookup in a label dictionary.
    Exact(&'static [(&'static str, Category)]),
    /// Case-insensitive substring match against any of the needles.
    Contains(&'static [&'static str], Category),
}

impl LabelRule {
    pub fn apply(&self, label: &str) -> Option<Category> {
        match self {
            LabelRule::Exact(table) => table
                .iter()
                .find(|(known, _)| *known == label)
                .map(|(_, category)| *category),
            LabelRule::Contains(needles, category) => {
                let lowered = label.to_lowercase();
                needles
                    .iter()
                    .any(|needle| lowered.contains(needle))
                    .then_some(*category)
            }
        }
    }
}

/// Evaluated top to bottom. Order is significant: a label mentioning both
/// "timber" and "rural" is timber.
pub const LABEL_RULES: &[LabelRule] = &[
    LabelRule::Exact(EXACT_LABELS),
    LabelRule::Contains(&["timber"], Category::Timber),
    LabelRule::Contains(&["aluminium", "aluminum"], Category::Aluminum),
    LabelRule::Contains(&["pvc", "vinyl"], Category::Pvc),
    LabelRule::Contains(&["rural"], Category::Rural),
];

/// Result of classifying one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    /// `true` when no rule matched and [`DEFAULT_CATEGORY`] was used.
    pub defaulted: bool,
}

pub fn classify(label: &str) -> Classification {
    LABEL_RULES
        .iter()
        .find_map(|rule| rule.apply(label))
        .map(|category| Classification { category, defaulted: false })
        .unwrap_or(Classification { category: DEFAULT_CATEGORY, defaulted: true })
}
