//! Built-in pricing served whenever the data store cannot supply rows.
//!
//! Also the only source of category descriptions and materials; those are
//! never read from the store.

use std::sync::LazyLock;

use super::category::Category;
use super::table::{CategoryPricing, PricingTable};

struct FallbackCategory {
    category: Category,
    prices: &'static [(&'static str, f64)],
    description: &'static str,
    materials: &'static str,
}

const FALLBACK: &[FallbackCategory] = &[
    FallbackCategory {
        category: Category::Timber,
        prices: &[("1.2", 145.0), ("1.5", 165.0), ("1.8", 185.0), ("2.1", 210.0)],
        description: "Classic timber paling fencing, lapped or butted, for privacy and a natural look.",
        materials: "H4 treated pine posts, hardwood or pine palings, treated pine rails",
    },
    FallbackCategory {
        category: Category::Aluminum,
        prices: &[("1.2", 195.0), ("1.5", 220.0), ("1.8", 250.0)],
        description: "Powder-coated aluminium slat and pool fencing that will not rust or rot.",
        materials: "Powder-coated aluminium posts, slats and rails, stainless fixings",
    },
    FallbackCategory {
        category: Category::Pvc,
        prices: &[("1.2", 170.0), ("1.5", 190.0), ("1.8", 215.0)],
        description: "Low-maintenance PVC picket and privacy fencing that never needs painting.",
        materials: "UV-stabilised PVC posts, pickets and rails with steel-reinforced bottom rail",
    },
    FallbackCategory {
        category: Category::Rural,
        prices: &[("1.2", 45.0), ("1.5", 55.0)],
        description: "Post and rail, ringlock and plain-wire fencing for farms and acreage.",
        materials: "Treated pine strainers and posts, galvanised ringlock mesh or plain wire",
    },
];

/// Process-wide fallback table. Immutable after first use.
pub static FALLBACK_PRICING: LazyLock<PricingTable> = LazyLock::new(|| {
    let mut table = PricingTable::new();
    for entry in FALLBACK {
        let mut pricing = CategoryPricing::per_meter();
        pricing.prices = entry
            .prices
            .iter()
            .map(|(height, price)| (height.to_string(), *price))
            .collect();
        pricing.description = Some(entry.description.to_string());
        pricing.materials = Some(entry.materials.to_string());
        table.insert(entry.category, pricing);
    }
    table
});

pub fn fallback_table() -> &'static PricingTable {
    &FALLBACK_PRICING
}
