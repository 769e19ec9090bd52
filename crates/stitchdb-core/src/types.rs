//! Canonical catalog domain types shared across the workspace.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two upstream suppliers the catalog is reconciled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Supplier {
    Sanmar,
    SsActivewear,
}

impl Supplier {
    /// Fixed priority order used when choosing a bundle's primary supplier.
    pub const PRIORITY: [Supplier; 2] = [Supplier::Sanmar, Supplier::SsActivewear];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Supplier::Sanmar => "sanmar",
            Supplier::SsActivewear => "ssactivewear",
        }
    }
}

impl std::fmt::Display for Supplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Supplier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sanmar" => Ok(Supplier::Sanmar),
            "ssactivewear" | "ss" => Ok(Supplier::SsActivewear),
            other => Err(format!("unknown supplier: {other}")),
        }
    }
}

/// The supplier-agnostic product identity one or more supplier parts link to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalStyle {
    pub id: i64,
    /// Normalized upper-case token, unique across the catalog.
    pub style_number: String,
    pub display_name: String,
    pub brand: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ownership of a `(supplier, supplier_part_id)` pair by a canonical style.
///
/// A given pair maps to at most one canonical style at any time; re-linking
/// repoints `canonical_style_id`, it never creates a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierLink {
    pub id: i64,
    pub canonical_style_id: i64,
    pub supplier: Supplier,
    pub supplier_part_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A color offered for a supplier part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorEntry {
    pub code: String,
    pub name: String,
    pub swatch_url: Option<String>,
    /// True when this entry was synthesized from inventory rows because the
    /// catalog record was incomplete. Catalog-sourced entries win on merge.
    #[serde(default)]
    pub from_inventory: bool,
}

/// A size offered for a supplier part. `sort_order` is the supplier's own
/// ordering hint; display ordering falls back to [`crate::sizes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeEntry {
    pub code: String,
    pub display: String,
    pub sort_order: i32,
}

/// A product image, keyed by the color it depicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub color_code: String,
    pub url: String,
    pub kind: Option<String>,
}

/// Mapping from a color × size cell to the supplier's sellable SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuMapEntry {
    pub color_code: String,
    pub size_code: String,
    pub sku: String,
}

/// One supplier's view of a sellable style, with its child collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    pub supplier_part_id: String,
    pub name: String,
    pub brand: Option<String>,
    pub default_color: Option<String>,
    pub colors: Vec<ColorEntry>,
    pub sizes: Vec<SizeEntry>,
    pub media: Vec<MediaEntry>,
    pub sku_map: Vec<SkuMapEntry>,
    /// Free-form supplier attributes (price keys live here).
    #[serde(default)]
    pub attributes: Vec<(String, String)>,
}

impl ProductRecord {
    /// Merges colors and sizes derived from inventory rows into an incomplete
    /// catalog record. Merge is by normalized code; existing catalog-sourced
    /// entries always win over inventory-derived ones.
    pub fn absorb_inventory_dimensions(&mut self, rows: &[InventoryRow]) {
        for row in rows {
            let color_key = row.color_code.to_uppercase();
            if !self
                .colors
                .iter()
                .any(|c| c.code.to_uppercase() == color_key)
            {
                self.colors.push(ColorEntry {
                    code: row.color_code.clone(),
                    name: row.color_code.clone(),
                    swatch_url: None,
                    from_inventory: true,
                });
            }
            let size_key = row.size_code.to_uppercase();
            if !self.sizes.iter().any(|s| s.code.to_uppercase() == size_key) {
                let sort_order = i32::try_from(self.sizes.len()).unwrap_or(i32::MAX);
                self.sizes.push(SizeEntry {
                    code: row.size_code.clone(),
                    display: row.size_code.clone(),
                    sort_order,
                });
            }
        }
    }
}

/// Per-warehouse quantity inside an inventory row's breakdown.
///
/// Typed at the serialization boundary; the persisted form is a jsonb array
/// of these, never free-form data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseQty {
    pub warehouse_id: String,
    pub warehouse_name: Option<String>,
    pub quantity: i64,
}

/// Stock for one `(supplier_part_id, color_code, size_code)` cell.
///
/// `sum(warehouses[].quantity) == total_qty` is the expected contract when
/// the breakdown is present; import pipelines preserve it but readers must
/// not assume it was enforced upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub supplier: Supplier,
    pub supplier_part_id: String,
    pub color_code: String,
    pub size_code: String,
    pub total_qty: i64,
    #[serde(default)]
    pub warehouses: Vec<WarehouseQty>,
}
