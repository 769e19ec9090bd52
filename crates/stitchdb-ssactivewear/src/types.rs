//! Typed S&S API response shapes.
//!
//! Field names follow the upstream JSON (camelCase); only the fields the
//! pipelines consume are modeled, unknown fields are ignored.

use rust_decimal::Decimal;
use serde::Deserialize;

/// One entry from the paginated `styles/` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsStyle {
    #[serde(rename = "styleID")]
    pub style_id: i64,
    /// The part number the rest of the API is keyed by, e.g. `"B00760"`.
    pub style_name: String,
    pub brand_name: Option<String>,
    pub title: String,
    #[serde(default)]
    pub base_category: Option<String>,
}

/// Per-warehouse quantity inside a product or inventory item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsWarehouseQty {
    pub warehouse_abbr: String,
    #[serde(default)]
    pub qty: i64,
}

/// One sellable variant from the per-style `products/` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsProduct {
    pub sku: String,
    pub color_code: String,
    pub color_name: String,
    #[serde(default)]
    pub color_swatch_image: Option<String>,
    #[serde(default)]
    pub color_front_image: Option<String>,
    pub size_code: String,
    pub size_name: String,
    #[serde(default)]
    pub customer_price: Option<Decimal>,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub piece_price: Option<Decimal>,
    #[serde(default)]
    pub warehouses: Vec<SsWarehouseQty>,
}

/// One per-SKU row from the per-style `inventory/` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsInventoryItem {
    pub sku: String,
    pub color_code: String,
    pub size_code: String,
    #[serde(default)]
    pub warehouses: Vec<SsWarehouseQty>,
}
