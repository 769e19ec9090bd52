//! Normalization of S&S API payloads into the shared domain types.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use stitchdb_core::{
    ColorEntry, InventoryRow, MediaEntry, ProductRecord, SizeEntry, SkuMapEntry, Supplier,
    WarehouseDirectory, WarehouseQty,
};

use crate::types::{SsInventoryItem, SsProduct, SsStyle};

/// Groups a style's variant rows into one [`ProductRecord`].
///
/// Colors and sizes are deduplicated by upper-cased code in first-seen
/// order; each color contributes at most one front image to `media`. Price
/// attributes carry the minimum across variants so search sees the best
/// available price per key.
///
/// Returns `None` when the style has no variants, which callers treat as
/// "supplier has no data" rather than an error.
#[must_use]
pub fn build_product_record(style: &SsStyle, variants: &[SsProduct]) -> Option<ProductRecord> {
    if variants.is_empty() {
        return None;
    }

    let mut colors: Vec<ColorEntry> = Vec::new();
    let mut sizes: Vec<SizeEntry> = Vec::new();
    let mut media: Vec<MediaEntry> = Vec::new();
    let mut sku_map: Vec<SkuMapEntry> = Vec::new();
    let mut min_prices: BTreeMap<&'static str, Decimal> = BTreeMap::new();

    for variant in variants {
        let color_key = variant.color_code.to_uppercase();
        if !colors.iter().any(|c| c.code.to_uppercase() == color_key) {
            colors.push(ColorEntry {
                code: variant.color_code.clone(),
                name: variant.color_name.clone(),
                swatch_url: variant.color_swatch_image.clone(),
                from_inventory: false,
            });
            if let Some(front) = &variant.color_front_image {
                media.push(MediaEntry {
                    color_code: variant.color_code.clone(),
                    url: front.clone(),
                    kind: Some("front".to_string()),
                });
            }
        }

        let size_key = variant.size_code.to_uppercase();
        if !sizes.iter().any(|s| s.code.to_uppercase() == size_key) {
            let sort_order = i32::try_from(sizes.len()).unwrap_or(i32::MAX);
            sizes.push(SizeEntry {
                code: variant.size_code.clone(),
                display: variant.size_name.clone(),
                sort_order,
            });
        }

        sku_map.push(SkuMapEntry {
            color_code: variant.color_code.clone(),
            size_code: variant.size_code.clone(),
            sku: variant.sku.clone(),
        });

        for (key, price) in [
            ("customer_price", variant.customer_price),
            ("sale_price", variant.sale_price),
            ("piece_price", variant.piece_price),
        ] {
            if let Some(price) = price {
                min_prices
                    .entry(key)
                    .and_modify(|p| *p = (*p).min(price))
                    .or_insert(price);
            }
        }
    }

    let default_color = colors.first().map(|c| c.code.clone());
    Some(ProductRecord {
        supplier_part_id: style.style_name.to_uppercase(),
        name: style.title.clone(),
        brand: style.brand_name.clone(),
        default_color,
        colors,
        sizes,
        media,
        sku_map,
        attributes: min_prices
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    })
}

/// Aggregates per-SKU inventory items into rows keyed
/// `(part, color_code, size_code)`, merging duplicate warehouse ids within
/// and across SKUs. Warehouse ids are rewritten through the directory so
/// the matrix layer can merge them with other feeds.
#[must_use]
pub fn group_inventory(
    style_name: &str,
    items: &[SsInventoryItem],
    directory: &WarehouseDirectory,
) -> Vec<InventoryRow> {
    let part = style_name.to_uppercase();
    let mut cells: BTreeMap<(String, String), BTreeMap<String, (String, i64)>> = BTreeMap::new();

    for item in items {
        let key = (item.color_code.to_uppercase(), item.size_code.to_uppercase());
        let warehouses = cells.entry(key).or_default();
        for wh in &item.warehouses {
            let (id, name) = directory.normalize(&wh.warehouse_abbr, None);
            let entry = warehouses.entry(id).or_insert_with(|| (name, 0));
            entry.1 += wh.qty;
        }
    }

    cells
        .into_iter()
        .map(|((color_code, size_code), warehouses)| {
            let total_qty = warehouses.values().map(|(_, q)| *q).sum();
            InventoryRow {
                supplier: Supplier::SsActivewear,
                supplier_part_id: part.clone(),
                color_code,
                size_code,
                total_qty,
                warehouses: warehouses
                    .into_iter()
                    .map(|(id, (name, quantity))| WarehouseQty {
                        warehouse_id: id,
                        warehouse_name: Some(name),
                        quantity,
                    })
                    .collect(),
            }
        })
        .collect()
}
