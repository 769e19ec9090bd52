//! Warehouse × size inventory matrix.
//!
//! Rows are grouped by *resolved display name*, not raw warehouse id, so a
//! warehouse reported as `"1"` by one feed path and `"SEA"` by another lands
//! in a single row. "Known but empty" stays visible: a directory warehouse
//! with no stock still gets a zero row, and a catalog size with no inventory
//! still gets a zero column.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use stitchdb_core::sizes::size_sort_key;
use stitchdb_core::{InventoryRow, Supplier, WarehouseDirectory};

/// One inventory observation, already flattened out of a per-SKU row.
#[derive(Debug, Clone)]
pub struct FlatInventoryLine {
    pub warehouse_id: String,
    pub warehouse_name: Option<String>,
    pub size_code: String,
    pub quantity: i64,
}

/// A single warehouse's row in the matrix.
#[derive(Debug, Clone, Serialize)]
pub struct WarehouseRow {
    pub display_name: String,
    /// size code → quantity, zero-filled for every column in the matrix.
    pub quantities: BTreeMap<String, i64>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockMatrix {
    /// Sorted by display name.
    pub warehouses: Vec<WarehouseRow>,
    /// Column order: fixed apparel ordering with numeric/lexicographic
    /// fallback for unrecognized codes.
    pub size_order: Vec<String>,
    /// Column totals aligned with `size_order`.
    pub size_totals: Vec<(String, i64)>,
    pub grand_total: i64,
}

/// Label for stock a supplier reports without a warehouse breakdown.
const UNALLOCATED: &str = "Unallocated";

/// Flattens persisted inventory rows into per-warehouse observations.
///
/// A row with no breakdown contributes its full quantity to a synthetic
/// "Unallocated" location so totals survive the round trip through the
/// matrix.
#[must_use]
pub fn flatten_rows(rows: &[InventoryRow]) -> Vec<FlatInventoryLine> {
    let mut lines = Vec::new();
    for row in rows {
        if row.warehouses.is_empty() {
            if row.total_qty != 0 {
                lines.push(FlatInventoryLine {
                    warehouse_id: UNALLOCATED.to_string(),
                    warehouse_name: Some(UNALLOCATED.to_string()),
                    size_code: row.size_code.clone(),
                    quantity: row.total_qty,
                });
            }
            continue;
        }
        for wh in &row.warehouses {
            lines.push(FlatInventoryLine {
                warehouse_id: wh.warehouse_id.clone(),
                warehouse_name: wh.warehouse_name.clone(),
                size_code: row.size_code.clone(),
                quantity: wh.quantity,
            });
        }
    }
    lines
}

/// Builds the deduplicated warehouse × size grid.
///
/// `directory` lists warehouses that exist regardless of current stock (raw
/// `(id, name)` pairs); `catalog_sizes` is the product's known size set. Both
/// are zero-filled into the result even when no line references them.
#[must_use]
pub fn build_matrix(
    lines: &[FlatInventoryLine],
    directory: &[(String, String)],
    catalog_sizes: &[String],
    resolver: &WarehouseDirectory,
    supplier: Option<Supplier>,
) -> StockMatrix {
    // Column set: catalog sizes first, then anything only inventory knows.
    let mut size_order: Vec<String> = catalog_sizes.to_vec();
    for line in lines {
        if !size_order
            .iter()
            .any(|s| s.eq_ignore_ascii_case(&line.size_code))
        {
            size_order.push(line.size_code.clone());
        }
    }
    size_order.sort_by_key(|s| size_sort_key(s));
    size_order.dedup_by(|a, b| a.eq_ignore_ascii_case(b));

    let mut groups: HashMap<String, BTreeMap<String, i64>> = HashMap::new();
    let zero_row = || -> BTreeMap<String, i64> {
        size_order.iter().map(|s| (s.clone(), 0)).collect()
    };

    // Directory warehouses first: a location allocated zero stock today is
    // still a valid shipping origin and must stay visible.
    for (id, name) in directory {
        let display = resolver.resolve(id, Some(name).map(String::as_str), supplier);
        groups.entry(display).or_insert_with(zero_row);
    }

    for line in lines {
        let display = resolver.resolve(
            &line.warehouse_id,
            line.warehouse_name.as_deref(),
            supplier,
        );
        let row = groups.entry(display).or_insert_with(zero_row);
        let size_key = size_order
            .iter()
            .find(|s| s.eq_ignore_ascii_case(&line.size_code))
            .cloned()
            .unwrap_or_else(|| line.size_code.clone());
        *row.entry(size_key).or_insert(0) += line.quantity;
    }

    let mut warehouses: Vec<WarehouseRow> = groups
        .into_iter()
        .map(|(display_name, quantities)| {
            let total = quantities.values().sum();
            WarehouseRow {
                display_name,
                quantities,
                total,
            }
        })
        .collect();
    warehouses.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    let size_totals: Vec<(String, i64)> = size_order
        .iter()
        .map(|size| {
            let total = warehouses
                .iter()
                .map(|w| w.quantities.get(size).copied().unwrap_or(0))
                .sum();
            (size.clone(), total)
        })
        .collect();
    let grand_total = warehouses.iter().map(|w| w.total).sum();

    StockMatrix {
        warehouses,
        size_order,
        size_totals,
        grand_total,
    }
}
