//! Database operations for raw inventory rows.
//!
//! The per-warehouse breakdown is stored as a jsonb array and (de)serialized
//! through [`stitchdb_core::WarehouseQty`], so malformed payloads are caught
//! at this boundary instead of leaking into matrix construction.

use sqlx::PgPool;

use stitchdb_core::{InventoryRow, Supplier, WarehouseQty};

use crate::DbError;

#[derive(Debug, sqlx::FromRow)]
struct InventoryRowRecord {
    supplier: String,
    supplier_part_id: String,
    color_code: String,
    size_code: String,
    total_qty: i64,
    warehouses: serde_json::Value,
}

impl TryFrom<InventoryRowRecord> for InventoryRow {
    type Error = DbError;

    fn try_from(rec: InventoryRowRecord) -> Result<Self, Self::Error> {
        let supplier = rec
            .supplier
            .parse::<Supplier>()
            .map_err(DbError::UnknownSupplier)?;
        let warehouses: Vec<WarehouseQty> = serde_json::from_value(rec.warehouses)?;
        Ok(InventoryRow {
            supplier,
            supplier_part_id: rec.supplier_part_id,
            color_code: rec.color_code,
            size_code: rec.size_code,
            total_qty: rec.total_qty,
            warehouses,
        })
    }
}

/// All inventory cells for one supplier part, ordered for stable display.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure, [`DbError::UnknownSupplier`]
/// or [`DbError::MalformedWarehouses`] on corrupt rows.
pub async fn rows_for_part(
    pool: &PgPool,
    supplier: Supplier,
    part_id: &str,
) -> Result<Vec<InventoryRow>, DbError> {
    let records: Vec<InventoryRowRecord> = sqlx::query_as(
        "SELECT supplier, supplier_part_id, color_code, size_code, total_qty, warehouses \
         FROM inventory_rows \
         WHERE supplier = $1 AND supplier_part_id = UPPER($2) \
         ORDER BY color_code, size_code",
    )
    .bind(supplier.as_str())
    .bind(part_id)
    .fetch_all(pool)
    .await?;
    records.into_iter().map(TryInto::try_into).collect()
}

/// Deletes the supplier's scope (optionally narrowed to one part) and inserts
/// `rows` in a single transaction. Returns the number of rows written.
///
/// Concurrent runs over the same scope are not serialized; last commit wins.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the transaction fails; the previous scope is
/// left intact on failure.
pub async fn replace_inventory_scope(
    pool: &PgPool,
    supplier: Supplier,
    part_filter: Option<&str>,
    rows: Vec<InventoryRow>,
) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;

    match part_filter {
        Some(part) => {
            sqlx::query(
                "DELETE FROM inventory_rows WHERE supplier = $1 AND supplier_part_id = UPPER($2)",
            )
            .bind(supplier.as_str())
            .bind(part)
            .execute(&mut *tx)
            .await?;
        }
        None => {
            sqlx::query("DELETE FROM inventory_rows WHERE supplier = $1")
                .bind(supplier.as_str())
                .execute(&mut *tx)
                .await?;
        }
    }

    let mut written = 0u64;
    for row in &rows {
        let warehouses = serde_json::to_value(&row.warehouses)?;
        sqlx::query(
            "INSERT INTO inventory_rows \
                 (supplier, supplier_part_id, color_code, size_code, total_qty, warehouses) \
             VALUES ($1, UPPER($2), $3, $4, $5, $6) \
             ON CONFLICT (supplier, supplier_part_id, color_code, size_code) DO UPDATE SET \
                 total_qty  = EXCLUDED.total_qty, \
                 warehouses = EXCLUDED.warehouses, \
                 updated_at = NOW()",
        )
        .bind(supplier.as_str())
        .bind(&row.supplier_part_id)
        .bind(&row.color_code)
        .bind(&row.size_code)
        .bind(row.total_qty)
        .bind(warehouses)
        .execute(&mut *tx)
        .await?;
        written += 1;
    }

    tx.commit().await?;
    Ok(written)
}

/// Upserts a single inventory cell in place.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_inventory_row(pool: &PgPool, row: &InventoryRow) -> Result<(), DbError> {
    let warehouses = serde_json::to_value(&row.warehouses)?;
    sqlx::query(
        "INSERT INTO inventory_rows \
             (supplier, supplier_part_id, color_code, size_code, total_qty, warehouses) \
         VALUES ($1, UPPER($2), $3, $4, $5, $6) \
         ON CONFLICT (supplier, supplier_part_id, color_code, size_code) DO UPDATE SET \
             total_qty  = EXCLUDED.total_qty, \
             warehouses = EXCLUDED.warehouses, \
             updated_at = NOW()",
    )
    .bind(row.supplier.as_str())
    .bind(&row.supplier_part_id)
    .bind(&row.color_code)
    .bind(&row.size_code)
    .bind(row.total_qty)
    .bind(warehouses)
    .execute(pool)
    .await?;
    Ok(())
}

/// Distinct `(warehouse_id, warehouse_name)` pairs this supplier has ever
/// reported, zero-stock warehouses included. The name falls back to the id
/// when the breakdown carried no display name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn warehouse_directory(
    pool: &PgPool,
    supplier: Supplier,
) -> Result<Vec<(String, String)>, DbError> {
    let pairs: Vec<(String, String)> = sqlx::query_as(
        "SELECT DISTINCT \
             wh->>'warehouse_id' AS warehouse_id, \
             COALESCE(wh->>'warehouse_name', wh->>'warehouse_id') AS warehouse_name \
         FROM inventory_rows, jsonb_array_elements(warehouses) AS wh \
         WHERE supplier = $1 AND wh->>'warehouse_id' IS NOT NULL \
         ORDER BY warehouse_id",
    )
    .bind(supplier.as_str())
    .fetch_all(pool)
    .await?;
    Ok(pairs)
}
