//! Database operations for per-supplier product records.
//!
//! A product upsert is a full replace: the parent row is upserted and every
//! child collection (colors, sizes, media, skus, attributes) is deleted and
//! re-inserted inside one transaction, so a record read back always reflects
//! exactly one import.

use sqlx::{PgPool, Postgres, Transaction};

use stitchdb_core::{
    ColorEntry, MediaEntry, ProductRecord, SizeEntry, SkuMapEntry, Supplier,
};

use crate::DbError;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    supplier_part_id: String,
    name: String,
    brand: Option<String>,
    default_color: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct ColorRow {
    code: String,
    name: String,
    swatch_url: Option<String>,
    from_inventory: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct SizeRow {
    code: String,
    display: String,
    sort_order: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct MediaRow {
    color_code: String,
    url: String,
    kind: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct SkuRow {
    color_code: String,
    size_code: String,
    sku: String,
}

#[derive(Debug, sqlx::FromRow)]
struct AttributeRow {
    key: String,
    value: String,
}

/// Loads one supplier's product record with all child collections.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn get_product(
    pool: &PgPool,
    supplier: Supplier,
    part_id: &str,
) -> Result<Option<ProductRecord>, DbError> {
    let parent: Option<ProductRow> = sqlx::query_as(
        "SELECT id, supplier_part_id, name, brand, default_color \
         FROM products WHERE supplier = $1 AND supplier_part_id = UPPER($2)",
    )
    .bind(supplier.as_str())
    .bind(part_id)
    .fetch_optional(pool)
    .await?;

    let Some(parent) = parent else {
        return Ok(None);
    };

    let colors: Vec<ColorRow> = sqlx::query_as(
        "SELECT code, name, swatch_url, from_inventory \
         FROM product_colors WHERE product_id = $1 ORDER BY id",
    )
    .bind(parent.id)
    .fetch_all(pool)
    .await?;

    let sizes: Vec<SizeRow> = sqlx::query_as(
        "SELECT code, display, sort_order \
         FROM product_sizes WHERE product_id = $1 ORDER BY sort_order, id",
    )
    .bind(parent.id)
    .fetch_all(pool)
    .await?;

    let media: Vec<MediaRow> = sqlx::query_as(
        "SELECT color_code, url, kind FROM product_media WHERE product_id = $1 ORDER BY id",
    )
    .bind(parent.id)
    .fetch_all(pool)
    .await?;

    let skus: Vec<SkuRow> = sqlx::query_as(
        "SELECT color_code, size_code, sku FROM product_skus WHERE product_id = $1 ORDER BY id",
    )
    .bind(parent.id)
    .fetch_all(pool)
    .await?;

    let attributes: Vec<AttributeRow> = sqlx::query_as(
        "SELECT key, value FROM product_attributes WHERE product_id = $1 ORDER BY id",
    )
    .bind(parent.id)
    .fetch_all(pool)
    .await?;

    Ok(Some(ProductRecord {
        supplier_part_id: parent.supplier_part_id,
        name: parent.name,
        brand: parent.brand,
        default_color: parent.default_color,
        colors: colors
            .into_iter()
            .map(|c| ColorEntry {
                code: c.code,
                name: c.name,
                swatch_url: c.swatch_url,
                from_inventory: c.from_inventory,
            })
            .collect(),
        sizes: sizes
            .into_iter()
            .map(|s| SizeEntry {
                code: s.code,
                display: s.display,
                sort_order: s.sort_order,
            })
            .collect(),
        media: media
            .into_iter()
            .map(|m| MediaEntry {
                color_code: m.color_code,
                url: m.url,
                kind: m.kind,
            })
            .collect(),
        sku_map: skus
            .into_iter()
            .map(|s| SkuMapEntry {
                color_code: s.color_code,
                size_code: s.size_code,
                sku: s.sku,
            })
            .collect(),
        attributes: attributes.into_iter().map(|a| (a.key, a.value)).collect(),
    }))
}

/// Upserts the product and fully replaces its child collections.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the transaction fails; nothing is written
/// on failure.
pub async fn upsert_product(
    pool: &PgPool,
    supplier: Supplier,
    record: &ProductRecord,
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    let (product_id,): (i64,) = sqlx::query_as(
        "INSERT INTO products (supplier, supplier_part_id, name, brand, default_color) \
         VALUES ($1, UPPER($2), $3, $4, $5) \
         ON CONFLICT (supplier, supplier_part_id) DO UPDATE SET \
             name          = EXCLUDED.name, \
             brand         = COALESCE(EXCLUDED.brand, products.brand), \
             default_color = EXCLUDED.default_color, \
             updated_at    = NOW() \
         RETURNING id",
    )
    .bind(supplier.as_str())
    .bind(&record.supplier_part_id)
    .bind(&record.name)
    .bind(record.brand.as_deref())
    .bind(record.default_color.as_deref())
    .fetch_one(&mut *tx)
    .await?;

    replace_children(&mut tx, product_id, record).await?;

    tx.commit().await?;
    Ok(())
}

async fn replace_children(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i64,
    record: &ProductRecord,
) -> Result<(), DbError> {
    for table in [
        "product_colors",
        "product_sizes",
        "product_media",
        "product_skus",
        "product_attributes",
    ] {
        sqlx::query(&format!("DELETE FROM {table} WHERE product_id = $1"))
            .bind(product_id)
            .execute(&mut **tx)
            .await?;
    }

    for color in &record.colors {
        sqlx::query(
            "INSERT INTO product_colors (product_id, code, name, swatch_url, from_inventory) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(product_id)
        .bind(&color.code)
        .bind(&color.name)
        .bind(color.swatch_url.as_deref())
        .bind(color.from_inventory)
        .execute(&mut **tx)
        .await?;
    }

    for size in &record.sizes {
        sqlx::query(
            "INSERT INTO product_sizes (product_id, code, display, sort_order) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(product_id)
        .bind(&size.code)
        .bind(&size.display)
        .bind(size.sort_order)
        .execute(&mut **tx)
        .await?;
    }

    for media in &record.media {
        sqlx::query(
            "INSERT INTO product_media (product_id, color_code, url, kind) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(product_id)
        .bind(&media.color_code)
        .bind(&media.url)
        .bind(media.kind.as_deref())
        .execute(&mut **tx)
        .await?;
    }

    for sku in &record.sku_map {
        sqlx::query(
            "INSERT INTO product_skus (product_id, color_code, size_code, sku) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(product_id)
        .bind(&sku.color_code)
        .bind(&sku.size_code)
        .bind(&sku.sku)
        .execute(&mut **tx)
        .await?;
    }

    for (key, value) in &record.attributes {
        sqlx::query("INSERT INTO product_attributes (product_id, key, value) VALUES ($1, $2, $3)")
            .bind(product_id)
            .bind(key)
            .bind(value)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}
