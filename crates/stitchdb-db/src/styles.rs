//! Database operations for `canonical_styles` and `supplier_links`.
//!
//! All identifier comparisons are case-insensitive and values are stored
//! upper-cased, so lookups by id or alias cannot drift apart on casing.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use stitchdb_core::{CanonicalStyle, Supplier, SupplierLink};

use crate::DbError;

/// Cap on candidate styles returned by a single search, before enrichment.
const MAX_CANDIDATES: i64 = 100;

/// A row from the `canonical_styles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StyleRow {
    pub id: i64,
    pub style_number: String,
    pub display_name: String,
    pub brand: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StyleRow> for CanonicalStyle {
    fn from(row: StyleRow) -> Self {
        CanonicalStyle {
            id: row.id,
            style_number: row.style_number,
            display_name: row.display_name,
            brand: row.brand,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row from the `supplier_links` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SupplierLinkRow {
    pub id: i64,
    pub canonical_style_id: i64,
    pub supplier: String,
    pub supplier_part_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SupplierLinkRow> for SupplierLink {
    type Error = DbError;

    fn try_from(row: SupplierLinkRow) -> Result<Self, Self::Error> {
        let supplier = row
            .supplier
            .parse::<Supplier>()
            .map_err(DbError::UnknownSupplier)?;
        Ok(SupplierLink {
            id: row.id,
            canonical_style_id: row.canonical_style_id,
            supplier,
            supplier_part_id: row.supplier_part_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Upserts a canonical style by style number.
///
/// Display name is refreshed on every call; brand only when a new value is
/// provided, so a supplier feed without brands cannot erase a known one.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_canonical_style(
    pool: &PgPool,
    style_number: &str,
    display_name: &str,
    brand: Option<&str>,
) -> Result<CanonicalStyle, DbError> {
    let row: StyleRow = sqlx::query_as(
        "INSERT INTO canonical_styles (style_number, display_name, brand) \
         VALUES (UPPER($1), $2, $3) \
         ON CONFLICT (style_number) DO UPDATE SET \
             display_name = EXCLUDED.display_name, \
             brand        = COALESCE(EXCLUDED.brand, canonical_styles.brand), \
             updated_at   = NOW() \
         RETURNING *",
    )
    .bind(style_number)
    .bind(display_name)
    .bind(brand)
    .fetch_one(pool)
    .await?;
    Ok(row.into())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_style_by_number(
    pool: &PgPool,
    style_number: &str,
) -> Result<Option<CanonicalStyle>, DbError> {
    let row: Option<StyleRow> =
        sqlx::query_as("SELECT * FROM canonical_styles WHERE style_number = UPPER($1)")
            .bind(style_number)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(Into::into))
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_style_by_id(pool: &PgPool, id: i64) -> Result<Option<CanonicalStyle>, DbError> {
    let row: Option<StyleRow> = sqlx::query_as("SELECT * FROM canonical_styles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Into::into))
}

/// Finds the canonical style owning a part id under any supplier.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_style_by_part(
    pool: &PgPool,
    part_id: &str,
) -> Result<Option<CanonicalStyle>, DbError> {
    let row: Option<StyleRow> = sqlx::query_as(
        "SELECT s.* FROM canonical_styles s \
         JOIN supplier_links l ON l.canonical_style_id = s.id \
         WHERE l.supplier_part_id = UPPER($1) \
         LIMIT 1",
    )
    .bind(part_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Into::into))
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or [`DbError::UnknownSupplier`]
/// on corrupt supplier data.
pub async fn get_link(
    pool: &PgPool,
    supplier: Supplier,
    part_id: &str,
) -> Result<Option<SupplierLink>, DbError> {
    let row: Option<SupplierLinkRow> = sqlx::query_as(
        "SELECT * FROM supplier_links WHERE supplier = $1 AND supplier_part_id = UPPER($2)",
    )
    .bind(supplier.as_str())
    .bind(part_id)
    .fetch_optional(pool)
    .await?;
    row.map(TryInto::try_into).transpose()
}

/// Upserts the `(supplier, part)` link, repointing the canonical style id
/// on conflict. This is the last-writer-wins re-link path; the audit log
/// lives in the engine's registry, which sees both sides of the move.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_link(
    pool: &PgPool,
    canonical_style_id: i64,
    supplier: Supplier,
    part_id: &str,
) -> Result<SupplierLink, DbError> {
    let row: SupplierLinkRow = sqlx::query_as(
        "INSERT INTO supplier_links (canonical_style_id, supplier, supplier_part_id) \
         VALUES ($1, $2, UPPER($3)) \
         ON CONFLICT (supplier, supplier_part_id) DO UPDATE SET \
             canonical_style_id = EXCLUDED.canonical_style_id, \
             updated_at         = NOW() \
         RETURNING *",
    )
    .bind(canonical_style_id)
    .bind(supplier.as_str())
    .bind(part_id)
    .fetch_one(pool)
    .await?;
    row.try_into()
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or [`DbError::UnknownSupplier`]
/// on corrupt supplier data.
pub async fn links_for_style(
    pool: &PgPool,
    canonical_style_id: i64,
) -> Result<Vec<SupplierLink>, DbError> {
    let rows: Vec<SupplierLinkRow> = sqlx::query_as(
        "SELECT * FROM supplier_links WHERE canonical_style_id = $1 ORDER BY supplier",
    )
    .bind(canonical_style_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(TryInto::try_into).collect()
}

/// Case-insensitive substring candidates across style number, display name,
/// brand, and linked part ids, capped at [`MAX_CANDIDATES`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or [`DbError::UnknownSupplier`]
/// on corrupt supplier data.
pub async fn search_candidates(
    pool: &PgPool,
    query: &str,
) -> Result<Vec<(CanonicalStyle, Vec<SupplierLink>)>, DbError> {
    let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
    let styles: Vec<StyleRow> = sqlx::query_as(
        "SELECT DISTINCT s.* FROM canonical_styles s \
         LEFT JOIN supplier_links l ON l.canonical_style_id = s.id \
         WHERE s.style_number ILIKE $1 \
            OR s.display_name ILIKE $1 \
            OR s.brand ILIKE $1 \
            OR l.supplier_part_id ILIKE $1 \
         ORDER BY s.style_number \
         LIMIT $2",
    )
    .bind(&pattern)
    .bind(MAX_CANDIDATES)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(styles.len());
    for style in styles {
        let links = links_for_style(pool, style.id).await?;
        out.push((style.into(), links));
    }
    Ok(out)
}
