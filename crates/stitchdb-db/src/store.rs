//! Postgres-backed implementations of the engine's store traits.
//!
//! Thin adapters: each method delegates to the free functions in this crate
//! and boxes [`crate::DbError`] at the trait seam.

use async_trait::async_trait;
use sqlx::PgPool;

use stitchdb_core::{CanonicalStyle, InventoryRow, ProductRecord, Supplier, SupplierLink};
use stitchdb_engine::{BoxError, CatalogStore, InventoryStore, StyleCandidate};

use crate::{inventory, products, styles};

#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn get_style_by_number(
        &self,
        style_number: &str,
    ) -> Result<Option<CanonicalStyle>, BoxError> {
        Ok(styles::get_style_by_number(&self.pool, style_number).await?)
    }

    async fn get_style_by_id(&self, id: i64) -> Result<Option<CanonicalStyle>, BoxError> {
        Ok(styles::get_style_by_id(&self.pool, id).await?)
    }

    async fn find_style_by_part(
        &self,
        part_id: &str,
    ) -> Result<Option<CanonicalStyle>, BoxError> {
        Ok(styles::find_style_by_part(&self.pool, part_id).await?)
    }

    async fn get_link(
        &self,
        supplier: Supplier,
        part_id: &str,
    ) -> Result<Option<SupplierLink>, BoxError> {
        Ok(styles::get_link(&self.pool, supplier, part_id).await?)
    }

    async fn links_for_style(
        &self,
        canonical_style_id: i64,
    ) -> Result<Vec<SupplierLink>, BoxError> {
        Ok(styles::links_for_style(&self.pool, canonical_style_id).await?)
    }

    async fn upsert_style(
        &self,
        style_number: &str,
        display_name: &str,
        brand: Option<&str>,
    ) -> Result<CanonicalStyle, BoxError> {
        Ok(styles::upsert_canonical_style(&self.pool, style_number, display_name, brand).await?)
    }

    async fn upsert_link(
        &self,
        canonical_style_id: i64,
        supplier: Supplier,
        part_id: &str,
    ) -> Result<SupplierLink, BoxError> {
        Ok(styles::upsert_link(&self.pool, canonical_style_id, supplier, part_id).await?)
    }

    async fn get_product(
        &self,
        supplier: Supplier,
        part_id: &str,
    ) -> Result<Option<ProductRecord>, BoxError> {
        Ok(products::get_product(&self.pool, supplier, part_id).await?)
    }

    async fn upsert_product(
        &self,
        supplier: Supplier,
        record: &ProductRecord,
    ) -> Result<(), BoxError> {
        Ok(products::upsert_product(&self.pool, supplier, record).await?)
    }

    async fn search_candidates(&self, query: &str) -> Result<Vec<StyleCandidate>, BoxError> {
        let candidates = styles::search_candidates(&self.pool, query).await?;
        Ok(candidates
            .into_iter()
            .map(|(style, links)| StyleCandidate { style, links })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn rows_for_part(
        &self,
        supplier: Supplier,
        part_id: &str,
    ) -> Result<Vec<InventoryRow>, BoxError> {
        Ok(inventory::rows_for_part(&self.pool, supplier, part_id).await?)
    }

    async fn replace_scope(
        &self,
        supplier: Supplier,
        part_filter: Option<&str>,
        rows: Vec<InventoryRow>,
    ) -> Result<u64, BoxError> {
        Ok(inventory::replace_inventory_scope(&self.pool, supplier, part_filter, rows).await?)
    }

    async fn upsert_row(&self, row: &InventoryRow) -> Result<(), BoxError> {
        Ok(inventory::upsert_inventory_row(&self.pool, row).await?)
    }

    async fn warehouse_directory(
        &self,
        supplier: Supplier,
    ) -> Result<Vec<(String, String)>, BoxError> {
        Ok(inventory::warehouse_directory(&self.pool, supplier).await?)
    }
}
