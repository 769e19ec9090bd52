//! Dependency-injected persistence and live-source seams.
//!
//! The engine never holds a pool or HTTP client directly; it talks to these
//! traits. `stitchdb-db` implements the stores over Postgres and
//! `stitchdb-ssactivewear` implements the live source over the S&S API.

use async_trait::async_trait;

use stitchdb_core::{CanonicalStyle, InventoryRow, ProductRecord, Supplier, SupplierLink};

/// Boxed error at the trait seam; callers decide whether a failure is fatal.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A search candidate: a canonical style together with its supplier links.
#[derive(Debug, Clone)]
pub struct StyleCandidate {
    pub style: CanonicalStyle,
    pub links: Vec<SupplierLink>,
}

/// Canonical styles, supplier links, and per-supplier product records.
///
/// All string lookups are case-insensitive; implementations upper-case
/// inputs before comparison.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_style_by_number(
        &self,
        style_number: &str,
    ) -> Result<Option<CanonicalStyle>, BoxError>;

    async fn get_style_by_id(&self, id: i64) -> Result<Option<CanonicalStyle>, BoxError>;

    /// Finds the canonical style owning `part_id` under any supplier.
    async fn find_style_by_part(&self, part_id: &str)
        -> Result<Option<CanonicalStyle>, BoxError>;

    async fn get_link(
        &self,
        supplier: Supplier,
        part_id: &str,
    ) -> Result<Option<SupplierLink>, BoxError>;

    async fn links_for_style(&self, canonical_style_id: i64)
        -> Result<Vec<SupplierLink>, BoxError>;

    /// Upserts by style number, updating display name and brand in place.
    async fn upsert_style(
        &self,
        style_number: &str,
        display_name: &str,
        brand: Option<&str>,
    ) -> Result<CanonicalStyle, BoxError>;

    /// Upserts the `(supplier, part_id)` link, repointing the canonical
    /// style id on conflict.
    async fn upsert_link(
        &self,
        canonical_style_id: i64,
        supplier: Supplier,
        part_id: &str,
    ) -> Result<SupplierLink, BoxError>;

    async fn get_product(
        &self,
        supplier: Supplier,
        part_id: &str,
    ) -> Result<Option<ProductRecord>, BoxError>;

    /// Upserts the product, fully replacing child collections.
    async fn upsert_product(
        &self,
        supplier: Supplier,
        record: &ProductRecord,
    ) -> Result<(), BoxError>;

    /// Case-insensitive substring candidates across style number, display
    /// name, brand, and linked supplier part ids.
    async fn search_candidates(&self, query: &str) -> Result<Vec<StyleCandidate>, BoxError>;
}

/// Raw inventory rows and the observed warehouse directory.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn rows_for_part(
        &self,
        supplier: Supplier,
        part_id: &str,
    ) -> Result<Vec<InventoryRow>, BoxError>;

    /// Idempotent-replace: deletes the supplier's scope (optionally one part)
    /// and inserts `rows` in a single transaction. Returns rows written.
    ///
    /// Concurrent runs over the same scope are not serialized here; last
    /// commit wins. Operators schedule at most one import per supplier.
    async fn replace_scope(
        &self,
        supplier: Supplier,
        part_filter: Option<&str>,
        rows: Vec<InventoryRow>,
    ) -> Result<u64, BoxError>;

    async fn upsert_row(&self, row: &InventoryRow) -> Result<(), BoxError>;

    /// Distinct `(canonical_id, display_name)` warehouses ever reported by
    /// this supplier, zero-stock warehouses included.
    async fn warehouse_directory(
        &self,
        supplier: Supplier,
    ) -> Result<Vec<(String, String)>, BoxError>;
}

/// Live product+inventory fetch for a supplier exposed through an API
/// rather than the durable store. Failures are non-fatal to bundle loads.
#[async_trait]
pub trait LiveProductSource: Send + Sync {
    fn supplier(&self) -> Supplier;

    async fn fetch_product(&self, part_id: &str) -> Result<Option<ProductRecord>, BoxError>;

    async fn fetch_inventory(&self, part_id: &str) -> Result<Vec<InventoryRow>, BoxError>;
}
