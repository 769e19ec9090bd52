//! Catalog reconciliation and inventory aggregation engine.
//!
//! Everything here works against injected [`store`] traits so the registry,
//! loader, and ranker are testable with in-memory fakes, and so the
//! Postgres-backed implementations in `stitchdb-db` stay swappable.

pub mod cache;
pub mod loader;
pub mod matrix;
pub mod registry;
pub mod search;
pub mod store;

#[cfg(test)]
mod testing;

pub use cache::{Cache, MemoryCache};
pub use loader::{
    CanonicalSummary, FetchSource, ProductBundle, SupplierProductLoader, SupplierView,
};
pub use matrix::{build_matrix, flatten_rows, FlatInventoryLine, StockMatrix, WarehouseRow};
pub use registry::CanonicalStyleRegistry;
pub use search::{
    CanonicalSearchResult, SearchQuery, SearchRanker, SearchResults, SortMode,
};
pub use store::{BoxError, CatalogStore, InventoryStore, LiveProductSource, StyleCandidate};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[source] BoxError),
    #[error("cache payload could not be decoded: {0}")]
    CacheDecode(#[from] serde_json::Error),
}
