//! S&S Activewear REST integration.
//!
//! S&S exposes the catalog through a Basic-auth JSON API: a paginated style
//! list plus per-style product and inventory endpoints. This crate wraps the
//! API in a typed client with retry/backoff, normalizes responses into the
//! shared domain types, and provides the catalog/inventory import pipelines
//! and the live product source used for stale-while-revalidate lookups.

pub mod client;
pub mod import;
pub mod live;
pub mod normalize;
mod retry;
pub mod types;

pub use client::{SsClient, SsCredentials};
pub use import::{import_catalog, import_inventory, CatalogFilter, ImportReport};
pub use live::SsLiveSource;
pub use normalize::{build_product_record, group_inventory};

use thiserror::Error;

use stitchdb_engine::BoxError;

#[derive(Debug, Error)]
pub enum SsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by S&S (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("pagination limit reached: exceeded {max_pages} pages")]
    PaginationLimit { max_pages: u32 },

    #[error("store operation failed: {0}")]
    Store(#[source] BoxError),

    #[error("registry operation failed: {0}")]
    Registry(#[from] stitchdb_engine::EngineError),
}
