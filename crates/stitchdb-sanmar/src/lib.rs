//! SanMar inventory feed import.
//!
//! SanMar publishes stock as a pipe-delimited flat file, one row per
//! `(part, color name, size, warehouse)` cell. This crate streams the file,
//! aggregates cells into per-part inventory rows, resolves raw color names
//! against the stored catalog, and replaces the SanMar inventory scope in
//! one transaction.

pub mod import;
pub mod parse;

pub use import::{import_feed_file, import_feed_reader, ImportReport};
pub use parse::{parse_feed_line, FeedLine};

use std::path::PathBuf;

use thiserror::Error;

use stitchdb_engine::BoxError;

#[derive(Debug, Error)]
pub enum SanmarError {
    #[error("failed to read feed file {path}: {source}")]
    FeedIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store operation failed: {0}")]
    Store(#[source] BoxError),
}
