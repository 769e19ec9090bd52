//! Catalog and inventory import pipelines.
//!
//! Both pipelines paginate the style list and continue past per-style
//! failures; a failed style is logged and counted, never fatal. List-page
//! failures are fatal since they leave the pagination position unknown.

use std::time::Duration;

use tracing::{info, warn};

use stitchdb_core::{Supplier, WarehouseDirectory};
use stitchdb_engine::{CanonicalStyleRegistry, CatalogStore, InventoryStore};

use crate::client::SsClient;
use crate::normalize::{build_product_record, group_inventory};
use crate::types::SsStyle;
use crate::SsError;

/// Guard against cycling pagination.
const MAX_PAGES: u32 = 500;

/// Narrowing options for a catalog or inventory run.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub brand: Option<String>,
    pub category: Option<String>,
    /// Stop after this many styles.
    pub limit: Option<usize>,
}

/// Per-item outcome counters for one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub succeeded: u64,
    pub failed: u64,
    pub rows_written: u64,
}

/// Imports the S&S catalog: paginated style list, per-style variants grouped
/// into a [`stitchdb_core::ProductRecord`], upserted and linked into the
/// canonical registry.
///
/// # Errors
///
/// Returns [`SsError`] when a style-list page cannot be fetched or
/// pagination exceeds the page guard. Per-style failures are counted in the
/// report instead.
pub async fn import_catalog(
    client: &SsClient,
    filter: &CatalogFilter,
    catalog: &dyn CatalogStore,
    registry: &CanonicalStyleRegistry,
    page_size: u32,
    inter_request_delay_ms: u64,
) -> Result<ImportReport, SsError> {
    let styles = collect_styles(client, filter, page_size, inter_request_delay_ms).await?;
    let mut report = ImportReport::default();

    for style in &styles {
        pause(inter_request_delay_ms).await;
        match import_one_style(client, catalog, registry, style).await {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                report.failed += 1;
                warn!(
                    supplier = %Supplier::SsActivewear,
                    style = %style.style_name,
                    error = %e,
                    "catalog import failed for style"
                );
            }
        }
    }

    info!(
        supplier = %Supplier::SsActivewear,
        succeeded = report.succeeded,
        failed = report.failed,
        "catalog import finished"
    );
    Ok(report)
}

async fn import_one_style(
    client: &SsClient,
    catalog: &dyn CatalogStore,
    registry: &CanonicalStyleRegistry,
    style: &SsStyle,
) -> Result<(), SsError> {
    let variants = client.products_for_style(&style.style_name).await?;
    let Some(record) = build_product_record(style, &variants) else {
        return Ok(());
    };
    catalog
        .upsert_product(Supplier::SsActivewear, &record)
        .await
        .map_err(SsError::Store)?;
    registry
        .ensure_link(
            Supplier::SsActivewear,
            &record.supplier_part_id,
            None,
            Some(&style.title),
            style.brand_name.as_deref(),
        )
        .await?;
    Ok(())
}

/// Imports S&S inventory: per-style per-SKU warehouse quantities aggregated
/// into rows keyed `(part, color_code, size_code)` and upserted in place.
///
/// With a `part_filter` only that style is fetched; otherwise the paginated
/// style list drives the run.
///
/// # Errors
///
/// Same failure contract as [`import_catalog`].
pub async fn import_inventory(
    client: &SsClient,
    part_filter: Option<&str>,
    filter: &CatalogFilter,
    inventory: &dyn InventoryStore,
    directory: &WarehouseDirectory,
    page_size: u32,
    inter_request_delay_ms: u64,
) -> Result<ImportReport, SsError> {
    let style_names: Vec<String> = match part_filter {
        Some(part) => vec![part.to_string()],
        None => collect_styles(client, filter, page_size, inter_request_delay_ms)
            .await?
            .into_iter()
            .map(|s| s.style_name)
            .collect(),
    };

    let mut report = ImportReport::default();
    for style_name in &style_names {
        pause(inter_request_delay_ms).await;
        match import_one_inventory(client, inventory, directory, style_name).await {
            Ok(written) => {
                report.succeeded += 1;
                report.rows_written += written;
            }
            Err(e) => {
                report.failed += 1;
                warn!(
                    supplier = %Supplier::SsActivewear,
                    style = %style_name,
                    error = %e,
                    "inventory import failed for style"
                );
            }
        }
    }

    info!(
        supplier = %Supplier::SsActivewear,
        succeeded = report.succeeded,
        failed = report.failed,
        rows_written = report.rows_written,
        "inventory import finished"
    );
    Ok(report)
}

async fn import_one_inventory(
    client: &SsClient,
    inventory: &dyn InventoryStore,
    directory: &WarehouseDirectory,
    style_name: &str,
) -> Result<u64, SsError> {
    let items = client.inventory_for_style(style_name).await?;
    let rows = group_inventory(style_name, &items, directory);
    let mut written = 0u64;
    for row in &rows {
        inventory.upsert_row(row).await.map_err(SsError::Store)?;
        written += 1;
    }
    Ok(written)
}

/// Walks the paginated style list, honoring the filter's style limit and
/// pausing between page fetches.
async fn collect_styles(
    client: &SsClient,
    filter: &CatalogFilter,
    page_size: u32,
    inter_request_delay_ms: u64,
) -> Result<Vec<SsStyle>, SsError> {
    let mut styles = Vec::new();

    for page in 1..=MAX_PAGES {
        if page > 1 {
            pause(inter_request_delay_ms).await;
        }
        let batch = client
            .list_styles(
                page,
                page_size,
                filter.brand.as_deref(),
                filter.category.as_deref(),
            )
            .await?;
        let last_page = batch.len() < page_size as usize;

        for style in batch {
            if filter.limit.is_some_and(|limit| styles.len() >= limit) {
                return Ok(styles);
            }
            styles.push(style);
        }

        if last_page {
            return Ok(styles);
        }
    }

    Err(SsError::PaginationLimit {
        max_pages: MAX_PAGES,
    })
}

async fn pause(inter_request_delay_ms: u64) {
    if inter_request_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
    }
}
