//! Command handlers, called from `main` after config and pool setup.
//!
//! Import handlers print their report counters; query handlers print
//! pretty JSON so output can be piped into `jq`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::PgPool;

use stitchdb_core::{AppConfig, StyleMap, Supplier, WarehouseDirectory};
use stitchdb_db::{PgCatalogStore, PgInventoryStore};
use stitchdb_engine::{
    CanonicalStyleRegistry, LiveProductSource, MemoryCache, SearchQuery, SearchRanker, SortMode,
    SupplierProductLoader,
};
use stitchdb_sanmar::import_feed_file;
use stitchdb_ssactivewear::{
    import_catalog, import_inventory, CatalogFilter, SsClient, SsCredentials, SsLiveSource,
};

fn warehouse_directory(config: &AppConfig) -> anyhow::Result<WarehouseDirectory> {
    Ok(match &config.warehouses_path {
        Some(path) => stitchdb_core::load_warehouse_directory(path)?,
        None => WarehouseDirectory::builtin(),
    })
}

fn style_map(config: &AppConfig) -> anyhow::Result<StyleMap> {
    Ok(match &config.style_map_path {
        Some(path) => stitchdb_core::load_style_map(path)?,
        None => StyleMap::default(),
    })
}

fn ss_client(config: &AppConfig) -> anyhow::Result<SsClient> {
    let (account, key) = config
        .ss_account_number
        .as_ref()
        .zip(config.ss_api_key.as_ref())
        .context("S&S credentials are not configured (STITCHDB_SS_ACCOUNT_NUMBER / STITCHDB_SS_API_KEY)")?;
    Ok(SsClient::with_base_url(
        SsCredentials {
            account_number: account.clone(),
            api_key: key.clone(),
        },
        config.request_timeout_secs,
        config.max_retries,
        config.retry_backoff_base_secs,
        &config.ss_base_url,
    )?)
}

fn build_ranker(
    config: &AppConfig,
    pool: &PgPool,
) -> anyhow::Result<(Arc<SupplierProductLoader>, Arc<SearchRanker>)> {
    let directory = Arc::new(warehouse_directory(config)?);
    let catalog = Arc::new(PgCatalogStore::new(pool.clone()));
    let inventory = Arc::new(PgInventoryStore::new(pool.clone()));
    let cache = Arc::new(MemoryCache::new());

    let live: Option<Arc<dyn LiveProductSource>> =
        match ss_client(config) {
            Ok(client) => Some(Arc::new(SsLiveSource::new(
                client,
                (*directory).clone(),
            ))),
            Err(_) => None,
        };

    let loader = Arc::new(SupplierProductLoader::new(
        catalog.clone(),
        inventory,
        live,
        cache.clone(),
        directory,
        Duration::from_secs(config.inventory_cache_ttl_secs),
    ));
    let ranker = Arc::new(SearchRanker::new(
        catalog,
        loader.clone(),
        cache,
        Duration::from_secs(config.search_cache_ttl_secs),
    ));
    Ok((loader, ranker))
}

pub(crate) async fn import_sanmar(
    config: &AppConfig,
    pool: &PgPool,
    file: Option<PathBuf>,
    style: Option<&str>,
) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(|| config.sanmar_feed_path.clone());
    tracing::info!(feed = %path.display(), "starting sanmar inventory import");
    let directory = warehouse_directory(config)?;
    let catalog = PgCatalogStore::new(pool.clone());
    let inventory = PgInventoryStore::new(pool.clone());

    let report = import_feed_file(&path, style, &catalog, &inventory, &directory).await?;
    println!(
        "sanmar import: processed={} skipped={} rows_written={}",
        report.processed, report.skipped, report.rows_written
    );
    Ok(())
}

pub(crate) async fn import_ss_catalog(
    config: &AppConfig,
    pool: &PgPool,
    brand: Option<String>,
    category: Option<String>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let client = ss_client(config)?;
    let catalog = Arc::new(PgCatalogStore::new(pool.clone()));
    let registry = CanonicalStyleRegistry::new(catalog.clone(), style_map(config)?);
    let filter = CatalogFilter {
        brand,
        category,
        limit,
    };

    let report = import_catalog(
        &client,
        &filter,
        catalog.as_ref(),
        &registry,
        config.ss_page_size,
        config.inter_request_delay_ms,
    )
    .await?;
    println!(
        "ss catalog import: succeeded={} failed={}",
        report.succeeded, report.failed
    );
    Ok(())
}

pub(crate) async fn import_ss_inventory(
    config: &AppConfig,
    pool: &PgPool,
    style: Option<&str>,
) -> anyhow::Result<()> {
    let client = ss_client(config)?;
    let inventory = PgInventoryStore::new(pool.clone());
    let directory = warehouse_directory(config)?;

    let report = import_inventory(
        &client,
        style,
        &CatalogFilter::default(),
        &inventory,
        &directory,
        config.ss_page_size,
        config.inter_request_delay_ms,
    )
    .await?;
    println!(
        "ss inventory import: succeeded={} failed={} rows_written={}",
        report.succeeded, report.failed, report.rows_written
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(crate) async fn search(
    config: &AppConfig,
    pool: &PgPool,
    query: &str,
    suppliers: &[String],
    sort: &str,
    in_stock_only: bool,
    limit: usize,
    offset: usize,
) -> anyhow::Result<()> {
    let (_, ranker) = build_ranker(config, pool)?;

    let parsed_suppliers = if suppliers.is_empty() {
        None
    } else {
        let mut out = Vec::new();
        for raw in suppliers {
            let supplier = raw
                .parse::<Supplier>()
                .map_err(|e| anyhow::anyhow!(e))?;
            if !out.contains(&supplier) {
                out.push(supplier);
            }
        }
        Some(out)
    };

    let mut search_query = SearchQuery::new(query);
    search_query.suppliers = parsed_suppliers;
    search_query.sort = sort.parse::<SortMode>().map_err(|e| anyhow::anyhow!(e))?;
    search_query.in_stock_only = in_stock_only;
    search_query.limit = limit;
    search_query.offset = offset;

    let results = ranker.search(&search_query).await?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

pub(crate) async fn product(
    config: &AppConfig,
    pool: &PgPool,
    identifier: &str,
) -> anyhow::Result<()> {
    let (loader, _) = build_ranker(config, pool)?;
    let bundle = loader.load_bundle(identifier).await?;
    println!("{}", serde_json::to_string_pretty(&bundle)?);
    Ok(())
}
