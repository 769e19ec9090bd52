//! Wires the Postgres stores, optional S&S live source, and in-process cache
//! into the loader and search ranker the API handlers hold.

use std::sync::Arc;
use std::time::Duration;

use stitchdb_core::{AppConfig, WarehouseDirectory};
use stitchdb_db::{PgCatalogStore, PgInventoryStore};
use stitchdb_engine::{
    LiveProductSource, MemoryCache, SearchRanker, SupplierProductLoader,
};
use stitchdb_ssactivewear::{SsClient, SsCredentials, SsLiveSource};

pub struct EngineHandles {
    pub loader: Arc<SupplierProductLoader>,
    pub ranker: Arc<SearchRanker>,
}

pub fn build_engine(config: &AppConfig, pool: sqlx::PgPool) -> anyhow::Result<EngineHandles> {
    let directory = Arc::new(match &config.warehouses_path {
        Some(path) => stitchdb_core::load_warehouse_directory(path)?,
        None => WarehouseDirectory::builtin(),
    });

    let catalog = Arc::new(PgCatalogStore::new(pool.clone()));
    let inventory = Arc::new(PgInventoryStore::new(pool));
    let cache = Arc::new(MemoryCache::new());

    let live: Option<Arc<dyn LiveProductSource>> =
        match (&config.ss_account_number, &config.ss_api_key) {
            (Some(account), Some(key)) => {
                let client = SsClient::with_base_url(
                    SsCredentials {
                        account_number: account.clone(),
                        api_key: key.clone(),
                    },
                    config.request_timeout_secs,
                    config.max_retries,
                    config.retry_backoff_base_secs,
                    &config.ss_base_url,
                )?;
                Some(Arc::new(SsLiveSource::new(client, (*directory).clone())))
            }
            _ => {
                tracing::warn!(
                    "S&S credentials not configured; live product lookups disabled"
                );
                None
            }
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

    Ok(EngineHandles { loader, ranker })
}
