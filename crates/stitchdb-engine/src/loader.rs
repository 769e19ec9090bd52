//! Cross-supplier product bundle loading.
//!
//! One identifier in — canonical style number or either supplier's part id —
//! and a bundle out: the resolved canonical summary, each supplier's product
//! record and inventory, per-supplier fetch metadata, and a primary supplier
//! chosen by fixed priority. Individual supplier failures degrade to
//! warnings; only store failures during canonical resolution are fatal.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use stitchdb_core::{
    normalize_style_number, CanonicalStyle, InventoryRow, MediaEntry, ProductRecord, Supplier,
    WarehouseDirectory,
};

use crate::cache::Cache;
use crate::store::{CatalogStore, InventoryStore, LiveProductSource};
use crate::EngineError;

/// Where a supplier's data in a bundle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchSource {
    /// Read from the durable store.
    Store,
    /// Served from the short-TTL cache; a background refresh was kicked off.
    Cached,
    /// Fetched from the live API on this request.
    Live,
}

/// One supplier's slice of a bundle.
#[derive(Debug, Clone, Serialize)]
pub struct SupplierView {
    pub supplier: Supplier,
    pub product: ProductRecord,
    pub inventory: Vec<InventoryRow>,
    /// Raw `(id, name)` warehouse directory for zero-row fill.
    pub warehouses: Vec<(String, String)>,
    pub source: FetchSource,
    pub warnings: Vec<String>,
}

/// Canonical identity carried by a bundle. `registered` is false when the
/// summary was synthesized because no registry entry exists yet.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalSummary {
    pub style_number: String,
    pub display_name: String,
    pub brand: Option<String>,
    pub registered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductBundle {
    pub identifier: String,
    pub canonical: Option<CanonicalSummary>,
    /// In supplier priority order; suppliers with no data are absent.
    pub suppliers: Vec<SupplierView>,
    pub primary_supplier: Option<Supplier>,
    /// Bundle-level degradations (a supplier that resolved no view).
    pub warnings: Vec<String>,
}

impl ProductBundle {
    #[must_use]
    pub fn view_for(&self, supplier: Supplier) -> Option<&SupplierView> {
        self.suppliers.iter().find(|v| v.supplier == supplier)
    }

    #[must_use]
    pub fn primary_product(&self) -> Option<&ProductRecord> {
        self.primary_supplier
            .and_then(|s| self.view_for(s))
            .map(|v| &v.product)
    }
}

/// Cached live payload for one supplier part.
#[derive(Debug, Serialize, Deserialize)]
struct CachedLivePayload {
    product: Option<ProductRecord>,
    inventory: Vec<InventoryRow>,
}

pub struct SupplierProductLoader {
    catalog: Arc<dyn CatalogStore>,
    inventory: Arc<dyn InventoryStore>,
    live: Option<Arc<dyn LiveProductSource>>,
    cache: Arc<dyn Cache>,
    resolver: Arc<WarehouseDirectory>,
    live_cache_ttl: Duration,
}

impl SupplierProductLoader {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        inventory: Arc<dyn InventoryStore>,
        live: Option<Arc<dyn LiveProductSource>>,
        cache: Arc<dyn Cache>,
        resolver: Arc<WarehouseDirectory>,
        live_cache_ttl: Duration,
    ) -> Self {
        Self {
            catalog,
            inventory,
            live,
            cache,
            resolver,
            live_cache_ttl,
        }
    }

    #[must_use]
    pub fn resolver(&self) -> &Arc<WarehouseDirectory> {
        &self.resolver
    }

    /// Loads the cross-supplier bundle for a free-form identifier.
    ///
    /// A completely unresolved identifier is not an error: the bundle comes
    /// back with no canonical summary and no supplier views.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] only when canonical resolution itself
    /// fails; per-supplier fetch failures are demoted to warnings.
    pub async fn load_bundle(&self, identifier: &str) -> Result<ProductBundle, EngineError> {
        let ident = normalize_style_number(identifier);

        // Resolve canonical identity: any supplier part first, then style
        // number. Part ids are the more specific namespace.
        let canonical: Option<CanonicalStyle> = match self
            .catalog
            .find_style_by_part(&ident)
            .await
            .map_err(EngineError::Store)?
        {
            Some(style) => Some(style),
            None => self
                .catalog
                .get_style_by_number(&ident)
                .await
                .map_err(EngineError::Store)?,
        };

        let links = match &canonical {
            Some(style) => self
                .catalog
                .links_for_style(style.id)
                .await
                .map_err(EngineError::Store)?,
            None => Vec::new(),
        };

        let mut suppliers = Vec::new();
        let mut bundle_warnings = Vec::new();
        for supplier in Supplier::PRIORITY {
            // Linked part id, or the identifier itself on a cold start.
            let part_id = links
                .iter()
                .find(|l| l.supplier == supplier)
                .map_or_else(|| ident.clone(), |l| l.supplier_part_id.clone());

            match self.fetch_supplier(supplier, &part_id).await {
                Some(view) => suppliers.push(view),
                None => {
                    tracing::debug!(supplier = %supplier, part = %part_id, "no data for supplier");
                    if links.iter().any(|l| l.supplier == supplier) {
                        bundle_warnings
                            .push(format!("{supplier}: linked part {part_id} resolved no data"));
                    }
                }
            }
        }

        merge_media_across_suppliers(&mut suppliers);

        let primary_supplier = Supplier::PRIORITY
            .into_iter()
            .find(|s| suppliers.iter().any(|v| v.supplier == *s));

        let canonical = canonical.map_or_else(
            || {
                // Cold start: synthesize a summary from the best product.
                let primary = primary_supplier
                    .and_then(|s| suppliers.iter().find(|v| v.supplier == s))
                    .map(|v| &v.product);
                primary.map(|p| CanonicalSummary {
                    style_number: ident.clone(),
                    display_name: p.name.clone(),
                    brand: p.brand.clone(),
                    registered: false,
                })
            },
            |style| {
                Some(CanonicalSummary {
                    style_number: style.style_number,
                    display_name: style.display_name,
                    brand: style.brand,
                    registered: true,
                })
            },
        );

        Ok(ProductBundle {
            identifier: ident,
            canonical,
            suppliers,
            primary_supplier,
            warnings: bundle_warnings,
        })
    }

    /// Fetches one supplier's view, applying its designated strategy.
    /// Returns `None` when the supplier has no data for the part.
    async fn fetch_supplier(&self, supplier: Supplier, part_id: &str) -> Option<SupplierView> {
        match supplier {
            Supplier::Sanmar => self.fetch_from_store(supplier, part_id).await,
            Supplier::SsActivewear => self.fetch_live_with_cache(part_id).await,
        }
    }

    /// Store-backed strategy: durable tables are the source of truth.
    async fn fetch_from_store(&self, supplier: Supplier, part_id: &str) -> Option<SupplierView> {
        let mut warnings = Vec::new();
        let product = match self.catalog.get_product(supplier, part_id).await {
            Ok(found) => found?,
            Err(e) => {
                tracing::warn!(supplier = %supplier, part = %part_id, error = %e, "store product fetch failed");
                return None;
            }
        };
        let inventory = match self.inventory.rows_for_part(supplier, part_id).await {
            Ok(rows) => rows,
            Err(e) => {
                warnings.push(format!("inventory unavailable: {e}"));
                Vec::new()
            }
        };
        let warehouses = match self.inventory.warehouse_directory(supplier).await {
            Ok(dir) => dir,
            Err(e) => {
                warnings.push(format!("warehouse directory unavailable: {e}"));
                Vec::new()
            }
        };
        let mut product = product;
        product.absorb_inventory_dimensions(&inventory);
        Some(SupplierView {
            supplier,
            product,
            inventory,
            warehouses,
            source: FetchSource::Store,
            warnings,
        })
    }

    /// Live strategy with stale-while-revalidate: a cache hit answers the
    /// caller immediately and a supervised background task refreshes the
    /// entry; refresh failures are logged, never surfaced.
    async fn fetch_live_with_cache(&self, part_id: &str) -> Option<SupplierView> {
        let live = self.live.as_ref()?;
        let supplier = live.supplier();
        let key = live_cache_key(supplier, part_id);
        let mut warnings = Vec::new();

        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<CachedLivePayload>(&raw) {
                Ok(payload) => {
                    self.spawn_refresh(live.clone(), part_id.to_string());
                    return build_live_view(supplier, payload, FetchSource::Cached, warnings);
                }
                Err(e) => {
                    // Poisoned entry: fall through to the live source.
                    tracing::warn!(key = %key, error = %e, "discarding undecodable cache entry");
                    warnings.push("cache entry discarded".to_string());
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache read failed — bypassing");
                warnings.push(format!("cache read failed: {e}"));
            }
        }

        let payload = match fetch_live_payload(live.as_ref(), part_id).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(supplier = %supplier, part = %part_id, error = %e, "live fetch failed");
                return None;
            }
        };

        match serde_json::to_string(&payload) {
            Ok(serialized) => {
                if let Err(e) = self.cache.put(&key, serialized, self.live_cache_ttl).await {
                    tracing::warn!(key = %key, error = %e, "cache write failed — continuing");
                    warnings.push(format!("cache write failed: {e}"));
                }
            }
            Err(e) => tracing::warn!(error = %e, "live payload not cacheable"),
        }

        build_live_view(supplier, payload, FetchSource::Live, warnings)
    }

    fn spawn_refresh(&self, live: Arc<dyn LiveProductSource>, part_id: String) {
        let cache = self.cache.clone();
        let ttl = self.live_cache_ttl;
        tokio::spawn(async move {
            let supplier = live.supplier();
            let key = live_cache_key(supplier, &part_id);
            match fetch_live_payload(live.as_ref(), &part_id).await {
                Ok(payload) => match serde_json::to_string(&payload) {
                    Ok(serialized) => {
                        if let Err(e) = cache.put(&key, serialized, ttl).await {
                            tracing::warn!(key = %key, error = %e, "background cache refresh write failed");
                        }
                    }
                    Err(e) => tracing::warn!(key = %key, error = %e, "refresh payload not serializable"),
                },
                Err(e) => {
                    // The cached value already satisfied the caller.
                    tracing::warn!(supplier = %supplier, part = %part_id, error = %e, "background refresh failed");
                }
            }
        });
    }
}

fn live_cache_key(supplier: Supplier, part_id: &str) -> String {
    format!("live:{supplier}:{part_id}")
}

async fn fetch_live_payload(
    live: &dyn LiveProductSource,
    part_id: &str,
) -> Result<CachedLivePayload, crate::store::BoxError> {
    let product = live.fetch_product(part_id).await?;
    let inventory = if product.is_some() {
        live.fetch_inventory(part_id).await?
    } else {
        Vec::new()
    };
    Ok(CachedLivePayload { product, inventory })
}

fn build_live_view(
    supplier: Supplier,
    payload: CachedLivePayload,
    source: FetchSource,
    warnings: Vec<String>,
) -> Option<SupplierView> {
    let mut product = payload.product?;
    product.absorb_inventory_dimensions(&payload.inventory);
    let warehouses = payload
        .inventory
        .iter()
        .flat_map(|r| &r.warehouses)
        .map(|wh| {
            let name = wh
                .warehouse_name
                .clone()
                .unwrap_or_else(|| wh.warehouse_id.clone());
            (wh.warehouse_id.clone(), name)
        })
        .fold(Vec::new(), |mut acc: Vec<(String, String)>, pair| {
            if !acc.iter().any(|(id, _)| id == &pair.0) {
                acc.push(pair);
            }
            acc
        });
    Some(SupplierView {
        supplier,
        product,
        inventory: payload.inventory,
        warehouses,
        source,
        warnings,
    })
}

/// Cross-supplier media gap fill: a supplier with no images for a color gets
/// the sibling supplier's images for the same normalized color, so one
/// incomplete feed does not leave blank product photography.
fn merge_media_across_suppliers(views: &mut [SupplierView]) {
    // supplier → normalized color code → media entries.
    let media_by_supplier: HashMap<Supplier, HashMap<String, Vec<MediaEntry>>> = views
        .iter()
        .map(|v| {
            let mut by_color: HashMap<String, Vec<MediaEntry>> = HashMap::new();
            for entry in &v.product.media {
                by_color
                    .entry(entry.color_code.trim().to_uppercase())
                    .or_default()
                    .push(entry.clone());
            }
            (v.supplier, by_color)
        })
        .collect();

    for view in views.iter_mut() {
        let own = &media_by_supplier[&view.supplier];
        let mut borrowed = Vec::new();
        for color in &view.product.colors {
            let color_key = color.code.trim().to_uppercase();
            if own.contains_key(&color_key) {
                continue;
            }
            // Priority order keeps the substitution deterministic.
            for sibling in Supplier::PRIORITY {
                if sibling == view.supplier {
                    continue;
                }
                if let Some(entries) = media_by_supplier
                    .get(&sibling)
                    .and_then(|m| m.get(&color_key))
                {
                    borrowed.extend(entries.iter().map(|e| MediaEntry {
                        color_code: color.code.clone(),
                        url: e.url.clone(),
                        kind: e.kind.clone(),
                    }));
                    break;
                }
            }
        }
        view.product.media.extend(borrowed);
    }
}
