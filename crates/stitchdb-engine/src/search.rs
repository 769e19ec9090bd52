//! Cross-supplier catalog search with weighted ranking.
//!
//! Matching is cheap (substring over the candidate index); the expensive
//! part is enrichment, where every post-filter candidate fans out to a full
//! bundle load for fresh price and stock signals. A short-TTL result cache
//! keyed on the whole normalized query tuple absorbs repeat queries, and
//! each candidate load runs under its own timeout so one slow supplier
//! degrades ranking rather than stalling the page.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stitchdb_core::Supplier;

use crate::cache::Cache;
use crate::loader::SupplierProductLoader;
use crate::store::{CatalogStore, StyleCandidate};
use crate::EngineError;

/// Queries shorter than this do not activate search.
const MIN_QUERY_LEN: usize = 2;

/// Attribute keys scanned for a supplier price, in priority order.
const PRICE_KEYS: [&str; 3] = ["customer_price", "sale_price", "piece_price"];

/// Per-candidate enrichment budget.
const ENRICH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    Relevance,
    Supplier,
    Price,
    Stock,
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relevance" => Ok(SortMode::Relevance),
            "supplier" => Ok(SortMode::Supplier),
            "price" => Ok(SortMode::Price),
            "stock" => Ok(SortMode::Stock),
            other => Err(format!("unknown sort mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchQuery {
    pub query: String,
    /// Restrict to styles linked to at least one of these suppliers.
    pub suppliers: Option<Vec<Supplier>>,
    pub sort: SortMode,
    pub in_stock_only: bool,
    pub limit: usize,
    pub offset: usize,
}

impl SearchQuery {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            suppliers: None,
            sort: SortMode::Relevance,
            in_stock_only: false,
            limit: 25,
            offset: 0,
        }
    }
}

/// Per-supplier signals derived during enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierSignal {
    pub supplier: Supplier,
    pub part_id: String,
    pub price: Option<Decimal>,
    pub total_stock: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalSearchResult {
    pub style_number: String,
    pub display_name: String,
    pub brand: Option<String>,
    pub suppliers: Vec<SupplierSignal>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub in_stock_suppliers: u32,
    pub total_stock: i64,
    pub score: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub items: Vec<CanonicalSearchResult>,
    /// Post-filter candidate count, before pagination.
    pub total: usize,
}

pub struct SearchRanker {
    catalog: Arc<dyn CatalogStore>,
    loader: Arc<SupplierProductLoader>,
    cache: Arc<dyn Cache>,
    result_ttl: Duration,
}

impl SearchRanker {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        loader: Arc<SupplierProductLoader>,
        cache: Arc<dyn Cache>,
        result_ttl: Duration,
    ) -> Self {
        Self {
            catalog,
            loader,
            cache,
            result_ttl,
        }
    }

    /// Runs a search.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the candidate index cannot be read.
    /// Enrichment failures never fail a search.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResults, EngineError> {
        let needle = query.query.trim().to_uppercase();
        if needle.len() < MIN_QUERY_LEN {
            return Ok(SearchResults::default());
        }

        let cache_key = result_cache_key(&needle, query);
        match self.cache.get(&cache_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<SearchResults>(&raw) {
                Ok(results) => return Ok(results),
                Err(e) => tracing::warn!(key = %cache_key, error = %e, "discarding stale search cache entry"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(key = %cache_key, error = %e, "search cache read failed — bypassing"),
        }

        let mut candidates = self
            .catalog
            .search_candidates(&needle)
            .await
            .map_err(EngineError::Store)?;

        if let Some(allowed) = &query.suppliers {
            candidates.retain(|c| c.links.iter().any(|l| allowed.contains(&l.supplier)));
        }

        // Enrichment fan-out: N candidates → N bundle loads. The budget per
        // candidate keeps one slow supplier from stalling the whole page; a
        // timed-out candidate stays in the results with no signals.
        let mut enriched = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let signals =
                match tokio::time::timeout(ENRICH_TIMEOUT, self.enrich(&candidate)).await {
                    Ok(signals) => signals,
                    Err(_) => {
                        tracing::warn!(
                            style = %candidate.style.style_number,
                            "enrichment timed out — keeping candidate without signals"
                        );
                        Vec::new()
                    }
                };
            enriched.push(build_result(&needle, candidate, signals));
        }

        if query.in_stock_only {
            enriched.retain(|r| r.total_stock > 0);
        }

        let total = enriched.len();
        sort_results(&mut enriched, query.sort);
        let items: Vec<CanonicalSearchResult> = enriched
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();
        let results = SearchResults { items, total };

        match serde_json::to_string(&results) {
            Ok(serialized) => {
                if let Err(e) = self.cache.put(&cache_key, serialized, self.result_ttl).await {
                    tracing::warn!(key = %cache_key, error = %e, "search cache write failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "search results not cacheable"),
        }

        Ok(results)
    }

    async fn enrich(&self, candidate: &StyleCandidate) -> Vec<SupplierSignal> {
        let bundle = match self.loader.load_bundle(&candidate.style.style_number).await {
            Ok(bundle) => bundle,
            Err(e) => {
                tracing::warn!(
                    style = %candidate.style.style_number,
                    error = %e,
                    "enrichment load failed — keeping candidate without signals"
                );
                return Vec::new();
            }
        };
        bundle
            .suppliers
            .iter()
            .map(|view| SupplierSignal {
                supplier: view.supplier,
                part_id: view.product.supplier_part_id.clone(),
                price: scan_price(&view.product.attributes),
                total_stock: view
                    .inventory
                    .iter()
                    .map(|r| r.total_qty.max(0))
                    .sum(),
            })
            .collect()
    }
}

/// First numeric value under a known price key wins.
fn scan_price(attributes: &[(String, String)]) -> Option<Decimal> {
    for key in PRICE_KEYS {
        let hit = attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .and_then(|(_, v)| parse_money(v));
        if hit.is_some() {
            return hit;
        }
    }
    None
}

fn parse_money(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    Decimal::from_str(&cleaned).ok()
}

/// Relevance weights. Containment between query and style number is checked
/// both ways: a query like "PC54" must still credit the canonical style
/// "54" it reduces to, or part-number searches would rank below loose
/// display-name matches.
fn relevance_score(needle: &str, candidate: &StyleCandidate) -> i64 {
    let style_number = candidate.style.style_number.to_uppercase();
    let display = candidate.style.display_name.to_uppercase();
    let mut score = 0;

    if style_number.starts_with(needle) {
        score += 50;
    } else if style_number.contains(needle) || needle.contains(&style_number) {
        score += 25;
    }
    if display.contains(needle) {
        score += 20;
    }
    if candidate
        .links
        .iter()
        .any(|l| l.supplier_part_id.to_uppercase().starts_with(needle))
    {
        score += 15;
    }
    score += 5 * i64::try_from(candidate.links.len()).unwrap_or(0);
    score
}

fn build_result(
    needle: &str,
    candidate: StyleCandidate,
    signals: Vec<SupplierSignal>,
) -> CanonicalSearchResult {
    let score = relevance_score(needle, &candidate);
    let prices: Vec<Decimal> = signals.iter().filter_map(|s| s.price).collect();
    let total_stock: i64 = signals.iter().map(|s| s.total_stock).sum();
    let in_stock_suppliers =
        u32::try_from(signals.iter().filter(|s| s.total_stock > 0).count()).unwrap_or(u32::MAX);

    CanonicalSearchResult {
        style_number: candidate.style.style_number,
        display_name: candidate.style.display_name,
        brand: candidate.style.brand,
        suppliers: signals,
        price_min: prices.iter().min().copied(),
        price_max: prices.iter().max().copied(),
        in_stock_suppliers,
        total_stock,
        score,
    }
}

fn sort_results(results: &mut [CanonicalSearchResult], mode: SortMode) {
    match mode {
        SortMode::Relevance => {
            results.sort_by(|a, b| {
                b.score
                    .cmp(&a.score)
                    .then_with(|| a.style_number.cmp(&b.style_number))
            });
        }
        SortMode::Supplier => {
            results.sort_by(|a, b| {
                b.suppliers
                    .len()
                    .cmp(&a.suppliers.len())
                    .then_with(|| b.score.cmp(&a.score))
            });
        }
        SortMode::Price => {
            // Ascending min price; styles with no price at all sort last.
            results.sort_by(|a, b| match (a.price_min, b.price_min) {
                (Some(pa), Some(pb)) => pa.cmp(&pb).then_with(|| b.score.cmp(&a.score)),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => b.score.cmp(&a.score),
            });
        }
        SortMode::Stock => {
            results.sort_by(|a, b| {
                b.in_stock_suppliers
                    .cmp(&a.in_stock_suppliers)
                    .then_with(|| b.score.cmp(&a.score))
            });
        }
    }
}

fn result_cache_key(needle: &str, query: &SearchQuery) -> String {
    let mut suppliers: Vec<&str> = query
        .suppliers
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|s| s.as_str())
        .collect();
    suppliers.sort_unstable();
    format!(
        "search:{needle}:{}:{:?}:{}:{}:{}",
        suppliers.join(","),
        query.sort,
        query.in_stock_only,
        query.limit,
        query.offset
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::testing::{FakeLiveSource, MemoryStore};
    use stitchdb_core::{InventoryRow, ProductRecord, WarehouseDirectory};

    struct Fixture {
        store: Arc<MemoryStore>,
        ranker: SearchRanker,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::default());
        let cache = Arc::new(MemoryCache::new());
        let loader = Arc::new(SupplierProductLoader::new(
            store.clone(),
            store.clone(),
            Some(Arc::new(FakeLiveSource::new(None, vec![]))),
            cache.clone(),
            Arc::new(WarehouseDirectory::builtin()),
            Duration::from_secs(300),
        ));
        let ranker = SearchRanker::new(store.clone(), loader, cache, Duration::from_secs(60));
        Fixture { store, ranker }
    }

    async fn seed_style(
        store: &Arc<MemoryStore>,
        style_number: &str,
        display_name: &str,
        parts: &[(Supplier, &str)],
    ) {
        let style = store
            .upsert_style(style_number, display_name, None)
            .await
            .unwrap();
        for (supplier, part) in parts {
            store.upsert_link(style.id, *supplier, part).await.unwrap();
        }
    }

    fn priced_product(part: &str, price: &str) -> ProductRecord {
        ProductRecord {
            supplier_part_id: part.to_string(),
            name: part.to_string(),
            attributes: vec![("customer_price".to_string(), price.to_string())],
            ..ProductRecord::default()
        }
    }

    fn stock_row(part: &str, qty: i64) -> InventoryRow {
        InventoryRow {
            supplier: Supplier::Sanmar,
            supplier_part_id: part.to_string(),
            color_code: "BLK".to_string(),
            size_code: "M".to_string(),
            total_qty: qty,
            warehouses: vec![],
        }
    }

    #[tokio::test]
    async fn short_query_returns_empty_results() {
        let fx = fixture();
        let results = fx.ranker.search(&SearchQuery::new("p")).await.unwrap();
        assert!(results.items.is_empty());
        assert_eq!(results.total, 0);
    }

    #[tokio::test]
    async fn part_number_match_outranks_display_name_substring() {
        let fx = fixture();
        seed_style(
            &fx.store,
            "54",
            "Port & Company Core Cotton Tee",
            &[(Supplier::Sanmar, "PC54")],
        )
        .await;
        seed_style(
            &fx.store,
            "G200",
            "Classic PC54-style lookalike",
            &[(Supplier::Sanmar, "G200")],
        )
        .await;

        let results = fx.ranker.search(&SearchQuery::new("PC54")).await.unwrap();
        assert_eq!(results.items[0].style_number, "54");
        assert!(results.items[0].score > results.items[1].score);
    }

    #[tokio::test]
    async fn style_number_prefix_scores_highest() {
        let fx = fixture();
        seed_style(&fx.store, "PC54", "Core Cotton Tee", &[(Supplier::Sanmar, "PC54")]).await;
        let results = fx.ranker.search(&SearchQuery::new("PC5")).await.unwrap();
        // 50 (prefix) + 15 (part prefix) + 5 (one supplier) = 70.
        assert_eq!(results.items[0].score, 70);
    }

    #[tokio::test]
    async fn supplier_filter_restricts_candidates() {
        let fx = fixture();
        seed_style(&fx.store, "PC54", "Tee One", &[(Supplier::Sanmar, "PC54")]).await;
        seed_style(
            &fx.store,
            "PC55",
            "Tee Two",
            &[(Supplier::SsActivewear, "B00761")],
        )
        .await;

        let mut query = SearchQuery::new("Tee");
        query.suppliers = Some(vec![Supplier::Sanmar]);
        let results = fx.ranker.search(&query).await.unwrap();

        assert_eq!(results.total, 1);
        assert_eq!(results.items[0].style_number, "PC54");
    }

    #[tokio::test]
    async fn in_stock_only_removes_zero_stock_candidates_post_enrichment() {
        let fx = fixture();
        seed_style(&fx.store, "PC54", "Stocked Tee", &[(Supplier::Sanmar, "PC54")]).await;
        seed_style(&fx.store, "PC55", "Empty Tee", &[(Supplier::Sanmar, "PC55")]).await;
        fx.store
            .insert_product(Supplier::Sanmar, priced_product("PC54", "4.99"))
            .await;
        fx.store
            .insert_product(Supplier::Sanmar, priced_product("PC55", "5.99"))
            .await;
        fx.store.insert_inventory(vec![stock_row("PC54", 1)]).await;
        fx.store.insert_inventory(vec![stock_row("PC55", 0)]).await;

        let mut query = SearchQuery::new("Tee");
        query.in_stock_only = true;
        let results = fx.ranker.search(&query).await.unwrap();

        assert_eq!(results.total, 1);
        assert_eq!(results.items[0].style_number, "PC54");
        assert_eq!(results.items[0].total_stock, 1);
    }

    #[tokio::test]
    async fn price_sort_puts_missing_prices_last() {
        let fx = fixture();
        seed_style(&fx.store, "AAA1", "Cheap Tee", &[(Supplier::Sanmar, "AAA1")]).await;
        seed_style(&fx.store, "BBB2", "Pricey Tee", &[(Supplier::Sanmar, "BBB2")]).await;
        seed_style(&fx.store, "CCC3", "Unpriced Tee", &[(Supplier::Sanmar, "CCC3")]).await;
        fx.store
            .insert_product(Supplier::Sanmar, priced_product("BBB2", "$12.50"))
            .await;
        fx.store
            .insert_product(Supplier::Sanmar, priced_product("AAA1", "3.25"))
            .await;
        fx.store
            .insert_product(
                Supplier::Sanmar,
                ProductRecord {
                    supplier_part_id: "CCC3".to_string(),
                    name: "CCC3".to_string(),
                    ..ProductRecord::default()
                },
            )
            .await;

        let mut query = SearchQuery::new("Tee");
        query.sort = SortMode::Price;
        let results = fx.ranker.search(&query).await.unwrap();

        let order: Vec<&str> = results.items.iter().map(|i| i.style_number.as_str()).collect();
        assert_eq!(order, ["AAA1", "BBB2", "CCC3"]);
        assert_eq!(results.items[0].price_min.unwrap().to_string(), "3.25");
    }

    #[tokio::test]
    async fn results_are_served_from_cache_within_ttl() {
        let fx = fixture();
        seed_style(&fx.store, "PC54", "Cached Tee", &[(Supplier::Sanmar, "PC54")]).await;

        let query = SearchQuery::new("Cached");
        let first = fx.ranker.search(&query).await.unwrap();
        assert_eq!(first.total, 1);

        // A new style appearing after the first search is invisible until
        // the cached page expires.
        seed_style(&fx.store, "PC99", "Cached Hoodie", &[(Supplier::Sanmar, "PC99")]).await;
        let second = fx.ranker.search(&query).await.unwrap();
        assert_eq!(second.total, 1);

        // A different pagination tuple is a different cache key.
        let mut paged = SearchQuery::new("Cached");
        paged.offset = 0;
        paged.limit = 1;
        let third = fx.ranker.search(&paged).await.unwrap();
        assert_eq!(third.total, 2);
        assert_eq!(third.items.len(), 1);
    }

    #[tokio::test]
    async fn pagination_slices_after_sorting() {
        let fx = fixture();
        for (style, name) in [("AAA1", "Alpha Tee"), ("BBB2", "Beta Tee"), ("CCC3", "Gamma Tee")] {
            seed_style(&fx.store, style, name, &[(Supplier::Sanmar, style)]).await;
        }

        let mut query = SearchQuery::new("Tee");
        query.limit = 2;
        query.offset = 2;
        let results = fx.ranker.search(&query).await.unwrap();

        assert_eq!(results.total, 3);
        assert_eq!(results.items.len(), 1);
    }
}
