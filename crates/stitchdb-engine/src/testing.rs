//! In-memory fakes for the store and live-source seams, used across the
//! engine's unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use stitchdb_core::{CanonicalStyle, InventoryRow, ProductRecord, Supplier, SupplierLink};

use crate::store::{BoxError, CatalogStore, InventoryStore, LiveProductSource, StyleCandidate};

#[derive(Default)]
struct MemoryState {
    styles: Vec<CanonicalStyle>,
    links: Vec<SupplierLink>,
    products: HashMap<(Supplier, String), ProductRecord>,
    inventory: Vec<InventoryRow>,
    next_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory catalog + inventory store mirroring the Postgres semantics the
/// engine relies on (case-insensitive lookups, upsert-by-unique-key,
/// transactional replace approximated by a single lock hold).
#[derive(Default)]
pub(crate) struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub(crate) async fn style_count(&self) -> usize {
        self.state.read().await.styles.len()
    }

    pub(crate) async fn link_count(&self) -> usize {
        self.state.read().await.links.len()
    }

    pub(crate) async fn insert_product(&self, supplier: Supplier, record: ProductRecord) {
        let key = (supplier, record.supplier_part_id.to_uppercase());
        self.state.write().await.products.insert(key, record);
    }

    pub(crate) async fn insert_inventory(&self, rows: Vec<InventoryRow>) {
        self.state.write().await.inventory.extend(rows);
    }

    pub(crate) async fn inventory_snapshot(&self) -> Vec<InventoryRow> {
        self.state.read().await.inventory.clone()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn get_style_by_number(
        &self,
        style_number: &str,
    ) -> Result<Option<CanonicalStyle>, BoxError> {
        let wanted = style_number.to_uppercase();
        Ok(self
            .state
            .read()
            .await
            .styles
            .iter()
            .find(|s| s.style_number.to_uppercase() == wanted)
            .cloned())
    }

    async fn get_style_by_id(&self, id: i64) -> Result<Option<CanonicalStyle>, BoxError> {
        Ok(self
            .state
            .read()
            .await
            .styles
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn find_style_by_part(
        &self,
        part_id: &str,
    ) -> Result<Option<CanonicalStyle>, BoxError> {
        let wanted = part_id.to_uppercase();
        let state = self.state.read().await;
        let link = state
            .links
            .iter()
            .find(|l| l.supplier_part_id.to_uppercase() == wanted);
        Ok(link.and_then(|l| {
            state
                .styles
                .iter()
                .find(|s| s.id == l.canonical_style_id)
                .cloned()
        }))
    }

    async fn get_link(
        &self,
        supplier: Supplier,
        part_id: &str,
    ) -> Result<Option<SupplierLink>, BoxError> {
        let wanted = part_id.trim().to_uppercase();
        Ok(self
            .state
            .read()
            .await
            .links
            .iter()
            .find(|l| l.supplier == supplier && l.supplier_part_id.to_uppercase() == wanted)
            .cloned())
    }

    async fn links_for_style(
        &self,
        canonical_style_id: i64,
    ) -> Result<Vec<SupplierLink>, BoxError> {
        Ok(self
            .state
            .read()
            .await
            .links
            .iter()
            .filter(|l| l.canonical_style_id == canonical_style_id)
            .cloned()
            .collect())
    }

    async fn upsert_style(
        &self,
        style_number: &str,
        display_name: &str,
        brand: Option<&str>,
    ) -> Result<CanonicalStyle, BoxError> {
        let mut state = self.state.write().await;
        let wanted = style_number.to_uppercase();
        if let Some(style) = state
            .styles
            .iter_mut()
            .find(|s| s.style_number.to_uppercase() == wanted)
        {
            style.display_name = display_name.to_string();
            if brand.is_some() {
                style.brand = brand.map(ToString::to_string);
            }
            style.updated_at = Utc::now();
            return Ok(style.clone());
        }
        let id = state.next_id();
        let style = CanonicalStyle {
            id,
            style_number: wanted,
            display_name: display_name.to_string(),
            brand: brand.map(ToString::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.styles.push(style.clone());
        Ok(style)
    }

    async fn upsert_link(
        &self,
        canonical_style_id: i64,
        supplier: Supplier,
        part_id: &str,
    ) -> Result<SupplierLink, BoxError> {
        let mut state = self.state.write().await;
        let wanted = part_id.to_uppercase();
        if let Some(link) = state
            .links
            .iter_mut()
            .find(|l| l.supplier == supplier && l.supplier_part_id.to_uppercase() == wanted)
        {
            link.canonical_style_id = canonical_style_id;
            link.updated_at = Utc::now();
            return Ok(link.clone());
        }
        let id = state.next_id();
        let link = SupplierLink {
            id,
            canonical_style_id,
            supplier,
            supplier_part_id: wanted,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.links.push(link.clone());
        Ok(link)
    }

    async fn get_product(
        &self,
        supplier: Supplier,
        part_id: &str,
    ) -> Result<Option<ProductRecord>, BoxError> {
        let key = (supplier, part_id.to_uppercase());
        Ok(self.state.read().await.products.get(&key).cloned())
    }

    async fn upsert_product(
        &self,
        supplier: Supplier,
        record: &ProductRecord,
    ) -> Result<(), BoxError> {
        let key = (supplier, record.supplier_part_id.to_uppercase());
        self.state.write().await.products.insert(key, record.clone());
        Ok(())
    }

    async fn search_candidates(&self, query: &str) -> Result<Vec<StyleCandidate>, BoxError> {
        let needle = query.to_uppercase();
        let state = self.state.read().await;
        let mut out = Vec::new();
        for style in &state.styles {
            let links: Vec<SupplierLink> = state
                .links
                .iter()
                .filter(|l| l.canonical_style_id == style.id)
                .cloned()
                .collect();
            let matches = style.style_number.to_uppercase().contains(&needle)
                || style.display_name.to_uppercase().contains(&needle)
                || style
                    .brand
                    .as_ref()
                    .is_some_and(|b| b.to_uppercase().contains(&needle))
                || links
                    .iter()
                    .any(|l| l.supplier_part_id.to_uppercase().contains(&needle));
            if matches {
                out.push(StyleCandidate {
                    style: style.clone(),
                    links,
                });
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn rows_for_part(
        &self,
        supplier: Supplier,
        part_id: &str,
    ) -> Result<Vec<InventoryRow>, BoxError> {
        let wanted = part_id.to_uppercase();
        Ok(self
            .state
            .read()
            .await
            .inventory
            .iter()
            .filter(|r| r.supplier == supplier && r.supplier_part_id.to_uppercase() == wanted)
            .cloned()
            .collect())
    }

    async fn replace_scope(
        &self,
        supplier: Supplier,
        part_filter: Option<&str>,
        rows: Vec<InventoryRow>,
    ) -> Result<u64, BoxError> {
        let mut state = self.state.write().await;
        let filter = part_filter.map(str::to_uppercase);
        state.inventory.retain(|r| {
            r.supplier != supplier
                || filter
                    .as_ref()
                    .is_some_and(|f| &r.supplier_part_id.to_uppercase() != f)
        });
        let written = rows.len() as u64;
        state.inventory.extend(rows);
        Ok(written)
    }

    async fn upsert_row(&self, row: &InventoryRow) -> Result<(), BoxError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.inventory.iter_mut().find(|r| {
            r.supplier == row.supplier
                && r.supplier_part_id == row.supplier_part_id
                && r.color_code == row.color_code
                && r.size_code == row.size_code
        }) {
            *existing = row.clone();
        } else {
            state.inventory.push(row.clone());
        }
        Ok(())
    }

    async fn warehouse_directory(
        &self,
        supplier: Supplier,
    ) -> Result<Vec<(String, String)>, BoxError> {
        let state = self.state.read().await;
        let mut seen = Vec::new();
        for row in state.inventory.iter().filter(|r| r.supplier == supplier) {
            for wh in &row.warehouses {
                let name = wh
                    .warehouse_name
                    .clone()
                    .unwrap_or_else(|| wh.warehouse_id.clone());
                if !seen.iter().any(|(id, _)| id == &wh.warehouse_id) {
                    seen.push((wh.warehouse_id.clone(), name));
                }
            }
        }
        Ok(seen)
    }
}

/// Scripted live source: serves a fixed product/inventory payload, counts
/// calls, and can be flipped into a failing state.
pub(crate) struct FakeLiveSource {
    pub(crate) product: Option<ProductRecord>,
    pub(crate) inventory: Vec<InventoryRow>,
    pub(crate) product_calls: AtomicU32,
    pub(crate) inventory_calls: AtomicU32,
    pub(crate) failing: AtomicBool,
}

impl FakeLiveSource {
    pub(crate) fn new(product: Option<ProductRecord>, inventory: Vec<InventoryRow>) -> Self {
        Self {
            product,
            inventory,
            product_calls: AtomicU32::new(0),
            inventory_calls: AtomicU32::new(0),
            failing: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl LiveProductSource for FakeLiveSource {
    fn supplier(&self) -> Supplier {
        Supplier::SsActivewear
    }

    async fn fetch_product(&self, _part_id: &str) -> Result<Option<ProductRecord>, BoxError> {
        self.product_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err("live source unavailable".into());
        }
        Ok(self.product.clone())
    }

    async fn fetch_inventory(&self, _part_id: &str) -> Result<Vec<InventoryRow>, BoxError> {
        self.inventory_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err("live source unavailable".into());
        }
        Ok(self.inventory.clone())
    }
}
