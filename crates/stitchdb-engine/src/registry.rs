//! Canonical style registry: the mapping from canonical style numbers to
//! supplier product links.

use std::sync::Arc;

use stitchdb_core::{
    guess_style_number, normalize_style_number, CanonicalStyle, StyleMap, Supplier, SupplierLink,
};

use crate::store::CatalogStore;
use crate::EngineError;

/// Owns lookup/upsert/guess operations over canonical styles and links.
///
/// The static [`StyleMap`] is consulted before the guessing heuristic so
/// operator-pinned mappings always win.
pub struct CanonicalStyleRegistry {
    store: Arc<dyn CatalogStore>,
    style_map: StyleMap,
}

impl CanonicalStyleRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, style_map: StyleMap) -> Self {
        Self { store, style_map }
    }

    /// Decides the canonical style number for a supplier part: explicit
    /// caller value, then the static map (by supplier style, then by alias),
    /// then the best-effort guess.
    #[must_use]
    pub fn resolve_style_number(
        &self,
        supplier: Supplier,
        supplier_part_id: &str,
        explicit: Option<&str>,
        brand: Option<&str>,
    ) -> String {
        if let Some(explicit) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
            return normalize_style_number(explicit);
        }
        let part = normalize_style_number(supplier_part_id);
        if let Some(entry) = self
            .style_map
            .by_supplier_style(supplier, &part)
            .or_else(|| self.style_map.by_alias(&part))
        {
            return normalize_style_number(&entry.canonical_sku);
        }
        guess_style_number(&part, brand)
    }

    /// Idempotent upsert of a canonical style and its `(supplier, part)`
    /// link.
    ///
    /// Display name and brand are refreshed on every call. If the part was
    /// previously linked to a *different* canonical style the link is
    /// repointed (last writer wins) and an audit line is logged; the old
    /// style is left in place even if orphaned.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if any store operation fails.
    pub async fn ensure_link(
        &self,
        supplier: Supplier,
        supplier_part_id: &str,
        style_number: Option<&str>,
        display_name: Option<&str>,
        brand: Option<&str>,
    ) -> Result<(CanonicalStyle, SupplierLink), EngineError> {
        let part = normalize_style_number(supplier_part_id);
        let style_number = self.resolve_style_number(supplier, &part, style_number, brand);

        let existing_style = self
            .store
            .get_style_by_number(&style_number)
            .await
            .map_err(EngineError::Store)?;
        let display_name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(ToString::to_string)
            .or_else(|| existing_style.as_ref().map(|s| s.display_name.clone()))
            .unwrap_or_else(|| part.clone());

        let style = self
            .store
            .upsert_style(&style_number, &display_name, brand)
            .await
            .map_err(EngineError::Store)?;

        if let Some(previous) = self
            .store
            .get_link(supplier, &part)
            .await
            .map_err(EngineError::Store)?
        {
            if previous.canonical_style_id != style.id {
                let old_style_number = self
                    .store
                    .get_style_by_id(previous.canonical_style_id)
                    .await
                    .map_err(EngineError::Store)?
                    .map_or_else(
                        || previous.canonical_style_id.to_string(),
                        |s| s.style_number,
                    );
                tracing::warn!(
                    supplier = %supplier,
                    part = %part,
                    from_style = %old_style_number,
                    to_style = %style.style_number,
                    "re-linking supplier part to a different canonical style"
                );
            }
        }

        let link = self
            .store
            .upsert_link(style.id, supplier, &part)
            .await
            .map_err(EngineError::Store)?;

        Ok((style, link))
    }

    /// Exact style-number lookup, case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the store fails.
    pub async fn by_style_number(
        &self,
        style_number: &str,
    ) -> Result<Option<CanonicalStyle>, EngineError> {
        self.store
            .get_style_by_number(&normalize_style_number(style_number))
            .await
            .map_err(EngineError::Store)
    }

    /// Lookup by any linked supplier part, case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the store fails.
    pub async fn by_any_part(&self, part_id: &str) -> Result<Option<CanonicalStyle>, EngineError> {
        self.store
            .find_style_by_part(&normalize_style_number(part_id))
            .await
            .map_err(EngineError::Store)
    }

    /// Lookup by an exact `(supplier, part)` pair, case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the store fails.
    pub async fn by_supplier_part(
        &self,
        supplier: Supplier,
        part_id: &str,
    ) -> Result<Option<SupplierLink>, EngineError> {
        self.store
            .get_link(supplier, &normalize_style_number(part_id))
            .await
            .map_err(EngineError::Store)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use stitchdb_core::style_map::{StyleMapEntry, SupplierStyleRef};

    fn registry_with_map(entries: Vec<StyleMapEntry>) -> (Arc<MemoryStore>, CanonicalStyleRegistry) {
        let store = Arc::new(MemoryStore::default());
        let map = StyleMap::from_entries(entries).unwrap();
        let registry = CanonicalStyleRegistry::new(store.clone(), map);
        (store, registry)
    }

    fn registry() -> (Arc<MemoryStore>, CanonicalStyleRegistry) {
        registry_with_map(vec![])
    }

    #[tokio::test]
    async fn ensure_link_creates_style_and_link() {
        let (_, registry) = registry();
        let (style, link) = registry
            .ensure_link(
                Supplier::Sanmar,
                "pc54",
                Some("PC54"),
                Some("Core Cotton Tee"),
                Some("Port & Company"),
            )
            .await
            .unwrap();
        assert_eq!(style.style_number, "PC54");
        assert_eq!(style.display_name, "Core Cotton Tee");
        assert_eq!(link.canonical_style_id, style.id);
        assert_eq!(link.supplier_part_id, "PC54");
    }

    #[tokio::test]
    async fn ensure_link_is_idempotent() {
        let (store, registry) = registry();
        let (a, _) = registry
            .ensure_link(Supplier::Sanmar, "PC54", Some("PC54"), Some("Tee"), None)
            .await
            .unwrap();
        let (b, _) = registry
            .ensure_link(Supplier::Sanmar, "PC54", Some("PC54"), Some("Tee"), None)
            .await
            .unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(store.style_count().await, 1);
        assert_eq!(store.link_count().await, 1);
    }

    #[tokio::test]
    async fn relink_points_at_second_style_and_keeps_orphan() {
        let (store, registry) = registry();
        let (first, _) = registry
            .ensure_link(Supplier::Sanmar, "PC54", Some("OLD54"), Some("Tee"), None)
            .await
            .unwrap();
        let (second, link) = registry
            .ensure_link(Supplier::Sanmar, "PC54", Some("NEW54"), Some("Tee"), None)
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(link.canonical_style_id, second.id);
        // The orphaned first style is not deleted.
        assert!(registry.by_style_number("OLD54").await.unwrap().is_some());
        assert_eq!(store.link_count().await, 1);
    }

    #[tokio::test]
    async fn reingest_updates_display_name_and_brand() {
        let (_, registry) = registry();
        registry
            .ensure_link(Supplier::Sanmar, "PC54", Some("PC54"), Some("Old Name"), None)
            .await
            .unwrap();
        let (style, _) = registry
            .ensure_link(
                Supplier::Sanmar,
                "PC54",
                Some("PC54"),
                Some("New Name"),
                Some("Port & Company"),
            )
            .await
            .unwrap();
        assert_eq!(style.display_name, "New Name");
        assert_eq!(style.brand.as_deref(), Some("Port & Company"));
    }

    #[tokio::test]
    async fn missing_display_name_keeps_existing() {
        let (_, registry) = registry();
        registry
            .ensure_link(Supplier::Sanmar, "PC54", Some("PC54"), Some("Good Name"), None)
            .await
            .unwrap();
        let (style, _) = registry
            .ensure_link(Supplier::SsActivewear, "B00760", Some("PC54"), None, None)
            .await
            .unwrap();
        assert_eq!(style.display_name, "Good Name");
    }

    #[tokio::test]
    async fn static_map_beats_guessing() {
        let (_, registry) = registry_with_map(vec![StyleMapEntry {
            canonical_sku: "PC54".to_string(),
            display_name: None,
            brand: None,
            aliases: vec![],
            supplier_styles: vec![SupplierStyleRef {
                supplier: Supplier::SsActivewear,
                style: "B00760".to_string(),
            }],
        }]);
        let resolved =
            registry.resolve_style_number(Supplier::SsActivewear, "B00760", None, Some("Port"));
        assert_eq!(resolved, "PC54");
    }

    #[tokio::test]
    async fn guess_applies_when_map_misses() {
        let (_, registry) = registry();
        let resolved =
            registry.resolve_style_number(Supplier::SsActivewear, "C1717", None, None);
        assert_eq!(resolved, "1717");
        let resolved = registry.resolve_style_number(Supplier::Sanmar, "G500", None, Some("Gildan"));
        assert_eq!(resolved, "GIL-G500");
    }

    #[tokio::test]
    async fn lookups_are_case_insensitive() {
        let (_, registry) = registry();
        registry
            .ensure_link(Supplier::Sanmar, "PC54", Some("PC54"), Some("Tee"), None)
            .await
            .unwrap();
        assert!(registry.by_style_number("pc54").await.unwrap().is_some());
        assert!(registry.by_any_part("pc54").await.unwrap().is_some());
        assert!(registry
            .by_supplier_part(Supplier::Sanmar, " pc54 ")
            .await
            .unwrap()
            .is_some());
    }
}
