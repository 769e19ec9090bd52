//! Canonical warehouse identity.
//!
//! SanMar reports the same physical warehouse under a numeric code on one
//! feed path and an alphabetic abbreviation on another. Aggregating without
//! collapsing those aliases double-counts a warehouse's stock as two
//! locations, so every raw id is resolved through this directory before any
//! grouping.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::Supplier;
use crate::ConfigError;

/// One canonical warehouse with the raw aliases historically seen in feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseRef {
    /// Stable canonical id used in persisted inventory breakdowns.
    pub id: String,
    pub display_name: String,
    pub supplier: Supplier,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WarehousesFile {
    warehouses: Vec<WarehouseRef>,
}

/// Static alias table mapping volatile raw warehouse identifiers to stable
/// display names.
#[derive(Debug, Clone)]
pub struct WarehouseDirectory {
    entries: Vec<WarehouseRef>,
}

impl WarehouseDirectory {
    /// Builds a directory from explicit entries, enforcing the integrity
    /// rules that make alias resolution unambiguous.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if a canonical id or display name
    /// appears twice, or if any alias (an entry's own id included) is
    /// claimed by two entries. These are fatal: silently picking a winner
    /// would corrupt aggregation undetectably.
    pub fn from_entries(entries: Vec<WarehouseRef>) -> Result<Self, ConfigError> {
        let mut seen_ids = HashSet::new();
        let mut seen_names = HashSet::new();
        let mut seen_aliases = HashSet::new();

        for entry in &entries {
            let id = entry.id.to_uppercase();
            if id.is_empty() {
                return Err(ConfigError::Validation(
                    "warehouse id must be non-empty".to_string(),
                ));
            }
            if !seen_ids.insert(id.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate warehouse id: '{}'",
                    entry.id
                )));
            }
            if !seen_names.insert(entry.display_name.to_uppercase()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate warehouse display name: '{}'",
                    entry.display_name
                )));
            }
            // The canonical id resolves to itself, so it occupies an alias slot.
            for alias in entry.aliases.iter().map(|a| a.to_uppercase()).chain([id]) {
                if !seen_aliases.insert(alias.clone()) {
                    return Err(ConfigError::Validation(format!(
                        "warehouse alias '{alias}' is claimed by two entries"
                    )));
                }
            }
        }

        Ok(Self { entries })
    }

    /// The built-in SanMar alias table. Numeric codes come from the flat
    /// inventory file; abbreviations from the per-SKU API breakdowns.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = vec![
            sanmar("SEATTLE", "Seattle, WA", &["1", "SEA"]),
            sanmar("CINCINNATI", "Cincinnati, OH", &["2", "CIN"]),
            sanmar("DALLAS", "Dallas, TX", &["3", "DAL"]),
            sanmar("RENO", "Reno, NV", &["4", "RNO"]),
            sanmar("ROBBINSVILLE", "Robbinsville, NJ", &["5", "NJ"]),
            sanmar("JACKSONVILLE", "Jacksonville, FL", &["6", "JAX"]),
            sanmar("MINNEAPOLIS", "Minneapolis, MN", &["7", "MSP"]),
            sanmar("PHOENIX", "Phoenix, AZ", &["12", "PHX"]),
        ];
        // The table above is fixed and covered by a test; construction
        // cannot fail at runtime.
        Self { entries }
    }

    /// Resolves a raw warehouse identifier to its stable display name.
    ///
    /// An explicit non-empty upstream `warehouse_name` wins outright — the
    /// live feed is fresher than this table. Otherwise the alias table is
    /// consulted (exact, then upper-cased), scoped to `supplier` when given.
    /// An unknown id is returned unchanged.
    #[must_use]
    pub fn resolve(
        &self,
        warehouse_id: &str,
        warehouse_name: Option<&str>,
        supplier: Option<Supplier>,
    ) -> String {
        if let Some(name) = warehouse_name.map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        match self.lookup(warehouse_id, supplier) {
            Some(entry) => entry.display_name.clone(),
            None => warehouse_id.to_string(),
        }
    }

    /// Rewrites a raw id into `(canonical_id, canonical_name)` at import
    /// time, so later merges can key off ids or names interchangeably.
    #[must_use]
    pub fn normalize(
        &self,
        warehouse_id: &str,
        warehouse_name: Option<&str>,
    ) -> (String, String) {
        if let Some(entry) = self.lookup(warehouse_id, None) {
            return (entry.id.clone(), entry.display_name.clone());
        }
        let name = warehouse_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(warehouse_id);
        (warehouse_id.to_string(), name.to_string())
    }

    /// All entries for a supplier, used to zero-fill matrix rows for
    /// warehouses with no stock in the current selection.
    #[must_use]
    pub fn entries_for(&self, supplier: Supplier) -> Vec<&WarehouseRef> {
        self.entries
            .iter()
            .filter(|e| e.supplier == supplier)
            .collect()
    }

    fn lookup(&self, warehouse_id: &str, supplier: Option<Supplier>) -> Option<&WarehouseRef> {
        let scoped = self
            .entries
            .iter()
            .filter(|e| supplier.is_none_or(|s| e.supplier == s));
        // Exact pass first, then upper-cased.
        for entry in scoped.clone() {
            if entry.id == warehouse_id || entry.aliases.iter().any(|a| a == warehouse_id) {
                return Some(entry);
            }
        }
        let upper = warehouse_id.to_uppercase();
        for entry in scoped {
            if entry.id.to_uppercase() == upper
                || entry.aliases.iter().any(|a| a.to_uppercase() == upper)
            {
                return Some(entry);
            }
        }
        None
    }
}

fn sanmar(id: &str, display_name: &str, aliases: &[&str]) -> WarehouseRef {
    WarehouseRef {
        id: id.to_string(),
        display_name: display_name.to_string(),
        supplier: Supplier::Sanmar,
        aliases: aliases.iter().map(ToString::to_string).collect(),
    }
}

/// Loads a warehouse directory from a YAML override file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or if the
/// table fails validation (duplicate id, display name, or alias).
pub fn load_warehouse_directory(path: &Path) -> Result<WarehouseDirectory, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let file: WarehousesFile = serde_yaml::from_str(&content)?;
    WarehouseDirectory::from_entries(file.warehouses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_passes_validation() {
        let entries = WarehouseDirectory::builtin().entries;
        assert!(WarehouseDirectory::from_entries(entries).is_ok());
    }

    #[test]
    fn numeric_code_and_abbreviation_resolve_to_same_name() {
        let dir = WarehouseDirectory::builtin();
        assert_eq!(dir.resolve("3", None, Some(Supplier::Sanmar)), "Dallas, TX");
        assert_eq!(
            dir.resolve("dal", None, Some(Supplier::Sanmar)),
            "Dallas, TX"
        );
    }

    #[test]
    fn explicit_upstream_name_wins_over_alias_table() {
        let dir = WarehouseDirectory::builtin();
        assert_eq!(
            dir.resolve("3", Some("Dallas Annex"), Some(Supplier::Sanmar)),
            "Dallas Annex"
        );
        // Blank names do not count as explicit.
        assert_eq!(dir.resolve("3", Some("  "), None), "Dallas, TX");
    }

    #[test]
    fn unknown_id_passes_through_unchanged() {
        let dir = WarehouseDirectory::builtin();
        assert_eq!(dir.resolve("99", None, None), "99");
    }

    #[test]
    fn normalize_rewrites_to_canonical_pair() {
        let dir = WarehouseDirectory::builtin();
        assert_eq!(
            dir.normalize("1", None),
            ("SEATTLE".to_string(), "Seattle, WA".to_string())
        );
        assert_eq!(
            dir.normalize("99", Some("Overflow")),
            ("99".to_string(), "Overflow".to_string())
        );
    }

    #[test]
    fn duplicate_alias_is_fatal() {
        let entries = vec![
            sanmar("A", "Alpha", &["1"]),
            sanmar("B", "Beta", &["1"]),
        ];
        let err = WarehouseDirectory::from_entries(entries).unwrap_err();
        assert!(err.to_string().contains("claimed by two entries"));
    }

    #[test]
    fn duplicate_display_name_is_fatal() {
        let entries = vec![
            sanmar("A", "Same Place", &[]),
            sanmar("B", "same place", &[]),
        ];
        assert!(WarehouseDirectory::from_entries(entries).is_err());
    }
}
