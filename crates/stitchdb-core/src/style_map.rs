//! Static canonical style mapping.
//!
//! A fixed table maintained by operators that pins well-known supplier
//! styles to canonical SKUs, consulted before the style-number guessing
//! heuristic. Integrity violations are fatal at load time: silently picking
//! a winner between two entries claiming the same alias would create
//! undetectable catalog corruption.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::Supplier;
use crate::ConfigError;

/// A supplier's style code claimed by a canonical entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierStyleRef {
    pub supplier: Supplier,
    pub style: String,
}

/// One fixed canonical mapping entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleMapEntry {
    pub canonical_sku: String,
    pub display_name: Option<String>,
    pub brand: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub supplier_styles: Vec<SupplierStyleRef>,
}

#[derive(Debug, Deserialize)]
struct StyleMapFile {
    styles: Vec<StyleMapEntry>,
}

/// Validated, indexed view of the static mapping table.
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    entries: Vec<StyleMapEntry>,
    /// Upper-cased alias (canonical SKU included) → entry index.
    by_alias: HashMap<String, usize>,
    /// `(supplier, upper-cased style)` → entry index.
    by_supplier_style: HashMap<(Supplier, String), usize>,
}

impl StyleMap {
    /// Builds the map from entries, enforcing the load-time invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` (fatal) when:
    /// - a canonical SKU appears twice,
    /// - an alias (the canonical SKU itself included) is claimed by two
    ///   different entries,
    /// - a `(supplier, style)` pair is claimed by two different entries.
    pub fn from_entries(entries: Vec<StyleMapEntry>) -> Result<Self, ConfigError> {
        let mut by_alias: HashMap<String, usize> = HashMap::new();
        let mut by_supplier_style: HashMap<(Supplier, String), usize> = HashMap::new();

        for (idx, entry) in entries.iter().enumerate() {
            let sku = entry.canonical_sku.trim().to_uppercase();
            if sku.is_empty() {
                return Err(ConfigError::Validation(
                    "canonical SKU must be non-empty".to_string(),
                ));
            }
            // Checked before the alias pass so the operator message names
            // the duplicate SKU rather than a generic alias collision.
            if entries[..idx]
                .iter()
                .any(|e| e.canonical_sku.trim().to_uppercase() == sku)
            {
                return Err(ConfigError::Validation(format!(
                    "duplicate canonical SKU: '{}'",
                    entry.canonical_sku
                )));
            }
            for alias in entry
                .aliases
                .iter()
                .map(|a| a.trim().to_uppercase())
                .chain([sku.clone()])
            {
                if let Some(&prev) = by_alias.get(&alias) {
                    if prev != idx {
                        return Err(ConfigError::Validation(format!(
                            "alias '{alias}' is claimed by both '{}' and '{}'",
                            entries[prev].canonical_sku, entry.canonical_sku
                        )));
                    }
                } else {
                    by_alias.insert(alias, idx);
                }
            }
            for sref in &entry.supplier_styles {
                let key = (sref.supplier, sref.style.trim().to_uppercase());
                if let Some(&prev) = by_supplier_style.get(&key) {
                    if prev != idx {
                        return Err(ConfigError::Validation(format!(
                            "supplier style ({}, '{}') is claimed by both '{}' and '{}'",
                            sref.supplier, sref.style, entries[prev].canonical_sku,
                            entry.canonical_sku
                        )));
                    }
                } else {
                    by_supplier_style.insert(key, idx);
                }
            }
        }

        Ok(Self {
            entries,
            by_alias,
            by_supplier_style,
        })
    }

    /// Looks up by canonical SKU or any alias, case-insensitively.
    #[must_use]
    pub fn by_alias(&self, alias: &str) -> Option<&StyleMapEntry> {
        self.by_alias
            .get(&alias.trim().to_uppercase())
            .map(|&i| &self.entries[i])
    }

    /// Looks up by a supplier's own style code, case-insensitively.
    #[must_use]
    pub fn by_supplier_style(&self, supplier: Supplier, style: &str) -> Option<&StyleMapEntry> {
        self.by_supplier_style
            .get(&(supplier, style.trim().to_uppercase()))
            .map(|&i| &self.entries[i])
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads and validates the static style map from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` on read/parse failure or any integrity violation.
pub fn load_style_map(path: &Path) -> Result<StyleMap, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let file: StyleMapFile = serde_yaml::from_str(&content)?;
    StyleMap::from_entries(file.styles)
}
