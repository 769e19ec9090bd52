//! Feed aggregation and the idempotent-replace import pipeline.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use stitchdb_core::{
    normalize_style_number, resolve_color_code, InventoryRow, Supplier, WarehouseDirectory,
    WarehouseQty,
};
use stitchdb_engine::{CatalogStore, InventoryStore};

use crate::parse::{is_header_line, parse_feed_line, FeedLine};
use crate::SanmarError;

/// Outcome counters for one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Data lines that parsed cleanly.
    pub processed: u64,
    /// Malformed lines skipped with a warning.
    pub skipped: u64,
    /// Aggregated inventory rows written to the store.
    pub rows_written: u64,
}

/// Imports the feed at `path`, replacing the SanMar inventory scope.
///
/// With a `part_filter`, only that part's lines are kept and only that
/// part's scope is replaced; otherwise the whole SanMar scope is.
///
/// # Errors
///
/// Returns [`SanmarError::FeedIo`] if the file cannot be opened or read, or
/// [`SanmarError::Store`] if the replace transaction fails. Malformed lines
/// are never fatal.
pub async fn import_feed_file(
    path: &Path,
    part_filter: Option<&str>,
    catalog: &dyn CatalogStore,
    inventory: &dyn InventoryStore,
    directory: &WarehouseDirectory,
) -> Result<ImportReport, SanmarError> {
    let file = File::open(path).map_err(|source| SanmarError::FeedIo {
        path: path.to_path_buf(),
        source,
    })?;
    let report = import_feed_reader(
        BufReader::new(file),
        part_filter,
        catalog,
        inventory,
        directory,
    )
    .await;
    match &report {
        Ok(r) => info!(
            feed = %path.display(),
            processed = r.processed,
            skipped = r.skipped,
            rows_written = r.rows_written,
            "sanmar inventory import finished"
        ),
        Err(e) => warn!(feed = %path.display(), error = %e, "sanmar inventory import failed"),
    }
    report
}

/// Reader-level entry point, split out so tests can feed in-memory data.
///
/// # Errors
///
/// See [`import_feed_file`].
pub async fn import_feed_reader<R: BufRead>(
    reader: R,
    part_filter: Option<&str>,
    catalog: &dyn CatalogStore,
    inventory: &dyn InventoryStore,
    directory: &WarehouseDirectory,
) -> Result<ImportReport, SanmarError> {
    let wanted_part = part_filter.map(normalize_style_number);
    let mut report = ImportReport::default();
    let mut lines = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| SanmarError::FeedIo {
            path: Path::new("<reader>").to_path_buf(),
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if line_no == 1 && is_header_line(trimmed) {
            continue;
        }
        match parse_feed_line(trimmed) {
            Ok(parsed) => {
                report.processed += 1;
                let part = normalize_style_number(&parsed.part_number);
                if wanted_part.as_deref().is_some_and(|w| w != part) {
                    continue;
                }
                lines.push(parsed);
            }
            Err(issue) => {
                report.skipped += 1;
                warn!(line = line_no, error = %issue, "skipping malformed feed row");
            }
        }
    }

    let colors_by_part = catalog_colors(catalog, &lines).await?;
    let rows = build_rows(&lines, directory, &colors_by_part);

    report.rows_written = inventory
        .replace_scope(Supplier::Sanmar, wanted_part.as_deref(), rows)
        .await
        .map_err(SanmarError::Store)?;

    Ok(report)
}

/// Fetches each referenced part's catalog colors once, keyed by normalized
/// part id. Parts without a stored product resolve against an empty catalog
/// and fall back to sanitized color names.
async fn catalog_colors(
    catalog: &dyn CatalogStore,
    lines: &[FeedLine],
) -> Result<HashMap<String, Vec<(String, String)>>, SanmarError> {
    let mut colors = HashMap::new();
    for line in lines {
        let part = normalize_style_number(&line.part_number);
        if colors.contains_key(&part) {
            continue;
        }
        let palette = catalog
            .get_product(Supplier::Sanmar, &part)
            .await
            .map_err(SanmarError::Store)?
            .map(|p| {
                p.colors
                    .into_iter()
                    .map(|c| (c.code, c.name))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        colors.insert(part, palette);
    }
    Ok(colors)
}

/// Aggregates parsed lines into inventory rows.
///
/// Two merge passes: first by raw `(part, color name, size)` with duplicate
/// warehouse codes summed, then by `(part, resolved color code, size)` since
/// two raw spellings can resolve to the same catalog color. Warehouse ids
/// are rewritten through the directory before either pass so merges key off
/// canonical ids.
fn build_rows(
    lines: &[FeedLine],
    directory: &WarehouseDirectory,
    colors_by_part: &HashMap<String, Vec<(String, String)>>,
) -> Vec<InventoryRow> {
    let mut cells: BTreeMap<(String, String, String), BTreeMap<String, (String, i64)>> =
        BTreeMap::new();

    for line in lines {
        let part = normalize_style_number(&line.part_number);
        let empty = Vec::new();
        let palette = colors_by_part.get(&part).unwrap_or(&empty);
        let color_code = resolve_color_code(&line.color_name, palette).code;
        let size = line.size.to_uppercase();
        let (wh_id, wh_name) = directory.normalize(&line.warehouse_code, None);

        let warehouses = cells.entry((part, color_code, size)).or_default();
        let entry = warehouses.entry(wh_id).or_insert_with(|| (wh_name, 0));
        entry.1 += line.quantity;
    }

    cells
        .into_iter()
        .map(|((part, color_code, size), warehouses)| {
            let total_qty = warehouses.values().map(|(_, q)| *q).sum();
            InventoryRow {
                supplier: Supplier::Sanmar,
                supplier_part_id: part,
                color_code,
                size_code: size,
                total_qty,
                warehouses: warehouses
                    .into_iter()
                    .map(|(id, (name, quantity))| WarehouseQty {
                        warehouse_id: id,
                        warehouse_name: Some(name),
                        quantity,
                    })
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use stitchdb_core::{
        CanonicalStyle, ColorEntry, ProductRecord, SupplierLink,
    };
    use stitchdb_engine::{BoxError, StyleCandidate};

    /// Catalog fake: serves stored colors for one part, nothing else.
    struct OnePartCatalog {
        part: String,
        colors: Vec<(String, String)>,
    }

    #[async_trait]
    impl CatalogStore for OnePartCatalog {
        async fn get_style_by_number(
            &self,
            _: &str,
        ) -> Result<Option<CanonicalStyle>, BoxError> {
            unreachable!()
        }
        async fn get_style_by_id(&self, _: i64) -> Result<Option<CanonicalStyle>, BoxError> {
            unreachable!()
        }
        async fn find_style_by_part(&self, _: &str) -> Result<Option<CanonicalStyle>, BoxError> {
            unreachable!()
        }
        async fn get_link(
            &self,
            _: Supplier,
            _: &str,
        ) -> Result<Option<SupplierLink>, BoxError> {
            unreachable!()
        }
        async fn links_for_style(&self, _: i64) -> Result<Vec<SupplierLink>, BoxError> {
            unreachable!()
        }
        async fn upsert_style(
            &self,
            _: &str,
            _: &str,
            _: Option<&str>,
        ) -> Result<CanonicalStyle, BoxError> {
            unreachable!()
        }
        async fn upsert_link(
            &self,
            _: i64,
            _: Supplier,
            _: &str,
        ) -> Result<SupplierLink, BoxError> {
            unreachable!()
        }
        async fn get_product(
            &self,
            supplier: Supplier,
            part_id: &str,
        ) -> Result<Option<ProductRecord>, BoxError> {
            assert_eq!(supplier, Supplier::Sanmar);
            if part_id != self.part {
                return Ok(None);
            }
            Ok(Some(ProductRecord {
                supplier_part_id: self.part.clone(),
                name: "Core Cotton Tee".to_string(),
                colors: self
                    .colors
                    .iter()
                    .map(|(code, name)| ColorEntry {
                        code: code.clone(),
                        name: name.clone(),
                        swatch_url: None,
                        from_inventory: false,
                    })
                    .collect(),
                ..ProductRecord::default()
            }))
        }
        async fn upsert_product(&self, _: Supplier, _: &ProductRecord) -> Result<(), BoxError> {
            unreachable!()
        }
        async fn search_candidates(&self, _: &str) -> Result<Vec<StyleCandidate>, BoxError> {
            unreachable!()
        }
    }

    /// Inventory fake: records replace_scope calls with delete-then-insert
    /// semantics over an in-memory table.
    #[derive(Default)]
    struct RecordingInventory {
        table: Mutex<Vec<InventoryRow>>,
    }

    #[async_trait]
    impl InventoryStore for RecordingInventory {
        async fn rows_for_part(
            &self,
            _: Supplier,
            _: &str,
        ) -> Result<Vec<InventoryRow>, BoxError> {
            unreachable!()
        }
        async fn replace_scope(
            &self,
            supplier: Supplier,
            part_filter: Option<&str>,
            rows: Vec<InventoryRow>,
        ) -> Result<u64, BoxError> {
            let mut table = self.table.lock().unwrap();
            table.retain(|r| {
                r.supplier != supplier
                    || part_filter.is_some_and(|p| r.supplier_part_id != p)
            });
            let written = rows.len() as u64;
            table.extend(rows);
            Ok(written)
        }
        async fn upsert_row(&self, _: &InventoryRow) -> Result<(), BoxError> {
            unreachable!()
        }
        async fn warehouse_directory(
            &self,
            _: Supplier,
        ) -> Result<Vec<(String, String)>, BoxError> {
            unreachable!()
        }
    }

    fn catalog() -> OnePartCatalog {
        OnePartCatalog {
            part: "PC54".to_string(),
            colors: vec![
                ("BLK".to_string(), "Jet Black".to_string()),
                ("NVY".to_string(), "Navy".to_string()),
            ],
        }
    }

    const FEED: &str = "\
part_number|color_name|size|warehouse_code|quantity
PC54|Jet Black|M|DAL|100
PC54|Jet Black|M|SEA|20
PC54|Jeet Black|M|DAL|5
PC54|Navy|L|DAL|30
PC54|Navy|L|DAL|10
G500|Cherry Red|S|RNO|8
not a data row
";

    async fn run(
        feed: &str,
        filter: Option<&str>,
        inventory: &RecordingInventory,
    ) -> ImportReport {
        import_feed_reader(
            Cursor::new(feed),
            filter,
            &catalog(),
            inventory,
            &WarehouseDirectory::builtin(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn aggregates_merges_and_resolves_colors() {
        let inventory = RecordingInventory::default();
        let report = run(FEED, None, &inventory).await;

        assert_eq!(report.processed, 6);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.rows_written, 3);

        let table = inventory.table.lock().unwrap();
        // "Jeet Black" vowel-strips to the same key as "Jet Black" and
        // merges into the BLK/DAL cell.
        let blk = table
            .iter()
            .find(|r| r.color_code == "BLK" && r.size_code == "M")
            .unwrap();
        assert_eq!(blk.total_qty, 125);
        let dal = blk
            .warehouses
            .iter()
            .find(|w| w.warehouse_id == "DALLAS")
            .unwrap();
        assert_eq!(dal.warehouse_name.as_deref(), Some("Dallas, TX"));
        assert_eq!(dal.quantity, 105);

        // Duplicate warehouse codes within one cell sum.
        let nvy = table.iter().find(|r| r.color_code == "NVY").unwrap();
        assert_eq!(nvy.total_qty, 40);
        assert_eq!(nvy.warehouses.len(), 1);

        // Unknown part falls back to a sanitized color name.
        let g500 = table.iter().find(|r| r.supplier_part_id == "G500").unwrap();
        assert_eq!(g500.color_code, "CHERRYRED");
    }

    #[tokio::test]
    async fn part_filter_narrows_lines_and_scope() {
        let inventory = RecordingInventory::default();
        let report = run(FEED, Some("pc54"), &inventory).await;

        assert_eq!(report.rows_written, 2);
        let table = inventory.table.lock().unwrap();
        assert!(table.iter().all(|r| r.supplier_part_id == "PC54"));
    }

    #[tokio::test]
    async fn rerunning_an_unchanged_feed_is_idempotent() {
        let inventory = RecordingInventory::default();
        let first = run(FEED, None, &inventory).await;
        let snapshot: Vec<InventoryRow> = inventory.table.lock().unwrap().clone();

        let second = run(FEED, None, &inventory).await;
        assert_eq!(first, second);
        assert_eq!(*inventory.table.lock().unwrap(), snapshot);
    }

    #[tokio::test]
    async fn header_only_feed_writes_nothing() {
        let inventory = RecordingInventory::default();
        let report = run("part_number|color_name|size|warehouse_code|quantity\n", None, &inventory).await;
        assert_eq!(report, ImportReport::default());
        assert!(inventory.table.lock().unwrap().is_empty());
    }
}
