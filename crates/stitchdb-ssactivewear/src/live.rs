//! Live product source over the S&S API.
//!
//! Backs the loader's live-with-cache fetch strategy: an unknown style is
//! "no data", not an error, so bundle loads degrade gracefully when S&S has
//! never heard of the part.

use async_trait::async_trait;

use stitchdb_core::{InventoryRow, ProductRecord, Supplier, WarehouseDirectory};
use stitchdb_engine::{BoxError, LiveProductSource};

use crate::client::SsClient;
use crate::normalize::{build_product_record, group_inventory};
use crate::SsError;

pub struct SsLiveSource {
    client: SsClient,
    directory: WarehouseDirectory,
}

impl SsLiveSource {
    #[must_use]
    pub fn new(client: SsClient, directory: WarehouseDirectory) -> Self {
        Self { client, directory }
    }
}

#[async_trait]
impl LiveProductSource for SsLiveSource {
    fn supplier(&self) -> Supplier {
        Supplier::SsActivewear
    }

    async fn fetch_product(&self, part_id: &str) -> Result<Option<ProductRecord>, BoxError> {
        let style = match self.client.get_style(part_id).await {
            Ok(style) => style,
            Err(SsError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(Box::new(e)),
        };
        let variants = self.client.products_for_style(&style.style_name).await?;
        Ok(build_product_record(&style, &variants))
    }

    async fn fetch_inventory(&self, part_id: &str) -> Result<Vec<InventoryRow>, BoxError> {
        let items = match self.client.inventory_for_style(part_id).await {
            Ok(items) => items,
            Err(SsError::NotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(Box::new(e)),
        };
        Ok(group_inventory(part_id, &items, &self.directory))
    }
}
