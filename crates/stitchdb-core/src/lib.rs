pub mod app_config;
pub mod color_key;
pub mod config;
pub mod sizes;
pub mod style_map;
pub mod style_number;
pub mod types;
pub mod warehouses;

pub use app_config::{AppConfig, Environment};
pub use color_key::{color_key_candidates, resolve_color_code, ColorResolution};
pub use config::load_app_config;
pub use style_map::{load_style_map, StyleMap, StyleMapEntry};
pub use style_number::{guess_style_number, normalize_style_number};
pub use types::{
    CanonicalStyle, ColorEntry, InventoryRow, MediaEntry, ProductRecord, SizeEntry, SkuMapEntry,
    Supplier, SupplierLink, WarehouseQty,
};
pub use warehouses::{load_warehouse_directory, WarehouseDirectory, WarehouseRef};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("config validation failed: {0}")]
    Validation(String),
}
