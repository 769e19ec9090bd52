use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Static canonical style mapping (YAML); optional — the heuristic
    /// covers styles the table does not pin.
    pub style_map_path: Option<PathBuf>,
    /// Warehouse alias table override; the built-in table applies when unset.
    pub warehouses_path: Option<PathBuf>,
    /// Pipe-delimited SanMar inventory feed drop location.
    pub sanmar_feed_path: PathBuf,
    pub ss_base_url: String,
    /// S&S Basic-auth credentials. Imports and live lookups for that
    /// supplier are disabled when either is absent.
    pub ss_account_number: Option<String>,
    pub ss_api_key: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    pub ss_page_size: u32,
    pub search_cache_ttl_secs: u64,
    pub inventory_cache_ttl_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("style_map_path", &self.style_map_path)
            .field("warehouses_path", &self.warehouses_path)
            .field("sanmar_feed_path", &self.sanmar_feed_path)
            .field("ss_base_url", &self.ss_base_url)
            .field("ss_account_number", &self.ss_account_number)
            .field("ss_api_key", &self.ss_api_key.as_ref().map(|_| "[redacted]"))
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("ss_page_size", &self.ss_page_size)
            .field("search_cache_ttl_secs", &self.search_cache_ttl_secs)
            .field("inventory_cache_ttl_secs", &self.inventory_cache_ttl_secs)
            .finish()
    }
}
