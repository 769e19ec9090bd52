//! Short-TTL side-channel cache.
//!
//! Never a source of truth: on any read or write failure callers warn and
//! fall through to the authoritative store or live source. Values are JSON
//! strings so the cache stays payload-agnostic.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::BoxError;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, BoxError>;

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), BoxError>;
}

/// In-process cache with lazy expiry: entries past their deadline are
/// dropped on the read that finds them.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (Instant, String)>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((deadline, value)) if *deadline > Instant::now() => {
                    return Ok(Some(value.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Expired: take the write lock and evict.
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), BoxError> {
        let deadline = Instant::now() + ttl;
        self.entries
            .write()
            .await
            .insert(key.to_string(), (deadline, value));
        Ok(())
    }
}
