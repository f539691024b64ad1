//! In-process cache store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{CacheEntry, CacheStats, CacheStore};
use crate::error::Result;

/// Cache store backed by a map; contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn record_hit(&self, key: &str) -> Result<()> {
        if let Some(entry) = self.entries.write().await.get_mut(key) {
            entry.hit_count += 1;
        }
        Ok(())
    }

    async fn upsert(&self, entry: &CacheEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        let hit_count = entries
            .get(&entry.cache_key)
            .map_or(entry.hit_count, |existing| existing.hit_count);
        entries.insert(
            entry.cache_key.clone(),
            CacheEntry {
                hit_count,
                ..entry.clone()
            },
        );
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok((before - entries.len()) as u64)
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<CacheStats> {
        let entries = self.entries.read().await;
        Ok(CacheStats {
            entries: entries.len() as u64,
            live: entries.values().filter(|e| e.expires_at > now).count() as u64,
            total_hits: entries.values().map(|e| e.hit_count).sum(),
        })
    }
}
