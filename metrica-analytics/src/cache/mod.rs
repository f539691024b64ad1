//! Fingerprint-keyed cache of formatted visualization results.
//!
//! - [`fingerprint`] derives the cache key from a visualization's identity,
//!   configuration and last-modified marker
//! - [`CacheStore`] is the storage seam: one row per key with expiry and a
//!   hit counter
//! - [`AnalyticsCache`] applies the TTL and hit-count rules over a store
//!
//! Expired rows are never deleted on lookup. The next `put` for the same key
//! replaces them; [`AnalyticsCache::purge_expired`] removes them explicitly.

mod memory;
mod turso;

pub use memory::MemoryCacheStore;
pub use turso::TursoCacheStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use crate::error::{AnalyticsError, Result};
use crate::format::FormattedResult;
use crate::types::{ProjectId, VisualizationId};
use crate::visualization::Visualization;

/// Default lifetime of a cache entry.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Identity component used for visualizations that have not been saved.
const PREVIEW: &str = "preview";

/// One cached result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub cache_key: String,
    pub project_id: ProjectId,
    pub visualization_id: Option<VisualizationId>,
    pub data: FormattedResult,
    pub expires_at: DateTime<Utc>,
    pub hit_count: u64,
}

/// Cache occupancy summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Rows in the store, expired or not.
    pub entries: u64,
    /// Rows whose `expires_at` is still in the future.
    pub live: u64,
    /// Sum of hit counts over all rows.
    pub total_hits: u64,
}

/// Storage for cache entries, unique by `cache_key`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Load the entry for `key`, expired or not.
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Increment the hit counter of `key` by one.
    async fn record_hit(&self, key: &str) -> Result<()>;

    /// Insert `entry`, or replace the row with the same key.
    ///
    /// A replaced row keeps its hit counter.
    async fn upsert(&self, entry: &CacheEntry) -> Result<()>;

    /// Delete rows with `expires_at <= now`, returning how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;

    async fn stats(&self, now: DateTime<Utc>) -> Result<CacheStats>;
}

/// Compute the cache key of a visualization.
///
/// SHA-256 (hex) over key-sorted JSON of the identity (or `"preview"`),
/// dimensions, filters, layout, type and `updated_at` (or `"preview"`).
pub fn fingerprint(visualization: &Visualization) -> Result<String> {
    let identity = match visualization.id {
        Some(id) => json!(id.0),
        None => json!(PREVIEW),
    };
    let version = match visualization.updated_at {
        Some(at) => json!(at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        None => json!(PREVIEW),
    };
    let mut key_data = serde_json::Map::new();
    key_data.insert("viz_id".into(), identity);
    key_data.insert(
        "dimensions".into(),
        serde_json::to_value(&visualization.dimensions)?,
    );
    key_data.insert("filters".into(), serde_json::to_value(&visualization.filters)?);
    key_data.insert("layout".into(), serde_json::to_value(&visualization.layout)?);
    key_data.insert(
        "visualization_type".into(),
        json!(visualization.visualization_type.as_str()),
    );
    key_data.insert("updated_at".into(), version);
    let key_data = serde_json::Value::Object(key_data);

    let mut canonical = String::new();
    write_canonical(&key_data, &mut canonical)?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Serialize `value` with object keys sorted at every level.
fn write_canonical(value: &serde_json::Value, out: &mut String) -> Result<()> {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_canonical(value, out)?;
            }
            out.push('}');
        }
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

/// TTL and hit-count rules over a [`CacheStore`].
#[derive(Clone)]
pub struct AnalyticsCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl AnalyticsCache {
    /// Create a cache with the default 24 hour TTL.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &str) -> Result<Option<FormattedResult>> {
        self.get_at(key, Utc::now()).await
    }

    /// Return the cached result if it expires after `now`, counting the hit.
    ///
    /// A row whose payload no longer decodes is a miss; the next `put`
    /// replaces it.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_at(&self, key: &str, now: DateTime<Utc>) -> Result<Option<FormattedResult>> {
        let entry = match self.store.load(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!("cache miss");
                return Ok(None);
            }
            Err(AnalyticsError::Serialization(error)) => {
                warn!(%error, "unreadable cache entry, recomputing");
                return Ok(None);
            }
            Err(error) => return Err(error),
        };
        if entry.expires_at <= now {
            debug!(expires_at = %entry.expires_at, "cache entry expired");
            return Ok(None);
        }
        self.store.record_hit(key).await?;
        debug!(hit_count = entry.hit_count + 1, "cache hit");
        Ok(Some(entry.data))
    }

    pub async fn put(
        &self,
        key: &str,
        visualization: &Visualization,
        result: &FormattedResult,
    ) -> Result<bool> {
        self.put_at(key, visualization, result, Utc::now()).await
    }

    /// Store `result` under `key` until `now + ttl`.
    ///
    /// Previews (no id) are never stored; returns whether a row was written.
    #[instrument(skip(self, visualization, result), level = "debug")]
    pub async fn put_at(
        &self,
        key: &str,
        visualization: &Visualization,
        result: &FormattedResult,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(visualization_id) = visualization.id else {
            debug!("preview visualization, not caching");
            return Ok(false);
        };
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            AnalyticsError::InvalidData(format!(
                "cache ttl of {} hours overflows the expiry time",
                self.ttl.num_hours()
            ))
        })?;
        let entry = CacheEntry {
            cache_key: key.to_string(),
            project_id: visualization.project_id,
            visualization_id: Some(visualization_id),
            data: result.clone(),
            expires_at,
            hit_count: 0,
        };
        self.store.upsert(&entry).await?;
        debug!(expires_at = %entry.expires_at, "cached result");
        Ok(true)
    }

    pub async fn purge_expired(&self) -> Result<u64> {
        self.store.purge_expired(Utc::now()).await
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        self.store.stats(Utc::now()).await
    }
}
