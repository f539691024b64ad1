//! Turso/libSQL implementation of the cache store.
//!
//! This module provides persistent storage using Turso (libSQL).
//! It can connect to:
//! - Remote Turso database (cloud)
//! - Local embedded SQLite file

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Builder, Connection, Database};
use tracing::{debug, instrument};

use super::{CacheEntry, CacheStats, CacheStore};
use crate::error::{AnalyticsError, Result};
use crate::types::{ProjectId, VisualizationId};

/// SQL schema for the cache table.
const SCHEMA_CACHE: &str = r#"
CREATE TABLE IF NOT EXISTS analytics_cache (
    cache_key TEXT PRIMARY KEY,
    project_id INTEGER NOT NULL,
    visualization_id INTEGER,
    data TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    hit_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
)
"#;

/// SQL index for expiry-aware lookups.
const INDEX_CACHE: &str = r#"
CREATE INDEX IF NOT EXISTS idx_analytics_cache_key_expiry
ON analytics_cache(cache_key, expires_at)
"#;

/// Insert, or replace everything but the hit counter and creation time.
const UPSERT_CACHE: &str = r#"
INSERT INTO analytics_cache (cache_key, project_id, visualization_id, data, expires_at, hit_count, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(cache_key) DO UPDATE SET
    project_id = excluded.project_id,
    visualization_id = excluded.visualization_id,
    data = excluded.data,
    expires_at = excluded.expires_at
"#;

/// Turso-backed cache store.
///
/// Holds one connection so that `:memory:` databases keep their contents
/// across calls.
#[derive(Clone)]
pub struct TursoCacheStore {
    _db: Arc<Database>,
    conn: Connection,
}

impl TursoCacheStore {
    /// Create a store with a local embedded database, creating parent
    /// directories as needed.
    pub async fn new_local(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let db = Builder::new_local(path).build().await?;
        Self::open(db).await
    }

    /// Create a store connected to a remote Turso database.
    pub async fn new_remote(url: &str, token: &str) -> Result<Self> {
        let db = Builder::new_remote(url.to_string(), token.to_string())
            .build()
            .await?;
        Self::open(db).await
    }

    /// Create a new in-memory store (for testing).
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::open(db).await
    }

    async fn open(db: Database) -> Result<Self> {
        let conn = db.connect()?;
        let store = Self {
            _db: Arc::new(db),
            conn,
        };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Ensure the database schema exists.
    async fn ensure_schema(&self) -> Result<()> {
        self.conn.execute(SCHEMA_CACHE, ()).await?;
        self.conn.execute(INDEX_CACHE, ()).await?;
        Ok(())
    }

    /// Parse a cache entry from a database row.
    fn parse_entry(row: &libsql::Row) -> Result<CacheEntry> {
        let cache_key: String = row.get(0)?;
        let project_id: i64 = row.get(1)?;
        let visualization_id: Option<i64> = row.get(2)?;
        let data_json: String = row.get(3)?;
        let expires_at_str: String = row.get(4)?;
        let hit_count: i64 = row.get(5)?;

        let hit_count = u64::try_from(hit_count)
            .map_err(|_| AnalyticsError::InvalidData(format!("invalid hit count: {hit_count}")))?;

        Ok(CacheEntry {
            cache_key,
            project_id: ProjectId(project_id),
            visualization_id: visualization_id.map(VisualizationId),
            data: serde_json::from_str(&data_json)?,
            expires_at: parse_datetime(&expires_at_str)?,
            hit_count,
        })
    }
}

#[async_trait]
impl CacheStore for TursoCacheStore {
    #[instrument(skip(self), level = "debug")]
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT cache_key, project_id, visualization_id, data, expires_at, hit_count FROM analytics_cache WHERE cache_key = ?",
                [key],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::parse_entry(&row)?))
        } else {
            Ok(None)
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn record_hit(&self, key: &str) -> Result<()> {
        self.conn
            .execute(
                "UPDATE analytics_cache SET hit_count = hit_count + 1 WHERE cache_key = ?",
                [key],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, entry), fields(key = %entry.cache_key), level = "debug")]
    async fn upsert(&self, entry: &CacheEntry) -> Result<()> {
        let data_json = serde_json::to_string(&entry.data)?;
        let hit_count = i64::try_from(entry.hit_count).unwrap_or(i64::MAX);
        self.conn
            .execute(
                UPSERT_CACHE,
                libsql::params![
                    entry.cache_key.clone(),
                    entry.project_id.0,
                    entry.visualization_id.map(|id| id.0),
                    data_json,
                    format_datetime(entry.expires_at),
                    hit_count,
                    format_datetime(Utc::now())
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM analytics_cache WHERE expires_at <= ?",
                [format_datetime(now)],
            )
            .await?;
        debug!(removed, "purged expired cache entries");
        Ok(removed)
    }

    #[instrument(skip(self), level = "debug")]
    async fn stats(&self, now: DateTime<Utc>) -> Result<CacheStats> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*), COALESCE(SUM(CASE WHEN expires_at > ? THEN 1 ELSE 0 END), 0), COALESCE(SUM(hit_count), 0) FROM analytics_cache",
                [format_datetime(now)],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(CacheStats::default());
        };
        let entries: i64 = row.get(0)?;
        let live: i64 = row.get(1)?;
        let total_hits: i64 = row.get(2)?;
        Ok(CacheStats {
            entries: entries.max(0) as u64,
            live: live.max(0) as u64,
            total_hits: total_hits.max(0) as u64,
        })
    }
}

/// Format a datetime for storage.
///
/// Fixed precision keeps stored values ordered as strings.
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a datetime from storage.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AnalyticsError::InvalidData(format!("invalid datetime: {}", s)))
}
