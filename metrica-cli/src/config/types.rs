use anyhow::{Context, Result, bail};
use chrono::{TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawMetricaConfig {
    #[serde(default)]
    pub cache: RawCacheConfig,

    #[serde(default)]
    pub analytics: RawAnalyticsConfig,
}

/// Cache config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawCacheConfig {
    pub ttl_hours: Option<i64>,
    pub enabled: Option<bool>,
    pub database: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAnalyticsConfig {
    pub project_id: Option<i64>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricaConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of cached visualization results
    pub ttl_hours: i64,

    /// Store results in the cache database; when off, results are cached
    /// in memory for the current command only
    pub enabled: bool,

    /// libSQL database file
    pub database: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: metrica_analytics::DEFAULT_TTL_HOURS,
            enabled: true,
            database: metrica_paths::cache_database(),
        }
    }
}

impl CacheConfig {
    /// Entry lifetime; must be positive and leave a representable expiry time
    pub fn ttl(&self) -> Result<TimeDelta> {
        let hours = self.ttl_hours;
        if hours <= 0 {
            bail!("cache.ttl_hours must be positive, got {hours}");
        }
        TimeDelta::try_hours(hours)
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .with_context(|| format!("cache.ttl_hours = {hours} is too large"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Project whose indicator values visualizations read
    pub project_id: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            project_id: DEFAULT_PROJECT_ID,
        }
    }
}

/// Project used when none is configured
pub const DEFAULT_PROJECT_ID: i64 = 1;
