//! `metrica cache`: inspect and purge the analytics cache database.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use metrica_analytics::{AnalyticsCache, CacheStore, MemoryCacheStore, TursoCacheStore};
use tracing::debug;

use crate::config::{ConfigLoader, MetricaConfig};

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show entry counts and total hits
    Stats,
    /// Delete expired entries
    Purge,
}

pub async fn run(args: CacheArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let cache = open_cache(&config).await?;

    match args.command {
        CacheCommands::Stats => {
            let stats = cache.stats().await?;
            println!("Database: {}", config.cache.database.display());
            println!("Entries:  {}", stats.entries);
            println!("Live:     {}", stats.live);
            println!("Expired:  {}", stats.entries.saturating_sub(stats.live));
            println!("Hits:     {}", stats.total_hits);
        }
        CacheCommands::Purge => {
            let removed = cache.purge_expired().await?;
            println!("Removed {removed} expired entries.");
        }
    }
    Ok(())
}

/// Cache configured by `[cache]`: the libSQL file when enabled, otherwise an
/// in-memory store that lives for this command only.
pub async fn open_cache(config: &MetricaConfig) -> Result<AnalyticsCache> {
    let store: Arc<dyn CacheStore> = if config.cache.enabled {
        debug!(path = %config.cache.database.display(), "opening cache database");
        let store = TursoCacheStore::new_local(&config.cache.database)
            .await
            .with_context(|| format!("opening {}", config.cache.database.display()))?;
        Arc::new(store)
    } else {
        Arc::new(MemoryCacheStore::new())
    };
    Ok(AnalyticsCache::new(store).with_ttl(config.cache.ttl()?))
}
