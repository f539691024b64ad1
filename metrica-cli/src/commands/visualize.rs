//! `metrica visualize`: evaluate a visualization over indicator values.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use metrica_analytics::{
    AnalyticsEngine, IndicatorValueRecord, MemoryValueSource, ProjectId, Visualization,
};

use super::cache::open_cache;
use crate::config::ConfigLoader;
use crate::input::read_json;

#[derive(Args, Debug)]
pub struct VisualizeArgs {
    /// Visualization definition as JSON
    pub visualization: PathBuf,

    /// Indicator values as a JSON array (as written by `metrica compute --output`)
    #[arg(long)]
    pub values: PathBuf,

    /// Project to evaluate for (defaults to analytics.project_id)
    #[arg(long)]
    pub project: Option<i64>,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

pub async fn run(args: VisualizeArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let visualization: Visualization = read_json(&args.visualization)?;
    let records: Vec<IndicatorValueRecord> = read_json(&args.values)?;
    let project_id = ProjectId(args.project.unwrap_or(config.analytics.project_id));

    let engine = AnalyticsEngine::new(
        project_id,
        Arc::new(MemoryValueSource::new(records)),
        open_cache(&config).await?,
    );
    let result = engine.evaluate(&visualization).await?;

    let json = if args.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{json}");
    Ok(())
}
