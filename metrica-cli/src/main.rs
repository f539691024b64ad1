use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod input;

#[derive(Parser)]
#[command(name = "metrica", about = "Survey indicators and cached visualizations")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and maintain the analytics cache
    Cache(commands::cache::CacheArgs),
    /// Compute indicators over a survey dataset
    Compute(commands::compute::ComputeArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Summary statistics of a survey dataset
    Stats(commands::stats::StatsArgs),
    /// Check a formula, optionally against survey rows
    Validate(commands::validate::ValidateArgs),
    /// Evaluate a visualization over stored indicator values
    Visualize(commands::visualize::VisualizeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Cache(args) => commands::cache::run(args).await,
        Commands::Compute(args) => commands::compute::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Visualize(args) => commands::visualize::run(args).await,
    }
}
