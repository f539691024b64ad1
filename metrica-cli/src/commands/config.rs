//! `metrica config`: the merged configuration and where its layers live.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::{ConfigLoader, MetricaConfig};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the merged configuration as TOML
    Show,
    /// List config layers and the cache database, marking which exist
    Path,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    match args.command {
        ConfigCommands::Show => print!("{}", toml::to_string_pretty(&config)?),
        ConfigCommands::Path => {
            for line in layer_lines(&config) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn layer_lines(config: &MetricaConfig) -> Vec<String> {
    [
        ("user config", ConfigLoader::user_config_path()),
        ("project config", ConfigLoader::project_config_path()),
        ("cache database", config.cache.database.clone()),
    ]
    .iter()
    .map(|(label, path)| format!("{label:<15} {} {}", presence(path), path.display()))
    .collect()
}

fn presence(path: &Path) -> &'static str {
    if path.exists() { "[found]  " } else { "[missing]" }
}
