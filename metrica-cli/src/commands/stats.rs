//! `metrica stats`: per-field summary statistics of a survey dataset.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use metrica_formula::{ColumnStatistics, Dataset, summary_statistics};

use super::compute::format_number;
use crate::input::read_json;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Survey rows as a JSON array of objects
    #[arg(short, long)]
    pub data: PathBuf,

    /// Print statistics as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: StatsArgs) -> Result<()> {
    let dataset: Dataset = read_json(&args.data)?;
    let statistics = summary_statistics(&dataset);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&statistics)?);
        return Ok(());
    }
    if statistics.is_empty() {
        println!("No numeric fields in {}.", args.data.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        ["Field", "Count", "Mean", "Median", "Std", "Min", "Max", "Sum"]
            .into_iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    for (field, stats) in &statistics {
        table.add_row(row(field, stats));
    }
    println!("{table}");
    Ok(())
}

fn row(field: &str, stats: &ColumnStatistics) -> Vec<String> {
    let cell = |v: Option<f64>| v.map(format_number).unwrap_or_else(|| "-".to_string());
    vec![
        field.to_string(),
        stats.count.to_string(),
        cell(stats.mean),
        cell(stats.median),
        cell(stats.std),
        cell(stats.min),
        cell(stats.max),
        cell(stats.sum),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_renders_missing_statistics_as_dash() {
        let stats = ColumnStatistics {
            count: 1,
            mean: Some(7.0),
            median: Some(7.0),
            std: None,
            min: Some(7.0),
            max: Some(7.0),
            sum: Some(7.0),
        };

        assert_eq!(
            row("age", &stats),
            vec!["age", "1", "7", "7", "-", "7", "7", "7"]
        );
    }
}
