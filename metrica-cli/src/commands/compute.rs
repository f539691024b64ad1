//! `metrica compute`: evaluate indicator formulas over a survey dataset.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use metrica_analytics::{IndicatorId, IndicatorValueRecord, ProjectId};
use metrica_formula::{ComputationResult, Dataset, IndicatorComputation, IndicatorDefinition};
use tracing::info;

use crate::config::ConfigLoader;
use crate::input::{read_indicators, read_json, write_json};

#[derive(Args, Debug)]
pub struct ComputeArgs {
    /// Survey rows as a JSON array of objects
    #[arg(short, long)]
    pub data: PathBuf,

    /// Indicator definitions as a JSON array of {id?, name, formula, filter_criteria?}
    #[arg(short, long)]
    pub indicators: PathBuf,

    /// Print results as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Append successful values to this indicator value file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Period label recorded with the values (e.g. "Q1 2024")
    #[arg(short, long, default_value = "")]
    pub period: String,

    /// Survey name recorded with the values (defaults to the data file stem)
    #[arg(long)]
    pub survey: Option<String>,

    /// Project of the values (defaults to analytics.project_id)
    #[arg(long)]
    pub project: Option<i64>,
}

pub fn run(args: ComputeArgs) -> Result<()> {
    let dataset: Dataset = read_json(&args.data)?;
    let indicators = read_indicators(&args.indicators)?;
    let definitions: Vec<IndicatorDefinition> =
        indicators.iter().map(|(_, d)| d.clone()).collect();

    let results = IndicatorComputation::new(&dataset).compute_batch(&definitions);
    let failed = results.iter().filter(|r| !r.is_success()).count();
    info!(
        indicators = results.len(),
        failed,
        rows = dataset.len(),
        "computed indicators"
    );

    if let Some(output) = &args.output {
        let project_id = match args.project {
            Some(id) => id,
            None => ConfigLoader::load()?.analytics.project_id,
        };
        let survey = args.survey.clone().unwrap_or_else(|| {
            args.data
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let mut records: Vec<IndicatorValueRecord> = if output.exists() {
            read_json(output)?
        } else {
            Vec::new()
        };
        let calculated_at = Utc::now();
        let before = records.len();
        records.extend(indicators.iter().zip(&results).filter_map(|((id, _), result)| {
            IndicatorValueRecord::from_computation(
                ProjectId(project_id),
                IndicatorId(*id),
                survey.as_str(),
                args.period.as_str(),
                result,
                calculated_at,
            )
        }));
        write_json(output, &records)?;
        info!(
            path = %output.display(),
            added = records.len() - before,
            "saved indicator values"
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_table(&results);
    }
    Ok(())
}

fn print_table(results: &[ComputationResult]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Indicator").fg(Color::Cyan),
        Cell::new("Formula").fg(Color::Cyan),
        Cell::new("Value").fg(Color::Cyan),
        Cell::new("Rows").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
    ]);

    for result in results {
        let value = result
            .value
            .map(format_number)
            .unwrap_or_else(|| "-".to_string());
        let status = match &result.error {
            Some(error) => Cell::new(error).fg(Color::Red),
            None => Cell::new(result.status.as_str()).fg(Color::Green),
        };
        table.add_row(vec![
            Cell::new(&result.indicator_name),
            Cell::new(&result.formula),
            Cell::new(value),
            Cell::new(format!("{}/{}", result.rows_processed, result.total_rows)),
            status,
        ]);
    }

    println!("{table}");
}

/// Integral values without a fraction, others to four decimals.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value:.4}")
    }
}
