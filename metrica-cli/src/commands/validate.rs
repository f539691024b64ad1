//! `metrica validate`: check a formula before saving it on an indicator.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use metrica_formula::{Dataset, Formula, FormulaValidation};

use super::compute::format_number;
use crate::input::read_json;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Formula to check, e.g. "COUNT(age) / SUM(total)"
    pub formula: String,

    /// Survey rows to evaluate the formula against
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Print the validation report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let sample: Option<Dataset> = args.data.as_deref().map(read_json::<Dataset>).transpose()?;
    let report = Formula::validate(&args.formula, sample.as_ref());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.valid {
        println!("{}", describe(&report));
    }
    if let Some(error) = report.error {
        bail!(error);
    }
    Ok(())
}

fn describe(report: &FormulaValidation) -> String {
    if !report.evaluated {
        return "Formula syntax appears valid (test with survey data for full validation)"
            .to_string();
    }
    let sample = report
        .sample_result
        .map(format_number)
        .unwrap_or_else(|| "null".to_string());
    format!("Formula is valid. Sample result: {sample}")
}
