//! Checking a formula before it is saved on an indicator.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::Dataset;
use crate::formula::{Formula, Function, finite};

const SUPPORTED: [Function; 6] = [
    Function::Count,
    Function::Sum,
    Function::Avg,
    Function::Min,
    Function::Max,
    Function::Percentage,
];

/// Outcome of [`Formula::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the formula was evaluated against sample rows.
    pub evaluated: bool,
    /// Value over the sample rows; `None` when not evaluated or not finite.
    #[serde(default)]
    pub sample_result: Option<f64>,
}

impl FormulaValidation {
    fn invalid(error: impl Into<String>, evaluated: bool) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
            evaluated,
            sample_result: None,
        }
    }
}

impl Formula {
    /// Validate `source`, evaluating it when `sample` has rows.
    ///
    /// Without rows only the syntax is checked, and the formula must call at
    /// least one aggregate function.
    #[must_use]
    pub fn validate(source: &str, sample: Option<&Dataset>) -> FormulaValidation {
        if source.trim().is_empty() {
            return FormulaValidation::invalid("Formula is required", false);
        }
        let formula = match Formula::parse(source) {
            Ok(formula) => formula,
            Err(e) => return FormulaValidation::invalid(e.describe(source), false),
        };

        let Some(sample) = sample.filter(|d| !d.is_empty()) else {
            if formula.fields().is_empty() {
                let names: Vec<&str> = SUPPORTED.iter().map(Function::as_str).collect();
                return FormulaValidation::invalid(
                    format!(
                        "Formula must contain at least one supported function: {}",
                        names.join(", ")
                    ),
                    false,
                );
            }
            return FormulaValidation {
                valid: true,
                error: None,
                evaluated: false,
                sample_result: None,
            };
        };

        match formula.evaluate(sample) {
            Ok(value) => {
                debug!(formula = source, value, rows = sample.len(), "validated formula");
                FormulaValidation {
                    valid: true,
                    error: None,
                    evaluated: true,
                    sample_result: finite(value),
                }
            }
            Err(e) => FormulaValidation::invalid(format!("Formula evaluation error: {e}"), true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;
    use crate::value::Value;

    fn sample() -> Dataset {
        Dataset::from_records(vec![
            Record::from([
                ("age".to_string(), Value::from(30.0)),
                ("score".to_string(), Value::Null),
            ]),
            Record::from([
                ("age".to_string(), Value::from(50.0)),
                ("score".to_string(), Value::from("n/a")),
            ]),
        ])
    }

    #[test]
    fn empty_formula_is_required() {
        let report = Formula::validate("  ", None);

        assert!(!report.valid);
        assert_eq!(report.error.as_deref(), Some("Formula is required"));
    }

    #[test]
    fn formula_without_function_is_rejected_without_data() {
        let report = Formula::validate("1 + 2", None);

        assert!(!report.valid);
        assert!(!report.evaluated);
        assert_eq!(
            report.error.as_deref(),
            Some(
                "Formula must contain at least one supported function: \
                 COUNT, SUM, AVG, MIN, MAX, PERCENTAGE"
            )
        );
    }

    #[test]
    fn syntax_errors_are_reported() {
        let report = Formula::validate("SUM(age) +", None);

        assert!(!report.valid);
        assert!(report.error.unwrap().contains("unexpected end of formula"));
    }

    #[test]
    fn syntax_only_check_accepts_function_calls() {
        let report = Formula::validate("count(age) / SUM(total)", None);

        assert!(report.valid);
        assert!(!report.evaluated);
        assert_eq!(report.sample_result, None);
    }

    #[test]
    fn empty_sample_falls_back_to_syntax_check() {
        let empty = Dataset::default();

        let report = Formula::validate("SUM(missing)", Some(&empty));

        assert!(report.valid);
        assert!(!report.evaluated);
    }

    #[test]
    fn sample_evaluation_returns_result() {
        let report = Formula::validate("AVG(age) * 2", Some(&sample()));

        assert!(report.valid);
        assert!(report.evaluated);
        assert_eq!(report.sample_result, Some(80.0));
    }

    #[test]
    fn unknown_column_in_sample_is_invalid() {
        let report = Formula::validate("SUM(weight)", Some(&sample()));

        assert!(!report.valid);
        assert!(report.evaluated);
        let error = report.error.unwrap();
        assert!(error.starts_with("Formula evaluation error: Column 'weight' not found"));
        assert!(error.contains("Available columns: age, score"));
    }

    #[test]
    fn non_finite_sample_is_null() {
        let report = Formula::validate("AVG(score)", Some(&sample()));

        assert!(report.valid);
        assert_eq!(report.sample_result, None);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sample_result"], serde_json::Value::Null);
        assert!(json.get("error").is_none());
    }
}
