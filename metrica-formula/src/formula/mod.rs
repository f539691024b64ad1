//! Indicator formula language.
//!
//! A formula is arithmetic (`+ - * / ( )` and numeric literals) over
//! aggregate calls against the dataset:
//!
//! | Call | Result |
//! |------|--------|
//! | `COUNT(field)` | non-missing values in `field` |
//! | `SUM(field)` | sum of numeric readings; other values contribute nothing |
//! | `AVG(field)` | mean of numeric readings |
//! | `MIN(field)` / `MAX(field)` | extremes of numeric readings |
//! | `PERCENTAGE(field, value)` | `100 * matching rows / total rows`, 0 for an empty dataset |
//!
//! Function names are case-insensitive; field names are matched exactly and
//! may contain spaces, hyphens and dots. Nothing outside this grammar is
//! accepted, so formulas from configuration cannot reach anything but the
//! dataset.

mod lexer;
mod parser;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

pub use lexer::{Token, tokenize};
pub use parser::{BinaryOp, Expr};

use crate::dataset::Dataset;
use crate::error::{FormulaError, Result};

/// Aggregate functions callable from a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Function {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Percentage,
}

impl Function {
    /// Parse a function name, ignoring case.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "COUNT" => Some(Self::Count),
            "SUM" => Some(Self::Sum),
            "AVG" => Some(Self::Avg),
            "MIN" => Some(Self::Min),
            "MAX" => Some(Self::Max),
            "PERCENTAGE" => Some(Self::Percentage),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Percentage => "PERCENTAGE",
        }
    }

    /// Whether the call takes a comparison value after the field name.
    #[must_use]
    pub fn takes_value(&self) -> bool {
        matches!(self, Self::Percentage)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed formula, ready to evaluate against any number of datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Tokenize and parse a formula string.
    pub fn parse(source: &str) -> Result<Self> {
        let expr = parser::parse(tokenize(source)?)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Field names referenced by aggregate calls, in formula order.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        self.expr.for_each_aggregate(&mut |_, field| {
            if !fields.contains(&field) {
                fields.push(field);
            }
        });
        fields
    }

    /// Evaluate against a dataset.
    ///
    /// The result may be NaN or infinite (empty means, division by zero);
    /// pass it through [`finite`] before reporting it.
    pub fn evaluate(&self, dataset: &Dataset) -> Result<f64> {
        // Every referenced column must exist, even in branches whose value
        // would not change the result.
        let mut missing = None;
        self.expr.for_each_aggregate(&mut |_, field| {
            if missing.is_none() && !dataset.has_column(field) {
                missing = Some(field.to_string());
            }
        });
        if let Some(column) = missing {
            return Err(FormulaError::UnknownColumn {
                column,
                available: dataset.columns().to_vec(),
            });
        }

        let value = eval(&self.expr, dataset);
        trace!(formula = %self.source, value, "evaluated formula");
        Ok(value)
    }
}

/// Parse and evaluate `formula` against `dataset` in one step.
pub fn evaluate(formula: &str, dataset: &Dataset) -> Result<f64> {
    Formula::parse(formula)?.evaluate(dataset)
}

/// Map NaN and infinities to `None`.
///
/// Every place a formula or statistic leaves the engine goes through here.
#[must_use]
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn eval(expr: &Expr, dataset: &Dataset) -> f64 {
    match expr {
        Expr::Number(n) => *n,
        Expr::Aggregate {
            function,
            field,
            value,
        } => aggregate(*function, field, value.as_deref(), dataset),
        Expr::Negate(inner) => -eval(inner, dataset),
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs, dataset);
            let rhs = eval(rhs, dataset);
            match op {
                BinaryOp::Add => lhs + rhs,
                BinaryOp::Subtract => lhs - rhs,
                BinaryOp::Multiply => lhs * rhs,
                BinaryOp::Divide if rhs == 0.0 => f64::NAN,
                BinaryOp::Divide => lhs / rhs,
            }
        }
    }
}

fn aggregate(function: Function, field: &str, value: Option<&str>, dataset: &Dataset) -> f64 {
    match function {
        Function::Count => dataset.column(field).filter(|v| !v.is_missing()).count() as f64,
        Function::Sum => dataset.numeric_column(field).iter().sum(),
        Function::Avg => {
            let values = dataset.numeric_column(field);
            if values.is_empty() {
                f64::NAN
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        }
        Function::Min => dataset
            .numeric_column(field)
            .into_iter()
            .reduce(f64::min)
            .unwrap_or(f64::NAN),
        Function::Max => dataset
            .numeric_column(field)
            .into_iter()
            .reduce(f64::max)
            .unwrap_or(f64::NAN),
        Function::Percentage => {
            if dataset.is_empty() {
                return 0.0;
            }
            let target = value.unwrap_or_default();
            let matching = dataset
                .column(field)
                .filter(|v| v.to_string() == target)
                .count();
            matching as f64 / dataset.len() as f64 * 100.0
        }
    }
}
