//! Indicator computation over a survey dataset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dataset::Dataset;
use crate::filter::{FilterCriteria, apply_filters};
use crate::formula::{Formula, finite};
use crate::statistics::{ColumnStatistics, summary_statistics};
use crate::value::Value;

/// A named, formula-defined metric, optionally restricted by filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDefinition {
    pub name: String,
    pub formula: String,
    #[serde(default)]
    pub filter_criteria: FilterCriteria,
}

impl IndicatorDefinition {
    pub fn new(name: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formula: formula.into(),
            filter_criteria: FilterCriteria::new(),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter_criteria.insert(field.into(), value.into());
        self
    }
}

/// Outcome of computing one indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputationStatus {
    Success,
    Error,
}

impl ComputationStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Result record for one indicator computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationResult {
    pub indicator_name: String,
    pub formula: String,
    pub filter_criteria: FilterCriteria,
    /// `None` when the computation failed or produced NaN or an infinity.
    pub value: Option<f64>,
    pub rows_processed: usize,
    pub total_rows: usize,
    pub status: ComputationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComputationResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ComputationStatus::Success
    }
}

/// Computes indicators against one dataset.
///
/// Failures are captured per indicator: [`compute`](Self::compute) never
/// returns an error, it reports `status: error` in the result instead.
pub struct IndicatorComputation<'a> {
    dataset: &'a Dataset,
}

impl<'a> IndicatorComputation<'a> {
    #[must_use]
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.dataset.len()
    }

    /// Filter the dataset by the indicator's criteria, then evaluate its formula.
    #[must_use]
    pub fn compute(&self, indicator: &IndicatorDefinition) -> ComputationResult {
        let filtered = apply_filters(self.dataset, &indicator.filter_criteria);
        let outcome = Formula::parse(&indicator.formula)
            .and_then(|formula| formula.evaluate(&filtered))
            .map_err(|e| e.describe(&indicator.formula));

        let (value, status, error) = match outcome {
            Ok(raw) => (finite(raw), ComputationStatus::Success, None),
            Err(message) => {
                warn!(indicator = %indicator.name, error = %message, "indicator computation failed");
                (None, ComputationStatus::Error, Some(message))
            }
        };
        debug!(
            indicator = %indicator.name,
            rows = filtered.len(),
            ?value,
            status = status.as_str(),
            "computed indicator"
        );

        ComputationResult {
            indicator_name: indicator.name.clone(),
            formula: indicator.formula.clone(),
            filter_criteria: indicator.filter_criteria.clone(),
            value,
            rows_processed: filtered.len(),
            total_rows: self.dataset.len(),
            status,
            error,
        }
    }

    /// Compute each indicator independently, preserving input order.
    #[must_use]
    pub fn compute_batch(&self, indicators: &[IndicatorDefinition]) -> Vec<ComputationResult> {
        indicators.iter().map(|i| self.compute(i)).collect()
    }

    /// Per-field statistics over every field with at least one numeric value.
    #[must_use]
    pub fn summary_statistics(&self) -> BTreeMap<String, ColumnStatistics> {
        summary_statistics(self.dataset)
    }
}
