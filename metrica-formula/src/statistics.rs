//! Descriptive statistics for the numeric fields of a dataset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::formula::finite;

/// Statistics for one field. Any statistic that is not finite is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation (n - 1 denominator).
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: Option<f64>,
}

impl ColumnStatistics {
    fn from_values(mut values: Vec<f64>) -> Self {
        let count = values.len();
        let n = count as f64;
        let sum: f64 = values.iter().sum();
        let mean = sum / n;
        let std = if count > 1 {
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            variance.sqrt()
        } else {
            f64::NAN
        };

        values.sort_by(f64::total_cmp);
        let median = if count % 2 == 1 {
            values[count / 2]
        } else {
            (values[count / 2 - 1] + values[count / 2]) / 2.0
        };

        Self {
            count,
            mean: finite(mean),
            median: finite(median),
            std: finite(std),
            min: values.first().copied().and_then(finite),
            max: values.last().copied().and_then(finite),
            sum: finite(sum),
        }
    }
}

/// Statistics for every field with at least one numeric reading.
///
/// Fields holding only non-numeric text or nulls are omitted.
#[must_use]
pub fn summary_statistics(dataset: &Dataset) -> BTreeMap<String, ColumnStatistics> {
    dataset
        .columns()
        .iter()
        .filter_map(|column| {
            let values = dataset.numeric_column(column);
            (!values.is_empty()).then(|| (column.clone(), ColumnStatistics::from_values(values)))
        })
        .collect()
}
