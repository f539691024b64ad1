//! Shaping aggregated cells for each visualization type.
//!
//! The JSON field names (`type`, `data`, `options`, `rows`, `columns`) are
//! read by dashboard and report renderers.

use metrica_formula::finite;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::aggregate::Aggregation;
use crate::visualization::{DisplayOptions, VisualizationType};

/// Result of evaluating a visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormattedResult {
    /// Column, bar, line, area and pie charts.
    Chart(ChartResult),
    SingleValue(SingleValueResult),
    Pivot(PivotResult),
    /// Cells passed through unchanged for types without a dedicated shape.
    Raw(Aggregation),
}

/// A chart series: one point per cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartResult {
    #[serde(rename = "type")]
    pub chart_type: VisualizationType,
    pub data: Vec<ChartPoint>,
    pub options: DisplayOptions,
}

/// One chart point. Pie slices carry only `name` and `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleValueResult {
    #[serde(rename = "type")]
    pub kind: VisualizationType,
    pub data: SingleValue,
    pub options: DisplayOptions,
}

/// Total across all cells plus display pass-throughs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleValue {
    pub value: f64,
    pub label: serde_json::Value,
    pub trend: serde_json::Value,
    pub target: serde_json::Value,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotResult {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub data: Aggregation,
    pub options: DisplayOptions,
}

impl FormattedResult {
    /// Number of data entries (points, cells, or 1 for a single value).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Chart(chart) => chart.data.len(),
            Self::SingleValue(_) => 1,
            Self::Pivot(pivot) => pivot.data.len(),
            Self::Raw(cells) => cells.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shape `aggregation` for `viz_type`.
///
/// Series charts get default axis labels merged into `options`; types
/// without a dedicated shape return the cells unchanged.
#[must_use]
pub fn format(
    aggregation: Aggregation,
    viz_type: VisualizationType,
    options: DisplayOptions,
) -> FormattedResult {
    match viz_type {
        t if t.is_series_chart() => format_series(&aggregation, t, options),
        VisualizationType::PieChart => format_pie(&aggregation, options),
        VisualizationType::PivotTable => FormattedResult::Pivot(PivotResult {
            rows: aggregation.rows(),
            columns: aggregation.columns(),
            data: aggregation,
            options,
        }),
        VisualizationType::SingleValue => format_single_value(&aggregation, options),
        other => {
            tracing::debug!(visualization_type = other.as_str(), "passing cells through");
            FormattedResult::Raw(aggregation)
        }
    }
}

fn format_series(
    aggregation: &Aggregation,
    chart_type: VisualizationType,
    mut options: DisplayOptions,
) -> FormattedResult {
    let data = aggregation
        .cells()
        .map(|cell| ChartPoint {
            name: cell.row.clone(),
            value: cell.sum,
            average: Some(cell.avg),
            count: Some(cell.count),
        })
        .collect();
    options
        .entry("xAxisLabel")
        .or_insert_with(|| json!("Period"));
    options
        .entry("yAxisLabel")
        .or_insert_with(|| json!("Value"));
    FormattedResult::Chart(ChartResult {
        chart_type,
        data,
        options,
    })
}

fn format_pie(aggregation: &Aggregation, options: DisplayOptions) -> FormattedResult {
    let data = aggregation
        .cells()
        .map(|cell| ChartPoint {
            name: cell.row.clone(),
            value: cell.sum,
            average: None,
            count: None,
        })
        .collect();
    FormattedResult::Chart(ChartResult {
        chart_type: VisualizationType::PieChart,
        data,
        options,
    })
}

fn format_single_value(aggregation: &Aggregation, options: DisplayOptions) -> FormattedResult {
    let (total, count) = aggregation
        .cells()
        .fold((0.0, 0usize), |(sum, count), cell| (sum + cell.sum, count + cell.count));
    let average = if count > 0 { total / count as f64 } else { 0.0 };
    if !total.is_finite() {
        tracing::warn!(cells = aggregation.len(), "single value total overflowed");
    }

    let option = |key: &str| options.get(key).cloned();
    let data = SingleValue {
        value: finite(total).unwrap_or(0.0),
        label: option("label").unwrap_or_else(|| json!("Total")),
        trend: option("trend").unwrap_or_else(|| json!(0)),
        target: option("target_value")
            .or_else(|| option("target"))
            .unwrap_or(serde_json::Value::Null),
        average: finite(average).unwrap_or(0.0),
    };
    FormattedResult::SingleValue(SingleValueResult {
        kind: VisualizationType::SingleValue,
        data,
        options,
    })
}
