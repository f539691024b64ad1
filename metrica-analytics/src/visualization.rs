//! Visualization configuration.
//!
//! A visualization picks indicators and a period (dimensions), narrows them
//! with filters, arranges dimensions into rows and columns (layout) and is
//! rendered as one of the [`VisualizationType`]s.

use chrono::{DateTime, Utc};
use metrica_formula::FilterCriteria;
use serde::{Deserialize, Serialize};

use crate::types::{IndicatorId, ProjectId, VisualizationId};

/// Free-form presentation options passed through to the renderer.
pub type DisplayOptions = serde_json::Map<String, serde_json::Value>;

/// Presentation type of a visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationType {
    PivotTable,
    ColumnChart,
    BarChart,
    LineChart,
    AreaChart,
    PieChart,
    Gauge,
    SingleValue,
    Scatter,
    Radar,
    /// Any type name this version does not know.
    #[serde(other)]
    Other,
}

impl VisualizationType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PivotTable => "pivot_table",
            Self::ColumnChart => "column_chart",
            Self::BarChart => "bar_chart",
            Self::LineChart => "line_chart",
            Self::AreaChart => "area_chart",
            Self::PieChart => "pie_chart",
            Self::Gauge => "gauge",
            Self::SingleValue => "single_value",
            Self::Scatter => "scatter",
            Self::Radar => "radar",
            Self::Other => "other",
        }
    }

    /// Parse a type name; unknown names map to [`Self::Other`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "pivot_table" => Self::PivotTable,
            "column_chart" => Self::ColumnChart,
            "bar_chart" => Self::BarChart,
            "line_chart" => Self::LineChart,
            "area_chart" => Self::AreaChart,
            "pie_chart" => Self::PieChart,
            "gauge" => Self::Gauge,
            "single_value" => Self::SingleValue,
            "scatter" => Self::Scatter,
            "radar" => Self::Radar,
            _ => Self::Other,
        }
    }

    /// Column, bar, line and area charts share one series shape.
    #[must_use]
    pub fn is_series_chart(&self) -> bool {
        matches!(
            self,
            Self::ColumnChart | Self::BarChart | Self::LineChart | Self::AreaChart
        )
    }
}

/// How the period dimension is expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    /// A named relative window such as `LAST_12_MONTHS`.
    Relative,
    /// An exact period label such as `Q1 2024`.
    Fixed,
    #[default]
    #[serde(other)]
    Unspecified,
}

/// Period dimension of a visualization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodSpec {
    #[serde(rename = "type", default)]
    pub kind: PeriodKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl PeriodSpec {
    #[must_use]
    pub fn relative(value: impl Into<String>) -> Self {
        Self {
            kind: PeriodKind::Relative,
            value: Some(value.into()),
        }
    }

    #[must_use]
    pub fn fixed(value: impl Into<String>) -> Self {
        Self {
            kind: PeriodKind::Fixed,
            value: Some(value.into()),
        }
    }
}

/// Dimensions of a visualization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationDimensions {
    /// Indicators to plot.
    #[serde(default)]
    pub data: Vec<IndicatorId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<PeriodSpec>,

    /// Other dimensions (org units, disaggregations) carried verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Arrangement of dimensions into rows and columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub rows: Vec<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
}

/// A visualization definition.
///
/// `id` and `updated_at` are set once the visualization is saved; a preview
/// has neither and is never written to the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visualization {
    #[serde(default)]
    pub id: Option<VisualizationId>,
    pub project_id: ProjectId,
    #[serde(default)]
    pub name: String,
    pub visualization_type: VisualizationType,
    #[serde(default)]
    pub dimensions: VisualizationDimensions,
    #[serde(default)]
    pub filters: FilterCriteria,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub display_options: DisplayOptions,
    /// Last-modified marker; part of the cache fingerprint.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Visualization {
    /// Create an unsaved (preview) visualization.
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        visualization_type: VisualizationType,
    ) -> Self {
        Self {
            id: None,
            project_id,
            name: name.into(),
            visualization_type,
            dimensions: VisualizationDimensions::default(),
            filters: FilterCriteria::new(),
            layout: Layout::default(),
            display_options: DisplayOptions::new(),
            updated_at: None,
        }
    }

    /// Mark as saved with an identity and last-modified timestamp.
    #[must_use]
    pub fn saved(mut self, id: VisualizationId, updated_at: DateTime<Utc>) -> Self {
        self.id = Some(id);
        self.updated_at = Some(updated_at);
        self
    }

    #[must_use]
    pub fn with_indicators(mut self, indicators: impl IntoIterator<Item = IndicatorId>) -> Self {
        self.dimensions.data = indicators.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_period(mut self, period: PeriodSpec) -> Self {
        self.dimensions.period = Some(period);
        self
    }

    #[must_use]
    pub fn with_layout(mut self, rows: &[&str], columns: &[&str]) -> Self {
        self.layout.rows = rows.iter().map(ToString::to_string).collect();
        self.layout.columns = columns.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn with_filter(
        mut self,
        field: impl Into<String>,
        value: impl Into<metrica_formula::Value>,
    ) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.display_options.insert(key.into(), value);
        self
    }

    /// Whether the visualization has a stable identity (is saved).
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }
}
