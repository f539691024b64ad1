//! Persisted indicator values, the input to visualization aggregation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use metrica_formula::{ComputationResult, Value};
use serde::{Deserialize, Serialize};

use crate::types::{IndicatorId, ProjectId};

/// One computed value of an indicator for a survey and period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValueRecord {
    pub project_id: ProjectId,
    pub indicator_id: IndicatorId,
    pub indicator_name: String,
    pub value: f64,
    /// Reporting period label (e.g. "Q1 2024", "Jan 2024").
    pub period: String,
    pub calculated_at: DateTime<Utc>,
    pub survey_name: String,
    /// Extra disaggregation fields (gender, region, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

impl IndicatorValueRecord {
    /// Build the record persisted for a successful computation.
    ///
    /// Returns `None` for failed computations and for null values.
    #[must_use]
    pub fn from_computation(
        project_id: ProjectId,
        indicator_id: IndicatorId,
        survey_name: impl Into<String>,
        period: impl Into<String>,
        result: &ComputationResult,
        calculated_at: DateTime<Utc>,
    ) -> Option<Self> {
        if !result.is_success() {
            return None;
        }
        Some(Self {
            project_id,
            indicator_id,
            indicator_name: result.indicator_name.clone(),
            value: result.value?,
            period: period.into(),
            calculated_at,
            survey_name: survey_name.into(),
            attributes: BTreeMap::new(),
        })
    }

    /// Value of a named dimension, or `None` if the record does not carry it.
    ///
    /// Besides attribute names, the built-in dimensions are `period`,
    /// `indicator_id`, `indicator_name`, `survey_name`, `calculated_at` and
    /// `value`. `data` (the indicator axis) and `indicator` resolve to the
    /// indicator name, `survey` to the survey name; the double-underscore
    /// spellings `indicator__name` and `survey__name` are accepted too.
    #[must_use]
    pub fn dimension(&self, name: &str) -> Option<String> {
        match name {
            "period" => Some(self.period.clone()),
            "indicator_id" => Some(self.indicator_id.to_string()),
            "data" | "indicator" | "indicator_name" | "indicator__name" => {
                Some(self.indicator_name.clone())
            }
            "survey" | "survey_name" | "survey__name" => Some(self.survey_name.clone()),
            "calculated_at" => Some(self.calculated_at.to_rfc3339()),
            "value" => Some(Value::Number(self.value).to_string()),
            other => self.attributes.get(other).map(ToString::to_string),
        }
    }
}
