//! Suppliers of persisted indicator values.

use async_trait::async_trait;

use crate::error::Result;
use crate::record::IndicatorValueRecord;
use crate::types::{IndicatorId, ProjectId};

/// Which indicator values to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueQuery {
    pub project_id: ProjectId,
    pub indicator_ids: Vec<IndicatorId>,
}

/// Read access to indicator values.
///
/// Implementations return only records of `query.project_id` whose
/// indicator is in `query.indicator_ids`.
#[async_trait]
pub trait IndicatorValueSource: Send + Sync {
    async fn fetch(&self, query: &ValueQuery) -> Result<Vec<IndicatorValueRecord>>;
}

/// Source over a fixed list of records, e.g. loaded from JSON.
#[derive(Debug, Clone, Default)]
pub struct MemoryValueSource {
    records: Vec<IndicatorValueRecord>,
}

impl MemoryValueSource {
    #[must_use]
    pub fn new(records: Vec<IndicatorValueRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: IndicatorValueRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<IndicatorValueRecord>> for MemoryValueSource {
    fn from(records: Vec<IndicatorValueRecord>) -> Self {
        Self::new(records)
    }
}

#[async_trait]
impl IndicatorValueSource for MemoryValueSource {
    async fn fetch(&self, query: &ValueQuery) -> Result<Vec<IndicatorValueRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| {
                r.project_id == query.project_id && query.indicator_ids.contains(&r.indicator_id)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(project: i64, indicator: i64) -> IndicatorValueRecord {
        IndicatorValueRecord {
            project_id: ProjectId(project),
            indicator_id: IndicatorId(indicator),
            indicator_name: format!("Indicator {indicator}"),
            value: 1.0,
            period: "Q1 2024".to_string(),
            calculated_at: Utc::now(),
            survey_name: "Baseline".to_string(),
            attributes: Default::default(),
        }
    }

    #[tokio::test]
    async fn fetch_scopes_by_project_and_indicator() {
        let source = MemoryValueSource::new(vec![
            record(1, 1),
            record(1, 2),
            record(2, 1),
            record(1, 3),
        ]);

        let records = source
            .fetch(&ValueQuery {
                project_id: ProjectId(1),
                indicator_ids: vec![IndicatorId(1), IndicatorId(3)],
            })
            .await
            .unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.indicator_id.0).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(records.iter().all(|r| r.project_id == ProjectId(1)));
    }

    #[tokio::test]
    async fn fetch_with_no_indicators_is_empty() {
        let source = MemoryValueSource::from(vec![record(1, 1)]);

        let records = source
            .fetch(&ValueQuery {
                project_id: ProjectId(1),
                indicator_ids: vec![],
            })
            .await
            .unwrap();

        assert!(records.is_empty());
    }
}
