//! Visualization evaluation: cache lookup, fetch, aggregate, format, store.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

use crate::aggregate::aggregate;
use crate::cache::{AnalyticsCache, fingerprint};
use crate::error::Result;
use crate::format::{FormattedResult, format};
use crate::period::RelativePeriod;
use crate::record::IndicatorValueRecord;
use crate::source::{IndicatorValueSource, ValueQuery};
use crate::types::ProjectId;
use crate::visualization::{PeriodKind, PeriodSpec, Visualization};

/// Evaluates visualizations of one project.
#[derive(Clone)]
pub struct AnalyticsEngine {
    project_id: ProjectId,
    source: Arc<dyn IndicatorValueSource>,
    cache: AnalyticsCache,
}

impl AnalyticsEngine {
    pub fn new(
        project_id: ProjectId,
        source: Arc<dyn IndicatorValueSource>,
        cache: AnalyticsCache,
    ) -> Self {
        Self {
            project_id,
            source,
            cache,
        }
    }

    #[must_use]
    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    #[must_use]
    pub fn cache(&self) -> &AnalyticsCache {
        &self.cache
    }

    pub async fn evaluate(&self, visualization: &Visualization) -> Result<FormattedResult> {
        self.evaluate_at(visualization, Utc::now()).await
    }

    /// Evaluate `visualization` as of `now`.
    ///
    /// Source and store failures fail the whole evaluation.
    #[instrument(
        skip(self, visualization),
        fields(project = %self.project_id, visualization = ?visualization.id),
        level = "debug"
    )]
    pub async fn evaluate_at(
        &self,
        visualization: &Visualization,
        now: DateTime<Utc>,
    ) -> Result<FormattedResult> {
        let key = fingerprint(visualization)?;
        if let Some(cached) = self.cache.get_at(&key, now).await? {
            debug!(%key, "serving cached result");
            return Ok(cached);
        }

        let records = self.fetch(visualization, now.date_naive()).await?;
        let aggregation = aggregate(
            &records,
            &visualization.layout.rows,
            &visualization.layout.columns,
        );
        let result = format(
            aggregation,
            visualization.visualization_type,
            visualization.display_options.clone(),
        );

        self.cache.put_at(&key, visualization, &result, now).await?;
        info!(
            visualization_type = visualization.visualization_type.as_str(),
            records = records.len(),
            entries = result.len(),
            "evaluated visualization"
        );
        Ok(result)
    }

    /// Indicator values selected by the visualization's dimensions and filters.
    async fn fetch(
        &self,
        visualization: &Visualization,
        today: NaiveDate,
    ) -> Result<Vec<IndicatorValueRecord>> {
        let indicator_ids = &visualization.dimensions.data;
        if indicator_ids.is_empty() {
            debug!("no indicators selected");
            return Ok(Vec::new());
        }

        let mut records = self
            .source
            .fetch(&ValueQuery {
                project_id: self.project_id,
                indicator_ids: indicator_ids.clone(),
            })
            .await?;
        debug!(count = records.len(), "fetched indicator values");

        let period = PeriodFilter::new(visualization.dimensions.period.as_ref(), today);
        records.retain(|record| period.matches(record));

        for (field, expected) in &visualization.filters {
            let expected = expected.to_string();
            records.retain(|record| {
                record
                    .dimension(field)
                    .is_none_or(|actual| actual == expected)
            });
        }
        debug!(count = records.len(), "after period and filters");

        Ok(records)
    }
}

/// Period restriction resolved against the evaluation date.
#[derive(Debug, PartialEq)]
enum PeriodFilter {
    All,
    /// Inclusive range over `calculated_at` dates.
    Between(NaiveDate, NaiveDate),
    /// Exact `period` label.
    Label(String),
}

impl PeriodFilter {
    fn new(spec: Option<&PeriodSpec>, today: NaiveDate) -> Self {
        let Some(PeriodSpec {
            kind,
            value: Some(value),
        }) = spec
        else {
            return Self::All;
        };
        match kind {
            PeriodKind::Relative => match RelativePeriod::parse(value) {
                Some(period) => {
                    let (start, end) = period.range(today);
                    Self::Between(start, end)
                }
                None => {
                    warn!(period = %value, "unknown relative period, not filtering");
                    Self::All
                }
            },
            PeriodKind::Fixed => Self::Label(value.clone()),
            PeriodKind::Unspecified => Self::All,
        }
    }

    fn matches(&self, record: &IndicatorValueRecord) -> bool {
        match self {
            Self::All => true,
            Self::Between(start, end) => {
                let date = record.calculated_at.date_naive();
                *start <= date && date <= *end
            }
            Self::Label(label) => record.period == *label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::TimeZone;
    use metrica_formula::Value;

    use crate::cache::{CacheEntry, CacheStats, CacheStore, MemoryCacheStore};
    use crate::error::AnalyticsError;
    use crate::source::MemoryValueSource;
    use crate::types::{IndicatorId, VisualizationId};
    use crate::visualization::VisualizationType;

    struct CountingSource {
        inner: MemoryValueSource,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IndicatorValueSource for CountingSource {
        async fn fetch(&self, query: &ValueQuery) -> Result<Vec<IndicatorValueRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(query).await
        }
    }

    struct FailingSource;

    #[async_trait]
    impl IndicatorValueSource for FailingSource {
        async fn fetch(&self, _query: &ValueQuery) -> Result<Vec<IndicatorValueRecord>> {
            Err(AnalyticsError::Source("survey database offline".to_string()))
        }
    }

    struct FailingStore;

    #[async_trait]
    impl CacheStore for FailingStore {
        async fn load(&self, _key: &str) -> Result<Option<CacheEntry>> {
            Ok(None)
        }
        async fn record_hit(&self, _key: &str) -> Result<()> {
            Ok(())
        }
        async fn upsert(&self, _entry: &CacheEntry) -> Result<()> {
            Err(AnalyticsError::InvalidData("disk full".to_string()))
        }
        async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<u64> {
            Ok(0)
        }
        async fn stats(&self, _now: DateTime<Utc>) -> Result<CacheStats> {
            Ok(CacheStats::default())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn record(
        indicator: i64,
        name: &str,
        period: &str,
        value: f64,
        calculated_at: DateTime<Utc>,
    ) -> IndicatorValueRecord {
        IndicatorValueRecord {
            project_id: ProjectId(1),
            indicator_id: IndicatorId(indicator),
            indicator_name: name.to_string(),
            value,
            period: period.to_string(),
            calculated_at,
            survey_name: "Baseline".to_string(),
            attributes: Default::default(),
        }
    }

    fn records() -> Vec<IndicatorValueRecord> {
        let recent = now() - chrono::Duration::days(3);
        let old = now() - chrono::Duration::days(400);
        let mut female = record(1, "Cases", "Q2 2024", 30.0, recent);
        female
            .attributes
            .insert("gender".to_string(), Value::from("F"));
        vec![
            record(1, "Cases", "Q1 2024", 100.0, recent),
            record(1, "Cases", "Q2 2024", 150.0, recent),
            record(2, "Deaths", "Q1 2024", 4.0, recent),
            record(1, "Cases", "Q1 2023", 90.0, old),
            female,
        ]
    }

    fn engine_with(source: Arc<dyn IndicatorValueSource>) -> AnalyticsEngine {
        let cache = AnalyticsCache::new(Arc::new(MemoryCacheStore::new()));
        AnalyticsEngine::new(ProjectId(1), source, cache)
    }

    fn saved(viz_type: VisualizationType) -> Visualization {
        Visualization::new(ProjectId(1), "Cases", viz_type)
            .saved(VisualizationId(1), now() - chrono::Duration::days(1))
            .with_indicators([IndicatorId(1)])
            .with_layout(&["period"], &["data"])
    }

    #[tokio::test]
    async fn evaluates_and_then_serves_from_cache() {
        let source = Arc::new(CountingSource {
            inner: MemoryValueSource::new(records()),
            calls: AtomicUsize::new(0),
        });
        let engine = engine_with(source.clone());
        let viz = saved(VisualizationType::SingleValue);

        let first = engine.evaluate_at(&viz, now()).await.unwrap();
        let second = engine.evaluate_at(&viz, now()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        let FormattedResult::SingleValue(single) = first else {
            panic!("expected single value");
        };
        assert_eq!(single.data.value, 370.0);
    }

    #[tokio::test]
    async fn previews_are_recomputed_every_time() {
        let source = Arc::new(CountingSource {
            inner: MemoryValueSource::new(records()),
            calls: AtomicUsize::new(0),
        });
        let engine = engine_with(source.clone());
        let preview = Visualization::new(ProjectId(1), "Draft", VisualizationType::PieChart)
            .with_indicators([IndicatorId(1)]);

        engine.evaluate_at(&preview, now()).await.unwrap();
        engine.evaluate_at(&preview, now()).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_indicators_give_empty_result() {
        let engine = engine_with(Arc::new(MemoryValueSource::new(records())));
        let viz = Visualization::new(ProjectId(1), "Empty", VisualizationType::ColumnChart);

        let result = engine.evaluate_at(&viz, now()).await.unwrap();

        let FormattedResult::Chart(chart) = result else {
            panic!("expected chart");
        };
        assert!(chart.data.is_empty());
        assert_eq!(chart.options["xAxisLabel"], "Period");
    }

    #[tokio::test]
    async fn relative_period_filters_on_calculation_date() {
        let engine = engine_with(Arc::new(MemoryValueSource::new(records())));
        let viz = saved(VisualizationType::PivotTable)
            .with_period(PeriodSpec::relative("LAST_12_MONTHS"));

        let result = engine.evaluate_at(&viz, now()).await.unwrap();

        let FormattedResult::Pivot(pivot) = result else {
            panic!("expected pivot");
        };
        assert_eq!(pivot.rows, vec!["Q1 2024", "Q2 2024"]);
        assert_eq!(pivot.data.get("Q2 2024_Cases").unwrap().sum, 180.0);
    }

    #[tokio::test]
    async fn fixed_period_matches_label() {
        let engine = engine_with(Arc::new(MemoryValueSource::new(records())));
        let viz = saved(VisualizationType::PieChart).with_period(PeriodSpec::fixed("Q1 2023"));

        let result = engine.evaluate_at(&viz, now()).await.unwrap();

        let FormattedResult::Chart(chart) = result else {
            panic!("expected chart");
        };
        assert_eq!(chart.data.len(), 1);
        assert_eq!(chart.data[0].value, 90.0);
    }

    #[tokio::test]
    async fn unknown_relative_period_does_not_filter() {
        let engine = engine_with(Arc::new(MemoryValueSource::new(records())));
        let viz = saved(VisualizationType::SingleValue)
            .with_period(PeriodSpec::relative("NEXT_DECADE"));

        let result = engine.evaluate_at(&viz, now()).await.unwrap();

        let FormattedResult::SingleValue(single) = result else {
            panic!("expected single value");
        };
        assert_eq!(single.data.value, 370.0);
    }

    #[tokio::test]
    async fn filters_apply_to_dimensions_records_carry() {
        let engine = engine_with(Arc::new(MemoryValueSource::new(records())));
        let viz = saved(VisualizationType::SingleValue)
            .with_filter("period", "Q2 2024")
            .with_filter("district", "East");

        let result = engine.evaluate_at(&viz, now()).await.unwrap();

        let FormattedResult::SingleValue(single) = result else {
            panic!("expected single value");
        };
        assert_eq!(single.data.value, 180.0);
    }

    #[tokio::test]
    async fn source_failure_fails_evaluation() {
        let engine = engine_with(Arc::new(FailingSource));

        let err = engine
            .evaluate_at(&saved(VisualizationType::BarChart), now())
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyticsError::Source(_)));
    }

    #[tokio::test]
    async fn store_failure_fails_evaluation() {
        let cache = AnalyticsCache::new(Arc::new(FailingStore));
        let engine = AnalyticsEngine::new(
            ProjectId(1),
            Arc::new(MemoryValueSource::new(records())),
            cache,
        );

        let err = engine
            .evaluate_at(&saved(VisualizationType::BarChart), now())
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyticsError::InvalidData(_)));
    }

    #[test]
    fn period_filter_without_value_keeps_everything() {
        let spec = PeriodSpec {
            kind: PeriodKind::Relative,
            value: None,
        };

        assert_eq!(
            PeriodFilter::new(Some(&spec), now().date_naive()),
            PeriodFilter::All
        );
    }
}
