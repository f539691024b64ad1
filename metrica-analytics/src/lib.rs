//! Visualization analytics for metrica.
//!
//! Turns persisted indicator values into chart, pivot and single-value
//! results, caching each result under a fingerprint of the visualization's
//! configuration.
//!
//! # Architecture
//!
//! - **Sources** ([`IndicatorValueSource`]) supply indicator values for a project
//! - **Aggregation** ([`aggregate`]) groups values into row/column cells
//! - **Formatting** ([`format`]) shapes cells for the visualization type
//! - **Cache** ([`AnalyticsCache`]) stores formatted results with a TTL in a
//!   [`CacheStore`] (libSQL or in-memory)
//! - **Engine** ([`AnalyticsEngine`]) runs lookup, fetch, aggregate, format, store

mod aggregate;
pub mod cache;
mod engine;
mod error;
mod format;
mod period;
mod record;
mod source;
mod types;
mod visualization;

// Aggregation
pub use aggregate::{AggregatedCell, Aggregation, aggregate, dimension_key};

// Cache
pub use cache::{
    AnalyticsCache, CacheEntry, CacheStats, CacheStore, DEFAULT_TTL_HOURS, MemoryCacheStore,
    TursoCacheStore, fingerprint,
};

// Engine
pub use engine::AnalyticsEngine;

// Errors
pub use error::{AnalyticsError, Result};

// Formatting
pub use format::{
    ChartPoint, ChartResult, FormattedResult, PivotResult, SingleValue, SingleValueResult, format,
};

// Periods
pub use period::RelativePeriod;

// Records and sources
pub use record::IndicatorValueRecord;
pub use source::{IndicatorValueSource, MemoryValueSource, ValueQuery};

// ID types
pub use types::{IndicatorId, ProjectId, VisualizationId};

// Visualization model
pub use visualization::{
    DisplayOptions, Layout, PeriodKind, PeriodSpec, Visualization, VisualizationDimensions,
    VisualizationType,
};
