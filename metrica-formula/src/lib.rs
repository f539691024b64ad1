//! Indicator formula engine for metrica.
//!
//! This crate evaluates monitoring-and-evaluation indicators over survey
//! datasets that have already been parsed into memory.
//!
//! # Architecture
//!
//! - **Dataset** ([`Dataset`]) is an ordered collection of records, each a
//!   mapping from field name to a scalar [`Value`]
//! - **Formulas** ([`Formula`]) are tokenized and parsed into an expression
//!   tree; aggregate calls such as `COUNT(Student ID)` are resolved against
//!   the dataset while the tree is evaluated
//! - **Filters** ([`apply_filters`]) narrow a dataset by field equality
//! - **Computation** ([`IndicatorComputation`]) runs filter + formula for a
//!   batch of indicator definitions and reports one result per indicator
//! - **Validation** ([`Formula::validate`]) checks a formula before it is
//!   saved, optionally against sample rows

mod dataset;
mod error;
pub mod filter;
pub mod formula;
mod indicator;
mod statistics;
mod validation;
mod value;

pub use dataset::{Dataset, Record};
pub use error::{FormulaError, Result};
pub use filter::{FilterCriteria, apply_filters};
pub use formula::{Formula, Function, evaluate, finite};
pub use indicator::{
    ComputationResult, ComputationStatus, IndicatorComputation, IndicatorDefinition,
};
pub use statistics::{ColumnStatistics, summary_statistics};
pub use validation::FormulaValidation;
pub use value::Value;
