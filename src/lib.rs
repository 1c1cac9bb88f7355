//! In-memory query and outlier engine for medical insurance cost data.
//!
//! The dataset is loaded once, wrapped in a [`Service`], and shared read-only
//! between any number of concurrent callers.

pub mod config;
pub mod data;
pub mod error;
pub mod params;
pub mod service;
pub mod stats;

#[cfg(test)]
mod testing;

pub use config::{Settings, MAX_RECORDS};
pub use data::filter::{Constraint, FilterSpec, RowView};
pub use data::model::{ColumnKind, Dataset, RawRecord, Record, Value};
pub use error::{Error, Result};
pub use params::{QueryParams, Sex, Smoker};
pub use service::{Health, OutlierReport, QueryResult, QuerySummary, Service};
pub use stats::outlier::{OutlierBounds, OutlierMethod};
