use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use crate::config::{Settings, MAX_RECORDS};
use crate::data::filter::{self, FilterSpec, RowView};
use crate::data::model::{Dataset, Record};
use crate::error::{Error, Result};
use crate::params::QueryParams;
use crate::stats::aggregate::{self, describe as describe_values, Description};
use crate::stats::outlier::{self, OutlierBounds, OutlierMethod};

pub const NO_MATCHES_MESSAGE: &str = "No records match the query filters";

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Answer to a filtered query: either nothing matched, or a bounded summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    NoMatches { message: String },
    Matches(QuerySummary),
}

impl QueryResult {
    pub fn no_matches() -> Self {
        QueryResult::NoMatches {
            message: NO_MATCHES_MESSAGE.to_string(),
        }
    }
}

/// Aggregates rounded to 2 decimals plus the first matching records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySummary {
    pub total_records: usize,
    pub avg_charges: f64,
    pub min_charges: f64,
    pub max_charges: f64,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnReport {
    #[serde(flatten)]
    pub bounds: OutlierBounds,
    pub outlier_count: usize,
    /// Share of all dataset rows flagged, in percent.
    pub percentage: f64,
    pub summary: Option<Description>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub method: OutlierMethod,
    pub threshold: f64,
    pub total_rows: usize,
    pub columns: BTreeMap<String, ColumnReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub data_loaded: bool,
    pub total_records: usize,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Display precision for reported aggregates.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Filter the dataset and summarize `aggregate_column` over the matches.
///
/// At most `max_records` matching rows are returned, in dataset order, and
/// never more than [`MAX_RECORDS`].
pub fn query(
    dataset: &Dataset,
    spec: &FilterSpec,
    aggregate_column: &str,
    max_records: usize,
) -> Result<QueryResult> {
    spec.validate()?;

    if dataset.is_empty() {
        warn!("query rejected: dataset is empty");
        return Err(Error::DataUnavailable);
    }

    let view = filter::apply(dataset, spec)?;
    if view.is_empty() {
        return Ok(QueryResult::no_matches());
    }

    let summary = aggregate::summarize(&view, aggregate_column)?;
    let records = first_records(&view, max_records.min(MAX_RECORDS));

    debug!(
        "query matched {} rows, returning {}",
        view.len(),
        records.len()
    );

    Ok(QueryResult::Matches(QuerySummary {
        total_records: view.len(),
        avg_charges: round2(summary.mean),
        min_charges: round2(summary.min),
        max_charges: round2(summary.max),
        records,
    }))
}

fn first_records(view: &RowView<'_>, limit: usize) -> Vec<Record> {
    let dataset = view.dataset();
    view.indices()
        .iter()
        .take(limit)
        .filter_map(|&i| dataset.record(i))
        .collect()
}

fn validate_threshold(threshold: f64) -> Result<()> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(Error::Validation(format!(
            "Threshold must be a positive number, got {threshold}"
        )));
    }
    Ok(())
}

/// Run outlier detection over every numeric column.
pub fn report(dataset: &Dataset, method: OutlierMethod, threshold: f64) -> Result<OutlierReport> {
    validate_threshold(threshold)?;

    let numeric = dataset.schema().numeric_columns();
    let detected = outlier::detect(dataset, &numeric, method, threshold)?;
    let total_rows = dataset.len();

    let mut columns = BTreeMap::new();
    for (name, result) in detected {
        let count = result.count();
        let percentage = if total_rows == 0 {
            0.0
        } else {
            count as f64 * 100.0 / total_rows as f64
        };
        let summary = column_description(dataset, &name)?;
        columns.insert(
            name,
            ColumnReport {
                bounds: result.bounds,
                outlier_count: count,
                percentage,
                summary,
            },
        );
    }

    Ok(OutlierReport {
        method,
        threshold,
        total_rows,
        columns,
    })
}

fn column_description(dataset: &Dataset, column: &str) -> Result<Option<Description>> {
    let col = aggregate::numeric_column(dataset, column)?;
    let values = dataset.numeric_values(col, 0..dataset.len());
    Ok(describe_values(&values))
}

/// Descriptive statistics for every numeric column.
pub fn describe(dataset: &Dataset) -> Result<BTreeMap<String, Description>> {
    let mut out = BTreeMap::new();
    for column in dataset.schema().numeric_columns() {
        if let Some(d) = column_description(dataset, column)? {
            out.insert(column.to_string(), d);
        }
    }
    Ok(out)
}

pub fn health(dataset: &Dataset) -> Health {
    Health {
        status: "healthy",
        data_loaded: !dataset.is_empty(),
        total_records: dataset.len(),
    }
}

// ---------------------------------------------------------------------------
// Service handle
// ---------------------------------------------------------------------------

/// Shared, read-only handle to the loaded dataset and its settings.
///
/// Cloning is cheap; every call is independent of every other.
#[derive(Debug, Clone)]
pub struct Service {
    dataset: Arc<Dataset>,
    settings: Settings,
}

impl Service {
    pub fn new(dataset: Dataset, settings: Settings) -> Self {
        Self {
            dataset: Arc::new(dataset),
            settings,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn query(&self, params: &QueryParams) -> Result<QueryResult> {
        let spec = params.to_filter_spec()?;
        query(
            &self.dataset,
            &spec,
            &self.settings.aggregate_column,
            self.settings.max_records,
        )
    }

    /// Outlier report; `threshold` falls back to the configured default.
    pub fn report(&self, method: OutlierMethod, threshold: Option<f64>) -> Result<OutlierReport> {
        let threshold = threshold.unwrap_or(match method {
            OutlierMethod::Iqr => self.settings.iqr_threshold,
            OutlierMethod::ZScore => self.settings.zscore_threshold,
        });
        report(&self.dataset, method, threshold)
    }

    pub fn describe(&self) -> Result<BTreeMap<String, Description>> {
        describe(&self.dataset)
    }

    pub fn health(&self) -> Health {
        health(&self.dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;
    use crate::testing::sample_dataset;

    #[test]
    fn query_min_age_scenario() {
        let ds = sample_dataset();
        let spec = FilterSpec::new().range("age", Some(25.0), None);
        let QueryResult::Matches(res) = query(&ds, &spec, "charges", 100).unwrap() else {
            panic!("expected matches");
        };
        assert_eq!(res.total_records, 2);
        assert_eq!(res.avg_charges, 26000.0);
        assert_eq!(res.min_charges, 2000.0);
        assert_eq!(res.max_charges, 50000.0);
        let ages: Vec<_> = res.records.iter().map(|r| r.get("age").cloned()).collect();
        assert_eq!(ages, vec![Some(Value::Integer(55)), Some(Value::Integer(30))]);
    }

    #[test]
    fn oversized_record_limit_is_capped() {
        let ds = Dataset::from_records(
            (0..300)
                .map(|i| vec![("charges".to_string(), Value::Float(i as f64))])
                .collect(),
        );
        let QueryResult::Matches(res) = query(&ds, &FilterSpec::new(), "charges", 250).unwrap() else {
            panic!("expected matches");
        };
        assert_eq!(res.total_records, 300);
        assert_eq!(res.records.len(), MAX_RECORDS);

        let QueryResult::Matches(res) = query(&ds, &FilterSpec::new(), "charges", 5).unwrap() else {
            panic!("expected matches");
        };
        assert_eq!(res.records.len(), 5);
    }

    #[test]
    fn query_without_matches_returns_sentinel() {
        let ds = sample_dataset();
        let spec = FilterSpec::new().range("age", Some(90.0), None);
        assert_eq!(
            query(&ds, &spec, "charges", 100).unwrap(),
            QueryResult::no_matches()
        );
    }

    #[test]
    fn validation_precedes_data_availability() {
        let spec = FilterSpec::new().range("age", Some(60.0), Some(18.0));
        assert!(matches!(
            query(&Dataset::empty(), &spec, "charges", 100),
            Err(Error::Validation(_))
        ));
        assert_eq!(
            query(&Dataset::empty(), &FilterSpec::new(), "charges", 100),
            Err(Error::DataUnavailable)
        );
    }

    #[test]
    fn aggregates_are_rounded_for_display() {
        assert_eq!(round2(16884.924), 16884.92);
        assert_eq!(round2(1725.5523), 1725.55);
        assert_eq!(round2(4449.462), 4449.46);
    }

    #[test]
    fn report_covers_numeric_columns_only() {
        let ds = sample_dataset();
        let rep = report(&ds, OutlierMethod::Iqr, 1.5).unwrap();
        assert_eq!(rep.total_rows, 3);
        assert_eq!(
            rep.columns.keys().collect::<Vec<_>>(),
            vec!["age", "charges"]
        );
        let charges = &rep.columns["charges"];
        assert_eq!(charges.outlier_count, 0);
        assert_eq!(charges.percentage, 0.0);
        assert_eq!(charges.summary.map(|s| s.count), Some(3));
    }

    #[test]
    fn report_rejects_non_positive_threshold() {
        let ds = sample_dataset();
        for t in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                report(&ds, OutlierMethod::ZScore, t),
                Err(Error::Validation(_))
            ));
        }
    }

    #[test]
    fn report_on_empty_dataset_is_empty() {
        let rep = report(&Dataset::empty(), OutlierMethod::Iqr, 1.5).unwrap();
        assert!(rep.columns.is_empty());
        assert_eq!(rep.total_rows, 0);
    }

    #[test]
    fn health_reflects_dataset() {
        assert_eq!(
            health(&sample_dataset()),
            Health {
                status: "healthy",
                data_loaded: true,
                total_records: 3
            }
        );
        assert!(!health(&Dataset::empty()).data_loaded);
    }

    #[test]
    fn service_uses_configured_defaults() {
        let svc = Service::new(sample_dataset(), Settings::default());
        let rep = svc.report(OutlierMethod::ZScore, None).unwrap();
        assert_eq!(rep.threshold, 3.0);
        assert_eq!(svc.describe().unwrap().len(), 2);
        assert!(svc.health().data_loaded);
    }

    #[test]
    fn no_matches_serializes_as_message() {
        let json = serde_json::to_value(QueryResult::no_matches()).unwrap();
        assert_eq!(json, serde_json::json!({ "message": NO_MATCHES_MESSAGE }));
    }
}
