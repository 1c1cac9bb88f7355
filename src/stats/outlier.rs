use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::Serialize;

use super::aggregate::{mean, numeric_column, quantile_sorted};
use crate::data::model::Dataset;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Detection method
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    Iqr,
    ZScore,
}

impl OutlierMethod {
    /// Conventional threshold for the method.
    pub fn default_threshold(self) -> f64 {
        match self {
            OutlierMethod::Iqr => 1.5,
            OutlierMethod::ZScore => 3.0,
        }
    }
}

impl FromStr for OutlierMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iqr" => Ok(OutlierMethod::Iqr),
            "zscore" | "z-score" => Ok(OutlierMethod::ZScore),
            other => Err(Error::Validation(format!(
                "Unknown outlier method '{other}', expected 'iqr' or 'zscore'"
            ))),
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlierMethod::Iqr => write!(f, "iqr"),
            OutlierMethod::ZScore => write!(f, "zscore"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// The statistics a column's outlier decision was based on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum OutlierBounds {
    Iqr {
        q1: f64,
        q3: f64,
        iqr: f64,
        lower_bound: f64,
        upper_bound: f64,
    },
    ZScore {
        mean: f64,
        std_dev: f64,
        z_threshold: f64,
    },
}

impl OutlierBounds {
    /// Whether `value` falls outside the bounds.
    pub fn is_outlier(&self, value: f64) -> bool {
        match *self {
            OutlierBounds::Iqr {
                lower_bound,
                upper_bound,
                ..
            } => value < lower_bound || value > upper_bound,
            OutlierBounds::ZScore {
                mean,
                std_dev,
                z_threshold,
            } => {
                // Zero spread means every z-score is zero.
                if std_dev == 0.0 {
                    return false;
                }
                ((value - mean).abs() / std_dev) > z_threshold
            }
        }
    }
}

/// Outlier result for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnOutliers {
    pub bounds: OutlierBounds,
    /// Non-missing values the statistics were computed from.
    pub value_count: usize,
    /// Dataset row indices flagged for this column, ascending.
    pub rows: Vec<usize>,
}

impl ColumnOutliers {
    pub fn count(&self) -> usize {
        self.rows.len()
    }
}

/// Compute IQR bounds from unsorted values.
pub fn iqr_bounds(values: &[f64], threshold: f64) -> OutlierBounds {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    OutlierBounds::Iqr {
        q1,
        q3,
        iqr,
        lower_bound: q1 - threshold * iqr,
        upper_bound: q3 + threshold * iqr,
    }
}

/// Compute z-score bounds from values using the population standard deviation.
pub fn zscore_bounds(values: &[f64], threshold: f64) -> OutlierBounds {
    let (mean, std_dev) = match values.first() {
        None => (0.0, 0.0),
        // Constant column: exactly zero spread.
        Some(&first) if values.iter().all(|&v| v == first) => (first, 0.0),
        Some(_) => {
            let mean = mean(values);
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
            (mean, var.sqrt())
        }
    };
    OutlierBounds::ZScore {
        mean,
        std_dev,
        z_threshold: threshold,
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Detect outliers independently in each of `columns`.
///
/// Missing values are excluded from the statistics and never flagged. The
/// dataset is only read.
pub fn detect(
    dataset: &Dataset,
    columns: &[&str],
    method: OutlierMethod,
    threshold: f64,
) -> Result<BTreeMap<String, ColumnOutliers>> {
    let mut out = BTreeMap::new();

    for &column in columns {
        let col = numeric_column(dataset, column)?;
        let values = dataset.numeric_values(col, 0..dataset.len());

        let bounds = match method {
            OutlierMethod::Iqr => iqr_bounds(&values, threshold),
            OutlierMethod::ZScore => zscore_bounds(&values, threshold),
        };

        let rows: Vec<usize> = dataset
            .rows()
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                let v = row.get(col)?.as_f64()?;
                bounds.is_outlier(v).then_some(i)
            })
            .collect();

        debug!(
            "{method} outliers in '{column}': {} of {} values",
            rows.len(),
            values.len()
        );

        out.insert(
            column.to_string(),
            ColumnOutliers {
                bounds,
                value_count: values.len(),
                rows,
            },
        );
    }

    Ok(out)
}
