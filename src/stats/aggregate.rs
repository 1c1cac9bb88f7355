use serde::Serialize;

use crate::data::filter::RowView;
use crate::data::model::{ColumnKind, Dataset};
use crate::error::{Error, Result};

/// Summary statistics of one numeric column over a row view, full precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Resolve `column` to its index, requiring a numeric column.
pub(crate) fn numeric_column(dataset: &Dataset, column: &str) -> Result<usize> {
    let schema = dataset.schema();
    let idx = schema
        .index_of(column)
        .ok_or_else(|| Error::Schema(format!("'{column}'")))?;
    if schema.columns()[idx].kind != ColumnKind::Numeric {
        return Err(Error::Schema(format!("column '{column}' is not numeric")));
    }
    Ok(idx)
}

/// Count, extrema and mean of `column` over the view's non-missing values.
///
/// Callers substitute a "no matches" result for empty views; a view whose
/// rows carry no value for the column is an integrity error.
pub fn summarize(view: &RowView<'_>, column: &str) -> Result<Summary> {
    let dataset = view.dataset();
    let col = numeric_column(dataset, column)?;
    let values = dataset.numeric_values(col, view.indices().iter().copied());

    if values.is_empty() {
        return Err(Error::Integrity(format!(
            "no values for column '{column}' in {} matched rows",
            view.len()
        )));
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for &v in &values {
        min = min.min(v);
        max = max.max(v);
        sum += v;
    }

    Ok(Summary {
        count: values.len(),
        min,
        max,
        mean: sum / values.len() as f64,
    })
}

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

/// Per-column description in the layout of a dataframe `describe()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Description {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; undefined below two values.
    pub std: Option<f64>,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q1: f64,
    #[serde(rename = "50%")]
    pub median: f64,
    #[serde(rename = "75%")]
    pub q3: f64,
    pub max: f64,
}

/// Describe a set of values. Returns `None` when there are none.
pub fn describe(values: &[f64]) -> Option<Description> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let mean = mean(&sorted);
    let std = (n > 1).then(|| {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    });

    Some(Description {
        count: n,
        mean,
        std,
        min: sorted[0],
        q1: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q3: quantile_sorted(&sorted, 0.75),
        max: sorted[n - 1],
    })
}

/// Arithmetic mean; zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Quantile of ascending `sorted` by linear interpolation between closest
/// ranks (`pos = q * (n - 1)`). Zero for an empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            let frac = pos - lo as f64;
            sorted[lo] + frac * (sorted[hi] - sorted[lo])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply, FilterSpec};
    use crate::testing::sample_dataset;

    #[test]
    fn summarizes_filtered_charges() {
        let ds = sample_dataset();
        let view = apply(&ds, &FilterSpec::new().range("age", Some(25.0), None)).unwrap();
        let s = summarize(&view, "charges").unwrap();
        assert_eq!(s.count, 2);
        assert_eq!(s.min, 2000.0);
        assert_eq!(s.max, 50000.0);
        assert_eq!(s.mean, 26000.0);
    }

    #[test]
    fn categorical_column_is_rejected() {
        let ds = sample_dataset();
        let view = RowView::all(&ds);
        assert!(matches!(summarize(&view, "region"), Err(Error::Schema(_))));
        assert!(matches!(summarize(&view, "income"), Err(Error::Schema(_))));
    }

    #[test]
    fn empty_view_is_integrity_error() {
        let ds = sample_dataset();
        let view = apply(&ds, &FilterSpec::new().equals("region", "nowhere")).unwrap();
        assert!(matches!(summarize(&view, "charges"), Err(Error::Integrity(_))));
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let sorted = [1000.0, 2000.0, 50000.0];
        assert_eq!(quantile_sorted(&sorted, 0.25), 1500.0);
        assert_eq!(quantile_sorted(&sorted, 0.5), 2000.0);
        assert_eq!(quantile_sorted(&sorted, 0.75), 26000.0);
        assert_eq!(quantile_sorted(&[7.0], 0.75), 7.0);
        assert_eq!(quantile_sorted(&[], 0.5), 0.0);
    }

    #[test]
    fn describe_matches_dataframe_layout() {
        let d = describe(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(d.count, 4);
        assert_eq!(d.mean, 2.5);
        assert_eq!(d.min, 1.0);
        assert_eq!(d.q1, 1.75);
        assert_eq!(d.median, 2.5);
        assert_eq!(d.q3, 3.25);
        assert_eq!(d.max, 4.0);
        let std = d.std.unwrap();
        assert!((std - 1.2909944487358056).abs() < 1e-12);

        let single = describe(&[5.0]).unwrap();
        assert_eq!(single.std, None);
        assert!(describe(&[]).is_none());
    }
}
