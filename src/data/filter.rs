use log::debug;

use super::model::{ColumnKind, Dataset, Row, Value};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Filter predicate: optional constraints per column
// ---------------------------------------------------------------------------

/// A single column constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Closed range over a numeric column; a missing bound is unrestricted.
    Range {
        column: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Case-insensitive exact match over a categorical column.
    Equals { column: String, value: String },
}

impl Constraint {
    pub fn column(&self) -> &str {
        match self {
            Constraint::Range { column, .. } | Constraint::Equals { column, .. } => column,
        }
    }
}

/// Conjunction of constraints. An empty spec matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub constraints: Vec<Constraint>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(mut self, column: &str, min: Option<f64>, max: Option<f64>) -> Self {
        if min.is_some() || max.is_some() {
            self.constraints.push(Constraint::Range {
                column: column.to_string(),
                min,
                max,
            });
        }
        self
    }

    pub fn equals(mut self, column: &str, value: &str) -> Self {
        self.constraints.push(Constraint::Equals {
            column: column.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Reject ranges whose minimum exceeds their maximum.
    pub fn validate(&self) -> Result<()> {
        for c in &self.constraints {
            if let Constraint::Range {
                column,
                min: Some(min),
                max: Some(max),
            } = c
            {
                if min > max {
                    return Err(Error::Validation(format!(
                        "Min {column} cannot be greater than max {column}"
                    )));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row view
// ---------------------------------------------------------------------------

/// Ordered subset of a dataset's rows, borrowed without copying.
#[derive(Debug, Clone)]
pub struct RowView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> RowView<'a> {
    /// Every row of the dataset.
    pub fn all(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Row indices into the dataset, in dataset order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a Row> + '_ {
        self.indices.iter().filter_map(|&i| self.dataset.row(i))
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// A constraint bound to a schema column index.
enum Resolved<'s> {
    Range {
        col: usize,
        min: Option<f64>,
        max: Option<f64>,
    },
    Equals {
        col: usize,
        value: &'s str,
    },
}

impl Resolved<'_> {
    fn matches(&self, row: &Row) -> bool {
        match *self {
            Resolved::Range { col, min, max } => {
                match row.get(col).and_then(Value::as_f64) {
                    Some(v) => min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m),
                    // Missing values never satisfy a range.
                    None => false,
                }
            }
            Resolved::Equals { col, value } => match row.get(col) {
                Some(Value::Null) | None => false,
                Some(Value::Text(s)) => s.eq_ignore_ascii_case(value),
                Some(other) => other.to_string().eq_ignore_ascii_case(value),
            },
        }
    }
}

fn resolve<'s>(dataset: &Dataset, spec: &'s FilterSpec) -> Result<Vec<Resolved<'s>>> {
    let schema = dataset.schema();
    spec.constraints
        .iter()
        .map(|c| {
            let col = schema
                .index_of(c.column())
                .ok_or_else(|| Error::Schema(format!("'{}'", c.column())))?;
            match c {
                Constraint::Range { column, min, max } => {
                    if schema.columns()[col].kind != ColumnKind::Numeric {
                        return Err(Error::Schema(format!(
                            "range filter on non-numeric column '{column}'"
                        )));
                    }
                    Ok(Resolved::Range {
                        col,
                        min: *min,
                        max: *max,
                    })
                }
                Constraint::Equals { value, .. } => Ok(Resolved::Equals {
                    col,
                    value: value.as_str(),
                }),
            }
        })
        .collect()
}

/// Return the rows that satisfy every constraint of `spec`, in dataset order.
///
/// A row passes when:
/// * each range constraint holds with both bounds inclusive
/// * each equality constraint matches ignoring ASCII case
///
/// Missing values fail any constraint on their column.
pub fn apply<'a>(dataset: &'a Dataset, spec: &FilterSpec) -> Result<RowView<'a>> {
    let resolved = resolve(dataset, spec)?;

    let indices: Vec<usize> = dataset
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| resolved.iter().all(|c| c.matches(row)))
        .map(|(i, _)| i)
        .collect();

    debug!(
        "filter matched {} of {} rows ({} constraints)",
        indices.len(),
        dataset.len(),
        resolved.len()
    );

    Ok(RowView { dataset, indices })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_dataset;

    #[test]
    fn empty_spec_matches_everything() {
        let ds = sample_dataset();
        let view = apply(&ds, &FilterSpec::new()).unwrap();
        assert_eq!(view.indices(), &[0, 1, 2]);
        assert_eq!(view.rows().count(), 3);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let ds = sample_dataset();
        let spec = FilterSpec::new().range("age", Some(19.0), Some(30.0));
        let view = apply(&ds, &spec).unwrap();
        assert_eq!(view.indices(), &[0, 2]);
    }

    #[test]
    fn equality_ignores_case() {
        let ds = sample_dataset();
        let spec = FilterSpec::new().equals("sex", "MALE").equals("smoker", "No");
        let view = apply(&ds, &spec).unwrap();
        assert_eq!(view.indices(), &[2]);
    }

    #[test]
    fn no_match_is_not_an_error() {
        let ds = sample_dataset();
        let spec = FilterSpec::new().equals("region", "northwest");
        let view = apply(&ds, &spec).unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn unknown_column_is_schema_error() {
        let ds = sample_dataset();
        let spec = FilterSpec::new().equals("income", "high");
        assert!(matches!(apply(&ds, &spec), Err(Error::Schema(_))));
    }

    #[test]
    fn range_on_categorical_column_is_schema_error() {
        let ds = sample_dataset();
        let spec = FilterSpec::new().range("region", Some(1.0), None);
        assert!(matches!(apply(&ds, &spec), Err(Error::Schema(_))));
    }

    #[test]
    fn inverted_range_fails_validation() {
        let spec = FilterSpec::new().range("age", Some(40.0), Some(20.0));
        assert!(matches!(spec.validate(), Err(Error::Validation(_))));
        assert!(FilterSpec::new().range("age", Some(20.0), Some(20.0)).validate().is_ok());
    }

    #[test]
    fn missing_values_never_match() {
        let ds = Dataset::from_records(vec![
            vec![
                ("age".to_string(), Value::Integer(40)),
                ("region".to_string(), Value::Text("northeast".into())),
            ],
            vec![
                ("age".to_string(), Value::Null),
                ("region".to_string(), Value::Null),
            ],
        ]);

        let wide = FilterSpec::new().range("age", Some(f64::MIN), Some(f64::MAX));
        assert_eq!(apply(&ds, &wide).unwrap().indices(), &[0]);

        let lower_only = FilterSpec::new().range("age", Some(0.0), None);
        assert_eq!(apply(&ds, &lower_only).unwrap().indices(), &[0]);

        let region = FilterSpec::new().equals("region", "northeast");
        assert_eq!(apply(&ds, &region).unwrap().indices(), &[0]);

        // The display form of a missing value is not a matchable category.
        let null_text = FilterSpec::new().equals("region", "<null>");
        assert!(apply(&ds, &null_text).unwrap().is_empty());
    }

    #[test]
    fn range_without_bounds_is_dropped() {
        let spec = FilterSpec::new().range("age", None, None);
        assert!(spec.constraints.is_empty());
    }
}
