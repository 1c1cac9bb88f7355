use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A typed cell value mirroring the common dataframe dtypes.
///
/// `Null` is the missing marker; it may appear in any column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Numeric view of the value, `None` for text, bools and missing cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered column definitions shared by every row of a [`Dataset`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> Option<&ColumnDef> {
        self.columns.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Names of the numeric columns, in schema order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .map(|c| c.name.as_str())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Row / Record
// ---------------------------------------------------------------------------

/// One parsed input record before schema inference: column name → value.
pub type RawRecord = Vec<(String, Value)>;

/// One row of the table; values are aligned with the schema's column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Owned, ordered `column → value` view of a row, serialized as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub fields: Vec<(String, Value)>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset. Built once, never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    schema: Schema,
    rows: Vec<Row>,
}

impl Dataset {
    /// A dataset with no rows and no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Infer the schema from raw records and build the table.
    ///
    /// Column order follows first appearance. A column is numeric when every
    /// non-missing value in it is numeric; columns a record lacks are filled
    /// with [`Value::Null`]. A NaN float is stored as [`Value::Null`].
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        let mut names: Vec<String> = Vec::new();
        let mut index: BTreeMap<String, usize> = BTreeMap::new();
        let mut numeric: Vec<bool> = Vec::new();

        for rec in &records {
            for (col, val) in rec {
                let idx = *index.entry(col.clone()).or_insert_with(|| {
                    names.push(col.clone());
                    numeric.push(true);
                    names.len() - 1
                });
                if !val.is_null() && !val.is_numeric() {
                    numeric[idx] = false;
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|rec| {
                let mut values = vec![Value::Null; names.len()];
                for (col, val) in rec {
                    if let Some(&idx) = index.get(&col) {
                        values[idx] = match val {
                            Value::Float(f) if f.is_nan() => Value::Null,
                            v => v,
                        };
                    }
                }
                Row { values }
            })
            .collect();

        let columns = names
            .into_iter()
            .zip(numeric)
            .map(|(name, is_numeric)| ColumnDef {
                name,
                kind: if is_numeric {
                    ColumnKind::Numeric
                } else {
                    ColumnKind::Categorical
                },
            })
            .collect();

        Dataset {
            schema: Schema::new(columns),
            rows,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ordered `column → value` mapping for the row at `idx`.
    pub fn record(&self, idx: usize) -> Option<Record> {
        let row = self.rows.get(idx)?;
        let fields = self
            .schema
            .columns()
            .iter()
            .zip(row.values())
            .map(|(c, v)| (c.name.clone(), v.clone()))
            .collect();
        Some(Record { fields })
    }

    /// Non-missing numeric values of column `col` over the given rows, in order.
    pub fn numeric_values<I>(&self, col: usize, rows: I) -> Vec<f64>
    where
        I: IntoIterator<Item = usize>,
    {
        rows.into_iter()
            .filter_map(|r| self.rows.get(r)?.get(col)?.as_f64())
            .collect()
    }
}
