use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use log::{error, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Dataset, RawRecord, Value};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a dataset once at startup, degrading to [`Dataset::empty`] on failure.
///
/// Failures are logged rather than propagated so the process can still serve
/// health checks and report the data as unavailable.
pub fn load_or_empty(path: &Path) -> Dataset {
    match load_dataset(path) {
        Ok(ds) => {
            info!(
                "Data loaded successfully from {} ({} rows, {} columns)",
                path.display(),
                ds.len(),
                ds.schema().len()
            );
            ds
        }
        Err(e) => {
            error!("Error loading data from {}: {e:#}", path.display());
            Dataset::empty()
        }
    }
}

/// Read a file and build a [`Dataset`] from its records.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let records = read_records(path)?;
    Ok(Dataset::from_records(records))
}

/// Read flat records from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with column names, one record per line
/// * `.json`    – `[{ "age": 19, "sex": "female", ... }, ...]`
/// * `.parquet` – flat scalar columns (ints, floats, strings, bools)
pub fn read_records(path: &Path) -> Result<Vec<RawRecord>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => read_csv(path),
        "json" => read_json(path),
        "parquet" | "pq" => read_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    csv_records(reader)
}

fn csv_records<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<RawRecord>> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(name, raw)| (name.clone(), guess_value(raw)))
            .collect();
        records.push(fields);
    }

    Ok(records)
}

/// Type a raw CSV cell: empty → missing, then integer, float, bool, text.
pub fn guess_value(s: &str) -> Value {
    let s = s.trim();
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "age": 19, "sex": "female", "bmi": 27.9, "charges": 16884.924 },
///   ...
/// ]
/// ```
fn read_json(path: &Path) -> Result<Vec<RawRecord>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    json_records(&text)
}

fn json_records(text: &str) -> Result<Vec<RawRecord>> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    rows.iter()
        .enumerate()
        .map(|(i, rec)| {
            let obj = rec
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            Ok(obj
                .iter()
                .map(|(key, val)| (key.clone(), json_to_value(val)))
                .collect())
        })
        .collect()
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<Vec<RawRecord>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();

        for row in 0..batch.num_rows() {
            let mut fields = Vec::with_capacity(names.len());
            for (col_idx, name) in names.iter().enumerate() {
                let value = extract_value(batch.column(col_idx), row)
                    .with_context(|| format!("Row {row}: failed to read '{name}'"))?;
                fields.push((name.clone(), value));
            }
            records.push(fields);
        }
    }

    Ok(records)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => Value::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => {
            let arr = downcast::<Int32Array>(col)?;
            Value::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = downcast::<Int64Array>(col)?;
            Value::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = downcast::<Float32Array>(col)?;
            Value::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = downcast::<Float64Array>(col)?;
            Value::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = downcast::<BooleanArray>(col)?;
            Value::Bool(arr.value(row))
        }
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(value)
}

fn downcast<T: 'static>(col: &Arc<dyn Array>) -> Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::model::ColumnKind;

    const CSV: &str = "age,sex,bmi,children,smoker,region,charges\n\
        19,female,27.9,0,yes,southwest,16884.924\n\
        18,male,33.77,1,no,southeast,1725.5523\n\
        28,male,,3,no,southeast,4449.462\n";

    #[test]
    fn guesses_cell_types() {
        assert_eq!(guess_value("19"), Value::Integer(19));
        assert_eq!(guess_value("27.9"), Value::Float(27.9));
        assert_eq!(guess_value(""), Value::Null);
        assert_eq!(guess_value("true"), Value::Bool(true));
        assert_eq!(guess_value("southwest"), Value::Text("southwest".into()));
    }

    #[test]
    fn csv_infers_insurance_schema() {
        let reader = csv::Reader::from_reader(CSV.as_bytes());
        let ds = Dataset::from_records(csv_records(reader).unwrap());

        assert_eq!(ds.len(), 3);
        assert_eq!(
            ds.schema().numeric_columns(),
            vec!["age", "bmi", "children", "charges"]
        );
        let sex = ds.schema().index_of("sex").unwrap();
        assert_eq!(ds.schema().columns()[sex].kind, ColumnKind::Categorical);
        let bmi = ds.schema().index_of("bmi").unwrap();
        assert_eq!(ds.row(2).unwrap().get(bmi), Some(&Value::Null));
    }

    #[test]
    fn json_records_keep_typed_values() {
        let recs = json_records(r#"[{"age": 19, "sex": "female", "charges": 1000.5}]"#).unwrap();
        let ds = Dataset::from_records(recs);
        let rec = ds.record(0).unwrap();
        assert_eq!(rec.get("age"), Some(&Value::Integer(19)));
        assert_eq!(rec.get("charges"), Some(&Value::Float(1000.5)));
    }

    #[test]
    fn json_rejects_non_array() {
        assert!(json_records(r#"{"age": 19}"#).is_err());
    }

    #[test]
    fn loads_csv_file_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let ds = load_or_empty(file.path());
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn loads_parquet_with_nulls() {
        use arrow::array::StringArray;
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("age", DataType::Int64, false),
            Field::new("bmi", DataType::Float32, true),
            Field::new("sex", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![19, 33, 45])),
                Arc::new(Float32Array::from(vec![Some(27.5), None, Some(f32::NAN)])),
                Arc::new(StringArray::from(vec![Some("female"), None, Some("male")])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_dataset(file.path()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.schema().numeric_columns(), vec!["age", "bmi"]);
        let sex = ds.schema().index_of("sex").unwrap();
        assert_eq!(ds.schema().columns()[sex].kind, ColumnKind::Categorical);

        let rec = ds.record(0).unwrap();
        assert_eq!(rec.get("age"), Some(&Value::Integer(19)));
        assert_eq!(rec.get("bmi"), Some(&Value::Float(27.5)));
        assert_eq!(rec.get("sex"), Some(&Value::Text("female".into())));

        let rec = ds.record(1).unwrap();
        assert_eq!(rec.get("bmi"), Some(&Value::Null));
        assert_eq!(rec.get("sex"), Some(&Value::Null));

        // NaN is read as missing.
        assert_eq!(ds.record(2).unwrap().get("bmi"), Some(&Value::Null));
    }

    #[test]
    fn missing_file_degrades_to_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let ds = load_or_empty(&dir.path().join("insurance.csv"));
        assert!(ds.is_empty());
        assert!(ds.schema().is_empty());
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        assert!(read_records(Path::new("insurance.xlsx")).is_err());
    }
}
