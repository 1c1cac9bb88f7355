//! Shared fixtures for unit tests.

use crate::data::model::{Dataset, RawRecord, Value};

fn person(age: i64, sex: &str, smoker: &str, region: &str, charges: f64) -> RawRecord {
    vec![
        ("age".to_string(), Value::Integer(age)),
        ("sex".to_string(), Value::from(sex)),
        ("smoker".to_string(), Value::from(smoker)),
        ("region".to_string(), Value::from(region)),
        ("charges".to_string(), Value::Float(charges)),
    ]
}

/// Three policy holders; the second is an old smoker with high charges.
pub fn sample_dataset() -> Dataset {
    Dataset::from_records(vec![
        person(19, "female", "no", "sw", 1000.0),
        person(55, "male", "yes", "ne", 50000.0),
        person(30, "male", "no", "sw", 2000.0),
    ])
}
