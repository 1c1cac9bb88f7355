//! Service settings that downstream callers can serialize/deserialize.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Hard ceiling on the records a single query returns.
pub const MAX_RECORDS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Dataset file read once at startup (`.csv`, `.json` or `.parquet`).
    pub data_path: PathBuf,

    /// Numeric column summarized by queries.
    pub aggregate_column: String,

    /// Upper bound on the records returned by a query, capped at [`MAX_RECORDS`].
    pub max_records: usize,

    pub iqr_threshold: f64,
    pub zscore_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("insurance.csv"),
            aggregate_column: "charges".to_string(),
            max_records: MAX_RECORDS,
            iqr_threshold: 1.5,
            zscore_threshold: 3.0,
        }
    }
}

impl Settings {
    /// Create settings from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `INSURANCE_STATS_DATA`: dataset path
    /// - `INSURANCE_STATS_AGG_COLUMN`: aggregate column
    /// - `INSURANCE_STATS_MAX_RECORDS`: records returned per query
    /// - `INSURANCE_STATS_IQR_THRESHOLD`: default IQR multiplier
    /// - `INSURANCE_STATS_ZSCORE_THRESHOLD`: default z-score cutoff
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(s) = lookup("INSURANCE_STATS_DATA") {
            cfg.data_path = PathBuf::from(s);
        }

        if let Some(s) = lookup("INSURANCE_STATS_AGG_COLUMN") {
            cfg.aggregate_column = s;
        }

        if let Some(s) = lookup("INSURANCE_STATS_MAX_RECORDS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_records = v.min(MAX_RECORDS);
            }
        }

        if let Some(s) = lookup("INSURANCE_STATS_IQR_THRESHOLD") {
            if let Ok(v) = s.parse::<f64>() {
                cfg.iqr_threshold = v;
            }
        }

        if let Some(s) = lookup("INSURANCE_STATS_ZSCORE_THRESHOLD") {
            if let Ok(v) = s.parse::<f64>() {
                cfg.zscore_threshold = v;
            }
        }

        cfg
    }
}
