//! Column statistics over a [`Dataset`](crate::data::model::Dataset).
//!
//! * `aggregate` – count/min/max/mean over a row view, `describe()` summaries
//! * `outlier`   – IQR and z-score detection per numeric column

pub mod aggregate;
pub mod outlier;
