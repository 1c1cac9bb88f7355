//! Request parameters validated at the boundary before a [`FilterSpec`] is built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::filter::FilterSpec;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl FromStr for Sex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            other => Err(Error::Validation(format!(
                "Invalid sex '{other}', expected 'male' or 'female'"
            ))),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Smoker {
    Yes,
    No,
}

impl FromStr for Smoker {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(Smoker::Yes),
            "no" => Ok(Smoker::No),
            other => Err(Error::Validation(format!(
                "Invalid smoker status '{other}', expected 'yes' or 'no'"
            ))),
        }
    }
}

impl fmt::Display for Smoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Smoker::Yes => write!(f, "yes"),
            Smoker::No => write!(f, "no"),
        }
    }
}

/// Query entry point parameters. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub sex: Option<Sex>,
    pub smoker: Option<Smoker>,
    pub region: Option<String>,
}

impl QueryParams {
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_age, self.max_age) {
            if min > max {
                return Err(Error::Validation(
                    "Min age cannot be greater than max age".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Validate and map onto the `age`, `sex`, `smoker` and `region` columns.
    pub fn to_filter_spec(&self) -> Result<FilterSpec> {
        self.validate()?;

        let mut spec = FilterSpec::new().range(
            "age",
            self.min_age.map(f64::from),
            self.max_age.map(f64::from),
        );
        if let Some(sex) = self.sex {
            spec = spec.equals("sex", &sex.to_string());
        }
        if let Some(smoker) = self.smoker {
            spec = spec.equals("smoker", &smoker.to_string());
        }
        if let Some(region) = self.region.as_deref().map(str::trim) {
            if !region.is_empty() {
                spec = spec.equals("region", region);
            }
        }
        Ok(spec)
    }
}
