use thiserror::Error;

/// Canonical result for the query engine.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The request itself is malformed; nothing was read from the dataset.
    #[error("{0}")]
    Validation(String),

    #[error("Data not available")]
    DataUnavailable,

    /// A referenced column is absent from the schema or has the wrong kind.
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Data integrity error: {0}")]
    Integrity(String),
}

impl Error {
    /// Process exit code used by the CLI for this error category.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_) => 2,
            Error::DataUnavailable => 3,
            Error::Schema(_) | Error::Integrity(_) => 1,
        }
    }
}
