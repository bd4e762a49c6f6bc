//! Error types for the call review pipeline
//!

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    /// A required column or field is missing from an input record set, or can't be parsed
    #[error("schema error for field '{field}': {detail}")]
    Schema { field: String, detail: String },

    /// The same join key occurs more than once in a dataset that must be uniquely keyed
    #[error("duplicate variant key '{key}' found in {dataset} dataset")]
    DuplicateKey { dataset: String, key: String },

    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// Invalid molecule count input or a non-finite test statistic for one variant
    #[error("arithmetic error for variant '{key}': {detail}")]
    Arithmetic { key: String, detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tab-delimited file error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unable to start worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl ReviewError {
    pub fn schema(field: &str, detail: impl Into<String>) -> Self {
        Self::Schema {
            field: field.to_string(),
            detail: detail.into(),
        }
    }

    pub fn arithmetic(key: impl ToString, detail: impl Into<String>) -> Self {
        Self::Arithmetic {
            key: key.to_string(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;
