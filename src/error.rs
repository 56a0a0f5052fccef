//! Error handling for the comps pipeline
//!
//! Defines the pipeline error taxonomy and establishes a unified Result type
//! using anyhow for context chaining and error propagation.
//!
//! Row-level problems (unparseable fields, sold listings missing price/date)
//! are absorbed into load-summary counts rather than raised; only dataset- and
//! header-level problems surface as errors.

use thiserror::Error;

/// Fatal and header-level errors for pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("malformed record in '{source_name}' row {row}, field '{field}': {detail}")]
    MalformedRecord {
        source_name: String,
        row: usize,
        field: String,
        detail: String,
    },

    #[error("source '{source_name}' yielded no usable listings")]
    EmptyDataset { source_name: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = anyhow::Result<T>;
