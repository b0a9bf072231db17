use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Maximum number of transactions accepted in one submission
pub const MAX_BATCH_SIZE: usize = 100;

/// Errors raised while turning raw input into a validated batch.
///
/// Every variant aborts the batch before any network call is made.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Input is empty")]
    EmptyInput,

    #[error("Input contains no data rows")]
    NoDataRows,

    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Transaction {position}: missing fields: {}", .names.join(", "))]
    MissingFields { position: usize, names: Vec<String> },

    #[error("Row {row}, column '{field}': '{raw}' is not a number")]
    InvalidCell { row: usize, field: String, raw: String },

    #[error("Transaction {position}, field '{field}': '{raw}' is not a number")]
    InvalidField { position: usize, field: String, raw: String },

    #[error("Batch too large: {actual} transactions, maximum is {limit}")]
    BatchTooLarge { limit: usize, actual: usize },

    #[error("Invalid input shape: {0}")]
    InvalidShape(String),

    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Malformed CSV: {0}")]
    MalformedCsv(String),

    #[error("Threshold must be a number between 0 and 1, got {0}")]
    InvalidThreshold(f64),
}
