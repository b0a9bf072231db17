use crate::pipeline::PipelineState;
use thiserror::Error;

/// Scoring client errors
///
/// Every variant fails the whole submission; item-level errors travel inside
/// a successful [`BatchResult`](crate::wire::BatchResult) instead.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScoringError {
    /// Connection, timeout or body transfer failure
    #[error("Network error: {0}")]
    Network(String),

    /// Scoring service answered with a non-success status
    #[error("Scoring service error {status}: {message}")]
    Server { status: u16, message: String },

    /// Successful status but an `error` at the response root
    #[error("Scoring service rejected the batch: {0}")]
    Rejected(String),

    /// Response body is not the expected JSON
    #[error("Invalid response from scoring service: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Raised when a submission cannot start
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The state handed in belongs to a submission that has not finished.
    /// The state is returned untouched.
    #[error("A submission is already in progress")]
    SubmissionInProgress(PipelineState),
}

impl PipelineError {
    /// Take back the state that was handed in
    pub fn into_state(self) -> PipelineState {
        match self {
            PipelineError::SubmissionInProgress(state) => state,
        }
    }
}
