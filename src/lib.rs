//! # FraudScope
//!
//! Batch ingestion, validation and scoring for card transactions.
//!
//! FraudScope takes a CSV file or a JSON array of transactions, checks every
//! row against the model's feature schema, submits the batch to the fraud
//! scoring service and lines the per-transaction results back up with the
//! rows that were sent.
//!
//! ## Quick Start
//!
//! ### From the Command Line
//!
//! ```bash
//! fraudscope template --output transactions_template.csv
//! fraudscope check transactions.csv
//! fraudscope --url http://localhost:5000 score transactions.csv --threshold 0.7
//! fraudscope predict transaction.json
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use fraudscope::prelude::*;
//! use std::sync::Arc;
//!
//! let schema = Arc::new(FeatureSchema::new(vec![FieldSpec::number("Amount", 1.0)]).unwrap());
//! let ingestor = Ingestor::new(Arc::clone(&schema));
//! let validator = IngestionValidator::new(schema);
//!
//! let vectors = ingestor.parse(&RawInput::Tabular("Amount\n100\n200\n".to_string())).unwrap();
//! let request = validator.validate(vectors, None).unwrap();
//! assert_eq!(request.len(), 2);
//! ```
//!
//! ## Crate Structure
//!
//! - [`fraudscope-core`](https://docs.rs/fraudscope-core) - Feature schema, feature vectors, validation
//! - [`fraudscope-ingest`](https://docs.rs/fraudscope-ingest) - CSV and JSON parsers, CSV template
//! - [`fraudscope-client`](https://docs.rs/fraudscope-client) - Scoring client, reconciliation, pipeline

pub mod report;

// Re-export core types
pub use fraudscope_core::{
    FeatureSchema, FieldSpec, FieldKind, SchemaError,
    FeatureVector, BatchRequest, TransactionRequest,
    IngestionValidator, ThresholdPolicy,
    Error, Result, MAX_BATCH_SIZE, DEFAULT_THRESHOLD,
};

// Re-export parsers
pub use fraudscope_ingest::{
    TabularParser, StructuredParser, Ingestor, InputFormat, RawInput,
    template_csv, write_template, TEMPLATE_FILE_NAME,
};

// Re-export client
pub use fraudscope_client::{
    ClientConfig, ScoringBackend, ScoringClient, ScoringError,
    BatchResult, ItemOutcome, Outcome, Score, PredictResult,
    ReconciledRow, RowStatus, RiskLevel, BatchSummary, ScoredBatch,
    BatchPipeline, PipelineState, PipelineError, Stage, StageFailure, FailureCause,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        FeatureSchema, FieldSpec, FeatureVector, BatchRequest,
        IngestionValidator, ThresholdPolicy,
        Ingestor, InputFormat, RawInput,
        ClientConfig, ScoringBackend, ScoringClient,
        BatchPipeline, PipelineState, ScoredBatch, RowStatus,
        Error, Result,
    };
}
