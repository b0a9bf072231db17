//! # FraudScope Client
//!
//! Submits validated batches to the fraud scoring service and reconciles the
//! per-transaction outcomes with the rows that were sent.
//!
//! ## Submission Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  RawInput   │────>│  Ingestor   │────>│  Validator  │────>│   Scoring   │
//! │ (csv/json)  │     │  (parsing)  │     │ (cap, thr.) │     │   service   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                                    │
//!                                                             ┌──────┴──────┐
//!                                                             │  Reconciled │
//!                                                             │    rows     │
//!                                                             └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use fraudscope_client::{BatchPipeline, ClientConfig, PipelineState, ScoringClient};
//! use fraudscope_core::FeatureSchema;
//! use fraudscope_ingest::RawInput;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default();
//! let client = ScoringClient::new(&config)?;
//! let pipeline = BatchPipeline::from_config(FeatureSchema::shared(), &config, client);
//!
//! let input = RawInput::Tabular(std::fs::read_to_string("transactions.csv")?);
//! let state = pipeline.submit(PipelineState::Idle, input, Some(0.5)).await?;
//! if let Some(batch) = state.scored() {
//!     println!("{} rows scored", batch.summary.scored);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod config;
pub mod wire;
pub mod client;
pub mod reconcile;
pub mod pipeline;

pub use error::{ScoringError, PipelineError};
pub use config::{ClientConfig, DEFAULT_BASE_URL, BATCH_ENDPOINT, PREDICT_ENDPOINT};
pub use wire::{BatchResult, ItemOutcome, Outcome, PredictResult, Score};
pub use client::{ScoringBackend, ScoringClient};
pub use reconcile::{reconcile, BatchSummary, ReconciledRow, RiskLevel, RowStatus, ScoredBatch};
pub use pipeline::{BatchPipeline, FailureCause, PipelineState, Stage, StageFailure};
