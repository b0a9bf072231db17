//! # FraudScope Core
//!
//! Core types for the FraudScope batch scoring pipeline.
//!
//! This crate provides the pieces every input surface shares:
//!
//! - [`FeatureSchema`] - Ordered registry of the features a transaction must carry
//! - [`FeatureVector`] - One transaction's numeric inputs
//! - [`IngestionValidator`] - Batch cap, schema re-check and threshold policy
//! - [`BatchRequest`] - A validated batch, ready for submission
//!
//! ## Example
//!
//! ```rust
//! use fraudscope_core::{FeatureSchema, FeatureVector, IngestionValidator};
//!
//! let schema = FeatureSchema::shared();
//! let mut vector = FeatureVector::new();
//! for name in schema.required_names() {
//!     vector.insert(name, 0.0);
//! }
//!
//! let validator = IngestionValidator::new(schema);
//! let request = validator.validate(vec![vector], None).unwrap();
//! assert_eq!(request.threshold(), 0.5);
//! ```

pub mod error;
pub mod schema;
pub mod feature;
pub mod validator;

pub use error::{Error, Result, MAX_BATCH_SIZE};
pub use schema::{FeatureSchema, FieldSpec, FieldKind, SchemaError};
pub use feature::{FeatureVector, BatchRequest, TransactionRequest};
pub use validator::{IngestionValidator, ThresholdPolicy, DEFAULT_THRESHOLD, coerce_text, coerce_json, raw_json};
