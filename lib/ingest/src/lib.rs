//! # FraudScope Ingest
//!
//! Turns user input into schema-checked feature vectors.
//!
//! Two surfaces are supported, both failing fast on the first structural
//! problem with its exact location:
//!
//! - **Tabular**: comma-separated text with a header row ([`TabularParser`])
//! - **Structured**: a JSON array of objects ([`StructuredParser`])
//!
//! ## Example
//!
//! ```rust
//! use fraudscope_core::{FeatureSchema, FieldSpec};
//! use fraudscope_ingest::{Ingestor, RawInput};
//! use std::sync::Arc;
//!
//! let schema = Arc::new(FeatureSchema::new(vec![FieldSpec::number("Amount", 1.0)]).unwrap());
//! let ingestor = Ingestor::new(schema);
//!
//! let vectors = ingestor.parse(&RawInput::Tabular("Amount\n100\n200\n".to_string())).unwrap();
//! assert_eq!(vectors.len(), 2);
//! ```
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐
//! │  CSV text   │──> TabularParser ───┐
//! └─────────────┘                     │     ┌─────────────────┐
//!                                     ├────>│ FeatureVector[] │
//! ┌─────────────┐                     │     └─────────────────┘
//! │ JSON array  │──> StructuredParser ┘
//! └─────────────┘
//! ```

pub mod tabular;
pub mod structured;
pub mod template;
pub mod input;

pub use tabular::TabularParser;
pub use structured::StructuredParser;
pub use template::{template_csv, write_template, TEMPLATE_FILE_NAME};
pub use input::{Ingestor, InputFormat, RawInput};
