//! Raw input surfaces
//!
//! Both the file upload (delimited text) and the free-text JSON area funnel
//! through [`Ingestor::parse`] into the same feature vector sequence.

use crate::structured::StructuredParser;
use crate::tabular::TabularParser;
use fraudscope_core::{FeatureSchema, FeatureVector, Result};
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Raw user input, kept only for the duration of one parse
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    /// Comma-separated text with a header row
    Tabular(String),
    /// JSON text holding an array of objects
    Structured(String),
    /// An already decoded JSON value
    Json(Value),
}

impl RawInput {
    pub fn from_text(format: InputFormat, text: String) -> Self {
        match format {
            InputFormat::Tabular => RawInput::Tabular(text),
            InputFormat::Structured => RawInput::Structured(text),
        }
    }

    pub fn format(&self) -> InputFormat {
        match self {
            RawInput::Tabular(_) => InputFormat::Tabular,
            RawInput::Structured(_) | RawInput::Json(_) => InputFormat::Structured,
        }
    }
}

/// Which parser handles a piece of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Tabular,
    Structured,
}

impl InputFormat {
    /// Infer the format from a file extension; anything but `.json` is tabular
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Structured,
            _ => InputFormat::Tabular,
        }
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" | "tabular" => Ok(InputFormat::Tabular),
            "json" | "structured" => Ok(InputFormat::Structured),
            other => Err(format!("unknown input format '{}', expected csv or json", other)),
        }
    }
}

/// Dispatches raw input to the matching parser
#[derive(Debug, Clone)]
pub struct Ingestor {
    tabular: TabularParser,
    structured: StructuredParser,
}

impl Ingestor {
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self {
            tabular: TabularParser::new(Arc::clone(&schema)),
            structured: StructuredParser::new(schema),
        }
    }

    /// Lower the row cap of both parsers
    #[must_use]
    pub fn with_max_rows(self, max_rows: usize) -> Self {
        Self {
            tabular: self.tabular.with_max_rows(max_rows),
            structured: self.structured.with_max_rows(max_rows),
        }
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        self.tabular.schema()
    }

    pub fn parse(&self, input: &RawInput) -> Result<Vec<FeatureVector>> {
        match input {
            RawInput::Tabular(text) => self.tabular.parse(text),
            RawInput::Structured(text) => self.structured.parse_str(text),
            RawInput::Json(value) => self.structured.parse_value(value),
        }
    }
}
