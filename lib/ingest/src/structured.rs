//! JSON array parser
//!
//! Accepts an array of transaction objects. Keys outside the schema are
//! dropped; a missing or non-numeric schema field fails the whole batch.

use fraudscope_core::{coerce_json, raw_json, Error, FeatureSchema, FeatureVector, Result, MAX_BATCH_SIZE};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Parser for JSON arrays of transaction objects
#[derive(Debug, Clone)]
pub struct StructuredParser {
    schema: Arc<FeatureSchema>,
    max_rows: usize,
}

impl StructuredParser {
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self {
            schema,
            max_rows: MAX_BATCH_SIZE,
        }
    }

    /// Lower the element cap. Values above [`MAX_BATCH_SIZE`] are ignored.
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    /// Decode JSON text and parse it
    pub fn parse_str(&self, input: &str) -> Result<Vec<FeatureVector>> {
        if input.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        let value: Value = serde_json::from_str(input)
            .map_err(|e| Error::MalformedJson(e.to_string()))?;
        self.parse_value(&value)
    }

    /// Parse an already decoded JSON value
    pub fn parse_value(&self, value: &Value) -> Result<Vec<FeatureVector>> {
        let items = value
            .as_array()
            .filter(|items| !items.is_empty())
            .ok_or_else(|| Error::InvalidShape("expected a non-empty JSON array of transactions".to_string()))?;

        if items.len() > self.max_rows {
            return Err(Error::BatchTooLarge {
                limit: self.max_rows,
                actual: items.len(),
            });
        }

        let vectors = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let position = i + 1;
                let object = item.as_object().ok_or_else(|| {
                    Error::InvalidShape(format!("transaction {} is not a JSON object", position))
                })?;
                self.parse_object(position, object)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Parsed {} transactions from JSON", vectors.len());
        Ok(vectors)
    }

    /// Decode JSON text holding a single transaction object
    pub fn parse_single_str(&self, input: &str) -> Result<FeatureVector> {
        if input.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        let value: Value = serde_json::from_str(input)
            .map_err(|e| Error::MalformedJson(e.to_string()))?;
        self.parse_single(&value)
    }

    /// Parse one transaction object
    pub fn parse_single(&self, value: &Value) -> Result<FeatureVector> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::InvalidShape("expected a JSON object describing one transaction".to_string()))?;
        self.parse_object(1, object)
    }

    fn parse_object(&self, position: usize, object: &Map<String, Value>) -> Result<FeatureVector> {
        let missing = self.schema.missing_required(|name| object.contains_key(name));
        if !missing.is_empty() {
            return Err(Error::MissingFields { position, names: missing });
        }

        let mut vector = FeatureVector::new();
        for field in self.schema.fields() {
            let value = match object.get(&field.name) {
                Some(Value::Null) | None if !field.is_required() => continue,
                Some(value) => value,
                None => continue,
            };
            let number = coerce_json(value).ok_or_else(|| Error::InvalidField {
                position,
                field: field.name.clone(),
                raw: raw_json(value),
            })?;
            vector.insert(field.name.as_str(), number);
        }

        Ok(vector)
    }
}
