//! Delimited-text parser
//!
//! Reads comma-separated rows whose first non-blank line is the header.
//! Columns may appear in any order and unknown columns are ignored. Quoted
//! cells may contain commas. The first bad cell fails the whole parse with
//! its line number, column and raw text.

use ahash::AHashMap;
use csv::{ReaderBuilder, StringRecord, Trim};
use fraudscope_core::{coerce_text, Error, FeatureSchema, FeatureVector, FieldSpec, Result, MAX_BATCH_SIZE};
use std::sync::Arc;
use tracing::debug;

const BOM: char = '\u{feff}';

/// Parser for comma-separated transaction files
#[derive(Debug, Clone)]
pub struct TabularParser {
    schema: Arc<FeatureSchema>,
    max_rows: usize,
}

impl TabularParser {
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self {
            schema,
            max_rows: MAX_BATCH_SIZE,
        }
    }

    /// Lower the row cap. Values above [`MAX_BATCH_SIZE`] are ignored.
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    /// Parse a text block into feature vectors, preserving row order
    ///
    /// Row numbers in errors are 1-based physical line numbers, so the header
    /// is row 1 and the first data row is row 2 unless blank lines intervene.
    pub fn parse(&self, input: &str) -> Result<Vec<FeatureVector>> {
        let input = input.strip_prefix(BOM).unwrap_or(input);
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(input.as_bytes());

        let mut records = reader
            .records()
            .map(|record| record.map_err(|e| Error::MalformedCsv(e.to_string())))
            .filter(|record| !matches!(record, Ok(r) if is_blank(r)));

        let header = records.next().ok_or(Error::EmptyInput)??;
        let columns = self.map_columns(&header)?;

        let mut vectors = Vec::new();
        for record in records {
            let record = record?;
            let row = record.position().map_or(vectors.len() + 2, |p| p.line() as usize);
            vectors.push(Self::parse_row(&columns, row, &record)?);
        }

        if vectors.is_empty() {
            return Err(Error::NoDataRows);
        }
        if vectors.len() > self.max_rows {
            return Err(Error::BatchTooLarge {
                limit: self.max_rows,
                actual: vectors.len(),
            });
        }

        debug!("Parsed {} rows of delimited text", vectors.len());
        Ok(vectors)
    }

    /// Resolve every schema field to its header column
    fn map_columns(&self, header: &StringRecord) -> Result<Vec<(&FieldSpec, Option<usize>)>> {
        let mut positions: AHashMap<&str, usize> = AHashMap::new();
        for (col, name) in header.iter().enumerate() {
            positions.entry(name).or_insert(col);
        }

        let missing = self.schema.missing_required(|name| positions.contains_key(name));
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing));
        }

        Ok(self
            .schema
            .fields()
            .iter()
            .map(|field| (field, positions.get(field.name.as_str()).copied()))
            .collect())
    }

    fn parse_row(columns: &[(&FieldSpec, Option<usize>)], row: usize, record: &StringRecord) -> Result<FeatureVector> {
        let mut vector = FeatureVector::new();

        for (field, col) in columns {
            // Optional column not in the header
            let Some(col) = col else { continue };
            let raw = record.get(*col).unwrap_or("");
            if raw.is_empty() && !field.is_required() {
                continue;
            }
            let value = coerce_text(raw).ok_or_else(|| Error::InvalidCell {
                row,
                field: field.name.clone(),
                raw: raw.to_string(),
            })?;
            vector.insert(field.name.as_str(), value);
        }

        Ok(vector)
    }
}

/// A whitespace-only line reads as a single empty field
fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(str::is_empty)
}
