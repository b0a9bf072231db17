//! Downloadable CSV template
//!
//! The template is the schema header followed by one example row. It parses
//! back into exactly one feature vector.

use fraudscope_core::FeatureSchema;
use std::io::{self, Write};

/// Suggested file name for the exported template
pub const TEMPLATE_FILE_NAME: &str = "transactions_template.csv";

/// Render the template as UTF-8 text with a trailing newline
pub fn template_csv(schema: &FeatureSchema) -> String {
    let header: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
    let example: Vec<String> = schema.fields().iter().map(|f| f.example.to_string()).collect();
    format!("{}\n{}\n", header.join(","), example.join(","))
}

/// Write the template to any sink
pub fn write_template<W: Write>(schema: &FeatureSchema, mut writer: W) -> io::Result<()> {
    writer.write_all(template_csv(schema).as_bytes())?;
    writer.flush()
}
