//! Feature schema definitions
//!
//! Declares which numeric features a transaction must carry before it can be
//! scored. The schema is ordered: parsers report missing fields and the
//! template export writes columns in declaration order.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

static CREDIT_CARD_SCHEMA: OnceLock<Arc<FeatureSchema>> = OnceLock::new();

/// Example transaction used for template export, indexed V1..V28
const SAMPLE_COMPONENTS: [f64; 28] = [
    -1.3598071336738,
    -0.0727811733098497,
    2.53634673796914,
    1.37815522427443,
    -0.338320769942518,
    0.462387777762292,
    0.239598554061257,
    0.0986979012610507,
    0.363786969611213,
    0.0907941719789316,
    -0.551599533260813,
    -0.617800855762348,
    -0.991389847235408,
    -0.311169353699879,
    1.46817697209427,
    -0.470400525259478,
    0.207971241929242,
    0.0257905801985591,
    0.403992960255733,
    0.251412098239705,
    -0.018306777944153,
    0.277837575558899,
    -0.110473910188767,
    0.0669280749146731,
    0.128539358273528,
    -0.189114843888824,
    0.133558376740387,
    -0.0210530534538215,
];

/// Ordered set of features required to score a transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Vec<FieldSpec>", into = "Vec<FieldSpec>")]
pub struct FeatureSchema {
    fields: Vec<FieldSpec>,
    index: AHashMap<String, usize>,
}

impl FeatureSchema {
    /// Create a schema from an ordered list of fields
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::EmptySchema);
        }

        let mut index = AHashMap::with_capacity(fields.len());
        for (pos, field) in fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(SchemaError::BlankFieldName(pos));
            }
            if index.insert(field.name.clone(), pos).is_some() {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }

        if !fields.iter().any(FieldSpec::is_required) {
            return Err(SchemaError::NoRequiredFields);
        }

        Ok(Self { fields, index })
    }

    /// Schema of the credit-card fraud model: optional `Time`, `V1`..`V28`, `Amount`
    pub fn credit_card() -> Self {
        let mut fields = Vec::with_capacity(30);
        fields.push(FieldSpec::optional("Time", 0.0));
        for (i, example) in SAMPLE_COMPONENTS.iter().enumerate() {
            fields.push(FieldSpec::number(format!("V{}", i + 1), *example));
        }
        fields.push(FieldSpec::number("Amount", 149.62));

        let index = fields
            .iter()
            .enumerate()
            .map(|(pos, f)| (f.name.clone(), pos))
            .collect();
        Self { fields, index }
    }

    /// Process-wide credit-card schema, built once and shared read-only
    pub fn shared() -> Arc<FeatureSchema> {
        CREDIT_CARD_SCHEMA
            .get_or_init(|| Arc::new(Self::credit_card()))
            .clone()
    }

    /// All fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of the required fields in declaration order
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.is_required())
            .map(|f| f.name.as_str())
    }

    /// Get a field by name
    pub fn get_field(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|&pos| &self.fields[pos])
    }

    /// Whether the name is part of the schema
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Required fields for which `is_present` returns false, in schema order
    pub fn missing_required<F>(&self, mut is_present: F) -> Vec<String>
    where
        F: FnMut(&str) -> bool,
    {
        self.required_names()
            .filter(|name| !is_present(name))
            .map(str::to_string)
            .collect()
    }
}

impl TryFrom<Vec<FieldSpec>> for FeatureSchema {
    type Error = SchemaError;

    fn try_from(fields: Vec<FieldSpec>) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

impl From<FeatureSchema> for Vec<FieldSpec> {
    fn from(schema: FeatureSchema) -> Self {
        schema.fields
    }
}

/// A single feature column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: FieldKind,

    /// Value written to the template example row
    #[serde(default)]
    pub example: f64,
}

impl FieldSpec {
    /// Create a required numeric field
    pub fn number(name: impl Into<String>, example: f64) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Number,
            example,
        }
    }

    /// Create an optional numeric field
    pub fn optional(name: impl Into<String>, example: f64) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::OptionalNumber,
            example,
        }
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.kind == FieldKind::Number
    }
}

/// Semantic type of a feature
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// A finite number that must be present
    #[default]
    Number,
    /// A finite number that may be absent
    OptionalNumber,
}

/// Errors that can occur during schema construction
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema cannot be empty")]
    EmptySchema,

    #[error("Field at position {0} has a blank name")]
    BlankFieldName(usize),

    #[error("Field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("Schema must declare at least one required field")]
    NoRequiredFields,
}
