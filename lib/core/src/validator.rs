//! Ingestion validation
//!
//! Shared constraint layer applied after either parser: numeric coercion
//! helpers, the batch size cap and the decision threshold policy.

use crate::error::{Error, Result, MAX_BATCH_SIZE};
use crate::feature::{BatchRequest, FeatureVector, TransactionRequest};
use crate::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Threshold used when the caller does not supply one
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Coerce a text cell to a finite number
pub fn coerce_text(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce a JSON value to a finite number
///
/// Accepts JSON numbers and strings holding a number. Booleans, nulls,
/// arrays and objects are rejected.
pub fn coerce_json(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => coerce_text(s),
        _ => None,
    }
}

/// Render a JSON value the way it should appear in an error message
pub fn raw_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// What to do with a threshold outside `[0, 1]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdPolicy {
    /// Fail validation
    #[default]
    Reject,
    /// Clamp into range
    Clamp,
}

/// Validates parsed vectors and builds a [`BatchRequest`]
#[derive(Debug, Clone)]
pub struct IngestionValidator {
    schema: Arc<FeatureSchema>,
    max_batch_size: usize,
    default_threshold: f64,
    threshold_policy: ThresholdPolicy,
}

impl IngestionValidator {
    /// Create a validator with the standard cap and a 0.5 default threshold
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self {
            schema,
            max_batch_size: MAX_BATCH_SIZE,
            default_threshold: DEFAULT_THRESHOLD,
            threshold_policy: ThresholdPolicy::default(),
        }
    }

    /// Lower the batch cap. Values above [`MAX_BATCH_SIZE`] are ignored.
    #[must_use]
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    #[must_use]
    pub fn with_default_threshold(mut self, threshold: f64) -> Self {
        self.default_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_threshold_policy(mut self, policy: ThresholdPolicy) -> Self {
        self.threshold_policy = policy;
        self
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Check a row count against the cap
    pub fn check_batch_size(&self, count: usize) -> Result<()> {
        if count == 0 {
            return Err(Error::NoDataRows);
        }
        if count > self.max_batch_size {
            return Err(Error::BatchTooLarge {
                limit: self.max_batch_size,
                actual: count,
            });
        }
        Ok(())
    }

    /// Resolve the decision threshold, applying the default and the policy
    pub fn resolve_threshold(&self, threshold: Option<f64>) -> Result<f64> {
        let value = threshold.unwrap_or(self.default_threshold);
        if !value.is_finite() {
            return Err(Error::InvalidThreshold(value));
        }
        if (0.0..=1.0).contains(&value) {
            return Ok(value);
        }
        match self.threshold_policy {
            ThresholdPolicy::Reject => Err(Error::InvalidThreshold(value)),
            ThresholdPolicy::Clamp => {
                debug!("Clamping threshold {} into [0, 1]", value);
                Ok(value.clamp(0.0, 1.0))
            }
        }
    }

    /// Validate parsed vectors and pair them with a threshold
    pub fn validate(&self, vectors: Vec<FeatureVector>, threshold: Option<f64>) -> Result<BatchRequest> {
        self.check_batch_size(vectors.len())?;

        for (i, vector) in vectors.iter().enumerate() {
            self.check_vector(i + 1, vector)?;
        }

        let threshold = self.resolve_threshold(threshold)?;
        debug!("Validated batch of {} transactions, threshold {}", vectors.len(), threshold);
        Ok(BatchRequest::new(vectors, threshold))
    }

    /// Validate one transaction for single scoring
    pub fn validate_single(&self, vector: FeatureVector, threshold: Option<f64>) -> Result<TransactionRequest> {
        self.check_vector(1, &vector)?;
        let threshold = self.resolve_threshold(threshold)?;
        Ok(TransactionRequest::new(vector, threshold))
    }

    fn check_vector(&self, position: usize, vector: &FeatureVector) -> Result<()> {
        let missing = self.schema.missing_required(|name| vector.contains(name));
        if !missing.is_empty() {
            return Err(Error::MissingFields { position, names: missing });
        }
        if let Some((field, value)) = vector.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::InvalidField {
                position,
                field: field.to_string(),
                raw: value.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use serde_json::json;

    fn amount_schema() -> Arc<FeatureSchema> {
        Arc::new(FeatureSchema::new(vec![FieldSpec::number("Amount", 1.0)]).unwrap())
    }

    fn rows(n: usize) -> Vec<FeatureVector> {
        (0..n).map(|i| FeatureVector::new().with("Amount", i as f64)).collect()
    }

    #[test]
    fn test_coerce_text() {
        assert_eq!(coerce_text(" 42 "), Some(42.0));
        assert_eq!(coerce_text("-1.5e2"), Some(-150.0));
        assert_eq!(coerce_text("abc"), None);
        assert_eq!(coerce_text(""), None);
        assert_eq!(coerce_text("NaN"), None);
        assert_eq!(coerce_text("inf"), None);
    }

    #[test]
    fn test_coerce_json() {
        assert_eq!(coerce_json(&json!(3)), Some(3.0));
        assert_eq!(coerce_json(&json!("2.5")), Some(2.5));
        assert_eq!(coerce_json(&json!(true)), None);
        assert_eq!(coerce_json(&json!(null)), None);
        assert_eq!(coerce_json(&json!([1])), None);
        assert_eq!(raw_json(&json!("x")), "x");
        assert_eq!(raw_json(&json!(null)), "null");
    }

    #[test]
    fn test_validate_defaults_threshold() {
        let validator = IngestionValidator::new(amount_schema());
        let request = validator.validate(rows(3), None).unwrap();
        assert_eq!(request.len(), 3);
        assert_eq!(request.threshold(), DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_validate_size_bounds() {
        let validator = IngestionValidator::new(amount_schema());
        assert_eq!(validator.validate(vec![], None), Err(Error::NoDataRows));
        assert_eq!(
            validator.validate(rows(101), None),
            Err(Error::BatchTooLarge { limit: 100, actual: 101 })
        );
        assert!(validator.validate(rows(100), None).is_ok());

        let small = IngestionValidator::new(amount_schema()).with_max_batch_size(2);
        assert!(matches!(small.validate(rows(3), None), Err(Error::BatchTooLarge { limit: 2, .. })));

        let ignored = IngestionValidator::new(amount_schema()).with_max_batch_size(500);
        assert_eq!(ignored.max_batch_size(), MAX_BATCH_SIZE);
    }

    #[test]
    fn test_validate_rechecks_schema() {
        let validator = IngestionValidator::new(amount_schema());
        let vectors = vec![
            FeatureVector::new().with("Amount", 1.0),
            FeatureVector::new().with("Other", 1.0),
        ];
        assert_eq!(
            validator.validate(vectors, None),
            Err(Error::MissingFields { position: 2, names: vec!["Amount".to_string()] })
        );

        let vectors = vec![FeatureVector::new().with("Amount", f64::NAN)];
        assert!(matches!(
            validator.validate(vectors, None),
            Err(Error::InvalidField { position: 1, .. })
        ));
    }

    #[test]
    fn test_validate_single() {
        let validator = IngestionValidator::new(amount_schema());
        let request = validator
            .validate_single(FeatureVector::new().with("Amount", 5.0), Some(0.9))
            .unwrap();
        assert_eq!(request.threshold(), 0.9);
        assert_eq!(request.transaction().get("Amount"), Some(5.0));

        assert!(matches!(
            validator.validate_single(FeatureVector::new(), None),
            Err(Error::MissingFields { position: 1, .. })
        ));
        assert_eq!(
            validator.validate_single(FeatureVector::new().with("Amount", 5.0), Some(-1.0)),
            Err(Error::InvalidThreshold(-1.0))
        );
    }

    #[test]
    fn test_threshold_policies() {
        let reject = IngestionValidator::new(amount_schema());
        assert_eq!(reject.resolve_threshold(Some(0.0)), Ok(0.0));
        assert_eq!(reject.resolve_threshold(Some(1.0)), Ok(1.0));
        assert_eq!(reject.resolve_threshold(Some(1.5)), Err(Error::InvalidThreshold(1.5)));

        let clamp = IngestionValidator::new(amount_schema()).with_threshold_policy(ThresholdPolicy::Clamp);
        assert_eq!(clamp.resolve_threshold(Some(1.5)), Ok(1.0));
        assert_eq!(clamp.resolve_threshold(Some(-0.2)), Ok(0.0));
        assert!(clamp.resolve_threshold(Some(f64::INFINITY)).is_err());

        let custom = IngestionValidator::new(amount_schema()).with_default_threshold(0.8);
        assert_eq!(custom.resolve_threshold(None), Ok(0.8));
    }
}
