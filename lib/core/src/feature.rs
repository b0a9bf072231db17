use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One transaction's numeric inputs, keyed by feature name
///
/// Keys iterate in sorted order so the serialized form is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: BTreeMap<String, f64>,
}

impl FeatureVector {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a feature value, replacing any previous one
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    #[inline]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A validated batch ready for scoring
///
/// Only the ingestion validator builds these, so a `BatchRequest` always holds
/// between one and the configured cap of vectors and a threshold in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRequest {
    transactions: Vec<FeatureVector>,
    threshold: f64,
}

impl BatchRequest {
    pub(crate) fn new(transactions: Vec<FeatureVector>, threshold: f64) -> Self {
        Self { transactions, threshold }
    }

    pub fn transactions(&self) -> &[FeatureVector] {
        &self.transactions
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Always false for a validated batch
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn into_transactions(self) -> Vec<FeatureVector> {
        self.transactions
    }
}

/// A validated single transaction ready for scoring
///
/// Serialized flat: the feature values plus a `threshold` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRequest {
    #[serde(flatten)]
    transaction: FeatureVector,
    threshold: f64,
}

impl TransactionRequest {
    pub(crate) fn new(transaction: FeatureVector, threshold: f64) -> Self {
        Self { transaction, threshold }
    }

    pub fn transaction(&self) -> &FeatureVector {
        &self.transaction
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_serializes_as_flat_object() {
        let vector = FeatureVector::new().with("V1", -1.5).with("Amount", 100.0);
        let json = serde_json::to_value(&vector).unwrap();
        assert_eq!(json, serde_json::json!({"Amount": 100.0, "V1": -1.5}));
    }

    #[test]
    fn test_batch_request_wire_shape() {
        let request = BatchRequest::new(vec![FeatureVector::new().with("Amount", 1.0)], 0.7);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"transactions": [{"Amount": 1.0}], "threshold": 0.7})
        );
    }

    #[test]
    fn test_transaction_request_is_flat() {
        let request = TransactionRequest::new(FeatureVector::new().with("Amount", 2.0), 0.3);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"Amount": 2.0, "threshold": 0.3}));
    }

    #[test]
    fn test_from_iter() {
        let vector: FeatureVector = [("a", 1.0), ("b", 2.0)].into_iter().collect();
        assert_eq!(vector.len(), 2);
        assert_eq!(vector.get("b"), Some(2.0));
        assert_eq!(vector.get("c"), None);
    }
}
