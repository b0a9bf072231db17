//! Scoring endpoint contract
//!
//! Request bodies are [`BatchRequest`](fraudscope_core::BatchRequest)
//! serialized as `{ "transactions": [...], "threshold": t }`. Responses are
//! decoded into the typed structures below and converted into a
//! [`BatchResult`] whose outcomes are either scored or failed, never both.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reported for a result that carries neither a score nor an error
pub const INCOMPLETE_RESULT: &str = "incomplete result: missing fraud score";

/// Top-level response body
///
/// A root-level `error` string wins over everything else in the payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScoreEnvelope {
    Rejected { error: String },
    Accepted(BatchResponse),
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<WireOutcome>,
    #[serde(default)]
    pub total_transactions: Option<usize>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One entry of `results` as sent by the service
#[derive(Debug, Clone, Deserialize)]
pub struct WireOutcome {
    pub transaction_id: usize,
    #[serde(default)]
    pub fraud_score: Option<f64>,
    #[serde(default)]
    pub is_fraud: Option<bool>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of the single-transaction endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub fraud_score: Option<f64>,
    #[serde(default)]
    pub is_fraud: Option<bool>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Scored transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Score {
    pub fraud_score: f64,
    pub is_fraud: bool,
    pub confidence: f64,
    /// Label supplied by the service, if any
    pub risk_level: Option<String>,
}

impl Score {
    /// Build a score from possibly partial wire fields. Classification and
    /// confidence are derived from the score when absent; no finite score
    /// means no result.
    pub fn from_parts(
        fraud_score: Option<f64>,
        is_fraud: Option<bool>,
        confidence: Option<f64>,
        risk_level: Option<String>,
        threshold: f64,
    ) -> Option<Self> {
        let score = fraud_score.filter(|s| s.is_finite())?;
        Some(Self {
            fraud_score: score,
            is_fraud: is_fraud.unwrap_or(score >= threshold),
            confidence: confidence.unwrap_or_else(|| score.max(1.0 - score)),
            risk_level,
        })
    }
}

/// Decoded single-transaction response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictResult {
    pub score: Score,
    pub threshold: f64,
    pub timestamp: Option<String>,
}

impl PredictResult {
    pub fn scored_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

/// Outcome of one transaction inside a successful batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Scored(Score),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome {
    /// Zero-based position of the transaction in the submitted batch
    pub transaction_id: usize,
    pub outcome: Outcome,
}

impl ItemOutcome {
    pub fn scored(transaction_id: usize, score: Score) -> Self {
        Self { transaction_id, outcome: Outcome::Scored(score) }
    }

    pub fn failed(transaction_id: usize, error: impl Into<String>) -> Self {
        Self { transaction_id, outcome: Outcome::Failed(error.into()) }
    }

    /// Convert a wire entry. An item error takes precedence over any score;
    /// an entry with neither is reported as a failure.
    pub fn from_wire(wire: WireOutcome, threshold: f64) -> Self {
        if let Some(error) = wire.error {
            return Self::failed(wire.transaction_id, error);
        }
        match Score::from_parts(wire.fraud_score, wire.is_fraud, wire.confidence, wire.risk_level, threshold) {
            Some(score) => Self::scored(wire.transaction_id, score),
            None => Self::failed(wire.transaction_id, INCOMPLETE_RESULT),
        }
    }
}

/// Decoded batch response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub outcomes: Vec<ItemOutcome>,
    pub total_transactions: usize,
    pub threshold: f64,
    /// Raw server timestamp
    pub timestamp: Option<String>,
}

impl BatchResult {
    /// Build a result from the wire response; `requested_threshold` fills in
    /// when the service does not echo one back.
    pub fn from_response(response: BatchResponse, requested_threshold: f64) -> Self {
        let threshold = response.threshold.unwrap_or(requested_threshold);
        let total_transactions = response.total_transactions.unwrap_or(response.results.len());
        let outcomes = response
            .results
            .into_iter()
            .map(|wire| ItemOutcome::from_wire(wire, threshold))
            .collect();
        Self {
            outcomes,
            total_transactions,
            threshold,
            timestamp: response.timestamp,
        }
    }

    /// Server timestamp as UTC. Timestamps without an offset are taken as UTC.
    pub fn scored_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
