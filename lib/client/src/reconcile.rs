//! Result reconciliation
//!
//! Places every returned outcome back onto the input row it belongs to, using
//! only the zero-based `transaction_id` the service echoes. Rows are never
//! renumbered: row `n` always shows input `n`.

use crate::wire::{BatchResult, ItemOutcome, Outcome};
use fraudscope_core::FeatureVector;
use serde::Serialize;
use tracing::warn;

/// Shown for inputs the service returned nothing for
pub const NO_RESULT_MESSAGE: &str = "no result returned for this transaction";

/// Risk band derived from a fraud score
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 0.1 {
            RiskLevel::VeryLow
        } else if score < 0.3 {
            RiskLevel::Low
        } else if score < 0.7 {
            RiskLevel::Medium
        } else if score < 0.9 {
            RiskLevel::High
        } else {
            RiskLevel::VeryHigh
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "Very low",
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very high",
        }
    }
}

/// Display status of one row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowStatus {
    Scored {
        fraud_score: f64,
        is_fraud: bool,
        confidence: f64,
        risk_label: String,
    },
    Failed {
        error: String,
    },
}

/// A display-ready row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRow {
    /// 1-based position of the input row
    pub position: usize,
    #[serde(flatten)]
    pub status: RowStatus,
}

impl ReconciledRow {
    pub fn is_scored(&self) -> bool {
        matches!(self.status, RowStatus::Scored { .. })
    }

    pub fn fraud_score(&self) -> Option<f64> {
        match self.status {
            RowStatus::Scored { fraud_score, .. } => Some(fraud_score),
            RowStatus::Failed { .. } => None,
        }
    }
}

impl From<&Outcome> for RowStatus {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Scored(score) => RowStatus::Scored {
                fraud_score: score.fraud_score,
                is_fraud: score.is_fraud,
                confidence: score.confidence,
                risk_label: score
                    .risk_level
                    .clone()
                    .unwrap_or_else(|| RiskLevel::from_score(score.fraud_score).label().to_string()),
            },
            Outcome::Failed(error) => RowStatus::Failed { error: error.clone() },
        }
    }
}

/// Map outcomes onto input rows
///
/// Outcomes pointing past the input or repeating an index are dropped (first
/// one wins); inputs with no outcome get a [`NO_RESULT_MESSAGE`] failure.
pub fn reconcile(result: &BatchResult, inputs: &[FeatureVector]) -> Vec<ReconciledRow> {
    let mut slots: Vec<Option<&ItemOutcome>> = vec![None; inputs.len()];

    for item in &result.outcomes {
        match slots.get_mut(item.transaction_id) {
            None => warn!(
                "Dropping outcome for transaction {}: batch has only {} rows",
                item.transaction_id,
                inputs.len()
            ),
            Some(Some(_)) => warn!("Dropping duplicate outcome for transaction {}", item.transaction_id),
            Some(slot) => *slot = Some(item),
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| ReconciledRow {
            position: i + 1,
            status: match slot {
                Some(item) => RowStatus::from(&item.outcome),
                None => RowStatus::Failed {
                    error: NO_RESULT_MESSAGE.to_string(),
                },
            },
        })
        .collect()
}

/// Aggregate figures over reconciled rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub scored: usize,
    pub failed: usize,
    /// Rows classified as fraud
    pub flagged: usize,
    pub mean_score: Option<f64>,
    pub max_score: Option<f64>,
}

impl BatchSummary {
    pub fn compute(rows: &[ReconciledRow]) -> Self {
        let scores: Vec<f64> = rows.iter().filter_map(ReconciledRow::fraud_score).collect();
        let flagged = rows
            .iter()
            .filter(|r| matches!(r.status, RowStatus::Scored { is_fraud: true, .. }))
            .count();

        let mean_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };
        let max_score = scores.iter().copied().reduce(f64::max);

        Self {
            total: rows.len(),
            scored: scores.len(),
            failed: rows.len() - scores.len(),
            flagged,
            mean_score,
            max_score,
        }
    }
}

/// Reconciled output of one successful submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredBatch {
    pub rows: Vec<ReconciledRow>,
    pub summary: BatchSummary,
    pub threshold: f64,
    pub timestamp: Option<String>,
}

impl ScoredBatch {
    pub fn reconcile(result: &BatchResult, inputs: &[FeatureVector]) -> Self {
        let rows = reconcile(result, inputs);
        let summary = BatchSummary::compute(&rows);
        Self {
            rows,
            summary,
            threshold: result.threshold,
            timestamp: result.timestamp.clone(),
        }
    }
}
