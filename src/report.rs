//! Plain-text rendering of scored batches

use fraudscope_client::{PredictResult, RiskLevel, RowStatus, ScoredBatch};
use std::fmt;

/// Render reconciled rows as a fixed-width table followed by a summary line
pub fn render_table(batch: &ScoredBatch) -> String {
    BatchTable(batch).to_string()
}

/// Render a single-transaction result as one line
pub fn render_prediction(result: &PredictResult) -> String {
    let score = &result.score;
    let mut line = format!(
        "score {:.4}, fraud {}, confidence {:.4}, risk {}, threshold {}",
        score.fraud_score,
        if score.is_fraud { "yes" } else { "no" },
        score.confidence,
        score
            .risk_level
            .clone()
            .unwrap_or_else(|| RiskLevel::from_score(score.fraud_score).label().to_string()),
        result.threshold
    );
    if let Some(timestamp) = &result.timestamp {
        line.push_str(&format!(", scored at {}", timestamp));
    }
    line.push('\n');
    line
}

struct BatchTable<'a>(&'a ScoredBatch);

impl fmt::Display for BatchTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let batch = self.0;
        writeln!(
            f,
            "{:>4}  {:>7}  {:<5}  {:>10}  {:<10}  {}",
            "#", "score", "fraud", "confidence", "risk", "note"
        )?;

        for row in &batch.rows {
            match &row.status {
                RowStatus::Scored {
                    fraud_score,
                    is_fraud,
                    confidence,
                    risk_label,
                } => writeln!(
                    f,
                    "{:>4}  {:>7.4}  {:<5}  {:>10.4}  {:<10}  ok",
                    row.position,
                    fraud_score,
                    if *is_fraud { "yes" } else { "no" },
                    confidence,
                    risk_label
                )?,
                RowStatus::Failed { error } => writeln!(
                    f,
                    "{:>4}  {:>7}  {:<5}  {:>10}  {:<10}  error: {}",
                    row.position, "-", "-", "-", "-", error
                )?,
            }
        }

        let summary = &batch.summary;
        write!(
            f,
            "\n{} transactions: {} scored, {} failed, {} flagged at threshold {}",
            summary.total, summary.scored, summary.failed, summary.flagged, batch.threshold
        )?;
        if let (Some(mean), Some(max)) = (summary.mean_score, summary.max_score) {
            write!(f, " (mean score {:.4}, max {:.4})", mean, max)?;
        }
        if let Some(timestamp) = &batch.timestamp {
            write!(f, ", scored at {}", timestamp)?;
        }
        writeln!(f)
    }
}
