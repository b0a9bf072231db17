//! HTTP scoring client
//!
//! One POST per batch or single transaction, no retries. Per-item errors stay inside the returned
//! [`BatchResult`]; anything that makes the response unusable as a whole is a
//! [`ScoringError`].

use crate::config::ClientConfig;
use crate::error::ScoringError;
use crate::wire::{BatchResult, PredictResponse, PredictResult, Score, ScoreEnvelope, INCOMPLETE_RESULT};
use fraudscope_core::{BatchRequest, TransactionRequest};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use std::future::Future;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("fraudscope/", env!("CARGO_PKG_VERSION"));

/// Anything that can score a validated batch
pub trait ScoringBackend {
    fn score_batch(&self, request: &BatchRequest) -> impl Future<Output = Result<BatchResult, ScoringError>> + Send;
}

/// Scoring backend talking to the remote service over HTTP
#[derive(Debug, Clone)]
pub struct ScoringClient {
    http_client: reqwest::Client,
    endpoint: Url,
    predict_endpoint: Url,
}

impl ScoringClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ScoringError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint()?,
            predict_endpoint: config.predict_endpoint()?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn predict_endpoint(&self) -> &Url {
        &self.predict_endpoint
    }

    /// Score one transaction against the single-transaction endpoint
    pub async fn score_one(&self, request: &TransactionRequest) -> Result<PredictResult, ScoringError> {
        info!("Scoring one transaction at {}", self.predict_endpoint);
        let body = self.post_json(&self.predict_endpoint, request).await?;

        let response: PredictResponse =
            serde_json::from_str(&body).map_err(|e| ScoringError::Decode(e.to_string()))?;
        if let Some(error) = response.error {
            return Err(ScoringError::Rejected(error));
        }

        let threshold = response.threshold.unwrap_or(request.threshold());
        let score = Score::from_parts(
            response.fraud_score,
            response.is_fraud,
            response.confidence,
            response.risk_level,
            threshold,
        )
        .ok_or_else(|| ScoringError::Decode(INCOMPLETE_RESULT.to_string()))?;

        Ok(PredictResult {
            score,
            threshold,
            timestamp: response.timestamp,
        })
    }

    /// POST a JSON body and return the response text of a successful call
    async fn post_json<T: Serialize + ?Sized>(&self, url: &Url, body: &T) -> Result<String, ScoringError> {
        let response = self
            .http_client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| ScoringError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ScoringError::Network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(ScoringError::Server {
                status: status.as_u16(),
                message: server_message(&text).unwrap_or_else(|| generic_message(status)),
            });
        }
        Ok(text)
    }
}

impl ScoringBackend for ScoringClient {
    async fn score_batch(&self, request: &BatchRequest) -> Result<BatchResult, ScoringError> {
        info!("Scoring {} transactions at {}", request.len(), self.endpoint);

        let body = self.post_json(&self.endpoint, request).await?;

        match serde_json::from_str::<ScoreEnvelope>(&body) {
            Ok(ScoreEnvelope::Rejected { error }) => Err(ScoringError::Rejected(error)),
            Ok(ScoreEnvelope::Accepted(response)) => {
                let result = BatchResult::from_response(response, request.threshold());
                if result.total_transactions != request.len() {
                    warn!(
                        "Scoring service reports {} transactions, {} were submitted",
                        result.total_transactions,
                        request.len()
                    );
                }
                debug!(
                    "Received {} outcomes for {} transactions",
                    result.outcomes.len(),
                    request.len()
                );
                Ok(result)
            }
            Err(e) => Err(ScoringError::Decode(e.to_string())),
        }
    }
}

/// The `error` text of a JSON error body, if there is one
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("error")?.as_str().map(str::to_string)
}

fn generic_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("request failed with HTTP {} {}", status.as_u16(), reason),
        None => format!("request failed with HTTP {}", status.as_u16()),
    }
}
