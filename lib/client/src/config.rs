//! Client configuration
//!
//! Loaded from an optional TOML file; the binary layers CLI flags and
//! environment variables on top.

use crate::error::ScoringError;
use fraudscope_core::{FeatureSchema, IngestionValidator, ThresholdPolicy, DEFAULT_THRESHOLD, MAX_BATCH_SIZE};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Path of the batch scoring endpoint, relative to the base URL
pub const BATCH_ENDPOINT: &str = "predict/batch";

/// Path of the single-transaction endpoint, relative to the base URL
pub const PREDICT_ENDPOINT: &str = "predict";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the scoring service
    pub base_url: String,
    /// Request timeout, enforced by the HTTP transport
    pub timeout_secs: u64,
    /// Threshold applied when a submission does not carry one
    pub default_threshold: f64,
    /// Batch cap; may lower the standard cap of 100 but never raise it
    pub max_batch_size: usize,
    pub threshold_policy: ThresholdPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_threshold: DEFAULT_THRESHOLD,
            max_batch_size: MAX_BATCH_SIZE,
            threshold_policy: ThresholdPolicy::Reject,
        }
    }
}

impl ClientConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ScoringError> {
        let config: Self = toml::from_str(text).map_err(|e| ScoringError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ScoringError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        self.endpoint()?;
        if self.timeout_secs == 0 {
            return Err(ScoringError::Config("timeout_secs must be greater than 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.default_threshold) {
            return Err(ScoringError::Config(format!(
                "default_threshold must be between 0 and 1, got {}",
                self.default_threshold
            )));
        }
        if self.max_batch_size == 0 || self.max_batch_size > MAX_BATCH_SIZE {
            return Err(ScoringError::Config(format!(
                "max_batch_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.max_batch_size
            )));
        }
        Ok(())
    }

    /// Full URL of the batch scoring endpoint
    pub fn endpoint(&self) -> Result<Url, ScoringError> {
        self.endpoint_for(BATCH_ENDPOINT)
    }

    /// Full URL of the single-transaction endpoint
    pub fn predict_endpoint(&self) -> Result<Url, ScoringError> {
        self.endpoint_for(PREDICT_ENDPOINT)
    }

    fn endpoint_for(&self, path: &str) -> Result<Url, ScoringError> {
        let base = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let url = Url::parse(&base)
            .map_err(|e| ScoringError::Config(format!("invalid base_url '{}': {}", self.base_url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ScoringError::Config(format!("unsupported URL scheme '{}'", other))),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the ingestion validator this configuration describes
    pub fn validator(&self, schema: Arc<FeatureSchema>) -> IngestionValidator {
        IngestionValidator::new(schema)
            .with_max_batch_size(self.max_batch_size)
            .with_default_threshold(self.default_threshold)
            .with_threshold_policy(self.threshold_policy)
    }
}
