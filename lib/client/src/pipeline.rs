//! Submission pipeline
//!
//! Drives one submission through
//! `Idle -> Parsing -> Validating -> Submitting -> {Succeeded | Failed}`.
//!
//! The pipeline itself holds no result. Callers own a [`PipelineState`],
//! hand it to [`BatchPipeline::submit`] and get the next state back. Dropping
//! the future mid-flight simply abandons the submission; the caller still
//! holds nothing but the value it passed in (now consumed) and can start over
//! from [`PipelineState::Idle`].
//!
//! One pipeline runs at most one submission at a time. A second `submit`
//! while one is in flight is refused with
//! [`PipelineError::SubmissionInProgress`].

use crate::client::ScoringBackend;
use crate::config::ClientConfig;
use crate::error::{PipelineError, ScoringError};
use crate::reconcile::ScoredBatch;
use fraudscope_core::{BatchRequest, FeatureSchema, IngestionValidator};
use fraudscope_ingest::{Ingestor, RawInput};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Pipeline stage at which a submission can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Parsing,
    Validating,
    Submitting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Parsing => write!(f, "parsing"),
            Stage::Validating => write!(f, "validating"),
            Stage::Submitting => write!(f, "submitting"),
        }
    }
}

/// Why a submission failed
#[derive(Debug, Clone, PartialEq)]
pub enum FailureCause {
    Ingest(fraudscope_core::Error),
    Scoring(ScoringError),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Ingest(e) => write!(f, "{}", e),
            FailureCause::Scoring(e) => write!(f, "{}", e),
        }
    }
}

/// Terminal failure of a submission
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub stage: Stage,
    pub cause: FailureCause,
}

impl StageFailure {
    pub fn ingest(stage: Stage, error: fraudscope_core::Error) -> Self {
        Self { stage, cause: FailureCause::Ingest(error) }
    }

    pub fn scoring(error: ScoringError) -> Self {
        Self { stage: Stage::Submitting, cause: FailureCause::Scoring(error) }
    }

    /// User-facing message
    pub fn message(&self) -> String {
        self.cause.to_string()
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.cause)
    }
}

/// State of a pipeline, owned by the caller
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Parsing,
    Validating,
    Submitting,
    Succeeded(ScoredBatch),
    Failed(StageFailure),
}

impl PipelineState {
    /// Whether a new submission may start from this state
    pub fn accepts_submission(&self) -> bool {
        matches!(
            self,
            PipelineState::Idle | PipelineState::Succeeded(_) | PipelineState::Failed(_)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Succeeded(_) | PipelineState::Failed(_))
    }

    /// Drop any displayed result
    pub fn clear(self) -> Self {
        PipelineState::Idle
    }

    pub fn scored(&self) -> Option<&ScoredBatch> {
        match self {
            PipelineState::Succeeded(batch) => Some(batch),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        match self {
            PipelineState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Parsing => "parsing",
            PipelineState::Validating => "validating",
            PipelineState::Submitting => "submitting",
            PipelineState::Succeeded(_) => "succeeded",
            PipelineState::Failed(_) => "failed",
        }
    }
}

type Observer = Arc<dyn Fn(&PipelineState) + Send + Sync>;

/// Holds the pipeline's in-flight flag; released on drop, including when the
/// submission future is abandoned
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Parse, validate, submit and reconcile one batch at a time
pub struct BatchPipeline<B> {
    ingestor: Ingestor,
    validator: IngestionValidator,
    backend: B,
    observer: Option<Observer>,
    in_flight: AtomicBool,
}

impl<B: ScoringBackend> BatchPipeline<B> {
    /// Pipeline with the standard cap and threshold rules
    pub fn new(schema: Arc<FeatureSchema>, backend: B) -> Self {
        Self {
            ingestor: Ingestor::new(Arc::clone(&schema)),
            validator: IngestionValidator::new(schema),
            backend,
            observer: None,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Pipeline whose cap and threshold rules come from configuration
    pub fn from_config(schema: Arc<FeatureSchema>, config: &ClientConfig, backend: B) -> Self {
        Self {
            ingestor: Ingestor::new(Arc::clone(&schema)).with_max_rows(config.max_batch_size),
            validator: config.validator(schema),
            backend,
            observer: None,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Called on every state the submission enters
    #[must_use]
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&PipelineState) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether a submission is currently running on this pipeline
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Parse and validate without submitting
    pub fn prepare(&self, input: &RawInput, threshold: Option<f64>) -> Result<BatchRequest, StageFailure> {
        self.enter(PipelineState::Parsing);
        let vectors = self
            .ingestor
            .parse(input)
            .map_err(|e| StageFailure::ingest(Stage::Parsing, e))?;

        self.enter(PipelineState::Validating);
        self.validator
            .validate(vectors, threshold)
            .map_err(|e| StageFailure::ingest(Stage::Validating, e))
    }

    /// Run one submission from `state`
    ///
    /// Returns the terminal state, or hands `state` back inside the error if
    /// it belongs to a submission that has not finished or another submission
    /// is already running on this pipeline.
    pub async fn submit(
        &self,
        state: PipelineState,
        input: RawInput,
        threshold: Option<f64>,
    ) -> Result<PipelineState, PipelineError> {
        if !state.accepts_submission() {
            return Err(PipelineError::SubmissionInProgress(state));
        }
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            warn!("Refusing submission: another one is in flight");
            return Err(PipelineError::SubmissionInProgress(state));
        };
        drop(state);

        let span = info_span!("submission", id = %Uuid::new_v4());
        let next = async {
            let request = match self.prepare(&input, threshold) {
                Ok(request) => request,
                Err(failure) => return self.fail(failure),
            };
            drop(input);

            self.enter(PipelineState::Submitting);
            info!("Submitting {} transactions, threshold {}", request.len(), request.threshold());
            match self.backend.score_batch(&request).await {
                Ok(result) => {
                    let batch = ScoredBatch::reconcile(&result, request.transactions());
                    info!(
                        "Batch scored: {} ok, {} failed, {} flagged",
                        batch.summary.scored, batch.summary.failed, batch.summary.flagged
                    );
                    self.enter(PipelineState::Succeeded(batch))
                }
                Err(e) => self.fail(StageFailure::scoring(e)),
            }
        }
        .instrument(span)
        .await;

        Ok(next)
    }

    fn fail(&self, failure: StageFailure) -> PipelineState {
        warn!("Submission {}", failure);
        self.enter(PipelineState::Failed(failure))
    }

    fn enter(&self, state: PipelineState) -> PipelineState {
        debug!("Pipeline state: {}", state.name());
        if let Some(observer) = &self.observer {
            observer(&state);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{BatchResult, ItemOutcome, Score};
    use fraudscope_core::{Error, FieldSpec};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scores every transaction by its Amount; negative amounts fail
    #[derive(Default)]
    struct AmountBackend {
        calls: AtomicUsize,
        unavailable: bool,
        delay: Option<Duration>,
    }

    impl ScoringBackend for AmountBackend {
        async fn score_batch(&self, request: &BatchRequest) -> Result<BatchResult, ScoringError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.unavailable {
                return Err(ScoringError::Server { status: 503, message: "Model not loaded".to_string() });
            }
            let outcomes = request
                .transactions()
                .iter()
                .enumerate()
                .rev()
                .map(|(i, tx)| match tx.get("Amount") {
                    Some(amount) if amount < 0.0 => ItemOutcome::failed(i, "Amount cannot be negative"),
                    Some(amount) => ItemOutcome::scored(
                        i,
                        Score {
                            fraud_score: (amount / 1000.0).min(1.0),
                            is_fraud: amount / 1000.0 >= request.threshold(),
                            confidence: 1.0,
                            risk_level: None,
                        },
                    ),
                    None => ItemOutcome::failed(i, "missing Amount"),
                })
                .collect();
            Ok(BatchResult {
                outcomes,
                total_transactions: request.len(),
                threshold: request.threshold(),
                timestamp: None,
            })
        }
    }

    fn schema() -> Arc<FeatureSchema> {
        Arc::new(FeatureSchema::new(vec![FieldSpec::number("Amount", 1.0)]).unwrap())
    }

    fn csv(text: &str) -> RawInput {
        RawInput::Tabular(text.to_string())
    }

    #[tokio::test]
    async fn test_success_with_item_failure() {
        let pipeline = BatchPipeline::new(schema(), AmountBackend::default());
        let state = pipeline
            .submit(PipelineState::Idle, csv("Amount\n100\n-5\n900\n"), Some(0.8))
            .await
            .unwrap();

        let batch = state.scored().expect("batch should succeed");
        assert_eq!(batch.rows.len(), 3);
        assert_eq!(batch.rows[0].fraud_score(), Some(0.1));
        assert!(!batch.rows[1].is_scored());
        assert_eq!(batch.rows[2].fraud_score(), Some(0.9));
        assert_eq!(batch.summary.flagged, 1);
        assert_eq!(batch.threshold, 0.8);
    }

    #[tokio::test]
    async fn test_oversized_batch_never_submitted() {
        let pipeline = BatchPipeline::new(schema(), AmountBackend::default());
        let mut text = String::from("Amount\n");
        for i in 0..101 {
            text.push_str(&format!("{}\n", i));
        }

        let state = pipeline.submit(PipelineState::Idle, csv(&text), None).await.unwrap();
        let failure = state.failure().expect("batch should fail");
        assert_eq!(failure.stage, Stage::Parsing);
        assert_eq!(
            failure.cause,
            FailureCause::Ingest(Error::BatchTooLarge { limit: 100, actual: 101 })
        );
        assert_eq!(pipeline.backend().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_threshold_fails_validation() {
        let pipeline = BatchPipeline::new(schema(), AmountBackend::default());
        let state = pipeline
            .submit(PipelineState::Idle, csv("Amount\n1\n"), Some(2.0))
            .await
            .unwrap();
        let failure = state.failure().unwrap();
        assert_eq!(failure.stage, Stage::Validating);
        assert_eq!(pipeline.backend().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_terminal() {
        let backend = AmountBackend { unavailable: true, ..Default::default() };
        let pipeline = BatchPipeline::new(schema(), backend);
        let state = pipeline
            .submit(PipelineState::Idle, csv("Amount\n1\n"), None)
            .await
            .unwrap();

        let failure = state.failure().unwrap();
        assert_eq!(failure.stage, Stage::Submitting);
        assert!(failure.message().contains("Model not loaded"));
    }

    #[tokio::test]
    async fn test_rejects_submission_in_progress() {
        let pipeline = BatchPipeline::new(schema(), AmountBackend::default());
        let err = pipeline
            .submit(PipelineState::Submitting, csv("Amount\n1\n"), None)
            .await
            .unwrap_err();
        assert_eq!(err.into_state(), PipelineState::Submitting);
        assert_eq!(pipeline.backend().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_submission_refused() {
        let backend = AmountBackend { delay: Some(Duration::from_millis(50)), ..Default::default() };
        let pipeline = BatchPipeline::new(schema(), backend);

        let (first, second) = tokio::join!(
            pipeline.submit(PipelineState::Idle, csv("Amount\n1\n"), None),
            pipeline.submit(PipelineState::Idle, csv("Amount\n2\n"), None),
        );
        assert!(first.unwrap().scored().is_some());
        assert_eq!(second.unwrap_err().into_state(), PipelineState::Idle);
        assert_eq!(pipeline.backend().calls.load(Ordering::SeqCst), 1);
        assert!(!pipeline.is_submitting());
    }

    #[tokio::test]
    async fn test_abandoned_submission_releases_pipeline() {
        let backend = AmountBackend { delay: Some(Duration::from_millis(200)), ..Default::default() };
        let pipeline = BatchPipeline::new(schema(), backend);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            pipeline.submit(PipelineState::Idle, csv("Amount\n1\n"), None),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(!pipeline.is_submitting());

        let retry = pipeline.submit(PipelineState::Idle, csv("Amount\n2\n"), None);
        let state = tokio::time::timeout(Duration::from_secs(5), retry).await.unwrap().unwrap();
        assert!(state.scored().is_some());
    }

    #[tokio::test]
    async fn test_resubmit_from_terminal_states() {
        let pipeline = BatchPipeline::new(schema(), AmountBackend::default());
        let failed = pipeline
            .submit(PipelineState::Idle, csv("Amount\nabc\n"), None)
            .await
            .unwrap();
        assert!(failed.failure().is_some());

        let succeeded = pipeline.submit(failed, csv("Amount\n1\n"), None).await.unwrap();
        assert!(succeeded.scored().is_some());

        let again = pipeline.submit(succeeded, csv("Amount\n2\n"), None).await.unwrap();
        assert!(again.is_terminal());
        assert_eq!(again.clear(), PipelineState::Idle);
    }

    #[tokio::test]
    async fn test_observer_sees_every_transition() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let pipeline = BatchPipeline::new(schema(), AmountBackend::default())
            .with_observer(move |state| sink.lock().unwrap().push(state.name()));

        pipeline
            .submit(PipelineState::Idle, csv("Amount\n1\n"), None)
            .await
            .unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["parsing", "validating", "submitting", "succeeded"]
        );
    }

    #[tokio::test]
    async fn test_config_caps_apply() {
        let config = ClientConfig { max_batch_size: 2, ..ClientConfig::default() };
        let pipeline = BatchPipeline::from_config(schema(), &config, AmountBackend::default());
        let state = pipeline
            .submit(PipelineState::Idle, RawInput::Structured(r#"[{"Amount":1},{"Amount":2},{"Amount":3}]"#.to_string()), None)
            .await
            .unwrap();
        assert!(matches!(
            state.failure().map(|f| &f.cause),
            Some(FailureCause::Ingest(Error::BatchTooLarge { limit: 2, actual: 3 }))
        ));
    }
}
