//! The six scoring evaluators and their fan-out/fan-in runner.
//!
//! Each evaluator reads a candidate snapshot and returns one bounded
//! [`EvaluationResult`]. The [`EvaluatorSet`] runs all six concurrently, gives
//! each its own timeout, and only returns once every branch has answered or
//! timed out.

pub mod recorded;

pub use recorded::RecordedEvaluator;

use crate::error::ConfigError;
use crate::models::{CandidateRecord, Criterion, EvaluationResult, InconclusiveCause};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A single scoring unit.
///
/// Implementations must not touch the pool and must return the same result
/// for the same input. A unit that cannot judge returns an inconclusive
/// result instead of guessing.
#[async_trait]
pub trait Evaluator: Send + Sync {
    fn criterion(&self) -> Criterion;

    async fn evaluate(&self, candidate: &CandidateRecord) -> EvaluationResult;
}

/// Exactly one evaluator per criterion, with a shared per-evaluator timeout.
pub struct EvaluatorSet {
    evaluators: Vec<Arc<dyn Evaluator>>,
    timeout: Duration,
}

impl std::fmt::Debug for EvaluatorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluatorSet")
            .field("criteria", &self.criteria())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl EvaluatorSet {
    /// Build a set, checking that every criterion is covered exactly once.
    pub fn new(
        evaluators: Vec<Arc<dyn Evaluator>>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        let mut ordered = Vec::with_capacity(Criterion::ALL.len());
        for criterion in Criterion::ALL {
            let matching: Vec<&Arc<dyn Evaluator>> = evaluators
                .iter()
                .filter(|e| e.criterion() == criterion)
                .collect();
            if matching.len() != 1 {
                return Err(ConfigError::EvaluatorCoverage {
                    criterion,
                    count: matching.len(),
                });
            }
            ordered.push(Arc::clone(matching[0]));
        }

        Ok(Self {
            evaluators: ordered,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn criteria(&self) -> Vec<Criterion> {
        self.evaluators.iter().map(|e| e.criterion()).collect()
    }

    /// Run every evaluator concurrently and wait for all of them.
    ///
    /// Results come back in [`Criterion::ALL`] order. A branch that exceeds
    /// the timeout becomes `Inconclusive(Timeout)` without delaying the rest.
    pub async fn evaluate_all(&self, candidate: &CandidateRecord) -> Vec<EvaluationResult> {
        let limit = self.timeout;

        let branches = self.evaluators.iter().map(|evaluator| async move {
            let criterion = evaluator.criterion();
            match tokio::time::timeout(limit, evaluator.evaluate(candidate)).await {
                Ok(result) if result.criterion == criterion => {
                    let result = result.normalized();
                    debug!(
                        "{} evaluation for {}: {}",
                        criterion,
                        candidate.name,
                        result
                            .score()
                            .map(|s| format!("{:.1}", s))
                            .unwrap_or_else(|| "inconclusive".to_string())
                    );
                    result
                }
                Ok(result) => EvaluationResult::inconclusive(
                    criterion,
                    InconclusiveCause::BackendFailure(format!(
                        "evaluator answered for {} instead of {}",
                        result.criterion, criterion
                    )),
                ),
                Err(_) => {
                    warn!(
                        "{} evaluation for {} timed out after {:?}",
                        criterion, candidate.name, limit
                    );
                    EvaluationResult::inconclusive(
                        criterion,
                        InconclusiveCause::Timeout {
                            after_ms: limit.as_millis() as u64,
                        },
                    )
                }
            }
        });

        join_all(branches).await
    }
}
