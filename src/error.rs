//! Domain error types.
//!
//! Pool, judge, configuration and workflow failures are typed so the
//! controller can react to them; everything at the application edge is
//! wrapped in `anyhow` with context.

use crate::models::{CandidateId, CandidateStatus, Criterion};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    #[error("Duplicate candidate key: {0}")]
    DuplicateKey(CandidateId),

    #[error("Invalid transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: CandidateId,
        from: CandidateStatus,
        to: CandidateStatus,
    },

    #[error("Unknown candidate: {0}")]
    UnknownCandidate(CandidateId),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JudgeError {
    #[error("incomplete evaluation: missing {}", join_criteria(.missing))]
    IncompleteEvaluation { missing: Vec<Criterion> },

    #[error("duplicate evaluation result for {0}")]
    DuplicateResult(Criterion),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Scoring weights must sum to 1.0 (got {sum:.4})")]
    WeightSum { sum: f64 },

    #[error("Weight for {criterion} must be non-negative (got {weight})")]
    NegativeWeight { criterion: Criterion, weight: f64 },

    #[error("Decision threshold must be within [0, 100] (got {0})")]
    ThresholdOutOfRange(f64),

    #[error("Default score must be within [0, 100] (got {0})")]
    DefaultScoreOutOfRange(f64),

    #[error("Minimum criterion score must be within [0, 100] (got {0})")]
    FloorOutOfRange(f64),

    #[error("Evaluator timeout must be at least 1 second")]
    ZeroTimeout,

    #[error("Expected exactly one evaluator for {criterion} (got {count})")]
    EvaluatorCoverage { criterion: Criterion, count: usize },
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Pool integrity error: {0}")]
    Pool(#[from] PoolError),

    #[error("Workflow made no progress after {iterations} iterations (limit {limit})")]
    Stalled { iterations: usize, limit: usize },
}

fn join_criteria(criteria: &[Criterion]) -> String {
    criteria
        .iter()
        .map(|c| c.key())
        .collect::<Vec<_>>()
        .join(", ")
}
