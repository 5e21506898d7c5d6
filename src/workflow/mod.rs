//! Workflow state machine.
//!
//! The controller drives `Start -> Selecting -> Evaluating -> Judging`, then
//! either `Reporting` (invest) or `Retrying` (hold, back to `Selecting`),
//! until a candidate is invested in or the pool runs dry.

pub mod controller;

pub use controller::Controller;

use crate::models::{CandidateId, ExhaustionReport, InvestmentReport};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Start,
    Selecting,
    Evaluating,
    Judging,
    Reporting,
    Retrying,
    Terminated,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Start => "Start",
            WorkflowState::Selecting => "Selecting",
            WorkflowState::Evaluating => "Evaluating",
            WorkflowState::Judging => "Judging",
            WorkflowState::Reporting => "Reporting",
            WorkflowState::Retrying => "Retrying",
            WorkflowState::Terminated => "Terminated",
        };
        write!(f, "{}", name)
    }
}

/// One recorded state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Selection round the transition belongs to (0 before the first).
    pub iteration: usize,
    pub from: WorkflowState,
    pub to: WorkflowState,
    pub candidate: Option<CandidateId>,
}

/// How a workflow run ended.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "report", rename_all = "snake_case")]
pub enum WorkflowOutcome {
    Invested(InvestmentReport),
    Exhausted(ExhaustionReport),
}

impl WorkflowOutcome {
    pub fn is_invested(&self) -> bool {
        matches!(self, WorkflowOutcome::Invested(_))
    }

    pub fn iterations(&self) -> usize {
        match self {
            WorkflowOutcome::Invested(report) => report.iterations,
            WorkflowOutcome::Exhausted(report) => report.iterations,
        }
    }
}
