//! The workflow controller.

use super::{Transition, WorkflowOutcome, WorkflowState};
use crate::analysis::Judge;
use crate::error::{JudgeError, WorkflowError};
use crate::evaluator::EvaluatorSet;
use crate::models::{
    CandidateDecision, CandidateId, CandidateRecord, Decision, EvaluationResult, ExhaustionReport,
    InvestmentReport, Outcome,
};
use crate::pool::SharedPool;
use crate::selector::{Selection, Selector};
use chrono::Utc;
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

/// A state together with the data it carries.
enum Step {
    Start,
    Selecting,
    Evaluating(CandidateRecord),
    Judging(CandidateRecord, Vec<EvaluationResult>),
    Reporting(CandidateRecord, Vec<EvaluationResult>, Decision),
    Retrying,
    Terminated(WorkflowOutcome),
}

impl Step {
    fn state(&self) -> WorkflowState {
        match self {
            Step::Start => WorkflowState::Start,
            Step::Selecting => WorkflowState::Selecting,
            Step::Evaluating(..) => WorkflowState::Evaluating,
            Step::Judging(..) => WorkflowState::Judging,
            Step::Reporting(..) => WorkflowState::Reporting,
            Step::Retrying => WorkflowState::Retrying,
            Step::Terminated(_) => WorkflowState::Terminated,
        }
    }

    fn candidate(&self) -> Option<&CandidateId> {
        match self {
            Step::Evaluating(c) | Step::Judging(c, _) | Step::Reporting(c, _, _) => {
                Some(&c.id)
            }
            Step::Terminated(WorkflowOutcome::Invested(report)) => Some(&report.candidate.id),
            _ => None,
        }
    }
}

/// Runs selection, evaluation and judgment until a candidate is invested in
/// or the pool is exhausted.
pub struct Controller {
    pool: SharedPool,
    selector: Selector,
    evaluators: EvaluatorSet,
    judge: Judge,
    progress: Option<ProgressBar>,
    transitions: Vec<Transition>,
    held_decisions: Vec<CandidateDecision>,
    iterations: usize,
}

impl Controller {
    pub fn new(
        pool: SharedPool,
        selector: Selector,
        evaluators: EvaluatorSet,
        judge: Judge,
    ) -> Self {
        Self {
            pool,
            selector,
            evaluators,
            judge,
            progress: None,
            transitions: Vec::new(),
            held_decisions: Vec::new(),
            iterations: 0,
        }
    }

    /// Report progress on a spinner while running.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Every state change of the last run, in order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Run the workflow to completion.
    ///
    /// Each selection round consumes at least one untried candidate, so a
    /// pool of `n` candidates needs at most `n + 1` rounds. Going past that
    /// is reported as [`WorkflowError::Stalled`].
    pub async fn run(&mut self) -> Result<WorkflowOutcome, WorkflowError> {
        self.transitions.clear();
        self.held_decisions.clear();
        self.iterations = 0;

        let limit = self.pool.len().await + 1;
        let mut step = Step::Start;

        loop {
            let from = step.state();
            step = match step {
                Step::Terminated(outcome) => {
                    if let Some(ref pb) = self.progress {
                        pb.finish_and_clear();
                    }
                    return Ok(outcome);
                }
                other => {
                    let next = self.advance(other, limit).await?;
                    self.record(from, &next);
                    next
                }
            };
        }
    }

    async fn advance(&mut self, step: Step, limit: usize) -> Result<Step, WorkflowError> {
        let next = match step {
            Step::Start | Step::Retrying => Step::Selecting,

            Step::Selecting => {
                self.iterations += 1;
                if self.iterations > limit {
                    return Err(WorkflowError::Stalled {
                        iterations: self.iterations,
                        limit,
                    });
                }
                let untried = self.pool.untried_count().await;
                self.set_message(format!("Screening candidates ({} untried)...", untried));

                match self.selector.select(&self.pool).await? {
                    Selection::Selected(candidate) => Step::Evaluating(candidate),
                    Selection::Exhausted => Step::Terminated(self.exhausted().await),
                }
            }

            Step::Evaluating(candidate) => {
                self.set_message(format!("Evaluating {}...", candidate.name));
                let results = self.evaluators.evaluate_all(&candidate).await;
                for result in &results {
                    match result.score() {
                        Some(score) => {
                            debug!("{} {}: {:.1}", candidate.id, result.criterion, score)
                        }
                        None => warn!(
                            "{} {}: {}",
                            candidate.id,
                            result.criterion,
                            result.summary()
                        ),
                    }
                }
                let candidate = self.pool.mark_evaluated(&candidate.id).await?;
                Step::Judging(candidate, results)
            }

            Step::Judging(candidate, results) => match self.judge.judge(&results) {
                Ok(decision) if decision.outcome == Outcome::Invest => {
                    info!("Invest in {}: {}", candidate.name, decision.reason);
                    Step::Reporting(candidate, results, decision)
                }
                Ok(decision) => {
                    info!("Hold {}: {}", candidate.name, decision.reason);
                    self.pool
                        .mark_held(&candidate.id, decision.reason.clone())
                        .await?;
                    self.held_decisions.push(CandidateDecision {
                        id: candidate.id.clone(),
                        decision,
                    });
                    Step::Retrying
                }
                Err(e) => {
                    let annotation = incomplete_annotation(&e, &results);
                    warn!("Hold {}: {}", candidate.name, annotation);
                    self.pool.mark_held(&candidate.id, annotation).await?;
                    Step::Retrying
                }
            },

            Step::Reporting(candidate, results, decision) => {
                let candidate = self
                    .pool
                    .mark_invested(&candidate.id, decision.reason.clone())
                    .await?;
                let report = InvestmentReport {
                    generated_at: Utc::now(),
                    candidate,
                    results,
                    decision,
                    passed_over: self.pool.terminal_records().await,
                    iterations: self.iterations,
                };
                Step::Terminated(WorkflowOutcome::Invested(report))
            }

            Step::Terminated(outcome) => Step::Terminated(outcome),
        };
        Ok(next)
    }

    async fn exhausted(&self) -> WorkflowOutcome {
        WorkflowOutcome::Exhausted(ExhaustionReport {
            generated_at: Utc::now(),
            pool_size: self.pool.len().await,
            candidates: self.pool.terminal_records().await,
            held_decisions: self.held_decisions.clone(),
            iterations: self.iterations,
        })
    }

    fn record(&mut self, from: WorkflowState, next: &Step) {
        let transition = Transition {
            iteration: self.iterations,
            from,
            to: next.state(),
            candidate: next.candidate().cloned(),
        };
        debug!(
            "[{}] {} -> {}",
            transition.iteration, transition.from, transition.to
        );
        self.transitions.push(transition);
    }

    fn set_message(&self, message: String) {
        if let Some(ref pb) = self.progress {
            pb.set_message(message);
        }
    }
}

/// Held reason for a judgment that could not complete, naming the causes of
/// any inconclusive results.
fn incomplete_annotation(error: &JudgeError, results: &[EvaluationResult]) -> String {
    let causes: Vec<String> = results
        .iter()
        .filter(|r| r.is_inconclusive())
        .map(|r| format!("{}: {}", r.criterion, r.summary()))
        .collect();

    if causes.is_empty() {
        error.to_string()
    } else {
        format!("{} ({})", error, causes.join("; "))
    }
}
