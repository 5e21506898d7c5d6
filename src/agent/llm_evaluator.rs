//! Evaluators that ask a chat model to rate a candidate.

use super::ollama::ChatBackend;
use super::prompts::{evaluation_prompt, EVALUATOR_SYSTEM_PROMPT};
use super::scoring::extract_score;
use crate::evaluator::Evaluator;
use crate::models::{CandidateRecord, Criterion, EvaluationResult, InconclusiveCause};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct LlmEvaluator {
    criterion: Criterion,
    backend: Arc<dyn ChatBackend>,
}

impl LlmEvaluator {
    pub fn new(criterion: Criterion, backend: Arc<dyn ChatBackend>) -> Self {
        Self { criterion, backend }
    }

    /// One evaluator per criterion, all sharing the same back-end.
    pub fn full_set(backend: Arc<dyn ChatBackend>) -> Vec<Arc<dyn Evaluator>> {
        Criterion::ALL
            .into_iter()
            .map(|c| Arc::new(Self::new(c, Arc::clone(&backend))) as Arc<dyn Evaluator>)
            .collect()
    }
}

#[async_trait]
impl Evaluator for LlmEvaluator {
    fn criterion(&self) -> Criterion {
        self.criterion
    }

    async fn evaluate(&self, candidate: &CandidateRecord) -> EvaluationResult {
        let prompt = evaluation_prompt(self.criterion, candidate);

        let reply = match self.backend.chat(EVALUATOR_SYSTEM_PROMPT, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("{} evaluation of {} failed: {:#}", self.criterion, candidate.id, e);
                return EvaluationResult::inconclusive(
                    self.criterion,
                    InconclusiveCause::BackendFailure(format!("{:#}", e)),
                );
            }
        };

        match extract_score(&reply) {
            Some(score) => {
                debug!("{} scored {} on {}", candidate.id, score, self.criterion);
                EvaluationResult::scored(self.criterion, f64::from(score), reply.trim())
            }
            None => EvaluationResult::inconclusive(
                self.criterion,
                InconclusiveCause::NoJudgment("model reply contained no score".to_string()),
            ),
        }
    }
}
