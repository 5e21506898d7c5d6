//! Evaluators backed by scores recorded in the candidate file.
//!
//! Used for offline runs and replays: the crawler (or an earlier run) stores
//! `score.<criterion>` and optionally `rationale.<criterion>` attributes.

use super::Evaluator;
use crate::models::{CandidateRecord, Criterion, EvaluationResult, InconclusiveCause};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RecordedEvaluator {
    criterion: Criterion,
}

impl RecordedEvaluator {
    pub fn new(criterion: Criterion) -> Self {
        Self { criterion }
    }

    /// One recorded evaluator per criterion.
    pub fn full_set() -> Vec<Arc<dyn Evaluator>> {
        Criterion::ALL
            .into_iter()
            .map(|c| Arc::new(Self::new(c)) as Arc<dyn Evaluator>)
            .collect()
    }
}

#[async_trait]
impl Evaluator for RecordedEvaluator {
    fn criterion(&self) -> Criterion {
        self.criterion
    }

    async fn evaluate(&self, candidate: &CandidateRecord) -> EvaluationResult {
        let key = self.criterion.key();
        let profile = &candidate.profile;

        let Some(raw) = profile.attribute(&format!("score.{}", key)) else {
            return EvaluationResult::inconclusive(
                self.criterion,
                InconclusiveCause::NoJudgment("no recorded score".to_string()),
            );
        };

        match raw.parse::<f64>() {
            Ok(score) => {
                let rationale = profile
                    .attribute(&format!("rationale.{}", key))
                    .filter(|r| !r.is_empty())
                    .unwrap_or("Recorded score")
                    .to_string();
                EvaluationResult::scored(self.criterion, score, rationale)
            }
            Err(_) => EvaluationResult::inconclusive(
                self.criterion,
                InconclusiveCause::NoJudgment(format!("unreadable recorded score '{}'", raw)),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateProfile;

    fn candidate(attrs: &[(&str, &str)]) -> CandidateRecord {
        let mut profile = CandidateProfile::default();
        for (k, v) in attrs {
            profile.attributes.insert(k.to_string(), v.to_string());
        }
        CandidateRecord::new("Squirrel AI", profile)
    }

    #[tokio::test]
    async fn test_reads_score_and_rationale() {
        let record = candidate(&[
            ("score.market", "85"),
            ("rationale.market", "Large K-12 tutoring market"),
        ]);
        let result = RecordedEvaluator::new(Criterion::Market)
            .evaluate(&record)
            .await;

        assert_eq!(result.score(), Some(85.0));
        assert_eq!(result.summary(), "Large K-12 tutoring market");
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_clamped() {
        let record = candidate(&[("score.risk", "130")]);
        let result = RecordedEvaluator::new(Criterion::Risk).evaluate(&record).await;
        assert_eq!(result.score(), Some(100.0));
    }

    #[tokio::test]
    async fn test_missing_or_bad_score_is_inconclusive() {
        let record = candidate(&[("score.growth", "fast")]);

        let missing = RecordedEvaluator::new(Criterion::Technology)
            .evaluate(&record)
            .await;
        assert!(missing.is_inconclusive());

        let bad = RecordedEvaluator::new(Criterion::Growth)
            .evaluate(&record)
            .await;
        assert!(bad.is_inconclusive());
        assert!(bad.summary().contains("unreadable"));
    }

    #[test]
    fn test_full_set_covers_all_criteria() {
        let set = RecordedEvaluator::full_set();
        let criteria: Vec<_> = set.iter().map(|e| e.criterion()).collect();
        assert_eq!(criteria, Criterion::ALL.to_vec());
    }
}
