//! Weighted aggregation of criterion scores into a decision.
//!
//! The judge combines the six evaluation results with fixed weights, applies
//! the configured policy for inconclusive inputs, and compares the composite
//! against the decision threshold.

use crate::error::{ConfigError, JudgeError};
use crate::models::{Contribution, Criterion, Decision, EvaluationOutcome, EvaluationResult, Outcome};
use serde::{Deserialize, Serialize};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Per-criterion weights. Must be non-negative and sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Weights {
    pub technology: f64,
    pub learning: f64,
    pub market: f64,
    pub competition: f64,
    pub growth: f64,
    pub risk: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            technology: 0.20,
            learning: 0.20,
            market: 0.25,
            competition: 0.15,
            growth: 0.10,
            risk: 0.10,
        }
    }
}

impl Weights {
    pub fn get(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Technology => self.technology,
            Criterion::Learning => self.learning,
            Criterion::Market => self.market,
            Criterion::Competition => self.competition,
            Criterion::Growth => self.growth,
            Criterion::Risk => self.risk,
        }
    }

    pub fn sum(&self) -> f64 {
        Criterion::ALL.iter().map(|&c| self.get(c)).sum()
    }

    /// Reject negative weights and sums other than 1.0. Never normalises.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for criterion in Criterion::ALL {
            let weight = self.get(criterion);
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::NegativeWeight { criterion, weight });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(())
    }
}

/// What the judge does with an inconclusive criterion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InconclusivePolicy {
    /// Fail the judgment with `IncompleteEvaluation`.
    FailFast,
    /// Use the given score in place of the missing one.
    Substitute { default_score: f64 },
}

/// Validated aggregation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Judge {
    weights: Weights,
    threshold: f64,
    policy: InconclusivePolicy,
    min_criterion_score: Option<f64>,
}

impl Judge {
    /// Build a judge. All configuration errors surface here, before any
    /// candidate is judged.
    pub fn new(
        weights: Weights,
        threshold: f64,
        policy: InconclusivePolicy,
    ) -> Result<Self, ConfigError> {
        weights.validate()?;

        if !in_score_range(threshold) {
            return Err(ConfigError::ThresholdOutOfRange(threshold));
        }
        if let InconclusivePolicy::Substitute { default_score } = policy {
            if !in_score_range(default_score) {
                return Err(ConfigError::DefaultScoreOutOfRange(default_score));
            }
        }

        Ok(Self {
            weights,
            threshold,
            policy,
            min_criterion_score: None,
        })
    }

    /// Also require every criterion to reach `floor` before investing.
    pub fn with_floor(mut self, floor: Option<f64>) -> Result<Self, ConfigError> {
        if let Some(value) = floor {
            if !in_score_range(value) {
                return Err(ConfigError::FloorOutOfRange(value));
            }
        }
        self.min_criterion_score = floor;
        Ok(self)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn policy(&self) -> InconclusivePolicy {
        self.policy
    }

    /// Combine six results into a decision.
    ///
    /// Pure: the same results always produce the same decision.
    pub fn judge(&self, results: &[EvaluationResult]) -> Result<Decision, JudgeError> {
        let mut contributions = Vec::with_capacity(Criterion::ALL.len());
        let mut missing = Vec::new();

        for criterion in Criterion::ALL {
            let mut matching = results.iter().filter(|r| r.criterion == criterion);
            let Some(result) = matching.next() else {
                missing.push(criterion);
                continue;
            };
            if matching.next().is_some() {
                return Err(JudgeError::DuplicateResult(criterion));
            }

            let (score, substituted) = match (&result.outcome, self.policy) {
                (EvaluationOutcome::Scored { score, .. }, _) => (score.clamp(0.0, 100.0), false),
                (EvaluationOutcome::Inconclusive { .. }, InconclusivePolicy::FailFast) => {
                    missing.push(criterion);
                    continue;
                }
                (
                    EvaluationOutcome::Inconclusive { .. },
                    InconclusivePolicy::Substitute { default_score },
                ) => (default_score, true),
            };

            let weight = self.weights.get(criterion);
            contributions.push(Contribution {
                criterion,
                score,
                weight,
                contribution: score * weight,
                substituted,
            });
        }

        if !missing.is_empty() {
            return Err(JudgeError::IncompleteEvaluation { missing });
        }

        let composite = round_score(contributions.iter().map(|c| c.contribution).sum::<f64>())
            .clamp(0.0, 100.0);

        let below_floor: Vec<&Contribution> = match self.min_criterion_score {
            Some(floor) => contributions.iter().filter(|c| c.score < floor).collect(),
            None => Vec::new(),
        };

        let (outcome, reason) = if composite < self.threshold {
            (
                Outcome::Hold,
                format!(
                    "composite {:.2} below threshold {:.2}",
                    composite, self.threshold
                ),
            )
        } else if !below_floor.is_empty() {
            let weak: Vec<String> = below_floor
                .iter()
                .map(|c| format!("{} ({:.1})", c.criterion, c.score))
                .collect();
            (
                Outcome::Hold,
                format!(
                    "composite {:.2} meets threshold {:.2} but {} below floor {:.1}",
                    composite,
                    self.threshold,
                    weak.join(", "),
                    self.min_criterion_score.unwrap_or_default()
                ),
            )
        } else {
            (
                Outcome::Invest,
                format!(
                    "composite {:.2} meets threshold {:.2}",
                    composite, self.threshold
                ),
            )
        };

        Ok(Decision {
            composite,
            outcome,
            threshold: self.threshold,
            contributions,
            reason,
        })
    }
}

/// The `n` lowest-scoring criteria of a decision, weakest first.
pub fn weakest_criteria(decision: &Decision, n: usize) -> Vec<&Contribution> {
    let mut sorted: Vec<&Contribution> = decision.contributions.iter().collect();
    sorted.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.criterion.cmp(&b.criterion))
    });
    sorted.truncate(n);
    sorted
}

fn in_score_range(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

// Four decimals keeps float noise from flipping a decision at the threshold.
fn round_score(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InconclusiveCause;

    fn results(scores: [f64; 6]) -> Vec<EvaluationResult> {
        Criterion::ALL
            .into_iter()
            .zip(scores)
            .map(|(c, s)| EvaluationResult::scored(c, s, "test"))
            .collect()
    }

    fn default_judge() -> Judge {
        Judge::new(Weights::default(), 70.0, InconclusivePolicy::FailFast).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!(Weights::default().validate().is_ok());
    }

    #[test]
    fn test_misconfigured_weights_fail_at_construction() {
        let weights = Weights {
            market: 0.20,
            ..Weights::default()
        };
        let err = Judge::new(weights, 70.0, InconclusivePolicy::FailFast).unwrap_err();
        match err {
            ConfigError::WeightSum { sum } => assert_close(sum, 0.95),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let weights = Weights {
            technology: -0.10,
            market: 0.55,
            ..Weights::default()
        };
        assert!(matches!(
            weights.validate(),
            Err(ConfigError::NegativeWeight {
                criterion: Criterion::Technology,
                ..
            })
        ));
    }

    #[test]
    fn test_threshold_and_default_score_ranges() {
        assert_eq!(
            Judge::new(Weights::default(), 120.0, InconclusivePolicy::FailFast).unwrap_err(),
            ConfigError::ThresholdOutOfRange(120.0)
        );
        assert_eq!(
            Judge::new(
                Weights::default(),
                70.0,
                InconclusivePolicy::Substitute {
                    default_score: -1.0
                }
            )
            .unwrap_err(),
            ConfigError::DefaultScoreOutOfRange(-1.0)
        );
        assert_eq!(
            default_judge().with_floor(Some(101.0)).unwrap_err(),
            ConfigError::FloorOutOfRange(101.0)
        );
    }

    #[test]
    fn test_strong_candidate_is_invested() {
        // tech, learning, market, competition, growth, risk
        let decision = default_judge()
            .judge(&results([80.0, 75.0, 85.0, 60.0, 50.0, 90.0]))
            .unwrap();

        assert_close(decision.composite, 75.25);
        assert_eq!(decision.outcome, Outcome::Invest);
        assert_eq!(decision.threshold, 70.0);
        assert_eq!(decision.contributions.len(), 6);
        assert_close(decision.contributions[2].contribution, 21.25);
    }

    #[test]
    fn test_weak_market_is_held() {
        let decision = default_judge()
            .judge(&results([80.0, 75.0, 40.0, 60.0, 50.0, 90.0]))
            .unwrap();

        assert_close(decision.composite, 64.0);
        assert_eq!(decision.outcome, Outcome::Hold);
        assert_eq!(decision.reason, "composite 64.00 below threshold 70.00");
    }

    #[test]
    fn test_composite_on_threshold_invests() {
        let decision = default_judge().judge(&results([70.0; 6])).unwrap();
        assert_close(decision.composite, 70.0);
        assert_eq!(decision.outcome, Outcome::Invest);
    }

    #[test]
    fn test_composite_stays_in_bounds() {
        let judge = default_judge();
        for scores in [[0.0; 6], [100.0; 6], [100.0, 0.0, 100.0, 0.0, 100.0, 0.0]] {
            let decision = judge.judge(&results(scores)).unwrap();
            assert!((0.0..=100.0).contains(&decision.composite));
        }
        assert_close(judge.judge(&results([100.0; 6])).unwrap().composite, 100.0);
    }

    #[test]
    fn test_judge_is_idempotent() {
        let judge = default_judge();
        let input = results([33.3, 71.9, 88.1, 12.5, 99.0, 64.2]);
        assert_eq!(judge.judge(&input).unwrap(), judge.judge(&input).unwrap());
    }

    #[test]
    fn test_result_order_does_not_matter() {
        let judge = default_judge();
        let input = results([80.0, 75.0, 85.0, 60.0, 50.0, 90.0]);
        let mut reversed = input.clone();
        reversed.reverse();
        assert_eq!(judge.judge(&input).unwrap(), judge.judge(&reversed).unwrap());
    }

    #[test]
    fn test_fail_fast_on_inconclusive() {
        let mut input = results([80.0, 75.0, 85.0, 60.0, 50.0, 90.0]);
        input[3] = EvaluationResult::inconclusive(
            Criterion::Competition,
            InconclusiveCause::Timeout { after_ms: 1000 },
        );

        let err = default_judge().judge(&input).unwrap_err();
        assert_eq!(
            err,
            JudgeError::IncompleteEvaluation {
                missing: vec![Criterion::Competition]
            }
        );
    }

    #[test]
    fn test_substitute_policy_uses_default_score() {
        let judge = Judge::new(
            Weights::default(),
            70.0,
            InconclusivePolicy::Substitute {
                default_score: 50.0,
            },
        )
        .unwrap();
        let mut input = results([80.0, 75.0, 85.0, 60.0, 50.0, 90.0]);
        input[3] = EvaluationResult::inconclusive(
            Criterion::Competition,
            InconclusiveCause::Timeout { after_ms: 1000 },
        );

        let decision = judge.judge(&input).unwrap();
        // 75.25 - 60*0.15 + 50*0.15
        assert_close(decision.composite, 73.75);
        assert_eq!(decision.outcome, Outcome::Invest);
        assert!(decision.contributions[3].substituted);
        assert_eq!(decision.contributions[3].score, 50.0);
    }

    #[test]
    fn test_missing_and_duplicate_results() {
        let mut input = results([50.0; 6]);
        input.pop();
        assert_eq!(
            default_judge().judge(&input).unwrap_err(),
            JudgeError::IncompleteEvaluation {
                missing: vec![Criterion::Risk]
            }
        );

        input.push(EvaluationResult::scored(Criterion::Market, 10.0, "again"));
        input.push(EvaluationResult::scored(Criterion::Risk, 10.0, "risk"));
        assert_eq!(
            default_judge().judge(&input).unwrap_err(),
            JudgeError::DuplicateResult(Criterion::Market)
        );
    }

    #[test]
    fn test_floor_rule_holds_lopsided_candidate() {
        let judge = default_judge().with_floor(Some(50.0)).unwrap();
        let decision = judge
            .judge(&results([95.0, 95.0, 95.0, 30.0, 90.0, 90.0]))
            .unwrap();

        assert!(decision.composite >= 70.0);
        assert_eq!(decision.outcome, Outcome::Hold);
        assert!(decision.reason.contains("competition (30.0)"));
    }

    #[test]
    fn test_weakest_criteria() {
        let decision = default_judge()
            .judge(&results([80.0, 75.0, 40.0, 60.0, 50.0, 90.0]))
            .unwrap();
        let weakest = weakest_criteria(&decision, 2);
        assert_eq!(weakest[0].criterion, Criterion::Market);
        assert_eq!(weakest[1].criterion, Criterion::Growth);
    }
}
