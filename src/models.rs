//! Data models for the investment screener.
//!
//! This module contains the core data structures shared by the pool,
//! selector, evaluators, judge and report writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Stable identity of a candidate within a pool.
///
/// Identities are normalised (trimmed, lowercased, inner whitespace collapsed
/// to `-`) so that "Sana Labs" and "sana  labs" collide as duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(raw: &str) -> Self {
        let normalized = raw
            .split_whitespace()
            .map(|part| part.to_lowercase())
            .collect::<Vec<_>>()
            .join("-");
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a candidate. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    /// Not yet looked at.
    Untried,
    /// Claimed by a selector; eligibility is being checked.
    Screening,
    /// Passed eligibility and is being evaluated.
    Selected,
    /// All six evaluations have returned.
    Evaluated,
    /// Judged and not invested in. Never re-selected.
    Held,
    /// Failed eligibility.
    Excluded,
    /// Judged and recommended for investment.
    Invested,
}

impl CandidateStatus {
    /// Whether moving from `self` to `next` is a legal forward step.
    pub fn can_transition_to(self, next: CandidateStatus) -> bool {
        use CandidateStatus::*;
        matches!(
            (self, next),
            (Untried, Screening)
                | (Untried, Excluded)
                | (Screening, Selected)
                | (Screening, Excluded)
                | (Selected, Evaluated)
                | (Evaluated, Held)
                | (Evaluated, Invested)
        )
    }

    /// Terminal states carry a reason and never change again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CandidateStatus::Held | CandidateStatus::Excluded | CandidateStatus::Invested
        )
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CandidateStatus::Untried => "Untried",
            CandidateStatus::Screening => "Screening",
            CandidateStatus::Selected => "Selected",
            CandidateStatus::Evaluated => "Evaluated",
            CandidateStatus::Held => "Held",
            CandidateStatus::Excluded => "Excluded",
            CandidateStatus::Invested => "Invested",
        };
        write!(f, "{}", name)
    }
}

/// Profile gathered by the crawl and extraction collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    /// Free-form description text.
    #[serde(default)]
    pub summary: String,
    /// Structured attributes (funding stage, recorded scores, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl CandidateProfile {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|v| v.trim())
    }
}

/// A startup tracked by the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: CandidateId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub profile: CandidateProfile,
    pub status: CandidateStatus,
    /// Why the candidate reached its current terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CandidateRecord {
    /// Creates an untried record whose identity is derived from the name.
    pub fn new(name: &str, profile: CandidateProfile) -> Self {
        Self {
            id: CandidateId::new(name),
            name: name.trim().to_string(),
            url: None,
            profile,
            status: CandidateStatus::Untried,
            reason: None,
        }
    }

    pub fn with_id(mut self, id: CandidateId) -> Self {
        self.id = id;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// One of the six scoring dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Technology,
    Learning,
    Market,
    Competition,
    Growth,
    Risk,
}

impl Criterion {
    /// Canonical order used for fan-out results and reports.
    pub const ALL: [Criterion; 6] = [
        Criterion::Technology,
        Criterion::Learning,
        Criterion::Market,
        Criterion::Competition,
        Criterion::Growth,
        Criterion::Risk,
    ];

    /// Key used in configuration and candidate attributes.
    pub fn key(self) -> &'static str {
        match self {
            Criterion::Technology => "technology",
            Criterion::Learning => "learning",
            Criterion::Market => "market",
            Criterion::Competition => "competition",
            Criterion::Growth => "growth",
            Criterion::Risk => "risk",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Criterion::Technology => "Technology",
            Criterion::Learning => "Learning outcome",
            Criterion::Market => "Market",
            Criterion::Competition => "Competition",
            Criterion::Growth => "Growth potential",
            Criterion::Risk => "Risk (higher = safer)",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Criterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "technology" | "tech" => Ok(Criterion::Technology),
            "learning" | "learning_effectiveness" | "learning-outcome" => Ok(Criterion::Learning),
            "market" => Ok(Criterion::Market),
            "competition" => Ok(Criterion::Competition),
            "growth" | "growth_potential" => Ok(Criterion::Growth),
            "risk" => Ok(Criterion::Risk),
            other => Err(format!("unknown criterion: {}", other)),
        }
    }
}

/// Why an evaluator could not produce a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum InconclusiveCause {
    /// The evaluator did not answer within the per-evaluator timeout.
    Timeout { after_ms: u64 },
    /// The evaluator ran but found nothing to judge.
    NoJudgment(String),
    /// The evaluator's back-end failed.
    BackendFailure(String),
}

impl fmt::Display for InconclusiveCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InconclusiveCause::Timeout { after_ms } => write!(f, "timed out after {}ms", after_ms),
            InconclusiveCause::NoJudgment(reason) => write!(f, "no judgment: {}", reason),
            InconclusiveCause::BackendFailure(reason) => write!(f, "back-end failure: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    Scored { score: f64, rationale: String },
    Inconclusive { cause: InconclusiveCause },
}

/// Result of one evaluator for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub criterion: Criterion,
    #[serde(flatten)]
    pub outcome: EvaluationOutcome,
}

impl EvaluationResult {
    /// A scored result, clamped to [0, 100]. Non-finite scores are inconclusive.
    pub fn scored(criterion: Criterion, score: f64, rationale: impl Into<String>) -> Self {
        let outcome = if score.is_finite() {
            EvaluationOutcome::Scored {
                score: score.clamp(0.0, 100.0),
                rationale: rationale.into(),
            }
        } else {
            EvaluationOutcome::Inconclusive {
                cause: InconclusiveCause::NoJudgment(format!("non-finite score {}", score)),
            }
        };
        Self { criterion, outcome }
    }

    pub fn inconclusive(criterion: Criterion, cause: InconclusiveCause) -> Self {
        Self {
            criterion,
            outcome: EvaluationOutcome::Inconclusive { cause },
        }
    }

    /// Re-applies the score bounds to a result built outside [`Self::scored`].
    pub fn normalized(self) -> Self {
        match self.outcome {
            EvaluationOutcome::Scored { score, rationale } => {
                Self::scored(self.criterion, score, rationale)
            }
            inconclusive => Self {
                criterion: self.criterion,
                outcome: inconclusive,
            },
        }
    }

    pub fn score(&self) -> Option<f64> {
        match self.outcome {
            EvaluationOutcome::Scored { score, .. } => Some(score),
            EvaluationOutcome::Inconclusive { .. } => None,
        }
    }

    pub fn is_inconclusive(&self) -> bool {
        matches!(self.outcome, EvaluationOutcome::Inconclusive { .. })
    }

    /// Rationale text, or the inconclusive cause.
    pub fn summary(&self) -> String {
        match &self.outcome {
            EvaluationOutcome::Scored { rationale, .. } => rationale.clone(),
            EvaluationOutcome::Inconclusive { cause } => format!("Inconclusive ({})", cause),
        }
    }
}

/// Outcome of a judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Invest,
    Hold,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Invest => write!(f, "Invest"),
            Outcome::Hold => write!(f, "Hold"),
        }
    }
}

/// Per-criterion share of the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub criterion: Criterion,
    /// Score that entered the sum (the default score when substituted).
    pub score: f64,
    pub weight: f64,
    pub contribution: f64,
    /// True when the evaluator was inconclusive and the default was used.
    pub substituted: bool,
}

/// The judge's verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub composite: f64,
    pub outcome: Outcome,
    pub threshold: f64,
    pub contributions: Vec<Contribution>,
    pub reason: String,
}

/// A candidate that ended Held or Excluded, with its reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalCandidate {
    pub id: CandidateId,
    pub name: String,
    pub status: CandidateStatus,
    pub reason: String,
}

/// Decision recorded for a held candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDecision {
    pub id: CandidateId,
    pub decision: Decision,
}

/// Payload emitted when a candidate is recommended for investment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentReport {
    pub generated_at: DateTime<Utc>,
    pub candidate: CandidateRecord,
    pub results: Vec<EvaluationResult>,
    pub decision: Decision,
    /// Candidates held or excluded before this one was found.
    pub passed_over: Vec<TerminalCandidate>,
    pub iterations: usize,
}

/// Payload emitted when the pool runs out of eligible candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExhaustionReport {
    pub generated_at: DateTime<Utc>,
    pub pool_size: usize,
    pub candidates: Vec<TerminalCandidate>,
    pub held_decisions: Vec<CandidateDecision>,
    pub iterations: usize,
}

impl ExhaustionReport {
    pub fn count_with_status(&self, status: CandidateStatus) -> usize {
        self.candidates.iter().filter(|c| c.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_id_normalization() {
        assert_eq!(CandidateId::new("  Sana   Labs "), CandidateId::new("sana labs"));
        assert_eq!(CandidateId::new("Riiid").as_str(), "riiid");
    }

    #[test]
    fn test_status_transitions_move_forward_only() {
        use CandidateStatus::*;
        assert!(Untried.can_transition_to(Screening));
        assert!(Screening.can_transition_to(Excluded));
        assert!(Evaluated.can_transition_to(Held));
        assert!(!Held.can_transition_to(Untried));
        assert!(!Excluded.can_transition_to(Selected));
        assert!(!Invested.can_transition_to(Held));
        assert!(!Selected.can_transition_to(Invested));
    }

    #[test]
    fn test_scored_result_is_clamped() {
        let high = EvaluationResult::scored(Criterion::Market, 140.0, "too generous");
        assert_eq!(high.score(), Some(100.0));

        let low = EvaluationResult::scored(Criterion::Market, -3.0, "too harsh");
        assert_eq!(low.score(), Some(0.0));

        let nan = EvaluationResult::scored(Criterion::Market, f64::NAN, "broken");
        assert!(nan.is_inconclusive());
    }

    #[test]
    fn test_normalized_clamps_hand_built_results() {
        let raw = EvaluationResult {
            criterion: Criterion::Risk,
            outcome: EvaluationOutcome::Scored {
                score: 250.0,
                rationale: "raw".to_string(),
            },
        };
        assert_eq!(raw.normalized().score(), Some(100.0));
    }

    #[test]
    fn test_criterion_from_str_aliases() {
        assert_eq!(
            "learning_effectiveness".parse::<Criterion>(),
            Ok(Criterion::Learning)
        );
        assert_eq!("Growth_Potential".parse::<Criterion>(), Ok(Criterion::Growth));
        assert!("vibes".parse::<Criterion>().is_err());
    }
}
