//! Candidate selection behind the eligibility gate.
//!
//! The selector claims untried candidates from the pool one at a time and
//! screens each against six pass/fail criteria. The gate is conjunctive: a
//! candidate that fails any criterion (or that the screen could not assess)
//! is excluded and the selector moves on to the next one.

pub mod recorded;

pub use recorded::RecordedScreen;

use crate::error::PoolError;
use crate::models::CandidateRecord;
use crate::pool::SharedPool;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// Pass/fail criteria applied before any scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityCriterion {
    /// A clear purpose aimed at fast expansion and market capture.
    Purpose,
    /// Growth rate well above the sector average.
    GrowthSpeed,
    /// Novel, hard-to-copy technology or business model.
    Idea,
    /// Accepts the high market and technology uncertainty of a venture bet.
    Uncertainty,
    /// Funded by outside investment (VC, angels).
    Funding,
    /// Stated end goal is an exit via M&A or IPO.
    FinalGoal,
}

impl EligibilityCriterion {
    pub const ALL: [EligibilityCriterion; 6] = [
        EligibilityCriterion::Purpose,
        EligibilityCriterion::GrowthSpeed,
        EligibilityCriterion::Idea,
        EligibilityCriterion::Uncertainty,
        EligibilityCriterion::Funding,
        EligibilityCriterion::FinalGoal,
    ];

    pub fn key(self) -> &'static str {
        match self {
            EligibilityCriterion::Purpose => "purpose",
            EligibilityCriterion::GrowthSpeed => "growth_speed",
            EligibilityCriterion::Idea => "idea",
            EligibilityCriterion::Uncertainty => "uncertainty",
            EligibilityCriterion::Funding => "funding",
            EligibilityCriterion::FinalGoal => "final_goal",
        }
    }
}

impl fmt::Display for EligibilityCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for EligibilityCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        EligibilityCriterion::ALL
            .into_iter()
            .find(|c| c.key() == normalized)
            .ok_or_else(|| format!("unknown eligibility criterion: {}", s))
    }
}

/// Verdict for one eligibility criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionCheck {
    pub criterion: EligibilityCriterion,
    pub passed: bool,
    pub note: String,
}

impl CriterionCheck {
    pub fn pass(criterion: EligibilityCriterion, note: impl Into<String>) -> Self {
        Self {
            criterion,
            passed: true,
            note: note.into(),
        }
    }

    pub fn fail(criterion: EligibilityCriterion, note: impl Into<String>) -> Self {
        Self {
            criterion,
            passed: false,
            note: note.into(),
        }
    }
}

/// Aggregated eligibility of one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Eligibility {
    checks: Vec<CriterionCheck>,
}

impl Eligibility {
    /// Fold screen output into a verdict. A criterion the screen did not
    /// report on counts as failed.
    pub fn assess(mut checks: Vec<CriterionCheck>) -> Self {
        for criterion in EligibilityCriterion::ALL {
            if !checks.iter().any(|c| c.criterion == criterion) {
                checks.push(CriterionCheck::fail(criterion, "not assessed"));
            }
        }
        Self { checks }
    }

    pub fn is_eligible(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CriterionCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }

    /// Reason string recorded on an excluded candidate.
    pub fn exclusion_reason(&self) -> String {
        let failed: Vec<String> = self
            .failures()
            .map(|c| format!("{} ({})", c.criterion, c.note))
            .collect();
        format!("failed eligibility: {}", failed.join("; "))
    }
}

/// Source of eligibility verdicts.
#[async_trait]
pub trait EligibilityScreen: Send + Sync {
    /// Check a candidate against the eligibility criteria.
    async fn screen(&self, candidate: &CandidateRecord) -> Result<Vec<CriterionCheck>>;
}

/// Result of a selection pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Exactly one candidate, now marked Selected.
    Selected(CandidateRecord),
    /// No untried candidates remain.
    Exhausted,
}

/// Picks the next eligible candidate from a pool.
pub struct Selector {
    screen: Arc<dyn EligibilityScreen>,
}

impl Selector {
    pub fn new(screen: Arc<dyn EligibilityScreen>) -> Self {
        Self { screen }
    }

    /// Claim and screen candidates until one is eligible or the pool is
    /// exhausted. Ineligible candidates are marked Excluded along the way.
    pub async fn select(&self, pool: &SharedPool) -> Result<Selection, PoolError> {
        while let Some(candidate) = pool.claim_next().await {
            let reason = match self.screen.screen(&candidate).await {
                Ok(checks) => {
                    let eligibility = Eligibility::assess(checks);
                    if eligibility.is_eligible() {
                        let selected = pool.mark_selected(&candidate.id).await?;
                        info!("Selected candidate: {}", selected.name);
                        return Ok(Selection::Selected(selected));
                    }
                    eligibility.exclusion_reason()
                }
                Err(e) => format!("screening failed: {:#}", e),
            };

            warn!("Excluding {}: {}", candidate.name, reason);
            pool.mark_excluded(&candidate.id, reason).await?;
        }

        info!("Candidate pool exhausted");
        Ok(Selection::Exhausted)
    }
}
