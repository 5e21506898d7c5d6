//! Eligibility screen backed by verdicts recorded in the candidate file.

use super::{CriterionCheck, EligibilityCriterion, EligibilityScreen};
use crate::models::CandidateRecord;
use anyhow::Result;
use async_trait::async_trait;

/// Reads `eligibility.<criterion>` attributes.
///
/// `pass`, `true`, `yes` and `y` pass. Anything else fails with the recorded
/// value as the note; a missing attribute fails with "no evidence".
#[derive(Debug, Clone, Default)]
pub struct RecordedScreen;

impl RecordedScreen {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EligibilityScreen for RecordedScreen {
    async fn screen(&self, candidate: &CandidateRecord) -> Result<Vec<CriterionCheck>> {
        let checks = EligibilityCriterion::ALL
            .into_iter()
            .map(|criterion| {
                let key = format!("eligibility.{}", criterion.key());
                match candidate.profile.attribute(&key) {
                    None | Some("") => CriterionCheck::fail(criterion, "no evidence"),
                    Some(value) if is_affirmative(value) => {
                        CriterionCheck::pass(criterion, "recorded pass")
                    }
                    Some(value) => CriterionCheck::fail(criterion, format!("recorded '{}'", value)),
                }
            })
            .collect();
        Ok(checks)
    }
}

fn is_affirmative(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "pass" | "passed" | "true" | "yes" | "y"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateProfile;
    use crate::selector::Eligibility;

    fn candidate(verdicts: &[(&str, &str)]) -> CandidateRecord {
        let mut profile = CandidateProfile::default();
        for (key, value) in verdicts {
            profile
                .attributes
                .insert(format!("eligibility.{}", key), value.to_string());
        }
        CandidateRecord::new("Test Startup", profile)
    }

    #[tokio::test]
    async fn test_all_recorded_passes_are_eligible() {
        let record = candidate(&[
            ("purpose", "pass"),
            ("growth_speed", "TRUE"),
            ("idea", "yes"),
            ("uncertainty", "y"),
            ("funding", "passed"),
            ("final_goal", "pass"),
        ]);

        let checks = RecordedScreen::new().screen(&record).await.unwrap();
        assert!(Eligibility::assess(checks).is_eligible());
    }

    #[tokio::test]
    async fn test_missing_and_negative_verdicts_fail() {
        let record = candidate(&[("purpose", "pass"), ("funding", "bootstrapped")]);

        let checks = RecordedScreen::new().screen(&record).await.unwrap();
        let funding = checks
            .iter()
            .find(|c| c.criterion == EligibilityCriterion::Funding)
            .unwrap();
        assert!(!funding.passed);
        assert_eq!(funding.note, "recorded 'bootstrapped'");

        let idea = checks
            .iter()
            .find(|c| c.criterion == EligibilityCriterion::Idea)
            .unwrap();
        assert_eq!(idea.note, "no evidence");
    }
}
