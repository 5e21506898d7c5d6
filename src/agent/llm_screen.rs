//! Eligibility screening by a chat model.
//!
//! The model answers with one JSON object per criterion. Lines that are not
//! JSON objects are ignored, and criteria the model leaves out are treated
//! as not assessed by [`Eligibility::assess`](crate::selector::Eligibility::assess).

use super::ollama::ChatBackend;
use super::prompts::{screening_prompt, SCREEN_SYSTEM_PROMPT};
use crate::models::CandidateRecord;
use crate::selector::{CriterionCheck, EligibilityCriterion, EligibilityScreen};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub struct LlmScreen {
    backend: Arc<dyn ChatBackend>,
}

impl LlmScreen {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl EligibilityScreen for LlmScreen {
    async fn screen(&self, candidate: &CandidateRecord) -> Result<Vec<CriterionCheck>> {
        let reply = self
            .backend
            .chat(SCREEN_SYSTEM_PROMPT, &screening_prompt(candidate))
            .await?;

        let checks = parse_checks(&reply);
        debug!("Screen for {} returned {} checks", candidate.id, checks.len());
        Ok(checks)
    }
}

fn parse_checks(reply: &str) -> Vec<CriterionCheck> {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter_map(|json| json_to_check(&json))
        .collect()
}

fn json_to_check(json: &Value) -> Option<CriterionCheck> {
    let criterion: EligibilityCriterion = json["criterion"].as_str()?.parse().ok()?;
    let passed = match &json["passed"] {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.to_lowercase().as_str(), "true" | "pass" | "yes"),
        _ => return None,
    };
    let note = json["note"].as_str().unwrap_or("").to_string();

    Some(if passed {
        CriterionCheck::pass(criterion, note)
    } else {
        CriterionCheck::fail(criterion, note)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm_evaluator::testing::CannedBackend;
    use crate::models::CandidateProfile;
    use crate::selector::Eligibility;

    const ALL_PASS: &str = r#"Here is my assessment:
{"criterion": "purpose", "passed": true, "note": "blitzscaling"}
{"criterion": "growth_speed", "passed": true, "note": "12x yoy"}
{"criterion": "idea", "passed": true, "note": "proprietary tutor model"}
{"criterion": "uncertainty", "passed": true, "note": "new market"}
{"criterion": "funding", "passed": "yes", "note": "Series B"}
{"criterion": "final_goal", "passed": true, "note": "IPO planned"}"#;

    #[test]
    fn test_parse_checks_skips_prose_and_bad_lines() {
        let reply = "intro\n{\"criterion\": \"idea\", \"passed\": false}\n{not json}\n{\"criterion\": \"vibes\", \"passed\": true}";
        let checks = parse_checks(reply);

        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].criterion, EligibilityCriterion::Idea);
        assert!(!checks[0].passed);
    }

    #[tokio::test]
    async fn test_all_pass_reply_is_eligible() {
        let screen = LlmScreen::new(CannedBackend::reply(ALL_PASS));
        let candidate = CandidateRecord::new("Speak", CandidateProfile::default());

        let checks = screen.screen(&candidate).await.unwrap();
        assert!(Eligibility::assess(checks).is_eligible());
    }

    #[tokio::test]
    async fn test_missing_criterion_makes_candidate_ineligible() {
        let reply: String = ALL_PASS
            .lines()
            .filter(|l| !l.contains("final_goal"))
            .collect::<Vec<_>>()
            .join("\n");
        let screen = LlmScreen::new(CannedBackend::reply(&reply));
        let candidate = CandidateRecord::new("Speak", CandidateProfile::default());

        let eligibility = Eligibility::assess(screen.screen(&candidate).await.unwrap());
        assert!(!eligibility.is_eligible());
        assert!(eligibility.exclusion_reason().contains("final_goal"));
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let screen = LlmScreen::new(CannedBackend::failing());
        let candidate = CandidateRecord::new("Speak", CandidateProfile::default());
        assert!(screen.screen(&candidate).await.is_err());
    }
}
