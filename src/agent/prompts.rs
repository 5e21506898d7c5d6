//! Prompt text for the Ollama back-end.

use crate::models::{CandidateRecord, Criterion};
use crate::selector::EligibilityCriterion;

/// System prompt for criterion evaluation.
pub const EVALUATOR_SYSTEM_PROMPT: &str = r#"You are a meticulous venture capital analyst specialising in education technology.
Rate the startup on each checklist item from 0 to 10 using only the provided profile.
Give a one-line justification per item.
Finish with a final line of the form "Total: N" where N is the sum of the item ratings (0-100).
If the profile does not contain enough information to judge, reply exactly "INSUFFICIENT INFORMATION"."#;

/// System prompt for the eligibility gate.
pub const SCREEN_SYSTEM_PROMPT: &str = r#"You are screening education startups for a venture fund.
For each criterion decide pass or fail using only the provided profile.
Output one JSON object per line, nothing else:
{"criterion": "<key>", "passed": true|false, "note": "<short reason>"}"#;

/// Checklist items for a scoring criterion.
pub fn checklist(criterion: Criterion) -> &'static [&'static str] {
    match criterion {
        Criterion::Technology => &[
            "Does the product clearly solve an education problem?",
            "How heavily does it rely on AI/ML?",
            "Is the technology innovative and differentiated?",
            "Is the technical implementation feasible?",
            "Can the system scale?",
            "Are stability and security addressed?",
            "Can it optimise learning from data?",
            "Does it integrate well through APIs?",
            "Is the technology well documented?",
            "Does it use or contribute to open source?",
        ],
        Criterion::Learning => &[
            "Are learning outcome metrics clearly defined?",
            "Is learner satisfaction high?",
            "Are completion rates strong?",
            "Are there validated case studies of learning gains?",
            "Does it support personalised learning?",
            "Does it analyse learning data and give feedback?",
            "Does it provide tools for teachers and tutors?",
            "Does it drive learner engagement?",
            "Is the content of high quality?",
            "Are learning path recommendations effective?",
        ],
        Criterion::Market => &[
            "Is the target education market large?",
            "Is the market growing quickly?",
            "Is the revenue model clear and realistic?",
            "Is there an established B2B or B2C customer base?",
            "Is the pricing strategy sound?",
            "Is the go-to-market strategy concrete?",
            "Is customer acquisition cost reasonable?",
            "Is customer lifetime value high?",
            "Are partnerships attainable?",
            "Can it expand into global markets?",
        ],
        Criterion::Competition => &[
            "Is it clearly differentiated from competitors?",
            "Are there barriers to entry?",
            "Does it hold a competitive moat (patents, technology, network)?",
            "Is there brand recognition?",
            "Is customer loyalty high?",
            "Does it enjoy a first-mover advantage?",
            "Do network effects apply?",
            "Are switching costs high?",
            "Is it better value than competitors?",
            "Is the advantage sustainable?",
        ],
        Criterion::Growth => &[
            "Is there large room for market expansion?",
            "Are there plans for product diversification?",
            "Is the global expansion strategy concrete?",
            "Are there opportunities to grow partnerships?",
            "Is an M&A exit plausible?",
            "Is an IPO plausible?",
            "Is infrastructure ready for scale-up?",
            "Has it raised investment before?",
            "Is the growth roadmap clear?",
            "Is 10x growth plausible?",
        ],
        Criterion::Risk => &[
            "Is financial risk low?",
            "Is legal and regulatory risk low?",
            "Is technology risk low?",
            "Is market risk low?",
            "Is management risk low?",
            "Is operational risk low?",
            "Is reputational risk low?",
            "Is competitive risk low?",
            "Is dependency on partners low?",
            "Is scaling risk low?",
        ],
    }
}

/// One-line description of an eligibility criterion.
pub fn eligibility_question(criterion: EligibilityCriterion) -> &'static str {
    match criterion {
        EligibilityCriterion::Purpose => {
            "Is the company's main purpose rapid expansion and market capture over short-term profit?"
        }
        EligibilityCriterion::GrowthSpeed => {
            "Is it growing (or credibly planning to grow) far faster than the sector average, e.g. 10x?"
        }
        EligibilityCriterion::Idea => {
            "Is the core technology or business model innovative and hard to copy?"
        }
        EligibilityCriterion::Uncertainty => {
            "Does it operate under high market or technology uncertainty typical of venture bets?"
        }
        EligibilityCriterion::Funding => {
            "Is it funded mainly by outside investment (VC, angels) rather than revenue?"
        }
        EligibilityCriterion::FinalGoal => "Is its stated end goal an exit through M&A or IPO?",
    }
}

fn profile_block(candidate: &CandidateRecord) -> String {
    let mut block = String::new();
    block.push_str(&format!("Startup: {}\n", candidate.name));
    if let Some(ref url) = candidate.url {
        block.push_str(&format!("Website: {}\n", url));
    }
    if !candidate.profile.summary.is_empty() {
        block.push_str(&format!("\n{}\n", candidate.profile.summary));
    }
    let facts: Vec<String> = candidate
        .profile
        .attributes
        .iter()
        .filter(|(key, _)| !key.starts_with("score.") && !key.starts_with("eligibility."))
        .map(|(key, value)| format!("- {}: {}", key, value))
        .collect();
    if !facts.is_empty() {
        block.push_str("\nFacts:\n");
        block.push_str(&facts.join("\n"));
        block.push('\n');
    }
    block
}

/// User prompt for evaluating one criterion.
pub fn evaluation_prompt(criterion: Criterion, candidate: &CandidateRecord) -> String {
    let items: Vec<String> = checklist(criterion)
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q))
        .collect();

    format!(
        "Evaluate the {} of the education startup below.\n\nChecklist (0-10 each):\n{}\n\n=== PROFILE ===\n{}=== END OF PROFILE ===\n",
        criterion.label().to_lowercase(),
        items.join("\n"),
        profile_block(candidate)
    )
}

/// User prompt for the eligibility gate.
pub fn screening_prompt(candidate: &CandidateRecord) -> String {
    let criteria: Vec<String> = EligibilityCriterion::ALL
        .iter()
        .map(|c| format!("- {}: {}", c.key(), eligibility_question(*c)))
        .collect();

    format!(
        "Criteria:\n{}\n\n=== PROFILE ===\n{}=== END OF PROFILE ===\n\nNow output one JSON object per criterion:",
        criteria.join("\n"),
        profile_block(candidate)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateProfile;

    fn candidate() -> CandidateRecord {
        let mut profile = CandidateProfile {
            summary: "Adaptive math tutoring app.".to_string(),
            ..CandidateProfile::default()
        };
        profile
            .attributes
            .insert("funding_stage".to_string(), "Series B".to_string());
        profile
            .attributes
            .insert("score.market".to_string(), "80".to_string());
        CandidateRecord::new("Mathpresso", profile).with_url("https://mathpresso.com")
    }

    #[test]
    fn test_every_criterion_has_ten_items() {
        for criterion in Criterion::ALL {
            assert_eq!(checklist(criterion).len(), 10, "{}", criterion);
        }
    }

    #[test]
    fn test_evaluation_prompt_hides_recorded_scores() {
        let prompt = evaluation_prompt(Criterion::Market, &candidate());
        assert!(prompt.contains("Mathpresso"));
        assert!(prompt.contains("funding_stage: Series B"));
        assert!(prompt.contains("10. Can it expand into global markets?"));
        assert!(!prompt.contains("score.market"));
    }

    #[test]
    fn test_screening_prompt_lists_all_criteria() {
        let prompt = screening_prompt(&candidate());
        for criterion in EligibilityCriterion::ALL {
            assert!(prompt.contains(criterion.key()));
        }
    }
}
