//! Markdown and JSON report generation.
//!
//! An invested run produces an investment memo for the chosen candidate; an
//! exhausted run produces a screening summary of everyone held or excluded.

use crate::analysis::weakest_criteria;
use crate::config::ReportFormat;
use crate::models::{
    CandidateDecision, CandidateStatus, Contribution, EvaluationOutcome, EvaluationResult,
    ExhaustionReport, InvestmentReport, TerminalCandidate,
};
use crate::workflow::WorkflowOutcome;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Run details shown alongside the outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub provider: String,
    pub model: Option<String>,
    pub duration_seconds: f64,
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(outcome: &WorkflowOutcome, metadata: &ReportMetadata) -> String {
    match outcome {
        WorkflowOutcome::Invested(report) => investment_markdown(report, metadata),
        WorkflowOutcome::Exhausted(report) => exhaustion_markdown(report, metadata),
    }
}

/// Generate a JSON report.
pub fn generate_json_report(
    outcome: &WorkflowOutcome,
    metadata: &ReportMetadata,
) -> Result<String> {
    let mut value = serde_json::to_value(outcome)?;
    if let Some(map) = value.as_object_mut() {
        map.insert("metadata".to_string(), serde_json::to_value(metadata)?);
    }
    serde_json::to_string_pretty(&value).map_err(Into::into)
}

/// Render the report in `format` and write it to `path`.
pub fn write_report(
    outcome: &WorkflowOutcome,
    metadata: &ReportMetadata,
    path: &Path,
    format: ReportFormat,
) -> Result<()> {
    let content = match format {
        ReportFormat::Markdown => generate_markdown_report(outcome, metadata),
        ReportFormat::Json => generate_json_report(outcome, metadata)?,
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

fn investment_markdown(report: &InvestmentReport, metadata: &ReportMetadata) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Investment Memo: {}\n\n", report.candidate.name));
    output.push_str(&generate_metadata_section(
        metadata,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        report.iterations,
    ));
    output.push_str(&generate_recommendation_section(report));
    output.push_str(&generate_scores_section(&report.decision.contributions));
    output.push_str(&generate_watch_section(report));
    output.push_str(&generate_details_section(&report.results));
    output.push_str(&generate_passed_over_section(&report.passed_over));
    output.push_str(&generate_footer());

    output
}

fn exhaustion_markdown(report: &ExhaustionReport, metadata: &ReportMetadata) -> String {
    let mut output = String::new();

    output.push_str("# Screening Report: No Investment\n\n");
    output.push_str(&generate_metadata_section(
        metadata,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        report.iterations,
    ));

    output.push_str("## Outcome\n\n");
    output.push_str(&format!(
        "The pool of {} candidates was exhausted without any candidate meeting the investment bar.\n\n",
        report.pool_size
    ));
    output.push_str("| Held | Excluded |\n");
    output.push_str("|:---:|:---:|\n");
    output.push_str(&format!(
        "| {} | {} |\n\n",
        report.count_with_status(CandidateStatus::Held),
        report.count_with_status(CandidateStatus::Excluded)
    ));

    output.push_str(&generate_held_section(
        &report.candidates,
        &report.held_decisions,
    ));
    output.push_str(&generate_excluded_section(&report.candidates));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(
    metadata: &ReportMetadata,
    generated_at: String,
    iterations: usize,
) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Generated:** {}\n", generated_at));
    section.push_str(&format!("- **Back-end:** {}\n", metadata.provider));
    if let Some(ref model) = metadata.model {
        section.push_str(&format!("- **Model Used:** `{}`\n", model));
    }
    section.push_str(&format!("- **Selection Rounds:** {}\n", iterations));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_recommendation_section(report: &InvestmentReport) -> String {
    let mut section = String::new();
    let candidate = &report.candidate;
    let decision = &report.decision;

    section.push_str("## Recommendation\n\n");
    section.push_str(&format!(
        "**{}**: invest in **{}** (`{}`)\n\n",
        decision.outcome, candidate.name, candidate.id
    ));
    if let Some(ref url) = candidate.url {
        section.push_str(&format!("- **Website:** {}\n", url));
    }
    section.push_str(&format!(
        "- **Composite Score:** {:.2} / 100 (threshold {:.2})\n",
        decision.composite, decision.threshold
    ));
    section.push_str(&format!("- **Reason:** {}\n\n", decision.reason));

    if !candidate.profile.summary.is_empty() {
        section.push_str(&format!("> {}\n\n", candidate.profile.summary));
    }

    section
}

fn generate_scores_section(contributions: &[Contribution]) -> String {
    let mut section = String::new();

    section.push_str("## Criterion Scores\n\n");
    section.push_str("| Criterion | Score | Weight | Contribution |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");

    for c in contributions {
        let marker = if c.substituted { " (default)" } else { "" };
        section.push_str(&format!(
            "| {} | {:.1}{} | {:.0}% | {:.2} |\n",
            c.criterion.label(),
            c.score,
            marker,
            c.weight * 100.0,
            c.contribution
        ));
    }
    section.push('\n');

    if contributions.iter().any(|c| c.substituted) {
        section.push_str(
            "*Scores marked (default) were inconclusive and replaced by the configured default.*\n\n",
        );
    }

    section
}

fn generate_watch_section(report: &InvestmentReport) -> String {
    let weakest = weakest_criteria(&report.decision, 2);
    if weakest.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Areas to Watch\n\n");
    for c in weakest {
        section.push_str(&format!("- **{}** scored {:.1}\n", c.criterion.label(), c.score));
    }
    section.push('\n');

    section
}

fn generate_details_section(results: &[EvaluationResult]) -> String {
    let mut section = String::new();

    section.push_str("## Evaluation Details\n\n");
    for result in results {
        section.push_str(&format!("### {}\n\n", result.criterion.label()));
        match &result.outcome {
            EvaluationOutcome::Scored { score, rationale } => {
                section.push_str(&format!("**Score:** {:.1}\n\n", score));
                section.push_str("<details>\n<summary>Rationale</summary>\n\n");
                section.push_str(rationale);
                section.push_str("\n</details>\n\n");
            }
            EvaluationOutcome::Inconclusive { cause } => {
                section.push_str(&format!("**Inconclusive:** {}\n\n", cause));
            }
        }
    }

    section
}

fn generate_passed_over_section(passed_over: &[TerminalCandidate]) -> String {
    if passed_over.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Candidates Passed Over\n\n");
    section.push_str("| Candidate | Status | Reason |\n");
    section.push_str("|:---|:---:|:---|\n");
    for c in passed_over {
        section.push_str(&format!("| {} | {} | {} |\n", c.name, c.status, c.reason));
    }
    section.push('\n');

    section
}

fn generate_held_section(
    candidates: &[TerminalCandidate],
    decisions: &[CandidateDecision],
) -> String {
    let held: Vec<&TerminalCandidate> = candidates
        .iter()
        .filter(|c| c.status == CandidateStatus::Held)
        .collect();
    if held.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Held Candidates\n\n");
    section.push_str("| Candidate | Composite | Reason |\n");
    section.push_str("|:---|:---:|:---|\n");
    for c in held {
        let composite = decisions
            .iter()
            .find(|d| d.id == c.id)
            .map(|d| format!("{:.2}", d.decision.composite))
            .unwrap_or_else(|| "n/a".to_string());
        section.push_str(&format!("| {} | {} | {} |\n", c.name, composite, c.reason));
    }
    section.push('\n');

    section
}

fn generate_excluded_section(candidates: &[TerminalCandidate]) -> String {
    let excluded: Vec<&TerminalCandidate> = candidates
        .iter()
        .filter(|c| c.status == CandidateStatus::Excluded)
        .collect();
    if excluded.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Excluded Candidates\n\n");
    for c in excluded {
        section.push_str(&format!("- **{}**: {}\n", c.name, c.reason));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by edscout*\n".to_string()
}
