//! Score extraction from free-text model replies.
//!
//! Models are asked to rate ten checklist items out of 10 and finish with a
//! `Total: N` line. Extraction prefers the total; failing that it sums the
//! per-item `k. ... N/10` ratings. A reply with neither yields `None` so the
//! evaluator can report it as inconclusive instead of scoring zero.

use once_cell::sync::Lazy;
use regex::Regex;

/// `Total: N`, `Total score: N` or `Score: N` as whole words.
static TOTAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:total(?:\s+score)?|score)\s*[:：]?\s*(\d{1,3})\b").unwrap()
});

/// A numbered checklist line and its first `N/10` rating.
static ITEM_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(\d{1,2})\.\s.*?\b(\d{1,2})\s*/\s*10\b").unwrap());

const CHECKLIST_ITEMS: usize = 10;

/// Extract a 0-100 score from a model reply.
pub fn extract_score(reply: &str) -> Option<u32> {
    let text = reply.replace("**", "");

    total_score(&text)
        .or_else(|| sum_item_ratings(&text))
        .map(|score| score.min(100))
}

fn total_score(text: &str) -> Option<u32> {
    TOTAL_PATTERN
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Sum of the first rating for each item numbered 1 to 10.
fn sum_item_ratings(text: &str) -> Option<u32> {
    let mut seen = [false; CHECKLIST_ITEMS + 1];
    let mut total = 0;
    let mut found = false;

    for caps in ITEM_PATTERN.captures_iter(text) {
        let Ok(item) = caps[1].parse::<usize>() else {
            continue;
        };
        if !(1..=CHECKLIST_ITEMS).contains(&item) || seen[item] {
            continue;
        }
        if let Ok(rating) = caps[2].parse::<u32>() {
            seen[item] = true;
            total += rating;
            found = true;
        }
    }

    found.then_some(total)
}
