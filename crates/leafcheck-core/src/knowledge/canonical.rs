//! Disease-name canonicalization.
//!
//! Vision models answer in free text and hosted classifiers answer with
//! dataset tokens like `Tomato___Early_blight`. Both are normalized here into
//! the human-readable labels the rest of the system keys on.

use super::{contains_at_word_start, KnowledgeBase};
use crate::types::{HEALTHY_PLANT, UNKNOWN_DISEASE};

/// Longest free-text clause accepted as a best-effort label.
const MAX_CLAUSE_CHARS: usize = 60;

const HEALTHY_PHRASES: &[&str] = &[
    "no disease",
    "no sign of disease",
    "no signs of disease",
    "no visible disease",
    "disease-free",
    "disease free",
];

/// Whether the text explicitly says the plant is healthy.
///
/// Negated forms ("unhealthy", "not healthy") do not count.
pub fn is_healthy_signal(text: &str) -> bool {
    let lower = text.to_lowercase();
    if HEALTHY_PHRASES.iter().any(|p| lower.contains(p)) {
        return true;
    }
    lower.match_indices("healthy").any(|(idx, _)| {
        let before = &lower[..idx];
        let at_word_start = before
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        at_word_start && !before.trim_end().ends_with("not")
    })
}

/// Normalize free text into a canonical disease label.
///
/// 1. Explicit healthy signals yield "Healthy Plant".
/// 2. Otherwise the first table entry with a matching keyword wins.
/// 3. Otherwise the first short clause of the text is used as-is.
/// 4. Empty input yields "Unknown Disease".
pub fn canonicalize(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return UNKNOWN_DISEASE.to_string();
    }
    if is_healthy_signal(text) {
        return HEALTHY_PLANT.to_string();
    }

    let lower = text.to_lowercase();
    if let Some(entry) = KnowledgeBase::builtin()
        .entries()
        .iter()
        .find(|e| e.keywords.iter().any(|k| contains_at_word_start(&lower, k)))
    {
        return entry.name.to_string();
    }

    first_clause(text).unwrap_or_else(|| UNKNOWN_DISEASE.to_string())
}

/// First non-empty clause, stripped of punctuation and markup, capped in length.
fn first_clause(text: &str) -> Option<String> {
    let clause = text
        .split(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '\n' | '(' | ')'))
        .map(|part| {
            part.chars()
                .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '\''))
                .collect::<String>()
        })
        .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|part| !part.is_empty())?;

    if clause.chars().count() <= MAX_CLAUSE_CHARS {
        return Some(clause);
    }

    // Cut at the last word boundary inside the limit
    let mut truncated = String::new();
    for word in clause.split(' ') {
        let next_len = truncated.chars().count() + word.chars().count() + usize::from(!truncated.is_empty());
        if next_len > MAX_CLAUSE_CHARS {
            break;
        }
        if !truncated.is_empty() {
            truncated.push(' ');
        }
        truncated.push_str(word);
    }
    if truncated.is_empty() {
        truncated = clause.chars().take(MAX_CLAUSE_CHARS).collect();
    }
    Some(truncated)
}

/// Convert a classifier label token into "Plant - Disease" form.
///
/// `Tomato___Early_blight` becomes "Tomato - Early Blight", `LABEL_3`
/// becomes "3", and an empty label becomes "Unknown".
pub fn format_label(label: &str) -> String {
    let label = label.trim();
    let label = match label.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("label_") => &label[6..],
        _ => label,
    };

    if let Some((plant, disease)) = label.split_once("___") {
        let plant = humanize(plant);
        let disease = humanize(disease);
        return match (plant.is_empty(), disease.is_empty()) {
            (true, true) => "Unknown".to_string(),
            (false, true) => plant,
            (true, false) => disease,
            (false, false) => format!("{plant} - {disease}"),
        };
    }

    let formatted = humanize(label);
    if formatted.is_empty() {
        "Unknown".to_string()
    } else {
        formatted
    }
}

/// Underscores to spaces, collapse whitespace, title-case each word.
fn humanize(token: &str) -> String {
    let spaced = token.replace('_', " ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    title_case(&collapsed)
}

/// Uppercase a letter that follows a non-letter, lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}
