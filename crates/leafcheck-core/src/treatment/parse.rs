//! Tolerant parser for model-generated treatment sections.

use crate::types::TreatmentPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Organic,
    Chemical,
    Prevention,
}

/// Words allowed after the section keyword in a header line.
const HEADER_FILLER: &[&str] = &[
    "treatment",
    "treatments",
    "method",
    "methods",
    "measure",
    "measures",
    "option",
    "options",
    "remedy",
    "remedies",
    "control",
    "tips",
    "solutions",
    "recommendations",
    "strategies",
    "care",
    "and",
];

/// Parse `text` into the three treatment sections.
///
/// Lines before the first header are ignored. Each section keeps at most
/// `max_items` entries and drops entries shorter than `min_item_len` chars.
pub fn parse_sections(text: &str, max_items: usize, min_item_len: usize) -> TreatmentPlan {
    let mut plan = TreatmentPlan {
        ai_generated: true,
        ..TreatmentPlan::default()
    };
    let mut current: Option<Section> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((section, inline)) = parse_header(line) {
            current = Some(section);
            if let Some(item) = inline {
                push_item(&mut plan, section, item, max_items, min_item_len);
            }
            continue;
        }

        if let Some(section) = current {
            push_item(&mut plan, section, strip_bullet(line), max_items, min_item_len);
        }
    }
    plan
}

fn push_item(plan: &mut TreatmentPlan, section: Section, item: &str, max_items: usize, min_item_len: usize) {
    let item = item.replace("**", "");
    let item = item.trim();
    if item.chars().count() < min_item_len {
        return;
    }
    let list = match section {
        Section::Organic => &mut plan.organic,
        Section::Chemical => &mut plan.chemical,
        Section::Prevention => &mut plan.prevention,
    };
    if list.len() < max_items {
        list.push(item.to_string());
    }
}

/// Recognize "ORGANIC TREATMENT", "**Organic:**", "2. Chemical Treatments:",
/// "### Prevention Measures" and similar. Returns any content after the colon.
fn parse_header(line: &str) -> Option<(Section, Option<&str>)> {
    if is_bulleted(line) {
        return None;
    }
    let line = strip_numbering(strip_markup(line));
    let (head, rest) = match line.split_once(':') {
        Some((head, rest)) => (head, Some(rest)),
        None => (line, None),
    };

    let head = strip_markup(head).to_lowercase();
    let mut words = head.split_whitespace();
    let section = match words.next()? {
        "organic" => Section::Organic,
        "chemical" => Section::Chemical,
        "prevention" | "preventive" | "preventative" => Section::Prevention,
        _ => return None,
    };
    if !words.all(|w| HEADER_FILLER.contains(&w)) {
        return None;
    }

    let inline = rest
        .map(|r| strip_markup(r).trim())
        .filter(|r| !r.is_empty());
    Some((section, inline))
}

fn is_bulleted(line: &str) -> bool {
    ["- ", "• ", "* ", "– "].iter().any(|b| line.starts_with(b))
}

fn strip_markup(text: &str) -> &str {
    text.trim().trim_matches(|c: char| matches!(c, '#' | '*' | '_')).trim()
}

/// Drop a leading "1." / "2)" list marker.
fn strip_numbering(text: &str) -> &str {
    let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &text[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim_start();
        }
    }
    text
}

/// Remove leading bullet markers, numbering and bold markup from an item.
fn strip_bullet(line: &str) -> &str {
    let line = line.trim_start_matches(|c: char| matches!(c, '-' | '•' | '*' | '–' | '+') || c.is_whitespace());
    strip_markup(strip_numbering(line))
}
