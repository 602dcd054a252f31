//! Disease knowledge: the single ordered rule table shared by
//! canonicalization and treatment lookup.
//!
//! - **table**: built-in entries and per-family treatment lists
//! - **canonical**: free-text and classifier-label normalization

pub mod canonical;
mod table;

pub use canonical::{canonicalize, format_label, is_healthy_signal};

use crate::types::TreatmentPlan;

/// Static treatment lists for one disease family.
#[derive(Debug)]
pub struct StaticTreatment {
    pub organic: &'static [&'static str],
    pub chemical: &'static [&'static str],
    pub prevention: &'static [&'static str],
    pub immediate_actions: &'static [&'static str],
}

/// Read-only reference record for a known disease.
#[derive(Debug)]
pub struct DiseaseKnowledgeEntry {
    /// Normalized key, e.g. "early_blight"
    pub token: &'static str,
    /// Canonical display name
    pub name: &'static str,
    /// Scientific name of the pathogen
    pub pathogen: Option<&'static str>,
    /// Lowercase keywords, in match order
    pub keywords: &'static [&'static str],
    pub symptoms: &'static [&'static str],
    pub treatment: &'static StaticTreatment,
}

impl DiseaseKnowledgeEntry {
    /// Whether any keyword of this entry occurs in `lowercase`.
    ///
    /// A keyword must start at a word boundary, so "rot" matches
    /// "black rot" and "rotting" but not "protect".
    pub fn matches(&self, lowercase: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| contains_at_word_start(lowercase, keyword))
    }

    pub fn symptoms(&self) -> Vec<String> {
        self.symptoms.iter().map(|s| s.to_string()).collect()
    }
}

/// Lookup over the ordered disease table.
#[derive(Debug, Clone, Copy)]
pub struct KnowledgeBase {
    entries: &'static [DiseaseKnowledgeEntry],
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KnowledgeBase {
    /// The built-in table.
    pub fn builtin() -> Self {
        Self {
            entries: table::ENTRIES,
        }
    }

    /// All entries in precedence order.
    pub fn entries(&self) -> &'static [DiseaseKnowledgeEntry] {
        self.entries
    }

    /// First entry whose keyword occurs in `label` (case-insensitive).
    pub fn match_label(&self, label: &str) -> Option<&'static DiseaseKnowledgeEntry> {
        let lower = label.to_lowercase();
        if is_healthy_signal(&lower) {
            return Some(&table::HEALTHY_ENTRY);
        }
        self.entries.iter().find(|e| e.matches(&lower))
    }

    /// Static plan for a label: first matching family, otherwise the
    /// generic catch-all list.
    pub fn static_plan(&self, label: &str) -> TreatmentPlan {
        let lower = label.to_lowercase();
        if is_healthy_signal(&lower) {
            return healthy_plan();
        }
        let treatment = self
            .entries
            .iter()
            .find(|e| e.matches(&lower))
            .map(|e| e.treatment)
            .unwrap_or(&table::GENERIC);

        let mut prevention = to_owned(treatment.prevention);
        for item in table::COMMON_PREVENTION {
            if !prevention.iter().any(|p| p == item) {
                prevention.push(item.to_string());
            }
        }

        TreatmentPlan {
            organic: to_owned(treatment.organic),
            chemical: to_owned(treatment.chemical),
            prevention,
            immediate_actions: to_owned(treatment.immediate_actions),
            ai_generated: false,
        }
    }
}

/// Fixed maintenance plan for healthy plants.
pub fn healthy_plan() -> TreatmentPlan {
    let t = &table::HEALTHY;
    TreatmentPlan {
        organic: to_owned(t.organic),
        chemical: to_owned(t.chemical),
        prevention: to_owned(t.prevention),
        immediate_actions: Vec::new(),
        ai_generated: false,
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Substring search where the match must begin at a word boundary.
pub(crate) fn contains_at_word_start(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(idx, _)| {
        haystack[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}
