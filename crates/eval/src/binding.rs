//! Binding resolution: mapping a bare-reference phrase to a prior chain
//! step's result.
//!
//! Matching rule: case-insensitive substring match in either direction
//! after stripping filler words. When several slots match, the most
//! recently produced one wins (last-write-wins); only a zero-match
//! reference is fatal.

use serde_json::Value;
use std::fmt;

/// Words carrying no identity in a reference phrase or slot label.
const FILLER_WORDS: &[&str] = &["results", "result", "the", "output", "of"];

/// A reference that matched no prior slot.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingError {
    pub phrase: String,
    pub available: Vec<String>,
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.available.is_empty() {
            write!(f, "no prior result matches '{}' (no slots populated)", self.phrase)
        } else {
            write!(
                f,
                "no prior result matches '{}' (available slots: {})",
                self.phrase,
                self.available.join(", ")
            )
        }
    }
}

impl std::error::Error for BindingError {}

/// Insertion-ordered slot label -> result value table for one chain.
///
/// Exclusively owned by its chain's execution: created empty at chain
/// entry, populated step by step, discarded when the chain finishes.
#[derive(Debug, Default)]
pub struct ResultTable {
    entries: Vec<(String, Value)>,
}

impl ResultTable {
    pub fn new() -> Self {
        ResultTable::default()
    }

    pub fn insert(&mut self, slot: impl Into<String>, value: Value) {
        self.entries.push((slot.into(), value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn slots(&self) -> Vec<String> {
        self.entries.iter().map(|(slot, _)| slot.clone()).collect()
    }

    /// Resolve a bare-reference phrase to a populated slot's value.
    /// Scans from the most recent entry backwards, so a phrase matching
    /// several slots resolves to the latest one.
    pub fn resolve(&self, phrase: &str) -> Result<&Value, BindingError> {
        let wanted = normalize(phrase);
        for (slot, value) in self.entries.iter().rev() {
            let label = normalize(slot);
            if label.contains(&wanted) || wanted.contains(&label) {
                return Ok(value);
            }
        }
        Err(BindingError {
            phrase: phrase.to_owned(),
            available: self.slots(),
        })
    }
}

/// Lowercase, drop filler words, collapse whitespace.
fn normalize(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .filter(|w| !FILLER_WORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exact_label_match() {
        let mut table = ResultTable::new();
        table.insert("search results", json!("R1"));
        assert_eq!(table.resolve("search results").unwrap(), &json!("R1"));
    }

    #[test]
    fn filler_words_are_stripped() {
        let mut table = ResultTable::new();
        table.insert("analysis", json!("A"));
        assert_eq!(table.resolve("the analysis results").unwrap(), &json!("A"));
    }

    #[test]
    fn match_is_case_insensitive() {
        let mut table = ResultTable::new();
        table.insert("search results", json!("R1"));
        assert_eq!(table.resolve("Search Results").unwrap(), &json!("R1"));
    }

    #[test]
    fn substring_match_in_either_direction() {
        let mut table = ResultTable::new();
        table.insert("comparison", json!("C"));
        // phrase shorter than label
        assert_eq!(table.resolve("comparison").unwrap(), &json!("C"));
        // label shorter than phrase
        assert_eq!(table.resolve("that comparison output").unwrap(), &json!("C"));
    }

    #[test]
    fn ambiguous_phrase_resolves_to_most_recent_slot() {
        let mut table = ResultTable::new();
        table.insert("search results", json!("first"));
        table.insert("search results", json!("second"));
        assert_eq!(table.resolve("search results").unwrap(), &json!("second"));
    }

    #[test]
    fn zero_matches_reports_available_slots() {
        let mut table = ResultTable::new();
        table.insert("search results", json!("R1"));
        table.insert("analysis", json!("A"));
        let err = table.resolve("translation").unwrap_err();
        assert_eq!(err.phrase, "translation");
        assert_eq!(err.available, vec!["search results", "analysis"]);
        assert!(err.to_string().contains("available slots"));
    }

    #[test]
    fn empty_table_reports_no_slots() {
        let table = ResultTable::new();
        let err = table.resolve("anything").unwrap_err();
        assert!(err.available.is_empty());
    }
}
