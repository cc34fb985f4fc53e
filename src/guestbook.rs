//! Per-session guestbook keyed by place name

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestbookEntry {
    pub text: String,
    pub written_at: DateTime<Utc>,
}

/// Append-only notes per place, with deletion by position
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Guestbook {
    entries: HashMap<String, Vec<GuestbookEntry>>,
}

impl Guestbook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; empty text is accepted as-is
    pub fn add_entry(&mut self, place: &str, text: impl Into<String>) {
        self.entries
            .entry(place.to_string())
            .or_default()
            .push(GuestbookEntry {
                text: text.into(),
                written_at: Utc::now(),
            });
    }

    /// Remove the entry at `index`; out-of-range positions and unknown
    /// places are ignored
    pub fn delete_entry(&mut self, place: &str, index: usize) -> Option<GuestbookEntry> {
        let entries = self.entries.get_mut(place)?;
        if index >= entries.len() {
            debug!("Ignoring delete of entry {} for '{}'", index, place);
            return None;
        }
        Some(entries.remove(index))
    }

    /// Entries for `place` in insertion order
    #[must_use]
    pub fn entries(&self, place: &str) -> &[GuestbookEntry] {
        self.entries.get(place).map(Vec::as_slice).unwrap_or_default()
    }

    /// Text of each entry, in order
    #[must_use]
    pub fn texts(&self, place: &str) -> Vec<&str> {
        self.entries(place).iter().map(|e| e.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn book(texts: &[&str]) -> Guestbook {
        let mut book = Guestbook::new();
        for text in texts {
            book.add_entry("KaDeWe", *text);
        }
        book
    }

    #[test]
    fn test_add_keeps_order_and_empty_text() {
        let book = book(&["great food hall", "", "pricey"]);
        assert_eq!(book.texts("KaDeWe"), vec!["great food hall", "", "pricey"]);
        assert!(book.entries("Mauerpark").is_empty());
    }

    #[rstest]
    #[case(0, vec!["b", "c"])]
    #[case(1, vec!["a", "c"])]
    #[case(2, vec!["a", "b"])]
    #[case(3, vec!["a", "b", "c"])]
    #[case(usize::MAX, vec!["a", "b", "c"])]
    fn test_delete_by_position(#[case] index: usize, #[case] expected: Vec<&str>) {
        let mut book = book(&["a", "b", "c"]);
        book.delete_entry("KaDeWe", index);
        assert_eq!(book.texts("KaDeWe"), expected);
    }

    #[test]
    fn test_delete_unknown_place_is_noop() {
        let mut book = book(&["a"]);
        assert!(book.delete_entry("Nowhere", 0).is_none());
        assert_eq!(book.texts("KaDeWe"), vec!["a"]);
    }

    #[test]
    fn test_places_are_independent() {
        let mut book = Guestbook::new();
        book.add_entry("KaDeWe", "x");
        book.add_entry("Mauerpark", "y");
        book.delete_entry("KaDeWe", 0);
        assert!(book.entries("KaDeWe").is_empty());
        assert_eq!(book.texts("Mauerpark"), vec!["y"]);
    }
}
