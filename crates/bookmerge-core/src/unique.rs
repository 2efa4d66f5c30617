//! Insertion-ordered list of unique strings

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A list of strings that keeps first-occurrence order and rejects repeats
///
/// Serializes as a plain JSON array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct UniqueList {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl UniqueList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value unless it is already present; returns whether it was added
    pub fn push(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.contains(&value) {
            return false;
        }
        self.seen.insert(value.clone());
        self.items.push(value);
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        self.seen.contains(value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}

impl PartialEq for UniqueList {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for UniqueList {}

impl<S: Into<String>> FromIterator<S> for UniqueList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = UniqueList::new();
        for value in iter {
            list.push(value);
        }
        list
    }
}

impl From<Vec<String>> for UniqueList {
    fn from(values: Vec<String>) -> Self {
        values.into_iter().collect()
    }
}

impl From<UniqueList> for Vec<String> {
    fn from(list: UniqueList) -> Self {
        list.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_rejects_repeats() {
        let mut list = UniqueList::new();
        assert!(list.push("a"));
        assert!(list.push("b"));
        assert!(!list.push("a"));
        assert_eq!(list.as_slice(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_extend_preserves_first_seen_order() {
        let list: UniqueList = ["x", "y"].into_iter().chain(["y", "z", "x", "w"]).collect();
        assert_eq!(list.into_vec(), vec!["x", "y", "z", "w"]);
    }

    #[test]
    fn test_case_sensitive() {
        let list: UniqueList = ["Ann", "ann"].into_iter().collect();
        assert_eq!(list.len(), 2);
        assert!(list.contains("Ann"));
    }

    #[test]
    fn test_serde_as_array() {
        let list: UniqueList = ["a", "b", "a"].into_iter().collect();
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"["a","b"]"#);

        let back: UniqueList = serde_json::from_str(r#"["c","c","d"]"#).unwrap();
        assert_eq!(back.into_vec(), vec!["c", "d"]);
    }
}
