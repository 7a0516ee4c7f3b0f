//! # Change patterns
//!
//! A pattern is a tree of path keys describing "what I'm interested in":
//!
//! ```text
//! {"glyphs": {"A": null, "B": null}, "glyphMap": null}
//! ```
//!
//! A `null` value is a leaf: the path and everything below it. A nested
//! pattern narrows interest to the listed children. The empty pattern
//! matches nothing.
//!
//! Patterns form a semilattice under [`Pattern::union`],
//! [`Pattern::intersect`] and [`Pattern::difference`]; a leaf always
//! absorbs whatever sits below the same key in the other operand.

use crate::{Change, PathSegment};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

/// A pattern node: `None` is a leaf, `Some` a nested pattern.
pub type PatternNode = Option<Pattern>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern(BTreeMap<String, PatternNode>);

/// Subscription argument: a single path or a whole pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathOrPattern {
    Path(Vec<PathSegment>),
    Pattern(Pattern),
}

impl PathOrPattern {
    pub fn into_pattern(self) -> Pattern {
        match self {
            PathOrPattern::Path(path) => Pattern::from_path(&path),
            PathOrPattern::Pattern(pattern) => pattern,
        }
    }
}

impl From<Pattern> for PathOrPattern {
    fn from(pattern: Pattern) -> Self {
        PathOrPattern::Pattern(pattern)
    }
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pattern matching exactly `path` and everything below it.
    /// The empty path yields the empty pattern.
    pub fn from_path(path: &[PathSegment]) -> Self {
        let mut pattern = Pattern::new();
        if let Some((last, parents)) = path.split_last() {
            let mut node: PatternNode = None;
            let mut key = last.to_key();
            for segment in parents.iter().rev() {
                let mut parent = Pattern::new();
                parent.0.insert(key, node);
                node = Some(parent);
                key = segment.to_key();
            }
            pattern.0.insert(key, node);
        }
        pattern
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&PatternNode> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, node: PatternNode) {
        self.0.insert(key.into(), node);
    }

    pub fn insert_leaf(&mut self, key: impl Into<String>) {
        self.0.insert(key.into(), None);
    }

    pub fn remove(&mut self, key: &str) -> Option<PatternNode> {
        self.0.remove(key)
    }

    pub fn top_level_keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, PatternNode> {
        self.0.iter()
    }

    /// Drop nested patterns that became empty.
    pub fn normalized(self) -> Pattern {
        let mut result = Pattern::new();
        for (key, node) in self.0 {
            match node {
                None => result.insert_leaf(key),
                Some(child) => {
                    let child = child.normalized();
                    if !child.is_empty() {
                        result.insert(key, Some(child));
                    }
                }
            }
        }
        result
    }

    pub fn add_path(&mut self, path: &[PathSegment]) {
        self.add_pattern(&Pattern::from_path(path));
    }

    pub fn remove_path(&mut self, path: &[PathSegment]) {
        self.remove_pattern(&Pattern::from_path(path));
    }

    /// In-place union. A leaf on either side wins over any subtree.
    pub fn add_pattern(&mut self, other: &Pattern) {
        for (key, other_node) in &other.0 {
            match self.0.get_mut(key) {
                None => {
                    self.0.insert(key.clone(), other_node.clone());
                }
                Some(None) => {}
                Some(Some(own)) => match other_node {
                    None => {
                        self.0.insert(key.clone(), None);
                    }
                    Some(other_child) => own.add_pattern(other_child),
                },
            }
        }
    }

    /// In-place difference. A leaf in `other` removes the whole key; a leaf
    /// in `self` survives a non-leaf subtrahend.
    pub fn remove_pattern(&mut self, other: &Pattern) {
        for (key, other_node) in &other.0 {
            let remove = match self.0.get_mut(key) {
                None => false,
                Some(None) => other_node.is_none(),
                Some(Some(own)) => match other_node {
                    None => true,
                    Some(other_child) => {
                        own.remove_pattern(other_child);
                        own.is_empty()
                    }
                },
            };
            if remove {
                self.0.remove(key);
            }
        }
    }

    pub fn union(&self, other: &Pattern) -> Pattern {
        let mut result = self.clone();
        result.add_pattern(other);
        result
    }

    pub fn difference(&self, other: &Pattern) -> Pattern {
        let mut result = self.clone();
        result.remove_pattern(other);
        result
    }

    /// Meet of two patterns. A key survives only if both sides have it; when
    /// one side is a leaf the other side's subtree is kept as is.
    pub fn intersect(&self, other: &Pattern) -> Pattern {
        let mut result = Pattern::new();
        for (key, own_node) in &self.0 {
            let Some(other_node) = other.0.get(key) else {
                continue;
            };
            match (own_node, other_node) {
                (None, node) | (node, None) => result.insert(key.clone(), node.clone()),
                (Some(own), Some(other_child)) => {
                    let child = own.intersect(other_child);
                    if !child.is_empty() {
                        result.insert(key.clone(), Some(child));
                    }
                }
            }
        }
        result
    }

    /// Does `change` touch anything this pattern covers?
    pub fn matches(&self, change: &Change) -> bool {
        let mut node = self;
        for segment in &change.path {
            match node.0.get(&segment.to_key()) {
                None => return false,
                Some(None) => return true,
                Some(Some(child)) => node = child,
            }
        }
        change.children.iter().any(|child| node.matches(child))
    }

    /// The part of `change` that falls inside this pattern, or with
    /// `inverse` the part that falls outside it. `None` when nothing is left.
    pub fn filter_change(&self, change: &Change, inverse: bool) -> Option<Change> {
        let mut node = self;
        for segment in &change.path {
            match node.0.get(&segment.to_key()) {
                None => return inverse.then(|| change.clone()),
                Some(None) => return (!inverse).then(|| change.clone()),
                Some(Some(child)) => node = child,
            }
        }

        let children = change
            .children
            .iter()
            .filter_map(|child| node.filter_change(child, inverse))
            .collect();

        // Only a prefix of the pattern was matched here, so the function at
        // this level is outside the pattern.
        let (function, arguments) = if inverse {
            (change.function.clone(), change.arguments.clone())
        } else {
            (None, Vec::new())
        };

        Change {
            path: change.path.clone(),
            function,
            arguments,
            children,
        }
        .normalized()
    }
}

impl FromIterator<Vec<PathSegment>> for Pattern {
    fn from_iter<I: IntoIterator<Item = Vec<PathSegment>>>(paths: I) -> Self {
        let mut pattern = Pattern::new();
        for path in paths {
            pattern.add_path(&path);
        }
        pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn pattern(value: Value) -> Pattern {
        serde_json::from_value(value).unwrap()
    }

    fn path(segments: &[&str]) -> Vec<PathSegment> {
        segments.iter().map(|s| PathSegment::from(*s)).collect()
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Pattern::from_path(&[]), pattern(json!({})));
        assert_eq!(Pattern::from_path(&path(&["a"])), pattern(json!({"a": null})));
        assert_eq!(
            Pattern::from_path(&path(&["a", "b", "c"])),
            pattern(json!({"a": {"b": {"c": null}}}))
        );
        assert_eq!(
            Pattern::from_path(&[PathSegment::from("items"), PathSegment::Index(3)]),
            pattern(json!({"items": {"3": null}}))
        );
    }

    #[test]
    fn test_add_path() {
        let cases = [
            (json!({}), vec!["A"], json!({"A": null})),
            (json!({}), vec!["A", "B"], json!({"A": {"B": null}})),
            (json!({"A": null}), vec!["A"], json!({"A": null})),
            (json!({"A": null}), vec!["A", "B"], json!({"A": null})),
            (json!({"A": null}), vec!["B", "C"], json!({"A": null, "B": {"C": null}})),
        ];
        for (start, added, expected) in cases {
            let mut result = pattern(start);
            result.add_path(&path(&added));
            assert_eq!(result, pattern(expected));
        }
    }

    #[test]
    fn test_remove_path() {
        let cases = [
            (json!({"A": null}), vec!["A"], json!({})),
            (json!({"A": {"B": null}}), vec!["A", "B"], json!({})),
            (json!({"A": null}), vec!["A", "B"], json!({"A": null})),
            (json!({"A": null, "B": {"C": null}}), vec!["B", "C"], json!({"A": null})),
        ];
        for (start, removed, expected) in cases {
            let mut result = pattern(start);
            result.remove_path(&path(&removed));
            assert_eq!(result, pattern(expected));
        }
    }

    #[test]
    fn test_union() {
        let cases = [
            (json!({}), json!({}), json!({})),
            (json!({"a": null}), json!({}), json!({"a": null})),
            (json!({}), json!({"b": null}), json!({"b": null})),
            (json!({"a": null}), json!({"b": null}), json!({"a": null, "b": null})),
            (json!({"a": null}), json!({"a": {"b": null}}), json!({"a": null})),
            (json!({"a": {"b": null}}), json!({"a": null}), json!({"a": null})),
            (
                json!({"a": {"b": null}}),
                json!({"a": {"b": {"c": null}}}),
                json!({"a": {"b": null}}),
            ),
            (
                json!({"a": {"b": {"c": null}}}),
                json!({"a": {"b": null}}),
                json!({"a": {"b": null}}),
            ),
            (
                json!({"a": {"b": null}}),
                json!({"a": {"c": null}}),
                json!({"a": {"b": null, "c": null}}),
            ),
        ];
        for (a, b, expected) in cases {
            assert_eq!(pattern(a).union(&pattern(b)), pattern(expected));
        }
    }

    #[test]
    fn test_difference() {
        let cases = [
            (json!({}), json!({}), json!({})),
            (json!({"a": null}), json!({"a": null}), json!({})),
            (json!({}), json!({"b": null}), json!({})),
            (json!({"a": null}), json!({"b": null}), json!({"a": null})),
            (json!({"a": null, "b": null}), json!({"a": null}), json!({"b": null})),
            (json!({"a": null}), json!({"a": {"b": null}}), json!({"a": null})),
            (json!({"a": null}), json!({"a": {"b": {"c": null}}}), json!({"a": null})),
            (json!({"a": {"b": null}}), json!({"a": null}), json!({})),
            (
                json!({"a": {"b": null}}),
                json!({"a": {"b": {"c": null}}}),
                json!({"a": {"b": null}}),
            ),
            (json!({"a": {"b": {"c": null}}}), json!({"a": {"b": {"c": null}}}), json!({})),
            (json!({"a": {"b": {"c": null}}}), json!({"a": {"b": null}}), json!({})),
            (json!({"a": {"b": {"c": null}}}), json!({"a": null}), json!({})),
            (
                json!({"a": {"b": null, "c": null}}),
                json!({"a": {"c": null}}),
                json!({"a": {"b": null}}),
            ),
        ];
        for (a, b, expected) in cases {
            assert_eq!(pattern(a).difference(&pattern(b)), pattern(expected));
        }
    }

    #[test]
    fn test_intersect() {
        let cases = [
            (json!({}), json!({"a": null}), json!({})),
            (json!({"a": null}), json!({"a": null}), json!({"a": null})),
            (json!({"a": null, "b": null}), json!({"b": null, "c": null}), json!({"b": null})),
            (json!({"a": null}), json!({"a": {"b": null}}), json!({"a": {"b": null}})),
            (
                json!({"a": {"b": {"c": null}}}),
                json!({"a": null}),
                json!({"a": {"b": {"c": null}}}),
            ),
            (json!({"a": {"b": null}}), json!({"a": {"c": null}}), json!({})),
            (
                json!({"glyphs": {"A": null, "B": null}}),
                json!({"glyphs": {"B": null, "C": null}, "glyphMap": null}),
                json!({"glyphs": {"B": null}}),
            ),
        ];
        for (a, b, expected) in cases {
            assert_eq!(pattern(a).intersect(&pattern(b)), pattern(expected));
        }
    }

    #[test]
    fn test_normalized_prunes_empty_subtrees() {
        let raw = pattern(json!({"a": {}, "b": {"c": {}}, "d": null}));
        assert_eq!(raw.clone().normalized(), pattern(json!({"d": null})));
        assert_eq!(raw.intersect(&raw), pattern(json!({"d": null})));
    }

    #[test]
    fn test_path_or_pattern_deserialize() {
        let path: PathOrPattern = serde_json::from_value(json!(["glyphs", "A"])).unwrap();
        assert_eq!(path.into_pattern(), pattern(json!({"glyphs": {"A": null}})));

        let whole: PathOrPattern = serde_json::from_value(json!({"glyphMap": null})).unwrap();
        assert_eq!(whole.into_pattern(), pattern(json!({"glyphMap": null})));
    }
}
