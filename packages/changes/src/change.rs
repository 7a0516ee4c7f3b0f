//! # Change values
//!
//! A change is a small recursive patch addressed by a path:
//!
//! ```text
//! {"p": ["glyphs", "A", "layers", "default", "glyph", "path"],
//!  "f": "=xy",
//!  "a": [3, 120, 40],
//!  "c": [ ...nested changes, applied at the same subject... ]}
//! ```
//!
//! Every key is optional on the wire. Empty arrays and an absent function
//! are omitted when serializing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// One step of a change path: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(i64),
    Key(String),
}

impl PathSegment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(key) => Some(key),
            PathSegment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<i64> {
        match self {
            PathSegment::Index(index) => Some(*index),
            PathSegment::Key(_) => None,
        }
    }

    /// Key form used by patterns and mappings; indices use their decimal text.
    pub fn to_key(&self) -> String {
        self.to_string()
    }

    /// Convert a change argument into a path segment.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(key) => Some(PathSegment::Key(key.clone())),
            Value::Number(number) => number.as_i64().map(PathSegment::Index),
            _ => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(index) => write!(f, "{}", index),
            PathSegment::Key(key) => f.write_str(key),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<i64> for PathSegment {
    fn from(index: i64) -> Self {
        PathSegment::Index(index)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index as i64)
    }
}

/// Structured incremental patch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Change {
    #[serde(rename = "p", default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,

    #[serde(rename = "f", default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    #[serde(rename = "a", default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<Value>,

    #[serde(rename = "c", default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Change>,
}

impl Change {
    /// Leaf change invoking `function` at `path`
    pub fn new<P, S>(path: P, function: impl Into<String>, arguments: Vec<Value>) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            function: Some(function.into()),
            arguments,
            children: Vec::new(),
        }
    }

    /// Container change grouping `children` under `path`
    pub fn with_children<P, S>(path: P, children: Vec<Change>) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            function: None,
            arguments: Vec::new(),
            children,
        }
    }

    /// A change with no function and no children does nothing.
    pub fn is_noop(&self) -> bool {
        self.function.is_none() && self.children.iter().all(Change::is_noop)
    }

    /// Canonical form of a (possibly filtered) change.
    ///
    /// A container with a single child is folded into that child, its path
    /// prefixed with the container's path. A container without children is
    /// no change at all.
    pub fn normalized(self) -> Option<Change> {
        if self.function.is_some() {
            return Some(self);
        }
        let Change {
            path,
            mut children,
            ..
        } = self;
        match children.len() {
            0 => None,
            1 => {
                let mut only_child = children.remove(0);
                let mut joined = path;
                joined.append(&mut only_child.path);
                only_child.path = joined;
                Some(only_child)
            }
            _ => Some(Change {
                path,
                function: None,
                arguments: Vec::new(),
                children,
            }),
        }
    }
}

/// All distinct path prefixes of exactly `depth` segments that `change`
/// reaches, sorted. Paths shorter than `depth` contribute nothing.
pub fn collect_change_paths(change: &Change, depth: usize) -> Vec<Vec<PathSegment>> {
    let mut paths = BTreeSet::new();
    collect_paths_into(change, depth, &[], &mut paths);
    paths.into_iter().collect()
}

fn collect_paths_into(
    change: &Change,
    depth: usize,
    prefix: &[PathSegment],
    paths: &mut BTreeSet<Vec<PathSegment>>,
) {
    let mut path = prefix.to_vec();
    path.extend(change.path.iter().cloned());
    if path.len() >= depth {
        path.truncate(depth);
        paths.insert(path);
        return;
    }
    for child in &change.children {
        collect_paths_into(child, depth, &path, paths);
    }
}
