//! gNMI path model.
//!
//! Paths are written in the usual string form, e.g.
//! `/interfaces/interface[name=Ethernet1/1]/config/description`. A `/` inside
//! a key predicate belongs to the key value, not to the path structure.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{CfgMgrError, CfgMgrResult};

/// Matches one path element: a name followed by zero or more `[key=value]`.
static ELEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^\[\]=/]+)((?:\[[^\[\]=]+=[^\]]*\])*)$").expect("Invalid regex pattern")
});

/// Matches a single `[key=value]` predicate.
static KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\[\]=]+)=([^\]]*)\]").expect("Invalid regex pattern"));

/// One element of a gNMI path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathElem {
    /// Schema node name.
    pub name: String,
    /// List keys, sorted by key name.
    pub keys: BTreeMap<String, String>,
}

impl PathElem {
    /// Creates an element without keys.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: BTreeMap::new(),
        }
    }

    /// Adds a key predicate.
    pub fn with_key(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.keys.insert(key.into(), value.into());
        self
    }

    /// Returns the value of a key predicate, if present.
    pub fn key(&self, key: &str) -> Option<&str> {
        self.keys.get(key).map(String::as_str)
    }

    fn parse(segment: &str, full: &str) -> CfgMgrResult<Self> {
        let caps = ELEM_RE
            .captures(segment)
            .ok_or_else(|| CfgMgrError::invalid_path(full, format!("bad element '{segment}'")))?;

        let mut elem = PathElem::new(&caps[1]);
        if let Some(preds) = caps.get(2) {
            for kv in KEY_RE.captures_iter(preds.as_str()) {
                elem.keys.insert(kv[1].to_string(), kv[2].to_string());
            }
        }
        Ok(elem)
    }
}

impl fmt::Display for PathElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (k, v) in &self.keys {
            write!(f, "[{k}={v}]")?;
        }
        Ok(())
    }
}

/// A structured gNMI path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GnmiPath {
    elems: Vec<PathElem>,
}

impl GnmiPath {
    /// The root path `/`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a path from elements.
    pub fn from_elems(elems: Vec<PathElem>) -> Self {
        Self { elems }
    }

    /// Parses the string form of a path.
    pub fn parse(s: &str) -> CfgMgrResult<Self> {
        let mut elems = Vec::new();
        for segment in split_segments(s)? {
            elems.push(PathElem::parse(&segment, s)?);
        }
        Ok(Self { elems })
    }

    /// Returns the path elements.
    pub fn elems(&self) -> &[PathElem] {
        &self.elems
    }

    /// Returns true for the root path.
    pub fn is_root(&self) -> bool {
        self.elems.is_empty()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    /// Returns true if the path has no elements.
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Appends `other` to this path (prefix + relative path).
    pub fn join(&self, other: &GnmiPath) -> GnmiPath {
        let mut elems = self.elems.clone();
        elems.extend(other.elems.iter().cloned());
        GnmiPath { elems }
    }

    /// Returns the elements below `prefix`, if this path lies under it.
    pub fn strip_prefix(&self, prefix: &GnmiPath) -> Option<&[PathElem]> {
        if self.elems.len() < prefix.elems.len() {
            return None;
        }
        let (head, tail) = self.elems.split_at(prefix.elems.len());
        (head == prefix.elems.as_slice()).then_some(tail)
    }

    /// Returns true if `self` is a (non-strict) prefix of `other`.
    pub fn is_prefix_of(&self, other: &GnmiPath) -> bool {
        other.strip_prefix(self).is_some()
    }
}

/// Splits a path string on `/`, ignoring separators inside `[...]`.
fn split_segments(s: &str) -> CfgMgrResult<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in s.chars() {
        match c {
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| CfgMgrError::invalid_path(s, "unbalanced ']'"))?;
                current.push(c);
            }
            '/' if depth == 0 => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if depth != 0 {
        return Err(CfgMgrError::invalid_path(s, "unterminated key predicate"));
    }
    segments.push(current);

    // Leading and trailing separators are allowed; empty inner segments are not.
    if segments.first().is_some_and(String::is_empty) {
        segments.remove(0);
    }
    if segments.last().is_some_and(String::is_empty) {
        segments.pop();
    }
    if segments.iter().any(String::is_empty) {
        return Err(CfgMgrError::invalid_path(s, "empty path element"));
    }
    Ok(segments)
}

impl fmt::Display for GnmiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elems.is_empty() {
            return write!(f, "/");
        }
        for elem in &self.elems {
            write!(f, "/{elem}")?;
        }
        Ok(())
    }
}

impl FromStr for GnmiPath {
    type Err = CfgMgrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GnmiPath::parse(s)
    }
}

impl Serialize for GnmiPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
