//! Variable-arity policy tuples and the in-memory policy model.
//!
//! # Purpose
//! A [`PolicyTuple`] is one rule as the enforcement engine sees it: a type tag
//! (`p`, `p2`, `g`, `g2`, ...) plus an ordered list of fields. A
//! [`PolicyModel`] groups tuples by section (`p` for policy rules, `g` for
//! role/grouping rules) and then by tag.
use crate::error::{PolicyError, PolicyResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Sections persisted by the adapter, in save order.
pub const SECTIONS: [&str; 2] = ["p", "g"];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct PolicyTuple {
    pub ptype: String,
    pub rule: Vec<String>,
}

impl PolicyTuple {
    pub fn new<S: Into<String>>(ptype: impl Into<String>, rule: impl IntoIterator<Item = S>) -> Self {
        Self {
            ptype: ptype.into(),
            rule: rule.into_iter().map(Into::into).collect(),
        }
    }

    /// Model section this tuple belongs to, derived from the first character
    /// of its tag.
    pub fn section(&self) -> Option<&'static str> {
        section_of(&self.ptype)
    }
}

pub(crate) fn section_of(ptype: &str) -> Option<&'static str> {
    match ptype.chars().next() {
        Some('p') => Some("p"),
        Some('g') => Some("g"),
        _ => None,
    }
}

/// Renders the policy line form, e.g. `p, alice, data1, read`.
impl fmt::Display for PolicyTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ptype)?;
        for field in &self.rule {
            write!(f, ", {field}")?;
        }
        Ok(())
    }
}

impl FromStr for PolicyTuple {
    type Err = PolicyError;

    fn from_str(line: &str) -> PolicyResult<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Err(PolicyError::MalformedLine(line.to_string()));
        }
        let mut tokens = trimmed.split(',').map(str::trim);
        let ptype = tokens.next().unwrap_or_default();
        if ptype.is_empty() {
            return Err(PolicyError::MalformedLine(line.to_string()));
        }
        Ok(Self::new(ptype, tokens))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyModel {
    sections: BTreeMap<String, BTreeMap<String, Vec<Vec<String>>>>,
}

impl PolicyModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tuple under its section and tag. Tuples whose tag maps to no
    /// known section are ignored and `false` is returned.
    pub fn add(&mut self, tuple: PolicyTuple) -> bool {
        let Some(section) = tuple.section() else {
            return false;
        };
        self.sections
            .entry(section.to_string())
            .or_default()
            .entry(tuple.ptype)
            .or_default()
            .push(tuple.rule);
        true
    }

    pub fn rules(&self, section: &str, ptype: &str) -> &[Vec<String>] {
        self.sections
            .get(section)
            .and_then(|tags| tags.get(ptype))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Tags present in a section, in sorted order.
    pub fn ptypes(&self, section: &str) -> Vec<&str> {
        self.sections
            .get(section)
            .map(|tags| tags.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Every rule as a tuple: all `p` rules first, then all `g` rules.
    pub fn tuples(&self) -> Vec<PolicyTuple> {
        let mut out = Vec::with_capacity(self.len());
        for section in SECTIONS {
            let Some(tags) = self.sections.get(section) else {
                continue;
            };
            for (ptype, rules) in tags {
                out.extend(rules.iter().map(|rule| PolicyTuple {
                    ptype: ptype.clone(),
                    rule: rule.clone(),
                }));
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.sections
            .values()
            .flat_map(|tags| tags.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.sections.clear();
    }
}

impl FromIterator<PolicyTuple> for PolicyModel {
    fn from_iter<I: IntoIterator<Item = PolicyTuple>>(iter: I) -> Self {
        let mut model = Self::new();
        for tuple in iter {
            model.add(tuple);
        }
        model
    }
}
