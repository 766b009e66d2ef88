//! Validation of the four root folders against each other
//!
//! No two roots may be equal, and no root may live inside another.
//! Conflicts are reported as values, never as errors: the caller decides
//! whether to reject an edit or fall back to defaults.

use serde::Serialize;
use std::fmt;

use super::category::{Category, RootConfig};
use super::path;

/// How two roots overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Both roots normalize to the same path
    Same,
    /// One root is an ancestor of the other
    Nested,
}

/// A single conflict between two configured roots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictReport {
    pub kind: ConflictKind,
    pub first: Category,
    pub first_path: String,
    pub second: Category,
    pub second_path: String,
}

impl ConflictReport {
    fn between(first: Category, first_path: &str, second: Category, second_path: &str) -> Self {
        let first_path = path::normalize(first_path);
        let second_path = path::normalize(second_path);
        let kind = if first_path == second_path {
            ConflictKind::Same
        } else {
            ConflictKind::Nested
        };

        Self {
            kind,
            first,
            first_path,
            second,
            second_path,
        }
    }

    /// Human-readable description, e.g. "Projects folder cannot be nested with Areas folder"
    pub fn message(&self) -> String {
        let relation = match self.kind {
            ConflictKind::Same => "cannot be the same as",
            ConflictKind::Nested => "cannot be nested with",
        };
        format!("{} folder {} {} folder", self.first, relation, self.second)
    }

    /// True if the report names the given category on either side
    pub fn involves(&self, category: Category) -> bool {
        self.first == category || self.second == category
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ('{}' and '{}')",
            self.message(),
            self.first_path,
            self.second_path
        )
    }
}

/// Checks all four roots pairwise and reports the first overlap
pub fn validate_root_set(roots: &RootConfig) -> Option<ConflictReport> {
    validate_named_roots(&roots.entries())
}

/// Same as [`validate_root_set`] for an arbitrary list of named roots
pub fn validate_named_roots(roots: &[(Category, String)]) -> Option<ConflictReport> {
    let paths: Vec<&str> = roots.iter().map(|(_, p)| p.as_str()).collect();
    let (i, j) = path::find_first_nested_pair(&paths)?;
    let (first, first_path) = &roots[i];
    let (second, second_path) = &roots[j];
    Some(ConflictReport::between(*first, first_path, *second, second_path))
}

/// Checks a candidate value for `field` against the other three current roots.
///
/// The field's own current value is ignored, so this works on a single
/// settings edit even when the stored set is not yet consistent.
pub fn validate_single_field_change(
    candidate: &str,
    field: Category,
    current: &RootConfig,
) -> Option<ConflictReport> {
    Category::ALL
        .into_iter()
        .filter(|other| *other != field)
        .find_map(|other| {
            let other_path = current.root(other);
            path::is_nested(candidate, &other_path)
                .then(|| ConflictReport::between(field, candidate, other, &other_path))
        })
}
