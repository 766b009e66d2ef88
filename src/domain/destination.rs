//! Collision-free destination names for archived items
//!
//! Candidates, first free one wins:
//! 1. `{dir}/{name}`
//! 2. `{dir}/{name} (Archived YYYY-MM-DD)`
//! 3. `{dir}/{name} (Archived YYYY-MM-DD) (N)` for N = 2, 3, ...

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

use super::path;

/// Upper bound on the numbered suffix search
pub const MAX_COLLISION_ATTEMPTS: u32 = 1000;

#[derive(Debug, Error, PartialEq)]
pub enum NamingError {
    #[error("Too many collisions while naming '{name}' in '{dir}' ({attempts} numbered candidates taken)")]
    TooManyCollisions {
        dir: String,
        name: String,
        attempts: u32,
    },
}

/// A snapshot of the paths already present in a target directory
pub trait ExistingNames {
    /// True if the normalized `path` is taken
    fn contains_path(&self, path: &str) -> bool;
}

impl ExistingNames for HashSet<String> {
    fn contains_path(&self, path: &str) -> bool {
        self.contains(path)
    }
}

impl ExistingNames for BTreeSet<String> {
    fn contains_path(&self, path: &str) -> bool {
        self.contains(path)
    }
}

/// Label appended to archived names, e.g. `(Archived 2024-03-15)`
pub fn archived_label(date: NaiveDate) -> String {
    format!("(Archived {})", date.format("%Y-%m-%d"))
}

/// Computes the first candidate path not present in `existing`.
///
/// Pure: the caller supplies the date.
pub fn generate_destination(
    target_dir: &str,
    base_name: &str,
    existing: &impl ExistingNames,
    date: NaiveDate,
) -> Result<String, NamingError> {
    let plain = path::join(target_dir, base_name);
    if !existing.contains_path(&plain) {
        return Ok(plain);
    }

    let dated_name = format!("{} {}", path::normalize(base_name), archived_label(date));
    let dated = path::join(target_dir, &dated_name);
    if !existing.contains_path(&dated) {
        return Ok(dated);
    }

    for counter in 2..MAX_COLLISION_ATTEMPTS + 2 {
        let candidate = format!("{} ({})", dated, counter);
        if !existing.contains_path(&candidate) {
            return Ok(candidate);
        }
    }

    Err(NamingError::TooManyCollisions {
        dir: path::normalize(target_dir),
        name: base_name.to_string(),
        attempts: MAX_COLLISION_ATTEMPTS,
    })
}
