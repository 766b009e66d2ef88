//! Sort keys for listing top-level items
//!
//! Items are shown most recent first. Recency comes either from the
//! modification time supplied by storage or from a date embedded at the
//! start of the item name, as described by the configured name format
//! (e.g. `"%Y-%m-%d {name}"`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Write;
use std::time::SystemTime;
use thiserror::Error;

/// Placeholder for the item name inside a name format
pub const NAME_TOKEN: &str = "{name}";

#[derive(Debug, Error, PartialEq)]
pub enum NameFormatError {
    #[error("Invalid date format '{0}' in item name format")]
    InvalidDateFormat(String),
}

/// How top-level items are ordered in listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Newest modification time first
    #[default]
    Recency,
    /// Newest date parsed from the name prefix first, mtime as fallback
    NameDate,
    /// Case-insensitive by name
    Alphabetical,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Recency => "recency",
            SortOrder::NameDate => "name_date",
            SortOrder::Alphabetical => "alphabetical",
        }
    }
}

/// Returns the part of `name_format` before the first `{name}` token.
///
/// Without a token the whole format is returned unchanged.
pub fn extract_date_prefix_format(name_format: &str) -> &str {
    match name_format.find(NAME_TOKEN) {
        Some(idx) => &name_format[..idx],
        None => name_format,
    }
}

/// Orders by descending modification time; equal times compare equal
pub fn compare_by_recency(a: SystemTime, b: SystemTime) -> Ordering {
    b.cmp(&a)
}

/// Parses a date from the start of `name` using `prefix_format`
pub fn parse_name_date(name: &str, prefix_format: &str) -> Option<NaiveDate> {
    if prefix_format.trim().is_empty() {
        return None;
    }
    NaiveDate::parse_and_remainder(name, prefix_format)
        .ok()
        .map(|(date, _)| date)
}

/// Where a sort key's timestamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    NameDate,
    Modified,
}

/// Comparison key for one item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub at: DateTime<Utc>,
    pub source: KeySource,
}

/// Builds the key for an item, preferring a date in its name
pub fn sort_key_for(name: &str, modified: SystemTime, prefix_format: &str) -> SortKey {
    let from_name = parse_name_date(name, prefix_format)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc());

    match from_name {
        Some(at) => SortKey {
            at,
            source: KeySource::NameDate,
        },
        None => SortKey {
            at: DateTime::<Utc>::from(modified),
            source: KeySource::Modified,
        },
    }
}

/// Renders a new item name from `name_format`, e.g. `2024-03-15 Website`
pub fn format_item_name(
    name_format: &str,
    name: &str,
    date: NaiveDate,
) -> Result<String, NameFormatError> {
    let Some(idx) = name_format.find(NAME_TOKEN) else {
        return Ok(name.to_string());
    };

    let prefix = &name_format[..idx];
    let suffix = &name_format[idx + NAME_TOKEN.len()..];

    let mut out = String::new();
    write!(out, "{}", date.format(prefix))
        .map_err(|_| NameFormatError::InvalidDateFormat(prefix.to_string()))?;
    out.push_str(name);
    out.push_str(suffix);
    Ok(out)
}

/// A top-level item as listed from storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedItem {
    pub path: String,
    pub name: String,
    #[serde(skip)]
    pub modified: SystemTime,
}

/// Sorts items in place; ties fall back to name order
pub fn sort_items(items: &mut [ListedItem], order: SortOrder, prefix_format: &str) {
    match order {
        SortOrder::Recency => items.sort_by(|a, b| {
            compare_by_recency(a.modified, b.modified).then_with(|| a.name.cmp(&b.name))
        }),
        SortOrder::NameDate => items.sort_by(|a, b| {
            let ka = sort_key_for(&a.name, a.modified, prefix_format);
            let kb = sort_key_for(&b.name, b.modified, prefix_format);
            kb.at.cmp(&ka.at).then_with(|| a.name.cmp(&b.name))
        }),
        SortOrder::Alphabetical => items.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        }),
    }
}
