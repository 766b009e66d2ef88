//! PARA categories and the four configured root folders

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::path;

#[derive(Debug, Error, PartialEq)]
pub enum CategoryError {
    #[error("Unknown category '{0}': expected projects, areas, resources or archive")]
    Unknown(String),
}

/// One of the four PARA categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Projects,
    Areas,
    Resources,
    Archive,
}

impl Category {
    /// All categories in validation order
    pub const ALL: [Category; 4] = [
        Category::Projects,
        Category::Areas,
        Category::Resources,
        Category::Archive,
    ];

    /// Categories whose top-level items can be archived
    pub const ACTIVE: [Category; 3] = [Category::Projects, Category::Areas, Category::Resources];

    /// Display label used in conflict messages
    pub fn label(&self) -> &'static str {
        match self {
            Category::Projects => "Projects",
            Category::Areas => "Areas",
            Category::Resources => "Resources",
            Category::Archive => "Archive",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Projects => "projects",
            Category::Areas => "areas",
            Category::Resources => "resources",
            Category::Archive => "archive",
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, Category::Archive)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Category {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "projects" | "project" | "p" => Ok(Category::Projects),
            "areas" | "area" | "a" => Ok(Category::Areas),
            "resources" | "resource" | "r" => Ok(Category::Resources),
            "archive" | "archives" => Ok(Category::Archive),
            _ => Err(CategoryError::Unknown(s.to_string())),
        }
    }
}

/// The four root folders, relative to the vault root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    pub projects: String,
    pub areas: String,
    pub resources: String,
    pub archive: String,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            projects: "Projects".to_string(),
            areas: "Areas".to_string(),
            resources: "Resources".to_string(),
            archive: "Archive".to_string(),
        }
    }
}

impl RootConfig {
    /// Returns the raw configured value for a category
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::Projects => &self.projects,
            Category::Areas => &self.areas,
            Category::Resources => &self.resources,
            Category::Archive => &self.archive,
        }
    }

    /// Returns the normalized root for a category
    pub fn root(&self, category: Category) -> String {
        path::normalize(self.get(category))
    }

    pub fn set(&mut self, category: Category, value: impl Into<String>) {
        let value = value.into();
        match category {
            Category::Projects => self.projects = value,
            Category::Areas => self.areas = value,
            Category::Resources => self.resources = value,
            Category::Archive => self.archive = value,
        }
    }

    /// Returns `(category, normalized root)` for all four roots in order
    pub fn entries(&self) -> [(Category, String); 4] {
        Category::ALL.map(|category| (category, self.root(category)))
    }

    /// Finds the root `item` is a top-level child of, including Archive
    pub fn owning_category(&self, item: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| path::is_top_level_child(item, &self.root(*category)))
    }

    /// Resolves `item` to an archivable item under one of the active roots
    pub fn resolve_item(&self, item: &str) -> Option<ArchivableItem> {
        match self.owning_category(item) {
            Some(root) if !root.is_archive() => Some(ArchivableItem {
                path: path::normalize(item),
                root,
            }),
            _ => None,
        }
    }
}

/// A top-level item together with the root that contains it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivableItem {
    pub path: String,
    pub root: Category,
}

impl ArchivableItem {
    /// The item's own folder or file name
    pub fn name(&self) -> String {
        path::name(&self.path)
    }
}
