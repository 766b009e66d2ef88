//! Filesystem-backed storage for a vault
//!
//! All paths crossing the [`Storage`] boundary are normalized and relative
//! to the vault root. `FsStorage` maps them onto the real directory tree.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use walkdir::WalkDir;

use crate::domain::{path, ListedItem};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Path exists but is not a directory: {0}")]
    NotADirectory(String),

    #[error("Destination already exists: {0}")]
    AlreadyExists(String),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Invalid vault path: {0}")]
    InvalidPath(String),

    #[error("Failed to {action} '{path}'")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    fn io(action: &'static str, path: &str, source: io::Error) -> Self {
        StorageError::Io {
            action,
            path: path.to_string(),
            source,
        }
    }
}

/// Durable storage as seen by the archiver
pub trait Storage {
    /// Normalized paths of everything directly inside `dir`; empty if `dir` is missing
    fn list_sibling_names(&self, dir: &str) -> Result<BTreeSet<String>, StorageError>;

    /// Creates `dir` and any missing parents. Fails if a segment is a file.
    fn ensure_directory_exists(&self, dir: &str) -> Result<(), StorageError>;

    /// Moves `from` to `to` without overwriting. A failed move leaves `from` in place.
    fn move_item(&self, from: &str, to: &str) -> Result<(), StorageError>;
}

/// [`Storage`] on the local filesystem, rooted at a vault directory
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the vault root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a vault path onto the filesystem, rejecting `.` and `..` segments
    pub fn resolve(&self, rel: &str) -> Result<PathBuf, StorageError> {
        let normalized = path::normalize(rel);
        let mut full = self.root.clone();
        for segment in normalized.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(StorageError::InvalidPath(rel.to_string()));
            }
            full.push(segment);
        }
        Ok(full)
    }

    /// Latest modification time of the item.
    ///
    /// For a directory this is the newest mtime of any file below it, or the
    /// directory's own mtime when it holds no files.
    pub fn item_mtime(&self, rel: &str) -> Result<SystemTime, StorageError> {
        let full = self.resolve(rel)?;
        let meta = match fs::metadata(&full) {
            Ok(meta) => meta,
            // dangling symlink: use the link itself
            Err(e) if e.kind() == ErrorKind::NotFound => fs::symlink_metadata(&full)
                .map_err(|e| not_found_or(e, "read metadata of", rel))?,
            Err(e) => return Err(StorageError::io("read metadata of", rel, e)),
        };
        let own = meta
            .modified()
            .map_err(|e| StorageError::io("read mtime of", rel, e))?;

        if !meta.is_dir() {
            return Ok(own);
        }

        let newest_file = WalkDir::new(&full)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.metadata().ok()?.modified().ok())
            .max();

        Ok(newest_file.unwrap_or(own))
    }

    /// Lists the non-hidden entries directly inside `dir` with their mtimes
    pub fn list_top_level(&self, dir: &str) -> Result<Vec<ListedItem>, StorageError> {
        let full = self.resolve(dir)?;
        if !full.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&full).map_err(|e| StorageError::io("list", dir, e))?;
        let mut items = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io("list", dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let rel = path::join(dir, &name);
            let modified = self.item_mtime(&rel)?;
            items.push(ListedItem {
                path: rel,
                name,
                modified,
            });
        }

        Ok(items)
    }

    /// Raw entry names in `dir`, hidden ones included
    fn list_all(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        let full = self.resolve(dir)?;
        let entries = match fs::read_dir(&full) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io("list", dir, e)),
        };

        entries
            .map(|entry| {
                entry
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .map_err(|e| StorageError::io("list", dir, e))
            })
            .collect()
    }

    /// Creates a single new directory; fails if anything already exists there
    pub fn create_new_dir(&self, rel: &str) -> Result<(), StorageError> {
        let full = self.resolve(rel)?;
        fs::create_dir(&full).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => StorageError::AlreadyExists(path::normalize(rel)),
            _ => StorageError::io("create directory", rel, e),
        })
    }

    /// Writes a file that must not exist yet
    pub fn write_new_file(&self, rel: &str, content: &str) -> Result<(), StorageError> {
        let full = self.resolve(rel)?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StorageError::AlreadyExists(path::normalize(rel)),
                _ => StorageError::io("create file", rel, e),
            })?;

        file.write_all(content.as_bytes())
            .map_err(|e| StorageError::io("write", rel, e))
    }
}

fn not_found_or(err: io::Error, action: &'static str, rel: &str) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(path::normalize(rel))
    } else {
        StorageError::io(action, rel, err)
    }
}

impl Storage for FsStorage {
    fn list_sibling_names(&self, dir: &str) -> Result<BTreeSet<String>, StorageError> {
        Ok(self
            .list_all(dir)?
            .into_iter()
            .map(|name| path::join(dir, &name))
            .collect())
    }

    fn ensure_directory_exists(&self, dir: &str) -> Result<(), StorageError> {
        let normalized = path::normalize(dir);
        let mut current = String::new();

        for segment in normalized.split('/').filter(|s| !s.is_empty()) {
            current = path::join(&current, segment);
            let full = self.resolve(&current)?;

            match fs::metadata(&full) {
                Ok(meta) if meta.is_dir() => continue,
                Ok(_) => return Err(StorageError::NotADirectory(current)),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::io("inspect", &current, e)),
            }

            match fs::create_dir(&full) {
                Ok(()) => tracing::debug!(dir = %current, "created directory"),
                Err(e) if e.kind() == ErrorKind::AlreadyExists && full.is_dir() => {}
                Err(e) => return Err(StorageError::io("create directory", &current, e)),
            }
        }

        Ok(())
    }

    fn move_item(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let src = self.resolve(from)?;
        let dst = self.resolve(to)?;

        fs::symlink_metadata(&src).map_err(|e| not_found_or(e, "inspect", from))?;

        // Also catches case-folded matches on case-insensitive filesystems
        if fs::symlink_metadata(&dst).is_ok() {
            return Err(StorageError::AlreadyExists(path::normalize(to)));
        }

        fs::rename(&src, &dst).map_err(|e| StorageError::io("move", from, e))
    }
}
