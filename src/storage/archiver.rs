//! Archiving top-level items
//!
//! An item `{root}/{name}` moves to `{archive}/{root name}/{name}`, with a
//! dated suffix when that name is taken. The existing-name snapshot can be
//! stale, and case-insensitive filesystems fold names together, so a failed
//! move is retried with the failed destination marked as taken. Failures
//! are not classified: every error is retried until the attempt budget is
//! spent, then the last error is returned unchanged.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use chrono::{Local, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use super::fs::{Storage, StorageError};
use crate::domain::{
    generate_destination, path, validate_root_set, Category, ConflictReport, NamingError,
    RootConfig,
};

/// Total move attempts per archive request
pub const MAX_MOVE_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("'{0}' is not a top-level item of the Projects, Areas or Resources folder")]
    NotUnderManagedRoot(String),

    #[error("'{0}' is already in the Archive folder")]
    AlreadyArchived(String),

    #[error("Cannot archive with conflicting root folders: {0}")]
    ConflictingRoots(ConflictReport),

    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result of an archive request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArchiveOutcome {
    /// The item was moved
    Archived {
        from: String,
        to: String,
        attempts: u32,
    },
    /// Another request for the same path is still running; nothing was done
    AlreadyInProgress { path: String },
}

impl ArchiveOutcome {
    /// Final destination, if the item was moved
    pub fn destination(&self) -> Option<&str> {
        match self {
            ArchiveOutcome::Archived { to, .. } => Some(to),
            ArchiveOutcome::AlreadyInProgress { .. } => None,
        }
    }
}

/// Moves items into the archive, one request per path at a time
#[derive(Debug, Default)]
pub struct Archiver {
    in_flight: Mutex<HashSet<String>>,
}

/// Holds a path in the in-flight set until dropped
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    path: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.path);
    }
}

impl Archiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a request for `item` is running
    pub fn is_archiving(&self, item: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&path::normalize(item))
    }

    fn begin(&self, key: &str) -> Option<InFlight<'_>> {
        let mut set = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(key.to_string()) {
            return None;
        }
        Some(InFlight {
            set: &self.in_flight,
            path: key.to_string(),
        })
    }

    /// Archives `item` using today's local date for suffixes
    pub fn archive(
        &self,
        item: &str,
        roots: &RootConfig,
        storage: &impl Storage,
    ) -> Result<ArchiveOutcome, ArchiveError> {
        self.archive_on(item, roots, storage, Local::now().date_naive())
    }

    /// Archives `item`, using `today` for any `(Archived ...)` suffix
    pub fn archive_on(
        &self,
        item: &str,
        roots: &RootConfig,
        storage: &impl Storage,
        today: NaiveDate,
    ) -> Result<ArchiveOutcome, ArchiveError> {
        let key = path::normalize(item);

        let Some(_guard) = self.begin(&key) else {
            tracing::debug!(item = %key, "archive already in progress, ignoring request");
            return Ok(ArchiveOutcome::AlreadyInProgress { path: key });
        };

        if let Some(conflict) = validate_root_set(roots) {
            return Err(ArchiveError::ConflictingRoots(conflict));
        }

        let item = match roots.resolve_item(&key) {
            Some(item) => item,
            None if roots.owning_category(&key) == Some(Category::Archive) => {
                return Err(ArchiveError::AlreadyArchived(key));
            }
            None => return Err(ArchiveError::NotUnderManagedRoot(key)),
        };

        let archive_dir = path::join(&roots.root(Category::Archive), item.root.label());

        storage.ensure_directory_exists(&archive_dir)?;
        let mut existing = storage.list_sibling_names(&archive_dir)?;
        let base_name = item.name();

        let mut attempts = 0;
        loop {
            attempts += 1;
            let destination = generate_destination(&archive_dir, &base_name, &existing, today)?;
            tracing::debug!(item = %item.path, %destination, attempt = attempts, "moving item");

            match storage.move_item(&item.path, &destination) {
                Ok(()) => {
                    tracing::info!(item = %item.path, %destination, attempts, "archived item");
                    return Ok(ArchiveOutcome::Archived {
                        from: item.path,
                        to: destination,
                        attempts,
                    });
                }
                Err(err) if attempts < MAX_MOVE_ATTEMPTS => {
                    tracing::warn!(
                        item = %item.path,
                        %destination,
                        error = %err,
                        "move failed, retrying with a new destination"
                    );
                    existing.insert(destination);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::thread;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    /// In-memory storage; entries are full paths, folders are implied
    #[derive(Default)]
    struct MemStorage {
        entries: RefCell<BTreeSet<String>>,
        dirs: RefCell<BTreeSet<String>>,
        files: RefCell<BTreeSet<String>>,
        /// Destinations that fail as if already taken, case-folded
        hidden: RefCell<BTreeSet<String>>,
        fail_all_moves: Cell<bool>,
        moves: RefCell<Vec<(String, String)>>,
    }

    impl MemStorage {
        fn with(entries: &[&str]) -> Self {
            let storage = Self::default();
            for entry in entries {
                storage.entries.borrow_mut().insert(entry.to_string());
            }
            storage
        }

        fn has(&self, path: &str) -> bool {
            self.entries.borrow().contains(path)
        }
    }

    impl Storage for MemStorage {
        fn list_sibling_names(&self, dir: &str) -> Result<BTreeSet<String>, StorageError> {
            Ok(self
                .entries
                .borrow()
                .iter()
                .filter(|e| path::parent(e) == dir)
                .cloned()
                .collect())
        }

        fn ensure_directory_exists(&self, dir: &str) -> Result<(), StorageError> {
            if self.files.borrow().contains(path::parent(dir).as_str()) {
                return Err(StorageError::NotADirectory(path::parent(dir)));
            }
            self.dirs.borrow_mut().insert(dir.to_string());
            Ok(())
        }

        fn move_item(&self, from: &str, to: &str) -> Result<(), StorageError> {
            self.moves.borrow_mut().push((from.to_string(), to.to_string()));
            if self.fail_all_moves.get() {
                return Err(StorageError::Io {
                    action: "move",
                    path: from.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            let folded = to.to_lowercase();
            if self.has(to) || self.hidden.borrow().contains(&folded) {
                return Err(StorageError::AlreadyExists(to.to_string()));
            }
            let mut entries = self.entries.borrow_mut();
            entries.remove(from);
            entries.insert(to.to_string());
            Ok(())
        }
    }

    #[test]
    fn archives_into_category_subfolder() {
        let storage = MemStorage::with(&["Projects/Site"]);
        let archiver = Archiver::new();

        let outcome = archiver
            .archive_on("Projects/Site", &RootConfig::default(), &storage, date())
            .unwrap();

        assert_eq!(
            outcome,
            ArchiveOutcome::Archived {
                from: "Projects/Site".to_string(),
                to: "Archive/Projects/Site".to_string(),
                attempts: 1,
            }
        );
        assert!(storage.dirs.borrow().contains("Archive/Projects"));
        assert!(storage.has("Archive/Projects/Site"));
        assert!(!storage.has("Projects/Site"));
    }

    #[test]
    fn subfolder_is_named_after_category() {
        let roots = RootConfig {
            projects: "Work/1 Projects".to_string(),
            areas: "Work/2 Areas".to_string(),
            resources: "3 Resources".to_string(),
            archive: "/4 Archive/".to_string(),
        };
        let storage = MemStorage::with(&["Work/2 Areas/Health"]);

        let outcome = Archiver::new()
            .archive_on("Work\\2 Areas\\Health", &roots, &storage, date())
            .unwrap();
        assert_eq!(outcome.destination(), Some("4 Archive/Areas/Health"));
    }

    #[test]
    fn roots_sharing_last_segment_archive_apart() {
        let roots = RootConfig {
            projects: "Work/Notes".to_string(),
            areas: "Life/Notes".to_string(),
            ..RootConfig::default()
        };
        let storage = MemStorage::with(&["Work/Notes/Plan", "Life/Notes/Plan"]);
        let archiver = Archiver::new();

        let from_projects = archiver
            .archive_on("Work/Notes/Plan", &roots, &storage, date())
            .unwrap();
        let from_areas = archiver
            .archive_on("Life/Notes/Plan", &roots, &storage, date())
            .unwrap();

        assert_eq!(from_projects.destination(), Some("Archive/Projects/Plan"));
        assert_eq!(from_areas.destination(), Some("Archive/Areas/Plan"));
        assert!(storage.has("Archive/Projects/Plan"));
        assert!(storage.has("Archive/Areas/Plan"));
    }

    #[test]
    fn existing_name_gets_dated_suffix() {
        let storage = MemStorage::with(&["Projects/Site", "Archive/Projects/Site"]);

        let outcome = Archiver::new()
            .archive_on("Projects/Site", &RootConfig::default(), &storage, date())
            .unwrap();
        assert_eq!(
            outcome.destination(),
            Some("Archive/Projects/Site (Archived 2024-03-15)")
        );
    }

    #[test]
    fn retries_after_hidden_collision() {
        let storage = MemStorage::with(&["Projects/Site"]);
        storage
            .hidden
            .borrow_mut()
            .insert("archive/projects/site".to_string());

        let outcome = Archiver::new()
            .archive_on("Projects/Site", &RootConfig::default(), &storage, date())
            .unwrap();

        assert_eq!(
            outcome,
            ArchiveOutcome::Archived {
                from: "Projects/Site".to_string(),
                to: "Archive/Projects/Site (Archived 2024-03-15)".to_string(),
                attempts: 2,
            }
        );
    }

    #[test]
    fn gives_up_after_three_attempts_with_original_error() {
        let storage = MemStorage::with(&["Projects/Site"]);
        storage.fail_all_moves.set(true);

        let err = Archiver::new()
            .archive_on("Projects/Site", &RootConfig::default(), &storage, date())
            .unwrap_err();

        assert!(matches!(err, ArchiveError::Storage(StorageError::Io { .. })));
        assert_eq!(err.to_string(), "Failed to move 'Projects/Site'");

        let moves = storage.moves.borrow();
        let targets: Vec<_> = moves.iter().map(|(_, to)| to.as_str()).collect();
        assert_eq!(
            targets,
            vec![
                "Archive/Projects/Site",
                "Archive/Projects/Site (Archived 2024-03-15)",
                "Archive/Projects/Site (Archived 2024-03-15) (2)",
            ]
        );
        assert!(storage.has("Projects/Site"));
    }

    #[test]
    fn rejects_items_outside_roots() {
        let storage = MemStorage::with(&["Projects/Site/notes.md"]);
        let archiver = Archiver::new();
        let roots = RootConfig::default();

        let err = archiver
            .archive_on("Projects/Site/notes.md", &roots, &storage, date())
            .unwrap_err();
        assert!(matches!(err, ArchiveError::NotUnderManagedRoot(ref p) if p == "Projects/Site/notes.md"));

        let err = archiver.archive_on("Projects", &roots, &storage, date()).unwrap_err();
        assert!(matches!(err, ArchiveError::NotUnderManagedRoot(_)));

        let err = archiver
            .archive_on("Archive/Projects", &roots, &storage, date())
            .unwrap_err();
        assert!(matches!(err, ArchiveError::AlreadyArchived(_)));

        assert!(storage.moves.borrow().is_empty());
        assert!(!archiver.is_archiving("Projects/Site/notes.md"));
    }

    #[test]
    fn rejects_conflicting_roots() {
        let mut roots = RootConfig::default();
        roots.archive = "Projects/Archive".to_string();
        let storage = MemStorage::with(&["Projects/Site"]);

        let err = Archiver::new()
            .archive_on("Projects/Site", &roots, &storage, date())
            .unwrap_err();
        assert!(matches!(err, ArchiveError::ConflictingRoots(_)));
    }

    #[test]
    fn directory_failure_is_propagated() {
        let storage = MemStorage::with(&["Projects/Site"]);
        storage.files.borrow_mut().insert("Archive".to_string());

        let err = Archiver::new()
            .archive_on("Projects/Site", &RootConfig::default(), &storage, date())
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Storage(StorageError::NotADirectory(_))));
        assert!(storage.moves.borrow().is_empty());
    }

    #[test]
    fn sequential_archives_get_numbered_names() {
        let storage = MemStorage::default();
        let archiver = Archiver::new();
        let roots = RootConfig::default();
        let mut destinations = Vec::new();

        for _ in 0..3 {
            storage.entries.borrow_mut().insert("Projects/Launch".to_string());
            let outcome = archiver
                .archive_on("Projects/Launch", &roots, &storage, date())
                .unwrap();
            destinations.push(outcome.destination().unwrap().to_string());
        }

        assert_eq!(
            destinations,
            vec![
                "Archive/Projects/Launch",
                "Archive/Projects/Launch (Archived 2024-03-15)",
                "Archive/Projects/Launch (Archived 2024-03-15) (2)",
            ]
        );
    }

    /// Storage whose move re-enters the archiver for the same item
    struct ReentrantStorage<'a> {
        inner: MemStorage,
        archiver: &'a Archiver,
        nested: RefCell<Option<ArchiveOutcome>>,
    }

    impl Storage for ReentrantStorage<'_> {
        fn list_sibling_names(&self, dir: &str) -> Result<BTreeSet<String>, StorageError> {
            self.inner.list_sibling_names(dir)
        }

        fn ensure_directory_exists(&self, dir: &str) -> Result<(), StorageError> {
            self.inner.ensure_directory_exists(dir)
        }

        fn move_item(&self, from: &str, to: &str) -> Result<(), StorageError> {
            if self.nested.borrow().is_none() {
                let outcome = self
                    .archiver
                    .archive_on(from, &RootConfig::default(), self, date())
                    .map_err(|_| StorageError::NotFound(from.to_string()))?;
                *self.nested.borrow_mut() = Some(outcome);
            }
            self.inner.move_item(from, to)
        }
    }

    #[test]
    fn second_request_during_archive_is_ignored() {
        let archiver = Archiver::new();
        let storage = ReentrantStorage {
            inner: MemStorage::with(&["Projects/Site"]),
            archiver: &archiver,
            nested: RefCell::new(None),
        };

        let outcome = archiver
            .archive_on("Projects/Site", &RootConfig::default(), &storage, date())
            .unwrap();

        assert_eq!(outcome.destination(), Some("Archive/Projects/Site"));
        assert_eq!(
            *storage.nested.borrow(),
            Some(ArchiveOutcome::AlreadyInProgress {
                path: "Projects/Site".to_string()
            })
        );
        assert_eq!(storage.inner.moves.borrow().len(), 1);
        assert!(!archiver.is_archiving("Projects/Site"));
    }

    /// Thread-safe storage whose first move blocks until released
    struct GatedStorage {
        entered: Mutex<Option<mpsc::Sender<()>>>,
        release: Mutex<mpsc::Receiver<()>>,
        moves: Mutex<u32>,
    }

    impl Storage for GatedStorage {
        fn list_sibling_names(&self, _dir: &str) -> Result<BTreeSet<String>, StorageError> {
            Ok(BTreeSet::new())
        }

        fn ensure_directory_exists(&self, _dir: &str) -> Result<(), StorageError> {
            Ok(())
        }

        fn move_item(&self, _from: &str, _to: &str) -> Result<(), StorageError> {
            if let Some(entered) = self.entered.lock().unwrap().take() {
                entered.send(()).unwrap();
                self.release.lock().unwrap().recv().unwrap();
            }
            *self.moves.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[test]
    fn concurrent_requests_move_once() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let storage = Arc::new(GatedStorage {
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(release_rx),
            moves: Mutex::new(0),
        });
        let archiver = Arc::new(Archiver::new());

        let first = {
            let storage = Arc::clone(&storage);
            let archiver = Arc::clone(&archiver);
            thread::spawn(move || {
                archiver.archive_on("Projects/Site", &RootConfig::default(), &*storage, date())
            })
        };

        entered_rx.recv().unwrap();
        assert!(archiver.is_archiving("/Projects/Site/"));

        let second = archiver
            .archive_on("Projects/Site", &RootConfig::default(), &*storage, date())
            .unwrap();
        assert_eq!(
            second,
            ArchiveOutcome::AlreadyInProgress {
                path: "Projects/Site".to_string()
            }
        );

        release_tx.send(()).unwrap();
        let first = first.join().unwrap().unwrap();

        assert_eq!(first.destination(), Some("Archive/Projects/Site"));
        assert_eq!(*storage.moves.lock().unwrap(), 1);
        assert!(!archiver.is_archiving("Projects/Site"));
    }

    #[test]
    fn guard_released_after_error() {
        let storage = MemStorage::with(&["Projects/Site"]);
        storage.fail_all_moves.set(true);
        let archiver = Archiver::new();

        assert!(archiver
            .archive_on("Projects/Site", &RootConfig::default(), &storage, date())
            .is_err());
        assert!(!archiver.is_archiving("Projects/Site"));

        storage.fail_all_moves.set(false);
        let outcome = archiver
            .archive_on("Projects/Site", &RootConfig::default(), &storage, date())
            .unwrap();
        assert!(outcome.destination().is_some());
    }
}
