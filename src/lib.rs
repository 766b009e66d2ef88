//! para-cli - A local-first PARA folder organizer
//!
//! Keeps a vault split into Projects, Areas, Resources and Archive roots.
//! The roots are validated so they never overlap, and top-level items
//! are archived into a parallel structure without overwriting anything.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{Category, ConflictReport, RootConfig};
pub use storage::{Archiver, Storage, Vault};
