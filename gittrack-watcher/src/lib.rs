//! # gittrack-watcher
//!
//! Watches a folder for git repository activity. A [`DiscoveryWatcher`]
//! notices when the folder becomes (or stops being) part of a repository, and
//! while it is, a [`RepositoryWatcher`] reports reflog appends and ref
//! changes as [`TrackerEvent`]s.

pub mod engine;
pub mod events;
pub mod tracker;
pub mod watcher;

pub use engine::{Git2Engine, RepositoryEngine, RepositoryHandle};
pub use events::{Diagnostic, TrackerEvent};
pub use tracker::DiscoveryWatcher;
pub use watcher::RepositoryWatcher;
