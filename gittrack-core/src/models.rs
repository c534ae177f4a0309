use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Hash written as `commit_from` when the update had no previous commit.
pub const NULL_COMMIT: &str = "0000000000000000000000000000000000000000";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSize {
    pub lines_added: usize,
    pub lines_removed: usize,
}

impl ChangeSize {
    pub fn new(lines_added: usize, lines_removed: usize) -> Self {
        Self {
            lines_added,
            lines_removed,
        }
    }

    pub fn churn(&self) -> usize {
        self.lines_added + self.lines_removed
    }
}

/// Everything known about the repository behind one tracked folder.
///
/// `metadata_folder` is the single source of truth for whether tracking is
/// enabled. The watchers only change it through their enable/disable paths,
/// which also take care of the commit and branch fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryState {
    pub tracked_folder: PathBuf,
    pub metadata_folder: Option<PathBuf>,
    pub current_commit: Option<String>,
    pub current_branch: Option<String>,
    pub working_dir_changes: HashMap<PathBuf, ChangeSize>,
    pub index_changes: HashMap<PathBuf, ChangeSize>,
    pub refs: HashMap<PathBuf, String>,
}

impl RepositoryState {
    pub fn new(tracked_folder: PathBuf) -> Self {
        Self {
            tracked_folder,
            metadata_folder: None,
            current_commit: None,
            current_branch: None,
            working_dir_changes: HashMap::new(),
            index_changes: HashMap::new(),
            refs: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.metadata_folder.is_some()
    }

    pub fn enable(&mut self, metadata_folder: PathBuf) {
        self.metadata_folder = Some(metadata_folder);
    }

    pub fn disable(&mut self) {
        self.metadata_folder = None;
        self.current_commit = None;
        self.current_branch = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// One parsed line of `logs/HEAD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflogEntry {
    pub commit_from: String,
    pub commit_to: String,
    pub author: Author,
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl ReflogEntry {
    pub fn is_initial(&self) -> bool {
        !self.commit_from.is_empty() && self.commit_from.bytes().all(|b| b == b'0')
    }
}
