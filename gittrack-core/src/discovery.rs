use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the metadata directory inside a working copy.
pub const METADATA_DIR_NAME: &str = ".git";

/// Relative paths inside the metadata directory that tracking relies on.
pub const INDEX_FILE: &str = "index";
pub const LOGS_DIR: &str = "logs";
pub const HEAD_LOG_FILE: &str = "HEAD";
pub const REFS_DIR: &str = "refs";

/// Walks upward from `start`, the folder itself first, and returns the first
/// `.git` directory found. Stops at the filesystem root.
pub fn find_metadata_dir(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors() {
        let candidate = dir.join(METADATA_DIR_NAME);
        if candidate.is_dir() {
            debug!("Found metadata directory {:?}", candidate);
            return Some(candidate);
        }
    }

    None
}

pub fn is_metadata_dir_name(path: &Path) -> bool {
    path.file_name()
        .map(|name| name == METADATA_DIR_NAME)
        .unwrap_or(false)
}
