pub mod reflog;
pub mod status;
pub mod watch;

use std::path::{Path, PathBuf};

pub fn resolve_path(path: &Path) -> anyhow::Result<PathBuf> {
    Ok(std::fs::canonicalize(path)?)
}
