//! The repository engine is the only way the tracker looks inside a
//! repository. It is opened on enable and closed (dropped) on disable.

use git2::Repository;
use gittrack_core::Error;
use std::path::Path;

pub trait RepositoryHandle: Send {
    fn head_commit(&self) -> Option<String>;
    fn head_branch(&self) -> Option<String>;
}

pub trait RepositoryEngine: Send + Sync {
    /// Fails when `metadata_folder` is not a usable repository.
    fn open(&self, metadata_folder: &Path) -> anyhow::Result<Box<dyn RepositoryHandle>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Engine;

impl RepositoryEngine for Git2Engine {
    fn open(&self, metadata_folder: &Path) -> anyhow::Result<Box<dyn RepositoryHandle>> {
        let repo = Repository::open(metadata_folder).map_err(|e| {
            Error::Repository(format!("{}: {}", metadata_folder.display(), e.message()))
        })?;
        Ok(Box::new(Git2Handle { repo }))
    }
}

struct Git2Handle {
    repo: Repository,
}

impl RepositoryHandle for Git2Handle {
    fn head_commit(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        let commit = head.peel_to_commit().ok()?;
        Some(commit.id().to_string())
    }

    fn head_branch(&self) -> Option<String> {
        let head = self.repo.find_reference("HEAD").ok()?;
        let target = head.symbolic_target()?;
        Some(target.strip_prefix("refs/heads/").unwrap_or(target).to_string())
    }
}
