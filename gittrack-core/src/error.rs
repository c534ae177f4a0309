use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid tracking target: {0}")]
    InvalidTarget(PathBuf),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Tracking already started")]
    AlreadyTracking,
}

/// Failure to parse a single reflog line. Scoped to that line only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed line: {0}")]
    MalformedLine(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("malformed author: {0}")]
    MalformedAuthor(String),
}
