//! # gittrack-core
//!
//! Core library for gittrack - the repository state model, the reflog parser
//! and the lookup of a folder's metadata directory.
//!
//! This crate has no watching logic of its own; it is shared by the watcher
//! crate and the CLI.

pub mod config;
pub mod discovery;
pub mod error;
pub mod models;
pub mod reflog;

pub use config::TrackerConfig;
pub use error::{Error, ParseError, Result};
pub use models::{Author, ChangeSize, ReflogEntry, RepositoryState, NULL_COMMIT};
