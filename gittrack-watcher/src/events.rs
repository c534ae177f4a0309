use gittrack_core::ReflogEntry;
use notify_debouncer_full::DebounceEventResult;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

/// Notifications published by a tracker.
///
/// Only the transitions the tracker actually observes are modelled here.
/// Branch, tag, remote and merge level events are not available yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackerEvent {
    /// `is_enabled` flipped, or a disable was announced again. Read the
    /// tracker state for the new value.
    RepositoryEnabledChanged,
    /// New, successfully parsed `logs/HEAD` lines in file order.
    HistoryEntriesAppended { entries: Vec<ReflogEntry> },
    /// A file below `refs/` was modified.
    RefPathChanged { path: PathBuf },
    Diagnostic { diagnostic: Diagnostic },
}

/// Recoverable problems. None of them stop tracking.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error("watch error on {location:?}: {message}")]
    WatchError { location: PathBuf, message: String },

    #[error("could not parse reflog line {line:?}: {error}")]
    ParseFailed { line: String, error: String },

    #[error("could not read {path:?}: {message}")]
    HistoryReadFailed { path: PathBuf, message: String },

    #[error("could not open repository at {path:?}: {message}")]
    RepositoryOpenFailed { path: PathBuf, message: String },

    #[error("could not enable tracking of {path:?}: {message}")]
    EnableFailed { path: PathBuf, message: String },
}

/// Work items produced by the filesystem watches. All of them are handled by
/// a single consumer so state changes never interleave.
pub(crate) enum WatchMessage {
    Root(notify::Result<notify::Event>),
    Settled(PathBuf),
    HeadLog {
        generation: u64,
        result: DebounceEventResult,
    },
    Refs {
        generation: u64,
        result: DebounceEventResult,
    },
}

#[derive(Clone)]
pub(crate) struct EventSink {
    sender: broadcast::Sender<TrackerEvent>,
}

impl EventSink {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn emit(&self, event: TrackerEvent) {
        // Fails only when nobody is subscribed.
        let _ = self.sender.send(event);
    }

    pub(crate) fn diagnostic(&self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.emit(TrackerEvent::Diagnostic { diagnostic });
    }
}
