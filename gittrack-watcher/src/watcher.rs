use crate::engine::{RepositoryEngine, RepositoryHandle};
use crate::events::{Diagnostic, EventSink, TrackerEvent, WatchMessage};
use gittrack_core::discovery::{HEAD_LOG_FILE, INDEX_FILE, LOGS_DIR, REFS_DIR};
use gittrack_core::{reflog, Error, ReflogEntry, RepositoryState, Result, TrackerConfig};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_full::{
    new_debouncer, DebounceEventResult, DebouncedEvent, Debouncer, FileIdMap,
};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

type MetadataDebouncer = Debouncer<RecommendedWatcher, FileIdMap>;

/// Watches the pieces of an active metadata directory that change on every
/// repository operation: the `logs/HEAD` history log and the `refs` tree.
///
/// Lines already present in `logs/HEAD` when the watcher starts are recorded
/// as seen and never reported. Every later re-read reports only lines whose
/// raw text has not been seen before.
pub struct RepositoryWatcher {
    generation: u64,
    metadata_folder: PathBuf,
    head_log: PathBuf,
    seen_lines: HashSet<String>,
    last_commit: Option<String>,
    handle: Option<Box<dyn RepositoryHandle>>,
    head_debouncer: Option<MetadataDebouncer>,
    refs_debouncer: Option<MetadataDebouncer>,
    events: EventSink,
    disposed: bool,
}

impl RepositoryWatcher {
    pub(crate) fn new(
        state: &RepositoryState,
        generation: u64,
        engine: &dyn RepositoryEngine,
        config: &TrackerConfig,
        messages: &UnboundedSender<WatchMessage>,
        events: EventSink,
    ) -> Result<Self> {
        let metadata_folder = state
            .metadata_folder
            .clone()
            .ok_or_else(|| Error::InvalidTarget(state.tracked_folder.clone()))?;
        let logs_dir = metadata_folder.join(LOGS_DIR);
        let refs_dir = metadata_folder.join(REFS_DIR);
        let head_log = logs_dir.join(HEAD_LOG_FILE);

        Self::ensure_skeleton(&metadata_folder)?;

        let handle = match engine.open(&metadata_folder) {
            Ok(handle) => Some(handle),
            Err(e) => {
                events.diagnostic(Diagnostic::RepositoryOpenFailed {
                    path: metadata_folder.clone(),
                    message: format!("{e:#}"),
                });
                None
            }
        };

        let mut watcher = Self {
            generation,
            metadata_folder,
            head_log,
            seen_lines: HashSet::new(),
            last_commit: None,
            handle,
            head_debouncer: None,
            refs_debouncer: None,
            events,
            disposed: false,
        };

        let initial = watcher.read_new_lines()?;
        watcher.last_commit = initial
            .iter()
            .rev()
            .find_map(|line| reflog::parse(line).ok())
            .map(|entry| entry.commit_to);
        debug!(
            "Recorded {} existing reflog lines in {:?}",
            initial.len(),
            watcher.head_log
        );

        let head_messages = messages.clone();
        watcher.head_debouncer = Some(Self::watch(
            &logs_dir,
            RecursiveMode::NonRecursive,
            config,
            move |result| {
                if head_messages
                    .send(WatchMessage::HeadLog { generation, result })
                    .is_err()
                {
                    debug!("Tracker gone, dropping history log event");
                }
            },
        )?);

        let refs_messages = messages.clone();
        watcher.refs_debouncer = Some(Self::watch(
            &refs_dir,
            RecursiveMode::Recursive,
            config,
            move |result| {
                if refs_messages
                    .send(WatchMessage::Refs { generation, result })
                    .is_err()
                {
                    debug!("Tracker gone, dropping refs event");
                }
            },
        )?);

        info!("Repository watcher started for {:?}", watcher.metadata_folder);

        Ok(watcher)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn metadata_folder(&self) -> &Path {
        &self.metadata_folder
    }

    pub fn current_commit(&self) -> Option<String> {
        self.handle
            .as_ref()
            .and_then(|handle| handle.head_commit())
            .or_else(|| self.last_commit.clone())
    }

    pub fn current_branch(&self) -> Option<String> {
        self.handle.as_ref().and_then(|handle| handle.head_branch())
    }

    /// Handles a batch from the `logs` watch. Returns true when new history
    /// entries were dispatched.
    pub(crate) fn handle_head_log(&mut self, result: DebounceEventResult) -> bool {
        let events = match result {
            Ok(events) => events,
            Err(errors) => {
                self.report_watch_errors(&self.head_log, errors);
                return false;
            }
        };

        let mut relevant = false;
        for event in &events {
            if event.need_rescan() {
                self.report_rescan(&self.head_log);
                relevant = true;
            }
            if Self::touches_head_log(event) {
                relevant = true;
            }
        }

        relevant && !self.refresh_history().is_empty()
    }

    /// Handles a batch from the `refs` watch.
    pub(crate) fn handle_refs(&mut self, result: DebounceEventResult) {
        let events = match result {
            Ok(events) => events,
            Err(errors) => {
                let refs_dir = self.metadata_folder.join(REFS_DIR);
                self.report_watch_errors(&refs_dir, errors);
                return;
            }
        };

        for event in events {
            if event.need_rescan() {
                let refs_dir = self.metadata_folder.join(REFS_DIR);
                self.report_rescan(&refs_dir);
            }
            if !matches!(event.kind, EventKind::Modify(_)) {
                continue;
            }
            for path in &event.paths {
                if path.is_dir() {
                    continue;
                }
                debug!("Ref changed: {:?}", path);
                self.events
                    .emit(TrackerEvent::RefPathChanged { path: path.clone() });
            }
        }
    }

    /// Re-reads `logs/HEAD` and dispatches every line not seen before.
    ///
    /// Lines that fail to parse are reported as diagnostics and stay marked
    /// as seen, so they are not retried.
    pub fn refresh_history(&mut self) -> Vec<ReflogEntry> {
        let lines = match self.read_new_lines() {
            Ok(lines) => lines,
            Err(e) => {
                self.events.diagnostic(Diagnostic::HistoryReadFailed {
                    path: self.head_log.clone(),
                    message: e.to_string(),
                });
                return Vec::new();
            }
        };

        let mut entries = Vec::with_capacity(lines.len());
        for line in lines {
            match reflog::parse(&line) {
                Ok(entry) => entries.push(entry),
                Err(error) => self.events.diagnostic(Diagnostic::ParseFailed {
                    line,
                    error: error.to_string(),
                }),
            }
        }

        if let Some(last) = entries.last() {
            info!("{} new reflog entries", entries.len());
            self.last_commit = Some(last.commit_to.clone());
            self.events.emit(TrackerEvent::HistoryEntriesAppended {
                entries: entries.clone(),
            });
        }

        entries
    }

    /// Stops both watches and closes the repository handle.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        self.head_debouncer.take();
        self.refs_debouncer.take();
        self.handle.take();

        info!("Repository watcher stopped for {:?}", self.metadata_folder);
    }

    fn read_new_lines(&mut self) -> Result<Vec<String>> {
        let content = fs::read(&self.head_log)?;
        let content = String::from_utf8_lossy(&content);

        let mut new_lines = Vec::new();
        for line in content.lines() {
            if line.is_empty() {
                continue;
            }
            if self.seen_lines.insert(line.to_string()) {
                new_lines.push(line.to_string());
            }
        }

        Ok(new_lines)
    }

    fn ensure_skeleton(metadata_folder: &Path) -> Result<()> {
        let logs_dir = metadata_folder.join(LOGS_DIR);
        let refs_dir = metadata_folder.join(REFS_DIR);

        touch(&metadata_folder.join(INDEX_FILE))?;
        if !logs_dir.is_dir() {
            fs::create_dir(&logs_dir)?;
        }
        touch(&logs_dir.join(HEAD_LOG_FILE))?;
        if !refs_dir.is_dir() {
            fs::create_dir(&refs_dir)?;
        }

        Ok(())
    }

    fn watch<F>(
        path: &Path,
        mode: RecursiveMode,
        config: &TrackerConfig,
        handler: F,
    ) -> Result<MetadataDebouncer>
    where
        F: FnMut(DebounceEventResult) + Send + 'static,
    {
        let mut debouncer = new_debouncer(config.debounce(), None, handler)
            .map_err(|e| Error::Watch(e.to_string()))?;

        debouncer
            .watcher()
            .watch(path, mode)
            .map_err(|e| Error::Watch(format!("{}: {}", path.display(), e)))?;

        Ok(debouncer)
    }

    fn touches_head_log(event: &DebouncedEvent) -> bool {
        matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
            && event.paths.iter().any(|path| {
                path.file_name()
                    .map(|name| name == HEAD_LOG_FILE)
                    .unwrap_or(false)
                    && !path.is_dir()
            })
    }

    fn report_watch_errors(&self, location: &Path, errors: Vec<notify::Error>) {
        for error in errors {
            self.events.diagnostic(Diagnostic::WatchError {
                location: location.to_path_buf(),
                message: error.to_string(),
            });
        }
    }

    fn report_rescan(&self, location: &Path) {
        self.events.diagnostic(Diagnostic::WatchError {
            location: location.to_path_buf(),
            message: "events were dropped, rescan required".to_string(),
        });
    }
}

impl Drop for RepositoryWatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Creates an empty file if none exists. Existing content is left alone.
fn touch(path: &Path) -> Result<()> {
    if !path.exists() {
        OpenOptions::new().append(true).create(true).open(path)?;
    }
    Ok(())
}
