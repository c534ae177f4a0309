use crate::engine::{Git2Engine, RepositoryEngine};
use crate::events::{Diagnostic, EventSink, TrackerEvent, WatchMessage};
use crate::watcher::RepositoryWatcher;
use gittrack_core::discovery::{find_metadata_dir, is_metadata_dir_name, METADATA_DIR_NAME};
use gittrack_core::{Error, ReflogEntry, RepositoryState, Result, TrackerConfig};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_full::DebounceEventResult;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Tracks whether a folder is (or becomes) part of a git repository.
///
/// On [`start_tracking`](Self::start_tracking) the folder and its ancestors
/// are searched for a `.git` directory. The folder itself is then watched
/// for `.git` being created or deleted, and a [`RepositoryWatcher`] is kept
/// running for as long as a metadata directory is known.
///
/// Only the tracked folder is watched: a `.git` that appears in an ancestor
/// after tracking started is not noticed.
pub struct DiscoveryWatcher {
    context: Arc<Context>,
    receiver: Option<mpsc::UnboundedReceiver<WatchMessage>>,
    root_watcher: Option<RecommendedWatcher>,
    worker: Option<JoinHandle<()>>,
}

struct Shared {
    state: RepositoryState,
    repository: Option<RepositoryWatcher>,
    generation: u64,
    disposed: bool,
}

struct Context {
    tracked_folder: PathBuf,
    config: TrackerConfig,
    engine: Arc<dyn RepositoryEngine>,
    events: EventSink,
    messages: mpsc::UnboundedSender<WatchMessage>,
    shared: Mutex<Shared>,
}

impl DiscoveryWatcher {
    pub fn new(tracked_folder: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(tracked_folder, TrackerConfig::default())
    }

    pub fn with_config(tracked_folder: impl Into<PathBuf>, config: TrackerConfig) -> Result<Self> {
        Self::with_engine(tracked_folder, config, Arc::new(Git2Engine))
    }

    pub fn with_engine(
        tracked_folder: impl Into<PathBuf>,
        config: TrackerConfig,
        engine: Arc<dyn RepositoryEngine>,
    ) -> Result<Self> {
        let tracked_folder = tracked_folder.into();
        if !tracked_folder.is_dir() {
            return Err(Error::InvalidTarget(tracked_folder));
        }

        let (messages, receiver) = mpsc::unbounded_channel();
        let events = EventSink::new(config.event_capacity);

        let context = Context {
            tracked_folder: tracked_folder.clone(),
            config,
            engine,
            events,
            messages,
            shared: Mutex::new(Shared {
                state: RepositoryState::new(tracked_folder),
                repository: None,
                generation: 0,
                disposed: false,
            }),
        };

        Ok(Self {
            context: Arc::new(context),
            receiver: Some(receiver),
            root_watcher: None,
            worker: None,
        })
    }

    /// Looks for an existing metadata directory and starts watching the
    /// tracked folder. Must be called from within a tokio runtime.
    pub fn start_tracking(&mut self) -> Result<()> {
        if self.receiver.is_none() {
            return Err(Error::AlreadyTracking);
        }
        let runtime = Handle::try_current()
            .map_err(|e| Error::Watch(format!("no tokio runtime: {e}")))?;
        let receiver = self.receiver.take().ok_or(Error::AlreadyTracking)?;
        let tracked_folder = self.context.tracked_folder.clone();

        let messages = self.context.messages.clone();
        let mut root_watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            if messages.send(WatchMessage::Root(result)).is_err() {
                debug!("Tracker gone, dropping root event");
            }
        })
        .map_err(|e| Error::Watch(e.to_string()))?;
        root_watcher
            .watch(&tracked_folder, RecursiveMode::NonRecursive)
            .map_err(|e| Error::Watch(format!("{}: {}", tracked_folder.display(), e)))?;
        self.root_watcher = Some(root_watcher);

        if let Some(metadata_folder) = find_metadata_dir(&tracked_folder) {
            let mut shared = self.context.lock();
            self.context.enable(&mut shared, metadata_folder);
        }

        let context = Arc::clone(&self.context);
        self.worker = Some(runtime.spawn(context.run(receiver)));

        info!("Tracking {:?}", tracked_folder);

        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.context.events.subscribe()
    }

    pub fn state(&self) -> RepositoryState {
        self.context.lock().state.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.context.lock().state.is_enabled()
    }

    pub fn tracked_folder(&self) -> &Path {
        &self.context.tracked_folder
    }

    /// Forces a full re-read of `logs/HEAD`, dispatching any lines the watches
    /// missed. Returns the new entries; empty when tracking is disabled.
    pub fn refresh(&self) -> Vec<ReflogEntry> {
        let mut guard = self.context.lock();
        let shared = &mut *guard;
        if shared.disposed {
            return Vec::new();
        }
        let Some(repository) = shared.repository.as_mut() else {
            return Vec::new();
        };

        let entries = repository.refresh_history();
        if !entries.is_empty() {
            shared.state.current_commit = repository.current_commit();
            shared.state.current_branch = repository.current_branch();
        }
        entries
    }

    /// Stops every watch and releases the repository handle. No event is
    /// published once this returns.
    pub fn dispose(&mut self) {
        {
            let mut shared = self.context.lock();
            if shared.disposed {
                return;
            }
            shared.disposed = true;
            if let Some(mut repository) = shared.repository.take() {
                repository.dispose();
            }
            shared.state.disable();
        }

        self.root_watcher.take();
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }

        info!("Stopped tracking {:?}", self.context.tracked_folder);
    }
}

impl Drop for DiscoveryWatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Context {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(self: Arc<Self>, mut receiver: mpsc::UnboundedReceiver<WatchMessage>) {
        while let Some(message) = receiver.recv().await {
            match message {
                WatchMessage::Root(result) => self.on_root_event(result),
                WatchMessage::Settled(path) => self.on_settled(path),
                WatchMessage::HeadLog { generation, result } => {
                    self.on_head_log(generation, result)
                }
                WatchMessage::Refs { generation, result } => self.on_refs(generation, result),
            }
        }
    }

    fn on_root_event(&self, result: notify::Result<Event>) {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                let shared = self.lock();
                if !shared.disposed {
                    self.events.diagnostic(Diagnostic::WatchError {
                        location: self.tracked_folder.clone(),
                        message: e.to_string(),
                    });
                }
                return;
            }
        };

        if event.need_rescan() {
            let shared = self.lock();
            if !shared.disposed {
                self.events.diagnostic(Diagnostic::WatchError {
                    location: self.tracked_folder.clone(),
                    message: "events were dropped, rescan required".to_string(),
                });
            }
        }

        for path in event.paths.iter().filter(|path| is_metadata_dir_name(path)) {
            match event.kind {
                EventKind::Create(_) => self.schedule_enable(),
                EventKind::Remove(_) => self.on_removed(),
                // Renames arrive as separate From/To events as well.
                EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {}
                EventKind::Modify(ModifyKind::Name(_)) => {
                    if path.is_dir() {
                        self.schedule_enable();
                    } else {
                        self.on_removed();
                    }
                }
                _ => {}
            }
        }
    }

    /// `.git` is created before the tool creating it has populated it, so
    /// enabling waits for the settle delay. The wait happens outside the lock.
    fn schedule_enable(&self) {
        let path = self.tracked_folder.join(METADATA_DIR_NAME);
        let delay = self.config.settle_delay();
        let messages = self.messages.clone();
        debug!("Metadata directory created, enabling in {:?}", delay);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if messages.send(WatchMessage::Settled(path)).is_err() {
                debug!("Tracker gone, dropping settled metadata directory");
            }
        });
    }

    fn on_settled(&self, path: PathBuf) {
        let mut shared = self.lock();
        if shared.disposed {
            return;
        }
        if !path.is_dir() {
            debug!("{:?} disappeared during the settle delay", path);
            return;
        }
        if shared.state.metadata_folder.as_deref() == Some(path.as_path())
            && shared.repository.is_some()
        {
            debug!("{:?} is already tracked", path);
            return;
        }
        self.enable(&mut shared, path);
    }

    fn on_removed(&self) {
        let mut shared = self.lock();
        if shared.disposed {
            return;
        }
        self.disable(&mut shared);
    }

    fn on_head_log(&self, generation: u64, result: DebounceEventResult) {
        let mut guard = self.lock();
        let shared = &mut *guard;
        if shared.disposed || shared.generation != generation {
            return;
        }
        let Some(repository) = shared.repository.as_mut() else {
            return;
        };

        if repository.handle_head_log(result) {
            shared.state.current_commit = repository.current_commit();
            shared.state.current_branch = repository.current_branch();
        }
    }

    fn on_refs(&self, generation: u64, result: DebounceEventResult) {
        let mut guard = self.lock();
        let shared = &mut *guard;
        if shared.disposed || shared.generation != generation {
            return;
        }
        if let Some(repository) = shared.repository.as_mut() {
            repository.handle_refs(result);
        }
    }

    fn enable(&self, shared: &mut Shared, metadata_folder: PathBuf) {
        let was_enabled = shared.state.is_enabled();
        if let Some(mut repository) = shared.repository.take() {
            repository.dispose();
        }

        shared.generation += 1;
        shared.state.enable(metadata_folder.clone());

        match RepositoryWatcher::new(
            &shared.state,
            shared.generation,
            self.engine.as_ref(),
            &self.config,
            &self.messages,
            self.events.clone(),
        ) {
            Ok(repository) => {
                shared.state.current_commit = repository.current_commit();
                shared.state.current_branch = repository.current_branch();
                shared.repository = Some(repository);
                info!("Repository tracking enabled at {:?}", metadata_folder);
                self.events.emit(TrackerEvent::RepositoryEnabledChanged);
            }
            Err(e) => {
                shared.state.disable();
                self.events.diagnostic(Diagnostic::EnableFailed {
                    path: metadata_folder,
                    message: e.to_string(),
                });
                if was_enabled {
                    self.events.emit(TrackerEvent::RepositoryEnabledChanged);
                }
            }
        }
    }

    fn disable(&self, shared: &mut Shared) {
        if let Some(mut repository) = shared.repository.take() {
            repository.dispose();
        }
        shared.state.disable();

        info!("Repository tracking disabled for {:?}", self.tracked_folder);
        self.events.emit(TrackerEvent::RepositoryEnabledChanged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RepositoryHandle;
    use git2::{Repository, Signature};
    use std::fs::{self, OpenOptions};
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::timeout;

    const LINE_ONE: &str = "0000000 c2b90 My Name <em@i.l> 1502123884 +0200\tcommit (initial): one";
    const LINE_TWO: &str = "c2b90 d4e11 My Name <em@i.l> 1502123900 +0200\tcommit: two";
    const WAIT: Duration = Duration::from_secs(5);
    const QUIET: Duration = Duration::from_millis(600);

    #[derive(Default)]
    struct FakeEngine {
        opened: AtomicUsize,
        closed: Arc<AtomicUsize>,
    }

    struct FakeHandle {
        closed: Arc<AtomicUsize>,
    }

    impl RepositoryHandle for FakeHandle {
        fn head_commit(&self) -> Option<String> {
            None
        }

        fn head_branch(&self) -> Option<String> {
            None
        }
    }

    impl Drop for FakeHandle {
        fn drop(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl RepositoryEngine for FakeEngine {
        fn open(&self, _metadata_folder: &Path) -> anyhow::Result<Box<dyn RepositoryHandle>> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeHandle {
                closed: Arc::clone(&self.closed),
            }))
        }
    }

    fn fast_config() -> TrackerConfig {
        TrackerConfig::default()
            .with_settle_delay(Duration::from_millis(100))
            .with_debounce(Duration::from_millis(20))
    }

    fn tracker(dir: &Path) -> (DiscoveryWatcher, Arc<FakeEngine>) {
        let engine = Arc::new(FakeEngine::default());
        let tracker = DiscoveryWatcher::with_engine(dir, fast_config(), engine.clone()).unwrap();
        (tracker, engine)
    }

    /// Waits for the next event that is not a diagnostic.
    async fn next_event(events: &mut broadcast::Receiver<TrackerEvent>) -> Option<TrackerEvent> {
        loop {
            match timeout(WAIT, events.recv()).await {
                Ok(Ok(TrackerEvent::Diagnostic { .. })) => continue,
                Ok(Ok(event)) => return Some(event),
                _ => return None,
            }
        }
    }

    async fn assert_quiet(events: &mut broadcast::Receiver<TrackerEvent>) {
        let deadline = tokio::time::Instant::now() + QUIET;
        loop {
            match tokio::time::timeout_at(deadline, events.recv()).await {
                Ok(Ok(TrackerEvent::Diagnostic { .. })) => continue,
                Ok(Ok(event)) => panic!("unexpected event: {event:?}"),
                _ => return,
            }
        }
    }

    fn append(path: &Path, content: &str) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn assert_state(tracker: &DiscoveryWatcher, folder: &Path, metadata: Option<&Path>) {
        let state = tracker.state();
        assert_eq!(state.is_enabled(), metadata.is_some());
        assert_eq!(tracker.is_enabled(), metadata.is_some());
        assert_eq!(state.tracked_folder, folder);
        assert_eq!(state.metadata_folder.as_deref(), metadata);
    }

    #[test]
    fn test_rejects_file_target() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("abc.txt");
        fs::write(&file, "").unwrap();

        assert!(matches!(
            DiscoveryWatcher::new(&file),
            Err(Error::InvalidTarget(path)) if path == file
        ));
        assert!(matches!(
            DiscoveryWatcher::new(temp_dir.path().join("missing")),
            Err(Error::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_start_requires_runtime() {
        let temp_dir = TempDir::new().unwrap();
        let (mut tracker, _) = tracker(temp_dir.path());

        assert!(matches!(tracker.start_tracking(), Err(Error::Watch(_))));

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let _guard = runtime.enter();
        tracker.start_tracking().unwrap();
        tracker.dispose();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_start_twice_fails() {
        let temp_dir = TempDir::new().unwrap();
        let (mut tracker, _) = tracker(temp_dir.path());

        tracker.start_tracking().unwrap();

        assert!(matches!(tracker.start_tracking(), Err(Error::AlreadyTracking)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_started_without_repository() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("SomeDir");
        fs::create_dir(&dir).unwrap();
        let (mut tracker, engine) = tracker(&dir);

        tracker.start_tracking().unwrap();

        assert_state(&tracker, &dir, None);
        assert_eq!(engine.opened.load(Ordering::SeqCst), 0);
        assert!(tracker.refresh().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_started_on_bare_metadata_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("SomeDir");
        let git = dir.join(".git");
        fs::create_dir_all(&git).unwrap();
        let (mut tracker, engine) = tracker(&dir);

        tracker.start_tracking().unwrap();

        assert_state(&tracker, &dir, Some(git.as_path()));
        assert!(git.join("index").is_file());
        assert!(git.join("logs").is_dir());
        assert!(git.join("logs").join("HEAD").is_file());
        assert!(git.join("refs").is_dir());
        assert_eq!(engine.opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_metadata_in_parent_folder() {
        let temp_dir = TempDir::new().unwrap();
        let git = temp_dir.path().join(".git");
        let dir = temp_dir.path().join("src").join("module");
        fs::create_dir_all(&git).unwrap();
        fs::create_dir_all(&dir).unwrap();
        let (mut tracker, _) = tracker(&dir);

        tracker.start_tracking().unwrap();

        assert_state(&tracker, &dir, Some(git.as_path()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_started_on_initialized_repository() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("SomeDir");
        Repository::init(&dir).unwrap();
        let mut tracker = DiscoveryWatcher::with_config(&dir, fast_config()).unwrap();

        tracker.start_tracking().unwrap();

        assert_state(&tracker, &dir, Some(dir.join(".git").as_path()));
        assert!(tracker.state().current_branch.is_some());
        assert!(tracker.state().current_commit.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_commit_in_tracked_repository() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("SomeDir");
        let repo = Repository::init(&dir).unwrap();
        let mut tracker = DiscoveryWatcher::with_config(&dir, fast_config()).unwrap();
        let mut events = tracker.subscribe();
        tracker.start_tracking().unwrap();

        let sig = Signature::now("Test", "em@i.l").unwrap();
        let tree_id = repo.treebuilder(None).unwrap().write().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, "commit msg", &tree, &[])
            .unwrap();

        loop {
            match next_event(&mut events).await {
                Some(TrackerEvent::HistoryEntriesAppended { entries }) => {
                    assert_eq!(entries.len(), 1);
                    assert_eq!(entries[0].commit_to, oid.to_string());
                    assert_eq!(entries[0].author.name, "Test");
                    assert!(entries[0].message.contains("commit msg"));
                    break;
                }
                Some(_) => continue,
                None => panic!("no history event"),
            }
        }
        assert_eq!(tracker.state().current_commit, Some(oid.to_string()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_future_repository() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("SomeDir");
        let git = dir.join(".git");
        fs::create_dir(&dir).unwrap();
        let (mut tracker, _) = tracker(&dir);
        let mut events = tracker.subscribe();
        tracker.start_tracking().unwrap();
        assert_state(&tracker, &dir, None);

        fs::create_dir(&git).unwrap();

        assert_eq!(
            next_event(&mut events).await,
            Some(TrackerEvent::RepositoryEnabledChanged)
        );
        assert_state(&tracker, &dir, Some(git.as_path()));
        assert_quiet(&mut events).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_removal_and_readdition() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("SomeDir");
        let git = dir.join(".git");
        fs::create_dir_all(&git).unwrap();
        let (mut tracker, engine) = tracker(&dir);
        let mut events = tracker.subscribe();
        tracker.start_tracking().unwrap();
        assert_eq!(
            events.try_recv().unwrap(),
            TrackerEvent::RepositoryEnabledChanged
        );
        assert_state(&tracker, &dir, Some(git.as_path()));

        fs::remove_dir_all(&git).unwrap();

        assert_eq!(
            next_event(&mut events).await,
            Some(TrackerEvent::RepositoryEnabledChanged)
        );
        assert_state(&tracker, &dir, None);
        assert_eq!(engine.closed.load(Ordering::SeqCst), 1);

        fs::create_dir(&git).unwrap();

        assert_eq!(
            next_event(&mut events).await,
            Some(TrackerEvent::RepositoryEnabledChanged)
        );
        assert_state(&tracker, &dir, Some(git.as_path()));
        assert_eq!(engine.opened.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_appended_lines_arrive_in_one_event() {
        let temp_dir = TempDir::new().unwrap();
        let git = temp_dir.path().join(".git");
        let head = git.join("logs").join("HEAD");
        fs::create_dir_all(git.join("logs")).unwrap();
        fs::write(&head, format!("{LINE_ONE}\n")).unwrap();
        let (mut tracker, _) = tracker(temp_dir.path());
        let mut events = tracker.subscribe();
        tracker.start_tracking().unwrap();
        assert_eq!(
            events.try_recv().unwrap(),
            TrackerEvent::RepositoryEnabledChanged
        );
        assert_eq!(tracker.state().current_commit, Some("c2b90".to_string()));

        let third = "d4e11 e5f22 My Name <em@i.l> 1502124000\tcommit: three";
        append(&head, &format!("{LINE_TWO}\n{third}\n"));

        match next_event(&mut events).await {
            Some(TrackerEvent::HistoryEntriesAppended { entries }) => {
                let targets: Vec<_> = entries.iter().map(|e| e.commit_to.as_str()).collect();
                assert_eq!(targets, vec!["d4e11", "e5f22"]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(tracker.state().current_commit, Some("e5f22".to_string()));

        assert!(tracker.refresh().is_empty());
        assert_quiet(&mut events).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_ref_change() {
        let temp_dir = TempDir::new().unwrap();
        let heads = temp_dir.path().join(".git").join("refs").join("heads");
        let main = heads.join("main");
        fs::create_dir_all(&heads).unwrap();
        fs::write(&main, "c2b90\n").unwrap();
        let (mut tracker, _) = tracker(temp_dir.path());
        let mut events = tracker.subscribe();
        tracker.start_tracking().unwrap();
        assert_eq!(
            events.try_recv().unwrap(),
            TrackerEvent::RepositoryEnabledChanged
        );

        append(&main, "d4e11\n");

        match next_event(&mut events).await {
            Some(TrackerEvent::RefPathChanged { path }) => {
                assert!(path.ends_with("refs/heads/main"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_no_events_after_dispose() {
        let temp_dir = TempDir::new().unwrap();
        let git = temp_dir.path().join(".git");
        fs::create_dir_all(&git).unwrap();
        let (mut tracker, engine) = tracker(temp_dir.path());
        let mut events = tracker.subscribe();
        tracker.start_tracking().unwrap();
        assert_eq!(
            events.try_recv().unwrap(),
            TrackerEvent::RepositoryEnabledChanged
        );

        tracker.dispose();
        tracker.dispose();

        assert!(!tracker.is_enabled());
        assert_eq!(engine.closed.load(Ordering::SeqCst), 1);

        append(&git.join("logs").join("HEAD"), &format!("{LINE_ONE}\n"));
        fs::remove_dir_all(&git).unwrap();

        assert_quiet(&mut events).await;
        assert!(tracker.refresh().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_removed_during_settle_delay() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("SomeDir");
        let git = dir.join(".git");
        fs::create_dir(&dir).unwrap();
        let (mut tracker, engine) = tracker(&dir);
        let mut events = tracker.subscribe();
        tracker.start_tracking().unwrap();

        fs::create_dir(&git).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        fs::remove_dir(&git).unwrap();

        assert_eq!(
            next_event(&mut events).await,
            Some(TrackerEvent::RepositoryEnabledChanged)
        );
        assert_quiet(&mut events).await;
        assert_state(&tracker, &dir, None);
        assert_eq!(engine.opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rename_away_and_back() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("SomeDir");
        let git = dir.join(".git");
        let parked = dir.join("git.bak");
        fs::create_dir_all(&git).unwrap();
        let (mut tracker, engine) = tracker(&dir);
        let mut events = tracker.subscribe();
        tracker.start_tracking().unwrap();
        assert_eq!(
            events.try_recv().unwrap(),
            TrackerEvent::RepositoryEnabledChanged
        );

        fs::rename(&git, &parked).unwrap();

        assert_eq!(
            next_event(&mut events).await,
            Some(TrackerEvent::RepositoryEnabledChanged)
        );
        assert_state(&tracker, &dir, None);
        assert_eq!(engine.closed.load(Ordering::SeqCst), 1);

        fs::rename(&parked, &git).unwrap();

        assert_eq!(
            next_event(&mut events).await,
            Some(TrackerEvent::RepositoryEnabledChanged)
        );
        assert_state(&tracker, &dir, Some(git.as_path()));
        assert_eq!(engine.opened.load(Ordering::SeqCst), 2);
        assert_quiet(&mut events).await;
    }
}
