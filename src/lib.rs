//! # gittrack
//!
//! Detects whether a folder is (or becomes) part of a git repository and
//! reports reflog appends and ref changes while it is.
//!
//! ```no_run
//! use gittrack::{DiscoveryWatcher, TrackerEvent};
//!
//! # async fn example() -> gittrack::Result<()> {
//! let mut tracker = DiscoveryWatcher::new("/path/to/project")?;
//! let mut events = tracker.subscribe();
//! tracker.start_tracking()?;
//!
//! while let Ok(event) = events.recv().await {
//!     if let TrackerEvent::HistoryEntriesAppended { entries } = event {
//!         for entry in entries {
//!             println!("{} {}", entry.commit_to, entry.message);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub use gittrack_core::*;
pub use gittrack_watcher::*;
