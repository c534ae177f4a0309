use anyhow::Result;
use colored::Colorize;
use gittrack_core::TrackerConfig;
use gittrack_watcher::{DiscoveryWatcher, TrackerEvent};
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

pub async fn run(path: PathBuf, config: Option<PathBuf>, json: bool) -> Result<()> {
    let abs_path = super::resolve_path(&path)?;
    let config = match config {
        Some(config_path) => TrackerConfig::load(config_path)?,
        None => TrackerConfig::default(),
    };

    let mut tracker = DiscoveryWatcher::with_config(&abs_path, config)?;
    let mut events = tracker.subscribe();
    tracker.start_tracking()?;

    if !json {
        println!("{}", "👀 Watching for repository activity...".bold().cyan());
        println!("   {}: {:?}", "Folder".bold(), abs_path);
        print_enabled(&tracker);
        println!();
        println!("{}", "Press Ctrl+C to stop".dimmed());
        println!();
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = events.recv() => match received {
                Ok(event) if json => println!("{}", serde_json::to_string(&event)?),
                Ok(event) => print_event(&tracker, &event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Output fell behind, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    tracker.dispose();
    Ok(())
}

fn print_enabled(tracker: &DiscoveryWatcher) {
    let state = tracker.state();
    match &state.metadata_folder {
        Some(folder) => println!(
            "   {}: {} ({:?})",
            "Repository".bold(),
            "enabled".green(),
            folder
        ),
        None => println!("   {}: {}", "Repository".bold(), "disabled".yellow()),
    }
}

fn print_event(tracker: &DiscoveryWatcher, event: &TrackerEvent) {
    let now = chrono::Local::now().format("%H:%M:%S%.3f");

    match event {
        TrackerEvent::RepositoryEnabledChanged => {
            println!("[{}] {}", now, "repository state changed".bold());
            print_enabled(tracker);
        }
        TrackerEvent::HistoryEntriesAppended { entries } => {
            println!("[{}] {}", now, "head changed".bold());
            for entry in entries {
                println!(
                    "    {} {} {}",
                    short(&entry.commit_to).yellow(),
                    entry.message,
                    format!("<{}>", entry.author.email).dimmed()
                );
            }
        }
        TrackerEvent::RefPathChanged { path } => {
            println!("[{}] ref changed: {}", now, path.display().to_string().cyan());
        }
        TrackerEvent::Diagnostic { diagnostic } => {
            println!("[{}] {}", now, diagnostic.to_string().red());
        }
    }
}

fn short(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}
