use anyhow::{Context, Result};
use colored::Colorize;
use gittrack_core::discovery::{find_metadata_dir, HEAD_LOG_FILE, LOGS_DIR};
use gittrack_core::reflog;
use std::path::PathBuf;

pub fn run(path: PathBuf, limit: Option<usize>) -> Result<()> {
    let abs_path = super::resolve_path(&path)?;
    let metadata_folder = find_metadata_dir(&abs_path)
        .with_context(|| format!("No git repository found at or above {}", abs_path.display()))?;
    let head_log = metadata_folder.join(LOGS_DIR).join(HEAD_LOG_FILE);

    let content = std::fs::read(&head_log)
        .with_context(|| format!("Could not read {}", head_log.display()))?;
    let content = String::from_utf8_lossy(&content);
    let parsed = reflog::parse_log(&content);

    if parsed.is_empty() {
        println!("{}", "No reflog entries yet".yellow());
        return Ok(());
    }

    println!("{}", "HEAD History".bold().cyan());
    println!();

    let to_show = limit.unwrap_or(parsed.len()).min(parsed.len());

    // Newest first, like `git reflog`.
    for (line, result) in parsed.iter().rev().take(to_show) {
        match result {
            Ok(entry) => {
                println!(
                    "{} {}",
                    "commit".yellow().bold(),
                    entry.commit_to.yellow()
                );
                println!(
                    "{}: {} <{}>",
                    "Author".bold(),
                    entry.author.name,
                    entry.author.email
                );
                println!(
                    "{}: {}",
                    "Date".bold(),
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S")
                );
                println!();
                println!("    {}", entry.message);
                println!();
            }
            Err(e) => {
                println!("{} {}", "unparsable".red().bold(), e.to_string().red());
                println!("    {}", line.dimmed());
                println!();
            }
        }
    }

    if parsed.len() > to_show {
        println!(
            "{}",
            format!("... and {} more entries", parsed.len() - to_show).dimmed()
        );
        println!("Use {} to see more", "--limit N".cyan());
    }

    Ok(())
}
