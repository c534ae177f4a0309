use anyhow::Result;
use colored::Colorize;
use gittrack_core::discovery::find_metadata_dir;
use gittrack_watcher::{Git2Engine, RepositoryEngine};
use std::path::PathBuf;

pub fn run(path: PathBuf) -> Result<()> {
    let abs_path = super::resolve_path(&path)?;

    println!("{}", "Repository Status".bold().cyan());
    println!("  {}: {}", "Folder".bold(), abs_path.display());

    let Some(metadata_folder) = find_metadata_dir(&abs_path) else {
        println!("  {}: {}", "Repository".bold(), "none".yellow());
        println!();
        println!(
            "Run {} to be notified when one appears",
            "gittrack watch".cyan()
        );
        return Ok(());
    };

    println!("  {}: {}", "Metadata".bold(), metadata_folder.display());

    match Git2Engine.open(&metadata_folder) {
        Ok(handle) => {
            let branch = handle
                .head_branch()
                .unwrap_or_else(|| "(detached)".to_string());
            let commit = handle
                .head_commit()
                .unwrap_or_else(|| "(no commits yet)".to_string());

            println!("  {}: {}", "Branch".bold(), branch.green());
            println!("  {}: {}", "Commit".bold(), commit.yellow());
        }
        Err(e) => {
            println!("  {}: {}", "Repository".bold(), format!("{e:#}").red());
        }
    }

    Ok(())
}
