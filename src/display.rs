//! Colored CLI display utilities for watcher output.

use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::events::Change;
use crate::session::SessionStats;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Format one change as plain text: `path` or `id flags path`.
#[must_use]
pub fn format_change(change: &Change) -> String {
    match change {
        Change::Path(path) => path.clone(),
        Change::Event(record) => format!("{} {} {}", record.id, record.flags, record.path),
    }
}

/// Print session start information.
pub fn print_session_start(executable: &Path, paths: &[String]) {
    println!(
        "{} {} watcher={} paths={}",
        timestamp().dimmed(),
        "[WATCH]".blue().bold(),
        executable.display().cyan(),
        paths.join(",")
    );
    let _ = io::stdout().flush();
}

/// Print a delivered batch.
pub fn print_batch(batch: &[Change]) {
    let ts = timestamp();
    if batch.is_empty() {
        println!("{} {} (empty)", ts.dimmed(), "[BATCH]".green().bold());
    } else {
        println!(
            "{} {} {} change(s)",
            ts.dimmed(),
            "[BATCH]".green().bold(),
            batch.len()
        );
        for change in batch {
            println!("  {}", format_change(change));
        }
    }
    let _ = io::stdout().flush();
}

/// Print a delivered batch as one JSON array per line.
pub fn print_batch_json(batch: &[Change]) {
    match serde_json::to_string(batch) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to serialize batch"),
    }
    let _ = io::stdout().flush();
}

/// Print session end information.
pub fn print_session_end(stats: SessionStats) {
    println!(
        "{} {} Watcher stopped {}",
        timestamp().dimmed(),
        "[WATCH]".blue().bold(),
        format!(
            "batches={} changes={} skipped={}",
            stats.batches, stats.changes, stats.skipped_lines
        )
        .dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}
