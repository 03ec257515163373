//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use marksync_core::{BookmarkSet, PendingOperation, SyncRun, WriteOutcome};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print the bookmark set
    pub fn print_bookmarks(&self, bookmarks: &BookmarkSet) {
        match self.format {
            OutputFormat::Human => {
                if bookmarks.is_empty() {
                    println!("No bookmarks saved.");
                    return;
                }
                for id in bookmarks {
                    println!("{}", id);
                }
                println!("\n{} bookmark(s)", bookmarks.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::json!(bookmarks.to_strings()));
            }
            OutputFormat::Quiet => {
                for id in bookmarks {
                    println!("{}", id);
                }
            }
        }
    }

    /// Print whether an id is bookmarked
    pub fn print_check(&self, id: &str, bookmarked: bool) {
        match self.format {
            OutputFormat::Human => {
                if bookmarked {
                    println!("{} is bookmarked", id);
                } else {
                    println!("{} is not bookmarked", id);
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"id": id, "bookmarked": bookmarked}));
            }
            OutputFormat::Quiet => println!("{}", bookmarked),
        }
    }

    /// Report the result of a mutation
    pub fn print_write(&self, id: &str, bookmarked: bool, outcome: WriteOutcome) {
        match self.format {
            OutputFormat::Human => {
                let verb = if bookmarked { "Bookmarked" } else { "Removed" };
                match outcome {
                    WriteOutcome::Confirmed => println!("✓ {} {}", verb, id),
                    WriteOutcome::Queued => {
                        println!("✓ {} {} (saved locally, will sync later)", verb, id)
                    }
                    WriteOutcome::Unchanged if bookmarked => {
                        println!("{} is already bookmarked", id)
                    }
                    WriteOutcome::Unchanged => println!("{} was not bookmarked", id),
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "id": id,
                        "bookmarked": bookmarked,
                        "outcome": outcome_label(outcome)
                    })
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Report a sync run
    pub fn print_sync(&self, run: &SyncRun, pending: &[PendingOperation]) {
        match self.format {
            OutputFormat::Human => match run {
                SyncRun::Completed(outcome) if outcome.success => {
                    println!("✓ Sync complete - {} bookmark(s)", outcome.final_set.len())
                }
                SyncRun::Completed(outcome) => {
                    println!(
                        "Sync failed: {}",
                        outcome.error.as_deref().unwrap_or("unknown error")
                    );
                    println!("  {} change(s) waiting to sync", pending.len());
                }
                SyncRun::AlreadyInFlight => println!("A sync is already in progress"),
                SyncRun::NotAuthenticated => {
                    println!("Not logged in - bookmarks are kept on this device only")
                }
            },
            OutputFormat::Json => {
                let outcome = run.outcome();
                println!(
                    "{}",
                    serde_json::json!({
                        "result": sync_label(run),
                        "success": run.is_success(),
                        "error": outcome.and_then(|o| o.error.clone()),
                        "count": outcome.map(|o| o.final_set.len()),
                        "pending": pending.len()
                    })
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

pub fn outcome_label(outcome: WriteOutcome) -> &'static str {
    match outcome {
        WriteOutcome::Confirmed => "confirmed",
        WriteOutcome::Queued => "queued",
        WriteOutcome::Unchanged => "unchanged",
    }
}

pub fn sync_label(run: &SyncRun) -> &'static str {
    match run {
        SyncRun::Completed(outcome) if outcome.success => "synced",
        SyncRun::Completed(_) => "failed",
        SyncRun::AlreadyInFlight => "in_flight",
        SyncRun::NotAuthenticated => "not_authenticated",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marksync_core::SyncOutcome;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome_label(WriteOutcome::Confirmed), "confirmed");
        assert_eq!(outcome_label(WriteOutcome::Queued), "queued");
        assert_eq!(outcome_label(WriteOutcome::Unchanged), "unchanged");
    }

    #[test]
    fn test_sync_labels() {
        let ok = SyncRun::Completed(SyncOutcome::succeeded(BookmarkSet::new()));
        let failed = SyncRun::Completed(SyncOutcome::failed(BookmarkSet::new(), "offline"));

        assert_eq!(sync_label(&ok), "synced");
        assert_eq!(sync_label(&failed), "failed");
        assert_eq!(sync_label(&SyncRun::AlreadyInFlight), "in_flight");
        assert_eq!(sync_label(&SyncRun::NotAuthenticated), "not_authenticated");
    }
}
