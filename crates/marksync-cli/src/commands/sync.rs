//! Sync command handlers

use std::time::Duration;

use anyhow::{bail, Result};
use tracing::info;

use marksync_core::{Bookmarks, BookmarksOptions, Config, SyncRun};

use crate::output::Output;

const DEFAULT_WATCH_INTERVAL_SECS: u64 = 60;

/// Sync with the remote server
pub async fn sync(bookmarks: &Bookmarks, output: &Output) -> Result<()> {
    let run = bookmarks.sync().await;
    output.print_sync(&run, &bookmarks.pending_operations());

    match run {
        SyncRun::Completed(outcome) if !outcome.success => {
            bail!("Sync failed; changes are kept locally")
        }
        _ => Ok(()),
    }
}

/// Sync on an interval until Ctrl-C
pub async fn watch(config: &Config, interval: Option<u64>, output: &Output) -> Result<()> {
    let auth = config.auth();
    if auth.sync_user().is_none() {
        bail!("Not logged in. Sign in first with:\n  marksync login <user-id>");
    }

    let secs = interval
        .or(config.sync_interval_secs)
        .filter(|&s| s > 0)
        .unwrap_or(DEFAULT_WATCH_INTERVAL_SECS);
    let options = BookmarksOptions {
        sync_interval: Some(Duration::from_secs(secs)),
        sync_on_start: true,
        ..BookmarksOptions::from_config(config)
    };

    let bookmarks = crate::open_bookmarks_with(config, auth, options).await?;
    let mut status = bookmarks.subscribe_status();
    output.message(&format!("Syncing every {}s. Press Ctrl-C to stop.", secs));
    info!("Watching with a {}s interval", secs);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                if current.is_syncing {
                    continue;
                }
                match current.error {
                    Some(error) => output.message(&format!("Sync failed: {}", error)),
                    None => output.message(&format!(
                        "Synced {} bookmark(s), {} pending",
                        bookmarks.count(),
                        bookmarks.pending_operations().len()
                    )),
                }
            }
            _ = &mut shutdown => break,
        }
    }

    bookmarks.dispose().await;
    output.success("Stopped");
    Ok(())
}
