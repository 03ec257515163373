//! Status command handler

use anyhow::Result;

use marksync_core::{Bookmarks, Config};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(bookmarks: &Bookmarks, config: &Config, output: &Output) -> Result<()> {
    let status = bookmarks.status();
    let pending = bookmarks.pending_operations();
    let auth = config.auth();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "user_id": auth.sync_user(),
                    "remote_url": config.remote_url,
                    "tier": config.tier.to_string(),
                    "bookmarks": bookmarks.count(),
                    "pending": pending,
                    "is_syncing": status.is_syncing,
                    "error": status.error,
                    "last_synced_at": status.last_synced_at,
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", pending.len());
        }
        OutputFormat::Human => {
            println!("marksync Status");
            println!("===============");
            println!();
            println!("Account:");
            println!(
                "  User:   {}",
                auth.sync_user().unwrap_or("(not logged in)")
            );
            println!("  Tier:   {}", config.tier);
            println!(
                "  Server: {}",
                config.remote_url.as_deref().unwrap_or("(not set)")
            );
            println!();
            println!("Bookmarks:");
            println!("  Saved:   {}", bookmarks.count());
            println!("  Pending: {}", pending.len());
            for op in &pending {
                println!("    {} {}", op.kind, op.id);
            }
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
        }
    }

    Ok(())
}
