//! Login and logout handlers

use std::path::Path;

use anyhow::{bail, Context, Result};

use marksync_core::{AuthContext, Config, SyncRun};

use crate::output::Output;

/// Sign in as `user_id` and push local bookmarks to the account
pub async fn login(
    mut config: Config,
    config_path: Option<&Path>,
    user_id: String,
    output: &Output,
) -> Result<()> {
    let user_id = user_id.trim().to_string();
    if user_id.is_empty() {
        bail!("User id cannot be empty");
    }

    // Open under the previous identity so the transition triggers a sync
    let bookmarks = crate::open_bookmarks(&config, config.auth()).await?;

    config.user_id = Some(user_id.clone());
    config.sync_enabled = true;
    save(&config, config_path)?;

    let run = bookmarks
        .set_auth(AuthContext::authenticated(user_id.clone()))
        .await;
    let pending = bookmarks.pending_operations();
    bookmarks.dispose().await;

    output.success(&format!("Logged in as {}", user_id));
    match run {
        Some(run @ SyncRun::Completed(_)) => output.print_sync(&run, &pending),
        Some(_) => {}
        None => output.message("Already logged in"),
    }
    Ok(())
}

/// Sign out; local bookmarks are kept
pub fn logout(mut config: Config, config_path: Option<&Path>, output: &Output) -> Result<()> {
    if config.user_id.is_none() {
        output.message("Not logged in");
        return Ok(());
    }

    config.user_id = None;
    config.sync_enabled = false;
    save(&config, config_path)?;

    output.success("Logged out. Bookmarks stay on this device.");
    Ok(())
}

fn save(config: &Config, config_path: Option<&Path>) -> Result<()> {
    let save_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")
}
