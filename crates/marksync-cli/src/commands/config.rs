//! Config command handlers

use std::path::Path;

use anyhow::{Context, Result};

use marksync_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&Path>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "remote_url": config.remote_url,
                    "sync_enabled": config.sync_enabled,
                    "user_id": config.user_id,
                    "tier": config.tier.to_string(),
                    "remote_timeout_secs": config.remote_timeout_secs,
                    "sync_interval_secs": config.sync_interval_secs,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:            {}", config.data_dir.display());
            println!("  remote_url:          {}", or_unset(config.remote_url.as_deref()));
            println!("  sync_enabled:        {}", config.sync_enabled);
            println!("  user_id:             {}", or_unset(config.user_id.as_deref()));
            println!("  tier:                {}", config.tier);
            println!("  remote_timeout_secs: {}", config.remote_timeout_secs);
            println!(
                "  sync_interval_secs:  {}",
                config
                    .sync_interval_secs
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!(
                "  log_file:            {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: &str, value: &str, config_path: Option<&Path>, output: &Output) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    config.set_value(key, value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn or_unset(value: Option<&str>) -> &str {
    value.unwrap_or("(not set)")
}
