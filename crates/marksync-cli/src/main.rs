//! marksync CLI
//!
//! Command-line interface for marksync - offline-first bookmarks.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use marksync_core::{
    AuthContext, Bookmarks, BookmarksOptions, Config, FileBlobStore, HttpRemote, LocalStore,
    OfflineRemote, RemoteBookmarkService,
};

mod commands;
mod output;

use output::{sync_label, Output, OutputFormat};

#[derive(Parser)]
#[command(name = "marksync")]
#[command(about = "marksync - offline-first bookmarks that follow you")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bookmark an id
    Add {
        /// Entity id
        id: String,
    },
    /// Remove a bookmark
    #[command(alias = "rm")]
    Remove {
        /// Entity id
        id: String,
    },
    /// Bookmark an id, or remove it if already bookmarked
    Toggle {
        /// Entity id
        id: String,
    },
    /// Check whether an id is bookmarked
    Check {
        /// Entity id
        id: String,
    },
    /// List all bookmarks
    #[command(alias = "ls")]
    List,
    /// Sync with the bookmark server
    Sync,
    /// Show sync status and pending changes
    Status,
    /// Keep syncing on an interval until interrupted
    Watch {
        /// Seconds between syncs (defaults to sync_interval_secs, then 60)
        #[arg(short, long)]
        interval: Option<u64>,
    },
    /// Sign in and sync local bookmarks to the account
    Login {
        /// Account user id
        user_id: String,
    },
    /// Sign out (bookmarks stay on this device)
    Logout,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (see `marksync config show`)
        key: String,
        /// Configuration value (empty string clears optional keys)
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_deref();

    // Config commands don't need the bookmark store
    if let Commands::Config { command } = &cli.command {
        return match command {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    match cli.command {
        Commands::Login { user_id } => {
            commands::auth::login(config, config_path, user_id, &output).await
        }
        Commands::Logout => commands::auth::logout(config, config_path, &output),
        Commands::Watch { interval } => commands::sync::watch(&config, interval, &output).await,
        command => {
            let bookmarks = open_bookmarks(&config, config.auth()).await?;
            let result = run_command(command, &bookmarks, &config, &output).await;
            bookmarks.dispose().await;
            result
        }
    }
}

async fn run_command(
    command: Commands,
    bookmarks: &Bookmarks,
    config: &Config,
    output: &Output,
) -> Result<()> {
    let is_read = matches!(command, Commands::List | Commands::Check { .. });

    // Pull remote changes before reads; failures only mean slightly stale output
    if is_read {
        let run = bookmarks.sync().await;
        debug!("Pre-read sync: {}", sync_label(&run));
    }

    match command {
        Commands::Add { id } => commands::bookmark::add(bookmarks, id, output).await,
        Commands::Remove { id } => commands::bookmark::remove(bookmarks, id, output).await,
        Commands::Toggle { id } => commands::bookmark::toggle(bookmarks, id, output).await,
        Commands::Check { id } => commands::bookmark::check(bookmarks, &id, output),
        Commands::List => commands::bookmark::list(bookmarks, output),
        Commands::Sync => commands::sync::sync(bookmarks, output).await,
        Commands::Status => commands::status::show(bookmarks, config, output),
        Commands::Login { .. }
        | Commands::Logout
        | Commands::Watch { .. }
        | Commands::Config { .. } => {
            unreachable!("handled before the store is opened")
        }
    }
}

/// Open the bookmark service described by `config`
pub(crate) async fn open_bookmarks(config: &Config, auth: AuthContext) -> Result<Bookmarks> {
    open_bookmarks_with(config, auth, BookmarksOptions::from_config(config)).await
}

pub(crate) async fn open_bookmarks_with(
    config: &Config,
    auth: AuthContext,
    options: BookmarksOptions,
) -> Result<Bookmarks> {
    let store = LocalStore::new(Arc::new(FileBlobStore::new(config.data_dir.clone())));

    let remote: Arc<dyn RemoteBookmarkService> = match config.remote_url.as_deref() {
        Some(url) => Arc::new(
            HttpRemote::new(url, config.remote_timeout())
                .context("Failed to create HTTP client")?,
        ),
        None => {
            debug!("No remote_url configured, running offline");
            Arc::new(OfflineRemote)
        }
    };

    Ok(Bookmarks::init(store, remote, Arc::new(config.tier), auth, options).await)
}

/// Initialize logging
///
/// Level comes from MARKSYNC_LOG (default: warn). Logs go to `log_file` when
/// configured, otherwise to stderr.
fn init_logging(config: &Config) {
    let log_level = std::env::var("MARKSYNC_LOG").unwrap_or_else(|_| "warn".to_string());
    let env_filter = EnvFilter::new(format!(
        "marksync_core={},marksync={}",
        log_level, log_level
    ));

    let Some(log_path) = config.log_file.as_ref() else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
        return;
    };

    let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            return;
        }
    };

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    debug!("Logging to {:?}", log_path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from(["marksync", "add", "venue77", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Add { ref id } if id == "venue77"));

        let cli =
            Cli::try_parse_from(["marksync", "--config", "/tmp/c.toml", "-q", "ls"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_command_required() {
        assert!(Cli::try_parse_from(["marksync"]).is_err());
    }
}
