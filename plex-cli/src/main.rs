use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plex_sdk::logging::{init_logging_with_level, LoggingMode};
use plex_sdk::{
    ConfigFlow, ConfigStore, CoordinatorConfig, EntryConfig, MemoryHost, PlexEntry, PlexTvBackend,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub mod display;
pub mod wizard;

/// Plex Media Server control from the command line
///
/// Polls a configured server and shows its players and sessions, or sends
/// playback commands to one player.
#[derive(Parser, Debug)]
#[command(name = "plex")]
#[command(about = "Watch and control the players of a Plex Media Server")]
#[command(version)]
pub struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Poll interval in seconds, clamped to 5-10
    #[arg(long, global = true)]
    pub interval: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Link an account and pick a server
    Setup,
    /// Print players and sessions once
    Status {
        /// Print sensor attributes as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print player states after every poll until Ctrl-C
    Watch,
    /// Send a playback command to a player (id or name)
    Control {
        player: String,
        #[command(subcommand)]
        action: Action,
    },
    /// Delete the stored configuration
    Forget,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum Action {
    Play,
    Pause,
    Stop,
    Next,
    Previous,
    /// Volume level between 0 and 1
    Volume { level: f64 },
    /// Position in seconds
    Seek { seconds: f64 },
}

impl Args {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<()> {
        match self.log_level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid log level '{}'. Valid levels: error, warn, info, debug, trace",
                    self.log_level
                ));
            }
        }

        if self.interval == Some(0) {
            return Err(anyhow::anyhow!("Poll interval must be positive"));
        }

        if let Command::Control { action, .. } = &self.command {
            match action {
                Action::Volume { level } if !(0.0..=1.0).contains(level) => {
                    return Err(anyhow::anyhow!("Volume must be between 0 and 1, got {}", level));
                }
                Action::Seek { seconds } if *seconds < 0.0 => {
                    return Err(anyhow::anyhow!("Seek position must not be negative"));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Configuration derived from command line arguments and environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub store: ConfigStore,
    pub coordinator: CoordinatorConfig,
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self> {
        let store = match &args.config {
            Some(path) => ConfigStore::new(path),
            None => ConfigStore::default_location().context("No configuration directory")?,
        };

        let mut coordinator = CoordinatorConfig::from_env()?;
        if let Some(seconds) = args.interval {
            coordinator = coordinator.with_interval(Duration::from_secs(seconds));
        }

        Ok(Self { store, coordinator })
    }

    /// Stored entry with environment overrides, or an entry built from the
    /// environment alone
    pub fn entry(&self) -> Result<EntryConfig> {
        let entry = match self.store.load()? {
            Some(entry) => entry.with_env_overrides(),
            None => EntryConfig::from_env().with_context(|| {
                format!(
                    "No configuration at {}; run `plex setup` or set PLEX_SERVER_URL and PLEX_TOKEN",
                    self.store.path().display()
                )
            })?,
        };
        entry.validate()?;
        Ok(entry)
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let mode = std::env::var("PLEX_LOG_MODE")
        .ok()
        .and_then(|name| LoggingMode::from_name(&name))
        .unwrap_or(LoggingMode::Development);
    init_logging_with_level(mode, Some(log_level.to_lowercase().as_str()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.validate()?;
    init_tracing(&args.log_level)?;
    let config = Config::from_args(&args)?;

    match args.command {
        Command::Setup => {
            let mut flow = ConfigFlow::new(PlexTvBackend::default());
            wizard::run_setup(&mut flow, &config.store).await
        }
        Command::Forget => {
            if config.store.remove()? {
                println!("Removed {}", config.store.path().display());
            } else {
                println!("Nothing stored at {}", config.store.path().display());
            }
            Ok(())
        }
        Command::Status { json } => {
            let entry = open_entry(&config).await?;
            print_status(&entry, json)?;
            close_entry(&entry).await;
            Ok(())
        }
        Command::Watch => {
            let entry = open_entry(&config).await?;
            let result = watch(&entry).await;
            close_entry(&entry).await;
            result
        }
        Command::Control { player, action } => {
            let entry = open_entry(&config).await?;
            let result = control(&entry, &player, action).await;
            close_entry(&entry).await;
            result
        }
    }
}

async fn open_entry(config: &Config) -> Result<PlexEntry> {
    let entry_config = config.entry()?;
    info!("Connecting to {}", entry_config.server_url);
    let host = Arc::new(MemoryHost::new());
    PlexEntry::setup(entry_config, host, config.coordinator.clone())
        .await
        .context("Failed to set up Plex entry")
}

async fn close_entry(entry: &PlexEntry) {
    if !entry.unload().await {
        warn!("Some platforms did not unload cleanly");
    }
}

fn print_status(entry: &PlexEntry, json: bool) -> Result<()> {
    for line in display::sensor_lines(entry.sensor()) {
        println!("{}", line);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&entry.sensor().attributes())?);
    }

    println!();
    let players = entry.players();
    if players.is_empty() {
        println!("No players found");
    }
    for player in players {
        println!("{}", display::player_line(&player));
    }
    Ok(())
}

async fn watch(entry: &PlexEntry) -> Result<()> {
    let mut updates = entry.coordinator().subscribe();
    print_status(entry, false)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, stopping");
                return Ok(());
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                println!("--");
                print_status(entry, false)?;
            }
        }
    }
}

async fn control(entry: &PlexEntry, player: &str, action: Action) -> Result<()> {
    let control = entry.control(player)?;
    match action {
        Action::Play => control.play().await?,
        Action::Pause => control.pause().await?,
        Action::Stop => control.stop().await?,
        Action::Next => control.next_track().await?,
        Action::Previous => control.previous_track().await?,
        Action::Volume { level } => control.set_volume(level).await?,
        Action::Seek { seconds } => control.seek(seconds).await?,
    }
    println!("Sent {:?} to {}", action, control.player().name());
    Ok(())
}
