use plex_client::PlexError;
use thiserror::Error;

/// A refresh cycle could not reach the server at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Error communicating with Plex server: {0}")]
pub struct UpdateFailed(pub String);

/// Errors that abort setting up a configuration entry
#[derive(Error, Debug)]
pub enum SetupError {
    /// The server could not be contacted with the stored URL and token
    #[error("Cannot connect to Plex server: {0}")]
    CannotConnect(String),

    /// The server answered but the first refresh failed
    #[error("Plex server not ready: {0}")]
    NotReady(#[from] UpdateFailed),
}

/// Configuration loading and persistence errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No configuration directory available on this platform")]
    NoConfigDir,

    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed configuration file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid environment variable {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
}

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Plex API error: {0}")]
    Api(#[from] PlexError),

    #[error("State error: {0}")]
    State(#[from] plex_state::StateError),

    #[error("Setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Background task failed: {0}")]
    Task(String),
}
