//! Error types for plex-state

use plex_client::PlexError;
use thiserror::Error;

/// Errors raised by entity operations
#[derive(Debug, Error)]
pub enum StateError {
    /// The server or client rejected a request
    #[error("Plex API error: {0}")]
    Api(#[from] PlexError),
}

/// Result type for plex-state operations
pub type Result<T> = std::result::Result<T, StateError>;
