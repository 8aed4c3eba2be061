//! Error types for the Plex client

use thiserror::Error;

/// Errors that can occur while talking to a Plex server or plex.tv
#[derive(Debug, Error)]
pub enum PlexError {
    /// The remote host could not be reached at all
    ///
    /// Covers DNS failures, refused connections and timeouts. This is the only
    /// variant treated as a transport failure by [`PlexError::is_transport`].
    #[error("Network error: {0}")]
    Network(String),

    /// The remote host answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// The token was rejected
    #[error("Unauthorized: token rejected")]
    Unauthorized,

    /// The server has no plex.tv account behind its token
    #[error("Server is not linked to a Plex account: {0}")]
    NotLinked(String),

    /// The response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// A command parameter was out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The target cannot accept playback commands
    #[error("Not controllable: {0}")]
    NotControllable(String),
}

impl PlexError {
    /// Whether the failure happened below HTTP, i.e. the host was unreachable
    pub fn is_transport(&self) -> bool {
        matches!(self, PlexError::Network(_))
    }
}

/// Type alias for results that can return a PlexError
pub type Result<T> = std::result::Result<T, PlexError>;

impl From<ureq::Error> for PlexError {
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(401, _) => PlexError::Unauthorized,
            ureq::Error::Status(status, response) => PlexError::Http {
                status,
                url: strip_query(response.get_url()),
            },
            ureq::Error::Transport(transport) => PlexError::Network(transport.to_string()),
        }
    }
}

fn strip_query(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_string()
}
