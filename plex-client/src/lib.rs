//! Blocking client for Plex Media Server and plex.tv
//!
//! This crate is the only part of the workspace that speaks HTTP. It exposes
//! the listing calls a poller needs (sessions, clients, account devices), the
//! playback commands a player entity needs, and the PIN round trip used when
//! linking a new installation.
//!
//! Everything here blocks the calling thread. Async callers should run these
//! calls on a blocking pool (`tokio::task::spawn_blocking`).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use plex_client::{MediaServer, PlaybackCommand, PlexServer};
//!
//! let server = PlexServer::connect("http://192.168.1.10:32400", "token")?;
//! if let Some(client) = server.clients()?.first() {
//!     server.send(client, PlaybackCommand::Pause)?;
//! }
//! # Ok::<(), plex_client::PlexError>(())
//! ```

mod account;
mod de;
mod error;
mod http;
mod model;
mod server;

pub use account::{PlexAccount, PlexTv, LINK_URL};
pub use error::{PlexError, Result};
pub use http::ClientOptions;
pub use model::{
    Client, Connection, Device, MediaKind, PlaybackCommand, Pin, ServerInfo, Session,
    SessionPlayer, SessionUser,
};
pub use server::PlexServer;

/// Default plex.tv base URL
pub const PLEX_TV_URL: &str = "https://plex.tv";

/// The operations the rest of the SDK needs from a media server
///
/// [`PlexServer`] is the real implementation; tests substitute in-memory fakes.
pub trait MediaServer: Send + Sync {
    /// Identity of the server
    fn info(&self) -> &ServerInfo;

    /// Active playback sessions
    fn sessions(&self) -> Result<Vec<Session>>;

    /// Reachable, controllable clients
    fn clients(&self) -> Result<Vec<Client>>;

    /// Devices registered to the account behind the server token
    ///
    /// Fails when the server is not linked to an account.
    fn account_devices(&self) -> Result<Vec<Device>>;

    /// Turn an account device into a controllable client
    fn connect_device(&self, device: &Device) -> Result<Client>;

    /// Send a playback command
    fn send(&self, client: &Client, command: PlaybackCommand) -> Result<()>;
}

/// Normalise a user-entered server URL
///
/// Trims whitespace and trailing slashes and assumes `http://` when no scheme
/// is given. Blank input stays blank.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
