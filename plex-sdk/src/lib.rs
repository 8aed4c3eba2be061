//! # Plex SDK - polling integration for Plex Media Server
//!
//! Polls a Plex Media Server for its sessions, clients and account devices
//! and exposes the result as media player entities and a session count
//! sensor:
//!
//! ```rust,no_run
//! use plex_sdk::{CoordinatorConfig, EntryConfig, MemoryHost, PlexEntry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), plex_sdk::SdkError> {
//!     let host = Arc::new(MemoryHost::new());
//!     let config = EntryConfig::new("http://192.168.1.10:32400", "token");
//!     let entry = PlexEntry::setup(config, host.clone(), CoordinatorConfig::default()).await?;
//!
//!     for player in entry.players() {
//!         println!("{}: {:?}", player.name(), player.state());
//!     }
//!     entry.control("Living Room TV")?.pause().await?;
//!
//!     entry.unload().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! plex-sdk (entry lifecycle, polling, setup wizard)
//!     ↓
//! plex-state (snapshot, device merge, player and sensor entities)
//!     ↓
//! plex-client (Plex HTTP API)
//! ```

pub mod config;
pub mod coordinator;
pub mod entry;
pub mod error;
pub mod flow;
pub mod host;
pub mod logging;

pub use config::{ConfigStore, EntryConfig};
pub use coordinator::{Coordinator, CoordinatorConfig, ListenerHandle};
pub use entry::{EntryContext, PlayerControl, PlexEntry};
pub use error::{ConfigError, SdkError, SetupError, UpdateFailed};
pub use flow::{AuthType, ConfigFlow, FlowBackend, FlowError, FlowResult, FlowStep, PlexTvBackend};
pub use host::{Entity, EntityHost, MemoryHost, Platform};

// Re-export commonly used types from plex-state
pub use plex_state::{
    DeviceId, EvictionPolicy, MediaContentType, MediaInfo, PlayerState, PlexPlayer,
    SessionsSensor, Snapshot,
};
