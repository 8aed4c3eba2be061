//! Snapshot model and entity views for plex-sdk
//!
//! This crate turns the raw listings fetched from a Plex Media Server into
//! the entities a host application shows:
//!
//! - [`Snapshot`] is the result of one poll, published through a
//!   [`SnapshotPublisher`] and read through [`SnapshotReader`]s
//! - [`canonical_devices`] merges account devices, local clients and session
//!   players into one record per device identifier
//! - [`PlayerRegistry`] owns one [`PlexPlayer`] per device for the life of
//!   the configuration entry
//! - [`SessionsSensor`] reports the number of active sessions
//!
//! # Example
//!
//! ```rust,ignore
//! use plex_state::{PlayerRegistry, SnapshotPublisher};
//!
//! let publisher = SnapshotPublisher::new();
//! let registry = PlayerRegistry::new(server.clone(), publisher.reader());
//!
//! let snapshot = publisher.publish(fetch(&server)?);
//! for player in registry.discover(&snapshot) {
//!     println!("{}: {:?}", player.name(), player.state());
//! }
//! ```

pub mod error;
pub mod merge;
pub mod model;
pub mod player;
pub mod registry;
pub mod sensor;
pub mod snapshot;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{Result, StateError};
pub use merge::{canonical_devices, CanonicalDevice, DeviceSource, Provenance, PLAYER_CAPABILITY};
pub use model::{DeviceId, MediaContentType, MediaInfo, PlayerState};
pub use player::{DeviceInfo, PlayerAttributes, PlexPlayer, SupportedFeatures};
pub use registry::{EvictionPolicy, PlayerRegistry};
pub use sensor::{SensorAttributes, SessionDetail, SessionsSensor};
pub use snapshot::{Snapshot, SnapshotPublisher, SnapshotReader};
