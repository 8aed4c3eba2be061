//! Player entity

use crate::error::Result;
use crate::merge::{CanonicalDevice, DeviceSource};
use crate::model::{DeviceId, MediaInfo, PlayerState};
use crate::snapshot::{Snapshot, SnapshotReader};
use plex_client::{Client, MediaServer, PlaybackCommand, ServerInfo};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Set of controls a player entity supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SupportedFeatures(u32);

impl SupportedFeatures {
    pub const PAUSE: Self = Self(1);
    pub const SEEK: Self = Self(2);
    pub const VOLUME_SET: Self = Self(4);
    pub const PREVIOUS_TRACK: Self = Self(16);
    pub const NEXT_TRACK: Self = Self(32);
    pub const STOP: Self = Self(4096);
    pub const PLAY: Self = Self(16384);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for SupportedFeatures {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

const PLAYER_FEATURES: SupportedFeatures = SupportedFeatures::PAUSE
    .union(SupportedFeatures::PLAY)
    .union(SupportedFeatures::STOP)
    .union(SupportedFeatures::NEXT_TRACK)
    .union(SupportedFeatures::PREVIOUS_TRACK)
    .union(SupportedFeatures::VOLUME_SET)
    .union(SupportedFeatures::SEEK);

/// Extra state attributes for a player with an active session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_product: Option<String>,
}

/// Registry metadata linking a player to the server it is reached through
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    /// `("plex", device id)`
    pub identifiers: Vec<(String, String)>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    /// Machine identifier of the media server
    pub via_device: String,
}

/// A media player entity bound to one canonical device
///
/// Every read derives its answer from the latest published snapshot; nothing
/// is cached between snapshots.
pub struct PlexPlayer {
    device: CanonicalDevice,
    server: Arc<dyn MediaServer>,
    server_info: ServerInfo,
    snapshot: SnapshotReader,
}

impl PlexPlayer {
    pub fn new(
        device: CanonicalDevice,
        server: Arc<dyn MediaServer>,
        snapshot: SnapshotReader,
    ) -> Self {
        let server_info = server.info().clone();
        Self {
            device,
            server,
            server_info,
            snapshot,
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.device.id
    }

    pub fn name(&self) -> &str {
        &self.device.name
    }

    pub fn source(&self) -> &DeviceSource {
        &self.device.source
    }

    pub fn unique_id(&self) -> String {
        format!("plex_{}", self.device.id)
    }

    /// False while the coordinator's last refresh failed
    pub fn available(&self) -> bool {
        self.snapshot.is_available()
    }

    pub fn state(&self) -> PlayerState {
        let snapshot = self.snapshot.current();
        Self::state_in(&snapshot, &self.device.id)
    }

    pub fn media(&self) -> MediaInfo {
        let snapshot = self.snapshot.current();
        match snapshot.session_for(&self.device.id) {
            Some(session) => {
                let state = Self::state_in(&snapshot, &self.device.id);
                MediaInfo::from_session(session, state.has_position(), snapshot.fetched_at)
            }
            None => MediaInfo::default(),
        }
    }

    pub fn extra_attributes(&self) -> PlayerAttributes {
        let snapshot = self.snapshot.current();
        let Some(session) = snapshot.session_for(&self.device.id) else {
            return PlayerAttributes::default();
        };

        PlayerAttributes {
            user: session.user.as_ref().map(|u| u.title.clone()),
            player_address: session.player.address.clone(),
            player_device: session.player.device.clone(),
            player_platform: session.player.platform.clone(),
            player_product: session.player.product.clone(),
        }
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            identifiers: vec![("plex".to_string(), self.device.id.to_string())],
            name: self.device.name.clone(),
            manufacturer: "Plex".to_string(),
            model: self
                .device
                .source
                .product()
                .unwrap_or("Plex Client")
                .to_string(),
            via_device: self.server_info.machine_identifier.clone(),
        }
    }

    pub fn supported_features(&self) -> SupportedFeatures {
        PLAYER_FEATURES
    }

    // ========================================================================
    // Controls
    // ========================================================================

    pub fn play(&self) -> Result<()> {
        self.command(PlaybackCommand::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.command(PlaybackCommand::Pause)
    }

    pub fn stop(&self) -> Result<()> {
        self.command(PlaybackCommand::Stop)
    }

    pub fn next_track(&self) -> Result<()> {
        self.command(PlaybackCommand::SkipNext)
    }

    pub fn previous_track(&self) -> Result<()> {
        self.command(PlaybackCommand::SkipPrevious)
    }

    /// Set volume from a level in [0, 1]; out of range levels are clamped
    pub fn set_volume(&self, level: f64) -> Result<()> {
        let percent = (level.clamp(0.0, 1.0) * 100.0).round() as u8;
        self.command(PlaybackCommand::SetVolume(percent))
    }

    /// Seek to a position in seconds
    pub fn seek(&self, position: f64) -> Result<()> {
        let offset_ms = (position.max(0.0) * 1000.0).round() as u64;
        self.command(PlaybackCommand::SeekTo { offset_ms })
    }

    fn command(&self, command: PlaybackCommand) -> Result<()> {
        match self.resolve_client() {
            Some(client) => {
                debug!("Sending {:?} to {} ({})", command, self.device.name, self.device.id);
                self.server.send(&client, command)?;
                Ok(())
            }
            None => {
                debug!(
                    "No controllable client for {} ({}), ignoring {:?}",
                    self.device.name, self.device.id, command
                );
                Ok(())
            }
        }
    }

    /// Find something that accepts playback commands for this device
    fn resolve_client(&self) -> Option<Client> {
        match &self.device.source {
            DeviceSource::Client(client) if client.base_url().is_some() => {
                return Some(client.clone());
            }
            DeviceSource::Device(device) => match self.server.connect_device(device) {
                Ok(client) => return Some(client),
                Err(e) => debug!("Could not connect to {}: {}", self.device.id, e),
            },
            _ => {}
        }

        let snapshot = self.snapshot.current();
        snapshot.client_for(&self.device.id).cloned()
    }

    fn state_in(snapshot: &Snapshot, id: &DeviceId) -> PlayerState {
        snapshot
            .session_for(id)
            .map(|s| PlayerState::from_session_state(&s.player.state))
            .unwrap_or(PlayerState::Idle)
    }
}

impl fmt::Debug for PlexPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlexPlayer")
            .field("id", &self.device.id)
            .field("name", &self.device.name)
            .field("provenance", &self.device.provenance())
            .finish()
    }
}
