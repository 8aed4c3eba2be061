//! Plex response models
//!
//! Only the attributes this workspace reads are modelled; everything else in
//! the JSON payloads is ignored.

use serde::{Deserialize, Serialize};

use crate::de;

/// Identity of the connected Plex Media Server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub machine_identifier: String,
    #[serde(default)]
    pub version: String,
}

/// Kind of media an active session is playing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Movie,
    Episode,
    Track,
    Other(String),
}

impl MediaKind {
    /// Parse the Plex `type` attribute
    pub fn from_type(value: &str) -> Self {
        match value {
            "movie" => MediaKind::Movie,
            "episode" => MediaKind::Episode,
            "track" => MediaKind::Track,
            other => MediaKind::Other(other.to_string()),
        }
    }
}

impl Default for MediaKind {
    fn default() -> Self {
        MediaKind::Other(String::new())
    }
}

fn media_kind<'de, D>(deserializer: D) -> std::result::Result<MediaKind, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|t| MediaKind::from_type(&t)).unwrap_or_default())
}

/// The player sub-record embedded in a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPlayer {
    #[serde(default)]
    pub machine_identifier: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    /// Raw playback state: `playing`, `paused`, `buffering`, ...
    #[serde(default)]
    pub state: String,
}

/// The account watching a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// An active playback record from `/status/sessions`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    pub session_key: String,
    pub kind: MediaKind,
    pub title: String,
    /// Series title for episodes, artist for tracks
    pub grandparent_title: Option<String>,
    /// Season title for episodes, album for tracks
    pub parent_title: Option<String>,
    /// Season number for episodes
    pub parent_index: Option<u32>,
    /// Episode or track number
    pub index: Option<u32>,
    /// Duration in milliseconds
    pub duration: Option<u64>,
    /// Playback offset in milliseconds
    pub view_offset: Option<u64>,
    pub thumb: Option<String>,
    /// Absolute, token-bearing artwork URL
    pub thumb_url: Option<String>,
    pub player: SessionPlayer,
    pub user: Option<SessionUser>,
}

impl Session {
    /// Usernames attached to this session (zero or one on current servers)
    pub fn usernames(&self) -> Vec<&str> {
        self.user
            .iter()
            .map(|u| u.title.as_str())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSession {
    #[serde(default, deserialize_with = "de::string")]
    session_key: String,
    #[serde(default, rename = "type", deserialize_with = "media_kind")]
    kind: MediaKind,
    #[serde(default)]
    title: String,
    #[serde(default)]
    grandparent_title: Option<String>,
    #[serde(default)]
    parent_title: Option<String>,
    #[serde(default, deserialize_with = "de::opt_u32")]
    parent_index: Option<u32>,
    #[serde(default, deserialize_with = "de::opt_u32")]
    index: Option<u32>,
    #[serde(default, deserialize_with = "de::opt_u64")]
    duration: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_u64")]
    view_offset: Option<u64>,
    #[serde(default)]
    thumb: Option<String>,
    #[serde(default)]
    parent_thumb: Option<String>,
    #[serde(default)]
    grandparent_thumb: Option<String>,
    #[serde(default, rename = "Player")]
    player: SessionPlayer,
    #[serde(default, rename = "User")]
    user: Option<SessionUser>,
}

impl RawSession {
    /// Resolve artwork against the server and produce the public record
    pub(crate) fn into_session(self, base_url: &str, token: &str) -> Session {
        let thumb_url = self
            .thumb
            .as_deref()
            .or(self.parent_thumb.as_deref())
            .or(self.grandparent_thumb.as_deref())
            .map(|path| format!("{}{}?X-Plex-Token={}", base_url, path, token));

        Session {
            session_key: self.session_key,
            kind: self.kind,
            title: self.title,
            grandparent_title: self.grandparent_title,
            parent_title: self.parent_title,
            parent_index: self.parent_index,
            index: self.index,
            duration: self.duration,
            view_offset: self.view_offset,
            thumb: self.thumb,
            thumb_url,
            player: self.player,
            user: self.user,
        }
    }
}

/// A reachable, controllable player from `/clients`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(default)]
    pub machine_identifier: String,
    #[serde(default, rename = "name")]
    pub title: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, deserialize_with = "de::port")]
    pub port: u16,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub device_class: Option<String>,
    #[serde(default)]
    pub protocol_capabilities: String,
    /// Connection URI when reached through an account device rather than `/clients`
    #[serde(skip)]
    pub(crate) direct_url: Option<String>,
    /// Resource access token when it differs from the server token
    #[serde(skip)]
    pub(crate) access_token: Option<String>,
}

impl Client {
    /// Build a client reachable at an explicit base URL
    pub fn new(
        machine_identifier: impl Into<String>,
        title: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            machine_identifier: machine_identifier.into(),
            title: title.into(),
            direct_url: Some(base_url.into().trim_end_matches('/').to_string()),
            ..Default::default()
        }
    }

    /// Base URL playback commands are sent to
    pub fn base_url(&self) -> Option<String> {
        if let Some(url) = &self.direct_url {
            return Some(url.clone());
        }
        if self.address.is_empty() || self.port == 0 {
            return None;
        }
        Some(format!("http://{}:{}", self.address, self.port))
    }

    /// Check an entry of the comma-separated `protocolCapabilities` list
    pub fn supports(&self, capability: &str) -> bool {
        self.protocol_capabilities
            .split(',')
            .any(|c| c.trim() == capability)
    }
}

/// One way of reaching an account device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub relay: bool,
}

/// A device registered to the plex.tv account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub client_identifier: String,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    /// Comma-separated capability list, e.g. `client,player,pubsub-player`
    #[serde(default)]
    pub provides: String,
    #[serde(default)]
    pub presence: bool,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Device {
    /// Capabilities advertised by the device
    pub fn capabilities(&self) -> Vec<&str> {
        self.provides
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Check whether the device advertises a capability
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Connections ordered local first, relayed last
    pub fn ordered_connections(&self) -> Vec<&Connection> {
        let mut connections: Vec<&Connection> = self.connections.iter().collect();
        connections.sort_by_key(|c| (c.relay, !c.local));
        connections
    }
}

/// A playback command understood by Plex players
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Stop,
    SkipNext,
    SkipPrevious,
    /// Seek to an absolute offset in milliseconds
    SeekTo { offset_ms: u64 },
    /// Set the player volume, 0-100
    SetVolume(u8),
}

impl PlaybackCommand {
    /// Path below `/player/`
    pub fn path(&self) -> &'static str {
        match self {
            PlaybackCommand::Play => "playback/play",
            PlaybackCommand::Pause => "playback/pause",
            PlaybackCommand::Stop => "playback/stop",
            PlaybackCommand::SkipNext => "playback/skipNext",
            PlaybackCommand::SkipPrevious => "playback/skipPrevious",
            PlaybackCommand::SeekTo { .. } => "playback/seekTo",
            PlaybackCommand::SetVolume(_) => "playback/setParameters",
        }
    }

    /// Command-specific query parameters
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            PlaybackCommand::SeekTo { offset_ms } => vec![("offset", offset_ms.to_string())],
            PlaybackCommand::SetVolume(volume) => vec![("volume", volume.to_string())],
            _ => vec![("type", "video".to_string())],
        }
    }
}

/// A linking PIN issued by plex.tv
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    pub id: u64,
    pub code: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SessionsContainer {
    #[serde(default, rename = "Metadata")]
    pub(crate) metadata: Vec<RawSession>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ClientsContainer {
    #[serde(default, rename = "Server")]
    pub(crate) server: Vec<Client>,
}

/// The `{"MediaContainer": {...}}` envelope every server endpoint uses
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    pub(crate) media_container: T,
}
