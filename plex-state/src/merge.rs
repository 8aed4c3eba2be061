//! Device identity merge
//!
//! A single physical player can show up in three listings at once: the
//! account's device resources, the server's locally advertised clients and
//! the player attached to an active session. The merge collapses them into
//! one canonical record per identifier.

use crate::model::DeviceId;
use crate::snapshot::Snapshot;
use plex_client::{Client, Device, SessionPlayer};
use serde::Serialize;
use std::collections::HashSet;

/// Capability a device resource must advertise to be treated as a player
pub const PLAYER_CAPABILITY: &str = "client";

/// Which listing a canonical device was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Provenance {
    Device,
    Client,
    Player,
}

/// The raw object a canonical device is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceSource {
    Device(Device),
    Client(Client),
    Player(SessionPlayer),
}

impl DeviceSource {
    pub fn id(&self) -> &str {
        match self {
            DeviceSource::Device(d) => &d.client_identifier,
            DeviceSource::Client(c) => &c.machine_identifier,
            DeviceSource::Player(p) => &p.machine_identifier,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DeviceSource::Device(d) => &d.name,
            DeviceSource::Client(c) => &c.title,
            DeviceSource::Player(p) => &p.title,
        }
    }

    pub fn product(&self) -> Option<&str> {
        match self {
            DeviceSource::Device(d) => d.product.as_deref(),
            DeviceSource::Client(c) => c.product.as_deref(),
            DeviceSource::Player(p) => p.product.as_deref(),
        }
    }

    pub fn provenance(&self) -> Provenance {
        match self {
            DeviceSource::Device(_) => Provenance::Device,
            DeviceSource::Client(_) => Provenance::Client,
            DeviceSource::Player(_) => Provenance::Player,
        }
    }
}

/// One player device after the merge
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalDevice {
    pub id: DeviceId,
    pub name: String,
    pub source: DeviceSource,
}

impl CanonicalDevice {
    fn from_source(source: DeviceSource) -> Option<Self> {
        let id = DeviceId::new(source.id());
        if id.is_empty() {
            return None;
        }
        let name = match source.name().trim() {
            "" => id.to_string(),
            name => name.to_string(),
        };
        Some(Self { id, name, source })
    }

    pub fn provenance(&self) -> Provenance {
        self.source.provenance()
    }
}

/// Merge the three listings of a snapshot into canonical devices
///
/// Account devices take precedence over local clients, which take precedence
/// over session players. Within a listing the first occurrence of an
/// identifier wins. Account devices without the player capability and
/// entries with an empty identifier are skipped.
pub fn canonical_devices(snapshot: &Snapshot) -> Vec<CanonicalDevice> {
    let devices = snapshot
        .devices
        .iter()
        .filter(|d| d.has_capability(PLAYER_CAPABILITY))
        .cloned()
        .map(DeviceSource::Device);
    let clients = snapshot.clients.iter().cloned().map(DeviceSource::Client);
    let players = snapshot
        .sessions
        .iter()
        .map(|s| DeviceSource::Player(s.player.clone()));

    let mut seen = HashSet::new();
    devices
        .chain(clients)
        .chain(players)
        .filter_map(CanonicalDevice::from_source)
        .filter(|d| seen.insert(d.id.clone()))
        .collect()
}
