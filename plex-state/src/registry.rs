//! Durable registry of player entities

use crate::merge::canonical_devices;
use crate::model::DeviceId;
use crate::player::PlexPlayer;
use crate::snapshot::{Snapshot, SnapshotReader};
use parking_lot::RwLock;
use plex_client::MediaServer;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// What happens to a player once its device disappears from every listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Keep the entity for the life of the registry; it reports idle
    #[default]
    Retain,
    /// Drop entities whose identifier is absent from the latest snapshot
    EvictAbsent,
}

#[derive(Default)]
struct Arena {
    order: Vec<DeviceId>,
    players: HashMap<DeviceId, Arc<PlexPlayer>>,
}

/// Creates at most one [`PlexPlayer`] per device identifier
pub struct PlayerRegistry {
    server: Arc<dyn MediaServer>,
    snapshot: SnapshotReader,
    policy: EvictionPolicy,
    arena: RwLock<Arena>,
}

impl PlayerRegistry {
    pub fn new(server: Arc<dyn MediaServer>, snapshot: SnapshotReader) -> Self {
        Self::with_policy(server, snapshot, EvictionPolicy::default())
    }

    pub fn with_policy(
        server: Arc<dyn MediaServer>,
        snapshot: SnapshotReader,
        policy: EvictionPolicy,
    ) -> Self {
        Self {
            server,
            snapshot,
            policy,
            arena: RwLock::new(Arena::default()),
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Create entities for devices not seen before
    ///
    /// Returns only the newly created players, in canonical order. Running it
    /// again on the same snapshot returns nothing.
    pub fn discover(&self, snapshot: &Snapshot) -> Vec<Arc<PlexPlayer>> {
        let mut arena = self.arena.write();
        let mut created = Vec::new();

        for device in canonical_devices(snapshot) {
            if arena.players.contains_key(&device.id) {
                continue;
            }
            info!(
                "Discovered Plex player '{}' ({}) from {:?}",
                device.name,
                device.id,
                device.provenance()
            );
            let id = device.id.clone();
            let player = Arc::new(PlexPlayer::new(
                device,
                Arc::clone(&self.server),
                self.snapshot.clone(),
            ));
            arena.order.push(id.clone());
            arena.players.insert(id, Arc::clone(&player));
            created.push(player);
        }

        created
    }

    /// Remove players whose device is absent from the snapshot
    ///
    /// A no-op under [`EvictionPolicy::Retain`] and for incomplete snapshots,
    /// where a failed listing says nothing about which devices are gone.
    /// Returns the removed ids.
    pub fn evict_absent(&self, snapshot: &Snapshot) -> Vec<DeviceId> {
        if self.policy == EvictionPolicy::Retain {
            return Vec::new();
        }
        if !snapshot.complete {
            debug!("Skipping eviction: snapshot from a partially failed refresh");
            return Vec::new();
        }

        let present: HashSet<DeviceId> = canonical_devices(snapshot)
            .into_iter()
            .map(|d| d.id)
            .collect();

        let mut arena = self.arena.write();
        let removed: Vec<DeviceId> = arena
            .order
            .iter()
            .filter(|id| !present.contains(*id))
            .cloned()
            .collect();
        for id in &removed {
            arena.players.remove(id);
            info!("Removed Plex player {} (no longer listed)", id);
        }
        arena.order.retain(|id| present.contains(id));
        removed
    }

    pub fn get(&self, id: &DeviceId) -> Option<Arc<PlexPlayer>> {
        self.arena.read().players.get(id).cloned()
    }

    /// Look up a player by identifier or display name
    pub fn find(&self, key: &str) -> Option<Arc<PlexPlayer>> {
        let arena = self.arena.read();
        if let Some(player) = arena.players.get(&DeviceId::new(key)) {
            return Some(Arc::clone(player));
        }
        arena
            .order
            .iter()
            .filter_map(|id| arena.players.get(id))
            .find(|p| p.name().eq_ignore_ascii_case(key.trim()))
            .cloned()
    }

    /// All players in discovery order
    pub fn players(&self) -> Vec<Arc<PlexPlayer>> {
        let arena = self.arena.read();
        arena
            .order
            .iter()
            .filter_map(|id| arena.players.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.arena.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
