//! Property-based tests for the device merge and player registry

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

use plex_client::{
    Client, Device, MediaServer, PlaybackCommand, PlexError, ServerInfo, Session, SessionPlayer,
};
use plex_state::{canonical_devices, PlayerRegistry, Provenance, Snapshot, SnapshotReader};

// ============================================================================
// Test Helpers
// ============================================================================

/// Server that is never polled by these tests
struct NullServer(ServerInfo);

impl MediaServer for NullServer {
    fn info(&self) -> &ServerInfo {
        &self.0
    }
    fn sessions(&self) -> plex_client::Result<Vec<Session>> {
        Ok(Vec::new())
    }
    fn clients(&self) -> plex_client::Result<Vec<Client>> {
        Ok(Vec::new())
    }
    fn account_devices(&self) -> plex_client::Result<Vec<Device>> {
        Ok(Vec::new())
    }
    fn connect_device(&self, device: &Device) -> plex_client::Result<Client> {
        Err(PlexError::NotControllable(device.client_identifier.clone()))
    }
    fn send(&self, _client: &Client, _command: PlaybackCommand) -> plex_client::Result<()> {
        Ok(())
    }
}

/// Small id alphabet so the three listings overlap often
fn id_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}"
}

fn device_strategy() -> impl Strategy<Value = Device> {
    (id_strategy(), prop::bool::ANY).prop_map(|(id, is_player)| Device {
        name: format!("device {}", id),
        client_identifier: id,
        provides: if is_player { "client,player" } else { "server" }.to_string(),
        ..Default::default()
    })
}

fn client_strategy() -> impl Strategy<Value = Client> {
    id_strategy()
        .prop_map(|id| Client::new(id.clone(), format!("client {}", id), "http://10.0.0.2:32500"))
}

fn session_strategy() -> impl Strategy<Value = Session> {
    id_strategy().prop_map(|id| Session {
        title: "Song".to_string(),
        player: SessionPlayer {
            machine_identifier: id,
            title: "Player".to_string(),
            state: "playing".to_string(),
            ..Default::default()
        },
        ..Default::default()
    })
}

fn snapshot_strategy() -> impl Strategy<Value = Snapshot> {
    (
        prop::collection::vec(session_strategy(), 0..6),
        prop::collection::vec(client_strategy(), 0..6),
        prop::collection::vec(device_strategy(), 0..6),
    )
        .prop_map(|(sessions, clients, devices)| Snapshot::new(sessions, clients, devices))
}

fn eligible_ids(snapshot: &Snapshot) -> HashSet<String> {
    snapshot
        .devices
        .iter()
        .filter(|d| d.provides.contains("client"))
        .map(|d| d.client_identifier.clone())
        .chain(snapshot.clients.iter().map(|c| c.machine_identifier.clone()))
        .chain(snapshot.sessions.iter().map(|s| s.player.machine_identifier.clone()))
        .collect()
}

// ============================================================================
// Merge properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every eligible identifier appears exactly once
    #[test]
    fn prop_merge_yields_one_record_per_id(snapshot in snapshot_strategy()) {
        let merged = canonical_devices(&snapshot);
        let ids: Vec<String> = merged.iter().map(|d| d.id.to_string()).collect();
        let unique: HashSet<String> = ids.iter().cloned().collect();

        prop_assert_eq!(ids.len(), unique.len());
        prop_assert_eq!(unique, eligible_ids(&snapshot));
    }

    /// Account devices beat local clients, which beat session players
    #[test]
    fn prop_merge_respects_precedence(snapshot in snapshot_strategy()) {
        let device_ids: HashSet<&str> = snapshot
            .devices
            .iter()
            .filter(|d| d.provides.contains("client"))
            .map(|d| d.client_identifier.as_str())
            .collect();
        let client_ids: HashSet<&str> = snapshot
            .clients
            .iter()
            .map(|c| c.machine_identifier.as_str())
            .collect();

        for device in canonical_devices(&snapshot) {
            let expected = if device_ids.contains(device.id.as_str()) {
                Provenance::Device
            } else if client_ids.contains(device.id.as_str()) {
                Provenance::Client
            } else {
                Provenance::Player
            };
            prop_assert_eq!(device.provenance(), expected);
        }
    }

    /// The merge is a pure function of the snapshot
    #[test]
    fn prop_merge_is_deterministic(snapshot in snapshot_strategy()) {
        prop_assert_eq!(canonical_devices(&snapshot), canonical_devices(&snapshot));
    }
}

// ============================================================================
// Registry properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Re-running discovery over any sequence of snapshots never duplicates a player
    #[test]
    fn prop_discovery_is_idempotent(snapshots in prop::collection::vec(snapshot_strategy(), 1..5)) {
        let server: Arc<dyn MediaServer> = Arc::new(NullServer(ServerInfo::default()));
        let registry = PlayerRegistry::new(server, SnapshotReader::fixed(Snapshot::empty()));

        let mut seen = HashSet::new();
        for snapshot in &snapshots {
            for player in registry.discover(snapshot) {
                prop_assert!(seen.insert(player.id().to_string()), "player created twice");
            }
            prop_assert!(registry.discover(snapshot).is_empty());
        }

        let expected: HashSet<String> = snapshots.iter().flat_map(eligible_ids).collect();
        prop_assert_eq!(seen, expected);
        prop_assert_eq!(registry.len(), registry.players().len());
    }
}
