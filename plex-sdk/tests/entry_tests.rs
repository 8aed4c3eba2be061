//! Entry setup, discovery forwarding and unload

use parking_lot::Mutex;
use plex_client::{MediaKind, MediaServer, PlaybackCommand};
use plex_sdk::{
    CoordinatorConfig, Entity, EntityHost, EntryConfig, EvictionPolicy, MemoryHost, Platform,
    PlayerState, PlexEntry, SdkError, SetupError,
};
use plex_state::testing::{self, Failure, FakeServer, Listing};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn fast_polling() -> CoordinatorConfig {
    CoordinatorConfig {
        update_interval: Duration::from_millis(50),
        ..Default::default()
    }
}

fn server() -> Arc<FakeServer> {
    Arc::new(
        FakeServer::new("Basement", "srv-1")
            .with_sessions(vec![testing::with_user(
                testing::session("tv", "Pilot", MediaKind::Episode, "playing"),
                "alice",
            )])
            .with_clients(vec![testing::client("phone", "Phone")]),
    )
}

async fn setup(
    server: &Arc<FakeServer>,
    host: Arc<dyn EntityHost>,
    config: CoordinatorConfig,
) -> Result<PlexEntry, SetupError> {
    let server: Arc<dyn MediaServer> = server.clone();
    PlexEntry::setup_with_server(server, host, config).await
}

/// Host whose unload fails for selected platforms
#[derive(Default)]
struct StubbornHost {
    inner: MemoryHost,
    refuse: Mutex<HashSet<Platform>>,
    unloaded: Mutex<Vec<Platform>>,
}

impl EntityHost for StubbornHost {
    fn add_entities(&self, platform: Platform, entities: Vec<Entity>) {
        self.inner.add_entities(platform, entities);
    }

    fn unload_platform(&self, platform: Platform) -> bool {
        self.unloaded.lock().push(platform);
        !self.refuse.lock().contains(&platform) && self.inner.unload_platform(platform)
    }
}

#[tokio::test]
async fn test_setup_registers_sensor_and_players() {
    let server = server();
    let host = Arc::new(MemoryHost::new());
    let entry = setup(&server, host.clone(), CoordinatorConfig::default())
        .await
        .unwrap();

    assert_eq!(entry.entry_id(), "srv-1");
    assert_eq!(host.unique_ids(Platform::Sensor), vec!["srv-1_sessions"]);
    assert_eq!(
        host.unique_ids(Platform::MediaPlayer),
        vec!["plex_phone", "plex_tv"]
    );

    let sensor = &host.sensors()[0];
    assert_eq!(sensor.native_value(), 1);
    assert_eq!(sensor.attributes().active_users, vec!["alice"]);

    let tv = entry.player("tv").unwrap();
    assert_eq!(tv.state(), PlayerState::Playing);
    assert!(entry.unload().await);
}

#[tokio::test]
async fn test_setup_not_ready_when_server_unreachable() {
    let server = server();
    server.fail(Listing::Sessions, Failure::Transport);
    server.fail(Listing::Clients, Failure::Transport);
    let host = Arc::new(MemoryHost::new());

    let result = setup(&server, host.clone(), CoordinatorConfig::default()).await;
    assert!(matches!(result, Err(SetupError::NotReady(_))));
    assert!(host.entities(Platform::Sensor).is_empty());
}

#[tokio::test]
async fn test_setup_cannot_connect_to_bad_url() {
    let host = Arc::new(MemoryHost::new());
    let config = EntryConfig::new("http://127.0.0.1:1", "token");

    let result = PlexEntry::setup(config, host, CoordinatorConfig::default()).await;
    assert!(matches!(result, Err(SetupError::CannotConnect(_))));
}

#[tokio::test]
async fn test_polling_discovers_new_players_once() {
    let server = server();
    let host = Arc::new(MemoryHost::new());
    let entry = setup(&server, host.clone(), fast_polling()).await.unwrap();

    server.set_clients(vec![
        testing::client("phone", "Phone"),
        testing::client("laptop", "Laptop"),
    ]);
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(
        host.unique_ids(Platform::MediaPlayer),
        vec!["plex_phone", "plex_tv", "plex_laptop"]
    );
    assert_eq!(entry.players().len(), 3);
    assert!(entry.unload().await);
}

#[tokio::test]
async fn test_players_are_retained_when_they_disappear() {
    let server = server();
    let host = Arc::new(MemoryHost::new());
    let entry = setup(&server, host.clone(), fast_polling()).await.unwrap();

    server.set_sessions(Vec::new());
    tokio::time::sleep(Duration::from_millis(200)).await;

    let tv = entry.player("tv").unwrap();
    assert_eq!(tv.state(), PlayerState::Idle);
    assert_eq!(host.players().len(), 2);
    assert!(entry.unload().await);
}

#[tokio::test]
async fn test_evicting_entry_removes_vanished_players() {
    let server = server();
    let host = Arc::new(MemoryHost::new());
    let config = fast_polling().with_eviction(EvictionPolicy::EvictAbsent);
    let entry = setup(&server, host.clone(), config).await.unwrap();

    server.set_sessions(Vec::new());
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(entry.player("tv").is_none());
    assert_eq!(host.unique_ids(Platform::MediaPlayer), vec!["plex_phone"]);
    assert!(entry.unload().await);
}

#[tokio::test]
async fn test_failed_listing_does_not_evict_its_players() {
    let server = Arc::new(
        FakeServer::new("Basement", "srv-1")
            .with_devices(vec![testing::device("shield", "Shield", "client,player")]),
    );
    let host = Arc::new(MemoryHost::new());
    let config = CoordinatorConfig::default().with_eviction(EvictionPolicy::EvictAbsent);
    let entry = setup(&server, host.clone(), config).await.unwrap();
    assert_eq!(host.unique_ids(Platform::MediaPlayer), vec!["plex_shield"]);

    server.fail(Listing::Devices, Failure::Server);
    let snapshot = entry.coordinator().refresh().await.unwrap();
    assert!(!snapshot.complete);
    assert!(entry.player("shield").is_some());
    assert_eq!(host.unique_ids(Platform::MediaPlayer), vec!["plex_shield"]);

    server.recover();
    server.set_devices(Vec::new());
    assert!(entry.coordinator().refresh().await.unwrap().complete);
    assert!(entry.player("shield").is_none());
    assert!(host.unique_ids(Platform::MediaPlayer).is_empty());
    assert!(entry.unload().await);
}

#[tokio::test]
async fn test_unload_stops_polling() {
    let server = server();
    let host = Arc::new(MemoryHost::new());
    let entry = setup(&server, host.clone(), fast_polling()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(entry.unload().await);
    assert!(!entry.coordinator().is_running());
    assert_eq!(entry.coordinator().listener_count(), 0);
    assert!(host.entities(Platform::MediaPlayer).is_empty());

    let polled = server.polls(Listing::Sessions);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.polls(Listing::Sessions), polled);
}

#[tokio::test]
async fn test_unload_reports_failure_of_any_platform() {
    let server = server();
    let host = Arc::new(StubbornHost::default());
    host.refuse.lock().insert(Platform::Sensor);
    let entry = setup(&server, host.clone(), CoordinatorConfig::default())
        .await
        .unwrap();

    assert!(!entry.unload().await);
    // The remaining platform is still unloaded
    assert_eq!(
        *host.unloaded.lock(),
        vec![Platform::Sensor, Platform::MediaPlayer]
    );
    assert!(host.inner.entities(Platform::MediaPlayer).is_empty());
}

#[tokio::test]
async fn test_player_control_sends_through_blocking_pool() {
    let server = server();
    let host = Arc::new(MemoryHost::new());
    let entry = setup(&server, host, CoordinatorConfig::default())
        .await
        .unwrap();

    let phone = entry.control("Phone").unwrap();
    phone.set_volume(0.5).await.unwrap();
    phone.seek(90.0).await.unwrap();
    phone.play().await.unwrap();
    // Session-only players have no client to command
    entry.control("tv").unwrap().pause().await.unwrap();

    assert_eq!(
        server.sent(),
        vec![
            ("phone".to_string(), PlaybackCommand::SetVolume(50)),
            ("phone".to_string(), PlaybackCommand::SeekTo { offset_ms: 90_000 }),
            ("phone".to_string(), PlaybackCommand::Play),
        ]
    );
    assert!(matches!(
        entry.control("kitchen"),
        Err(SdkError::PlayerNotFound(_))
    ));
    assert!(entry.unload().await);
}
