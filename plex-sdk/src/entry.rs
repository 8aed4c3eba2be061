//! Configuration entry lifecycle
//!
//! A [`PlexEntry`] is one configured server: its coordinator, its player
//! registry and the entities it handed to the host. Everything it owns lives
//! in an [`EntryContext`] and is torn down by [`PlexEntry::unload`].

use crate::config::EntryConfig;
use crate::coordinator::{Coordinator, CoordinatorConfig, ListenerHandle};
use crate::error::{SdkError, SetupError};
use crate::host::{Entity, EntityHost, Platform};
use parking_lot::Mutex;
use plex_client::{MediaServer, PlexServer};
use plex_state::{PlayerRegistry, PlexPlayer, SessionsSensor, Snapshot};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Per-entry state shared by the platforms of one server
pub struct EntryContext {
    /// Machine identifier of the server
    pub entry_id: String,
    pub server: Arc<dyn MediaServer>,
    pub coordinator: Coordinator,
    pub registry: Arc<PlayerRegistry>,
}

/// A loaded configuration entry
pub struct PlexEntry {
    context: Arc<EntryContext>,
    host: Arc<dyn EntityHost>,
    sensor: Arc<SessionsSensor>,
    discovery: Mutex<Option<ListenerHandle>>,
}

impl PlexEntry {
    /// Connect to the configured server and set up its platforms
    ///
    /// Failing to connect is fatal; a failed first refresh reports
    /// [`SetupError::NotReady`] so the caller can retry later.
    pub async fn setup(
        config: EntryConfig,
        host: Arc<dyn EntityHost>,
        coordinator_config: CoordinatorConfig,
    ) -> Result<Self, SetupError> {
        let EntryConfig { server_url, token } = config;
        let url = server_url.clone();
        let server = tokio::task::spawn_blocking(move || PlexServer::connect(&url, &token))
            .await
            .map_err(|e| SetupError::CannotConnect(e.to_string()))?
            .map_err(|e| {
                error!("Cannot connect to Plex server at {}: {}", server_url, e);
                SetupError::CannotConnect(e.to_string())
            })?;

        Self::setup_with_server(Arc::new(server), host, coordinator_config).await
    }

    /// Set up platforms for an already connected server
    pub async fn setup_with_server(
        server: Arc<dyn MediaServer>,
        host: Arc<dyn EntityHost>,
        coordinator_config: CoordinatorConfig,
    ) -> Result<Self, SetupError> {
        let eviction = coordinator_config.eviction;
        let coordinator = Coordinator::new(Arc::clone(&server), coordinator_config);
        let snapshot = coordinator.first_refresh().await?;

        let registry = Arc::new(PlayerRegistry::with_policy(
            Arc::clone(&server),
            coordinator.reader(),
            eviction,
        ));
        let context = Arc::new(EntryContext {
            entry_id: server.info().machine_identifier.clone(),
            server: Arc::clone(&server),
            coordinator,
            registry,
        });

        let sensor = Arc::new(SessionsSensor::new(
            server.info().clone(),
            context.coordinator.reader(),
        ));
        host.add_entities(Platform::Sensor, vec![Entity::Sensor(Arc::clone(&sensor))]);

        sync_players(&context.registry, host.as_ref(), &snapshot);
        let discovery = {
            let registry = Arc::clone(&context.registry);
            let host = Arc::clone(&host);
            context
                .coordinator
                .add_listener(move |snapshot| sync_players(&registry, host.as_ref(), snapshot))
        };

        context.coordinator.start();
        info!(
            "Set up Plex entry {} ({} players)",
            context.entry_id,
            context.registry.len()
        );

        Ok(Self {
            context,
            host,
            sensor,
            discovery: Mutex::new(Some(discovery)),
        })
    }

    pub fn context(&self) -> &Arc<EntryContext> {
        &self.context
    }

    pub fn entry_id(&self) -> &str {
        &self.context.entry_id
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.context.coordinator
    }

    pub fn sensor(&self) -> &Arc<SessionsSensor> {
        &self.sensor
    }

    pub fn players(&self) -> Vec<Arc<PlexPlayer>> {
        self.context.registry.players()
    }

    /// Find a player by device identifier or display name
    pub fn player(&self, key: &str) -> Option<Arc<PlexPlayer>> {
        self.context.registry.find(key)
    }

    /// Async controls for a player
    pub fn control(&self, key: &str) -> Result<PlayerControl, SdkError> {
        self.player(key)
            .map(PlayerControl::new)
            .ok_or_else(|| SdkError::PlayerNotFound(key.to_string()))
    }

    /// Stop polling, detach discovery and unload every platform
    ///
    /// Returns true only if every platform unloaded cleanly.
    pub async fn unload(&self) -> bool {
        self.context.coordinator.stop().await;
        if let Some(discovery) = self.discovery.lock().take() {
            discovery.remove();
        }

        let mut unloaded = true;
        for platform in Platform::ALL {
            if !self.host.unload_platform(platform) {
                warn!("Failed to unload {} platform for {}", platform, self.context.entry_id);
                unloaded = false;
            }
        }
        info!("Unloaded Plex entry {}", self.context.entry_id);
        unloaded
    }
}

/// Register players for new devices and drop evicted ones
fn sync_players(registry: &PlayerRegistry, host: &dyn EntityHost, snapshot: &Snapshot) {
    let evicted: Vec<String> = registry
        .evict_absent(snapshot)
        .iter()
        .map(|id| format!("plex_{}", id))
        .collect();
    if !evicted.is_empty() {
        host.remove_entities(Platform::MediaPlayer, &evicted);
    }

    let created: Vec<Entity> = registry
        .discover(snapshot)
        .into_iter()
        .map(Entity::Player)
        .collect();
    if !created.is_empty() {
        host.add_entities(Platform::MediaPlayer, created);
    }
}

/// Player controls that run the blocking command on the blocking pool
#[derive(Debug, Clone)]
pub struct PlayerControl {
    player: Arc<PlexPlayer>,
}

impl PlayerControl {
    pub fn new(player: Arc<PlexPlayer>) -> Self {
        Self { player }
    }

    pub fn player(&self) -> &Arc<PlexPlayer> {
        &self.player
    }

    pub async fn play(&self) -> Result<(), SdkError> {
        self.run(|p| p.play()).await
    }

    pub async fn pause(&self) -> Result<(), SdkError> {
        self.run(|p| p.pause()).await
    }

    pub async fn stop(&self) -> Result<(), SdkError> {
        self.run(|p| p.stop()).await
    }

    pub async fn next_track(&self) -> Result<(), SdkError> {
        self.run(|p| p.next_track()).await
    }

    pub async fn previous_track(&self) -> Result<(), SdkError> {
        self.run(|p| p.previous_track()).await
    }

    /// Volume level in [0, 1]
    pub async fn set_volume(&self, level: f64) -> Result<(), SdkError> {
        self.run(move |p| p.set_volume(level)).await
    }

    /// Position in seconds
    pub async fn seek(&self, position: f64) -> Result<(), SdkError> {
        self.run(move |p| p.seek(position)).await
    }

    async fn run<F>(&self, command: F) -> Result<(), SdkError>
    where
        F: FnOnce(&PlexPlayer) -> plex_state::Result<()> + Send + 'static,
    {
        let player = Arc::clone(&self.player);
        tokio::task::spawn_blocking(move || command(&player))
            .await
            .map_err(|e| SdkError::Task(e.to_string()))??;
        Ok(())
    }
}
