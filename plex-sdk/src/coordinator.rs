//! Polling coordinator
//!
//! Fetches sessions, clients and account devices on a fixed interval and
//! publishes them as one [`Snapshot`]. Each listing call is blocking and runs
//! on the blocking pool; the three run concurrently.

use crate::config::ENV_POLL_INTERVAL;
use crate::error::{ConfigError, UpdateFailed};
use parking_lot::Mutex;
use plex_client::{MediaServer, PlexError};
use plex_state::{EvictionPolicy, Snapshot, SnapshotPublisher, SnapshotReader};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

pub const MIN_UPDATE_INTERVAL: Duration = Duration::from_secs(5);
pub const MAX_UPDATE_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_UPDATE_INTERVAL: Duration = MIN_UPDATE_INTERVAL;

/// Polling settings for one configuration entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Time between polls. [`CoordinatorConfig::with_interval`] and
    /// [`CoordinatorConfig::from_env`] keep it within 5 to 10 seconds.
    pub update_interval: Duration,
    /// Applied by entries to players that vanish from every listing
    pub eviction: EvictionPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            eviction: EvictionPolicy::default(),
        }
    }
}

impl CoordinatorConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval.clamp(MIN_UPDATE_INTERVAL, MAX_UPDATE_INTERVAL);
        self
    }

    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    /// Defaults, with `PLEX_POLL_INTERVAL` (seconds) applied when set
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self::default();
        match lookup(ENV_POLL_INTERVAL) {
            Some(value) => {
                let seconds: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    name: ENV_POLL_INTERVAL,
                    value: value.clone(),
                })?;
                Ok(config.with_interval(Duration::from_secs(seconds)))
            }
            None => Ok(config),
        }
    }
}

type Listener = Arc<dyn Fn(&Arc<Snapshot>) + Send + Sync>;

struct Poller {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

struct Shared {
    server: Arc<dyn MediaServer>,
    config: CoordinatorConfig,
    publisher: SnapshotPublisher,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener_id: AtomicU64,
    poller: Mutex<Option<Poller>>,
}

/// Owns the snapshot of one server and the task that refreshes it
#[derive(Clone)]
pub struct Coordinator {
    shared: Arc<Shared>,
}

impl Coordinator {
    pub fn new(server: Arc<dyn MediaServer>, config: CoordinatorConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                server,
                config,
                publisher: SnapshotPublisher::new(),
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(0),
                poller: Mutex::new(None),
            }),
        }
    }

    pub fn server(&self) -> &Arc<dyn MediaServer> {
        &self.shared.server
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.shared.config
    }

    /// Run one refresh cycle
    ///
    /// A listing that fails is logged and treated as empty, and the snapshot
    /// is marked incomplete. The cycle fails when both sessions and clients
    /// fail for any reason other than an unlinked account; the previous
    /// snapshot then stays current and entities report unavailable.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, UpdateFailed> {
        let server = &self.shared.server;
        let (sessions, clients, devices) = tokio::join!(
            fetch(Arc::clone(server), |s| s.sessions()),
            fetch(Arc::clone(server), |s| s.clients()),
            fetch(Arc::clone(server), |s| s.account_devices()),
        );

        let (sessions, sessions_failed) = settle("sessions", sessions);
        let (clients, clients_failed) = settle("clients", clients);
        let (devices, devices_failed) = settle("account devices", devices);

        if let (Some(reason), Some(_)) = (&sessions_failed, &clients_failed) {
            self.shared.publisher.mark_failed();
            error!(
                "Failed to update Plex server '{}': {}",
                server.info().friendly_name,
                reason
            );
            return Err(UpdateFailed(reason.clone()));
        }
        let complete =
            sessions_failed.is_none() && clients_failed.is_none() && devices_failed.is_none();

        debug!(
            "Refreshed '{}': {} sessions, {} clients, {} devices",
            server.info().friendly_name,
            sessions.len(),
            clients.len(),
            devices.len()
        );
        let snapshot = self
            .shared
            .publisher
            .publish(Snapshot::new(sessions, clients, devices).with_complete(complete));
        self.notify(&snapshot);
        Ok(snapshot)
    }

    /// The eager refresh run before an entry finishes setting up
    pub async fn first_refresh(&self) -> Result<Arc<Snapshot>, UpdateFailed> {
        let snapshot = self.refresh().await?;
        info!(
            "Connected to Plex server '{}' ({} active sessions)",
            self.shared.server.info().friendly_name,
            snapshot.sessions.len()
        );
        Ok(snapshot)
    }

    /// Start periodic refreshes on the current runtime
    ///
    /// The first poll happens one interval from now. Calling `start` on a
    /// running coordinator does nothing.
    pub fn start(&self) {
        let mut poller = self.shared.poller.lock();
        if poller.is_some() {
            return;
        }

        let (shutdown, shutdown_rx) = oneshot::channel();
        let period = self.shared.config.update_interval;
        let handle = tokio::spawn(poll_loop(Arc::downgrade(&self.shared), period, shutdown_rx));
        *poller = Some(Poller { shutdown, handle });
        info!("Polling every {:?}", period);
    }

    /// Stop periodic refreshes, waiting for an in-flight poll to finish
    pub async fn stop(&self) {
        let poller = self.shared.poller.lock().take();
        let Some(Poller { shutdown, handle }) = poller else {
            return;
        };

        let _ = shutdown.send(());
        if let Err(e) = handle.await {
            if !e.is_cancelled() {
                warn!("Polling task ended abnormally: {}", e);
            }
        }
        info!("Stopped polling '{}'", self.shared.server.info().friendly_name);
    }

    pub fn is_running(&self) -> bool {
        self.shared.poller.lock().is_some()
    }

    /// Whether the most recent refresh reached the server
    pub fn last_update_success(&self) -> bool {
        self.shared.publisher.is_available()
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.shared.publisher.current()
    }

    pub fn reader(&self) -> SnapshotReader {
        self.shared.publisher.reader()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.shared.publisher.subscribe()
    }

    /// Call `listener` after every successful refresh
    pub fn add_listener<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&Arc<Snapshot>) + Send + Sync + 'static,
    {
        let id = self.shared.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.shared.listeners.lock().push((id, Arc::new(listener)));
        ListenerHandle {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.lock().len()
    }

    fn notify(&self, snapshot: &Arc<Snapshot>) {
        // Listeners may add or remove listeners, so call them unlocked
        let listeners: Vec<Listener> = self
            .shared
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

/// Detaches a listener registered with [`Coordinator::add_listener`]
///
/// Dropping the handle leaves the listener attached.
#[derive(Debug)]
pub struct ListenerHandle {
    id: u64,
    shared: Weak<Shared>,
}

impl ListenerHandle {
    pub fn remove(self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

async fn poll_loop(shared: Weak<Shared>, period: Duration, mut shutdown: oneshot::Receiver<()>) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; setup already refreshed
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                let coordinator = Coordinator { shared };
                if let Err(e) = coordinator.refresh().await {
                    debug!("Poll failed, retrying next interval: {}", e);
                }
            }
        }
    }
}

async fn fetch<T, F>(
    server: Arc<dyn MediaServer>,
    call: F,
) -> Result<plex_client::Result<Vec<T>>, JoinError>
where
    T: Send + 'static,
    F: FnOnce(&dyn MediaServer) -> plex_client::Result<Vec<T>> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(server.as_ref())).await
}

/// Unwrap one listing, logging failures
///
/// Returns the failure reason, if any. An unlinked account is not a failure.
fn settle<T>(
    listing: &str,
    result: Result<plex_client::Result<Vec<T>>, JoinError>,
) -> (Vec<T>, Option<String>) {
    match result {
        Ok(Ok(items)) => (items, None),
        Ok(Err(PlexError::NotLinked(reason))) => {
            debug!("Skipping {}: {}", listing, reason);
            (Vec::new(), None)
        }
        Ok(Err(e)) => {
            warn!("Failed to fetch {}: {}", listing, e);
            (Vec::new(), Some(e.to_string()))
        }
        Err(e) => {
            warn!("Fetching {} panicked: {}", listing, e);
            (Vec::new(), Some(e.to_string()))
        }
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("server", &self.shared.server.info().machine_identifier)
            .field("config", &self.shared.config)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 5)]
    #[case(5, 5)]
    #[case(7, 7)]
    #[case(10, 10)]
    #[case(60, 10)]
    fn test_interval_is_clamped(#[case] requested: u64, #[case] expected: u64) {
        let config = CoordinatorConfig::default().with_interval(Duration::from_secs(requested));
        assert_eq!(config.update_interval, Duration::from_secs(expected));
    }

    #[test]
    fn test_interval_from_env() {
        let config = CoordinatorConfig::from_lookup(|_| Some("8".to_string())).unwrap();
        assert_eq!(config.update_interval, Duration::from_secs(8));

        let config = CoordinatorConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, CoordinatorConfig::default());

        let err = CoordinatorConfig::from_lookup(|_| Some("soon".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: ENV_POLL_INTERVAL, .. }));
    }
}
