//! Shared snapshot of the server's live state
//!
//! The polling coordinator owns a [`SnapshotPublisher`] and replaces the whole
//! snapshot on every successful refresh. Entities hold a [`SnapshotReader`]
//! and never cache anything derived from it.

use crate::model::DeviceId;
use chrono::{DateTime, Utc};
use plex_client::{Client, Device, Session};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Result of one refresh cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub sessions: Vec<Session>,
    pub clients: Vec<Client>,
    pub devices: Vec<Device>,
    pub fetched_at: DateTime<Utc>,
    /// False when any listing failed and was replaced by an empty one
    pub complete: bool,
}

impl Snapshot {
    pub fn new(sessions: Vec<Session>, clients: Vec<Client>, devices: Vec<Device>) -> Self {
        Self {
            sessions,
            clients,
            devices,
            fetched_at: Utc::now(),
            complete: true,
        }
    }

    /// Mark whether every listing was fetched
    pub fn with_complete(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }

    /// Snapshot with empty listings, used before the first refresh
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }

    /// The session being played on the given player, if any
    pub fn session_for(&self, id: &DeviceId) -> Option<&Session> {
        self.sessions
            .iter()
            .find(|s| s.player.machine_identifier == id.as_str())
    }

    /// The locally advertised client with the given identifier, if any
    pub fn client_for(&self, id: &DeviceId) -> Option<&Client> {
        self.clients
            .iter()
            .find(|c| c.machine_identifier == id.as_str())
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Write side of the snapshot channel
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: watch::Sender<Arc<Snapshot>>,
    available: Arc<AtomicBool>,
}

impl SnapshotPublisher {
    /// Starts with an empty snapshot, marked unavailable
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(Snapshot::empty()));
        Self {
            tx,
            available: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the current snapshot and mark the source available
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.available.store(true, Ordering::SeqCst);
        self.tx.send_replace(Arc::clone(&snapshot));
        snapshot
    }

    /// Record a failed refresh; the previous snapshot stays current
    pub fn mark_failed(&self) {
        self.available.store(false, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.tx.borrow().clone()
    }

    /// Raw channel receiver, for callers that `select!` on updates
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.tx.subscribe()
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            rx: self.tx.subscribe(),
            available: Arc::clone(&self.available),
        }
    }
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Read side of the snapshot channel
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<Arc<Snapshot>>,
    available: Arc<AtomicBool>,
}

impl SnapshotReader {
    /// Reader over a fixed snapshot, reported as available
    pub fn fixed(snapshot: Snapshot) -> Self {
        let publisher = SnapshotPublisher::new();
        publisher.publish(snapshot);
        publisher.reader()
    }

    /// The latest published snapshot
    pub fn current(&self) -> Arc<Snapshot> {
        self.rx.borrow().clone()
    }

    /// Whether the most recent refresh succeeded
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Wait until a new snapshot is published
    ///
    /// Returns false once the publisher is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
