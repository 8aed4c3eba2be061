//! In-memory [`MediaServer`] for tests
//!
//! Available with the `test-support` feature.

use parking_lot::Mutex;
use plex_client::{
    Client, Device, MediaKind, MediaServer, PlaybackCommand, PlexError, Result, ServerInfo,
    Session, SessionPlayer, SessionUser,
};
use std::collections::HashMap;

/// Listing served by a [`FakeServer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listing {
    Sessions,
    Clients,
    Devices,
}

/// Failure a [`FakeServer`] listing can be told to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Server unreachable
    Transport,
    /// Server answered with a 500
    Server,
    /// Server not linked to a plex.tv account
    NotLinked,
}

impl Failure {
    fn to_error(self, url: &str) -> PlexError {
        match self {
            Failure::Transport => PlexError::Network(format!("{}: connection refused", url)),
            Failure::Server => PlexError::Http {
                status: 500,
                url: url.to_string(),
            },
            Failure::NotLinked => PlexError::NotLinked("no account token".to_string()),
        }
    }
}

#[derive(Default)]
struct FakeState {
    sessions: Vec<Session>,
    clients: Vec<Client>,
    devices: Vec<Device>,
    failures: HashMap<Listing, Failure>,
    /// Device ids whose connect step yields a client
    reachable: HashMap<String, Client>,
    sent: Vec<(String, PlaybackCommand)>,
    connects: Vec<String>,
    polls: HashMap<Listing, usize>,
}

/// Scriptable media server that records every command sent through it
pub struct FakeServer {
    info: ServerInfo,
    state: Mutex<FakeState>,
}

impl FakeServer {
    pub fn new(friendly_name: &str, machine_identifier: &str) -> Self {
        Self {
            info: ServerInfo {
                friendly_name: friendly_name.to_string(),
                machine_identifier: machine_identifier.to_string(),
                version: "1.40.0".to_string(),
            },
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn with_sessions(self, sessions: Vec<Session>) -> Self {
        self.set_sessions(sessions);
        self
    }

    pub fn with_clients(self, clients: Vec<Client>) -> Self {
        self.set_clients(clients);
        self
    }

    pub fn with_devices(self, devices: Vec<Device>) -> Self {
        self.set_devices(devices);
        self
    }

    pub fn set_sessions(&self, sessions: Vec<Session>) {
        self.state.lock().sessions = sessions;
    }

    pub fn set_clients(&self, clients: Vec<Client>) {
        self.state.lock().clients = clients;
    }

    pub fn set_devices(&self, devices: Vec<Device>) {
        self.state.lock().devices = devices;
    }

    pub fn fail(&self, listing: Listing, failure: Failure) {
        self.state.lock().failures.insert(listing, failure);
    }

    pub fn recover(&self) {
        self.state.lock().failures.clear();
    }

    /// Make the connect step for `device_id` succeed with `client`
    pub fn make_reachable(&self, device_id: &str, client: Client) {
        self.state
            .lock()
            .reachable
            .insert(device_id.to_string(), client);
    }

    /// Commands sent so far, keyed by target machine identifier
    pub fn sent(&self) -> Vec<(String, PlaybackCommand)> {
        self.state.lock().sent.clone()
    }

    /// Device ids the connect step was attempted for
    pub fn connects(&self) -> Vec<String> {
        self.state.lock().connects.clone()
    }

    pub fn polls(&self, listing: Listing) -> usize {
        self.state.lock().polls.get(&listing).copied().unwrap_or(0)
    }

    fn listing<T: Clone>(
        &self,
        listing: Listing,
        pick: impl Fn(&FakeState) -> &Vec<T>,
    ) -> Result<Vec<T>> {
        let mut state = self.state.lock();
        *state.polls.entry(listing).or_default() += 1;
        if let Some(failure) = state.failures.get(&listing) {
            return Err(failure.to_error("http://fake"));
        }
        Ok(pick(&*state).clone())
    }
}

impl MediaServer for FakeServer {
    fn info(&self) -> &ServerInfo {
        &self.info
    }

    fn sessions(&self) -> Result<Vec<Session>> {
        self.listing(Listing::Sessions, |s| &s.sessions)
    }

    fn clients(&self) -> Result<Vec<Client>> {
        self.listing(Listing::Clients, |s| &s.clients)
    }

    fn account_devices(&self) -> Result<Vec<Device>> {
        self.listing(Listing::Devices, |s| &s.devices)
    }

    fn connect_device(&self, device: &Device) -> Result<Client> {
        let mut state = self.state.lock();
        state.connects.push(device.client_identifier.clone());
        state
            .reachable
            .get(&device.client_identifier)
            .cloned()
            .ok_or_else(|| PlexError::NotControllable(device.client_identifier.clone()))
    }

    fn send(&self, client: &Client, command: PlaybackCommand) -> Result<()> {
        self.state
            .lock()
            .sent
            .push((client.machine_identifier.clone(), command));
        Ok(())
    }
}

// ============================================================================
// Fixture builders
// ============================================================================

/// A session playing `title` on player `player_id`
pub fn session(player_id: &str, title: &str, kind: MediaKind, state: &str) -> Session {
    Session {
        session_key: format!("{}-session", player_id),
        kind,
        title: title.to_string(),
        player: SessionPlayer {
            machine_identifier: player_id.to_string(),
            title: format!("{} player", player_id),
            state: state.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Attach a user to a session fixture
pub fn with_user(mut session: Session, user: &str) -> Session {
    session.user = Some(SessionUser {
        id: "1".to_string(),
        title: user.to_string(),
    });
    session
}

/// A locally advertised client reachable at a fake address
pub fn client(id: &str, title: &str) -> Client {
    Client::new(id, title, format!("http://10.0.0.9:32500/{}", id))
}

/// An account device resource
pub fn device(id: &str, name: &str, provides: &str) -> Device {
    Device {
        name: name.to_string(),
        client_identifier: id.to_string(),
        provides: provides.to_string(),
        product: Some("Plex for Android (TV)".to_string()),
        ..Default::default()
    }
}
