//! Plex Media Server connection

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::account::PlexAccount;
use crate::error::{PlexError, Result};
use crate::http::{ClientOptions, HttpAgent};
use crate::model::{
    Client, ClientsContainer, Device, Envelope, PlaybackCommand, ServerInfo, Session,
    SessionsContainer,
};
use crate::{normalize_url, MediaServer};

/// A verified connection to one Plex Media Server
///
/// Construction performs a round trip to the server root, so holding a
/// `PlexServer` means the URL and token were valid at that moment. All calls
/// are blocking.
///
/// # Example
///
/// ```rust,no_run
/// use plex_client::PlexServer;
///
/// let server = PlexServer::connect("http://192.168.1.10:32400", "token")?;
/// for session in server.sessions()? {
///     println!("{} on {}", session.title, session.player.title);
/// }
/// # Ok::<(), plex_client::PlexError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PlexServer {
    base_url: String,
    token: String,
    http: HttpAgent,
    info: ServerInfo,
    command_id: Arc<AtomicU64>,
}

impl PlexServer {
    /// Connect with default client options
    pub fn connect(url: &str, token: &str) -> Result<Self> {
        Self::connect_with(url, token, ClientOptions::default())
    }

    /// Connect with explicit client options
    pub fn connect_with(url: &str, token: &str, options: ClientOptions) -> Result<Self> {
        let base_url = normalize_url(url);
        let http = HttpAgent::new(options);

        let root: Envelope<ServerInfo> =
            http.get_json(&format!("{}/", base_url), Some(token), &[])?;
        let info = root.media_container;

        info!(
            "Connected to Plex server '{}' ({}) at {}",
            info.friendly_name, info.machine_identifier, base_url
        );

        Ok(Self {
            base_url,
            token: token.to_string(),
            http,
            info,
            command_id: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Normalised base URL of the server
    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Active playback sessions
    pub fn sessions(&self) -> Result<Vec<Session>> {
        let url = format!("{}/status/sessions", self.base_url);
        let envelope: Envelope<SessionsContainer> =
            self.http.get_json(&url, Some(&self.token), &[])?;

        Ok(envelope
            .media_container
            .metadata
            .into_iter()
            .map(|raw| raw.into_session(&self.base_url, &self.token))
            .collect())
    }

    /// Players currently advertising themselves to the server
    pub fn clients(&self) -> Result<Vec<Client>> {
        let url = format!("{}/clients", self.base_url);
        let envelope: Envelope<ClientsContainer> =
            self.http.get_json(&url, Some(&self.token), &[])?;
        Ok(envelope.media_container.server)
    }

    /// The plex.tv account the server token belongs to
    pub fn account(&self) -> Result<PlexAccount> {
        PlexAccount::from_token(self.http.clone(), &self.token)
    }

    /// Reach an account device directly and turn it into a controllable client
    ///
    /// Connections are tried local first, relayed last; the first one whose
    /// `/resources` endpoint answers wins.
    pub fn connect_device(&self, device: &Device) -> Result<Client> {
        if !device.has_capability("client") {
            return Err(PlexError::NotControllable(format!(
                "device '{}' does not provide 'client'",
                device.name
            )));
        }

        let token = device.access_token.as_deref().unwrap_or(&self.token);
        let mut last_error = None;

        for connection in device.ordered_connections() {
            let uri = connection.uri.trim_end_matches('/');
            match self
                .http
                .get_ok(&format!("{}/resources", uri), Some(token), &[], &[])
            {
                Ok(()) => {
                    debug!("Connected to device '{}' via {}", device.name, uri);
                    return Ok(Client {
                        machine_identifier: device.client_identifier.clone(),
                        title: device.name.clone(),
                        product: device.product.clone(),
                        platform: device.platform.clone(),
                        direct_url: Some(uri.to_string()),
                        access_token: device.access_token.clone(),
                        ..Default::default()
                    });
                }
                Err(e) => {
                    debug!("Connection {} for '{}' failed: {}", uri, device.name, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            PlexError::NotControllable(format!("device '{}' has no connections", device.name))
        }))
    }

    /// Send a playback command to a client
    pub fn send(&self, client: &Client, command: PlaybackCommand) -> Result<()> {
        if let PlaybackCommand::SetVolume(volume) = command {
            if volume > 100 {
                return Err(PlexError::InvalidParameter(format!(
                    "volume {} is out of range [0, 100]",
                    volume
                )));
            }
        }

        let base_url = client.base_url().ok_or_else(|| {
            PlexError::NotControllable(format!(
                "client '{}' has no address",
                client.machine_identifier
            ))
        })?;

        let url = format!("{}/player/{}", base_url, command.path());
        let command_id = self.command_id.fetch_add(1, Ordering::Relaxed) + 1;
        let mut query = command.query();
        query.push(("commandID", command_id.to_string()));

        let token = client.access_token.as_deref().unwrap_or(&self.token);
        debug!("Sending {:?} to '{}'", command, client.title);

        self.http.get_ok(
            &url,
            Some(token),
            &query,
            &[("X-Plex-Target-Client-Identifier", &client.machine_identifier)],
        )
    }
}

impl MediaServer for PlexServer {
    fn info(&self) -> &ServerInfo {
        PlexServer::info(self)
    }

    fn sessions(&self) -> Result<Vec<Session>> {
        PlexServer::sessions(self)
    }

    fn clients(&self) -> Result<Vec<Client>> {
        PlexServer::clients(self)
    }

    fn account_devices(&self) -> Result<Vec<Device>> {
        self.account()?.devices()
    }

    fn connect_device(&self, device: &Device) -> Result<Client> {
        PlexServer::connect_device(self, device)
    }

    fn send(&self, client: &Client, command: PlaybackCommand) -> Result<()> {
        PlexServer::send(self, client, command)
    }
}
