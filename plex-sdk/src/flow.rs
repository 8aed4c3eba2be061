//! Interactive setup wizard
//!
//! The wizard walks `user → auth_type → (manual | pin) → server` and ends in
//! an [`EntryConfig`]. It keeps only the PIN and token between steps; a
//! failed validation re-shows the server step as often as needed.

use crate::config::EntryConfig;
use plex_client::{
    normalize_url, ClientOptions, Pin, PlexError, PlexServer, PlexTv, ServerInfo, LINK_URL,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Blocking calls the wizard needs; run on the blocking pool
pub trait FlowBackend: Send + Sync + 'static {
    fn request_pin(&self) -> Result<Pin, PlexError>;

    /// `Ok(Some(token))` once the user linked the PIN
    fn check_pin(&self, pin: &Pin) -> Result<Option<String>, PlexError>;

    /// Connect to the server to prove the URL and token work
    fn validate(&self, server_url: &str, token: &str) -> Result<ServerInfo, PlexError>;
}

/// Backend talking to plex.tv and the real server
#[derive(Debug)]
pub struct PlexTvBackend {
    plex_tv: PlexTv,
    options: ClientOptions,
}

impl PlexTvBackend {
    pub fn new(options: ClientOptions) -> Self {
        Self {
            plex_tv: PlexTv::new(options.clone()),
            options,
        }
    }
}

impl Default for PlexTvBackend {
    fn default() -> Self {
        Self::new(ClientOptions::default())
    }
}

impl FlowBackend for PlexTvBackend {
    fn request_pin(&self) -> Result<Pin, PlexError> {
        self.plex_tv.request_pin()
    }

    fn check_pin(&self, pin: &Pin) -> Result<Option<String>, PlexError> {
        self.plex_tv.check_pin(pin)
    }

    fn validate(&self, server_url: &str, token: &str) -> Result<ServerInfo, PlexError> {
        PlexServer::connect_with(server_url, token, self.options.clone()).map(|s| s.info().clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    User,
    AuthType,
    Manual,
    Pin,
    Server,
}

impl FlowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStep::User => "user",
            FlowStep::AuthType => "auth_type",
            FlowStep::Manual => "manual",
            FlowStep::Pin => "pin",
            FlowStep::Server => "server",
        }
    }
}

/// How the user wants to obtain a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthType {
    /// Link through plex.tv with a PIN
    #[default]
    Pin,
    /// Paste a token
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowError {
    /// The PIN has not been linked yet
    NotAuthenticated,
    /// The server URL and token did not work
    CannotConnect,
}

impl FlowError {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowError::NotAuthenticated => "not_authenticated",
            FlowError::CannotConnect => "cannot_connect",
        }
    }
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the wizard wants shown next
#[derive(Debug, Clone, PartialEq)]
pub enum FlowResult {
    ShowForm {
        step: FlowStep,
        errors: Vec<FlowError>,
        placeholders: BTreeMap<String, String>,
    },
    CreateEntry {
        title: String,
        data: EntryConfig,
    },
    Abort {
        reason: String,
    },
}

impl FlowResult {
    fn form(step: FlowStep) -> Self {
        FlowResult::ShowForm {
            step,
            errors: Vec::new(),
            placeholders: BTreeMap::new(),
        }
    }

    fn form_with_error(step: FlowStep, error: FlowError) -> Self {
        FlowResult::ShowForm {
            step,
            errors: vec![error],
            placeholders: BTreeMap::new(),
        }
    }
}

pub const ABORT_PIN_REQUEST_FAILED: &str = "pin_request_failed";

const DEFAULT_TITLE: &str = "Plex Server";

/// One run of the setup wizard
pub struct ConfigFlow<B: FlowBackend> {
    backend: Arc<B>,
    pin: Option<Pin>,
    token: Option<String>,
}

impl<B: FlowBackend> ConfigFlow<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            pin: None,
            token: None,
        }
    }

    /// Entry point; goes straight to the auth type choice
    pub async fn step_user(&mut self) -> FlowResult {
        self.step_auth_type(None).await
    }

    pub async fn step_auth_type(&mut self, choice: Option<AuthType>) -> FlowResult {
        match choice {
            None => FlowResult::form(FlowStep::AuthType),
            Some(AuthType::Pin) => self.step_pin(false).await,
            Some(AuthType::Manual) => self.step_manual(None).await,
        }
    }

    pub async fn step_manual(&mut self, token: Option<String>) -> FlowResult {
        match token {
            Some(token) => {
                self.token = Some(token.trim().to_string());
                self.step_server(None).await
            }
            None => FlowResult::form(FlowStep::Manual),
        }
    }

    /// Show the PIN, or check it once the user says they linked it
    pub async fn step_pin(&mut self, linked: bool) -> FlowResult {
        let pin = match &self.pin {
            Some(pin) => pin.clone(),
            None => {
                let backend = Arc::clone(&self.backend);
                match offload(move || backend.request_pin()).await {
                    Ok(pin) => {
                        debug!("Requested plex.tv PIN {}", pin.id);
                        self.pin = Some(pin.clone());
                        pin
                    }
                    Err(e) => {
                        warn!("Could not request a plex.tv PIN: {}", e);
                        return FlowResult::Abort {
                            reason: ABORT_PIN_REQUEST_FAILED.to_string(),
                        };
                    }
                }
            }
        };

        let mut errors = Vec::new();
        if linked {
            let backend = Arc::clone(&self.backend);
            let checked = pin.clone();
            match offload(move || backend.check_pin(&checked)).await {
                Ok(Some(token)) => {
                    self.token = Some(token);
                    return self.step_server(None).await;
                }
                Ok(None) => errors.push(FlowError::NotAuthenticated),
                Err(e) => {
                    warn!("Could not check plex.tv PIN: {}", e);
                    errors.push(FlowError::NotAuthenticated);
                }
            }
        }

        FlowResult::ShowForm {
            step: FlowStep::Pin,
            errors,
            placeholders: BTreeMap::from([
                ("code".to_string(), pin.code.clone()),
                ("url".to_string(), LINK_URL.to_string()),
            ]),
        }
    }

    /// Ask for the server URL, or validate the one entered
    pub async fn step_server(&mut self, server_url: Option<String>) -> FlowResult {
        let Some(server_url) = server_url else {
            return FlowResult::form(FlowStep::Server);
        };
        let token = self.token.clone().unwrap_or_default();
        let url = normalize_url(&server_url);

        let backend = Arc::clone(&self.backend);
        let (check_url, check_token) = (url.clone(), token.clone());
        match offload(move || backend.validate(&check_url, &check_token)).await {
            Ok(info) => {
                let title = if info.friendly_name.is_empty() {
                    DEFAULT_TITLE.to_string()
                } else {
                    info.friendly_name
                };
                FlowResult::CreateEntry {
                    title,
                    data: EntryConfig::new(&url, &token),
                }
            }
            Err(e) => {
                warn!("Cannot connect to {}: {}", url, e);
                FlowResult::form_with_error(FlowStep::Server, FlowError::CannotConnect)
            }
        }
    }

    /// The token collected so far
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Run a blocking backend call; a panicking call counts as a network failure
async fn offload<T, F>(call: F) -> Result<T, PlexError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PlexError> + Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| PlexError::Network(e.to_string()))?
}
