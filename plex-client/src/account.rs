//! plex.tv account access and PIN linking

use serde::Deserialize;
use tracing::debug;

use crate::error::{PlexError, Result};
use crate::http::{ClientOptions, HttpAgent};
use crate::model::{Device, Pin};

/// Page the user visits to enter a linking PIN
pub const LINK_URL: &str = "https://plex.tv/link";

#[derive(Debug, Deserialize)]
struct UserResponse {
    #[serde(default)]
    username: String,
    #[serde(default)]
    uuid: String,
}

/// The plex.tv account behind a token
#[derive(Debug, Clone)]
pub struct PlexAccount {
    pub username: String,
    pub uuid: String,
    token: String,
    http: HttpAgent,
}

impl PlexAccount {
    pub(crate) fn from_token(http: HttpAgent, token: &str) -> Result<Self> {
        let url = http.plex_tv("/api/v2/user");
        let user: UserResponse = http.get_json(&url, Some(token), &[]).map_err(|e| match e {
            PlexError::Unauthorized => {
                PlexError::NotLinked("token was rejected by plex.tv".to_string())
            }
            other => other,
        })?;

        Ok(Self {
            username: user.username,
            uuid: user.uuid,
            token: token.to_string(),
            http,
        })
    }

    /// Devices registered to this account
    pub fn devices(&self) -> Result<Vec<Device>> {
        let url = self.http.plex_tv("/api/v2/resources");
        let devices: Vec<Device> = self.http.get_json(
            &url,
            Some(&self.token),
            &[
                ("includeHttps", "1".to_string()),
                ("includeRelay", "1".to_string()),
            ],
        )?;
        debug!("Account '{}' has {} devices", self.username, devices.len());
        Ok(devices)
    }
}

/// Unauthenticated plex.tv client used for PIN linking
#[derive(Debug, Clone)]
pub struct PlexTv {
    http: HttpAgent,
}

impl PlexTv {
    pub fn new(options: ClientOptions) -> Self {
        Self {
            http: HttpAgent::new(options),
        }
    }

    /// Product name shown on the linking page
    pub fn product(&self) -> &str {
        &self.http.options().product
    }

    /// Ask plex.tv for a new linking PIN
    pub fn request_pin(&self) -> Result<Pin> {
        let url = self.http.plex_tv("/api/v2/pins");
        let pin: Pin = self.http.post_json(&url, None, &[])?;
        debug!("Requested linking PIN {} (id {})", pin.code, pin.id);
        Ok(pin)
    }

    /// Check whether the user has entered the PIN yet
    ///
    /// Returns the account token once linked.
    pub fn check_pin(&self, pin: &Pin) -> Result<Option<String>> {
        let url = self.http.plex_tv(&format!("/api/v2/pins/{}", pin.id));
        let current: Pin = self.http.get_json(&url, None, &[])?;
        Ok(current.auth_token.filter(|t| !t.is_empty()))
    }
}

impl Default for PlexTv {
    fn default() -> Self {
        Self::new(ClientOptions::default())
    }
}
