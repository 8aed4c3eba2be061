//! Shared HTTP agent
//!
//! Every request carries the Plex client identity headers and asks for JSON.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::{PlexError, Result};

/// Identity and transport settings shared by all requests
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Sent as `X-Plex-Product`; shown to the user on plex.tv when linking
    pub product: String,
    /// Sent as `X-Plex-Version`
    pub version: String,
    /// Sent as `X-Plex-Client-Identifier`
    pub client_identifier: String,
    /// Base URL of plex.tv (overridable for tests)
    pub plex_tv_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            product: "Plex SDK".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            client_identifier: uuid::Uuid::new_v4().to_string(),
            plex_tv_url: crate::PLEX_TV_URL.to_string(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HttpAgent {
    agent: ureq::Agent,
    options: Arc<ClientOptions>,
}

impl HttpAgent {
    pub(crate) fn new(options: ClientOptions) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(options.connect_timeout)
                .timeout_read(options.read_timeout)
                .build(),
            options: Arc::new(options),
        }
    }

    pub(crate) fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub(crate) fn plex_tv(&self, path: &str) -> String {
        format!("{}{}", self.options.plex_tv_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: &str, url: &str, token: Option<&str>) -> ureq::Request {
        let request = self
            .agent
            .request(method, url)
            .set("Accept", "application/json")
            .set("X-Plex-Product", &self.options.product)
            .set("X-Plex-Version", &self.options.version)
            .set("X-Plex-Client-Identifier", &self.options.client_identifier);

        match token {
            Some(token) => request.set("X-Plex-Token", token),
            None => request,
        }
    }

    /// GET a JSON document
    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: Option<&str>,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut request = self.request("GET", url, token);
        for (name, value) in query {
            request = request.query(name, value);
        }
        decode(url, request.call()?)
    }

    /// POST with an empty body and decode the JSON answer
    pub(crate) fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: Option<&str>,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut request = self.request("POST", url, token);
        for (name, value) in query {
            request = request.query(name, value);
        }
        decode(url, request.send_string("")?)
    }

    /// GET and only care about the status
    pub(crate) fn get_ok(
        &self,
        url: &str,
        token: Option<&str>,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<()> {
        let mut request = self.request("GET", url, token);
        for (name, value) in headers {
            request = request.set(name, value);
        }
        for (name, value) in query {
            request = request.query(name, value);
        }
        request.call()?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(url: &str, response: ureq::Response) -> Result<T> {
    let body = response
        .into_string()
        .map_err(|e| PlexError::Network(e.to_string()))?;

    serde_json::from_str(&body).map_err(|e| PlexError::Parse(format!("{}: {}", url, e)))
}
