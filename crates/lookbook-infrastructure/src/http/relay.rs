use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{header, Client};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use super::error::FetchError;
use super::snippet;
use super::transport::{FetchRequest, HttpMethod, TransportStrategy};

const HTML_MARKERS: [&str; 3] = ["<html", "<script", "<!doctype"];

/// Public CORS relay services, each with its own URL scheme and envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayKind {
    /// `api.allorigins.win/get`: JSON envelope with the body under `contents`
    AllOriginsGet,
    /// `corsproxy.io`: raw passthrough
    CorsProxyIo,
    /// `cors-anywhere.herokuapp.com`: raw passthrough, target appended unencoded
    CorsAnywhere,
    /// `api.allorigins.win/raw`: raw passthrough
    AllOriginsRaw,
}

impl RelayKind {
    pub fn default_chain() -> Vec<RelayKind> {
        vec![
            RelayKind::AllOriginsGet,
            RelayKind::CorsProxyIo,
            RelayKind::CorsAnywhere,
            RelayKind::AllOriginsRaw,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelayKind::AllOriginsGet => "allorigins-get",
            RelayKind::CorsProxyIo => "corsproxy",
            RelayKind::CorsAnywhere => "cors-anywhere",
            RelayKind::AllOriginsRaw => "allorigins-raw",
        }
    }

    /// Public host of the relay service
    pub fn default_origin(&self) -> &'static str {
        match self {
            RelayKind::AllOriginsGet | RelayKind::AllOriginsRaw => "https://api.allorigins.win",
            RelayKind::CorsProxyIo => "https://corsproxy.io",
            RelayKind::CorsAnywhere => "https://cors-anywhere.herokuapp.com",
        }
    }

    /// Relay URL that fetches `target` on our behalf
    pub fn wrap(&self, target: &Url) -> Result<Url, FetchError> {
        self.wrap_at(self.default_origin(), target)
    }

    /// Like `wrap`, with the relay served from `origin`
    pub fn wrap_at(&self, origin: &str, target: &Url) -> Result<Url, FetchError> {
        let origin = origin.trim_end_matches('/');
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_str().as_bytes()).collect();
        let raw = match self {
            RelayKind::AllOriginsGet => format!("{origin}/get?url={encoded}"),
            RelayKind::CorsProxyIo => format!("{origin}/?{encoded}"),
            RelayKind::CorsAnywhere => format!("{origin}/{target}"),
            RelayKind::AllOriginsRaw => format!("{origin}/raw?url={encoded}"),
        };
        Url::parse(&raw).map_err(|e| FetchError::InvalidRequest(e.to_string()))
    }

    /// Field of a JSON envelope holding the relayed body
    pub fn envelope_field(&self) -> Option<&'static str> {
        match self {
            RelayKind::AllOriginsGet => Some("contents"),
            _ => None,
        }
    }
}

impl fmt::Display for RelayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelayKind {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allorigins-get" | "allorigins" => Ok(RelayKind::AllOriginsGet),
            "corsproxy" | "corsproxy.io" => Ok(RelayKind::CorsProxyIo),
            "cors-anywhere" => Ok(RelayKind::CorsAnywhere),
            "allorigins-raw" => Ok(RelayKind::AllOriginsRaw),
            other => Err(FetchError::InvalidRequest(format!("Unknown relay: {other}"))),
        }
    }
}

/// Fetch through one relay service
pub struct RelayTransport {
    kind: RelayKind,
    client: Client,
    timeout: Duration,
    /// Replaces the relay's public host, e.g. a self-hosted mirror
    origin: Option<Url>,
}

impl RelayTransport {
    pub fn new(kind: RelayKind, client: Client, timeout: Duration) -> Self {
        Self {
            kind,
            client,
            timeout,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    fn relay_url(&self, target: &Url) -> Result<Url, FetchError> {
        match &self.origin {
            Some(origin) => self.kind.wrap_at(origin.as_str(), target),
            None => self.kind.wrap(target),
        }
    }
}

#[async_trait]
impl TransportStrategy for RelayTransport {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    /// Relays only forward GET requests
    fn supports(&self, request: &FetchRequest) -> bool {
        request.method == HttpMethod::Get
    }

    async fn attempt(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        let relay_url = self.relay_url(&request.url)?;

        let response = self
            .client
            .get(relay_url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        debug!("[{}] relay raw response: {}", self.kind, snippet(&body, 200));

        unwrap_relay_body(self.kind.envelope_field(), &content_type, &body).inspect_err(|e| {
            warn!("[{}] relay response rejected: {}", self.kind, e);
        })
    }
}

/// Recover the original JSON payload from a relay response body.
///
/// JSON responses are parsed and, when the relay uses an envelope, the
/// envelope field replaces the body. Text payloads containing HTML markers
/// are rejected; anything else must parse as JSON.
pub fn unwrap_relay_body(
    envelope_field: Option<&str>,
    content_type: &str,
    body: &str,
) -> Result<Value, FetchError> {
    let text = if content_type.to_lowercase().contains("application/json") {
        let parsed: Value =
            serde_json::from_str(body).map_err(|e| FetchError::Format(e.to_string()))?;

        match envelope_field.and_then(|field| parsed.get(field)) {
            Some(Value::String(contents)) if !contents.is_empty() => contents.clone(),
            Some(value) if is_present(value) => return Ok(value.clone()),
            _ => return Ok(parsed),
        }
    } else {
        body.to_string()
    };

    if looks_like_html(&text) {
        return Err(FetchError::Html);
    }

    serde_json::from_str(&text).map_err(|e| FetchError::Format(e.to_string()))
}

/// Whether a text body is an HTML document rather than relayed content
pub fn looks_like_html(text: &str) -> bool {
    let lower = text.to_lowercase();
    HTML_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
