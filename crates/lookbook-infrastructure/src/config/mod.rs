//! Client configuration, resolved once at startup and immutable afterwards.
//!
//! # Environment Variables
//!
//! All optional:
//! - `LOOKBOOK_API_URL` - Backend base URL (default: https://alumnibackend.42web.io/vwobackend)
//! - `LOOKBOOK_ASSET_URL` - Base URL joined with relative image paths
//! - `LOOKBOOK_TRANSPORT` - `direct` or `proxied` (default: proxied)
//! - `LOOKBOOK_RELAYS` - Comma-separated relay names, tried in order
//! - `LOOKBOOK_RELAY_ORIGIN` - Serve every relay from this origin instead of its public host
//! - `LOOKBOOK_OUTBOUND_PROXY` - HTTP or SOCKS5 proxy for all outgoing requests
//! - `LOOKBOOK_DIRECT_TIMEOUT_SECS` - Direct attempt timeout
//! - `LOOKBOOK_RELAY_TIMEOUT_SECS` - Relay attempt timeout

mod timeouts;

pub use timeouts::TimeoutConfig;

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::http::RelayKind;

pub const DEFAULT_API_URL: &str = "https://alumnibackend.42web.io/vwobackend";
pub const DEFAULT_ASSET_URL: &str = "https://alumnibackend.42web.io/uploads";

/// Configuration errors that can occur during loading
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How requests reach the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportPolicy {
    /// Only the backend origin is contacted
    Direct,
    /// Backend origin first, then the relay chain
    #[default]
    Proxied,
}

impl FromStr for TransportPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(TransportPolicy::Direct),
            "proxied" | "proxy" => Ok(TransportPolicy::Proxied),
            other => Err(ConfigError::InvalidEnvVar(
                "LOOKBOOK_TRANSPORT".to_string(),
                format!("{other}. Must be 'direct' or 'proxied'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: Url,
    pub asset_base_url: Url,
    pub transport: TransportPolicy,
    /// Relays in the order they are tried
    pub relays: Vec<RelayKind>,
    /// Self-hosted relay mirror replacing the public relay hosts
    pub relay_origin: Option<Url>,
    pub outbound_proxy: Option<String>,
    pub timeouts: TimeoutConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: parse_default(DEFAULT_API_URL),
            asset_base_url: parse_default(DEFAULT_ASSET_URL),
            transport: TransportPolicy::default(),
            relays: RelayKind::default_chain(),
            relay_origin: None,
            outbound_proxy: None,
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = var("LOOKBOOK_API_URL") {
            config.api_base_url = parse_url("LOOKBOOK_API_URL", &raw)?;
        }
        if let Some(raw) = var("LOOKBOOK_ASSET_URL") {
            config.asset_base_url = parse_url("LOOKBOOK_ASSET_URL", &raw)?;
        }
        if let Some(raw) = var("LOOKBOOK_TRANSPORT") {
            config.transport = raw.parse()?;
        }
        if let Some(raw) = var("LOOKBOOK_RELAYS") {
            config.relays = raw
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| {
                    name.parse::<RelayKind>().map_err(|e| {
                        ConfigError::InvalidEnvVar("LOOKBOOK_RELAYS".to_string(), e.to_string())
                    })
                })
                .collect::<Result<_, _>>()?;
        }
        if let Some(raw) = var("LOOKBOOK_RELAY_ORIGIN") {
            config.relay_origin = Some(parse_url("LOOKBOOK_RELAY_ORIGIN", &raw)?);
        }
        if let Some(raw) = var("LOOKBOOK_OUTBOUND_PROXY") {
            parse_url("LOOKBOOK_OUTBOUND_PROXY", &raw)?;
            config.outbound_proxy = Some(raw.trim().to_string());
        }
        if let Some(raw) = var("LOOKBOOK_DIRECT_TIMEOUT_SECS") {
            config.timeouts.direct_request = parse_secs("LOOKBOOK_DIRECT_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = var("LOOKBOOK_RELAY_TIMEOUT_SECS") {
            config.timeouts.relay_request = parse_secs("LOOKBOOK_RELAY_TIMEOUT_SECS", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeouts.direct_request.is_zero() {
            return Err(ConfigError::Invalid(
                "Direct request timeout must be greater than 0".to_string(),
            ));
        }
        if self.transport == TransportPolicy::Proxied
            && self.timeouts.relay_request <= self.timeouts.direct_request
        {
            return Err(ConfigError::Invalid(
                "Relay timeout must be longer than the direct timeout".to_string(),
            ));
        }
        Ok(())
    }

    /// Relays actually used under the configured policy
    pub fn active_relays(&self) -> &[RelayKind] {
        match self.transport {
            TransportPolicy::Direct => &[],
            TransportPolicy::Proxied => &self.relays,
        }
    }

    /// `api_base_url` with `path` appended as a final segment
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        let raw = format!(
            "{}/{}",
            self.api_base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| ConfigError::Invalid(format!("{raw}: {e}")))
    }
}

fn parse_default(raw: &'static str) -> Url {
    Url::parse(raw).expect("built-in default URL is valid")
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.api_base_url.as_str(), DEFAULT_API_URL);
        assert_eq!(config.transport, TransportPolicy::Proxied);
        assert_eq!(config.relays, RelayKind::default_chain());
        assert!(config.outbound_proxy.is_none());
        assert!(config.relay_origin.is_none());
    }

    #[test]
    fn test_relay_origin_override() {
        let config = ClientConfig::from_lookup(lookup(&[(
            "LOOKBOOK_RELAY_ORIGIN",
            "http://127.0.0.1:9000",
        )]))
        .unwrap();

        assert_eq!(
            config.relay_origin.map(|u| u.to_string()),
            Some("http://127.0.0.1:9000/".to_string())
        );
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("LOOKBOOK_RELAY_ORIGIN", "not a url")])),
            Err(ConfigError::InvalidEnvVar(..))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("LOOKBOOK_API_URL", "http://127.0.0.1:8080/api"),
            ("LOOKBOOK_TRANSPORT", "direct"),
            ("LOOKBOOK_RELAYS", "corsproxy, allorigins-raw"),
            ("LOOKBOOK_OUTBOUND_PROXY", "socks5://127.0.0.1:1080"),
            ("LOOKBOOK_DIRECT_TIMEOUT_SECS", "4"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:8080/api");
        assert_eq!(config.transport, TransportPolicy::Direct);
        assert_eq!(
            config.relays,
            vec![RelayKind::CorsProxyIo, RelayKind::AllOriginsRaw]
        );
        assert!(config.active_relays().is_empty());
        assert_eq!(
            config.outbound_proxy.as_deref(),
            Some("socks5://127.0.0.1:1080")
        );
        assert_eq!(config.timeouts.direct_request, Duration::from_secs(4));
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("LOOKBOOK_TRANSPORT", "carrier-pigeon")])),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("LOOKBOOK_RELAYS", "nope")])),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("LOOKBOOK_DIRECT_TIMEOUT_SECS", "soon")])),
            Err(ConfigError::InvalidEnvVar(..))
        ));
    }

    #[test]
    fn test_relay_timeout_must_exceed_direct() {
        let result = ClientConfig::from_lookup(lookup(&[
            ("LOOKBOOK_DIRECT_TIMEOUT_SECS", "30"),
            ("LOOKBOOK_RELAY_TIMEOUT_SECS", "30"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_endpoint_appends_segment() {
        let config = ClientConfig::default();
        assert_eq!(
            config.endpoint("login.php").unwrap().as_str(),
            "https://alumnibackend.42web.io/vwobackend/login.php"
        );
    }
}
