use anyhow::{Context, Result};
use log::{debug, info, warn};
use reqwest::{Client, Proxy};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::direct::DirectTransport;
use super::error::FetchError;
use super::relay::RelayTransport;
use super::transport::{FetchRequest, TransportStrategy};
use super::USER_AGENT;
use crate::config::ClientConfig;

/// Ordered fallback over one direct strategy and zero or more relays.
///
/// Each request tries the direct strategy first, then every relay that
/// supports the request, and returns the first payload that is JSON of the
/// expected shape.
pub struct ResilientFetchClient {
    direct: Arc<dyn TransportStrategy>,
    relays: Vec<Arc<dyn TransportStrategy>>,
}

impl ResilientFetchClient {
    pub fn new(direct: Arc<dyn TransportStrategy>, relays: Vec<Arc<dyn TransportStrategy>>) -> Self {
        Self { direct, relays }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let direct_timeout = config.timeouts.direct_request;
        let relay_timeout = config.timeouts.relay_request;
        let proxy = config.outbound_proxy.as_deref();

        let direct = Arc::new(DirectTransport::new(
            build_client(direct_timeout, proxy)?,
            direct_timeout,
        )) as Arc<dyn TransportStrategy>;

        let relays = if config.active_relays().is_empty() {
            Vec::new()
        } else {
            let relay_client = build_client(relay_timeout, proxy)?;
            config
                .active_relays()
                .iter()
                .map(|kind| {
                    let relay = RelayTransport::new(*kind, relay_client.clone(), relay_timeout);
                    let relay = match &config.relay_origin {
                        Some(origin) => relay.with_origin(origin.clone()),
                        None => relay,
                    };
                    Arc::new(relay) as Arc<dyn TransportStrategy>
                })
                .collect()
        };

        info!(
            "Fetch client ready: direct timeout {:?}, {} relay(s)",
            direct_timeout,
            relays.len()
        );

        Ok(Self::new(direct, relays))
    }

    pub fn has_relays(&self) -> bool {
        !self.relays.is_empty()
    }

    /// Number of strategies that would be tried for `request`
    pub fn attempts_for(&self, request: &FetchRequest) -> usize {
        self.strategies(request).count()
    }

    /// Fetch and decode into `T`; a payload of the wrong shape moves on to the next strategy
    pub async fn fetch<T: DeserializeOwned>(&self, request: &FetchRequest) -> Result<T, FetchError> {
        self.run(request, |value| {
            serde_json::from_value::<T>(value).map_err(|e| FetchError::Format(e.to_string()))
        })
        .await
    }

    /// Fetch any JSON value
    pub async fn fetch_json(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        self.run(request, |value| Ok(value)).await
    }

    fn strategies<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> impl Iterator<Item = &'a Arc<dyn TransportStrategy>> + 'a {
        std::iter::once(&self.direct)
            .chain(self.relays.iter())
            .filter(move |strategy| strategy.supports(request))
    }

    async fn run<T, F>(&self, request: &FetchRequest, decode: F) -> Result<T, FetchError>
    where
        F: Fn(Value) -> Result<T, FetchError>,
    {
        let url = request.display_url();
        let mut attempts = 0;
        let mut last = None;

        for strategy in self.strategies(request) {
            attempts += 1;
            debug!("[{}] attempt {} for {}", strategy.name(), attempts, url);

            match strategy.attempt(request).await.and_then(&decode) {
                Ok(payload) => {
                    if attempts > 1 {
                        info!("✅ {} succeeded via {} after {} attempts", url, strategy.name(), attempts);
                    }
                    return Ok(payload);
                }
                Err(e) => {
                    warn!("⚠️  [{}] {} failed: {}", strategy.name(), url, e);
                    last = Some(e);
                }
            }
        }

        // Without relays the single direct failure is reported as-is
        if attempts == 1 && !self.has_relays() {
            if let Some(e) = last {
                return Err(e);
            }
        }

        warn!("❌ {} failed after {} attempts", url, attempts);
        Err(FetchError::Exhausted {
            attempts,
            last: last.map(Box::new),
        })
    }
}

fn build_client(timeout: Duration, proxy: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder().user_agent(USER_AGENT).timeout(timeout);

    builder = match proxy {
        Some(url) => builder.proxy(Proxy::all(url).context("Invalid outbound proxy URL")?),
        None => builder.no_proxy(),
    };

    builder.build().context("Failed to create HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use url::Url;

    /// Strategy returning a queued outcome and counting calls
    struct Scripted {
        name: &'static str,
        get_only: bool,
        outcome: Mutex<Option<Result<Value, FetchError>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(name: &'static str, outcome: Result<Value, FetchError>) -> Arc<Self> {
            Arc::new(Self {
                name,
                get_only: false,
                outcome: Mutex::new(Some(outcome)),
                calls: AtomicUsize::new(0),
            })
        }

        fn relay(name: &'static str, outcome: Result<Value, FetchError>) -> Arc<Self> {
            Arc::new(Self {
                name,
                get_only: true,
                outcome: Mutex::new(Some(outcome)),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TransportStrategy for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn supports(&self, request: &FetchRequest) -> bool {
            !self.get_only || request.method == crate::http::HttpMethod::Get
        }

        async fn attempt(&self, _request: &FetchRequest) -> Result<Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Err(FetchError::Network("exhausted script".into())))
        }
    }

    fn as_dyn(strategy: &Arc<Scripted>) -> Arc<dyn TransportStrategy> {
        strategy.clone()
    }

    #[derive(Debug, Deserialize)]
    struct Envelope {
        success: bool,
    }

    fn request() -> FetchRequest {
        FetchRequest::get(Url::parse("https://backend.example.com/fetch_calendar.php").unwrap())
    }

    #[tokio::test]
    async fn test_direct_success_skips_relays() {
        let direct = Scripted::new("direct", Ok(json!({"success": true})));
        let relay = Scripted::relay("relay", Ok(json!({"success": true})));
        let client = ResilientFetchClient::new(direct.clone(), vec![as_dyn(&relay)]);

        let result: Envelope = client.fetch(&request()).await.unwrap();

        assert!(result.success);
        assert_eq!(direct.calls(), 1);
        assert_eq!(relay.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_through_to_first_working_relay() {
        let direct = Scripted::new("direct", Err(FetchError::Network("blocked".into())));
        let html = Scripted::relay("html", Err(FetchError::Html));
        let good = Scripted::relay("good", Ok(json!({"success": true})));
        let unused = Scripted::relay("unused", Ok(json!({"success": true})));
        let client = ResilientFetchClient::new(
            direct.clone(),
            vec![as_dyn(&html), as_dyn(&good), as_dyn(&unused)],
        );

        let result: Envelope = client.fetch(&request()).await.unwrap();

        assert!(result.success);
        assert_eq!(html.calls(), 1);
        assert_eq!(good.calls(), 1);
        assert_eq!(unused.calls(), 0);
    }

    #[tokio::test]
    async fn test_wrong_shape_continues_chain() {
        let direct = Scripted::new("direct", Ok(json!({"unexpected": 1})));
        let relay = Scripted::relay("relay", Ok(json!({"success": false})));
        let client = ResilientFetchClient::new(direct.clone(), vec![as_dyn(&relay)]);

        let result: Envelope = client.fetch(&request()).await.unwrap();

        assert!(!result.success);
        assert_eq!(relay.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_reports_last_error() {
        let direct = Scripted::new("direct", Err(FetchError::Timeout(Duration::from_secs(10))));
        let relay = Scripted::relay("relay", Err(FetchError::HttpStatus(502)));
        let client = ResilientFetchClient::new(direct, vec![as_dyn(&relay)]);

        let error = client.fetch_json(&request()).await.unwrap_err();

        assert_eq!(
            error,
            FetchError::Exhausted {
                attempts: 2,
                last: Some(Box::new(FetchError::HttpStatus(502))),
            }
        );
    }

    #[tokio::test]
    async fn test_direct_only_returns_error_unwrapped() {
        let direct = Scripted::new("direct", Err(FetchError::HttpStatus(404)));
        let client = ResilientFetchClient::new(direct, Vec::new());

        let error = client.fetch_json(&request()).await.unwrap_err();

        assert_eq!(error, FetchError::HttpStatus(404));
    }

    #[tokio::test]
    async fn test_post_is_never_relayed() {
        let direct = Scripted::new("direct", Err(FetchError::Network("down".into())));
        let relay = Scripted::relay("relay", Ok(json!({"success": true})));
        let client = ResilientFetchClient::new(direct.clone(), vec![as_dyn(&relay)]);
        let post = FetchRequest::post_json(request().url, json!({"action": "add"}));

        assert_eq!(client.attempts_for(&post), 1);
        let error = client.fetch_json(&post).await.unwrap_err();

        assert!(matches!(error, FetchError::Exhausted { attempts: 1, .. }));
        assert_eq!(relay.calls(), 0);
    }

    #[test]
    fn test_from_config_builds_relay_chain() {
        let client = ResilientFetchClient::from_config(&ClientConfig::default()).unwrap();
        assert!(client.has_relays());
        assert_eq!(client.attempts_for(&request()), 5);
    }

    #[test]
    fn test_invalid_proxy_is_rejected() {
        let config = ClientConfig {
            outbound_proxy: Some("not a proxy url".to_string()),
            ..ClientConfig::default()
        };
        assert!(ResilientFetchClient::from_config(&config).is_err());
    }
}
