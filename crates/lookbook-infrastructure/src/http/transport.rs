use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use super::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A fully-formed request: query parameters already encoded into `url`
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: Url,
    pub method: HttpMethod,
    pub body: Option<Value>,
    /// The URL carries secrets and is only logged redacted
    pub sensitive: bool,
}

impl FetchRequest {
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: HttpMethod::Get,
            body: None,
            sensitive: false,
        }
    }

    pub fn post_json(url: Url, body: Value) -> Self {
        Self {
            url,
            method: HttpMethod::Post,
            body: Some(body),
            sensitive: false,
        }
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// URL safe to write into logs
    pub fn display_url(&self) -> String {
        if self.sensitive {
            redact_query(&self.url)
        } else {
            self.url.to_string()
        }
    }
}

/// One way of obtaining a JSON payload for a request
#[async_trait]
pub trait TransportStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Whether this strategy can carry the request at all
    fn supports(&self, _request: &FetchRequest) -> bool {
        true
    }

    async fn attempt(&self, request: &FetchRequest) -> Result<Value, FetchError>;
}

/// Replace every query value with `***`
pub fn redact_query(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }

    let mut redacted = url.clone();
    let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
    redacted
        .query_pairs_mut()
        .clear()
        .extend_pairs(keys.iter().map(|k| (k.as_str(), "***")));
    redacted.to_string()
}
