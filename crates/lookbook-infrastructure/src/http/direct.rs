use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{header, Client};
use serde_json::Value;
use std::time::Duration;

use super::error::FetchError;
use super::transport::{FetchRequest, HttpMethod, TransportStrategy};
use super::snippet;

/// Request against the backend origin itself
pub struct DirectTransport {
    client: Client,
    timeout: Duration,
}

impl DirectTransport {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl TransportStrategy for DirectTransport {
    fn name(&self) -> &str {
        "direct"
    }

    async fn attempt(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        let builder = match request.method {
            HttpMethod::Get => self.client.get(request.url.clone()),
            HttpMethod::Post => self.client.post(request.url.clone()),
        };
        let mut builder = builder
            .timeout(self.timeout)
            .header(header::ACCEPT, "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        debug!("Direct response status: {}", status);

        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        serde_json::from_str(&text).map_err(|e| {
            warn!("Direct response is not JSON: {}", snippet(&text, 200));
            FetchError::Format(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ResilientFetchClient;
    use lookbook_domain::DomainError;
    use std::sync::Arc;
    use url::Url;

    /// A localhost port with nothing listening on it
    async fn closed_port() -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_connection_error_does_not_leak_credentials() {
        let port = closed_port().await;
        let url = Url::parse(&format!(
            "http://127.0.0.1:{port}/api/login.php?username=ann&password=hunter2"
        ))
        .unwrap();
        let timeout = Duration::from_secs(2);
        let direct = DirectTransport::new(Client::builder().no_proxy().build().unwrap(), timeout);
        let client = ResilientFetchClient::new(Arc::new(direct), Vec::new());

        let error = client
            .fetch_json(&FetchRequest::get(url).sensitive())
            .await
            .unwrap_err();

        assert!(matches!(error, FetchError::Network(_)));
        assert!(!error.to_string().contains("hunter2"));
        assert!(!error.to_string().contains("username=ann"));

        let domain = DomainError::from(error);
        assert!(!domain.to_string().contains("hunter2"));
        assert!(!domain.format_with_code().contains("hunter2"));
    }
}
