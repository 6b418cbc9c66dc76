mod types;

use async_trait::async_trait;
use log::{debug, info, warn};
use lookbook_domain::auth::{Credentials, LoginResult, UserRecord};
use lookbook_domain::favorites::FavoriteAction;
use lookbook_domain::{BackendGateway, CalendarFetch, DomainError};
use std::sync::Arc;
use url::Url;

use super::{FetchRequest, ResilientFetchClient};
use crate::config::ClientConfig;
use types::{
    CalendarResponse, FavoriteEntry, FavoriteSyncRequest, FavoriteSyncResponse,
    FavoritesResponse, LoginResponse,
};

const LOGIN_PATH: &str = "login.php";
const CALENDAR_PATH: &str = "fetch_calendar.php";
const FAVORITES_PATH: &str = "favorites.php";

/// `BackendGateway` over the PHP endpoints, routed through the fallback chain
pub struct HttpBackendGateway {
    config: Arc<ClientConfig>,
    client: ResilientFetchClient,
}

impl HttpBackendGateway {
    pub fn new(config: Arc<ClientConfig>, client: ResilientFetchClient) -> Self {
        Self { config, client }
    }

    pub fn from_config(config: Arc<ClientConfig>) -> anyhow::Result<Self> {
        let client = ResilientFetchClient::from_config(&config)?;
        Ok(Self::new(config, client))
    }

    fn endpoint(&self, path: &str) -> Result<Url, DomainError> {
        self.config
            .endpoint(path)
            .map_err(|e| DomainError::Validation(e.to_string()))
    }

    fn login_request(&self, credentials: &Credentials) -> Result<FetchRequest, DomainError> {
        let mut url = self.endpoint(LOGIN_PATH)?;
        url.query_pairs_mut()
            .append_pair("username", credentials.username())
            .append_pair("password", credentials.password());
        Ok(FetchRequest::get(url).sensitive())
    }
}

#[async_trait]
impl BackendGateway for HttpBackendGateway {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResult, DomainError> {
        credentials.validate()?;
        let request = self.login_request(credentials)?;

        if self.client.attempts_for(&request) > 1 {
            warn!("Login may be routed through third-party relays");
        }

        let response: LoginResponse = self.client.fetch(&request).await?;

        if response.success {
            info!("Login accepted");
            Ok(LoginResult::Success {
                user: response.user.map(UserRecord::new),
            })
        } else {
            info!("Login rejected");
            Ok(LoginResult::failure(response.message))
        }
    }

    async fn fetch_calendar(&self) -> Result<CalendarFetch, DomainError> {
        let request = FetchRequest::get(self.endpoint(CALENDAR_PATH)?);
        let response: CalendarResponse = self.client.fetch(&request).await?;

        if !response.success {
            return Ok(CalendarFetch::Rejected {
                message: response.message,
            });
        }

        let (items, dropped) = response.items();
        if dropped > 0 {
            warn!("Dropped {} malformed calendar entries", dropped);
        }
        debug!("Fetched {} calendar entries", items.len());

        Ok(CalendarFetch::Items(items))
    }

    async fn list_favorites(&self) -> Result<Vec<String>, DomainError> {
        let request = FetchRequest::get(self.endpoint(FAVORITES_PATH)?);
        let response: FavoritesResponse = self.client.fetch(&request).await?;

        if !response.success {
            return Err(DomainError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "Could not load favorites.".to_string()),
            ));
        }

        Ok(response
            .favorites
            .into_iter()
            .filter_map(FavoriteEntry::into_url)
            .collect())
    }

    async fn sync_favorite(&self, url: &str, action: FavoriteAction) -> Result<(), DomainError> {
        let body = serde_json::to_value(FavoriteSyncRequest {
            image_url: url,
            action: action.as_str(),
        })
        .map_err(|e| DomainError::Serialization(e.to_string()))?;

        let request = FetchRequest::post_json(self.endpoint(FAVORITES_PATH)?, body);
        let response: FavoriteSyncResponse = self.client.fetch(&request).await?;

        if response.success {
            debug!("Favorite {} synced: {}", action.as_str(), url);
            Ok(())
        } else {
            Err(DomainError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "Could not update favorites.".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportPolicy;

    fn gateway(transport: TransportPolicy) -> HttpBackendGateway {
        let config = Arc::new(ClientConfig {
            transport,
            ..ClientConfig::default()
        });
        HttpBackendGateway::from_config(config).unwrap()
    }

    #[test]
    fn test_login_request_encodes_credentials() {
        let gateway = gateway(TransportPolicy::Direct);
        let request = gateway
            .login_request(&Credentials::new("ann lee", "p&ss=1"))
            .unwrap();

        assert!(request.sensitive);
        assert_eq!(request.url.path(), "/vwobackend/login.php");
        let pairs: Vec<(String, String)> = request.url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("username".to_string(), "ann lee".to_string()),
                ("password".to_string(), "p&ss=1".to_string()),
            ]
        );
        assert!(!request.display_url().contains("ann"));
    }

    #[tokio::test]
    async fn test_login_with_empty_fields_is_rejected_locally() {
        let gateway = gateway(TransportPolicy::Proxied);
        let result = gateway.login(&Credentials::new("", "secret")).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
