use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use lookbook_domain::auth::{UserRecord, UserStore};
use lookbook_domain::{BackendGateway, DomainError};
use lookbook_infrastructure::config::{ClientConfig, TransportPolicy};
use lookbook_infrastructure::http::HttpBackendGateway;
use lookbook_infrastructure::logging;
use lookbook_infrastructure::persistence::{self, FileUserStore, JsonFileStore};

use super::services::{CalendarController, LoginForm};

/// Everything the UI shell needs, wired once at startup
pub struct AppContext {
    config: Arc<ClientConfig>,
    gateway: Arc<dyn BackendGateway>,
    user_store: Arc<dyn UserStore>,
}

impl AppContext {
    /// Logging, configuration from the environment, storage in the user data directory
    pub fn bootstrap() -> Result<Self> {
        logging::init_logger(persistence::default_log_dir()).context("Failed to initialize logger")?;

        let config = ClientConfig::from_env().context("Invalid configuration")?;
        Self::with_config(config, persistence::default_storage_path())
    }

    pub fn with_config(config: ClientConfig, storage_path: PathBuf) -> Result<Self> {
        let config = Arc::new(config);
        let gateway = HttpBackendGateway::from_config(config.clone())
            .context("Failed to create backend gateway")?;
        let store = Arc::new(JsonFileStore::new(storage_path));

        info!(
            api = %config.api_base_url,
            transport = ?config.transport,
            relays = config.active_relays().len(),
            storage = %store.path().display(),
            "Application context ready"
        );

        Ok(Self {
            config,
            gateway: Arc::new(gateway),
            user_store: Arc::new(FileUserStore::new(store)),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Login form on the configured transport
    pub fn login_form(&self) -> LoginForm {
        LoginForm::new(self.gateway.clone(), self.user_store.clone())
    }

    /// Login form on an explicit transport, e.g. `Direct` to keep credentials off relays
    pub fn login_form_with(&self, transport: TransportPolicy) -> Result<LoginForm> {
        if transport == self.config.transport {
            return Ok(self.login_form());
        }

        let config = Arc::new(ClientConfig {
            transport,
            ..(*self.config).clone()
        });
        let gateway = HttpBackendGateway::from_config(config)
            .context("Failed to create backend gateway")?;
        Ok(LoginForm::new(Arc::new(gateway), self.user_store.clone()))
    }

    /// Calendar screen opening on the current month
    pub fn calendar_controller(&self) -> CalendarController {
        CalendarController::for_today(self.gateway.clone(), self.config.asset_base_url.as_str())
    }

    /// The user stored by the last successful login
    pub async fn current_user(&self) -> Result<Option<UserRecord>, DomainError> {
        self.user_store.load().await
    }

    pub async fn logout(&self) -> Result<(), DomainError> {
        self.user_store.clear().await
    }
}
