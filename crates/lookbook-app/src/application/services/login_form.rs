use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use lookbook_domain::auth::{Credentials, LoginPhase, LoginResult, LoginState, UserRecord, UserStore};
use lookbook_domain::{BackendGateway, DomainError};

pub type LoginSuccessHandler = Arc<dyn Fn(Option<&UserRecord>) + Send + Sync>;
pub type LoginFailureHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// The login form: validation, one submission at a time, persistence of the
/// returned user record and the success/failure hooks.
///
/// The transport is decided by the gateway it is built with.
pub struct LoginForm {
    gateway: Arc<dyn BackendGateway>,
    user_store: Arc<dyn UserStore>,
    state: Mutex<LoginState>,
    on_success: Option<LoginSuccessHandler>,
    on_failure: Option<LoginFailureHandler>,
}

impl LoginForm {
    pub fn new(gateway: Arc<dyn BackendGateway>, user_store: Arc<dyn UserStore>) -> Self {
        Self {
            gateway,
            user_store,
            state: Mutex::new(LoginState::new()),
            on_success: None,
            on_failure: None,
        }
    }

    /// Called after the user record has been stored
    pub fn on_success<F>(mut self, handler: F) -> Self
    where
        F: Fn(Option<&UserRecord>) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(handler));
        self
    }

    /// Called with the message shown to the user
    pub fn on_failure<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(handler));
        self
    }

    pub async fn state(&self) -> LoginState {
        self.state.lock().await.clone()
    }

    /// Submit the form.
    ///
    /// Every failure ends up as a message in the returned phase. Only a second
    /// submit while one is in flight is an `Err`.
    #[instrument(skip(self, credentials))]
    pub async fn submit(&self, credentials: Credentials) -> Result<LoginPhase, DomainError> {
        {
            let mut state = self.state.lock().await;
            if state.is_loading() {
                return Err(DomainError::InvalidState(
                    "A login attempt is already in progress".to_string(),
                ));
            }
            if let Err(e) = credentials.validate() {
                let message = e.user_message();
                state.reject(message.clone());
                drop(state);
                self.notify_failure(&message);
                return Ok(LoginPhase::Failed(message));
            }
            state.begin_submit()?;
        }

        let outcome = match self.gateway.login(&credentials).await {
            Ok(LoginResult::Success { user }) => self.persist(user).await,
            Ok(LoginResult::Failure { message }) => {
                info!("Backend rejected login");
                Err(message)
            }
            Err(e) => {
                warn!(code = e.code().code(), "Login request failed: {}", e);
                Err(e.user_message())
            }
        };

        let mut state = self.state.lock().await;
        match outcome {
            Ok(user) => {
                state.succeed()?;
                let phase = state.phase().clone();
                drop(state);
                info!("Login succeeded");
                if let Some(handler) = &self.on_success {
                    handler(user.as_ref());
                }
                Ok(phase)
            }
            Err(message) => {
                state.fail(message.clone())?;
                let phase = state.phase().clone();
                drop(state);
                self.notify_failure(&message);
                Ok(phase)
            }
        }
    }

    async fn persist(&self, user: Option<UserRecord>) -> Result<Option<UserRecord>, String> {
        let Some(user) = user else {
            warn!("Login succeeded without a user record; nothing stored");
            return Ok(None);
        };

        match self.user_store.save(&user).await {
            Ok(()) => Ok(Some(user)),
            Err(e) => {
                warn!("Failed to store user record: {}", e);
                Err(e.user_message())
            }
        }
    }

    fn notify_failure(&self, message: &str) {
        if let Some(handler) = &self.on_failure {
            handler(message);
        }
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::{MockGateway, MockStore};
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    fn form(gateway: MockGateway, store: MockStore) -> LoginForm {
        LoginForm::new(Arc::new(gateway), Arc::new(store))
    }

    #[tokio::test]
    async fn test_empty_fields_never_reach_the_network() {
        let mut gateway = MockGateway::new();
        gateway.expect_login().never();
        let mut store = MockStore::new();
        store.expect_save().never();

        let form = form(gateway, store);

        for (user, pass) in [("", "b"), ("a", ""), ("", "")] {
            let phase = form.submit(Credentials::new(user, pass)).await.unwrap();
            assert_eq!(
                phase,
                LoginPhase::Failed("Please fill in both fields.".to_string())
            );
        }
    }

    #[tokio::test]
    async fn test_rejected_login_shows_message_and_stores_nothing() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_login()
            .withf(|c: &Credentials| c.username() == "a" && c.password() == "b")
            .times(1)
            .returning(|_| {
                Ok(LoginResult::Failure {
                    message: "Invalid username or password.".to_string(),
                })
            });
        let mut store = MockStore::new();
        store.expect_save().never();

        let failures = Arc::new(StdMutex::new(Vec::new()));
        let seen = failures.clone();
        let form = form(gateway, store).on_failure(move |m| seen.lock().unwrap().push(m.to_string()));

        let phase = form.submit(Credentials::new("a", "b")).await.unwrap();

        assert_eq!(
            phase,
            LoginPhase::Failed("Invalid username or password.".to_string())
        );
        assert_eq!(
            form.state().await.error(),
            Some("Invalid username or password.")
        );
        assert_eq!(*failures.lock().unwrap(), vec!["Invalid username or password."]);
    }

    /// Formatted trace output shared with the test subscriber
    #[derive(Clone, Default)]
    struct Captured(Arc<StdMutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_submit_traces_no_credentials() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut gateway = MockGateway::new();
        gateway.expect_login().returning(|_| {
            Ok(LoginResult::Failure {
                message: "Invalid username or password.".to_string(),
            })
        });
        let form = form(gateway, MockStore::new());

        form.submit(Credentials::new("ann.lee", "hunter2")).await.unwrap();

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Backend rejected login"));
        assert!(!output.contains("ann.lee"));
        assert!(!output.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_successful_login_stores_user_then_calls_back() {
        let record = UserRecord::new(json!({"id": 9, "name": "Ann"}));
        let returned = record.clone();

        let mut gateway = MockGateway::new();
        gateway.expect_login().times(1).returning(move |_| {
            Ok(LoginResult::Success {
                user: Some(returned.clone()),
            })
        });
        let mut store = MockStore::new();
        let expected = record.clone();
        store
            .expect_save()
            .withf(move |u: &UserRecord| *u == expected)
            .times(1)
            .returning(|_| Ok(()));

        let called = Arc::new(StdMutex::new(None));
        let slot = called.clone();
        let form = form(gateway, store)
            .on_success(move |user| *slot.lock().unwrap() = user.cloned());

        let phase = form.submit(Credentials::new("ann", "pw")).await.unwrap();

        assert_eq!(phase, LoginPhase::Succeeded);
        assert_eq!(*called.lock().unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_transport_error_becomes_user_message() {
        let mut gateway = MockGateway::new();
        gateway.expect_login().returning(|_| {
            Err(DomainError::ExhaustedFallback {
                attempts: 5,
                last: Some(Box::new(DomainError::Relay("<html>".into()))),
            })
        });
        let form = form(gateway, MockStore::new());

        let phase = form.submit(Credentials::new("a", "b")).await.unwrap();

        let LoginPhase::Failed(message) = phase else {
            panic!("expected failure");
        };
        assert!(message.starts_with("Backend Error: Server is returning HTML"));
    }

    #[tokio::test]
    async fn test_storage_failure_fails_login() {
        let mut gateway = MockGateway::new();
        gateway.expect_login().returning(|_| {
            Ok(LoginResult::Success {
                user: Some(UserRecord::new(json!({}))),
            })
        });
        let mut store = MockStore::new();
        store
            .expect_save()
            .returning(|_| Err(DomainError::Storage("disk full".into())));
        let form = form(gateway, store);

        let phase = form.submit(Credentials::new("a", "b")).await.unwrap();

        assert_eq!(phase, LoginPhase::Failed("Error: disk full".to_string()));
    }

    #[tokio::test]
    async fn test_form_can_be_resubmitted_after_failure() {
        let mut gateway = MockGateway::new();
        let mut seq = mockall::Sequence::new();
        gateway
            .expect_login()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(DomainError::Network("offline".into())));
        gateway
            .expect_login()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(LoginResult::Success { user: None }));
        let mut store = MockStore::new();
        store.expect_save().never();
        let form = form(gateway, store);

        assert!(matches!(
            form.submit(Credentials::new("a", "b")).await.unwrap(),
            LoginPhase::Failed(_)
        ));
        assert_eq!(
            form.submit(Credentials::new("a", "b")).await.unwrap(),
            LoginPhase::Succeeded
        );
    }
}
