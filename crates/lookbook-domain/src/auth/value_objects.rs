use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::DomainError;

/// Message shown when the backend rejects a login without saying why
pub const DEFAULT_LOGIN_FAILURE: &str = "Invalid username or password.";

const MISSING_FIELDS: &str = "Please fill in both fields.";

/// Username and password as typed into the login form.
///
/// Held only for the duration of a submission; never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Reject empty fields before anything touches the network
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(DomainError::Validation(MISSING_FIELDS.to_string()));
        }
        Ok(())
    }

    /// Wipe both fields, e.g. when the form is left
    pub fn clear(&mut self) {
        self.username.clear();
        self.password.clear();
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Backend-defined user payload, stored verbatim and never interpreted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord(serde_json::Value);

impl UserRecord {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Outcome of a login attempt as decided by the backend
#[derive(Debug, Clone, PartialEq)]
pub enum LoginResult {
    Success { user: Option<UserRecord> },
    Failure { message: String },
}

impl LoginResult {
    /// Build a failure, falling back to the default message when the backend sent none
    pub fn failure(message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOGIN_FAILURE.to_string());
        LoginResult::Failure { message }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LoginResult::Success { .. })
    }
}
