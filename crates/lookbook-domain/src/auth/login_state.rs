use crate::shared::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoginPhase {
    #[default]
    Idle,
    Submitting,
    Failed(String),
    Succeeded,
}

/// UI state of the login form
///
/// Only one submission may be in flight at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginState {
    phase: LoginPhase,
}

impl LoginState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &LoginPhase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoginPhase::Submitting
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            LoginPhase::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Enter the submitting phase, clearing any previous error
    pub fn begin_submit(&mut self) -> Result<(), DomainError> {
        if self.is_loading() {
            return Err(DomainError::InvalidState(
                "A login attempt is already in progress".to_string(),
            ));
        }
        self.phase = LoginPhase::Submitting;
        Ok(())
    }

    /// Show an error without a submission, e.g. failed local validation
    pub fn reject(&mut self, message: impl Into<String>) {
        self.phase = LoginPhase::Failed(message.into());
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), DomainError> {
        self.require_submitting()?;
        self.phase = LoginPhase::Failed(message.into());
        Ok(())
    }

    pub fn succeed(&mut self) -> Result<(), DomainError> {
        self.require_submitting()?;
        self.phase = LoginPhase::Succeeded;
        Ok(())
    }

    fn require_submitting(&self) -> Result<(), DomainError> {
        if !self.is_loading() {
            return Err(DomainError::InvalidState(format!(
                "No login attempt in progress (phase: {:?})",
                self.phase
            )));
        }
        Ok(())
    }
}
