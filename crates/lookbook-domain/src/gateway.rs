use async_trait::async_trait;

use crate::auth::{Credentials, LoginResult};
use crate::calendar::CalendarItem;
use crate::favorites::FavoriteAction;
use crate::shared::DomainError;

/// Outcome of a calendar fetch the backend answered
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarFetch {
    Items(Vec<CalendarItem>),
    /// The backend reported `success: false`
    Rejected { message: Option<String> },
}

/// Remote PHP backend as seen by the application layer
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Check credentials; `Ok` covers both accepted and rejected logins
    async fn login(&self, credentials: &Credentials) -> Result<LoginResult, DomainError>;

    async fn fetch_calendar(&self) -> Result<CalendarFetch, DomainError>;

    /// Image URLs the backend has stored as favorites
    async fn list_favorites(&self) -> Result<Vec<String>, DomainError>;

    async fn sync_favorite(&self, url: &str, action: FavoriteAction) -> Result<(), DomainError>;
}
