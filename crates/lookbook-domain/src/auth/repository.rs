use async_trait::async_trait;

use super::value_objects::UserRecord;
use crate::shared::DomainError;

/// Durable slot holding the logged-in user's record
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Replace the stored record
    async fn save(&self, user: &UserRecord) -> Result<(), DomainError>;

    /// Read the stored record, if any
    async fn load(&self) -> Result<Option<UserRecord>, DomainError>;

    /// Remove the stored record
    async fn clear(&self) -> Result<(), DomainError>;
}
