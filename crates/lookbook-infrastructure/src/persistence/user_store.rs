use async_trait::async_trait;
use lookbook_domain::auth::{UserRecord, UserStore};
use lookbook_domain::DomainError;
use std::sync::Arc;

use super::JsonFileStore;

/// Key under which the logged-in user is kept
pub const USER_KEY: &str = "user";

/// `UserStore` backed by the shared key-value file
pub struct FileUserStore {
    store: Arc<JsonFileStore>,
}

impl FileUserStore {
    pub fn new(store: Arc<JsonFileStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserStore for FileUserStore {
    async fn save(&self, user: &UserRecord) -> Result<(), DomainError> {
        self.store.set(USER_KEY, user).await
    }

    async fn load(&self) -> Result<Option<UserRecord>, DomainError> {
        self.store.get(USER_KEY).await
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.store.remove(USER_KEY).await.map(|_| ())
    }
}
