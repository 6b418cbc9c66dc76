use async_trait::async_trait;
use mockall::mock;

use lookbook_domain::auth::{Credentials, LoginResult, UserRecord, UserStore};
use lookbook_domain::favorites::FavoriteAction;
use lookbook_domain::{BackendGateway, CalendarFetch, DomainError};

mock! {
    pub Gateway {}

    #[async_trait]
    impl BackendGateway for Gateway {
        async fn login(&self, credentials: &Credentials) -> Result<LoginResult, DomainError>;
        async fn fetch_calendar(&self) -> Result<CalendarFetch, DomainError>;
        async fn list_favorites(&self) -> Result<Vec<String>, DomainError>;
        async fn sync_favorite(&self, url: &str, action: FavoriteAction) -> Result<(), DomainError>;
    }
}

mock! {
    pub Store {}

    #[async_trait]
    impl UserStore for Store {
        async fn save(&self, user: &UserRecord) -> Result<(), DomainError>;
        async fn load(&self) -> Result<Option<UserRecord>, DomainError>;
        async fn clear(&self) -> Result<(), DomainError>;
    }
}
