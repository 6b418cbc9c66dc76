mod login_state;
mod repository;
mod value_objects;

#[cfg(test)]
mod login_state_test;

pub use login_state::{LoginPhase, LoginState};
pub use repository::UserStore;
pub use value_objects::{Credentials, LoginResult, UserRecord, DEFAULT_LOGIN_FAILURE};
