// Durable key-value storage for client-side state

mod json_store;
mod user_store;

pub use json_store::JsonFileStore;
pub use user_store::{FileUserStore, USER_KEY};

use std::path::PathBuf;

const APP_DIR: &str = "lookbook";
const STORE_FILE: &str = "storage.json";

/// Per-user data directory for the application
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

/// Location of the key-value file inside the data directory
pub fn default_storage_path() -> PathBuf {
    default_data_dir().join(STORE_FILE)
}

/// Location of log files inside the data directory
pub fn default_log_dir() -> PathBuf {
    default_data_dir().join("logs")
}
