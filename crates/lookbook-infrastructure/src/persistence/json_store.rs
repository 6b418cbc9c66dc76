use log::{debug, warn};
use lookbook_domain::DomainError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// String-keyed JSON values kept in a single file.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash never leaves a half-written store behind.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DomainError> {
        let _guard = self.lock.lock().await;
        let entries = self.read_all().await?;

        entries
            .get(key)
            .cloned()
            .map(|value| {
                serde_json::from_value(value).map_err(|e| DomainError::Serialization(e.to_string()))
            })
            .transpose()
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DomainError> {
        let value =
            serde_json::to_value(value).map_err(|e| DomainError::Serialization(e.to_string()))?;

        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries).await?;

        debug!("Stored key '{}' in {}", key, self.path.display());
        Ok(())
    }

    /// Returns whether the key existed
    pub async fn remove(&self, key: &str) -> Result<bool, DomainError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;

        if entries.remove(key).is_none() {
            return Ok(false);
        }
        self.write_all(&entries).await?;
        Ok(true)
    }

    async fn read_all(&self) -> Result<Map<String, Value>, DomainError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(storage_error(&self.path, e)),
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                warn!(
                    "Ignoring unreadable store at {}; starting empty",
                    self.path.display()
                );
                Ok(Map::new())
            }
        }
    }

    async fn write_all(&self, entries: &Map<String, Value>) -> Result<(), DomainError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(parent, e))?;
        }

        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| DomainError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| storage_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| storage_error(&self.path, e))
    }
}

fn storage_error(path: &Path, error: std::io::Error) -> DomainError {
    DomainError::Storage(format!("{}: {}", path.display(), error))
}
