// Durable key-value storage for the client session
// Decision: Two keys, written and removed together: the raw token and the user summary as JSON

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::error::ClientError;

/// Storage key for the raw session token
pub const TOKEN_KEY: &str = "auth_token";

/// Storage key for the JSON-encoded user summary
pub const USER_KEY: &str = "user_info";

/// String key-value store that survives restarts (device storage on mobile)
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;
    async fn remove(&self, key: &str) -> Result<(), ClientError>;

    /// Write several entries; implementations may make this atomic
    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), ClientError> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), ClientError> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}

/// Process-local store, for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// JSON object on disk; every write rewrites the whole file
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<HashMap<String, String>, ClientError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| ClientError::Storage(format!("Corrupt session file: {}", e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(ClientError::Storage(e.to_string())),
        }
    }

    async fn save(&self, entries: &HashMap<String, String>) -> Result<(), ClientError> {
        let bytes =
            serde_json::to_vec_pretty(entries).map_err(|e| ClientError::Storage(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ClientError::Storage(e.to_string()))?;
        }

        // Write then rename so a crash never leaves a half-written file
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.set_many(&[(key, value)]).await
    }

    async fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.remove_many(&[key]).await
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), ClientError> {
        let _guard = self.lock.lock().await;
        let mut current = self.load().await?;
        for (key, value) in entries {
            current.insert(key.to_string(), value.to_string());
        }
        self.save(&current).await
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), ClientError> {
        let _guard = self.lock.lock().await;
        // A corrupt file is replaced rather than blocking removal
        let mut current = self.load().await.unwrap_or_default();
        for key in keys {
            current.remove(*key);
        }
        self.save(&current).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("fitsync-store-{}", uuid::Uuid::now_v7()))
            .join("session.json")
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);

        store
            .set_many(&[(TOKEN_KEY, "t1"), (USER_KEY, "{}")])
            .await
            .unwrap();
        assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("t1"));

        store.remove_many(&[TOKEN_KEY, USER_KEY]).await.unwrap();
        assert_eq!(store.get(USER_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let path = temp_path();
        FileStore::new(&path).set(TOKEN_KEY, "t1").await.unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get(TOKEN_KEY).await.unwrap().as_deref(), Some("t1"));

        reopened.remove(TOKEN_KEY).await.unwrap();
        assert_eq!(FileStore::new(&path).get(TOKEN_KEY).await.unwrap(), None);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(
            store.get(TOKEN_KEY).await,
            Err(ClientError::Storage(_))
        ));

        // Removal recovers the file
        store.remove_many(&[TOKEN_KEY, USER_KEY]).await.unwrap();
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
