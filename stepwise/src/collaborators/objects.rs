//! Hierarchical blob store interface.

use super::CollaboratorError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A listed object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// The full object key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
}

/// The blob store operations steps may wrap.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads a local file to `key`.
    async fn upload(&self, local_path: &Path, key: &str) -> Result<(), CollaboratorError>;

    /// Moves every object under `from_prefix` to the same relative path
    /// under `to_key`.
    async fn move_prefix(&self, from_prefix: &str, to_key: &str) -> Result<(), CollaboratorError>;

    /// Lists objects under a prefix, in key order.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, CollaboratorError>;

    /// Downloads an object's bytes.
    async fn download(&self, key: &str) -> Result<Vec<u8>, CollaboratorError>;

    /// Deletes an object.
    async fn delete(&self, key: &str) -> Result<(), CollaboratorError>;
}

/// A blob store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes bytes directly, bypassing `upload`.
    pub fn put_bytes(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.objects.write().insert(key.into(), bytes.into());
    }

    /// Returns true if an object exists at `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }

    /// Returns all keys in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(&self, local_path: &Path, key: &str) -> Result<(), CollaboratorError> {
        let bytes = tokio::fs::read(local_path).await?;
        self.objects.write().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn move_prefix(&self, from_prefix: &str, to_key: &str) -> Result<(), CollaboratorError> {
        let mut objects = self.objects.write();
        let moving: Vec<String> = objects
            .keys()
            .filter(|key| key.starts_with(from_prefix))
            .cloned()
            .collect();

        if moving.is_empty() {
            return Err(CollaboratorError::NotFound(from_prefix.to_string()));
        }

        for key in moving {
            if let Some(bytes) = objects.remove(&key) {
                let destination = format!("{to_key}{}", &key[from_prefix.len()..]);
                objects.insert(destination, bytes);
            }
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, CollaboratorError> {
        Ok(self
            .objects
            .read()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, bytes)| ObjectEntry {
                key: key.clone(),
                size: bytes.len() as u64,
            })
            .collect())
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, CollaboratorError> {
        self.objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), CollaboratorError> {
        self.objects
            .write()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| CollaboratorError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_upload_reads_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"logo-bytes").unwrap();

        let store = InMemoryObjectStore::new();
        store.upload(file.path(), "clients/c-1/logo.png").await.unwrap();

        let bytes = store.download("clients/c-1/logo.png").await.unwrap();
        assert_eq!(bytes, b"logo-bytes");
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let store = InMemoryObjectStore::new();
        let err = store
            .upload(Path::new("/definitely/not/here.png"), "k")
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::Io(_)));
    }

    #[tokio::test]
    async fn test_move_prefix_rewrites_keys() {
        let store = InMemoryObjectStore::new();
        store.put_bytes("pending/c-1/a.pdf", "a");
        store.put_bytes("pending/c-1/b.pdf", "bb");
        store.put_bytes("pending/c-2/c.pdf", "c");

        store
            .move_prefix("pending/c-1/", "clients/c-1/docs/")
            .await
            .unwrap();

        assert_eq!(
            store.keys(),
            vec![
                "clients/c-1/docs/a.pdf".to_string(),
                "clients/c-1/docs/b.pdf".to_string(),
                "pending/c-2/c.pdf".to_string(),
            ]
        );

        let listed = store.list("clients/c-1/").await.unwrap();
        assert_eq!(listed[1].size, 2);
    }

    #[tokio::test]
    async fn test_move_empty_prefix_is_not_found() {
        let store = InMemoryObjectStore::new();
        let err = store.move_prefix("nothing/", "elsewhere/").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryObjectStore::new();
        store.put_bytes("k", "v");

        store.delete("k").await.unwrap();
        assert!(!store.contains("k"));
        assert!(store.delete("k").await.is_err());
    }
}
