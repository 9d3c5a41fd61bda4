use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::instrument;

/// Public prefix under which stored attachments are served.
pub const UPLOADS_PREFIX: &str = "uploads";

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("Invalid blob key: {0}")]
    InvalidKey(String),
    #[error("Blob storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write-once attachment storage. `put` returns the path clients use to
/// fetch the blob, relative to the server root.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, BlobError>;
    /// Removes a blob; deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), BlobError>;
}

fn check_key(key: &str) -> Result<(), BlobError> {
    if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
        return Err(BlobError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn public_path(key: &str) -> String {
    format!("{UPLOADS_PREFIX}/{key}")
}

/// Stores blobs as files under `root`, which is created on first write.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, BlobError> {
        check_key(key)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(key), bytes).await?;
        Ok(public_path(key))
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        check_key(key)?;
        match tokio::fs::remove_file(self.root.join(key)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, BlobError> {
        check_key(key)?;
        self.blobs.write().await.insert(key.to_string(), bytes);
        Ok(public_path(key))
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        self.blobs.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_put_returns_public_path() {
        let store = InMemoryBlobStore::default();
        let path = store.put("1700000000000-photo.png", vec![1, 2, 3]).await.unwrap();
        assert_eq!(path, "uploads/1700000000000-photo.png");
        assert_eq!(store.get("1700000000000-photo.png").await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let store = InMemoryBlobStore::default();
        assert!(matches!(
            store.put("../etc/passwd", vec![]).await,
            Err(BlobError::InvalidKey(_))
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_local_store_writes_file() {
        let root = std::env::temp_dir().join(format!("grievance-blobs-{}", uuid::Uuid::new_v4()));
        let store = LocalBlobStore::new(&root);
        let path = store.put("1-a.jpg", b"jpeg".to_vec()).await.unwrap();
        assert_eq!(path, "uploads/1-a.jpg");
        assert_eq!(tokio::fs::read(root.join("1-a.jpg")).await.unwrap(), b"jpeg");

        store.delete("1-a.jpg").await.unwrap();
        assert!(!root.join("1-a.jpg").exists());
        store.delete("1-a.jpg").await.unwrap();
        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
