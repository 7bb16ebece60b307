//! Blob storage for attachments.

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{TodoError, TodoResult};
use crate::models::DownloadUrl;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under a fresh key starting with `key_prefix`.
    async fn put(&self, key_prefix: &str, bytes: Bytes, content_type: &str) -> TodoResult<String>;

    /// Time-limited download link for `key`.
    async fn presigned_url(&self, key: &str, ttl: Duration) -> TodoResult<DownloadUrl>;

    async fn delete(&self, key: &str) -> TodoResult<()>;
}

fn new_key(prefix: &str) -> String {
    format!("{}/{}", prefix.trim_matches('/'), Uuid::now_v7())
}

type HmacSha256 = Hmac<Sha256>;

fn keyed_mac(key: &[u8]) -> TodoResult<HmacSha256> {
    HmacSha256::new_from_slice(key).map_err(|e| TodoError::Internal(e.to_string()))
}

/// Hex HMAC-SHA256 of `message`.
fn sign(key: &[u8], message: &[u8]) -> TodoResult<String> {
    let mut mac = keyed_mac(key)?;
    mac.update(message);
    Ok(const_hex::encode(mac.finalize().into_bytes()))
}

fn expiry(ttl: Duration) -> TodoResult<DateTime<Utc>> {
    Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| TodoError::Internal(format!("download ttl out of range: {ttl}")))
}

/// Files under a local root, served back through signed expiring URLs.
#[derive(Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_url: String,
    signing_key: Arc<Vec<u8>>,
}

impl LocalObjectStore {
    pub fn new(
        root: impl Into<PathBuf>,
        public_url: impl Into<String>,
        signing_key: impl AsRef<[u8]>,
    ) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
            signing_key: Arc::new(signing_key.as_ref().to_vec()),
        }
    }

    fn signed_message(key: &str, expires: i64) -> String {
        format!("{key}\n{expires}")
    }

    /// Check a signature produced by [`ObjectStore::presigned_url`].
    pub fn verify(&self, key: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> bool {
        if now.timestamp() > expires {
            return false;
        }
        let Ok(expected) = const_hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = keyed_mac(&self.signing_key) else {
            return false;
        };
        mac.update(Self::signed_message(key, expires).as_bytes());
        mac.verify_slice(&expected).is_ok()
    }

    /// Resolve `key` below the root, refusing anything that escapes it.
    fn path_for(&self, key: &str) -> TodoResult<PathBuf> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !safe {
            return Err(TodoError::InvalidInput(format!("invalid object key: {key}")));
        }
        Ok(self.root.join(relative))
    }

    pub async fn read(&self, key: &str) -> TodoResult<Bytes> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TodoError::not_found("object", Uuid::nil()))
            }
            Err(e) => Err(TodoError::Storage(e.to_string())),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(&self, key_prefix: &str, bytes: Bytes, content_type: &str) -> TodoResult<String> {
        let key = new_key(key_prefix);
        let path = self.path_for(&key)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| TodoError::Storage(e.to_string()))?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| TodoError::Storage(e.to_string()))?;
        tracing::debug!(%key, "object stored");
        Ok(key)
    }

    async fn presigned_url(&self, key: &str, ttl: Duration) -> TodoResult<DownloadUrl> {
        let expires_at = expiry(ttl)?;
        let expires = expires_at.timestamp();
        let signature = sign(
            &self.signing_key,
            Self::signed_message(key, expires).as_bytes(),
        )?;
        Ok(DownloadUrl {
            url: format!("{}/{key}?expires={expires}&signature={signature}", self.public_url),
            expires_at,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> TodoResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TodoError::Storage(e.to_string())),
        }
    }
}

/// Process-memory store for tests. Deletes can be made to fail.
#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, (Bytes, String)>>>,
    fail_deletes: Arc<AtomicBool>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, key_prefix: &str, bytes: Bytes, content_type: &str) -> TodoResult<String> {
        let key = new_key(key_prefix);
        self.objects
            .write()
            .await
            .insert(key.clone(), (bytes, content_type.to_string()));
        Ok(key)
    }

    async fn presigned_url(&self, key: &str, ttl: Duration) -> TodoResult<DownloadUrl> {
        if !self.contains(key).await {
            return Err(TodoError::not_found("object", Uuid::nil()));
        }
        Ok(DownloadUrl {
            url: format!("memory://{key}"),
            expires_at: expiry(ttl)?,
        })
    }

    async fn delete(&self, key: &str) -> TodoResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(TodoError::Storage(format!("delete of {key} refused")));
        }
        self.objects.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_matches_rfc4231_case_2() {
        assert_eq!(
            sign(b"Jefe", b"what do ya want for nothing?").unwrap(),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[tokio::test]
    async fn test_out_of_range_ttl_is_an_error() {
        let store = LocalObjectStore::new("/tmp/unused", "http://x", "k");
        assert!(matches!(
            store.presigned_url("todos/a/b", Duration::MAX).await,
            Err(TodoError::Internal(_))
        ));

        let memory = InMemoryObjectStore::new();
        let key = memory
            .put("p", Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap();
        assert!(matches!(
            memory.presigned_url(&key, Duration::MAX).await,
            Err(TodoError::Internal(_))
        ));
    }

    #[test]
    fn test_verify_rejects_malformed_signatures() {
        let store = LocalObjectStore::new("/tmp/unused", "http://x", "k");
        let expires = (Utc::now() + Duration::seconds(60)).timestamp();
        let good = sign(b"k", LocalObjectStore::signed_message("a", expires).as_bytes()).unwrap();

        assert!(store.verify("a", expires, &good, Utc::now()));
        assert!(!store.verify("a", expires, "not-hex", Utc::now()));
        assert!(!store.verify("a", expires, &good[..10], Utc::now()));
        assert!(!store.verify("a", expires, "", Utc::now()));
    }

    #[tokio::test]
    async fn test_presigned_url_verifies_until_expiry() {
        let store = LocalObjectStore::new("/tmp/unused", "http://localhost:8080/files/", "k");
        let link = store
            .presigned_url("todos/a/b", Duration::seconds(60))
            .await
            .unwrap();
        assert!(link.url.starts_with("http://localhost:8080/files/todos/a/b?expires="));

        let expires = link.expires_at.timestamp();
        let signature = link.url.rsplit("signature=").next().unwrap();
        assert!(store.verify("todos/a/b", expires, signature, Utc::now()));
        assert!(!store.verify("todos/a/c", expires, signature, Utc::now()));
        assert!(!store.verify(
            "todos/a/b",
            expires,
            signature,
            link.expires_at + Duration::seconds(1)
        ));
    }

    #[tokio::test]
    async fn test_local_round_trip_and_delete() {
        let root = std::env::temp_dir().join(format!("objects-{}", Uuid::now_v7()));
        let store = LocalObjectStore::new(&root, "http://x", "k");

        let key = store
            .put("todos/1", Bytes::from_static(b"hello"), "text/plain")
            .await
            .unwrap();
        assert!(key.starts_with("todos/1/"));
        assert_eq!(store.read(&key).await.unwrap(), Bytes::from_static(b"hello"));

        store.delete(&key).await.unwrap();
        assert!(matches!(
            store.read(&key).await,
            Err(TodoError::NotFound { .. })
        ));
        // Deleting twice is fine
        store.delete(&key).await.unwrap();

        let _ = tokio::fs::remove_dir_all(root).await;
    }

    #[tokio::test]
    async fn test_local_rejects_traversal() {
        let store = LocalObjectStore::new("/tmp/unused", "http://x", "k");
        assert!(store.read("../etc/passwd").await.is_err());
        assert!(store.read("/etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn test_in_memory_delete_failure_switch() {
        let store = InMemoryObjectStore::new();
        let key = store
            .put("p", Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap();
        store.fail_deletes(true);
        assert!(store.delete(&key).await.is_err());
        assert!(store.contains(&key).await);
        store.fail_deletes(false);
        store.delete(&key).await.unwrap();
        assert!(store.is_empty().await);
    }
}
