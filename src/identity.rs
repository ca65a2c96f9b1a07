//! Local persistence of the signed-in user id and the identity context.
//!
//! The store holds a single `userId` key. Everything user-scoped receives an
//! [`IdentityContext`] read from the store instead of looking it up itself.

use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{ReelError, Result};
use crate::paths::identity_path;
use crate::types::UserId;

/// Persistent key/value slot for the current user id
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get(&self) -> Result<Option<UserId>>;
    async fn set(&self, user_id: &UserId) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct IdentityFile {
    #[serde(rename = "userId")]
    user_id: UserId,
}

/// Identity stored as a small JSON file
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    /// Store at the default location under the reelsync root
    pub fn new() -> Self {
        Self::at(identity_path())
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Default for FileIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityStore for FileIdentityStore {
    async fn get(&self) -> Result<Option<UserId>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        let file: IdentityFile = serde_json::from_str(&content)?;
        Ok(Some(file.user_id).filter(|id| !id.as_str().is_empty()))
    }

    async fn set(&self, user_id: &UserId) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string(&IdentityFile {
            user_id: user_id.clone(),
        })?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Identity kept in process memory
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    user_id: Mutex<Option<UserId>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user_id: UserId) -> Self {
        Self {
            user_id: Mutex::new(Some(user_id)),
        }
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn get(&self) -> Result<Option<UserId>> {
        Ok(self.user_id.lock().clone())
    }

    async fn set(&self, user_id: &UserId) -> Result<()> {
        *self.user_id.lock() = Some(user_id.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.user_id.lock() = None;
        Ok(())
    }
}

/// The user on whose behalf an operation runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityContext {
    user: Option<UserId>,
}

impl IdentityContext {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn signed_in(user_id: UserId) -> Self {
        Self {
            user: Some(user_id),
        }
    }

    /// Read the current identity from a store
    pub async fn load(store: &dyn IdentityStore) -> Result<Self> {
        Ok(Self {
            user: store.get().await?,
        })
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    pub fn require_user(&self) -> Result<&UserId> {
        self.user.as_ref().ok_or(ReelError::NotSignedIn)
    }

    /// True when the signed-in user is `author`
    pub fn is_author(&self, author: &UserId) -> bool {
        self.user.as_ref() == Some(author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileIdentityStore::at(dir.path().join("state").join("identity.json"));

        assert_eq!(store.get().await.unwrap(), None);

        store.set(&UserId::new("user-1")).await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some(UserId::new("user-1")));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"{"userId":"user-1"}"#);

        store.clear().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);
        // Clearing twice is fine
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("identity.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileIdentityStore::at(path);
        assert!(matches!(store.get().await, Err(ReelError::Json(_))));
    }

    #[tokio::test]
    async fn test_context_load_from_memory_store() {
        let store = MemoryIdentityStore::with_user(UserId::new("u9"));
        let identity = IdentityContext::load(&store).await.unwrap();
        assert_eq!(identity.user(), Some(&UserId::new("u9")));

        store.clear().await.unwrap();
        let identity = IdentityContext::load(&store).await.unwrap();
        assert!(matches!(identity.require_user(), Err(ReelError::NotSignedIn)));
    }

    #[test]
    fn test_is_author() {
        let identity = IdentityContext::signed_in(UserId::new("a"));
        assert!(identity.is_author(&UserId::new("a")));
        assert!(!identity.is_author(&UserId::new("b")));
        assert!(!IdentityContext::anonymous().is_author(&UserId::new("a")));
    }
}
