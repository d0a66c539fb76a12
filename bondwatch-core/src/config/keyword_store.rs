//! Operator-configured purchase keyword.
//!
//! `KeywordStore` wraps `Arc<RwLock<KeywordConfig>>` plus the file it is
//! persisted to. It is constructed once at startup and cloned into every
//! component that reads or writes the keyword.

use crate::utils::json_file::{StoreError, read_json, write_json_atomic};
use crate::utils::keyword::matches_keyword;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Persisted keyword state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordConfig {
    /// Always stored lowercased. Empty means unset.
    pub keyword: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

impl KeywordConfig {
    fn unset() -> Self {
        Self {
            keyword: String::new(),
            last_updated: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

/// Shared handle to the keyword configuration and its backing file.
pub struct KeywordStore {
    inner: Arc<KeywordStoreInner>,
}

struct KeywordStoreInner {
    path: PathBuf,
    data: RwLock<KeywordConfig>,
}

impl KeywordStore {
    /// Load the keyword from `path`.
    ///
    /// A missing file means no keyword; an unreadable one is logged and also
    /// treated as no keyword.
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let config = match read_json::<KeywordConfig>(&path).await {
            Ok(Some(mut config)) => {
                config.keyword = config.keyword.to_lowercase();
                config
            }
            Ok(None) => KeywordConfig::unset(),
            Err(e) => {
                error!(error = %e, "Failed to load keyword, continuing without one");
                KeywordConfig::unset()
            }
        };

        if !config.keyword.is_empty() {
            info!(keyword = %config.keyword, "Loaded keyword");
        }

        Self {
            inner: Arc::new(KeywordStoreInner {
                path,
                data: RwLock::new(config),
            }),
        }
    }

    /// Current keyword (lowercased, possibly empty).
    pub async fn keyword(&self) -> String {
        self.inner.data.read().await.keyword.clone()
    }

    pub async fn snapshot(&self) -> KeywordConfig {
        self.inner.data.read().await.clone()
    }

    /// Lowercase, persist and apply a new keyword.
    ///
    /// The in-memory value only changes once the file has been written.
    pub async fn set_keyword(&self, keyword: &str) -> Result<KeywordConfig, StoreError> {
        let mut guard = self.inner.data.write().await;
        let updated = KeywordConfig {
            keyword: keyword.trim().to_lowercase(),
            last_updated: OffsetDateTime::now_utc(),
        };
        write_json_atomic(&self.inner.path, &updated).await?;
        *guard = updated.clone();
        Ok(updated)
    }

    /// Whether `token_id` matches the current keyword.
    pub async fn matches(&self, token_id: &str) -> bool {
        matches_keyword(&self.inner.data.read().await.keyword, token_id)
    }
}

impl Clone for KeywordStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_means_unset() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeywordStore::load(dir.path().join("keyword.json")).await;
        assert_eq!(store.keyword().await, "");
        assert!(!store.matches("TOM-token").await);
    }

    #[tokio::test]
    async fn test_set_lowercases_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyword.json");
        let store = KeywordStore::load(&path).await;

        let updated = store.set_keyword("MoOn").await.unwrap();
        assert_eq!(updated.keyword, "moon");
        assert!(store.matches("TOMOON-abc").await);
        assert!(!store.matches("CAT-def").await);

        let reloaded = KeywordStore::load(&path).await;
        assert_eq!(reloaded.keyword().await, "moon");
        assert_eq!(reloaded.snapshot().await, updated);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeywordStore::load(dir.path().join("keyword.json")).await;
        let other = store.clone();
        store.set_keyword("tom").await.unwrap();
        assert_eq!(other.keyword().await, "tom");
    }

    #[tokio::test]
    async fn test_reads_existing_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyword.json");
        tokio::fs::write(
            &path,
            r#"{ "keyword": "Tom", "lastUpdated": "2024-05-01T10:20:30.123Z" }"#,
        )
        .await
        .unwrap();
        let store = KeywordStore::load(&path).await;
        assert_eq!(store.keyword().await, "tom");
        assert_eq!(store.snapshot().await.last_updated.year(), 2024);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_keyword() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the file makes the rename fail.
        let path = dir.path().join("keyword.json");
        tokio::fs::create_dir_all(path.join("occupied")).await.unwrap();
        let store = KeywordStore::load(&path).await;
        assert!(store.set_keyword("moon").await.is_err());
        assert_eq!(store.keyword().await, "");
    }
}
