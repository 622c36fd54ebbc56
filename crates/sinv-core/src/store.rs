//! Supplier profile sources.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::StoreError;
use crate::models::supplier::SupplierProfile;

/// Queryable source of active supplier keyword profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load every active profile. An empty catalog is `Ok(vec![])`.
    async fn active_profiles(&self) -> Result<Vec<SupplierProfile>, StoreError>;
}

/// Profiles held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileStore {
    profiles: Vec<SupplierProfile>,
}

impl InMemoryProfileStore {
    pub fn new(profiles: Vec<SupplierProfile>) -> Self {
        Self { profiles }
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn active_profiles(&self) -> Result<Vec<SupplierProfile>, StoreError> {
        Ok(self.profiles.iter().filter(|p| p.active).cloned().collect())
    }
}

/// Profiles read from a JSON array on disk at every query.
#[derive(Debug, Clone)]
pub struct JsonProfileStore {
    path: PathBuf,
}

impl JsonProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProfileStore for JsonProfileStore {
    async fn active_profiles(&self) -> Result<Vec<SupplierProfile>, StoreError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let profiles: Vec<SupplierProfile> = serde_json::from_str(&content)?;

        debug!("Loaded {} profiles from {}", profiles.len(), self.path.display());

        Ok(profiles.into_iter().filter(|p| p.active).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_filters_inactive() {
        let mut inactive = SupplierProfile::new("2", "Old Supplier", "old");
        inactive.active = false;

        let store = InMemoryProfileStore::new(vec![
            SupplierProfile::new("1", "Booker Wholesale", "booker"),
            inactive,
        ]);

        let profiles = store.active_profiles().await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "Booker Wholesale");
    }

    #[tokio::test]
    async fn test_json_store_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "1", "name": "Booker Wholesale", "keywords": "booker|booker wholesale"},
                {"id": "2", "name": "Brakes", "keywords": "brakes", "active": false}
            ]"#,
        )
        .unwrap();

        let profiles = JsonProfileStore::new(&path).active_profiles().await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].keyword_list(), vec!["booker", "booker wholesale"]);
    }

    #[tokio::test]
    async fn test_json_store_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();

        let missing = JsonProfileStore::new(dir.path().join("missing.json"));
        assert!(matches!(missing.active_profiles().await, Err(StoreError::Io(_))));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        let broken = JsonProfileStore::new(&path);
        assert!(matches!(broken.active_profiles().await, Err(StoreError::Format(_))));
    }
}
