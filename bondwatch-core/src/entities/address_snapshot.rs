//! Persisted window of the most recently seen bonding addresses.

use crate::entities::BondingAddress;
use crate::utils::json_file::{StoreError, read_json, write_json_atomic};
use std::path::{Path, PathBuf};
use tracing::error;

/// JSON file holding the last top-`N` snapshot, most recent first.
#[derive(Debug, Clone)]
pub struct AddressSnapshotStore {
    path: PathBuf,
}

impl AddressSnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted snapshot.
    ///
    /// A missing or unreadable file yields an empty snapshot, so every
    /// current entry is treated as new.
    pub async fn load(&self) -> Vec<BondingAddress> {
        match read_json(&self.path).await {
            Ok(snapshot) => snapshot.unwrap_or_default(),
            Err(e) => {
                error!(error = %e, "Failed to load address snapshot, starting empty");
                Vec::new()
            }
        }
    }

    /// Replace the persisted snapshot.
    pub async fn save(&self, snapshot: &[BondingAddress]) -> Result<(), StoreError> {
        write_json_atomic(&self.path, &snapshot).await
    }
}
