//! Store snapshots on disk

use crate::{Result, store::Store};
use std::path::PathBuf;

/// Saves and restores a [`Store`] as `store.json`
pub struct SnapshotStorage {
    data_dir: PathBuf,
}

impl SnapshotStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }

    /// `None` when no snapshot has been saved yet. A snapshot with
    /// out-of-range values or repeated ids is rejected.
    pub fn load(&self) -> Result<Option<Store>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let store: Store = serde_json::from_str(&content)?;
        store.validate()?;
        Ok(Some(store))
    }

    pub fn save(&self, store: &Store) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;

        let content = serde_json::to_string_pretty(store)?;
        std::fs::write(self.path(), content)?;

        Ok(())
    }
}
