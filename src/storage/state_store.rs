//! Simulated State Store
//!
//! One pretty-printed JSON file per `StateKey` under the scratch directory.
//! Every mutation rewrites the whole file. Read and write failures are logged
//! as warnings and never surface as errors: a persistence problem must not
//! turn a logical action into a failure.

use std::fs;
use std::path::PathBuf;
use crate::core::StateKey;
use crate::error::Result;
use crate::storage::lock::StateLock;
use crate::storage::{ItemMap, ItemRecord};

/// Result of `SimulatedStateStore::remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    /// No record by that name.
    Absent,
    /// The record existed but the rewritten file could not be saved.
    Unsaved,
}

#[derive(Debug, Clone)]
pub struct SimulatedStateStore {
    dir: PathBuf,
}

impl SimulatedStateStore {
    /// Open the store rooted at `dir`, creating the directory if needed.
    /// Safe to call repeatedly.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        match fs::create_dir_all(&dir) {
            Ok(()) => tracing::debug!("State directory ready: {}", dir.display()),
            Err(e) => tracing::warn!("Could not create state directory {}: {}", dir.display(), e),
        }
        Self { dir }
    }

    pub fn path_for(&self, key: &StateKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    fn lock_path_for(&self, key: &StateKey) -> PathBuf {
        self.path_for(key).with_extension("lock")
    }

    /// Read all records for `key`. Missing or unreadable files yield an empty map.
    pub fn load(&self, key: &StateKey) -> ItemMap {
        match self.try_load(key) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Could not read simulated {} state ({}): {}", key.class().as_str(), key, e);
                ItemMap::new()
            }
        }
    }

    /// Overwrite the file for `key`. Returns false (after logging) if the write failed.
    pub fn save(&self, key: &StateKey, items: &ItemMap) -> bool {
        match self.try_save(key, items) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Could not save simulated {} state ({}): {}", key.class().as_str(), key, e);
                false
            }
        }
    }

    /// Set `name` to `record`, replacing any existing entry whose name matches
    /// case-insensitively.
    pub fn upsert(&self, key: &StateKey, name: &str, record: ItemRecord) -> bool {
        let _lock = self.lock(key);
        let mut items = self.load(key);
        let existing = find_key(&items, name);
        if let Some(existing) = existing {
            items.remove(&existing);
        }
        items.insert(name.to_string(), record);
        self.save(key, &items)
    }

    /// Delete `name` if present.
    pub fn remove(&self, key: &StateKey, name: &str) -> Removal {
        let _lock = self.lock(key);
        let mut items = self.load(key);
        let Some(existing) = find_key(&items, name) else {
            tracing::debug!("No simulated record for {} under {}", name, key);
            return Removal::Absent;
        };
        items.remove(&existing);
        if self.save(key, &items) {
            Removal::Removed
        } else {
            Removal::Unsaved
        }
    }

    /// Look up one record by name, case-insensitively.
    pub fn get(&self, key: &StateKey, name: &str) -> Option<(String, ItemRecord)> {
        let items = self.load(key);
        let found = find_key(&items, name)?;
        items.get(&found).cloned().map(|record| (found, record))
    }

    fn lock(&self, key: &StateKey) -> Option<StateLock> {
        match StateLock::acquire(&self.lock_path_for(key)) {
            Ok(lock) => Some(lock),
            Err(e) => {
                tracing::warn!("Proceeding without state lock: {}", e);
                None
            }
        }
    }

    fn try_load(&self, key: &StateKey) -> Result<ItemMap> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(ItemMap::new());
        }
        let content = fs::read_to_string(&path)?;
        let items: ItemMap = serde_json::from_str(&content)?;
        Ok(items)
    }

    /// Write to a sibling temp file, then rename over the real one.
    fn try_save(&self, key: &StateKey, items: &ItemMap) -> Result<()> {
        let content = serde_json::to_string_pretty(items)?;
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, content)?;
        fs::rename(&staging, &path)?;
        tracing::debug!("Saved {} simulated record(s) for {}", items.len(), key);
        Ok(())
    }
}

fn find_key(items: &ItemMap, name: &str) -> Option<String> {
    if items.contains_key(name) {
        return Some(name.to_string());
    }
    items.keys().find(|k| k.eq_ignore_ascii_case(name)).cloned()
}
