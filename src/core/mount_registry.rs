// FILE: src/core/mount_registry.rs
//! In-memory bookkeeping of mounted images.
//!
//! Lives for one invocation only. Nothing here is written to disk, so a later
//! process run starts with no mounts.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use crate::error::{Result, ServicingError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountStatus {
    Mounted,
}

impl fmt::Display for MountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountStatus::Mounted => write!(f, "mounted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRecord {
    pub source_image: PathBuf,
    pub mount_path: PathBuf,
    pub index: u32,
    pub read_only: bool,
    pub status: MountStatus,
}

#[derive(Debug, Default)]
pub struct MountRegistry {
    mounts: BTreeMap<PathBuf, MountRecord>,
}

impl MountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mount. Remounting the same path replaces the previous record.
    pub fn mount(&mut self, source: &Path, path: &Path, index: u32, read_only: bool) -> MountRecord {
        let record = MountRecord {
            source_image: source.to_path_buf(),
            mount_path: path.to_path_buf(),
            index,
            read_only,
            status: MountStatus::Mounted,
        };
        if let Some(previous) = self.mounts.insert(path.to_path_buf(), record.clone()) {
            tracing::debug!(
                "[MountRegistry] Replaced mount of {} at {}",
                previous.source_image.display(),
                path.display()
            );
        }
        record
    }

    pub fn unmount(&mut self, path: &Path) -> Result<MountRecord> {
        self.mounts
            .remove(path)
            .ok_or_else(|| ServicingError::NotMounted(path.to_path_buf()))
    }

    pub fn get(&self, path: &Path) -> Option<&MountRecord> {
        self.mounts.get(path)
    }

    pub fn list(&self) -> Vec<MountRecord> {
        self.mounts.values().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }
}
