// FILE: src/core/state_key.rs
use std::fmt;
use crate::core::target::Target;

/// Which family of simulated records a state file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    Features,
    Packages,
}

impl OperationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationClass::Features => "features",
            OperationClass::Packages => "packages",
        }
    }
}

/// Identifies one backing file of the simulated state store.
///
/// Online keys are constant per class. Offline keys embed a stable hash of
/// the normalized image path, so the same path maps to the same file in
/// every process run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    class: OperationClass,
    image_hash: Option<u64>,
}

impl StateKey {
    pub fn derive(class: OperationClass, target: &Target) -> Self {
        let image_hash = target.image_path().map(|p| fnv1a(&normalize_path(p)));
        Self { class, image_hash }
    }

    pub fn class(&self) -> OperationClass {
        self.class
    }

    /// File name of the backing store under the state directory.
    pub fn file_name(&self) -> String {
        match self.image_hash {
            None => format!("simulated_{}.json", self.class.as_str()),
            Some(hash) => format!("image_{}_{:016x}.json", self.class.as_str(), hash),
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.image_hash {
            None => write!(f, "{}@online", self.class.as_str()),
            Some(hash) => write!(f, "{}@{:016x}", self.class.as_str(), hash),
        }
    }
}

/// Trim whitespace and trailing separators so `/img/` and `/img` share a key.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    let stripped = trimmed.trim_end_matches(&['/', '\\'][..]);
    if stripped.is_empty() {
        trimmed.chars().take(1).collect()
    } else {
        stripped.to_string()
    }
}

/// 64-bit FNV-1a. Stable across runs and platforms, unlike `DefaultHasher`.
fn fnv1a(key: &str) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET_BASIS;
    for byte in key.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
