// FILE: src/storage/mod.rs
pub mod lock;
pub mod reference;
pub mod state_store;

use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Serialize};

pub use reference::{DriverEntry, ReferenceEntry, SAMPLE_DRIVERS, SAMPLE_FEATURES, SAMPLE_PACKAGES};
pub use state_store::{Removal, SimulatedStateStore};

// Data Types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemState {
    Enabled,
    Disabled,
    Installed,
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ItemState::Enabled => "Enabled",
            ItemState::Disabled => "Disabled",
            ItemState::Installed => "Installed",
        };
        f.write_str(label)
    }
}

/// One simulated feature or package. The item name is the map key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub state: ItemState,
    #[serde(default = "simulated_default")]
    pub simulated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl ItemRecord {
    pub fn simulated(state: ItemState, target: Option<String>) -> Self {
        Self { state, simulated: true, target }
    }
}

fn simulated_default() -> bool {
    true
}

/// Contents of one state file, sorted by item name.
pub type ItemMap = BTreeMap<String, ItemRecord>;
