// FILE: src/state.rs

use crate::config::Config;
use crate::core::MountRegistry;
use crate::storage::SimulatedStateStore;

/// Everything one invocation shares between components.
///
/// Built once in `main` (or a test) and handed to the router. There are no
/// process-wide singletons: the scratch directory, the state store and the
/// mount registry all hang off this value.
#[derive(Debug)]
pub struct ServicingContext {
    pub config: Config,
    pub store: SimulatedStateStore,
    /// Process-lifetime only. Never persisted.
    pub mounts: MountRegistry,
}

impl ServicingContext {
    pub fn new(config: Config) -> Self {
        let store = SimulatedStateStore::open(&config.state_dir);
        Self {
            config,
            store,
            mounts: MountRegistry::new(),
        }
    }
}
