// FILE: src/core/mod.rs
pub mod image_probe;
pub mod mount_registry;
pub mod package_ref;
pub mod state_key;
pub mod target;

pub use mount_registry::{MountRecord, MountRegistry, MountStatus};
pub use package_ref::{package_name, PackageRef};
pub use state_key::{OperationClass, StateKey};
pub use target::Target;
