//! DISMv2: servicing front end with a simulation fallback
//!
//! Mirrors the argument surface of the Windows DISM tool. Each operation is
//! routed through one of two strategies:
//! - Native delegate (spawns the real tool, captures its output)
//! - Simulation (file-persisted feature/package state under a scratch directory)
//!
//! Simulated changes survive across invocations, so a feature enabled in one
//! run shows up as enabled in the next query against the same target.

pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod state;
pub mod storage;

pub use config::{Config, LogLevel};
pub use error::{Result, ServicingError};
pub use state::ServicingContext;
pub use engine::{Report, ServicingRouter, ToolOutcome, ToolRunner};
// Export the common storage types
pub use storage::{ItemMap, ItemRecord, ItemState, Removal, SimulatedStateStore};
pub use crate::core::{MountRecord, MountRegistry, OperationClass, PackageRef, StateKey, Target};
