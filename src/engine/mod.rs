// FILE: src/engine/mod.rs
pub mod command;
pub mod delegate;
pub mod report;
pub mod router;
pub mod strategy;

pub use command::NativeCommand;
pub use delegate::{NativeTool, ToolOutcome, ToolOutput, ToolRunner};
pub use report::Report;
pub use router::{merge_with_reference, ListedItem, ServicingRouter};
pub use strategy::{Execution, Strategy};
