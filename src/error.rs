//! Error types for DISMv2

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServicingError {
    #[error("{0}")]
    InputValidation(String),

    #[error("Image file not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    #[error("No image mounted at {}", .0.display())]
    NotMounted(PathBuf),

    #[error("Failed to {operation}: {stderr}")]
    ToolInvocation {
        operation: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServicingError {
    /// True for errors caused by the request itself (missing option, missing
    /// source file, unmounted path). These abort before any state changes.
    pub fn is_input_validation(&self) -> bool {
        matches!(
            self,
            ServicingError::InputValidation(_)
                | ServicingError::ImageNotFound(_)
                | ServicingError::NotMounted(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ServicingError>;
