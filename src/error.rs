//! Error types for devhub

use std::path::PathBuf;
use thiserror::Error;

/// Result type for devhub operations
pub type Result<T> = std::result::Result<T, DevhubError>;

/// devhub error types
#[derive(Error, Debug)]
pub enum DevhubError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown command '{0}'. Type 'h' for help.")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid workspace name '{0}': use 1-63 lowercase letters, digits or '-', not starting or ending with '-'")]
    InvalidWorkspaceName(String),

    #[error("Container '{0}' not found.")]
    ContainerNotFound(String),

    #[error("Container '{0}' already exists.")]
    ContainerExists(String),

    #[error("Docker image '{0}' not found. Try: docker pull {0}")]
    ImageNotFound(String),

    #[error("Docker API error: {0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
