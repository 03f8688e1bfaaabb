//! Error types shared across the engine crates.

use thiserror::Error;

/// Top-level error type for engine and platform failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Vulkan-related errors surfaced across crate boundaries
    #[error("Vulkan error: {0}")]
    Vulkan(String),

    /// Window creation or surface errors
    #[error("Window error: {0}")]
    Window(String),

    /// Shader blob loading errors
    #[error("Shader error: {0}")]
    Shader(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using the engine's Error type.
pub type Result<T> = std::result::Result<T, Error>;
