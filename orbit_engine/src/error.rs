//! Error types for the Orbit engine
//!
//! This module defines the error types used throughout the engine,
//! including device drivers, resource layout and the scene graph.

use std::fmt;

/// Result type for Orbit engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Orbit engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (OpenGL, DirectX11, headless, etc.)
    BackendError(String),

    /// Invalid resource (texture, buffer, shader, etc.)
    InvalidResource(String),

    /// Initialization failed (screen, video driver, subsystems)
    InitializationFailed(String),

    /// An operation was called in a state that forbids it
    /// (e.g. changing a vertex layout once storage is allocated)
    InvalidState(String),

    /// A value does not fit the configured storage (index width, buffer size)
    CapacityOverflow(String),

    /// A named item (file, directory, node, entry) does not exist
    NotFound(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::CapacityOverflow(msg) => write!(f, "Capacity overflow: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
