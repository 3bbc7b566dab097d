//! Error types for the Rendan engine
//!
//! The variants follow the renderer's failure taxonomy: setup failures are fatal,
//! shader failures are fatal at pipeline creation, stale swapchains are recovered
//! locally by the frame orchestrator and hard submit/present failures are fatal.

use std::fmt;

/// Result type for Rendan engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Rendan engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Unrecoverable setup failure (missing layer/extension, no suitable device,
    /// GPU object creation failure)
    InitError(String),

    /// Shader load, validation or reflection failure
    ShaderError(String),

    /// Swapchain is out of date or suboptimal; the frame is skipped and the
    /// swapchain rebuilt
    TransientPresentError(String),

    /// Hard queue submit/present failure (device lost, API misuse)
    RuntimeSubmitError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource or argument (bad index, wrong state, malformed data)
    InvalidResource(String),
}

impl Error {
    /// True for errors the frame orchestrator recovers from by rebuilding the swapchain
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::TransientPresentError(_))
    }

    /// True for errors that must abort the caller (everything except transient ones)
    pub fn is_fatal(&self) -> bool {
        !self.is_transient()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InitError(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ShaderError(msg) => write!(f, "Shader error: {}", msg),
            Error::TransientPresentError(msg) => write!(f, "Swapchain out of date: {}", msg),
            Error::RuntimeSubmitError(msg) => write!(f, "GPU submission failed: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
