use std::io;
use thiserror::Error;

/// Custom error type for cputemp
#[derive(Error, Debug)]
pub enum CpuTempError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Endpoint error: {0}")]
    Endpoint(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

/// Result type alias for cputemp
pub type Result<T> = std::result::Result<T, CpuTempError>;

impl CpuTempError {
    /// Create a permission denied error
    pub fn permission_denied<S: Into<String>>(msg: S) -> Self {
        CpuTempError::PermissionDenied(msg.into())
    }

    pub fn endpoint<S: Into<String>>(msg: S) -> Self {
        CpuTempError::Endpoint(msg.into())
    }

    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        CpuTempError::Protocol(msg.into())
    }

    pub fn unsupported_platform<S: Into<String>>(msg: S) -> Self {
        CpuTempError::UnsupportedPlatform(msg.into())
    }
}
