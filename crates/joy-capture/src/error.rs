//! Error types for camera resource management.

use thiserror::Error;

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, ResourceError>;

/// Errors that can occur while acquiring or driving the camera.
///
/// Any of these aborts pipeline start-up but must leave the rest of the game
/// playable: the caller disables emotion-driven features and carries on.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera device found")]
    DeviceNotFound,

    #[error("camera is in use by another application")]
    DeviceBusy,

    #[error("camera acquisition timed out after {0} seconds")]
    AcquisitionTimeout(u64),

    #[error("frame capture failed: {0}")]
    Frame(String),

    #[error("frame encoding failed: {0}")]
    Encode(String),
}

impl ResourceError {
    /// Create a frame capture error.
    pub fn frame(message: impl Into<String>) -> Self {
        Self::Frame(message.into())
    }

    /// Create a frame encoding error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }
}
