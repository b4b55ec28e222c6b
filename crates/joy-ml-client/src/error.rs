//! Inference client error types.

use thiserror::Error;

pub type InferenceResult<T> = Result<T, InferenceError>;

#[derive(Debug, Error)]
pub enum InferenceError {
    /// The service found no face in the frame (HTTP 400). An expected,
    /// recoverable outcome: the subject just is not positioned yet.
    #[error("no face detected in frame")]
    NoFaceDetected,

    #[error("inference request timed out after {0} seconds")]
    Timeout(u64),

    #[error("emotion service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("invalid service response: {0}")]
    InvalidResponse(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InferenceError {
    /// Whether this failure is part of normal operation rather than a
    /// service or transport problem.
    pub fn is_expected(&self) -> bool {
        matches!(self, InferenceError::NoFaceDetected)
    }
}
