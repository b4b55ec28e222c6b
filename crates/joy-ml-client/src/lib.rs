//! HTTP client for the Python ViT emotion inference service.
//!
//! This crate provides:
//! - Multipart frame upload to `POST /predict`
//! - Liveness probing via `GET /test`
//! - Typed failure taxonomy (timeout, no face, service error, network)
//! - The `Classifier` seam the capture scheduler runs against
//!
//! There is deliberately no retry logic here: a failed classification simply
//! yields no sample for that capture tick, and the next tick is the retry.

pub mod client;
pub mod error;
pub mod types;

pub use client::{Classifier, EmotionClient, EmotionClientConfig};
pub use error::{InferenceError, InferenceResult};
pub use types::{LivenessResponse, Prediction, StatusLine};
