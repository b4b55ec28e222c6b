//! Camera lifecycle, capture scheduling and emotion smoothing.
//!
//! This crate provides:
//! - A platform seam for camera access (`CaptureDevice`/`VideoSource`)
//! - Exclusive camera ownership with idempotent release (`CameraManager`)
//! - The repeating capture-and-classify loop (`CaptureScheduler`), with
//!   strict anti-overlap, pause/resume and live cadence changes
//! - Gated smoothing of noisy classifications (`EmotionSmoother`)
//! - A preview capability seam (`PreviewSink`)
//! - The `AffectPipeline` facade games build on

pub mod config;
pub mod device;
pub mod encode;
pub mod error;
pub mod manager;
pub mod pipeline;
pub mod preview;
pub mod scheduler;
pub mod smoother;

pub use config::{CaptureConfig, SmootherConfig};
pub use device::{CaptureDevice, CaptureProfile, VideoSource};
pub use encode::encode_jpeg;
pub use error::{CaptureResult, ResourceError};
pub use manager::{CameraManager, CaptureSession};
pub use pipeline::{AffectPipeline, PipelineStatus};
pub use preview::{NullPreview, PreviewSink};
pub use scheduler::{CaptureScheduler, SchedulerStatus};
pub use smoother::{EmotionCallback, EmotionSmoother};
