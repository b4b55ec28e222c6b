//! Platform capture device seam.
//!
//! The core never talks to a camera API directly. Hosts implement
//! [`CaptureDevice`] for their platform (browser media stack, V4L2, test
//! fakes) and the lifecycle manager drives it through these traits.

use async_trait::async_trait;

use joy_models::RawFrame;

use crate::error::CaptureResult;

/// A requested capture profile. Dimensions and frame rate are ideals, not
/// exact constraints; the device returns the closest mode it supports or
/// rejects the request outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureProfile {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub min_frame_rate: u32,
}

impl CaptureProfile {
    /// Preferred profile, tried first on every acquisition.
    pub const HIGH: CaptureProfile = CaptureProfile {
        ideal_width: 1280,
        ideal_height: 720,
        min_frame_rate: 15,
    };

    /// Fallback profile for devices that reject the preferred one.
    pub const LOW: CaptureProfile = CaptureProfile {
        ideal_width: 640,
        ideal_height: 480,
        min_frame_rate: 15,
    };
}

/// A live video source produced by a successful acquisition.
pub trait VideoSource: Send + Sync {
    /// Grab the most recent frame as tightly packed RGB24.
    fn grab_frame(&mut self) -> CaptureResult<RawFrame>;

    /// Actual dimensions the device settled on.
    fn dimensions(&self) -> (u32, u32);

    /// Stop all underlying device tracks. Must be idempotent.
    fn stop(&mut self);
}

/// Platform camera access.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Request the camera with the given profile. Resolves once the device
    /// yields a usable video source, or fails with a typed error. On failure
    /// the implementation must not leave any track running.
    async fn acquire(&self, profile: &CaptureProfile) -> CaptureResult<Box<dyn VideoSource>>;

    /// Implementation name for logging.
    fn name(&self) -> &'static str;
}
