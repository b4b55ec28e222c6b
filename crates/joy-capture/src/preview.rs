//! Preview surface seam.
//!
//! The pipeline can optionally show the live camera feed with a status
//! readout so the subject can position themselves. Presentation belongs to
//! the host: the core only pushes state through this narrow capability
//! interface and never builds UI itself.

use joy_ml_client::StatusLine;

/// A host-provided preview surface.
///
/// Implementations are shared between the lifecycle manager (attach/detach)
/// and the scheduler (status updates), so methods take `&self`; hosts use
/// interior mutability as needed.
pub trait PreviewSink: Send + Sync {
    /// The camera session came up with the given frame dimensions.
    fn attach(&self, width: u32, height: u32);

    /// Latest classification outcome, human-readable.
    fn set_status(&self, status: &StatusLine);

    /// The camera session ended; discard the surface.
    fn detach(&self);
}

/// No-op preview for headless hosts and tests.
#[derive(Debug, Default)]
pub struct NullPreview;

impl PreviewSink for NullPreview {
    fn attach(&self, _width: u32, _height: u32) {}

    fn set_status(&self, _status: &StatusLine) {}

    fn detach(&self) {}
}
