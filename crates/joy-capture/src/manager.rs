//! Camera resource lifecycle.
//!
//! Owns device acquisition and release and guarantees at most one active
//! capture session at a time. The manager is an explicitly owned object
//! (construct one per application, pass it to whichever game needs it);
//! the single-session invariant lives in its internal state, not in a
//! global.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use joy_ml_client::StatusLine;
use joy_models::RawFrame;

use crate::device::{CaptureDevice, CaptureProfile, VideoSource};
use crate::error::{CaptureResult, ResourceError};
use crate::preview::PreviewSink;

struct SessionInner {
    id: u64,
    created_at: DateTime<Utc>,
    active: AtomicBool,
    preview_attached: bool,
    profile: CaptureProfile,
    source: Mutex<Box<dyn VideoSource>>,
}

/// Handle to an acquired camera session.
///
/// Cheap to clone; all clones share the same underlying source and active
/// flag, so a `release()` through the manager is visible to every holder.
#[derive(Clone)]
pub struct CaptureSession {
    inner: Arc<SessionInner>,
}

impl CaptureSession {
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    pub fn preview_attached(&self) -> bool {
        self.inner.preview_attached
    }

    pub fn profile(&self) -> CaptureProfile {
        self.inner.profile
    }

    /// Grab one raw frame from the underlying source.
    pub fn grab(&self) -> CaptureResult<RawFrame> {
        if !self.is_active() {
            return Err(ResourceError::frame("session released"));
        }
        let mut source = self
            .inner
            .source
            .lock()
            .map_err(|_| ResourceError::frame("video source lock poisoned"))?;
        source.grab_frame()
    }

    fn dimensions(&self) -> (u32, u32) {
        self.inner
            .source
            .lock()
            .map(|source| source.dimensions())
            .unwrap_or((0, 0))
    }

    /// Flip the session inactive and stop device tracks. Idempotent.
    fn deactivate(&self) {
        if self.inner.active.swap(false, Ordering::SeqCst) {
            if let Ok(mut source) = self.inner.source.lock() {
                source.stop();
            }
        }
    }
}

/// Acquires and releases the camera, enforcing the single-active-session
/// invariant.
pub struct CameraManager {
    device: Arc<dyn CaptureDevice>,
    preview: Arc<dyn PreviewSink>,
    acquisition_timeout: Duration,
    session: Option<CaptureSession>,
    next_session_id: u64,
}

impl CameraManager {
    pub fn new(
        device: Arc<dyn CaptureDevice>,
        preview: Arc<dyn PreviewSink>,
        acquisition_timeout: Duration,
    ) -> Self {
        Self {
            device,
            preview,
            acquisition_timeout,
            session: None,
            next_session_id: 0,
        }
    }

    /// Acquire the camera, tearing down any prior session first.
    ///
    /// The preferred high-resolution profile is tried first; if the device
    /// rejects it the low profile is requested before giving up. The whole
    /// acquisition runs under a hard timeout. On failure no partial state
    /// remains: no running tracks, no attached preview.
    pub async fn acquire(&mut self, preview_requested: bool) -> CaptureResult<CaptureSession> {
        // re-entrant acquisition is legal: a restarting game acquires again
        self.release();

        let device = Arc::clone(&self.device);
        let acquisition = async {
            match device.acquire(&CaptureProfile::HIGH).await {
                Ok(source) => Ok((source, CaptureProfile::HIGH)),
                Err(e) => {
                    warn!(
                        device = device.name(),
                        "High-resolution profile rejected ({}), retrying with fallback", e
                    );
                    device
                        .acquire(&CaptureProfile::LOW)
                        .await
                        .map(|source| (source, CaptureProfile::LOW))
                }
            }
        };

        let (source, profile) =
            match tokio::time::timeout(self.acquisition_timeout, acquisition).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(ResourceError::AcquisitionTimeout(
                        self.acquisition_timeout.as_secs(),
                    ))
                }
            };

        self.next_session_id += 1;
        let session = CaptureSession {
            inner: Arc::new(SessionInner {
                id: self.next_session_id,
                created_at: Utc::now(),
                active: AtomicBool::new(true),
                preview_attached: preview_requested,
                profile,
                source: Mutex::new(source),
            }),
        };

        if preview_requested {
            let (width, height) = session.dimensions();
            self.preview.attach(width, height);
            self.preview.set_status(&StatusLine::looking());
        }

        info!(
            session_id = session.id(),
            width = profile.ideal_width,
            height = profile.ideal_height,
            "Camera session acquired"
        );
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Release the current session: stop device tracks, detach the preview,
    /// clear the active flag. Safe to call with no session (no-op) and safe
    /// to call repeatedly; release is reachable from explicit stop, host
    /// unload and caller teardown, all of which may race to be first.
    pub fn release(&mut self) {
        if let Some(session) = self.session.take() {
            session.deactivate();
            if session.preview_attached() {
                self.preview.detach();
            }
            info!(session_id = session.id(), "Camera session released");
        }
    }

    pub fn has_active_session(&self) -> bool {
        self.session.as_ref().is_some_and(CaptureSession::is_active)
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        self.release();
    }
}
