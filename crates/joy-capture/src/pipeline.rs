//! Affect pipeline facade.
//!
//! Wires the lifecycle manager, scheduler, smoother and classifier into the
//! flow games actually use: acquire the camera, run the capture loop, feed
//! accepted emotions to one callback, and tear everything down from any
//! exit path.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use joy_ml_client::{Classifier, EmotionClient, InferenceResult};
use joy_models::{EmotionLabel, EmotionSample, Theme};

use crate::config::CaptureConfig;
use crate::device::CaptureDevice;
use crate::error::{CaptureResult, ResourceError};
use crate::manager::CameraManager;
use crate::preview::PreviewSink;
use crate::scheduler::{capture_cycle, CaptureScheduler, SchedulerStatus};
use crate::smoother::{EmotionCallback, EmotionSmoother};

/// Snapshot of the whole pipeline for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatus {
    pub scheduler: SchedulerStatus,
    pub session_active: bool,
    pub session_id: Option<u64>,
    pub current: Option<EmotionSample>,
    pub dominant: Option<EmotionLabel>,
}

/// The affect-capture pipeline.
///
/// Owns the camera for the duration of a session. Construct one per
/// application and hand it to whichever game is running; `start` is
/// re-entrant (a restarting game simply starts again) and `stop` is safe
/// from every teardown path.
pub struct AffectPipeline {
    config: CaptureConfig,
    manager: CameraManager,
    scheduler: CaptureScheduler,
    classifier: Arc<dyn Classifier>,
    smoother: Arc<Mutex<EmotionSmoother>>,
    preview: Arc<dyn PreviewSink>,
}

impl AffectPipeline {
    pub fn new(
        device: Arc<dyn CaptureDevice>,
        classifier: Arc<dyn Classifier>,
        preview: Arc<dyn PreviewSink>,
        config: CaptureConfig,
    ) -> Self {
        let manager = CameraManager::new(device, Arc::clone(&preview), config.acquisition_timeout);
        let smoother = Arc::new(Mutex::new(EmotionSmoother::new(config.smoother.clone())));
        Self {
            config,
            manager,
            scheduler: CaptureScheduler::new(),
            classifier,
            smoother,
            preview,
        }
    }

    /// Build a pipeline from environment configuration, talking to the
    /// standard HTTP classifier.
    pub fn from_env(
        device: Arc<dyn CaptureDevice>,
        preview: Arc<dyn PreviewSink>,
    ) -> InferenceResult<Self> {
        let client = EmotionClient::from_env()?;
        Ok(Self::new(
            device,
            Arc::new(client),
            preview,
            CaptureConfig::from_env(),
        ))
    }

    /// Acquire the camera and start the capture loop, delivering accepted
    /// emotions to `callback`.
    ///
    /// A fresh smoother is created per session: history never leaks across
    /// sessions. On resource failure nothing is left running and the error
    /// surfaces so the host can disable emotion features while the game
    /// itself keeps working.
    pub async fn start(&mut self, callback: EmotionCallback) -> CaptureResult<()> {
        // stop any prior loop before its session is torn down
        self.scheduler.stop();

        let mut smoother = EmotionSmoother::new(self.config.smoother.clone());
        smoother.set_callback(callback);
        self.smoother = Arc::new(Mutex::new(smoother));

        let session = self.manager.acquire(self.config.preview).await?;
        self.scheduler.start(
            session,
            Arc::clone(&self.classifier),
            Arc::clone(&self.smoother),
            Arc::clone(&self.preview),
            &self.config,
        );
        Ok(())
    }

    /// Run one capture cycle outside the timer. Requires a started session.
    pub async fn capture_once(&self) -> CaptureResult<()> {
        let session = self
            .manager
            .session()
            .cloned()
            .ok_or_else(|| ResourceError::frame("no active session"))?;
        let guard_session = session.clone();
        let still_current = move || guard_session.is_active();
        capture_cycle(
            &session,
            self.classifier.as_ref(),
            &self.smoother,
            self.preview.as_ref(),
            self.config.jpeg_quality,
            &still_current,
        )
        .await;
        Ok(())
    }

    /// Pause ticking without releasing the camera (host surface hidden).
    pub fn pause(&self) {
        self.scheduler.pause();
    }

    /// Resume ticking at the configured cadence (host surface visible).
    pub fn resume(&self) {
        self.scheduler.resume();
    }

    pub fn set_interval(&self, interval: Duration) {
        self.scheduler.set_interval(interval);
    }

    /// Reaction-heavy games poll faster.
    pub fn fast_mode(&self) {
        info!("Fast mode enabled");
        self.scheduler.set_interval(self.config.fast_interval);
    }

    pub fn normal_mode(&self) {
        info!("Normal mode enabled");
        self.scheduler.set_interval(self.config.interval);
    }

    /// Stop the loop and release the camera. Idempotent; also runs on drop,
    /// so every exit path gives the device back.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.manager.release();
    }

    /// The last accepted sample, if any.
    pub fn current_emotion(&self) -> Option<EmotionSample> {
        self.smoother
            .lock()
            .ok()
            .and_then(|smoother| smoother.current().cloned())
    }

    /// Mode emotion over the recent history window.
    pub fn dominant_emotion(&self) -> Option<EmotionLabel> {
        self.smoother
            .lock()
            .ok()
            .and_then(|smoother| smoother.dominant_emotion())
    }

    /// Presentation theme for the current emotion. Total: with no accepted
    /// sample yet this is the neutral theme.
    pub fn theme(&self) -> &'static Theme {
        Theme::for_label(self.current_emotion().map(|sample| sample.label))
    }

    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            scheduler: self.scheduler.status(),
            session_active: self.manager.has_active_session(),
            session_id: self.manager.session().map(|session| session.id()),
            current: self.current_emotion(),
            dominant: self.dominant_emotion(),
        }
    }
}
