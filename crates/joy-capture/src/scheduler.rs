//! Capture scheduling.
//!
//! Drives the repeating capture-and-classify cycle against an acquired
//! session. Ticks are strictly sequential: the loop awaits each inference
//! call before the timer is polled again, and the timer skips missed ticks
//! instead of queueing them, so a slow service can never pile up concurrent
//! requests. Stopping bumps a generation counter; a tick already awaiting
//! the network settles normally but its result is discarded.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use joy_ml_client::{Classifier, StatusLine};

use crate::config::CaptureConfig;
use crate::encode::encode_jpeg;
use crate::manager::CaptureSession;
use crate::preview::PreviewSink;
use crate::smoother::EmotionSmoother;

#[derive(Default)]
struct SchedulerShared {
    /// Identifies the active loop; bumped on every start/stop so stale
    /// loops and in-flight results notice they have been superseded.
    generation: AtomicU64,
    interval_ms: AtomicU64,
    paused: AtomicBool,
    ticks: AtomicU64,
    skipped: AtomicU64,
    notify: Notify,
}

impl SchedulerShared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

/// Diagnostic snapshot of the scheduler.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub paused: bool,
    pub interval: Duration,
    /// Capture cycles run so far this session
    pub ticks: u64,
    /// Cadence slots skipped because inference overran the interval
    pub skipped: u64,
}

/// Repeating capture loop over one session.
pub struct CaptureScheduler {
    shared: Arc<SchedulerShared>,
    handle: Option<JoinHandle<()>>,
}

impl Default for CaptureScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureScheduler {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(SchedulerShared::default()),
            handle: None,
        }
    }

    /// Start the capture loop: one immediate validation cycle, a warm-up
    /// delay, then the steady cadence. A running loop is stopped first so
    /// there is never more than one timer per scheduler.
    pub fn start(
        &mut self,
        session: CaptureSession,
        classifier: Arc<dyn Classifier>,
        smoother: Arc<Mutex<EmotionSmoother>>,
        preview: Arc<dyn PreviewSink>,
        config: &CaptureConfig,
    ) {
        self.stop();

        let shared = Arc::clone(&self.shared);
        shared
            .interval_ms
            .store(config.interval.as_millis() as u64, Ordering::SeqCst);
        shared.paused.store(false, Ordering::SeqCst);
        shared.ticks.store(0, Ordering::SeqCst);
        shared.skipped.store(0, Ordering::SeqCst);
        let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            session_id = session.id(),
            classifier = classifier.name(),
            interval_ms = config.interval.as_millis() as u64,
            "Capture scheduler started"
        );

        let warmup = config.warmup;
        let quality = config.jpeg_quality;
        self.handle = Some(tokio::spawn(run_loop(
            generation, shared, session, classifier, smoother, preview, warmup, quality,
        )));
    }

    /// Change the cadence for subsequent ticks. The device session is
    /// untouched.
    pub fn set_interval(&self, interval: Duration) {
        self.shared
            .interval_ms
            .store(interval.as_millis().max(1) as u64, Ordering::SeqCst);
        self.shared.notify.notify_one();
        info!(interval_ms = interval.as_millis() as u64, "Capture interval changed");
    }

    /// Park the loop without releasing the device. Called on host
    /// visibility loss.
    pub fn pause(&self) {
        if !self.shared.paused.swap(true, Ordering::SeqCst) {
            info!("Capture paused");
        }
        self.shared.notify.notify_one();
    }

    /// Re-arm the timer at the last configured interval. Called when the
    /// host becomes visible again.
    pub fn resume(&self) {
        if self.shared.paused.swap(false, Ordering::SeqCst) {
            info!("Capture resumed");
        }
        self.shared.notify.notify_one();
    }

    /// End the loop. The device session is the caller's to release. Any
    /// in-flight inference settles but its result is discarded.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
            self.shared.notify.notify_one();
            if !handle.is_finished() {
                info!("Capture scheduler stopped");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.is_running(),
            paused: self.shared.paused.load(Ordering::SeqCst),
            interval: Duration::from_millis(self.shared.interval_ms.load(Ordering::SeqCst)),
            ticks: self.shared.ticks.load(Ordering::SeqCst),
            skipped: self.shared.skipped.load(Ordering::SeqCst),
        }
    }
}

impl Drop for CaptureScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn make_ticker(interval_ms: u64) -> tokio::time::Interval {
    let period = Duration::from_millis(interval_ms.max(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    // a tick that lands while inference is still in flight is dropped,
    // never queued
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

#[allow(clippy::too_many_arguments)]
async fn run_loop(
    generation: u64,
    shared: Arc<SchedulerShared>,
    session: CaptureSession,
    classifier: Arc<dyn Classifier>,
    smoother: Arc<Mutex<EmotionSmoother>>,
    preview: Arc<dyn PreviewSink>,
    warmup: Duration,
    quality: u8,
) {
    // immediate cycle validates camera, encoding and service end to end
    // before committing to a cadence
    run_tick(
        generation, &shared, &session, classifier.as_ref(), &smoother, preview.as_ref(), quality,
    )
    .await;

    tokio::time::sleep(warmup).await;

    let mut current_ms = shared.interval_ms.load(Ordering::SeqCst).max(1);
    let mut ticker = make_ticker(current_ms);

    loop {
        if !shared.is_current(generation) || !session.is_active() {
            break;
        }

        if shared.paused.load(Ordering::SeqCst) {
            shared.notify.notified().await;
            // re-arm so resume waits a full interval before the next tick
            current_ms = shared.interval_ms.load(Ordering::SeqCst).max(1);
            ticker = make_ticker(current_ms);
            continue;
        }

        tokio::select! {
            _ = ticker.tick() => {
                if !shared.is_current(generation) || !session.is_active() {
                    break;
                }
                if shared.paused.load(Ordering::SeqCst) {
                    continue;
                }
                run_tick(
                    generation, &shared, &session, classifier.as_ref(), &smoother,
                    preview.as_ref(), quality,
                )
                .await;
            }
            _ = shared.notify.notified() => {
                let interval_ms = shared.interval_ms.load(Ordering::SeqCst).max(1);
                if interval_ms != current_ms {
                    current_ms = interval_ms;
                    ticker = make_ticker(current_ms);
                }
            }
        }
    }

    debug!(generation, "Capture loop exited");
}

async fn run_tick(
    generation: u64,
    shared: &SchedulerShared,
    session: &CaptureSession,
    classifier: &dyn Classifier,
    smoother: &Mutex<EmotionSmoother>,
    preview: &dyn PreviewSink,
    quality: u8,
) {
    let started = Instant::now();
    shared.ticks.fetch_add(1, Ordering::SeqCst);

    let still_current = || shared.is_current(generation) && session.is_active();
    capture_cycle(session, classifier, smoother, preview, quality, &still_current).await;

    // account for cadence slots the service overran
    let interval_ms = shared.interval_ms.load(Ordering::SeqCst).max(1);
    let overrun = started.elapsed().as_millis() as u64 / interval_ms;
    if overrun > 0 {
        shared.skipped.fetch_add(overrun, Ordering::SeqCst);
        debug!(slots = overrun, "Inference overran the capture cadence");
    }
}

/// One capture-encode-classify-ingest cycle.
///
/// `still_current` is checked after the inference call settles; a result
/// belonging to a stopped scheduler or released session is discarded without
/// touching the smoother or the preview.
pub(crate) async fn capture_cycle(
    session: &CaptureSession,
    classifier: &dyn Classifier,
    smoother: &Mutex<EmotionSmoother>,
    preview: &dyn PreviewSink,
    quality: u8,
    still_current: &dyn Fn() -> bool,
) {
    let raw = match session.grab() {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Frame grab failed: {}", e);
            return;
        }
    };

    let frame = match encode_jpeg(&raw, quality) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Frame encoding failed: {}", e);
            return;
        }
    };

    let outcome = classifier.classify(&frame).await;

    if !still_current() {
        debug!("Discarding classification result for superseded session");
        return;
    }

    preview.set_status(&StatusLine::for_outcome(&outcome));

    match outcome {
        Ok(prediction) => match prediction.into_sample() {
            Ok((sample, probs)) => {
                if let Ok(mut smoother) = smoother.lock() {
                    smoother.ingest(sample, probs);
                }
            }
            Err(e) => warn!("Invalid prediction: {}", e),
        },
        Err(e) if e.is_expected() => debug!("No sample this tick: {}", e),
        Err(e) => warn!("Classification failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use joy_ml_client::{InferenceResult, Prediction};
    use joy_models::{Frame, RawFrame};

    use crate::config::SmootherConfig;
    use crate::device::{CaptureDevice, CaptureProfile, VideoSource};
    use crate::error::CaptureResult;
    use crate::manager::CameraManager;
    use crate::preview::NullPreview;

    use super::*;

    struct FakeSource;

    impl VideoSource for FakeSource {
        fn grab_frame(&mut self) -> CaptureResult<RawFrame> {
            Ok(RawFrame::new(4, 4, vec![100; 48]))
        }

        fn dimensions(&self) -> (u32, u32) {
            (4, 4)
        }

        fn stop(&mut self) {}
    }

    struct FakeDevice;

    #[async_trait]
    impl CaptureDevice for FakeDevice {
        async fn acquire(&self, _profile: &CaptureProfile) -> CaptureResult<Box<dyn VideoSource>> {
            Ok(Box::new(FakeSource))
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    /// Classifier that sleeps for a configured delay and records call and
    /// concurrency counts.
    struct SlowClassifier {
        delay: Duration,
        calls: Arc<AtomicUsize>,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl SlowClassifier {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                calls: Arc::new(AtomicUsize::new(0)),
                in_flight: Arc::new(AtomicUsize::new(0)),
                max_in_flight: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl Classifier for SlowClassifier {
        async fn classify(&self, _frame: &Frame) -> InferenceResult<Prediction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let concurrent = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(concurrent, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Prediction {
                emotion: "happiness".to_string(),
                confidence: 0.8,
                probs: None,
                note: None,
            })
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    async fn test_session() -> (CameraManager, crate::manager::CaptureSession) {
        let mut manager = CameraManager::new(
            Arc::new(FakeDevice),
            Arc::new(NullPreview),
            Duration::from_secs(10),
        );
        let session = manager.acquire(false).await.unwrap();
        (manager, session)
    }

    fn test_smoother() -> Arc<Mutex<EmotionSmoother>> {
        Arc::new(Mutex::new(EmotionSmoother::new(SmootherConfig::default())))
    }

    fn config(interval_ms: u64, warmup_ms: u64) -> CaptureConfig {
        CaptureConfig {
            interval: Duration::from_millis(interval_ms),
            warmup: Duration::from_millis(warmup_ms),
            ..CaptureConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_inference_skips_ticks_never_overlaps() {
        let (_manager, session) = test_session().await;
        let classifier = Arc::new(SlowClassifier::new(Duration::from_secs(5)));
        let calls = Arc::clone(&classifier.calls);
        let max_in_flight = Arc::clone(&classifier.max_in_flight);

        let mut scheduler = CaptureScheduler::new();
        scheduler.start(
            session,
            classifier,
            test_smoother(),
            Arc::new(NullPreview),
            &config(2000, 2000),
        );

        tokio::time::sleep(Duration::from_secs(42)).await;
        scheduler.stop();

        // never two classify calls in flight at once
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        // 42s of 2s cadence is at most 21 slots; 5s inference must skip most
        let total = calls.load(Ordering::SeqCst);
        assert!(total <= 21, "expected skipped ticks, saw {total} calls");
        assert!(total >= 4, "loop appears stalled, saw {total} calls");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_suppresses_ticks_and_resume_rearms() {
        let (_manager, session) = test_session().await;
        let classifier = Arc::new(SlowClassifier::new(Duration::from_millis(1)));
        let calls = Arc::clone(&classifier.calls);

        let mut scheduler = CaptureScheduler::new();
        scheduler.start(
            session.clone(),
            classifier,
            test_smoother(),
            Arc::new(NullPreview),
            &config(2000, 0),
        );

        // immediate validation cycle
        tokio::time::sleep(Duration::from_millis(100)).await;
        let after_first = calls.load(Ordering::SeqCst);
        assert_eq!(after_first, 1);

        scheduler.pause();
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_first, "paused loop must not tick");
        // pause leaves the device session untouched
        assert!(session.is_active());

        scheduler.resume();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(calls.load(Ordering::SeqCst) > after_first);
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_interval_changes_cadence() {
        let (_manager, session) = test_session().await;
        let classifier = Arc::new(SlowClassifier::new(Duration::from_millis(1)));
        let calls = Arc::clone(&classifier.calls);

        let mut scheduler = CaptureScheduler::new();
        scheduler.start(
            session,
            classifier,
            test_smoother(),
            Arc::new(NullPreview),
            &config(2000, 0),
        );

        tokio::time::sleep(Duration::from_secs(8)).await;
        let at_slow = calls.load(Ordering::SeqCst);

        scheduler.set_interval(Duration::from_millis(500));
        assert_eq!(scheduler.status().interval, Duration::from_millis(500));

        tokio::time::sleep(Duration::from_secs(8)).await;
        let at_fast = calls.load(Ordering::SeqCst);

        // 8s at 2s yields ~4 ticks; 8s at 500ms yields ~16
        assert!(at_fast - at_slow > at_slow, "cadence change had no effect");
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_in_flight_result() {
        let (_manager, session) = test_session().await;
        let classifier = Arc::new(SlowClassifier::new(Duration::from_secs(5)));
        let smoother = test_smoother();

        let mut scheduler = CaptureScheduler::new();
        scheduler.start(
            session,
            classifier,
            Arc::clone(&smoother),
            Arc::new(NullPreview),
            &config(2000, 0),
        );

        // let the immediate cycle get in flight, then stop under it
        tokio::time::sleep(Duration::from_millis(500)).await;
        scheduler.stop();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let smoother = smoother.lock().unwrap();
        assert!(smoother.current().is_none(), "stale result must be discarded");
        assert_eq!(smoother.history_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_running_loop() {
        let (_manager, session) = test_session().await;
        let classifier = Arc::new(SlowClassifier::new(Duration::from_millis(1)));
        let calls = Arc::clone(&classifier.calls);

        let mut scheduler = CaptureScheduler::new();
        scheduler.start(
            session.clone(),
            Arc::clone(&classifier) as Arc<dyn Classifier>,
            test_smoother(),
            Arc::new(NullPreview),
            &config(1000, 0),
        );
        tokio::time::sleep(Duration::from_millis(100)).await;

        // second start stops the first loop: no duplicate timers
        scheduler.start(
            session,
            classifier,
            test_smoother(),
            Arc::new(NullPreview),
            &config(1000, 0),
        );
        tokio::time::sleep(Duration::from_secs(4)).await;
        scheduler.stop();
        tokio::time::sleep(Duration::from_secs(1)).await;

        // one loop at 1s for ~4s plus two immediate cycles
        let total = calls.load(Ordering::SeqCst);
        assert!(total <= 8, "duplicate timers running, saw {total} calls");
    }
}
