//! End-to-end pipeline flows against fake devices and classifiers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use joy_capture::{
    AffectPipeline, CaptureConfig, CaptureDevice, CaptureProfile, CaptureResult, NullPreview,
    PreviewSink, ResourceError, VideoSource,
};
use joy_ml_client::{Classifier, InferenceResult, Prediction, StatusLine};
use joy_models::{EmotionLabel, EmotionUpdate, Frame, RawFrame};

struct FakeSource {
    stops: Arc<AtomicUsize>,
    stopped: bool,
}

impl VideoSource for FakeSource {
    fn grab_frame(&mut self) -> CaptureResult<RawFrame> {
        Ok(RawFrame::new(8, 8, vec![90; 8 * 8 * 3]))
    }

    fn dimensions(&self) -> (u32, u32) {
        (8, 8)
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[derive(Default)]
struct FakeDevice {
    stops: Arc<AtomicUsize>,
    deny: bool,
}

#[async_trait]
impl CaptureDevice for FakeDevice {
    async fn acquire(&self, _profile: &CaptureProfile) -> CaptureResult<Box<dyn VideoSource>> {
        if self.deny {
            return Err(ResourceError::PermissionDenied);
        }
        Ok(Box::new(FakeSource {
            stops: Arc::clone(&self.stops),
            stopped: false,
        }))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct ScriptedClassifier {
    emotion: &'static str,
    confidence: f32,
    delay: Duration,
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, _frame: &Frame) -> InferenceResult<Prediction> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Prediction {
            emotion: self.emotion.to_string(),
            confidence: self.confidence,
            probs: None,
            note: None,
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[derive(Default)]
struct RecordingPreview {
    events: Mutex<Vec<String>>,
}

impl RecordingPreview {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl PreviewSink for RecordingPreview {
    fn attach(&self, width: u32, height: u32) {
        self.events.lock().unwrap().push(format!("attach {width}x{height}"));
    }

    fn set_status(&self, status: &StatusLine) {
        self.events.lock().unwrap().push(format!("status {}", status.text));
    }

    fn detach(&self) {
        self.events.lock().unwrap().push("detach".to_string());
    }
}

fn collecting_callback() -> (Arc<Mutex<Vec<EmotionUpdate>>>, joy_capture::EmotionCallback) {
    let updates: Arc<Mutex<Vec<EmotionUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updates);
    let callback: joy_capture::EmotionCallback = Arc::new(move |update: EmotionUpdate| {
        sink.lock().unwrap().push(update);
    });
    (updates, callback)
}

fn quick_config() -> CaptureConfig {
    CaptureConfig {
        interval: Duration::from_millis(2000),
        warmup: Duration::from_millis(2000),
        ..CaptureConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn first_tick_fires_callback_once_then_stop_silences() {
    let device = Arc::new(FakeDevice::default());
    let classifier = Arc::new(ScriptedClassifier {
        emotion: "happiness",
        confidence: 0.8,
        delay: Duration::ZERO,
    });
    let mut pipeline = AffectPipeline::new(
        device,
        classifier,
        Arc::new(NullPreview),
        quick_config(),
    );

    let (updates, callback) = collecting_callback();
    pipeline.start(callback).await.unwrap();

    // the immediate validation cycle delivers the first emotion
    tokio::time::sleep(Duration::from_millis(100)).await;
    {
        let updates = updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].sample.label, EmotionLabel::Happiness);
        assert!((updates[0].sample.confidence - 0.8).abs() < f32::EPSILON);
    }
    assert_eq!(pipeline.theme().name, "Happy Sunshine");

    pipeline.stop();
    assert!(!pipeline.status().session_active);

    // the dead loop must deliver nothing more
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(updates.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stale_in_flight_response_is_discarded_after_stop() {
    let device = Arc::new(FakeDevice::default());
    let classifier = Arc::new(ScriptedClassifier {
        emotion: "happiness",
        confidence: 0.9,
        delay: Duration::from_secs(5),
    });
    let mut pipeline = AffectPipeline::new(
        device,
        classifier,
        Arc::new(NullPreview),
        quick_config(),
    );

    let (updates, callback) = collecting_callback();
    pipeline.start(callback).await.unwrap();

    // stop while the first classification is still in flight
    tokio::time::sleep(Duration::from_secs(1)).await;
    pipeline.stop();

    // let the in-flight call settle; its result must be ignored
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(updates.lock().unwrap().is_empty());
    assert!(pipeline.current_emotion().is_none());
}

#[tokio::test(start_paused = true)]
async fn resource_failure_fails_soft() {
    let device = Arc::new(FakeDevice {
        deny: true,
        ..FakeDevice::default()
    });
    let classifier = Arc::new(ScriptedClassifier {
        emotion: "neutral",
        confidence: 0.5,
        delay: Duration::ZERO,
    });
    let mut pipeline = AffectPipeline::new(
        device,
        classifier,
        Arc::new(NullPreview),
        quick_config(),
    );

    let (updates, callback) = collecting_callback();
    let err = pipeline.start(callback).await.unwrap_err();

    assert!(matches!(err, ResourceError::PermissionDenied));
    let status = pipeline.status();
    assert!(!status.session_active);
    assert!(!status.scheduler.running);
    assert!(updates.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn restart_keeps_exactly_one_session_active() {
    let device = Arc::new(FakeDevice::default());
    let stops = Arc::clone(&device.stops);
    let classifier = Arc::new(ScriptedClassifier {
        emotion: "happiness",
        confidence: 0.8,
        delay: Duration::ZERO,
    });
    let mut pipeline = AffectPipeline::new(
        device,
        classifier,
        Arc::new(NullPreview),
        quick_config(),
    );

    let (_first_updates, first_callback) = collecting_callback();
    pipeline.start(first_callback).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let first_id = pipeline.status().session_id.unwrap();

    let (_second_updates, second_callback) = collecting_callback();
    pipeline.start(second_callback).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let status = pipeline.status();
    assert!(status.session_active);
    assert_ne!(status.session_id.unwrap(), first_id);
    // the first session's tracks were stopped, and only once
    assert_eq!(stops.load(Ordering::SeqCst), 1);

    // a restart also resets smoothing state: fresh session, fresh history
    assert_eq!(status.scheduler.ticks, 1);

    pipeline.stop();
    assert_eq!(stops.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn preview_sees_attach_status_and_detach() {
    let device = Arc::new(FakeDevice::default());
    let classifier = Arc::new(ScriptedClassifier {
        emotion: "happiness",
        confidence: 0.8,
        delay: Duration::ZERO,
    });
    let preview = Arc::new(RecordingPreview::default());
    let config = CaptureConfig {
        preview: true,
        ..quick_config()
    };
    let mut pipeline = AffectPipeline::new(device, classifier, Arc::clone(&preview), config);

    let (_updates, callback) = collecting_callback();
    pipeline.start(callback).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    pipeline.stop();

    let events = preview.events();
    assert_eq!(events[0], "attach 8x8");
    assert_eq!(events[1], "status Looking for face...");
    assert!(events.contains(&"status Detected happiness (80%)".to_string()));
    assert_eq!(events.last().unwrap(), "detach");
}

#[tokio::test]
async fn full_stack_against_mocked_service() {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "emotion": "surprise",
            "confidence": 0.74,
            "probs": { "surprise": 0.74, "neutral": 0.26 }
        })))
        .mount(&server)
        .await;

    let client = joy_ml_client::EmotionClient::new(joy_ml_client::EmotionClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(2),
        debug: false,
    })
    .unwrap();

    let device = Arc::new(FakeDevice::default());
    let config = CaptureConfig {
        interval: Duration::from_millis(100),
        warmup: Duration::ZERO,
        ..CaptureConfig::default()
    };
    let mut pipeline =
        AffectPipeline::new(device, Arc::new(client), Arc::new(NullPreview), config);

    let (updates, callback) = collecting_callback();
    pipeline.start(callback).await.unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;
    pipeline.stop();

    let updates = updates.lock().unwrap();
    assert!(!updates.is_empty());
    assert_eq!(updates[0].sample.label, EmotionLabel::Surprise);
    let probs = updates[0].probs.as_ref().unwrap();
    assert!((probs[&EmotionLabel::Surprise] - 0.74).abs() < f32::EPSILON);
}
