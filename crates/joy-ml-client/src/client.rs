//! Emotion service HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, warn};

use joy_models::Frame;

use crate::error::{InferenceError, InferenceResult};
use crate::types::{LivenessResponse, Prediction};

/// Configuration for the emotion client.
#[derive(Debug, Clone)]
pub struct EmotionClientConfig {
    /// Base URL of the inference service
    pub base_url: String,
    /// Hard per-request timeout
    pub timeout: Duration,
    /// Ask the service to keep debug artifacts for each frame
    pub debug: bool,
}

impl Default for EmotionClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(10),
            debug: false,
        }
    }
}

impl EmotionClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("JOY_ML_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("JOY_ML_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            debug: std::env::var("JOY_ML_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Classification seam the capture scheduler runs against.
///
/// [`EmotionClient`] is the production implementation; tests substitute
/// slow or scripted fakes.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify one encoded frame.
    async fn classify(&self, frame: &Frame) -> InferenceResult<Prediction>;

    /// Implementation name for logging.
    fn name(&self) -> &'static str;
}

/// Client for the Python ViT emotion service.
pub struct EmotionClient {
    http: Client,
    config: EmotionClientConfig,
}

impl EmotionClient {
    /// Create a new emotion client.
    pub fn new(config: EmotionClientConfig) -> InferenceResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(InferenceError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> InferenceResult<Self> {
        Self::new(EmotionClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Probe `GET /test` and return the service's greeting.
    ///
    /// Called once before a capture session starts so connectivity problems
    /// surface up front instead of as a string of failed ticks.
    pub async fn liveness(&self) -> InferenceResult<String> {
        let url = format!("{}/test", self.config.base_url);

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(InferenceError::Timeout(self.config.timeout.as_secs()))
            }
            Err(e) => return Err(InferenceError::Network(e)),
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("Emotion service liveness probe failed: {}", status);
            return Err(InferenceError::Service { status, body });
        }

        let liveness: LivenessResponse = response.json().await?;
        Ok(liveness.message)
    }

    /// Submit one frame to `POST /predict`.
    ///
    /// The frame is uploaded as a single multipart file field; an optional
    /// `debug` field is added when configured. A 400 whose body names a
    /// missing face maps to [`InferenceError::NoFaceDetected`].
    pub async fn predict(&self, frame: &Frame) -> InferenceResult<Prediction> {
        let url = format!("{}/predict", self.config.base_url);

        debug!(
            bytes = frame.len(),
            width = frame.width,
            height = frame.height,
            "Sending frame to {}",
            url
        );

        let part = Part::bytes(frame.jpeg.clone())
            .file_name("capture.jpg")
            .mime_str("image/jpeg")?;
        let mut form = Form::new().part("file", part);
        if self.config.debug {
            form = form.text("debug", "1");
        }

        let response = match self.http.post(&url).multipart(form).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(InferenceError::Timeout(self.config.timeout.as_secs()))
            }
            Err(e) => return Err(InferenceError::Network(e)),
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            if status == 400 && body.to_lowercase().contains("no face") {
                return Err(InferenceError::NoFaceDetected);
            }
            return Err(InferenceError::Service { status, body });
        }

        let prediction: Prediction = response.json().await?;
        debug!(
            "Prediction: {} ({:.2})",
            prediction.emotion, prediction.confidence
        );
        Ok(prediction)
    }
}

#[async_trait]
impl Classifier for EmotionClient {
    async fn classify(&self, frame: &Frame) -> InferenceResult<Prediction> {
        self.predict(frame).await
    }

    fn name(&self) -> &'static str {
        "vit-http"
    }
}
