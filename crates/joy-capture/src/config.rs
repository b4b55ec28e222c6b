//! Capture pipeline configuration.

use std::time::Duration;

/// Acceptance thresholds and window sizes for the emotion smoother.
///
/// The gate values shipped by the product are loose (almost any label change
/// passes); they are configuration, not constants, so deployments can tune
/// them without touching the smoother.
#[derive(Debug, Clone)]
pub struct SmootherConfig {
    /// A sample whose label differs from the current emotion is accepted
    /// above this confidence.
    pub low_threshold: f32,
    /// Any sample above this confidence is accepted, label change or not.
    pub high_threshold: f32,
    /// Ring-buffer capacity of the sample history.
    pub history_capacity: usize,
    /// How many recent samples the dominant-emotion mode looks at.
    pub dominant_window: usize,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            low_threshold: 0.05,
            high_threshold: 0.3,
            history_capacity: 10,
            dominant_window: 5,
        }
    }
}

/// Capture pipeline configuration.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Steady capture cadence
    pub interval: Duration,
    /// Cadence used by fast mode (reaction-heavy games)
    pub fast_interval: Duration,
    /// Delay between the validation cycle and the steady loop, giving the
    /// subject time to position in frame
    pub warmup: Duration,
    /// Hard timeout on device acquisition
    pub acquisition_timeout: Duration,
    /// JPEG quality for uploaded frames (1-100)
    pub jpeg_quality: u8,
    /// Whether to attach a camera preview surface
    pub preview: bool,
    pub smoother: SmootherConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            fast_interval: Duration::from_millis(1000),
            warmup: Duration::from_secs(2),
            acquisition_timeout: Duration::from_secs(10),
            jpeg_quality: 90,
            preview: false,
            smoother: SmootherConfig::default(),
        }
    }
}

impl CaptureConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = SmootherConfig::default();
        Self {
            interval: Duration::from_millis(
                std::env::var("JOY_CAPTURE_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
            fast_interval: Duration::from_millis(
                std::env::var("JOY_CAPTURE_FAST_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            warmup: Duration::from_millis(
                std::env::var("JOY_CAPTURE_WARMUP_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
            acquisition_timeout: Duration::from_secs(
                std::env::var("JOY_CAPTURE_ACQUIRE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            jpeg_quality: std::env::var("JOY_CAPTURE_JPEG_QUALITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(90),
            preview: std::env::var("JOY_CAPTURE_PREVIEW")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            smoother: SmootherConfig {
                low_threshold: std::env::var("JOY_EMOTION_LOW_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.low_threshold),
                high_threshold: std::env::var("JOY_EMOTION_HIGH_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.high_threshold),
                history_capacity: defaults.history_capacity,
                dominant_window: defaults.dominant_window,
            },
        }
    }
}
