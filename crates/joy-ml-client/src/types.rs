//! Emotion service request/response types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use joy_models::{EmotionLabel, EmotionSample, ParseEmotionError};

use crate::error::{InferenceError, InferenceResult};

/// Confidence below which the preview status warns about lighting/position.
const LOW_CONFIDENCE_STATUS: f32 = 0.3;

/// Successful response from `POST /predict`.
///
/// The service answers 200 even for some no-face frames, substituting a
/// low-confidence neutral prediction and flagging it in `note`; callers
/// should check [`Prediction::is_no_face`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub emotion: String,
    pub confidence: f32,
    /// Per-label probability distribution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probs: Option<BTreeMap<String, f32>>,
    /// Service annotation, e.g. "Default emotion used - no face detected".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Prediction {
    /// Parsed emotion label. Unknown labels are an invalid response.
    pub fn label(&self) -> InferenceResult<EmotionLabel> {
        self.emotion
            .parse()
            .map_err(|e: ParseEmotionError| InferenceError::InvalidResponse(e.to_string()))
    }

    /// Probability map keyed by typed labels. Unknown keys are dropped.
    pub fn typed_probs(&self) -> Option<BTreeMap<EmotionLabel, f32>> {
        self.probs.as_ref().map(|probs| {
            probs
                .iter()
                .filter_map(|(k, v)| k.parse::<EmotionLabel>().ok().map(|label| (label, *v)))
                .collect()
        })
    }

    /// Whether the service flagged this prediction as a no-face fallback.
    pub fn is_no_face(&self) -> bool {
        self.note
            .as_deref()
            .is_some_and(|note| note.to_lowercase().contains("no face"))
    }

    /// Convert into a timestamped sample plus its probability distribution.
    pub fn into_sample(self) -> InferenceResult<(EmotionSample, Option<BTreeMap<EmotionLabel, f32>>)> {
        let label = self.label()?;
        let probs = self.typed_probs();
        Ok((EmotionSample::new(label, self.confidence), probs))
    }
}

/// Response from `GET /test`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub message: String,
}

/// Human-readable status for an attached camera preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    /// Whether the pipeline is currently getting usable classifications.
    pub ok: bool,
}

impl StatusLine {
    /// Initial status shown before the first classification lands.
    pub fn looking() -> Self {
        Self {
            text: "Looking for face...".to_string(),
            ok: false,
        }
    }

    /// Status for a classification outcome.
    pub fn for_outcome(outcome: &InferenceResult<Prediction>) -> Self {
        match outcome {
            Ok(prediction) if prediction.is_no_face() => Self {
                text: "No face detected - please adjust position".to_string(),
                ok: false,
            },
            Ok(prediction) if prediction.confidence < LOW_CONFIDENCE_STATUS => Self {
                text: "Low confidence - improve lighting and position".to_string(),
                ok: false,
            },
            Ok(prediction) => Self {
                text: format!(
                    "Detected {} ({}%)",
                    prediction.emotion,
                    (prediction.confidence * 100.0).round() as u32
                ),
                ok: true,
            },
            Err(InferenceError::NoFaceDetected) => Self {
                text: "No face detected - please adjust position".to_string(),
                ok: false,
            },
            Err(InferenceError::Timeout(_)) => Self {
                text: "Service timeout - will retry".to_string(),
                ok: false,
            },
            Err(_) => Self {
                text: "Service error - check server".to_string(),
                ok: false,
            },
        }
    }
}
