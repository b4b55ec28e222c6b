//! Emotion labels and classification samples.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of emotion classes the ViT service can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmotionLabel {
    Happiness,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Disgust,
    Neutral,
}

impl EmotionLabel {
    /// All labels, in the order the service reports its probability map.
    pub const ALL: &'static [EmotionLabel] = &[
        EmotionLabel::Happiness,
        EmotionLabel::Sadness,
        EmotionLabel::Anger,
        EmotionLabel::Fear,
        EmotionLabel::Surprise,
        EmotionLabel::Disgust,
        EmotionLabel::Neutral,
    ];

    /// Wire-format name of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Happiness => "happiness",
            EmotionLabel::Sadness => "sadness",
            EmotionLabel::Anger => "anger",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown emotion label.
#[derive(Debug, Clone, Error)]
#[error("unknown emotion label: {0}")]
pub struct ParseEmotionError(pub String);

impl FromStr for EmotionLabel {
    type Err = ParseEmotionError;

    /// Parses the service's labels plus the colloquial aliases older game
    /// code sent ("happy", "sad", "angry", "scared").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "happiness" | "happy" => Ok(EmotionLabel::Happiness),
            "sadness" | "sad" => Ok(EmotionLabel::Sadness),
            "anger" | "angry" => Ok(EmotionLabel::Anger),
            "fear" | "scared" => Ok(EmotionLabel::Fear),
            "surprise" | "surprised" => Ok(EmotionLabel::Surprise),
            "disgust" | "disgusted" => Ok(EmotionLabel::Disgust),
            "neutral" => Ok(EmotionLabel::Neutral),
            other => Err(ParseEmotionError(other.to_string())),
        }
    }
}

/// One successful classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmotionSample {
    pub label: EmotionLabel,
    /// Confidence in [0, 1].
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

impl EmotionSample {
    /// Create a sample stamped with the current time. Confidence is clamped
    /// into [0, 1].
    pub fn new(label: EmotionLabel, confidence: f32) -> Self {
        Self::at(label, confidence, Utc::now())
    }

    /// Create a sample with an explicit timestamp.
    pub fn at(label: EmotionLabel, confidence: f32, timestamp: DateTime<Utc>) -> Self {
        Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
            timestamp,
        }
    }
}

/// Payload delivered to the consumer when a sample is accepted as the new
/// current emotion.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EmotionUpdate {
    pub sample: EmotionSample,
    /// Per-label probability distribution, when the service returned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probs: Option<BTreeMap<EmotionLabel, f32>>,
    /// Dominant emotion over the recent history window at acceptance time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant: Option<EmotionLabel>,
}
