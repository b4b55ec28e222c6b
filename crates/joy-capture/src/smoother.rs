//! Emotion smoothing over noisy per-frame classifications.
//!
//! Single-frame results flap: lighting, pose and model noise flip labels
//! tick to tick. The smoother keeps a short history, gates which samples
//! may become the externally visible "current emotion", and can compute a
//! dominant emotion over the recent window for consumers that want an even
//! steadier signal.

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use joy_models::{EmotionLabel, EmotionSample, EmotionUpdate};

use crate::config::SmootherConfig;

/// Callback type for accepted emotion updates. Single-subscriber: exactly
/// one consumer (the running game) reacts to the signal.
pub type EmotionCallback = Arc<dyn Fn(EmotionUpdate) + Send + Sync + 'static>;

/// Gated, bounded-history smoother. One instance per capture session.
pub struct EmotionSmoother {
    config: SmootherConfig,
    history: VecDeque<EmotionSample>,
    current: Option<EmotionSample>,
    callback: Option<EmotionCallback>,
}

impl EmotionSmoother {
    pub fn new(config: SmootherConfig) -> Self {
        let capacity = config.history_capacity;
        Self {
            config,
            history: VecDeque::with_capacity(capacity),
            current: None,
            callback: None,
        }
    }

    pub fn with_callback(config: SmootherConfig, callback: EmotionCallback) -> Self {
        let mut smoother = Self::new(config);
        smoother.callback = Some(callback);
        smoother
    }

    pub fn set_callback(&mut self, callback: EmotionCallback) {
        self.callback = Some(callback);
    }

    /// Drop the registered callback. No further notifications fire.
    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    /// Feed one classification result through the gate.
    ///
    /// Every sample lands in the history (the dominant-emotion window wants
    /// rejected samples too). A sample becomes the new current emotion when
    /// its label differs from the current one and clears the low threshold,
    /// or unconditionally when it clears the high threshold (so a strong
    /// repeat of the same emotion still refreshes confidence and recency).
    ///
    /// Returns whether the sample was accepted. On acceptance the callback
    /// fires exactly once, synchronously, before this method returns.
    pub fn ingest(
        &mut self,
        sample: EmotionSample,
        probs: Option<BTreeMap<EmotionLabel, f32>>,
    ) -> bool {
        if self.history.len() == self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(sample.clone());

        let label_changed = self
            .current
            .as_ref()
            .is_none_or(|current| current.label != sample.label);
        let accept = (label_changed && sample.confidence > self.config.low_threshold)
            || sample.confidence > self.config.high_threshold;

        if !accept {
            debug!(
                label = %sample.label,
                confidence = sample.confidence,
                "Sample rejected by gating rule"
            );
            return false;
        }

        self.current = Some(sample.clone());
        let update = EmotionUpdate {
            sample,
            probs,
            dominant: self.dominant_emotion(),
        };
        if let Some(callback) = &self.callback {
            callback(update);
        }
        true
    }

    /// The last accepted sample, if any.
    pub fn current(&self) -> Option<&EmotionSample> {
        self.current.as_ref()
    }

    /// Read-only view of the ingested history, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &EmotionSample> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Mode label over the last `dominant_window` history entries, ties
    /// broken by first appearance in the window. `None` on empty history.
    pub fn dominant_emotion(&self) -> Option<EmotionLabel> {
        if self.history.is_empty() {
            return None;
        }

        let window_start = self.history.len().saturating_sub(self.config.dominant_window);
        let mut counts: Vec<(EmotionLabel, usize)> = Vec::new();
        for sample in self.history.iter().skip(window_start) {
            match counts.iter_mut().find(|(label, _)| *label == sample.label) {
                Some((_, count)) => *count += 1,
                None => counts.push((sample.label, 1)),
            }
        }

        let mut dominant: Option<(EmotionLabel, usize)> = None;
        for (label, count) in counts {
            // strictly greater keeps the first-seen label on ties
            if dominant.is_none_or(|(_, best)| count > best) {
                dominant = Some((label, count));
            }
        }
        dominant.map(|(label, _)| label)
    }
}
