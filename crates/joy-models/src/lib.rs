//! Shared data models for the Joyverse affect core.
//!
//! This crate provides Serde-serializable types for:
//! - Emotion labels, samples and callback payloads
//! - Captured frames (raw and JPEG-encoded)
//! - Circle placement geometry for game rounds
//! - Emotion-driven presentation themes

pub mod emotion;
pub mod frame;
pub mod placement;
pub mod theme;

// Re-export common types
pub use emotion::{EmotionLabel, EmotionSample, EmotionUpdate, ParseEmotionError};
pub use frame::{Frame, RawFrame};
pub use placement::{PlacedCircle, Placement, PlacementConstraint};
pub use theme::Theme;
