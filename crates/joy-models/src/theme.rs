//! Emotion-driven presentation themes.
//!
//! The affect pipeline's primary consumer: games restyle themselves from the
//! smoothed emotion signal. The mapping is total: any label (or no label at
//! all) resolves to a theme, with the neutral theme as the default.

use serde::Serialize;

use crate::emotion::EmotionLabel;

/// A presentation theme. Colors are CSS values consumed verbatim by game
/// hosts; the core attaches no meaning to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub name: &'static str,
    pub mood: &'static str,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
    pub text: &'static str,
    pub background: &'static str,
    pub particles: &'static str,
    pub description: &'static str,
}

const HAPPY_SUNSHINE: Theme = Theme {
    name: "Happy Sunshine",
    mood: "energetic",
    primary: "#fbbf24",
    secondary: "#f59e0b",
    accent: "#fcd34d",
    text: "#451a03",
    background: "linear-gradient(135deg, #fef3c7 0%, #fbbf24 100%)",
    particles: "✨",
    description: "Bright and cheerful themes that match your happy mood!",
};

const GENTLE_COMFORT: Theme = Theme {
    name: "Gentle Comfort",
    mood: "calm",
    primary: "#60a5fa",
    secondary: "#3b82f6",
    accent: "#93c5fd",
    text: "#1e3a8a",
    background: "linear-gradient(135deg, #dbeafe 0%, #60a5fa 100%)",
    particles: "💙",
    description: "Soft, comforting colors to help you feel better.",
};

const COOL_DOWN: Theme = Theme {
    name: "Cool Down",
    mood: "cooling",
    primary: "#34d399",
    secondary: "#10b981",
    accent: "#6ee7b7",
    text: "#064e3b",
    background: "linear-gradient(135deg, #d1fae5 0%, #34d399 100%)",
    particles: "🌿",
    description: "Calming green themes to help you relax and cool down.",
};

const SAFE_SPACE: Theme = Theme {
    name: "Safe Space",
    mood: "reassuring",
    primary: "#a78bfa",
    secondary: "#8b5cf6",
    accent: "#c4b5fd",
    text: "#4c1d95",
    background: "linear-gradient(135deg, #ede9fe 0%, #a78bfa 100%)",
    particles: "🌟",
    description: "Gentle purple themes to make you feel safe and protected.",
};

const EXCITING_ADVENTURE: Theme = Theme {
    name: "Exciting Adventure",
    mood: "exciting",
    primary: "#f472b6",
    secondary: "#ec4899",
    accent: "#f9a8d4",
    text: "#831843",
    background: "linear-gradient(135deg, #fce7f3 0%, #f472b6 100%)",
    particles: "🎉",
    description: "Vibrant and surprising themes for your adventurous spirit!",
};

const FRESH_START: Theme = Theme {
    name: "Fresh Start",
    mood: "refreshing",
    primary: "#2dd4bf",
    secondary: "#14b8a6",
    accent: "#5eead4",
    text: "#134e4a",
    background: "linear-gradient(135deg, #ccfbf1 0%, #2dd4bf 100%)",
    particles: "🍃",
    description: "Clean, fresh colors for a brand new feeling.",
};

const BALANCED_FOCUS: Theme = Theme {
    name: "Balanced Focus",
    mood: "focused",
    primary: "#6b7280",
    secondary: "#4b5563",
    accent: "#9ca3af",
    text: "#111827",
    background: "linear-gradient(135deg, #f3f4f6 0%, #6b7280 100%)",
    particles: "⚡",
    description: "Neutral colors to help you stay focused and balanced.",
};

impl Theme {
    /// Theme for a label. Total: `None` resolves to the neutral theme.
    pub fn for_label(label: Option<EmotionLabel>) -> &'static Theme {
        match label {
            Some(EmotionLabel::Happiness) => &HAPPY_SUNSHINE,
            Some(EmotionLabel::Sadness) => &GENTLE_COMFORT,
            Some(EmotionLabel::Anger) => &COOL_DOWN,
            Some(EmotionLabel::Fear) => &SAFE_SPACE,
            Some(EmotionLabel::Surprise) => &EXCITING_ADVENTURE,
            Some(EmotionLabel::Disgust) => &FRESH_START,
            Some(EmotionLabel::Neutral) | None => &BALANCED_FOCUS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_is_total() {
        for label in EmotionLabel::ALL {
            let theme = Theme::for_label(Some(*label));
            assert!(!theme.name.is_empty());
            assert!(theme.primary.starts_with('#'));
        }
    }

    #[test]
    fn test_absent_label_defaults_to_neutral() {
        assert_eq!(Theme::for_label(None).name, "Balanced Focus");
        assert_eq!(
            Theme::for_label(None),
            Theme::for_label(Some(EmotionLabel::Neutral))
        );
    }

    #[test]
    fn test_happiness_theme() {
        let theme = Theme::for_label(Some(EmotionLabel::Happiness));
        assert_eq!(theme.name, "Happy Sunshine");
        assert_eq!(theme.mood, "energetic");
    }
}
