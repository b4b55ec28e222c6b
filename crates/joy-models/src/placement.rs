//! Circle placement geometry for game rounds.
//!
//! Game rounds lay interactive circular targets ("bubbles") inside a bounded
//! play area. The set of placed circles accumulates within a single round
//! and is discarded when the round ends.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default margin kept between circles and around the container edge, px.
pub const DEFAULT_PADDING: f64 = 20.0;

/// Default rejection-sampling attempt budget per placement.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// A circle placed inside the play area. `x`/`y` is the center; `size` is
/// the diameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlacedCircle {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl PlacedCircle {
    pub fn new(id: u32, x: f64, y: f64, size: f64) -> Self {
        Self { id, x, y, size }
    }

    /// Distance between this circle's center and another's.
    pub fn center_distance(&self, other: &PlacedCircle) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether two circles keep at least `margin` of clearance between
    /// their rims.
    pub fn clears(&self, other: &PlacedCircle, margin: f64) -> bool {
        self.center_distance(other) >= (self.size + other.size) / 2.0 + margin
    }
}

/// Per-call constraints for one placement. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlacementConstraint {
    pub container_width: f64,
    pub container_height: f64,
    pub padding: f64,
    pub max_attempts: u32,
}

impl PlacementConstraint {
    /// Constraint for a container, with the default padding and attempt
    /// budget.
    pub fn new(container_width: f64, container_height: f64) -> Self {
        Self {
            container_width,
            container_height,
            padding: DEFAULT_PADDING,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Result of one placement call.
///
/// `degraded` records that the attempt budget ran out and the position was
/// taken unconditionally, so it may overlap existing circles. This is an
/// event worth logging, not an error: a round must always get a usable
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Placement {
    pub circle: PlacedCircle,
    pub degraded: bool,
}
