//! Rejection-sampling circle packer.

use rand::Rng;
use tracing::debug;

use joy_models::{PlacedCircle, Placement, PlacementConstraint};

/// Smallest diameter a circle may be shrunk to when the container is tight.
const MIN_SIZE: f64 = 8.0;

/// Place a circle of `size` into the container without overlapping
/// `existing`, sampling uniformly at random.
///
/// If the container cannot fit `size` at all, the size is shrunk to what
/// fits (clamped to a positive minimum) before sampling. Up to
/// `max_attempts` candidates are tried against the circle-circle clearance
/// rule (center distance at least the mean of both diameters plus padding).
/// If the budget runs out, one final clamped random position is accepted
/// unconditionally and the placement is marked degraded: overlap is possible
/// then, but a round always gets a position and this function never fails or
/// blocks.
///
/// Randomized by design; callers wanting reproducibility pass a seeded
/// `Rng`.
pub fn place<R: Rng>(
    size: f64,
    existing: &[PlacedCircle],
    constraint: &PlacementConstraint,
    rng: &mut R,
) -> Placement {
    let padding = constraint.padding.max(0.0);

    // shrink to what the container can hold at all
    let max_fit = (constraint.container_width.min(constraint.container_height)
        - 2.0 * padding)
        .max(MIN_SIZE);
    let size = size.min(max_fit).max(MIN_SIZE);

    let (min_x, max_x) = center_range(size, padding, constraint.container_width);
    let (min_y, max_y) = center_range(size, padding, constraint.container_height);

    let id = existing.iter().map(|circle| circle.id + 1).max().unwrap_or(0);

    for _ in 0..constraint.max_attempts {
        let x = rng.random_range(min_x..=max_x);
        let y = rng.random_range(min_y..=max_y);
        let candidate = PlacedCircle::new(id, x, y, size);
        if existing.iter().all(|other| candidate.clears(other, padding)) {
            return Placement {
                circle: candidate,
                degraded: false,
            };
        }
    }

    // budget exhausted: accept one clamped random position unconditionally
    let x = rng.random_range(min_x..=max_x);
    let y = rng.random_range(min_y..=max_y);
    debug!(
        attempts = constraint.max_attempts,
        existing = existing.len(),
        "Placement budget exhausted, accepting possibly overlapping position"
    );
    Placement {
        circle: PlacedCircle::new(id, x, y, size),
        degraded: true,
    }
}

/// [`place`] with the thread-local generator, for game code.
pub fn place_with_thread_rng(
    size: f64,
    existing: &[PlacedCircle],
    constraint: &PlacementConstraint,
) -> Placement {
    place(size, existing, constraint, &mut rand::rng())
}

/// Valid center coordinate range along one axis. Collapses to the container
/// midpoint when the axis is too tight to honor the padding.
fn center_range(size: f64, padding: f64, container: f64) -> (f64, f64) {
    let min = padding + size / 2.0;
    let max = container - padding - size / 2.0;
    if max > min {
        (min, max)
    } else {
        let mid = container / 2.0;
        (mid, mid)
    }
}
