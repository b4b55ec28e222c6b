//! Non-overlapping circle placement for game rounds.
//!
//! Rejection sampling with a bounded attempt budget and graceful
//! degradation: placement always terminates and always yields a usable
//! position, preferring non-overlap but never stalling a round to get it.

pub mod pack;

pub use pack::{place, place_with_thread_rng};
