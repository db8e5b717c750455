//! Driver errors

use thiserror::Error;

/// Failures surfaced by [`crate::simulate::simulate`] and
/// [`crate::simulate::simulate_pair`]. None of them is recovered from.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("at least one generation is required")]
    NoGenerations,

    #[error("initial tracks differ in length: {first} vs {second}")]
    TrackLengthMismatch { first: usize, second: usize },

    #[error(
        "transition returned {actual} values at generation {generation}, expected {expected}"
    )]
    ShapeMismatch {
        generation: usize,
        expected: usize,
        actual: usize,
    },

    /// Raised by the transition itself and passed through untouched.
    #[error(transparent)]
    Transition(#[from] anyhow::Error),
}
