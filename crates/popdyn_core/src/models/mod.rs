//! Transition rules for the example models.
//!
//! Deterministic rules are plain functions over `f64` densities and can be
//! handed to the drivers as `&mut logistic_map`. Stochastic rules are structs
//! over `u64` counts that own their random source.

pub mod competition;
pub mod epidemic;
pub mod logistic;
pub mod predator_prey;

pub use competition::{competition_map, CompetitionParams};
pub use epidemic::{epidemic_map, EpidemicParams, StochasticEpidemic};
pub use logistic::{logistic_map, LogisticParams, StochasticLogistic, StochasticLogisticParams};
pub use predator_prey::{predator_prey_map, PredatorPreyParams, StochasticPredatorPrey};

use anyhow::{bail, Context, Result};
use rand::distributions::{Bernoulli, Distribution};
use rand::Rng;

/// Largest per-replicate count a scenario accepts for the individual-based
/// models. Sampling draws one event per individual, so a step costs O(N).
pub const MAX_STOCHASTIC_COUNT: u64 = 1_000_000_000;

/// Number of successes in `trials` independent events of probability `p`.
/// Draws one Bernoulli sample per trial.
pub(crate) fn binomial<R: Rng + ?Sized>(rng: &mut R, trials: u64, p: f64) -> Result<u64> {
    let event =
        Bernoulli::new(p).with_context(|| format!("Invalid event probability {p}."))?;
    Ok((0..trials).filter(|_| event.sample(rng)).count() as u64)
}

/// Sum of two counts, or an error when it does not fit in a `u64`.
pub(crate) fn add_counts(name: &str, a: u64, b: u64) -> Result<u64> {
    match a.checked_add(b) {
        Some(sum) => Ok(sum),
        None => bail!("{name} count overflows: {a} + {b}."),
    }
}

pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        bail!("{name} must be finite, got {value}.");
    }
    Ok(())
}

pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0) || !value.is_finite() {
        bail!("{name} must be positive, got {value}.");
    }
    Ok(())
}

pub(crate) fn ensure_non_negative(name: &str, value: f64) -> Result<()> {
    if !(value >= 0.0) || !value.is_finite() {
        bail!("{name} must be non-negative, got {value}.");
    }
    Ok(())
}

pub(crate) fn ensure_probability(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        bail!("{name} must lie in [0, 1], got {value}.");
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::assert_err_contains;
    use super::{add_counts, binomial, ensure_probability};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn binomial_handles_certain_and_impossible_events() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(binomial(&mut rng, 25, 1.0).expect("p = 1"), 25);
        assert_eq!(binomial(&mut rng, 25, 0.0).expect("p = 0"), 0);
        assert_eq!(binomial(&mut rng, 0, 0.5).expect("no trials"), 0);
    }

    #[test]
    fn binomial_mean_is_close_to_np() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let draws = 2_000;
        let total: u64 = (0..draws)
            .map(|_| binomial(&mut rng, 50, 0.3).expect("valid probability"))
            .sum();
        let mean = total as f64 / draws as f64;
        assert!((mean - 15.0).abs() < 0.5, "mean {mean}");
    }

    #[test]
    fn binomial_rejects_invalid_probability() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_err_contains(binomial(&mut rng, 3, 1.5), "Invalid event probability");
        assert_err_contains(binomial(&mut rng, 3, f64::NAN), "Invalid event probability");
    }

    #[test]
    fn probability_check_bounds() {
        assert!(ensure_probability("p", 0.0).is_ok());
        assert!(ensure_probability("p", 1.0).is_ok());
        assert_err_contains(ensure_probability("p", -0.1), "p must lie in [0, 1]");
    }

    #[test]
    fn count_sums_report_overflow() {
        assert_eq!(add_counts("prey", 2, 3).expect("sum"), 5);
        assert_err_contains(add_counts("prey", u64::MAX, 1), "prey count overflows");
    }
}
