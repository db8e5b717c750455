use super::{add_counts, binomial, ensure_finite, ensure_positive, ensure_probability};
use crate::traits::Transition;
use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Discrete logistic growth `N' = N + r N (1 - N / K)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub growth_rate: f64,
    pub carrying_capacity: f64,
}

impl LogisticParams {
    pub fn new(growth_rate: f64, carrying_capacity: f64) -> Result<Self> {
        let params = Self {
            growth_rate,
            carrying_capacity,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_finite("growth_rate", self.growth_rate)?;
        ensure_positive("carrying_capacity", self.carrying_capacity)
    }
}

/// One generation of logistic growth for every replicate. Overshoot below
/// zero is clamped to extinction.
pub fn logistic_map(state: &[f64], params: &LogisticParams) -> Result<Vec<f64>> {
    let r = params.growth_rate;
    let k = params.carrying_capacity;
    Ok(state
        .iter()
        .map(|&n| (n + r * n * (1.0 - n / k)).max(0.0))
        .collect())
}

/// Individual-based logistic growth on integer counts.
///
/// Every individual reproduces with probability `fecundity` and dies with
/// probability `death_probability + (fecundity - death_probability) N / K`,
/// so the expected change is `(b - d) N (1 - N / K)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticLogisticParams {
    pub fecundity: f64,
    pub death_probability: f64,
    pub carrying_capacity: f64,
}

impl StochasticLogisticParams {
    pub fn new(fecundity: f64, death_probability: f64, carrying_capacity: f64) -> Result<Self> {
        let params = Self {
            fecundity,
            death_probability,
            carrying_capacity,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_probability("fecundity", self.fecundity)?;
        ensure_probability("death_probability", self.death_probability)?;
        ensure_positive("carrying_capacity", self.carrying_capacity)
    }

    /// Deterministic growth with the same expected per-generation change.
    pub fn mean_field(&self) -> LogisticParams {
        LogisticParams {
            growth_rate: self.fecundity - self.death_probability,
            carrying_capacity: self.carrying_capacity,
        }
    }

    fn death_probability_at(&self, n: u64) -> f64 {
        let crowding = (self.fecundity - self.death_probability).max(0.0);
        (self.death_probability + crowding * n as f64 / self.carrying_capacity).min(1.0)
    }
}

pub struct StochasticLogistic<R: Rng> {
    rng: R,
}

impl<R: Rng> StochasticLogistic<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl StochasticLogistic<ChaCha8Rng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }
}

impl<R: Rng> Transition<u64, StochasticLogisticParams> for StochasticLogistic<R> {
    fn step(&mut self, state: &[u64], params: &StochasticLogisticParams) -> Result<Vec<u64>> {
        state
            .iter()
            .map(|&n| -> Result<u64> {
                let births = binomial(&mut self.rng, n, params.fecundity)?;
                let deaths = binomial(&mut self.rng, n, params.death_probability_at(n))?;
                add_counts("Population", n - deaths, births)
            })
            .collect()
    }
}
