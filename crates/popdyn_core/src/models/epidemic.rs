use super::{add_counts, binomial, ensure_non_negative, ensure_probability};
use crate::traits::PairTransition;
use anyhow::{bail, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Susceptible-infected dynamics with optional recovery back to susceptible.
/// `recovery = 0` is the pure SI model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpidemicParams {
    pub transmission: f64,
    #[serde(default)]
    pub recovery: f64,
}

impl EpidemicParams {
    pub fn new(transmission: f64, recovery: f64) -> Result<Self> {
        let params = Self {
            transmission,
            recovery,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("transmission", self.transmission)?;
        ensure_probability("recovery", self.recovery)
    }
}

fn check_lengths<A, B>(susceptible: &[A], infected: &[B]) -> Result<()> {
    if susceptible.len() != infected.len() {
        bail!(
            "Susceptible and infected vectors differ in length ({} vs {}).",
            susceptible.len(),
            infected.len()
        );
    }
    Ok(())
}

/// One generation of deterministic SI(S) dynamics on densities. `S + I` is
/// conserved.
pub fn epidemic_map(
    susceptible: &[f64],
    infected: &[f64],
    params: &EpidemicParams,
) -> Result<(Vec<f64>, Vec<f64>)> {
    check_lengths(susceptible, infected)?;
    Ok(susceptible
        .iter()
        .zip(infected)
        .map(|(&s, &i)| {
            let total = s + i;
            if total <= 0.0 {
                return (s, i);
            }
            let infections = (params.transmission * s * i / total).min(s);
            let recoveries = params.recovery * i;
            (s - infections + recoveries, i + infections - recoveries)
        })
        .unzip())
}

/// Individual-based SI(S) on integer counts. Each susceptible is infected
/// with probability `1 - exp(-beta I / (S + I))`; each infected recovers with
/// probability `recovery`.
pub struct StochasticEpidemic<R: Rng> {
    rng: R,
}

impl<R: Rng> StochasticEpidemic<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl StochasticEpidemic<ChaCha8Rng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }
}

impl<R: Rng> PairTransition<u64, EpidemicParams> for StochasticEpidemic<R> {
    fn step(
        &mut self,
        susceptible: &[u64],
        infected: &[u64],
        params: &EpidemicParams,
    ) -> Result<(Vec<u64>, Vec<u64>)> {
        check_lengths(susceptible, infected)?;

        let mut next_s = Vec::with_capacity(susceptible.len());
        let mut next_i = Vec::with_capacity(infected.len());
        for (&s, &i) in susceptible.iter().zip(infected) {
            let total = add_counts("Population", s, i)?;
            if total == 0 {
                next_s.push(0);
                next_i.push(0);
                continue;
            }
            let pressure = params.transmission * i as f64 / total as f64;
            let infections = binomial(&mut self.rng, s, 1.0 - (-pressure).exp())?;
            let recoveries = binomial(&mut self.rng, i, params.recovery)?;
            next_s.push(s - infections + recoveries);
            next_i.push(i - recoveries + infections);
        }
        Ok((next_s, next_i))
    }
}
