use super::{add_counts, binomial, ensure_finite, ensure_non_negative, ensure_positive, ensure_probability};
use crate::traits::PairTransition;
use anyhow::{bail, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Prey with logistic growth hunted by a specialist predator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredatorPreyParams {
    pub prey_growth: f64,
    pub prey_capacity: f64,
    pub attack_rate: f64,
    pub conversion: f64,
    pub predator_death: f64,
}

impl PredatorPreyParams {
    pub fn new(
        prey_growth: f64,
        prey_capacity: f64,
        attack_rate: f64,
        conversion: f64,
        predator_death: f64,
    ) -> Result<Self> {
        let params = Self {
            prey_growth,
            prey_capacity,
            attack_rate,
            conversion,
            predator_death,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_finite("prey_growth", self.prey_growth)?;
        ensure_positive("prey_capacity", self.prey_capacity)?;
        ensure_non_negative("attack_rate", self.attack_rate)?;
        ensure_non_negative("conversion", self.conversion)?;
        ensure_non_negative("predator_death", self.predator_death)
    }

    /// Extra constraints for the individual-based variant, where growth,
    /// conversion and death act as per-individual probabilities.
    pub fn validate_stochastic(&self) -> Result<()> {
        self.validate()?;
        ensure_probability("prey_growth", self.prey_growth)?;
        ensure_probability("conversion", self.conversion)?;
        ensure_probability("predator_death", self.predator_death)
    }

    /// Interior fixed point `(N*, P*)` of the deterministic map, if positive.
    pub fn coexistence(&self) -> Option<(f64, f64)> {
        if self.attack_rate <= 0.0 || self.conversion <= 0.0 {
            return None;
        }
        let prey = self.predator_death / (self.conversion * self.attack_rate);
        let predators = self.prey_growth * (1.0 - prey / self.prey_capacity) / self.attack_rate;
        (prey > 0.0 && predators > 0.0).then_some((prey, predators))
    }
}

/// One generation of the discrete predator-prey map:
/// `N' = N + r N (1 - N/K) - a N P`, `P' = P + c a N P - m P`.
pub fn predator_prey_map(
    prey: &[f64],
    predators: &[f64],
    params: &PredatorPreyParams,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if prey.len() != predators.len() {
        bail!(
            "Prey and predator vectors differ in length ({} vs {}).",
            prey.len(),
            predators.len()
        );
    }
    let PredatorPreyParams {
        prey_growth: r,
        prey_capacity: k,
        attack_rate: a,
        conversion: c,
        predator_death: m,
    } = *params;

    Ok(prey
        .iter()
        .zip(predators)
        .map(|(&n, &p)| {
            let eaten = a * n * p;
            (
                (n + r * n * (1.0 - n / k) - eaten).max(0.0),
                (p + c * eaten - m * p).max(0.0),
            )
        })
        .unzip())
}

/// Individual-based predator-prey on integer counts.
///
/// Each prey reproduces with probability `r (1 - N/K)`, escapes every
/// predator with probability `exp(-a P)`, each eaten prey becomes a new
/// predator with probability `c`, and each predator dies with probability `m`.
pub struct StochasticPredatorPrey<R: Rng> {
    rng: R,
}

impl<R: Rng> StochasticPredatorPrey<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl StochasticPredatorPrey<ChaCha8Rng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }
}

impl<R: Rng> PairTransition<u64, PredatorPreyParams> for StochasticPredatorPrey<R> {
    fn step(
        &mut self,
        prey: &[u64],
        predators: &[u64],
        params: &PredatorPreyParams,
    ) -> Result<(Vec<u64>, Vec<u64>)> {
        if prey.len() != predators.len() {
            bail!(
                "Prey and predator vectors differ in length ({} vs {}).",
                prey.len(),
                predators.len()
            );
        }

        let mut next_prey = Vec::with_capacity(prey.len());
        let mut next_predators = Vec::with_capacity(predators.len());
        for (&n, &p) in prey.iter().zip(predators) {
            let birth = (params.prey_growth * (1.0 - n as f64 / params.prey_capacity)).max(0.0);
            let capture = 1.0 - (-params.attack_rate * p as f64).exp();

            let births = binomial(&mut self.rng, n, birth)?;
            let eaten = binomial(&mut self.rng, n, capture)?;
            let recruits = binomial(&mut self.rng, eaten, params.conversion)?;
            let deaths = binomial(&mut self.rng, p, params.predator_death)?;

            next_prey.push(add_counts("Prey", n - eaten, births)?);
            next_predators.push(add_counts("Predator", p - deaths, recruits)?);
        }
        Ok((next_prey, next_predators))
    }
}

#[cfg(test)]
mod tests {
    use super::{predator_prey_map, PredatorPreyParams, StochasticPredatorPrey};
    use crate::models::test_support::assert_err_contains;
    use crate::simulate::simulate_pair;

    fn params() -> PredatorPreyParams {
        PredatorPreyParams::new(0.1, 500.0, 0.002, 0.5, 0.1).expect("params")
    }

    #[test]
    fn validation_rejects_bad_values() {
        assert_err_contains(
            PredatorPreyParams::new(0.1, -1.0, 0.002, 0.5, 0.1),
            "prey_capacity",
        );
        assert_err_contains(
            PredatorPreyParams::new(0.1, 500.0, -0.002, 0.5, 0.1),
            "attack_rate",
        );
        let loose = PredatorPreyParams::new(1.5, 500.0, 0.002, 0.5, 0.1).expect("params");
        assert_err_contains(loose.validate_stochastic(), "prey_growth must lie in [0, 1]");
    }

    #[test]
    fn coexistence_point_is_fixed() {
        let params = params();
        let (prey, predators) = params.coexistence().expect("interior equilibrium");
        assert!((prey - 100.0).abs() < 1e-9);
        assert!((predators - 40.0).abs() < 1e-9);
        let (next_prey, next_predators) =
            predator_prey_map(&[prey], &[predators], &params).expect("step");
        assert!((next_prey[0] - prey).abs() < 1e-9);
        assert!((next_predators[0] - predators).abs() < 1e-9);
    }

    #[test]
    fn prey_alone_grows_logistically_and_predators_alone_decline() {
        let params = params();
        let (prey, predators) =
            simulate_pair(&[10.0, 0.0], &[0.0, 50.0], &mut predator_prey_map, 400, &params)
                .expect("simulation");
        let last_prey = prey.last();
        let last_predators = predators.last();
        assert!((last_prey[0] - 500.0).abs() < 1e-3);
        assert_eq!(last_predators[0], 0.0);
        assert_eq!(last_prey[1], 0.0);
        assert!(last_predators[1] < 1e-6);
    }

    #[test]
    fn deterministic_orbit_spirals_toward_coexistence() {
        let params = params();
        let (prey, predators) =
            simulate_pair(&[100.0], &[20.0], &mut predator_prey_map, 2_000, &params)
                .expect("simulation");
        assert!((prey.last()[0] - 100.0).abs() < 1.0);
        assert!((predators.last()[0] - 40.0).abs() < 1.0);
    }

    #[test]
    fn map_rejects_mismatched_vectors() {
        assert_err_contains(
            predator_prey_map(&[1.0, 2.0], &[1.0], &params()),
            "differ in length",
        );
    }

    #[test]
    fn seeded_stochastic_runs_are_reproducible() {
        let params = params();
        let run = |seed| {
            simulate_pair(
                &[100u64, 100, 100],
                &[20, 20, 20],
                &mut StochasticPredatorPrey::seeded(seed),
                100,
                &params,
            )
            .expect("simulation")
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn stochastic_predators_without_prey_cannot_recruit() {
        let params = params();
        let (prey, predators) = simulate_pair(
            &[0u64, 0],
            &[30, 5],
            &mut StochasticPredatorPrey::seeded(4),
            60,
            &params,
        )
        .expect("simulation");
        assert!(prey.last().iter().all(|&n| n == 0));
        let series = predators.replicate(0).expect("replicate");
        assert!(series.windows(2).all(|w| w[1] <= w[0]));
    }
}
