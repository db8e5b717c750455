//! Serialisable run requests for the example models.
//!
//! A [`Scenario`] names a model, its parameters and initial condition, and how
//! long and how many replicates to run. [`Scenario::run`] drives the matching
//! transition through the generic drivers and, on request, integrates the
//! continuous-time counterpart over the same horizon for comparison.

use crate::models::{
    competition_map, epidemic_map, logistic_map, predator_prey_map, CompetitionParams,
    EpidemicParams, LogisticParams, PredatorPreyParams, StochasticEpidemic, StochasticLogistic,
    StochasticLogisticParams, StochasticPredatorPrey, MAX_STOCHASTIC_COUNT,
};
use crate::ode::{
    integrate, CompetitionFlow, EpidemicFlow, LogisticFlow, ModelFlow, OdeMethod, OdeSolution,
    PredatorPreyFlow, MAX_INTEGRATION_STEPS,
};
use crate::simulate::{simulate, simulate_pair};
use crate::traits::Abundance;
use crate::trajectory::{Trajectory, TrajectoryRecord};
use anyhow::{bail, Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

fn default_replicates() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub generations: usize,
    #[serde(default = "default_replicates")]
    pub replicates: usize,
    /// Seed for stochastic models. Ignored by deterministic ones; when absent
    /// the generator is seeded from system entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Step size for the reference ODE. No reference is computed when absent.
    #[serde(default)]
    pub reference_dt: Option<f64>,
    #[serde(default)]
    pub reference_method: OdeMethod,
    pub model: ModelSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Logistic {
        initial: f64,
        params: LogisticParams,
    },
    StochasticLogistic {
        initial: u64,
        params: StochasticLogisticParams,
    },
    PredatorPrey {
        prey: f64,
        predators: f64,
        params: PredatorPreyParams,
    },
    StochasticPredatorPrey {
        prey: u64,
        predators: u64,
        params: PredatorPreyParams,
    },
    Competition {
        first: f64,
        second: f64,
        params: CompetitionParams,
    },
    Epidemic {
        susceptible: f64,
        infected: f64,
        params: EpidemicParams,
    },
    StochasticEpidemic {
        susceptible: u64,
        infected: u64,
        params: EpidemicParams,
    },
}

impl ModelSpec {
    pub fn is_stochastic(&self) -> bool {
        matches!(
            self,
            ModelSpec::StochasticLogistic { .. }
                | ModelSpec::StochasticPredatorPrey { .. }
                | ModelSpec::StochasticEpidemic { .. }
        )
    }

    pub fn validate(&self) -> Result<()> {
        let mut counts: Vec<(&str, u64)> = Vec::new();
        let densities: Vec<(&str, f64)> = match self {
            ModelSpec::Logistic { initial, params } => {
                params.validate()?;
                vec![("population", *initial)]
            }
            ModelSpec::StochasticLogistic { initial, params } => {
                params.validate()?;
                counts.push(("population", *initial));
                Vec::new()
            }
            ModelSpec::PredatorPrey {
                prey,
                predators,
                params,
            } => {
                params.validate()?;
                vec![("prey", *prey), ("predators", *predators)]
            }
            ModelSpec::StochasticPredatorPrey {
                prey,
                predators,
                params,
            } => {
                params.validate_stochastic()?;
                counts.extend([("prey", *prey), ("predators", *predators)]);
                Vec::new()
            }
            ModelSpec::Competition {
                first,
                second,
                params,
            } => {
                params.validate()?;
                vec![("first", *first), ("second", *second)]
            }
            ModelSpec::Epidemic {
                susceptible,
                infected,
                params,
            } => {
                params.validate()?;
                vec![("susceptible", *susceptible), ("infected", *infected)]
            }
            ModelSpec::StochasticEpidemic {
                susceptible,
                infected,
                params,
            } => {
                params.validate()?;
                counts.extend([("susceptible", *susceptible), ("infected", *infected)]);
                Vec::new()
            }
        };
        for (name, value) in densities {
            if !(value >= 0.0) || !value.is_finite() {
                bail!("Initial {name} must be a non-negative number, got {value}.");
            }
        }
        for (name, count) in counts {
            if count > MAX_STOCHASTIC_COUNT {
                bail!("Initial {name} count {count} exceeds the limit of {MAX_STOCHASTIC_COUNT}.");
            }
        }
        Ok(())
    }

    /// Continuous-time counterpart and its initial state.
    pub fn reference_flow(&self) -> (ModelFlow, Vec<f64>) {
        match self {
            ModelSpec::Logistic { initial, params } => {
                (ModelFlow::Logistic(LogisticFlow::new(params)), vec![*initial])
            }
            ModelSpec::StochasticLogistic { initial, params } => (
                ModelFlow::Logistic(LogisticFlow::new(&params.mean_field())),
                vec![*initial as f64],
            ),
            ModelSpec::PredatorPrey {
                prey,
                predators,
                params,
            } => (
                ModelFlow::PredatorPrey(PredatorPreyFlow::new(params)),
                vec![*prey, *predators],
            ),
            ModelSpec::StochasticPredatorPrey {
                prey,
                predators,
                params,
            } => (
                ModelFlow::PredatorPrey(PredatorPreyFlow::new(params)),
                vec![*prey as f64, *predators as f64],
            ),
            ModelSpec::Competition {
                first,
                second,
                params,
            } => (
                ModelFlow::Competition(CompetitionFlow::new(params)),
                vec![*first, *second],
            ),
            ModelSpec::Epidemic {
                susceptible,
                infected,
                params,
            } => (
                ModelFlow::Epidemic(EpidemicFlow::new(params)),
                vec![*susceptible, *infected],
            ),
            ModelSpec::StochasticEpidemic {
                susceptible,
                infected,
                params,
            } => (
                ModelFlow::Epidemic(EpidemicFlow::new(params)),
                vec![*susceptible as f64, *infected as f64],
            ),
        }
    }

    fn track_labels(&self) -> [&'static str; 2] {
        match self {
            ModelSpec::Logistic { .. } | ModelSpec::StochasticLogistic { .. } => {
                ["population", ""]
            }
            ModelSpec::PredatorPrey { .. } | ModelSpec::StochasticPredatorPrey { .. } => {
                ["prey", "predators"]
            }
            ModelSpec::Competition { .. } => ["first", "second"],
            ModelSpec::Epidemic { .. } | ModelSpec::StochasticEpidemic { .. } => {
                ["susceptible", "infected"]
            }
        }
    }
}

/// One simulated population, summarised across replicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedTrack {
    pub label: String,
    pub mean: Vec<f64>,
    pub variance: Vec<f64>,
    pub extinct_fraction: Vec<f64>,
    pub trajectory: TrajectoryRecord<f64>,
}

impl NamedTrack {
    fn new<T: Abundance>(label: &str, trajectory: &Trajectory<T>) -> Self {
        Self {
            label: label.to_string(),
            mean: trajectory.mean_by_generation(),
            variance: trajectory.variance_by_generation(),
            extinct_fraction: trajectory.extinct_fraction_by_generation(),
            trajectory: trajectory.to_f64().to_record(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutput {
    pub name: String,
    pub generations: usize,
    pub replicates: usize,
    pub stochastic: bool,
    pub seed: Option<u64>,
    pub tracks: Vec<NamedTrack>,
    pub reference: Option<OdeSolution>,
}

impl Scenario {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Scenario name must not be empty.");
        }
        if self.generations == 0 {
            bail!("Scenario '{}' needs at least one generation.", self.name);
        }
        if self.replicates == 0 {
            bail!("Scenario '{}' needs at least one replicate.", self.name);
        }
        if let Some(dt) = self.reference_dt {
            if !(dt > 0.0) || !dt.is_finite() {
                bail!("Scenario '{}': reference_dt must be positive.", self.name);
            }
            let steps = self.generations.saturating_sub(1) as f64 / dt;
            if steps.round() > MAX_INTEGRATION_STEPS as f64 {
                bail!(
                    "Scenario '{}': reference_dt {dt} needs more than {MAX_INTEGRATION_STEPS} steps.",
                    self.name
                );
            }
        }
        self.model
            .validate()
            .with_context(|| format!("Invalid parameters for scenario '{}'.", self.name))
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    pub fn run(&self) -> Result<ScenarioOutput> {
        self.validate()?;
        info!(
            scenario = %self.name,
            generations = self.generations,
            replicates = self.replicates,
            "running scenario"
        );

        let n = self.generations;
        let reps = self.replicates;
        let [first_label, second_label] = self.model.track_labels();

        let tracks = match &self.model {
            ModelSpec::Logistic { initial, params } => {
                let trajectory = simulate(&vec![*initial; reps], &mut logistic_map, n, params)?;
                vec![NamedTrack::new(first_label, &trajectory)]
            }
            ModelSpec::StochasticLogistic { initial, params } => {
                let mut transition = StochasticLogistic::new(self.rng());
                let trajectory = simulate(&vec![*initial; reps], &mut transition, n, params)?;
                vec![NamedTrack::new(first_label, &trajectory)]
            }
            ModelSpec::PredatorPrey {
                prey,
                predators,
                params,
            } => {
                let (a, b) = simulate_pair(
                    &vec![*prey; reps],
                    &vec![*predators; reps],
                    &mut predator_prey_map,
                    n,
                    params,
                )?;
                pair_tracks([first_label, second_label], &a, &b)
            }
            ModelSpec::StochasticPredatorPrey {
                prey,
                predators,
                params,
            } => {
                let mut transition = StochasticPredatorPrey::new(self.rng());
                let (a, b) = simulate_pair(
                    &vec![*prey; reps],
                    &vec![*predators; reps],
                    &mut transition,
                    n,
                    params,
                )?;
                pair_tracks([first_label, second_label], &a, &b)
            }
            ModelSpec::Competition {
                first,
                second,
                params,
            } => {
                let (a, b) = simulate_pair(
                    &vec![*first; reps],
                    &vec![*second; reps],
                    &mut competition_map,
                    n,
                    params,
                )?;
                pair_tracks([first_label, second_label], &a, &b)
            }
            ModelSpec::Epidemic {
                susceptible,
                infected,
                params,
            } => {
                let (a, b) = simulate_pair(
                    &vec![*susceptible; reps],
                    &vec![*infected; reps],
                    &mut epidemic_map,
                    n,
                    params,
                )?;
                pair_tracks([first_label, second_label], &a, &b)
            }
            ModelSpec::StochasticEpidemic {
                susceptible,
                infected,
                params,
            } => {
                let mut transition = StochasticEpidemic::new(self.rng());
                let (a, b) = simulate_pair(
                    &vec![*susceptible; reps],
                    &vec![*infected; reps],
                    &mut transition,
                    n,
                    params,
                )?;
                pair_tracks([first_label, second_label], &a, &b)
            }
        };

        let reference = match self.reference_dt {
            Some(dt) => Some(self.reference(dt)?),
            None => None,
        };

        Ok(ScenarioOutput {
            name: self.name.clone(),
            generations: n,
            replicates: reps,
            stochastic: self.model.is_stochastic(),
            seed: self.seed.filter(|_| self.model.is_stochastic()),
            tracks,
            reference,
        })
    }

    /// Integrates the model's flow over `generations - 1` time units.
    fn reference(&self, dt: f64) -> Result<OdeSolution> {
        let horizon = self.generations.saturating_sub(1) as f64;
        let steps = ((horizon / dt).round() as usize).max(1);
        let (flow, initial) = self.model.reference_flow();
        debug!(scenario = %self.name, steps, dt, "computing reference solution");
        integrate(&flow, self.reference_method, &initial, 0.0, dt, steps)
            .with_context(|| format!("Reference solution failed for scenario '{}'.", self.name))
    }
}

fn pair_tracks<T: Abundance>(
    labels: [&str; 2],
    first: &Trajectory<T>,
    second: &Trajectory<T>,
) -> Vec<NamedTrack> {
    vec![
        NamedTrack::new(labels[0], first),
        NamedTrack::new(labels[1], second),
    ]
}

/// The example computations the notebook walks through, in order.
pub fn notebook() -> Vec<Scenario> {
    let scenario = |name: &str, generations, replicates, seed, reference_dt, model| Scenario {
        name: name.to_string(),
        generations,
        replicates,
        seed,
        reference_dt,
        reference_method: OdeMethod::Rk4,
        model,
    };

    vec![
        scenario(
            "logistic-growth",
            40,
            1,
            None,
            Some(0.1),
            ModelSpec::Logistic {
                initial: 2.0,
                params: LogisticParams {
                    growth_rate: 0.5,
                    carrying_capacity: 100.0,
                },
            },
        ),
        scenario(
            "logistic-chaos",
            60,
            1,
            None,
            None,
            ModelSpec::Logistic {
                initial: 10.0,
                params: LogisticParams {
                    growth_rate: 2.7,
                    carrying_capacity: 100.0,
                },
            },
        ),
        scenario(
            "stochastic-logistic",
            60,
            20,
            Some(1),
            Some(0.1),
            ModelSpec::StochasticLogistic {
                initial: 5,
                params: StochasticLogisticParams {
                    fecundity: 0.4,
                    death_probability: 0.1,
                    carrying_capacity: 100.0,
                },
            },
        ),
        scenario(
            "predator-prey",
            300,
            1,
            None,
            Some(0.1),
            ModelSpec::PredatorPrey {
                prey: 100.0,
                predators: 20.0,
                params: predator_prey_params(),
            },
        ),
        scenario(
            "stochastic-predator-prey",
            300,
            10,
            Some(2),
            Some(0.1),
            ModelSpec::StochasticPredatorPrey {
                prey: 100,
                predators: 20,
                params: predator_prey_params(),
            },
        ),
        scenario(
            "competition",
            80,
            1,
            None,
            Some(0.1),
            ModelSpec::Competition {
                first: 5.0,
                second: 5.0,
                params: CompetitionParams {
                    growth_a: 0.5,
                    growth_b: 0.4,
                    capacity_a: 100.0,
                    capacity_b: 80.0,
                    effect_of_b_on_a: 0.6,
                    effect_of_a_on_b: 0.5,
                },
            },
        ),
        scenario(
            "si-epidemic",
            40,
            1,
            None,
            Some(0.1),
            ModelSpec::Epidemic {
                susceptible: 990.0,
                infected: 10.0,
                params: EpidemicParams {
                    transmission: 0.5,
                    recovery: 0.0,
                },
            },
        ),
        scenario(
            "stochastic-sis-epidemic",
            60,
            20,
            Some(3),
            Some(0.1),
            ModelSpec::StochasticEpidemic {
                susceptible: 190,
                infected: 10,
                params: EpidemicParams {
                    transmission: 0.5,
                    recovery: 0.1,
                },
            },
        ),
    ]
}

fn predator_prey_params() -> PredatorPreyParams {
    PredatorPreyParams {
        prey_growth: 0.1,
        prey_capacity: 500.0,
        attack_rate: 0.002,
        conversion: 0.5,
        predator_death: 0.1,
    }
}
