//! Continuous-time counterparts of the example models.
//!
//! The per-generation rates of each parameter struct are read as
//! per-unit-time rates, so one generation of a map lines up with one time
//! unit of its flow.

use crate::models::{CompetitionParams, EpidemicParams, LogisticParams, PredatorPreyParams};
use crate::solvers::{Tsit5, RK4};
use crate::traits::{DynamicalSystem, Steppable};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on the number of steps a single [`integrate`] call records.
pub const MAX_INTEGRATION_STEPS: usize = 10_000_000;

/// `dN/dt = r N (1 - N/K)`
#[derive(Debug, Clone, Copy)]
pub struct LogisticFlow {
    params: LogisticParams,
}

impl LogisticFlow {
    pub fn new(params: &LogisticParams) -> Self {
        Self { params: *params }
    }
}

impl DynamicalSystem<f64> for LogisticFlow {
    fn dimension(&self) -> usize {
        1
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let LogisticParams {
            growth_rate: r,
            carrying_capacity: k,
        } = self.params;
        out[0] = r * x[0] * (1.0 - x[0] / k);
    }
}

/// `dN/dt = r N (1 - N/K) - a N P`, `dP/dt = c a N P - m P`
#[derive(Debug, Clone, Copy)]
pub struct PredatorPreyFlow {
    params: PredatorPreyParams,
}

impl PredatorPreyFlow {
    pub fn new(params: &PredatorPreyParams) -> Self {
        Self { params: *params }
    }
}

impl DynamicalSystem<f64> for PredatorPreyFlow {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let p = &self.params;
        let (prey, predators) = (x[0], x[1]);
        let eaten = p.attack_rate * prey * predators;
        out[0] = p.prey_growth * prey * (1.0 - prey / p.prey_capacity) - eaten;
        out[1] = p.conversion * eaten - p.predator_death * predators;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompetitionFlow {
    params: CompetitionParams,
}

impl CompetitionFlow {
    pub fn new(params: &CompetitionParams) -> Self {
        Self { params: *params }
    }
}

impl DynamicalSystem<f64> for CompetitionFlow {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let p = &self.params;
        let (a, b) = (x[0], x[1]);
        out[0] = p.growth_a * a * (1.0 - (a + p.effect_of_b_on_a * b) / p.capacity_a);
        out[1] = p.growth_b * b * (1.0 - (b + p.effect_of_a_on_b * a) / p.capacity_b);
    }
}

/// `dS/dt = -beta S I / N + gamma I`, `dI/dt = beta S I / N - gamma I`
#[derive(Debug, Clone, Copy)]
pub struct EpidemicFlow {
    params: EpidemicParams,
}

impl EpidemicFlow {
    pub fn new(params: &EpidemicParams) -> Self {
        Self { params: *params }
    }
}

impl DynamicalSystem<f64> for EpidemicFlow {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let (s, i) = (x[0], x[1]);
        let total = s + i;
        if total <= 0.0 {
            out[0] = 0.0;
            out[1] = 0.0;
            return;
        }
        let infections = self.params.transmission * s * i / total;
        let recoveries = self.params.recovery * i;
        out[0] = recoveries - infections;
        out[1] = infections - recoveries;
    }
}

/// Any of the example flows, for callers that pick the model at runtime.
#[derive(Debug, Clone, Copy)]
pub enum ModelFlow {
    Logistic(LogisticFlow),
    PredatorPrey(PredatorPreyFlow),
    Competition(CompetitionFlow),
    Epidemic(EpidemicFlow),
}

impl DynamicalSystem<f64> for ModelFlow {
    fn dimension(&self) -> usize {
        match self {
            ModelFlow::Logistic(f) => f.dimension(),
            ModelFlow::PredatorPrey(f) => f.dimension(),
            ModelFlow::Competition(f) => f.dimension(),
            ModelFlow::Epidemic(f) => f.dimension(),
        }
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        match self {
            ModelFlow::Logistic(f) => f.apply(t, x, out),
            ModelFlow::PredatorPrey(f) => f.apply(t, x, out),
            ModelFlow::Competition(f) => f.apply(t, x, out),
            ModelFlow::Epidemic(f) => f.apply(t, x, out),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OdeMethod {
    #[default]
    Rk4,
    Tsit5,
}

impl OdeMethod {
    fn build(self, dim: usize) -> InternalStepper {
        match self {
            OdeMethod::Rk4 => InternalStepper::Rk4(RK4::new(dim)),
            OdeMethod::Tsit5 => InternalStepper::Tsit5(Tsit5::new(dim)),
        }
    }
}

enum InternalStepper {
    Rk4(RK4<f64>),
    Tsit5(Tsit5<f64>),
}

impl Steppable<f64> for InternalStepper {
    fn step(
        &mut self,
        system: &impl DynamicalSystem<f64>,
        t: &mut f64,
        state: &mut [f64],
        dt: f64,
    ) {
        match self {
            InternalStepper::Rk4(s) => s.step(system, t, state, dt),
            InternalStepper::Tsit5(s) => s.step(system, t, state, dt),
        }
    }
}

/// Sampled solution of a flow; `states` holds one row of `dimension` values
/// per entry of `times`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdeSolution {
    pub dimension: usize,
    pub times: Vec<f64>,
    pub states: Vec<f64>,
}

impl OdeSolution {
    pub fn samples(&self) -> usize {
        self.times.len()
    }

    pub fn state(&self, k: usize) -> Option<&[f64]> {
        let start = k.checked_mul(self.dimension)?;
        self.states.get(start..start + self.dimension)
    }

    /// Time series of state component `i`.
    pub fn component(&self, i: usize) -> Option<Vec<f64>> {
        (i < self.dimension).then(|| {
            self.states
                .chunks(self.dimension)
                .map(|row| row[i])
                .collect()
        })
    }
}

/// Integrates `system` for `steps` fixed steps of size `dt`, recording the
/// initial state and the state after every step.
pub fn integrate<S: DynamicalSystem<f64>>(
    system: &S,
    method: OdeMethod,
    initial_state: &[f64],
    initial_time: f64,
    dt: f64,
    steps: usize,
) -> Result<OdeSolution> {
    let dim = system.dimension();
    if initial_state.is_empty() {
        bail!("Initial state must have positive dimension.");
    }
    if initial_state.len() != dim {
        bail!(
            "Initial state dimension mismatch. Expected {}, got {}.",
            dim,
            initial_state.len()
        );
    }
    if steps == 0 {
        bail!("Integration requires at least one step.");
    }
    if steps > MAX_INTEGRATION_STEPS {
        bail!("Integration is limited to {MAX_INTEGRATION_STEPS} steps, got {steps}.");
    }
    let Some(samples) = steps.checked_add(1) else {
        bail!("Step count {steps} overflows the sample buffer.");
    };
    let Some(values) = samples.checked_mul(dim) else {
        bail!("Solution of {samples} samples in dimension {dim} overflows the state buffer.");
    };
    if !(dt > 0.0) || !dt.is_finite() {
        bail!("Step size dt must be positive.");
    }

    debug!(?method, steps, dt, "integrating reference flow");

    let mut stepper = method.build(dim);
    let mut state = initial_state.to_vec();
    let mut t = initial_time;
    let mut times = Vec::with_capacity(samples);
    let mut states = Vec::with_capacity(values);
    times.push(t);
    states.extend_from_slice(&state);

    for _ in 0..steps {
        stepper.step(system, &mut t, &mut state, dt);
        times.push(t);
        states.extend_from_slice(&state);
    }

    Ok(OdeSolution {
        dimension: dim,
        times,
        states,
    })
}

/// Exact solution of the logistic equation started from `n0` at time 0.
pub fn logistic_closed_form(n0: f64, growth_rate: f64, carrying_capacity: f64, t: f64) -> f64 {
    let growth = (growth_rate * t).exp();
    carrying_capacity * n0 * growth / (carrying_capacity + n0 * (growth - 1.0))
}
