pub mod error;
pub mod models;
pub mod ode;
pub mod scenario;
pub mod simulate;
pub mod solvers;
/// The `popdyn_core` crate runs discrete-time population models generation by
/// generation and compares them with their continuous-time counterparts.
/// State vectors are generic over the element type, so the same drivers serve
/// integer counts and floating-point densities.
///
/// Key components:
/// - **Drivers**: `simulate` (one state vector) and `simulate_pair` (two vectors in lockstep).
/// - **Traits**: `Transition`/`PairTransition` (update rules), `Abundance` (element type),
///   `DynamicalSystem` and `Steppable` (reference flows and their integrators).
/// - **Models**: logistic, predator-prey, competition and SI(S) rules, deterministic and stochastic.
/// - **Reference solutions**: RK4/Tsit5 integration of each model's flow.
/// - **Scenarios**: serialisable run requests shared by the CLI and WASM front-ends.
pub mod traits;
pub mod trajectory;

pub use error::SimulationError;
pub use scenario::{notebook, ModelSpec, Scenario, ScenarioOutput};
pub use simulate::{simulate, simulate_pair};
pub use traits::{pair_transition_fn, transition_fn, Abundance, PairTransition, Transition};
pub use trajectory::{Trajectory, TrajectoryRecord};
