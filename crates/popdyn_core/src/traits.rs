use num_traits::{Float, FromPrimitive, NumCast, ToPrimitive, Zero};
use std::fmt::Debug;

/// A trait for floating-point types the reference integrators run on.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Element type of a state vector: a population count (`u64`, `i64`) or a
/// density (`f32`, `f64`).
pub trait Abundance: nalgebra::Scalar + Copy + PartialOrd + Zero + NumCast + ToPrimitive {
    /// Converts to `f64` for summaries. Values that do not fit become NaN.
    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

impl<T> Abundance for T where T: nalgebra::Scalar + Copy + PartialOrd + Zero + NumCast + ToPrimitive {}

/// Per-generation update rule for one state vector.
///
/// `params` is handed over unchanged on every step. Implementations must not
/// carry history between calls; anything they need comes in through `state`.
/// Stochastic rules own their random source.
pub trait Transition<T, P> {
    fn step(&mut self, state: &[T], params: &P) -> anyhow::Result<Vec<T>>;
}

impl<T, P, F> Transition<T, P> for F
where
    F: FnMut(&[T], &P) -> anyhow::Result<Vec<T>>,
{
    fn step(&mut self, state: &[T], params: &P) -> anyhow::Result<Vec<T>> {
        self(state, params)
    }
}

/// Joint update rule for two state vectors advanced in lockstep.
pub trait PairTransition<T, P> {
    fn step(&mut self, first: &[T], second: &[T], params: &P)
        -> anyhow::Result<(Vec<T>, Vec<T>)>;
}

impl<T, P, F> PairTransition<T, P> for F
where
    F: FnMut(&[T], &[T], &P) -> anyhow::Result<(Vec<T>, Vec<T>)>,
{
    fn step(
        &mut self,
        first: &[T],
        second: &[T],
        params: &P,
    ) -> anyhow::Result<(Vec<T>, Vec<T>)> {
        self(first, second, params)
    }
}

/// Pins a closure to the [`Transition`] signature so its argument and return
/// types are inferred at the definition site.
pub fn transition_fn<T, P, F>(f: F) -> F
where
    F: FnMut(&[T], &P) -> anyhow::Result<Vec<T>>,
{
    f
}

/// Pair counterpart of [`transition_fn`].
pub fn pair_transition_fn<T, P, F>(f: F) -> F
where
    F: FnMut(&[T], &[T], &P) -> anyhow::Result<(Vec<T>, Vec<T>)>,
{
    f
}

/// Represents a continuous-time dynamical system.
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// x: current state
    /// t: current time
    /// out: buffer to write dx/dt
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

/// A trait for solvers that can step a system forward.
pub trait Steppable<T: Scalar> {
    /// Performs one step of size dt.
    /// t: current time (updated after step)
    /// state: current state (updated after step)
    /// dt: step size
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}
