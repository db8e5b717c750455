//! Generation-by-generation drivers.
//!
//! Both drivers allocate a trajectory once, place the initial condition at
//! generation 0 and fill every later generation from the one before it.

use crate::error::SimulationError;
use crate::traits::{Abundance, PairTransition, Transition};
use crate::trajectory::Trajectory;
use nalgebra::DMatrix;
use tracing::{debug, trace};

/// Advances one state vector for `generations` generations.
///
/// Generation 0 is `initial` as given; generation `t` is
/// `transition.step(generation[t - 1], params)`. With `generations == 1` the
/// transition is never called.
pub fn simulate<T, P, F>(
    initial: &[T],
    transition: &mut F,
    generations: usize,
    params: &P,
) -> Result<Trajectory<T>, SimulationError>
where
    T: Abundance,
    F: Transition<T, P> + ?Sized,
{
    if generations == 0 {
        return Err(SimulationError::NoGenerations);
    }

    let replicates = initial.len();
    debug!(generations, replicates, "single-track simulation");

    let mut data = DMatrix::<T>::zeros(generations, replicates);
    write_generation(&mut data, 0, initial);

    let mut current = initial.to_vec();
    for t in 1..generations {
        let next = transition.step(&current, params)?;
        check_shape(t, replicates, next.len())?;
        write_generation(&mut data, t, &next);
        trace!(generation = t, "advanced");
        current = next;
    }

    Ok(Trajectory::from_matrix(data))
}

/// Advances two state vectors in lockstep for `generations` generations.
///
/// Both initial vectors must have the same length; this is checked before the
/// transition runs.
pub fn simulate_pair<T, P, F>(
    initial_first: &[T],
    initial_second: &[T],
    transition: &mut F,
    generations: usize,
    params: &P,
) -> Result<(Trajectory<T>, Trajectory<T>), SimulationError>
where
    T: Abundance,
    F: PairTransition<T, P> + ?Sized,
{
    if initial_first.len() != initial_second.len() {
        return Err(SimulationError::TrackLengthMismatch {
            first: initial_first.len(),
            second: initial_second.len(),
        });
    }
    if generations == 0 {
        return Err(SimulationError::NoGenerations);
    }

    let replicates = initial_first.len();
    debug!(generations, replicates, "dual-track simulation");

    let mut first = DMatrix::<T>::zeros(generations, replicates);
    let mut second = DMatrix::<T>::zeros(generations, replicates);
    write_generation(&mut first, 0, initial_first);
    write_generation(&mut second, 0, initial_second);

    let mut current = (initial_first.to_vec(), initial_second.to_vec());
    for t in 1..generations {
        let (next_first, next_second) = transition.step(&current.0, &current.1, params)?;
        check_shape(t, replicates, next_first.len())?;
        check_shape(t, replicates, next_second.len())?;
        write_generation(&mut first, t, &next_first);
        write_generation(&mut second, t, &next_second);
        trace!(generation = t, "advanced");
        current = (next_first, next_second);
    }

    Ok((Trajectory::from_matrix(first), Trajectory::from_matrix(second)))
}

fn check_shape(generation: usize, expected: usize, actual: usize) -> Result<(), SimulationError> {
    if actual != expected {
        return Err(SimulationError::ShapeMismatch {
            generation,
            expected,
            actual,
        });
    }
    Ok(())
}

fn write_generation<T: Abundance>(data: &mut DMatrix<T>, t: usize, values: &[T]) {
    for (r, value) in values.iter().enumerate() {
        data[(t, r)] = *value;
    }
}
