use crate::traits::{DynamicalSystem, Scalar, Steppable};

fn constant<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

/// Classic Runge-Kutta 4th Order Solver
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![T::zero(); dim],
            k2: vec![T::zero(); dim],
            k3: vec![T::zero(); dim],
            k4: vec![T::zero(); dim],
            tmp: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let half: T = constant(0.5);
        let sixth: T = constant(1.0 / 6.0);
        let two: T = constant(2.0);

        let t0 = *t;

        // k1 = f(t, y)
        system.apply(t0, state, &mut self.k1);

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k1[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k2);

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k2[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k3);

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4);

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..state.len() {
            state[i] = state[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
    }
}

/// Tsitouras 5/4 Solver, used here with a fixed step.
pub struct Tsit5<T: Scalar> {
    k: [Vec<T>; 6],
    tmp: Vec<T>,
}

// Butcher tableau rows a_{i,j} for stages 2..=6, then the 5th order weights.
const TSIT5_C: [f64; 5] = [0.161, 0.327, 0.9, 0.9800255409045097, 1.0];
const TSIT5_A: [&[f64]; 5] = [
    &[0.161],
    &[-0.008480655492356989, 0.335480655492357],
    &[2.898, -6.359447987781783, 4.361447987781783],
    &[
        5.325864858437957,
        -11.748883564062828,
        7.495539342889693,
        -0.09249506636030195,
    ],
    &[
        5.86145544294642,
        -12.92096931784711,
        8.159367898576159,
        -0.071584973281401,
        -0.02826857949054663,
    ],
];
const TSIT5_B: [f64; 6] = [
    0.09646076681806523,
    0.01,
    0.4798896504144996,
    1.379008574103742,
    -3.290069515436099,
    2.324710524099774,
];

impl<T: Scalar> Tsit5<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k: std::array::from_fn(|_| vec![z; dim]),
            tmp: vec![z; dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for Tsit5<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let t0 = *t;

        system.apply(t0, state, &mut self.k[0]);

        for (stage, row) in TSIT5_A.iter().enumerate() {
            for i in 0..state.len() {
                let mut incr = T::zero();
                for (j, &a) in row.iter().enumerate() {
                    incr = incr + constant::<T>(a) * self.k[j][i];
                }
                self.tmp[i] = state[i] + dt * incr;
            }
            let c: T = constant(TSIT5_C[stage]);
            system.apply(t0 + c * dt, &self.tmp, &mut self.k[stage + 1]);
        }

        for i in 0..state.len() {
            let mut incr = T::zero();
            for (j, &b) in TSIT5_B.iter().enumerate() {
                incr = incr + constant::<T>(b) * self.k[j][i];
            }
            state[i] = state[i] + dt * incr;
        }

        *t = t0 + dt;
    }
}

#[cfg(test)]
mod tests {
    use super::{Tsit5, RK4};
    use crate::traits::{DynamicalSystem, Steppable};

    struct Decay {
        rate: f64,
    }

    impl DynamicalSystem<f64> for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -self.rate * x[0];
        }
    }

    fn run(stepper: &mut impl Steppable<f64>, steps: usize, dt: f64) -> (f64, f64) {
        let system = Decay { rate: 0.7 };
        let mut state = [2.0];
        let mut t = 0.0;
        for _ in 0..steps {
            stepper.step(&system, &mut t, &mut state, dt);
        }
        (t, state[0])
    }

    #[test]
    fn rk4_tracks_exponential_decay() {
        let (t, x) = run(&mut RK4::new(1), 100, 0.01);
        assert!((t - 1.0).abs() < 1e-12);
        assert!((x - 2.0 * (-0.7_f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn tsit5_tracks_exponential_decay() {
        let (t, x) = run(&mut Tsit5::new(1), 10, 0.1);
        assert!((t - 1.0).abs() < 1e-12);
        assert!((x - 2.0 * (-0.7_f64).exp()).abs() < 1e-7);
    }
}
