use crate::to_js_error;
use popdyn_core::ode::{integrate, ModelFlow, OdeMethod};
use popdyn_core::solvers::{Tsit5, RK4};
use popdyn_core::traits::{DynamicalSystem, Steppable};
use popdyn_core::ModelSpec;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// Continuous-time counterpart of one model, stepped from JS.
#[wasm_bindgen]
pub struct WasmFlow {
    flow: ModelFlow,
    method: OdeMethod,
    state: Vec<f64>,
    t: f64,
    solver: SolverType,
}

enum SolverType {
    RK4(RK4<f64>),
    Tsit5(Tsit5<f64>),
}

#[wasm_bindgen]
impl WasmFlow {
    /// `model` is a model object as used in scenarios (`{"kind": ..., ...}`);
    /// its initial condition becomes the starting state.
    #[wasm_bindgen(constructor)]
    pub fn new(model: JsValue, solver_name: &str) -> Result<WasmFlow, JsValue> {
        console_error_panic_hook::set_once();

        let model: ModelSpec =
            from_value(model).map_err(|e| JsValue::from_str(&format!("Invalid model: {e}")))?;
        model.validate().map_err(to_js_error)?;
        let (flow, state) = model.reference_flow();
        let dim = flow.dimension();

        let (method, solver) = match solver_name {
            "rk4" => (OdeMethod::Rk4, SolverType::RK4(RK4::new(dim))),
            "tsit5" => (OdeMethod::Tsit5, SolverType::Tsit5(Tsit5::new(dim))),
            _ => return Err(JsValue::from_str("Unknown solver")),
        };

        Ok(WasmFlow {
            flow,
            method,
            state,
            t: 0.0,
            solver,
        })
    }

    pub fn dimension(&self) -> usize {
        self.flow.dimension()
    }

    pub fn set_state(&mut self, state: &[f64]) -> Result<(), JsValue> {
        if state.len() != self.flow.dimension() {
            return Err(JsValue::from_str(&format!(
                "State dimension mismatch. Expected {}, got {}.",
                self.flow.dimension(),
                state.len()
            )));
        }
        self.state = state.to_vec();
        Ok(())
    }

    pub fn get_state(&self) -> Vec<f64> {
        self.state.clone()
    }

    pub fn set_t(&mut self, t: f64) {
        self.t = t;
    }

    pub fn get_t(&self) -> f64 {
        self.t
    }

    pub fn step(&mut self, dt: f64) {
        match &mut self.solver {
            SolverType::RK4(s) => s.step(&self.flow, &mut self.t, &mut self.state, dt),
            SolverType::Tsit5(s) => s.step(&self.flow, &mut self.t, &mut self.state, dt),
        }
    }

    /// Integrates `steps` steps from the current state and time, returning
    /// the sampled solution and leaving the flow at its final point.
    pub fn integrate(&mut self, steps: usize, dt: f64) -> Result<JsValue, JsValue> {
        let solution = integrate(&self.flow, self.method, &self.state, self.t, dt, steps)
            .map_err(to_js_error)?;
        if let (Some(&t), Some(last)) = (solution.times.last(), solution.state(steps)) {
            self.t = t;
            self.state = last.to_vec();
        }
        to_value(&solution)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize solution: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::WasmFlow;
    use popdyn_core::models::LogisticParams;
    use popdyn_core::ode::{logistic_closed_form, OdeSolution};
    use popdyn_core::ModelSpec;
    use serde_wasm_bindgen::{from_value, to_value};
    use wasm_bindgen_test::wasm_bindgen_test;

    fn logistic_model() -> wasm_bindgen::JsValue {
        let model = ModelSpec::Logistic {
            initial: 10.0,
            params: LogisticParams::new(0.5, 100.0).expect("params"),
        };
        to_value(&model).expect("model value")
    }

    #[wasm_bindgen_test]
    fn stepping_tracks_the_closed_form() {
        let mut flow = WasmFlow::new(logistic_model(), "rk4").expect("flow");
        assert_eq!(flow.dimension(), 1);
        assert_eq!(flow.get_state(), vec![10.0]);
        for _ in 0..100 {
            flow.step(0.05);
        }
        let exact = logistic_closed_form(10.0, 0.5, 100.0, flow.get_t());
        assert!((flow.get_state()[0] - exact).abs() < 1e-6);
    }

    #[wasm_bindgen_test]
    fn integrate_advances_the_flow() {
        let mut flow = WasmFlow::new(logistic_model(), "tsit5").expect("flow");
        let solution: OdeSolution =
            from_value(flow.integrate(20, 0.1).expect("integrate")).expect("decode");
        assert_eq!(solution.samples(), 21);
        assert!((flow.get_t() - 2.0).abs() < 1e-12);
        assert_eq!(Some(flow.get_state().as_slice()), solution.state(20));
    }

    #[wasm_bindgen_test]
    fn rejects_unknown_solver_and_bad_state() {
        let message = WasmFlow::new(logistic_model(), "euler")
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(message.contains("Unknown solver"));

        let mut flow = WasmFlow::new(logistic_model(), "rk4").expect("flow");
        assert!(flow.set_state(&[1.0, 2.0]).is_err());
        assert!(flow.set_state(&[50.0]).is_ok());
    }
}
