use crate::to_js_error;
use popdyn_core::{notebook, Scenario};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmScenario {
    scenario: Scenario,
}

#[wasm_bindgen]
impl WasmScenario {
    #[wasm_bindgen(constructor)]
    pub fn new(scenario: JsValue) -> Result<WasmScenario, JsValue> {
        console_error_panic_hook::set_once();

        let scenario: Scenario = from_value(scenario)
            .map_err(|e| JsValue::from_str(&format!("Invalid scenario: {e}")))?;
        scenario.validate().map_err(to_js_error)?;
        Ok(WasmScenario { scenario })
    }

    pub fn name(&self) -> String {
        self.scenario.name.clone()
    }

    /// Overrides the seed; only meaningful for stochastic models.
    pub fn set_seed(&mut self, seed: u64) {
        self.scenario.seed = Some(seed);
    }

    pub fn run(&self) -> Result<JsValue, JsValue> {
        let output = self.scenario.run().map_err(to_js_error)?;
        to_value(&output)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize output: {e}")))
    }
}

/// The built-in scenario definitions, for a front-end to display or edit.
#[wasm_bindgen]
pub fn notebook_scenarios() -> Result<JsValue, JsValue> {
    to_value(&notebook())
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize scenarios: {e}")))
}

/// Runs every built-in scenario in order and returns the array of outputs.
#[wasm_bindgen]
pub fn run_notebook() -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let outputs = notebook()
        .iter()
        .map(Scenario::run)
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(to_js_error)?;
    to_value(&outputs).map_err(|e| JsValue::from_str(&format!("Failed to serialize output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::{notebook_scenarios, run_notebook, WasmScenario};
    use popdyn_core::models::EpidemicParams;
    use popdyn_core::ode::OdeMethod;
    use popdyn_core::{ModelSpec, Scenario, ScenarioOutput};
    use serde_wasm_bindgen::{from_value, to_value};
    use wasm_bindgen_test::wasm_bindgen_test;

    fn epidemic(generations: usize) -> Scenario {
        Scenario {
            name: "tiny".to_string(),
            generations,
            replicates: 1,
            seed: None,
            reference_dt: None,
            reference_method: OdeMethod::default(),
            model: ModelSpec::Epidemic {
                susceptible: 9.0,
                infected: 1.0,
                params: EpidemicParams::new(0.5, 0.0).expect("params"),
            },
        }
    }

    #[wasm_bindgen_test]
    fn scenario_runs_and_returns_tracks() {
        let value = to_value(&epidemic(5)).expect("scenario value");
        let scenario = WasmScenario::new(value).expect("valid scenario");
        assert_eq!(scenario.name(), "tiny");

        let output: ScenarioOutput = from_value(scenario.run().expect("run")).expect("output");
        assert_eq!(output.generations, 5);
        assert_eq!(output.tracks.len(), 2);
    }

    #[wasm_bindgen_test]
    fn zero_generations_are_rejected_up_front() {
        let value = to_value(&epidemic(0)).expect("scenario value");
        let message = WasmScenario::new(value)
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(message.contains("generation"), "unexpected message: {message}");
    }

    #[wasm_bindgen_test]
    fn notebook_round_trips_through_js() {
        let scenarios: Vec<Scenario> =
            from_value(notebook_scenarios().expect("scenarios")).expect("decode");
        let outputs: Vec<ScenarioOutput> =
            from_value(run_notebook().expect("notebook")).expect("decode");
        assert_eq!(scenarios.len(), outputs.len());
        for (scenario, output) in scenarios.iter().zip(&outputs) {
            assert_eq!(scenario.name, output.name);
        }
    }
}
