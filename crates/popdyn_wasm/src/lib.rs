use wasm_bindgen::prelude::*;

mod flow;
mod scenario;

pub use flow::WasmFlow;
pub use scenario::{notebook_scenarios, run_notebook, WasmScenario};

fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}
