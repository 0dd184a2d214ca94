use wasm_bindgen::prelude::*;

pub mod engine;
pub mod formulas;
pub mod math;

use engine::{ConfigError, FractalDefinition, Vec4};
use formulas::presets::FractalRegistry;
use formulas::FormulaId;

/// Initialize the WASM module (call once from JS).
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&JsValue::from_str(concat!("fractal-core ", env!("CARGO_PKG_VERSION"), " ready")));
}

/// Evaluate a batch of sample points against a JSON fractal definition.
///
/// `points`: Float64Array of xyz triples
/// `out`: Float64Array receiving (distance, color) pairs
///
/// Returns the number of points evaluated (bounded by both buffers).
#[wasm_bindgen]
pub fn evaluate_points(
    definition_json: &str,
    points: &[f64],
    max_iterations: u32,
    bailout: f64,
    out: &mut [f64],
) -> Result<u32, JsValue> {
    let def = FractalDefinition::from_json(definition_json).map_err(to_js_error)?;
    Ok(evaluate_into(&def, points, max_iterations, bailout, out) as u32)
}

/// JSON of a stock preset, for the settings editor to start from.
#[wasm_bindgen]
pub fn builtin_definition(name: &str) -> Result<String, JsValue> {
    let registry = FractalRegistry::builtin();
    registry
        .get(name)
        .and_then(FractalDefinition::to_json)
        .map_err(to_js_error)
}

/// Internal names of every formula, in registry order.
#[wasm_bindgen]
pub fn formula_names() -> js_sys::Array {
    FormulaId::ALL
        .iter()
        .map(|id| JsValue::from_str(id.info().internal_name))
        .collect()
}

/// Evaluate xyz triples from `points` into (distance, color) pairs in `out`.
pub fn evaluate_into(
    def: &FractalDefinition,
    points: &[f64],
    max_iterations: u32,
    bailout: f64,
    out: &mut [f64],
) -> usize {
    let mut count = 0;
    for (p, pair) in points.chunks_exact(3).zip(out.chunks_exact_mut(2)) {
        let sample = engine::evaluate(Vec4::xyz(p[0], p[1], p[2]), def, max_iterations, bailout);
        pair[0] = sample.distance;
        pair[1] = sample.color;
        count += 1;
    }
    count
}

fn to_js_error(err: ConfigError) -> JsValue {
    let message = err.to_string();
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&JsValue::from_str(&message));
    js_sys::Error::new(&message).into()
}
