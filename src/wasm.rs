//! WASM bindings for Wirecell Core.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCell } from 'wirecell_core';
//!
//! await init();
//!
//! const cell = new WasmCell(`
//!   wire 0 0 20um 1500 anode
//!   plane y -0.5 0 cathode
//!   plane y  0.5 0 cathode
//!   .period x 0.5
//!   .readout anode
//! `);
//!
//! const [status, ex, ey, ez, v] = cell.field(0.1, 0.2, 0.0);
//! const w = cell.weighting_potential(0.1, 0.2, 0.0, 'anode');
//! ```

use wasm_bindgen::prelude::*;

use crate::analytic::AnalyticField;
use crate::dsl;
use crate::error::FieldError;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn js_error(e: FieldError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// A cell built from its text description.
#[wasm_bindgen]
pub struct WasmCell {
    field: AnalyticField,
}

#[wasm_bindgen]
impl WasmCell {
    /// Parse and solve a cell description.
    ///
    /// Fails if the text does not parse or the cell cannot be solved.
    #[wasm_bindgen(constructor)]
    pub fn new(cell_dsl: &str) -> Result<WasmCell, JsValue> {
        let ast = dsl::parse(cell_dsl).map_err(js_error)?;
        if ast.elements.is_empty() {
            return Err(js_error(FieldError::WasmError {
                message: "the cell description has no electrodes".to_string(),
            }));
        }
        let mut field = ast.build().map_err(js_error)?;
        field.prepare().map_err(js_error)?;
        Ok(WasmCell { field })
    }

    /// Field and potential at a point as `[status, ex, ey, ez, v]`.
    #[wasm_bindgen]
    pub fn field(&mut self, x: f64, y: f64, z: f64) -> Vec<f64> {
        let (status, e) = self.field.electric_field_potential(x, y, z);
        vec![f64::from(status), e.ex, e.ey, e.ez, e.v]
    }

    /// Weighting potential of a readout group; 0 if the group is unknown.
    #[wasm_bindgen]
    pub fn weighting_potential(&mut self, x: f64, y: f64, z: f64, label: &str) -> f64 {
        self.field.weighting_potential(x, y, z, label)
    }

    /// Weighting field of a readout group as `[wx, wy, wz]`.
    #[wasm_bindgen]
    pub fn weighting_field(&mut self, x: f64, y: f64, z: f64, label: &str) -> Vec<f64> {
        let (wx, wy, wz) = self.field.weighting_field(x, y, z, label);
        vec![wx, wy, wz]
    }

    /// Number of wires as entered.
    #[wasm_bindgen(getter)]
    pub fn wire_count(&self) -> usize {
        self.field.number_of_wires()
    }

    /// Topology tag of the solved cell, e.g. "B2Y".
    #[wasm_bindgen(getter)]
    pub fn cell_type(&mut self) -> Option<String> {
        self.field.cell_type().map(|kind| kind.to_string())
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
