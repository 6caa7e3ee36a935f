//! # Wirecell Core
//!
//! Analytic electrostatics for wire-chamber detector cells.
//!
//! A cell is a two-dimensional arrangement of thin wires running along z,
//! optionally bounded by up to two planes per axis or by a circular or
//! polygonal tube, and optionally periodic in x and/or y. The wire charges
//! are solved once from the wire potentials with closed-form Green's
//! functions; the field anywhere in the cell is then a sum of analytic
//! terms.
//!
//! This library provides:
//! - Cell geometry with validation and classification into the supported
//!   topologies
//! - Capacitance solves and direct evaluation of E and V, including 3D
//!   point charges
//! - Weighting fields of wires, planes, the tube, strips and pixels for
//!   signal induction
//! - A text format for cell descriptions
//!
//! ## Architecture
//!
//! - [`cell`] - Geometry, checks and topology classification
//! - [`solver`] - Green's functions and the charge solve
//! - [`field`] - Direct field evaluation and geometric queries
//! - [`signal`] - Weighting fields for readout electrodes
//! - [`analytic`] - The [`AnalyticField`] facade tying it together
//! - [`dsl`] - Parser for the cell description language
//! - [`numerics`] - Dense solves, Bessel functions, series and FFTs
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! wirecell mwpc.cell --point 0.1,0.2,0 --point 0.2,0.1,0
//! wirecell mwpc.cell --from 0,-0.5,0 --to 0,0.5,0 --steps 100 --weighting anode
//! ```
//!
//! ### Library
//!
//! ```no_run
//! use wirecell_core::AnalyticField;
//!
//! let mut field = AnalyticField::new();
//! field.add_wire(0.0, 0.0, 20e-4, 1500.0, "anode")?;
//! field.add_plane_y(-0.5, 0.0, "cathode")?;
//! field.add_plane_y(0.5, 0.0, "cathode")?;
//! let (status, value) = field.electric_field_potential(0.1, 0.2, 0.0);
//! # Ok::<(), wirecell_core::FieldError>(())
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmCell } from 'wirecell_core';
//!
//! const cell = new WasmCell(cellText);
//! const [status, ex, ey, ez, v] = cell.field(0.1, 0.2, 0.0);
//! ```
//!
//! Units are cm for lengths, V for potentials, V/cm for fields and fC for
//! point charges.

pub mod analytic;
pub mod cell;
pub mod dsl;
pub mod error;
pub mod field;
pub mod medium;
pub mod numerics;
pub mod signal;
pub mod solver;

// Re-export main types for convenience
pub use analytic::{AnalyticField, FieldConfig};
pub use cell::CellType;
pub use error::{FieldError, Result};
pub use field::{FieldValue, Status};
pub use medium::{Medium, MediumMap};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmCell;

/// Lower bound below which distances and denominators count as zero
pub const SMALL: f64 = 1e-20;

/// Conversion between point charges as entered and charges in units of 4πε0
pub const FOUR_PI_EPSILON0: f64 = 1.112650056e-14;

/// Default number of Bessel terms in the point-charge series
pub const DEFAULT_N_TERM_BESSEL: usize = 10;

/// Default number of terms in the near-zone polynomial
pub const DEFAULT_N_TERM_POLY: usize = 100;
