//! Cell geometry, validation and classification.
//!
//! A [`Cell`] holds wires, planes, a tube and periodicity as entered by the
//! user. [`check_cell`] folds and prunes it into a [`CheckedCell`], and
//! [`classify`] picks the analytic [`CellType`] that the solver uses.

mod check;
mod classify;
mod geometry;
mod types;

pub use check::{check_cell, fold, fold_phi, in_tube, CheckedCell};
pub use classify::classify;
pub use geometry::{Cell, Symmetry};
pub use types::*;
