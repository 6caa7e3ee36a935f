//! Numerical building blocks for the field solver.
//!
//! These are stateless algorithms on plain numbers:
//! - [`dense`] - LU factorisation and inversion of real and complex matrices
//! - [`bessel`] - modified Bessel functions K0 and K1
//! - [`series`] - doubly periodic log-sine series with Clenshaw summation
//! - [`conformal`] - polygon-to-disk conformal map
//! - [`fourier`] - transforms over stacks of matrices

pub mod bessel;
pub mod conformal;
pub mod dense;
pub mod fourier;
pub mod series;

pub use conformal::PolygonMap;
pub use dense::{ComplexMatrix, DenseMatrix, RealMatrix};
pub use series::{PeriodicSeries, SeriesTerm};
