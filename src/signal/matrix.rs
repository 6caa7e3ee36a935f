//! Signal matrices, one per Fourier layer.
//!
//! A periodic cell can be treated as `N` explicit copies of the basic cell
//! along each periodic axis. The potential matrix between the wires of the
//! basic cell and those of copy `m` is `B_m`; the full matrix is block
//! circulant, so it is diagonalised by a DFT over `m`. Each transformed
//! layer is inverted on its own and the result transformed back, giving
//! the blocks `H_m` of the inverse.

use log::{debug, error};
use num_complex::Complex64;

use crate::cell::{CellType, CheckedCell};
use crate::error::{FieldError, Result};
use crate::numerics::fourier::{transform_layers, Direction};
use crate::numerics::ComplexMatrix;
use crate::solver::{Potential, SourceSite};

/// Green's function family used for the signal matrices, and the axes
/// along which copies of the cell are summed explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourierSetup {
    pub kind: CellType,
    /// Copies along x
    pub nx: usize,
    /// Copies along y
    pub ny: usize,
}

impl FourierSetup {
    /// Pick the signal topology for a cell type and mode count.
    ///
    /// With `n_fourier == 0` the cell's own periodic Green's function is
    /// used directly. Otherwise the periodicity is replaced by `n_fourier`
    /// explicit copies, which must be a power of two.
    pub fn select(kind: CellType, n_fourier: usize) -> Result<Self> {
        let unsupported = || FieldError::UnsupportedSignalCell {
            cell_type: kind.name().to_string(),
        };
        if n_fourier == 0 {
            return match kind {
                CellType::A
                | CellType::B2X
                | CellType::B2Y
                | CellType::C2X
                | CellType::C2Y
                | CellType::C3
                | CellType::D1
                | CellType::D3 => Ok(Self { kind, nx: 1, ny: 1 }),
                _ => Err(unsupported()),
            };
        }
        if !n_fourier.is_power_of_two() {
            return Err(FieldError::InvalidFourierCount { count: n_fourier });
        }

        let signal_kind = match kind {
            CellType::A | CellType::B1X | CellType::B1Y | CellType::C1 => CellType::A,
            CellType::B2X | CellType::C2X => CellType::B2X,
            CellType::B2Y | CellType::C2Y => CellType::B2Y,
            CellType::C3 => CellType::C3,
            CellType::D1 => CellType::D1,
            CellType::D3 => CellType::D3,
            _ => return Err(unsupported()),
        };
        let copies_x = matches!(kind, CellType::B1X | CellType::C1 | CellType::C2Y);
        let copies_y = matches!(kind, CellType::B1Y | CellType::C1 | CellType::C2X);
        let n = if n_fourier > 1 { n_fourier } else { 1 };
        Ok(Self {
            kind: signal_kind,
            nx: if copies_x { n } else { 1 },
            ny: if copies_y { n } else { 1 },
        })
    }

    /// Number of layers.
    pub fn layers(&self) -> usize {
        self.nx * self.ny
    }

    /// Copy index along an axis for a storage index: `0..=n/2` map to
    /// themselves, the rest wrap around to negative copies.
    fn copy_index(k: usize, n: usize) -> i64 {
        if k <= n / 2 {
            k as i64
        } else {
            k as i64 - n as i64
        }
    }

    /// Source displacement of every layer, in storage order.
    pub fn shifts(&self, sx: f64, sy: f64) -> Vec<(f64, f64)> {
        let mut shifts = Vec::with_capacity(self.layers());
        for kx in 0..self.nx {
            for ky in 0..self.ny {
                let mx = Self::copy_index(kx, self.nx);
                let my = Self::copy_index(ky, self.ny);
                shifts.push((mx as f64 * sx, my as f64 * sy));
            }
        }
        shifts
    }
}

/// Inverse signal matrix of one layer.
#[derive(Debug, Clone)]
pub struct SignalLayer {
    /// Displacement of the copy this layer couples to
    pub shift: (f64, f64),
    /// Block `H_m` of the inverse potential matrix
    pub inverse: ComplexMatrix,
}

/// Potential matrix between the basic cell and one displaced copy.
fn layer_matrix(potential: &Potential, sites: &[SourceSite], shift: (f64, f64)) -> ComplexMatrix {
    let n = sites.len();
    let mut m = ComplexMatrix::zeros(n);
    let unshifted = shift == (0.0, 0.0);
    for (i, target) in sites.iter().enumerate() {
        let probe = potential.probe(target.x, target.y);
        for (j, source) in sites.iter().enumerate() {
            let v = if i == j && unshifted {
                potential.self_term(source)
            } else {
                potential.unit_term(&probe, source, shift).v
            };
            m.set(i, j, Complex64::new(v, 0.0));
        }
    }
    m
}

/// Build and invert the signal matrices of every layer.
pub fn build_layers(
    cell: &CheckedCell,
    setup: &FourierSetup,
    potential: &Potential,
    sites: &[SourceSite],
) -> Result<Vec<SignalLayer>> {
    let shifts = setup.shifts(cell.sx, cell.sy);
    let mut blocks: Vec<ComplexMatrix> = shifts
        .iter()
        .map(|&shift| layer_matrix(potential, sites, shift))
        .collect();

    transform_layers(&mut blocks, setup.nx, setup.ny, Direction::Forward);
    for (k, block) in blocks.iter_mut().enumerate() {
        *block = block.invert().map_err(|e| {
            error!("PrepareSignals: signal matrix of layer {} is singular", k);
            e
        })?;
    }
    transform_layers(&mut blocks, setup.nx, setup.ny, Direction::Inverse);
    debug!(
        "PrepareSignals: {} layer(s) of {}x{} signal matrices ({})",
        blocks.len(),
        sites.len(),
        sites.len(),
        setup.kind
    );

    Ok(shifts
        .into_iter()
        .zip(blocks)
        .map(|(shift, inverse)| SignalLayer { shift, inverse })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{check_cell, classify, Axis, Cell, Wire};
    use approx::assert_relative_eq;

    #[test]
    fn test_natural_mode_rejects_open_rows() {
        assert!(FourierSetup::select(CellType::B2X, 0).is_ok());
        assert!(matches!(
            FourierSetup::select(CellType::B1X, 0),
            Err(FieldError::UnsupportedSignalCell { .. })
        ));
        assert!(matches!(
            FourierSetup::select(CellType::C1, 3),
            Err(FieldError::InvalidFourierCount { count: 3 })
        ));
        assert!(FourierSetup::select(CellType::D2, 1).is_err());
    }

    #[test]
    fn test_copies_follow_periodic_axes() {
        let s = FourierSetup::select(CellType::C2X, 4).unwrap();
        assert_eq!((s.kind, s.nx, s.ny), (CellType::B2X, 1, 4));
        let s = FourierSetup::select(CellType::C1, 2).unwrap();
        assert_eq!((s.kind, s.nx, s.ny), (CellType::A, 2, 2));
        let s = FourierSetup::select(CellType::B1X, 1).unwrap();
        assert_eq!(s.layers(), 1);
    }

    #[test]
    fn test_shift_order() {
        let s = FourierSetup {
            kind: CellType::A,
            nx: 4,
            ny: 1,
        };
        let xs: Vec<f64> = s.shifts(2.0, 1.0).into_iter().map(|(x, _)| x).collect();
        assert_eq!(xs, vec![0.0, 2.0, 4.0, -2.0]);
    }

    #[test]
    fn test_single_layer_inverts_potential_matrix() {
        let mut cell = Cell::new();
        cell.add_wire(Wire::new(0.0, 0.0, 0.01, 100.0, "a")).unwrap();
        cell.add_wire(Wire::new(0.3, 0.1, 0.01, 0.0, "b")).unwrap();
        cell.add_plane(Axis::Y, -0.5, 0.0, "g").unwrap();
        let mut checked = check_cell(&cell).unwrap();
        let kind = classify(&mut checked).unwrap();
        let setup = FourierSetup::select(kind, 0).unwrap();
        let potential = Potential::new(&checked, setup.kind).unwrap();
        let sites: Vec<SourceSite> = checked
            .wires
            .iter()
            .map(|w| potential.site(w.x, w.y, w.radius()))
            .collect();
        let layers = build_layers(&checked, &setup, &potential, &sites).unwrap();
        let b = layer_matrix(&potential, &sites, (0.0, 0.0));
        let h = &layers[0].inverse;
        for i in 0..2 {
            for j in 0..2 {
                let mut sum = Complex64::new(0.0, 0.0);
                for k in 0..2 {
                    sum += b.get(i, k) * h.get(k, j);
                }
                assert_relative_eq!(sum.re, if i == j { 1.0 } else { 0.0 }, epsilon = 1e-10);
            }
        }
    }
}
