//! Capacitance matrix assembly and the wire charge solve.

use log::{debug, info};

use crate::cell::{CheckedCell, PlaneSlot};
use crate::error::{FieldError, Result};
use crate::numerics::RealMatrix;

use super::potential::{Potential, SourceSite};

/// Linear potential `a·x + b·y + c` imposed by the planes and the tube.
///
/// The Green's functions hold every conductor at zero; this term restores
/// the plane voltages. It is subtracted from the wire voltages before the
/// solve and added back to every field evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Background {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Background {
    /// Derive the background from the planes or tube of a checked cell.
    pub fn from_cell(cell: &CheckedCell) -> Self {
        if let Some(tube) = &cell.tube {
            return Self {
                a: 0.0,
                b: 0.0,
                c: tube.voltage,
            };
        }
        let has = |slot| cell.has_plane(slot);
        let (x0, x1) = (has(PlaneSlot::XLow), has(PlaneSlot::XHigh));
        let (y0, y1) = (has(PlaneSlot::YLow), has(PlaneSlot::YHigh));

        if x0 && x1 && !(y0 || y1) {
            let (c0, c1) = (cell.coord(PlaneSlot::XLow), cell.coord(PlaneSlot::XHigh));
            let (v0, v1) = (cell.plane_voltage(PlaneSlot::XLow), cell.plane_voltage(PlaneSlot::XHigh));
            return Self {
                a: (v0 - v1) / (c0 - c1),
                b: 0.0,
                c: (v1 * c0 - v0 * c1) / (c0 - c1),
            };
        }
        if y0 && y1 && !(x0 || x1) {
            let (c0, c1) = (cell.coord(PlaneSlot::YLow), cell.coord(PlaneSlot::YHigh));
            let (v0, v1) = (cell.plane_voltage(PlaneSlot::YLow), cell.plane_voltage(PlaneSlot::YHigh));
            return Self {
                a: 0.0,
                b: (v0 - v1) / (c0 - c1),
                c: (v1 * c0 - v0 * c1) / (c0 - c1),
            };
        }
        // With crossing planes or a single plane the last one present sets the level.
        let c = PlaneSlot::ALL
            .iter()
            .rev()
            .find(|slot| has(**slot))
            .map_or(0.0, |slot| cell.plane_voltage(*slot));
        Self { a: 0.0, b: 0.0, c }
    }

    /// Background potential at (x, y).
    pub fn at(&self, x: f64, y: f64) -> f64 {
        self.a * x + self.b * y + self.c
    }
}

/// Result of the charge solve.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeSolution {
    /// Line charge per wire, in units of 4πε0
    pub charges: Vec<f64>,
    /// Reference potential of a cell without planes or tube
    pub v0: f64,
}

/// Dense system `A·q = V - background` for the wire charges.
///
/// When no plane or tube fixes the absolute potential the system is
/// augmented by the constraint Σq = 0 and one extra unknown, the
/// reference potential.
#[derive(Debug, Clone)]
pub struct CapacitanceSystem {
    /// System matrix, with the constraint row and column when augmented
    pub matrix: RealMatrix,
    /// Right-hand side
    pub rhs: Vec<f64>,
    /// Number of wires
    pub n_wires: usize,
    /// Whether the Σq = 0 constraint was added
    pub constrained: bool,
}

impl CapacitanceSystem {
    /// Assemble the system for the wires of `cell`.
    ///
    /// Row `i` holds the potential at wire `i` due to a unit charge on each
    /// wire, the diagonal being the potential on the wire's own surface.
    pub fn assemble(
        cell: &CheckedCell,
        potential: &Potential,
        sites: &[SourceSite],
        background: &Background,
    ) -> Self {
        let n = sites.len();
        let constrained = !(cell.has_any_plane() || cell.tube.is_some());
        let size = if constrained { n + 1 } else { n };
        let mut matrix = RealMatrix::zeros(size);
        let mut rhs = vec![0.0; size];

        for (i, target) in sites.iter().enumerate() {
            let probe = potential.probe(target.x, target.y);
            for (j, source) in sites.iter().enumerate() {
                let value = if i == j {
                    potential.self_term(source)
                } else {
                    potential.unit_term(&probe, source, (0.0, 0.0)).v
                };
                matrix.set(i, j, value);
            }
            let wire = &cell.wires[i];
            rhs[i] = wire.voltage - background.at(wire.x, wire.y);
        }

        if constrained {
            for i in 0..n {
                matrix.set(i, n, 1.0);
                matrix.set(n, i, 1.0);
            }
        }

        Self {
            matrix,
            rhs,
            n_wires: n,
            constrained,
        }
    }

    /// Solve for the wire charges.
    ///
    /// With `check` set, the inverse is formed explicitly and the charges
    /// reconstructed from it are logged next to the direct solution.
    pub fn solve(&self, check: bool) -> Result<ChargeSolution> {
        let solution = self.matrix.solve(&self.rhs)?;
        let n = self.n_wires;
        let v0 = if self.constrained { solution[n] } else { 0.0 };
        let charges = solution[..n].to_vec();

        if check {
            let inverse = self.reduced_inverse()?;
            info!("Charge: quality check of the charge calculation");
            info!("    Wire       E as obtained        E reconstructed");
            for (i, q) in charges.iter().enumerate() {
                let rebuilt: f64 = (0..n).map(|j| inverse.get(i, j) * (self.rhs[j] - v0)).sum();
                info!("    {:4}    {:>18.9e}   {:>18.9e}", i, q, rebuilt);
            }
        }
        debug!("Charge: solved {} wire charges, v0 = {}", n, v0);
        Ok(ChargeSolution { charges, v0 })
    }

    /// Inverse of the wire block, corrected for the Σq = 0 constraint.
    pub fn reduced_inverse(&self) -> Result<RealMatrix> {
        let full = self.matrix.invert()?;
        let n = self.n_wires;
        let mut inverse = RealMatrix::zeros(n);
        let corner = if self.constrained { full.get(n, n) } else { 0.0 };
        if self.constrained && corner == 0.0 {
            return Err(FieldError::SingularMatrix);
        }
        for i in 0..n {
            for j in 0..n {
                let mut value = full.get(i, j);
                if self.constrained {
                    value -= full.get(i, n) * full.get(n, j) / corner;
                }
                inverse.set(i, j, value);
            }
        }
        Ok(inverse)
    }
}
