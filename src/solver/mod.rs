//! Capacitance solver.
//!
//! The wire charges follow from requiring every wire surface to sit at its
//! nominal voltage:
//!
//! ```text
//! Σ_j A[i][j] · q_j = V_i - (a·x_i + b·y_i + c)
//! ```
//!
//! where `A[i][j]` is the potential at wire `i` due to a unit line charge
//! on wire `j` (with all images required by the cell topology), and the
//! linear term is the [`Background`] set by the planes or the tube.
//!
//! The outcome is a [`SolvedCell`]: the checked geometry, its Green's
//! function and the charges, ready for field evaluation.

mod capacitance;
mod potential;

pub use capacitance::{Background, CapacitanceSystem, ChargeSolution};
pub use potential::{reference_plane, Lattice, Potential, Probe, SourceSite, Term};

use log::{debug, error};

use crate::cell::{CellType, CheckedCell};
use crate::error::Result;

/// A checked cell together with its solved wire charges.
#[derive(Debug, Clone)]
pub struct SolvedCell {
    /// Geometry after folding and pruning; wire charges are filled in
    pub cell: CheckedCell,
    /// Topology chosen by the classifier
    pub kind: CellType,
    /// Green's function of the topology
    pub potential: Potential,
    /// Wires as seen by the Green's function
    pub sites: Vec<SourceSite>,
    /// Reference potential (non-zero only without planes and tube)
    pub v0: f64,
    /// Linear potential set by the planes or the tube
    pub background: Background,
}

impl SolvedCell {
    /// Solved line charges, one per wire of the checked cell.
    pub fn charges(&self) -> impl Iterator<Item = f64> + '_ {
        self.cell.wires.iter().map(|w| w.charge)
    }
}

/// Compute the wire charges of a classified cell.
pub fn solve(mut cell: CheckedCell, kind: CellType, charge_check: bool) -> Result<SolvedCell> {
    let potential = Potential::new(&cell, kind)?;
    let background = Background::from_cell(&cell);
    let sites: Vec<SourceSite> = cell
        .wires
        .iter()
        .map(|w| potential.site(w.x, w.y, w.radius()))
        .collect();

    let mut v0 = 0.0;
    if !sites.is_empty() {
        let system = CapacitanceSystem::assemble(&cell, &potential, &sites, &background);
        let solution = system.solve(charge_check).map_err(|e| {
            error!("Setup{}: solving for the wire charges failed: {}", kind, e);
            e
        })?;
        for (wire, q) in cell.wires.iter_mut().zip(solution.charges) {
            wire.charge = q;
        }
        v0 = solution.v0;
    }
    debug!(
        "Setup{}: {} wire(s), background ({}, {}, {})",
        kind,
        sites.len(),
        background.a,
        background.b,
        background.c
    );

    Ok(SolvedCell {
        cell,
        kind,
        potential,
        sites,
        v0,
        background,
    })
}
