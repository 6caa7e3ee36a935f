//! Weighting fields for signal induction.
//!
//! The weighting field of a readout group is the field obtained with the
//! group's electrodes at 1 V and every other conductor grounded. Preparing
//! the signals inverts the wire potential matrix once (per Fourier layer
//! for periodic cells), after which the weighting field of any group is a
//! sum of Green's function terms:
//!
//! - a wire in the group contributes the charges of row `i` of the inverse
//! - a plane or the tube contributes precomputed wire charges plus its
//!   linear weighting potential
//! - strips and pixels use closed-form kernels that ignore the wires

mod electrodes;
mod matrix;
mod planes;
mod readout;

pub use electrodes::{pixel, strip_along_z, strip_in_plane};
pub use matrix::{FourierSetup, SignalLayer};
pub use readout::{PixelRef, ReadoutGroup, StripRef};

use log::{debug, info};

use crate::cell::{Axis, CheckedCell, Electrode, PlaneSlot, StripDirection};
use crate::error::Result;
use crate::field::{place, FieldValue};
use crate::solver::{Potential, SolvedCell, SourceSite, Term};

/// Weighting charges and kernels of a prepared cell.
#[derive(Debug, Clone)]
pub struct Signals {
    /// Cell with every strip and pixel gap filled in
    cell: CheckedCell,
    setup: FourierSetup,
    potential: Potential,
    sites: Vec<SourceSite>,
    layers: Vec<SignalLayer>,
    /// Wire charges for reading out each rectilinear plane
    plane_charges: [Vec<f64>; 4],
    /// Gradient of each plane's weighting potential
    slopes: [f64; 4],
    /// Wire charges for reading out the tube
    tube_charges: Vec<f64>,
}

impl Signals {
    /// Build the signal matrices and plane charges of a solved cell.
    pub fn prepare(solved: &SolvedCell, n_fourier: usize) -> Result<Self> {
        let mut cell = solved.cell.clone();
        planes::assign_gaps(&mut cell)?;

        let setup = FourierSetup::select(solved.kind, n_fourier)?;
        let potential = Potential::new(&cell, setup.kind)?;
        let sites: Vec<SourceSite> = cell
            .wires
            .iter()
            .map(|w| potential.site(w.x, w.y, w.radius()))
            .collect();
        let layers = if sites.is_empty() {
            Vec::new()
        } else {
            matrix::build_layers(&cell, &setup, &potential, &sites)?
        };

        let mut plane_charges: [Vec<f64>; 4] = Default::default();
        let mut slopes = [0.0; 4];
        for slot in PlaneSlot::ALL {
            if cell.has_plane(slot) {
                plane_charges[slot.index()] = planes::plane_charges(&cell, &layers, slot);
                slopes[slot.index()] = planes::weighting_slope(&cell, slot);
            }
        }
        let tube_charges = if cell.tube.is_some() {
            planes::tube_charges(&cell, &layers)
        } else {
            Vec::new()
        };
        info!(
            "PrepareSignals: {} signals with {} layer(s) for a {} cell",
            setup.kind,
            setup.layers(),
            solved.kind
        );

        Ok(Self {
            cell,
            setup,
            potential,
            sites,
            layers,
            plane_charges,
            slopes,
            tube_charges,
        })
    }

    /// Signal topology in use.
    pub fn setup(&self) -> &FourierSetup {
        &self.setup
    }

    /// Readout group for `label` in the prepared cell.
    pub fn group(&self, label: &str) -> ReadoutGroup {
        ReadoutGroup::collect(&self.cell, label)
    }

    /// Weighting field and potential of a readout group at (x, y, z).
    pub fn weighting(&self, group: &ReadoutGroup, x: f64, y: f64, z: f64) -> FieldValue {
        let mut total = FieldValue::default();
        for electrode in &group.electrodes {
            let w = match *electrode {
                Electrode::Wire(i) => self.wire_weighting(i, x, y),
                Electrode::Plane(slot) => self.plane_weighting(slot, x, y),
                Electrode::Tube => self.tube_weighting(x, y),
            };
            accumulate(&mut total, w);
        }
        for strip in &group.strips {
            if let Some(w) = self.strip_weighting(strip, x, y, z) {
                accumulate(&mut total, w);
            }
        }
        for p in &group.pixels {
            if let Some(plane) = self.cell.plane(p.slot) {
                if let Some(px) = plane.pixels.get(p.index) {
                    let gap = px.gap.unwrap_or(0.0);
                    accumulate(&mut total, pixel(p.slot, plane.coord, px, gap, x, y, z));
                }
            }
        }
        debug!(
            "Wfield: group {} at ({}, {}, {}): ({}, {}, {}) V = {}",
            group.label, x, y, z, total.ex, total.ey, total.ez, total.v
        );
        total
    }

    /// Field of the given charges on every copy of the wires.
    fn charge_field(&self, charges: impl Fn(&SignalLayer, usize) -> f64, x: f64, y: f64) -> Term {
        let probe = self.potential.probe(x, y);
        let mut sum = Term::default();
        for layer in &self.layers {
            for (i, site) in self.sites.iter().enumerate() {
                let q = charges(layer, i);
                if q != 0.0 {
                    sum.add_scaled(q, self.potential.unit_term(&probe, site, layer.shift));
                }
            }
        }
        sum
    }

    fn wire_weighting(&self, wire: usize, x: f64, y: f64) -> FieldValue {
        let t = self.charge_field(|layer, i| layer.inverse.get(wire, i).re, x, y);
        FieldValue {
            ex: t.ex,
            ey: t.ey,
            ez: 0.0,
            v: t.v,
        }
    }

    fn plane_weighting(&self, slot: PlaneSlot, x: f64, y: f64) -> FieldValue {
        let charges = &self.plane_charges[slot.index()];
        let t = self.charge_field(|_, i| charges.get(i).copied().unwrap_or(0.0), x, y);
        let slope = self.slopes[slot.index()];
        let p = place(&self.cell, x, y);
        let (u, ex, ey) = match slot.axis() {
            Axis::X => (p.x, t.ex + slope, t.ey),
            Axis::Y => (p.y, t.ex, t.ey + slope),
        };
        FieldValue {
            ex,
            ey,
            ez: 0.0,
            v: t.v + 1.0 - slope * (u - self.cell.coord(slot)),
        }
    }

    fn tube_weighting(&self, x: f64, y: f64) -> FieldValue {
        let t = self.charge_field(|_, i| self.tube_charges.get(i).copied().unwrap_or(0.0), x, y);
        FieldValue {
            ex: t.ex,
            ey: t.ey,
            ez: 0.0,
            v: t.v + 1.0,
        }
    }

    fn strip_weighting(&self, strip: &StripRef, x: f64, y: f64, z: f64) -> Option<FieldValue> {
        let plane = self.cell.plane(strip.slot)?;
        let s = plane.strips(strip.direction).get(strip.index)?;
        let gap = s.gap.unwrap_or(0.0);
        Some(match strip.direction {
            StripDirection::AlongZ => strip_along_z(strip.slot, plane.coord, s, gap, x, y),
            StripDirection::InPlane => strip_in_plane(strip.slot, plane.coord, s, gap, x, y, z),
        })
    }
}

fn accumulate(total: &mut FieldValue, w: FieldValue) {
    total.ex += w.ex;
    total.ey += w.ey;
    total.ez += w.ez;
    total.v += w.v;
}
