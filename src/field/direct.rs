//! Field of the solved wire charges.

use crate::cell::{fold, fold_phi, in_tube, Axis, CheckedCell, PlaneSlot, PointCharge};
use crate::solver::{SolvedCell, Term};

use super::point_charge::{ChargeKernel, SeriesLimits};
use super::{FieldValue, Status};

/// A query point mapped into the basic cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    /// Angle the point was rotated by (phi-periodic tubes)
    pub rotation: f64,
    /// Whole periods removed in x and y
    pub periods: (f64, f64),
    /// Extra offset applied to reach the inner side of a plane
    pub plane_offset: (f64, f64),
}

/// Fold (x, y) into the basic cell and move it to the inner side of
/// the planes.
pub fn place(cell: &CheckedCell, x: f64, y: f64) -> Placement {
    let mut p = Placement {
        x,
        y,
        rotation: 0.0,
        periods: (0.0, 0.0),
        plane_offset: (0.0, 0.0),
    };
    if cell.perx {
        p.x = fold(x, cell.sx);
        p.periods.0 = ((x - p.x) / cell.sx).round();
    }
    if cell.pery && cell.tube.is_some() {
        let (xf, yf, shift) = fold_phi(p.x, y, cell.sy);
        p.x = xf;
        p.y = yf;
        p.rotation = shift;
    } else if cell.pery {
        p.y = fold(y, cell.sy);
        p.periods.1 = ((y - p.y) / cell.sy).round();
    }

    if cell.perx {
        if cell.has_plane(PlaneSlot::XLow) && p.x <= cell.coord(PlaneSlot::XLow) {
            p.x += cell.sx;
            p.plane_offset.0 = cell.sx;
        }
        if cell.has_plane(PlaneSlot::XHigh) && p.x >= cell.coord(PlaneSlot::XHigh) {
            p.x -= cell.sx;
            p.plane_offset.0 = -cell.sx;
        }
    }
    if cell.pery && cell.tube.is_none() {
        if cell.has_plane(PlaneSlot::YLow) && p.y <= cell.coord(PlaneSlot::YLow) {
            p.y += cell.sy;
            p.plane_offset.1 = cell.sy;
        }
        if cell.has_plane(PlaneSlot::YHigh) && p.y >= cell.coord(PlaneSlot::YHigh) {
            p.y -= cell.sy;
            p.plane_offset.1 = -cell.sy;
        }
    }
    p
}

/// Conductor enclosing a placed point, with its potential.
fn enclosing_conductor(cell: &CheckedCell, x: f64, y: f64) -> Option<(Status, f64)> {
    if let Some(tube) = &cell.tube {
        if !in_tube(x, y, tube.radius, tube.n_edges) {
            return Some((Status::InConductor, tube.voltage));
        }
    } else {
        for slot in PlaneSlot::ALL {
            if let Some(plane) = cell.plane(slot) {
                let coord = match slot.axis() {
                    Axis::X => x,
                    Axis::Y => y,
                };
                let behind = if slot.is_low() {
                    coord < plane.coord
                } else {
                    coord > plane.coord
                };
                if behind {
                    return Some((Status::InConductor, plane.voltage));
                }
            }
        }
    }

    for (i, wire) in cell.wires.iter().enumerate().rev() {
        let mut dx = x - wire.x;
        let mut dy = y - wire.y;
        if cell.perx {
            dx = fold(dx, cell.sx);
        }
        if cell.pery && cell.tube.is_none() {
            dy = fold(dy, cell.sy);
        }
        if dx * dx + dy * dy < wire.radius().powi(2) {
            return Some((Status::InWire(i), wire.voltage));
        }
    }
    None
}

/// Two-dimensional field of the wire charges and the background.
pub(crate) fn wire_field(solved: &SolvedCell, x: f64, y: f64) -> (Status, FieldValue) {
    let p = place(&solved.cell, x, y);
    if let Some((status, v)) = enclosing_conductor(&solved.cell, p.x, p.y) {
        return (
            status,
            FieldValue {
                v,
                ..FieldValue::default()
            },
        );
    }

    let probe = solved.potential.probe(p.x, p.y);
    let mut total = Term::default();
    for (site, wire) in solved.sites.iter().zip(&solved.cell.wires) {
        total.add_scaled(wire.charge, solved.potential.unit_term(&probe, site, (0.0, 0.0)));
    }

    let (mut ex, mut ey) = (total.ex, total.ey);
    if p.rotation != 0.0 {
        let (s, c) = p.rotation.sin_cos();
        (ex, ey) = (c * ex - s * ey, s * ex + c * ey);
    }
    let bg = &solved.background;
    (
        Status::Ok,
        FieldValue {
            ex: ex - bg.a,
            ey: ey - bg.b,
            ez: 0.0,
            v: solved.v0 + total.v + bg.at(p.x, p.y),
        },
    )
}

/// Field at (x, y, z): wire charges, background and 3D point charges.
pub fn electric_field(
    solved: &SolvedCell,
    kernel: &ChargeKernel,
    charges: &[PointCharge],
    limits: SeriesLimits,
    x: f64,
    y: f64,
    z: f64,
) -> (Status, FieldValue) {
    let (status, mut value) = wire_field(solved, x, y);
    if status.is_ok() && !charges.is_empty() {
        let extra = kernel.field(charges, x, y, z, limits);
        value.ex += extra.ex;
        value.ey += extra.ey;
        value.ez += extra.ez;
        value.v += extra.v;
    }
    (status, value)
}
