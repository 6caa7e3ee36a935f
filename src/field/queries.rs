//! Geometric queries used by drift-line integrators.

use log::{debug, warn};

use crate::solver::SolvedCell;
use crate::SMALL;

use super::direct::place;

/// First wire surface crossed by the straight step from
/// (x0, y0, z0) to (x1, y1, z1).
///
/// Returns the crossing point and the index of the wire. Steps longer than
/// one period are not handled and report no crossing.
pub fn is_wire_crossed(
    solved: &SolvedCell,
    (x0, y0, z0): (f64, f64, f64),
    (x1, y1, z1): (f64, f64, f64),
) -> Option<(f64, f64, f64, usize)> {
    let cell = &solved.cell;
    if cell.wires.is_empty() {
        return None;
    }
    let (dx, dy) = (x1 - x0, y1 - y0);
    let d2 = dx * dx + dy * dy;
    if d2 < SMALL {
        return None;
    }
    let phi_periodic = cell.pery && cell.tube.is_some();
    if (cell.perx && dx.abs() >= cell.sx) || (cell.pery && !phi_periodic && dy.abs() >= cell.sy) {
        warn!("IsWireCrossed: step crosses more than one period");
        return None;
    }

    let (xm, ym) = (0.5 * (x0 + x1), 0.5 * (y0 + y1));
    for (i, wire) in cell.wires.iter().enumerate().rev() {
        let mut xw = wire.x;
        let mut yw = wire.y;
        if cell.perx {
            xw += cell.sx * ((xm - xw) / cell.sx).round();
        }
        if cell.pery && !phi_periodic {
            yw += cell.sy * ((ym - yw) / cell.sy).round();
        }
        // Projections of the wire onto the step, from either end.
        let from_start = dx * (xw - x0) + dy * (yw - y0);
        if from_start < 0.0 {
            continue;
        }
        let from_end = -(dx * (xw - x1) + dy * (yw - y1));
        if from_end < 0.0 {
            continue;
        }
        let (xw0, yw0) = (xw - x0, yw - y0);
        let (xw1, yw1) = (xw - x1, yw - y1);
        let dw02 = xw0 * xw0 + yw0 * yw0;
        let dw12 = xw1 * xw1 + yw1 * yw1;
        let dmin2 = if from_end * from_end * dw02 > from_start * from_start * dw12 {
            dw02 - from_start * from_start / d2
        } else {
            dw12 - from_end * from_end / d2
        };
        let r2 = wire.radius().powi(2);
        if dmin2 < r2 {
            let p = -from_start / d2;
            let q = (dw02 - r2) / d2;
            let root = (p * p - q).max(0.0).sqrt();
            let t = (-p + root).min(-p - root);
            return Some((x0 + t * dx, y0 + t * dy, z0 + t * (z1 - z0), i));
        }
    }
    None
}

/// Wire whose trap radius contains (x, y), provided its charge has the
/// opposite sign to `q`.
///
/// Returns the wire centre in the frame of the query point and the wire
/// radius.
pub fn is_in_trap_radius(solved: &SolvedCell, q: f64, x: f64, y: f64, z: f64) -> Option<(f64, f64, f64)> {
    let cell = &solved.cell;
    let p = place(cell, x, y);
    for (i, wire) in cell.wires.iter().enumerate() {
        if q * wire.charge > 0.0 {
            continue;
        }
        let (dxw, dyw) = (wire.x - p.x, wire.y - p.y);
        let trap = wire.radius() * f64::from(wire.n_trap);
        if dxw * dxw + dyw * dyw >= trap * trap {
            continue;
        }
        let mut xw = wire.x - p.plane_offset.0 + cell.sx * p.periods.0;
        let mut yw = wire.y - p.plane_offset.1 + cell.sy * p.periods.1;
        if p.rotation != 0.0 {
            let (s, c) = p.rotation.sin_cos();
            (xw, yw) = (c * xw - s * yw, s * xw + c * yw);
        }
        debug!("IsInTrapRadius: ({}, {}, {}) within trap radius of wire {}", x, y, z, i);
        return Some((xw, yw, wire.radius()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{check_cell, classify, Axis, Cell, Wire};
    use crate::solver::solve;
    use approx::assert_relative_eq;

    fn solved(cell: &Cell) -> SolvedCell {
        let mut checked = check_cell(cell).unwrap();
        let kind = classify(&mut checked).unwrap();
        solve(checked, kind, false).unwrap()
    }

    fn anode_cell() -> Cell {
        let mut cell = Cell::new();
        cell.add_wire(Wire::new(0.0, 0.0, 0.1, 1000.0, "s")).unwrap();
        cell.add_plane(Axis::Y, -1.0, 0.0, "c").unwrap();
        cell.set_periodicity(Axis::X, 2.0).unwrap();
        cell
    }

    #[test]
    fn test_step_through_wire_is_crossed() {
        let s = solved(&anode_cell());
        let (xc, yc, zc, wire) = is_wire_crossed(&s, (-0.5, 0.0, 0.0), (0.5, 0.0, 1.0)).unwrap();
        assert_eq!(wire, 0);
        assert_relative_eq!(xc, -0.05, epsilon = 1e-12);
        assert_relative_eq!(yc, 0.0, epsilon = 1e-12);
        assert_relative_eq!(zc, 0.45, epsilon = 1e-12);
    }

    #[test]
    fn test_step_past_wire_is_not_crossed() {
        let s = solved(&anode_cell());
        assert!(is_wire_crossed(&s, (-0.5, 0.2, 0.0), (0.5, 0.2, 0.0)).is_none());
        assert!(is_wire_crossed(&s, (0.1, 0.1, 0.0), (0.1, 0.1, 0.0)).is_none());
        assert!(is_wire_crossed(&s, (-1.5, 0.0, 0.0), (1.5, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_periodic_copy_is_crossed() {
        let s = solved(&anode_cell());
        let hit = is_wire_crossed(&s, (3.5, 0.0, 0.0), (4.5, 0.0, 0.0)).unwrap();
        assert_relative_eq!(hit.0, 3.95, epsilon = 1e-12);
    }

    #[test]
    fn test_trap_radius_respects_charge_sign() {
        let s = solved(&anode_cell());
        // Electrons drift to the positive anode.
        let (xw, yw, rw) = is_in_trap_radius(&s, -1.0, 4.1, 0.1, 0.0).unwrap();
        assert_relative_eq!(xw, 4.0, epsilon = 1e-12);
        assert_relative_eq!(yw, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rw, 0.05);
        assert!(is_in_trap_radius(&s, 1.0, 4.1, 0.1, 0.0).is_none());
        assert!(is_in_trap_radius(&s, -1.0, 4.5, 0.1, 0.0).is_none());
    }
}
