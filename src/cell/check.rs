//! Cell validation.
//!
//! Moves planes and wires into the basic period, puts plane pairs in
//! canonical order and removes wires that cannot be part of a consistent
//! electrostatic problem. The result is a [`CheckedCell`], the geometry all
//! later stages work on.

use std::f64::consts::{PI, TAU};

use log::{debug, error, info, warn};

use super::geometry::Cell;
use super::types::{BoundingBox, Plane, PlaneSlot, Tube, Wire};
use crate::error::{FieldError, Result};

/// Cell geometry after folding and pruning.
#[derive(Debug, Clone)]
pub struct CheckedCell {
    /// Surviving wires, folded into the basic period
    pub wires: Vec<Wire>,
    /// Input index of each surviving wire
    pub wire_origin: Vec<usize>,
    /// Planes in canonical slots
    pub planes: [Option<Plane>; 4],
    /// Enclosing tube
    pub tube: Option<Tube>,
    /// Periodic in x
    pub perx: bool,
    /// Periodic in y (in phi inside a tube)
    pub pery: bool,
    /// Period in x, or the plane separation once classified
    pub sx: f64,
    /// Period in y, or the plane separation once classified
    pub sy: f64,
    /// Region of interest
    pub bounding_box: BoundingBox,
    /// Lowest and highest conductor potential
    pub voltage_range: (f64, f64),
}

impl CheckedCell {
    pub fn plane(&self, slot: PlaneSlot) -> Option<&Plane> {
        self.planes[slot.index()].as_ref()
    }

    pub fn has_plane(&self, slot: PlaneSlot) -> bool {
        self.planes[slot.index()].is_some()
    }

    /// Coordinate of a plane, 0 when the slot is empty.
    pub fn coord(&self, slot: PlaneSlot) -> f64 {
        self.plane(slot).map_or(0.0, |p| p.coord)
    }

    /// Voltage of a plane, 0 when the slot is empty.
    pub fn plane_voltage(&self, slot: PlaneSlot) -> f64 {
        self.plane(slot).map_or(0.0, |p| p.voltage)
    }

    /// Whether any rectilinear plane is present.
    pub fn has_any_plane(&self) -> bool {
        self.planes.iter().any(Option::is_some)
    }
}

/// Whether (x, y) lies inside a tube of radius `a` with `n` edges
/// (0 for a circle). The centre always counts as inside.
pub fn in_tube(x: f64, y: f64, a: f64, n: u32) -> bool {
    if x == 0.0 && y == 0.0 {
        return true;
    }
    if n == 0 {
        return x * x + y * y <= a * a;
    }
    if n < 3 {
        return false;
    }
    let n = n as f64;
    let mut phi = y.atan2(x);
    if phi < 0.0 {
        phi += TAU;
    }
    phi -= TAU * (0.5 * n * phi / PI).floor() / n;
    (x * x + y * y) * (PI / n - phi).cos().powi(2) <= a * a * (PI / n).cos().powi(2)
}

/// Rotate (x, y) into the basic phi sector of angular width `s`.
/// Returns the folded point and the angle it was rotated by.
pub fn fold_phi(x: f64, y: f64, s: f64) -> (f64, f64, f64) {
    let r = x.hypot(y);
    let phi = y.atan2(x);
    let shift = s * (phi / s).round();
    let folded = phi - shift;
    (r * folded.cos(), r * folded.sin(), shift)
}

/// Move a coordinate into the period centred on zero.
pub fn fold(value: f64, period: f64) -> f64 {
    value - period * (value / period).round()
}

/// Validate a cell and derive its canonical form.
pub fn check_cell(cell: &Cell) -> Result<CheckedCell> {
    let mut planes = cell.planes.clone();
    let mut perx = cell.period_x.is_some();
    let mut pery = cell.period_y.is_some();
    let sx = cell.period_x.unwrap_or(1.0);
    let sy = cell.period_y.unwrap_or(1.0);

    // Planes into the basic period; a pair must then be one period apart.
    for (periodic, s, [low, high]) in [
        (&mut perx, sx, PlaneSlot::of_axis(super::Axis::X)),
        (&mut pery, sy, PlaneSlot::of_axis(super::Axis::Y)),
    ] {
        if !*periodic {
            continue;
        }
        let (c0, c1) = (coord_of(&planes, low), coord_of(&planes, high));
        let mut new0 = fold(c0, s);
        let mut new1 = fold(c1, s);
        let both = planes[low.index()].is_some() && planes[high.index()].is_some();
        if both && new0 == new1 {
            if new0 > 0.0 {
                new0 -= s;
            } else {
                new1 += s;
            }
        }
        let moved = (planes[low.index()].is_some() && new0 != c0)
            || (planes[high.index()].is_some() && new1 != c1);
        if moved {
            info!("CellCheck: the {} planes are moved to the basic period", low.axis());
        }
        if let Some(p) = planes[low.index()].as_mut() {
            p.coord = new0;
        }
        if let Some(p) = planes[high.index()].as_mut() {
            p.coord = new1;
        }
        if both {
            if (new1 - new0).abs() != s {
                warn!(
                    "CellCheck: the separation of the {} planes does not match the period; periodicity is cancelled",
                    low.axis()
                );
                *periodic = false;
            }
            if voltage_of(&planes, low) != voltage_of(&planes, high) {
                warn!(
                    "CellCheck: the voltages of the two {} planes differ; periodicity is cancelled",
                    low.axis()
                );
                *periodic = false;
            }
        }
    }

    // Crossing planes must be at the same potential.
    for i in [PlaneSlot::XLow, PlaneSlot::XHigh] {
        for j in [PlaneSlot::YLow, PlaneSlot::YHigh] {
            if let (Some(pi), Some(pj)) = (&planes[i.index()], &planes[j.index()]) {
                if pi.voltage != pj.voltage {
                    warn!("CellCheck: conflicting potential of 2 crossing planes; plane {} is removed", j);
                    planes[j.index()] = None;
                }
            }
        }
    }

    // Lower coordinate in the lower slot.
    for [low, high] in [PlaneSlot::of_axis(super::Axis::X), PlaneSlot::of_axis(super::Axis::Y)] {
        if let (Some(p0), Some(p1)) = (&planes[low.index()], &planes[high.index()]) {
            if p0.coord == p1.coord {
                warn!("CellCheck: two planes are on top of each other; one of them is removed");
                planes[high.index()] = None;
            } else if p0.coord > p1.coord {
                debug!("CellCheck: planes {} and {} are interchanged", low, high);
                planes.swap(low.index(), high.index());
            }
        }
    }

    // Wires into the basic period.
    let mut wires: Vec<Wire> = cell.wires.clone();
    if perx {
        for w in wires.iter_mut() {
            if (w.x / sx).round() != 0.0 {
                info!("CellCheck: the {}-wire at ({}, {}) is moved to the basic x period", w.label, w.x, w.y);
            }
            w.x = fold(w.x, sx);
        }
    }
    if pery {
        for w in wires.iter_mut() {
            if cell.tube.is_some() {
                let (x, y, shift) = fold_phi(w.x, w.y, sy);
                if shift != 0.0 {
                    info!("CellCheck: the {}-wire at ({}, {}) is moved to the basic phi period", w.label, w.x, w.y);
                }
                w.x = x;
                w.y = y;
            } else {
                if (w.y / sy).round() != 0.0 {
                    info!("CellCheck: the {}-wire at ({}, {}) is moved to the basic y period", w.label, w.x, w.y);
                }
                w.y = fold(w.y, sy);
            }
        }
    }

    renumber_planes(&mut planes, &wires);

    let wrong = mark_wrong_wires(&planes, &cell.tube, &wires, perx.then_some(sx), pery.then_some(sy));
    let mut wire_origin = Vec::with_capacity(wires.len());
    let mut kept = Vec::with_capacity(wires.len());
    for (i, (w, bad)) in wires.into_iter().zip(wrong).enumerate() {
        if !bad {
            wire_origin.push(i);
            kept.push(w);
        }
    }
    let wires = kept;

    let count = wires.len() + planes.iter().flatten().count() + usize::from(cell.tube.is_some());
    if count < 2 {
        error!("CellCheck: at least 2 elements are necessary; cell rejected");
        return Err(FieldError::TooFewElements { count });
    }

    let (bounding_box, voltage_range) =
        dimensions(&wires, &planes, &cell.tube, perx.then_some(sx), pery.then_some(sy));
    if voltage_range.0 == voltage_range.1 {
        error!("CellCheck: all potentials in the cell are the same; there is no point in going on");
        return Err(FieldError::NoVoltageRange {
            voltage: voltage_range.0,
        });
    }

    Ok(CheckedCell {
        wires,
        wire_origin,
        planes,
        tube: cell.tube.clone(),
        perx,
        pery,
        sx,
        sy,
        bounding_box,
        voltage_range,
    })
}

fn coord_of(planes: &[Option<Plane>; 4], slot: PlaneSlot) -> f64 {
    planes[slot.index()].as_ref().map_or(0.0, |p| p.coord)
}

fn voltage_of(planes: &[Option<Plane>; 4], slot: PlaneSlot) -> f64 {
    planes[slot.index()].as_ref().map_or(0.0, |p| p.voltage)
}

/// Make sure the wires lie above the lower and below the upper plane of
/// each axis. A plane with most wires on its wrong side changes slot; of
/// a pair in that situation only one plane survives.
fn renumber_planes(planes: &mut [Option<Plane>; 4], wires: &[Wire]) {
    let half = (wires.len() / 2) as i64;
    for [low, high] in [PlaneSlot::of_axis(super::Axis::X), PlaneSlot::of_axis(super::Axis::Y)] {
        let along = |w: &Wire| if low.axis() == super::Axis::X { w.x } else { w.y };
        let below = |slot: PlaneSlot| -> i64 {
            planes[slot.index()]
                .as_ref()
                .map_or(0, |p| wires.iter().filter(|w| along(w) <= p.coord).count() as i64)
        };
        let n_low = below(low);
        let n_high = below(high);

        // +1 keeps the plane below the wires, -1 above.
        let mut side_low = 0;
        let mut side_high = 0;
        match (planes[low.index()].is_some(), planes[high.index()].is_some()) {
            (true, true) => {
                if n_low > half {
                    planes[high.index()] = None;
                    side_low = -1;
                } else {
                    side_low = 1;
                }
                if n_high < half {
                    planes[low.index()] = None;
                    side_high = 1;
                } else {
                    side_high = -1;
                }
            }
            (true, false) => side_low = if n_low > half { -1 } else { 1 },
            (false, true) => side_high = if n_high < half { 1 } else { -1 },
            (false, false) => {}
        }

        if side_low == -1 {
            planes[high.index()] = planes[low.index()].take();
        }
        if side_high == 1 {
            planes[low.index()] = planes[high.index()].take();
        }
    }
}

fn mark_wrong_wires(
    planes: &[Option<Plane>; 4],
    tube: &Option<Tube>,
    wires: &[Wire],
    sx: Option<f64>,
    sy: Option<f64>,
) -> Vec<bool> {
    let mut wrong = vec![false; wires.len()];
    for (i, w) in wires.iter().enumerate() {
        let r = w.radius();
        let outside = planes[0].as_ref().is_some_and(|p| w.x - r <= p.coord)
            || planes[1].as_ref().is_some_and(|p| w.x + r >= p.coord)
            || planes[2].as_ref().is_some_and(|p| w.y - r <= p.coord)
            || planes[3].as_ref().is_some_and(|p| w.y + r >= p.coord);
        wrong[i] = outside;
        if let Some(t) = tube {
            if !in_tube(w.x, w.y, t.radius, t.n_edges) {
                warn!("CellCheck: the {}-wire at ({}, {}) is located outside the tube; removed", w.label, w.x, w.y);
                wrong[i] = true;
            }
        } else if outside {
            warn!("CellCheck: the {}-wire at ({}, {}) is located outside the planes; removed", w.label, w.x, w.y);
        } else if sx.is_some_and(|s| w.diameter >= s) || sy.is_some_and(|s| w.diameter >= s) {
            warn!("CellCheck: the diameter of the {}-wire at ({}, {}) exceeds 1 period; removed", w.label, w.x, w.y);
            wrong[i] = true;
        }
    }

    // The earlier wire of an overlapping pair is kept.
    for i in 0..wires.len() {
        if wrong[i] {
            continue;
        }
        for j in (i + 1)..wires.len() {
            if wrong[j] {
                continue;
            }
            let (wi, wj) = (&wires[i], &wires[j]);
            let (dx, dy) = if tube.is_some() {
                match sy {
                    Some(s) => {
                        let (xi, yi, _) = fold_phi(wi.x, wi.y, s);
                        let (xj, yj, _) = fold_phi(wj.x, wj.y, s);
                        (xi - xj, yi - yj)
                    }
                    None => (wi.x - wj.x, wi.y - wj.y),
                }
            } else {
                let mut dx = (wi.x - wj.x).abs();
                if let Some(s) = sx {
                    dx = fold(dx, s);
                }
                let mut dy = (wi.y - wj.y).abs();
                if let Some(s) = sy {
                    dy = fold(dy, s);
                }
                (dx, dy)
            };
            if dx * dx + dy * dy < 0.25 * (wi.diameter + wj.diameter).powi(2) {
                warn!(
                    "CellCheck: the {}-wire at ({}, {}) and the {}-wire at ({}, {}) overlap; the latter is removed",
                    wi.label, wi.x, wi.y, wj.label, wj.x, wj.y
                );
                wrong[j] = true;
            }
        }
    }
    wrong
}

/// Running min/max that starts unset.
#[derive(Debug, Clone, Copy, Default)]
struct Extent(Option<(f64, f64)>);

impl Extent {
    fn include(&mut self, lo: f64, hi: f64) {
        self.0 = Some(match self.0 {
            Some((a, b)) => (a.min(lo), b.max(hi)),
            None => (lo, hi),
        });
    }

    fn set(&mut self, lo: f64, hi: f64) {
        self.0 = Some((lo, hi));
    }

    fn span(&self) -> f64 {
        self.0.map_or(0.0, |(a, b)| (b - a).abs())
    }

    fn is_point(&self) -> bool {
        self.0.is_some_and(|(a, b)| a == b)
    }
}

fn dimensions(
    wires: &[Wire],
    planes: &[Option<Plane>; 4],
    tube: &Option<Tube>,
    sx: Option<f64>,
    sy: Option<f64>,
) -> (BoundingBox, (f64, f64)) {
    let mut x = Extent::default();
    let mut y = Extent::default();
    let mut z = Extent::default();
    let mut v = Extent::default();

    for w in wires {
        let r = w.radius();
        x.include(w.x - r, w.x + r);
        y.include(w.y - r, w.y + r);
        z.include(-0.5 * w.length, 0.5 * w.length);
        v.include(w.voltage, w.voltage);
    }
    for slot in PlaneSlot::ALL {
        if let Some(p) = &planes[slot.index()] {
            match slot.axis() {
                super::Axis::X => x.include(p.coord, p.coord),
                super::Axis::Y => y.include(p.coord, p.coord),
            }
            v.include(p.voltage, p.voltage);
        }
    }
    if let Some(t) = tube {
        x.set(-1.1 * t.radius, 1.1 * t.radius);
        y.set(-1.1 * t.radius, 1.1 * t.radius);
        v.include(t.voltage, t.voltage);
    }

    if let Some(s) = sx {
        if s > x.span() {
            x.set(-0.5 * s, 0.5 * s);
        }
    }
    if let Some(s) = sy {
        if s > y.span() {
            y.set(-0.5 * s, 0.5 * s);
        }
    }

    // Fill in missing dimensions from the known ones.
    if x.0.is_some() && !x.is_point() && (y.0.is_none() || y.is_point()) {
        let half = 0.5 * x.span();
        let (lo, hi) = y.0.unwrap_or((0.0, 0.0));
        y.set(lo - half, hi + half);
    }
    if y.0.is_some() && !y.is_point() && (x.0.is_none() || x.is_point()) {
        let half = 0.5 * y.span();
        let (lo, hi) = x.0.unwrap_or((0.0, 0.0));
        x.set(lo - half, hi + half);
    }
    if z.0.is_none() {
        let half = 0.25 * (x.span() + y.span());
        z.set(-half, half);
    }
    if x.0.is_none() || y.0.is_none() {
        warn!("CellCheck: unable to establish default dimensions in all directions");
    }

    let (xmin, xmax) = x.0.unwrap_or((0.0, 0.0));
    let (ymin, ymax) = y.0.unwrap_or((0.0, 0.0));
    let (zmin, zmax) = z.0.unwrap_or((0.0, 0.0));
    let bbox = BoundingBox {
        xmin,
        ymin,
        zmin,
        xmax,
        ymax,
        zmax,
    };
    (bbox, v.0.unwrap_or((0.0, 0.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Axis;
    use approx::assert_relative_eq;

    fn two_wire_cell() -> Cell {
        let mut cell = Cell::new();
        cell.add_wire(Wire::new(0.0, 0.0, 0.01, 1000.0, "a")).unwrap();
        cell.add_wire(Wire::new(0.5, 0.0, 0.01, 0.0, "b")).unwrap();
        cell
    }

    #[test]
    fn test_in_tube_circle_and_hexagon() {
        assert!(in_tube(0.0, 0.0, 1.0, 0));
        assert!(in_tube(0.7, 0.7, 1.0, 0));
        assert!(!in_tube(0.8, 0.8, 1.0, 0));
        // Corner of a hexagon at (1, 0), edge midpoint at distance cos(30 deg).
        assert!(in_tube(0.99, 0.0, 1.0, 6));
        let edge = (PI / 6.0).cos();
        let (c, s) = ((PI / 6.0).cos(), (PI / 6.0).sin());
        assert!(in_tube(0.99 * edge * c, 0.99 * edge * s, 1.0, 6));
        assert!(!in_tube(1.01 * edge * c, 1.01 * edge * s, 1.0, 6));
    }

    #[test]
    fn test_fold_phi_rotates_into_sector() {
        let phi = 0.4 * PI;
        let (x, y, shift) = fold_phi(2.0 * phi.cos(), 2.0 * phi.sin(), PI / 3.0);
        assert_relative_eq!(shift, PI / 3.0, epsilon = 1e-12);
        assert_relative_eq!(x.hypot(y), 2.0, epsilon = 1e-12);
        assert_relative_eq!(y.atan2(x), PI / 15.0, epsilon = 1e-12);
    }

    #[test]
    fn test_overlapping_wire_removed_in_input_order() {
        let mut cell = two_wire_cell();
        cell.add_wire(Wire::new(0.005, 0.0, 0.01, 500.0, "c")).unwrap();
        let checked = check_cell(&cell).unwrap();
        assert_eq!(checked.wires.len(), 2);
        assert_eq!(checked.wire_origin, vec![0, 1]);
    }

    #[test]
    fn test_wire_behind_plane_removed() {
        let mut cell = two_wire_cell();
        cell.add_plane(Axis::X, 0.25, 100.0, "p").unwrap();
        let checked = check_cell(&cell).unwrap();
        // Half of the wires are below the plane, so it stays in the lower slot.
        assert_eq!(checked.wires.len(), 1);
        assert!(checked.has_plane(PlaneSlot::XLow));
        assert_eq!(checked.wires[0].label, "b");
    }

    #[test]
    fn test_planes_are_ordered() {
        let mut cell = Cell::new();
        cell.add_plane(Axis::Y, 1.0, 0.0, "top").unwrap();
        cell.add_plane(Axis::Y, -1.0, 0.0, "bottom").unwrap();
        cell.add_wire(Wire::new(0.0, 0.0, 0.01, 100.0, "w")).unwrap();
        let checked = check_cell(&cell).unwrap();
        assert_eq!(checked.plane(PlaneSlot::YLow).unwrap().label, "bottom");
        assert_eq!(checked.plane(PlaneSlot::YHigh).unwrap().label, "top");
    }

    #[test]
    fn test_crossing_planes_with_different_voltage() {
        let mut cell = Cell::new();
        cell.add_plane(Axis::X, -1.0, 0.0, "x").unwrap();
        cell.add_plane(Axis::Y, -1.0, 100.0, "y").unwrap();
        cell.add_wire(Wire::new(0.0, 0.0, 0.01, 100.0, "w")).unwrap();
        let checked = check_cell(&cell).unwrap();
        assert!(!checked.has_plane(PlaneSlot::YLow));
        assert!(checked.has_plane(PlaneSlot::XLow));
    }

    #[test]
    fn test_rejects_single_element_and_equal_voltages() {
        let mut cell = Cell::new();
        cell.add_wire(Wire::new(0.0, 0.0, 0.01, 100.0, "w")).unwrap();
        assert!(matches!(check_cell(&cell), Err(FieldError::TooFewElements { count: 1 })));
        cell.add_wire(Wire::new(1.0, 0.0, 0.01, 100.0, "w")).unwrap();
        assert!(matches!(check_cell(&cell), Err(FieldError::NoVoltageRange { .. })));
    }

    #[test]
    fn test_periodic_wires_are_folded() {
        let mut cell = two_wire_cell();
        cell.wires[1].x = 2.3;
        cell.set_periodicity(Axis::X, 1.0).unwrap();
        let checked = check_cell(&cell).unwrap();
        assert_relative_eq!(checked.wires[1].x, 0.3, epsilon = 1e-12);
        assert_relative_eq!(checked.bounding_box.xmin, -0.5, epsilon = 1e-12);
        assert_relative_eq!(checked.bounding_box.xmax, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_bounding_box_and_voltage_range() {
        let mut cell = Cell::new();
        cell.add_tube(2.0, -100.0, 0, "t").unwrap();
        cell.add_wire(Wire::new(0.0, 0.0, 0.01, 500.0, "w").with_length(10.0)).unwrap();
        let checked = check_cell(&cell).unwrap();
        assert_relative_eq!(checked.bounding_box.xmax, 2.2, epsilon = 1e-12);
        assert_relative_eq!(checked.bounding_box.zmin, -5.0, epsilon = 1e-12);
        assert_eq!(checked.voltage_range, (-100.0, 500.0));
    }
}
