//! User-facing cell description and its mutators.
//!
//! A [`Cell`] stores the conductors exactly as they were entered. Folding,
//! pruning and plane renumbering happen on a copy in [`super::check`], so
//! accessors always return the input parameters.

use log::{error, warn};

use super::types::{Axis, Pixel, Plane, PlaneSlot, Strip, StripDirection, Tube, Wire};
use crate::error::{FieldError, Result};
use crate::SMALL;

/// Symmetries the analytic solver cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    /// Translational periodicity along z
    PeriodicZ,
    /// Mirror periodicity along any axis
    MirrorPeriodic,
    /// Axial periodicity
    AxiallyPeriodic,
    /// Rotational symmetry
    RotationSymmetric,
}

/// Geometry of a wire-chamber cell as entered by the user.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    /// Wires in input order
    pub(crate) wires: Vec<Wire>,
    /// Rectilinear planes indexed by [`PlaneSlot::index`]
    pub(crate) planes: [Option<Plane>; 4],
    /// Enclosing tube
    pub(crate) tube: Option<Tube>,
    /// Period along x
    pub(crate) period_x: Option<f64>,
    /// Period along y (angular period in radians inside a tube)
    pub(crate) period_y: Option<f64>,
}

impl Cell {
    /// Create an empty cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a wire, returning its index.
    pub fn add_wire(&mut self, wire: Wire) -> Result<usize> {
        let checks = [
            (wire.diameter, "diameter"),
            (wire.tension, "tension"),
            (wire.density, "density"),
            (wire.length, "length"),
        ];
        for (value, what) in checks {
            if value <= 0.0 {
                error!("AddWire: unphysical wire {} ({})", what, value);
                return Err(FieldError::invalid("wire", format!("{what} must be positive")));
            }
        }
        if wire.n_trap == 0 {
            error!("AddWire: number of trap radii must be > 0");
            return Err(FieldError::invalid("wire", "trap radius multiplier must be > 0"));
        }
        self.wires.push(Wire { charge: 0.0, ..wire });
        Ok(self.wires.len() - 1)
    }

    /// Add or replace the enclosing tube. `n_edges` is 0 for a circle.
    pub fn add_tube(&mut self, radius: f64, voltage: f64, n_edges: u32, label: &str) -> Result<()> {
        if radius <= 0.0 {
            error!("AddTube: unphysical tube dimension ({})", radius);
            return Err(FieldError::invalid("tube", "radius must be positive"));
        }
        if n_edges != 0 && n_edges < 3 {
            error!("AddTube: unphysical number of tube edges ({})", n_edges);
            return Err(FieldError::invalid("tube", format!("{n_edges} edges")));
        }
        if self.tube.is_some() {
            warn!("AddTube: existing tube settings will be overwritten");
        }
        self.tube = Some(Tube {
            radius,
            voltage,
            n_edges,
            label: label.to_string(),
        });
        Ok(())
    }

    /// Add a plane at constant `coord` on `axis`. The first plane of an
    /// axis goes to the lower slot, the second to the upper one.
    pub fn add_plane(&mut self, axis: Axis, coord: f64, voltage: f64, label: &str) -> Result<PlaneSlot> {
        let [low, high] = PlaneSlot::of_axis(axis);
        let slot = match (&self.planes[low.index()], &self.planes[high.index()]) {
            (None, _) => low,
            (Some(_), None) => high,
            (Some(_), Some(_)) => {
                error!("AddPlane{}: there are already two {} planes defined", axis.name().to_ascii_uppercase(), axis);
                return Err(FieldError::PlaneSlotsFull { axis: axis.name() });
            }
        };
        self.planes[slot.index()] = Some(Plane::new(coord, voltage, label));
        Ok(slot)
    }

    /// Slot of the plane on `axis` nearest to `coord`.
    fn nearest_plane(&self, axis: Axis, coord: f64) -> Result<PlaneSlot> {
        let [low, high] = PlaneSlot::of_axis(axis);
        match (&self.planes[low.index()], &self.planes[high.index()]) {
            (Some(p0), Some(p1)) => {
                if (p1.coord - coord).abs() < (p0.coord - coord).abs() {
                    Ok(high)
                } else {
                    Ok(low)
                }
            }
            (Some(_), None) => Ok(low),
            (None, Some(_)) => Ok(high),
            (None, None) => {
                error!("There are no planes at constant {} defined", axis);
                Err(FieldError::NoPlaneOnAxis { axis: axis.name() })
            }
        }
    }

    /// Add a readout strip to the plane on `axis` nearest to `coord`.
    ///
    /// `direction` is the axis the strip runs along: the other in-plane axis
    /// or `z`. A non-positive gap is derived from the cell later.
    pub fn add_strip(
        &mut self,
        axis: Axis,
        direction: char,
        coord: f64,
        smin: f64,
        smax: f64,
        label: &str,
        gap: f64,
    ) -> Result<()> {
        let slot = self.nearest_plane(axis, coord)?;
        let orientation = match direction.to_ascii_lowercase() {
            'z' => StripDirection::AlongZ,
            d if d == axis.other().name() => StripDirection::InPlane,
            _ => {
                error!("AddStripOnPlane{}: invalid direction ({})", axis.name().to_ascii_uppercase(), direction);
                return Err(FieldError::InvalidDirection {
                    axis: axis.name(),
                    direction,
                });
            }
        };
        if (smax - smin).abs() < SMALL {
            error!("AddStripOnPlane{}: strip width must be greater than zero", axis.name().to_ascii_uppercase());
            return Err(FieldError::invalid("strip", "width must be greater than zero"));
        }
        let strip = Strip {
            smin: smin.min(smax),
            smax: smin.max(smax),
            gap: (gap > SMALL).then_some(gap),
            label: label.to_string(),
        };
        if let Some(plane) = self.planes[slot.index()].as_mut() {
            match orientation {
                StripDirection::InPlane => plane.strips_in_plane.push(strip),
                StripDirection::AlongZ => plane.strips_along_z.push(strip),
            }
        }
        Ok(())
    }

    /// Add a readout pixel to the plane on `axis` nearest to `coord`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_pixel(
        &mut self,
        axis: Axis,
        coord: f64,
        smin: f64,
        smax: f64,
        zmin: f64,
        zmax: f64,
        label: &str,
        gap: f64,
    ) -> Result<()> {
        let slot = self.nearest_plane(axis, coord)?;
        if (smax - smin).abs() < SMALL || (zmax - zmin).abs() < SMALL {
            error!("AddPixelOnPlane{}: pixel width must be greater than zero", axis.name().to_ascii_uppercase());
            return Err(FieldError::invalid("pixel", "width must be greater than zero"));
        }
        let pixel = Pixel {
            smin: smin.min(smax),
            smax: smin.max(smax),
            zmin: zmin.min(zmax),
            zmax: zmin.max(zmax),
            gap: (gap > SMALL).then_some(gap),
            label: label.to_string(),
        };
        if let Some(plane) = self.planes[slot.index()].as_mut() {
            plane.pixels.push(pixel);
        }
        Ok(())
    }

    /// Enable translational periodicity along `axis`.
    pub fn set_periodicity(&mut self, axis: Axis, s: f64) -> Result<()> {
        if s < SMALL {
            error!("SetPeriodicity{}: periodic length must be greater than zero", axis.name().to_ascii_uppercase());
            return Err(FieldError::invalid("periodicity", "length must be greater than zero"));
        }
        match axis {
            Axis::X => self.period_x = Some(s),
            Axis::Y => self.period_y = Some(s),
        }
        Ok(())
    }

    /// Disable periodicity along `axis`.
    pub fn clear_periodicity(&mut self, axis: Axis) {
        match axis {
            Axis::X => self.period_x = None,
            Axis::Y => self.period_y = None,
        }
    }

    /// Request a symmetry other than x/y translation. Always rejected.
    pub fn enable_symmetry(&mut self, symmetry: Symmetry) -> Result<()> {
        let what = match symmetry {
            Symmetry::PeriodicZ => "periodicity in z",
            Symmetry::MirrorPeriodic => "mirror periodicity",
            Symmetry::AxiallyPeriodic => "axial periodicity",
            Symmetry::RotationSymmetric => "rotation symmetry",
        };
        warn!("UpdatePeriodicity: {} is not possible", what);
        Err(FieldError::unsupported(format!("{what} is not possible")))
    }

    pub fn period(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => self.period_x,
            Axis::Y => self.period_y,
        }
    }

    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// Wire by input index.
    pub fn wire(&self, i: usize) -> Result<&Wire> {
        self.wires
            .get(i)
            .ok_or(FieldError::IndexOutOfRange { what: "wire", index: i })
    }

    pub fn tube(&self) -> Option<&Tube> {
        self.tube.as_ref()
    }

    /// Plane in a slot, if present.
    pub fn plane(&self, slot: PlaneSlot) -> Option<&Plane> {
        self.planes[slot.index()].as_ref()
    }

    /// Number of planes on one axis.
    pub fn number_of_planes(&self, axis: Axis) -> usize {
        PlaneSlot::of_axis(axis)
            .iter()
            .filter(|slot| self.planes[slot.index()].is_some())
            .count()
    }

    /// The `i`-th plane on an axis (0 for the lower, 1 for the upper slot).
    pub fn plane_on_axis(&self, axis: Axis, i: usize) -> Result<&Plane> {
        let slots = PlaneSlot::of_axis(axis);
        slots
            .get(i)
            .and_then(|slot| self.planes[slot.index()].as_ref())
            .ok_or(FieldError::IndexOutOfRange { what: "plane", index: i })
    }

    /// Whether the cell has no conductors at all.
    pub fn is_empty(&self) -> bool {
        self.wires.is_empty() && self.tube.is_none() && self.planes.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_round_trip() {
        let mut cell = Cell::new();
        let wire = Wire::new(0.1, -0.2, 0.003, 1500.0, "s")
            .with_length(42.0)
            .with_trap_radius(3);
        let i = cell.add_wire(wire.clone()).unwrap();
        assert_eq!(cell.wire(i).unwrap(), &wire);
        assert!(cell.wire(1).is_err());
    }

    #[test]
    fn test_rejected_wire_leaves_cell_unchanged() {
        let mut cell = Cell::new();
        assert!(cell.add_wire(Wire::new(0.0, 0.0, -1.0, 0.0, "")).is_err());
        assert!(cell.add_wire(Wire::new(0.0, 0.0, 1.0, 0.0, "").with_tension(0.0)).is_err());
        assert!(cell.add_wire(Wire::new(0.0, 0.0, 1.0, 0.0, "").with_trap_radius(0)).is_err());
        assert!(cell.wires().is_empty());
    }

    #[test]
    fn test_plane_slots_fill_in_order() {
        let mut cell = Cell::new();
        assert_eq!(cell.add_plane(Axis::X, 1.0, 0.0, "a").unwrap(), PlaneSlot::XLow);
        assert_eq!(cell.add_plane(Axis::X, -1.0, 0.0, "b").unwrap(), PlaneSlot::XHigh);
        assert!(matches!(
            cell.add_plane(Axis::X, 2.0, 0.0, "c"),
            Err(FieldError::PlaneSlotsFull { axis: 'x' })
        ));
        assert_eq!(cell.number_of_planes(Axis::X), 2);
        assert_eq!(cell.plane_on_axis(Axis::X, 1).unwrap().label, "b");
        assert!(cell.plane_on_axis(Axis::Y, 0).is_err());
    }

    #[test]
    fn test_strip_attaches_to_nearest_plane() {
        let mut cell = Cell::new();
        cell.add_plane(Axis::Y, 0.0, 0.0, "low").unwrap();
        cell.add_plane(Axis::Y, 1.0, 0.0, "high").unwrap();
        cell.add_strip(Axis::Y, 'z', 0.9, 0.5, -0.5, "s", 0.0).unwrap();
        cell.add_strip(Axis::Y, 'x', 0.1, -0.5, 0.5, "t", 0.2).unwrap();
        let high = cell.plane(PlaneSlot::YHigh).unwrap();
        assert_eq!(high.strips_along_z.len(), 1);
        assert_eq!(high.strips_along_z[0].smin, -0.5);
        assert_eq!(high.strips_along_z[0].gap, None);
        let low = cell.plane(PlaneSlot::YLow).unwrap();
        assert_eq!(low.strips_in_plane[0].gap, Some(0.2));
    }

    #[test]
    fn test_strip_validation() {
        let mut cell = Cell::new();
        assert!(matches!(
            cell.add_strip(Axis::X, 'y', 0.0, 0.0, 1.0, "s", 0.0),
            Err(FieldError::NoPlaneOnAxis { axis: 'x' })
        ));
        cell.add_plane(Axis::X, 0.0, 0.0, "p").unwrap();
        assert!(matches!(
            cell.add_strip(Axis::X, 'x', 0.0, 0.0, 1.0, "s", 0.0),
            Err(FieldError::InvalidDirection { .. })
        ));
        assert!(cell.add_strip(Axis::X, 'y', 0.0, 1.0, 1.0, "s", 0.0).is_err());
        assert!(cell.add_pixel(Axis::X, 0.0, 0.0, 1.0, 2.0, 2.0, "p", 0.0).is_err());
    }

    #[test]
    fn test_tube_and_periodicity_validation() {
        let mut cell = Cell::new();
        assert!(cell.add_tube(0.0, 0.0, 0, "t").is_err());
        assert!(cell.add_tube(1.0, 0.0, 2, "t").is_err());
        cell.add_tube(1.0, 0.0, 6, "t").unwrap();
        assert_eq!(cell.tube().unwrap().n_edges, 6);
        assert!(cell.set_periodicity(Axis::X, 0.0).is_err());
        cell.set_periodicity(Axis::Y, 0.5).unwrap();
        assert_eq!(cell.period(Axis::Y), Some(0.5));
        assert!(cell.enable_symmetry(Symmetry::PeriodicZ).is_err());
    }
}
