//! Direct field evaluation.
//!
//! A query point is first folded into the basic cell and moved to the
//! inner side of any plane, then tested against the conductors. Points
//! inside a wire, behind a plane or outside the tube get the conductor's
//! potential and no field. Everywhere else the field is the sum of the
//! wire contributions plus the planes' linear background, with any 3D
//! point charges added on top.

mod direct;
mod point_charge;
mod queries;

pub use direct::{electric_field, place, Placement};
pub use point_charge::{ChargeKernel, SeriesLimits};
pub use queries::{is_in_trap_radius, is_wire_crossed};

/// Electric field [V/cm] and potential [V] at a point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FieldValue {
    pub ex: f64,
    pub ey: f64,
    pub ez: f64,
    pub v: f64,
}

/// Where a query point lies, reported alongside every field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Regular point in the drift volume
    Ok,
    /// Inside the wire with this index
    InWire(usize),
    /// Behind a plane or outside the tube
    InConductor,
    /// The medium at this point does not allow drift
    NotDriftable,
    /// No medium is defined at this point
    NoMedium,
    /// The cell could not be prepared
    Unsolvable,
}

impl Status {
    /// Numeric status code: 0 for a regular point, `i + 1` inside wire `i`,
    /// negative for the other conditions.
    pub fn code(&self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::InWire(i) => *i as i32 + 1,
            Status::InConductor => -4,
            Status::NotDriftable => -5,
            Status::NoMedium => -6,
            Status::Unsolvable => -11,
        }
    }

    pub fn is_ok(&self) -> bool {
        *self == Status::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Status::Ok.code(), 0);
        assert_eq!(Status::InWire(0).code(), 1);
        assert_eq!(Status::InWire(6).code(), 7);
        assert_eq!(Status::InConductor.code(), -4);
        assert_eq!(Status::NotDriftable.code(), -5);
        assert_eq!(Status::NoMedium.code(), -6);
        assert_eq!(Status::Unsolvable.code(), -11);
    }
}
