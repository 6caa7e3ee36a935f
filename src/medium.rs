//! Material lookup for field points.
//!
//! The analytic solution knows nothing about the material filling the
//! cell. A [`MediumMap`] tells the field evaluation which medium occupies
//! a point, so that points outside any medium, or in a medium where
//! charges cannot drift, are reported as such.

use std::fmt;

/// A material occupying part of the cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Medium {
    /// Name for diagnostics
    pub name: String,
    /// Whether charges drift in this medium
    pub driftable: bool,
    /// Relative dielectric constant
    pub permittivity: f64,
}

impl Medium {
    /// A drift gas.
    pub fn gas(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driftable: true,
            permittivity: 1.0,
        }
    }

    /// A solid insulator in which charges do not drift.
    pub fn insulator(name: impl Into<String>, permittivity: f64) -> Self {
        Self {
            name: name.into(),
            driftable: false,
            permittivity,
        }
    }

    pub fn is_driftable(&self) -> bool {
        self.driftable
    }
}

impl fmt::Display for Medium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Lookup of the medium at a point.
pub trait MediumMap {
    /// Medium at (x, y, z), or `None` outside every medium.
    fn medium_at(&self, x: f64, y: f64, z: f64) -> Option<Medium>;
}

/// The same medium everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformMedium {
    pub medium: Medium,
}

impl UniformMedium {
    pub fn new(medium: Medium) -> Self {
        Self { medium }
    }
}

impl Default for UniformMedium {
    fn default() -> Self {
        Self::new(Medium::gas("gas"))
    }
}

impl MediumMap for UniformMedium {
    fn medium_at(&self, _x: f64, _y: f64, _z: f64) -> Option<Medium> {
        Some(self.medium.clone())
    }
}

impl<F> MediumMap for F
where
    F: Fn(f64, f64, f64) -> Option<Medium>,
{
    fn medium_at(&self, x: f64, y: f64, z: f64) -> Option<Medium> {
        self(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_gas_is_driftable() {
        let map = UniformMedium::default();
        let medium = map.medium_at(1.0, -2.0, 3.0).unwrap();
        assert!(medium.is_driftable());
        assert_eq!(medium.to_string(), "gas");
    }

    #[test]
    fn test_closure_map() {
        let map = |x: f64, _y: f64, _z: f64| {
            if x < 0.0 {
                Some(Medium::insulator("FR4", 4.4))
            } else {
                None
            }
        };
        assert!(!map.medium_at(-1.0, 0.0, 0.0).unwrap().is_driftable());
        assert!(map.medium_at(1.0, 0.0, 0.0).is_none());
    }
}
