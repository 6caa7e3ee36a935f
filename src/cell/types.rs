//! Core types for the cell geometry.

use std::fmt;

/// Axis along which a plane is perpendicular, or along which a period runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Lower-case name, as used in diagnostics and the cell file format.
    pub fn name(&self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
        }
    }

    /// The in-plane axis perpendicular to this one.
    pub fn other(&self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One of the four rectilinear plane positions.
///
/// After the cell check, the `Low` slot of an axis always holds the plane
/// with the smaller coordinate, so wires lie between `XLow` and `XHigh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlaneSlot {
    XLow,
    XHigh,
    YLow,
    YHigh,
}

impl PlaneSlot {
    /// All slots in canonical order.
    pub const ALL: [PlaneSlot; 4] = [
        PlaneSlot::XLow,
        PlaneSlot::XHigh,
        PlaneSlot::YLow,
        PlaneSlot::YHigh,
    ];

    /// Slot number 0..=3.
    pub fn index(&self) -> usize {
        match self {
            PlaneSlot::XLow => 0,
            PlaneSlot::XHigh => 1,
            PlaneSlot::YLow => 2,
            PlaneSlot::YHigh => 3,
        }
    }

    /// Axis the plane is perpendicular to.
    pub fn axis(&self) -> Axis {
        match self {
            PlaneSlot::XLow | PlaneSlot::XHigh => Axis::X,
            PlaneSlot::YLow | PlaneSlot::YHigh => Axis::Y,
        }
    }

    /// Whether this is the lower plane of its axis.
    pub fn is_low(&self) -> bool {
        matches!(self, PlaneSlot::XLow | PlaneSlot::YLow)
    }

    /// The other slot on the same axis.
    pub fn partner(&self) -> PlaneSlot {
        match self {
            PlaneSlot::XLow => PlaneSlot::XHigh,
            PlaneSlot::XHigh => PlaneSlot::XLow,
            PlaneSlot::YLow => PlaneSlot::YHigh,
            PlaneSlot::YHigh => PlaneSlot::YLow,
        }
    }

    /// Both slots of an axis, lower first.
    pub fn of_axis(axis: Axis) -> [PlaneSlot; 2] {
        match axis {
            Axis::X => [PlaneSlot::XLow, PlaneSlot::XHigh],
            Axis::Y => [PlaneSlot::YLow, PlaneSlot::YHigh],
        }
    }
}

impl fmt::Display for PlaneSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.index() + 1)
    }
}

/// Identity of a conductor, used for readout groups and status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Electrode {
    /// Wire by index in the checked cell
    Wire(usize),
    /// Rectilinear plane
    Plane(PlaneSlot),
    /// The enclosing tube
    Tube,
}

/// A thin wire running along z.
#[derive(Debug, Clone, PartialEq)]
pub struct Wire {
    /// Centre x coordinate [cm]
    pub x: f64,
    /// Centre y coordinate [cm]
    pub y: f64,
    /// Diameter [cm]
    pub diameter: f64,
    /// Potential [V]
    pub voltage: f64,
    /// Readout label
    pub label: String,
    /// Length along z [cm]
    pub length: f64,
    /// Stretching weight [g]
    pub tension: f64,
    /// Density [g/cm3]
    pub density: f64,
    /// Trap radius in units of the wire radius
    pub n_trap: u32,
    /// Line charge from the capacitance solve, in units of 4πε0
    pub charge: f64,
}

impl Wire {
    /// Create a wire with default mechanical parameters
    /// (length 100 cm, tension 50 g, tungsten density, trap radius 5).
    pub fn new(x: f64, y: f64, diameter: f64, voltage: f64, label: impl Into<String>) -> Self {
        Self {
            x,
            y,
            diameter,
            voltage,
            label: label.into(),
            length: 100.0,
            tension: 50.0,
            density: 19.3,
            n_trap: 5,
            charge: 0.0,
        }
    }

    /// Set the wire length.
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    /// Set the stretching weight.
    pub fn with_tension(mut self, tension: f64) -> Self {
        self.tension = tension;
        self
    }

    /// Set the wire material density.
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    /// Set the trap radius multiplier.
    pub fn with_trap_radius(mut self, n_trap: u32) -> Self {
        self.n_trap = n_trap;
        self
    }

    /// Wire radius.
    pub fn radius(&self) -> f64 {
        0.5 * self.diameter
    }
}

/// Orientation of a readout strip on a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StripDirection {
    /// Runs along the in-plane transverse axis; its extent is measured in z
    InPlane,
    /// Runs along z; its extent is measured along the in-plane axis
    AlongZ,
}

/// A readout strip segmented out of a plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Strip {
    /// Lower edge of the strip
    pub smin: f64,
    /// Upper edge of the strip
    pub smax: f64,
    /// Anode-cathode gap, derived from the cell when absent
    pub gap: Option<f64>,
    /// Readout label
    pub label: String,
}

impl Strip {
    /// Centre of the strip.
    pub fn centre(&self) -> f64 {
        0.5 * (self.smin + self.smax)
    }

    /// Half of the strip width.
    pub fn half_width(&self) -> f64 {
        0.5 * (self.smax - self.smin)
    }
}

/// A rectangular readout pixel on a plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Pixel {
    /// Lower edge along the in-plane axis
    pub smin: f64,
    /// Upper edge along the in-plane axis
    pub smax: f64,
    /// Lower edge along z
    pub zmin: f64,
    /// Upper edge along z
    pub zmax: f64,
    /// Anode-cathode gap, derived from the cell when absent
    pub gap: Option<f64>,
    /// Readout label
    pub label: String,
}

/// An infinite conducting plane at constant x or y.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// Plane coordinate [cm]
    pub coord: f64,
    /// Potential [V]
    pub voltage: f64,
    /// Readout label
    pub label: String,
    /// Strips running along the in-plane transverse axis
    pub strips_in_plane: Vec<Strip>,
    /// Strips running along z
    pub strips_along_z: Vec<Strip>,
    /// Pixels
    pub pixels: Vec<Pixel>,
}

impl Plane {
    pub fn new(coord: f64, voltage: f64, label: impl Into<String>) -> Self {
        Self {
            coord,
            voltage,
            label: label.into(),
            strips_in_plane: Vec::new(),
            strips_along_z: Vec::new(),
            pixels: Vec::new(),
        }
    }

    /// Strips of one orientation.
    pub fn strips(&self, direction: StripDirection) -> &[Strip] {
        match direction {
            StripDirection::InPlane => &self.strips_in_plane,
            StripDirection::AlongZ => &self.strips_along_z,
        }
    }

    /// Iterate over all strip and pixel gaps, mutably.
    pub(crate) fn gaps_mut(&mut self) -> impl Iterator<Item = (&'static str, &mut Option<f64>)> + '_ {
        self.strips_in_plane
            .iter_mut()
            .chain(self.strips_along_z.iter_mut())
            .map(|s| ("strip", &mut s.gap))
            .chain(self.pixels.iter_mut().map(|p| ("pixel", &mut p.gap)))
    }
}

/// A circular or regular polygonal tube centred on the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Tube {
    /// Radius (distance to the corners for a polygon) [cm]
    pub radius: f64,
    /// Potential [V]
    pub voltage: f64,
    /// Number of edges, 0 for a circle
    pub n_edges: u32,
    /// Readout label
    pub label: String,
}

/// A 3D point charge superposed on the 2D solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointCharge {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Charge in units of 4πε0
    pub charge: f64,
}

/// Axis-aligned box enclosing the active part of the cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub zmin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub zmax: f64,
}

/// Analytic topology of a cell.
///
/// The letter gives the family (A: free or mirrored, B: one-dimensional
/// row, C: doubly periodic, D: tube) and the suffix the orientation of
/// the periodicity or the plane pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    /// Non-periodic, at most one plane per axis
    A,
    /// Periodic in x, at most one y plane
    B1X,
    /// Periodic in y, at most one x plane
    B1Y,
    /// Periodic in x with one x plane, or two x planes
    B2X,
    /// Periodic in y with one y plane, or two y planes
    B2Y,
    /// Doubly periodic without planes
    C1,
    /// Doubly periodic with x planes
    C2X,
    /// Doubly periodic with y planes
    C2Y,
    /// Doubly periodic with planes in x and y
    C3,
    /// Circular tube
    D1,
    /// Circular tube with phi periodicity
    D2,
    /// Polygonal tube
    D3,
    /// Polygonal tube with phi periodicity
    D4,
}

impl CellType {
    pub fn name(&self) -> &'static str {
        match self {
            CellType::A => "A",
            CellType::B1X => "B1X",
            CellType::B1Y => "B1Y",
            CellType::B2X => "B2X",
            CellType::B2Y => "B2Y",
            CellType::C1 => "C1",
            CellType::C2X => "C2X",
            CellType::C2Y => "C2Y",
            CellType::C3 => "C3",
            CellType::D1 => "D1",
            CellType::D2 => "D2",
            CellType::D3 => "D3",
            CellType::D4 => "D4",
        }
    }

    /// Whether the cell is enclosed by a tube.
    pub fn is_tube(&self) -> bool {
        matches!(self, CellType::D1 | CellType::D2 | CellType::D3 | CellType::D4)
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
