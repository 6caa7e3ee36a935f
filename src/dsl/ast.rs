//! Syntax tree of a cell description and its conversion to a field model.

use log::{debug, error};

use crate::analytic::{AnalyticField, FieldConfig};
use crate::cell::{Axis, Wire};
use crate::error::Result;

/// A parsed cell description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellAst {
    /// Electrodes in the order they appear
    pub elements: Vec<ElementDef>,
    /// `.period` directives
    pub periods: Vec<PeriodDef>,
    /// `.readout` labels
    pub readouts: Vec<String>,
    /// `.charge` directives
    pub charges: Vec<ChargeDef>,
    /// Merged `.config` settings
    pub config: ConfigDef,
}

/// One electrode line.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDef {
    pub kind: ElementKind,
    pub label: String,
    /// Source line number for error reporting
    pub line: usize,
}

/// Electrode variants and their parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Wire {
        x: f64,
        y: f64,
        diameter: f64,
        voltage: f64,
        length: Option<f64>,
        tension: Option<f64>,
        density: Option<f64>,
        n_trap: Option<u32>,
    },
    Tube {
        radius: f64,
        voltage: f64,
        edges: i32,
    },
    Plane {
        axis: Axis,
        coord: f64,
        voltage: f64,
    },
    Strip {
        axis: Axis,
        coord: f64,
        direction: char,
        smin: f64,
        smax: f64,
        gap: f64,
    },
    Pixel {
        axis: Axis,
        coord: f64,
        smin: f64,
        smax: f64,
        zmin: f64,
        zmax: f64,
        gap: f64,
    },
}

impl ElementKind {
    /// Element keyword as written in the file.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Wire { .. } => "wire",
            Self::Tube { .. } => "tube",
            Self::Plane { .. } => "plane",
            Self::Strip { .. } => "strip",
            Self::Pixel { .. } => "pixel",
        }
    }
}

/// Periodicity along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodDef {
    pub axis: Axis,
    pub period: f64,
    pub line: usize,
}

/// A 3D point charge in fC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeDef {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub q: f64,
}

/// Solver settings; unset keys keep the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigDef {
    pub n_term_bessel: Option<usize>,
    pub n_term_poly: Option<usize>,
    pub n_fourier: Option<usize>,
    pub charge_check: Option<bool>,
}

impl ConfigDef {
    fn to_config(self) -> FieldConfig {
        let mut config = FieldConfig::new();
        if let Some(n) = self.n_term_bessel {
            config = config.with_n_term_bessel(n);
        }
        if let Some(n) = self.n_term_poly {
            config = config.with_n_term_poly(n);
        }
        if let Some(n) = self.n_fourier {
            config = config.with_n_fourier(n);
        }
        if let Some(check) = self.charge_check {
            config = config.with_charge_check(check);
        }
        config
    }
}

impl CellAst {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a field model with every element, periodicity, charge and
    /// readout group of the description.
    pub fn build(&self) -> Result<AnalyticField> {
        let mut field = AnalyticField::with_config(self.config.to_config());
        for element in &self.elements {
            add_element(&mut field, element).map_err(|e| {
                error!("{} at line {}: {}", element.kind.keyword(), element.line, e);
                e
            })?;
        }
        for p in &self.periods {
            let applied = match p.axis {
                Axis::X => field.set_periodicity_x(p.period),
                Axis::Y => field.set_periodicity_y(p.period),
            };
            applied.map_err(|e| {
                error!(".period at line {}: {}", p.line, e);
                e
            })?;
        }
        for c in &self.charges {
            field.add_charge(c.x, c.y, c.z, c.q);
        }
        for label in &self.readouts {
            field.add_readout(label);
        }
        debug!(
            "CellAst::build: {} element(s), {} charge(s), {} readout group(s)",
            self.elements.len(),
            self.charges.len(),
            self.readouts.len()
        );
        Ok(field)
    }
}

fn add_element(field: &mut AnalyticField, element: &ElementDef) -> Result<()> {
    let label = element.label.as_str();
    match element.kind {
        ElementKind::Wire {
            x,
            y,
            diameter,
            voltage,
            length,
            tension,
            density,
            n_trap,
        } => {
            let mut wire = Wire::new(x, y, diameter, voltage, label);
            if let Some(length) = length {
                wire = wire.with_length(length);
            }
            if let Some(tension) = tension {
                wire = wire.with_tension(tension);
            }
            if let Some(density) = density {
                wire = wire.with_density(density);
            }
            if let Some(n) = n_trap {
                wire = wire.with_trap_radius(n);
            }
            field.add_wire_with(wire).map(|_| ())
        }
        ElementKind::Tube { radius, voltage, edges } => field.add_tube(radius, voltage, edges, label),
        ElementKind::Plane { axis, coord, voltage } => match axis {
            Axis::X => field.add_plane_x(coord, voltage, label),
            Axis::Y => field.add_plane_y(coord, voltage, label),
        },
        ElementKind::Strip {
            axis,
            coord,
            direction,
            smin,
            smax,
            gap,
        } => match axis {
            Axis::X => field.add_strip_on_plane_x(direction, coord, smin, smax, label, gap),
            Axis::Y => field.add_strip_on_plane_y(direction, coord, smin, smax, label, gap),
        },
        ElementKind::Pixel {
            axis,
            coord,
            smin,
            smax,
            zmin,
            zmax,
            gap,
        } => match axis {
            Axis::X => field.add_pixel_on_plane_x(coord, smin, smax, zmin, zmax, label, gap),
            Axis::Y => field.add_pixel_on_plane_y(coord, smin, smax, zmin, zmax, label, gap),
        },
    }
}
