//! Main solver interface.

use std::collections::HashMap;
use std::f64::consts::PI;

use log::{debug, error, info, warn};

use crate::cell::{
    check_cell, classify, Axis, BoundingBox, Cell, CellType, Plane, PointCharge, Symmetry, Tube, Wire,
};
use crate::error::{FieldError, Result};
use crate::field::{self, ChargeKernel, FieldValue, SeriesLimits, Status};
use crate::medium::{MediumMap, UniformMedium};
use crate::signal::{ReadoutGroup, Signals};
use crate::solver::{solve, SolvedCell};
use crate::{DEFAULT_N_TERM_BESSEL, DEFAULT_N_TERM_POLY, FOUR_PI_EPSILON0};

/// Configuration for the field solver.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    /// Bessel terms in the far zone of the point-charge series.
    pub n_term_bessel: usize,
    /// Terms in the near-zone polynomial of the point-charge series.
    pub n_term_poly: usize,
    /// Explicit cell copies per periodic axis in the signal matrices;
    /// 0 uses the natural periodicity of the cell.
    pub n_fourier: usize,
    /// Log the residual of the charge solve for every wire.
    pub charge_check: bool,
    /// Log the prepared cell in detail.
    pub debug: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            n_term_bessel: DEFAULT_N_TERM_BESSEL,
            n_term_poly: DEFAULT_N_TERM_POLY,
            n_fourier: 1,
            charge_check: false,
            debug: false,
        }
    }
}

impl FieldConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of Bessel terms.
    pub fn with_n_term_bessel(mut self, n: usize) -> Self {
        self.n_term_bessel = n;
        self
    }

    /// Set the number of polynomial terms.
    pub fn with_n_term_poly(mut self, n: usize) -> Self {
        self.n_term_poly = n;
        self
    }

    /// Set the Fourier mode count of the signal matrices.
    ///
    /// - 0: natural periodicity (only for cells with a periodic signal kernel)
    /// - 1 (default): the basic cell alone
    /// - 2, 4, 8, ...: that many copies along each periodic axis
    pub fn with_n_fourier(mut self, n: usize) -> Self {
        self.n_fourier = n;
        self
    }

    /// Enable the charge-solve residual check.
    pub fn with_charge_check(mut self, check: bool) -> Self {
        self.charge_check = check;
        self
    }

    /// Enable detailed listings.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    fn limits(&self) -> SeriesLimits {
        SeriesLimits {
            n_bessel: self.n_term_bessel,
            n_poly: self.n_term_poly,
        }
    }
}

/// A solved cell and the point-charge kernel that goes with it.
struct Prepared {
    solved: SolvedCell,
    kernel: ChargeKernel,
}

enum Preparation {
    /// Geometry changed since the last solve
    Dirty,
    Ready(Box<Prepared>),
    /// The last attempt failed; retried only after the next mutation
    Failed,
}

enum SignalState {
    Pending,
    Ready(Box<Signals>, HashMap<String, ReadoutGroup>),
    Failed,
}

/// Electrostatic field of a wire-chamber cell.
///
/// Mutators change the geometry and invalidate the solution; the charges
/// are solved again on the next query. Evaluation never fails: conditions
/// such as a point inside a wire are reported through the status code.
pub struct AnalyticField {
    cell: Cell,
    config: FieldConfig,
    /// 3D point charges, in units of 4πε0
    point_charges: Vec<PointCharge>,
    /// Readout group labels in order of definition
    readout: Vec<String>,
    medium: Box<dyn MediumMap>,
    preparation: Preparation,
    signals: SignalState,
}

impl Default for AnalyticField {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticField {
    /// Create an empty cell with default configuration.
    pub fn new() -> Self {
        Self::with_config(FieldConfig::default())
    }

    /// Create an empty cell with custom configuration.
    pub fn with_config(config: FieldConfig) -> Self {
        Self {
            cell: Cell::new(),
            config,
            point_charges: Vec::new(),
            readout: Vec::new(),
            medium: Box::new(UniformMedium::default()),
            preparation: Preparation::Dirty,
            signals: SignalState::Pending,
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// The geometry as entered.
    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    fn invalidate(&mut self) {
        self.preparation = Preparation::Dirty;
        self.signals = SignalState::Pending;
    }

    /// Apply a geometry change, invalidating the solution if it succeeded.
    fn mutate<T>(&mut self, change: impl FnOnce(&mut Cell) -> Result<T>) -> Result<T> {
        let out = change(&mut self.cell)?;
        self.invalidate();
        Ok(out)
    }

    // ============ Geometry ============

    /// Add a wire with default length, tension, density and trap radius.
    pub fn add_wire(&mut self, x: f64, y: f64, diameter: f64, voltage: f64, label: &str) -> Result<usize> {
        self.add_wire_with(Wire::new(x, y, diameter, voltage, label))
    }

    /// Add a fully specified wire, returning its index.
    pub fn add_wire_with(&mut self, wire: Wire) -> Result<usize> {
        self.mutate(|cell| cell.add_wire(wire))
    }

    /// Add or replace the tube. `n_edges` is 0 for a circle, or 3 to 8
    /// for a regular polygon.
    pub fn add_tube(&mut self, radius: f64, voltage: f64, n_edges: i32, label: &str) -> Result<()> {
        let edges = u32::try_from(n_edges).map_err(|_| {
            error!("AddTube: unphysical number of tube edges ({})", n_edges);
            FieldError::invalid("tube", format!("{n_edges} edges"))
        })?;
        self.mutate(|cell| cell.add_tube(radius, voltage, edges, label))
    }

    /// Add a plane at constant x.
    pub fn add_plane_x(&mut self, x: f64, voltage: f64, label: &str) -> Result<()> {
        self.mutate(|cell| cell.add_plane(Axis::X, x, voltage, label).map(|_| ()))
    }

    /// Add a plane at constant y.
    pub fn add_plane_y(&mut self, y: f64, voltage: f64, label: &str) -> Result<()> {
        self.mutate(|cell| cell.add_plane(Axis::Y, y, voltage, label).map(|_| ()))
    }

    /// Add a strip to the x plane nearest to `x`. `direction` is `'y'` or
    /// `'z'`; a non-positive gap is derived from the cell.
    pub fn add_strip_on_plane_x(
        &mut self,
        direction: char,
        x: f64,
        smin: f64,
        smax: f64,
        label: &str,
        gap: f64,
    ) -> Result<()> {
        self.mutate(|cell| cell.add_strip(Axis::X, direction, x, smin, smax, label, gap))
    }

    /// Add a strip to the y plane nearest to `y`. `direction` is `'x'` or
    /// `'z'`; a non-positive gap is derived from the cell.
    pub fn add_strip_on_plane_y(
        &mut self,
        direction: char,
        y: f64,
        smin: f64,
        smax: f64,
        label: &str,
        gap: f64,
    ) -> Result<()> {
        self.mutate(|cell| cell.add_strip(Axis::Y, direction, y, smin, smax, label, gap))
    }

    /// Add a pixel to the x plane nearest to `x`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_pixel_on_plane_x(
        &mut self,
        x: f64,
        ymin: f64,
        ymax: f64,
        zmin: f64,
        zmax: f64,
        label: &str,
        gap: f64,
    ) -> Result<()> {
        self.mutate(|cell| cell.add_pixel(Axis::X, x, ymin, ymax, zmin, zmax, label, gap))
    }

    /// Add a pixel to the y plane nearest to `y`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_pixel_on_plane_y(
        &mut self,
        y: f64,
        xmin: f64,
        xmax: f64,
        zmin: f64,
        zmax: f64,
        label: &str,
        gap: f64,
    ) -> Result<()> {
        self.mutate(|cell| cell.add_pixel(Axis::Y, y, xmin, xmax, zmin, zmax, label, gap))
    }

    pub fn set_periodicity_x(&mut self, s: f64) -> Result<()> {
        self.mutate(|cell| cell.set_periodicity(Axis::X, s))
    }

    /// Periodicity in y, or in phi (radians) inside a tube.
    pub fn set_periodicity_y(&mut self, s: f64) -> Result<()> {
        self.mutate(|cell| cell.set_periodicity(Axis::Y, s))
    }

    pub fn periodicity_x(&self) -> Option<f64> {
        self.cell.period(Axis::X)
    }

    pub fn periodicity_y(&self) -> Option<f64> {
        self.cell.period(Axis::Y)
    }

    /// Request a symmetry other than x/y translation. Always rejected.
    pub fn enable_symmetry(&mut self, symmetry: Symmetry) -> Result<()> {
        self.cell.enable_symmetry(symmetry)
    }

    pub fn number_of_wires(&self) -> usize {
        self.cell.wires().len()
    }

    /// Wire as entered; the charge is that of the last solve.
    pub fn wire(&self, i: usize) -> Result<Wire> {
        let mut wire = self.cell.wire(i)?.clone();
        if let Preparation::Ready(p) = &self.preparation {
            if let Some(k) = p.solved.cell.wire_origin.iter().position(|&o| o == i) {
                wire.charge = p.solved.cell.wires[k].charge;
            }
        }
        Ok(wire)
    }

    pub fn number_of_planes_x(&self) -> usize {
        self.cell.number_of_planes(Axis::X)
    }

    pub fn number_of_planes_y(&self) -> usize {
        self.cell.number_of_planes(Axis::Y)
    }

    pub fn plane_x(&self, i: usize) -> Result<&Plane> {
        self.cell.plane_on_axis(Axis::X, i)
    }

    pub fn plane_y(&self, i: usize) -> Result<&Plane> {
        self.cell.plane_on_axis(Axis::Y, i)
    }

    pub fn tube(&self) -> Option<&Tube> {
        self.cell.tube()
    }

    // ============ Point charges and configuration ============

    /// Add a 3D point charge of `q` fC.
    pub fn add_charge(&mut self, x: f64, y: f64, z: f64, q: f64) {
        self.point_charges.push(PointCharge {
            x,
            y,
            z,
            charge: q / FOUR_PI_EPSILON0,
        });
    }

    /// Remove all point charges and restore the default series lengths.
    pub fn clear_charges(&mut self) {
        self.point_charges.clear();
        self.config.n_term_bessel = DEFAULT_N_TERM_BESSEL;
        self.config.n_term_poly = DEFAULT_N_TERM_POLY;
    }

    /// Point charges with their charge in fC.
    pub fn charges(&self) -> Vec<PointCharge> {
        self.point_charges
            .iter()
            .map(|c| PointCharge {
                charge: c.charge * FOUR_PI_EPSILON0,
                ..*c
            })
            .collect()
    }

    pub fn set_n_term_bessel(&mut self, n: usize) {
        self.config.n_term_bessel = n;
    }

    pub fn set_n_term_poly(&mut self, n: usize) {
        self.config.n_term_poly = n;
    }

    /// Log the residual of the charge solve; applies from the next solve.
    pub fn set_charge_check(&mut self, check: bool) {
        self.config.charge_check = check;
        self.invalidate();
    }

    /// Change the Fourier mode count; the signal matrices are rebuilt.
    pub fn set_n_fourier(&mut self, n: usize) {
        self.config.n_fourier = n;
        self.signals = SignalState::Pending;
    }

    /// Install the lookup used to tag field points with their medium.
    pub fn set_medium_map(&mut self, map: impl MediumMap + 'static) {
        self.medium = Box::new(map);
    }

    /// Labels of the readout groups, in the order they were added.
    pub fn readout_groups(&self) -> &[String] {
        &self.readout
    }

    /// Define a readout group.
    pub fn add_readout(&mut self, label: &str) {
        if self.readout.iter().any(|l| l == label) {
            warn!("AddReadout: readout group {} already exists", label);
            return;
        }
        self.readout.push(label.to_string());

        let cell = &self.cell;
        let wires = cell.wires().iter().filter(|w| w.label == label).count();
        let planes: Vec<&Plane> = [Axis::X, Axis::Y]
            .into_iter()
            .flat_map(|axis| (0..2).filter_map(move |i| cell.plane_on_axis(axis, i).ok()))
            .collect();
        let plane_count = planes.iter().filter(|p| p.label == label).count();
        let strips = planes
            .iter()
            .flat_map(|p| p.strips_in_plane.iter().chain(&p.strips_along_z))
            .filter(|s| s.label == label)
            .count();
        let pixels = planes
            .iter()
            .flat_map(|p| &p.pixels)
            .filter(|p| p.label == label)
            .count();
        let tube = cell.tube().is_some_and(|t| t.label == label);
        info!(
            "AddReadout: {}: {} wire(s), {} plane(s), {} strip(s), {} pixel(s){}",
            label,
            wires,
            plane_count,
            strips,
            pixels,
            if tube { ", the tube" } else { "" }
        );
        if wires + plane_count + strips + pixels == 0 && !tube {
            warn!("AddReadout: at present there are no electrodes with label {}", label);
        }
        self.signals = SignalState::Pending;
    }

    // ============ Preparation ============

    /// Check, classify and solve the cell if the geometry changed.
    pub fn prepare(&mut self) -> Result<()> {
        match self.preparation {
            Preparation::Ready(_) => return Ok(()),
            Preparation::Failed => return Err(FieldError::CellUnusable),
            Preparation::Dirty => {}
        }
        match self.solve_cell() {
            Ok(prepared) => {
                self.preparation = Preparation::Ready(Box::new(prepared));
                Ok(())
            }
            Err(e) => {
                error!("Prepare: the cell could not be set up: {}", e);
                self.preparation = Preparation::Failed;
                Err(e)
            }
        }
    }

    fn solve_cell(&self) -> Result<Prepared> {
        let mut checked = check_cell(&self.cell)?;
        let kind = classify(&mut checked)?;
        debug!("Prepare: cell type {}", kind);
        let solved = solve(checked, kind, self.config.charge_check)?;
        let kernel = ChargeKernel::for_cell(&solved);
        let prepared = Prepared { solved, kernel };
        if self.config.debug {
            log_cell(&prepared.solved);
        }
        Ok(prepared)
    }

    fn prepared(&mut self) -> Option<&Prepared> {
        self.prepare().ok()?;
        self.ready()
    }

    fn ready(&self) -> Option<&Prepared> {
        match &self.preparation {
            Preparation::Ready(p) => Some(p),
            _ => None,
        }
    }

    /// Solved cell, preparing it if needed.
    pub fn solved(&mut self) -> Option<&SolvedCell> {
        self.prepared().map(|p| &p.solved)
    }

    /// Topology of the cell.
    pub fn cell_type(&mut self) -> Option<CellType> {
        self.solved().map(|s| s.kind)
    }

    /// Region of interest of the cell.
    pub fn bounding_box(&mut self) -> Option<BoundingBox> {
        self.solved().map(|s| s.cell.bounding_box)
    }

    /// Lowest and highest conductor potential.
    pub fn voltage_range(&mut self) -> Option<(f64, f64)> {
        self.solved().map(|s| s.cell.voltage_range)
    }

    /// Log the wire charges and the point charges.
    pub fn print_charges(&mut self) {
        if let Some(solved) = self.solved() {
            info!("PrintCharges: wire charges [4πε0·V]");
            for (i, wire) in solved.cell.wires.iter().enumerate() {
                info!(
                    "  {:3} {:>8} ({:10.4}, {:10.4}) {:12.5e}",
                    solved.cell.wire_origin[i], wire.label, wire.x, wire.y, wire.charge
                );
            }
        }
        if self.point_charges.is_empty() {
            info!("PrintCharges: no point charges present");
            return;
        }
        info!("PrintCharges:       x [cm]      y [cm]      z [cm]  charge [fC]");
        for c in self.charges() {
            info!("  {:12.4} {:12.4} {:12.4} {:12.4}", c.x, c.y, c.z, c.charge);
        }
    }

    // ============ Field evaluation ============

    /// Field and potential at (x, y, z) without the medium check.
    pub fn field(&mut self, x: f64, y: f64, z: f64) -> (i32, FieldValue) {
        if self.prepare().is_err() {
            return (Status::Unsolvable.code(), FieldValue::default());
        }
        let Some(prepared) = self.ready() else {
            return (Status::Unsolvable.code(), FieldValue::default());
        };
        let (status, value) = field::electric_field(
            &prepared.solved,
            &prepared.kernel,
            &self.point_charges,
            self.config.limits(),
            x,
            y,
            z,
        );
        (user_status(&prepared.solved, status).code(), value)
    }

    /// Field and potential, tagged with the medium at the point.
    pub fn electric_field_potential(&mut self, x: f64, y: f64, z: f64) -> (i32, FieldValue) {
        let (status, value) = self.field(x, y, z);
        if status != 0 {
            return (status, value);
        }
        let status = match self.medium.medium_at(x, y, z) {
            None => Status::NoMedium,
            Some(m) if !m.is_driftable() => Status::NotDriftable,
            Some(_) => Status::Ok,
        };
        (status.code(), value)
    }

    /// Field tagged with the medium at the point. The potential is not
    /// reported.
    pub fn electric_field(&mut self, x: f64, y: f64, z: f64) -> (i32, FieldValue) {
        let (status, value) = self.electric_field_potential(x, y, z);
        (status, FieldValue { v: 0.0, ..value })
    }

    /// First wire crossed by the straight step between two points, with
    /// the crossing point and the wire index.
    pub fn is_wire_crossed(
        &mut self,
        x0: f64,
        y0: f64,
        z0: f64,
        x1: f64,
        y1: f64,
        z1: f64,
    ) -> Option<(f64, f64, f64, usize)> {
        let solved = self.solved()?;
        let (xc, yc, zc, i) = field::is_wire_crossed(solved, (x0, y0, z0), (x1, y1, z1))?;
        Some((xc, yc, zc, solved.cell.wire_origin[i]))
    }

    /// Centre and radius of a wire whose trap radius contains the point,
    /// if its charge has the opposite sign to `q`.
    pub fn is_in_trap_radius(&mut self, q: f64, x: f64, y: f64, z: f64) -> Option<(f64, f64, f64)> {
        let solved = self.solved()?;
        field::is_in_trap_radius(solved, q, x, y, z)
    }

    // ============ Weighting fields ============

    /// Build the signal matrices for the readout groups.
    pub fn prepare_signals(&mut self) -> Result<()> {
        match self.signals {
            SignalState::Ready(..) => return Ok(()),
            SignalState::Failed => return Err(FieldError::CellUnusable),
            SignalState::Pending => {}
        }
        if self.readout.is_empty() {
            error!("PrepareSignals: there are no readout groups defined");
            return Err(FieldError::NoReadoutGroups);
        }
        let n_fourier = self.config.n_fourier;
        let result = match self.prepared() {
            Some(prepared) => Signals::prepare(&prepared.solved, n_fourier),
            None => Err(FieldError::CellUnusable),
        };
        match result {
            Ok(signals) => {
                let groups = self
                    .readout
                    .iter()
                    .map(|label| (label.clone(), signals.group(label)))
                    .collect();
                self.signals = SignalState::Ready(Box::new(signals), groups);
                Ok(())
            }
            Err(e) => {
                error!("PrepareSignals: unable to calculate weighting fields: {}", e);
                self.signals = SignalState::Failed;
                Err(e)
            }
        }
    }

    fn weighting(&mut self, x: f64, y: f64, z: f64, label: &str) -> FieldValue {
        if self.readout.is_empty() || self.prepare_signals().is_err() || label.is_empty() {
            return FieldValue::default();
        }
        match &self.signals {
            SignalState::Ready(signals, groups) => groups
                .get(label)
                .map_or_else(FieldValue::default, |group| signals.weighting(group, x, y, z)),
            _ => FieldValue::default(),
        }
    }

    /// Weighting field of a readout group.
    pub fn weighting_field(&mut self, x: f64, y: f64, z: f64, label: &str) -> (f64, f64, f64) {
        let w = self.weighting(x, y, z, label);
        (w.ex, w.ey, w.ez)
    }

    /// Weighting potential of a readout group.
    pub fn weighting_potential(&mut self, x: f64, y: f64, z: f64, label: &str) -> f64 {
        self.weighting(x, y, z, label).v
    }
}

/// Report wires by their input index.
fn user_status(solved: &SolvedCell, status: Status) -> Status {
    match status {
        Status::InWire(k) => Status::InWire(solved.cell.wire_origin.get(k).copied().unwrap_or(k)),
        other => other,
    }
}

fn log_cell(solved: &SolvedCell) {
    let cell = &solved.cell;
    info!("Cell type {} with {} wire(s)", solved.kind, cell.wires.len());
    if cell.perx {
        info!("  periodic in x with length {} cm", cell.sx);
    }
    if cell.pery {
        if cell.tube.is_some() {
            info!("  periodic in phi with angle {} degrees", cell.sy * 180.0 / PI);
        } else {
            info!("  periodic in y with length {} cm", cell.sy);
        }
    }
    for (i, plane) in cell.planes.iter().enumerate() {
        if let Some(p) = plane {
            info!("  plane {} at {} cm, {} V, label {}", i + 1, p.coord, p.voltage, p.label);
        }
    }
    if let Some(t) = &cell.tube {
        info!("  tube radius {} cm, {} V, {} edges, label {}", t.radius, t.voltage, t.n_edges, t.label);
    }
    for w in &cell.wires {
        info!(
            "  wire {} at ({}, {}) d = {} cm, {} V, charge {}",
            w.label, w.x, w.y, w.diameter, w.voltage, w.charge
        );
    }
    let b = &cell.bounding_box;
    info!(
        "  bounding box ({}, {}, {}) - ({}, {}, {}), voltage range {:?}",
        b.xmin, b.ymin, b.zmin, b.xmax, b.ymax, b.zmax, cell.voltage_range
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::Medium;
    use approx::assert_relative_eq;

    fn drift_tube() -> AnalyticField {
        let mut field = AnalyticField::new();
        field.add_wire(0.0, 0.0, 0.002, 1000.0, "anode").unwrap();
        field.add_tube(1.0, 0.0, 0, "tube").unwrap();
        field
    }

    #[test]
    fn test_config_builders() {
        let config = FieldConfig::new().with_n_fourier(4).with_charge_check(true);
        assert_eq!(config.n_fourier, 4);
        assert!(config.charge_check);
        assert_eq!(config.n_term_bessel, 10);
        assert_eq!(config.n_term_poly, 100);
    }

    #[test]
    fn test_lazy_preparation() {
        let mut field = drift_tube();
        assert_eq!(field.cell_type(), Some(CellType::D1));
        assert!(field.wire(0).unwrap().charge > 0.0);
        field.add_wire(0.5, 0.0, 0.002, 0.0, "f").unwrap();
        assert!(matches!(field.preparation, Preparation::Dirty));
    }

    #[test]
    fn test_failed_cell_is_unsolvable_until_modified() {
        let mut field = AnalyticField::new();
        field.add_wire(0.0, 0.0, 0.002, 1000.0, "anode").unwrap();
        assert_eq!(field.field(0.5, 0.0, 0.0).0, -11);
        assert!(matches!(field.prepare(), Err(FieldError::CellUnusable)));
        field.add_plane_y(-1.0, 0.0, "c").unwrap();
        assert_eq!(field.field(0.5, 0.0, 0.0).0, 0);
    }

    #[test]
    fn test_medium_check() {
        let mut field = drift_tube();
        field.set_medium_map(|x: f64, _y: f64, _z: f64| {
            if x > 0.8 {
                None
            } else if x > 0.6 {
                Some(Medium::insulator("epoxy", 3.5))
            } else {
                Some(Medium::gas("Ar/CO2"))
            }
        });
        assert_eq!(field.electric_field(0.5, 0.0, 0.0).0, 0);
        assert_eq!(field.electric_field(0.7, 0.0, 0.0).0, -5);
        assert_eq!(field.electric_field(0.9, 0.0, 0.0).0, -6);
        assert_eq!(field.electric_field(0.0005, 0.0, 0.0).0, 1);
        assert_eq!(field.electric_field(1.5, 0.0, 0.0).0, -4);
    }

    #[test]
    fn test_potential_only_when_requested() {
        let mut field = drift_tube();
        let (_, with) = field.electric_field_potential(0.5, 0.0, 0.0);
        let (_, without) = field.electric_field(0.5, 0.0, 0.0);
        assert!(with.v > 0.0);
        assert_eq!(without.v, 0.0);
        assert_eq!(with.ex, without.ex);
    }

    #[test]
    fn test_point_charges_in_user_units() {
        let mut field = drift_tube();
        field.set_n_term_poly(20);
        field.add_charge(0.1, 0.2, 0.3, 5.0);
        let charges = field.charges();
        assert_eq!(charges.len(), 1);
        assert_relative_eq!(charges[0].charge, 5.0, max_relative = 1e-12);
        field.clear_charges();
        assert!(field.charges().is_empty());
        assert_eq!(field.config().n_term_poly, 100);
    }

    #[test]
    fn test_weighting_requires_readout() {
        let mut field = drift_tube();
        assert_eq!(field.weighting_potential(0.5, 0.0, 0.0, "anode"), 0.0);
        assert!(matches!(field.prepare_signals(), Err(FieldError::NoReadoutGroups)));
        field.add_readout("anode");
        field.add_readout("anode");
        let v = field.weighting_potential(0.5, 0.0, 0.0, "anode");
        assert_relative_eq!(v, 2.0f64.ln() / 1000.0f64.ln(), max_relative = 1e-6);
        assert_eq!(field.weighting_potential(0.5, 0.0, 0.0, "unknown"), 0.0);
        assert_eq!(field.weighting_potential(0.5, 0.0, 0.0, ""), 0.0);
    }

    #[test]
    fn test_readout_groups_on_planes_and_tube() {
        let mut field = AnalyticField::new();
        field.add_wire(0.0, 0.0, 0.002, 1000.0, "anode").unwrap();
        field.add_plane_y(-0.5, 0.0, "cathode").unwrap();
        field.add_plane_y(0.5, 0.0, "cathode").unwrap();
        field.add_readout("cathode");
        field.add_readout("anode");
        field.add_readout("cathode");
        field.add_readout("missing");
        assert_eq!(field.readout_groups(), ["cathode", "anode", "missing"]);
        assert!(field.prepare_signals().is_ok());
        let w = field.weighting_potential(0.0, 0.5, 0.0, "cathode");
        assert_relative_eq!(w, 1.0, epsilon = 1e-6);

        let mut tube = drift_tube();
        tube.add_readout("tube");
        assert_eq!(tube.readout_groups(), ["tube"]);
    }

    #[test]
    fn test_unsupported_signal_mode() {
        let mut field = AnalyticField::with_config(FieldConfig::new().with_n_fourier(0));
        field.add_wire(0.0, 0.0, 0.002, 1000.0, "anode").unwrap();
        field.add_plane_y(-0.5, 0.0, "c").unwrap();
        field.set_periodicity_x(1.0).unwrap();
        field.add_readout("anode");
        assert_eq!(field.cell_type(), Some(CellType::B1X));
        assert!(matches!(
            field.prepare_signals(),
            Err(FieldError::UnsupportedSignalCell { .. })
        ));
        assert_eq!(field.weighting_field(0.1, 0.1, 0.0, "anode"), (0.0, 0.0, 0.0));
        field.set_n_fourier(4);
        assert!(field.prepare_signals().is_ok());
    }

    #[test]
    fn test_wire_status_uses_input_index() {
        let mut field = AnalyticField::new();
        field.add_wire(0.0, 0.0, 0.002, 1000.0, "a").unwrap();
        field.add_wire(5.0, 0.0, 0.002, 1000.0, "outside").unwrap();
        field.add_wire(0.3, 0.0, 0.002, 0.0, "b").unwrap();
        field.add_tube(1.0, 0.0, 0, "tube").unwrap();
        assert_eq!(field.field(0.3005, 0.0, 0.0).0, 3);
    }
}
