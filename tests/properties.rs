//! End-to-end checks of the field model against closed-form electrostatics.

use std::f64::consts::PI;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use wirecell_core::{dsl, AnalyticField, CellType};

/// Potential of a thin wire midway between two grounded plates at ±b,
/// from the conformal map of the strip onto a half plane.
fn between_plates(v0: f64, a: f64, b: f64, u: f64, w: f64) -> f64 {
    // zeta = exp(pi (u + i w) / 2b)
    let r = (PI * u / (2.0 * b)).exp();
    let phi = PI * w / (2.0 * b);
    let (re, im) = (r * phi.cos(), r * phi.sin());
    let plus = ((re + 1.0).powi(2) + im * im).sqrt();
    let minus = ((re - 1.0).powi(2) + im * im).sqrt();
    v0 * (plus / minus).ln() / (4.0 * b / (PI * a)).ln()
}

#[test]
fn test_tube_field_matches_coaxial_formula() {
    let mut field = AnalyticField::new();
    field.add_wire(0.0, 0.0, 20e-4, -1000.0, "anode").unwrap();
    field.add_tube(1.0, 0.0, 0, "tube").unwrap();

    let (status, e) = field.electric_field_potential(0.5, 0.0, 0.0);
    assert_eq!(status, 0);
    let a = 10e-4;
    let expected = -1000.0 / (0.5 * (1.0f64 / a).ln());
    assert_relative_eq!(e.ex, expected, max_relative = 1e-3);
    assert_abs_diff_eq!(e.ey, 0.0, epsilon = 1e-6 * expected.abs());
    assert_relative_eq!(e.v, -1000.0 * (1.0f64 / 0.5).ln() / (1.0 / a).ln(), max_relative = 1e-3);

    // Radial symmetry.
    let (_, diagonal) = field.electric_field(0.5 / 2f64.sqrt(), 0.5 / 2f64.sqrt(), 0.0);
    assert_relative_eq!(diagonal.ex.hypot(diagonal.ey), expected.abs(), max_relative = 1e-3);
}

#[test]
fn test_plate_capacitor_potential() {
    let (a, b, v0) = (10e-4, 0.5, 1000.0);
    let mut horizontal = AnalyticField::new();
    horizontal.add_wire(0.0, 0.0, 2.0 * a, v0, "anode").unwrap();
    horizontal.add_plane_y(-b, 0.0, "bottom").unwrap();
    horizontal.add_plane_y(b, 0.0, "top").unwrap();

    let mut vertical = AnalyticField::new();
    vertical.add_wire(0.0, 0.0, 2.0 * a, v0, "anode").unwrap();
    vertical.add_plane_x(-b, 0.0, "left").unwrap();
    vertical.add_plane_x(b, 0.0, "right").unwrap();

    for (u, w) in [(0.2, 0.1), (0.05, -0.3), (0.7, 0.45)] {
        let expected = between_plates(v0, a, b, u, w);
        let (status, h) = horizontal.electric_field_potential(u, w, 0.0);
        assert_eq!(status, 0);
        assert_relative_eq!(h.v, expected, max_relative = 1e-4);
        let (_, v) = vertical.electric_field_potential(w, u, 0.0);
        assert_relative_eq!(v.v, expected, max_relative = 1e-4);
    }
    let (_, on_plate) = horizontal.electric_field_potential(0.3, b - 1e-9, 0.0);
    assert_abs_diff_eq!(on_plate.v, 0.0, epsilon = 1e-3);
}

#[test]
fn test_plate_capacitor_potential_in_doubly_bounded_cells() {
    let (a, b, v0) = (10e-4, 0.5, 1000.0);

    // Plates along y, wires repeated every 8 cm in x.
    let mut c2y = AnalyticField::new();
    c2y.add_wire(0.0, 0.0, 2.0 * a, v0, "anode").unwrap();
    c2y.add_plane_y(-b, 0.0, "bottom").unwrap();
    c2y.add_plane_y(b, 0.0, "top").unwrap();
    c2y.set_periodicity_x(8.0).unwrap();
    assert_eq!(c2y.cell_type(), Some(CellType::C2Y));

    // Plates along x, wires repeated every 8 cm in y.
    let mut c2x = AnalyticField::new();
    c2x.add_wire(0.0, 0.0, 2.0 * a, v0, "anode").unwrap();
    c2x.add_plane_x(-b, 0.0, "left").unwrap();
    c2x.add_plane_x(b, 0.0, "right").unwrap();
    c2x.set_periodicity_y(8.0).unwrap();
    assert_eq!(c2x.cell_type(), Some(CellType::C2X));

    // A closed box whose side walls are far from the wire.
    let mut c3 = AnalyticField::new();
    c3.add_wire(0.0, 0.0, 2.0 * a, v0, "anode").unwrap();
    c3.add_plane_x(-6.0, 0.0, "left").unwrap();
    c3.add_plane_x(6.0, 0.0, "right").unwrap();
    c3.add_plane_y(-b, 0.0, "bottom").unwrap();
    c3.add_plane_y(b, 0.0, "top").unwrap();
    assert_eq!(c3.cell_type(), Some(CellType::C3));

    for (u, w) in [(0.2, 0.1), (0.05, -0.3), (0.7, 0.45)] {
        let expected = between_plates(v0, a, b, u, w);
        let (status, along_x) = c2y.electric_field_potential(u, w, 0.0);
        assert_eq!(status, 0);
        assert_relative_eq!(along_x.v, expected, max_relative = 1e-4);
        let (status, along_y) = c2x.electric_field_potential(w, u, 0.0);
        assert_eq!(status, 0);
        assert_relative_eq!(along_y.v, expected, max_relative = 1e-4);
        let (status, boxed) = c3.electric_field_potential(u, w, 0.0);
        assert_eq!(status, 0);
        assert_relative_eq!(boxed.v, expected, max_relative = 1e-4);
    }
}

#[test]
fn test_periodic_wire_cells_are_neutral() {
    let mut row = AnalyticField::new();
    row.add_wire(0.0, 0.0, 0.002, 1000.0, "anode").unwrap();
    row.add_wire(0.1, 0.05, 0.01, 0.0, "field").unwrap();
    row.add_wire(0.2, -0.1, 0.01, -200.0, "field").unwrap();
    row.set_periodicity_x(0.4).unwrap();
    assert_eq!(row.cell_type(), Some(CellType::B1X));
    let total: f64 = (0..3).map(|i| row.wire(i).unwrap().charge).sum();
    assert_abs_diff_eq!(total, 0.0, epsilon = 1e-9);

    let mut lattice = AnalyticField::new();
    lattice.add_wire(0.0, 0.0, 0.002, 1000.0, "anode").unwrap();
    lattice.add_wire(0.15, 0.2, 0.01, 0.0, "field").unwrap();
    lattice.set_periodicity_x(0.3).unwrap();
    lattice.set_periodicity_y(0.4).unwrap();
    assert_eq!(lattice.cell_type(), Some(CellType::C1));
    let total: f64 = (0..2).map(|i| lattice.wire(i).unwrap().charge).sum();
    assert_abs_diff_eq!(total, 0.0, epsilon = 1e-9);
    assert!(lattice.wire(0).unwrap().charge > 0.0);
}

#[test]
fn test_field_is_invariant_under_folding() {
    let mut field = AnalyticField::new();
    field.add_wire(0.0, 0.0, 0.002, 1500.0, "anode").unwrap();
    field.add_wire(0.25, 0.0, 0.01, 0.0, "field").unwrap();
    field.add_plane_y(-0.5, 0.0, "cathode").unwrap();
    field.add_plane_y(0.5, 0.0, "cathode").unwrap();
    field.set_periodicity_x(0.5).unwrap();

    let (s0, base) = field.electric_field_potential(0.13, 0.21, 0.0);
    for n in [-3.0, 1.0, 7.0] {
        let (s1, moved) = field.electric_field_potential(0.13 + n * 0.5, 0.21, 0.0);
        assert_eq!(s0, s1);
        assert_relative_eq!(moved.ex, base.ex, max_relative = 1e-9);
        assert_relative_eq!(moved.ey, base.ey, max_relative = 1e-9);
        assert_relative_eq!(moved.v, base.v, max_relative = 1e-9);
    }

    let mut lattice = AnalyticField::new();
    lattice.add_wire(0.0, 0.0, 0.002, 1000.0, "anode").unwrap();
    lattice.add_wire(0.15, 0.2, 0.01, 0.0, "field").unwrap();
    lattice.set_periodicity_x(0.3).unwrap();
    lattice.set_periodicity_y(0.4).unwrap();
    let (_, base) = lattice.electric_field_potential(0.07, 0.11, 0.0);
    let (_, moved) = lattice.electric_field_potential(0.07 - 2.0 * 0.3, 0.11 + 5.0 * 0.4, 0.0);
    assert_relative_eq!(moved.ex, base.ex, max_relative = 1e-9);
    assert_relative_eq!(moved.ey, base.ey, max_relative = 1e-9);
    assert_relative_eq!(moved.v, base.v, max_relative = 1e-9);
}

#[test]
fn test_status_changes_at_wire_surface() {
    let mut field = AnalyticField::new();
    field.add_wire(0.3, 0.0, 0.01, 0.0, "field").unwrap();
    field.add_wire(0.0, 0.0, 0.01, 1000.0, "anode").unwrap();
    field.add_plane_y(-0.5, 0.0, "cathode").unwrap();

    let r = 0.005;
    let (inside, value) = field.electric_field_potential(r * 0.98, 0.0, 0.0);
    assert_eq!(inside, 2);
    assert_relative_eq!(value.v, 1000.0);
    assert_eq!(value.ex, 0.0);

    let (outside, near) = field.electric_field(r * 1.02, 0.0, 0.0);
    assert_eq!(outside, 0);
    let (_, far) = field.electric_field(r * 4.0, 0.0, 0.0);
    assert!(near.ex.hypot(near.ey) > 3.0 * far.ex.hypot(far.ey));
}

#[test]
fn test_weighting_potential_boundary_values() {
    let mut field = AnalyticField::new();
    field.add_wire(0.0, 0.0, 0.002, 1500.0, "anode").unwrap();
    field.add_wire(0.25, 0.0, 0.01, 0.0, "field").unwrap();
    field.add_plane_y(-0.5, 0.0, "cathode").unwrap();
    field.add_plane_y(0.5, 0.0, "window").unwrap();
    field.set_periodicity_x(0.5).unwrap();
    field.add_readout("anode");
    field.add_readout("window");

    // Sample just outside the anode rim; the field wire is thick, so average opposite rim points.
    let surface = 1.0 + 1e-6;
    assert_relative_eq!(field.weighting_potential(0.001 * surface, 0.0, 0.0, "anode"), 1.0, epsilon = 1e-3);
    let rim = 0.5
        * (field.weighting_potential(0.25 + 0.005 * surface, 0.0, 0.0, "anode")
            + field.weighting_potential(0.25 - 0.005 * surface, 0.0, 0.0, "anode"));
    assert_abs_diff_eq!(rim, 0.0, epsilon = 3e-4);
    assert_abs_diff_eq!(field.weighting_potential(0.1, -0.5, 0.0, "anode"), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(field.weighting_potential(0.1, 0.5, 0.0, "anode"), 0.0, epsilon = 1e-6);

    assert_relative_eq!(field.weighting_potential(0.1, 0.5, 0.0, "window"), 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(field.weighting_potential(0.001 * surface, 0.0, 0.0, "window"), 0.0, epsilon = 1e-3);
    assert_eq!(field.weighting_potential(0.1, 0.1, 0.0, "nothing"), 0.0);
}

#[test]
fn test_wire_round_trip() {
    let mut field = AnalyticField::new();
    let wire = wirecell_core::cell::Wire::new(0.1, -0.2, 25e-4, 1750.0, "sense")
        .with_length(80.0)
        .with_tension(70.0)
        .with_density(2.7)
        .with_trap_radius(3);
    let index = field.add_wire_with(wire.clone()).unwrap();
    assert_eq!(index, 0);
    let back = field.wire(index).unwrap();
    assert_eq!(back, wire);
    assert_eq!(back.charge, 0.0);
}

#[test]
fn test_point_charge_adds_coulomb_field() {
    let mut field = AnalyticField::new();
    field.add_wire(0.0, 0.0, 0.002, 1000.0, "anode").unwrap();
    field.add_tube(1.0, 0.0, 0, "tube").unwrap();
    let (_, without) = field.electric_field_potential(0.3, 0.0, 0.0);

    field.add_charge(0.3, 0.2, 0.0, 1.0);
    let (_, with) = field.electric_field_potential(0.3, 0.0, 0.0);
    // A positive charge above the point pushes the field down.
    assert!(with.ey < without.ey);
    assert_eq!(field.charges().len(), 1);
    assert_relative_eq!(field.charges()[0].charge, 1.0, max_relative = 1e-12);

    field.clear_charges();
    let (_, cleared) = field.electric_field_potential(0.3, 0.0, 0.0);
    assert_relative_eq!(cleared.ey, without.ey, epsilon = 1e-9);
}

#[test]
fn test_cell_from_description() {
    let text = "\
; drift tube with a readout wire
wire 0 0 20um -1k anode
tube 1 0 0 wall
.readout anode
";
    let mut field = dsl::parse(text).unwrap().build().unwrap();
    assert_eq!(field.cell_type(), Some(CellType::D1));
    let (status, e) = field.electric_field(0.5, 0.0, 0.0);
    assert_eq!(status, 0);
    assert_relative_eq!(e.ex, -1000.0 / (0.5 * (1.0f64 / 10e-4).ln()), max_relative = 1e-3);
    assert_relative_eq!(
        field.weighting_potential(0.5, 0.0, 0.0, "anode"),
        (1.0f64 / 0.5).ln() / (1.0f64 / 10e-4).ln(),
        max_relative = 1e-3
    );
}

#[cfg(feature = "cli")]
#[test]
fn test_cell_from_file() {
    let path = std::env::temp_dir().join(format!("wirecell-{}.cell", std::process::id()));
    std::fs::write(&path, "wire 0 0 20um 1000\nplane y -1 0\nplane y 1 0\n").unwrap();
    let ast = dsl::parse_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(ast.elements.len(), 3);

    let missing = dsl::parse_file(std::path::Path::new("/nonexistent/cell.txt"));
    assert!(matches!(missing, Err(wirecell_core::FieldError::FileReadError { .. })));
}
