//! Fields of 3D point charges superposed on the 2D wire solution.
//!
//! The point charges do not take part in the capacitance solve. Their
//! field is added on top, with images chosen to keep the planes (or the
//! tube) at their potential:
//!
//! - free space and single planes: explicit mirror charges
//! - between two parallel plates: an image series, summed directly close to
//!   the charge and through modified Bessel functions further away
//! - inside a round tube around one wire: the plate series in the
//!   logarithmic frame `ln z`, which maps the wire and the tube to planes

use std::f64::consts::{PI, TAU};

use crate::cell::{Axis, CellType, PointCharge};
use crate::numerics::bessel::k0_k1;
use crate::solver::{reference_plane, SolvedCell};
use crate::SMALL;

use super::FieldValue;

/// Beyond this many plate separations (lateral distance) the Bessel
/// series replaces the direct image sum.
const BESSEL_ZONE: f64 = 2.0;

/// Truncation of the image series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesLimits {
    /// Terms in the modified Bessel function series
    pub n_bessel: usize,
    /// Image pairs in the direct sum
    pub n_poly: usize,
}

/// Image configuration for the point charges of a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChargeKernel {
    /// Free space with optional mirror planes
    Free {
        plane_x: Option<f64>,
        plane_y: Option<f64>,
    },
    /// Between plates at constant x, `sx` apart
    PlatesX {
        sx: f64,
        plane_x: f64,
        plane_y: Option<f64>,
    },
    /// Between plates at constant y, `sy` apart
    PlatesY {
        sy: f64,
        plane_y: f64,
        plane_x: Option<f64>,
    },
    /// Inside a round tube of `radius` around a wire of `wire_diameter`
    Coaxial { radius: f64, wire_diameter: f64 },
}

impl ChargeKernel {
    /// Pick the kernel matching the topology of a solved cell.
    pub fn for_cell(solved: &SolvedCell) -> Self {
        let cell = &solved.cell;
        let plane_x = reference_plane(cell, Axis::X);
        let plane_y = reference_plane(cell, Axis::Y);
        let free = ChargeKernel::Free { plane_x, plane_y };
        match solved.kind {
            CellType::B2X => match plane_x {
                Some(plane_x) => ChargeKernel::PlatesX {
                    sx: cell.sx,
                    plane_x,
                    plane_y,
                },
                None => free,
            },
            CellType::B2Y => match plane_y {
                Some(plane_y) => ChargeKernel::PlatesY {
                    sy: cell.sy,
                    plane_y,
                    plane_x,
                },
                None => free,
            },
            CellType::D1 => match (&cell.tube, cell.wires.first()) {
                (Some(tube), Some(wire)) => ChargeKernel::Coaxial {
                    radius: tube.radius,
                    wire_diameter: wire.diameter,
                },
                _ => free,
            },
            _ => free,
        }
    }

    /// Field and potential of `charges` at (x, y, z).
    pub fn field(&self, charges: &[PointCharge], x: f64, y: f64, z: f64, limits: SeriesLimits) -> FieldValue {
        match *self {
            ChargeKernel::Free { plane_x, plane_y } => free_field(charges, x, y, z, plane_x, plane_y),
            ChargeKernel::PlatesX { sx, plane_x, plane_y } => {
                let mut f = FieldValue::default();
                for c in charges {
                    if x == c.x && y == c.y && z == c.z {
                        continue;
                    }
                    let dx = x - c.x;
                    let dxm = x + c.x - 2.0 * plane_x;
                    let (dy, dz) = (y - c.y, z - c.z);
                    let mut sum = plate_sum(dx, dxm, dy, dz, sx, limits, limits.n_poly + 1);
                    if let Some(cy) = plane_y {
                        let dym = y + c.y - 2.0 * cy;
                        sum.subtract(plate_sum(dx, dxm, dym, dz, sx, limits, limits.n_poly + 1));
                    }
                    f.ex += c.charge * sum.along;
                    f.ey += c.charge * sum.across;
                    f.ez += c.charge * sum.ez;
                    f.v += c.charge * sum.v;
                }
                f
            }
            ChargeKernel::PlatesY { sy, plane_y, plane_x } => {
                let mut f = FieldValue::default();
                for c in charges {
                    if x == c.x && y == c.y && z == c.z {
                        continue;
                    }
                    let dy = y - c.y;
                    let dym = y + c.y - 2.0 * plane_y;
                    let (dx, dz) = (x - c.x, z - c.z);
                    let mut sum = plate_sum(dy, dym, dx, dz, sy, limits, limits.n_poly + 1);
                    if let Some(cx) = plane_x {
                        let dxm = x + c.x - 2.0 * cx;
                        sum.subtract(plate_sum(dy, dym, dxm, dz, sy, limits, limits.n_poly + 1));
                    }
                    f.ex += c.charge * sum.across;
                    f.ey += c.charge * sum.along;
                    f.ez += c.charge * sum.ez;
                    f.v += c.charge * sum.v;
                }
                f
            }
            ChargeKernel::Coaxial { radius, wire_diameter } => {
                coaxial_field(charges, x, y, z, radius, wire_diameter, limits)
            }
        }
    }
}

/// Coulomb field with up to three mirror charges.
fn free_field(
    charges: &[PointCharge],
    x: f64,
    y: f64,
    z: f64,
    plane_x: Option<f64>,
    plane_y: Option<f64>,
) -> FieldValue {
    let mut f = FieldValue::default();
    'charges: for c in charges {
        let (dx, dy, dz) = (x - c.x, y - c.y, z - c.z);
        // Images as (offset x, offset y, sign).
        let mut images = vec![(dx, dy, 1.0)];
        let dxm = plane_x.map(|cx| x + c.x - 2.0 * cx);
        let dym = plane_y.map(|cy| y + c.y - 2.0 * cy);
        if let Some(dxm) = dxm {
            images.push((dxm, dy, -1.0));
        }
        if let Some(dym) = dym {
            images.push((dx, dym, -1.0));
        }
        if let (Some(dxm), Some(dym)) = (dxm, dym) {
            images.push((dxm, dym, 1.0));
        }
        let mut term = FieldValue::default();
        for (ux, uy, sign) in images {
            let r = (ux * ux + uy * uy + dz * dz).sqrt();
            if r < SMALL {
                continue 'charges;
            }
            let r3 = r.powi(3);
            term.ex += sign * ux / r3;
            term.ey += sign * uy / r3;
            term.ez += sign * dz / r3;
            term.v += sign / r;
        }
        f.ex += c.charge * term.ex;
        f.ey += c.charge * term.ey;
        f.ez += c.charge * term.ez;
        f.v += c.charge * term.v;
    }
    f
}

/// Partial field of a charge between two grounded plates.
#[derive(Debug, Clone, Copy, Default)]
struct PlateSum {
    /// Component normal to the plates
    along: f64,
    /// In-plane component parallel to the plates
    across: f64,
    ez: f64,
    v: f64,
}

impl PlateSum {
    fn subtract(&mut self, other: PlateSum) {
        self.along -= other.along;
        self.across -= other.across;
        self.ez -= other.ez;
        self.v -= other.v;
    }
}

/// Unit charge between plates `s` apart.
///
/// `du` is the distance to the charge normal to the plates, `dum` the
/// distance to its mirror in the reference plate, and (`dt`, `dz`) the
/// lateral offset. The direct sum runs over image pairs `0..poly_end`.
fn plate_sum(du: f64, dum: f64, dt: f64, dz: f64, s: f64, limits: SeriesLimits, poly_end: usize) -> PlateSum {
    let mut sum = PlateSum::default();
    let rho2 = dt * dt + dz * dz;
    if rho2 > (BESSEL_ZONE * s).powi(2) {
        let rho = rho2.sqrt();
        for j in 1..=limits.n_bessel {
            let k = PI * j as f64 / s;
            let (k0, k1) = k0_k1(k * rho);
            let (zzp, zzn) = (k * du, k * dum);
            let dcos = zzp.cos() - zzn.cos();
            let scale = 2.0 * k / s;
            sum.v += (2.0 / s) * k0 * dcos;
            let err = scale * k1 * dcos;
            sum.along += scale * k0 * (zzp.sin() - zzn.sin());
            sum.across += err * dt / rho;
            sum.ez += err * dz / rho;
        }
        return sum;
    }

    let lateral = rho2;
    let inv3 = |r: f64| 1.0 / r.powi(3);
    for j in 0..poly_end {
        let shift = 2.0 * j as f64 * s;
        let rr1 = ((du + shift).powi(2) + lateral).sqrt();
        let rm1 = ((dum - shift).powi(2) + lateral).sqrt();
        if j == 0 {
            sum.v += 1.0 / rr1 - 1.0 / rm1;
            sum.along += du * inv3(rr1) - dum * inv3(rm1);
            sum.across += dt * (inv3(rr1) - inv3(rm1));
            sum.ez += dz * (inv3(rr1) - inv3(rm1));
            continue;
        }
        let rr2 = ((du - shift).powi(2) + lateral).sqrt();
        let rm2 = ((dum + shift).powi(2) + lateral).sqrt();
        sum.v += 1.0 / rr1 + 1.0 / rr2 - 1.0 / rm1 - 1.0 / rm2;
        sum.along += (du + shift) * inv3(rr1) + (du - shift) * inv3(rr2)
            - (dum - shift) * inv3(rm1)
            - (dum + shift) * inv3(rm2);
        let weight = inv3(rr1) + inv3(rr2) - inv3(rm1) - inv3(rm2);
        sum.across += dt * weight;
        sum.ez += dz * weight;
    }
    sum
}

/// Point charges in a round tube with a central wire, through `w = ln z`.
fn coaxial_field(
    charges: &[PointCharge],
    x: f64,
    y: f64,
    z: f64,
    radius: f64,
    wire_diameter: f64,
    limits: SeriesLimits,
) -> FieldValue {
    let s = (2.0 * radius / wire_diameter).ln();
    let plane = (0.5 * wire_diameter).ln();
    let xm = 0.5 * (x * x + y * y).ln();
    let ym = y.atan2(x);

    let mut mapped = FieldValue::default();
    for c in charges {
        let x3d = 0.5 * (c.x * c.x + c.y * c.y).ln();
        for turn in -1..=1 {
            let y3d = c.y.atan2(c.x) + f64::from(turn) * TAU;
            if xm == x3d && ym == y3d && z == c.z {
                continue;
            }
            let (dx, dy, dz) = (xm - x3d, ym - y3d, z - c.z);
            let dxm = xm + x3d - 2.0 * plane;
            // The direct sum here stops one image pair short of the plate kernels.
            let sum = plate_sum(dx, dxm, dy, dz, s, limits, limits.n_poly);
            mapped.ex += c.charge * sum.along;
            mapped.ey += c.charge * sum.across;
            mapped.ez += c.charge * sum.ez;
            mapped.v += c.charge * sum.v;
        }
    }

    let scale = (-xm).exp();
    FieldValue {
        ex: scale * (mapped.ex * ym.cos() - mapped.ey * ym.sin()),
        ey: scale * (mapped.ex * ym.sin() + mapped.ey * ym.cos()),
        ez: mapped.ez,
        v: mapped.v,
    }
}
