//! Green's functions of the analytic cell topologies.
//!
//! Every topology is described by a [`Potential`]: the constants derived
//! once from the cell geometry, and two operations. [`Potential::unit_term`]
//! gives the field and potential at a point due to a unit line charge
//! (with all of its periodic and mirror images), and
//! [`Potential::self_term`] gives the potential on the surface of the wire
//! carrying that charge. The capacitance matrix, the direct field and the
//! signal matrices are all assembled from these two.

use std::f64::consts::{LN_2, PI, TAU};

use num_complex::Complex64;

use crate::cell::{Axis, CellType, CheckedCell, PlaneSlot};
use crate::error::{FieldError, Result};
use crate::numerics::{PeriodicSeries, PolygonMap};

/// Beyond this the hyperbolic sums are replaced by their asymptotes.
const SINH_ASYMPTOTE: f64 = 20.0;

/// Field and potential of a line charge at one point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Term {
    pub ex: f64,
    pub ey: f64,
    pub v: f64,
}

impl Term {
    /// Accumulate `q` times another term.
    pub fn add_scaled(&mut self, q: f64, other: Term) {
        self.ex += q * other.ex;
        self.ey += q * other.ey;
        self.v += q * other.v;
    }
}

/// A wire as seen by the Green's functions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceSite {
    pub x: f64,
    pub y: f64,
    /// Wire radius
    pub radius: f64,
    /// Image of the x plane nearest to the wire (doubly periodic cells)
    pub cx: f64,
    /// Image of the y plane nearest to the wire (doubly periodic cells)
    pub cy: f64,
    /// Image in the unit disk and map derivative (polygonal tubes)
    pub mapped: (Complex64, Complex64),
}

/// A field point, with any per-point transforms already applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub x: f64,
    pub y: f64,
    mapped: (Complex64, Complex64),
}

/// Constants of a doubly periodic cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    /// Theta-function series
    pub series: PeriodicSeries,
    /// Axis carrying the linear correction term
    pub linear: Axis,
    pub sx: f64,
    pub sy: f64,
    /// Reference x plane
    pub plane_x: f64,
    /// Reference y plane
    pub plane_y: f64,
}

impl Lattice {
    fn slope(&self) -> f64 {
        TAU / (self.sx * self.sy)
    }
}

/// Green's function of one cell topology.
#[derive(Debug, Clone, PartialEq)]
pub enum Potential {
    /// Free space with optional mirror planes
    A {
        plane_x: Option<f64>,
        plane_y: Option<f64>,
    },
    /// Row periodic in x, optional y mirror
    B1X { sx: f64, plane_y: Option<f64> },
    /// Row periodic in y, optional x mirror
    B1Y { sy: f64, plane_x: Option<f64> },
    /// Row between x planes, optional y mirror
    B2X {
        sx: f64,
        plane_x: f64,
        plane_y: Option<f64>,
    },
    /// Row between y planes, optional x mirror
    B2Y {
        sy: f64,
        plane_y: f64,
        plane_x: Option<f64>,
    },
    C1(Lattice),
    C2X(Lattice),
    C2Y(Lattice),
    C3(Lattice),
    /// Circular tube
    D1 { radius: f64 },
    /// Circular tube with `sectors`-fold phi periodicity
    D2 { radius: f64, sectors: u32 },
    /// Polygonal tube
    D3 { radius: f64, map: PolygonMap },
}

/// Reference plane on an axis: the lower one if present, else the upper.
pub fn reference_plane(cell: &CheckedCell, axis: Axis) -> Option<f64> {
    let [low, high] = PlaneSlot::of_axis(axis);
    cell.plane(low).or_else(|| cell.plane(high)).map(|p| p.coord)
}

impl Potential {
    /// Derive the constants of `kind` for a checked cell.
    pub fn new(cell: &CheckedCell, kind: CellType) -> Result<Self> {
        let plane_x = reference_plane(cell, Axis::X);
        let plane_y = reference_plane(cell, Axis::Y);
        let (sx, sy) = (cell.sx, cell.sy);
        let required = |plane: Option<f64>, axis: Axis| {
            plane.ok_or_else(|| FieldError::unsupported(format!("{kind} cell without a {axis} plane")))
        };
        let tube_radius = || {
            cell.tube
                .as_ref()
                .map(|t| t.radius)
                .ok_or_else(|| FieldError::unsupported(format!("{kind} cell without a tube")))
        };

        Ok(match kind {
            CellType::A => Potential::A { plane_x, plane_y },
            CellType::B1X => Potential::B1X { sx, plane_y },
            CellType::B1Y => Potential::B1Y { sy, plane_x },
            CellType::B2X => Potential::B2X {
                sx,
                plane_x: required(plane_x, Axis::X)?,
                plane_y,
            },
            CellType::B2Y => Potential::B2Y {
                sy,
                plane_y: required(plane_y, Axis::Y)?,
                plane_x,
            },
            CellType::C1 | CellType::C2X | CellType::C2Y | CellType::C3 => {
                let lattice = lattice(kind, sx, sy, plane_x.unwrap_or(0.0), plane_y.unwrap_or(0.0));
                match kind {
                    CellType::C1 => Potential::C1(lattice),
                    CellType::C2X => Potential::C2X(lattice),
                    CellType::C2Y => Potential::C2Y(lattice),
                    _ => Potential::C3(lattice),
                }
            }
            CellType::D1 => Potential::D1 { radius: tube_radius()? },
            CellType::D2 => {
                let sectors = (TAU / sy).round().max(1.0);
                if (sectors * sy - TAU).abs() > 1e-6 * TAU {
                    log::warn!(
                        "SetupD20: phi period {} does not divide the circle; using {} sectors",
                        sy,
                        sectors
                    );
                }
                Potential::D2 {
                    radius: tube_radius()?,
                    sectors: sectors as u32,
                }
            }
            CellType::D3 => {
                let n = cell.tube.as_ref().map_or(0, |t| t.n_edges) as usize;
                let map = PolygonMap::new(n)
                    .ok_or_else(|| FieldError::unsupported(format!("no conformal map for {n} edges")))?;
                Potential::D3 {
                    radius: tube_radius()?,
                    map,
                }
            }
            CellType::D4 => {
                return Err(FieldError::unsupported(
                    "polygonal tube with phi periodicity (D4) has no potential",
                ))
            }
        })
    }

    /// Describe a wire at (x, y) with radius `radius` as a source.
    pub fn site(&self, x: f64, y: f64, radius: f64) -> SourceSite {
        let mut site = SourceSite {
            x,
            y,
            radius,
            cx: 0.0,
            cy: 0.0,
            mapped: (Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)),
        };
        match self {
            Potential::C1(l) | Potential::C2X(l) | Potential::C2Y(l) | Potential::C3(l) => {
                site.cx = l.plane_x - l.sx * ((l.plane_x - x) / l.sx).round();
                site.cy = l.plane_y - l.sy * ((l.plane_y - y) / l.sy).round();
            }
            Potential::D3 { radius: r, map } => {
                site.mapped = map.map(Complex64::new(x, y) / *r);
            }
            _ => {}
        }
        site
    }

    /// Prepare a field point.
    pub fn probe(&self, x: f64, y: f64) -> Probe {
        let mapped = match self {
            Potential::D3 { radius, map } => map.map(Complex64::new(x, y) / *radius),
            _ => (Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)),
        };
        Probe { x, y, mapped }
    }

    /// Potential on the surface of a wire due to its own unit charge.
    pub fn self_term(&self, s: &SourceSite) -> f64 {
        let r = s.radius;
        match self {
            Potential::A { plane_x, plane_y } => {
                let mut a = r * r;
                if let Some(cx) = plane_x {
                    a /= 4.0 * (s.x - cx).powi(2);
                }
                if let Some(cy) = plane_y {
                    a /= 4.0 * (s.y - cy).powi(2);
                }
                if let (Some(cx), Some(cy)) = (plane_x, plane_y) {
                    a *= 4.0 * ((s.x - cx).powi(2) + (s.y - cy).powi(2));
                }
                -0.5 * a.ln()
            }
            Potential::B1X { sx, plane_y } => {
                let mut a = -(r * PI / sx).ln();
                if let Some(cy) = plane_y {
                    a += log_sinh(TAU * (s.y - cy) / sx);
                }
                a
            }
            Potential::B1Y { sy, plane_x } => {
                let mut a = -(r * PI / sy).ln();
                if let Some(cx) = plane_x {
                    a += log_sinh(TAU * (s.x - cx) / sy);
                }
                a
            }
            Potential::B2X { sx, plane_x, plane_y } => {
                let xx = PI * (s.x - plane_x) / sx;
                let mut a = (0.5 * r * PI / sx) / xx.sin();
                if let Some(cy) = plane_y {
                    let yym = PI * (s.y - cy) / sx;
                    if yym.abs() <= SINH_ASYMPTOTE {
                        a *= (yym.sinh().powi(2) + xx.sin().powi(2)).sqrt() / yym.sinh();
                    }
                }
                -a.abs().ln()
            }
            Potential::B2Y { sy, plane_y, plane_x } => {
                let yy = PI * (s.y - plane_y) / sy;
                let mut a = (0.5 * r * PI / sy) / yy.sin();
                if let Some(cx) = plane_x {
                    let xxm = PI * (s.x - cx) / sy;
                    if xxm.abs() <= SINH_ASYMPTOTE {
                        a *= (xxm.sinh().powi(2) + yy.sin().powi(2)).sqrt() / xxm.sinh();
                    }
                }
                -a.abs().ln()
            }
            Potential::C1(l) => {
                let along = match l.linear {
                    Axis::X => s.x,
                    Axis::Y => s.y,
                };
                l.series.ph2_lim(r) - along * along * l.slope()
            }
            Potential::C2X(l) => {
                let mut a = l.series.ph2_lim(r) - l.series.ph2(2.0 * (s.x - s.cx), 0.0);
                if l.linear == Axis::X {
                    a -= (s.x - s.cx).powi(2) * l.slope();
                }
                a
            }
            Potential::C2Y(l) => {
                let mut a = l.series.ph2_lim(r) - l.series.ph2(0.0, 2.0 * (s.y - s.cy));
                if l.linear == Axis::Y {
                    a -= (s.y - s.cy).powi(2) * l.slope();
                }
                a
            }
            Potential::C3(l) => {
                let (dx, dy) = (2.0 * (s.x - s.cx), 2.0 * (s.y - s.cy));
                l.series.ph2_lim(r) - l.series.ph2(0.0, dy) - l.series.ph2(dx, 0.0) + l.series.ph2(dx, dy)
            }
            Potential::D1 { radius } => -(r * radius / (radius * radius - s.x * s.x - s.y * s.y)).ln(),
            Potential::D2 { radius, sectors } => {
                let zs = Complex64::new(s.x, s.y);
                if zs.norm() < r {
                    -(r / (radius - zs.norm_sqr() / radius)).ln()
                } else {
                    let m = *sectors as i32;
                    let num = r * f64::from(m) * zs.powi(m - 1);
                    let den = radius.powi(m) * (1.0 - (zs.norm() / radius).powi(2 * m));
                    -(num / den).norm().ln()
                }
            }
            Potential::D3 { radius, .. } => {
                let (ws, wd) = s.mapped;
                -((r / radius) * wd / (1.0 - ws.norm_sqr())).norm().ln()
            }
        }
    }

    /// Field and potential at `p` of a unit charge on `s`, with the source
    /// displaced by `shift`. Tube potentials ignore the shift.
    pub fn unit_term(&self, p: &Probe, s: &SourceSite, shift: (f64, f64)) -> Term {
        let (x, y) = (p.x, p.y);
        let (xs, ys) = (s.x + shift.0, s.y + shift.1);
        let i = Complex64::new(0.0, 1.0);
        match self {
            Potential::A { plane_x, plane_y } => {
                let (xx, yy) = (x - xs, y - ys);
                let r2 = xx * xx + yy * yy;
                let mut ex = xx / r2;
                let mut ey = yy / r2;
                let mut ratio = r2;
                let xxm = plane_x.map(|cx| x + xs - 2.0 * cx);
                let yym = plane_y.map(|cy| y + ys - 2.0 * cy);
                if let Some(xxm) = xxm {
                    let r2p = xxm * xxm + yy * yy;
                    ex -= xxm / r2p;
                    ey -= yy / r2p;
                    ratio /= r2p;
                }
                if let Some(yym) = yym {
                    let r2p = xx * xx + yym * yym;
                    ex -= xx / r2p;
                    ey -= yym / r2p;
                    ratio /= r2p;
                }
                if let (Some(xxm), Some(yym)) = (xxm, yym) {
                    let r2p = xxm * xxm + yym * yym;
                    ex += xxm / r2p;
                    ey += yym / r2p;
                    ratio *= r2p;
                }
                Term {
                    ex,
                    ey,
                    v: -0.5 * ratio.ln(),
                }
            }
            Potential::B1X { sx, plane_y } => {
                let h = PI / sx;
                let (xx, yy) = (h * (x - xs), h * (y - ys));
                let mut ecompl = row_cot(Complex64::new(xx, yy));
                let mut v = -log_sinh_sin(yy, xx);
                if let Some(cy) = plane_y {
                    let yym = h * (y + ys - 2.0 * cy);
                    ecompl -= row_cot(Complex64::new(xx, yym));
                    v += log_sinh_sin(yym, xx);
                }
                Term {
                    ex: h * ecompl.re,
                    ey: -h * ecompl.im,
                    v,
                }
            }
            Potential::B1Y { sy, plane_x } => {
                let h = PI / sy;
                let (xx, yy) = (h * (x - xs), h * (y - ys));
                let mut ecompl = row_coth(Complex64::new(xx, yy));
                let mut v = -log_sinh_sin(xx, yy);
                if let Some(cx) = plane_x {
                    let xxm = h * (x + xs - 2.0 * cx);
                    ecompl -= row_coth(Complex64::new(xxm, yy));
                    v += log_sinh_sin(xxm, yy);
                }
                Term {
                    ex: h * ecompl.re,
                    ey: -h * ecompl.im,
                    v,
                }
            }
            Potential::B2X { sx, plane_x, plane_y } => {
                let h = 0.5 * PI / sx;
                let b2sin = (2.0 * h * (plane_x - xs)).sin();
                let (xx, yy) = (h * (x - xs), h * (y - ys));
                let xxneg = h * (x + xs - 2.0 * plane_x);
                let mut ecompl = Complex64::new(0.0, 0.0);
                let mut r2 = 1.0;
                if yy.abs() <= SINH_ASYMPTOTE {
                    let zz = Complex64::new(xx, yy);
                    let zzneg = Complex64::new(xxneg, yy);
                    ecompl = -b2sin / (zz.sin() * zzneg.sin());
                    r2 = sinh_sin2(yy, xx) / sinh_sin2(yy, xxneg);
                }
                if let Some(cy) = plane_y {
                    let yym = h * (y + ys - 2.0 * cy);
                    if yym.abs() <= SINH_ASYMPTOTE {
                        let zzmirr = Complex64::new(xx, yym);
                        let zznmirr = Complex64::new(xxneg, yym);
                        ecompl += b2sin / (zzmirr.sin() * zznmirr.sin());
                        r2 /= sinh_sin2(yym, xx) / sinh_sin2(yym, xxneg);
                    }
                }
                Term {
                    ex: h * ecompl.re,
                    ey: -h * ecompl.im,
                    v: -0.5 * r2.ln(),
                }
            }
            Potential::B2Y { sy, plane_y, plane_x } => {
                let h = 0.5 * PI / sy;
                let b2sin = (2.0 * h * (plane_y - ys)).sin();
                let (xx, yy) = (h * (x - xs), h * (y - ys));
                let yyneg = h * (y + ys - 2.0 * plane_y);
                let mut ecompl = Complex64::new(0.0, 0.0);
                let mut r2 = 1.0;
                if xx.abs() <= SINH_ASYMPTOTE {
                    let zz = Complex64::new(xx, yy);
                    let zzneg = Complex64::new(xx, yyneg);
                    ecompl = i * b2sin / ((i * zz).sin() * (i * zzneg).sin());
                    r2 = sinh_sin2(xx, yy) / sinh_sin2(xx, yyneg);
                }
                if let Some(cx) = plane_x {
                    let xxm = h * (x + xs - 2.0 * cx);
                    if xxm.abs() <= SINH_ASYMPTOTE {
                        let zzmirr = Complex64::new(xxm, yy);
                        let zznmirr = Complex64::new(xxm, yyneg);
                        ecompl -= i * b2sin / ((i * zzmirr).sin() * (i * zznmirr).sin());
                        r2 /= sinh_sin2(xxm, yy) / sinh_sin2(xxm, yyneg);
                    }
                }
                Term {
                    ex: h * ecompl.re,
                    ey: -h * ecompl.im,
                    v: -0.5 * r2.ln(),
                }
            }
            Potential::C1(l) => {
                let t = l.series.term_at(x - xs, y - ys);
                let e = l.series.zmult * t.w;
                let mut term = Term {
                    ex: e.re,
                    ey: -e.im,
                    v: -t.log,
                };
                match l.linear {
                    Axis::X => {
                        term.v -= l.slope() * xs * x;
                        term.ex += l.slope() * xs;
                    }
                    Axis::Y => {
                        term.v -= l.slope() * ys * y;
                        term.ey += l.slope() * ys;
                    }
                }
                term
            }
            Potential::C2X(l) => {
                let direct = l.series.term_at(x - xs, y - ys);
                let mirror = l.series.term_at(2.0 * s.cx - x - xs, y - ys);
                let zmult = l.series.zmult;
                let mut term = Term {
                    ex: (zmult * (direct.w + mirror.w)).re,
                    ey: -(zmult * (direct.w - mirror.w)).im,
                    v: -direct.log + mirror.log,
                };
                if l.linear == Axis::X {
                    term.v -= l.slope() * (x - s.cx) * (xs - s.cx);
                    term.ex += l.slope() * (xs - s.cx);
                }
                term
            }
            Potential::C2Y(l) => {
                let direct = l.series.term_at(x - xs, y - ys);
                let mirror = l.series.term_at(x - xs, 2.0 * s.cy - y - ys);
                let zmult = l.series.zmult;
                let mut term = Term {
                    ex: (zmult * (direct.w - mirror.w)).re,
                    ey: -(zmult * (direct.w + mirror.w)).im,
                    v: -direct.log + mirror.log,
                };
                if l.linear == Axis::Y {
                    term.v -= l.slope() * (y - s.cy) * (ys - s.cy);
                    term.ey += l.slope() * (ys - s.cy);
                }
                term
            }
            Potential::C3(l) => {
                let (xm, ym) = (2.0 * s.cx - x - xs, 2.0 * s.cy - y - ys);
                let w1 = l.series.term_at(x - xs, y - ys);
                let w2 = l.series.term_at(xm, y - ys);
                let w3 = l.series.term_at(x - xs, ym);
                let w4 = l.series.term_at(xm, ym);
                let zmult = l.series.zmult;
                Term {
                    ex: (zmult * (w1.w + w2.w - w3.w - w4.w)).re,
                    ey: -(zmult * (w1.w - w2.w + w3.w - w4.w)).im,
                    v: -w1.log + w2.log + w3.log - w4.log,
                }
            }
            Potential::D1 { radius } => {
                let z = Complex64::new(x, y);
                let zs = Complex64::new(s.x, s.y);
                let r2 = radius * radius;
                let v = -((radius * (z - zs)) / (r2 - z * zs.conj())).norm().ln();
                let e = 1.0 / (z - zs).conj() + zs / (r2 - z.conj() * zs);
                Term { ex: e.re, ey: e.im, v }
            }
            Potential::D2 { radius, sectors } => {
                let z = Complex64::new(x, y);
                let zs = Complex64::new(s.x, s.y);
                let r2 = radius * radius;
                if zs.norm() < s.radius {
                    let v = -((radius * (z - zs)) / (r2 - z * zs.conj())).norm().ln();
                    let e = 1.0 / (z - zs).conj() + zs / (r2 - z.conj() * zs);
                    return Term { ex: e.re, ey: e.im, v };
                }
                let m = *sectors as i32;
                let rm = radius.powi(m);
                let (zm, zsm) = (z.powi(m), zs.powi(m));
                let v = -((zm - zsm) / (rm * (1.0 - (z * zs.conj() / r2).powi(m)))).norm().ln();
                let e = f64::from(m)
                    * z.conj().powi(m - 1)
                    * (1.0 / (zm - zsm).conj() + zsm / (rm * rm - (z.conj() * zs).powi(m)));
                Term { ex: e.re, ey: e.im, v }
            }
            Potential::D3 { radius, .. } => {
                let (w, wd) = p.mapped;
                let ws = s.mapped.0;
                let v = -((w - ws) / (1.0 - w * ws.conj())).norm().ln();
                let whelp = wd * (1.0 - ws.norm_sqr()) / ((w - ws) * (1.0 - ws.conj() * w));
                Term {
                    ex: whelp.re / radius,
                    ey: -whelp.im / radius,
                    v,
                }
            }
        }
    }

    /// Whether the Green's function is periodic in x or y.
    pub fn is_periodic(&self) -> bool {
        !matches!(self, Potential::A { .. } | Potential::D1 { .. } | Potential::D3 { .. })
    }
}

/// Series constants of a doubly periodic cell. The nome is taken along the
/// longer direction so the series converges quickly.
fn lattice(kind: CellType, sx: f64, sy: f64, plane_x: f64, plane_y: f64) -> Lattice {
    let (linear, zmult, p) = match kind {
        CellType::C2X => {
            if 2.0 * sx <= sy {
                let p = if sy / sx < 25.0 { (-0.5 * PI * sy / sx).exp() } else { 0.0 };
                (Axis::Y, Complex64::new(0.5 * PI / sx, 0.0), p)
            } else {
                let p = if sx / sy < 6.0 { (-2.0 * PI * sx / sy).exp() } else { 0.0 };
                (Axis::X, Complex64::new(0.0, PI / sy), p)
            }
        }
        CellType::C2Y => {
            if sx <= 2.0 * sy {
                let p = if sy / sx <= 6.0 { (-2.0 * PI * sy / sx).exp() } else { 0.0 };
                (Axis::Y, Complex64::new(PI / sx, 0.0), p)
            } else {
                let p = if sx / sy <= 25.0 { (-0.5 * PI * sx / sy).exp() } else { 0.0 };
                (Axis::X, Complex64::new(0.0, 0.5 * PI / sy), p)
            }
        }
        CellType::C3 => {
            if sx <= sy {
                let p = if sy / sx <= 13.0 { (-PI * sy / sx).exp() } else { 0.0 };
                (Axis::Y, Complex64::new(0.5 * PI / sx, 0.0), p)
            } else {
                let p = if sx / sy <= 13.0 { (-PI * sx / sy).exp() } else { 0.0 };
                (Axis::X, Complex64::new(0.0, 0.5 * PI / sy), p)
            }
        }
        _ => {
            if sx <= sy {
                let p = if sy / sx < 8.0 { (-PI * sy / sx).exp() } else { 0.0 };
                (Axis::Y, Complex64::new(PI / sx, 0.0), p)
            } else {
                let p = if sx / sy < 8.0 { (-PI * sx / sy).exp() } else { 0.0 };
                (Axis::X, Complex64::new(0.0, PI / sy), p)
            }
        }
    };
    Lattice {
        series: PeriodicSeries::new(zmult, p),
        linear,
        sx,
        sy,
        plane_x,
        plane_y,
    }
}

/// sinh²(a) + sin²(b).
fn sinh_sin2(a: f64, b: f64) -> f64 {
    a.sinh().powi(2) + b.sin().powi(2)
}

/// ½·ln(sinh²a + sin²b), asymptotically |a| - ln 2.
fn log_sinh_sin(a: f64, b: f64) -> f64 {
    if a.abs() > SINH_ASYMPTOTE {
        a.abs() - LN_2
    } else {
        0.5 * sinh_sin2(a, b).ln()
    }
}

/// ln|sinh a|, asymptotically |a| - ln 2.
fn log_sinh(a: f64) -> f64 {
    if a.abs() > SINH_ASYMPTOTE {
        a.abs() - LN_2
    } else {
        a.sinh().abs().ln()
    }
}

/// cot z for a row periodic along the real axis.
fn row_cot(z: Complex64) -> Complex64 {
    if z.im > SINH_ASYMPTOTE {
        Complex64::new(0.0, -1.0)
    } else if z.im < -SINH_ASYMPTOTE {
        Complex64::new(0.0, 1.0)
    } else {
        z.cos() / z.sin()
    }
}

/// coth z for a row periodic along the imaginary axis.
fn row_coth(z: Complex64) -> Complex64 {
    if z.re > SINH_ASYMPTOTE {
        Complex64::new(1.0, 0.0)
    } else if z.re < -SINH_ASYMPTOTE {
        Complex64::new(-1.0, 0.0)
    } else {
        z.cosh() / z.sinh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Potential one radius away from the source, through `unit_term`.
    fn surface_potential(pot: &Potential, s: &SourceSite) -> f64 {
        let p = pot.probe(s.x + s.radius, s.y);
        pot.unit_term(&p, s, (0.0, 0.0)).v
    }

    fn field_matches_potential(pot: &Potential, s: &SourceSite, x: f64, y: f64) {
        let h = 1e-6;
        let v = |x: f64, y: f64| pot.unit_term(&pot.probe(x, y), s, (0.0, 0.0)).v;
        let t = pot.unit_term(&pot.probe(x, y), s, (0.0, 0.0));
        let ex = -(v(x + h, y) - v(x - h, y)) / (2.0 * h);
        let ey = -(v(x, y + h) - v(x, y - h)) / (2.0 * h);
        assert_relative_eq!(t.ex, ex, max_relative = 1e-5, epsilon = 1e-7);
        assert_relative_eq!(t.ey, ey, max_relative = 1e-5, epsilon = 1e-7);
    }

    fn all_potentials() -> Vec<Potential> {
        let lat = |kind| lattice(kind, 1.0, 1.5, -0.4, -0.6);
        vec![
            Potential::A {
                plane_x: Some(-0.5),
                plane_y: Some(-0.7),
            },
            Potential::B1X {
                sx: 1.0,
                plane_y: Some(-0.6),
            },
            Potential::B1Y {
                sy: 1.0,
                plane_x: Some(-0.6),
            },
            Potential::B2X {
                sx: 1.0,
                plane_x: -0.4,
                plane_y: Some(-0.7),
            },
            Potential::B2Y {
                sy: 1.0,
                plane_y: -0.4,
                plane_x: Some(-0.7),
            },
            Potential::C1(lat(CellType::C1)),
            Potential::C2X(lat(CellType::C2X)),
            Potential::C2Y(lat(CellType::C2Y)),
            Potential::C3(lat(CellType::C3)),
            Potential::D1 { radius: 1.0 },
            Potential::D2 {
                radius: 1.0,
                sectors: 4,
            },
        ]
    }

    #[test]
    fn test_field_is_gradient_of_potential() {
        for pot in all_potentials() {
            let s = pot.site(0.1, 0.05, 1e-3);
            field_matches_potential(&pot, &s, 0.3, 0.2);
            field_matches_potential(&pot, &s, -0.15, 0.3);
        }
    }

    #[test]
    fn test_self_term_matches_surface_potential() {
        for pot in all_potentials() {
            let s = pot.site(0.1, 0.05, 1e-4);
            assert_relative_eq!(pot.self_term(&s), surface_potential(&pot, &s), max_relative = 1e-3);
        }
    }

    #[test]
    fn test_d3_field_is_gradient_of_potential() {
        let pot = Potential::D3 {
            radius: 2.0,
            map: PolygonMap::new(6).unwrap(),
        };
        let s = pot.site(0.3, -0.2, 1e-3);
        field_matches_potential(&pot, &s, -0.5, 0.4);
        assert_relative_eq!(pot.self_term(&s), surface_potential(&pot, &s), max_relative = 1e-3);
    }

    #[test]
    fn test_free_wire_is_logarithmic() {
        let pot = Potential::A {
            plane_x: None,
            plane_y: None,
        };
        let s = pot.site(0.0, 0.0, 1e-3);
        let t = pot.unit_term(&pot.probe(2.0, 0.0), &s, (0.0, 0.0));
        assert_relative_eq!(t.v, -(2.0f64).ln(), epsilon = 1e-12);
        assert_relative_eq!(t.ex, 0.5, epsilon = 1e-12);
        assert_relative_eq!(t.ey, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mirror_plane_is_equipotential() {
        let pot = Potential::B2X {
            sx: 2.0,
            plane_x: -1.0,
            plane_y: None,
        };
        let s = pot.site(0.2, 0.0, 1e-3);
        for y in [-1.0, 0.0, 0.7] {
            let low = pot.unit_term(&pot.probe(-1.0, y), &s, (0.0, 0.0));
            let high = pot.unit_term(&pot.probe(1.0, y), &s, (0.0, 0.0));
            assert_relative_eq!(low.v, 0.0, epsilon = 1e-10);
            assert_relative_eq!(high.v, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_row_potential_is_periodic() {
        let pot = Potential::B1X { sx: 0.5, plane_y: None };
        let s = pot.site(0.0, 0.0, 1e-3);
        let a = pot.unit_term(&pot.probe(0.1, 0.2), &s, (0.0, 0.0));
        let b = pot.unit_term(&pot.probe(0.6, 0.2), &s, (0.0, 0.0));
        assert_relative_eq!(a.v, b.v, epsilon = 1e-10);
        assert_relative_eq!(a.ex, b.ex, epsilon = 1e-8);
    }
}
