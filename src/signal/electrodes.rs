//! Weighting fields of strips and pixels.
//!
//! Both are segments of a plane facing a parallel grounded electrode at
//! distance `gap`. The kernels work in a local frame with the plane at
//! `w = 0` and the cell at `w > 0`, rotated back to cell coordinates
//! according to the plane slot.
//!
//! Reference: W. Riegler, G. Aglieri Rinella, "Point charge potential and
//! weighting field of a pixel or pad in a plane condenser",
//! Nucl. Instr. Meth. A 767 (2014) 267.

use std::f64::consts::{PI, TAU};

use crate::cell::{Pixel, PlaneSlot, Strip};
use crate::field::FieldValue;

/// Target accuracy of the pixel image sums.
const PIXEL_TOLERANCE: f64 = 1e-5;

/// A plane slot and the coordinate of its plane.
struct Frame {
    slot: PlaneSlot,
    coord: f64,
}

impl Frame {
    /// Distance of (x, y) from the plane, positive inside the cell.
    fn depth(&self, x: f64, y: f64) -> f64 {
        match self.slot {
            PlaneSlot::XLow => x - self.coord,
            PlaneSlot::XHigh => self.coord - x,
            PlaneSlot::YLow => y - self.coord,
            PlaneSlot::YHigh => self.coord - y,
        }
    }
}

/// Two-dimensional strip kernel: (E along, E across, V) at `u` along the
/// strip direction from its centre and depth `w`, for a strip of
/// half-width `half` and gap `gap`.
fn strip_kernel(u: f64, w: f64, half: f64, gap: f64) -> Option<(f64, f64, f64)> {
    if w <= 0.0 || w > gap {
        return None;
    }
    let (s, c) = (PI * w / gap).sin_cos();
    let e1 = (PI * (half - u) / gap).exp();
    let e2 = (-PI * (half + u) / gap).exp();
    if c == e1 || c == e2 {
        return None;
    }
    let ce12 = (c - e1).powi(2);
    let ce22 = (c - e2).powi(2);
    let v = (((c - e2) / s).atan() - ((c - e1) / s).atan()) / PI;
    let e_along = (s / gap) * (e1 / (ce12 + s * s) - e2 / (ce22 + s * s));
    let e_depth = ((c / (c - e2) + s * s / ce22) / (1.0 + s * s / ce22)
        - (c / (c - e1) + s * s / ce12) / (1.0 + s * s / ce12))
        / gap;
    Some((e_along, e_depth, v))
}

/// Weighting field of a strip running along z.
pub fn strip_along_z(slot: PlaneSlot, coord: f64, strip: &Strip, gap: f64, x: f64, y: f64) -> FieldValue {
    let frame = Frame { slot, coord };
    let mid = strip.centre();
    let u = match slot {
        PlaneSlot::XLow => mid - y,
        PlaneSlot::XHigh => y - mid,
        PlaneSlot::YLow => x - mid,
        PlaneSlot::YHigh => mid - x,
    };
    let Some((ea, ed, v)) = strip_kernel(u, frame.depth(x, y), strip.half_width(), gap) else {
        return FieldValue::default();
    };
    let (ex, ey) = match slot {
        PlaneSlot::XLow => (ed, -ea),
        PlaneSlot::XHigh => (-ed, ea),
        PlaneSlot::YLow => (ea, ed),
        PlaneSlot::YHigh => (-ea, -ed),
    };
    FieldValue { ex, ey, ez: 0.0, v }
}

/// Weighting field of a strip running along the in-plane axis of the
/// cross-section; its extent is measured in z.
pub fn strip_in_plane(
    slot: PlaneSlot,
    coord: f64,
    strip: &Strip,
    gap: f64,
    x: f64,
    y: f64,
    z: f64,
) -> FieldValue {
    let frame = Frame { slot, coord };
    let mid = strip.centre();
    let u = match slot {
        PlaneSlot::XLow | PlaneSlot::YHigh => mid - z,
        PlaneSlot::XHigh | PlaneSlot::YLow => z - mid,
    };
    let Some((ea, ed, v)) = strip_kernel(u, frame.depth(x, y), strip.half_width(), gap) else {
        return FieldValue::default();
    };
    let (ex, ey, ez) = match slot {
        PlaneSlot::XLow => (ed, 0.0, -ea),
        PlaneSlot::XHigh => (-ed, 0.0, ea),
        PlaneSlot::YLow => (0.0, ed, ea),
        PlaneSlot::YHigh => (0.0, -ed, -ea),
    };
    FieldValue { ex, ey, ez, v }
}

/// Contribution of one image at height `h` over the rectangle
/// [x1, x2] × [y1, y2]: (E along x, E along y, E normal, V), before the
/// 1/2π normalisation.
fn pixel_image(x1: f64, x2: f64, y1: f64, y2: f64, h: f64) -> (f64, f64, f64, f64) {
    let hs = h * h;
    let r = |a: f64, b: f64| (a * a + b * b + hs).sqrt();
    let (r11, r12, r21, r22) = (r(x1, y1), r(x1, y2), r(x2, y1), r(x2, y2));
    let (x1s, x2s, y1s, y2s) = (x1 * x1, x2 * x2, y1 * y1, y2 * y2);

    let fx = h * y1 / ((hs + x2s) * r21) - h * y1 / ((hs + x1s) * r11) + h * y2 / ((hs + x1s) * r12)
        - h * y2 / ((hs + x2s) * r22);
    let fy = h * x1 / ((hs + y2s) * r12) - h * x1 / ((hs + y1s) * r11) + h * x2 / ((hs + y1s) * r21)
        - h * x2 / ((hs + y2s) * r22);
    let corner = |a: f64, b: f64, rab: f64| {
        a * b * (a * a + b * b + 2.0 * hs) / ((a * a + hs) * (b * b + hs) * rab)
    };
    let fz = corner(x1, y1, r11) + corner(x2, y2, r22) - corner(x1, y2, r12) - corner(x2, y1, r21);
    let v = (x1 * y1 / (h * r11)).atan() + (x2 * y2 / (h * r22)).atan()
        - (x1 * y2 / (h * r12)).atan()
        - (x2 * y1 / (h * r21)).atan();
    (fx, fy, fz, v)
}

/// Weighting field of a rectangular pixel.
pub fn pixel(slot: PlaneSlot, coord: f64, pixel: &Pixel, gap: f64, x: f64, y: f64, z: f64) -> FieldValue {
    let frame = Frame { slot, coord };
    let ps = 0.5 * (pixel.smin + pixel.smax);
    let pz = 0.5 * (pixel.zmin + pixel.zmax);
    let wx = pixel.smax - pixel.smin;
    let wy = pixel.zmax - pixel.zmin;
    let (lx, ly) = match slot {
        PlaneSlot::XLow => (y - ps, z - pz),
        PlaneSlot::XHigh => (y - ps, pz - z),
        PlaneSlot::YLow => (x - ps, pz - z),
        PlaneSlot::YHigh => (x - ps, z - pz),
    };
    let lz = frame.depth(x, y);
    if lz < 0.0 {
        return FieldValue::default();
    }

    let (x1, x2) = (lx - 0.5 * wx, lx + 0.5 * wx);
    let (y1, y2) = (ly - 0.5 * wy, ly + 0.5 * wy);

    let d3 = gap.powi(3);
    let terms = |num: f64, den: f64| (num / (den * d3 * PIXEL_TOLERANCE)).sqrt().ceil() as usize;
    let nz = terms(wx * wy, 8.0 * PI);
    let nx = terms(wy * lz, 4.0 * PI);
    let ny = terms(wx * lz, 4.0 * PI);
    let nn = nx.max(ny).max(nz);

    let (mut fx, mut fy, mut fz, mut v) = pixel_image(x1, x2, y1, y2, lz);
    for i in 1..=nn {
        let below = pixel_image(x1, x2, y1, y2, 2.0 * i as f64 * gap - lz);
        let above = pixel_image(x1, x2, y1, y2, 2.0 * i as f64 * gap + lz);
        if i <= nx {
            fx += above.0 - below.0;
        }
        if i <= ny {
            fy += above.1 - below.1;
        }
        if i <= nz {
            fz += above.2 + below.2;
        }
        v += above.3 - below.3;
    }
    let (fx, fy, fz, v) = (fx / TAU, fy / TAU, fz / TAU, v / TAU);

    let (ex, ey, ez) = match slot {
        PlaneSlot::XLow => (fz, fx, fy),
        PlaneSlot::XHigh => (-fz, fx, -fy),
        PlaneSlot::YLow => (fx, fz, -fy),
        PlaneSlot::YHigh => (fx, -fz, fy),
    };
    FieldValue { ex, ey, ez, v }
}
