//! Doubly periodic log-sine series evaluated by Clenshaw recurrence.
//!
//! The potential of a doubly periodic array of line charges is written as
//! `-ln|sin ζ - p1 sin 3ζ + p2 sin 5ζ|`, where `ζ = zmult · (x + iy)` and the
//! nome powers `p1`, `p2` come from the aspect ratio of the cell. Beyond
//! `|Im ζ|` of a few units the sine is replaced by its exponential asymptote.

use std::f64::consts::LN_2;

use num_complex::Complex64;

/// Threshold on `|Im ζ|` above which [`PeriodicSeries::ph2`] is asymptotic.
const PH2_ASYMPTOTE: f64 = 10.0;

/// Threshold on `|Im ζ|` above which [`PeriodicSeries::term`] is asymptotic.
const TERM_ASYMPTOTE: f64 = 15.0;

/// Parameters of the truncated theta-function series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicSeries {
    /// Scale from physical coordinates to ζ
    pub zmult: Complex64,
    /// First nome power
    pub p1: f64,
    /// Second nome power
    pub p2: f64,
}

/// Contribution of a single line charge to the series sums.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesTerm {
    /// Derivative part, to be multiplied by `zmult` for the field
    pub w: Complex64,
    /// Logarithm entering the potential with a negative sign
    pub log: f64,
}

impl PeriodicSeries {
    /// Series with nome `p` (`p1 = p²`, `p2 = p⁶` unless negligible).
    pub fn new(zmult: Complex64, p: f64) -> Self {
        let p1 = p * p;
        let p2 = if p1 > 1e-10 { p.powi(6) } else { 0.0 };
        Self { zmult, p1, p2 }
    }

    /// Potential of a unit line charge at offset (x, y).
    pub fn ph2(&self, x: f64, y: f64) -> f64 {
        let zeta = self.zmult * Complex64::new(x, y);
        if zeta.im.abs() < PH2_ASYMPTOTE {
            let zsin = zeta.sin();
            let zcof = 4.0 * zsin * zsin - 2.0;
            let zu = -self.p1 - zcof * self.p2;
            let zunew = 1.0 - zcof * zu - self.p2;
            -((zunew + zu) * zsin).norm().ln()
        } else {
            -zeta.im.abs() + LN_2
        }
    }

    /// Limit of the self potential at radius `r` around the charge.
    pub fn ph2_lim(&self, r: f64) -> f64 {
        -(self.zmult.norm() * r * (1.0 - 3.0 * self.p1 + 5.0 * self.p2)).ln()
    }

    /// Field and potential building blocks for ζ.
    pub fn term(&self, zeta: Complex64) -> SeriesTerm {
        let i = Complex64::new(0.0, 1.0);
        if zeta.im > TERM_ASYMPTOTE {
            SeriesTerm {
                w: -i,
                log: zeta.im.abs() - LN_2,
            }
        } else if zeta.im < -TERM_ASYMPTOTE {
            SeriesTerm {
                w: i,
                log: zeta.im.abs() - LN_2,
            }
        } else {
            let zsin = zeta.sin();
            let zcof = 4.0 * zsin * zsin - 2.0;
            let zu = -self.p1 - zcof * self.p2;
            let zunew = 1.0 - zcof * zu - self.p2;
            let zterm1 = (zunew + zu) * zsin;
            let zu = -3.0 * self.p1 - zcof * 5.0 * self.p2;
            let zunew = 1.0 - zcof * zu - 5.0 * self.p2;
            let zterm2 = (zunew - zu) * zeta.cos();
            SeriesTerm {
                w: zterm2 / zterm1,
                log: zterm1.norm().ln(),
            }
        }
    }

    /// Term for a physical offset (x, y).
    pub fn term_at(&self, x: f64, y: f64) -> SeriesTerm {
        self.term(self.zmult * Complex64::new(x, y))
    }
}
