//! Conformal map of a regular polygon onto the unit disk.
//!
//! The map is expanded in two truncated power series: one around the centre
//! of the polygon, one around the corner nearest to the point. Coefficient
//! tables cover polygons with 3 to 8 edges.

use std::f64::consts::{PI, TAU};

use num_complex::Complex64;

/// Number of tabulated coefficients per series.
const N_COEFFICIENTS: usize = 16;

/// Points with `|z|` below this use the centre expansion.
const CENTRE_RADIUS: f64 = 0.75;

const CENTRE_COEFFICIENTS: [[f64; N_COEFFICIENTS]; 6] = [
    [
        1.000000000e+00, -1.666666865e-01, 3.174602985e-02, -5.731921643e-03,
        1.040112227e-03, -1.886279933e-04, 3.421107249e-05, -6.204730198e-06,
        1.125329618e-06, -2.040969207e-07, 3.701631357e-08, -6.713513301e-09,
        1.217605794e-09, -2.208327132e-10, 4.005162868e-11, -7.264017512e-12,
    ],
    [
        1.000000000e+00, -1.000000238e-01, 8.333332837e-03, -7.051283028e-04,
        5.967194738e-05, -5.049648280e-06, 4.273189802e-07, -3.616123934e-08,
        3.060091514e-09, -2.589557457e-10, 2.191374859e-11, -1.854418528e-12,
        1.569274224e-13, -1.327975205e-14, 1.123779363e-15, -9.509817570e-17,
    ],
    [
        1.000000000e+00, -6.666666269e-02, 1.212121220e-03, -2.626262140e-04,
        -3.322110570e-05, -9.413293810e-06, -2.570029210e-06, -7.695705904e-07,
        -2.422486887e-07, -7.945993730e-08, -2.691839640e-08, -9.361642128e-09,
        -3.327319087e-09, -1.204430555e-09, -4.428404310e-10, -1.650302672e-10,
    ],
    [
        1.000000000e+00, -4.761904851e-02, -1.221001148e-03, -3.753788769e-04,
        -9.415557724e-05, -2.862767724e-05, -9.587882232e-06, -3.441659828e-06,
        -1.299798896e-06, -5.103651119e-07, -2.066504408e-07, -8.578405186e-08,
        -3.635090096e-08, -1.567239494e-08, -6.857355572e-09, -3.038770346e-09,
    ],
    [
        1.000000000e+00, -3.571428731e-02, -2.040816238e-03, -4.936389159e-04,
        -1.446709794e-04, -4.963850370e-05, -1.877940667e-05, -7.600909157e-06,
        -3.232265954e-06, -1.427365532e-06, -6.493634714e-07, -3.026190711e-07,
        -1.438593245e-07, -6.953911225e-08, -3.409525462e-08, -1.692310647e-08,
    ],
    [
        1.000000000e+00, -2.777777612e-02, -2.246732125e-03, -5.571441725e-04,
        -1.790652314e-04, -6.708275760e-05, -2.766949183e-05, -1.219387286e-05,
        -5.640039490e-06, -2.706697160e-06, -1.337270078e-06, -6.763995657e-07,
        -3.488264610e-07, -1.828456675e-07, -9.718036154e-08, -5.227070332e-08,
    ],
];

const CORNER_COEFFICIENTS: [[f64; N_COEFFICIENTS]; 6] = [
    [
        3.333333135e-01, -5.555555597e-02, 1.014109328e-02, -1.837154618e-03,
        3.332451452e-04, -6.043842586e-05, 1.096152027e-05, -1.988050826e-06,
        3.605655365e-07, -6.539443120e-08, 1.186035448e-08, -2.151069323e-09,
        3.901317047e-10, -7.075676156e-11, 1.283289534e-11, -2.327455936e-12,
    ],
    [
        1.000000000e+00, -5.000000000e-01, 3.000000119e-01, -1.750000119e-01,
        1.016666889e-01, -5.916666612e-02, 3.442307562e-02, -2.002724260e-02,
        1.165192947e-02, -6.779119372e-03, 3.944106400e-03, -2.294691978e-03,
        1.335057430e-03, -7.767395582e-04, 4.519091453e-04, -2.629216760e-04,
    ],
    [
        1.248050690e+00, -7.788147926e-01, 6.355384588e-01, -4.899077415e-01,
        3.713272810e-01, -2.838423252e-01, 2.174729109e-01, -1.663445234e-01,
        1.271933913e-01, -9.728997946e-02, 7.442557812e-02, -5.692918226e-02,
        4.354400188e-02, -3.330700099e-02, 2.547712997e-02, -1.948769018e-02,
    ],
    [
        1.333333015e+00, -8.888888955e-01, 8.395061493e-01, -7.242798209e-01,
        6.016069055e-01, -5.107235312e-01, 4.393203855e-01, -3.745460510e-01,
        3.175755739e-01, -2.703750730e-01, 2.308617830e-01, -1.966916919e-01,
        1.672732830e-01, -1.424439549e-01, 1.214511395e-01, -1.034612656e-01,
    ],
    [
        1.359752655e+00, -9.244638681e-01, 9.593217969e-01, -8.771237731e-01,
        7.490229011e-01, -6.677658558e-01, 6.196745634e-01, -5.591596961e-01,
        4.905325770e-01, -4.393517375e-01, 4.029803872e-01, -3.631100059e-01,
        3.199430704e-01, -2.866140604e-01, 2.627358437e-01, -2.368256450e-01,
    ],
    [
        1.362840652e+00, -9.286670089e-01, 1.035511017e+00, -9.800255299e-01,
        8.315343261e-01, -7.592730522e-01, 7.612683773e-01, -7.132136226e-01,
        6.074471474e-01, -5.554352999e-01, 5.699443221e-01, -5.357525349e-01,
        4.329345822e-01, -3.916820884e-01, 4.401986003e-01, -4.197303057e-01,
    ],
];

/// Lanczos coefficients (g = 7).
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Gamma function by the Lanczos approximation.
pub fn gamma(x: f64) -> f64 {
    if x < 0.5 {
        PI / ((PI * x).sin() * gamma(1.0 - x))
    } else {
        let x = x - 1.0;
        let t = x + 7.5;
        let sum = LANCZOS[1..]
            .iter()
            .enumerate()
            .fold(LANCZOS[0], |acc, (i, c)| acc + c / (x + (i + 1) as f64));
        (TAU).sqrt() * t.powf(x + 0.5) * (-t).exp() * sum
    }
}

/// Map from the interior of a regular polygon (unit circumradius, one corner
/// on the positive real axis) to the unit disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonMap {
    n: usize,
    kappa: f64,
}

impl PolygonMap {
    /// Map for a polygon with `n_edges` edges, if tabulated (3..=8).
    pub fn new(n_edges: usize) -> Option<Self> {
        if !(3..=8).contains(&n_edges) {
            return None;
        }
        let n = n_edges as f64;
        let kappa = gamma((n + 1.0) / n) * gamma((n - 2.0) / n) / gamma((n - 1.0) / n);
        Some(Self { n: n_edges, kappa })
    }

    /// Number of polygon edges.
    pub fn edges(&self) -> usize {
        self.n
    }

    /// Derivative of the map at the centre.
    pub fn kappa(&self) -> f64 {
        self.kappa
    }

    /// Image `w` of `z` and the derivative `dw/dz`.
    pub fn map(&self, z: Complex64) -> (Complex64, Complex64) {
        let n = self.n as f64;
        let kappa = self.kappa;
        if z.re == 0.0 && z.im == 0.0 {
            return (Complex64::new(0.0, 0.0), Complex64::new(kappa, 0.0));
        }

        if z.norm() < CENTRE_RADIUS {
            let zterm = (kappa * z).powi(self.n as i32);
            let (wsum, wdsum) = clenshaw(&CENTRE_COEFFICIENTS[self.n - 3], zterm);
            let w = kappa * z * wsum;
            let wd = kappa * (wsum + n * zterm * wdsum);
            (w, wd)
        } else {
            // Rotate z towards the corner on the positive real axis.
            let arot = -TAU * (z.im.atan2(z.re) * n / TAU).round() / n;
            let rot = Complex64::new(arot.cos(), arot.sin());
            let zz = z * rot;
            let base = kappa * (1.0 - zz);
            let zterm = base.powf(n / (n - 2.0));
            let (wsum, wdsum) = clenshaw(&CORNER_COEFFICIENTS[self.n - 3], zterm);
            let w = rot.conj() * (1.0 - zterm * wsum);
            let wd = n * kappa * base.powf(2.0 / (n - 2.0)) * (wsum + zterm * wdsum) / (n - 2.0);
            (w, wd)
        }
    }
}

/// Sum a coefficient series in `zterm` and its derivative sum.
fn clenshaw(coefficients: &[f64; N_COEFFICIENTS], zterm: Complex64) -> (Complex64, Complex64) {
    let mut wsum = Complex64::new(coefficients[N_COEFFICIENTS - 1], 0.0);
    let mut wdsum = Complex64::new(0.0, 0.0);
    for &c in coefficients[..N_COEFFICIENTS - 1].iter().rev() {
        wdsum = wsum + zterm * wdsum;
        wsum = c + zterm * wsum;
    }
    (wsum, wdsum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gamma_reference_values() {
        assert_relative_eq!(gamma(1.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(gamma(5.0), 24.0, max_relative = 1e-12);
        assert_relative_eq!(gamma(0.5), PI.sqrt(), max_relative = 1e-12);
        assert_relative_eq!(gamma(1.0 / 3.0), 2.678_938_534_707_747_6, max_relative = 1e-10);
    }

    #[test]
    fn test_unsupported_edge_counts() {
        assert!(PolygonMap::new(2).is_none());
        assert!(PolygonMap::new(9).is_none());
        assert!(PolygonMap::new(4).is_some());
    }

    #[test]
    fn test_centre_maps_to_origin() {
        let map = PolygonMap::new(6).unwrap();
        let (w, wd) = map.map(Complex64::new(0.0, 0.0));
        assert_eq!(w, Complex64::new(0.0, 0.0));
        assert_relative_eq!(wd.re, map.kappa());
    }

    #[test]
    fn test_corner_maps_to_unit_circle() {
        for n in 3..=8 {
            let map = PolygonMap::new(n).unwrap();
            let (w, _) = map.map(Complex64::new(1.0, 0.0));
            assert_relative_eq!(w.norm(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_expansions_agree_between_regions() {
        let map = PolygonMap::new(4).unwrap();
        let inner = map.map(Complex64::new(0.749_999, 0.0)).0;
        let outer = map.map(Complex64::new(0.750_001, 0.0)).0;
        assert_relative_eq!(inner.re, outer.re, epsilon = 1e-4);
    }

    #[test]
    fn test_map_is_symmetric_under_rotation() {
        let map = PolygonMap::new(5).unwrap();
        let z = Complex64::new(0.3, 0.2);
        let rot = Complex64::from_polar(1.0, TAU / 5.0);
        let (w1, _) = map.map(z);
        let (w2, _) = map.map(z * rot);
        assert_relative_eq!((w1 * rot).re, w2.re, epsilon = 1e-9);
        assert_relative_eq!((w1 * rot).im, w2.im, epsilon = 1e-9);
    }
}
