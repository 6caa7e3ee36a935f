//! Modified Bessel functions of the second kind, K0 and K1.
//!
//! Polynomial approximations from Abramowitz & Stegun (9.8.1 - 9.8.8).
//! The series forms are valid for `0 < x <= 2`, the asymptotic forms
//! for `x >= 2`; callers pick the branch at [`BESSEL_BRANCH`].

/// Argument at which callers switch from the series to the asymptotic form.
pub const BESSEL_BRANCH: f64 = 2.0;

/// I0(x) for |x| <= 3.75.
fn bessel_i0(x: f64) -> f64 {
    let t = (x / 3.75).powi(2);
    1.0 + t
        * (3.5156229
            + t * (3.0899424 + t * (1.2067492 + t * (0.2659732 + t * (0.0360768 + t * 0.0045813)))))
}

/// I1(x) for |x| <= 3.75.
fn bessel_i1(x: f64) -> f64 {
    let t = (x / 3.75).powi(2);
    x * (0.5
        + t * (0.87890594
            + t * (0.51498869
                + t * (0.15084934 + t * (0.02658733 + t * (0.00301532 + t * 0.00032411))))))
}

/// K0 for small arguments (series form).
pub fn k0_small(x: f64) -> f64 {
    let y = x * x / 4.0;
    -(x / 2.0).ln() * bessel_i0(x)
        + (-0.57721566
            + y * (0.42278420
                + y * (0.23069756
                    + y * (0.03488590 + y * (0.00262698 + y * (0.00010750 + y * 0.00000740))))))
}

/// K1 for small arguments (series form).
pub fn k1_small(x: f64) -> f64 {
    let y = x * x / 4.0;
    (x / 2.0).ln() * bessel_i1(x)
        + (1.0 / x)
            * (1.0
                + y * (0.15443144
                    + y * (-0.67278579
                        + y * (-0.18156897
                            + y * (-0.01919402 + y * (-0.00110404 + y * -0.00004686))))))
}

/// K0 for large arguments (asymptotic form).
pub fn k0_large(x: f64) -> f64 {
    let y = 2.0 / x;
    ((-x).exp() / x.sqrt())
        * (1.25331414
            + y * (-0.07832358
                + y * (0.02189568
                    + y * (-0.01062446 + y * (0.00587872 + y * (-0.00251540 + y * 0.00053208))))))
}

/// K1 for large arguments (asymptotic form).
pub fn k1_large(x: f64) -> f64 {
    let y = 2.0 / x;
    ((-x).exp() / x.sqrt())
        * (1.25331414
            + y * (0.23498619
                + y * (-0.03655620
                    + y * (0.01504268 + y * (-0.00780353 + y * (0.00325614 + y * -0.00068245))))))
}

/// K0 and K1 with the branch chosen at [`BESSEL_BRANCH`].
pub fn k0_k1(x: f64) -> (f64, f64) {
    if x < BESSEL_BRANCH {
        (k0_small(x), k1_small(x))
    } else {
        (k0_large(x), k1_large(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_k0_reference_values() {
        // Tabulated: K0(0.5) = 0.92441907, K0(3) = 0.03473950
        assert_relative_eq!(k0_small(0.5), 0.924_419_07, max_relative = 1e-6);
        assert_relative_eq!(k0_large(3.0), 0.034_739_50, max_relative = 1e-5);
    }

    #[test]
    fn test_k1_reference_values() {
        // Tabulated: K1(1) = 0.60190723, K1(4) = 0.01248350
        assert_relative_eq!(k1_small(1.0), 0.601_907_23, max_relative = 1e-6);
        assert_relative_eq!(k1_large(4.0), 0.012_483_50, max_relative = 1e-5);
    }

    #[test]
    fn test_branches_agree_at_threshold() {
        assert_relative_eq!(k0_small(2.0), k0_large(2.0), max_relative = 1e-5);
        assert_relative_eq!(k1_small(2.0), k1_large(2.0), max_relative = 1e-5);
    }
}
