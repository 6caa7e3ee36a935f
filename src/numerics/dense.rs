//! Dense LU factorisation and inversion for real and complex matrices.

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_complex::Complex64;

use crate::error::{FieldError, Result};

/// Pivots smaller than this are treated as singular.
pub const PIVOT_THRESHOLD: f64 = 1e-15;

/// Element type of a [`DenseMatrix`].
pub trait Scalar:
    Copy
    + Debug
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    const ZERO: Self;
    const ONE: Self;

    /// Magnitude used for pivot selection.
    fn modulus(self) -> f64;
}

impl Scalar for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    fn modulus(self) -> f64 {
        self.abs()
    }
}

impl Scalar for Complex64 {
    const ZERO: Self = Complex64::new(0.0, 0.0);
    const ONE: Self = Complex64::new(1.0, 0.0);

    fn modulus(self) -> f64 {
        self.norm()
    }
}

/// Square matrix stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix<T: Scalar> {
    /// Elements (row-major)
    pub a: Vec<T>,
    /// Matrix dimension
    pub size: usize,
}

/// Real square matrix.
pub type RealMatrix = DenseMatrix<f64>;

/// Complex square matrix.
pub type ComplexMatrix = DenseMatrix<Complex64>;

impl<T: Scalar> DenseMatrix<T> {
    /// Create a zero matrix.
    pub fn zeros(size: usize) -> Self {
        Self {
            a: vec![T::ZERO; size * size],
            size,
        }
    }

    /// Create an identity matrix.
    pub fn identity(size: usize) -> Self {
        let mut m = Self::zeros(size);
        for i in 0..size {
            m.set(i, i, T::ONE);
        }
        m
    }

    /// Get matrix element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> T {
        self.a[row * self.size + col]
    }

    /// Set matrix element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.a[row * self.size + col] = value;
    }

    /// Add to matrix element at (row, col).
    pub fn add(&mut self, row: usize, col: usize, value: T) {
        let k = row * self.size + col;
        self.a[k] = self.a[k] + value;
    }

    /// Borrow one row.
    pub fn row(&self, row: usize) -> &[T] {
        &self.a[row * self.size..(row + 1) * self.size]
    }

    /// Matrix-vector product.
    pub fn mul_vec(&self, x: &[T]) -> Vec<T> {
        (0..self.size)
            .map(|i| {
                self.row(i)
                    .iter()
                    .zip(x)
                    .fold(T::ZERO, |acc, (&aij, &xj)| acc + aij * xj)
            })
            .collect()
    }

    /// Perform LU decomposition with partial pivoting.
    pub fn factor(&self) -> Result<LuFactors<T>> {
        let n = self.size;
        let mut lu = self.a.clone();
        let mut pivots: Vec<usize> = (0..n).collect();

        for k in 0..n {
            // Find pivot
            let mut max_val = lu[k * n + k].modulus();
            let mut max_row = k;
            for i in (k + 1)..n {
                let val = lu[i * n + k].modulus();
                if val > max_val {
                    max_val = val;
                    max_row = i;
                }
            }

            if max_val < PIVOT_THRESHOLD {
                return Err(FieldError::SingularMatrix);
            }

            if max_row != k {
                pivots.swap(k, max_row);
                for j in 0..n {
                    lu.swap(k * n + j, max_row * n + j);
                }
            }

            // Eliminate
            let pivot = lu[k * n + k];
            for i in (k + 1)..n {
                let factor = lu[i * n + k] / pivot;
                lu[i * n + k] = factor;
                for j in (k + 1)..n {
                    lu[i * n + j] = lu[i * n + j] - factor * lu[k * n + j];
                }
            }
        }

        Ok(LuFactors { lu, pivots, size: n })
    }

    /// Solve `A x = b`.
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>> {
        self.factor()?.solve(b)
    }

    /// Compute the inverse matrix.
    pub fn invert(&self) -> Result<Self> {
        let factors = self.factor()?;
        let n = self.size;
        let mut inv = Self::zeros(n);
        let mut unit = vec![T::ZERO; n];
        for col in 0..n {
            unit.fill(T::ZERO);
            unit[col] = T::ONE;
            let x = factors.solve(&unit)?;
            for (row, value) in x.into_iter().enumerate() {
                inv.set(row, col, value);
            }
        }
        Ok(inv)
    }
}

/// LU factors of a square matrix with the row permutation.
#[derive(Debug, Clone)]
pub struct LuFactors<T: Scalar> {
    lu: Vec<T>,
    pivots: Vec<usize>,
    size: usize,
}

impl<T: Scalar> LuFactors<T> {
    /// Solve the system using the pre-computed LU decomposition.
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>> {
        let n = self.size;
        let lu = &self.lu;

        // Apply pivot permutation to b
        let mut x: Vec<T> = self.pivots.iter().map(|&p| b[p]).collect();

        // Forward substitution (L * y = Pb)
        for i in 0..n {
            for j in 0..i {
                x[i] = x[i] - lu[i * n + j] * x[j];
            }
        }

        // Back substitution (U * x = y)
        for i in (0..n).rev() {
            for j in (i + 1)..n {
                x[i] = x[i] - lu[i * n + j] * x[j];
            }
            let diag = lu[i * n + i];
            if diag.modulus() < PIVOT_THRESHOLD {
                return Err(FieldError::SingularMatrix);
            }
            x[i] = x[i] / diag;
        }

        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve_with_pivoting() {
        let mut m = RealMatrix::zeros(3);
        m.a = vec![0.0, 2.0, 1.0, 1.0, 1.0, 0.0, 3.0, 0.0, 1.0];
        let x = m.solve(&[5.0, 3.0, 6.0]).unwrap();
        let b = m.mul_vec(&x);
        assert_relative_eq!(b[0], 5.0, epsilon = 1e-12);
        assert_relative_eq!(b[1], 3.0, epsilon = 1e-12);
        assert_relative_eq!(b[2], 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_times_matrix_is_identity() {
        let mut m = RealMatrix::zeros(2);
        m.a = vec![4.0, 1.0, 2.0, 3.0];
        let inv = m.invert().unwrap();
        assert_relative_eq!(inv.get(0, 0), 0.3, epsilon = 1e-12);
        assert_relative_eq!(inv.get(0, 1), -0.1, epsilon = 1e-12);
        assert_relative_eq!(inv.get(1, 0), -0.2, epsilon = 1e-12);
        assert_relative_eq!(inv.get(1, 1), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_matrix_detected() {
        let mut m = RealMatrix::zeros(2);
        m.a = vec![1.0, 2.0, 2.0, 4.0];
        assert!(matches!(m.invert(), Err(FieldError::SingularMatrix)));
    }

    #[test]
    fn test_complex_inverse() {
        let mut m = ComplexMatrix::zeros(2);
        m.set(0, 0, Complex64::new(1.0, 1.0));
        m.set(0, 1, Complex64::new(0.0, 2.0));
        m.set(1, 0, Complex64::new(1.0, 0.0));
        m.set(1, 1, Complex64::new(3.0, -1.0));
        let inv = m.invert().unwrap();
        for i in 0..2 {
            for j in 0..2 {
                let mut s = Complex64::new(0.0, 0.0);
                for k in 0..2 {
                    s += m.get(i, k) * inv.get(k, j);
                }
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(s.re, expected, epsilon = 1e-12);
                assert_relative_eq!(s.im, 0.0, epsilon = 1e-12);
            }
        }
    }
}
