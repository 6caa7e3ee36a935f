//! Discrete Fourier transforms across stacks of matrices.
//!
//! Block-circulant systems (a periodic arrangement of identical cells) are
//! diagonalised by transforming every matrix element along the stack index.
//! Layers are stored row-major over the `(kx, ky)` grid.

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use super::dense::ComplexMatrix;

/// Transform direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Inverse,
}

/// Transform `layers[kx * ny + ky]` along both grid axes in place.
///
/// The inverse transform is normalised, so a forward transform followed by
/// an inverse one restores the input.
pub fn transform_layers(layers: &mut [ComplexMatrix], nx: usize, ny: usize, direction: Direction) {
    if layers.is_empty() {
        return;
    }
    let size = layers[0].size;
    let mut planner = FftPlanner::<f64>::new();

    if nx > 1 {
        let fft = plan(&mut planner, nx, direction);
        let mut buffer = vec![Complex64::new(0.0, 0.0); nx];
        for ky in 0..ny {
            for k in 0..size * size {
                for kx in 0..nx {
                    buffer[kx] = layers[kx * ny + ky].a[k];
                }
                fft.process(&mut buffer);
                for kx in 0..nx {
                    layers[kx * ny + ky].a[k] = buffer[kx];
                }
            }
        }
    }

    if ny > 1 {
        let fft = plan(&mut planner, ny, direction);
        let mut buffer = vec![Complex64::new(0.0, 0.0); ny];
        for kx in 0..nx {
            for k in 0..size * size {
                for ky in 0..ny {
                    buffer[ky] = layers[kx * ny + ky].a[k];
                }
                fft.process(&mut buffer);
                for ky in 0..ny {
                    layers[kx * ny + ky].a[k] = buffer[ky];
                }
            }
        }
    }

    if direction == Direction::Inverse {
        let scale = 1.0 / (nx * ny) as f64;
        for layer in layers.iter_mut() {
            for value in &mut layer.a {
                *value *= scale;
            }
        }
    }
}

fn plan(planner: &mut FftPlanner<f64>, len: usize, direction: Direction) -> std::sync::Arc<dyn Fft<f64>> {
    match direction {
        Direction::Forward => planner.plan_fft_forward(len),
        Direction::Inverse => planner.plan_fft_inverse(len),
    }
}
