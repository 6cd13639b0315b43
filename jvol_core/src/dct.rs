//! Separable orthonormal 3D DCT-II for one block.
//!
//! The transform is applied along each axis in turn using a precomputed
//! basis matrix. With orthonormal scaling the inverse is the transpose, so a
//! forward/inverse pair reproduces the input up to floating-point rounding.

use std::f64::consts::PI;

/// Precomputed basis matrices for one block shape.
#[derive(Debug, Clone)]
pub struct DctPlan {
    shape: [usize; 3],
    /// `bases[axis][u * n + x]` = `c(u) * cos(pi * (2x + 1) * u / 2n)`.
    bases: [Vec<f64>; 3],
}

impl DctPlan {
    pub fn new(shape: [usize; 3]) -> Self {
        Self {
            shape,
            bases: [basis(shape[0]), basis(shape[1]), basis(shape[2])],
        }
    }

    /// Forward transform in place. `block` is C order over `shape`.
    pub fn forward(&self, block: &mut [f64]) {
        for axis in 0..3 {
            self.apply(block, axis, false);
        }
    }

    /// Inverse transform in place.
    pub fn inverse(&self, block: &mut [f64]) {
        for axis in (0..3).rev() {
            self.apply(block, axis, true);
        }
    }

    fn apply(&self, block: &mut [f64], axis: usize, inverse: bool) {
        let n = self.shape[axis];
        if n == 1 {
            return;
        }
        let basis = &self.bases[axis];
        let stride: usize = self.shape[axis + 1..].iter().product();
        let outer: usize = self.shape[..axis].iter().product();

        let mut line = vec![0.0; n];
        for o in 0..outer {
            for s in 0..stride {
                let base = o * n * stride + s;
                for (x, slot) in line.iter_mut().enumerate() {
                    *slot = block[base + x * stride];
                }
                for u in 0..n {
                    let mut acc = 0.0;
                    for (x, &v) in line.iter().enumerate() {
                        let w = if inverse { basis[x * n + u] } else { basis[u * n + x] };
                        acc += w * v;
                    }
                    block[base + u * stride] = acc;
                }
            }
        }
    }
}

fn basis(n: usize) -> Vec<f64> {
    let mut m = vec![0.0; n * n];
    let nf = n as f64;
    for u in 0..n {
        let c = if u == 0 { (1.0 / nf).sqrt() } else { (2.0 / nf).sqrt() };
        for x in 0..n {
            m[u * n + x] = c * (PI * (2 * x + 1) as f64 * u as f64 / (2.0 * nf)).cos();
        }
    }
    m
}
