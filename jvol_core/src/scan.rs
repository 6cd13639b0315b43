//! Intra-block coefficient scan order.
//!
//! The 3D analogue of the JPEG zigzag: positions are visited by increasing
//! Manhattan distance `i + j + k` from the DC corner, and positions at equal
//! distance in C order. High-frequency coefficients, which quantize to zero
//! most often, end up clustered at the tail of each block.

/// Maps scan index to natural C-order index within a block of `shape`.
///
/// Index 0 is always the DC position.
pub fn scan_to_natural(shape: [usize; 3]) -> Vec<usize> {
    let [n0, n1, n2] = shape;
    let mut order: Vec<(usize, usize)> = Vec::with_capacity(n0 * n1 * n2);
    for i in 0..n0 {
        for j in 0..n1 {
            for k in 0..n2 {
                order.push((i + j + k, (i * n1 + j) * n2 + k));
            }
        }
    }
    order.sort_unstable();
    order.into_iter().map(|(_, natural)| natural).collect()
}

/// Inverse of [`scan_to_natural`].
pub fn natural_to_scan(shape: [usize; 3]) -> Vec<usize> {
    let forward = scan_to_natural(shape);
    let mut inverse = vec![0usize; forward.len()];
    for (scan, &natural) in forward.iter().enumerate() {
        inverse[natural] = scan;
    }
    inverse
}
