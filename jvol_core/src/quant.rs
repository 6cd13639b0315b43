//! Quantization tables for 3D blocks.
//!
//! The base divisor grows linearly with the Manhattan distance of a
//! coefficient from the DC corner, so higher frequencies are quantized more
//! coarsely. Quality scaling follows the IJG convention: a percentage of
//! `5000 / quality` below 50 and `200 - 2 * quality` from 50 up, which reaches
//! zero (all-ones table after clamping) at quality 100.

use crate::error::{JvolError, Result};

/// Base divisor at the DC position, before quality scaling.
pub const BASE_DIVISOR: f64 = 64.0;

pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

/// Per-coefficient divisors for one block, in C order over the block.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizationTable {
    block_shape: [usize; 3],
    divisors: Vec<f64>,
}

impl QuantizationTable {
    /// Wrap an explicit divisor grid. Every divisor must be finite and ≥ 1.
    pub fn new(block_shape: [usize; 3], divisors: Vec<f64>) -> Result<Self> {
        check_block_shape(block_shape)?;
        let len: usize = block_shape.iter().product();
        if divisors.len() != len {
            return Err(JvolError::format(
                "quantization_table",
                format!("block {:?} needs {} divisors, got {}", block_shape, len, divisors.len()),
            ));
        }
        if let Some(bad) = divisors.iter().find(|d| !d.is_finite() || **d < 1.0) {
            return Err(JvolError::format(
                "quantization_table",
                format!("divisor {bad} is not a finite value >= 1"),
            ));
        }
        Ok(Self {
            block_shape,
            divisors,
        })
    }

    #[inline]
    pub fn block_shape(&self) -> [usize; 3] {
        self.block_shape
    }

    /// Number of coefficients in one block.
    #[inline]
    pub fn block_len(&self) -> usize {
        self.divisors.len()
    }

    #[inline]
    pub fn divisors(&self) -> &[f64] {
        &self.divisors
    }

    #[inline]
    pub fn dc_divisor(&self) -> f64 {
        self.divisors[0]
    }

    /// Divisor at block position `(i, j, k)`.
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        let [_, n1, n2] = self.block_shape;
        self.divisors[(i * n1 + j) * n2 + k]
    }
}

/// Percentage applied to the base table for a given quality.
pub fn scale_percent(quality: u8) -> Result<f64> {
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
        return Err(JvolError::InvalidQuality(quality as i64));
    }
    let q = quality as f64;
    Ok(if quality < 50 { 5000.0 / q } else { 200.0 - 2.0 * q })
}

/// Generate the divisor table for `block_shape` at `quality`.
pub fn quantization_table(block_shape: [usize; 3], quality: u8) -> Result<QuantizationTable> {
    check_block_shape(block_shape)?;
    let scale = scale_percent(quality)?;

    let [n0, n1, n2] = block_shape;
    let mut divisors = Vec::with_capacity(n0 * n1 * n2);
    for i in 0..n0 {
        for j in 0..n1 {
            for k in 0..n2 {
                let base = BASE_DIVISOR * (1 + i + j + k) as f64;
                divisors.push((base * scale / 100.0).round().max(1.0));
            }
        }
    }

    Ok(QuantizationTable {
        block_shape,
        divisors,
    })
}

pub(crate) fn check_block_shape(block_shape: [usize; 3]) -> Result<()> {
    if block_shape.iter().any(|&n| n == 0) {
        return Err(JvolError::InvalidBlockShape(block_shape));
    }
    Ok(())
}
