//! Block partition, transform and quantization.
//!
//! A volume is cut into `block_shape` sub-cubes in raster (C) order over the
//! block grid. Trailing partial blocks are filled by replicating the last
//! valid sample along each axis. Each block yields:
//!
//! - one DC value: the block mean divided by the DC divisor, rounded;
//! - `block_len - 1` AC values: the orthonormal DCT of `block - mean`,
//!   excluding the DC slot, divided by their divisors and rounded, emitted in
//!   [`scan`](crate::scan) order.
//!
//! Rounding is to nearest with ties away from zero (`f64::round`).

use rayon::prelude::*;
use tracing::debug;

use crate::dct::DctPlan;
use crate::error::{JvolError, Result};
use crate::quant::{check_block_shape, QuantizationTable};
use crate::scan::scan_to_natural;

/// Quantized DC and AC streams of a whole volume, in block-raster order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCoefficients {
    pub dc: Vec<i64>,
    pub ac: Vec<i64>,
    pub padded_shape: [usize; 3],
}

/// Number of blocks along each axis (ceil division).
pub fn block_grid(shape: [usize; 3], block_shape: [usize; 3]) -> [usize; 3] {
    [
        shape[0].div_ceil(block_shape[0]),
        shape[1].div_ceil(block_shape[1]),
        shape[2].div_ceil(block_shape[2]),
    ]
}

/// Shape of the volume after padding up to whole blocks.
pub fn padded_shape(shape: [usize; 3], block_shape: [usize; 3]) -> [usize; 3] {
    let grid = block_grid(shape, block_shape);
    [
        grid[0] * block_shape[0],
        grid[1] * block_shape[1],
        grid[2] * block_shape[2],
    ]
}

/// Shared per-call state for walking blocks.
struct BlockLayout<'t> {
    shape: [usize; 3],
    block_shape: [usize; 3],
    grid: [usize; 3],
    table: &'t QuantizationTable,
    plan: DctPlan,
    scan: Vec<usize>,
}

impl<'t> BlockLayout<'t> {
    fn new(shape: [usize; 3], table: &'t QuantizationTable) -> Result<Self> {
        let block_shape = table.block_shape();
        check_block_shape(block_shape)?;
        if shape.iter().any(|&n| n == 0) {
            return Err(JvolError::InvalidShape {
                shape,
                reason: "every dimension must be positive".into(),
            });
        }
        Ok(Self {
            shape,
            block_shape,
            grid: block_grid(shape, block_shape),
            table,
            plan: DctPlan::new(block_shape),
            scan: scan_to_natural(block_shape),
        })
    }

    fn block_count(&self) -> usize {
        self.grid.iter().product()
    }

    fn block_len(&self) -> usize {
        self.table.block_len()
    }

    /// Volume coordinates of the first sample of block `b`.
    fn origin(&self, b: usize) -> [usize; 3] {
        let [_, g1, g2] = self.grid;
        let bk = b % g2;
        let bj = (b / g2) % g1;
        let bi = b / (g1 * g2);
        [
            bi * self.block_shape[0],
            bj * self.block_shape[1],
            bk * self.block_shape[2],
        ]
    }

    fn encode_block(&self, samples: &[f64], b: usize) -> (i64, Vec<i64>) {
        let [s0, s1, s2] = self.shape;
        let [n0, n1, n2] = self.block_shape;
        let origin = self.origin(b);

        let mut block = Vec::with_capacity(self.block_len());
        for i in 0..n0 {
            let vi = (origin[0] + i).min(s0 - 1);
            for j in 0..n1 {
                let vj = (origin[1] + j).min(s1 - 1);
                for k in 0..n2 {
                    let vk = (origin[2] + k).min(s2 - 1);
                    block.push(samples[(vi * s1 + vj) * s2 + vk]);
                }
            }
        }

        let mean = block.iter().sum::<f64>() / block.len() as f64;
        let divisors = self.table.divisors();
        let dc = (mean / divisors[0]).round() as i64;

        for v in block.iter_mut() {
            *v -= mean;
        }
        self.plan.forward(&mut block);

        let ac = self.scan[1..]
            .iter()
            .map(|&natural| (block[natural] / divisors[natural]).round() as i64)
            .collect();
        (dc, ac)
    }

    fn decode_block(&self, dc: i64, ac: &[i64]) -> Vec<f64> {
        let divisors = self.table.divisors();
        let mut block = vec![0.0; self.block_len()];
        for (&natural, &q) in self.scan[1..].iter().zip(ac) {
            block[natural] = q as f64 * divisors[natural];
        }
        self.plan.inverse(&mut block);

        let mean = dc as f64 * divisors[0];
        for v in block.iter_mut() {
            *v += mean;
        }
        block
    }
}

/// Partition `samples` (C order over `shape`) and quantize every block.
pub fn encode_blocks(
    samples: &[f64],
    shape: [usize; 3],
    table: &QuantizationTable,
) -> Result<BlockCoefficients> {
    let layout = BlockLayout::new(shape, table)?;
    let expected: usize = shape.iter().product();
    if samples.len() != expected {
        return Err(JvolError::InvalidShape {
            shape,
            reason: format!("expected {} samples, got {}", expected, samples.len()),
        });
    }

    let per_block: Vec<(i64, Vec<i64>)> = (0..layout.block_count())
        .into_par_iter()
        .map(|b| layout.encode_block(samples, b))
        .collect();

    let mut dc = Vec::with_capacity(per_block.len());
    let mut ac = Vec::with_capacity(per_block.len() * (layout.block_len() - 1));
    for (block_dc, block_ac) in per_block {
        dc.push(block_dc);
        ac.extend(block_ac);
    }

    debug!(
        blocks = dc.len(),
        block_shape = ?layout.block_shape,
        ac_len = ac.len(),
        "quantized volume into blocks"
    );

    Ok(BlockCoefficients {
        dc,
        ac,
        padded_shape: padded_shape(shape, layout.block_shape),
    })
}

/// Reconstruct a volume of `target_shape` from quantized DC and AC streams.
pub fn decode_blocks(
    dc: &[i64],
    ac: &[i64],
    table: &QuantizationTable,
    target_shape: [usize; 3],
) -> Result<Vec<f64>> {
    let layout = BlockLayout::new(target_shape, table)?;
    let blocks = layout.block_count();
    let ac_per_block = layout.block_len() - 1;

    if dc.len() != blocks {
        return Err(JvolError::corrupt(
            "dc stream",
            format!(
                "{} DC values for {} blocks of shape {:?}",
                dc.len(),
                blocks,
                layout.block_shape
            ),
        ));
    }
    if ac.len() != blocks * ac_per_block {
        return Err(JvolError::corrupt(
            "ac stream",
            format!(
                "{} AC values, expected {} ({} blocks × {})",
                ac.len(),
                blocks * ac_per_block,
                blocks,
                ac_per_block
            ),
        ));
    }

    let decoded: Vec<Vec<f64>> = (0..blocks)
        .into_par_iter()
        .map(|b| layout.decode_block(dc[b], &ac[b * ac_per_block..(b + 1) * ac_per_block]))
        .collect();

    let [s0, s1, s2] = target_shape;
    let [n0, n1, n2] = layout.block_shape;
    let mut out = vec![0.0; s0 * s1 * s2];
    for (b, block) in decoded.iter().enumerate() {
        let origin = layout.origin(b);
        for i in 0..n0.min(s0 - origin[0]) {
            for j in 0..n1.min(s1 - origin[1]) {
                let dst = ((origin[0] + i) * s1 + origin[1] + j) * s2 + origin[2];
                let src = (i * n1 + j) * n2;
                let width = n2.min(s2 - origin[2]);
                out[dst..dst + width].copy_from_slice(&block[src..src + width]);
            }
        }
    }

    debug!(blocks, shape = ?target_shape, "reassembled volume from blocks");
    Ok(out)
}
