//! Volume ⇄ encoded arrays.
//!
//! Encoding normalizes the samples to `[0, span]`, quantizes them
//! block by block, run-length codes the DC stream and Huffman codes the
//! run-length pairs of the AC stream. Decoding reverses every step and casts
//! back to the stored element type.
//!
//! The span is `NORMALIZED_MAX` for float volumes. Integer volumes use
//! `max(NORMALIZED_MAX, max - min)`, so one normalized step never covers more
//! than one integer and quality 100 with single-sample blocks stays exact.

use tracing::debug;

use crate::blocks::{decode_blocks, encode_blocks};
use crate::entropy::HuffmanCoding;
use crate::error::{JvolError, Result};
use crate::quant::QuantizationTable;
use crate::rle::{self, RunLength};
use crate::volume::{Dtype, Volume, VolumeData};

/// Upper end of the normalized sample range for float volumes, and the
/// smallest span used for integer volumes.
pub const NORMALIZED_MAX: f64 = 65535.0;

/// Width of the normalized range for a volume of `dtype` spanning `slope`.
pub fn normalized_span(dtype: Dtype, slope: f64) -> f64 {
    if dtype.is_float() {
        NORMALIZED_MAX
    } else {
        slope.max(NORMALIZED_MAX)
    }
}

/// Everything the decoder needs besides the quantization table.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedArray {
    pub dc: RunLength<i64>,
    pub ac: HuffmanCoding,
    pub dtype: Dtype,
    /// Volume minimum.
    pub intercept: f64,
    /// Volume range (`max - min`).
    pub slope: f64,
    pub shape: [usize; 3],
}

/// Encode `volume` with `table`.
///
/// NaN and infinite samples are rejected: they have no place on the
/// normalized scale.
pub fn encode_array(volume: &Volume, table: &QuantizationTable) -> Result<EncodedArray> {
    let samples = volume.to_f64();
    if let Some(pos) = samples.iter().position(|x| !x.is_finite()) {
        return Err(JvolError::Usage(format!(
            "sample {} is {}, only finite samples can be encoded",
            pos, samples[pos]
        )));
    }
    let (intercept, max) = volume
        .min_max()
        .ok_or_else(|| JvolError::Usage("volume has no samples".into()))?;
    let slope = max - intercept;
    let span = normalized_span(volume.dtype(), slope);

    let normalized: Vec<f64> = if slope == 0.0 {
        vec![0.0; samples.len()]
    } else {
        samples
            .iter()
            .map(|&x| (x - intercept) / slope * span)
            .collect()
    };

    let coefficients = encode_blocks(&normalized, volume.shape(), table)?;
    let dc = rle::encode(&coefficients.dc);
    let ac_runs = rle::encode(&coefficients.ac);
    let ac = HuffmanCoding::from_rle(&ac_runs)?;

    debug!(
        shape = ?volume.shape(),
        dtype = volume.dtype().name(),
        dc_runs = dc.len(),
        ac_runs = ac_runs.len(),
        ac_tokens = ac.symbols_values.len(),
        ac_bytes = ac.data.len(),
        "encoded volume"
    );

    Ok(EncodedArray {
        dc,
        ac,
        dtype: volume.dtype(),
        intercept,
        slope,
        shape: volume.shape(),
    })
}

/// Decode `encoded` with the table it was encoded with.
pub fn decode_array(encoded: &EncodedArray, table: &QuantizationTable) -> Result<Volume> {
    let shape = encoded.shape;
    if shape.iter().any(|&n| n == 0) {
        return Err(JvolError::format("shape", format!("{shape:?} has a zero dimension")));
    }
    if !encoded.intercept.is_finite() {
        return Err(JvolError::format(
            "intercept",
            format!("{} is not finite", encoded.intercept),
        ));
    }
    if !encoded.slope.is_finite() || encoded.slope < 0.0 {
        return Err(JvolError::format(
            "slope",
            format!("{} is not a finite range", encoded.slope),
        ));
    }

    if shape.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n)).is_none() {
        return Err(JvolError::format("shape", format!("{shape:?} does not fit in memory")));
    }

    let block_shape = table.block_shape();
    let blocks = shape
        .iter()
        .zip(block_shape.iter())
        .try_fold(1u64, |acc, (&n, &b)| acc.checked_mul(n.div_ceil(b) as u64))
        .ok_or_else(|| JvolError::format("shape", format!("{shape:?} has too many blocks")))?;
    let dc_len = encoded
        .dc
        .expanded_len()
        .ok_or_else(|| JvolError::corrupt("dc stream", "run counts overflow"))?;
    if dc_len != blocks {
        return Err(JvolError::corrupt(
            "dc stream",
            format!("runs expand to {dc_len} values for {blocks} blocks"),
        ));
    }
    let dc = rle::decode(&encoded.dc.values, &encoded.dc.counts, "dc stream")?;

    let ac_runs = encoded.ac.to_rle()?;
    let ac_len = ac_runs
        .expanded_len()
        .ok_or_else(|| JvolError::corrupt("ac stream", "run counts overflow"))?;
    let ac_expected = blocks
        .checked_mul(table.block_len() as u64 - 1)
        .ok_or_else(|| {
            JvolError::format("shape", format!("{shape:?} has too many coefficients"))
        })?;
    if ac_len != ac_expected {
        return Err(JvolError::corrupt(
            "ac stream",
            format!("runs expand to {ac_len} values, expected {ac_expected}"),
        ));
    }
    let ac = rle::decode(&ac_runs.values, &ac_runs.counts, "ac stream")?;

    let span = normalized_span(encoded.dtype, encoded.slope);
    let normalized = decode_blocks(&dc, &ac, table, shape)?;
    let samples: Vec<f64> = normalized
        .iter()
        .map(|&x| x / span * encoded.slope + encoded.intercept)
        .collect();

    debug!(shape = ?shape, dtype = encoded.dtype.name(), "decoded volume");
    Volume::from_data(shape, VolumeData::from_f64(encoded.dtype, &samples))
}
