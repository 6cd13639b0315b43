//! Run-length coding of flat integer streams.

use crate::error::{JvolError, Result};

/// A run-length encoded sequence: `values[i]` repeated `counts[i]` times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunLength<T> {
    pub values: Vec<T>,
    pub counts: Vec<u64>,
}

impl<T> RunLength<T> {
    /// Number of runs.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Length of the expanded sequence, or `None` if the counts overflow `u64`.
    pub fn expanded_len(&self) -> Option<u64> {
        checked_total(&self.counts)
    }
}

/// Collapse maximal runs of equal consecutive values.
pub fn encode<T: Copy + PartialEq>(sequence: &[T]) -> RunLength<T> {
    let mut out = RunLength {
        values: Vec::new(),
        counts: Vec::new(),
    };
    let mut iter = sequence.iter();
    let Some(&first) = iter.next() else {
        return out;
    };

    let mut current = first;
    let mut run = 1u64;
    for &v in iter {
        if v == current {
            run += 1;
        } else {
            out.values.push(current);
            out.counts.push(run);
            current = v;
            run = 1;
        }
    }
    out.values.push(current);
    out.counts.push(run);
    out
}

fn checked_total(counts: &[u64]) -> Option<u64> {
    counts.iter().try_fold(0u64, |acc, &c| acc.checked_add(c))
}

/// Expand `values[i]` repeated `counts[i]` times.
///
/// `stage` names the stream in error messages.
pub fn decode<T: Copy>(values: &[T], counts: &[u64], stage: &'static str) -> Result<Vec<T>> {
    if values.len() != counts.len() {
        return Err(JvolError::corrupt(
            stage,
            format!(
                "{} run values but {} run counts",
                values.len(),
                counts.len()
            ),
        ));
    }
    if let Some(pos) = counts.iter().position(|&c| c == 0) {
        return Err(JvolError::corrupt(stage, format!("run {pos} has a zero count")));
    }

    let total = checked_total(counts)
        .and_then(|t| usize::try_from(t).ok())
        .ok_or_else(|| JvolError::corrupt(stage, "run counts overflow"))?;
    let mut out = Vec::with_capacity(total);
    for (&v, &c) in values.iter().zip(counts) {
        out.extend(std::iter::repeat(v).take(c as usize));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence() {
        let rle = encode::<i64>(&[]);
        assert!(rle.is_empty());
        assert!(rle.counts.is_empty());
        assert_eq!(decode::<i64>(&[], &[], "test").unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn collapses_runs() {
        let rle = encode(&[0i64, 0, 0, 5, 5, -1, 0, 0]);
        assert_eq!(rle.values, vec![0, 5, -1, 0]);
        assert_eq!(rle.counts, vec![3, 2, 1, 2]);
        assert_eq!(rle.expanded_len(), Some(8));
    }

    #[test]
    fn no_repeats_gives_unit_counts() {
        let seq = [1i64, 2, 3, 4];
        let rle = encode(&seq);
        assert_eq!(rle.values, seq.to_vec());
        assert!(rle.counts.iter().all(|&c| c == 1));
    }

    #[test]
    fn decode_rejects_mismatched_lengths() {
        let err = decode(&[1i64, 2], &[1], "dc stream").unwrap_err();
        assert!(matches!(err, JvolError::CorruptStream { stage: "dc stream", .. }));
    }

    #[test]
    fn decode_rejects_zero_count() {
        assert!(decode(&[1i64, 2], &[1, 0], "ac stream").is_err());
    }

    #[test]
    fn overflowing_counts_are_corrupt() {
        let runs = RunLength {
            values: vec![3i64, 4],
            counts: vec![u64::MAX, 2],
        };
        assert_eq!(runs.expanded_len(), None);
        assert!(matches!(
            decode(&runs.values, &runs.counts, "dc stream"),
            Err(JvolError::CorruptStream { stage: "dc stream", .. })
        ));
    }

    #[test]
    fn round_trip() {
        let seq: Vec<i64> = (0..200).map(|i| (i / 7) % 3 - 1).collect();
        let rle = encode(&seq);
        assert_eq!(decode(&rle.values, &rle.counts, "test").unwrap(), seq);
    }
}
