//! Entropy coding of the AC run-length pairs.
//!
//! Every distinct `(value, count)` run pair becomes one token; token ids are
//! assigned in order of first appearance and the pair dictionary is stored
//! next to the canonical Huffman table. The token stream is then Huffman
//! coded, terminated by the table's end-of-stream symbol, which is always the
//! token id one past the dictionary.

use std::collections::HashMap;

use tracing::trace;

use crate::error::{JvolError, Result};
use crate::huffman::{histogram, HuffmanTable};
use crate::rle::RunLength;

/// Huffman-coded AC runs with everything needed to decode them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanCoding {
    /// Token id terminating `data`. Equals the dictionary length.
    pub eof_symbol: u32,
    /// Run value of each token id.
    pub symbols_values: Vec<i64>,
    /// Run count of each token id.
    pub symbols_counts: Vec<u64>,
    /// Code length per symbol, canonical order.
    pub bitsizes: Vec<u8>,
    /// Token ids, canonical order.
    pub values: Vec<u32>,
    /// MSB-first packed codes.
    pub data: Vec<u8>,
}

impl HuffmanCoding {
    /// Tokenize and entropy-code `runs`.
    pub fn from_rle(runs: &RunLength<i64>) -> Result<Self> {
        if runs.values.len() != runs.counts.len() {
            return Err(JvolError::Usage(format!(
                "{} run values but {} run counts",
                runs.values.len(),
                runs.counts.len()
            )));
        }

        let mut ids: HashMap<(i64, u64), u32> = HashMap::new();
        let mut symbols_values = Vec::new();
        let mut symbols_counts = Vec::new();
        let mut tokens = Vec::with_capacity(runs.len());
        for (&value, &count) in runs.values.iter().zip(&runs.counts) {
            let next = symbols_values.len() as u32;
            let id = *ids.entry((value, count)).or_insert_with(|| {
                symbols_values.push(value);
                symbols_counts.push(count);
                next
            });
            tokens.push(id);
        }

        let table = HuffmanTable::from_histogram(&histogram(&tokens))?;
        let data = table.encode(&tokens)?;
        trace!(
            runs = runs.len(),
            distinct = symbols_values.len(),
            max_code_length = table.max_code_length(),
            bytes = data.len(),
            "huffman coded AC runs"
        );

        Ok(Self {
            eof_symbol: table.eof_symbol(),
            symbols_values,
            symbols_counts,
            bitsizes: table.bitsizes().to_vec(),
            values: table.values().to_vec(),
            data,
        })
    }

    /// Decode back into run-length pairs.
    pub fn to_rle(&self) -> Result<RunLength<i64>> {
        if self.symbols_values.len() != self.symbols_counts.len() {
            return Err(JvolError::format(
                "ac_huffman_symbols_counts",
                format!(
                    "{} token values but {} token counts",
                    self.symbols_values.len(),
                    self.symbols_counts.len()
                ),
            ));
        }
        if self.eof_symbol as usize != self.symbols_values.len() {
            return Err(JvolError::format(
                "ac_huffman_eof_symbol",
                format!(
                    "end-of-stream symbol {} does not follow a {}-token dictionary",
                    self.eof_symbol,
                    self.symbols_values.len()
                ),
            ));
        }

        let table = HuffmanTable::from_canonical(
            self.bitsizes.clone(),
            self.values.clone(),
            self.eof_symbol,
        )?;
        let tokens = table.decode(&self.data)?;

        let mut runs = RunLength {
            values: Vec::with_capacity(tokens.len()),
            counts: Vec::with_capacity(tokens.len()),
        };
        for token in tokens {
            // The table may hold ids above the dictionary only if it is corrupt.
            let idx = token as usize;
            if idx >= self.symbols_values.len() {
                return Err(JvolError::corrupt(
                    "ac bitstream",
                    format!(
                        "token {token} is outside the {}-entry dictionary",
                        self.symbols_values.len()
                    ),
                ));
            }
            runs.values.push(self.symbols_values[idx]);
            runs.counts.push(self.symbols_counts[idx]);
        }
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rle;

    #[test]
    fn all_zero_stream_has_two_symbols() {
        let runs = rle::encode(&[0i64; 63]);
        let coding = HuffmanCoding::from_rle(&runs).unwrap();
        assert_eq!(coding.symbols_values, vec![0]);
        assert_eq!(coding.symbols_counts, vec![63]);
        assert_eq!(coding.eof_symbol, 1);
        assert_eq!(coding.values, vec![0, 1]);
        assert_eq!(coding.bitsizes, vec![1, 1]);
        assert_eq!(coding.to_rle().unwrap(), runs);
    }

    #[test]
    fn repeated_pairs_share_a_token() {
        let runs = rle::encode(&[0i64, 0, 3, 0, 0, 3, 0, 0, 5]);
        let coding = HuffmanCoding::from_rle(&runs).unwrap();
        // (0,2), (3,1), (5,1)
        assert_eq!(coding.symbols_values, vec![0, 3, 5]);
        assert_eq!(coding.symbols_counts, vec![2, 1, 1]);
        assert_eq!(coding.to_rle().unwrap(), runs);
    }

    #[test]
    fn empty_runs_round_trip() {
        let runs = RunLength::<i64>::default();
        let coding = HuffmanCoding::from_rle(&runs).unwrap();
        assert_eq!(coding.eof_symbol, 0);
        assert!(coding.to_rle().unwrap().is_empty());
    }

    #[test]
    fn inconsistent_dictionary_is_format_error() {
        let runs = rle::encode(&[1i64, 2, 2, 3]);
        let mut coding = HuffmanCoding::from_rle(&runs).unwrap();
        coding.symbols_counts.pop();
        assert!(matches!(coding.to_rle(), Err(JvolError::Format { .. })));
    }

    #[test]
    fn truncated_data_is_corrupt() {
        let seq: Vec<i64> = (0..300).map(|i| (i % 11) - 5).collect();
        let runs = rle::encode(&seq);
        let mut coding = HuffmanCoding::from_rle(&runs).unwrap();
        coding.data.truncate(coding.data.len() / 2);
        assert!(matches!(coding.to_rle(), Err(JvolError::CorruptStream { .. })));
    }
}
