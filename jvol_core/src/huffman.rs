//! Canonical Huffman coding with an explicit end-of-stream symbol.
//!
//! A table is fully described by two parallel arrays in canonical order:
//! `bitsizes` (code length per symbol, non-decreasing) and `values` (the
//! symbols, ascending within each length). Codes are assigned from those
//! alone: the first symbol gets the all-zero code of the shortest length,
//! each following symbol gets the previous code plus one, shifted left by
//! the growth in length. No bit patterns are stored.
//!
//! Every table carries a reserved `eof_symbol`. The encoder always appends
//! it, so the decoder stops on it and never interprets the zero padding of
//! the last byte.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use crate::bitio::{BitReader, BitWriter};
use crate::error::{JvolError, Result};

/// Longest code length the table accepts.
pub const MAX_CODE_LENGTH: u8 = 63;

/// Canonical Huffman table over `u32` symbols.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    eof_symbol: u32,
    bitsizes: Vec<u8>,
    values: Vec<u32>,
    /// symbol → (code, length), for encoding.
    codes: HashMap<u32, (u64, u8)>,
    /// Indexed by code length: first code of that length.
    first_code: Vec<u64>,
    /// Indexed by code length: number of codes of that length.
    count: Vec<u64>,
    /// Indexed by code length: index into `values` of the first symbol of that length.
    offset: Vec<usize>,
}

impl PartialEq for HuffmanTable {
    fn eq(&self, other: &Self) -> bool {
        self.eof_symbol == other.eof_symbol
            && self.bitsizes == other.bitsizes
            && self.values == other.values
    }
}

/// Count symbol occurrences.
pub fn histogram(symbols: &[u32]) -> BTreeMap<u32, u64> {
    let mut hist = BTreeMap::new();
    for &s in symbols {
        *hist.entry(s).or_insert(0u64) += 1;
    }
    hist
}

impl HuffmanTable {
    /// Build an optimal canonical code for `histogram`.
    ///
    /// The end-of-stream symbol is one past the largest observed symbol (0 for
    /// an empty histogram) and enters the code with frequency 1. Equal
    /// frequencies merge in a fixed order: leaves by symbol value, before any
    /// internal node, and internal nodes in creation order.
    pub fn from_histogram(histogram: &BTreeMap<u32, u64>) -> Result<Self> {
        let eof_symbol = match histogram.keys().next_back() {
            None => 0,
            Some(&max) => max.checked_add(1).ok_or_else(|| {
                JvolError::Usage(
                    "symbol u32::MAX leaves no room for the end-of-stream symbol".into(),
                )
            })?,
        };

        let mut leaves: Vec<(u32, u64)> = histogram
            .iter()
            .filter(|&(_, &f)| f > 0)
            .map(|(&s, &f)| (s, f))
            .collect();
        leaves.push((eof_symbol, 1));

        let lengths = code_lengths(&leaves)?;

        let mut canonical: Vec<(u8, u32)> = leaves
            .iter()
            .zip(&lengths)
            .map(|(&(symbol, _), &len)| (len, symbol))
            .collect();
        canonical.sort_unstable();

        let bitsizes = canonical.iter().map(|&(len, _)| len).collect();
        let values = canonical.iter().map(|&(_, s)| s).collect();
        Self::from_canonical(bitsizes, values, eof_symbol)
    }

    /// Rebuild a table from its stored canonical form, validating it.
    pub fn from_canonical(bitsizes: Vec<u8>, values: Vec<u32>, eof_symbol: u32) -> Result<Self> {
        const FIELD: &str = "ac_huffman_bitsizes";
        if bitsizes.len() != values.len() {
            return Err(JvolError::format(
                FIELD,
                format!("{} code lengths for {} symbols", bitsizes.len(), values.len()),
            ));
        }
        if bitsizes.is_empty() {
            return Err(JvolError::format(FIELD, "empty code table"));
        }

        let mut kraft: u128 = 0;
        let mut prev: Option<(u8, u32)> = None;
        for (i, (&len, &sym)) in bitsizes.iter().zip(&values).enumerate() {
            if len == 0 || len > MAX_CODE_LENGTH {
                return Err(JvolError::format(
                    FIELD,
                    format!("code length {len} outside 1..={MAX_CODE_LENGTH}"),
                ));
            }
            if let Some((plen, psym)) = prev {
                if len < plen || (len == plen && sym <= psym) {
                    return Err(JvolError::format(
                        "ac_huffman_values",
                        format!("entry {i} ({sym}, {len} bits) breaks canonical order"),
                    ));
                }
            }
            kraft += 1u128 << (64 - len);
            prev = Some((len, sym));
        }
        if kraft > 1u128 << 64 {
            return Err(JvolError::format(FIELD, "code lengths oversubscribe the code space"));
        }

        let max_len = bitsizes[bitsizes.len() - 1];
        let mut count = vec![0u64; max_len as usize + 1];
        let mut offset = vec![0usize; max_len as usize + 1];
        for (i, &len) in bitsizes.iter().enumerate() {
            if count[len as usize] == 0 {
                offset[len as usize] = i;
            }
            count[len as usize] += 1;
        }

        let mut first_code = vec![0u64; max_len as usize + 1];
        let mut code = 0u64;
        for len in 1..=max_len as usize {
            first_code[len] = code;
            code += count[len];
            if len < max_len as usize {
                code <<= 1;
            }
        }

        let mut codes = HashMap::with_capacity(values.len());
        for len in 1..=max_len as usize {
            for n in 0..count[len] as usize {
                let sym = values[offset[len] + n];
                let code = first_code[len] + n as u64;
                if codes.insert(sym, (code, len as u8)).is_some() {
                    return Err(JvolError::format(
                        "ac_huffman_values",
                        format!("symbol {sym} appears twice"),
                    ));
                }
            }
        }
        if !codes.contains_key(&eof_symbol) {
            return Err(JvolError::format(
                "ac_huffman_eof_symbol",
                format!("end-of-stream symbol {eof_symbol} has no code"),
            ));
        }

        Ok(Self {
            eof_symbol,
            bitsizes,
            values,
            codes,
            first_code,
            count,
            offset,
        })
    }

    #[inline]
    pub fn eof_symbol(&self) -> u32 {
        self.eof_symbol
    }

    /// Code length per symbol, canonical order.
    pub fn bitsizes(&self) -> &[u8] {
        &self.bitsizes
    }

    /// Symbols, canonical order.
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn max_code_length(&self) -> u8 {
        self.bitsizes[self.bitsizes.len() - 1]
    }

    /// `(code, length)` for `symbol`, if it has one.
    pub fn code(&self, symbol: u32) -> Option<(u64, u8)> {
        self.codes.get(&symbol).copied()
    }

    /// Encode `symbols` followed by the end-of-stream symbol.
    pub fn encode(&self, symbols: &[u32]) -> Result<Vec<u8>> {
        let mut writer = BitWriter::new();
        for &s in symbols {
            if s == self.eof_symbol {
                return Err(JvolError::Usage(
                    "the end-of-stream symbol cannot appear in the data".into(),
                ));
            }
            let (code, len) = self
                .code(s)
                .ok_or_else(|| JvolError::Usage(format!("symbol {s} has no Huffman code")))?;
            writer.write_bits(code, len);
        }
        let (code, len) = self.codes[&self.eof_symbol];
        writer.write_bits(code, len);
        Ok(writer.finish())
    }

    /// Decode symbols up to (not including) the end-of-stream symbol.
    pub fn decode(&self, data: &[u8]) -> Result<Vec<u32>> {
        let mut reader = BitReader::new(data);
        let max_len = self.max_code_length() as usize;
        let mut out = Vec::new();

        let mut code = 0u64;
        let mut len = 0usize;
        loop {
            code = (code << 1) | reader.read_bit()? as u64;
            len += 1;
            if len > max_len {
                return Err(JvolError::corrupt(
                    "ac bitstream",
                    format!("no code matches at bit {}", reader.position()),
                ));
            }
            let first = self.first_code[len];
            if code >= first && code - first < self.count[len] {
                let sym = self.values[self.offset[len] + (code - first) as usize];
                if sym == self.eof_symbol {
                    return Ok(out);
                }
                out.push(sym);
                code = 0;
                len = 0;
            }
        }
    }
}

/// Optimal code lengths for `leaves` (`(symbol, frequency)`), in input order.
fn code_lengths(leaves: &[(u32, u64)]) -> Result<Vec<u8>> {
    if leaves.len() == 1 {
        return Ok(vec![1]);
    }

    // Node i < leaves.len() is a leaf; the rest are internal, stored as children.
    let mut children: Vec<(usize, usize)> = Vec::with_capacity(leaves.len());
    let mut heap: BinaryHeap<Reverse<(u64, u64, usize)>> = leaves
        .iter()
        .enumerate()
        .map(|(i, &(symbol, freq))| Reverse((freq, symbol as u64, i)))
        .collect();

    // Internal tie ids sort after every leaf symbol.
    let mut next_tie = 1u64 << 32;
    while heap.len() > 1 {
        let Some(Reverse((fa, _, a))) = heap.pop() else { break };
        let Some(Reverse((fb, _, b))) = heap.pop() else { break };
        let node = leaves.len() + children.len();
        children.push((a, b));
        heap.push(Reverse((fa.saturating_add(fb), next_tie, node)));
        next_tie += 1;
    }
    let Some(Reverse((_, _, root))) = heap.pop() else {
        return Err(JvolError::Usage("empty Huffman alphabet".into()));
    };

    let mut lengths = vec![0u8; leaves.len()];
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        if node < leaves.len() {
            if depth > MAX_CODE_LENGTH as usize {
                return Err(JvolError::Usage(format!(
                    "Huffman code length {depth} exceeds {MAX_CODE_LENGTH}"
                )));
            }
            lengths[node] = depth as u8;
        } else {
            let (a, b) = children[node - leaves.len()];
            stack.push((a, depth + 1));
            stack.push((b, depth + 1));
        }
    }
    Ok(lengths)
}
