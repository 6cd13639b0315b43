//! MSB-first bit packing for the entropy-coded AC payload.
//!
//! Bits fill each byte from the most significant position down. The final
//! byte is padded with zero bits; readers rely on an explicit end-of-stream
//! symbol rather than the byte length to know where the data stops.

use crate::error::{JvolError, Result};

/// Bit-level writer.
#[derive(Debug, Default)]
pub struct BitWriter {
    data: Vec<u8>,
    /// Pending bits, right-aligned; only the low `bits` bits are meaningful.
    acc: u64,
    bits: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u64, count: u8) {
        debug_assert!(count <= 64);
        let mut remaining = count;
        while remaining > 0 {
            let take = remaining.min(8);
            remaining -= take;
            let chunk = (value >> remaining) & ((1u64 << take) - 1);
            self.acc = (self.acc << take) | chunk;
            self.bits += take;
            while self.bits >= 8 {
                self.bits -= 8;
                self.data.push((self.acc >> self.bits) as u8);
            }
            self.acc &= (1u64 << self.bits) - 1;
        }
    }

    /// Number of bits written so far.
    pub fn bit_len(&self) -> u64 {
        self.data.len() as u64 * 8 + self.bits as u64
    }

    /// Flush the partial byte (zero-padded) and return the buffer.
    pub fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.data.push((self.acc << (8 - self.bits)) as u8);
        }
        self.data
    }
}

/// Bit-level reader over a byte slice.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Absolute bit position of the next bit.
    pos: u64,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Read a single bit. Fails when the buffer is exhausted.
    #[inline]
    pub fn read_bit(&mut self) -> Result<u8> {
        let byte = (self.pos / 8) as usize;
        let Some(&b) = self.data.get(byte) else {
            return Err(JvolError::corrupt(
                "ac bitstream",
                format!("ran out of data after {} bits", self.pos),
            ));
        };
        let bit = (b >> (7 - (self.pos % 8) as u8)) & 1;
        self.pos += 1;
        Ok(bit)
    }

    /// Read `count` bits (up to 64) as a right-aligned value.
    pub fn read_bits(&mut self, count: u8) -> Result<u64> {
        debug_assert!(count <= 64);
        let mut value = 0u64;
        for _ in 0..count {
            value = (value << 1) | self.read_bit()? as u64;
        }
        Ok(value)
    }

    /// Bits consumed so far.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Bits left in the buffer, padding included.
    pub fn remaining(&self) -> u64 {
        (self.data.len() as u64 * 8).saturating_sub(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msb_first_packing() {
        let mut w = BitWriter::new();
        w.write_bits(0b1, 1);
        w.write_bits(0b01, 2);
        w.write_bits(0b11111, 5);
        w.write_bits(0b1, 1);
        assert_eq!(w.bit_len(), 9);
        assert_eq!(w.finish(), vec![0b1011_1111, 0b1000_0000]);
    }

    #[test]
    fn wide_values_round_trip() {
        let mut w = BitWriter::new();
        w.write_bits(0xDEAD_BEEF_CAFE, 48);
        w.write_bits(0x5, 3);
        w.write_bits(u64::MAX, 64);
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_bits(48).unwrap(), 0xDEAD_BEEF_CAFE);
        assert_eq!(r.read_bits(3).unwrap(), 0x5);
        assert_eq!(r.read_bits(64).unwrap(), u64::MAX);
        assert_eq!(r.position(), 115);
    }

    #[test]
    fn exhausted_reader_errors() {
        let mut r = BitReader::new(&[0xFF]);
        assert_eq!(r.read_bits(8).unwrap(), 0xFF);
        assert_eq!(r.remaining(), 0);
        assert!(matches!(
            r.read_bit(),
            Err(JvolError::CorruptStream { .. })
        ));
    }

    #[test]
    fn empty_writer_is_empty() {
        assert!(BitWriter::new().finish().is_empty());
    }
}
