//! The fixed set of fields a `.jvol` container holds.
//!
//! One section per field, keyed by the `TAG_*` constants. Integer arrays are
//! stored with their narrowest element type (see [`crate::casting`]); the
//! section's element byte records which one.

use std::io::{Read, Seek, Write};

use crate::casting::{
    pack_f64, pack_i64, pack_u32, pack_u64, unpack_f64, unpack_i64, unpack_u32, unpack_u64,
    PackedArray,
};
use crate::entropy::HuffmanCoding;
use crate::error::JvolError;
use crate::format::*;
use crate::pipeline::EncodedArray;
use crate::quant::QuantizationTable;
use crate::reader::Reader;
use crate::rle::RunLength;
use crate::volume::Dtype;
use crate::writer::Writer;

/// Top three rows of the index-to-RAS affine.
pub type AffineRows = [[f64; 4]; 3];

/// Decoded contents of a `.jvol` container.
#[derive(Debug, Clone, PartialEq)]
pub struct JvolPayload {
    pub ijk_to_ras: AffineRows,
    pub quantization_table: QuantizationTable,
    pub array: EncodedArray,
}

impl JvolPayload {
    /// Write every field as its own section.
    pub fn write_to<W: Write + Seek>(&self, writer: &mut Writer<W>) -> anyhow::Result<()> {
        let array = &self.array;
        let affine: Vec<f64> = self.ijk_to_ras.iter().flatten().copied().collect();
        let block_shape: Vec<u64> = self
            .quantization_table
            .block_shape()
            .iter()
            .map(|&n| n as u64)
            .collect();
        let shape: Vec<u64> = array.shape.iter().map(|&n| n as u64).collect();

        put(writer, TAG_IJK_TO_RAS, pack_f64(&affine))?;
        put(writer, TAG_QUANTIZATION_TABLE, pack_f64(self.quantization_table.divisors()))?;
        put(writer, TAG_BLOCK_SHAPE, wide_u64(&block_shape))?;
        put(writer, TAG_DC_RLE_VALUES, pack_i64(&array.dc.values))?;
        put(writer, TAG_DC_RLE_COUNTS, pack_u64(&array.dc.counts))?;
        put(
            writer,
            TAG_AC_HUFFMAN_EOF_SYMBOL,
            PackedArray {
                dtype: Dtype::U32,
                bytes: array.ac.eof_symbol.to_le_bytes().to_vec(),
            },
        )?;
        put(writer, TAG_AC_HUFFMAN_SYMBOLS_VALUES, pack_i64(&array.ac.symbols_values))?;
        put(writer, TAG_AC_HUFFMAN_SYMBOLS_COUNTS, pack_u64(&array.ac.symbols_counts))?;
        put(
            writer,
            TAG_AC_HUFFMAN_BITSIZES,
            PackedArray {
                dtype: Dtype::U8,
                bytes: array.ac.bitsizes.clone(),
            },
        )?;
        put(writer, TAG_AC_HUFFMAN_VALUES, pack_u32(&array.ac.values))?;
        writer.write_section(TAG_AC_HUFFMAN_DATA, ELEM_BYTES, &array.ac.data)?;
        put(
            writer,
            TAG_DTYPE,
            PackedArray {
                dtype: Dtype::U8,
                bytes: vec![array.dtype.tag()],
            },
        )?;
        put(writer, TAG_INTERCEPT, pack_f64(&[array.intercept]))?;
        put(writer, TAG_SLOPE, pack_f64(&[array.slope]))?;
        put(writer, TAG_SHAPE, wide_u64(&shape))?;
        Ok(())
    }

    /// Read and validate every field.
    pub fn read_from<R: Read + Seek>(reader: &mut Reader<R>) -> anyhow::Result<Self> {
        let affine = exactly::<12, _>(TAG_IJK_TO_RAS, f64_field(reader, TAG_IJK_TO_RAS)?)?;
        let mut ijk_to_ras = [[0.0; 4]; 3];
        for (row, chunk) in ijk_to_ras.iter_mut().zip(affine.chunks_exact(4)) {
            row.copy_from_slice(chunk);
        }

        let block_shape = dims(reader, TAG_BLOCK_SHAPE)?;
        let divisors = f64_field(reader, TAG_QUANTIZATION_TABLE)?;
        let quantization_table = QuantizationTable::new(block_shape, divisors)?;

        let dc = RunLength {
            values: i64_field(reader, TAG_DC_RLE_VALUES)?,
            counts: u64_field(reader, TAG_DC_RLE_COUNTS)?,
        };

        let [eof_symbol] = exactly::<1, _>(
            TAG_AC_HUFFMAN_EOF_SYMBOL,
            u32_field(reader, TAG_AC_HUFFMAN_EOF_SYMBOL)?,
        )?;
        let bitsizes = get(reader, TAG_AC_HUFFMAN_BITSIZES)?;
        if bitsizes.dtype != Dtype::U8 {
            return Err(JvolError::format(
                tag_name(TAG_AC_HUFFMAN_BITSIZES),
                format!("expected u8 code lengths, found {}", bitsizes.dtype.name()),
            )
            .into());
        }
        let ac = HuffmanCoding {
            eof_symbol,
            symbols_values: i64_field(reader, TAG_AC_HUFFMAN_SYMBOLS_VALUES)?,
            symbols_counts: u64_field(reader, TAG_AC_HUFFMAN_SYMBOLS_COUNTS)?,
            bitsizes: bitsizes.bytes,
            values: u32_field(reader, TAG_AC_HUFFMAN_VALUES)?,
            data: section(reader, TAG_AC_HUFFMAN_DATA)?.1,
        };

        let dtype_section = get(reader, TAG_DTYPE)?;
        let dtype = match dtype_section.bytes.as_slice() {
            [tag] => Dtype::from_tag(*tag).ok_or_else(|| {
                JvolError::format(tag_name(TAG_DTYPE), format!("unknown element type tag {tag}"))
            })?,
            other => {
                return Err(JvolError::format(
                    tag_name(TAG_DTYPE),
                    format!("expected one byte, found {}", other.len()),
                )
                .into())
            }
        };

        let [intercept] = exactly::<1, _>(TAG_INTERCEPT, f64_field(reader, TAG_INTERCEPT)?)?;
        let [slope] = exactly::<1, _>(TAG_SLOPE, f64_field(reader, TAG_SLOPE)?)?;
        let shape = dims(reader, TAG_SHAPE)?;

        Ok(Self {
            ijk_to_ras,
            quantization_table,
            array: EncodedArray {
                dc,
                ac,
                dtype,
                intercept,
                slope,
                shape,
            },
        })
    }
}

fn put<W: Write + Seek>(
    writer: &mut Writer<W>,
    tag: u16,
    array: PackedArray,
) -> anyhow::Result<()> {
    writer.write_section(tag, array.dtype.tag(), &array.bytes)
}

fn wide_u64(values: &[u64]) -> PackedArray {
    PackedArray {
        dtype: Dtype::U64,
        bytes: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
    }
}

fn f64_field<R: Read + Seek>(reader: &mut Reader<R>, tag: u16) -> anyhow::Result<Vec<f64>> {
    Ok(unpack_f64(tag_name(tag), &get(reader, tag)?)?)
}

fn i64_field<R: Read + Seek>(reader: &mut Reader<R>, tag: u16) -> anyhow::Result<Vec<i64>> {
    Ok(unpack_i64(tag_name(tag), &get(reader, tag)?)?)
}

fn u64_field<R: Read + Seek>(reader: &mut Reader<R>, tag: u16) -> anyhow::Result<Vec<u64>> {
    Ok(unpack_u64(tag_name(tag), &get(reader, tag)?)?)
}

fn u32_field<R: Read + Seek>(reader: &mut Reader<R>, tag: u16) -> anyhow::Result<Vec<u32>> {
    Ok(unpack_u32(tag_name(tag), &get(reader, tag)?)?)
}

fn section<R: Read + Seek>(reader: &mut Reader<R>, tag: u16) -> anyhow::Result<(u8, Vec<u8>)> {
    if reader.entry(tag).is_none() {
        return Err(JvolError::format(tag_name(tag), "section is missing").into());
    }
    reader.read_section(tag)
}

/// Read a typed section.
fn get<R: Read + Seek>(reader: &mut Reader<R>, tag: u16) -> anyhow::Result<PackedArray> {
    let (elem, bytes) = section(reader, tag)?;
    let dtype = Dtype::from_tag(elem).ok_or_else(|| {
        JvolError::format(tag_name(tag), format!("unknown element type tag {elem}"))
    })?;
    Ok(PackedArray { dtype, bytes })
}

fn exactly<const N: usize, T: std::fmt::Debug>(tag: u16, values: Vec<T>) -> anyhow::Result<[T; N]> {
    let len = values.len();
    values.try_into().map_err(|_| {
        JvolError::format(tag_name(tag), format!("expected {N} elements, found {len}")).into()
    })
}

fn dims<R: Read + Seek>(reader: &mut Reader<R>, tag: u16) -> anyhow::Result<[usize; 3]> {
    let wide = exactly::<3, _>(tag, u64_field(reader, tag)?)?;
    let mut out = [0usize; 3];
    for (dst, &n) in out.iter_mut().zip(&wide) {
        *dst = usize::try_from(n).map_err(|_| {
            JvolError::format(tag_name(tag), format!("dimension {n} does not fit in memory"))
        })?;
    }
    Ok(out)
}
