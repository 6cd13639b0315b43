//! Narrowest-width storage for integer arrays.
//!
//! Run-length arrays are logically `i64` / `u64`, but their actual range is
//! usually tiny. Before writing, each array is stored with the smallest
//! element type that holds its min and max (unsigned preferred when nothing
//! is negative). Reading widens back to the logical type.

use crate::error::{JvolError, Result};
use crate::volume::Dtype;

/// An array serialized as little-endian elements of `dtype`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedArray {
    pub dtype: Dtype,
    pub bytes: Vec<u8>,
}

impl PackedArray {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.dtype.size()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Smallest integer type holding every value in `min..=max`.
pub fn min_scalar_type(min: i128, max: i128) -> Dtype {
    if min >= 0 {
        if max <= u8::MAX as i128 {
            Dtype::U8
        } else if max <= u16::MAX as i128 {
            Dtype::U16
        } else if max <= u32::MAX as i128 {
            Dtype::U32
        } else {
            Dtype::U64
        }
    } else if min >= i8::MIN as i128 && max <= i8::MAX as i128 {
        Dtype::I8
    } else if min >= i16::MIN as i128 && max <= i16::MAX as i128 {
        Dtype::I16
    } else if min >= i32::MIN as i128 && max <= i32::MAX as i128 {
        Dtype::I32
    } else {
        Dtype::I64
    }
}

fn range<T: Copy + Into<i128>>(values: &[T]) -> (i128, i128) {
    values.iter().fold((0, 0), |(lo, hi), &v| {
        let v: i128 = v.into();
        (lo.min(v), hi.max(v))
    })
}

macro_rules! pack_as {
    ($values:expr, $t:ty) => {{
        let mut bytes = Vec::with_capacity($values.len() * std::mem::size_of::<$t>());
        for &v in $values {
            // Range was checked by `min_scalar_type`.
            bytes.extend_from_slice(&(v as $t).to_le_bytes());
        }
        bytes
    }};
}

/// Pack signed values with the narrowest type.
pub fn pack_i64(values: &[i64]) -> PackedArray {
    let (lo, hi) = range(values);
    let dtype = min_scalar_type(lo, hi);
    let bytes = match dtype {
        Dtype::U8 => pack_as!(values, u8),
        Dtype::U16 => pack_as!(values, u16),
        Dtype::U32 => pack_as!(values, u32),
        Dtype::I8 => pack_as!(values, i8),
        Dtype::I16 => pack_as!(values, i16),
        Dtype::I32 => pack_as!(values, i32),
        _ => pack_as!(values, i64),
    };
    let dtype = if dtype == Dtype::U64 { Dtype::I64 } else { dtype };
    PackedArray { dtype, bytes }
}

/// Pack unsigned values with the narrowest unsigned type.
pub fn pack_u64(values: &[u64]) -> PackedArray {
    let (_, hi) = range(values);
    let dtype = min_scalar_type(0, hi);
    let bytes = match dtype {
        Dtype::U8 => pack_as!(values, u8),
        Dtype::U16 => pack_as!(values, u16),
        Dtype::U32 => pack_as!(values, u32),
        _ => pack_as!(values, u64),
    };
    PackedArray { dtype, bytes }
}

/// Pack unsigned 32-bit values with the narrowest unsigned type.
pub fn pack_u32(values: &[u32]) -> PackedArray {
    let wide: Vec<u64> = values.iter().map(|&v| v as u64).collect();
    pack_u64(&wide)
}

/// Little-endian `f64` array.
pub fn pack_f64(values: &[f64]) -> PackedArray {
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    PackedArray {
        dtype: Dtype::F64,
        bytes,
    }
}

macro_rules! unpack_as {
    ($bytes:expr, $t:ty, $out:ty) => {{
        const N: usize = std::mem::size_of::<$t>();
        $bytes
            .chunks_exact(N)
            .map(|c| {
                let mut buf = [0u8; N];
                buf.copy_from_slice(c);
                <$t>::from_le_bytes(buf) as $out
            })
            .collect::<Vec<$out>>()
    }};
}

fn check_len(field: &'static str, array: &PackedArray) -> Result<()> {
    if array.bytes.len() % array.dtype.size() != 0 {
        return Err(JvolError::format(
            field,
            format!(
                "{} bytes is not a whole number of {} elements",
                array.bytes.len(),
                array.dtype.name()
            ),
        ));
    }
    Ok(())
}

/// Widen a packed integer array to `i64`.
pub fn unpack_i64(field: &'static str, array: &PackedArray) -> Result<Vec<i64>> {
    check_len(field, array)?;
    let b = &array.bytes;
    Ok(match array.dtype {
        Dtype::U8 => unpack_as!(b, u8, i64),
        Dtype::I8 => unpack_as!(b, i8, i64),
        Dtype::U16 => unpack_as!(b, u16, i64),
        Dtype::I16 => unpack_as!(b, i16, i64),
        Dtype::U32 => unpack_as!(b, u32, i64),
        Dtype::I32 => unpack_as!(b, i32, i64),
        Dtype::I64 => unpack_as!(b, i64, i64),
        other => {
            return Err(JvolError::format(
                field,
                format!("{} is not a signed-compatible integer type", other.name()),
            ))
        }
    })
}

/// Widen a packed unsigned array to `u64`.
pub fn unpack_u64(field: &'static str, array: &PackedArray) -> Result<Vec<u64>> {
    check_len(field, array)?;
    let b = &array.bytes;
    Ok(match array.dtype {
        Dtype::U8 => unpack_as!(b, u8, u64),
        Dtype::U16 => unpack_as!(b, u16, u64),
        Dtype::U32 => unpack_as!(b, u32, u64),
        Dtype::U64 => unpack_as!(b, u64, u64),
        other => {
            return Err(JvolError::format(
                field,
                format!("expected an unsigned integer type, found {}", other.name()),
            ))
        }
    })
}

/// Widen a packed unsigned array to `u32`, rejecting values that do not fit.
pub fn unpack_u32(field: &'static str, array: &PackedArray) -> Result<Vec<u32>> {
    unpack_u64(field, array)?
        .into_iter()
        .map(|v| {
            u32::try_from(v).map_err(|_| JvolError::format(field, format!("value {v} exceeds u32")))
        })
        .collect()
}

pub fn unpack_f64(field: &'static str, array: &PackedArray) -> Result<Vec<f64>> {
    if array.dtype != Dtype::F64 {
        return Err(JvolError::format(
            field,
            format!("expected f64 elements, found {}", array.dtype.name()),
        ));
    }
    check_len(field, array)?;
    Ok(unpack_as!(&array.bytes, f64, f64))
}
