//! Typed 3D sample buffers.
//!
//! A [`Volume`] owns a C-order buffer (last axis fastest) of a single element
//! type. The element type is carried as a [`Dtype`] tag so that decode can
//! restore it verbatim.

use crate::error::{JvolError, Result};

/// Element type of a volume, as stored in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl Dtype {
    /// Stable on-disk tag.
    pub fn tag(self) -> u8 {
        match self {
            Dtype::U8 => 1,
            Dtype::I8 => 2,
            Dtype::U16 => 3,
            Dtype::I16 => 4,
            Dtype::U32 => 5,
            Dtype::I32 => 6,
            Dtype::U64 => 7,
            Dtype::I64 => 8,
            Dtype::F32 => 9,
            Dtype::F64 => 10,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            1 => Dtype::U8,
            2 => Dtype::I8,
            3 => Dtype::U16,
            4 => Dtype::I16,
            5 => Dtype::U32,
            6 => Dtype::I32,
            7 => Dtype::U64,
            8 => Dtype::I64,
            9 => Dtype::F32,
            10 => Dtype::F64,
            _ => return None,
        })
    }

    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            Dtype::U8 | Dtype::I8 => 1,
            Dtype::U16 | Dtype::I16 => 2,
            Dtype::U32 | Dtype::I32 | Dtype::F32 => 4,
            Dtype::U64 | Dtype::I64 | Dtype::F64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Dtype::F32 | Dtype::F64)
    }

    pub fn name(self) -> &'static str {
        match self {
            Dtype::U8 => "u8",
            Dtype::I8 => "i8",
            Dtype::U16 => "u16",
            Dtype::I16 => "i16",
            Dtype::U32 => "u32",
            Dtype::I32 => "i32",
            Dtype::U64 => "u64",
            Dtype::I64 => "i64",
            Dtype::F32 => "f32",
            Dtype::F64 => "f64",
        }
    }
}

/// Owned sample storage, one variant per [`Dtype`].
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeData {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    U64(Vec<u64>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! with_samples {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            VolumeData::U8($v) => $body,
            VolumeData::I8($v) => $body,
            VolumeData::U16($v) => $body,
            VolumeData::I16($v) => $body,
            VolumeData::U32($v) => $body,
            VolumeData::I32($v) => $body,
            VolumeData::U64($v) => $body,
            VolumeData::I64($v) => $body,
            VolumeData::F32($v) => $body,
            VolumeData::F64($v) => $body,
        }
    };
}

impl VolumeData {
    pub fn dtype(&self) -> Dtype {
        match self {
            VolumeData::U8(_) => Dtype::U8,
            VolumeData::I8(_) => Dtype::I8,
            VolumeData::U16(_) => Dtype::U16,
            VolumeData::I16(_) => Dtype::I16,
            VolumeData::U32(_) => Dtype::U32,
            VolumeData::I32(_) => Dtype::I32,
            VolumeData::U64(_) => Dtype::U64,
            VolumeData::I64(_) => Dtype::I64,
            VolumeData::F32(_) => Dtype::F32,
            VolumeData::F64(_) => Dtype::F64,
        }
    }

    pub fn len(&self) -> usize {
        with_samples!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widen every sample to `f64`.
    pub fn to_f64(&self) -> Vec<f64> {
        with_samples!(self, v => v.iter().map(|&x| Element::to_f64(x)).collect())
    }

    /// Narrow `f64` samples into `dtype`. Integers are rounded to nearest
    /// (ties away from zero) and saturate at the type bounds.
    pub fn from_f64(dtype: Dtype, samples: &[f64]) -> Self {
        fn cast<T: Element>(samples: &[f64]) -> Vec<T> {
            samples.iter().map(|&x| T::from_f64(x)).collect()
        }
        match dtype {
            Dtype::U8 => VolumeData::U8(cast(samples)),
            Dtype::I8 => VolumeData::I8(cast(samples)),
            Dtype::U16 => VolumeData::U16(cast(samples)),
            Dtype::I16 => VolumeData::I16(cast(samples)),
            Dtype::U32 => VolumeData::U32(cast(samples)),
            Dtype::I32 => VolumeData::I32(cast(samples)),
            Dtype::U64 => VolumeData::U64(cast(samples)),
            Dtype::I64 => VolumeData::I64(cast(samples)),
            Dtype::F32 => VolumeData::F32(cast(samples)),
            Dtype::F64 => VolumeData::F64(cast(samples)),
        }
    }
}

/// Scalar types a [`Volume`] can hold.
pub trait Element: Copy + Send + Sync + 'static {
    const DTYPE: Dtype;

    fn to_f64(self) -> f64;

    fn from_f64(value: f64) -> Self;

    fn into_data(samples: Vec<Self>) -> VolumeData;

    fn slice(data: &VolumeData) -> Option<&[Self]>;
}

macro_rules! impl_element {
    (@impl $t:ty, $variant:ident, $from:expr) => {
        impl Element for $t {
            const DTYPE: Dtype = Dtype::$variant;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                ($from)(value)
            }

            fn into_data(samples: Vec<Self>) -> VolumeData {
                VolumeData::$variant(samples)
            }

            fn slice(data: &VolumeData) -> Option<&[Self]> {
                match data {
                    VolumeData::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
    ($t:ty, $variant:ident, round) => {
        impl_element!(@impl $t, $variant, |v: f64| v.round() as $t);
    };
    ($t:ty, $variant:ident, float) => {
        impl_element!(@impl $t, $variant, |v: f64| v as $t);
    };
}

impl_element!(u8, U8, round);
impl_element!(i8, I8, round);
impl_element!(u16, U16, round);
impl_element!(i16, I16, round);
impl_element!(u32, U32, round);
impl_element!(i32, I32, round);
impl_element!(u64, U64, round);
impl_element!(i64, I64, round);
impl_element!(f32, F32, float);
impl_element!(f64, F64, float);

/// A 3D scalar volume in C order.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    shape: [usize; 3],
    data: VolumeData,
}

impl Volume {
    /// Wrap `samples` as a volume of `shape`.
    pub fn new<T: Element>(shape: [usize; 3], samples: Vec<T>) -> Result<Self> {
        Self::from_data(shape, T::into_data(samples))
    }

    pub fn from_data(shape: [usize; 3], data: VolumeData) -> Result<Self> {
        check_shape(shape)?;
        let expected = shape.iter().product::<usize>();
        if data.len() != expected {
            return Err(JvolError::InvalidShape {
                shape,
                reason: format!("expected {} samples, got {}", expected, data.len()),
            });
        }
        Ok(Self { shape, data })
    }

    /// Build a volume from a generator over `(i, j, k)` indices.
    pub fn from_fn<T: Element>(
        shape: [usize; 3],
        mut f: impl FnMut(usize, usize, usize) -> T,
    ) -> Result<Self> {
        check_shape(shape)?;
        let mut samples = Vec::with_capacity(shape.iter().product());
        for i in 0..shape[0] {
            for j in 0..shape[1] {
                for k in 0..shape[2] {
                    samples.push(f(i, j, k));
                }
            }
        }
        Self::new(shape, samples)
    }

    #[inline]
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    #[inline]
    pub fn dtype(&self) -> Dtype {
        self.data.dtype()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &VolumeData {
        &self.data
    }

    pub fn into_data(self) -> VolumeData {
        self.data
    }

    /// Borrow the samples as `T`, if `T` is the volume's element type.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }

    pub fn to_f64(&self) -> Vec<f64> {
        self.data.to_f64()
    }

    /// Sample at `(i, j, k)` widened to `f64`.
    pub fn get_f64(&self, index: [usize; 3]) -> Option<f64> {
        if index.iter().zip(self.shape.iter()).any(|(&i, &n)| i >= n) {
            return None;
        }
        let flat = (index[0] * self.shape[1] + index[1]) * self.shape[2] + index[2];
        Some(with_samples!(&self.data, v => Element::to_f64(v[flat])))
    }

    /// Smallest and largest sample, ignoring NaN. `None` if no finite sample exists.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        with_samples!(&self.data, v => {
            v.iter()
                .map(|&x| Element::to_f64(x))
                .filter(|x| !x.is_nan())
                .fold(None, |acc, x| match acc {
                    None => Some((x, x)),
                    Some((lo, hi)) => Some((f64::min(lo, x), f64::max(hi, x))),
                })
        })
    }
}

fn check_shape(shape: [usize; 3]) -> Result<()> {
    if shape.iter().any(|&n| n == 0) {
        return Err(JvolError::InvalidShape {
            shape,
            reason: "every dimension must be positive".into(),
        });
    }
    Ok(())
}
