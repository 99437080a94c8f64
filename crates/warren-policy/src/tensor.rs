//! Backend-neutral tensors passed into and out of a session.

use smallvec::SmallVec;
use std::fmt;

/// Tensor dimensions. `-1` or `0` in a declared shape marks a dynamic
/// dimension.
pub type Shape = SmallVec<[i64; 4]>;

/// Element storage for a [`Tensor`].
#[derive(Clone, Debug, PartialEq)]
pub enum TensorData {
    /// 32-bit floats.
    F32(Vec<f32>),
    /// 64-bit floats.
    F64(Vec<f64>),
    /// Signed 8-bit integers.
    I8(Vec<i8>),
    /// Signed 16-bit integers.
    I16(Vec<i16>),
    /// Signed 32-bit integers.
    I32(Vec<i32>),
    /// Signed 64-bit integers.
    I64(Vec<i64>),
    /// Unsigned 8-bit integers.
    U8(Vec<u8>),
    /// Unsigned 16-bit integers.
    U16(Vec<u16>),
    /// Unsigned 32-bit integers.
    U32(Vec<u32>),
    /// Booleans. Not numeric scores.
    Bool(Vec<bool>),
    /// Strings. Not numeric scores.
    Str(Vec<String>),
}

impl TensorData {
    /// Element type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
            Self::I8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::Str(v) => v.len(),
        }
    }

    /// Whether there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric scores as `f32`, or `None` for non-numeric data.
    pub fn to_f32(&self) -> Option<Vec<f32>> {
        fn cast<T: Copy>(v: &[T], f: impl Fn(T) -> f32) -> Option<Vec<f32>> {
            Some(v.iter().map(|&x| f(x)).collect())
        }
        match self {
            Self::F32(v) => Some(v.clone()),
            Self::F64(v) => cast(v, |x| x as f32),
            Self::I8(v) => cast(v, f32::from),
            Self::I16(v) => cast(v, f32::from),
            Self::I32(v) => cast(v, |x| x as f32),
            Self::I64(v) => cast(v, |x| x as f32),
            Self::U8(v) => cast(v, f32::from),
            Self::U16(v) => cast(v, f32::from),
            Self::U32(v) => cast(v, |x| x as f32),
            Self::Bool(_) | Self::Str(_) => None,
        }
    }
}

/// A shaped, typed buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    /// Dimensions, row-major.
    pub shape: Shape,
    /// Elements.
    pub data: TensorData,
}

impl Tensor {
    /// An `f32` tensor.
    pub fn f32(shape: &[i64], data: Vec<f32>) -> Self {
        Self {
            shape: Shape::from_slice(shape),
            data: TensorData::F32(data),
        }
    }
}

/// One model output.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A tensor.
    Tensor(Tensor),
    /// Something else (a sequence, a map), described by name.
    Opaque(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tensor(t) => write!(f, "{} tensor {:?}", t.data.type_name(), t.shape.as_slice()),
            Self::Opaque(kind) => f.write_str(kind),
        }
    }
}

/// Product of `dims`, or `None` if any is dynamic.
pub fn static_len(dims: &[i64]) -> Option<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| (d > 0).then(|| acc.checked_mul(d as usize)).flatten())
}
