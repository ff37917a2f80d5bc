use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::handle::Family;
use crate::tensor::Storage;

// Element types of the two array families
//
// The two families describe their elements differently:
//
//   ndarray family - an array is generic over its Rust element type, so the
//                    element type is read off a sampled element as a
//                    ScalarType (u8, f64, ...).
//   tensor family  - the Tensor carries an intrinsic DType tag next to its
//                    storage, exactly like a torch tensor does.
//
// ElementType wraps either descriptor. Comparing descriptors of different
// families is always a mismatch, never a coercion.

/// Intrinsic type of a single scalar sampled from an ndarray array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F16,
    BF16,
    F32,
    F64,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScalarType::Bool => "bool",
            ScalarType::I8 => "i8",
            ScalarType::I16 => "i16",
            ScalarType::I32 => "i32",
            ScalarType::I64 => "i64",
            ScalarType::U8 => "u8",
            ScalarType::U16 => "u16",
            ScalarType::U32 => "u32",
            ScalarType::U64 => "u64",
            ScalarType::F16 => "f16",
            ScalarType::BF16 => "bf16",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ScalarType {
    type Err = Error;

    /// Accepts Rust spellings (`u8`, `f64`) and numpy spellings (`uint8`,
    /// `float64`). Plain `float` and `int` follow numpy: f64 and i64.
    fn from_str(s: &str) -> Result<Self> {
        let t = match s {
            "bool" | "bool_" => ScalarType::Bool,
            "i8" | "int8" => ScalarType::I8,
            "i16" | "int16" => ScalarType::I16,
            "i32" | "int32" => ScalarType::I32,
            "i64" | "int64" | "int" => ScalarType::I64,
            "u8" | "uint8" => ScalarType::U8,
            "u16" | "uint16" => ScalarType::U16,
            "u32" | "uint32" => ScalarType::U32,
            "u64" | "uint64" => ScalarType::U64,
            "f16" | "float16" | "half" => ScalarType::F16,
            "bf16" | "bfloat16" => ScalarType::BF16,
            "f32" | "float32" | "single" => ScalarType::F32,
            "f64" | "float64" | "float" | "double" => ScalarType::F64,
            other => crate::bail!("{other} is not a known scalar type"),
        };
        Ok(t)
    }
}

/// Intrinsic whole-array type tag of a [`Tensor`](crate::Tensor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F16,
    BF16,
    F32,
    F64,
    U8,
    U32,
    I64,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::F16 => "f16",
            DType::BF16 => "bf16",
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::U8 => "u8",
            DType::U32 => "u32",
            DType::I64 => "i64",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for DType {
    type Err = Error;

    /// Accepts the short tags (`f32`) and torch spellings. Plain `float`
    /// follows torch, where it means f32, and `long` means i64.
    fn from_str(s: &str) -> Result<Self> {
        let t = match s {
            "f16" | "float16" | "half" => DType::F16,
            "bf16" | "bfloat16" => DType::BF16,
            "f32" | "float32" | "float" => DType::F32,
            "f64" | "float64" | "double" => DType::F64,
            "u8" | "uint8" => DType::U8,
            "u32" | "uint32" => DType::U32,
            "i64" | "int64" | "long" => DType::I64,
            other => crate::bail!("{other} is not a known tensor dtype"),
        };
        Ok(t)
    }
}

/// A family-specific element type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Type of a sampled ndarray scalar.
    Scalar(ScalarType),
    /// Tensor dtype tag.
    Tag(DType),
}

impl ElementType {
    /// The family this descriptor is meaningful in.
    pub fn family(&self) -> Family {
        match self {
            ElementType::Scalar(_) => Family::NdArray,
            ElementType::Tag(_) => Family::Tensor,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Scalar(s) => write!(f, "{s}"),
            ElementType::Tag(d) => write!(f, "tensor.{d}"),
        }
    }
}

impl FromStr for ElementType {
    type Err = Error;

    /// `"tensor.<tag>"` names a tensor dtype, anything else a scalar type.
    fn from_str(s: &str) -> Result<Self> {
        match s.strip_prefix("tensor.") {
            Some(tag) => Ok(ElementType::Tag(tag.parse()?)),
            None => Ok(ElementType::Scalar(s.parse()?)),
        }
    }
}

impl From<ScalarType> for ElementType {
    fn from(s: ScalarType) -> Self {
        ElementType::Scalar(s)
    }
}

impl From<DType> for ElementType {
    fn from(d: DType) -> Self {
        ElementType::Tag(d)
    }
}

// Element - Rust scalars that can live in an ndarray array
//
// `scalar_type(&self)` is asked of a sampled element. Every impl answers with
// its static SCALAR_TYPE; the static value is also the answer for arrays that
// have no element to sample.

/// A Rust scalar type that can be validated inside an ndarray array.
pub trait Element: Copy + Send + Sync + 'static + fmt::Debug {
    /// The scalar type every value of `Self` reports.
    const SCALAR_TYPE: ScalarType;

    /// Intrinsic type of this value.
    fn scalar_type(&self) -> ScalarType {
        Self::SCALAR_TYPE
    }

    /// Widen to f64 for range reductions.
    fn to_f64(self) -> f64;
}

macro_rules! impl_element {
    ($($ty:ty => $st:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const SCALAR_TYPE: ScalarType = ScalarType::$st;
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_element!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
);

impl Element for bool {
    const SCALAR_TYPE: ScalarType = ScalarType::Bool;
    fn to_f64(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }
}

impl Element for half::f16 {
    const SCALAR_TYPE: ScalarType = ScalarType::F16;
    fn to_f64(self) -> f64 {
        f64::from(self.to_f32())
    }
}

impl Element for half::bf16 {
    const SCALAR_TYPE: ScalarType = ScalarType::BF16;
    fn to_f64(self) -> f64 {
        f64::from(self.to_f32())
    }
}

// WithDType - Rust scalars that can back a Tensor's storage

/// Trait implemented by Rust types that can be stored in a [`Tensor`](crate::Tensor).
///
/// Provides the mapping between the concrete Rust type and the DType tag,
/// plus conversion from f64 for the generic constructors.
pub trait WithDType: Element + num_traits::NumCast {
    /// The corresponding DType tag.
    const DTYPE: DType;

    /// Create a value of this type from f64 (saturating for integers).
    fn from_f64(v: f64) -> Self;

    /// Move a vec of this type into tagged storage.
    fn into_storage(data: Vec<Self>) -> Storage;
}

macro_rules! impl_with_dtype_cast {
    ($($ty:ty => $dt:ident),* $(,)?) => {
        $(
            impl WithDType for $ty {
                const DTYPE: DType = DType::$dt;
                fn from_f64(v: f64) -> Self {
                    v as $ty
                }
                fn into_storage(data: Vec<Self>) -> Storage {
                    Storage::$dt(data)
                }
            }
        )*
    };
}

impl_with_dtype_cast!(f32 => F32, f64 => F64, u8 => U8, u32 => U32, i64 => I64);

impl WithDType for half::f16 {
    const DTYPE: DType = DType::F16;
    fn from_f64(v: f64) -> Self {
        half::f16::from_f64(v)
    }
    fn into_storage(data: Vec<Self>) -> Storage {
        Storage::F16(data)
    }
}

impl WithDType for half::bf16 {
    const DTYPE: DType = DType::BF16;
    fn from_f64(v: f64) -> Self {
        half::bf16::from_f64(v)
    }
    fn into_storage(data: Vec<Self>) -> Storage {
        Storage::BF16(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_type_of_sampled_value() {
        assert_eq!(7u8.scalar_type(), ScalarType::U8);
        assert_eq!(0.5f64.scalar_type(), ScalarType::F64);
        assert_eq!(half::f16::from_f32(1.0).scalar_type(), ScalarType::F16);
        assert_eq!(true.scalar_type(), ScalarType::Bool);
    }

    #[test]
    fn test_float_aliases_differ_between_families() {
        // numpy's float is f64, torch's float is f32
        assert_eq!("float".parse::<ScalarType>().unwrap(), ScalarType::F64);
        assert_eq!("float".parse::<DType>().unwrap(), DType::F32);
    }

    #[test]
    fn test_element_type_parse_and_display() {
        let s: ElementType = "uint8".parse().unwrap();
        assert_eq!(s, ElementType::Scalar(ScalarType::U8));
        assert_eq!(s.to_string(), "u8");

        let t: ElementType = "tensor.f32".parse().unwrap();
        assert_eq!(t, ElementType::Tag(DType::F32));
        assert_eq!(t.to_string(), "tensor.f32");
        assert_eq!(t.family(), Family::Tensor);
    }

    #[test]
    fn test_unknown_dtype_is_annotation_error() {
        let err = "complex64".parse::<ElementType>().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Annotation);
        assert!("tensor.i8".parse::<ElementType>().is_err());
    }

    #[test]
    fn test_with_dtype_saturates() {
        assert_eq!(u8::from_f64(300.0), 255);
        assert_eq!(u8::from_f64(-3.0), 0);
        assert_eq!(f32::DTYPE, DType::F32);
    }
}
