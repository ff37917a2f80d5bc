use std::fmt;
use std::str::FromStr;

use crate::dtype::ElementType;
use crate::error::{Error, Result};
use crate::shape::Shape;

// TensorHandle - the one surface validators are written against
//
// Two array families exist and they share no base type:
//
//   ndarray::ArrayBase - generic over its element; element type is sampled
//   Tensor             - dense storage with an intrinsic DType tag
//
// Each implements the same four questions (shape, element type, min, max)
// plus which family it belongs to. Validators only ever see
// `&dyn TensorHandle`.
//
// Values that are not arrays at all still reach the validators, wrapped as
// `Value::Other`, so the type check can reject them with a proper error.

/// The concrete representation kind of an array value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// `ndarray::ArrayBase` of any storage and dimensionality.
    NdArray,
    /// The tag-typed [`Tensor`](crate::Tensor).
    Tensor,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::NdArray => write!(f, "ndarray"),
            Family::Tensor => write!(f, "tensor"),
        }
    }
}

impl FromStr for Family {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ndarray" | "ndarray::ArrayD" | "np.ndarray" => Ok(Family::NdArray),
            "tensor" | "Tensor" | "torch.Tensor" => Ok(Family::Tensor),
            other => crate::bail!("{other} is not a supported tensor type"),
        }
    }
}

/// Read-only view over an array value, as seen by the validators.
pub trait TensorHandle {
    /// Which family backs this value.
    fn family(&self) -> Family;

    /// Ordered dimension sizes.
    fn shape(&self) -> Shape;

    /// Family-specific element type descriptor.
    fn element_type(&self) -> ElementType;

    /// Smallest element as f64. NaN if any element is NaN, +inf if empty.
    ///
    /// Integers wider than 53 bits are rounded to the nearest f64, so a
    /// range check on i64/u64 data is only exact up to 2^53.
    fn min(&self) -> f64;

    /// Largest element as f64. NaN if any element is NaN, -inf if empty.
    /// Rounded like [`min`](TensorHandle::min).
    fn max(&self) -> f64;
}

/// One argument (or return value) handed to a validation session.
#[derive(Clone, Copy)]
pub enum Value<'a> {
    /// An array of a supported family.
    Tensor(&'a dyn TensorHandle),
    /// Anything else, remembered by its type name.
    Other(&'static str),
}

impl<'a> Value<'a> {
    /// Wrap a non-array value.
    pub fn other<T: ?Sized>(_value: &T) -> Value<'static> {
        Value::Other(std::any::type_name::<T>())
    }

    /// The array view, if this is an array.
    pub fn as_tensor(&self) -> Option<&'a dyn TensorHandle> {
        match self {
            Value::Tensor(t) => Some(*t),
            Value::Other(_) => None,
        }
    }

    /// Human-readable family name, used in type errors.
    pub fn family_name(&self) -> String {
        match self {
            Value::Tensor(t) => t.family().to_string(),
            Value::Other(name) => (*name).to_string(),
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Tensor(t) => write!(
                f,
                "Value::Tensor(family={}, shape={}, dtype={})",
                t.family(),
                t.shape(),
                t.element_type()
            ),
            Value::Other(name) => write!(f, "Value::Other({name})"),
        }
    }
}

impl<'a, T: TensorHandle> From<&'a T> for Value<'a> {
    fn from(t: &'a T) -> Self {
        Value::Tensor(t)
    }
}

/// Conversion of a computation's result into a [`Value`] for return checks.
pub trait AsValue {
    fn as_value(&self) -> Value<'_>;
}

impl AsValue for () {
    fn as_value(&self) -> Value<'_> {
        Value::Other("()")
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_value(&self) -> Value<'_> {
        match self {
            Some(v) => v.as_value(),
            None => Value::Other(std::any::type_name::<Option<T>>()),
        }
    }
}

impl AsValue for Value<'_> {
    fn as_value(&self) -> Value<'_> {
        *self
    }
}

// Reductions shared by both families. NaN is sticky, like numpy's min/max.

pub(crate) fn nan_min(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::INFINITY, |acc, x| {
        if acc.is_nan() || x.is_nan() {
            f64::NAN
        } else {
            acc.min(x)
        }
    })
}

pub(crate) fn nan_max(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, |acc, x| {
        if acc.is_nan() || x.is_nan() {
            f64::NAN
        } else {
            acc.max(x)
        }
    })
}
