// Validators - one pure check per constraint kind
//
// Each validator takes the parameter name (for messages), the value, its
// declared constraint and, for shapes, the call's ShapeBinding. It returns
// Ok(()) or the one error describing the first violation it found.
//
// `check_constraints` runs them in the fixed order
//
//   type -> dtype -> shape -> range
//
// and stops at the first failure. Later checks rely on earlier ones: shape
// and range only make sense once the value is known to be an array.

use crate::constraint::{ConstraintSet, Range};
use crate::dtype::ElementType;
use crate::error::{Error, Result};
use crate::handle::{Family, TensorHandle, Value};
use crate::shape::Shape;
use crate::symbolic::{ShapeBinding, SymbolicShape};

/// The value must be an array of a supported family, and of `family` if given.
pub fn check_type<'a>(
    name: &str,
    value: &Value<'a>,
    family: Option<Family>,
) -> Result<&'a dyn TensorHandle> {
    let handle = value.as_tensor().ok_or_else(|| Error::UnsupportedType {
        name: name.to_string(),
        family: value.family_name(),
    })?;
    if let Some(expected) = family {
        let actual = handle.family();
        if actual != expected {
            return Err(Error::FamilyMismatch {
                name: name.to_string(),
                actual,
                expected,
            });
        }
    }
    Ok(handle)
}

/// Element type must equal `expected`, including its family.
pub fn check_dtype(name: &str, handle: &dyn TensorHandle, expected: &ElementType) -> Result<()> {
    let actual = handle.element_type();
    if actual != *expected {
        return Err(Error::DTypeMismatch {
            name: name.to_string(),
            actual,
            expected: *expected,
        });
    }
    Ok(())
}

/// Shape must match `declared` once its names are resolved against `binding`.
///
/// Unseen names are bound to the size observed here. A rank mismatch is
/// reported before any dimension; otherwise the first differing dimension is
/// reported and the rest are not looked at.
pub fn check_shape(
    name: &str,
    actual: &Shape,
    declared: &SymbolicShape,
    binding: &mut ShapeBinding,
) -> Result<()> {
    let resolved = declared.resolve_and_bind(actual, binding);
    let expected = match resolved.to_shape() {
        Some(shape) if shape.rank() == actual.rank() => shape,
        _ => {
            return Err(Error::RankMismatch {
                name: name.to_string(),
                actual: actual.clone(),
                expected: resolved,
            })
        }
    };

    for (d, (&got, &want)) in actual.dims().iter().zip(expected.dims()).enumerate() {
        if got != want {
            return Err(Error::DimMismatch {
                name: name.to_string(),
                dim: d,
                actual: actual.clone(),
                spec: declared.dims()[d].clone(),
                resolved: want,
            });
        }
    }
    Ok(())
}

/// Every element must lie in the inclusive `range`. The lower bound is
/// checked first, so a value violating both reports only the lower bound.
/// A NaN element fails the lower bound.
pub fn check_range(name: &str, handle: &dyn TensorHandle, range: &Range) -> Result<()> {
    let min = handle.min();
    if min.is_nan() || min < range.min {
        return Err(Error::LowerBound {
            name: name.to_string(),
            value: min,
            min: range.min,
        });
    }
    let max = handle.max();
    if max.is_nan() || max > range.max {
        return Err(Error::UpperBound {
            name: name.to_string(),
            value: max,
            max: range.max,
        });
    }
    Ok(())
}

/// Run every declared check on `value` in order, stopping at the first failure.
pub fn check_constraints(
    name: &str,
    value: &Value<'_>,
    constraints: &ConstraintSet,
    binding: &mut ShapeBinding,
) -> Result<()> {
    let handle = check_type(name, value, constraints.family)?;
    if let Some(dtype) = &constraints.dtype {
        check_dtype(name, handle, dtype)?;
    }
    if let Some(shape) = &constraints.shape {
        check_shape(name, &handle.shape(), shape, binding)?;
    }
    if let Some(range) = &constraints.range {
        check_range(name, handle, range)?;
    }
    log::trace!("/{name}/ satisfies {constraints}");
    Ok(())
}
