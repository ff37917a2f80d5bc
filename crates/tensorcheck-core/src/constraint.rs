use std::fmt;

use crate::dtype::ElementType;
use crate::error::Result;
use crate::handle::Family;
use crate::symbolic::{SymDim, SymbolicShape};

/// Inclusive value range, compared as f64.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Range { min, max }
    }

    /// Bounds must be ordered and not NaN. Infinite bounds are allowed and
    /// mean "unbounded on that side".
    pub fn validate(&self) -> Result<()> {
        if self.min.is_nan() || self.max.is_nan() {
            crate::bail!("range [{}, {}] has a NaN bound", self.min, self.max);
        }
        if self.min > self.max {
            crate::bail!(
                "range min {} is greater than range max {}",
                self.min,
                self.max
            );
        }
        Ok(())
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// The declared contract for one parameter or for the return value.
///
/// Every field is optional; an empty set still requires the value to be an
/// array of a supported family.
///
/// # Example
/// ```
/// use tensorcheck_core::{dims, ConstraintSet, Family, ScalarType};
///
/// let img = ConstraintSet::new()
///     .family(Family::NdArray)
///     .dtype(ScalarType::U8)
///     .shape(dims![1, 3, "H", "W"])
///     .range(0.0, 255.0);
/// assert_eq!(img.to_string(), "type=ndarray dtype=u8 shape=[1, 3, H, W] range=[0, 255]");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    pub family: Option<Family>,
    pub dtype: Option<ElementType>,
    pub shape: Option<SymbolicShape>,
    pub range: Option<Range>,
}

impl ConstraintSet {
    /// An empty (unconstrained) set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a specific array family.
    pub fn family(mut self, family: Family) -> Self {
        self.family = Some(family);
        self
    }

    /// Require a specific element type.
    pub fn dtype(mut self, dtype: impl Into<ElementType>) -> Self {
        self.dtype = Some(dtype.into());
        self
    }

    /// Require a shape; names are resolved per call.
    pub fn shape(mut self, shape: impl Into<SymbolicShape>) -> Self {
        self.shape = Some(shape.into());
        self
    }

    /// Require every element to lie within `[min, max]`.
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.range = Some(Range::new(min, max));
        self
    }

    /// Whether no field is constrained.
    pub fn is_empty(&self) -> bool {
        self.family.is_none() && self.dtype.is_none() && self.shape.is_none() && self.range.is_none()
    }

    /// Structural checks run once when the contract is built.
    pub fn validate(&self) -> Result<()> {
        if let Some(shape) = &self.shape {
            for dim in shape.dims() {
                if let SymDim::Symbolic(name) = dim {
                    if name.trim().is_empty() {
                        crate::bail!("empty symbolic dimension name in shape annotation {shape}");
                    }
                }
            }
        }
        if let Some(range) = &self.range {
            range.validate()?;
        }
        Ok(())
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(family) = &self.family {
            parts.push(format!("type={family}"));
        }
        if let Some(dtype) = &self.dtype {
            parts.push(format!("dtype={dtype}"));
        }
        if let Some(shape) = &self.shape {
            parts.push(format!("shape={shape}"));
        }
        if let Some(range) = &self.range {
            parts.push(format!("range={range}"));
        }
        if parts.is_empty() {
            write!(f, "any")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}
