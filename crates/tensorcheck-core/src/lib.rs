//! # tensorcheck-core
//!
//! Call-time contract checking for n-dimensional arrays.
//!
//! This crate provides:
//! - [`ConstraintSet`] / [`AnnotationSpec`] - declared contracts per parameter and return value
//! - [`SymbolicShape`] / [`ShapeBinding`] - shapes with named dimensions, resolved per call
//! - [`TensorHandle`] - the common view over `ndarray` arrays and [`Tensor`]
//! - [`ValidationSession`] - the argument and return checks of one call
//! - [`Error`] / [`ErrorKind`] - the failure taxonomy
// - Shape: concrete dimension sizes
// - ScalarType/DType/ElementType: element type descriptors of both families
// - Tensor: tag-typed dense array (the second family)
// - validate: pure type/dtype/shape/range checks

pub mod annotation;
pub mod array;
pub mod constraint;
pub mod dtype;
pub mod error;
pub mod handle;
pub mod session;
pub mod shape;
pub mod symbolic;
pub mod tensor;
pub mod validate;

pub use annotation::{AnnotationSpec, AnnotationSpecBuilder, RETURN_KEY};
pub use constraint::{ConstraintSet, Range};
pub use dtype::{DType, Element, ElementType, ScalarType, WithDType};
pub use error::{Error, ErrorKind, Result};
pub use handle::{AsValue, Family, TensorHandle, Value};
pub use session::{Arguments, SessionState, ValidationSession};
pub use shape::Shape;
pub use symbolic::{ShapeBinding, SymDim, SymbolicShape};
pub use tensor::{Storage, Tensor};
