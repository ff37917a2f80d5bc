//! # tensorcheck
//!
//! Call-time contracts for array-valued functions: element type, shape with
//! named dimensions, and value range, checked on every call.
//!
//! This is the top-level facade crate that re-exports everything you need.
//!
//! ## Usage
//!
//! ```rust
//! use ndarray::Array;
//! use tensorcheck::prelude::*;
//!
//! let spec = AnnotationSpec::new([
//!     ("img", ConstraintSet::new().dtype(ScalarType::U8).shape(dims![1, 3, "H", "W"])),
//!     ("mask", ConstraintSet::new().dtype(ScalarType::F64).shape(dims![1, 1, "H", "W"])),
//! ])?;
//!
//! let img = Array::from_elem((1, 3, 10, 8), 0u8);
//! let mask = Array::from_elem((1, 1, 10, 7), 0.5f64);
//! let args = Arguments::new().tensor("img", &img).tensor("mask", &mask);
//!
//! let mut session = ValidationSession::new(&spec);
//! let err = session.validate_arguments(&args).unwrap_err();
//! assert_eq!(err.to_string(), "/mask/ dim 3 of [1, 1, 10, 7] is not W=8");
//! # Ok::<(), tensorcheck::Error>(())
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|----------|
//! | `tensorcheck-core` | Constraints, symbolic shapes, validators, sessions, `Tensor` |
//! | `tensorcheck` | Declarations from JSON/YAML, the `Checked` wrapper |
//!
//! ## Modules
//!
//! - [`declaration`] - contracts from JSON or YAML
//! - [`checked`] - computations wrapped in a contract

/// Re-export core types.
pub use tensorcheck_core::{
    annotation::AnnotationSpecBuilder,
    dims,
    validate::{check_constraints, check_dtype, check_range, check_shape, check_type},
    AnnotationSpec, Arguments, AsValue, ConstraintSet, DType, Element, ElementType, Error,
    ErrorKind, Family, Range, Result, ScalarType, SessionState, Shape, ShapeBinding, Storage,
    SymDim, SymbolicShape, Tensor, TensorHandle, ValidationSession, Value, WithDType, RETURN_KEY,
};

/// Declarations - contracts read from JSON or YAML.
pub mod declaration;

/// Checked - a computation wrapped in its contract.
pub mod checked;

pub use checked::{tensorcheck, Bind, Checked};

/// Prelude: import this for the most common types.
pub mod prelude {
    pub use crate::checked::{tensorcheck, Bind, Checked};
    pub use crate::declaration;
    pub use tensorcheck_core::{
        dims, AnnotationSpec, Arguments, AsValue, ConstraintSet, DType, ElementType, Error,
        ErrorKind, Family, Result, ScalarType, SessionState, Shape, SymDim, SymbolicShape, Tensor,
        TensorHandle, ValidationSession, Value,
    };
}
