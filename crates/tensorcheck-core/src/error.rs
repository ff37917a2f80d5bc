use crate::dtype::ElementType;
use crate::handle::Family;
use crate::shape::Shape;
use crate::symbolic::{SymDim, SymbolicShape};

/// All errors that can occur while declaring or checking a tensor contract.
///
/// Every variant is fatal to the current call. The message formats are stable
/// and are asserted on by tests, so change them with care.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A declared parameter is missing from the call's named arguments.
    #[error("{name} is not a parameter of the function")]
    UnknownParameter { name: String },

    /// A dynamically declared shape is not a list.
    #[error("{value} is not a valid shape annotation")]
    InvalidShapeAnnotation { value: String },

    /// A dynamically declared shape contains something other than a size or a name.
    #[error("{element} in shape annotation is not an int, float, or string")]
    InvalidShapeElement { element: String },

    /// The value is not an array of a supported family.
    #[error("/{name}/ value of family {family} is not an accepted tensor type")]
    UnsupportedType { name: String, family: String },

    /// The value's family differs from the declared `type` constraint.
    #[error("/{name}/ value of family {actual} is not a {expected}")]
    FamilyMismatch {
        name: String,
        actual: Family,
        expected: Family,
    },

    /// Element type mismatch, including descriptors of the other family.
    #[error("/{name}/ dtype {actual} is not {expected}")]
    DTypeMismatch {
        name: String,
        actual: ElementType,
        expected: ElementType,
    },

    /// Number of dimensions differs from the declared shape.
    #[error("/{name}/ {actual} is not of same length as desired shape {expected}")]
    RankMismatch {
        name: String,
        actual: Shape,
        expected: SymbolicShape,
    },

    /// First dimension whose size differs from the resolved declaration.
    #[error("/{name}/ dim {dim} of {actual} is not {spec}={resolved}")]
    DimMismatch {
        name: String,
        dim: usize,
        actual: Shape,
        spec: SymDim,
        resolved: usize,
    },

    /// Smallest element is below the declared minimum.
    #[error("/{name}/ min value {value} is less than {min}")]
    LowerBound { name: String, value: f64, min: f64 },

    /// Largest element is above the declared maximum.
    #[error("/{name}/ max value {value} is greater than {max}")]
    UpperBound { name: String, value: f64, max: f64 },

    /// Element count mismatch when creating a tensor from a vec.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// A session method was called out of order.
    #[error("validation session is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: crate::SessionState,
        actual: crate::SessionState,
    },

    /// A contract declaration could not be read.
    #[error("cannot read contract declaration: {0}")]
    Io(#[from] std::io::Error),

    /// A contract declaration is not valid JSON/YAML.
    #[error("cannot parse contract declaration: {0}")]
    Declaration(String),

    /// Any other malformed contract.
    #[error("{0}")]
    Msg(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The contract itself is malformed or names a nonexistent parameter.
    Annotation,
    /// The value's family is not accepted.
    Type,
    /// Element type mismatch.
    DataType,
    /// Rank or per-dimension mismatch.
    Shape,
    /// Minimum below the declared range.
    LowerBound,
    /// Maximum above the declared range.
    UpperBound,
    /// Lifecycle misuse or an invalid tensor construction.
    Session,
}

impl Error {
    /// Create an annotation error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }

    /// Which part of the taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownParameter { .. }
            | Error::InvalidShapeAnnotation { .. }
            | Error::InvalidShapeElement { .. }
            | Error::Io(_)
            | Error::Declaration(_)
            | Error::Msg(_) => ErrorKind::Annotation,
            Error::UnsupportedType { .. } | Error::FamilyMismatch { .. } => ErrorKind::Type,
            Error::DTypeMismatch { .. } => ErrorKind::DataType,
            Error::RankMismatch { .. } | Error::DimMismatch { .. } => ErrorKind::Shape,
            Error::LowerBound { .. } => ErrorKind::LowerBound,
            Error::UpperBound { .. } => ErrorKind::UpperBound,
            Error::ElementCountMismatch { .. } | Error::InvalidState { .. } => ErrorKind::Session,
        }
    }
}

/// Convenience Result type used throughout tensorcheck.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted annotation error.
/// Usage: `bail!("range min {} is greater than max {}", lo, hi)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
