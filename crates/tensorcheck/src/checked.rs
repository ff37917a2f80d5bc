// =============================================================================
// Checked - a computation wrapped in its contract
// =============================================================================
//
// Checked<F> pairs a shared AnnotationSpec with a computation F. Each call
//
//   1. opens a fresh ValidationSession (empty shape binding)
//   2. checks the arguments, returning the error without running F
//   3. runs F
//   4. checks the result against the return constraint
//
// The input handed to F is whatever the caller uses to carry its arguments.
// It only has to name them, through the Bind trait, so the session can see
// them as a name -> Value map.
//
// The contract is behind Arc and never mutated, so one Checked can be called
// from many threads at once; each call owns its own session.

use std::sync::Arc;

use tensorcheck_core::{AnnotationSpec, Arguments, AsValue, Result, ValidationSession};

/// Maps a call's input to named arguments.
///
/// Implement this for a struct holding the parameters of a computation:
///
/// ```
/// use ndarray::Array1;
/// use tensorcheck::{Arguments, Bind};
///
/// struct Outer<'a> {
///     a: &'a Array1<i64>,
///     b: &'a Array1<i64>,
/// }
///
/// impl Bind for Outer<'_> {
///     fn bind(&self) -> Arguments<'_> {
///         Arguments::new().tensor("a", self.a).tensor("b", self.b)
///     }
/// }
/// ```
pub trait Bind {
    fn bind(&self) -> Arguments<'_>;
}

impl Bind for Arguments<'_> {
    fn bind(&self) -> Arguments<'_> {
        self.clone()
    }
}

impl<T: Bind + ?Sized> Bind for &T {
    fn bind(&self) -> Arguments<'_> {
        (**self).bind()
    }
}

/// A computation guarded by an [`AnnotationSpec`].
#[derive(Clone)]
pub struct Checked<F> {
    spec: Arc<AnnotationSpec>,
    func: F,
}

impl<F> Checked<F> {
    pub fn new(spec: impl Into<Arc<AnnotationSpec>>, func: F) -> Self {
        Checked {
            spec: spec.into(),
            func,
        }
    }

    /// The contract this computation is checked against.
    pub fn spec(&self) -> &AnnotationSpec {
        &self.spec
    }

    /// Check `input`, run the computation, then check its result.
    ///
    /// On an argument violation the computation is not run. On a return
    /// violation its result is dropped and the error returned instead.
    pub fn call<A, R>(&self, input: A) -> Result<R>
    where
        A: Bind,
        F: Fn(A) -> R,
        R: AsValue,
    {
        let mut session = ValidationSession::new(&self.spec);
        session.validate_arguments(&input.bind())?;
        let output = (self.func)(input);
        session.validate_return(&output.as_value())?;
        Ok(output)
    }
}

impl<F> std::fmt::Debug for Checked<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checked")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Wrap `func` in `spec`.
pub fn tensorcheck<F>(spec: impl Into<Arc<AnnotationSpec>>, func: F) -> Checked<F> {
    Checked::new(spec, func)
}
