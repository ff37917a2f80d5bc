use std::collections::BTreeMap;

use crate::annotation::{AnnotationSpec, RETURN_KEY};
use crate::error::{Error, Result};
use crate::handle::{TensorHandle, Value};
use crate::symbolic::ShapeBinding;
use crate::validate::check_constraints;

// ValidationSession - checks for exactly one call
//
// LIFECYCLE:
//
//   Created --validate_arguments--> ValidatingArguments --ok--> AwaitingExecution
//   AwaitingExecution --validate_return--> ValidatingReturn --ok--> Done
//
//   Any failing check moves the session to Failed, which is terminal.
//
// The session owns the call's ShapeBinding. Symbols bound while checking the
// arguments constrain the return value. A new session starts with an empty
// binding, so nothing carries over from a previous call.

/// Named arguments of one call, as produced by an argument binder.
#[derive(Debug, Default, Clone)]
pub struct Arguments<'a> {
    values: BTreeMap<String, Value<'a>>,
}

impl<'a> Arguments<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an argument.
    pub fn insert(&mut self, name: impl Into<String>, value: Value<'a>) {
        self.values.insert(name.into(), value);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: Value<'a>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add an array argument.
    pub fn tensor<T: TensorHandle>(self, name: impl Into<String>, value: &'a T) -> Self {
        self.with(name, Value::Tensor(value))
    }

    /// Add a non-array argument.
    pub fn other<T: ?Sized>(self, name: impl Into<String>, value: &T) -> Self {
        self.with(name, Value::other(value))
    }

    pub fn get(&self, name: &str) -> Option<&Value<'a>> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Where a [`ValidationSession`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Created,
    ValidatingArguments,
    AwaitingExecution,
    ValidatingReturn,
    Done,
    Failed,
}

/// Validation state for a single invocation of a contracted function.
#[derive(Debug)]
pub struct ValidationSession<'s> {
    spec: &'s AnnotationSpec,
    binding: ShapeBinding,
    state: SessionState,
}

impl<'s> ValidationSession<'s> {
    /// Start a session with an empty shape binding.
    pub fn new(spec: &'s AnnotationSpec) -> Self {
        ValidationSession {
            spec,
            binding: ShapeBinding::new(),
            state: SessionState::Created,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Symbols resolved so far in this call.
    pub fn binding(&self) -> &ShapeBinding {
        &self.binding
    }

    pub fn into_binding(self) -> ShapeBinding {
        self.binding
    }

    fn enter(&mut self, expected: SessionState, next: SessionState) -> Result<()> {
        if self.state != expected {
            return Err(Error::InvalidState {
                expected,
                actual: self.state,
            });
        }
        self.state = next;
        Ok(())
    }

    fn fail(&mut self, err: Error) -> Error {
        log::debug!("contract violated: {err}");
        self.state = SessionState::Failed;
        err
    }

    /// Check every declared parameter, in declaration order.
    ///
    /// Each declared name must be present in `args`. Undeclared arguments are
    /// ignored.
    pub fn validate_arguments(&mut self, args: &Arguments<'_>) -> Result<()> {
        self.enter(SessionState::Created, SessionState::ValidatingArguments)?;
        log::debug!(
            "validating {} declared argument(s) against {} supplied",
            self.spec.arguments().count(),
            args.len()
        );
        let spec = self.spec;
        for (name, constraints) in spec.arguments() {
            let Some(value) = args.get(name) else {
                return Err(self.fail(Error::UnknownParameter {
                    name: name.to_string(),
                }));
            };
            if let Err(err) = check_constraints(name, value, constraints, &mut self.binding) {
                return Err(self.fail(err));
            }
        }
        self.state = SessionState::AwaitingExecution;
        Ok(())
    }

    /// Check the computation's result against the return constraint, reusing
    /// the symbols bound by [`validate_arguments`](Self::validate_arguments).
    /// Passes trivially when no return constraint was declared.
    pub fn validate_return(&mut self, value: &Value<'_>) -> Result<()> {
        self.enter(
            SessionState::AwaitingExecution,
            SessionState::ValidatingReturn,
        )?;
        if let Some(constraints) = self.spec.return_constraint() {
            if let Err(err) = check_constraints(RETURN_KEY, value, constraints, &mut self.binding)
            {
                return Err(self.fail(err));
            }
        }
        self.state = SessionState::Done;
        log::debug!("call satisfied its contract");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintSet;
    use crate::dims;
    use crate::dtype::{DType, ScalarType};
    use crate::error::ErrorKind;
    use crate::handle::AsValue;
    use crate::tensor::Tensor;
    use ndarray::{Array, Array2};

    fn img_mask_spec() -> AnnotationSpec {
        AnnotationSpec::new([
            (
                "img",
                ConstraintSet::new()
                    .dtype(ScalarType::U8)
                    .shape(dims![1, 3, "H", "W"])
                    .range(0.0, 255.0),
            ),
            (
                "mask",
                ConstraintSet::new()
                    .dtype(ScalarType::F64)
                    .shape(dims![1, 1, "H", "W"])
                    .range(0.0, 1.0),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_lifecycle_success() {
        let spec = img_mask_spec();
        let img = Array::from_elem((1, 3, 10, 8), 200u8);
        let mask = Array::from_elem((1, 1, 10, 8), 0.5f64);
        let args = Arguments::new().tensor("img", &img).tensor("mask", &mask);

        let mut session = ValidationSession::new(&spec);
        assert_eq!(session.state(), SessionState::Created);
        session.validate_arguments(&args).unwrap();
        assert_eq!(session.state(), SessionState::AwaitingExecution);
        assert_eq!(session.binding().get("H"), Some(10));
        assert_eq!(session.binding().get("W"), Some(8));
        session.validate_return(&().as_value()).unwrap();
        assert_eq!(session.state(), SessionState::Done);
    }

    #[test]
    fn test_missing_parameter() {
        let spec = AnnotationSpec::new([("b", ConstraintSet::new())]).unwrap();
        let a = Tensor::zeros(2, DType::F32);
        let args = Arguments::new().tensor("a", &a);
        let mut session = ValidationSession::new(&spec);
        let err = session.validate_arguments(&args).unwrap_err();
        assert_eq!(err.to_string(), "b is not a parameter of the function");
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn test_failed_session_is_terminal() {
        let spec = img_mask_spec();
        let img = Array::from_elem((1, 3, 10, 8), 1u8);
        let mask = Array::from_elem((1, 1, 10, 7), 0.5f64);
        let args = Arguments::new().tensor("img", &img).tensor("mask", &mask);
        let mut session = ValidationSession::new(&spec);
        let err = session.validate_arguments(&args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);

        let err = session.validate_return(&().as_value()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Session);
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn test_return_before_arguments_is_rejected() {
        let spec = img_mask_spec();
        let mut session = ValidationSession::new(&spec);
        let err = session.validate_return(&().as_value()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidState {
                expected: SessionState::AwaitingExecution,
                actual: SessionState::Created,
            }
        ));
    }

    #[test]
    fn test_return_shares_argument_symbols() {
        let spec = AnnotationSpec::new([
            ("x", ConstraintSet::new().shape(dims!["N", 3])),
            ("return", ConstraintSet::new().shape(dims!["N"])),
        ])
        .unwrap();
        let x = Array2::<f32>::zeros((4, 3));
        let args = Arguments::new().tensor("x", &x);

        let mut ok = ValidationSession::new(&spec);
        ok.validate_arguments(&args).unwrap();
        let y = ndarray::Array1::<f32>::zeros(4);
        ok.validate_return(&Value::from(&y)).unwrap();

        let mut bad = ValidationSession::new(&spec);
        bad.validate_arguments(&args).unwrap();
        let y = ndarray::Array1::<f32>::zeros(5);
        let err = bad.validate_return(&Value::from(&y)).unwrap_err();
        assert_eq!(err.to_string(), "/return/ dim 0 of [5] is not N=4");
    }

    #[test]
    fn test_fresh_session_has_fresh_binding() {
        let spec = img_mask_spec();
        for (h, w) in [(10, 8), (4, 6)] {
            let img = Array::from_elem((1, 3, h, w), 0u8);
            let mask = Array::from_elem((1, 1, h, w), 1.0f64);
            let args = Arguments::new().tensor("img", &img).tensor("mask", &mask);
            let mut session = ValidationSession::new(&spec);
            session.validate_arguments(&args).unwrap();
            assert_eq!(session.into_binding().get("W"), Some(w));
        }
    }
}
