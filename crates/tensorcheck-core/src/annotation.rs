use std::fmt;

use crate::constraint::ConstraintSet;
use crate::error::Result;

/// Reserved annotation key for the return value.
pub const RETURN_KEY: &str = "return";

/// The full contract of one function: a constraint set per parameter and an
/// optional one for the return value.
///
/// Argument constraints keep their declaration order. That order decides
/// which parameter binds a shared symbolic dimension first. The contract is
/// immutable once built and can be shared freely between threads.
///
/// # Example
/// ```
/// use tensorcheck_core::{dims, AnnotationSpec, ConstraintSet, ScalarType};
///
/// let spec = AnnotationSpec::new([
///     ("a", ConstraintSet::new().shape(dims![2])),
///     ("b", ConstraintSet::new().shape(dims![3])),
///     ("return", ConstraintSet::new().shape(dims![2, 3]).dtype(ScalarType::I64)),
/// ])?;
/// assert_eq!(spec.arguments().count(), 2);
/// assert!(spec.return_constraint().is_some());
/// # Ok::<(), tensorcheck_core::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationSpec {
    arguments: Vec<(String, ConstraintSet)>,
    returns: Option<ConstraintSet>,
}

impl AnnotationSpec {
    /// Build a contract from `(name, constraints)` pairs. The pair named
    /// [`RETURN_KEY`] becomes the return constraint.
    ///
    /// Fails on duplicate names or on a structurally invalid constraint set.
    pub fn new<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, ConstraintSet)>,
        K: Into<String>,
    {
        let mut builder = AnnotationSpecBuilder::default();
        for (name, constraints) in entries {
            let name = name.into();
            builder = if name == RETURN_KEY {
                builder.returns(constraints)
            } else {
                builder.arg(name, constraints)
            };
        }
        builder.build()
    }

    /// Start an empty builder.
    pub fn builder() -> AnnotationSpecBuilder {
        AnnotationSpecBuilder::default()
    }

    /// Argument constraints in declaration order.
    pub fn arguments(&self) -> impl Iterator<Item = (&str, &ConstraintSet)> {
        self.arguments.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Constraints of one argument.
    pub fn argument(&self, name: &str) -> Option<&ConstraintSet> {
        self.arguments
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// The return constraint, if one was declared.
    pub fn return_constraint(&self) -> Option<&ConstraintSet> {
        self.returns.as_ref()
    }

    /// All symbolic dimension names mentioned anywhere in the contract.
    pub fn symbolic_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let sets = self
            .arguments
            .iter()
            .map(|(_, c)| c)
            .chain(self.returns.iter());
        for set in sets {
            if let Some(shape) = &set.shape {
                for name in shape.symbolic_names() {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
        }
        names
    }
}

impl fmt::Display for AnnotationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, c) in &self.arguments {
            writeln!(f, "{name}: {c}")?;
        }
        if let Some(c) = &self.returns {
            writeln!(f, "{RETURN_KEY}: {c}")?;
        }
        Ok(())
    }
}

/// Incremental construction of an [`AnnotationSpec`]; checks run in `build`.
#[derive(Debug, Default)]
pub struct AnnotationSpecBuilder {
    arguments: Vec<(String, ConstraintSet)>,
    returns: Vec<ConstraintSet>,
}

impl AnnotationSpecBuilder {
    /// Declare constraints for a parameter.
    pub fn arg(mut self, name: impl Into<String>, constraints: ConstraintSet) -> Self {
        self.arguments.push((name.into(), constraints));
        self
    }

    /// Declare constraints for the return value.
    pub fn returns(mut self, constraints: ConstraintSet) -> Self {
        self.returns.push(constraints);
        self
    }

    pub fn build(self) -> Result<AnnotationSpec> {
        for (i, (name, constraints)) in self.arguments.iter().enumerate() {
            if name == RETURN_KEY {
                crate::bail!("{RETURN_KEY} is reserved for the return value");
            }
            if self.arguments[..i].iter().any(|(n, _)| n == name) {
                crate::bail!("{name} is annotated more than once");
            }
            constraints.validate()?;
        }
        if self.returns.len() > 1 {
            crate::bail!("{RETURN_KEY} is annotated more than once");
        }
        let returns = self.returns.into_iter().next();
        if let Some(constraints) = &returns {
            constraints.validate()?;
        }
        Ok(AnnotationSpec {
            arguments: self.arguments,
            returns,
        })
    }
}
