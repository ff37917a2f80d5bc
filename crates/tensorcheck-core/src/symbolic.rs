// Symbolic shapes - declared shapes with named dimensions
//
// A declared shape mixes concrete sizes with names:
//
//   img:  [1, 3, H, W]
//   mask: [1, 1, H, W]
//
// COMPONENTS:
//
//   SymDim         - one declared dimension: a fixed size or a name
//   SymbolicShape  - an ordered list of SymDims
//   ShapeBinding   - name -> size resolved during ONE call
//
// RESOLUTION:
//
//   The first array that mentions a name binds it to that array's size at
//   that position. Every later mention (other parameters, the return value)
//   resolves to the bound size instead of re-reading its own array. A binding
//   is created empty for each call and dropped with it, so sizes never leak
//   from one call into the next.

use std::collections::BTreeMap;
use std::fmt;

use crate::shape::Shape;

/// A declared dimension: concrete or named.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymDim {
    /// Concrete size: 3, 768, ...
    Fixed(usize),
    /// Named size shared by every occurrence within one call: "H", "Batch".
    Symbolic(String),
}

impl SymDim {
    /// Create a fixed dimension.
    pub fn fixed(n: usize) -> Self {
        SymDim::Fixed(n)
    }

    /// Create a named symbolic dimension.
    pub fn symbolic(name: impl Into<String>) -> Self {
        SymDim::Symbolic(name.into())
    }

    /// Is this a concrete (fixed) dimension?
    pub fn is_fixed(&self) -> bool {
        matches!(self, SymDim::Fixed(_))
    }

    /// Is this a symbolic (named) dimension?
    pub fn is_symbolic(&self) -> bool {
        matches!(self, SymDim::Symbolic(_))
    }

    /// Resolve against the binding without binding anything.
    pub fn resolve(&self, binding: &ShapeBinding) -> Option<usize> {
        match self {
            SymDim::Fixed(n) => Some(*n),
            SymDim::Symbolic(name) => binding.get(name),
        }
    }
}

impl fmt::Display for SymDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymDim::Fixed(n) => write!(f, "{n}"),
            SymDim::Symbolic(s) => write!(f, "{s}"),
        }
    }
}

impl From<usize> for SymDim {
    fn from(n: usize) -> Self {
        SymDim::Fixed(n)
    }
}

impl From<&str> for SymDim {
    fn from(s: &str) -> Self {
        SymDim::Symbolic(s.to_string())
    }
}

impl From<String> for SymDim {
    fn from(s: String) -> Self {
        SymDim::Symbolic(s)
    }
}

/// A declared shape: an ordered list of fixed and symbolic dimensions.
///
/// # Examples
/// ```
/// use tensorcheck_core::{SymDim, SymbolicShape};
///
/// let img = SymbolicShape::new(vec![
///     SymDim::fixed(1),
///     SymDim::fixed(3),
///     SymDim::symbolic("H"),
///     SymDim::symbolic("W"),
/// ]);
/// assert_eq!(img.to_string(), "[1, 3, H, W]");
/// assert_eq!(img.symbolic_names(), vec!["H", "W"]);
/// assert!(!img.is_concrete());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolicShape {
    dims: Vec<SymDim>,
}

impl SymbolicShape {
    /// Create a new symbolic shape from a vector of SymDim.
    pub fn new(dims: Vec<SymDim>) -> Self {
        Self { dims }
    }

    /// Create a fully-fixed symbolic shape from a concrete shape.
    pub fn from_shape(shape: &Shape) -> Self {
        Self {
            dims: shape.dims().iter().map(|&d| SymDim::Fixed(d)).collect(),
        }
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Get the dimension patterns.
    pub fn dims(&self) -> &[SymDim] {
        &self.dims
    }

    /// Check if all dimensions are fixed (fully concrete).
    pub fn is_concrete(&self) -> bool {
        self.dims.iter().all(|d| d.is_fixed())
    }

    /// Get all symbolic dimension names used in this shape, in order.
    pub fn symbolic_names(&self) -> Vec<&str> {
        self.dims
            .iter()
            .filter_map(|d| match d {
                SymDim::Symbolic(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Resolve every position against `binding`, binding unseen names to the
    /// size `actual` has at that position.
    ///
    /// Positions that cannot be resolved (an unseen name past the end of
    /// `actual`) stay symbolic; that only happens when the ranks differ.
    pub fn resolve_and_bind(&self, actual: &Shape, binding: &mut ShapeBinding) -> SymbolicShape {
        let dims = self
            .dims
            .iter()
            .enumerate()
            .map(|(d, dim)| match dim.resolve(binding) {
                Some(n) => SymDim::Fixed(n),
                None => match (dim, actual.dim(d)) {
                    (SymDim::Symbolic(name), Some(observed)) => {
                        SymDim::Fixed(binding.bind_first(name, observed))
                    }
                    _ => dim.clone(),
                },
            })
            .collect();
        SymbolicShape::new(dims)
    }

    /// The concrete shape, if every dimension is fixed.
    pub fn to_shape(&self) -> Option<Shape> {
        self.dims
            .iter()
            .map(|d| match d {
                SymDim::Fixed(n) => Some(*n),
                SymDim::Symbolic(_) => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Shape::new)
    }
}

impl fmt::Display for SymbolicShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Build a [`SymbolicShape`] from integer sizes and string names.
///
/// ```
/// use tensorcheck_core::dims;
///
/// let mask = dims![1, 1, "H", "W"];
/// assert_eq!(mask.to_string(), "[1, 1, H, W]");
/// ```
#[macro_export]
macro_rules! dims {
    ($($d:expr),* $(,)?) => {
        $crate::SymbolicShape::new(vec![$($crate::SymDim::from($d)),*])
    };
}

impl From<Vec<SymDim>> for SymbolicShape {
    fn from(dims: Vec<SymDim>) -> Self {
        Self::new(dims)
    }
}

impl<const N: usize> From<[SymDim; N]> for SymbolicShape {
    fn from(dims: [SymDim; N]) -> Self {
        Self::new(dims.into())
    }
}

impl From<Shape> for SymbolicShape {
    fn from(shape: Shape) -> Self {
        Self::from_shape(&shape)
    }
}

// ShapeBinding - per-call symbol table

/// Maps symbolic dimension names to the size first observed for them.
///
/// Owned by exactly one validation session. Bindings are only ever added,
/// never overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapeBinding {
    bindings: BTreeMap<String, usize>,
}

impl ShapeBinding {
    /// Create an empty binding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value` unless it is already bound, and return the
    /// value `name` resolves to afterwards.
    pub fn bind_first(&mut self, name: &str, value: usize) -> usize {
        if let Some(&bound) = self.bindings.get(name) {
            return bound;
        }
        log::trace!("binding shape symbol {name}={value}");
        self.bindings.insert(name.to_string(), value);
        value
    }

    /// Look up a symbolic name.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.bindings.get(name).copied()
    }

    /// Iterate over `(name, size)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.bindings.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Is the binding empty?
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

// Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(dims: Vec<SymDim>) -> SymbolicShape {
        SymbolicShape::new(dims)
    }

    // ── SymDim ──

    #[test]
    fn test_symdim_fixed() {
        let d = SymDim::fixed(32);
        assert!(d.is_fixed());
        assert!(!d.is_symbolic());
        assert_eq!(d.resolve(&ShapeBinding::new()), Some(32));
        assert_eq!(format!("{d}"), "32");
    }

    #[test]
    fn test_symdim_symbolic_unbound() {
        let d = SymDim::symbolic("H");
        assert!(d.is_symbolic());
        assert_eq!(d.resolve(&ShapeBinding::new()), None);
    }

    #[test]
    fn test_symdim_from() {
        let d: SymDim = 32usize.into();
        assert_eq!(d, SymDim::Fixed(32));
        let d: SymDim = "Batch".into();
        assert_eq!(d, SymDim::Symbolic("Batch".to_string()));
    }

    // ── ShapeBinding ──

    #[test]
    fn test_first_sighting_wins() {
        let mut b = ShapeBinding::new();
        assert!(b.is_empty());
        assert_eq!(b.bind_first("W", 8), 8);
        assert_eq!(b.bind_first("W", 7), 8);
        assert_eq!(b.get("W"), Some(8));
        assert_eq!(b.len(), 1);
        assert_eq!(b.get("H"), None);
    }

    #[test]
    fn test_iter_is_name_ordered() {
        let mut b = ShapeBinding::new();
        b.bind_first("W", 8);
        b.bind_first("H", 10);
        let pairs: Vec<_> = b.iter().collect();
        assert_eq!(pairs, vec![("H", 10), ("W", 8)]);
    }

    // ── SymbolicShape ──

    #[test]
    fn test_symbolic_shape_basic() {
        let s = pattern(vec![SymDim::symbolic("Batch"), SymDim::fixed(784)]);
        assert_eq!(s.rank(), 2);
        assert!(!s.is_concrete());
        assert_eq!(s.symbolic_names(), vec!["Batch"]);
        assert_eq!(format!("{s}"), "[Batch, 784]");
        assert_eq!(s.to_shape(), None);
    }

    #[test]
    fn test_resolve_binds_unseen_names() {
        let s = pattern(vec![1.into(), 3.into(), "H".into(), "W".into()]);
        let mut b = ShapeBinding::new();
        let resolved = s.resolve_and_bind(&Shape::from((1, 3, 10, 8)), &mut b);
        assert_eq!(resolved.to_shape(), Some(Shape::from((1, 3, 10, 8))));
        assert_eq!(b.get("H"), Some(10));
        assert_eq!(b.get("W"), Some(8));
    }

    #[test]
    fn test_resolve_uses_bound_value_not_actual() {
        let s = pattern(vec![1.into(), 1.into(), "H".into(), "W".into()]);
        let mut b = ShapeBinding::new();
        b.bind_first("W", 8);
        let resolved = s.resolve_and_bind(&Shape::from((1, 1, 10, 7)), &mut b);
        assert_eq!(resolved.to_string(), "[1, 1, 10, 8]");
    }

    #[test]
    fn test_repeated_name_within_one_shape() {
        let s = pattern(vec!["N".into(), "N".into()]);
        let mut b = ShapeBinding::new();
        let resolved = s.resolve_and_bind(&Shape::from((32, 64)), &mut b);
        assert_eq!(resolved.to_string(), "[32, 32]");
    }

    #[test]
    fn test_resolve_past_actual_rank_stays_symbolic() {
        let s = pattern(vec!["B".into(), "T".into(), 768.into()]);
        let mut b = ShapeBinding::new();
        let resolved = s.resolve_and_bind(&Shape::from(4), &mut b);
        assert_eq!(resolved.to_string(), "[4, T, 768]");
        assert_eq!(b.get("T"), None);
    }

    #[test]
    fn test_symbolic_shape_from_concrete() {
        let sym = SymbolicShape::from(Shape::new(vec![2, 3, 4]));
        assert!(sym.is_concrete());
        assert_eq!(sym.to_shape(), Some(Shape::new(vec![2, 3, 4])));
    }

    // ── Properties ──

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_concrete_shape_resolves_to_itself(dims in prop::collection::vec(0usize..16, 0..6)) {
            let shape = Shape::new(dims);
            let declared = SymbolicShape::from(shape.clone());
            let mut b = ShapeBinding::new();
            prop_assert_eq!(declared.resolve_and_bind(&shape, &mut b).to_shape(), Some(shape));
            prop_assert!(b.is_empty());
        }

        #[test]
        fn prop_all_symbolic_binds_observed_sizes(dims in prop::collection::vec(1usize..64, 1..6)) {
            let names: Vec<String> = (0..dims.len()).map(|i| format!("D{i}")).collect();
            let declared = SymbolicShape::new(names.iter().map(SymDim::symbolic).collect());
            let shape = Shape::new(dims.clone());
            let mut b = ShapeBinding::new();
            prop_assert_eq!(declared.resolve_and_bind(&shape, &mut b).to_shape(), Some(shape));
            for (name, size) in names.iter().zip(&dims) {
                prop_assert_eq!(b.get(name), Some(*size));
            }
        }

        #[test]
        fn prop_first_sighting_wins(first in 0usize..1000, later in prop::collection::vec(0usize..1000, 0..8)) {
            let mut b = ShapeBinding::new();
            b.bind_first("N", first);
            for size in later {
                prop_assert_eq!(b.bind_first("N", size), first);
            }
            prop_assert_eq!(b.get("N"), Some(first));
        }
    }
}
