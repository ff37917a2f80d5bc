// Property tests for tensorcheck: shape and range contracts on random inputs

use ndarray::{ArrayD, IxDyn};
use proptest::prelude::*;
use tensorcheck::prelude::*;

fn check_one(spec: &AnnotationSpec, name: &str, value: &dyn TensorHandle) -> Result<()> {
    let mut args = Arguments::new();
    args.insert(name, Value::Tensor(value));
    ValidationSession::new(spec).validate_arguments(&args)
}

fn concrete(dims: &[usize]) -> SymbolicShape {
    SymbolicShape::new(dims.iter().map(|&d| SymDim::fixed(d)).collect())
}

proptest! {
    #[test]
    fn prop_exact_shape_passes(dims in prop::collection::vec(1usize..5, 1..5)) {
        let spec = AnnotationSpec::new([("a", ConstraintSet::new().shape(concrete(&dims)))]).unwrap();
        let x = ArrayD::<f32>::zeros(IxDyn(&dims));
        let t = Tensor::zeros(dims.clone(), DType::F32);
        prop_assert!(check_one(&spec, "a", &x).is_ok());
        prop_assert!(check_one(&spec, "a", &t).is_ok());
    }

    #[test]
    fn prop_single_dim_difference_is_reported_at_that_dim(
        dims in prop::collection::vec(1usize..5, 1..5),
        pick in any::<prop::sample::Index>(),
        delta in 1usize..3
    ) {
        let d = pick.index(dims.len());
        let mut actual = dims.clone();
        actual[d] += delta;
        let spec = AnnotationSpec::new([("a", ConstraintSet::new().shape(concrete(&dims)))]).unwrap();
        let x = ArrayD::<f64>::zeros(IxDyn(&actual));
        let err = check_one(&spec, "a", &x).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::Shape);
        let is_expected_dim = matches!(err, Error::DimMismatch { dim, resolved, .. } if dim == d && resolved == dims[d]);
        prop_assert!(is_expected_dim);
    }

    #[test]
    fn prop_shared_symbol_must_agree(h in 1usize..8, w1 in 1usize..8, w2 in 1usize..8) {
        let spec = AnnotationSpec::new([
            ("img", ConstraintSet::new().shape(dims![1, 3, "H", "W"])),
            ("mask", ConstraintSet::new().shape(dims![1, 1, "H", "W"])),
        ])
        .unwrap();
        let img = ArrayD::<u8>::zeros(IxDyn(&[1, 3, h, w1]));
        let mask = Tensor::zeros((1, 1, h, w2), DType::F32);
        let args = Arguments::new().tensor("img", &img).tensor("mask", &mask);
        let result = ValidationSession::new(&spec).validate_arguments(&args);
        if w1 == w2 {
            prop_assert!(result.is_ok());
        } else {
            let err = result.unwrap_err();
            prop_assert_eq!(
                err.to_string(),
                format!("/mask/ dim 3 of [1, 1, {h}, {w2}] is not W={w1}")
            );
        }
    }

    #[test]
    fn prop_range_reports_actual_extremum(
        values in prop::collection::vec(-100i64..100, 1..32),
        lo in -50i64..0,
        hi in 0i64..50
    ) {
        let spec = AnnotationSpec::new([("a", ConstraintSet::new().range(lo as f64, hi as f64))]).unwrap();
        let t = Tensor::from_slice(&values, values.len()).unwrap();
        let min = *values.iter().min().unwrap();
        let max = *values.iter().max().unwrap();
        let result = check_one(&spec, "a", &t);
        if min < lo {
            let is_lower = matches!(result, Err(Error::LowerBound { value, .. }) if value == min as f64);
            prop_assert!(is_lower);
        } else if max > hi {
            let is_upper = matches!(result, Err(Error::UpperBound { value, .. }) if value == max as f64);
            prop_assert!(is_upper);
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn prop_bounds_are_inclusive(lo in -1.0e6f64..0.0, width in 0.0f64..1.0e6) {
        let hi = lo + width;
        let spec = AnnotationSpec::new([("a", ConstraintSet::new().range(lo, hi))]).unwrap();
        let x = ArrayD::from_shape_vec(IxDyn(&[2]), vec![lo, hi]).unwrap();
        prop_assert!(check_one(&spec, "a", &x).is_ok());
    }
}
