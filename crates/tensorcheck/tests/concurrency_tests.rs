// Concurrency tests for tensorcheck: one Checked shared by many threads

use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::{Array4, ArrayD, IxDyn};
use rand::Rng;
use rayon::prelude::*;
use tensorcheck::prelude::*;

struct Blend<'a> {
    img: &'a Array4<u8>,
    mask: &'a ArrayD<f64>,
}

impl Bind for Blend<'_> {
    fn bind(&self) -> Arguments<'_> {
        Arguments::new()
            .tensor("img", self.img)
            .tensor("mask", self.mask)
    }
}

fn blend(x: Blend<'_>) -> ArrayD<f64> {
    let img = x.img.mapv(f64::from).into_dyn();
    &img * x.mask
}

fn blend_spec() -> AnnotationSpec {
    declaration::from_yaml_str(
        r#"
img:    { type: ndarray, dtype: u8,  shape: [1, 3, H, W], range: [0, 255] }
mask:   { type: ndarray, dtype: f64, shape: [1, 1, H, W], range: [0, 1] }
return: { type: ndarray, dtype: f64, shape: [1, 3, H, W] }
"#,
    )
    .unwrap()
}

#[test]
fn test_parallel_calls_have_independent_bindings() {
    let checked = tensorcheck(blend_spec(), blend);

    let ok = (0..64usize)
        .into_par_iter()
        .map(|i| {
            let (h, w) = (1 + i % 7, 1 + i % 5);
            let mut rng = rand::thread_rng();
            let img = Array4::from_shape_simple_fn((1, 3, h, w), || rng.gen::<u8>());
            let mask =
                ArrayD::<f64>::from_shape_simple_fn(IxDyn(&[1, 1, h, w]), || rng.gen_range(0.0..=1.0));
            let out = checked.call(Blend {
                img: &img,
                mask: &mask,
            });
            out.map(|o| o.shape() == [1, 3, h, w]).unwrap_or(false)
        })
        .filter(|&passed| passed)
        .count();

    assert_eq!(ok, 64);
}

#[test]
fn test_parallel_failures_do_not_affect_other_calls() {
    let checked = tensorcheck(blend_spec(), blend);
    let failures = AtomicUsize::new(0);

    (0..64usize).into_par_iter().for_each(|i| {
        let w = 2 + i % 4;
        // Every third call hands in a mask one column too narrow.
        let mask_w = if i % 3 == 0 { w - 1 } else { w };
        let img = Array4::<u8>::zeros((1, 3, 4, w));
        let mask = ArrayD::<f64>::zeros(IxDyn(&[1, 1, 4, mask_w]));
        match checked.call(Blend {
            img: &img,
            mask: &mask,
        }) {
            Ok(_) => assert_ne!(i % 3, 0),
            Err(err) => {
                assert_eq!(i % 3, 0);
                assert_eq!(
                    err.to_string(),
                    format!("/mask/ dim 3 of [1, 1, 4, {mask_w}] is not W={w}")
                );
                failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    assert_eq!(failures.load(Ordering::Relaxed), 22);
}
