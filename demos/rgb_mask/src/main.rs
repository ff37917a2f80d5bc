// RGB Image + Alpha Mask - contract violations, one at a time
//
// An inference step takes an 8-bit RGB image and a float alpha mask of the
// same height and width. The contract says so explicitly:
//
//   img:  u8,  [1, 3, H, W], values in [0, 255]
//   mask: f64, [1, 1, H, W], values in [0, 1]
//
// H and W are never stated. The image fixes them on each call and the mask
// has to agree.
//
// This demo runs four calls:
//   1. mask one column narrower than the image  -> shape error
//   2. mask values up to 2                       -> upper bound error
//   3. image stored as f64 instead of u8         -> dtype error
//   4. everything in order                       -> success

use ndarray::{Array4, ArrayD, IxDyn};
use rand::Rng;
use tensorcheck::prelude::*;

const CONTRACT: &str = r#"
img:  { type: ndarray, dtype: uint8, shape: [1, 3, H, W], range: [0, 255] }
mask: { type: ndarray, dtype: float, shape: [1, 1, H, W], range: [0, 1] }
"#;

struct Inputs<'a> {
    img: &'a dyn TensorHandle,
    mask: &'a dyn TensorHandle,
}

impl Bind for Inputs<'_> {
    fn bind(&self) -> Arguments<'_> {
        Arguments::new()
            .with("img", Value::Tensor(self.img))
            .with("mask", Value::Tensor(self.mask))
    }
}

fn inference(_x: Inputs<'_>) {
    // ...do compute
}

fn uniform(shape: [usize; 4], low: f64, high: f64) -> ArrayD<f64> {
    let mut rng = rand::thread_rng();
    ArrayD::from_shape_simple_fn(IxDyn(&shape), || rng.gen_range(low..high))
}

fn uniform_u8(shape: [usize; 4]) -> Array4<u8> {
    let mut rng = rand::thread_rng();
    Array4::from_shape_simple_fn(shape, || rng.gen_range(0..=255u8))
}

fn report(label: &str, result: tensorcheck::Result<()>) {
    match result {
        Ok(()) => println!("{label:<28} Success"),
        Err(err) => println!("{label:<28} {:?}: {err}", err.kind()),
    }
}

fn main() -> tensorcheck::Result<()> {
    println!("=== tensorcheck - RGB image and alpha mask ===");
    println!();

    let spec = declaration::from_yaml_str(CONTRACT)?;
    print!("{spec}");
    println!();

    let checked = tensorcheck(spec, inference);

    // 1. W disagrees
    let img = uniform_u8([1, 3, 10, 8]);
    let mask = uniform([1, 1, 10, 7], 0.0, 1.0);
    report(
        "mask [1, 1, 10, 7]:",
        checked.call(Inputs { img: &img, mask: &mask }),
    );

    // 2. mask out of range
    let img = uniform_u8([1, 3, 10, 8]);
    let mask = uniform([1, 1, 10, 8], 0.0, 2.0);
    report(
        "mask in [0, 2):",
        checked.call(Inputs { img: &img, mask: &mask }),
    );

    // 3. float image
    let img = uniform([1, 3, 10, 8], 0.0, 255.0);
    let mask = uniform([1, 1, 10, 8], 0.0, 1.0);
    report(
        "img as f64:",
        checked.call(Inputs { img: &img, mask: &mask }),
    );

    // 4. all good
    let img = uniform_u8([1, 3, 10, 8]);
    let mask = uniform([1, 1, 10, 8], 0.0, 1.0);
    report(
        "img u8, mask in [0, 1):",
        checked.call(Inputs { img: &img, mask: &mask }),
    );

    Ok(())
}
