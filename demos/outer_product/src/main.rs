// Outer Product - checking what a computation returns
//
// The outer product of a length-2 and a length-3 vector is a 2x3 matrix. The
// contract pins the inputs and the result:
//
//   a:      tensor.i64, [2]
//   b:      tensor.i64, [3]
//   return: tensor.i64, [2, 3]
//
// Two implementations are wrapped in the same contract. The correct one
// passes. The other builds the matrix the wrong way round, and the return
// check catches it even though both inputs were fine.
//
// A second contract states the same thing with symbols (N, M), so any vector
// lengths are accepted as long as the result is N x M.

use tensorcheck::prelude::*;

struct Vectors<'a> {
    a: &'a Tensor,
    b: &'a Tensor,
}

impl Bind for Vectors<'_> {
    fn bind(&self) -> Arguments<'_> {
        Arguments::new().tensor("a", self.a).tensor("b", self.b)
    }
}

fn outer(x: Vectors<'_>) -> Tensor {
    let (a, b) = (x.a.to_f64_vec(), x.b.to_f64_vec());
    let m = b.len();
    Tensor::from_fn((a.len(), m), x.a.dtype(), |k| a[k / m] * b[k % m])
}

fn outer_transposed(x: Vectors<'_>) -> Tensor {
    let (a, b) = (x.a.to_f64_vec(), x.b.to_f64_vec());
    let n = a.len();
    Tensor::from_fn((b.len(), n), x.a.dtype(), |k| b[k / n] * a[k % n])
}

fn concrete_spec() -> Result<AnnotationSpec> {
    AnnotationSpec::builder()
        .arg("a", ConstraintSet::new().dtype(DType::I64).shape(dims![2]))
        .arg("b", ConstraintSet::new().dtype(DType::I64).shape(dims![3]))
        .returns(ConstraintSet::new().dtype(DType::I64).shape(dims![2, 3]))
        .build()
}

fn report(label: &str, result: Result<Tensor>) {
    match result {
        Ok(t) => println!("{label:<20} Success: {} {:?}", t.shape(), t.to_f64_vec()),
        Err(err) => println!("{label:<20} {:?}: {err}", err.kind()),
    }
}

fn main() -> Result<()> {
    println!("=== tensorcheck - outer product ===");
    println!();

    let spec = concrete_spec()?;
    print!("{spec}");
    println!();

    let a = Tensor::from_slice(&[1i64, 2], 2)?;
    let b = Tensor::from_slice(&[3i64, 4, 5], 3)?;

    let good = tensorcheck(spec.clone(), outer);
    let bad = tensorcheck(spec, outer_transposed);
    report("outer:", good.call(Vectors { a: &a, b: &b }));
    report("outer_transposed:", bad.call(Vectors { a: &a, b: &b }));
    println!();

    let symbolic = declaration::from_json_str(
        r#"{
            "a": { "dtype": "tensor.i64", "shape": ["N"] },
            "b": { "dtype": "tensor.i64", "shape": ["M"] },
            "return": { "dtype": "tensor.i64", "shape": ["N", "M"] }
        }"#,
    )?;
    let checked = tensorcheck(symbolic, outer);
    for n in 1..=4usize {
        let a = Tensor::full(n, 2.0, DType::I64);
        let b = Tensor::ones(5 - n, DType::I64);
        let out = checked.call(Vectors { a: &a, b: &b })?;
        println!("N={n}, M={}: result {}", 5 - n, out.shape());
    }

    Ok(())
}
