use std::sync::Arc;

use half::{bf16, f16};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::dtype::{DType, Element, ElementType, WithDType};
use crate::error::{Error, Result};
use crate::handle::{nan_max, nan_min, AsValue, Family, TensorHandle, Value};
use crate::shape::Shape;

// Tensor - the tag-typed array family
//
// A Tensor is a dense, row-major n-dimensional array whose element type is an
// intrinsic tag stored next to the data, the way a torch tensor carries its
// dtype. Unlike an ndarray array it is not generic over its element: a
// Tensor of f32 and a Tensor of u8 have the same Rust type and differ only in
// their DType.
//
// MEMORY MODEL:
//
//   Storage is behind Arc, so cloning a Tensor is O(1). Tensors are
//   immutable; conversions allocate new storage.

/// Flat element buffer, one variant per DType.
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    F16(Vec<f16>),
    BF16(Vec<bf16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    U8(Vec<u8>),
    U32(Vec<u32>),
    I64(Vec<i64>),
}

// Run `$body` with `$v` bound to the typed vec, whatever the variant.
macro_rules! with_storage {
    ($storage:expr, $v:ident => $body:expr) => {
        match $storage {
            Storage::F16($v) => $body,
            Storage::BF16($v) => $body,
            Storage::F32($v) => $body,
            Storage::F64($v) => $body,
            Storage::U8($v) => $body,
            Storage::U32($v) => $body,
            Storage::I64($v) => $body,
        }
    };
}

impl Storage {
    /// Build storage of `dtype` from f64 values.
    pub fn from_f64(data: &[f64], dtype: DType) -> Self {
        fn cast<T: WithDType>(data: &[f64]) -> Storage {
            T::into_storage(data.iter().map(|&x| T::from_f64(x)).collect())
        }
        match dtype {
            DType::F16 => cast::<f16>(data),
            DType::BF16 => cast::<bf16>(data),
            DType::F32 => cast::<f32>(data),
            DType::F64 => cast::<f64>(data),
            DType::U8 => cast::<u8>(data),
            DType::U32 => cast::<u32>(data),
            DType::I64 => cast::<i64>(data),
        }
    }

    /// The tag of this storage.
    pub fn dtype(&self) -> DType {
        match self {
            Storage::F16(_) => DType::F16,
            Storage::BF16(_) => DType::BF16,
            Storage::F32(_) => DType::F32,
            Storage::F64(_) => DType::F64,
            Storage::U8(_) => DType::U8,
            Storage::U32(_) => DType::U32,
            Storage::I64(_) => DType::I64,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        with_storage!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy every element out as f64.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_storage!(self, v => v.iter().map(|&x| Element::to_f64(x)).collect())
    }

    fn min(&self) -> f64 {
        with_storage!(self, v => nan_min(v.iter().map(|&x| Element::to_f64(x))))
    }

    fn max(&self) -> f64 {
        with_storage!(self, v => nan_max(v.iter().map(|&x| Element::to_f64(x))))
    }
}

/// A dense n-dimensional array with an intrinsic dtype tag.
///
/// # Example
/// ```
/// use tensorcheck_core::{DType, Tensor};
///
/// let t = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0], (2, 2))?;
/// assert_eq!(t.dtype(), DType::F32);
/// assert_eq!(t.dims(), &[2, 2]);
/// # Ok::<(), tensorcheck_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    storage: Arc<Storage>,
    shape: Shape,
}

impl Tensor {
    // Constructors

    fn from_storage(storage: Storage, shape: Shape) -> Result<Self> {
        let expected = shape.elem_count();
        if storage.len() != expected {
            return Err(Error::ElementCountMismatch {
                shape,
                expected,
                got: storage.len(),
            });
        }
        Ok(Tensor {
            storage: Arc::new(storage),
            shape,
        })
    }

    /// Create a tensor from a typed vec. The dtype follows `T`.
    pub fn from_vec<T: WithDType>(data: Vec<T>, shape: impl Into<Shape>) -> Result<Self> {
        Self::from_storage(T::into_storage(data), shape.into())
    }

    /// Create a tensor from a typed slice. The dtype follows `T`.
    pub fn from_slice<T: WithDType>(data: &[T], shape: impl Into<Shape>) -> Result<Self> {
        Self::from_vec(data.to_vec(), shape)
    }

    /// Create a tensor of `dtype` from f64 values (cast per element).
    pub fn from_f64_slice(data: &[f64], shape: impl Into<Shape>, dtype: DType) -> Result<Self> {
        Self::from_storage(Storage::from_f64(data, dtype), shape.into())
    }

    /// Create a tensor by evaluating `f` at every flat, row-major index.
    pub fn from_fn(shape: impl Into<Shape>, dtype: DType, f: impl FnMut(usize) -> f64) -> Self {
        let shape = shape.into();
        let data: Vec<f64> = (0..shape.elem_count()).map(f).collect();
        Tensor {
            storage: Arc::new(Storage::from_f64(&data, dtype)),
            shape,
        }
    }

    /// Create a tensor filled with a constant value.
    pub fn full(shape: impl Into<Shape>, val: f64, dtype: DType) -> Self {
        Self::from_fn(shape, dtype, |_| val)
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: impl Into<Shape>, dtype: DType) -> Self {
        Self::full(shape, 0.0, dtype)
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: impl Into<Shape>, dtype: DType) -> Self {
        Self::full(shape, 1.0, dtype)
    }

    /// Create a tensor with uniform random values in [low, high).
    pub fn uniform(shape: impl Into<Shape>, low: f64, high: f64, dtype: DType) -> Self {
        let mut rng = rand::thread_rng();
        Self::from_fn(shape, dtype, |_| low + (high - low) * rng.gen::<f64>())
    }

    /// Create a tensor with uniform random values in [0, 1).
    pub fn rand(shape: impl Into<Shape>, dtype: DType) -> Self {
        Self::uniform(shape, 0.0, 1.0, dtype)
    }

    /// Create a tensor with random normal values (mean=0, std=1).
    pub fn randn(shape: impl Into<Shape>, dtype: DType) -> Self {
        let mut rng = rand::thread_rng();
        Self::from_fn(shape, dtype, |_| rng.sample::<f64, _>(StandardNormal))
    }

    // Accessors

    /// The shape of this tensor.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Total number of elements.
    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    /// The dtype tag.
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Copy every element out as f64, in row-major order.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.storage.to_f64_vec()
    }

    // Conversions

    /// Cast to another dtype. Returns a cheap clone if the dtype already matches.
    pub fn to_dtype(&self, dtype: DType) -> Tensor {
        if dtype == self.dtype() {
            return self.clone();
        }
        Tensor {
            storage: Arc::new(Storage::from_f64(&self.to_f64_vec(), dtype)),
            shape: self.shape.clone(),
        }
    }
}

impl TensorHandle for Tensor {
    fn family(&self) -> Family {
        Family::Tensor
    }

    fn shape(&self) -> Shape {
        self.shape.clone()
    }

    fn element_type(&self) -> ElementType {
        ElementType::Tag(self.dtype())
    }

    fn min(&self) -> f64 {
        self.storage.min()
    }

    fn max(&self) -> f64 {
        self.storage.max()
    }
}

impl AsValue for Tensor {
    fn as_value(&self) -> Value<'_> {
        Value::Tensor(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_infers_dtype() {
        let t = Tensor::from_slice(&[1u8, 2, 3, 4, 5, 6], (2, 3)).unwrap();
        assert_eq!(t.dtype(), DType::U8);
        assert_eq!(t.dims(), &[2, 3]);
        assert_eq!(t.element_type(), ElementType::Tag(DType::U8));
    }

    #[test]
    fn test_element_count_mismatch() {
        let err = Tensor::from_slice(&[1.0f32, 2.0, 3.0], (2, 2)).unwrap_err();
        assert!(matches!(
            err,
            Error::ElementCountMismatch {
                expected: 4,
                got: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_from_f64_slice_casts() {
        let t = Tensor::from_f64_slice(&[0.4, 254.7, 300.0], 3, DType::U8).unwrap();
        assert_eq!(t.to_f64_vec(), vec![0.0, 254.0, 255.0]);
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let t = Tensor::from_fn((2, 3), DType::I64, |k| k as f64 * 10.0);
        assert_eq!(t.to_f64_vec(), vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(t.dtype(), DType::I64);
    }

    #[test]
    fn test_min_max() {
        let t = Tensor::from_slice(&[-2.0f64, 5.0, 0.5, 1.0], (2, 2)).unwrap();
        assert_eq!(TensorHandle::min(&t), -2.0);
        assert_eq!(TensorHandle::max(&t), 5.0);
    }

    #[test]
    fn test_half_tensor() {
        let t = Tensor::full((2, 2), 2.0, DType::BF16);
        assert_eq!(t.dtype(), DType::BF16);
        assert_eq!(TensorHandle::max(&t), 2.0);
    }

    #[test]
    fn test_rand_in_unit_interval() {
        let t = Tensor::rand((4, 8), DType::F32);
        assert_eq!(t.elem_count(), 32);
        assert!(TensorHandle::min(&t) >= 0.0);
        assert!(TensorHandle::max(&t) <= 1.0);
    }

    #[test]
    fn test_uniform_bounds() {
        let t = Tensor::uniform(100, -5.0, 5.0, DType::F64);
        assert!(TensorHandle::min(&t) >= -5.0);
        assert!(TensorHandle::max(&t) < 5.0);
    }

    #[test]
    fn test_randn_shape() {
        let t = Tensor::randn((1, 1, 3, 2), DType::F32);
        assert_eq!(t.shape(), &Shape::from((1, 1, 3, 2)));
    }

    #[test]
    fn test_to_dtype() {
        let t = Tensor::from_slice(&[1.5f64, 2.5], 2).unwrap();
        let u = t.to_dtype(DType::F32);
        assert_eq!(u.dtype(), DType::F32);
        assert_eq!(u.to_f64_vec(), vec![1.5, 2.5]);
        assert_eq!(t.to_dtype(DType::F64), t);
    }
}
