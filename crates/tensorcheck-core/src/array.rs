// ndarray family
//
// Any `ArrayBase` (owned, view, shared, any dimensionality) whose element is
// an `Element` can be checked. The element type is answered by sampling the
// first element in logical order; an empty array falls back to the static
// type of its element.

use ndarray::{ArrayBase, Data, Dimension};

use crate::dtype::{Element, ElementType};
use crate::handle::{nan_max, nan_min, AsValue, Family, TensorHandle, Value};
use crate::shape::Shape;

impl<S, D> TensorHandle for ArrayBase<S, D>
where
    S: Data,
    S::Elem: Element,
    D: Dimension,
{
    fn family(&self) -> Family {
        Family::NdArray
    }

    fn shape(&self) -> Shape {
        Shape::from(ArrayBase::shape(self))
    }

    fn element_type(&self) -> ElementType {
        let sampled = match self.iter().next() {
            Some(x) => x.scalar_type(),
            None => <S::Elem as Element>::SCALAR_TYPE,
        };
        ElementType::Scalar(sampled)
    }

    fn min(&self) -> f64 {
        nan_min(self.iter().map(|&x| x.to_f64()))
    }

    fn max(&self) -> f64 {
        nan_max(self.iter().map(|&x| x.to_f64()))
    }
}

impl<S, D> AsValue for ArrayBase<S, D>
where
    S: Data,
    S::Elem: Element,
    D: Dimension,
{
    fn as_value(&self) -> Value<'_> {
        Value::Tensor(self)
    }
}
