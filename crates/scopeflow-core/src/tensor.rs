//! Dense tensors with typed contiguous storage.
//!
//! A [`Tensor`] owns its buffer. Cloning (or [`Tensor::dup`]) always yields
//! storage that is independent of the original; there is no aliasing between
//! tensors.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::CoreError;

/// Element type of a tensor, in promotion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    I32,
    I64,
    F32,
    F64,
}

impl DataType {
    /// Returns the wider of two types (`Bool < I32 < I64 < F32 < F64`).
    pub fn promote(self, other: DataType) -> DataType {
        self.max(other)
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "bool",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// Memory order tag of the underlying buffer.
///
/// The tag is recorded and carried through [`Tensor::dup`] but never used to
/// reorder data: elements are always addressed by their flat buffer index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Order {
    /// Row-major.
    #[default]
    C,
    /// Column-major.
    F,
}

/// Typed element buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TensorData {
    Bool(Vec<bool>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl TensorData {
    pub fn dtype(&self) -> DataType {
        match self {
            TensorData::Bool(_) => DataType::Bool,
            TensorData::I32(_) => DataType::I32,
            TensorData::I64(_) => DataType::I64,
            TensorData::F32(_) => DataType::F32,
            TensorData::F64(_) => DataType::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TensorData::Bool(v) => v.len(),
            TensorData::I32(v) => v.len(),
            TensorData::I64(v) => v.len(),
            TensorData::F32(v) => v.len(),
            TensorData::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widens every element to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            TensorData::Bool(v) => v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect(),
            TensorData::I32(v) => v.iter().map(|&x| x as f64).collect(),
            TensorData::I64(v) => v.iter().map(|&x| x as f64).collect(),
            TensorData::F32(v) => v.iter().map(|&x| x as f64).collect(),
            TensorData::F64(v) => v.clone(),
        }
    }

    /// Builds a buffer of type `dtype` from `f64` values, truncating toward
    /// zero for integer types.
    pub fn from_f64(dtype: DataType, values: &[f64]) -> TensorData {
        match dtype {
            DataType::Bool => TensorData::Bool(values.iter().map(|&x| x != 0.0).collect()),
            DataType::I32 => TensorData::I32(values.iter().map(|&x| x as i32).collect()),
            DataType::I64 => TensorData::I64(values.iter().map(|&x| x as i64).collect()),
            DataType::F32 => TensorData::F32(values.iter().map(|&x| x as f32).collect()),
            DataType::F64 => TensorData::F64(values.to_vec()),
        }
    }
}

/// A dense n-dimensional tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    shape: SmallVec<[usize; 4]>,
    order: Order,
    data: TensorData,
}

impl Tensor {
    /// Creates a tensor, checking that `shape` matches the element count.
    pub fn new(shape: &[usize], data: TensorData) -> Result<Self, CoreError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(CoreError::ShapeMismatch {
                shape: shape.to_vec(),
                len: data.len(),
            });
        }
        Ok(Tensor {
            shape: SmallVec::from_slice(shape),
            order: Order::C,
            data,
        })
    }

    /// Same as [`Tensor::new`] with an explicit memory order tag. `data` is
    /// taken as already laid out in that order.
    pub fn with_order(shape: &[usize], data: TensorData, order: Order) -> Result<Self, CoreError> {
        let mut tensor = Tensor::new(shape, data)?;
        tensor.order = order;
        Ok(tensor)
    }

    pub fn scalar_i32(value: i32) -> Self {
        Tensor::rank0(TensorData::I32(vec![value]))
    }

    pub fn scalar_i64(value: i64) -> Self {
        Tensor::rank0(TensorData::I64(vec![value]))
    }

    pub fn scalar_f32(value: f32) -> Self {
        Tensor::rank0(TensorData::F32(vec![value]))
    }

    pub fn scalar_f64(value: f64) -> Self {
        Tensor::rank0(TensorData::F64(vec![value]))
    }

    pub fn scalar_bool(value: bool) -> Self {
        Tensor::rank0(TensorData::Bool(vec![value]))
    }

    /// 1-D `f32` vector.
    pub fn vector_f32(values: Vec<f32>) -> Self {
        let len = values.len();
        Tensor {
            shape: SmallVec::from_slice(&[len]),
            order: Order::C,
            data: TensorData::F32(values),
        }
    }

    fn rank0(data: TensorData) -> Self {
        Tensor {
            shape: SmallVec::new(),
            order: Order::C,
            data,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn dtype(&self) -> DataType {
        self.data.dtype()
    }

    pub fn data(&self) -> &TensorData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Deep copy preserving shape, memory order and element type.
    pub fn dup(&self) -> Tensor {
        Tensor {
            shape: self.shape.clone(),
            order: self.order,
            data: self.data.clone(),
        }
    }

    /// Reads element `index` as an integer. Floats truncate toward zero,
    /// booleans read as 0/1.
    pub fn element_as_i64(&self, index: usize) -> Option<i64> {
        match &self.data {
            TensorData::Bool(v) => v.get(index).map(|&b| b as i64),
            TensorData::I32(v) => v.get(index).map(|&x| x as i64),
            TensorData::I64(v) => v.get(index).copied(),
            TensorData::F32(v) => v.get(index).map(|&x| x as i64),
            TensorData::F64(v) => v.get(index).map(|&x| x as i64),
        }
    }

    /// Reads element `index` widened to `f64`.
    pub fn element_as_f64(&self, index: usize) -> Option<f64> {
        match &self.data {
            TensorData::Bool(v) => v.get(index).map(|&b| if b { 1.0 } else { 0.0 }),
            TensorData::I32(v) => v.get(index).map(|&x| x as f64),
            TensorData::I64(v) => v.get(index).map(|&x| x as f64),
            TensorData::F32(v) => v.get(index).map(|&x| x as f64),
            TensorData::F64(v) => v.get(index).copied(),
        }
    }

    /// Overwrites element `index`, converting `value` to the tensor's type.
    pub fn set_element(&mut self, index: usize, value: f64) -> Result<(), CoreError> {
        let len = self.len();
        let out_of_bounds = CoreError::IndexOutOfBounds { index, len };
        match &mut self.data {
            TensorData::Bool(v) => *v.get_mut(index).ok_or(out_of_bounds)? = value != 0.0,
            TensorData::I32(v) => *v.get_mut(index).ok_or(out_of_bounds)? = value as i32,
            TensorData::I64(v) => *v.get_mut(index).ok_or(out_of_bounds)? = value as i64,
            TensorData::F32(v) => *v.get_mut(index).ok_or(out_of_bounds)? = value as f32,
            TensorData::F64(v) => *v.get_mut(index).ok_or(out_of_bounds)? = value,
        }
        Ok(())
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.dtype(), self.shape.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_checks_element_count() {
        assert!(Tensor::new(&[2, 3], TensorData::F32(vec![0.0; 6])).is_ok());
        match Tensor::new(&[2, 3], TensorData::F32(vec![0.0; 5])) {
            Err(CoreError::ShapeMismatch { shape, len }) => {
                assert_eq!(shape, vec![2, 3]);
                assert_eq!(len, 5);
            }
            other => panic!("expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn dup_is_storage_independent() {
        let original = Tensor::with_order(&[2, 2], TensorData::I64(vec![1, 2, 3, 4]), Order::F)
            .unwrap();
        let mut copy = original.dup();
        assert_eq!(copy, original);
        assert_eq!(copy.order(), Order::F);

        copy.set_element(0, 42.0).unwrap();
        assert_eq!(original.element_as_i64(0), Some(1));
        assert_eq!(copy.element_as_i64(0), Some(42));
    }

    #[test]
    fn order_tag_does_not_move_elements() {
        let data = TensorData::I32(vec![1, 2, 3, 4, 5, 6]);
        let c = Tensor::new(&[2, 3], data.clone()).unwrap();
        let f = Tensor::with_order(&[2, 3], data, Order::F).unwrap();
        assert_eq!(c.order(), Order::C);
        assert_eq!(f.dup().order(), Order::F);
        assert_eq!(c.data(), f.data());
        for i in 0..6 {
            assert_eq!(c.element_as_i64(i), f.element_as_i64(i));
        }
        assert_ne!(c, f);
    }

    #[test]
    fn element_as_i64_truncates_floats() {
        assert_eq!(Tensor::scalar_f64(0.9).element_as_i64(0), Some(0));
        assert_eq!(Tensor::scalar_f32(-2.7).element_as_i64(0), Some(-2));
        assert_eq!(Tensor::scalar_bool(true).element_as_i64(0), Some(1));
        assert_eq!(Tensor::scalar_i32(5).element_as_i64(1), None);
    }

    #[test]
    fn set_element_out_of_bounds() {
        let mut t = Tensor::vector_f32(vec![1.0, 2.0]);
        assert!(matches!(
            t.set_element(2, 0.0),
            Err(CoreError::IndexOutOfBounds { index: 2, len: 2 })
        ));
    }

    #[test]
    fn promotion_order() {
        assert_eq!(DataType::I32.promote(DataType::F32), DataType::F32);
        assert_eq!(DataType::Bool.promote(DataType::I64), DataType::I64);
        assert_eq!(DataType::F64.promote(DataType::I32), DataType::F64);
    }

    #[test]
    fn scalars_have_rank_zero() {
        let t = Tensor::scalar_i32(3);
        assert!(t.shape().is_empty());
        assert_eq!(t.len(), 1);
        assert_eq!(format!("{}", t), "i32[]");
    }
}
