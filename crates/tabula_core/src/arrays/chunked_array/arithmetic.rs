use std::ops::{Add, Div, Mul, Sub};
use std::sync::Arc;

use tabula_error::Result;

use super::ops::binary_elementwise;
use super::{BooleanChunked, PrimitiveChunked};
use crate::arrays::bitmap::Bitmap;
use crate::arrays::chunk::Chunk;
use crate::arrays::datatype::DataType;
use crate::arrays::native::NativeType;
use crate::buffer::AlignedVec;

impl<T: NativeType> PrimitiveChunked<T> {
    /// Apply an infallible operation to every pair of values.
    ///
    /// Arrays of the same length that are made of a single chunk without nulls
    /// are computed directly on the underlying slices.
    fn apply_total<F>(&self, rhs: &Self, op: F) -> Result<Self>
    where
        F: Fn(T, T) -> T,
    {
        if let (Ok(left), Ok(right)) = (self.cont_slice(), rhs.cont_slice()) {
            if left.len() == right.len() {
                let values: AlignedVec<T> =
                    left.iter().zip(right).map(|(&a, &b)| op(a, b)).collect();
                return Ok(Self::from_chunk(
                    self.name(),
                    self.dtype().clone(),
                    Chunk::from_values(values),
                ));
            }
        }

        binary_elementwise(self, rhs, self.name(), self.dtype().clone(), |a, b| {
            Some(op(a?, b?))
        })
    }

    pub fn wrapping_add(&self, rhs: &Self) -> Result<Self> {
        self.apply_total(rhs, T::wrapping_add)
    }

    pub fn wrapping_sub(&self, rhs: &Self) -> Result<Self> {
        self.apply_total(rhs, T::wrapping_sub)
    }

    pub fn wrapping_mul(&self, rhs: &Self) -> Result<Self> {
        self.apply_total(rhs, T::wrapping_mul)
    }

    /// Divide values. Integer division by zero produces null.
    pub fn wrapping_div(&self, rhs: &Self) -> Result<Self> {
        binary_elementwise(self, rhs, self.name(), self.dtype().clone(), |a, b| {
            a?.checked_div(b?)
        })
    }
}

macro_rules! impl_arith_op {
    ($trait:ident, $fn:ident, $method:ident) => {
        impl<T: NativeType> $trait for &PrimitiveChunked<T> {
            type Output = Result<PrimitiveChunked<T>>;

            fn $fn(self, rhs: Self) -> Self::Output {
                self.$method(rhs)
            }
        }
    };
}

impl_arith_op!(Add, add, wrapping_add);
impl_arith_op!(Sub, sub, wrapping_sub);
impl_arith_op!(Mul, mul, wrapping_mul);
impl_arith_op!(Div, div, wrapping_div);

/// Combine the validity of two chunks of the same length, a row is valid if
/// it's valid on both sides.
fn and_validity(left: Option<&Bitmap>, right: Option<&Bitmap>) -> Result<Option<Bitmap>> {
    Ok(match (left, right) {
        (Some(left), Some(right)) => {
            let mut validity = left.clone();
            validity.bit_and_mut(right)?;
            Some(validity)
        }
        (Some(v), None) | (None, Some(v)) => Some(v.clone()),
        (None, None) => None,
    })
}

impl BooleanChunked {
    /// Get the only chunk if the array is made of exactly one.
    fn single_chunk(&self) -> Option<&Chunk<Bitmap>> {
        match self.chunks() {
            [chunk] => Some(chunk),
            _ => None,
        }
    }

    /// Combine single chunk arrays of the same length a byte at a time.
    ///
    /// Returns None if either side doesn't fit.
    fn bitwise(
        &self,
        rhs: &Self,
        op: fn(&mut Bitmap, &Bitmap) -> Result<()>,
    ) -> Result<Option<Self>> {
        let (Some(left), Some(right)) = (self.single_chunk(), rhs.single_chunk()) else {
            return Ok(None);
        };
        if left.len() != right.len() {
            return Ok(None);
        }

        let mut values = left.values().clone();
        op(&mut values, right.values())?;
        let validity = and_validity(left.validity(), right.validity())?;

        Ok(Some(Self::from_chunk(
            self.name(),
            DataType::Boolean,
            Chunk::from_parts(values, validity),
        )))
    }

    /// Logical and, null if either side is null.
    pub fn and(&self, rhs: &Self) -> Result<Self> {
        if let Some(out) = self.bitwise(rhs, Bitmap::bit_and_mut)? {
            return Ok(out);
        }
        binary_elementwise(self, rhs, self.name(), DataType::Boolean, |a, b| {
            Some(a? && b?)
        })
    }

    /// Logical or, null if either side is null.
    pub fn or(&self, rhs: &Self) -> Result<Self> {
        if let Some(out) = self.bitwise(rhs, Bitmap::bit_or_mut)? {
            return Ok(out);
        }
        binary_elementwise(self, rhs, self.name(), DataType::Boolean, |a, b| {
            Some(a? || b?)
        })
    }

    pub fn not(&self) -> Self {
        let chunks = self.chunks().iter().map(|chunk| {
            let mut values = chunk.values().clone();
            values.bit_negate();
            Arc::new(Chunk::from_parts(values, chunk.validity().cloned()))
        });
        Self::from_chunks(self.name(), DataType::Boolean, chunks)
    }

    /// Indices of the rows that are true. Null counts as false.
    pub fn true_indices(&self) -> Result<Vec<usize>> {
        let mut indices = Vec::with_capacity(self.len() - self.null_count());
        for (chunk, offset) in self.chunks().iter().zip(self.offsets()) {
            let mut selected = chunk.values().clone();
            if let Some(validity) = chunk.validity() {
                selected.bit_and_mut(validity)?;
            }
            indices.extend(selected.index_iter().map(|idx| idx + offset));
        }
        Ok(indices)
    }

    /// Check if every row is true.
    pub fn all_true(&self) -> bool {
        self.null_count() == 0 && self.chunks().iter().all(|c| c.values().is_all_true())
    }
}

#[cfg(test)]
mod tests {
    use tabula_error::ErrorKind;

    use super::*;
    use crate::arrays::chunked_array::{Float64Chunked, Int32Chunked};

    #[test]
    fn add_fast_path() {
        let a = Int32Chunked::from_slice("a", &[1, 2, 3]);
        let b = Int32Chunked::from_slice("b", &[10, 20, 30]);
        let out = (&a + &b).unwrap();

        assert_eq!("a", out.name());
        assert_eq!(&[11, 22, 33], out.cont_slice().unwrap());
    }

    #[test]
    fn add_propagates_nulls() {
        let a = Int32Chunked::from_options("a", &[Some(1), None, Some(3)]);
        let b = Int32Chunked::from_slice("b", &[1, 1, 1]);
        let out = (&a - &b).unwrap();
        assert_eq!(vec![Some(0), None, Some(2)], out.iter().collect::<Vec<_>>());
    }

    #[test]
    fn broadcast_scalar() {
        let a = Int32Chunked::from_slice("a", &[1, 2, 3]);
        let b = Int32Chunked::from_slice("b", &[2]);
        let out = (&a * &b).unwrap();
        assert_eq!(
            vec![Some(2), Some(4), Some(6)],
            out.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn length_mismatch() {
        let a = Int32Chunked::from_slice("a", &[1, 2, 3]);
        let b = Int32Chunked::from_slice("b", &[1, 2]);
        let err = (&a + &b).unwrap_err();
        assert_eq!(ErrorKind::Construction, err.kind());
    }

    #[test]
    fn integer_div_by_zero_is_null() {
        let a = Int32Chunked::from_slice("a", &[6, 1]);
        let b = Int32Chunked::from_slice("b", &[3, 0]);
        let out = (&a / &b).unwrap();
        assert_eq!(vec![Some(2), None], out.iter().collect::<Vec<_>>());

        let a = Float64Chunked::from_slice("a", &[1.0]);
        let b = Float64Chunked::from_slice("b", &[0.0]);
        let out = (&a / &b).unwrap();
        assert_eq!(vec![Some(f64::INFINITY)], out.iter().collect::<Vec<_>>());
    }

    #[test]
    fn wrapping_overflow() {
        let a = Int32Chunked::from_slice("a", &[i32::MAX]);
        let b = Int32Chunked::from_slice("b", &[1]);
        let out = a.wrapping_add(&b).unwrap();
        assert_eq!(vec![Some(i32::MIN)], out.iter().collect::<Vec<_>>());
    }

    #[test]
    fn boolean_logic() {
        let a = BooleanChunked::from_options("a", &[Some(true), Some(true), None]);
        let b = BooleanChunked::from_slice("b", &[true, false, true]);

        assert_eq!(
            vec![Some(true), Some(false), None],
            a.and(&b).unwrap().iter().collect::<Vec<_>>()
        );
        assert_eq!(
            vec![Some(true), Some(true), None],
            a.or(&b).unwrap().iter().collect::<Vec<_>>()
        );
        assert_eq!(
            vec![Some(false), Some(false), None],
            a.not().iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn boolean_logic_across_chunks() {
        let mut a = BooleanChunked::from_options("a", &[Some(true), None]);
        a.append(&BooleanChunked::from_slice("", &[false, true])).unwrap();
        let b = BooleanChunked::from_options("b", &[Some(true), Some(true), None, Some(false)]);

        assert_eq!(
            vec![Some(true), None, None, Some(false)],
            a.and(&b).unwrap().iter().collect::<Vec<_>>()
        );
        assert_eq!(
            vec![Some(true), None, None, Some(true)],
            b.or(&a).unwrap().iter().collect::<Vec<_>>()
        );
        assert_eq!(
            vec![Some(false), None, Some(true), Some(false)],
            a.not().iter().collect::<Vec<_>>()
        );
        assert_eq!(2, a.not().n_chunks());
    }

    #[test]
    fn validity_combined_on_both_sides() {
        let a = BooleanChunked::from_options("a", &[None, Some(true), Some(true), Some(false)]);
        let b = BooleanChunked::from_options("b", &[Some(true), Some(true), None, Some(false)]);
        let out = a.or(&b).unwrap();
        assert_eq!(2, out.null_count());
        assert_eq!(
            vec![None, Some(true), None, Some(false)],
            out.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn true_indices_skip_nulls() {
        let mut mask = BooleanChunked::from_options("m", &[Some(true), None, Some(false)]);
        mask.append(&BooleanChunked::from_slice("", &[true; 9])).unwrap();
        let expected: Vec<usize> = std::iter::once(0).chain(3..12).collect();
        assert_eq!(expected, mask.true_indices().unwrap());
        assert!(!mask.all_true());
        assert!(BooleanChunked::from_slice("m", &[true; 10]).all_true());
    }
}
