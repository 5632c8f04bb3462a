use std::cmp::Ordering;
use std::sync::Arc;

use hashbrown::HashSet;
use tabula_error::{DbError, Result};

use super::builder::ChunkedBuilder;
use super::take::TakeRandom;
use super::{BooleanChunked, ChunkedArray};
use crate::arrays::HASH_RANDOM_STATE;
use crate::arrays::chunk::{Chunk, ChunkValues};
use crate::arrays::datatype::DataType;
use crate::arrays::scalar::ScalarValue;

/// Output length of an elementwise operation. Operands of length one
/// broadcast against the other side.
pub(crate) fn broadcast_len(left: usize, right: usize) -> Result<usize> {
    match (left, right) {
        (l, r) if l == r => Ok(l),
        (1, r) => Ok(r),
        (l, 1) => Ok(l),
        (l, r) => Err(DbError::construction("Operand lengths do not match")
            .with_field("left", l)
            .with_field("right", r)),
    }
}

/// Apply `op` to each pair of values, producing a new array.
pub(crate) fn binary_elementwise<'a, L, R, O, F>(
    lhs: &'a ChunkedArray<L>,
    rhs: &'a ChunkedArray<R>,
    name: &str,
    dtype: DataType,
    mut op: F,
) -> Result<ChunkedArray<O>>
where
    L: ChunkValues,
    R: ChunkValues,
    O: ChunkValues,
    F: FnMut(Option<L::Item<'a>>, Option<R::Item<'a>>) -> Option<O::Item<'a>>,
{
    let len = broadcast_len(lhs.len(), rhs.len())?;
    let mut builder = ChunkedBuilder::<O>::new(name, dtype, len);

    if lhs.len() == rhs.len() {
        for (l, r) in lhs.iter().zip(rhs.iter()) {
            builder.append_option(op(l, r));
        }
    } else if lhs.len() == 1 {
        let l = lhs.get(0)?;
        rhs.iter().for_each(|r| builder.append_option(op(l, r)));
    } else {
        let r = rhs.get(0)?;
        lhs.iter().for_each(|l| builder.append_option(op(l, r)));
    }

    Ok(builder.finish())
}

/// Copy `start..end` of a chunk into a new chunk.
fn copy_chunk_range<V: ChunkValues>(
    chunk: &Chunk<V>,
    dtype: &DataType,
    start: usize,
    end: usize,
) -> Chunk<V> {
    debug_assert!(start <= end && end <= chunk.len());

    let mut values = V::with_capacity(dtype, end - start);
    for idx in start..end {
        // SAFETY: Range is within the chunk.
        values.push_value(unsafe { chunk.values().value_unchecked(idx) });
    }
    let validity = chunk.validity().map(|v| v.slice(start, end - start));

    Chunk::from_parts(values, validity)
}

impl<V: ChunkValues> ChunkedArray<V> {
    /// Get the value at an index.
    pub fn get(&self, idx: usize) -> Result<Option<V::Item<'_>>> {
        if idx >= self.len() {
            return Err(DbError::out_of_bounds(idx, self.len()));
        }
        let (chunk_idx, idx) = self.chunk_index(idx);
        // SAFETY: Index translated from an in-bounds global index.
        Ok(unsafe { self.chunks()[chunk_idx].get_unchecked(idx) })
    }

    pub fn get_scalar(&self, idx: usize) -> Result<ScalarValue> {
        Ok(self
            .get(idx)?
            .map(V::to_scalar)
            .unwrap_or(ScalarValue::Null))
    }

    /// Gather values at the given indices.
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        let len = self.len();
        if let Some(&idx) = indices.iter().find(|&&idx| idx >= len) {
            return Err(DbError::out_of_bounds(idx, len));
        }
        // SAFETY: Indices checked above.
        Ok(unsafe { self.take_unchecked(indices.iter().copied(), indices.len()) })
    }

    /// Gather values at the given indices, a `None` index produces a null.
    pub fn take_opt(&self, indices: &[Option<usize>]) -> Result<Self> {
        let rand = self.take_rand();
        let mut builder =
            ChunkedBuilder::<V>::new(self.name(), self.dtype().clone(), indices.len());
        for idx in indices {
            match idx {
                Some(idx) => builder.append_option(rand.get(*idx)?),
                None => builder.append_null(),
            }
        }
        Ok(builder.finish())
    }

    /// Gather values without bounds checking the indices.
    ///
    /// # Safety
    ///
    /// Every index must be less than `len`.
    pub(crate) unsafe fn take_unchecked(
        &self,
        indices: impl Iterator<Item = usize>,
        cap: usize,
    ) -> Self {
        let rand = self.take_rand();
        let mut builder = ChunkedBuilder::<V>::new(self.name(), self.dtype().clone(), cap);
        for idx in indices {
            debug_assert!(idx < self.len());
            builder.append_option(unsafe { rand.get_unchecked(idx) });
        }
        builder.finish()
    }

    /// Slice the array.
    ///
    /// A negative offset counts from the end. Out of range offsets and lengths
    /// are clamped. Chunks fully inside the range are shared.
    pub fn slice(&self, offset: i64, length: usize) -> Self {
        let len = self.len();
        let start = if offset < 0 {
            len.saturating_sub(offset.unsigned_abs() as usize)
        } else {
            usize::min(offset as usize, len)
        };
        let end = usize::min(start.saturating_add(length), len);

        let offsets = self.offsets();
        let mut chunks = Vec::new();
        for (chunk_idx, chunk) in self.chunks().iter().enumerate() {
            let chunk_start = offsets[chunk_idx];
            let chunk_end = offsets[chunk_idx + 1];

            let lo = usize::max(start, chunk_start);
            let hi = usize::min(end, chunk_end);
            if lo >= hi {
                continue;
            }

            if lo == chunk_start && hi == chunk_end {
                chunks.push(chunk.clone());
            } else {
                chunks.push(Arc::new(copy_chunk_range(
                    chunk,
                    self.dtype(),
                    lo - chunk_start,
                    hi - chunk_start,
                )));
            }
        }

        Self::from_chunks(self.name(), self.dtype().clone(), chunks)
    }

    pub fn head(&self, n: usize) -> Self {
        self.slice(0, n)
    }

    pub fn tail(&self, n: usize) -> Self {
        let n = usize::min(n, self.len());
        self.slice((self.len() - n) as i64, n)
    }

    /// Keep values where the mask is true. Nulls in the mask drop the row.
    pub fn filter(&self, mask: &BooleanChunked) -> Result<Self> {
        if mask.len() == 1 && self.len() != 1 {
            return Ok(match mask.get(0)? {
                Some(true) => self.clone(),
                _ => self.slice(0, 0),
            });
        }

        if mask.len() != self.len() {
            return Err(DbError::construction("Filter mask length does not match")
                .with_field("mask", mask.len())
                .with_field("len", self.len()));
        }

        if mask.all_true() {
            return Ok(self.clone());
        }
        let indices = mask.true_indices()?;
        // SAFETY: Mask has the same length as the array.
        Ok(unsafe { self.take_unchecked(indices.iter().copied(), indices.len()) })
    }

    /// Shift values by `periods`, filling the vacated slots with nulls.
    ///
    /// Positive periods shift towards the end.
    pub fn shift(&self, periods: i64) -> Self {
        let len = self.len();
        let n = usize::min(periods.unsigned_abs() as usize, len);
        let nulls = Self::full_null(self.name(), self.dtype().clone(), n);

        if periods >= 0 {
            let body = self.slice(0, len - n);
            self.concat_chunks(&[&nulls, &body])
        } else {
            let body = self.slice(n as i64, len - n);
            self.concat_chunks(&[&body, &nulls])
        }
    }

    /// Create a new array with this array's name and type from the chunks of
    /// `parts`.
    fn concat_chunks(&self, parts: &[&Self]) -> Self {
        let chunks = parts.iter().flat_map(|p| p.chunks().iter().cloned());
        Self::from_chunks(self.name(), self.dtype().clone(), chunks)
    }

    pub fn reverse(&self) -> Self {
        // SAFETY: All indices are below len.
        unsafe { self.take_unchecked((0..self.len()).rev(), self.len()) }
    }

    /// Indices that would sort the array.
    ///
    /// The sort is stable and places nulls last regardless of direction.
    pub fn arg_sort(&self, descending: bool) -> Vec<usize> {
        let mut vals: Vec<(usize, Option<V::Item<'_>>)> = self.iter().enumerate().collect();
        vals.sort_by(|(_, a), (_, b)| match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => {
                let ord = V::cmp_item(*a, *b);
                if descending { ord.reverse() } else { ord }
            }
        });
        vals.into_iter().map(|(idx, _)| idx).collect()
    }

    pub fn sort(&self, descending: bool) -> Self {
        let indices = self.arg_sort(descending);
        // SAFETY: Sort indices are a permutation of 0..len.
        unsafe { self.take_unchecked(indices.into_iter(), self.len()) }
    }

    /// Pick values from `self` where the mask is true, from `other`
    /// otherwise. A null mask value picks from `other`.
    pub fn zip_with(&self, mask: &BooleanChunked, other: &Self) -> Result<Self> {
        if self.dtype() != other.dtype() {
            return Err(DbError::type_mismatch("Cannot zip arrays with different types")
                .with_field("left", self.dtype())
                .with_field("right", other.dtype()));
        }

        let len = broadcast_len(broadcast_len(self.len(), other.len())?, mask.len())?;
        let pick = |n: usize, idx: usize| if n == 1 { 0 } else { idx };

        let (left, right, cond) = (self.take_rand(), other.take_rand(), mask.take_rand());
        let mut builder = ChunkedBuilder::<V>::new(self.name(), self.dtype().clone(), len);
        for idx in 0..len {
            match cond.get(pick(mask.len(), idx))? {
                Some(true) => builder.append_option(left.get(pick(self.len(), idx))?),
                _ => builder.append_option(right.get(pick(other.len(), idx))?),
            }
        }

        Ok(builder.finish())
    }

    pub fn is_null(&self) -> BooleanChunked {
        BooleanChunked::from_values_iter(
            self.name(),
            DataType::Boolean,
            self.iter().map(|v| v.is_none()),
        )
    }

    pub fn is_not_null(&self) -> BooleanChunked {
        BooleanChunked::from_values_iter(
            self.name(),
            DataType::Boolean,
            self.iter().map(|v| v.is_some()),
        )
    }

    /// Replace values where the mask is true.
    pub fn set(&self, mask: &BooleanChunked, value: Option<V::Item<'_>>) -> Result<Self> {
        if mask.len() != self.len() {
            return Err(DbError::construction("Mask length does not match")
                .with_field("mask", mask.len())
                .with_field("len", self.len()));
        }

        let mut builder = ChunkedBuilder::<V>::new(self.name(), self.dtype().clone(), self.len());
        for (v, m) in self.iter().zip(mask.iter()) {
            if m == Some(true) {
                builder.append_option(value);
            } else {
                builder.append_option(v);
            }
        }
        Ok(builder.finish())
    }

    /// Replace values at the given indices.
    pub fn set_at_idx(&self, indices: &[usize], value: Option<V::Item<'_>>) -> Result<Self> {
        let mut selected = vec![false; self.len()];
        for &idx in indices {
            match selected.get_mut(idx) {
                Some(s) => *s = true,
                None => return Err(DbError::out_of_bounds(idx, self.len())),
            }
        }

        let mut builder = ChunkedBuilder::<V>::new(self.name(), self.dtype().clone(), self.len());
        for (v, s) in self.iter().zip(selected) {
            if s {
                builder.append_option(value);
            } else {
                builder.append_option(v);
            }
        }
        Ok(builder.finish())
    }

    /// Fill nulls with the last seen non-null value.
    pub fn fill_none_forward(&self) -> Self {
        let mut builder = ChunkedBuilder::<V>::new(self.name(), self.dtype().clone(), self.len());
        let mut last = None;
        for v in self.iter() {
            if v.is_some() {
                last = v;
            }
            builder.append_option(last);
        }
        builder.finish()
    }

    /// Fill nulls with the next non-null value.
    pub fn fill_none_backward(&self) -> Self {
        let mut filled: Vec<_> = self.iter().collect();
        let mut next = None;
        for v in filled.iter_mut().rev() {
            match v {
                Some(_) => next = *v,
                None => *v = next,
            }
        }
        Self::from_options_iter(self.name(), self.dtype().clone(), filled)
    }

    pub fn fill_none_with_value(&self, value: V::Item<'_>) -> Self {
        let mut builder = ChunkedBuilder::<V>::new(self.name(), self.dtype().clone(), self.len());
        for v in self.iter() {
            match v {
                Some(v) => builder.append_value(v),
                None => builder.append_value(value),
            }
        }
        builder.finish()
    }

    pub fn min_item(&self) -> Option<V::Item<'_>> {
        self.iter().flatten().min_by(|a, b| V::cmp_item(*a, *b))
    }

    pub fn max_item(&self) -> Option<V::Item<'_>> {
        self.iter().flatten().max_by(|a, b| V::cmp_item(*a, *b))
    }

    /// First value, None if the array is empty or the value is null.
    pub fn first(&self) -> Option<V::Item<'_>> {
        self.get(0).ok().flatten()
    }

    pub fn last(&self) -> Option<V::Item<'_>> {
        self.get(self.len().checked_sub(1)?).ok().flatten()
    }

    /// Index of the first occurrence of each distinct value, in order.
    ///
    /// Null counts as a distinct value.
    pub fn arg_unique(&self) -> Vec<usize> {
        let mut seen = HashSet::with_hasher(HASH_RANDOM_STATE);
        self.iter()
            .enumerate()
            .filter_map(|(idx, v)| {
                let key = v.map(V::to_scalar).unwrap_or(ScalarValue::Null);
                seen.insert(key).then_some(idx)
            })
            .collect()
    }

    pub fn unique(&self) -> Self {
        let indices = self.arg_unique();
        // SAFETY: Indices produced by enumerating this array.
        unsafe { self.take_unchecked(indices.iter().copied(), indices.len()) }
    }

    pub fn n_unique(&self) -> usize {
        self.arg_unique().len()
    }

    fn compare<F>(&self, other: &Self, pred: F) -> Result<BooleanChunked>
    where
        F: Fn(Option<Ordering>) -> bool,
    {
        binary_elementwise(self, other, self.name(), DataType::Boolean, |a, b| {
            match (a, b) {
                (Some(a), Some(b)) => Some(pred(V::partial_cmp_item(a, b))),
                _ => None,
            }
        })
    }

    pub fn equal(&self, other: &Self) -> Result<BooleanChunked> {
        self.compare(other, |ord| ord == Some(Ordering::Equal))
    }

    pub fn not_equal(&self, other: &Self) -> Result<BooleanChunked> {
        self.compare(other, |ord| ord != Some(Ordering::Equal))
    }

    pub fn gt(&self, other: &Self) -> Result<BooleanChunked> {
        self.compare(other, |ord| ord == Some(Ordering::Greater))
    }

    pub fn gt_eq(&self, other: &Self) -> Result<BooleanChunked> {
        self.compare(other, |ord| {
            matches!(ord, Some(Ordering::Greater | Ordering::Equal))
        })
    }

    pub fn lt(&self, other: &Self) -> Result<BooleanChunked> {
        self.compare(other, |ord| ord == Some(Ordering::Less))
    }

    pub fn lt_eq(&self, other: &Self) -> Result<BooleanChunked> {
        self.compare(other, |ord| {
            matches!(ord, Some(Ordering::Less | Ordering::Equal))
        })
    }
}
