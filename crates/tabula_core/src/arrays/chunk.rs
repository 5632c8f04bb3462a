use std::cmp::Ordering;
use std::fmt::Debug;

use tabula_error::{DbError, Result};

use super::bitmap::Bitmap;
use super::datatype::DataType;
use super::native::NativeType;
use super::scalar::ScalarValue;
use super::series::Series;
use crate::buffer::AlignedVec;

/// Physical storage for the values of a chunk.
///
/// Null slots still occupy a position in the values, holding a placeholder
/// (zero, false, empty string, or empty list).
pub trait ChunkValues: Debug + Clone + Send + Sync + 'static {
    /// Borrowed view of a single value.
    type Item<'a>: Copy + Debug
    where
        Self: 'a;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the value at an index.
    ///
    /// # Safety
    ///
    /// `idx` must be less than `len`.
    unsafe fn value_unchecked(&self, idx: usize) -> Self::Item<'_>;

    /// Create empty storage for an array of the given data type.
    fn with_capacity(dtype: &DataType, cap: usize) -> Self;

    fn push_value(&mut self, value: Self::Item<'_>);

    /// Push a placeholder for a null slot.
    fn push_null(&mut self);

    /// Total ordering used for sorting.
    fn cmp_item(a: Self::Item<'_>, b: Self::Item<'_>) -> Ordering;

    /// Ordering used for comparison operators, None when the values are not
    /// comparable (NaN).
    fn partial_cmp_item(a: Self::Item<'_>, b: Self::Item<'_>) -> Option<Ordering> {
        Some(Self::cmp_item(a, b))
    }

    fn to_scalar(item: Self::Item<'_>) -> ScalarValue;
}

impl<T: NativeType> ChunkValues for AlignedVec<T> {
    type Item<'a> = T;

    fn len(&self) -> usize {
        AlignedVec::len(self)
    }

    unsafe fn value_unchecked(&self, idx: usize) -> T {
        unsafe { *self.get_unchecked(idx) }
    }

    fn with_capacity(_dtype: &DataType, cap: usize) -> Self {
        AlignedVec::with_capacity(cap)
    }

    fn push_value(&mut self, value: T) {
        self.push(value)
    }

    fn push_null(&mut self) {
        self.push(T::zero())
    }

    fn cmp_item(a: T, b: T) -> Ordering {
        a.total_cmp(&b)
    }

    fn partial_cmp_item(a: T, b: T) -> Option<Ordering> {
        a.partial_cmp(&b)
    }

    fn to_scalar(item: T) -> ScalarValue {
        item.into_scalar()
    }
}

impl ChunkValues for Bitmap {
    type Item<'a> = bool;

    fn len(&self) -> usize {
        Bitmap::len(self)
    }

    unsafe fn value_unchecked(&self, idx: usize) -> bool {
        unsafe { Bitmap::value_unchecked(self, idx) }
    }

    fn with_capacity(_dtype: &DataType, cap: usize) -> Self {
        Bitmap::with_capacity(cap)
    }

    fn push_value(&mut self, value: bool) {
        self.push(value)
    }

    fn push_null(&mut self) {
        self.push(false)
    }

    fn cmp_item(a: bool, b: bool) -> Ordering {
        a.cmp(&b)
    }

    fn to_scalar(item: bool) -> ScalarValue {
        ScalarValue::Boolean(item)
    }
}

/// Variable length utf8 values.
///
/// Value `i` spans `data[offsets[i]..offsets[i + 1]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utf8Values {
    offsets: AlignedVec<usize>,
    data: AlignedVec<u8>,
}

impl Utf8Values {
    pub fn new() -> Self {
        Self::with_capacity(&DataType::Utf8, 0)
    }

    /// Total number of bytes of string data.
    pub fn data_len(&self) -> usize {
        self.data.len()
    }
}

impl Default for Utf8Values {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkValues for Utf8Values {
    type Item<'a> = &'a str;

    fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    unsafe fn value_unchecked(&self, idx: usize) -> &str {
        unsafe {
            let start = *self.offsets.get_unchecked(idx);
            let end = *self.offsets.get_unchecked(idx + 1);
            // SAFETY: Data is only ever written from `&str`.
            std::str::from_utf8_unchecked(self.data.get_unchecked(start..end))
        }
    }

    fn with_capacity(_dtype: &DataType, cap: usize) -> Self {
        let mut offsets = AlignedVec::with_capacity(cap + 1);
        offsets.push(0);
        Utf8Values {
            offsets,
            data: AlignedVec::with_capacity(cap * 8),
        }
    }

    fn push_value(&mut self, value: &str) {
        self.data.extend_from_slice(value.as_bytes());
        self.offsets.push(self.data.len());
    }

    fn push_null(&mut self) {
        self.offsets.push(self.data.len());
    }

    fn cmp_item(a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }

    fn to_scalar(item: &str) -> ScalarValue {
        ScalarValue::Utf8(item.to_string())
    }
}

/// Values for a list array, each value is a series of the inner type.
#[derive(Debug, Clone)]
pub struct ListValues {
    inner: DataType,
    values: AlignedVec<Series>,
}

impl ListValues {
    pub fn inner_dtype(&self) -> &DataType {
        &self.inner
    }
}

impl ChunkValues for ListValues {
    type Item<'a> = &'a Series;

    fn len(&self) -> usize {
        self.values.len()
    }

    unsafe fn value_unchecked(&self, idx: usize) -> &Series {
        unsafe { self.values.get_unchecked(idx) }
    }

    fn with_capacity(dtype: &DataType, cap: usize) -> Self {
        let inner = match dtype {
            DataType::List(inner) => inner.as_ref().clone(),
            other => other.clone(),
        };
        ListValues {
            inner,
            values: AlignedVec::with_capacity(cap),
        }
    }

    fn push_value(&mut self, value: &Series) {
        self.values.push(value.clone())
    }

    fn push_null(&mut self) {
        self.values.push(Series::new_empty("", &self.inner))
    }

    fn cmp_item(a: &Series, b: &Series) -> Ordering {
        ScalarValue::List(a.clone()).total_cmp(&ScalarValue::List(b.clone()))
    }

    fn to_scalar(item: &Series) -> ScalarValue {
        ScalarValue::List(item.clone())
    }
}

/// A contiguous run of values with an optional validity bitmap.
///
/// Immutable once built. The bitmap is only kept if there's at least one null.
#[derive(Debug, Clone)]
pub struct Chunk<V> {
    values: V,
    validity: Option<Bitmap>,
    null_count: usize,
}

impl<V: ChunkValues> Chunk<V> {
    /// Create a new chunk, erroring if the validity length doesn't match the
    /// number of values.
    pub fn new(values: V, validity: Option<Bitmap>) -> Result<Self> {
        if let Some(validity) = &validity {
            if validity.len() != values.len() {
                return Err(DbError::construction(
                    "Validity bitmap length does not match values length",
                )
                .with_field("values", values.len())
                .with_field("validity", validity.len()));
            }
        }
        Ok(Self::from_parts(values, validity))
    }

    /// Build a chunk from values and a validity bitmap of the same length.
    pub(crate) fn from_parts(values: V, validity: Option<Bitmap>) -> Self {
        debug_assert!(validity.as_ref().is_none_or(|v| v.len() == values.len()));

        let null_count = validity.as_ref().map(|v| v.count_falses()).unwrap_or(0);
        if null_count == 0 {
            return Self::from_values(values);
        }

        Chunk {
            values,
            validity,
            null_count,
        }
    }

    /// Create a chunk with no nulls.
    pub fn from_values(values: V) -> Self {
        Chunk {
            values,
            validity: None,
            null_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &V {
        &self.values
    }

    pub fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_ref()
    }

    pub fn null_count(&self) -> usize {
        self.null_count
    }

    /// Get the null count alongside the bitmap.
    pub fn get_bitmap(&self) -> (usize, Option<&Bitmap>) {
        (self.null_count, self.validity.as_ref())
    }

    /// Check if the value at an index is valid (not null).
    ///
    /// Panics if a bitmap is present and the index is out of bounds.
    pub fn is_valid(&self, idx: usize) -> bool {
        match &self.validity {
            Some(validity) => validity.value(idx),
            None => true,
        }
    }

    pub fn get(&self, idx: usize) -> Result<Option<V::Item<'_>>> {
        if idx >= self.len() {
            return Err(DbError::out_of_bounds(idx, self.len()));
        }
        // SAFETY: Bounds checked.
        Ok(unsafe { self.get_unchecked(idx) })
    }

    /// Get a value with null checking.
    ///
    /// # Safety
    ///
    /// `idx` must be less than `len`.
    pub unsafe fn get_unchecked(&self, idx: usize) -> Option<V::Item<'_>> {
        unsafe {
            match &self.validity {
                Some(validity) if !validity.value_unchecked(idx) => None,
                _ => Some(self.values.value_unchecked(idx)),
            }
        }
    }
}

impl<T: NativeType> Chunk<AlignedVec<T>> {
    pub fn from_slice(values: &[T]) -> Self {
        Self::from_values(AlignedVec::from_slice(values))
    }

    /// Copy `values` into a new aligned buffer and pair it with an existing
    /// bitmap.
    pub fn build_with_existing_null_bitmap_and_slice(
        values: &[T],
        validity: Option<Bitmap>,
    ) -> Result<Self> {
        Self::new(AlignedVec::from_slice(values), validity)
    }

    pub fn as_slice(&self) -> &[T] {
        self.values.as_slice()
    }
}
