//! Columns stored as a sequence of immutable chunks.
//!
//! A `ChunkedArray` shares its chunks through `Arc`, so appending one array to
//! another, slicing on chunk boundaries, and cloning never copy values.

pub mod aggregate;
pub mod arithmetic;
pub mod builder;
pub mod cast;
pub mod iter;
pub mod ops;
pub mod take;

use std::sync::Arc;

pub use aggregate::FillNoneStrategy;
pub use builder::{
    BooleanChunkedBuilder, ChunkedBuilder, ListChunkedBuilder, PrimitiveChunkedBuilder,
    Utf8ChunkedBuilder,
};
use tabula_error::{DbError, Result};

use super::bitmap::Bitmap;
use super::chunk::{Chunk, ChunkValues, ListValues, Utf8Values};
use super::datatype::DataType;
use super::native::NativeType;
use crate::buffer::AlignedVec;

pub type PrimitiveChunked<T> = ChunkedArray<AlignedVec<T>>;
pub type BooleanChunked = ChunkedArray<Bitmap>;
pub type Utf8Chunked = ChunkedArray<Utf8Values>;
pub type ListChunked = ChunkedArray<ListValues>;

pub type UInt8Chunked = PrimitiveChunked<u8>;
pub type UInt16Chunked = PrimitiveChunked<u16>;
pub type UInt32Chunked = PrimitiveChunked<u32>;
pub type UInt64Chunked = PrimitiveChunked<u64>;
pub type Int8Chunked = PrimitiveChunked<i8>;
pub type Int16Chunked = PrimitiveChunked<i16>;
pub type Int32Chunked = PrimitiveChunked<i32>;
pub type Int64Chunked = PrimitiveChunked<i64>;
pub type Float32Chunked = PrimitiveChunked<f32>;
pub type Float64Chunked = PrimitiveChunked<f64>;

/// A named, typed column made of one or more chunks.
#[derive(Debug, Clone)]
pub struct ChunkedArray<V: ChunkValues> {
    name: String,
    dtype: DataType,
    chunks: Vec<Arc<Chunk<V>>>,
    /// Cumulative chunk lengths, starts with 0 and has `chunks.len() + 1`
    /// entries.
    offsets: Vec<usize>,
    null_count: usize,
}

impl<V: ChunkValues> ChunkedArray<V> {
    /// Create an array from existing chunks.
    ///
    /// Empty chunks are dropped. An array with no values still holds a single
    /// empty chunk.
    pub fn from_chunks(
        name: impl Into<String>,
        dtype: DataType,
        chunks: impl IntoIterator<Item = Arc<Chunk<V>>>,
    ) -> Self {
        let mut chunks: Vec<_> = chunks.into_iter().filter(|c| !c.is_empty()).collect();
        if chunks.is_empty() {
            chunks.push(Arc::new(Chunk::from_values(V::with_capacity(&dtype, 0))));
        }

        let mut offsets = Vec::with_capacity(chunks.len() + 1);
        offsets.push(0);
        let mut null_count = 0;
        for chunk in &chunks {
            let last = offsets.last().copied().unwrap_or(0);
            offsets.push(last + chunk.len());
            null_count += chunk.null_count();
        }

        ChunkedArray {
            name: name.into(),
            dtype,
            chunks,
            offsets,
            null_count,
        }
    }

    pub fn from_chunk(name: impl Into<String>, dtype: DataType, chunk: Chunk<V>) -> Self {
        Self::from_chunks(name, dtype, [Arc::new(chunk)])
    }

    pub fn new_empty(name: impl Into<String>, dtype: DataType) -> Self {
        Self::from_chunks(name, dtype, [])
    }

    /// Create an array of `len` nulls.
    pub fn full_null(name: impl Into<String>, dtype: DataType, len: usize) -> Self {
        let mut builder = ChunkedBuilder::<V>::new(name, dtype, len);
        for _ in 0..len {
            builder.append_null();
        }
        builder.finish()
    }

    /// Create an array holding `len` copies of `value`.
    pub fn full(name: impl Into<String>, dtype: DataType, value: V::Item<'_>, len: usize) -> Self {
        let mut builder = ChunkedBuilder::<V>::new(name, dtype, len);
        for _ in 0..len {
            builder.append_value(value);
        }
        builder.finish()
    }

    pub fn from_options_iter<'a, I>(name: impl Into<String>, dtype: DataType, iter: I) -> Self
    where
        I: IntoIterator<Item = Option<V::Item<'a>>>,
    {
        let iter = iter.into_iter();
        let mut builder = ChunkedBuilder::<V>::new(name, dtype, iter.size_hint().0);
        for v in iter {
            builder.append_option(v);
        }
        builder.finish()
    }

    pub fn from_values_iter<'a, I>(name: impl Into<String>, dtype: DataType, iter: I) -> Self
    where
        I: IntoIterator<Item = V::Item<'a>>,
    {
        let iter = iter.into_iter();
        let mut builder = ChunkedBuilder::<V>::new(name, dtype, iter.size_hint().0);
        builder.append_values(iter);
        builder.finish()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.rename(name);
        self
    }

    pub fn dtype(&self) -> &DataType {
        &self.dtype
    }

    /// Swap the data type for another with the same physical type.
    pub(crate) fn with_logical_dtype(mut self, dtype: DataType) -> Self {
        debug_assert_eq!(self.dtype.physical(), dtype.physical());
        self.dtype = dtype;
        self
    }

    pub fn len(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        self.null_count
    }

    pub fn n_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[Arc<Chunk<V>>] {
        &self.chunks
    }

    pub fn chunk_lengths(&self) -> Vec<usize> {
        self.chunks.iter().map(|c| c.len()).collect()
    }

    /// Null counts and validity bitmaps for each chunk.
    pub fn get_bitmap(&self) -> Vec<(usize, Option<&Bitmap>)> {
        self.chunks.iter().map(|c| c.get_bitmap()).collect()
    }

    pub(crate) fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Translate a global index into a chunk index and an index within that
    /// chunk.
    ///
    /// `idx` must be in bounds.
    pub(crate) fn chunk_index(&self, idx: usize) -> (usize, usize) {
        index_to_chunk(&self.offsets, idx)
    }

    /// Append the chunks of `other` onto this array.
    ///
    /// Chunks are shared, no values are copied.
    pub fn append(&mut self, other: &Self) -> Result<()> {
        if self.dtype != other.dtype {
            return Err(DbError::type_mismatch("Cannot append arrays with different types")
                .with_field("left", &self.dtype)
                .with_field("right", &other.dtype));
        }

        let chunks: Vec<_> = self
            .chunks
            .iter()
            .chain(other.chunks.iter())
            .cloned()
            .collect();
        *self = Self::from_chunks(std::mem::take(&mut self.name), self.dtype.clone(), chunks);

        Ok(())
    }

    /// Copy all values into a single chunk.
    pub fn rechunk(&self) -> Self {
        if self.chunks.len() == 1 {
            return self.clone();
        }
        let mut builder = ChunkedBuilder::<V>::new(self.name(), self.dtype.clone(), self.len());
        for v in self.iter() {
            builder.append_option(v);
        }
        builder.finish()
    }
}

impl<T: NativeType> PrimitiveChunked<T> {
    pub fn from_slice(name: impl Into<String>, values: &[T]) -> Self {
        Self::from_chunk(name, T::DATATYPE, Chunk::from_slice(values))
    }

    pub fn from_options(name: impl Into<String>, values: &[Option<T>]) -> Self {
        Self::from_options_iter(name, T::DATATYPE, values.iter().copied())
    }

    /// Create an array from a slice and an existing validity bitmap.
    pub fn from_slice_and_validity(
        name: impl Into<String>,
        values: &[T],
        validity: Option<Bitmap>,
    ) -> Result<Self> {
        let chunk = Chunk::build_with_existing_null_bitmap_and_slice(values, validity)?;
        Ok(Self::from_chunk(name, T::DATATYPE, chunk))
    }

    /// Get the values of a single chunk array without nulls as a slice.
    pub fn cont_slice(&self) -> Result<&[T]> {
        if self.chunks.len() != 1 || self.null_count != 0 {
            return Err(DbError::new(
                "Contiguous slice requires a single chunk without nulls",
            ));
        }
        Ok(self.chunks[0].as_slice())
    }
}

impl BooleanChunked {
    pub fn from_slice(name: impl Into<String>, values: &[bool]) -> Self {
        Self::from_values_iter(name, DataType::Boolean, values.iter().copied())
    }

    pub fn from_options(name: impl Into<String>, values: &[Option<bool>]) -> Self {
        Self::from_options_iter(name, DataType::Boolean, values.iter().copied())
    }
}

impl Utf8Chunked {
    pub fn from_slice<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Self {
        Self::from_values_iter(
            name,
            DataType::Utf8,
            values.iter().map(AsRef::<str>::as_ref),
        )
    }

    pub fn from_options<S: AsRef<str>>(name: impl Into<String>, values: &[Option<S>]) -> Self {
        Self::from_options_iter(
            name,
            DataType::Utf8,
            values.iter().map(|s| s.as_ref().map(AsRef::<str>::as_ref)),
        )
    }
}

impl ListChunked {
    /// Get the type of the values inside each list.
    pub fn inner_dtype(&self) -> &DataType {
        match &self.dtype {
            DataType::List(inner) => inner,
            other => other,
        }
    }
}

pub(crate) fn index_to_chunk(offsets: &[usize], idx: usize) -> (usize, usize) {
    let chunk_idx = offsets.partition_point(|&o| o <= idx).saturating_sub(1);
    (chunk_idx, idx - offsets[chunk_idx])
}

#[cfg(test)]
mod tests {
    use tabula_error::ErrorKind;

    use super::*;

    #[test]
    fn empty_chunks_dropped() {
        let a = Arc::new(Chunk::from_slice(&[1i32, 2]));
        let empty = Arc::new(Chunk::from_slice(&[] as &[i32]));
        let b = Arc::new(Chunk::from_slice(&[3i32]));

        let ca = Int32Chunked::from_chunks("a", DataType::Int32, [a, empty, b]);
        assert_eq!(2, ca.n_chunks());
        assert_eq!(vec![2, 1], ca.chunk_lengths());
        assert_eq!(3, ca.len());
    }

    #[test]
    fn empty_array_has_one_chunk() {
        let ca = Utf8Chunked::new_empty("s", DataType::Utf8);
        assert_eq!(1, ca.n_chunks());
        assert_eq!(0, ca.len());
        assert!(ca.is_empty());
    }

    #[test]
    fn append_shares_chunks() {
        let mut a = Int32Chunked::from_slice("a", &[1, 2, 3]);
        let b = Int32Chunked::from_options("b", &[Some(4), None]);
        a.append(&b).unwrap();

        assert_eq!("a", a.name());
        assert_eq!(2, a.n_chunks());
        assert_eq!(5, a.len());
        assert_eq!(1, a.null_count());
        assert!(Arc::ptr_eq(&a.chunks()[1], &b.chunks()[0]));
    }

    #[test]
    fn append_type_mismatch() {
        let mut a = Int32Chunked::from_slice("a", &[1]);
        let b = Int32Chunked::from_chunk("b", DataType::Int64, Chunk::from_slice(&[1]));
        let err = a.append(&b).unwrap_err();
        assert_eq!(ErrorKind::Type, err.kind());
    }

    #[test]
    fn rechunk_single() {
        let mut a = Int32Chunked::from_slice("a", &[1, 2]);
        a.append(&Int32Chunked::from_options("b", &[None, Some(4)]))
            .unwrap();
        let rechunked = a.rechunk();

        assert_eq!(1, rechunked.n_chunks());
        assert_eq!(
            vec![Some(1), Some(2), None, Some(4)],
            rechunked.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn chunk_index_translation() {
        let offsets = [0, 3, 5];
        assert_eq!((0, 0), index_to_chunk(&offsets, 0));
        assert_eq!((0, 2), index_to_chunk(&offsets, 2));
        assert_eq!((1, 0), index_to_chunk(&offsets, 3));
        assert_eq!((1, 1), index_to_chunk(&offsets, 4));
    }

    #[test]
    fn slice_and_validity() {
        let validity = Bitmap::from_iter([true, false]);
        let ca = Int64Chunked::from_slice_and_validity("a", &[1, 0], Some(validity)).unwrap();
        assert_eq!(vec![Some(1), None], ca.iter().collect::<Vec<_>>());
        ca.cont_slice().unwrap_err();

        let ca = Int64Chunked::from_slice("a", &[1, 2]);
        assert_eq!(&[1, 2], ca.cont_slice().unwrap());
    }
}
