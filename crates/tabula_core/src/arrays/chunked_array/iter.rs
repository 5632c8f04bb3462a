//! Iterators over chunked arrays.
//!
//! There's a specialized iterator for each combination of single/many chunks
//! and with/without nulls. `ChunkIter` picks one up front so the branch on
//! layout happens once per iteration instead of once per value.

use std::sync::Arc;

use super::ChunkedArray;
use crate::arrays::bitmap::Bitmap;
use crate::arrays::chunk::{Chunk, ChunkValues, Utf8Values};
use crate::buffer::AlignedVec;

/// Iterate values of a single chunk without checking validity.
#[derive(Debug, Clone)]
pub struct SingleChunkIter<'a, V: ChunkValues> {
    values: &'a V,
    idx: usize,
    end: usize,
}

impl<'a, V: ChunkValues> SingleChunkIter<'a, V> {
    fn new(chunk: &'a Chunk<V>) -> Self {
        SingleChunkIter {
            values: chunk.values(),
            idx: 0,
            end: chunk.len(),
        }
    }
}

impl<'a, V: ChunkValues> Iterator for SingleChunkIter<'a, V> {
    type Item = V::Item<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.end {
            return None;
        }
        // SAFETY: `idx < end == len`.
        let v = unsafe { self.values.value_unchecked(self.idx) };
        self.idx += 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.idx;
        (remaining, Some(remaining))
    }
}

impl<V: ChunkValues> ExactSizeIterator for SingleChunkIter<'_, V> {}

/// Iterate values of a single chunk that has a validity bitmap.
#[derive(Debug, Clone)]
pub struct SingleChunkNullCheckIter<'a, V: ChunkValues> {
    values: &'a V,
    validity: &'a Bitmap,
    idx: usize,
    end: usize,
}

impl<'a, V: ChunkValues> Iterator for SingleChunkNullCheckIter<'a, V> {
    type Item = Option<V::Item<'a>>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.end {
            return None;
        }
        let idx = self.idx;
        self.idx += 1;
        // SAFETY: `idx < end`, bitmap and values have the same length.
        unsafe {
            if self.validity.value_unchecked(idx) {
                Some(Some(self.values.value_unchecked(idx)))
            } else {
                Some(None)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.idx;
        (remaining, Some(remaining))
    }
}

impl<V: ChunkValues> ExactSizeIterator for SingleChunkNullCheckIter<'_, V> {}

/// Iterate values across many chunks without checking validity.
#[derive(Debug, Clone)]
pub struct ManyChunkIter<'a, V: ChunkValues> {
    chunks: &'a [Arc<Chunk<V>>],
    chunk_idx: usize,
    idx_in_chunk: usize,
    remaining: usize,
}

impl<'a, V: ChunkValues> ManyChunkIter<'a, V> {
    fn new(chunks: &'a [Arc<Chunk<V>>], len: usize) -> Self {
        ManyChunkIter {
            chunks,
            chunk_idx: 0,
            idx_in_chunk: 0,
            remaining: len,
        }
    }

    /// Move to the position of the next value, returning the chunk holding it
    /// and the index within that chunk.
    #[inline]
    fn advance(&mut self) -> Option<(&'a Chunk<V>, usize)> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            let chunk = self.chunks.get(self.chunk_idx)?;
            if self.idx_in_chunk < chunk.len() {
                let idx = self.idx_in_chunk;
                self.idx_in_chunk += 1;
                self.remaining -= 1;
                return Some((chunk.as_ref(), idx));
            }
            self.chunk_idx += 1;
            self.idx_in_chunk = 0;
        }
    }
}

impl<'a, V: ChunkValues> Iterator for ManyChunkIter<'a, V> {
    type Item = V::Item<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (chunk, idx) = self.advance()?;
        // SAFETY: `advance` only returns in-bounds indices.
        Some(unsafe { chunk.values().value_unchecked(idx) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V: ChunkValues> ExactSizeIterator for ManyChunkIter<'_, V> {}

/// Iterate values across many chunks, checking validity of each value.
#[derive(Debug, Clone)]
pub struct ManyChunkNullCheckIter<'a, V: ChunkValues> {
    inner: ManyChunkIter<'a, V>,
}

impl<'a, V: ChunkValues> Iterator for ManyChunkNullCheckIter<'a, V> {
    type Item = Option<V::Item<'a>>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (chunk, idx) = self.inner.advance()?;
        // SAFETY: `advance` only returns in-bounds indices.
        Some(unsafe { chunk.get_unchecked(idx) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V: ChunkValues> ExactSizeIterator for ManyChunkNullCheckIter<'_, V> {}

/// Iterator over optional values, dispatching once on the array layout.
#[derive(Debug, Clone)]
pub enum ChunkIter<'a, V: ChunkValues> {
    SingleChunk(SingleChunkIter<'a, V>),
    SingleChunkNullCheck(SingleChunkNullCheckIter<'a, V>),
    ManyChunk(ManyChunkIter<'a, V>),
    ManyChunkNullCheck(ManyChunkNullCheckIter<'a, V>),
}

impl<'a, V: ChunkValues> Iterator for ChunkIter<'a, V> {
    type Item = Option<V::Item<'a>>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::SingleChunk(iter) => iter.next().map(Some),
            Self::SingleChunkNullCheck(iter) => iter.next(),
            Self::ManyChunk(iter) => iter.next().map(Some),
            Self::ManyChunkNullCheck(iter) => iter.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::SingleChunk(iter) => iter.size_hint(),
            Self::SingleChunkNullCheck(iter) => iter.size_hint(),
            Self::ManyChunk(iter) => iter.size_hint(),
            Self::ManyChunkNullCheck(iter) => iter.size_hint(),
        }
    }

    fn fold<B, F>(self, init: B, f: F) -> B
    where
        F: FnMut(B, Self::Item) -> B,
    {
        match self {
            Self::SingleChunk(iter) => iter.map(Some).fold(init, f),
            Self::SingleChunkNullCheck(iter) => iter.fold(init, f),
            Self::ManyChunk(iter) => iter.map(Some).fold(init, f),
            Self::ManyChunkNullCheck(iter) => iter.fold(init, f),
        }
    }
}

impl<V: ChunkValues> ExactSizeIterator for ChunkIter<'_, V> {}

/// Iterator over values of an array known to have no nulls.
#[derive(Debug, Clone)]
pub enum NoNullIter<'a, V: ChunkValues> {
    SingleChunk(SingleChunkIter<'a, V>),
    ManyChunk(ManyChunkIter<'a, V>),
}

impl<'a, V: ChunkValues> Iterator for NoNullIter<'a, V> {
    type Item = V::Item<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::SingleChunk(iter) => iter.next(),
            Self::ManyChunk(iter) => iter.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::SingleChunk(iter) => iter.size_hint(),
            Self::ManyChunk(iter) => iter.size_hint(),
        }
    }

    fn fold<B, F>(self, init: B, f: F) -> B
    where
        F: FnMut(B, Self::Item) -> B,
    {
        match self {
            Self::SingleChunk(iter) => iter.fold(init, f),
            Self::ManyChunk(iter) => iter.fold(init, f),
        }
    }
}

impl<V: ChunkValues> ExactSizeIterator for NoNullIter<'_, V> {}

pub type NumIterSingleChunk<'a, T> = SingleChunkIter<'a, AlignedVec<T>>;
pub type NumIterSingleChunkNullCheck<'a, T> = SingleChunkNullCheckIter<'a, AlignedVec<T>>;
pub type NumIterManyChunk<'a, T> = ManyChunkIter<'a, AlignedVec<T>>;
pub type NumIterManyChunkNullCheck<'a, T> = ManyChunkNullCheckIter<'a, AlignedVec<T>>;

pub type BoolIterSingleChunk<'a> = SingleChunkIter<'a, Bitmap>;
pub type BoolIterSingleChunkNullCheck<'a> = SingleChunkNullCheckIter<'a, Bitmap>;
pub type BoolIterManyChunk<'a> = ManyChunkIter<'a, Bitmap>;
pub type BoolIterManyChunkNullCheck<'a> = ManyChunkNullCheckIter<'a, Bitmap>;

pub type Utf8IterSingleChunk<'a> = SingleChunkIter<'a, Utf8Values>;
pub type Utf8IterSingleChunkNullCheck<'a> = SingleChunkNullCheckIter<'a, Utf8Values>;
pub type Utf8IterManyChunk<'a> = ManyChunkIter<'a, Utf8Values>;
pub type Utf8IterManyChunkNullCheck<'a> = ManyChunkNullCheckIter<'a, Utf8Values>;

impl<V: ChunkValues> ChunkedArray<V> {
    /// Iterate over all values as options, nulls being `None`.
    pub fn iter(&self) -> ChunkIter<'_, V> {
        let chunks = self.chunks();
        if chunks.len() == 1 {
            let chunk = chunks[0].as_ref();
            return match chunk.validity() {
                Some(validity) => ChunkIter::SingleChunkNullCheck(SingleChunkNullCheckIter {
                    values: chunk.values(),
                    validity,
                    idx: 0,
                    end: chunk.len(),
                }),
                None => ChunkIter::SingleChunk(SingleChunkIter::new(chunk)),
            };
        }

        let iter = ManyChunkIter::new(chunks, self.len());
        if self.null_count() == 0 {
            ChunkIter::ManyChunk(iter)
        } else {
            ChunkIter::ManyChunkNullCheck(ManyChunkNullCheckIter { inner: iter })
        }
    }

    /// Iterate over values without null checks.
    ///
    /// Returns None if the array contains nulls.
    pub fn no_null_iter(&self) -> Option<NoNullIter<'_, V>> {
        if self.null_count() != 0 {
            return None;
        }
        let chunks = self.chunks();
        if chunks.len() == 1 {
            Some(NoNullIter::SingleChunk(SingleChunkIter::new(&chunks[0])))
        } else {
            Some(NoNullIter::ManyChunk(ManyChunkIter::new(chunks, self.len())))
        }
    }
}

impl<'a, V: ChunkValues> IntoIterator for &'a ChunkedArray<V> {
    type Item = Option<V::Item<'a>>;
    type IntoIter = ChunkIter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
