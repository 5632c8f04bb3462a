//! Random access into chunked arrays.

use std::sync::Arc;

use tabula_error::{DbError, Result};

use super::{ChunkedArray, index_to_chunk};
use crate::arrays::bitmap::Bitmap;
use crate::arrays::chunk::{Chunk, ChunkValues, ListValues, Utf8Values};
use crate::buffer::AlignedVec;

/// Random access to optional values by index.
pub trait TakeRandom {
    type Item;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the value at an index, erroring if out of bounds.
    fn get(&self, idx: usize) -> Result<Option<Self::Item>> {
        if idx >= self.len() {
            return Err(DbError::out_of_bounds(idx, self.len()));
        }
        // SAFETY: Bounds checked.
        Ok(unsafe { self.get_unchecked(idx) })
    }

    /// Get the value at an index.
    ///
    /// # Safety
    ///
    /// `idx` must be less than `len`.
    unsafe fn get_unchecked(&self, idx: usize) -> Option<Self::Item>;
}

#[derive(Debug, Clone)]
pub struct TakeRandomSingleChunk<'a, V: ChunkValues> {
    values: &'a V,
}

impl<'a, V: ChunkValues> TakeRandom for TakeRandomSingleChunk<'a, V> {
    type Item = V::Item<'a>;

    fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    unsafe fn get_unchecked(&self, idx: usize) -> Option<Self::Item> {
        Some(unsafe { self.values.value_unchecked(idx) })
    }
}

#[derive(Debug, Clone)]
pub struct TakeRandomSingleChunkNullCheck<'a, V: ChunkValues> {
    values: &'a V,
    validity: &'a Bitmap,
}

impl<'a, V: ChunkValues> TakeRandom for TakeRandomSingleChunkNullCheck<'a, V> {
    type Item = V::Item<'a>;

    fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    unsafe fn get_unchecked(&self, idx: usize) -> Option<Self::Item> {
        unsafe {
            if self.validity.value_unchecked(idx) {
                Some(self.values.value_unchecked(idx))
            } else {
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TakeRandomManyChunk<'a, V: ChunkValues> {
    chunks: &'a [Arc<Chunk<V>>],
    offsets: &'a [usize],
    len: usize,
}

impl<'a, V: ChunkValues> TakeRandom for TakeRandomManyChunk<'a, V> {
    type Item = V::Item<'a>;

    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    unsafe fn get_unchecked(&self, idx: usize) -> Option<Self::Item> {
        let (chunk_idx, idx) = index_to_chunk(self.offsets, idx);
        unsafe {
            let chunk = self.chunks.get_unchecked(chunk_idx);
            Some(chunk.values().value_unchecked(idx))
        }
    }
}

#[derive(Debug, Clone)]
pub struct TakeRandomManyChunkNullCheck<'a, V: ChunkValues> {
    chunks: &'a [Arc<Chunk<V>>],
    offsets: &'a [usize],
    len: usize,
}

impl<'a, V: ChunkValues> TakeRandom for TakeRandomManyChunkNullCheck<'a, V> {
    type Item = V::Item<'a>;

    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    unsafe fn get_unchecked(&self, idx: usize) -> Option<Self::Item> {
        let (chunk_idx, idx) = index_to_chunk(self.offsets, idx);
        unsafe { self.chunks.get_unchecked(chunk_idx).get_unchecked(idx) }
    }
}

/// Random access picking the cheapest strategy for the array's layout.
#[derive(Debug, Clone)]
pub enum TakeRandomDispatch<'a, V: ChunkValues> {
    SingleChunk(TakeRandomSingleChunk<'a, V>),
    SingleChunkNullCheck(TakeRandomSingleChunkNullCheck<'a, V>),
    ManyChunk(TakeRandomManyChunk<'a, V>),
    ManyChunkNullCheck(TakeRandomManyChunkNullCheck<'a, V>),
}

impl<'a, V: ChunkValues> TakeRandom for TakeRandomDispatch<'a, V> {
    type Item = V::Item<'a>;

    fn len(&self) -> usize {
        match self {
            Self::SingleChunk(t) => t.len(),
            Self::SingleChunkNullCheck(t) => t.len(),
            Self::ManyChunk(t) => t.len(),
            Self::ManyChunkNullCheck(t) => t.len(),
        }
    }

    #[inline]
    unsafe fn get_unchecked(&self, idx: usize) -> Option<Self::Item> {
        unsafe {
            match self {
                Self::SingleChunk(t) => t.get_unchecked(idx),
                Self::SingleChunkNullCheck(t) => t.get_unchecked(idx),
                Self::ManyChunk(t) => t.get_unchecked(idx),
                Self::ManyChunkNullCheck(t) => t.get_unchecked(idx),
            }
        }
    }
}

pub type NumTakeRandomDispatch<'a, T> = TakeRandomDispatch<'a, AlignedVec<T>>;
pub type NumTakeRandomSingleChunk<'a, T> = TakeRandomSingleChunk<'a, AlignedVec<T>>;
pub type Utf8TakeRandom<'a> = TakeRandomDispatch<'a, Utf8Values>;
pub type BoolTakeRandom<'a> = TakeRandomDispatch<'a, Bitmap>;
pub type ListTakeRandom<'a> = TakeRandomDispatch<'a, ListValues>;

impl<V: ChunkValues> ChunkedArray<V> {
    /// Get a random access accessor for this array.
    pub fn take_rand(&self) -> TakeRandomDispatch<'_, V> {
        let chunks = self.chunks();
        if chunks.len() == 1 {
            let chunk = chunks[0].as_ref();
            return match chunk.validity() {
                Some(validity) => {
                    TakeRandomDispatch::SingleChunkNullCheck(TakeRandomSingleChunkNullCheck {
                        values: chunk.values(),
                        validity,
                    })
                }
                None => TakeRandomDispatch::SingleChunk(TakeRandomSingleChunk {
                    values: chunk.values(),
                }),
            };
        }

        if self.null_count() == 0 {
            TakeRandomDispatch::ManyChunk(TakeRandomManyChunk {
                chunks,
                offsets: self.offsets(),
                len: self.len(),
            })
        } else {
            TakeRandomDispatch::ManyChunkNullCheck(TakeRandomManyChunkNullCheck {
                chunks,
                offsets: self.offsets(),
                len: self.len(),
            })
        }
    }
}
