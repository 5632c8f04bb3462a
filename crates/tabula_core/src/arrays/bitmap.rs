use std::borrow::BorrowMut;
use std::fmt;

use tabula_error::{DbError, Result};

use crate::buffer::AlignedVec;

/// An LSB ordered bitmap.
///
/// Used as the validity mask for chunks, a set bit means the row is valid.
#[derive(Clone, Default)]
pub struct Bitmap {
    len: usize,
    data: AlignedVec<u8>,
}

impl Bitmap {
    pub fn with_capacity(cap: usize) -> Self {
        Bitmap {
            len: 0,
            data: AlignedVec::with_capacity(cap.div_ceil(8)),
        }
    }

    pub fn new_with_all_true(len: usize) -> Self {
        Bitmap {
            len,
            data: AlignedVec::from_elem(u8::MAX, len.div_ceil(8)),
        }
    }

    /// Get the number of bits being tracked by this bitmap.
    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn count_trues(&self) -> usize {
        let mut count = self
            .data
            .iter()
            .map(|&b| b.count_ones())
            .fold(0, |acc, v| acc + (v as usize));

        // Only count the bits that make up the logical portion of the bitmap.
        let rem = self.len % 8;
        if rem != 0 {
            if let Some(&last) = self.data.last() {
                count -= last.count_ones() as usize;
                let mask = (1u8 << rem) - 1;
                count += (mask & last).count_ones() as usize;
            }
        }

        count
    }

    pub fn count_falses(&self) -> usize {
        self.len - self.count_trues()
    }

    pub fn is_all_true(&self) -> bool {
        self.count_trues() == self.len()
    }

    /// Push a value onto the end of the bitmap.
    pub fn push(&mut self, val: bool) {
        if self.len == self.data.len() * 8 {
            self.data.push(0);
        }
        let idx = self.len;
        self.len += 1;
        self.set_unchecked(idx, val);
    }

    /// Get the value at index.
    ///
    /// Panics if index is out of bounds of the underlying bytes.
    #[inline]
    pub fn value(&self, idx: usize) -> bool {
        let byte = self.data[idx >> 3];
        (byte >> (idx & 7)) & 1 != 0
    }

    /// Get the value at index without bounds checking.
    ///
    /// # Safety
    ///
    /// `idx` must be less than `len`.
    #[inline]
    pub unsafe fn value_unchecked(&self, idx: usize) -> bool {
        let byte = unsafe { *self.data.get_unchecked(idx >> 3) };
        (byte >> (idx & 7)) & 1 != 0
    }

    /// Set a bit at index.
    ///
    /// Panics if index is out of bounds of the underlying bytes.
    #[inline]
    pub fn set_unchecked(&mut self, idx: usize, val: bool) {
        let byte = idx / 8;
        let bit = idx & 7;
        if val {
            self.data[byte] |= 1 << bit;
        } else {
            self.data[byte] &= !(1 << bit);
        }
    }

    pub const fn iter(&self) -> BitmapIter<'_> {
        BitmapIter::new(self)
    }

    /// Iterate the indices of set bits.
    ///
    /// Zero bytes are skipped without looking at their bits.
    pub fn index_iter(&self) -> impl Iterator<Item = usize> + '_ {
        let len = self.len;
        self.data
            .iter()
            .enumerate()
            .filter(|(_, byte)| **byte != 0)
            .flat_map(move |(byte_idx, &byte)| {
                (0..8)
                    .filter(move |bit| (byte >> bit) & 1 != 0)
                    .map(move |bit| byte_idx * 8 + bit)
                    .take_while(move |&idx| idx < len)
            })
    }

    /// Bit OR this bitmap with some other bitmap.
    pub fn bit_or_mut(&mut self, other: &Bitmap) -> Result<()> {
        self.check_len(other, "or")?;
        for (byte, other) in self.data.iter_mut().zip(other.data.iter()) {
            *byte |= *other;
        }
        Ok(())
    }

    /// Bit AND this bitmap with some other bitmap.
    pub fn bit_and_mut(&mut self, other: &Bitmap) -> Result<()> {
        self.check_len(other, "and")?;
        for (byte, other) in self.data.iter_mut().zip(other.data.iter()) {
            *byte &= *other;
        }
        Ok(())
    }

    pub fn bit_negate(&mut self) {
        for b in self.data.iter_mut() {
            *b = !*b;
        }
    }

    /// Copy out `len` bits starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> Bitmap {
        self.iter().skip(offset).take(len).collect()
    }

    fn check_len(&self, other: &Bitmap, op: &str) -> Result<()> {
        if self.len() != other.len() {
            return Err(DbError::construction(format!(
                "Bitmap lengths do not match ({op})"
            ))
            .with_field("left", self.len())
            .with_field("right", other.len()));
        }
        Ok(())
    }
}

/// Compares logical bits only, trailing bits in the last byte are ignored.
impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for Bitmap {}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<_> = self.iter().collect();
        f.debug_struct("Bitmap").field("values", &values).finish()
    }
}

impl FromIterator<bool> for Bitmap {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let mut iter = iter.into_iter();

        let mut data = AlignedVec::with_capacity(iter.size_hint().0.div_ceil(8));
        let mut len = 0;

        loop {
            let mut byte = 0;
            let mut bit_len = 0;

            for (idx, bit) in iter.borrow_mut().take(8).enumerate() {
                bit_len += 1;
                if bit {
                    byte |= 1 << idx;
                }
            }

            if bit_len == 0 {
                break;
            }

            data.push(byte);
            len += bit_len;
        }

        Bitmap { len, data }
    }
}

impl Extend<bool> for Bitmap {
    fn extend<T: IntoIterator<Item = bool>>(&mut self, iter: T) {
        for v in iter {
            self.push(v)
        }
    }
}

/// Iterator over individual bits (bools) in the bitmap.
#[derive(Debug, Clone)]
pub struct BitmapIter<'a> {
    idx: usize,
    bitmap: &'a Bitmap,
    current_byte: u8,
    bits_left: u8,
}

impl<'a> BitmapIter<'a> {
    pub const fn new(bitmap: &'a Bitmap) -> Self {
        BitmapIter {
            idx: 0,
            bitmap,
            current_byte: 0,
            bits_left: 0,
        }
    }
}

impl Iterator for BitmapIter<'_> {
    type Item = bool;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.bitmap.len() {
            return None;
        }

        // Load the next byte once the cached one is exhausted.
        if self.bits_left == 0 {
            let byte_idx = self.idx / 8;
            // SAFETY: Bounds checked above.
            self.current_byte = unsafe { *self.bitmap.data.get_unchecked(byte_idx) };
            self.bits_left = 8;
        }

        let bit_idx = self.idx % 8;
        let bit = (self.current_byte >> bit_idx) & 1 != 0;

        self.idx += 1;
        self.bits_left -= 1;

        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bitmap.len() - self.idx;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BitmapIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_multiple_bytes() {
        let bits = [
            true, false, true, false, true, true, true, true, //
            true, false, true, false, false, true, true, true, //
            true, false, true, false, true, false, true, true,
        ];
        let bm = Bitmap::from_iter(bits);

        assert_eq!(24, bm.len());

        let got: Vec<_> = bm.iter().collect();
        assert_eq!(bits.as_slice(), got);
    }

    #[test]
    fn not_multiple_of_eight() {
        let bits = [
            true, false, true, false, true, true, true, true, //
            true, false, true, false,
        ];
        let bm = Bitmap::from_iter(bits);

        assert_eq!(12, bm.len());
        assert_eq!(8, bm.count_trues());
        assert_eq!(4, bm.count_falses());

        let got: Vec<_> = bm.iter().collect();
        assert_eq!(bits.as_slice(), got);
    }

    #[test]
    fn push() {
        let mut bm = Bitmap::default();

        bm.push(true);
        bm.push(false);
        bm.push(false);
        assert_eq!(
            [true, false, false].as_slice(),
            bm.iter().collect::<Vec<_>>()
        );

        for _ in 0..6 {
            bm.push(true);
        }
        assert_eq!(9, bm.len());
        assert!(bm.value(8));
        assert_eq!(vec![0, 3, 4, 5, 6, 7, 8], bm.index_iter().collect::<Vec<_>>());
    }

    #[test]
    fn count_trues_ignores_trailing_bits() {
        let bm = Bitmap::new_with_all_true(10);
        assert_eq!(10, bm.count_trues());
        assert!(bm.is_all_true());

        let mut bm = Bitmap::from_iter([false; 10]);
        bm.bit_negate();
        assert_eq!(10, bm.count_trues());
        assert_eq!((0..10).collect::<Vec<_>>(), bm.index_iter().collect::<Vec<_>>());
    }

    #[test]
    fn bit_and_or() {
        let mut a = Bitmap::from_iter([true, true, false, false]);
        let b = Bitmap::from_iter([true, false, true, false]);

        let mut c = a.clone();
        c.bit_or_mut(&b).unwrap();
        assert_eq!(vec![true, true, true, false], c.iter().collect::<Vec<_>>());

        a.bit_and_mut(&b).unwrap();
        assert_eq!(vec![true, false, false, false], a.iter().collect::<Vec<_>>());

        let short = Bitmap::new_with_all_true(3);
        assert!(a.bit_and_mut(&short).is_err());
    }

    #[test]
    fn slice_and_index_iter() {
        let bm = Bitmap::from_iter([false, true, true, false, true]);
        let sliced = bm.slice(1, 3);
        assert_eq!(vec![true, true, false], sliced.iter().collect::<Vec<_>>());
        assert_eq!(vec![1, 2, 4], bm.index_iter().collect::<Vec<_>>());
    }
}
