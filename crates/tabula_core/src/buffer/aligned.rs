use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use tabula_error::{DbError, Result};

/// Byte alignment of every allocation made by `AlignedVec`.
pub const ALIGNMENT: usize = 64;

#[derive(Debug)]
enum GrowError {
    CapacityOverflow,
    Alloc(Layout),
}

impl GrowError {
    fn into_db_error<T>(self, requested: usize) -> DbError {
        match self {
            GrowError::CapacityOverflow => {
                DbError::allocation(requested.saturating_mul(std::mem::size_of::<T>()))
                    .with_field("reason", "capacity overflow")
            }
            GrowError::Alloc(layout) => DbError::allocation(layout.size()),
        }
    }

    fn handle(self) -> ! {
        match self {
            GrowError::CapacityOverflow => panic!("capacity overflow"),
            GrowError::Alloc(layout) => alloc::handle_alloc_error(layout),
        }
    }
}

/// A growable buffer whose allocation starts on a 64 byte boundary.
///
/// The allocated byte size is always a multiple of 64, so `capacity` may be
/// larger than what was requested. Only the first `len` elements are
/// initialized.
pub struct AlignedVec<T> {
    ptr: NonNull<T>,
    len: usize,
    /// Capacity in elements.
    cap: usize,
    _t: PhantomData<T>,
}

unsafe impl<T: Send> Send for AlignedVec<T> {}
unsafe impl<T: Sync> Sync for AlignedVec<T> {}

impl<T> AlignedVec<T> {
    pub const fn new() -> Self {
        const {
            assert!(std::mem::size_of::<T>() > 0);
            assert!(std::mem::align_of::<T>() <= ALIGNMENT);
        }

        AlignedVec {
            ptr: NonNull::dangling(),
            len: 0,
            cap: 0,
            _t: PhantomData,
        }
    }

    /// Try to create an empty vec with room for at least `cap` elements.
    pub fn try_with_capacity(cap: usize) -> Result<Self> {
        let mut v = Self::new();
        v.try_reserve(cap)?;
        Ok(v)
    }

    /// Create an empty vec with room for at least `cap` elements.
    ///
    /// Allocation failure aborts.
    pub fn with_capacity(cap: usize) -> Self {
        let mut v = Self::new();
        v.reserve(cap);
        v
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        self.cap
    }

    pub const fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `ptr` is valid for `len` initialized elements, or dangling
        // and well aligned when `len` is 0.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: See `as_slice`.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Reserve room for at least `additional` more elements.
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let required = self.len.saturating_add(additional);
        self.grow(required)
            .map_err(|e| e.into_db_error::<T>(required))
    }

    /// Reserve room for at least `additional` more elements.
    ///
    /// Allocation failure aborts.
    pub fn reserve(&mut self, additional: usize) {
        let required = self.len.saturating_add(additional);
        if let Err(e) = self.grow(required) {
            e.handle()
        }
    }

    pub fn push(&mut self, value: T) {
        if self.len == self.cap {
            let required = self.len.saturating_add(1);
            // Amortized doubling.
            let target = usize::max(required, self.cap.saturating_mul(2));
            if let Err(e) = self.grow(target) {
                e.handle()
            }
        }

        // SAFETY: `len < cap` after growing.
        unsafe { self.ptr.as_ptr().add(self.len).write(value) };
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: Element at `len` was initialized and is no longer tracked.
        Some(unsafe { self.ptr.as_ptr().add(self.len).read() })
    }

    /// Drop elements past `len`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = self.len - len;
        self.len = len;
        // SAFETY: The `tail` elements starting at `len` are initialized and no
        // longer reachable.
        unsafe {
            let tail = std::ptr::slice_from_raw_parts_mut(self.ptr.as_ptr().add(len), tail);
            std::ptr::drop_in_place(tail);
        }
    }

    pub fn clear(&mut self) {
        self.truncate(0)
    }

    fn layout(cap: usize) -> std::result::Result<Layout, GrowError> {
        let bytes = cap
            .checked_mul(std::mem::size_of::<T>())
            .and_then(|b| b.checked_next_multiple_of(ALIGNMENT))
            .ok_or(GrowError::CapacityOverflow)?;
        Layout::from_size_align(bytes, ALIGNMENT).map_err(|_| GrowError::CapacityOverflow)
    }

    /// Grow the allocation so that it can hold at least `min_cap` elements.
    fn grow(&mut self, min_cap: usize) -> std::result::Result<(), GrowError> {
        if min_cap <= self.cap {
            return Ok(());
        }

        let new_layout = Self::layout(min_cap)?;
        let new_ptr = if self.cap == 0 {
            // SAFETY: Layout has a non-zero size since `min_cap > 0`.
            unsafe { alloc::alloc(new_layout) }
        } else {
            let old_layout = Self::layout(self.cap)?;
            // SAFETY: `ptr` was allocated with `old_layout`.
            unsafe { alloc::realloc(self.ptr.as_ptr().cast(), old_layout, new_layout.size()) }
        };

        match NonNull::new(new_ptr.cast::<T>()) {
            Some(ptr) => {
                self.ptr = ptr;
                self.cap = new_layout.size() / std::mem::size_of::<T>();
                Ok(())
            }
            None => Err(GrowError::Alloc(new_layout)),
        }
    }
}

impl<T: Clone> AlignedVec<T> {
    pub fn from_slice(values: &[T]) -> Self {
        let mut v = Self::with_capacity(values.len());
        v.extend_from_slice(values);
        v
    }

    /// Create a vec holding `len` copies of `value`.
    pub fn from_elem(value: T, len: usize) -> Self {
        let mut v = Self::with_capacity(len);
        for _ in 0..len {
            v.push(value.clone());
        }
        v
    }

    pub fn extend_from_slice(&mut self, values: &[T]) {
        self.reserve(values.len());
        for value in values {
            self.push(value.clone());
        }
    }
}

impl<T> Drop for AlignedVec<T> {
    fn drop(&mut self) {
        self.clear();
        if self.cap != 0 {
            if let Ok(layout) = Self::layout(self.cap) {
                // SAFETY: Allocated with this layout.
                unsafe { alloc::dealloc(self.ptr.as_ptr().cast(), layout) }
            }
        }
    }
}

impl<T> Default for AlignedVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for AlignedVec<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T> DerefMut for AlignedVec<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T: Clone> Clone for AlignedVec<T> {
    fn clone(&self) -> Self {
        Self::from_slice(self.as_slice())
    }
}

impl<T: PartialEq> PartialEq for AlignedVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for AlignedVec<T> {}

impl<T: fmt::Debug> fmt::Debug for AlignedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<T> for AlignedVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut v = AlignedVec::new();
        v.extend(iter);
        v
    }
}

impl<T> Extend<T> for AlignedVec<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(lower);
        for v in iter {
            self.push(v);
        }
    }
}

impl<T: Clone> From<&[T]> for AlignedVec<T> {
    fn from(values: &[T]) -> Self {
        Self::from_slice(values)
    }
}

impl<T> From<Vec<T>> for AlignedVec<T> {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use tabula_error::ErrorKind;

    use super::*;

    #[test]
    fn allocation_is_aligned() {
        let v = AlignedVec::<i32>::with_capacity(3);
        assert_eq!(0, v.as_ptr() as usize % ALIGNMENT);
        // 12 bytes rounds up to 64.
        assert_eq!(16, v.capacity());
    }

    #[test]
    fn push_past_capacity() {
        let mut v = AlignedVec::<i64>::with_capacity(8);
        assert_eq!(8, v.capacity());

        for i in 0..20 {
            v.push(i);
        }

        assert_eq!(20, v.len());
        assert!(v.capacity() >= 20);
        assert_eq!(0, v.capacity() * 8 % ALIGNMENT);
        assert_eq!(0, v.as_ptr() as usize % ALIGNMENT);
        assert_eq!((0..20).collect::<Vec<i64>>(), v.as_slice());
    }

    #[test]
    fn empty_has_no_allocation() {
        let v = AlignedVec::<u8>::new();
        assert_eq!(0, v.capacity());
        assert!(v.as_slice().is_empty());
    }

    #[test]
    fn try_with_capacity_overflow() {
        let err = AlignedVec::<u64>::try_with_capacity(usize::MAX / 4).unwrap_err();
        assert_eq!(ErrorKind::Allocation, err.kind());
    }

    #[test]
    fn drops_owned_values() {
        let mut v = AlignedVec::new();
        v.push("a".to_string());
        v.push("b".to_string());
        v.extend_from_slice(&["c".to_string()]);

        let cloned = v.clone();
        assert_eq!(cloned, v);

        v.truncate(1);
        assert_eq!(&["a".to_string()], v.as_slice());
        assert_eq!(Some("a".to_string()), v.pop());
        assert!(v.is_empty());
    }

    #[test]
    fn from_elem() {
        let v = AlignedVec::from_elem(u8::MAX, 3);
        assert_eq!(&[255, 255, 255], v.as_slice());
    }
}
