//! Reference-counted storage shared between tensor views, and the exclusive
//! buffer every value-producing operation writes into before sharing it.
//!
//! The two roles are distinct types: [`TensorStorage`] may be aliased by any
//! number of views and never hands out safe mutable access while aliased;
//! [`OwnedBuffer`] is uniquely owned and freely mutable, and becomes a
//! [`TensorStorage`] once its values are final.

use std::{ptr::NonNull, rc::Rc};

use crate::{Real, TensorError};

/// Inner storage implementation that holds the actual memory.
///
/// Wrapped in an `Rc` so views can share it; the memory is released when the
/// last view is dropped.
struct StorageImpl {
    /// Pointer to the first element. Never null.
    ptr: NonNull<Real>,
    /// Number of elements.
    len: usize,
}

impl Drop for StorageImpl {
    fn drop(&mut self) {
        // SAFETY: ptr and len come from a leaked `Box<[Real]>` in `TensorStorage::from_vec`,
        // and this is the last owner.
        unsafe {
            drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                self.ptr.as_ptr(),
                self.len,
            )));
        }
    }
}

impl std::fmt::Debug for StorageImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageImpl")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

/// Reference-counted, row-major element buffer shared by tensor views.
///
/// Clones are O(1) and alias the same memory, so a write through the raw
/// pointer of one view is observed by every other view.
///
/// # Thread Safety
///
/// `TensorStorage` is neither `Send` nor `Sync`: the reference count and the
/// elements are unsynchronized, and the engine assumes a single writer.
pub struct TensorStorage {
    inner: Rc<StorageImpl>,
}

impl TensorStorage {
    /// Moves a vector into a new, uniquely held storage.
    pub fn from_vec(value: Vec<Real>) -> Self {
        let boxed = value.into_boxed_slice();
        let len = boxed.len();
        let ptr = NonNull::from(Box::leak(boxed)).cast::<Real>();
        Self {
            inner: Rc::new(StorageImpl { ptr, len }),
        }
    }

    /// Returns the pointer to the first element.
    #[inline]
    pub fn as_ptr(&self) -> *const Real {
        self.inner.ptr.as_ptr()
    }

    /// Returns a mutable pointer to the first element.
    ///
    /// Writes through this pointer are visible to every view sharing the
    /// storage. The caller must not write while any slice obtained from
    /// [`Self::as_slice`] on any of those views is alive.
    #[inline]
    pub fn as_mut_ptr(&self) -> *mut Real {
        self.inner.ptr.as_ptr()
    }

    /// Returns the storage data as a slice.
    pub fn as_slice(&self) -> &[Real] {
        // SAFETY: ptr is valid for len elements for as long as `inner` is alive
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.inner.len) }
    }

    /// Returns the storage data as a mutable slice.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::SharedStorage`] if other views hold this storage.
    pub fn as_mut_slice(&mut self) -> Result<&mut [Real], TensorError> {
        let holders = Rc::strong_count(&self.inner);
        if holders != 1 {
            return Err(TensorError::SharedStorage { holders });
        }
        // SAFETY: the storage is uniquely held and borrowed mutably through `self`
        Ok(unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), self.inner.len) })
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Returns true if the storage holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Returns true if this storage is uniquely held (no other views).
    #[inline]
    pub fn is_unique(&self) -> bool {
        Rc::strong_count(&self.inner) == 1
    }

    /// Number of views currently holding this storage.
    #[inline]
    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Returns true if both handles point at the same storage instance.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Copies the elements into a fresh, exclusively owned buffer.
    pub fn to_owned_buffer(&self) -> OwnedBuffer {
        OwnedBuffer::from_slice(self.as_slice())
    }
}

impl Clone for TensorStorage {
    /// Creates a cheap clone by incrementing the reference count.
    ///
    /// This is a O(1) operation that doesn't copy the underlying data.
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for TensorStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TensorStorage")
            .field("ptr", &self.inner.ptr)
            .field("len", &self.inner.len)
            .field("holders", &self.holders())
            .finish()
    }
}

/// An exclusively owned element buffer.
///
/// Operations that compute new values fill one of these and only then turn it
/// into a [`TensorStorage`], so the source of an operation is never written.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OwnedBuffer {
    data: Vec<Real>,
}

impl OwnedBuffer {
    /// Creates a buffer of `len` copies of `value`.
    pub fn filled(len: usize, value: Real) -> Self {
        Self {
            data: vec![value; len],
        }
    }

    /// Creates a buffer holding a copy of `values`.
    pub fn from_slice(values: &[Real]) -> Self {
        Self {
            data: values.to_vec(),
        }
    }

    /// Returns the buffer as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Real] {
        &self.data
    }

    /// Returns the buffer as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Real] {
        &mut self.data
    }

    /// Number of elements in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the buffer holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Freezes the buffer into shareable storage.
    pub fn into_storage(self) -> TensorStorage {
        TensorStorage::from_vec(self.data)
    }

    /// Consumes the buffer and returns its vector.
    pub fn into_vec(self) -> Vec<Real> {
        self.data
    }
}

impl From<Vec<Real>> for OwnedBuffer {
    fn from(data: Vec<Real>) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_from_vec() {
        let storage = TensorStorage::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(storage.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(storage.len(), 5);
        assert!(!storage.is_empty());
        assert!(storage.is_unique());
    }

    #[test]
    fn test_storage_cheap_clone() {
        let storage1 = TensorStorage::from_vec(vec![1.0, 2.0, 3.0]);
        let storage2 = storage1.clone();

        assert!(storage1.ptr_eq(&storage2));
        assert_eq!(storage1.as_ptr(), storage2.as_ptr());
        assert_eq!(storage1.holders(), 2);

        drop(storage2);
        assert!(storage1.is_unique());
    }

    #[test]
    fn test_storage_unique_mutation() -> Result<(), TensorError> {
        let mut storage = TensorStorage::from_vec(vec![1.0, 2.0, 3.0]);
        storage.as_mut_slice()?[0] = 10.0;
        assert_eq!(storage.as_slice()[0], 10.0);
        Ok(())
    }

    #[test]
    fn test_storage_shared_mutation_rejected() {
        let mut storage1 = TensorStorage::from_vec(vec![1.0, 2.0, 3.0]);
        let _storage2 = storage1.clone();
        assert_eq!(
            storage1.as_mut_slice().err(),
            Some(TensorError::SharedStorage { holders: 2 })
        );
    }

    #[test]
    fn test_storage_write_through_pointer_is_shared() {
        let storage1 = TensorStorage::from_vec(vec![1.0, 2.0, 3.0]);
        let storage2 = storage1.clone();
        // SAFETY: index in bounds, no slice borrowed while writing
        unsafe { *storage1.as_mut_ptr().add(1) = 7.0 };
        assert_eq!(storage2.as_slice(), &[1.0, 7.0, 3.0]);
    }

    #[test]
    fn test_owned_buffer_is_independent() {
        let storage = TensorStorage::from_vec(vec![1.0, 2.0]);
        let mut buffer = storage.to_owned_buffer();
        buffer.as_mut_slice()[0] = 5.0;
        assert_eq!(storage.as_slice(), &[1.0, 2.0]);

        let frozen = buffer.into_storage();
        assert!(!frozen.ptr_eq(&storage));
        assert_eq!(frozen.as_slice(), &[5.0, 2.0]);
    }
}
