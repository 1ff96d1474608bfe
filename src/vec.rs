//! Growable buffers whose storage lives in an arena.
//!
//! Growth doubles the capacity, starting from [`GROWTH_MIN`], and moves the
//! contents with [`Arena::realloc`]. The old storage is simply abandoned in
//! the arena, so a buffer shares the arena's lifetime and is undone by the
//! arena's `reset` and `rewind` like any other allocation.

use std::{fmt, ptr, ptr::NonNull, slice, str};

use crate::{Arena, ArenaError, align::UNIT, backend::Backend, fatal::or_fail};

/// Capacity of a buffer's first allocation, in elements.
pub const GROWTH_MIN: usize = 256;

/// A dynamic array backed by an [`Arena`].
///
/// The buffer does not remember which arena its storage came from; every
/// growing call takes it as an argument.
///
/// # Safety
///
/// The unsafe methods share one contract: the storage must still be live.
/// That is, it was allocated from the `arena` being passed (or, for the
/// read accessors, from an arena that is still alive), and that arena has
/// not been freed, trimmed past it, reset, or rewound to before the
/// buffer's last growth since. An empty buffer with no capacity has no
/// storage and is always live.
pub struct ArenaVec<T> {
  items: NonNull<T>,
  count: usize,
  capacity: usize,
}

/// A string builder: bytes in an arena.
pub type StringBuilder = ArenaVec<u8>;

impl<T: Copy> ArenaVec<T> {
  pub const fn new() -> Self {
    Self {
      items: NonNull::dangling(),
      count: 0,
      capacity: 0,
    }
  }

  pub fn len(&self) -> usize {
    self.count
  }

  pub fn is_empty(&self) -> bool {
    self.count == 0
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn as_ptr(&self) -> *const T {
    self.items.as_ptr()
  }

  /// Forgets the contents, keeping the storage.
  pub fn clear(&mut self) {
    self.count = 0;
  }

  /// # Safety
  ///
  /// See the [type-level contract](ArenaVec#safety).
  pub unsafe fn as_slice(&self) -> &[T] {
    unsafe { slice::from_raw_parts(self.items.as_ptr(), self.count) }
  }

  /// # Safety
  ///
  /// See the [type-level contract](ArenaVec#safety).
  pub unsafe fn as_mut_slice(&mut self) -> &mut [T] {
    unsafe { slice::from_raw_parts_mut(self.items.as_ptr(), self.count) }
  }

  /// Makes room for at least `additional` more elements.
  ///
  /// # Safety
  ///
  /// See the [type-level contract](ArenaVec#safety).
  pub unsafe fn try_reserve<B: Backend>(
    &mut self,
    arena: &mut Arena<B>,
    additional: usize,
  ) -> Result<(), ArenaError> {
    const { assert!(align_of::<T>() <= UNIT, "arena storage is only word aligned") };

    let overflow = || ArenaError::CapacityOverflow {
      bytes: self.count.saturating_add(additional).saturating_mul(size_of::<T>()),
    };

    let required = self.count.checked_add(additional).ok_or_else(overflow)?;
    if required <= self.capacity {
      return Ok(());
    }

    let mut capacity = if self.capacity == 0 { GROWTH_MIN } else { self.capacity };
    while capacity < required {
      capacity = capacity.checked_mul(2).ok_or_else(overflow)?;
    }

    let old_size = self.capacity * size_of::<T>();
    let new_size = capacity.checked_mul(size_of::<T>()).ok_or_else(overflow)?;

    let items = unsafe { arena.try_realloc(self.items.cast(), old_size, new_size)? };

    self.items = items.cast();
    self.capacity = capacity;

    Ok(())
  }

  /// Appends one element, growing the storage through `arena` if needed.
  ///
  /// # Safety
  ///
  /// See the [type-level contract](ArenaVec#safety).
  #[inline]
  pub unsafe fn push<B: Backend>(
    &mut self,
    arena: &mut Arena<B>,
    item: T,
  ) {
    or_fail(unsafe { self.try_push(arena, item) })
  }

  /// Fallible [`ArenaVec::push`].
  ///
  /// # Safety
  ///
  /// See the [type-level contract](ArenaVec#safety).
  pub unsafe fn try_push<B: Backend>(
    &mut self,
    arena: &mut Arena<B>,
    item: T,
  ) -> Result<(), ArenaError> {
    unsafe {
      self.try_reserve(arena, 1)?;
      self.items.as_ptr().add(self.count).write(item);
    }
    self.count += 1;

    Ok(())
  }

  /// Appends a run of elements with at most one reallocation.
  ///
  /// # Safety
  ///
  /// See the [type-level contract](ArenaVec#safety).
  #[inline]
  pub unsafe fn extend_from_slice<B: Backend>(
    &mut self,
    arena: &mut Arena<B>,
    items: &[T],
  ) {
    or_fail(unsafe { self.try_extend_from_slice(arena, items) })
  }

  /// Fallible [`ArenaVec::extend_from_slice`].
  ///
  /// # Safety
  ///
  /// See the [type-level contract](ArenaVec#safety).
  pub unsafe fn try_extend_from_slice<B: Backend>(
    &mut self,
    arena: &mut Arena<B>,
    items: &[T],
  ) -> Result<(), ArenaError> {
    unsafe {
      self.try_reserve(arena, items.len())?;
      ptr::copy_nonoverlapping(items.as_ptr(), self.items.as_ptr().add(self.count), items.len());
    }
    self.count += items.len();

    Ok(())
  }
}

impl StringBuilder {
  /// # Safety
  ///
  /// See the [type-level contract](ArenaVec#safety).
  #[inline]
  pub unsafe fn push_str<B: Backend>(
    &mut self,
    arena: &mut Arena<B>,
    text: &str,
  ) {
    unsafe { self.extend_from_slice(arena, text.as_bytes()) }
  }

  /// Appends a single NUL byte so the contents can be read as a C string.
  ///
  /// # Safety
  ///
  /// See the [type-level contract](ArenaVec#safety).
  #[inline]
  pub unsafe fn push_nul<B: Backend>(
    &mut self,
    arena: &mut Arena<B>,
  ) {
    unsafe { self.push(arena, 0) }
  }

  /// The contents as text.
  ///
  /// # Safety
  ///
  /// See the [type-level contract](ArenaVec#safety).
  pub unsafe fn to_str(&self) -> Result<&str, str::Utf8Error> {
    str::from_utf8(unsafe { self.as_slice() })
  }
}

impl<T: Copy> Default for ArenaVec<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> fmt::Debug for ArenaVec<T> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("ArenaVec")
      .field("items", &self.items)
      .field("count", &self.count)
      .field("capacity", &self.capacity)
      .finish()
  }
}
