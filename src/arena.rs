use std::{iter, ptr, ptr::NonNull};

use crate::{
  ArenaError,
  align::{UNIT, checked_units},
  backend::{Backend, DefaultBackend},
  fatal::or_fail,
  region::Region,
};

/// Capacity, in machine words, of regions created without an explicit
/// size. Larger requests get a region of their own size.
pub const REGION_DEFAULT_CAPACITY: usize = 8 * 1024;

/// A growable chain of regions that hands out memory by bumping a counter.
///
/// ```text
///   begin                        end
///     │                           │
///     ▼                           ▼
///   ┌──────────────┐  next  ┌──────────────┐  next  ┌──────────────┐
///   │██████████████│ ─────► │████████░░░░░░│ ─────► │░░░░░░░░░░░░░░│
///   └──────────────┘        └──────────────┘        └──────────────┘
///      consumed               allocating here         empty, reused
///                                                     after a rewind
/// ```
///
/// Memory is returned to the backend only by [`Arena::trim`],
/// [`Arena::free`] or dropping the arena. Pointers handed out stay where
/// they are until then, or until a [`reset`](Arena::reset) or
/// [`rewind`](Arena::rewind) makes their space available again.
pub struct Arena<B: Backend = DefaultBackend> {
  begin: *mut Region,
  end: *mut Region,
  region_capacity: usize,
  backend: B,
}

/// A saved allocation position, see [`Arena::snapshot`].
///
/// The mark does not keep its region alive. It dangles once the region is
/// released by [`Arena::trim`] or [`Arena::free`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
  region: *mut Region,
  used: usize,
}

/// Footprint of an arena at a point in time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
  /// Regions in the chain.
  pub regions: usize,
  /// Regions from the first one up to and including the one currently
  /// serving allocations.
  pub regions_to_end: usize,
  /// Bytes of storage across all regions, headers excluded.
  pub capacity: usize,
  /// Bytes of storage handed out.
  pub used: usize,
}

impl Arena<DefaultBackend> {
  /// An empty arena on the build's default backend. Nothing is acquired
  /// until the first allocation.
  pub const fn new() -> Self {
    Self::with_region_capacity_in(REGION_DEFAULT_CAPACITY, DefaultBackend {})
  }

  /// Like [`Arena::new`], with regions of `capacity` machine words.
  pub const fn with_region_capacity(capacity: usize) -> Self {
    Self::with_region_capacity_in(capacity, DefaultBackend {})
  }
}

impl Default for Arena<DefaultBackend> {
  fn default() -> Self {
    Self::new()
  }
}

impl<B: Backend> Arena<B> {
  pub const fn new_in(backend: B) -> Self {
    Self::with_region_capacity_in(REGION_DEFAULT_CAPACITY, backend)
  }

  pub const fn with_region_capacity_in(
    capacity: usize,
    backend: B,
  ) -> Self {
    Self {
      begin: ptr::null_mut(),
      end: ptr::null_mut(),
      region_capacity: capacity,
      backend,
    }
  }

  /// Capacity, in machine words, of regions this arena creates.
  pub fn region_capacity(&self) -> usize {
    self.region_capacity
  }

  pub fn backend(&self) -> &B {
    &self.backend
  }

  fn regions(&self) -> impl Iterator<Item = *mut Region> + '_ {
    let first = (!self.begin.is_null()).then_some(self.begin);

    iter::successors(first, |&region| {
      let next = unsafe { (*region).next };
      (!next.is_null()).then_some(next)
    })
  }

  fn new_region(
    &self,
    units: usize,
  ) -> Result<*mut Region, ArenaError> {
    Region::create(&self.backend, self.region_capacity.max(units))
  }

  /// Allocates `size` bytes, rounded up to whole machine words, and
  /// returns a word-aligned pointer to them.
  ///
  /// The memory is uninitialized. On failure the fatal hook runs, see
  /// [`set_fatal_hook`](crate::set_fatal_hook).
  #[inline]
  pub fn alloc(
    &mut self,
    size: usize,
  ) -> NonNull<u8> {
    or_fail(self.try_alloc(size))
  }

  /// Fallible [`Arena::alloc`].
  pub fn try_alloc(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, ArenaError> {
    let units = checked_units(size).ok_or(ArenaError::CapacityOverflow { bytes: size })?;

    unsafe {
      if self.end.is_null() {
        debug_assert!(self.begin.is_null());
        let region = self.new_region(units)?;
        self.begin = region;
        self.end = region;
      }

      // Regions past `end` were emptied by a rewind or reset.
      while !(*self.end).fits(units) && !(*self.end).next.is_null() {
        self.end = (*self.end).next;
      }

      if !(*self.end).fits(units) {
        debug_assert!((*self.end).next.is_null());
        let region = self.new_region(units)?;
        (*self.end).next = region;
        self.end = region;
      }

      let region = self.end;
      let result = Region::data(region).add((*region).used);
      (*region).used += units;

      Ok(NonNull::new_unchecked(result as *mut u8))
    }
  }

  /// Grows an allocation by allocating anew and copying the first
  /// `old_size` bytes over. Shrinking returns `old` untouched; the bytes
  /// past `new_size` are left as they were. The old block is not reclaimed.
  ///
  /// # Safety
  ///
  /// `old` must be valid for reads of `old_size` bytes.
  #[inline]
  pub unsafe fn realloc(
    &mut self,
    old: NonNull<u8>,
    old_size: usize,
    new_size: usize,
  ) -> NonNull<u8> {
    or_fail(unsafe { self.try_realloc(old, old_size, new_size) })
  }

  /// Fallible [`Arena::realloc`].
  ///
  /// # Safety
  ///
  /// See [`Arena::realloc`].
  pub unsafe fn try_realloc(
    &mut self,
    old: NonNull<u8>,
    old_size: usize,
    new_size: usize,
  ) -> Result<NonNull<u8>, ArenaError> {
    if new_size <= old_size {
      return Ok(old);
    }

    let new = self.try_alloc(new_size)?;
    unsafe { ptr::copy_nonoverlapping(old.as_ptr(), new.as_ptr(), old_size) };

    Ok(new)
  }

  /// Copies `bytes` into the arena.
  #[inline]
  pub fn memdup(
    &mut self,
    bytes: &[u8],
  ) -> NonNull<[u8]> {
    or_fail(self.try_memdup(bytes))
  }

  /// Fallible [`Arena::memdup`].
  pub fn try_memdup(
    &mut self,
    bytes: &[u8],
  ) -> Result<NonNull<[u8]>, ArenaError> {
    let copy = self.try_alloc(bytes.len())?;
    unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), copy.as_ptr(), bytes.len()) };

    Ok(NonNull::slice_from_raw_parts(copy, bytes.len()))
  }

  /// Copies `text` into the arena followed by a NUL byte, and returns a
  /// pointer usable as a C string.
  ///
  /// Interior NUL bytes are copied as they are.
  #[inline]
  pub fn strdup(
    &mut self,
    text: &str,
  ) -> NonNull<u8> {
    or_fail(self.try_strdup(text))
  }

  /// Fallible [`Arena::strdup`].
  pub fn try_strdup(
    &mut self,
    text: &str,
  ) -> Result<NonNull<u8>, ArenaError> {
    let len = text.len();
    let total = len.checked_add(1).ok_or(ArenaError::CapacityOverflow { bytes: len })?;
    let copy = self.try_alloc(total)?;

    unsafe {
      ptr::copy_nonoverlapping(text.as_ptr(), copy.as_ptr(), len);
      copy.as_ptr().add(len).write(0);
    }

    Ok(copy)
  }

  /// Saves the current allocation position.
  pub fn snapshot(&self) -> Mark {
    if self.end.is_null() {
      debug_assert!(self.begin.is_null());
      return Mark {
        region: ptr::null_mut(),
        used: 0,
      };
    }

    Mark {
      region: self.end,
      used: unsafe { (*self.end).used },
    }
  }

  /// Undoes every allocation made since `mark` was taken. Regions are kept
  /// for reuse, nothing goes back to the backend.
  ///
  /// A mark taken on an empty arena resets it.
  ///
  /// # Safety
  ///
  /// `mark` must come from [`Arena::snapshot`] on this arena, and its region
  /// must not have been released by [`Arena::trim`] or [`Arena::free`]
  /// since. Pointers allocated after the mark must not be used again.
  pub unsafe fn rewind(
    &mut self,
    mark: Mark,
  ) {
    if mark.region.is_null() {
      self.reset();
      return;
    }

    unsafe {
      (*mark.region).used = mark.used;

      let mut region = (*mark.region).next;
      while !region.is_null() {
        (*region).used = 0;
        region = (*region).next;
      }
    }

    self.end = mark.region;
  }

  /// Empties every region and starts allocating from the first one again.
  /// Every pointer handed out so far becomes dangling in spirit, though the
  /// memory itself stays mapped.
  pub fn reset(&mut self) {
    for region in self.regions() {
      unsafe { (*region).used = 0 };
    }

    self.end = self.begin;
  }

  /// Releases every region after the one currently serving allocations.
  ///
  /// Meant to follow a [`rewind`](Arena::rewind) or
  /// [`reset`](Arena::reset), to give up the regions they emptied instead
  /// of keeping them around for reuse.
  pub fn trim(&mut self) {
    if self.end.is_null() {
      return;
    }

    let mut released = 0usize;

    unsafe {
      let mut region = (*self.end).next;
      (*self.end).next = ptr::null_mut();

      while !region.is_null() {
        let next = (*region).next;
        Region::destroy(&self.backend, region);
        region = next;
        released += 1;
      }
    }

    tracing::debug!(released, "arena trimmed");
  }

  /// Releases every region. The arena is empty afterwards and can be used
  /// again.
  pub fn free(&mut self) {
    let mut released = 0usize;
    let mut region = self.begin;

    while !region.is_null() {
      unsafe {
        let next = (*region).next;
        Region::destroy(&self.backend, region);
        region = next;
      }
      released += 1;
    }

    self.begin = ptr::null_mut();
    self.end = ptr::null_mut();

    if released > 0 {
      tracing::debug!(released, "arena freed");
    }
  }

  pub fn stats(&self) -> ArenaStats {
    let mut stats = ArenaStats::default();
    let mut past_end = false;

    for region in self.regions() {
      let region_ref = unsafe { &*region };

      stats.regions += 1;
      stats.capacity += region_ref.capacity * UNIT;
      stats.used += region_ref.used * UNIT;

      if !past_end {
        stats.regions_to_end += 1;
      }
      past_end |= region == self.end;
    }

    stats
  }
}

impl<B: Backend> Drop for Arena<B> {
  fn drop(&mut self) {
    self.free();
  }
}

impl<B: Backend> std::fmt::Debug for Arena<B> {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    f.debug_struct("Arena")
      .field("region_capacity", &self.region_capacity)
      .field("stats", &self.stats())
      .finish()
  }
}
