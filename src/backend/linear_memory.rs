//! Bump allocation of regions straight out of wasm linear memory.
//!
//! ```text
//!   linear memory (pages of 64 KiB)
//!   ┌──────────────────────┬──────────┬──────────┬──────────────┐
//!   │  data, stack, other  │ region A │ region B │   (unused)   │
//!   │  allocators          │          │          │              │
//!   └──────────────────────┴──────────┴──────────┴──────────────┘
//!                          ▲                     ▲              ▲
//!                      first page we         offset           limit
//!                      grew ourselves
//! ```
//!
//! Only pages obtained through our own `memory.grow` calls are handed out,
//! so the Rust global allocator can keep growing the same memory. If it
//! does so between two of our growths, the pages we get back are not
//! adjacent to `limit` and the cursor restarts at the new pages, leaving
//! the old tail unused.
//!
//! Blocks are never given back: the offset only moves forward for the
//! lifetime of the process.

#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use crate::ArenaError;

/// Size of one wasm memory page.
pub const PAGE_SIZE: usize = 64 * 1024;

/// Forward-only cursor over the pages this backend owns.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BumpCursor {
  pub offset: usize,
  pub limit: usize,
}

impl BumpCursor {
  /// Carves `bytes` aligned to `align` out of the owned pages, calling
  /// `grow` for more whenever they run out.
  ///
  /// `grow(pages)` must behave like `memory.grow`: return the previous
  /// memory size in pages, or `None` when the memory cannot grow.
  pub fn bump(
    &mut self,
    bytes: usize,
    align: usize,
    mut grow: impl FnMut(usize) -> Option<usize>,
  ) -> Result<usize, ArenaError> {
    let overflow = || ArenaError::CapacityOverflow { bytes };

    loop {
      let start = self
        .offset
        .checked_add(align - 1)
        .map(|padded| padded & !(align - 1))
        .ok_or_else(overflow)?;
      let end = start.checked_add(bytes).ok_or_else(overflow)?;

      if end <= self.limit {
        self.offset = end;
        return Ok(start);
      }

      let shortfall = end - self.limit;
      let pages = shortfall.div_ceil(PAGE_SIZE);
      let previous = grow(pages).ok_or(ArenaError::LinearMemoryGrow { pages })?;
      let base = previous.checked_mul(PAGE_SIZE).ok_or_else(overflow)?;

      if base != self.limit {
        tracing::trace!(base, abandoned = self.limit - self.offset, "linear memory: restarting cursor");
        self.offset = base;
      }
      self.limit = base + pages * PAGE_SIZE;
    }
  }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::LinearMemory;

#[cfg(target_arch = "wasm32")]
mod wasm {
  use std::{
    alloc::Layout,
    arch::wasm32,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
  };

  use super::BumpCursor;
  use crate::{ArenaError, backend::Backend};

  // Single-threaded wasm lowers these to plain loads and stores.
  static OFFSET: AtomicUsize = AtomicUsize::new(0);
  static LIMIT: AtomicUsize = AtomicUsize::new(0);

  /// Regions bumped out of wasm linear memory. `release` does nothing.
  ///
  /// All values share one process-wide cursor that is never reset, and it
  /// is not safe to use from several threads.
  #[derive(Debug, Default, Clone, Copy)]
  pub struct LinearMemory;

  unsafe impl Backend for LinearMemory {
    fn acquire(
      &self,
      layout: Layout,
    ) -> Result<NonNull<u8>, ArenaError> {
      let mut cursor = BumpCursor {
        offset: OFFSET.load(Ordering::Relaxed),
        limit: LIMIT.load(Ordering::Relaxed),
      };

      let grow = |pages: usize| match wasm32::memory_grow::<0>(pages) {
        usize::MAX => None,
        previous => Some(previous),
      };
      let result = cursor.bump(layout.size(), layout.align(), grow);

      // Pages grown before a failure stay owned.
      OFFSET.store(cursor.offset, Ordering::Relaxed);
      LIMIT.store(cursor.limit, Ordering::Relaxed);

      let address = result?;
      NonNull::new(address as *mut u8).ok_or_else(|| ArenaError::out_of_memory(layout.size()))
    }

    unsafe fn release(
      &self,
      _block: NonNull<u8>,
      _layout: Layout,
    ) {
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Simulated linear memory: tracks the page count and lets a test grow
  /// it behind the cursor's back.
  struct Memory {
    pages: usize,
    max_pages: usize,
  }

  impl Memory {
    fn grow(
      &mut self,
      delta: usize,
    ) -> Option<usize> {
      if self.pages + delta > self.max_pages {
        return None;
      }
      let previous = self.pages;
      self.pages += delta;
      Some(previous)
    }
  }

  #[test]
  fn test_first_use_grows_past_existing_memory() {
    let mut memory = Memory { pages: 3, max_pages: 100 };
    let mut cursor = BumpCursor::default();

    let a = cursor.bump(100, 8, |n| memory.grow(n)).unwrap();

    assert_eq!(a, 3 * PAGE_SIZE);
    assert_eq!(memory.pages, 4);
    assert_eq!(cursor.offset, a + 100);
    assert_eq!(cursor.limit, 4 * PAGE_SIZE);
  }

  #[test]
  fn test_reuses_owned_pages_before_growing() {
    let mut memory = Memory { pages: 1, max_pages: 100 };
    let mut cursor = BumpCursor::default();

    let a = cursor.bump(1000, 8, |n| memory.grow(n)).unwrap();
    let b = cursor.bump(1000, 8, |n| memory.grow(n)).unwrap();

    assert_eq!(b, a + 1000);
    assert_eq!(memory.pages, 2);
  }

  #[test]
  fn test_contiguous_growth_extends_the_run() {
    let mut memory = Memory { pages: 1, max_pages: 100 };
    let mut cursor = BumpCursor::default();

    let a = cursor.bump(PAGE_SIZE - 8, 8, |n| memory.grow(n)).unwrap();
    let b = cursor.bump(PAGE_SIZE, 8, |n| memory.grow(n)).unwrap();

    assert_eq!(b, a + PAGE_SIZE - 8);
    assert_eq!(memory.pages, 3);
    assert_eq!(cursor.limit, 3 * PAGE_SIZE);
  }

  #[test]
  fn test_foreign_growth_restarts_the_run() {
    let mut memory = Memory { pages: 1, max_pages: 100 };
    let mut cursor = BumpCursor::default();

    cursor.bump(PAGE_SIZE - 64, 8, |n| memory.grow(n)).unwrap();

    // Someone else takes the next two pages.
    memory.grow(2).unwrap();

    let b = cursor.bump(128, 8, |n| memory.grow(n)).unwrap();

    assert_eq!(b, 4 * PAGE_SIZE);
    assert_eq!(cursor.offset, b + 128);
    assert_eq!(cursor.limit, 5 * PAGE_SIZE);
  }

  #[test]
  fn test_growth_failure() {
    let mut memory = Memory { pages: 1, max_pages: 2 };
    let mut cursor = BumpCursor::default();

    let err = cursor.bump(3 * PAGE_SIZE, 8, |n| memory.grow(n)).unwrap_err();

    assert!(matches!(err, ArenaError::LinearMemoryGrow { pages: 3 }));
    assert_eq!(memory.pages, 1);
    assert_eq!(cursor, BumpCursor::default());
  }
}
