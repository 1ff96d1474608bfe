use std::{
  alloc::{self, Layout},
  ptr::NonNull,
};

use super::Backend;
use crate::ArenaError;

/// Regions from the global Rust allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct Heap;

unsafe impl Backend for Heap {
  fn acquire(
    &self,
    layout: Layout,
  ) -> Result<NonNull<u8>, ArenaError> {
    // Region layouts always include the header, so the size is never zero.
    let block = unsafe { alloc::alloc(layout) };
    NonNull::new(block).ok_or_else(|| ArenaError::out_of_memory(layout.size()))
  }

  unsafe fn release(
    &self,
    block: NonNull<u8>,
    layout: Layout,
  ) {
    unsafe { alloc::dealloc(block.as_ptr(), layout) }
  }
}
