use std::{alloc::Layout, io, ptr, ptr::NonNull};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, c_void, mmap, munmap};

use super::Backend;
use crate::ArenaError;

/// Regions from anonymous private mappings.
///
/// Every region is its own mapping, so mappings are page-aligned and a
/// region smaller than a page still costs a whole page.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mmap;

unsafe impl Backend for Mmap {
  fn acquire(
    &self,
    layout: Layout,
  ) -> Result<NonNull<u8>, ArenaError> {
    let address = unsafe {
      mmap(
        ptr::null_mut(),
        layout.size(),
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if address == MAP_FAILED {
      return Err(ArenaError::Acquire {
        bytes: layout.size(),
        source: io::Error::last_os_error(),
      });
    }

    NonNull::new(address as *mut u8).ok_or_else(|| ArenaError::out_of_memory(layout.size()))
  }

  unsafe fn release(
    &self,
    block: NonNull<u8>,
    layout: Layout,
  ) {
    let ret = unsafe { munmap(block.as_ptr() as *mut c_void, layout.size()) };

    if ret != 0 {
      tracing::error!(
        address = ?block,
        bytes = layout.size(),
        error = %io::Error::last_os_error(),
        "munmap failed"
      );
    }
  }
}
