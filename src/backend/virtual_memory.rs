use std::{alloc::Layout, io, ptr, ptr::NonNull};

use windows_sys::Win32::System::Memory::{
  MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE, VirtualAlloc, VirtualFree,
};

use super::Backend;
use crate::ArenaError;

/// Regions reserved and committed in one step with `VirtualAlloc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct VirtualMemory;

unsafe impl Backend for VirtualMemory {
  fn acquire(
    &self,
    layout: Layout,
  ) -> Result<NonNull<u8>, ArenaError> {
    let address = unsafe {
      VirtualAlloc(
        ptr::null(),
        layout.size(),
        MEM_RESERVE | MEM_COMMIT,
        PAGE_READWRITE,
      )
    };

    NonNull::new(address as *mut u8).ok_or_else(|| ArenaError::Acquire {
      bytes: layout.size(),
      source: io::Error::last_os_error(),
    })
  }

  unsafe fn release(
    &self,
    block: NonNull<u8>,
    layout: Layout,
  ) {
    // MEM_RELEASE frees the whole reservation and requires a size of zero.
    let ok = unsafe { VirtualFree(block.as_ptr().cast(), 0, MEM_RELEASE) };

    if ok == 0 {
      tracing::error!(
        address = ?block,
        bytes = layout.size(),
        error = %io::Error::last_os_error(),
        "VirtualFree failed"
      );
    }
  }
}
