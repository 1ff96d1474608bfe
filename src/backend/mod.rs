//! Strategies for obtaining raw region memory from the host.
//!
//! ```text
//!   Backend            acquire                    release
//!   ─────────────────  ─────────────────────────  ───────────────────────
//!   Heap               std::alloc::alloc          std::alloc::dealloc
//!   Mmap (unix)        mmap(MAP_ANONYMOUS)        munmap(exact range)
//!   VirtualMemory      VirtualAlloc(RESERVE|      VirtualFree(RELEASE)
//!     (windows)          COMMIT)
//!   LinearMemory       bump + memory.grow         no-op
//!     (wasm32)
//! ```
//!
//! An [`Arena`](crate::Arena) is generic over its backend. The type used
//! when none is named, [`DefaultBackend`], is picked at build time by the
//! `mmap`, `virtual-alloc` and `linear-memory` cargo features, falling back
//! to [`Heap`].

use std::{alloc::Layout, ptr::NonNull};

use crate::ArenaError;

mod heap;
mod linear_memory;
#[cfg(unix)]
mod mmap;
#[cfg(windows)]
mod virtual_memory;

pub use heap::Heap;
#[cfg(target_arch = "wasm32")]
pub use linear_memory::LinearMemory;
pub use linear_memory::PAGE_SIZE as LINEAR_MEMORY_PAGE_SIZE;
#[cfg(unix)]
pub use mmap::Mmap;
#[cfg(windows)]
pub use virtual_memory::VirtualMemory;

/// A source of raw memory blocks for regions.
///
/// # Safety
///
/// `acquire` must return a block that is valid for reads and writes of
/// `layout.size()` bytes, aligned to at least `layout.align()`, and not
/// aliased by anything else until it is passed to `release`. `release` is
/// only ever called with a block and layout that `acquire` produced on the
/// same backend value.
pub unsafe trait Backend {
  /// Obtains a block for `layout`.
  fn acquire(
    &self,
    layout: Layout,
  ) -> Result<NonNull<u8>, ArenaError>;

  /// Gives the block back to the host.
  ///
  /// # Safety
  ///
  /// `block` must come from `acquire` on this backend with the same
  /// `layout`, and must not be used afterwards.
  unsafe fn release(
    &self,
    block: NonNull<u8>,
    layout: Layout,
  );
}

#[cfg(any(
  all(feature = "mmap", feature = "virtual-alloc"),
  all(feature = "mmap", feature = "linear-memory"),
  all(feature = "virtual-alloc", feature = "linear-memory"),
))]
compile_error!("select at most one of the `mmap`, `virtual-alloc` and `linear-memory` features");

#[cfg(all(feature = "mmap", not(unix)))]
compile_error!("the `mmap` backend requires a unix target");

#[cfg(all(feature = "virtual-alloc", not(windows)))]
compile_error!("the `virtual-alloc` backend requires a windows target");

#[cfg(all(feature = "linear-memory", not(target_arch = "wasm32")))]
compile_error!("the `linear-memory` backend requires a wasm32 target");

/// The backend used by [`Arena::new`](crate::Arena::new).
#[cfg(feature = "mmap")]
pub type DefaultBackend = Mmap;

/// The backend used by [`Arena::new`](crate::Arena::new).
#[cfg(feature = "virtual-alloc")]
pub type DefaultBackend = VirtualMemory;

/// The backend used by [`Arena::new`](crate::Arena::new).
#[cfg(feature = "linear-memory")]
pub type DefaultBackend = LinearMemory;

/// The backend used by [`Arena::new`](crate::Arena::new).
#[cfg(not(any(feature = "mmap", feature = "virtual-alloc", feature = "linear-memory")))]
pub type DefaultBackend = Heap;
