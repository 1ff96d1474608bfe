use std::{alloc::Layout, mem, ptr, ptr::NonNull};

use crate::{ArenaError, align::UNIT, backend::Backend};

/// Header of a region. The storage, `capacity` machine words, follows it
/// directly in the same block.
///
/// ```text
///   ┌──────────┬──────────┬──────────┬────────────────────────────────┐
///   │   next   │   used   │ capacity │  data: [usize; capacity]       │
///   └──────────┴──────────┴──────────┴────────────────────────────────┘
///                                    ▲
///                                    └── always word aligned
/// ```
#[repr(C)]
pub(crate) struct Region {
  pub next: *mut Region,
  pub used: usize,
  pub capacity: usize,
}

const _: () = assert!(mem::size_of::<Region>() % UNIT == 0);

impl Region {
  fn new(capacity: usize) -> Self {
    Self {
      next: ptr::null_mut(),
      used: 0,
      capacity,
    }
  }

  /// Layout of a whole region block holding `capacity` units.
  pub fn layout(capacity: usize) -> Result<Layout, ArenaError> {
    let overflow = || ArenaError::CapacityOverflow {
      bytes: capacity.saturating_mul(UNIT),
    };

    let bytes = capacity
      .checked_mul(UNIT)
      .and_then(|data| data.checked_add(mem::size_of::<Region>()))
      .ok_or_else(overflow)?;

    Layout::from_size_align(bytes, mem::align_of::<Region>()).map_err(|_| overflow())
  }

  /// Obtains a block from `backend` and writes an empty header into it.
  pub fn create<B: Backend>(
    backend: &B,
    capacity: usize,
  ) -> Result<*mut Region, ArenaError> {
    let layout = Self::layout(capacity)?;
    let region = backend.acquire(layout)?.as_ptr() as *mut Region;

    unsafe { region.write(Region::new(capacity)) };

    tracing::trace!(?region, capacity, bytes = layout.size(), "region acquired");

    Ok(region)
  }

  /// Returns the region's block to `backend`.
  ///
  /// # Safety
  ///
  /// `region` must come from [`Region::create`] on the same backend and must
  /// not be used afterwards.
  pub unsafe fn destroy<B: Backend>(
    backend: &B,
    region: *mut Region,
  ) {
    unsafe {
      let capacity = (*region).capacity;
      // The same layout was validated when the region was created.
      let layout = Layout::from_size_align_unchecked(
        mem::size_of::<Region>() + capacity * UNIT,
        mem::align_of::<Region>(),
      );

      tracing::trace!(?region, capacity, "region released");

      backend.release(NonNull::new_unchecked(region as *mut u8), layout);
    }
  }

  /// First word of storage.
  ///
  /// # Safety
  ///
  /// `region` must point to a live region.
  pub unsafe fn data(region: *mut Region) -> *mut usize {
    unsafe { region.add(1) as *mut usize }
  }

  pub fn remaining(&self) -> usize {
    self.capacity - self.used
  }

  pub fn fits(
    &self,
    units: usize,
  ) -> bool {
    units <= self.remaining()
  }
}
