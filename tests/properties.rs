//! Property tests for allocation, rewind and growth invariants.

use std::{alloc::Layout, cell::Cell, ffi::CStr, ptr::NonNull, rc::Rc};

use proptest::prelude::*;
use rarena::{Arena, ArenaError, Backend, GROWTH_MIN, Heap, StringBuilder, align};

const UNIT: usize = size_of::<usize>();

// ---------------------------------------------------------------------------
// Test backend
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
struct Counting {
  acquired: Rc<Cell<usize>>,
  released: Rc<Cell<usize>>,
}

unsafe impl Backend for Counting {
  fn acquire(
    &self,
    layout: Layout,
  ) -> Result<NonNull<u8>, ArenaError> {
    self.acquired.set(self.acquired.get() + 1);
    Heap.acquire(layout)
  }

  unsafe fn release(
    &self,
    block: NonNull<u8>,
    layout: Layout,
  ) {
    self.released.set(self.released.get() + 1);
    unsafe { Heap.release(block, layout) }
  }
}

fn byte_sizes(max: usize) -> impl Strategy<Value = Vec<usize>> {
  proptest::collection::vec(0..=max, 1..40)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
  #![proptest_config(ProptestConfig::with_cases(64))]

  #[test]
  fn allocations_within_one_region_do_not_overlap(sizes in byte_sizes(64)) {
    let total: usize = sizes.iter().map(|&s| align!(s)).sum();
    let capacity = total / UNIT + 1;
    let mut arena = Arena::with_region_capacity_in(capacity, Counting::default());

    let mut spans: Vec<(usize, usize)> = sizes
      .iter()
      .map(|&size| (arena.alloc(size).as_ptr() as usize, align!(size)))
      .collect();

    prop_assert_eq!(arena.backend().acquired.get(), 1);
    prop_assert_eq!(arena.stats().used, total);

    spans.sort();
    for pair in spans.windows(2) {
      prop_assert_eq!(pair[0].0 % UNIT, 0);
      prop_assert!(pair[0].0 + pair[0].1 <= pair[1].0);
    }
  }

  #[test]
  fn realloc_shrink_is_identity(old in 1usize..512, shrink in 0usize..512) {
    let mut arena = Arena::new();
    let new = old.saturating_sub(shrink);
    let p = arena.alloc(old);

    prop_assert_eq!(unsafe { arena.realloc(p, old, new) }, p);
  }

  #[test]
  fn realloc_grow_preserves_prefix(content in proptest::collection::vec(any::<u8>(), 1..256), extra in 1usize..4096) {
    let mut arena = Arena::with_region_capacity(32);
    let p = arena.memdup(&content).cast::<u8>();

    let q = unsafe { arena.realloc(p, content.len(), content.len() + extra) };

    prop_assert_ne!(p, q);
    prop_assert_eq!(unsafe { std::slice::from_raw_parts(q.as_ptr(), content.len()) }, content.as_slice());
  }

  #[test]
  fn strdup_round_trip(text in "[^\\x00]{0,200}") {
    let mut arena = Arena::new();
    let copy = arena.strdup(&text);

    let bytes = unsafe { std::slice::from_raw_parts(copy.as_ptr(), text.len() + 1) };
    prop_assert_eq!(&bytes[..text.len()], text.as_bytes());
    prop_assert_eq!(bytes[text.len()], 0);

    let read = unsafe { CStr::from_ptr(copy.as_ptr().cast()) };
    prop_assert_eq!(read.to_str().unwrap(), text.as_str());
  }

  #[test]
  fn rewind_then_replay_reuses_addresses(prefix in byte_sizes(200), replay in byte_sizes(200)) {
    let mut arena = Arena::with_region_capacity_in(32, Counting::default());

    for &size in &prefix {
      arena.alloc(size);
    }

    let mark = arena.snapshot();
    let first: Vec<_> = replay.iter().map(|&s| arena.alloc(s)).collect();
    let acquired = arena.backend().acquired.get();

    unsafe { arena.rewind(mark) };
    let second: Vec<_> = replay.iter().map(|&s| arena.alloc(s)).collect();

    prop_assert_eq!(first, second);
    prop_assert_eq!(arena.backend().acquired.get(), acquired);
  }

  #[test]
  fn trim_releases_exactly_the_regions_after_the_mark(prefix in byte_sizes(200), scratch in byte_sizes(400)) {
    let mut arena = Arena::with_region_capacity_in(16, Counting::default());

    for &size in &prefix {
      arena.alloc(size);
    }
    let mark = arena.snapshot();
    let kept = arena.stats();

    for &size in &scratch {
      arena.alloc(size);
    }
    let grown = arena.stats();

    unsafe { arena.rewind(mark) };
    arena.trim();

    let trimmed = arena.stats();
    prop_assert_eq!(arena.backend().released.get(), grown.regions - kept.regions_to_end);
    prop_assert_eq!(trimmed.regions, kept.regions_to_end);
    prop_assert_eq!(trimmed.regions_to_end, kept.regions_to_end);
  }

  #[test]
  fn string_builder_capacity_and_content(fragments in proptest::collection::vec("[a-z]{0,300}", 0..30)) {
    let mut arena = Arena::new();
    let mut sb = StringBuilder::new();

    for fragment in &fragments {
      unsafe { sb.push_str(&mut arena, fragment) };

      let capacity = sb.capacity();
      prop_assert!(capacity == 0 || (capacity % GROWTH_MIN == 0 && (capacity / GROWTH_MIN).is_power_of_two()));
    }
    unsafe { sb.push_nul(&mut arena) };

    let built = unsafe { CStr::from_ptr(sb.as_ptr().cast()) };
    prop_assert_eq!(built.to_str().unwrap(), fragments.concat());
  }

  #[test]
  fn reset_twice_equals_reset_once(sizes in byte_sizes(300)) {
    let mut arena = Arena::with_region_capacity(8);
    for &size in &sizes {
      arena.alloc(size);
    }

    arena.reset();
    let once = arena.stats();
    arena.reset();

    prop_assert_eq!(arena.stats(), once);
    prop_assert_eq!(once.used, 0);
    prop_assert_eq!(once.regions_to_end, 1);
  }
}
