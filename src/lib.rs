//! # rarena - A Region-Based Arena Allocator
//!
//! This crate provides a **region-based bump allocator**: memory is handed
//! out from a chain of large regions by bumping a counter, and is given
//! back all at once instead of object by object.
//!
//! ## Overview
//!
//! ```text
//!   Arena:
//!
//!   begin                                         end
//!     │                                            │
//!     ▼                                            ▼
//!   ┌────────┬───────────────────────┐      ┌────────┬──────────────────┐
//!   │ header │ A1 │ A2 │ A3 │ A4 │A5 │ ───► │ header │ A6 │ A7 │  free   │
//!   └────────┴───────────────────────┘      └────────┴──────────────────┘
//!     region 1 (full)                         region 2      ▲
//!                                                           │
//!                                                      bump pointer
//!                                                      (next alloc)
//!
//!   Each allocation "bumps" the used counter of the current region.
//!   When it does not fit, the arena moves on to the next region, creating
//!   one if the chain ends.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rarena
//!   ├── align      - Word rounding macros (align!, units!)
//!   ├── arena      - Arena, Mark, ArenaStats
//!   ├── backend    - Backend trait: Heap, Mmap, VirtualMemory, LinearMemory
//!   ├── error      - ArenaError
//!   ├── fatal      - Hook run when an infallible operation fails
//!   ├── format     - arena_format! (feature "format")
//!   ├── region     - Region header (internal)
//!   └── vec        - ArenaVec, StringBuilder
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::ffi::CStr;
//! use rarena::{Arena, StringBuilder};
//!
//! let mut arena = Arena::new();
//!
//! // Raw memory, word aligned.
//! let ptr = arena.alloc(size_of::<u64>()).cast::<u64>();
//! unsafe { ptr.write(42) };
//!
//! // Checkpoint, scratch work, roll back.
//! let mark = arena.snapshot();
//! let mut sb = StringBuilder::new();
//! unsafe {
//!     sb.push_str(&mut arena, "Hello, ");
//!     sb.push_str(&mut arena, "World");
//!     sb.push_nul(&mut arena);
//!     assert_eq!(CStr::from_ptr(sb.as_ptr().cast()).to_str(), Ok("Hello, World"));
//!
//!     arena.rewind(mark);
//!     assert_eq!(ptr.read(), 42);
//! }
//!
//! // Give every region back.
//! arena.free();
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//!                alloc                       alloc / snapshot / rewind / reset
//!   ┌───────┐  ──────────►  ┌────────┐  ◄───────────────────────────────┐
//!   │ empty │               │ active │ ─────────────────────────────────┘
//!   └───────┘  ◄──────────  └────────┘
//!                 free                  trim: release regions after `end`
//! ```
//!
//! - [`Arena::snapshot`] / [`Arena::rewind`] undo every allocation made
//!   after the mark and keep the regions for reuse.
//! - [`Arena::reset`] rewinds to the very first byte.
//! - [`Arena::trim`] releases the regions a rewind left empty.
//! - [`Arena::free`] (and `Drop`) releases everything.
//!
//! ## Backends
//!
//! Regions come from a [`Backend`]. The build picks [`DefaultBackend`]
//! with cargo features:
//!
//! | feature         | backend                       | target  |
//! |-----------------|-------------------------------|---------|
//! | *(none)*        | [`Heap`], global allocator    | any     |
//! | `mmap`          | `Mmap`, anonymous mappings    | unix    |
//! | `virtual-alloc` | `VirtualMemory`, VirtualAlloc | windows |
//! | `linear-memory` | `LinearMemory`, memory.grow   | wasm32  |
//!
//! Any backend available on the target can also be passed explicitly with
//! [`Arena::new_in`].
//!
//! ## Failure
//!
//! [`Arena::alloc`] and friends never return null: when a backend refuses
//! memory they call the fatal hook, which logs through `tracing` and aborts
//! the process unless replaced with [`set_fatal_hook`]. Every such method
//! has a `try_` twin returning [`ArenaError`].
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization, `Arena` is `!Send`
//! - **No per-object free**: memory comes back by region, rewind or reset
//! - **Word alignment only**: stricter alignment must be padded by hand
//!
//! ## Safety
//!
//! Allocation hands out raw pointers. Whether they are still valid depends
//! on what the arena has done since (reset, rewind, trim, free), which the
//! compiler cannot track, so reading through them, rewinding, and the
//! [`ArenaVec`] operations are `unsafe`.

pub mod align;
mod arena;
pub mod backend;
mod error;
mod fatal;
#[cfg(feature = "format")]
mod format;
mod region;
mod vec;

pub use arena::{Arena, ArenaStats, Mark, REGION_DEFAULT_CAPACITY};
pub use backend::{Backend, DefaultBackend, Heap};
#[cfg(target_arch = "wasm32")]
pub use backend::LinearMemory;
#[cfg(unix)]
pub use backend::Mmap;
#[cfg(windows)]
pub use backend::VirtualMemory;
pub use error::ArenaError;
pub use fatal::{FatalHook, abort_hook, set_fatal_hook};
pub use vec::{ArenaVec, GROWTH_MIN, StringBuilder};
