//! Error types for arena operations.

use std::io;

use thiserror::Error;

/// Everything that can go wrong while an arena obtains or fills memory.
///
/// The default API treats every variant as fatal and hands it to the
/// installed hook (see [`set_fatal_hook`](crate::set_fatal_hook)). The
/// `try_` family of methods returns it instead.
#[derive(Error, Debug)]
pub enum ArenaError {
  /// The backend could not obtain a block from the host.
  #[error("failed to acquire {bytes} bytes from the backend: {source}")]
  Acquire {
    /// Size of the block that was requested, header included.
    bytes: usize,
    /// What the host reported.
    #[source]
    source: io::Error,
  },

  /// `memory.grow` refused to extend the linear memory.
  #[error("failed to grow linear memory by {pages} pages")]
  LinearMemoryGrow {
    /// Number of 64 KiB pages requested.
    pages: usize,
  },

  /// A size computation overflowed `usize`.
  #[error("allocation of {bytes} bytes overflows the address space")]
  CapacityOverflow {
    /// Requested size in bytes.
    bytes: usize,
  },

  /// A `Display` implementation failed, or produced different output
  /// lengths on the measuring and writing passes.
  #[error("formatting failed")]
  Format,
}

impl ArenaError {
  pub(crate) fn out_of_memory(bytes: usize) -> Self {
    Self::Acquire {
      bytes,
      source: io::Error::from(io::ErrorKind::OutOfMemory),
    }
  }
}
