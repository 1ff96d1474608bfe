//! `sprintf` for arenas: measure, allocate once, write.

use std::{
  fmt::{self, Write},
  ptr::{self, NonNull},
};

use crate::{Arena, ArenaError, backend::Backend, fatal::or_fail};

/// Counts the bytes a formatting pass would produce.
struct Measure(usize);

impl Write for Measure {
  fn write_str(
    &mut self,
    s: &str,
  ) -> fmt::Result {
    self.0 = self.0.checked_add(s.len()).ok_or(fmt::Error)?;
    Ok(())
  }
}

/// Writes into uninitialized arena memory, refusing to go past `capacity`.
struct Fill {
  dst: *mut u8,
  capacity: usize,
  len: usize,
}

impl Write for Fill {
  fn write_str(
    &mut self,
    s: &str,
  ) -> fmt::Result {
    if s.len() > self.capacity - self.len {
      return Err(fmt::Error);
    }

    unsafe { ptr::copy_nonoverlapping(s.as_ptr(), self.dst.add(self.len), s.len()) };
    self.len += s.len();

    Ok(())
  }
}

impl<B: Backend> Arena<B> {
  /// Formats `args` into exactly as many bytes as the output needs plus a
  /// NUL terminator, and returns a pointer usable as a C string.
  ///
  /// Usually reached through [`arena_format!`](crate::arena_format).
  #[inline]
  pub fn format(
    &mut self,
    args: fmt::Arguments<'_>,
  ) -> NonNull<u8> {
    or_fail(self.try_format(args))
  }

  /// Fallible [`Arena::format`].
  ///
  /// Fails with [`ArenaError::Format`] if a `Display` implementation
  /// errors, or writes a different amount the second time around.
  pub fn try_format(
    &mut self,
    args: fmt::Arguments<'_>,
  ) -> Result<NonNull<u8>, ArenaError> {
    // Literal-only arguments skip the measuring pass.
    if let Some(text) = args.as_str() {
      return self.try_strdup(text);
    }

    let mut measure = Measure(0);
    measure.write_fmt(args).map_err(|_| ArenaError::Format)?;

    let len = measure.0;
    let total = len.checked_add(1).ok_or(ArenaError::CapacityOverflow { bytes: len })?;
    let output = self.try_alloc(total)?;

    let mut fill = Fill {
      dst: output.as_ptr(),
      capacity: len,
      len: 0,
    };
    fill.write_fmt(args).map_err(|_| ArenaError::Format)?;

    if fill.len != len {
      return Err(ArenaError::Format);
    }

    unsafe { output.as_ptr().add(len).write(0) };

    Ok(output)
  }
}

/// Formats into an arena, like `sprintf`.
///
/// ```rust
/// use std::ffi::CStr;
/// use rarena::{Arena, arena_format};
///
/// let mut arena = Arena::new();
/// let text = arena_format!(arena, "Foo, {}, {}, {:.4}", "Bar", 69, 420.1337);
///
/// let text = unsafe { CStr::from_ptr(text.as_ptr().cast()) };
/// assert_eq!(text.to_str().unwrap(), "Foo, Bar, 69, 420.1337");
/// ```
#[macro_export]
macro_rules! arena_format {
  ($arena:expr, $($arg:tt)*) => {
    $arena.format(::core::format_args!($($arg)*))
  };
}
