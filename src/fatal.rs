//! The process-wide hook that runs when an infallible operation fails.

use std::sync::{PoisonError, RwLock};

use crate::ArenaError;

/// Signature of a fatal hook. It must not return.
pub type FatalHook = fn(&ArenaError) -> !;

static HOOK: RwLock<FatalHook> = RwLock::new(abort_hook as FatalHook);

/// Logs the error and aborts the process. Installed by default.
pub fn abort_hook(err: &ArenaError) -> ! {
  tracing::error!(error = %err, "arena: unrecoverable allocation failure");
  std::process::abort()
}

/// Replaces the hook invoked by [`Arena::alloc`](crate::Arena::alloc) and
/// the other non-`try_` operations on failure. Returns the previous hook.
///
/// A hook that panics turns allocation failures into unwinding panics,
/// which is mostly useful in tests.
pub fn set_fatal_hook(hook: FatalHook) -> FatalHook {
  let mut slot = HOOK.write().unwrap_or_else(PoisonError::into_inner);
  std::mem::replace(&mut *slot, hook)
}

pub(crate) fn fail(err: ArenaError) -> ! {
  let hook = *HOOK.read().unwrap_or_else(PoisonError::into_inner);
  hook(&err)
}

/// Unwraps `result`, sending any error to the fatal hook.
#[inline]
pub(crate) fn or_fail<T>(result: Result<T, ArenaError>) -> T {
  match result {
    Ok(value) => value,
    Err(err) => fail(err),
  }
}
