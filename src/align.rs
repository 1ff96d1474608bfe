/// Size in bytes of one allocation unit: the machine word.
pub const UNIT: usize = core::mem::size_of::<usize>();

/// Rounds a byte count up to the machine word alignment.
///
/// # Examples
///
/// ```rust
/// use rarena::align;
///
/// match core::mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + ::core::mem::size_of::<usize>() - 1) & !(::core::mem::size_of::<usize>() - 1)
  };
}

/// Number of allocation units needed to hold the given byte count.
///
/// ```rust
/// use rarena::units;
///
/// assert_eq!(units!(0), 0);
/// assert_eq!(units!(1), 1);
/// assert_eq!(units!(core::mem::size_of::<usize>() + 1), 2);
/// ```
#[macro_export]
macro_rules! units {
  ($value:expr) => {
    $crate::align!($value) / ::core::mem::size_of::<usize>()
  };
}

/// Overflow-checked [`units!`].
pub(crate) fn checked_units(bytes: usize) -> Option<usize> {
  bytes.checked_add(UNIT - 1).map(|padded| padded / UNIT)
}
