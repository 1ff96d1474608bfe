use std::ffi::CStr;

use rarena::{Arena, ArenaVec, StringBuilder, arena_format};

/// Reads an arena C string for printing.
unsafe fn c_str<'a>(ptr: *const u8) -> &'a str {
  unsafe { CStr::from_ptr(ptr.cast()) }.to_str().unwrap_or("<invalid utf-8>")
}

fn main() {
  // Region acquire/release events are logged at trace level.
  tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).init();

  let mut arena = Arena::new();

  // --------------------------------------------------------------------
  // 1) sprintf into the arena.
  // --------------------------------------------------------------------
  println!("-- format --");
  let text = arena_format!(arena, "Foo, {}, {}, {:.4}", "Bar", 69, 420.1337);
  println!("{}", unsafe { c_str(text.as_ptr()) });
  arena.reset();

  // --------------------------------------------------------------------
  // 2) String builder: text, a sized buffer, then the terminator.
  // --------------------------------------------------------------------
  println!("-- string builder --");
  let name = [b'W', b'o', b'r', b'l', b'd'];
  let mut sb = StringBuilder::new();

  unsafe {
    sb.push_str(&mut arena, "Hello, ");
    sb.extend_from_slice(&mut arena, &name);
    sb.push_nul(&mut arena);
    println!("{}", c_str(sb.as_ptr()));
  }
  arena.reset();

  // --------------------------------------------------------------------
  // 3) Scratch work undone with snapshot/rewind, then trimmed.
  // --------------------------------------------------------------------
  println!("-- snapshot / rewind / trim --");
  let kept = arena.strdup("kept across the rewind");
  let mark = arena.snapshot();

  let mut squares: ArenaVec<u64> = ArenaVec::new();
  unsafe {
    for i in 0..50_000u64 {
      squares.push(&mut arena, i * i);
    }
  }
  println!("after scratch: {:?}", arena.stats());

  unsafe { arena.rewind(mark) };
  println!("after rewind:  {:?}", arena.stats());

  arena.trim();
  println!("after trim:    {:?}", arena.stats());
  println!("{}", unsafe { c_str(kept.as_ptr()) });

  arena.free();
}
