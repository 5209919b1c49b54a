//! UTF-8 checker

#![no_main]

use ws_engine::web_socket::Utf8Checker;

libfuzzer_sys::fuzz_target!(|data: (Vec<u8>, usize)| {
  let (bytes, split) = data;
  let (lhs, rhs) = bytes.split_at(split % bytes.len().max(1));
  let mut checker = Utf8Checker::new();
  let is_valid = checker.write(lhs) && checker.write(rhs) && checker.finish();
  assert_eq!(is_valid, core::str::from_utf8(&bytes).is_ok());
});
