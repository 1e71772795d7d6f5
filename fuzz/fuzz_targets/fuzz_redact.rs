//! Fuzz target for credential redaction.
//!
//! A secret embedded anywhere in arbitrary text must not survive redaction.

#![no_main]

use libfuzzer_sys::fuzz_target;
use space_publish::transport::Redactor;

const SECRET: &str = "hf_FuzzSecretValue";

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let split = text.char_indices().nth(text.chars().count() / 2).map_or(0, |(i, _)| i);
    let (head, tail) = text.split_at(split);
    let input = format!("{}https://user:{}@host/{}", head, SECRET, tail);

    let redacted = Redactor::new().with_secret(SECRET).redact(&input);
    assert!(!redacted.contains(SECRET));
});
