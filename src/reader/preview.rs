//! Truncated renderings of values and bytes for log output.

use std::fmt::Write;

/// Shorten `s` to `head ... tail` when it is longer than `max` characters.
///
/// A `max` of 10 or less disables truncation.
pub fn preview_str(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if max <= 10 || count <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max - 6).collect();
    let tail: String = s.chars().skip(count - 4).collect();
    format!("{} ... {}", head, tail)
}

/// Space-separated `0x..` hex bytes, truncated like [`preview_str`].
pub fn preview_hex(bytes: &[u8], max: usize) -> String {
    let mut out = String::with_capacity(bytes.len() * 5);
    if max > 10 && bytes.len() > max {
        push_hex(&mut out, &bytes[..max - 6]);
        out.push_str("... ");
        push_hex(&mut out, &bytes[bytes.len() - 4..]);
    } else {
        push_hex(&mut out, bytes);
    }
    out.truncate(out.trim_end().len());
    out
}

fn push_hex(out: &mut String, bytes: &[u8]) {
    for b in bytes {
        let _ = write!(out, "0x{:02x} ", b);
    }
}
