//! Byte-sequence helpers shared by both text kinds.

use std::fmt::Write as _;

/// Position of the first occurrence of `needle` in `haystack`.
/// An empty needle matches at offset 0.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}

/// Removes the first occurrence of `needle`; returns `haystack`
/// unchanged when there is none.
pub fn remove_first(haystack: &[u8], needle: &[u8]) -> Vec<u8> {
    match find(haystack, needle) {
        Some(start) => {
            let mut out = Vec::with_capacity(haystack.len() - needle.len());
            out.extend_from_slice(&haystack[..start]);
            out.extend_from_slice(&haystack[start + needle.len()..]);
            out
        }
        None => haystack.to_vec(),
    }
}

/// Single-quoted NASL literal. Single-quoted strings interpret escapes,
/// so anything outside printable ASCII is written as `\xHH`.
pub fn single_quoted(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('\'');
    for &byte in bytes {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(char::from(byte)),
            _ => {
                let _ = write!(out, "\\x{byte:02x}");
            }
        }
    }
    out.push('\'');
    out
}

/// Impure text literal. Double-quoted strings take their bytes verbatim
/// and read back as impure text, but cannot hold `"` or invalid UTF-8.
/// Such runs are written as escaped single-quoted pieces joined with
/// `+`; the leading double-quoted piece keeps the sum impure.
pub fn double_quoted(bytes: &[u8]) -> String {
    let mut pieces: Vec<String> = Vec::new();
    let mut plain = String::new();
    let mut escaped: Vec<u8> = Vec::new();

    for chunk in bytes.utf8_chunks() {
        for ch in chunk.valid().chars() {
            if ch == '"' {
                flush_plain(&mut pieces, &mut plain);
                escaped.push(b'"');
            } else {
                flush_escaped(&mut pieces, &mut escaped);
                plain.push(ch);
            }
        }
        if !chunk.invalid().is_empty() {
            flush_plain(&mut pieces, &mut plain);
            escaped.extend_from_slice(chunk.invalid());
        }
    }
    flush_plain(&mut pieces, &mut plain);
    flush_escaped(&mut pieces, &mut escaped);

    match pieces.as_slice() {
        [] => "\"\"".to_string(),
        [only] if only.starts_with('"') => only.clone(),
        _ => {
            if !pieces[0].starts_with('"') {
                pieces.insert(0, "\"\"".to_string());
            }
            format!("({})", pieces.join(" + "))
        }
    }
}

fn flush_plain(pieces: &mut Vec<String>, plain: &mut String) {
    if !plain.is_empty() {
        pieces.push(format!("\"{plain}\""));
        plain.clear();
    }
}

fn flush_escaped(pieces: &mut Vec<String>, escaped: &mut Vec<u8>) {
    if !escaped.is_empty() {
        pieces.push(single_quoted(escaped));
        escaped.clear();
    }
}
