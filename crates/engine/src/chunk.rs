// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message chunking for platform length limits.

/// Platform message size limit in bytes.
pub const MAX_CHUNK: usize = 2000;

/// Split `text` into chunks of at most `max` bytes.
///
/// Prefers breaking at the last newline in the second half of each window
/// so chunks end on line boundaries; falls back to a hard split when no
/// such newline exists. Break newlines are consumed (re-joining chunks
/// with `\n` restores the original text up to hard splits). Splits never
/// land inside a UTF-8 sequence.
pub fn split_message(text: &str, max: usize) -> Vec<String> {
    if text.is_empty() || max == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut rest = text;
    while rest.len() > max {
        let mut window_end = max;
        while window_end > 0 && !rest.is_char_boundary(window_end) {
            window_end -= 1;
        }
        if window_end == 0 {
            // max is smaller than the first character; take it whole
            let first = rest.chars().next().map(|c| c.len_utf8()).unwrap_or(1);
            chunks.push(rest[..first].to_string());
            rest = &rest[first..];
            continue;
        }
        let window = &rest[..window_end];

        match window.rfind('\n').filter(|&i| i >= window_end / 2) {
            Some(i) => {
                chunks.push(rest[..i].to_string());
                rest = &rest[i + 1..];
            }
            None => {
                chunks.push(window.to_string());
                rest = &rest[window_end..];
            }
        }
    }
    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

#[cfg(test)]
#[path = "chunk_tests.rs"]
mod tests;
