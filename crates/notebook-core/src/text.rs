//! UTF-16 aware text helpers.
//!
//! Positions carry UTF-16 code unit offsets, while Rust strings are UTF-8. These helpers convert
//! between the two when a line's content has to be sliced or measured.

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> u32 {
    text.encode_utf16().count() as u32
}

/// Convert a UTF-16 code unit offset into a byte offset in `text`.
///
/// An offset that falls inside a surrogate pair rounds up to the end of that character.
/// Offsets beyond the end of `text` clamp to `text.len()`.
pub fn utf16_to_byte_offset(text: &str, utf16_offset: u32) -> usize {
    let mut current = 0u32;
    for (byte_idx, ch) in text.char_indices() {
        if current >= utf16_offset {
            return byte_idx;
        }
        current += ch.len_utf16() as u32;
    }
    text.len()
}

/// The first `utf16_count` UTF-16 code units of `text` (clamped to the whole string).
pub fn utf16_prefix(text: &str, utf16_count: u32) -> &str {
    &text[..utf16_to_byte_offset(text, utf16_count)]
}

/// Slice `text` between two UTF-16 offsets.
///
/// Returns `None` when `start > end` or when `end` lies past the end of the text.
pub fn utf16_slice(text: &str, start: u32, end: u32) -> Option<&str> {
    if start > end || end > utf16_len(text) {
        return None;
    }
    let a = utf16_to_byte_offset(text, start);
    let b = utf16_to_byte_offset(text, end);
    text.get(a..b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_len() {
        assert_eq!(utf16_len("hello"), 5);
        assert_eq!(utf16_len("你好"), 2);
        assert_eq!(utf16_len("👋"), 2);
    }

    #[test]
    fn test_utf16_slice_ascii_and_astral() {
        assert_eq!(utf16_slice("xxabyy", 2, 4), Some("ab"));
        // "a👋b": a=0..1, 👋=1..3, b=3..4
        assert_eq!(utf16_slice("a👋b", 1, 3), Some("👋"));
        assert_eq!(utf16_slice("a👋b", 3, 4), Some("b"));
        assert_eq!(utf16_slice("ab", 1, 5), None);
        assert_eq!(utf16_slice("ab", 2, 1), None);
    }

    #[test]
    fn test_utf16_prefix_clamps() {
        assert_eq!(utf16_prefix("disp", 2), "di");
        assert_eq!(utf16_prefix("disp", 10), "disp");
        assert_eq!(utf16_prefix("", 3), "");
    }
}
