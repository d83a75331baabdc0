//! Per-editor line storage.
//!
//! Each sub-editor's text is held in a Rope so line lookup stays O(log N) for large cells.

use crate::text::utf16_len;
use ropey::Rope;

/// Line index over one sub-editor's text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    rope: Rope,
}

impl LineIndex {
    /// Create an empty line index (one empty line).
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Build a line index from text.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Number of lines (an empty text has one line, a trailing `\n` opens a new line).
    pub fn line_count(&self) -> u32 {
        self.rope.len_lines() as u32
    }

    /// Text of the given line, without its line terminator.
    pub fn get_line_text(&self, line: u32) -> Option<String> {
        let line = line as usize;
        if line >= self.rope.len_lines() {
            return None;
        }

        let mut text = self.rope.line(line).to_string();
        if text.ends_with('\n') {
            text.pop();
            if text.ends_with('\r') {
                text.pop();
            }
        }

        Some(text)
    }

    /// Length of the given line in UTF-16 code units.
    pub fn line_len_utf16(&self, line: u32) -> Option<u32> {
        self.get_line_text(line).map(|text| utf16_len(&text))
    }
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_line_index() {
        let index = LineIndex::new();
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.get_line_text(0).as_deref(), Some(""));
    }

    #[test]
    fn test_from_text() {
        let index = LineIndex::from_text("Line 1\r\nLine 2\nLine 3");

        assert_eq!(index.line_count(), 3);
        assert_eq!(index.get_line_text(0).as_deref(), Some("Line 1"));
        assert_eq!(index.get_line_text(2).as_deref(), Some("Line 3"));
        assert_eq!(index.get_line_text(3), None);
    }

    #[test]
    fn test_line_len_utf16() {
        let index = LineIndex::from_text("a👋b\n你好");
        assert_eq!(index.line_len_utf16(0), Some(4));
        assert_eq!(index.line_len_utf16(1), Some(2));
        assert_eq!(index.line_len_utf16(2), None);
    }
}
