//! LSP positions and ranges.
//!
//! Everything a language server sends is expressed in the coordinates of the virtual document it
//! was given, so these types convert into [`VirtualPosition`] / [`VirtualRange`] and never
//! directly into editor space.

use notebook_core::{VirtualPosition, VirtualRange};
use serde_json::{Value, json};

/// LSP Position (based on UTF-16 code units)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LspPosition {
    /// Line number (0-based)
    pub line: u32,
    /// Character offset (UTF-16 code units, 0-based)
    pub character: u32,
}

impl LspPosition {
    /// Create a new LSP position (UTF-16 based).
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Parse `{ "line": .., "character": .. }`.
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            line: value.get("line")?.as_u64()? as u32,
            character: value.get("character")?.as_u64()? as u32,
        })
    }

    /// Encode as an LSP `Position` object.
    pub fn to_value(self) -> Value {
        json!({ "line": self.line, "character": self.character })
    }
}

impl From<LspPosition> for VirtualPosition {
    fn from(position: LspPosition) -> Self {
        VirtualPosition::new(position.line, position.character)
    }
}

impl From<VirtualPosition> for LspPosition {
    fn from(position: VirtualPosition) -> Self {
        LspPosition::new(position.line, position.character)
    }
}

/// LSP Range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LspRange {
    /// Range start position (inclusive).
    pub start: LspPosition,
    /// Range end position (exclusive).
    pub end: LspPosition,
}

impl LspRange {
    /// Create a new LSP range.
    pub fn new(start: LspPosition, end: LspPosition) -> Self {
        Self { start, end }
    }

    /// Parse `{ "start": Position, "end": Position }`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let start = LspPosition::from_value(value.get("start")?)?;
        let end = LspPosition::from_value(value.get("end")?)?;
        Some(Self { start, end })
    }
}

impl From<LspRange> for VirtualRange {
    fn from(range: LspRange) -> Self {
        VirtualRange::new(range.start.into(), range.end.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        let value = json!({
            "start": { "line": 3, "character": 1 },
            "end": { "line": 3, "character": 7 }
        });
        let range = LspRange::from_value(&value).unwrap();
        assert_eq!(range.start, LspPosition::new(3, 1));
        assert_eq!(
            VirtualRange::from(range).end,
            VirtualPosition::new(3, 7)
        );
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        assert!(LspPosition::from_value(&json!({ "line": 1 })).is_none());
        assert!(LspRange::from_value(&json!({ "start": { "line": 0, "character": 0 } })).is_none());
    }
}
