//! Position spaces.
//!
//! A notebook-like document has three coordinate spaces that share the same `{ line, character }`
//! shape but must never be mixed up:
//!
//! - [`EditorPosition`]: local to one sub-editor (one cell).
//! - [`RootPosition`]: within the full physical document, i.e. all sub-editors stacked in order.
//! - [`VirtualPosition`]: within one synthetic (virtual) document sent to a language server.
//!
//! Lines are 0-based. `character` is measured in UTF-16 code units in every space, matching the
//! Language Server Protocol, so converting between spaces only ever shifts lines.
//!
//! Conversions live on [`DocumentIndex`](crate::DocumentIndex).

use serde::Serialize;
use std::fmt;

/// A position local to one sub-editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct EditorPosition {
    /// Line number within the sub-editor (0-based).
    pub line: u32,
    /// Character offset within the line (UTF-16 code units).
    pub character: u32,
}

impl EditorPosition {
    /// Create a new editor-local position.
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A position within the whole physical document (all sub-editors in order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RootPosition {
    /// Line number within the physical document (0-based).
    pub line: u32,
    /// Character offset within the line (UTF-16 code units).
    pub character: u32,
}

impl RootPosition {
    /// Create a new root position.
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A position within a virtual (synthetic) document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VirtualPosition {
    /// Line number within the virtual document (0-based).
    pub line: u32,
    /// Character offset within the line (UTF-16 code units).
    pub character: u32,
}

impl VirtualPosition {
    /// Create a new virtual position.
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for EditorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "editor {}:{}", self.line, self.character)
    }
}

impl fmt::Display for RootPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root {}:{}", self.line, self.character)
    }
}

impl fmt::Display for VirtualPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "virtual {}:{}", self.line, self.character)
    }
}

/// A half-open range in sub-editor coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EditorRange {
    /// Range start (inclusive).
    pub start: EditorPosition,
    /// Range end (exclusive).
    pub end: EditorPosition,
}

impl EditorRange {
    /// Create a new editor range.
    pub fn new(start: EditorPosition, end: EditorPosition) -> Self {
        Self { start, end }
    }
}

/// A half-open range in virtual-document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtualRange {
    /// Range start (inclusive).
    pub start: VirtualPosition,
    /// Range end (exclusive).
    pub end: VirtualPosition,
}

impl VirtualRange {
    /// Create a new virtual range.
    pub fn new(start: VirtualPosition, end: VirtualPosition) -> Self {
        Self { start, end }
    }
}
