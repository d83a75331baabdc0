use crate::document_index::{EditorId, VirtualDocumentId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced when converting positions between coordinate spaces.
pub enum TranslateError {
    #[error("line {line} is beyond the last line ({last})")]
    /// The position lies past the current document bounds (boundary error).
    OutOfBounds {
        /// Requested line.
        line: u32,
        /// Last addressable line at the time of the call.
        last: u32,
    },

    #[error("line {line} of {space} space has no counterpart")]
    /// The position is inside the document but does not map to the target space
    /// (e.g. a blank separator line of a virtual document).
    Unmapped {
        /// Name of the source coordinate space.
        space: &'static str,
        /// Requested line.
        line: u32,
    },

    #[error("unknown editor {0}")]
    /// The sub-editor is not part of the index.
    UnknownEditor(EditorId),

    #[error("unknown virtual document {0}")]
    /// The virtual document is not part of the index.
    UnknownDocument(VirtualDocumentId),

    #[error("range end {line}:{character} cannot be mapped to the start's editor")]
    /// A range end could not be mapped into the same sub-editor as its start.
    MalformedRange {
        /// Virtual line of the end position.
        line: u32,
        /// Character of the end position.
        character: u32,
    },
}

impl TranslateError {
    /// Returns `true` for boundary errors (position outside current document bounds).
    pub fn is_boundary(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced while building a [`DocumentIndex`](crate::DocumentIndex).
pub enum IndexError {
    #[error("editor {0} was already added")]
    /// The same sub-editor was added twice.
    DuplicateEditor(EditorId),

    #[error("virtual document {0} was already added")]
    /// The same virtual document was added twice.
    DuplicateDocument(VirtualDocumentId),

    #[error("unknown editor {0}")]
    /// A mapping referenced an editor that was never added.
    UnknownEditor(EditorId),

    #[error("unknown virtual document {0}")]
    /// A mapping referenced a virtual document that was never added.
    UnknownDocument(VirtualDocumentId),

    #[error("editor {editor} has no lines {start}..{end}")]
    /// A mapping referenced editor lines that do not exist.
    LinesOutOfRange {
        /// Target editor.
        editor: EditorId,
        /// Requested start line (inclusive).
        start: u32,
        /// Requested end line (exclusive).
        end: u32,
    },

    #[error("virtual document {document} would map root line {root_line} out of order")]
    /// Virtual-to-root mapping must be monotonic in line number.
    NonMonotonic {
        /// Virtual document being extended.
        document: VirtualDocumentId,
        /// Offending root line.
        root_line: u32,
    },

    #[error("root line {root_line} is already owned by virtual document {owner}")]
    /// A root line can be owned by at most one virtual document.
    AlreadyOwned {
        /// Offending root line.
        root_line: u32,
        /// Current owner.
        owner: VirtualDocumentId,
    },

    #[error("virtual document {document} has no line {line}")]
    /// A suppression referenced a virtual line that does not exist.
    NoSuchVirtualLine {
        /// Virtual document.
        document: VirtualDocumentId,
        /// Requested virtual line.
        line: u32,
    },
}
