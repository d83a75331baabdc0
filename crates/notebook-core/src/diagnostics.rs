//! Diagnostics data model.
//!
//! Diagnostics arrive in virtual-document coordinates. After reconciliation each one is stored
//! together with the sub-editor that owns it and its editor-local range, so panels and hover
//! tooltips can work in cell space.

use crate::document_index::{EditorId, VirtualDocumentId};
use crate::position::{EditorRange, VirtualRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Diagnostic severity levels, ordered from most to least severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DiagnosticSeverity {
    /// Error diagnostics.
    Error = 1,
    /// Warning diagnostics.
    Warning = 2,
    /// Informational diagnostics.
    Information = 3,
    /// Hint diagnostics.
    Hint = 4,
}

impl DiagnosticSeverity {
    /// Convert the numeric LSP `DiagnosticSeverity` into an enum.
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Error),
            2 => Some(Self::Warning),
            3 => Some(Self::Information),
            4 => Some(Self::Hint),
            _ => None,
        }
    }

    /// Protocol ordinal (lower is more severe).
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Display name, also used in style classes.
    pub fn name(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Information => "Information",
            Self::Hint => "Hint",
        }
    }

    /// The most severe (lowest ordinal) of the given severities.
    pub fn most_severe(severities: impl IntoIterator<Item = Self>) -> Option<Self> {
        severities.into_iter().min_by_key(|s| s.ordinal())
    }
}

/// A single diagnostic as reported for a virtual document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Diagnostic range in virtual-document coordinates.
    pub range: VirtualRange,
    /// Optional diagnostic severity.
    pub severity: Option<DiagnosticSeverity>,
    /// Optional diagnostic code (stringified).
    pub code: Option<String>,
    /// Optional diagnostic source (e.g. `"pylsp"`).
    pub source: Option<String>,
    /// Diagnostic message.
    pub message: String,
    /// Optional related information payload, encoded as JSON text.
    pub related_information_json: Option<String>,
    /// Optional extra data payload, encoded as JSON text.
    pub data_json: Option<String>,
}

/// A diagnostic placed in the sub-editor that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorDiagnostic {
    /// The diagnostic as reported.
    pub diagnostic: Diagnostic,
    /// Owning sub-editor.
    pub editor: EditorId,
    /// Range in the owning sub-editor's coordinates.
    pub range: EditorRange,
}

/// Most recent diagnostics per virtual document of one physical document.
///
/// Entries are replaced wholesale on every successful publish cycle.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsDatabase {
    entries: BTreeMap<VirtualDocumentId, Vec<EditorDiagnostic>>,
}

impl DiagnosticsDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry of a virtual document.
    pub fn replace(&mut self, document: VirtualDocumentId, diagnostics: Vec<EditorDiagnostic>) {
        self.entries.insert(document, diagnostics);
    }

    /// Diagnostics of a virtual document (empty if none were published).
    pub fn get(&self, document: VirtualDocumentId) -> &[EditorDiagnostic] {
        self.entries
            .get(&document)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns `true` if an entry was ever stored for the document.
    pub fn contains(&self, document: VirtualDocumentId) -> bool {
        self.entries.contains_key(&document)
    }

    /// Remove the entry of a virtual document.
    pub fn remove(&mut self, document: VirtualDocumentId) -> Option<Vec<EditorDiagnostic>> {
        self.entries.remove(&document)
    }

    /// Drop every diagnostic owned by `editor`.
    pub fn remove_editor(&mut self, editor: EditorId) {
        for diagnostics in self.entries.values_mut() {
            diagnostics.retain(|d| d.editor != editor);
        }
    }

    /// Iterate `(virtual document, diagnostics)` pairs in document order.
    pub fn all(&self) -> impl Iterator<Item = (VirtualDocumentId, &[EditorDiagnostic])> {
        self.entries.iter().map(|(id, d)| (*id, d.as_slice()))
    }

    /// Total number of stored diagnostics.
    pub fn total_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_severe_uses_lowest_ordinal() {
        use DiagnosticSeverity::*;
        assert_eq!(DiagnosticSeverity::most_severe([Hint, Error, Warning]), Some(Error));
        assert_eq!(DiagnosticSeverity::most_severe([Hint, Information]), Some(Information));
        assert_eq!(DiagnosticSeverity::most_severe([]), None);
    }

    #[test]
    fn test_from_u64() {
        assert_eq!(DiagnosticSeverity::from_u64(2), Some(DiagnosticSeverity::Warning));
        assert_eq!(DiagnosticSeverity::from_u64(0), None);
        assert_eq!(DiagnosticSeverity::Warning.ordinal(), 2);
    }
}
