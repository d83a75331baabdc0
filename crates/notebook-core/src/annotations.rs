//! Rendered diagnostic annotations (inline markers).
//!
//! An annotation is owned by exactly one sub-editor and keyed by the [`GroupHash`] of the
//! diagnostic group it renders. The host's renderer implements [`AnnotationSink`]; this module
//! only tracks which annotations are alive so that a new publish cycle can keep unchanged
//! markers in place and destroy the ones that disappeared.

use crate::diagnostics::DiagnosticSeverity;
use crate::document_index::EditorId;
use crate::document_index::VirtualDocumentId;
use crate::position::EditorRange;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Stable identity of a diagnostic group (deterministic serialization, not a digest).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupHash(Arc<str>);

impl GroupHash {
    /// Wrap a serialized group identity.
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// The serialized identity.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle returned by the renderer for a created annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnnotationHandle(pub u64);

/// Everything a renderer needs to draw one annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSpec {
    /// Owning sub-editor.
    pub editor: EditorId,
    /// Marked range in the sub-editor.
    pub range: EditorRange,
    /// Hover text (one line per diagnostic).
    pub tooltip: String,
    /// Severity used for styling.
    pub severity: DiagnosticSeverity,
}

impl AnnotationSpec {
    /// Style class for the marker, keyed by severity.
    pub fn class_name(&self) -> String {
        format!("lsp-diagnostic lsp-diagnostic-{}", self.severity.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors a renderer may report when asked to place an annotation.
pub enum AnnotationError {
    #[error("editor {0} is not attached")]
    /// The sub-editor is gone or not rendered.
    EditorDetached(EditorId),

    #[error("annotation rejected: {0}")]
    /// The renderer refused the range or options.
    Rejected(String),
}

/// The visual collaborator that draws annotations.
pub trait AnnotationSink {
    /// Draw an annotation.
    fn create(&mut self, spec: &AnnotationSpec) -> Result<AnnotationHandle, AnnotationError>;

    /// Remove a previously drawn annotation.
    fn destroy(&mut self, handle: AnnotationHandle);

    /// Called after every completed reconciliation cycle of `document`.
    fn refresh(&mut self, document: VirtualDocumentId);
}

#[derive(Debug, Clone, Copy)]
struct RetainedAnnotation {
    editor: EditorId,
    handle: AnnotationHandle,
}

/// Annotations currently alive for one virtual document, keyed by group hash.
#[derive(Debug, Default)]
pub struct AnnotationSet {
    retained: HashMap<GroupHash, RetainedAnnotation>,
}

impl AnnotationSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if an annotation for `hash` is alive.
    pub fn contains(&self, hash: &GroupHash) -> bool {
        self.retained.contains_key(hash)
    }

    /// Record a freshly created annotation.
    pub fn insert(&mut self, hash: GroupHash, editor: EditorId, handle: AnnotationHandle) {
        self.retained
            .insert(hash, RetainedAnnotation { editor, handle });
    }

    /// Number of live annotations.
    pub fn len(&self) -> usize {
        self.retained.len()
    }

    /// Returns `true` if no annotation is alive.
    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    /// Destroy every annotation whose hash is not in `seen`. Returns how many were destroyed.
    pub fn retain_seen(&mut self, seen: &HashSet<GroupHash>, sink: &mut dyn AnnotationSink) -> usize {
        self.destroy_where(sink, |hash, _| !seen.contains(hash))
    }

    /// Destroy every annotation owned by `editor`.
    pub fn remove_editor(&mut self, editor: EditorId, sink: &mut dyn AnnotationSink) -> usize {
        self.destroy_where(sink, |_, owner| owner == editor)
    }

    /// Destroy everything.
    pub fn clear(&mut self, sink: &mut dyn AnnotationSink) -> usize {
        self.destroy_where(sink, |_, _| true)
    }

    fn destroy_where(
        &mut self,
        sink: &mut dyn AnnotationSink,
        mut doomed: impl FnMut(&GroupHash, EditorId) -> bool,
    ) -> usize {
        let mut destroyed = 0;
        self.retained.retain(|hash, annotation| {
            if doomed(hash, annotation.editor) {
                sink.destroy(annotation.handle);
                destroyed += 1;
                false
            } else {
                true
            }
        });
        destroyed
    }
}
