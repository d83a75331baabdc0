//! Per-physical-document diagnostics state.
//!
//! One [`DiagnosticsContext`] exists per physical document. It owns the diagnostics database and
//! the annotation retention sets of every virtual document of that physical document, and it is
//! the only place they are mutated. Creation happens on first use; [`DiagnosticsContext::close`]
//! tears everything down when the document closes.

use crate::annotations::{AnnotationSet, AnnotationSink};
use crate::diagnostics::DiagnosticsDatabase;
use crate::document_index::{EditorId, VirtualDocumentId};
use std::collections::BTreeMap;

/// Diagnostics database and live annotations of one physical document.
#[derive(Debug, Default)]
pub struct DiagnosticsContext {
    database: DiagnosticsDatabase,
    annotations: BTreeMap<VirtualDocumentId, AnnotationSet>,
}

impl DiagnosticsContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent diagnostics.
    pub fn database(&self) -> &DiagnosticsDatabase {
        &self.database
    }

    /// Live annotations of a virtual document, if any cycle created some.
    pub fn annotations(&self, document: VirtualDocumentId) -> Option<&AnnotationSet> {
        self.annotations.get(&document)
    }

    /// Total number of live annotations across virtual documents.
    pub fn annotation_count(&self) -> usize {
        self.annotations.values().map(AnnotationSet::len).sum()
    }

    /// Mutable access to the database and the retention set of `document` (created on demand).
    pub fn document_state_mut(
        &mut self,
        document: VirtualDocumentId,
    ) -> (&mut DiagnosticsDatabase, &mut AnnotationSet) {
        let annotations = self.annotations.entry(document).or_default();
        (&mut self.database, annotations)
    }

    /// Tear down everything a removed sub-editor owned.
    pub fn remove_editor(&mut self, editor: EditorId, sink: &mut dyn AnnotationSink) -> usize {
        self.database.remove_editor(editor);
        let destroyed = self
            .annotations
            .values_mut()
            .map(|set| set.remove_editor(editor, sink))
            .sum();
        tracing::debug!(%editor, destroyed, "removed annotations of torn-down editor");
        destroyed
    }

    /// Drop all state of one virtual document.
    pub fn forget_document(&mut self, document: VirtualDocumentId, sink: &mut dyn AnnotationSink) {
        self.database.remove(document);
        if let Some(mut set) = self.annotations.remove(&document) {
            set.clear(sink);
        }
    }

    /// Destroy every annotation and clear the database.
    pub fn close(&mut self, sink: &mut dyn AnnotationSink) {
        for set in self.annotations.values_mut() {
            set.clear(sink);
        }
        self.annotations.clear();
        self.database.clear();
    }
}
