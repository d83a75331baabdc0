//! Published document index snapshots.
//!
//! Sub-editors may be added or removed while protocol requests are in flight. The host publishes
//! each rebuilt [`DocumentIndex`] here; request pipelines load a snapshot before issuing a request
//! and load the then-current one again after the reply arrives, so ownership can be re-validated
//! against whatever is authoritative at that point.

use crate::document_index::DocumentIndex;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Lock-free holder of the authoritative [`DocumentIndex`].
#[derive(Debug)]
pub struct SharedDocumentIndex {
    current: ArcSwap<DocumentIndex>,
}

impl SharedDocumentIndex {
    /// Create a holder publishing `index`.
    pub fn new(index: DocumentIndex) -> Self {
        Self {
            current: ArcSwap::from_pointee(index),
        }
    }

    /// The authoritative snapshot at call time.
    pub fn load(&self) -> Arc<DocumentIndex> {
        self.current.load_full()
    }

    /// Replace the authoritative snapshot.
    pub fn publish(&self, index: DocumentIndex) {
        tracing::debug!(generation = index.generation(), "publishing document index");
        self.current.store(Arc::new(index));
    }
}

impl Default for SharedDocumentIndex {
    fn default() -> Self {
        Self::new(DocumentIndex::default())
    }
}
