#![warn(missing_docs)]
//! Notebook Core - headless model of documents split across several sub-editors
//!
//! # Overview
//!
//! `notebook-core` models a physical document made of independently addressable sub-editors
//! (notebook cells) that are concatenated into one or more *virtual documents* for language
//! servers. It does not render anything and does not talk to servers; it provides:
//!
//! - the three position spaces ([`EditorPosition`], [`RootPosition`], [`VirtualPosition`])
//! - the [`DocumentIndex`] translating between them
//! - [`SharedDocumentIndex`] for publishing index snapshots to in-flight requests
//! - the diagnostics data model and [`DiagnosticsDatabase`]
//! - annotation tracking ([`AnnotationSet`]) behind the renderer-facing [`AnnotationSink`]
//! - [`DiagnosticsContext`], the per-physical-document owner of all mutable diagnostics state
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  DiagnosticsContext (database + annotations)│  ← Mutable per-document state
//! ├─────────────────────────────────────────────┤
//! │  SharedDocumentIndex (published snapshots)  │  ← Concurrency boundary
//! ├─────────────────────────────────────────────┤
//! │  DocumentIndex (editor ↔ root ↔ virtual)    │  ← Coordinate translation
//! ├─────────────────────────────────────────────┤
//! │  LineIndex (Rope-based, per sub-editor)     │  ← Line access
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use notebook_core::{DocumentIndex, EditorId, EditorPosition, VirtualDocumentId, VirtualPosition};
//!
//! let cell_a = EditorId::new(1);
//! let cell_b = EditorId::new(2);
//! let doc = VirtualDocumentId::new(0);
//!
//! let mut builder = DocumentIndex::builder();
//! builder.add_editor(cell_a, "import os\n").unwrap();
//! builder.add_editor(cell_b, "os.path").unwrap();
//! builder.add_document(doc, "file:///notebook.ipynb.py").unwrap();
//! builder.map_editor_lines(doc, cell_a, 0..2).unwrap();
//! builder.append_blank_lines(doc, 1).unwrap();
//! builder.map_editor_lines(doc, cell_b, 0..1).unwrap();
//! let index = builder.build();
//!
//! let root = index.to_root(cell_b, EditorPosition::new(0, 3)).unwrap();
//! assert_eq!(index.root_to_virtual(root).unwrap(), VirtualPosition::new(3, 3));
//! assert_eq!(index.owner_of(root).unwrap(), cell_b);
//! ```
//!
//! # Units
//!
//! Characters are counted in UTF-16 code units in every space (see [`text`]).

pub mod annotations;
pub mod context;
pub mod diagnostics;
pub mod document_index;
mod error;
pub mod line_index;
pub mod position;
pub mod shared;
pub mod text;

pub use annotations::{
    AnnotationError, AnnotationHandle, AnnotationSet, AnnotationSink, AnnotationSpec, GroupHash,
};
pub use context::DiagnosticsContext;
pub use diagnostics::{Diagnostic, DiagnosticSeverity, DiagnosticsDatabase, EditorDiagnostic};
pub use document_index::{
    DocumentIndex, DocumentIndexBuilder, EditorId, LineOrigin, VirtualDocumentId,
    VirtualDocumentRef,
};
pub use error::{IndexError, TranslateError};
pub use line_index::LineIndex;
pub use position::{EditorPosition, EditorRange, RootPosition, VirtualPosition, VirtualRange};
pub use shared::SharedDocumentIndex;
