//! Document index: the coordinate translator between editor, root and virtual spaces.
//!
//! A physical document is a sequence of sub-editors (cells). Stacking their lines in order gives
//! the *root* space. One or more *virtual documents* are assembled from those lines (plus blank
//! separator lines) and sent to language servers. The [`DocumentIndex`] records which root line
//! each virtual line came from and which virtual document owns each root line, so that protocol
//! responses can be mapped back to the sub-editor they concern.
//!
//! An index is an immutable snapshot. Hosts build a new one with [`DocumentIndexBuilder`] after
//! every structural change and publish it through [`SharedDocumentIndex`](crate::SharedDocumentIndex).
//!
//! Invariants enforced by the builder:
//! - root line ranges of sub-editors are contiguous and in insertion order
//! - within a virtual document, mapped root lines strictly increase with the virtual line
//! - a root line is owned by at most one virtual document

use crate::error::{IndexError, TranslateError};
use crate::line_index::LineIndex;
use crate::position::{EditorPosition, RootPosition, VirtualPosition};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Range;

/// Opaque identifier of a sub-editor (e.g. a notebook cell editor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct EditorId(u64);

impl EditorId {
    /// Create an editor id from a host-provided number.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque identifier of a virtual document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualDocumentId(u64);

impl VirtualDocumentId {
    /// Create a virtual document id from a host-provided number.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VirtualDocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vdoc#{}", self.0)
    }
}

/// Where a virtual line comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOrigin {
    /// A synthetic separator line with no physical counterpart.
    Blank,
    /// A line of sub-editor text owned by this virtual document.
    Editor {
        /// Source sub-editor.
        editor: EditorId,
        /// Line within the sub-editor.
        editor_line: u32,
        /// Line within the physical document.
        root_line: u32,
    },
    /// A stand-in for a line owned by another virtual document. Coordinates map, but the text is
    /// blank and diagnostics on it are never shown for this document.
    Placeholder {
        /// Source sub-editor.
        editor: EditorId,
        /// Line within the sub-editor.
        editor_line: u32,
        /// Line within the physical document.
        root_line: u32,
    },
}

impl LineOrigin {
    fn editor_line(&self) -> Option<(EditorId, u32, u32)> {
        match *self {
            Self::Blank => None,
            Self::Editor {
                editor,
                editor_line,
                root_line,
            }
            | Self::Placeholder {
                editor,
                editor_line,
                root_line,
            } => Some((editor, editor_line, root_line)),
        }
    }
}

#[derive(Debug, Clone)]
struct VirtualLine {
    origin: LineOrigin,
    skip_inspect: Vec<VirtualDocumentId>,
}

#[derive(Debug, Clone)]
struct VirtualDocument {
    uri: String,
    lines: Vec<VirtualLine>,
    last_root_line: Option<u32>,
}

#[derive(Debug, Clone)]
struct EditorEntry {
    id: EditorId,
    root_start_line: u32,
    lines: LineIndex,
}

impl EditorEntry {
    fn root_end_line(&self) -> u32 {
        self.root_start_line + self.lines.line_count()
    }
}

/// Immutable snapshot mapping root/virtual line ranges to sub-editors.
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    generation: u64,
    editors: Vec<EditorEntry>,
    editor_slots: HashMap<EditorId, usize>,
    documents: BTreeMap<VirtualDocumentId, VirtualDocument>,
    owners: HashMap<u32, (VirtualDocumentId, u32)>,
}

impl DocumentIndex {
    /// Start building a new index.
    pub fn builder() -> DocumentIndexBuilder {
        DocumentIndexBuilder::default()
    }

    /// Snapshot generation (host-assigned, increases with every rebuild).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Sub-editor ids in physical order.
    pub fn editors(&self) -> impl Iterator<Item = EditorId> + '_ {
        self.editors.iter().map(|e| e.id)
    }

    /// Virtual document ids in id order.
    pub fn documents(&self) -> impl Iterator<Item = VirtualDocumentId> + '_ {
        self.documents.keys().copied()
    }

    /// Returns `true` if the sub-editor is part of this snapshot.
    pub fn contains_editor(&self, editor: EditorId) -> bool {
        self.editor_slots.contains_key(&editor)
    }

    /// Number of lines in the physical document.
    pub fn root_line_count(&self) -> u32 {
        self.editors.last().map(EditorEntry::root_end_line).unwrap_or(0)
    }

    /// Text of a sub-editor line (without terminator).
    pub fn line_text(&self, editor: EditorId, line: u32) -> Option<String> {
        self.editor(editor).ok()?.lines.get_line_text(line)
    }

    /// Convert an editor-local position to the root space.
    pub fn to_root(
        &self,
        editor: EditorId,
        position: EditorPosition,
    ) -> Result<RootPosition, TranslateError> {
        let entry = self.editor(editor)?;
        let count = entry.lines.line_count();
        if position.line >= count {
            return Err(TranslateError::OutOfBounds {
                line: position.line,
                last: count.saturating_sub(1),
            });
        }
        Ok(RootPosition::new(
            entry.root_start_line + position.line,
            position.character,
        ))
    }

    /// The sub-editor that owns a root position.
    pub fn owner_of(&self, position: RootPosition) -> Result<EditorId, TranslateError> {
        self.root_to_editor(position).map(|(editor, _)| editor)
    }

    /// Convert a root position into the owning sub-editor and its local position.
    pub fn root_to_editor(
        &self,
        position: RootPosition,
    ) -> Result<(EditorId, EditorPosition), TranslateError> {
        let entry = self.editor_at_root_line(position.line)?;
        Ok((
            entry.id,
            EditorPosition::new(position.line - entry.root_start_line, position.character),
        ))
    }

    /// The virtual document that owns a root position.
    pub fn document_at_root_position(
        &self,
        position: RootPosition,
    ) -> Result<VirtualDocumentId, TranslateError> {
        self.owner_entry(position).map(|(document, _)| document)
    }

    /// Convert a root position into the owning virtual document's space.
    pub fn root_to_virtual(&self, position: RootPosition) -> Result<VirtualPosition, TranslateError> {
        self.owner_entry(position)
            .map(|(_, line)| VirtualPosition::new(line, position.character))
    }

    /// Convert a position of `document` back into the root space.
    pub fn virtual_to_root(
        &self,
        document: VirtualDocumentId,
        position: VirtualPosition,
    ) -> Result<RootPosition, TranslateError> {
        let line = self.document(document)?.virtual_line(position.line)?;
        match line.origin.editor_line() {
            Some((_, _, root_line)) => Ok(RootPosition::new(root_line, position.character)),
            None => Err(TranslateError::Unmapped {
                space: "virtual",
                line: position.line,
            }),
        }
    }

    /// Borrow a virtual document for per-document queries.
    pub fn document(
        &self,
        document: VirtualDocumentId,
    ) -> Result<VirtualDocumentRef<'_>, TranslateError> {
        let doc = self
            .documents
            .get(&document)
            .ok_or(TranslateError::UnknownDocument(document))?;
        Ok(VirtualDocumentRef {
            index: self,
            id: document,
            doc,
        })
    }

    fn editor(&self, editor: EditorId) -> Result<&EditorEntry, TranslateError> {
        self.editor_slots
            .get(&editor)
            .map(|&slot| &self.editors[slot])
            .ok_or(TranslateError::UnknownEditor(editor))
    }

    fn editor_at_root_line(&self, root_line: u32) -> Result<&EditorEntry, TranslateError> {
        let count = self.root_line_count();
        if root_line >= count {
            return Err(TranslateError::OutOfBounds {
                line: root_line,
                last: count.saturating_sub(1),
            });
        }
        let slot = self
            .editors
            .partition_point(|entry| entry.root_end_line() <= root_line);
        Ok(&self.editors[slot])
    }

    fn owner_entry(
        &self,
        position: RootPosition,
    ) -> Result<(VirtualDocumentId, u32), TranslateError> {
        self.editor_at_root_line(position.line)?;
        self.owners
            .get(&position.line)
            .copied()
            .ok_or(TranslateError::Unmapped {
                space: "root",
                line: position.line,
            })
    }
}

/// Read-only view of one virtual document inside a [`DocumentIndex`].
#[derive(Debug, Clone, Copy)]
pub struct VirtualDocumentRef<'a> {
    index: &'a DocumentIndex,
    id: VirtualDocumentId,
    doc: &'a VirtualDocument,
}

impl<'a> VirtualDocumentRef<'a> {
    /// Virtual document id.
    pub fn id(&self) -> VirtualDocumentId {
        self.id
    }

    /// Document URI as sent to the language server.
    pub fn uri(&self) -> &'a str {
        &self.doc.uri
    }

    /// Number of virtual lines.
    pub fn line_count(&self) -> u32 {
        self.doc.lines.len() as u32
    }

    /// Returns `true` if the document has no lines at all.
    pub fn is_empty(&self) -> bool {
        self.doc.lines.is_empty()
    }

    /// Index of the last virtual line (`0` for an empty document).
    pub fn last_virtual_line(&self) -> u32 {
        self.line_count().saturating_sub(1)
    }

    /// Text of the last virtual line.
    pub fn last_line(&self) -> String {
        self.line_text(self.last_virtual_line()).unwrap_or_default()
    }

    /// Text of a virtual line. Blank and placeholder lines are empty.
    pub fn line_text(&self, line: u32) -> Option<String> {
        let vline = self.doc.lines.get(line as usize)?;
        match vline.origin {
            LineOrigin::Editor {
                editor,
                editor_line,
                ..
            } => self.index.line_text(editor, editor_line),
            LineOrigin::Blank | LineOrigin::Placeholder { .. } => Some(String::new()),
        }
    }

    /// Origin of a virtual line.
    pub fn origin(&self, line: u32) -> Result<LineOrigin, TranslateError> {
        self.virtual_line(line).map(|l| l.origin)
    }

    /// Map a virtual line to its sub-editor line.
    pub fn virtual_line_to_editor_line(
        &self,
        line: u32,
    ) -> Result<(EditorId, u32), TranslateError> {
        match self.virtual_line(line)?.origin.editor_line() {
            Some((editor, editor_line, _)) => Ok((editor, editor_line)),
            None => Err(TranslateError::Unmapped {
                space: "virtual",
                line,
            }),
        }
    }

    /// The sub-editor a virtual line belongs to.
    pub fn editor_at_virtual_line(&self, line: u32) -> Result<EditorId, TranslateError> {
        self.virtual_line_to_editor_line(line).map(|(editor, _)| editor)
    }

    /// Convert a virtual position into the owning sub-editor's local space.
    pub fn transform_virtual_to_editor(
        &self,
        position: VirtualPosition,
    ) -> Result<(EditorId, EditorPosition), TranslateError> {
        let (editor, editor_line) = self.virtual_line_to_editor_line(position.line)?;
        Ok((editor, EditorPosition::new(editor_line, position.character)))
    }

    /// Returns `true` if diagnostics on `line` are suppressed for `document`.
    pub fn is_suppressed(&self, line: u32, document: VirtualDocumentId) -> bool {
        self.doc
            .lines
            .get(line as usize)
            .is_some_and(|l| l.skip_inspect.contains(&document))
    }

    fn virtual_line(&self, line: u32) -> Result<&'a VirtualLine, TranslateError> {
        self.doc
            .lines
            .get(line as usize)
            .ok_or(TranslateError::OutOfBounds {
                line,
                last: self.last_virtual_line(),
            })
    }
}

/// Builder for [`DocumentIndex`] snapshots.
#[derive(Debug, Default)]
pub struct DocumentIndexBuilder {
    index: DocumentIndex,
}

impl DocumentIndexBuilder {
    /// Set the snapshot generation.
    pub fn generation(mut self, generation: u64) -> Self {
        self.index.generation = generation;
        self
    }

    /// Append a sub-editor after all previously added ones.
    pub fn add_editor(&mut self, id: EditorId, text: &str) -> Result<(), IndexError> {
        if self.index.editor_slots.contains_key(&id) {
            return Err(IndexError::DuplicateEditor(id));
        }
        let root_start_line = self.index.root_line_count();
        self.index
            .editor_slots
            .insert(id, self.index.editors.len());
        self.index.editors.push(EditorEntry {
            id,
            root_start_line,
            lines: LineIndex::from_text(text),
        });
        Ok(())
    }

    /// Register an (initially empty) virtual document.
    pub fn add_document(
        &mut self,
        id: VirtualDocumentId,
        uri: impl Into<String>,
    ) -> Result<(), IndexError> {
        if self.index.documents.contains_key(&id) {
            return Err(IndexError::DuplicateDocument(id));
        }
        self.index.documents.insert(
            id,
            VirtualDocument {
                uri: uri.into(),
                lines: Vec::new(),
                last_root_line: None,
            },
        );
        Ok(())
    }

    /// Append editor lines owned by `document`.
    pub fn map_editor_lines(
        &mut self,
        document: VirtualDocumentId,
        editor: EditorId,
        lines: Range<u32>,
    ) -> Result<(), IndexError> {
        self.map_lines(document, editor, lines, true)
    }

    /// Append placeholder lines for editor content owned by another virtual document.
    pub fn map_placeholder_lines(
        &mut self,
        document: VirtualDocumentId,
        editor: EditorId,
        lines: Range<u32>,
    ) -> Result<(), IndexError> {
        self.map_lines(document, editor, lines, false)
    }

    /// Append blank separator lines.
    pub fn append_blank_lines(
        &mut self,
        document: VirtualDocumentId,
        count: u32,
    ) -> Result<(), IndexError> {
        let doc = self
            .index
            .documents
            .get_mut(&document)
            .ok_or(IndexError::UnknownDocument(document))?;
        doc.lines
            .extend((0..count).map(|_| VirtualLine {
                origin: LineOrigin::Blank,
                skip_inspect: Vec::new(),
            }));
        Ok(())
    }

    /// Suppress diagnostics of `document` on one of its virtual lines.
    pub fn suppress_diagnostics(
        &mut self,
        document: VirtualDocumentId,
        line: u32,
    ) -> Result<(), IndexError> {
        let doc = self
            .index
            .documents
            .get_mut(&document)
            .ok_or(IndexError::UnknownDocument(document))?;
        let vline = doc
            .lines
            .get_mut(line as usize)
            .ok_or(IndexError::NoSuchVirtualLine { document, line })?;
        if !vline.skip_inspect.contains(&document) {
            vline.skip_inspect.push(document);
        }
        Ok(())
    }

    /// Finish the snapshot.
    pub fn build(self) -> DocumentIndex {
        self.index
    }

    fn map_lines(
        &mut self,
        document: VirtualDocumentId,
        editor: EditorId,
        lines: Range<u32>,
        owned: bool,
    ) -> Result<(), IndexError> {
        let slot = *self
            .index
            .editor_slots
            .get(&editor)
            .ok_or(IndexError::UnknownEditor(editor))?;
        let entry = &self.index.editors[slot];
        if lines.start > lines.end || lines.end > entry.lines.line_count() {
            return Err(IndexError::LinesOutOfRange {
                editor,
                start: lines.start,
                end: lines.end,
            });
        }
        let root_start = entry.root_start_line;

        let doc = self
            .index
            .documents
            .get(&document)
            .ok_or(IndexError::UnknownDocument(document))?;
        if let Some(last) = doc.last_root_line
            && root_start + lines.start <= last
            && !lines.is_empty()
        {
            return Err(IndexError::NonMonotonic {
                document,
                root_line: root_start + lines.start,
            });
        }
        if owned {
            for editor_line in lines.clone() {
                let root_line = root_start + editor_line;
                if let Some(&(owner, _)) = self.index.owners.get(&root_line) {
                    return Err(IndexError::AlreadyOwned { root_line, owner });
                }
            }
        }

        let doc = self
            .index
            .documents
            .get_mut(&document)
            .ok_or(IndexError::UnknownDocument(document))?;
        for editor_line in lines {
            let root_line = root_start + editor_line;
            let virtual_line = doc.lines.len() as u32;
            let (origin, skip_inspect) = if owned {
                self.index.owners.insert(root_line, (document, virtual_line));
                (
                    LineOrigin::Editor {
                        editor,
                        editor_line,
                        root_line,
                    },
                    Vec::new(),
                )
            } else {
                (
                    LineOrigin::Placeholder {
                        editor,
                        editor_line,
                        root_line,
                    },
                    vec![document],
                )
            };
            doc.lines.push(VirtualLine {
                origin,
                skip_inspect,
            });
            doc.last_root_line = Some(root_line);
        }
        Ok(())
    }
}
