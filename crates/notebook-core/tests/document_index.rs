use notebook_core::{
    DocumentIndex, EditorId, EditorPosition, IndexError, LineOrigin, RootPosition,
    SharedDocumentIndex, TranslateError, VirtualDocumentId, VirtualPosition,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const IMPORTS: EditorId = EditorId::new(1);
const R_CELL: EditorId = EditorId::new(2);
const PRINT: EditorId = EditorId::new(3);
const PYTHON: VirtualDocumentId = VirtualDocumentId::new(0);
const R: VirtualDocumentId = VirtualDocumentId::new(1);

/// A notebook with an R cell embedded through a cell magic.
///
/// ```text
/// root  cell       python vline   r vline
/// 0     IMPORTS    0              -
/// 1     IMPORTS    1              -
///       -          2 (blank)      -
/// 2     R_CELL     3 (placeh.)    -
/// 3     R_CELL     4 (placeh.)    0
/// 4     R_CELL     5 (placeh.)    1
///       -          6 (blank)      -
/// 5     PRINT      7              -
/// ```
fn notebook() -> DocumentIndex {
    let mut builder = DocumentIndex::builder().generation(3);
    builder.add_editor(IMPORTS, "import os\nx = 1").unwrap();
    builder
        .add_editor(R_CELL, "%%R\nlibrary(dplyr)\ny <- 2")
        .unwrap();
    builder.add_editor(PRINT, "print(x)").unwrap();

    builder.add_document(PYTHON, "file:///nb.ipynb.py").unwrap();
    builder.add_document(R, "file:///nb.ipynb.R").unwrap();

    builder.map_editor_lines(PYTHON, IMPORTS, 0..2).unwrap();
    builder.append_blank_lines(PYTHON, 1).unwrap();
    builder.map_placeholder_lines(PYTHON, R_CELL, 0..3).unwrap();
    builder.append_blank_lines(PYTHON, 1).unwrap();
    builder.map_editor_lines(PYTHON, PRINT, 0..1).unwrap();

    builder.map_editor_lines(R, R_CELL, 1..3).unwrap();
    builder.build()
}

#[test]
fn test_editor_positions_reach_the_owning_document() {
    let index = notebook();
    assert_eq!(index.generation(), 3);
    assert_eq!(index.root_line_count(), 6);
    assert_eq!(index.editors().collect::<Vec<_>>(), vec![IMPORTS, R_CELL, PRINT]);
    assert_eq!(index.documents().collect::<Vec<_>>(), vec![PYTHON, R]);

    let root = index.to_root(PRINT, EditorPosition::new(0, 6)).unwrap();
    assert_eq!(root, RootPosition::new(5, 6));
    assert_eq!(index.root_to_virtual(root), Ok(VirtualPosition::new(7, 6)));
    assert_eq!(index.document_at_root_position(root), Ok(PYTHON));

    let root = index.to_root(R_CELL, EditorPosition::new(2, 1)).unwrap();
    assert_eq!(root, RootPosition::new(4, 1));
    assert_eq!(index.owner_of(root), Ok(R_CELL));
    assert_eq!(index.root_to_virtual(root), Ok(VirtualPosition::new(1, 1)));
    assert_eq!(index.document_at_root_position(root), Ok(R));
}

#[test]
fn test_virtual_positions_map_back_to_cells() {
    let index = notebook();
    let python = index.document(PYTHON).unwrap();
    let r = index.document(R).unwrap();

    assert_eq!(
        python.transform_virtual_to_editor(VirtualPosition::new(7, 2)),
        Ok((PRINT, EditorPosition::new(0, 2)))
    );
    assert_eq!(
        r.transform_virtual_to_editor(VirtualPosition::new(0, 3)),
        Ok((R_CELL, EditorPosition::new(1, 3)))
    );
    assert_eq!(
        index.virtual_to_root(R, VirtualPosition::new(1, 4)),
        Ok(RootPosition::new(4, 4))
    );
    assert_eq!(
        index.root_to_editor(RootPosition::new(4, 4)),
        Ok((R_CELL, EditorPosition::new(2, 4)))
    );
}

#[test]
fn test_separators_and_magics_have_no_counterpart() {
    let index = notebook();
    let python = index.document(PYTHON).unwrap();

    assert_eq!(python.origin(2), Ok(LineOrigin::Blank));
    assert_eq!(
        python.transform_virtual_to_editor(VirtualPosition::new(6, 0)),
        Err(TranslateError::Unmapped {
            space: "virtual",
            line: 6
        })
    );
    assert!(index.virtual_to_root(PYTHON, VirtualPosition::new(2, 0)).is_err());

    // The magic line belongs to a cell, but no virtual document owns it.
    let magic = RootPosition::new(2, 0);
    assert_eq!(index.owner_of(magic), Ok(R_CELL));
    assert_eq!(
        index.document_at_root_position(magic),
        Err(TranslateError::Unmapped {
            space: "root",
            line: 2
        })
    );
}

#[test]
fn test_placeholder_lines_keep_coordinates_but_not_ownership() {
    let index = notebook();
    let python = index.document(PYTHON).unwrap();

    assert_eq!(
        python.origin(4),
        Ok(LineOrigin::Placeholder {
            editor: R_CELL,
            editor_line: 1,
            root_line: 3
        })
    );
    assert_eq!(python.line_text(4).as_deref(), Some(""));
    assert!(python.is_suppressed(4, PYTHON));
    assert!(!python.is_suppressed(4, R));

    let root = index.virtual_to_root(PYTHON, VirtualPosition::new(4, 5)).unwrap();
    assert_eq!(root, RootPosition::new(3, 5));
    assert_eq!(index.document_at_root_position(root), Ok(R));
}

#[test]
fn test_document_queries() {
    let index = notebook();
    let python = index.document(PYTHON).unwrap();
    let r = index.document(R).unwrap();

    assert_eq!(python.uri(), "file:///nb.ipynb.py");
    assert_eq!(python.line_count(), 8);
    assert_eq!(python.last_virtual_line(), 7);
    assert_eq!(python.last_line(), "print(x)");
    assert_eq!(python.line_text(1).as_deref(), Some("x = 1"));
    assert_eq!(python.editor_at_virtual_line(0), Ok(IMPORTS));

    assert_eq!(r.line_count(), 2);
    assert_eq!(r.last_line(), "y <- 2");
    assert_eq!(index.line_text(R_CELL, 1).as_deref(), Some("library(dplyr)"));
    assert_eq!(index.line_text(R_CELL, 3), None);
}

#[test]
fn test_positions_outside_the_snapshot_are_boundary_errors() {
    let index = notebook();

    let err = index.to_root(PRINT, EditorPosition::new(1, 0)).unwrap_err();
    assert!(err.is_boundary());
    assert_eq!(
        index.root_to_editor(RootPosition::new(6, 0)),
        Err(TranslateError::OutOfBounds { line: 6, last: 5 })
    );
    assert_eq!(
        index.document(PYTHON).unwrap().origin(8),
        Err(TranslateError::OutOfBounds { line: 8, last: 7 })
    );

    let unknown = EditorId::new(99);
    assert_eq!(
        index.to_root(unknown, EditorPosition::new(0, 0)),
        Err(TranslateError::UnknownEditor(unknown))
    );
    assert!(!index.contains_editor(unknown));
    assert!(!TranslateError::UnknownEditor(unknown).is_boundary());

    let missing = VirtualDocumentId::new(9);
    assert!(matches!(
        index.document(missing),
        Err(TranslateError::UnknownDocument(id)) if id == missing
    ));
}

#[test]
fn test_builder_validation() {
    let mut builder = DocumentIndex::builder();
    builder.add_editor(IMPORTS, "a\nb").unwrap();
    builder.add_editor(PRINT, "c").unwrap();
    builder.add_document(PYTHON, "file:///a.py").unwrap();
    builder.add_document(R, "file:///a.R").unwrap();

    assert_eq!(
        builder.add_editor(IMPORTS, "again"),
        Err(IndexError::DuplicateEditor(IMPORTS))
    );
    assert_eq!(
        builder.add_document(R, "file:///b.R"),
        Err(IndexError::DuplicateDocument(R))
    );
    assert_eq!(
        builder.map_editor_lines(PYTHON, IMPORTS, 0..3),
        Err(IndexError::LinesOutOfRange {
            editor: IMPORTS,
            start: 0,
            end: 3
        })
    );

    builder.map_editor_lines(PYTHON, PRINT, 0..1).unwrap();
    assert_eq!(
        builder.map_editor_lines(PYTHON, IMPORTS, 0..1),
        Err(IndexError::NonMonotonic {
            document: PYTHON,
            root_line: 0
        })
    );
    assert_eq!(
        builder.map_editor_lines(R, PRINT, 0..1),
        Err(IndexError::AlreadyOwned {
            root_line: 2,
            owner: PYTHON
        })
    );
    assert_eq!(
        builder.suppress_diagnostics(PYTHON, 4),
        Err(IndexError::NoSuchVirtualLine {
            document: PYTHON,
            line: 4
        })
    );
}

#[test]
fn test_in_flight_requests_keep_their_snapshot() {
    let shared = SharedDocumentIndex::new(notebook());
    let in_flight = shared.load();

    let mut builder = DocumentIndex::builder().generation(4);
    builder.add_editor(IMPORTS, "import os\nx = 1").unwrap();
    builder.add_document(PYTHON, "file:///nb.ipynb.py").unwrap();
    builder.map_editor_lines(PYTHON, IMPORTS, 0..2).unwrap();
    shared.publish(builder.build());

    assert!(in_flight.contains_editor(PRINT));
    let current = shared.load();
    assert_eq!(current.generation(), 4);
    assert!(!current.contains_editor(PRINT));
    assert!(!Arc::ptr_eq(&in_flight, &current));
}
