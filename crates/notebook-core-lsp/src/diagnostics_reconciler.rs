//! Diagnostics reconciliation: `publishDiagnostics` → annotations + database.
//!
//! One cycle per inbound publish message and virtual document:
//!
//! ```text
//! filter → collapse by range → bounds/ownership checks → severity → hash → annotations → database
//! ```
//!
//! A cycle first computes a complete plan without touching any state, then applies it. If
//! planning fails the cycle is aborted, logged, and the previous annotations stay on screen.
//!
//! Annotation identity is the [`GroupHash`] of a diagnostic group, computed in editor space
//! (cell-local range + owning cell). Editing one cell therefore does not invalidate markers in the
//! cells below it even though their virtual lines shift.

use crate::error::ReconcileError;
use crate::lsp_events::{LspDiagnostic, LspPublishDiagnosticsParams};
use crate::lsp_position::LspRange;
use crate::lsp_uri::uris_equal;
use notebook_core::text::utf16_len;
use notebook_core::{
    AnnotationSink, AnnotationSpec, Diagnostic, DiagnosticSeverity, DiagnosticsContext,
    DocumentIndex, EditorDiagnostic, EditorId, EditorPosition, EditorRange, GroupHash,
    TranslateError, VirtualDocumentId, VirtualDocumentRef, VirtualPosition,
};
use notebook_core_lang::{ConfigError, DiagnosticFilter, DiagnosticsConfig};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Why a publish message was not applied at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The message is for another document.
    UriMismatch,
    /// The virtual document has no lines.
    EmptyDocument,
}

/// Counters of one applied cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Groups that passed every check.
    pub groups: usize,
    /// Groups skipped (out of range, foreign, suppressed or unmappable).
    pub skipped: usize,
    /// Annotations created.
    pub created: usize,
    /// Annotations kept from the previous cycle.
    pub retained: usize,
    /// Annotations destroyed.
    pub destroyed: usize,
    /// Annotations the renderer refused to create.
    pub failed: usize,
}

/// Result of handling one publish message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing was changed.
    Ignored(IgnoreReason),
    /// The cycle completed.
    Applied(CycleReport),
    /// The cycle failed; previous state was kept.
    Aborted,
}

/// A diagnostic group ready to be applied.
#[derive(Debug, Clone)]
struct PlannedGroup {
    hash: GroupHash,
    spec: AnnotationSpec,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Serialize, PartialEq, Eq, PartialOrd, Ord)]
struct DiagnosticKey<'a> {
    severity: Option<DiagnosticSeverity>,
    message: &'a str,
    code: Option<&'a str>,
    source: Option<&'a str>,
    related_information: Option<&'a str>,
}

#[derive(Serialize)]
struct GroupKey<'a> {
    diagnostics: Vec<DiagnosticKey<'a>>,
    range: EditorRange,
    editor: EditorId,
}

/// Stable identity of a group: sorted per-diagnostic tuples, cell-local range and owning cell.
pub fn group_hash(
    diagnostics: &[Diagnostic],
    range: EditorRange,
    editor: EditorId,
) -> Result<GroupHash, serde_json::Error> {
    let mut keys: Vec<DiagnosticKey<'_>> = diagnostics
        .iter()
        .map(|d| DiagnosticKey {
            severity: d.severity,
            message: &d.message,
            code: d.code.as_deref(),
            source: d.source.as_deref(),
            related_information: d.related_information_json.as_deref(),
        })
        .collect();
    keys.sort();
    let key = serde_json::to_string(&GroupKey {
        diagnostics: keys,
        range,
        editor,
    })?;
    Ok(GroupHash::new(key))
}

/// Hover text of a group: one `message (source)` line per diagnostic.
pub fn group_tooltip(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| match &d.source {
            Some(source) => format!("{} ({source})", d.message),
            None => d.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Group diagnostics sharing an identical range, keeping first-encounter order.
pub fn collapse_by_range(diagnostics: &[LspDiagnostic]) -> Vec<(LspRange, Vec<&LspDiagnostic>)> {
    let mut slots: HashMap<LspRange, usize> = HashMap::new();
    let mut groups: Vec<(LspRange, Vec<&LspDiagnostic>)> = Vec::new();
    for diagnostic in diagnostics {
        match slots.get(&diagnostic.range).copied() {
            Some(slot) => groups[slot].1.push(diagnostic),
            None => {
                slots.insert(diagnostic.range, groups.len());
                groups.push((diagnostic.range, vec![diagnostic]));
            }
        }
    }
    groups
}

/// Applies `publishDiagnostics` messages for the virtual documents of one physical document.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsReconciler {
    filter: DiagnosticFilter,
}

impl DiagnosticsReconciler {
    /// Create a reconciler with compiled settings.
    pub fn new(filter: DiagnosticFilter) -> Self {
        Self { filter }
    }

    /// Apply new diagnostics settings. On error the previous settings stay active.
    pub fn configure(&mut self, config: &DiagnosticsConfig) -> Result<(), ConfigError> {
        self.filter = config.compile()?;
        Ok(())
    }

    /// Handle one publish message for `document`. Never fails; errors are logged.
    pub fn handle_publish(
        &self,
        index: &DocumentIndex,
        document: VirtualDocumentId,
        params: &LspPublishDiagnosticsParams,
        context: &mut DiagnosticsContext,
        sink: &mut dyn AnnotationSink,
    ) -> ReconcileOutcome {
        match self.reconcile(index, document, params, context, sink) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(%err, %document, uri = %params.uri, "diagnostics cycle aborted");
                ReconcileOutcome::Aborted
            }
        }
    }

    /// Handle one publish message for `document`, reporting planning failures.
    pub fn reconcile(
        &self,
        index: &DocumentIndex,
        document: VirtualDocumentId,
        params: &LspPublishDiagnosticsParams,
        context: &mut DiagnosticsContext,
        sink: &mut dyn AnnotationSink,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let vdoc = index.document(document)?;
        if !uris_equal(&params.uri, vdoc.uri()) {
            return Ok(ReconcileOutcome::Ignored(IgnoreReason::UriMismatch));
        }
        if vdoc.is_empty() {
            return Ok(ReconcileOutcome::Ignored(IgnoreReason::EmptyDocument));
        }

        let mut report = CycleReport::default();
        let plan = self.plan(index, vdoc, params, &mut report)?;

        let (database, annotations) = context.document_state_mut(document);
        let mut seen = HashSet::with_capacity(plan.len());
        let mut entries = Vec::new();
        for group in plan {
            for diagnostic in &group.diagnostics {
                entries.push(EditorDiagnostic {
                    diagnostic: diagnostic.clone(),
                    editor: group.spec.editor,
                    range: group.spec.range,
                });
            }
            seen.insert(group.hash.clone());

            if annotations.contains(&group.hash) {
                report.retained += 1;
                continue;
            }
            match sink.create(&group.spec) {
                Ok(handle) => {
                    annotations.insert(group.hash, group.spec.editor, handle);
                    report.created += 1;
                }
                Err(err) => {
                    tracing::warn!(%err, editor = %group.spec.editor, "marking diagnostic failed");
                    report.failed += 1;
                }
            }
        }

        report.destroyed = annotations.retain_seen(&seen, sink);
        database.replace(document, entries);
        sink.refresh(document);

        tracing::debug!(%document, ?report, "diagnostics cycle applied");
        Ok(ReconcileOutcome::Applied(report))
    }

    fn plan(
        &self,
        index: &DocumentIndex,
        vdoc: VirtualDocumentRef<'_>,
        params: &LspPublishDiagnosticsParams,
        report: &mut CycleReport,
    ) -> Result<Vec<PlannedGroup>, ReconcileError> {
        let filtered: Vec<LspDiagnostic> = params
            .diagnostics
            .iter()
            .filter(|d| {
                !self
                    .filter
                    .is_ignored(d.code_string().as_deref(), &d.message)
            })
            .cloned()
            .collect();

        let mut plan = Vec::new();
        for (range, group) in collapse_by_range(&filtered) {
            let diagnostics: Vec<Diagnostic> = group.iter().map(|d| d.to_diagnostic()).collect();
            match self.plan_group(index, vdoc, range, diagnostics)? {
                Some(planned) => {
                    report.groups += 1;
                    plan.push(planned);
                }
                None => report.skipped += 1,
            }
        }
        Ok(plan)
    }

    fn plan_group(
        &self,
        index: &DocumentIndex,
        vdoc: VirtualDocumentRef<'_>,
        range: LspRange,
        diagnostics: Vec<Diagnostic>,
    ) -> Result<Option<PlannedGroup>, ReconcileError> {
        let document = vdoc.id();
        let start = VirtualPosition::from(range.start);
        let end = VirtualPosition::from(range.end);

        let last_line_number = vdoc.last_virtual_line();
        if start.line > last_line_number {
            tracing::info!(
                line = start.line,
                last = last_line_number,
                count = diagnostics.len(),
                "out of range diagnostic was skipped"
            );
            return Ok(None);
        }
        if start.line == last_line_number {
            let last_len = utf16_len(&vdoc.last_line());
            if start.character > last_len {
                tracing::info!(
                    character = start.character,
                    last = last_len,
                    line = last_line_number,
                    "out of range diagnostic was skipped"
                );
                return Ok(None);
            }
        }

        let owner = index
            .virtual_to_root(document, start)
            .and_then(|root| index.document_at_root_position(root));
        match owner {
            Ok(owner) if owner == document => {}
            Ok(owner) => {
                tracing::debug!(
                    %document,
                    %owner,
                    "ignoring diagnostics: region is covered by another virtual document"
                );
                return Ok(None);
            }
            Err(err) => {
                tracing::debug!(%err, %document, "ignoring unmappable diagnostics");
                return Ok(None);
            }
        }

        if vdoc.is_suppressed(start.line, document) {
            tracing::debug!(line = start.line, %document, "ignoring diagnostics silenced for this document");
            return Ok(None);
        }

        let default = self.filter.default_severity();
        let severity = DiagnosticSeverity::most_severe(
            diagnostics.iter().map(|d| d.severity.unwrap_or(default)),
        )
        .unwrap_or(default);

        let (editor, start_in_editor) = vdoc.transform_virtual_to_editor(start)?;
        let end_in_editor = match vdoc.transform_virtual_to_editor(end) {
            Ok((end_editor, position)) if end_editor == editor => position,
            _ => {
                let err = TranslateError::MalformedRange {
                    line: end.line,
                    character: end.character,
                };
                tracing::warn!(%err, "malformed range for diagnostic");
                EditorPosition::new(
                    start_in_editor.line,
                    start_in_editor.character.saturating_add(1),
                )
            }
        };
        let range = EditorRange::new(start_in_editor, end_in_editor);

        let hash = group_hash(&diagnostics, range, editor)?;
        let spec = AnnotationSpec {
            editor,
            range,
            tooltip: group_tooltip(&diagnostics),
            severity,
        };
        Ok(Some(PlannedGroup {
            hash,
            spec,
            diagnostics,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp_position::LspPosition;

    fn diag(range: (u32, u32, u32, u32), message: &str) -> LspDiagnostic {
        LspDiagnostic {
            range: LspRange::new(
                LspPosition::new(range.0, range.1),
                LspPosition::new(range.2, range.3),
            ),
            severity: None,
            code: None,
            source: None,
            message: message.to_string(),
            related_information: None,
            data: None,
        }
    }

    #[test]
    fn test_collapse_keeps_encounter_order() {
        let diagnostics = vec![
            diag((0, 0, 0, 3), "first"),
            diag((1, 0, 1, 2), "other"),
            diag((0, 0, 0, 3), "second"),
        ];
        let groups = collapse_by_range(&diagnostics);
        assert_eq!(groups.len(), 2);
        let messages: Vec<&str> = groups[0].1.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
        assert_eq!(groups[1].1[0].message, "other");
    }

    #[test]
    fn test_hash_ignores_diagnostic_order_but_not_editor() {
        let a = diag((0, 0, 0, 3), "a").to_diagnostic();
        let b = diag((0, 0, 0, 3), "b").to_diagnostic();
        let range = EditorRange::new(EditorPosition::new(0, 0), EditorPosition::new(0, 3));

        let ab = group_hash(&[a.clone(), b.clone()], range, EditorId::new(1)).unwrap();
        let ba = group_hash(&[b.clone(), a.clone()], range, EditorId::new(1)).unwrap();
        let other = group_hash(&[a, b], range, EditorId::new(2)).unwrap();
        assert_eq!(ab, ba);
        assert_ne!(ab, other);
    }

    #[test]
    fn test_tooltip() {
        let mut with_source = diag((0, 0, 0, 1), "undefined name 'x'").to_diagnostic();
        with_source.source = Some("pyflakes".to_string());
        let plain = diag((0, 0, 0, 1), "line too long").to_diagnostic();
        assert_eq!(
            group_tooltip(&[with_source, plain]),
            "undefined name 'x' (pyflakes)\nline too long"
        );
    }
}
