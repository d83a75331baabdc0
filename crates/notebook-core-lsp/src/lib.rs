#![warn(missing_docs)]
//! `notebook-core-lsp` - LSP integration for `notebook-core`.
//!
//! Language servers see one virtual document per language; the user edits many sub-editors.
//! This crate maps protocol responses back onto sub-editors:
//!
//! - completion: per-source fetches ([`LspCompletionSource`] and host-provided sources), merged by
//!   [`merge_replies`] and driven end to end by [`CompletionProvider`]; lazy documentation through
//!   [`resolve_item`] with staleness checks in [`ActiveCompletion`]
//! - diagnostics: [`DiagnosticsReconciler`] turns `publishDiagnostics` into per-cell annotations
//!   and [`notebook_core::DiagnosticsDatabase`] entries, incrementally
//!
//! Transport is out of scope: hosts implement [`LanguageServerConnection`] on top of whatever
//! JSON-RPC client they use.

pub mod completion_merge;
pub mod completion_provider;
pub mod completion_resolver;
pub mod completion_source;
pub mod diagnostics_reconciler;
mod error;
pub mod lsp_client;
pub mod lsp_completion;
pub mod lsp_events;
pub mod lsp_position;
pub mod lsp_uri;

pub use completion_merge::merge_replies;
pub use completion_provider::{
    CompletionInvocation, CompletionProvider, Connections, EditorHost, suppress_if_stale,
};
pub use completion_resolver::{ActiveCompletion, resolve_item};
pub use completion_source::{
    CompletionContext, CompletionSource, LSP_SOURCE_NAME, LSP_SOURCE_PRIORITY,
    LspCompletionSource, Token, TokenKind, transform_lsp_items,
};
pub use diagnostics_reconciler::{
    CycleReport, DiagnosticsReconciler, IgnoreReason, ReconcileOutcome, collapse_by_range,
    group_hash, group_tooltip,
};
pub use error::{CompletionError, ReconcileError};
pub use lsp_client::{
    CompletionRequest, LanguageServerConnection, TriggerKind, completion_items_from_response,
    completion_params,
};
pub use lsp_completion::{
    CompletionItem, CompletionItemKind, CompletionReply, CompletionSourceInfo, Documentation,
    IconTheme, ItemToken, ItemTokenAllocator, NoIcons,
};
pub use lsp_events::{LspDiagnostic, LspPublishDiagnosticsParams, PUBLISH_DIAGNOSTICS};
pub use lsp_position::{LspPosition, LspRange};
pub use lsp_uri::{normalize_uri, percent_decode_path, uris_equal};
