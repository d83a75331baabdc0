//! Completion pipeline: translate → fetch (all sources) → re-validate → merge → suppress.
//!
//! The provider holds no per-request state. Hosts call [`CompletionProvider::configure`] when
//! settings change and [`CompletionProvider::rebind`] when the document's index or connections
//! are swapped; nothing is subscribed to behind their back.

use crate::completion_merge::merge_replies;
use crate::completion_resolver::resolve_item;
use crate::completion_source::{CompletionContext, CompletionSource, LspCompletionSource, Token};
use crate::error::CompletionError;
use crate::lsp_client::{LanguageServerConnection, TriggerKind};
use crate::lsp_completion::{CompletionItem, CompletionReply, IconTheme, ItemTokenAllocator};
use crate::lsp_uri::uris_equal;
use futures::future::join_all;
use notebook_core::{EditorId, EditorPosition, SharedDocumentIndex};
use notebook_core_lang::CompletionConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Host-side view of the editing surface.
pub trait EditorHost: Send + Sync {
    /// Returns `true` while `editor` has keyboard focus.
    fn has_focus(&self, editor: EditorId) -> bool;
}

/// One completion invocation in a sub-editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionInvocation {
    /// Sub-editor holding the cursor.
    pub editor: EditorId,
    /// Cursor (editor-local).
    pub cursor: EditorPosition,
    /// Token under or adjacent to the cursor.
    pub token: Token,
}

/// Language-server connections keyed by virtual document URI.
pub type Connections = HashMap<String, Arc<dyn LanguageServerConnection>>;

/// Completion entry point for one physical document.
pub struct CompletionProvider {
    index: Arc<SharedDocumentIndex>,
    connections: Connections,
    sources: Vec<Arc<dyn CompletionSource>>,
    icons: Arc<dyn IconTheme>,
    config: CompletionConfig,
}

/// Item token sessions, shared by every provider in the process.
static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

impl CompletionProvider {
    /// Create a provider reading positions from `index`.
    pub fn new(index: Arc<SharedDocumentIndex>, icons: Arc<dyn IconTheme>) -> Self {
        Self {
            index,
            connections: Connections::new(),
            sources: Vec::new(),
            icons,
            config: CompletionConfig::default(),
        }
    }

    /// Apply new completion settings.
    pub fn configure(&mut self, config: CompletionConfig) {
        self.config = config;
    }

    /// Point the provider at another document index and connection set.
    pub fn rebind(&mut self, index: Arc<SharedDocumentIndex>, connections: Connections) {
        self.index = index;
        self.connections = connections;
    }

    /// Register an additional (non-LSP) source, e.g. a kernel.
    pub fn add_source(&mut self, source: Arc<dyn CompletionSource>) {
        self.sources.push(source);
    }

    /// Connection serving the virtual document `uri`.
    pub fn connection(&self, uri: &str) -> Option<Arc<dyn LanguageServerConnection>> {
        self.connections
            .get(uri)
            .or_else(|| {
                self.connections
                    .iter()
                    .find(|(key, _)| uris_equal(key, uri))
                    .map(|(_, connection)| connection)
            })
            .cloned()
    }

    /// Returns `true` if typing `inserted_text` in the document `uri` should open completion.
    pub fn should_trigger_after(&self, uri: &str, inserted_text: &str) -> bool {
        let server = self
            .connection(uri)
            .map(|c| c.trigger_characters())
            .unwrap_or_default();
        self.config.should_trigger_after(inserted_text, &server)
    }

    /// Fetch, merge and filter completions for `invocation`.
    ///
    /// Never fails: errors are logged and produce an empty reply at the cursor.
    pub async fn fetch(
        &self,
        invocation: &CompletionInvocation,
        host: &dyn EditorHost,
    ) -> CompletionReply {
        match self.try_fetch(invocation, host).await {
            Ok(reply) => reply,
            Err(err @ CompletionError::Stale(_)) => {
                tracing::debug!(%err, "discarding completion reply");
                CompletionReply::empty_at(invocation.cursor)
            }
            Err(err) => {
                tracing::warn!(%err, editor = %invocation.editor, "completion failed");
                CompletionReply::empty_at(invocation.cursor)
            }
        }
    }

    /// Resolve documentation for `item` through the connection it came from.
    pub async fn resolve(&self, item: &CompletionItem) -> Result<CompletionItem, CompletionError> {
        let connection = self
            .connection(&item.document_uri)
            .ok_or_else(|| CompletionError::NoConnection(item.document_uri.clone()))?;
        resolve_item(connection.as_ref(), item).await
    }

    async fn try_fetch(
        &self,
        invocation: &CompletionInvocation,
        host: &dyn EditorHost,
    ) -> Result<CompletionReply, CompletionError> {
        let CompletionInvocation {
            editor,
            cursor,
            ref token,
        } = *invocation;

        let index = self.index.load();
        let start_root = index.to_root(editor, token.start())?;
        let end_root = index.to_root(editor, token.end())?;
        let cursor_root = index.to_root(editor, cursor)?;

        let document = index.document_at_root_position(start_root)?;
        let document_uri = index.document(document)?.uri().to_string();
        let virtual_start = index.root_to_virtual(start_root)?;
        let virtual_end = index.root_to_virtual(end_root)?;
        let virtual_cursor = index.root_to_virtual(cursor_root)?;
        let generation = index.generation();
        drop(index);

        let connection = self.connection(&document_uri);
        let server_characters = connection
            .as_ref()
            .map(|c| c.trigger_characters())
            .unwrap_or_default();

        let typed_character = token.text_before(cursor).chars().last().map(String::from);
        let trigger_kind = match &typed_character {
            Some(c) if self.config.is_trigger_character(c, &server_characters) => {
                TriggerKind::TriggerCharacter
            }
            _ => TriggerKind::Invoked,
        };

        let context = CompletionContext {
            editor,
            token: token.clone(),
            cursor,
            virtual_start,
            virtual_end,
            virtual_cursor,
            document,
            document_uri,
            typed_character,
            trigger_kind,
            tokens: ItemTokenAllocator::new(NEXT_SESSION.fetch_add(1, Ordering::Relaxed)),
        };

        let mut sources: Vec<Arc<dyn CompletionSource>> =
            Vec::with_capacity(self.sources.len() + 1);
        match connection {
            Some(connection) => {
                sources.push(Arc::new(LspCompletionSource::new(connection, self.icons.clone())))
            }
            None => tracing::warn!(
                uri = %context.document_uri,
                "no language server connection, fetching from other sources only"
            ),
        }
        sources.extend(self.sources.iter().cloned());

        let replies = join_all(sources.iter().map(|source| source.fetch(&context))).await;
        let replies = replies
            .into_iter()
            .zip(&sources)
            .map(|(reply, source)| {
                reply.inspect_err(|err| {
                    tracing::warn!(source = %source.info().name, %err, "completion source failed");
                })
            })
            .collect();

        // Cells may have been added, removed or re-split while the servers were answering.
        let index = self.index.load();
        let still_owned = index
            .to_root(editor, cursor)
            .and_then(|root| index.document_at_root_position(root))
            .is_ok_and(|owner| owner == document);
        if !still_owned {
            return Err(CompletionError::Stale(format!(
                "editor {editor} no longer maps into {document} (index generation {generation} -> {})",
                index.generation()
            )));
        }

        let line = index.line_text(editor, cursor.line);
        let merged = merge_replies(replies, cursor, line.as_deref());
        Ok(suppress_if_stale(editor, merged, host))
    }
}

/// Empty the items of a reply whose editor lost focus, keeping the span.
pub fn suppress_if_stale(
    editor: EditorId,
    reply: CompletionReply,
    host: &dyn EditorHost,
) -> CompletionReply {
    if host.has_focus(editor) {
        return reply;
    }
    tracing::debug!(%editor, "ignoring completion response: the editor lost focus");
    CompletionReply {
        items: Vec::new(),
        ..reply
    }
}
