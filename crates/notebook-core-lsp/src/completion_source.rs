//! Completion sources and the single-source LSP fetch.
//!
//! A [`CompletionSource`] turns one [`CompletionContext`] into one [`CompletionReply`]. The
//! provider runs every registered source concurrently and merges what comes back.
//!
//! [`LspCompletionSource`] is the language-server backed source. Besides issuing the request it
//! decides how much of the token the reply replaces:
//!
//! - the running *prefix* starts as the token text up to the cursor; an item whose text starts
//!   with it (case-insensitively) confirms it, and an item that also starts with the whole token
//!   promotes the prefix to the whole token (`disp|lay` + `display_table` replaces `display`)
//! - inside string tokens containing `/`, an item matching only the last path segment gets the
//!   leading segments prepended (`'/Com` + `Completion.ipynb` inserts `'/Completion.ipynb`)
//! - when no item confirms the prefix at all, the span starts at the cursor instead of the token
//!   start, so completions like `from statistics import |` do not mangle the statement

use crate::error::CompletionError;
use crate::lsp_client::{CompletionRequest, LanguageServerConnection, TriggerKind};
use crate::lsp_completion::{
    CompletionItem, CompletionReply, CompletionSourceInfo, IconTheme, ItemTokenAllocator,
};
use async_trait::async_trait;
use notebook_core::text::{utf16_len, utf16_prefix};
use notebook_core::{EditorId, EditorPosition, VirtualDocumentId, VirtualPosition};
use serde_json::Value;
use std::sync::Arc;

/// Name of the language-server source.
pub const LSP_SOURCE_NAME: &str = "LSP";

/// Merge priority of the language-server source.
pub const LSP_SOURCE_PRIORITY: i32 = 2;

/// Lexical class of the token under the cursor, as reported by the host's tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenKind {
    /// A string literal (path completion applies).
    String,
    /// A comment.
    Comment,
    /// Anything else.
    #[default]
    Other,
}

/// The text fragment the cursor is inside of or adjacent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token text.
    pub value: String,
    /// Editor line of the token.
    pub line: u32,
    /// Column of the token start (UTF-16 code units).
    pub offset: u32,
    /// Lexical class.
    pub kind: TokenKind,
}

impl Token {
    /// Create a token.
    pub fn new(value: impl Into<String>, line: u32, offset: u32, kind: TokenKind) -> Self {
        Self {
            value: value.into(),
            line,
            offset,
            kind,
        }
    }

    /// Editor position of the token start.
    pub fn start(&self) -> EditorPosition {
        EditorPosition::new(self.line, self.offset)
    }

    /// Editor position of the token end.
    pub fn end(&self) -> EditorPosition {
        EditorPosition::new(self.line, self.offset + utf16_len(&self.value))
    }

    /// Token text before `cursor` (clamped to the token).
    pub fn text_before(&self, cursor: EditorPosition) -> &str {
        utf16_prefix(&self.value, cursor.character.saturating_sub(self.offset))
    }
}

/// Everything a source needs to answer one completion request.
#[derive(Debug)]
pub struct CompletionContext {
    /// Sub-editor holding the cursor.
    pub editor: EditorId,
    /// Token under the cursor.
    pub token: Token,
    /// Cursor (editor-local).
    pub cursor: EditorPosition,
    /// Token start in the virtual document.
    pub virtual_start: VirtualPosition,
    /// Token end in the virtual document.
    pub virtual_end: VirtualPosition,
    /// Cursor in the virtual document.
    pub virtual_cursor: VirtualPosition,
    /// Virtual document owning the token.
    pub document: VirtualDocumentId,
    /// URI of that virtual document.
    pub document_uri: String,
    /// Character typed right before the cursor, if the cursor is inside the token.
    pub typed_character: Option<String>,
    /// How the request was triggered.
    pub trigger_kind: TriggerKind,
    /// Token allocator of this completion session.
    pub tokens: ItemTokenAllocator,
}

/// One producer of completion candidates.
#[async_trait]
pub trait CompletionSource: Send + Sync {
    /// Attribution and merge priority.
    fn info(&self) -> CompletionSourceInfo;

    /// Produce a reply for `context`.
    async fn fetch(&self, context: &CompletionContext) -> Result<CompletionReply, CompletionError>;
}

/// The language-server completion source.
#[derive(Clone)]
pub struct LspCompletionSource {
    connection: Arc<dyn LanguageServerConnection>,
    icons: Arc<dyn IconTheme>,
}

impl LspCompletionSource {
    /// Create a source backed by `connection`.
    pub fn new(connection: Arc<dyn LanguageServerConnection>, icons: Arc<dyn IconTheme>) -> Self {
        Self { connection, icons }
    }
}

#[async_trait]
impl CompletionSource for LspCompletionSource {
    fn info(&self) -> CompletionSourceInfo {
        CompletionSourceInfo::new(LSP_SOURCE_NAME, LSP_SOURCE_PRIORITY)
    }

    async fn fetch(&self, context: &CompletionContext) -> Result<CompletionReply, CompletionError> {
        let request = CompletionRequest {
            cursor: context.virtual_cursor,
            start: context.virtual_start,
            end: context.virtual_end,
            text: context.token.value.clone(),
            document_uri: context.document_uri.clone(),
            is_continuation: false,
            trigger_character: context.typed_character.clone(),
            trigger_kind: context.trigger_kind,
        };
        let raw_items = self
            .connection
            .get_completion(&request)
            .await?
            .unwrap_or_default();
        tracing::trace!(count = raw_items.len(), "transforming LSP completion items");

        let mut reply = transform_lsp_items(context, raw_items, self.icons.as_ref());
        reply.source = Some(self.info());
        Ok(reply)
    }
}

/// Turn raw LSP items into a reply whose span follows the prefix rules of this module.
pub fn transform_lsp_items(
    context: &CompletionContext,
    raw_items: Vec<Value>,
    icons: &dyn IconTheme,
) -> CompletionReply {
    let token = &context.token;
    let token_lower = token.value.to_lowercase();
    let mut prefix = token.text_before(context.cursor).to_string();
    let mut prefix_lower = prefix.to_lowercase();
    let mut all_non_prefixed = true;
    let mut items = Vec::with_capacity(raw_items.len());

    for raw in raw_items {
        let Some(mut item) = CompletionItem::from_lsp(
            raw,
            &context.document_uri,
            context.tokens.next_token(),
            icons,
        ) else {
            tracing::debug!("dropping completion item without a label");
            continue;
        };
        let text_lower = item.insert_text.to_lowercase();

        if text_lower.starts_with(&prefix_lower) {
            all_non_prefixed = false;
            if prefix != token.value && text_lower.starts_with(&token_lower) {
                // `disp|lay` + `display_table`: replace the trailing `lay` too.
                prefix = token.value.clone();
                prefix_lower = token_lower.clone();
            }
        } else if token.kind == TokenKind::String && prefix.contains('/') {
            let (dirs, last) = prefix
                .rsplit_once('/')
                .unwrap_or(("", prefix.as_str()));
            if text_lower.starts_with(&last.to_lowercase()) {
                let path_prefix = format!("{dirs}/");
                item.insert_text = format!("{path_prefix}{}", item.insert_text);
                let label_prefix = path_prefix
                    .strip_prefix(['\'', '"'])
                    .unwrap_or(&path_prefix);
                item.label = format!("{label_prefix}{}", item.label);
                all_non_prefixed = false;
            }
        }

        items.push(item);
    }

    let prefix_len = utf16_len(&prefix);
    let mut prefix_offset = utf16_len(&token.value);
    if all_non_prefixed && prefix_offset > prefix_len {
        prefix_offset = prefix_len;
    }

    let start = EditorPosition::new(
        token.line,
        token.offset + if all_non_prefixed { prefix_offset } else { 0 },
    );
    let end = EditorPosition::new(token.line, token.offset + prefix_len);
    if start > end {
        tracing::warn!(%start, %end, "completion reply starts beyond its end");
    }

    CompletionReply {
        start,
        end,
        items,
        source: None,
    }
}
