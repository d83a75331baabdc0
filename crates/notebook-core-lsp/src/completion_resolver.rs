//! Lazy completion item resolution and the active completion session.
//!
//! Resolution is requested for the item the user is looking at. By the time the server answers
//! the user may have moved on; [`ActiveCompletion::apply_resolved`] only accepts a result whose
//! [`ItemToken`] still names the active item.

use crate::error::CompletionError;
use crate::lsp_client::LanguageServerConnection;
use crate::lsp_completion::{CompletionItem, CompletionReply, ItemToken};
use notebook_core::EditorPosition;

/// Resolve `item` through `connection`.
///
/// Already-resolved items (and items with no LSP payload) are returned unchanged.
pub async fn resolve_item(
    connection: &dyn LanguageServerConnection,
    item: &CompletionItem,
) -> Result<CompletionItem, CompletionError> {
    if item.is_resolved() || !item.supports_resolution() {
        return Ok(item.clone());
    }
    let resolved = connection.resolve_completion(&item.raw).await?;
    Ok(item.with_resolution(&resolved))
}

/// The displayed completion list and the item currently highlighted in it.
///
/// Single writer: only the completion UI mutates it.
#[derive(Debug, Clone, Default)]
pub struct ActiveCompletion {
    start: EditorPosition,
    end: EditorPosition,
    items: Vec<CompletionItem>,
    active: Option<ItemToken>,
}

impl ActiveCompletion {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a new merged reply; clears the active item.
    pub fn show(&mut self, reply: CompletionReply) {
        self.start = reply.start;
        self.end = reply.end;
        self.items = reply.items;
        self.active = None;
    }

    /// Displayed items.
    pub fn items(&self) -> &[CompletionItem] {
        &self.items
    }

    /// Replaced span `(start, end)`.
    pub fn span(&self) -> (EditorPosition, EditorPosition) {
        (self.start, self.end)
    }

    /// Highlight the item with `token`. Returns it if it is displayed.
    pub fn activate(&mut self, token: ItemToken) -> Option<&CompletionItem> {
        let item = self.items.iter().find(|item| item.token == token)?;
        self.active = Some(token);
        Some(item)
    }

    /// The highlighted item.
    pub fn active(&self) -> Option<&CompletionItem> {
        let token = self.active?;
        self.items.iter().find(|item| item.token == token)
    }

    /// The highlighted item if it still needs resolution.
    pub fn needs_resolution(&self) -> Option<&CompletionItem> {
        self.active()
            .filter(|item| item.supports_resolution() && !item.is_resolved())
    }

    /// Store a resolution result. Returns `false` (and drops it) if the item is no longer active.
    pub fn apply_resolved(&mut self, resolved: CompletionItem) -> bool {
        if self.active != Some(resolved.token) {
            tracing::debug!(token = %resolved.token, "discarding stale completion resolution");
            return false;
        }
        match self.items.iter_mut().find(|item| item.token == resolved.token) {
            Some(slot) => {
                *slot = resolved;
                true
            }
            None => false,
        }
    }

    /// Close the list.
    pub fn clear(&mut self) {
        self.items.clear();
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp_completion::{ItemTokenAllocator, NoIcons};
    use serde_json::json;

    fn reply(tokens: &ItemTokenAllocator) -> CompletionReply {
        let items = ["os", "open"]
            .into_iter()
            .map(|label| {
                CompletionItem::from_lsp(
                    json!({ "label": label }),
                    "file:///nb.py",
                    tokens.next_token(),
                    &NoIcons,
                )
                .unwrap()
            })
            .collect();
        CompletionReply {
            start: EditorPosition::new(0, 0),
            end: EditorPosition::new(0, 1),
            items,
            source: None,
        }
    }

    #[test]
    fn test_stale_resolution_is_discarded() {
        let tokens = ItemTokenAllocator::new(3);
        let mut session = ActiveCompletion::new();
        session.show(reply(&tokens));

        let first = session.items()[0].clone();
        let second = session.items()[1].clone();
        session.activate(first.token).unwrap();
        assert!(session.needs_resolution().is_some());

        // The user moves on before the first resolution settles.
        session.activate(second.token).unwrap();
        let late = first.with_resolution(&json!({ "label": "os", "detail": "module" }));
        assert!(!session.apply_resolved(late));
        assert_eq!(session.items()[0].detail, None);

        let fresh = second.with_resolution(&json!({ "label": "open", "detail": "function" }));
        assert!(session.apply_resolved(fresh));
        assert_eq!(session.active().unwrap().detail.as_deref(), Some("function"));
        assert!(session.needs_resolution().is_none());
    }

    #[test]
    fn test_new_reply_resets_active_item() {
        let tokens = ItemTokenAllocator::new(4);
        let mut session = ActiveCompletion::new();
        session.show(reply(&tokens));
        let token = session.items()[0].token;
        session.activate(token).unwrap();

        session.show(reply(&ItemTokenAllocator::new(5)));
        assert!(session.active().is_none());
        assert!(session.activate(token).is_none());
    }
}
