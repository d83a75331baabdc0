//! Language-server connection seam.
//!
//! Transport, lifecycle and JSON-RPC framing belong to the host. This crate only needs the two
//! completion round trips, expressed as an async trait so hosts can plug in any runtime.

use crate::error::CompletionError;
use crate::lsp_position::LspPosition;
use async_trait::async_trait;
use notebook_core::VirtualPosition;
use serde_json::{Value, json};

/// LSP `CompletionTriggerKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// Completion was invoked explicitly or by typing an identifier character.
    Invoked = 1,
    /// Completion was triggered by a trigger character.
    TriggerCharacter = 2,
    /// Completion was re-triggered because the previous list was incomplete.
    TriggerForIncompleteCompletions = 3,
}

/// One `textDocument/completion` request, in virtual-document coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Cursor position.
    pub cursor: VirtualPosition,
    /// Start of the token under the cursor.
    pub start: VirtualPosition,
    /// End of the token under the cursor.
    pub end: VirtualPosition,
    /// Token text.
    pub text: String,
    /// URI of the virtual document.
    pub document_uri: String,
    /// `true` when re-requesting an incomplete list.
    pub is_continuation: bool,
    /// Character typed right before the request, if any.
    pub trigger_character: Option<String>,
    /// How the request was triggered.
    pub trigger_kind: TriggerKind,
}

/// Build `textDocument/completion` params for `request`.
pub fn completion_params(request: &CompletionRequest) -> Value {
    let mut context = json!({ "triggerKind": request.trigger_kind as u8 });
    if request.trigger_kind == TriggerKind::TriggerCharacter
        && let Some(character) = &request.trigger_character
    {
        context["triggerCharacter"] = Value::String(character.clone());
    }
    json!({
        "textDocument": { "uri": request.document_uri },
        "position": LspPosition::from(request.cursor).to_value(),
        "context": context,
    })
}

/// Extract the item array of a completion response (`CompletionItem[] | CompletionList | null`).
pub fn completion_items_from_response(response: &Value) -> Option<Vec<Value>> {
    match response {
        Value::Array(items) => Some(items.clone()),
        Value::Object(list) => list.get("items").and_then(Value::as_array).cloned(),
        _ => None,
    }
}

/// A live connection to one language server.
#[async_trait]
pub trait LanguageServerConnection: Send + Sync {
    /// Issue `textDocument/completion`. `Ok(None)` means the server returned `null`.
    async fn get_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<Option<Vec<Value>>, CompletionError>;

    /// Issue `completionItem/resolve` for a raw item.
    async fn resolve_completion(&self, item: &Value) -> Result<Value, CompletionError>;

    /// Trigger characters advertised by the server.
    fn trigger_characters(&self) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: TriggerKind) -> CompletionRequest {
        CompletionRequest {
            cursor: VirtualPosition::new(4, 3),
            start: VirtualPosition::new(4, 0),
            end: VirtualPosition::new(4, 3),
            text: "os.".to_string(),
            document_uri: "file:///nb.ipynb.py".to_string(),
            is_continuation: false,
            trigger_character: Some(".".to_string()),
            trigger_kind: kind,
        }
    }

    #[test]
    fn test_completion_params() {
        let params = completion_params(&request(TriggerKind::TriggerCharacter));
        assert_eq!(
            params,
            json!({
                "textDocument": { "uri": "file:///nb.ipynb.py" },
                "position": { "line": 4, "character": 3 },
                "context": { "triggerKind": 2, "triggerCharacter": "." }
            })
        );

        let invoked = completion_params(&request(TriggerKind::Invoked));
        assert_eq!(invoked["context"], json!({ "triggerKind": 1 }));
    }

    #[test]
    fn test_items_from_response_shapes() {
        assert_eq!(
            completion_items_from_response(&json!([{ "label": "a" }])).map(|v| v.len()),
            Some(1)
        );
        assert_eq!(
            completion_items_from_response(&json!({ "isIncomplete": false, "items": [] }))
                .map(|v| v.len()),
            Some(0)
        );
        assert_eq!(completion_items_from_response(&Value::Null), None);
    }
}
