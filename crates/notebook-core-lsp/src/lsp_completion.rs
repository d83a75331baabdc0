//! Completion item and reply model.
//!
//! Raw LSP `CompletionItem`s are kept as `serde_json::Value` so they can be sent back verbatim
//! for `completionItem/resolve`. The typed fields are what merging and rendering need.

use notebook_core::EditorPosition;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// LSP `CompletionItemKind`.
#[allow(missing_docs)]
pub enum CompletionItemKind {
    Text,
    Method,
    Function,
    Constructor,
    Field,
    Variable,
    Class,
    Interface,
    Module,
    Property,
    Unit,
    Value,
    Enum,
    Keyword,
    Snippet,
    Color,
    File,
    Reference,
    Folder,
    EnumMember,
    Constant,
    Struct,
    Event,
    Operator,
    TypeParameter,
}

impl CompletionItemKind {
    const ALL: [Self; 25] = [
        Self::Text,
        Self::Method,
        Self::Function,
        Self::Constructor,
        Self::Field,
        Self::Variable,
        Self::Class,
        Self::Interface,
        Self::Module,
        Self::Property,
        Self::Unit,
        Self::Value,
        Self::Enum,
        Self::Keyword,
        Self::Snippet,
        Self::Color,
        Self::File,
        Self::Reference,
        Self::Folder,
        Self::EnumMember,
        Self::Constant,
        Self::Struct,
        Self::Event,
        Self::Operator,
        Self::TypeParameter,
    ];

    /// Convert the numeric LSP `CompletionItemKind` (1-based) into an enum.
    pub fn from_u64(value: u64) -> Option<Self> {
        let index = usize::try_from(value).ok()?.checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    /// Kind name as used by icon themes.
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Method => "Method",
            Self::Function => "Function",
            Self::Constructor => "Constructor",
            Self::Field => "Field",
            Self::Variable => "Variable",
            Self::Class => "Class",
            Self::Interface => "Interface",
            Self::Module => "Module",
            Self::Property => "Property",
            Self::Unit => "Unit",
            Self::Value => "Value",
            Self::Enum => "Enum",
            Self::Keyword => "Keyword",
            Self::Snippet => "Snippet",
            Self::Color => "Color",
            Self::File => "File",
            Self::Reference => "Reference",
            Self::Folder => "Folder",
            Self::EnumMember => "EnumMember",
            Self::Constant => "Constant",
            Self::Struct => "Struct",
            Self::Event => "Event",
            Self::Operator => "Operator",
            Self::TypeParameter => "TypeParameter",
        }
    }
}

/// Icon lookup collaborator (theme manager of the host).
pub trait IconTheme: Send + Sync {
    /// Icon name for an item kind; `None` means "no icon".
    fn icon_for(&self, kind: Option<CompletionItemKind>) -> Option<String>;
}

/// An [`IconTheme`] that never provides icons.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIcons;

impl IconTheme for NoIcons {
    fn icon_for(&self, _kind: Option<CompletionItemKind>) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Item documentation (`string | MarkupContent`).
pub enum Documentation {
    /// Plain text.
    PlainText(String),
    /// Markdown text.
    Markdown(String),
}

impl Documentation {
    /// Parse an LSP `documentation` value.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::PlainText(s.clone())),
            Value::Object(obj) => {
                let text = obj.get("value")?.as_str()?.to_string();
                match obj.get("kind").and_then(Value::as_str) {
                    Some("markdown") => Some(Self::Markdown(text)),
                    _ => Some(Self::PlainText(text)),
                }
            }
            _ => None,
        }
    }

    /// The documentation text regardless of format.
    pub fn text(&self) -> &str {
        match self {
            Self::PlainText(s) | Self::Markdown(s) => s,
        }
    }
}

/// Identity of one completion item, unique across completion sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemToken {
    /// Completion session (one per fetch).
    pub session: u64,
    /// Sequence number within the session.
    pub sequence: u64,
}

impl fmt::Display for ItemToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.session, self.sequence)
    }
}

/// Hands out [`ItemToken`]s for one completion session.
///
/// Shared by every source of a fetch, so sequence numbers are allocated atomically.
#[derive(Debug)]
pub struct ItemTokenAllocator {
    session: u64,
    next: AtomicU64,
}

impl ItemTokenAllocator {
    /// Start allocating tokens for `session`.
    pub fn new(session: u64) -> Self {
        Self {
            session,
            next: AtomicU64::new(0),
        }
    }

    /// Session id of every token handed out.
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Allocate the next token.
    pub fn next_token(&self) -> ItemToken {
        ItemToken {
            session: self.session,
            sequence: self.next.fetch_add(1, Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Source attribution attached to replies and, after merging, to items.
pub struct CompletionSourceInfo {
    /// Source name (e.g. `"LSP"`).
    pub name: String,
    /// Merge priority; higher sorts first.
    pub priority: i32,
    /// Icon used for items that do not carry their own.
    pub fallback_icon: Option<String>,
}

impl CompletionSourceInfo {
    /// Create source info without a fallback icon.
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            fallback_icon: None,
        }
    }

    /// Set the fallback icon.
    pub fn with_fallback_icon(mut self, icon: impl Into<String>) -> Self {
        self.fallback_icon = Some(icon.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One completion candidate.
pub struct CompletionItem {
    /// Text shown in the list.
    pub label: String,
    /// Text inserted on accept.
    pub insert_text: String,
    /// Item kind, if the source reported one.
    pub kind: Option<CompletionItemKind>,
    /// Short detail line (absent until resolved, unless the server sent it eagerly).
    pub detail: Option<String>,
    /// Documentation (absent until resolved, unless the server sent it eagerly).
    pub documentation: Option<Documentation>,
    /// Attributed source, set by the merger.
    pub source: Option<CompletionSourceInfo>,
    /// Icon name.
    pub icon: Option<String>,
    /// URI of the virtual document the item was requested for.
    pub document_uri: String,
    /// The raw LSP item, as sent back for resolution.
    pub raw: Value,
    /// Identity of this item.
    pub token: ItemToken,
    resolved: bool,
}

impl CompletionItem {
    /// Create a plain item (not backed by an LSP payload).
    pub fn new(label: impl Into<String>, insert_text: impl Into<String>, token: ItemToken) -> Self {
        Self {
            label: label.into(),
            insert_text: insert_text.into(),
            kind: None,
            detail: None,
            documentation: None,
            source: None,
            icon: None,
            document_uri: String::new(),
            raw: Value::Null,
            token,
            resolved: false,
        }
    }

    /// Build an item from a raw LSP `CompletionItem`. Returns `None` if it has no label.
    pub fn from_lsp(
        raw: Value,
        document_uri: &str,
        token: ItemToken,
        icons: &dyn IconTheme,
    ) -> Option<Self> {
        let label = raw.get("label")?.as_str()?.to_string();
        let insert_text = raw
            .get("insertText")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| label.clone());
        let kind = raw
            .get("kind")
            .and_then(Value::as_u64)
            .and_then(CompletionItemKind::from_u64);
        let detail = raw
            .get("detail")
            .and_then(Value::as_str)
            .map(|s| s.to_string());
        let documentation = raw.get("documentation").and_then(Documentation::from_value);
        let resolved = detail.is_some() || documentation.is_some();

        Some(Self {
            label,
            insert_text,
            kind,
            detail,
            documentation,
            source: None,
            icon: icons.icon_for(kind),
            document_uri: document_uri.to_string(),
            raw,
            token,
            resolved,
        })
    }

    /// Returns `true` once detail or documentation is available.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Returns `true` if the item can be sent to a server for resolution.
    pub fn supports_resolution(&self) -> bool {
        !self.raw.is_null()
    }

    /// Copy of this item with the fields of a resolved LSP item merged in.
    pub fn with_resolution(&self, resolved: &Value) -> Self {
        let mut item = self.clone();
        if let Some(detail) = resolved.get("detail").and_then(Value::as_str) {
            item.detail = Some(detail.to_string());
        }
        if let Some(documentation) = resolved.get("documentation").and_then(Documentation::from_value)
        {
            item.documentation = Some(documentation);
        }
        item.raw = resolved.clone();
        item.resolved = true;
        item
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Items of one source (or of a merge) together with the span they replace.
pub struct CompletionReply {
    /// Start of the replaced span (editor-local).
    pub start: EditorPosition,
    /// End of the replaced span (editor-local).
    pub end: EditorPosition,
    /// Candidates.
    pub items: Vec<CompletionItem>,
    /// Producing source; `None` after merging.
    pub source: Option<CompletionSourceInfo>,
}

impl CompletionReply {
    /// An empty reply with a collapsed span at `position`.
    pub fn empty_at(position: EditorPosition) -> Self {
        Self {
            start: position,
            end: position,
            items: Vec::new(),
            source: None,
        }
    }

    /// Merge priority of the producing source (`0` when unattributed).
    pub fn priority(&self) -> i32 {
        self.source.as_ref().map(|s| s.priority).unwrap_or(0)
    }
}
