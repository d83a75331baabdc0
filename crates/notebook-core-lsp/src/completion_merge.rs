//! Multi-source completion reply merging.
//!
//! Replies from several sources are combined into one list with a single span:
//!
//! 1. failed and empty replies are dropped
//! 2. replies are ordered by descending source priority (stable, ties keep arrival order)
//! 3. the span is `{ max(start), min(end) }`; replies starting before `max(start)` have the
//!    text between their start and `max(start)` stripped from their insert texts
//! 4. items are flattened in that order, dropping any whose trimmed insert text was already seen
//! 5. surviving items are attributed to their source and get its fallback icon

use crate::error::CompletionError;
use crate::lsp_completion::{CompletionItem, CompletionReply};
use notebook_core::EditorPosition;
use notebook_core::text::utf16_slice;
use std::cmp::Reverse;
use std::collections::HashSet;

/// Merge per-source replies into one.
///
/// `current_line` is the text of the cursor line read right before merging (not when the
/// requests were issued). When it is `None`, prefixes are left in place.
pub fn merge_replies(
    replies: Vec<Result<CompletionReply, CompletionError>>,
    cursor: EditorPosition,
    current_line: Option<&str>,
) -> CompletionReply {
    let mut replies: Vec<CompletionReply> = replies
        .into_iter()
        .filter_map(|reply| match reply {
            Ok(reply) if reply.items.is_empty() => None,
            Ok(reply) => Some(reply),
            Err(err) => {
                tracing::debug!(%err, "dropping failed completion reply");
                None
            }
        })
        .collect();

    if replies.is_empty() {
        return CompletionReply::empty_at(cursor);
    }

    replies.sort_by_key(|reply| Reverse(reply.priority()));

    let min_end = replies.iter().map(|r| r.end).min().unwrap_or(cursor);
    let min_start = replies.iter().map(|r| r.start).min().unwrap_or(cursor);
    let max_start = replies.iter().map(|r| r.start).max().unwrap_or(cursor);

    if min_start != max_start {
        match current_line {
            Some(line) => {
                for reply in &mut replies {
                    strip_prefix(reply, max_start, line);
                }
            }
            None => tracing::debug!(
                line = cursor.line,
                "could not remove prefixes: line is unavailable"
            ),
        }
    }

    let mut seen = HashSet::new();
    let mut items: Vec<CompletionItem> = Vec::new();
    for reply in replies {
        let source = reply.source;
        for mut item in reply.items {
            if !seen.insert(item.insert_text.trim().to_string()) {
                continue;
            }
            if let Some(source) = &source {
                if item.icon.is_none() {
                    item.icon = source.fallback_icon.clone();
                }
                item.source = Some(source.clone());
            }
            items.push(item);
        }
    }
    tracing::debug!(count = items.len(), "merged completion replies");

    let mut end = min_end;
    if max_start > end {
        tracing::warn!(start = %max_start, %end, "merged completion span is inverted; clamping");
        end = max_start;
    }

    CompletionReply {
        start: max_start,
        end,
        items,
        source: None,
    }
}

fn strip_prefix(reply: &mut CompletionReply, max_start: EditorPosition, line: &str) {
    if reply.start == max_start {
        return;
    }
    let source = reply.source.as_ref().map(|s| s.name.as_str()).unwrap_or("");
    if reply.start.line != max_start.line {
        tracing::debug!(source, "reply starts on another line; prefix left in place");
        return;
    }
    let Some(prefix) = utf16_slice(line, reply.start.character, max_start.character) else {
        tracing::debug!(source, "prefix lies outside the current line; left in place");
        return;
    };
    tracing::debug!(source, prefix, "removing prefix");
    for item in &mut reply.items {
        if let Some(rest) = item.insert_text.strip_prefix(prefix) {
            item.insert_text = rest.to_string();
        }
    }
}
