use notebook_core::EditorPosition;
use notebook_core_lsp::{
    CompletionError, CompletionItem, CompletionReply, CompletionSourceInfo, ItemTokenAllocator,
    merge_replies,
};
use pretty_assertions::assert_eq;

fn reply(
    tokens: &ItemTokenAllocator,
    source: Option<CompletionSourceInfo>,
    span: (u32, u32),
    texts: &[&str],
) -> CompletionReply {
    CompletionReply {
        start: EditorPosition::new(0, span.0),
        end: EditorPosition::new(0, span.1),
        items: texts
            .iter()
            .map(|text| CompletionItem::new(text.trim(), *text, tokens.next_token()))
            .collect(),
        source,
    }
}

fn insert_texts(reply: &CompletionReply) -> Vec<&str> {
    reply.items.iter().map(|i| i.insert_text.as_str()).collect()
}

fn sources(reply: &CompletionReply) -> Vec<&str> {
    reply
        .items
        .iter()
        .map(|i| i.source.as_ref().map(|s| s.name.as_str()).unwrap_or("-"))
        .collect()
}

#[test]
fn test_items_follow_descending_priority_with_stable_ties() {
    let tokens = ItemTokenAllocator::new(1);
    let replies = vec![
        Ok(reply(
            &tokens,
            Some(CompletionSourceInfo::new("kernel", 1)),
            (0, 2),
            &["ka", "kb"],
        )),
        Ok(reply(
            &tokens,
            Some(CompletionSourceInfo::new("LSP", 3)),
            (0, 2),
            &["la"],
        )),
        Ok(reply(
            &tokens,
            Some(CompletionSourceInfo::new("snippets", 1)),
            (0, 2),
            &["sa"],
        )),
    ];

    let merged = merge_replies(replies, EditorPosition::new(0, 2), Some("ab"));
    assert_eq!(insert_texts(&merged), vec!["la", "ka", "kb", "sa"]);
    assert_eq!(sources(&merged), vec!["LSP", "kernel", "kernel", "snippets"]);
    assert_eq!(merged.source, None);
}

#[test]
fn test_duplicates_keep_the_higher_priority_source() {
    let tokens = ItemTokenAllocator::new(1);
    let replies = vec![
        Ok(reply(
            &tokens,
            Some(CompletionSourceInfo::new("kernel", 1)),
            (0, 2),
            &["import"],
        )),
        Ok(reply(
            &tokens,
            Some(CompletionSourceInfo::new("LSP", 2)),
            (0, 2),
            &["import ", "imp"],
        )),
    ];

    let merged = merge_replies(replies, EditorPosition::new(0, 2), Some("im"));
    assert_eq!(insert_texts(&merged), vec!["import ", "imp"]);
    assert_eq!(sources(&merged), vec!["LSP", "LSP"]);
}

#[test]
fn test_wider_replies_are_aligned_to_the_latest_start() {
    let tokens = ItemTokenAllocator::new(1);
    let replies = vec![
        Ok(reply(
            &tokens,
            Some(CompletionSourceInfo::new("LSP", 2)),
            (5, 7),
            &["cdef"],
        )),
        Ok(reply(
            &tokens,
            Some(CompletionSourceInfo::new("kernel", 1)),
            (3, 7),
            &["abcdx", "zzz"],
        )),
    ];

    let merged = merge_replies(replies, EditorPosition::new(0, 7), Some("xyzabcd"));
    assert_eq!(merged.start, EditorPosition::new(0, 5));
    assert_eq!(merged.end, EditorPosition::new(0, 7));
    assert_eq!(insert_texts(&merged), vec!["cdef", "cdx", "zzz"]);
}

#[test]
fn test_prefixes_stay_when_the_line_is_unavailable() {
    let tokens = ItemTokenAllocator::new(1);
    let replies = vec![
        Ok(reply(
            &tokens,
            Some(CompletionSourceInfo::new("LSP", 2)),
            (5, 7),
            &["cdef"],
        )),
        Ok(reply(
            &tokens,
            Some(CompletionSourceInfo::new("kernel", 1)),
            (3, 7),
            &["abcdx"],
        )),
    ];

    let merged = merge_replies(replies, EditorPosition::new(0, 7), None);
    assert_eq!(merged.start, EditorPosition::new(0, 5));
    assert_eq!(insert_texts(&merged), vec!["cdef", "abcdx"]);
}

#[test]
fn test_single_source_merge_is_idempotent() {
    let tokens = ItemTokenAllocator::new(1);
    let single = reply(
        &tokens,
        Some(CompletionSourceInfo::new("LSP", 2)),
        (1, 4),
        &["display", "dispatch"],
    );

    let once = merge_replies(vec![Ok(single.clone())], EditorPosition::new(0, 4), Some("xdis"));
    assert_eq!((once.start, once.end), (single.start, single.end));
    assert_eq!(insert_texts(&once), insert_texts(&single));

    let again = merge_replies(vec![Ok(once.clone())], EditorPosition::new(0, 4), Some("xdis"));
    assert_eq!(again, once);
}

#[test]
fn test_failed_and_empty_replies_are_dropped() {
    let tokens = ItemTokenAllocator::new(1);
    let replies = vec![
        Err(CompletionError::Protocol("timeout".to_string())),
        Ok(reply(
            &tokens,
            Some(CompletionSourceInfo::new("kernel", 5)),
            (0, 0),
            &[],
        )),
        Ok(reply(
            &tokens,
            Some(CompletionSourceInfo::new("LSP", 2)),
            (2, 3),
            &["x"],
        )),
    ];

    let merged = merge_replies(replies, EditorPosition::new(0, 3), Some("abc"));
    // The empty reply's span does not take part in the span computation.
    assert_eq!(merged.start, EditorPosition::new(0, 2));
    assert_eq!(merged.end, EditorPosition::new(0, 3));
    assert_eq!(insert_texts(&merged), vec!["x"]);
}

#[test]
fn test_fallback_icon_only_fills_missing_icons() {
    let tokens = ItemTokenAllocator::new(1);
    let mut kernel = reply(
        &tokens,
        Some(CompletionSourceInfo::new("kernel", 1).with_fallback_icon("kernel-icon")),
        (0, 1),
        &["alpha", "beta"],
    );
    kernel.items[1].icon = Some("function".to_string());

    let merged = merge_replies(vec![Ok(kernel)], EditorPosition::new(0, 1), Some("a"));
    let icons: Vec<Option<&str>> = merged.items.iter().map(|i| i.icon.as_deref()).collect();
    assert_eq!(icons, vec![Some("kernel-icon"), Some("function")]);
}

#[test]
fn test_unattributed_replies_sort_last() {
    let tokens = ItemTokenAllocator::new(1);
    let replies = vec![
        Ok(reply(&tokens, None, (0, 1), &["anon"])),
        Ok(reply(
            &tokens,
            Some(CompletionSourceInfo::new("LSP", 2)),
            (0, 1),
            &["lsp"],
        )),
    ];

    let merged = merge_replies(replies, EditorPosition::new(0, 1), Some("a"));
    assert_eq!(insert_texts(&merged), vec!["lsp", "anon"]);
    assert_eq!(sources(&merged), vec!["LSP", "-"]);
}
