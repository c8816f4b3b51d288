use once_cell::sync::Lazy;
use regex::Regex;

use crate::markup::MarkupTree;

static BLANK_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t\r]*\n").expect("blank line regex"));
static NUMBERED_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\d{1,3}[.)][ \t]+").expect("numbered marker regex"));
static SENTENCE_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?…。！？]+[\s]+").expect("sentence end regex"));

/// Ordered, non-empty, trimmed text segments of a translated fragment, for refilling a
/// reference skeleton. Strategies are tried in order and the first one that yields more than
/// one segment wins; otherwise the last strategy's result is returned.
pub fn extract_segments(tree: &MarkupTree) -> Vec<String> {
    let by_node = text_node_segments(tree);
    if by_node.len() > 1 {
        return by_node;
    }

    let flattened = tree.text_with_separator(tree.root(), "\n");
    let by_block = block_segments(&flattened);
    let by_line = line_segments(&flattened);
    let layout = if by_line.len() > by_block.len() {
        by_line
    } else {
        by_block
    };
    if layout.len() > 1 {
        return layout;
    }

    sentence_segments(&text_node_segments(tree).join(" "))
}

/// Stripped content of every non-blank text node, in document order.
pub fn text_node_segments(tree: &MarkupTree) -> Vec<String> {
    tree.text_nodes(tree.root())
        .into_iter()
        .filter_map(|id| tree.text(id))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits on blank lines and in front of numbered-list markers (`1.`, `2)`, ...).
pub fn block_segments(text: &str) -> Vec<String> {
    BLANK_LINE_RE
        .split(text)
        .flat_map(|block| split_before_matches(block, &NUMBERED_MARKER_RE))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn line_segments(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits after sentence-ending punctuation that is followed by whitespace. The punctuation
/// stays with its sentence.
pub fn sentence_segments(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0usize;
    for m in SENTENCE_END_RE.find_iter(text) {
        let punct_end = m.as_str().trim_end().len() + m.start();
        push_trimmed(&mut out, &text[start..punct_end]);
        start = m.end();
    }
    push_trimmed(&mut out, &text[start..]);
    out
}

fn split_before_matches<'a>(text: &'a str, re: &Regex) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0usize;
    for m in re.find_iter(text) {
        if m.start() > start {
            parts.push(&text[start..m.start()]);
            start = m.start();
        }
    }
    parts.push(&text[start..]);
    parts
}

fn push_trimmed(out: &mut Vec<String>, s: &str) {
    let s = s.trim();
    if !s.is_empty() {
        out.push(s.to_string());
    }
}
