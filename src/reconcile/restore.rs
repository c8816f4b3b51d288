use log::{debug, warn};

use crate::markup::{MarkupTree, NodeId, NodeKind};
use crate::textutil::extract_segments;

pub const TARGET_TAGS: [&str; 9] = ["h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "blockquote"];

/// Rebuilds a degraded candidate from the reference skeleton: the reference tree is cloned and
/// its text-bearing blocks are refilled, in order, with text segments taken from the candidate.
/// Blocks left over once the segments run out keep the reference text.
pub fn restore_structure(reference: &MarkupTree, candidate: &MarkupTree) -> MarkupTree {
    let mut restored = reference.clone();
    let segments = extract_segments(candidate);
    if segments.is_empty() {
        warn!("no translated text to restore from; keeping reference text");
        return restored;
    }

    let targets = fill_targets(&restored);
    if segments.len() > targets.len() {
        debug!(
            "{} translated segment(s) have no target block",
            segments.len() - targets.len()
        );
    } else if segments.len() < targets.len() {
        debug!(
            "{} target block(s) keep reference text",
            targets.len() - segments.len()
        );
    }

    for (target, segment) in targets.iter().zip(segments.iter()) {
        match *target {
            FillTarget::Block(block) => match sole_anchor(&restored, block) {
                Some(anchor) => restored.replace_children_with_text(anchor, segment),
                None => restored.replace_children_with_text(block, segment),
            },
            FillTarget::Lead(block) => replace_leading_run(&mut restored, block, segment),
        }
    }
    restored
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FillTarget {
    /// Block without nested targets; its whole content is replaced.
    Block(NodeId),
    /// Block with nested targets; only the content before the first nested target is replaced.
    Lead(NodeId),
}

/// Target blocks in document order. A block that contains another target block is filled
/// through that descendant, plus its own leading text when it has any.
fn fill_targets(tree: &MarkupTree) -> Vec<FillTarget> {
    let mut out = Vec::new();
    for t in tree.find_all(tree.root(), &TARGET_TAGS) {
        if tree.find_all(t, &TARGET_TAGS).is_empty() {
            out.push(FillTarget::Block(t));
        } else if leading_run(tree, t)
            .iter()
            .any(|&c| !tree.text_content(c).trim().is_empty())
        {
            debug!("mixed block <{}> gets its leading text filled", tree.tag(t).unwrap_or_default());
            out.push(FillTarget::Lead(t));
        }
    }
    out
}

/// Direct children of `block` before the first child that is or holds a target.
fn leading_run(tree: &MarkupTree, block: NodeId) -> Vec<NodeId> {
    tree.children(block)
        .iter()
        .copied()
        .take_while(|&c| {
            !tree.tag(c).is_some_and(|t| TARGET_TAGS.contains(&t))
                && tree.find_all(c, &TARGET_TAGS).is_empty()
        })
        .collect()
}

fn replace_leading_run(tree: &mut MarkupTree, block: NodeId, segment: &str) {
    let run = leading_run(tree, block);
    let Some(&first) = run.first() else {
        return;
    };
    let text = tree.create_text(segment);
    tree.insert_before(first, text);
    for n in run {
        tree.delete_node(n);
    }
}

/// The anchor, when a block's only content is one `<a>` surrounded by whitespace.
fn sole_anchor(tree: &MarkupTree, target: NodeId) -> Option<NodeId> {
    let mut anchor = None;
    for &c in tree.children(target) {
        match tree.kind(c) {
            NodeKind::Text(t) if t.trim().is_empty() => {}
            NodeKind::Element { tag, .. } if tag == "a" && anchor.is_none() => anchor = Some(c),
            _ => return None,
        }
    }
    anchor
}
