use sha2::{Digest, Sha256};

use crate::markup::tree::{MarkupTree, NodeId};

/// SHA-256 over the element skeleton (tag names and depths, pre-order). Text, comments and
/// attributes do not contribute, so a faithful translation hashes like its reference.
pub fn skeleton_digest(tree: &MarkupTree) -> String {
    let mut hasher = Sha256::new();
    let mut stack: Vec<(NodeId, usize)> = tree
        .children(tree.root())
        .iter()
        .rev()
        .map(|&c| (c, 0))
        .collect();
    while let Some((id, depth)) = stack.pop() {
        let Some(tag) = tree.tag(id) else {
            continue;
        };
        hasher.update(b"S:");
        hasher.update(depth.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(tag.as_bytes());
        hasher.update(b"\n");
        stack.extend(tree.children(id).iter().rev().map(|&c| (c, depth + 1)));
    }
    hex::encode(hasher.finalize())
}
