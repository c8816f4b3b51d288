use std::collections::BTreeSet;

use log::{debug, warn};

use crate::markup::{parse_markup, MarkupTree};
use crate::reconcile::lists::LIST_TAGS;

pub type TagAllowList = BTreeSet<String>;

/// Implicit document containers; never unwrapped.
const STRUCTURAL_SENTINELS: [&str; 2] = ["html", "body"];

pub fn allowed_tags(reference: &MarkupTree) -> TagAllowList {
    reference
        .elements()
        .into_iter()
        .filter_map(|id| reference.tag(id).map(str::to_string))
        .collect()
}

pub fn allowed_tags_from_markup(reference: Option<&str>) -> TagAllowList {
    allowed_tags(&parse_markup(reference))
}

fn is_permitted(tag: &str, allowed: &TagAllowList) -> bool {
    if allowed.contains(tag) || STRUCTURAL_SENTINELS.contains(&tag) {
        return true;
    }
    // Ordered and unordered lists stand in for each other; list alignment fixes the type.
    LIST_TAGS.contains(&tag) && LIST_TAGS.iter().any(|t| allowed.contains(*t))
}

/// Unwraps every element whose tag is not permitted, repeating until nothing is left to unwrap
/// or `max_passes` is reached. Returns the number of unwrapped elements.
pub fn remove_disallowed_tags(
    candidate: &mut MarkupTree,
    allowed: &TagAllowList,
    max_passes: usize,
) -> usize {
    let mut unwrapped = 0usize;
    for _ in 0..max_passes.max(1) {
        let victims: Vec<_> = candidate
            .elements()
            .into_iter()
            .filter(|&id| candidate.tag(id).is_some_and(|t| !is_permitted(t, allowed)))
            .collect();
        if victims.is_empty() {
            return unwrapped;
        }
        for id in victims {
            if let Some(tag) = candidate.tag(id) {
                debug!("unwrap disallowed <{tag}>");
            }
            candidate.unwrap_node(id);
            unwrapped += 1;
        }
    }
    let leftover = candidate
        .elements()
        .into_iter()
        .filter(|&id| candidate.tag(id).is_some_and(|t| !is_permitted(t, allowed)))
        .count();
    if leftover > 0 {
        warn!("tag cleanup stopped after {max_passes} passes with {leftover} disallowed element(s) left");
    }
    unwrapped
}

/// Deletes `<br>` elements when the reference never used them. Returns the number removed.
pub fn strip_line_breaks(candidate: &mut MarkupTree, allowed: &TagAllowList) -> usize {
    if allowed.contains("br") {
        return 0;
    }
    let breaks = candidate.find_all(candidate.root(), &["br"]);
    for &br in &breaks {
        candidate.delete_node(br);
    }
    breaks.len()
}
