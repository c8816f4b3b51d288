use log::debug;

use crate::markup::{MarkupTree, NodeId, NodeKind};

pub const LIST_TAGS: [&str; 2] = ["ul", "ol"];

const LIST_ATTRS: [&str; 5] = ["type", "start", "reversed", "class", "style"];
const ITEM_ATTRS: [&str; 2] = ["class", "style"];
const BLOCK_TAGS: [&str; 15] = [
    "ul", "ol", "p", "div", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6", "table", "pre",
    "section", "figure",
];

/// Forces every candidate list to mirror the reference list at the same position (document
/// order, any depth): list type, structural attributes, item count, item attributes and the
/// `<li><p>` wrapping. Candidate lists without a positional partner are removed, and list items
/// left outside of any list are unwrapped.
pub fn align_lists(reference: &MarkupTree, candidate: &mut MarkupTree) {
    let ref_lists = reference.find_all(reference.root(), &LIST_TAGS);
    let mut cand_lists = candidate.find_all(candidate.root(), &LIST_TAGS);

    if cand_lists.len() > ref_lists.len() {
        debug!(
            "drop {} list(s) absent from reference",
            cand_lists.len() - ref_lists.len()
        );
        for &extra in &cand_lists[ref_lists.len()..] {
            candidate.delete_node(extra);
        }
        cand_lists = candidate.find_all(candidate.root(), &LIST_TAGS);
    }

    for (index, &list) in cand_lists.iter().enumerate() {
        if !candidate.is_attached(list) {
            continue;
        }
        match ref_lists.get(index) {
            Some(&ref_list) => align_list(reference, ref_list, candidate, list),
            None => candidate.delete_node(list),
        }
    }

    unwrap_orphan_items(candidate);
}

fn align_list(reference: &MarkupTree, ref_list: NodeId, candidate: &mut MarkupTree, list: NodeId) {
    if let Some(ref_tag) = reference.tag(ref_list) {
        if candidate.tag(list) != Some(ref_tag) {
            debug!("list type {:?} -> {ref_tag}", candidate.tag(list));
            candidate.rename(list, ref_tag);
        }
    }
    copy_attrs(reference, ref_list, candidate, list, &LIST_ATTRS);

    let ref_items = reference.child_elements(ref_list, "li");
    let desired_count = ref_items.len();

    for item in candidate.child_elements(list, "li") {
        let nested = misplaced_items(candidate, item);
        if nested.is_empty() {
            continue;
        }
        for n in nested {
            candidate.insert_before(item, n);
        }
        candidate.delete_node(item);
    }
    for item in candidate.child_elements(list, "li") {
        if candidate.text_content(item).trim().is_empty() {
            candidate.delete_node(item);
        }
    }

    let mut items = candidate.child_elements(list, "li");
    if items.len() > desired_count {
        for &extra in &items[desired_count..] {
            candidate.delete_node(extra);
        }
        items.truncate(desired_count);
    }
    while items.len() < desired_count {
        let placeholder = candidate.create_element("li");
        candidate.append(list, placeholder);
        items.push(placeholder);
    }

    for (&item, &ref_item) in items.iter().zip(ref_items.iter()) {
        copy_attrs(reference, ref_item, candidate, item, &ITEM_ATTRS);
        let wants_paragraph = reference
            .children(ref_item)
            .iter()
            .any(|&c| reference.has_tag(c, "p"));
        let has_paragraph = candidate
            .children(item)
            .iter()
            .any(|&c| candidate.has_tag(c, "p"));
        if wants_paragraph && !has_paragraph {
            wrap_leading_phrasing(candidate, item);
        }
    }
}

/// Wraps the item's leading inline run in `<p>`, stopping at the first block child so the
/// result survives a re-parse unchanged. Items with no leading content are left alone.
fn wrap_leading_phrasing(tree: &mut MarkupTree, item: NodeId) {
    let run: Vec<NodeId> = tree
        .children(item)
        .iter()
        .copied()
        .take_while(|&c| !tree.tag(c).is_some_and(|t| BLOCK_TAGS.contains(&t)))
        .collect();
    let has_content = run.iter().any(|&c| match tree.kind(c) {
        NodeKind::Text(t) => !t.trim().is_empty(),
        NodeKind::Element { .. } => true,
        NodeKind::Comment(_) | NodeKind::Container => false,
    });
    if has_content {
        tree.wrap_nodes(&run, "p");
    }
}

/// `<li>` elements nested inside `item` without an intervening list of their own.
fn misplaced_items(tree: &MarkupTree, item: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = tree.children(item).iter().rev().copied().collect();
    while let Some(n) = stack.pop() {
        if tree.tag(n).is_some_and(|t| LIST_TAGS.contains(&t)) {
            continue;
        }
        if tree.has_tag(n, "li") {
            out.push(n);
        }
        stack.extend(tree.children(n).iter().rev().copied());
    }
    out
}

fn copy_attrs(
    reference: &MarkupTree,
    from: NodeId,
    candidate: &mut MarkupTree,
    to: NodeId,
    names: &[&str],
) {
    for name in names {
        match reference.attr(from, name) {
            Some(value) => candidate.set_attr(to, name, value),
            None => candidate.remove_attr(to, name),
        }
    }
}

fn unwrap_orphan_items(candidate: &mut MarkupTree) {
    for item in candidate.find_all(candidate.root(), &["li"]) {
        let in_list = candidate
            .parent(item)
            .and_then(|p| candidate.tag(p))
            .is_some_and(|t| LIST_TAGS.contains(&t));
        if !in_list {
            candidate.unwrap_node(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::align_lists;
    use crate::markup::{parse_markup, serialize_fragment};

    fn align(reference: &str, candidate: &str) -> String {
        let reference = parse_markup(Some(reference));
        let mut candidate = parse_markup(Some(candidate));
        align_lists(&reference, &mut candidate);
        serialize_fragment(&candidate)
    }

    #[test]
    fn forces_list_type_and_attributes() {
        let out = align(
            r#"<ol start="3" class="steps"><li>One</li></ol>"#,
            r#"<ul style="color:red" class="x"><li>Un</li></ul>"#,
        );
        assert_eq!(out, r#"<ol class="steps" start="3"><li>Un</li></ol>"#);
    }

    #[test]
    fn trims_and_pads_item_count() {
        assert_eq!(
            align("<ul><li>a</li><li>b</li></ul>", "<ul><li>1</li><li>2</li><li>3</li></ul>"),
            "<ul><li>1</li><li>2</li></ul>"
        );
        assert_eq!(
            align("<ul><li>a</li><li>b</li><li>c</li></ul>", "<ul><li>1</li></ul>"),
            "<ul><li>1</li><li></li><li></li></ul>"
        );
    }

    #[test]
    fn drops_lists_without_reference_partner() {
        let out = align(
            "<ul><li>a</li></ul>",
            "<ul><li>1</li></ul><p>x</p><ol><li>2</li></ol>",
        );
        assert_eq!(out, "<ul><li>1</li></ul><p>x</p>");
    }

    #[test]
    fn removes_empty_items_before_padding() {
        let out = align(
            "<ul><li>a</li><li>b</li></ul>",
            "<ul><li> </li><li>1</li><li>2</li></ul>",
        );
        assert_eq!(out, "<ul><li>1</li><li>2</li></ul>");
    }

    #[test]
    fn promotes_items_nested_by_translation() {
        let out = align(
            "<ul><li>a</li><li>b</li></ul>",
            "<ul><li><section><li>1</li><li>2</li></section></li></ul>",
        );
        assert_eq!(out, "<ul><li>1</li><li>2</li></ul>");
    }

    #[test]
    fn keeps_real_sub_lists() {
        let out = align(
            "<ul><li>a<ul><li>b</li></ul></li></ul>",
            "<ul><li>1<ul><li>2</li></ul></li></ul>",
        );
        assert_eq!(out, "<ul><li>1<ul><li>2</li></ul></li></ul>");
    }

    #[test]
    fn copies_item_attributes_and_paragraph_wrapping() {
        let out = align(
            r#"<ul><li class="k"><p>a</p></li></ul>"#,
            r#"<ul><li style="x">Un <em>deux</em></li></ul>"#,
        );
        assert_eq!(out, r#"<ul><li class="k"><p>Un <em>deux</em></p></li></ul>"#);
    }

    #[test]
    fn paragraph_wrap_stops_at_sub_list() {
        let reference = parse_markup(Some("<ul><li><p>a</p><ul><li>b</li></ul></li></ul>"));
        let mut candidate = parse_markup(Some("<ul><li>1<ul><li>2</li></ul></li></ul>"));
        align_lists(&reference, &mut candidate);
        let first = serialize_fragment(&candidate);
        assert_eq!(first, "<ul><li><p>1</p><ul><li>2</li></ul></li></ul>");

        let mut reparsed = parse_markup(Some(first.as_str()));
        assert_eq!(serialize_fragment(&reparsed), first);
        align_lists(&reference, &mut reparsed);
        assert_eq!(serialize_fragment(&reparsed), first);
    }

    #[test]
    fn unwraps_orphan_items() {
        let out = align("<ul><li>a</li></ul>", "<ul><li>1</li></ul><li>Extra</li>");
        assert_eq!(out, "<ul><li>1</li></ul>Extra");
    }

    #[test]
    fn alignment_is_idempotent() {
        let reference = parse_markup(Some(
            r#"<ol class="c"><li><p>a</p></li><li><p>b</p></li><li><p>c</p></li></ol><ul><li>x</li></ul>"#,
        ));
        let candidate = r#"<ul><li>1</li><li></li></ul><ul><li>y</li><li>z</li></ul><ol><li>extra</li></ol>"#;
        let mut once = parse_markup(Some(candidate));
        align_lists(&reference, &mut once);
        let first = serialize_fragment(&once);
        align_lists(&reference, &mut once);
        assert_eq!(serialize_fragment(&once), first);
        let mut reparsed = parse_markup(Some(first.as_str()));
        align_lists(&reference, &mut reparsed);
        assert_eq!(serialize_fragment(&reparsed), first);
    }
}
