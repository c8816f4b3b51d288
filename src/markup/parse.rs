use html5ever::tendril::TendrilSink;
use html5ever::{parse_fragment, Attribute, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::markup::tree::{MarkupTree, NodeId};

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Parses an HTML fragment (as if it were the content of `<body>`) into an owned tree.
///
/// Parsing never fails: the HTML tree-construction rules recover from unclosed tags, stray
/// end tags and bare text. `None`/empty input yields an empty tree.
pub fn parse_markup(markup: Option<&str>) -> MarkupTree {
    let mut tree = MarkupTree::new();
    let markup = markup.unwrap_or("");
    if markup.is_empty() {
        return tree;
    }

    let context = QualName::new(None, Namespace::from(HTML_NS), LocalName::from("body"));
    let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new()).one(markup);

    // The fragment algorithm hangs everything below a synthetic <html> element.
    let root = tree.root();
    let top: Vec<Handle> = dom.document.children.borrow().iter().cloned().collect();
    for handle in top {
        let is_fragment_root = matches!(
            &handle.data,
            NodeData::Element { name, .. } if &*name.local == "html"
        );
        if is_fragment_root {
            let children: Vec<Handle> = handle.children.borrow().iter().cloned().collect();
            for child in children {
                import_subtree(&mut tree, root, child);
            }
        } else {
            import_subtree(&mut tree, root, handle);
        }
    }
    tree
}

fn import_subtree(tree: &mut MarkupTree, parent: NodeId, handle: Handle) {
    let mut stack: Vec<(Handle, NodeId)> = vec![(handle, parent)];
    while let Some((node, parent)) = stack.pop() {
        let id = match &node.data {
            NodeData::Element { name, attrs, .. } => {
                let attrs = collect_attrs(&attrs.borrow());
                tree.create_element_with_attrs(&name.local, attrs)
            }
            NodeData::Text { contents } => tree.create_text(&contents.borrow()),
            NodeData::Comment { contents } => tree.create_comment(contents),
            NodeData::Document
            | NodeData::Doctype { .. }
            | NodeData::ProcessingInstruction { .. } => continue,
        };
        tree.append(parent, id);
        let children: Vec<Handle> = node.children.borrow().iter().cloned().collect();
        // Reverse so the stack pops children in document order.
        for child in children.into_iter().rev() {
            stack.push((child, id));
        }
    }
}

fn collect_attrs(attrs: &[Attribute]) -> Vec<(String, String)> {
    attrs
        .iter()
        .map(|a| {
            let key = match &a.name.prefix {
                Some(prefix) => format!("{}:{}", prefix, a.name.local),
                None => a.name.local.to_string(),
            };
            (key, a.value.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_markup;
    use crate::markup::tree::NodeKind;

    #[test]
    fn parses_fragment_without_wrapper() {
        let tree = parse_markup(Some("<p>Hello <b>world</b></p><ul><li>One</li></ul>"));
        let top = tree.children(tree.root());
        assert_eq!(top.len(), 2);
        assert_eq!(tree.tag(top[0]), Some("p"));
        assert_eq!(tree.tag(top[1]), Some("ul"));
        assert_eq!(tree.text_content(top[0]), "Hello world");
        assert!(tree.find_all(tree.root(), &["html", "body"]).is_empty());
    }

    #[test]
    fn empty_and_missing_input_give_empty_tree() {
        assert_eq!(parse_markup(None).element_count(), 0);
        assert!(parse_markup(Some("")).children(0).is_empty());
    }

    #[test]
    fn recovers_from_malformed_markup() {
        let tree = parse_markup(Some("<p>open <em>never closed</p></div>tail"));
        assert_eq!(tree.text_content(tree.root()), "open never closedtail");
        assert!(!tree.find_all(tree.root(), &["p"]).is_empty());
    }

    #[test]
    fn keeps_attributes_and_comments() {
        let tree = parse_markup(Some(r#"<!-- note --><a href="/x/" class="c">t</a>"#));
        let top = tree.children(tree.root());
        assert!(matches!(tree.kind(top[0]), NodeKind::Comment(c) if c == " note "));
        assert_eq!(tree.attr(top[1], "href"), Some("/x/"));
        assert_eq!(tree.attr(top[1], "class"), Some("c"));
    }
}
