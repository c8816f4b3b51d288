use crate::markup::tree::{MarkupTree, NodeId, NodeKind};

const VOID_ELEMENTS: [&str; 15] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: [&str; 8] = [
    "iframe",
    "noembed",
    "noframes",
    "noscript",
    "plaintext",
    "script",
    "style",
    "xmp",
];

/// Serializes the children of the tree root. The synthetic root itself has no markup, so the
/// result is always a bare fragment.
pub fn serialize_fragment(tree: &MarkupTree) -> String {
    let mut out = String::new();
    for &child in tree.children(tree.root()) {
        write_node(tree, child, false, &mut out);
    }
    out
}

fn write_node(tree: &MarkupTree, id: NodeId, raw_text: bool, out: &mut String) {
    match tree.kind(id) {
        NodeKind::Container => {
            for &c in tree.children(id) {
                write_node(tree, c, false, out);
            }
        }
        NodeKind::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                escape_text_into(out, text);
            }
        }
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::Element { tag, attrs } => {
            out.push('<');
            out.push_str(tag);
            for (k, v) in attrs {
                out.push(' ');
                out.push_str(k);
                out.push_str("=\"");
                escape_attr_into(out, v);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&tag.as_str());
            for &c in tree.children(id) {
                write_node(tree, c, raw, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn escape_text_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr_into(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::serialize_fragment;
    use crate::markup::parse::parse_markup;

    #[test]
    fn roundtrips_simple_fragment() {
        let src = r#"<p class="x">Hello &amp; <a href="/a?b=1&amp;c=2">bye</a></p><ul><li>One</li></ul>"#;
        let tree = parse_markup(Some(src));
        assert_eq!(serialize_fragment(&tree), src);
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        let tree = parse_markup(Some("<p>a<br>b<img src=\"x.png\"></p>"));
        assert_eq!(serialize_fragment(&tree), "<p>a<br>b<img src=\"x.png\"></p>");
    }

    #[test]
    fn escapes_text_and_quotes() {
        let tree = parse_markup(Some("<p title='say \"hi\"'>1 &lt; 2</p>"));
        assert_eq!(
            serialize_fragment(&tree),
            "<p title=\"say &quot;hi&quot;\">1 &lt; 2</p>"
        );
    }
}
