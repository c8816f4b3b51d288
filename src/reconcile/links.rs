use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::lookup::AddressLookup;
use crate::markup::MarkupTree;

// RFC 3986 appendix B, with scheme+authority kept together as an opaque head.
static HREF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(?P<head>(?:[A-Za-z][A-Za-z0-9+.\-]*:)?(?://[^/?#]*)?)(?P<path>[^?#]*)(?P<tail>.*)$")
        .expect("href regex")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HrefParts<'a> {
    /// Scheme and authority (`https://host`), possibly empty.
    pub head: &'a str,
    pub path: &'a str,
    /// Query and fragment (`?a=1#x`), possibly empty.
    pub tail: &'a str,
}

pub fn split_href(href: &str) -> Option<HrefParts<'_>> {
    let caps = HREF_RE.captures(href)?;
    Some(HrefParts {
        head: caps.name("head").map_or("", |m| m.as_str()),
        path: caps.name("path").map_or("", |m| m.as_str()),
        tail: caps.name("tail").map_or("", |m| m.as_str()),
    })
}

/// Replaces the first path segment found in `lookup`. `None` when nothing matched.
pub fn localize_path(path: &str, lookup: &AddressLookup) -> Option<String> {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let (idx, localized) = segments.iter().enumerate().find_map(|(i, seg)| {
        lookup
            .get(*seg)
            .filter(|v| !v.is_empty())
            .map(|v| (i, v.as_str()))
    })?;
    segments[idx] = localized;

    let mut out = format!("/{}", segments.join("/"));
    if path.ends_with('/') {
        out.push('/');
    }
    Some(out)
}

pub fn rewrite_href(href: &str, lookup: &AddressLookup) -> Option<String> {
    let parts = split_href(href)?;
    if parts.path.is_empty() {
        return None;
    }
    let path = localize_path(parts.path, lookup)?;
    Some(format!("{}{}{}", parts.head, path, parts.tail))
}

/// Points internal links at localized addresses. Returns the number of rewritten hrefs.
pub fn rewrite_internal_links(tree: &mut MarkupTree, lookup: &AddressLookup) -> usize {
    if lookup.is_empty() {
        return 0;
    }
    let mut rewritten = 0usize;
    for anchor in tree.find_all(tree.root(), &["a"]) {
        let Some(href) = tree.attr(anchor, "href").filter(|h| !h.is_empty()) else {
            continue;
        };
        if let Some(new_href) = rewrite_href(href, lookup) {
            debug!("rewrite href {href} -> {new_href}");
            tree.set_attr(anchor, "href", &new_href);
            rewritten += 1;
        }
    }
    rewritten
}
