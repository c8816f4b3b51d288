pub type NodeId = usize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Synthetic fragment root. Never serialized.
    Container,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug)]
struct ArenaNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Owned markup fragment. Nodes live in one arena and refer to each other by index; a node
/// removed from the tree stays in the arena but is unreachable from the root.
#[derive(Clone, Debug)]
pub struct MarkupTree {
    nodes: Vec<ArenaNode>,
}

impl Default for MarkupTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupTree {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![ArenaNode {
                kind: NodeKind::Container,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id].kind, NodeKind::Element { .. })
    }

    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == Self::ROOT {
                return true;
            }
            match self.nodes[cur].parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.nodes[c].parent;
        }
        false
    }

    fn add(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(ArenaNode {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.add(NodeKind::Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
        })
    }

    pub fn create_element_with_attrs(&mut self, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.add(NodeKind::Element {
            tag: tag.to_string(),
            attrs,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.add(NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.add(NodeKind::Comment(text.to_string()))
    }

    /// Moves `child` (with its subtree) to the end of `parent`'s children.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        if self.is_ancestor_or_self(child, parent) {
            return;
        }
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// Moves `child` (with its subtree) right before `anchor` under `anchor`'s parent.
    pub fn insert_before(&mut self, anchor: NodeId, child: NodeId) {
        if child == anchor {
            return;
        }
        let Some(parent) = self.nodes[anchor].parent else {
            return;
        };
        if self.is_ancestor_or_self(child, parent) {
            return;
        }
        self.detach(child);
        let pos = self.nodes[parent]
            .children
            .iter()
            .position(|&c| c == anchor)
            .unwrap_or(self.nodes[parent].children.len());
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.insert(pos, child);
    }

    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|&c| c != id);
        }
    }

    /// Removes the node and its whole subtree from the tree.
    pub fn delete_node(&mut self, id: NodeId) {
        if id == Self::ROOT {
            self.clear_children(id);
            return;
        }
        self.detach(id);
    }

    /// Replaces the node with its children, in order, at the node's position.
    pub fn unwrap_node(&mut self, id: NodeId) {
        if id == Self::ROOT || self.nodes[id].parent.is_none() {
            return;
        }
        let children = std::mem::take(&mut self.nodes[id].children);
        for c in children {
            self.nodes[c].parent = None;
            self.insert_before(id, c);
        }
        self.detach(id);
    }

    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id].children);
        for c in children {
            self.nodes[c].parent = None;
        }
    }

    pub fn replace_children_with_text(&mut self, id: NodeId, text: &str) {
        self.clear_children(id);
        let t = self.create_text(text);
        self.append(id, t);
    }

    /// Moves `nodes` (consecutive siblings, in order) into a new `tag` element placed where the
    /// first of them was. `None` when `nodes` is empty or the first node is detached.
    pub fn wrap_nodes(&mut self, nodes: &[NodeId], tag: &str) -> Option<NodeId> {
        let &first = nodes.first()?;
        self.nodes[first].parent?;
        let wrapper = self.create_element(tag);
        self.insert_before(first, wrapper);
        for &n in nodes {
            self.append(wrapper, n);
        }
        Some(wrapper)
    }

    pub fn rename(&mut self, id: NodeId, new_tag: &str) {
        if let NodeKind::Element { tag, .. } = &mut self.nodes[id].kind {
            *tag = new_tag.to_string();
        }
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match &self.nodes[id].kind {
            NodeKind::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id].kind {
            for (k, v) in attrs.iter_mut() {
                if k == name {
                    *v = value.to_string();
                    return;
                }
            }
            attrs.push((name.to_string(), value.to_string()));
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id].kind {
            attrs.retain(|(k, _)| k != name);
        }
    }

    /// Pre-order (document order) list of every node below `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n].children.iter().rev().copied());
        }
        out
    }

    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.is_element(n))
            .collect()
    }

    pub fn elements(&self) -> Vec<NodeId> {
        self.descendant_elements(Self::ROOT)
    }

    pub fn element_count(&self) -> usize {
        self.elements().len()
    }

    /// Elements below `id` whose tag is one of `tags`, in document order.
    pub fn find_all(&self, id: NodeId, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.tag(n).is_some_and(|t| tags.contains(&t)))
            .collect()
    }

    pub fn child_elements(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .filter(|&c| self.has_tag(c, tag))
            .collect()
    }

    /// Text nodes below `id` (or `id` itself), in document order.
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if matches!(self.nodes[id].kind, NodeKind::Text(_)) {
            out.push(id);
        }
        out.extend(
            self.descendants(id)
                .into_iter()
                .filter(|&n| matches!(self.nodes[n].kind, NodeKind::Text(_))),
        );
        out
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Concatenated text of every text node below `id`, joined with `separator`.
    pub fn text_with_separator(&self, id: NodeId, separator: &str) -> String {
        self.text_nodes(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect::<Vec<_>>()
            .join(separator)
    }

    pub fn text_content(&self, id: NodeId) -> String {
        self.text_with_separator(id, "")
    }
}
