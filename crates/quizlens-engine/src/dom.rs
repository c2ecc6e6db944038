//! Owned arena model of the hosting page.
//!
//! The engine never owns live browser nodes; it works on a parsed snapshot
//! addressed by `NodeId` index handles. Handles are weak back-references into
//! the arena: cheap to copy, never owning, and safe to keep in `Candidate` /
//! `MatchResult` for the duration of one run.
//!
//! Layout geometry cannot be derived from markup, so rects are optional
//! per-node data supplied by the host (tests set them explicitly).

use std::collections::BTreeMap;

use quizlens_core::{Error, Result};

/// Weak back-reference to a node in a `Document` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// Layout rectangle in CSS pixels, as the host would report it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Element {
        name: String,
        attrs: BTreeMap<String, String>,
        rect: Option<Rect>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    origin: Option<url::Url>,
}

impl Document {
    /// Parse an HTML document into the arena. Never fails: the parser is
    /// error-recovering, and a page we cannot make sense of just yields
    /// fewer nodes.
    pub fn parse(html: &str) -> Self {
        let parsed = html_scraper::Html::parse_document(html);
        let mut doc = Document {
            nodes: Vec::new(),
            root: NodeId(0),
            origin: None,
        };
        let root = doc.push(None, NodeData::Element {
            name: "#document".to_string(),
            attrs: BTreeMap::new(),
            rect: None,
        });
        doc.root = root;
        for child in parsed.tree.root().children() {
            doc.convert(root, child);
        }
        doc
    }

    /// Parse with a page origin used for relative-URL resolution and
    /// `getPageInfo`.
    pub fn parse_with_origin(html: &str, origin: &str) -> Result<Self> {
        let origin = url::Url::parse(origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let mut doc = Self::parse(html);
        doc.origin = Some(origin);
        Ok(doc)
    }

    fn convert(&mut self, parent: NodeId, node: ego_tree::NodeRef<'_, html_scraper::Node>) {
        match node.value() {
            html_scraper::Node::Element(el) => {
                let mut attrs = BTreeMap::new();
                for (k, v) in el.attrs() {
                    attrs.insert(k.to_string(), v.to_string());
                }
                let id = self.push(Some(parent), NodeData::Element {
                    name: el.name().to_ascii_lowercase(),
                    attrs,
                    rect: None,
                });
                for child in node.children() {
                    self.convert(id, child);
                }
            }
            html_scraper::Node::Text(t) => {
                let s = t.to_string();
                if !s.trim().is_empty() {
                    self.push(Some(parent), NodeData::Text(s));
                }
            }
            _ => {}
        }
    }

    fn push(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            data,
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn origin(&self) -> Option<&url::Url> {
        self.origin.as_ref()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Ancestors from the immediate parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            out.push(p);
            cur = self.parent(p);
        }
        out
    }

    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    /// Preorder (document-order) descendants of `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            for c in self.children(n).iter().rev() {
                stack.push(*c);
            }
        }
        out
    }

    /// All element nodes in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&n| self.is_element(n))
            .collect()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Element { .. })
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { name, .. } => Some(name),
            NodeData::Text(_) => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => attrs.get(name).map(|s| s.as_str()),
            NodeData::Text(_) => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &mut self.nodes[id.0].data {
            attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element { attrs, .. } = &mut self.nodes[id.0].data {
            attrs.remove(name);
        }
    }

    pub fn class_attr(&self, id: NodeId) -> &str {
        self.attr(id, "class").unwrap_or("")
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.class_attr(id).split_whitespace().any(|c| c == class)
    }

    /// Case-insensitive substring test over the whole class attribute,
    /// the `[class*=...]` analogue.
    pub fn class_contains(&self, id: NodeId, needle: &str) -> bool {
        self.class_attr(id).to_lowercase().contains(needle)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let cur = self.class_attr(id).to_string();
        let next = if cur.is_empty() {
            class.to_string()
        } else {
            format!("{cur} {class}")
        };
        self.set_attr(id, "class", &next);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let next = self
            .class_attr(id)
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        if next.is_empty() {
            self.remove_attr(id, "class");
        } else {
            self.set_attr(id, "class", &next);
        }
    }

    pub fn style_prop(&self, id: NodeId, prop: &str) -> Option<String> {
        parse_style(self.attr(id, "style").unwrap_or(""))
            .into_iter()
            .find(|(k, _)| k == prop)
            .map(|(_, v)| v)
    }

    pub fn set_style_prop(&mut self, id: NodeId, prop: &str, value: &str) {
        let mut props = parse_style(self.attr(id, "style").unwrap_or(""));
        match props.iter_mut().find(|(k, _)| k == prop) {
            Some(p) => p.1 = value.to_string(),
            None => props.push((prop.to_string(), value.to_string())),
        }
        self.set_attr(id, "style", &write_style(&props));
    }

    /// Removes one declaration, leaving every other inline style untouched.
    pub fn remove_style_prop(&mut self, id: NodeId, prop: &str) {
        let props: Vec<(String, String)> = parse_style(self.attr(id, "style").unwrap_or(""))
            .into_iter()
            .filter(|(k, _)| k != prop)
            .collect();
        if props.is_empty() {
            self.remove_attr(id, "style");
        } else {
            self.set_attr(id, "style", &write_style(&props));
        }
    }

    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        match &self.nodes[id.0].data {
            NodeData::Element { rect, .. } => *rect,
            NodeData::Text(_) => None,
        }
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) {
        if let NodeData::Element { rect: r, .. } = &mut self.nodes[id.0].data {
            *r = Some(rect);
        }
    }

    /// Concatenated text of the subtree rooted at `id` (including `id` when it
    /// is a text node), text nodes joined by single spaces.
    pub fn text(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        if let NodeData::Text(t) = &self.nodes[id.0].data {
            parts.push(t.trim().to_string());
        }
        for n in self.descendants(id) {
            if let NodeData::Text(t) = &self.nodes[n.0].data {
                let t = t.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
        }
        parts.join(" ")
    }

    /// Text of the first `<title>` element, if any.
    pub fn title(&self) -> Option<String> {
        self.elements()
            .into_iter()
            .find(|&n| self.tag(n) == Some("title"))
            .map(|n| self.text(n))
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(None, NodeData::Element {
            name: name.to_string(),
            attrs: BTreeMap::new(),
            rect: None,
        })
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(0, child);
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.push(Some(parent), NodeData::Text(text.to_string()));
        id
    }

    /// Unlink `id` from its parent. The slot in the arena is not reclaimed;
    /// a document lives for one page session and the waste is negligible.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(p) = self.nodes[id.0].parent.take() {
            self.nodes[p.0].children.retain(|c| *c != id);
        }
    }

    /// Swap `id` for a fresh text node at the same position under its parent.
    pub fn replace_with_text(&mut self, id: NodeId, text: &str) {
        let Some(parent) = self.nodes[id.0].parent else {
            return;
        };
        let new = self.push(None, NodeData::Text(text.to_string()));
        self.nodes[new.0].parent = Some(parent);
        if let Some(pos) = self.nodes[parent.0].children.iter().position(|c| *c == id) {
            self.nodes[parent.0].children[pos] = new;
        } else {
            self.nodes[parent.0].children.push(new);
        }
        self.nodes[id.0].parent = None;
    }

    /// Deep-copy the subtree rooted at `id` into an independent document.
    /// Mutating the copy never touches `self`; this backs the normalizer's
    /// copy-before-substitute step.
    pub fn clone_subtree(&self, id: NodeId) -> Document {
        let mut out = Document {
            nodes: Vec::new(),
            root: NodeId(0),
            origin: self.origin.clone(),
        };
        let root = out.push(None, self.nodes[id.0].data.clone());
        out.root = root;
        self.clone_children_into(id, root, &mut out);
        out
    }

    fn clone_children_into(&self, from: NodeId, to: NodeId, out: &mut Document) {
        for &child in self.children(from) {
            let copy = out.push(Some(to), self.nodes[child.0].data.clone());
            self.clone_children_into(child, copy, out);
        }
    }
}

fn parse_style(s: &str) -> Vec<(String, String)> {
    s.split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let k = k.trim();
            let v = v.trim();
            (!k.is_empty() && !v.is_empty()).then(|| (k.to_string(), v.to_string()))
        })
        .collect()
}

fn write_style(props: &[(String, String)]) -> String {
    props
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_walks_in_document_order() {
        let doc = Document::parse("<div><p>one</p><p>two <b>three</b></p></div>");
        let ps: Vec<NodeId> = doc
            .elements()
            .into_iter()
            .filter(|&n| doc.tag(n) == Some("p"))
            .collect();
        assert_eq!(ps.len(), 2);
        assert_eq!(doc.text(ps[0]), "one");
        assert_eq!(doc.text(ps[1]), "two three");
    }

    #[test]
    fn style_props_round_trip_without_clobbering_neighbors() {
        let mut doc = Document::parse(r#"<div style="color: red; margin: 4px">x</div>"#);
        let div = doc
            .elements()
            .into_iter()
            .find(|&n| doc.tag(n) == Some("div"))
            .unwrap();
        doc.set_style_prop(div, "background-color", "#fff8dc");
        assert_eq!(doc.style_prop(div, "color").as_deref(), Some("red"));
        doc.remove_style_prop(div, "background-color");
        assert_eq!(doc.style_prop(div, "background-color"), None);
        assert_eq!(doc.style_prop(div, "margin").as_deref(), Some("4px"));
    }

    #[test]
    fn clone_subtree_is_independent_of_the_source() {
        let doc = Document::parse("<div id=a><span>hello</span></div>");
        let div = doc
            .elements()
            .into_iter()
            .find(|&n| doc.tag(n) == Some("div"))
            .unwrap();
        let mut copy = doc.clone_subtree(div);
        let span = copy
            .descendants(copy.root())
            .into_iter()
            .find(|&n| copy.tag(n) == Some("span"))
            .unwrap();
        copy.detach(span);
        assert_eq!(copy.text(copy.root()), "");
        assert_eq!(doc.text(div), "hello");
    }

    #[test]
    fn class_helpers() {
        let mut doc = Document::parse(r#"<div class="qtext question-text">x</div>"#);
        let div = doc
            .elements()
            .into_iter()
            .find(|&n| doc.tag(n) == Some("div"))
            .unwrap();
        assert!(doc.has_class(div, "qtext"));
        assert!(!doc.has_class(div, "question"));
        assert!(doc.class_contains(div, "question"));
        doc.add_class(div, "marked");
        doc.add_class(div, "marked");
        assert_eq!(doc.class_attr(div), "qtext question-text marked");
        doc.remove_class(div, "marked");
        assert!(!doc.has_class(div, "marked"));
    }
}
