//! Document snapshot.
//!
//! A small arena DOM that stands in for the browser document. Pages come in as
//! a JSON snapshot (`SnapshotNode`), get mutated through `Document`, and go
//! out again as a snapshot or rendered HTML.
//!
//! Nodes replaced by `set_text_content` stay in the arena but are detached,
//! so a `NodeId` held by a late-running pass never dangles. An element whose
//! only child is already text or markup has that slot rewritten in place, so
//! repeated passes over the same page do not grow the arena.

use crate::error::DomError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serialized form of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotNode {
    Text {
        text: String,
    },
    /// Markup inserted verbatim, rendered without escaping
    Markup {
        markup: String,
    },
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attrs: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<SnapshotNode>,
    },
}

impl SnapshotNode {
    pub fn text(text: impl Into<String>) -> Self {
        SnapshotNode::Text { text: text.into() }
    }

    pub fn element(tag: impl Into<String>, attrs: &[(&str, &str)], children: Vec<SnapshotNode>) -> Self {
        SnapshotNode::Element {
            tag: tag.into(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
    },
    Text(String),
    Markup(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    data: NodeData,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

/// Elements whose text is written out unescaped.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

impl Document {
    pub fn from_snapshot(snapshot: &SnapshotNode) -> Result<Self, DomError> {
        if !matches!(snapshot, SnapshotNode::Element { .. }) {
            return Err(DomError::TextRoot);
        }
        let mut document = Document {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        document.root = document.insert_snapshot(snapshot, None);
        Ok(document)
    }

    pub fn from_json(json: &str) -> Result<Self, DomError> {
        let snapshot: SnapshotNode = serde_json::from_str(json)?;
        Self::from_snapshot(&snapshot)
    }

    fn insert_snapshot(&mut self, snapshot: &SnapshotNode, parent: Option<NodeId>) -> NodeId {
        let data = match snapshot {
            SnapshotNode::Text { text } => NodeData::Text(text.clone()),
            SnapshotNode::Markup { markup } => NodeData::Markup(markup.clone()),
            SnapshotNode::Element { tag, attrs, .. } => NodeData::Element {
                tag: tag.to_ascii_lowercase(),
                attrs: attrs.clone(),
            },
        };
        let id = self.push(data, parent);
        if let SnapshotNode::Element { children, .. } = snapshot {
            for child in children {
                let child_id = self.insert_snapshot(child, Some(id));
                self.nodes[id.0].children.push(child_id);
            }
        }
        id
    }

    fn push(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        self.nodes.push(Node {
            parent,
            data,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn to_snapshot(&self) -> SnapshotNode {
        self.snapshot_of(self.root)
    }

    fn snapshot_of(&self, id: NodeId) -> SnapshotNode {
        let node = &self.nodes[id.0];
        match &node.data {
            NodeData::Text(text) => SnapshotNode::Text { text: text.clone() },
            NodeData::Markup(markup) => SnapshotNode::Markup {
                markup: markup.clone(),
            },
            NodeData::Element { tag, attrs } => SnapshotNode::Element {
                tag: tag.clone(),
                attrs: attrs.clone(),
                children: node.children.iter().map(|c| self.snapshot_of(*c)).collect(),
            },
        }
    }

    // ==================== Navigation ====================

    /// The document element (`<html>`).
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head(&self) -> Option<NodeId> {
        self.child_element(self.root, "head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.child_element(self.root, "body")
    }

    /// Return `<head>`, creating it as the first child of the root if missing.
    pub fn ensure_head(&mut self) -> NodeId {
        if let Some(head) = self.head() {
            return head;
        }
        let head = self.push(
            NodeData::Element {
                tag: "head".to_string(),
                attrs: BTreeMap::new(),
            },
            Some(self.root),
        );
        self.nodes[self.root.0].children.insert(0, head);
        head
    }

    fn child_element(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|c| self.tag(*c) == Some(tag))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// All nodes below `id` in document order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Every attached element carrying `name`, root included, in document order.
    pub fn elements_with_attr(&self, name: &str) -> Vec<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .filter(|id| self.has_attr(*id, name))
            .collect()
    }

    /// Every attached element, root included, in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .filter(|id| self.is_element(*id))
            .collect()
    }

    /// Text nodes below `id` in document order.
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| matches!(self.nodes[n.0].data, NodeData::Text(_)))
            .collect()
    }

    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.elements_with_attr("id")
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(element_id))
    }

    /// Whether the node is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    // ==================== Elements ====================

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(
            self.nodes.get(id.0).map(|n| &n.data),
            Some(NodeData::Element { .. })
        )
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.nodes.get(id.0).map(|n| &n.data) {
            Some(NodeData::Element { tag, .. }) => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.nodes.get(id.0).map(|n| &n.data) {
            Some(NodeData::Element { attrs, .. }) => attrs.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set an attribute. No-op on text nodes.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(NodeData::Element { attrs, .. }) = self.nodes.get_mut(id.0).map(|n| &mut n.data)
        {
            attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .map(|c| c.split_whitespace().any(|existing| existing == class))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let updated = match self.attr(id, "class") {
            Some(existing) if !existing.trim().is_empty() => {
                format!("{} {}", existing.trim(), class)
            }
            _ => class.to_string(),
        };
        self.set_attr(id, "class", &updated);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let remaining = self
            .attr(id, "class")
            .unwrap_or("")
            .split_whitespace()
            .filter(|existing| *existing != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(id, "class", &remaining);
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.push(
            NodeData::Element {
                tag: tag.to_ascii_lowercase(),
                attrs: attrs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
            Some(parent),
        );
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Detach a node from its parent. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.nodes[parent.0].children.retain(|c| *c != id);
            self.nodes[id.0].parent = None;
        }
    }

    // ==================== Text ====================

    /// Value of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.nodes.get(id.0).map(|n| &n.data) {
            Some(NodeData::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Overwrite a text node's value. No-op on other nodes.
    pub fn set_text(&mut self, id: NodeId, value: &str) {
        if let Some(NodeData::Text(text)) = self.nodes.get_mut(id.0).map(|n| &mut n.data) {
            *text = value.to_string();
        }
    }

    /// Concatenated text of a node and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.nodes.get(id.0).map(|n| &n.data) {
            Some(NodeData::Text(text)) | Some(NodeData::Markup(text)) => text.clone(),
            Some(NodeData::Element { .. }) => self
                .descendants(id)
                .into_iter()
                .filter_map(|n| match &self.nodes[n.0].data {
                    NodeData::Text(text) | NodeData::Markup(text) => Some(text.as_str()),
                    NodeData::Element { .. } => None,
                })
                .collect(),
            None => String::new(),
        }
    }

    /// Replace all children of an element with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, value: &str) {
        self.replace_children(id, NodeData::Text(value.to_string()));
    }

    /// Replace all children of an element with raw markup.
    pub fn set_inner_markup(&mut self, id: NodeId, markup: &str) {
        self.replace_children(id, NodeData::Markup(markup.to_string()));
    }

    fn replace_children(&mut self, id: NodeId, data: NodeData) {
        if !self.is_element(id) {
            return;
        }
        let only = match self.nodes[id.0].children.as_slice() {
            [only] => Some(*only),
            _ => None,
        };
        if let Some(only) = only.filter(|n| !self.is_element(*n)) {
            self.nodes[only.0].data = data;
            return;
        }
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
        let child = self.push(data, Some(id));
        self.nodes[id.0].children.push(child);
    }

    // ==================== Rendering ====================

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if self.tag(self.root) == Some("html") {
            out.push_str("<!DOCTYPE html>\n");
        }
        self.render(self.root, &mut out);
        out
    }

    fn render(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        match &node.data {
            NodeData::Text(text) if self.in_raw_text_element(id) => out.push_str(text),
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Markup(markup) => out.push_str(markup),
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in &node.children {
                    self.render(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    fn in_raw_text_element(&self, id: NodeId) -> bool {
        self.parent(id)
            .and_then(|p| self.tag(p))
            .map(|tag| RAW_TEXT_ELEMENTS.contains(&tag))
            .unwrap_or(false)
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Document {
        Document::from_json(
            r#"{
                "tag": "html",
                "attrs": {"lang": "en", "class": "no-js"},
                "children": [
                    {"tag": "head", "children": [{"tag": "title", "children": [{"text": "Tasks"}]}]},
                    {"tag": "body", "children": [
                        {"tag": "h1", "attrs": {"id": "title"}, "children": [{"text": "My "}, {"tag": "b", "children": [{"text": "Tasks"}]}]},
                        {"tag": "input", "attrs": {"placeholder": "Search"}}
                    ]}
                ]
            }"#,
        )
        .expect("valid snapshot")
    }

    #[test]
    fn test_parse_finds_head_and_body() {
        let doc = page();
        assert_eq!(doc.tag(doc.root()), Some("html"));
        assert_eq!(doc.head().and_then(|h| doc.tag(h)), Some("head"));
        assert_eq!(doc.body().and_then(|b| doc.tag(b)), Some("body"));
    }

    #[test]
    fn test_text_root_is_rejected() {
        let result = Document::from_json(r#"{"text": "hello"}"#);
        assert!(matches!(result, Err(DomError::TextRoot)));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(Document::from_json("{"), Err(DomError::Json(_))));
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_structure() {
        let doc = page();
        let again = Document::from_snapshot(&doc.to_snapshot()).unwrap();
        assert_eq!(doc.to_snapshot(), again.to_snapshot());
    }

    #[test]
    fn test_text_nodes_in_document_order() {
        let doc = page();
        let body = doc.body().unwrap();
        let texts: Vec<&str> = doc
            .text_nodes(body)
            .into_iter()
            .filter_map(|n| doc.text(n))
            .collect();
        assert_eq!(texts, vec!["My ", "Tasks"]);
    }

    #[test]
    fn test_text_content_concatenates() {
        let doc = page();
        let title = doc.element_by_id("title").unwrap();
        assert_eq!(doc.text_content(title), "My Tasks");
    }

    #[test]
    fn test_set_text_content_detaches_old_children() {
        let mut doc = page();
        let title = doc.element_by_id("title").unwrap();
        let old = doc.text_nodes(title);

        doc.set_text_content(title, "مهامي");

        assert_eq!(doc.text_content(title), "مهامي");
        assert_eq!(doc.children(title).len(), 1);
        assert!(old.iter().all(|n| !doc.is_attached(*n)));
    }

    #[test]
    fn test_set_inner_markup_renders_verbatim() {
        let mut doc = page();
        let title = doc.element_by_id("title").unwrap();
        doc.set_inner_markup(title, "<em>مهامي</em>");

        assert!(doc.to_html().contains(r#"<h1 id="title"><em>مهامي</em></h1>"#));
        assert!(doc.text_nodes(title).is_empty());
    }

    #[test]
    fn test_class_helpers() {
        let mut doc = page();
        let root = doc.root();

        doc.add_class(root, "rtl-ui");
        doc.add_class(root, "rtl-ui");
        assert_eq!(doc.attr(root, "class"), Some("no-js rtl-ui"));

        doc.remove_class(root, "rtl-ui");
        assert_eq!(doc.attr(root, "class"), Some("no-js"));
        assert!(!doc.has_class(root, "rtl-ui"));
    }

    #[test]
    fn test_append_and_remove_element() {
        let mut doc = page();
        let head = doc.head().unwrap();
        let link = doc.append_element(head, "link", &[("id", "rtl-stylesheet")]);
        assert_eq!(doc.element_by_id("rtl-stylesheet"), Some(link));

        doc.remove(link);
        assert_eq!(doc.element_by_id("rtl-stylesheet"), None);
    }

    #[test]
    fn test_ensure_head_creates_missing_head() {
        let mut doc = Document::from_snapshot(&SnapshotNode::element(
            "html",
            &[],
            vec![SnapshotNode::element("body", &[], vec![])],
        ))
        .unwrap();
        assert!(doc.head().is_none());

        let head = doc.ensure_head();
        assert_eq!(doc.head(), Some(head));
        assert_eq!(doc.children(doc.root())[0], head);
        assert_eq!(doc.ensure_head(), head);
    }

    #[test]
    fn test_to_html_escapes_and_handles_void_elements() {
        let doc = Document::from_snapshot(&SnapshotNode::element(
            "html",
            &[],
            vec![SnapshotNode::element(
                "body",
                &[],
                vec![
                    SnapshotNode::text("a < b & c"),
                    SnapshotNode::element("input", &[("value", "say \"hi\"")], vec![]),
                ],
            )],
        ))
        .unwrap();

        let html = doc.to_html();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("a &lt; b &amp; c"));
        assert!(html.contains(r#"<input value="say &quot;hi&quot;">"#));
        assert!(!html.contains("</input>"));
    }

    #[test]
    fn test_to_html_keeps_script_and_style_text_raw() {
        let doc = Document::from_snapshot(&SnapshotNode::element(
            "html",
            &[],
            vec![
                SnapshotNode::element(
                    "head",
                    &[],
                    vec![SnapshotNode::element(
                        "style",
                        &[],
                        vec![SnapshotNode::text("ul > li { color: red }")],
                    )],
                ),
                SnapshotNode::element(
                    "body",
                    &[],
                    vec![
                        SnapshotNode::element(
                            "SCRIPT",
                            &[],
                            vec![SnapshotNode::text("if (a < b && c) { go(); }")],
                        ),
                        SnapshotNode::element("p", &[], vec![SnapshotNode::text("a < b")]),
                    ],
                ),
            ],
        ))
        .unwrap();

        let html = doc.to_html();
        assert!(html.contains("<style>ul > li { color: red }</style>"));
        assert!(html.contains("<script>if (a < b && c) { go(); }</script>"));
        assert!(html.contains("<p>a &lt; b</p>"));
    }

    #[test]
    fn test_repeated_text_rewrites_reuse_the_slot() {
        let mut doc = page();
        let title = doc.element_by_id("title").unwrap();

        doc.set_text_content(title, "مهامي");
        let size = doc.nodes.len();
        let child = doc.children(title)[0];

        for i in 0..1000 {
            if i % 2 == 0 {
                doc.set_text_content(title, "My Tasks");
            } else {
                doc.set_inner_markup(title, "<em>مهامي</em>");
            }
        }

        assert_eq!(doc.nodes.len(), size);
        assert_eq!(doc.children(title), &[child]);
        assert_eq!(doc.text_content(title), "<em>مهامي</em>");
    }

    #[test]
    fn test_tags_are_lowercased() {
        let doc = Document::from_json(r#"{"tag": "HTML", "children": [{"tag": "BODY"}]}"#).unwrap();
        assert!(doc.body().is_some());
    }
}
