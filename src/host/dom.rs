//! # In-memory host document model.
//!
//! The orchestrator never parses markup. It only needs a tree of elements it can
//! query, attach the app wrapper to, clear, and fingerprint. [`Element`] is a
//! cheaply cloneable handle (`Arc`) to one node; equality is identity.
//!
//! ```text
//! Document
//!   └── <html>
//!         ├── <head>
//!         └── <body>
//!               └── <div id="subapp">      ◄── MountTarget::Selector("#subapp")
//!                     └── <div id="__microvisor_wrapper_for_react__" …>
//! ```
//!
//! Selectors are deliberately minimal: `#id`, `[attr="value"]` and bare tag names.

use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;

#[derive(Default)]
struct Node {
    tag: String,
    attributes: IndexMap<String, String>,
    inner_html: String,
    children: Vec<Element>,
    parent: Option<Weak<RwLock<Node>>>,
    shadow_root: bool,
}

/// Handle to one element of the host document.
#[derive(Clone)]
pub struct Element(Arc<RwLock<Node>>);

impl Element {
    /// Creates a detached element.
    pub fn new(tag: impl Into<String>) -> Self {
        Element(Arc::new(RwLock::new(Node {
            tag: tag.into().to_ascii_lowercase(),
            ..Node::default()
        })))
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder-style `id` setter.
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_attribute("id", id)
    }

    /// Builder-style inner HTML setter.
    pub fn with_inner_html(self, html: impl Into<String>) -> Self {
        self.set_inner_html(html);
        self
    }

    pub fn tag(&self) -> String {
        self.0.read().tag.clone()
    }

    pub fn id(&self) -> Option<String> {
        self.attribute("id")
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.read().attributes.get(name).cloned()
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.0.write().attributes.insert(name.into(), value.into());
    }

    /// Raw markup held by this element (opaque to the runtime).
    pub fn inner_html(&self) -> String {
        self.0.read().inner_html.clone()
    }

    pub fn set_inner_html(&self, html: impl Into<String>) {
        self.0.write().inner_html = html.into();
    }

    /// Serializes the element, its attributes, raw markup and child elements.
    pub fn outer_html(&self) -> String {
        let node = self.0.read();
        let mut out = format!("<{}", node.tag);
        for (k, v) in &node.attributes {
            out.push_str(&format!(" {k}=\"{v}\""));
        }
        out.push('>');
        out.push_str(&node.inner_html);
        for child in &node.children {
            out.push_str(&child.outer_html());
        }
        out.push_str(&format!("</{}>", node.tag));
        out
    }

    /// Marks the element as hosting a shadow root (style-isolated subtree).
    pub fn attach_shadow(&self) {
        self.0.write().shadow_root = true;
    }

    pub fn has_shadow_root(&self) -> bool {
        self.0.read().shadow_root
    }

    pub fn parent(&self) -> Option<Element> {
        self.0
            .read()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Element)
    }

    pub fn children(&self) -> Vec<Element> {
        self.0.read().children.clone()
    }

    pub fn first_child(&self) -> Option<Element> {
        self.0.read().children.first().cloned()
    }

    /// Appends `child`, detaching it from its previous parent first.
    pub fn append_child(&self, child: &Element) {
        if child == self {
            return;
        }
        if let Some(old) = child.parent() {
            old.remove_child(child);
        }
        child.0.write().parent = Some(Arc::downgrade(&self.0));
        self.0.write().children.push(child.clone());
    }

    /// Removes `child` if it is a direct child. Returns whether it was removed.
    pub fn remove_child(&self, child: &Element) -> bool {
        let removed = {
            let mut node = self.0.write();
            let before = node.children.len();
            node.children.retain(|c| c != child);
            before != node.children.len()
        };
        if removed {
            child.0.write().parent = None;
        }
        removed
    }

    /// Removes every child element and clears raw markup.
    pub fn clear_children(&self) {
        while let Some(child) = self.first_child() {
            self.remove_child(&child);
        }
        self.0.write().inner_html.clear();
    }

    /// True when `other` is this element or one of its descendants.
    pub fn contains(&self, other: &Element) -> bool {
        let mut cursor = Some(other.clone());
        while let Some(el) = cursor {
            if &el == self {
                return true;
            }
            cursor = el.parent();
        }
        false
    }

    /// Depth-first search (self included).
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<Element> {
        if pred(self) {
            return Some(self.clone());
        }
        self.children().iter().find_map(|c| c.find(pred))
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Id(id) => self.id().as_deref() == Some(id.as_str()),
            Selector::Attribute(name, value) => {
                self.attribute(name).as_deref() == Some(value.as_str())
            }
            Selector::Tag(tag) => self.tag() == *tag,
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0.read();
        match node.attributes.get("id") {
            Some(id) => write!(f, "<{} id=\"{id}\">", node.tag),
            None => write!(f, "<{}>", node.tag),
        }
    }
}

enum Selector {
    Id(String),
    Attribute(String, String),
    Tag(String),
}

impl Selector {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(id) = raw.strip_prefix('#') {
            return (!id.is_empty()).then(|| Selector::Id(id.to_string()));
        }
        if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            let (name, value) = inner.split_once('=')?;
            let value = value.trim().trim_matches('"').trim_matches('\'');
            return Some(Selector::Attribute(
                name.trim().to_string(),
                value.to_string(),
            ));
        }
        let valid = !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        valid.then(|| Selector::Tag(raw.to_ascii_lowercase()))
    }
}

/// The host document: `<html>` with `<head>` and `<body>`.
#[derive(Clone)]
pub struct Document {
    root: Element,
    head: Element,
    body: Element,
    shadow_dom: bool,
}

impl Document {
    /// Creates an empty document with shadow DOM support.
    pub fn new() -> Self {
        let root = Element::new("html");
        let head = Element::new("head");
        let body = Element::new("body");
        root.append_child(&head);
        root.append_child(&body);
        Self {
            root,
            head,
            body,
            shadow_dom: true,
        }
    }

    /// Toggles shadow DOM support (strict style isolation degrades without it).
    pub fn with_shadow_dom(mut self, supported: bool) -> Self {
        self.shadow_dom = supported;
        self
    }

    pub fn supports_shadow_dom(&self) -> bool {
        self.shadow_dom
    }

    pub fn document_element(&self) -> &Element {
        &self.root
    }

    pub fn head(&self) -> &Element {
        &self.head
    }

    pub fn body(&self) -> &Element {
        &self.body
    }

    /// First element (document order) matching the selector.
    pub fn query_selector(&self, selector: &str) -> Option<Element> {
        let selector = Selector::parse(selector)?;
        self.root.find(&|el| el.matches(&selector))
    }

    /// True when `el` is attached under `<body>`.
    pub fn body_contains(&self, el: &Element) -> bool {
        self.body.contains(el)
    }

    /// Structural fingerprint of an element's position, e.g. `/html[1]/body[1]/div[2]`.
    ///
    /// Returns `None` for elements not (yet) attached under `<body>`.
    pub fn xpath(&self, el: &Element) -> Option<String> {
        if !self.body_contains(el) {
            return None;
        }
        let mut segments = Vec::new();
        let mut cursor = el.clone();
        while cursor != self.root {
            let parent = cursor.parent()?;
            let tag = cursor.tag();
            let mut pos = 0;
            for sibling in parent.children() {
                if sibling.tag() == tag {
                    pos += 1;
                }
                if sibling == cursor {
                    break;
                }
            }
            segments.push(format!("{tag}[{pos}]"));
            cursor = parent;
        }
        segments.push(format!("{}[1]", self.root.tag()));
        segments.reverse();
        Some(format!("/{}", segments.join("/")))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_two_divs() -> (Document, Element, Element) {
        let doc = Document::new();
        let a = Element::new("div").with_id("a");
        let b = Element::new("div").with_id("b");
        doc.body().append_child(&Element::new("span"));
        doc.body().append_child(&a);
        doc.body().append_child(&b);
        (doc, a, b)
    }

    #[test]
    fn query_selector_variants() {
        let (doc, a, b) = doc_with_two_divs();
        b.set_attribute("data-name", "react");
        assert_eq!(doc.query_selector("#a"), Some(a.clone()));
        assert_eq!(doc.query_selector("[data-name=\"react\"]"), Some(b));
        assert_eq!(doc.query_selector("div"), Some(a));
        assert_eq!(doc.query_selector("#missing"), None);
        assert_eq!(doc.query_selector("div > p"), None);
    }

    #[test]
    fn xpath_counts_same_tag_siblings() {
        let (doc, a, b) = doc_with_two_divs();
        assert_eq!(doc.xpath(&a).as_deref(), Some("/html[1]/body[1]/div[1]"));
        assert_eq!(doc.xpath(&b).as_deref(), Some("/html[1]/body[1]/div[2]"));
        assert_eq!(doc.xpath(&Element::new("div")), None);
    }

    #[test]
    fn append_moves_between_parents() {
        let (_doc, a, b) = doc_with_two_divs();
        let child = Element::new("p");
        a.append_child(&child);
        b.append_child(&child);
        assert!(a.children().is_empty());
        assert!(b.contains(&child));
        assert_eq!(child.parent(), Some(b));
    }

    #[test]
    fn clear_children_detaches() {
        let (_doc, a, _) = doc_with_two_divs();
        let child = Element::new("p");
        a.append_child(&child);
        a.set_inner_html("<b>x</b>");
        a.clear_children();
        assert!(a.first_child().is_none());
        assert!(a.inner_html().is_empty());
        assert!(child.parent().is_none());
    }
}
