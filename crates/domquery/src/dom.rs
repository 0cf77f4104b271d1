//! In-memory DOM used by the query engine.
//!
//! Nodes live in an arena owned by a [`Document`]. An [`Element`] is a cheap
//! handle (document + node id), so query results stay valid while the tree
//! keeps changing underneath them. Every mutation bumps a counter published
//! on a `watch` channel, which is what `wait_for` observes.
//!
//! Detached nodes (from `remove` or `set_inner_html`) keep their arena slot
//! for the life of the document: a handle to a removed element stays usable
//! and can be appended again. The arena therefore only grows; tests that
//! re-render many times should render into a fresh document.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;

use crate::css::SelectorList;
use crate::result::{QueryError, QueryResult};

/// Identifier of a node inside its document's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Arena index of the node
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, String)>,
    /// Live form value, set through `Element::set_value`
    pub(crate) value: Option<String>,
}

impl ElementData {
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) data: NodeData,
}

/// Node arena. Accessed through [`Document::read`] by the query engine.
#[derive(Debug)]
pub(crate) struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
}

impl Tree {
    fn new() -> Self {
        let mut tree = Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            root: NodeId(0),
            body: NodeId(0),
        };
        let html = tree.create_element(Some(tree.root), "html");
        let _head = tree.create_element(Some(html), "head");
        tree.body = tree.create_element(Some(html), "body");
        tree
    }

    pub(crate) fn create(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            data,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(&mut self, parent: Option<NodeId>, tag: &str) -> NodeId {
        self.create(
            parent,
            NodeData::Element(ElementData {
                tag: tag.to_ascii_lowercase(),
                attrs: Vec::new(),
                value: None,
            }),
        )
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn tag(&self, id: NodeId) -> &str {
        self.element(id).map_or("", |element| element.tag.as_str())
    }

    pub(crate) fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|element| element.attr(name))
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub(crate) fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|parent| self.element(*parent).is_some())
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub(crate) fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
    }

    /// Element descendants in document order, excluding `id` itself
    pub(crate) fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if self.element(next).is_some() {
                out.push(next);
            }
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Ancestor elements, nearest first
    pub(crate) fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent_element(id), move |current| {
            self.parent_element(*current)
        })
    }

    pub(crate) fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub(crate) fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Document | NodeData::Element(_) => {
                for child in self.children(id) {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Text of the direct text-node children only
    pub(crate) fn own_text(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|child| match &self.nodes[child.0].data {
                NodeData::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn get_element_by_id(&self, value: &str) -> Option<NodeId> {
        if value.is_empty() {
            return None;
        }
        self.descendant_elements(self.root)
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(value))
    }

    /// Current value of a form control
    pub(crate) fn value(&self, id: NodeId) -> String {
        let Some(element) = self.element(id) else {
            return String::new();
        };
        if let Some(value) = &element.value {
            return value.clone();
        }
        match element.tag.as_str() {
            "textarea" => self.text_content(id),
            "select" => self
                .selected_options(id)
                .first()
                .map(|option| self.option_value(*option))
                .unwrap_or_default(),
            _ => element.attr("value").unwrap_or_default().to_string(),
        }
    }

    fn option_value(&self, option: NodeId) -> String {
        self.attr(option, "value")
            .map_or_else(|| self.text_content(option), str::to_string)
    }

    /// Selected `<option>` descendants of a `<select>`
    pub(crate) fn selected_options(&self, select: NodeId) -> Vec<NodeId> {
        let options: Vec<NodeId> = self
            .descendant_elements(select)
            .into_iter()
            .filter(|node| self.tag(*node) == "option")
            .collect();
        let selected: Vec<NodeId> = options
            .iter()
            .copied()
            .filter(|option| self.attr(*option, "selected").is_some())
            .collect();
        if selected.is_empty() && self.attr(select, "multiple").is_none() {
            options.into_iter().take(1).collect()
        } else {
            selected
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), String> {
        if self.is_inclusive_ancestor(child, parent) {
            return Err("cannot append a node inside itself".to_string());
        }
        if matches!(self.nodes[child.0].data, NodeData::Document) {
            return Err("cannot append the document node".to_string());
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }
}

struct Shared {
    tree: RwLock<Tree>,
    changes: watch::Sender<u64>,
}

/// A document: the root of an element tree
///
/// Cloning a `Document` clones the handle, not the tree.
#[derive(Clone)]
pub struct Document {
    shared: Arc<Shared>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.read().nodes.len())
            .field("revision", &*self.shared.changes.borrow())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for Document {}

impl Document {
    /// Create an empty document (`<html><head></head><body></body></html>`)
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                tree: RwLock::new(Tree::new()),
                changes,
            }),
        }
    }

    /// Create a document whose body holds the given HTML fragment
    pub fn from_html(html: &str) -> QueryResult<Self> {
        let document = Self::new();
        document.body().set_inner_html(html)?;
        Ok(document)
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Tree> {
        self.shared.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tree> {
        self.shared
            .tree
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a mutation and publish it to observers
    pub(crate) fn mutate<R>(&self, f: impl FnOnce(&mut Tree) -> R) -> R {
        let result = {
            let mut tree = self.write();
            f(&mut tree)
        };
        self.shared
            .changes
            .send_modify(|revision| *revision = revision.wrapping_add(1));
        result
    }

    pub(crate) fn element(&self, node: NodeId) -> Element {
        Element {
            document: Document {
                shared: Arc::clone(&self.shared),
            },
            node,
        }
    }

    /// The `<body>` element
    #[must_use]
    pub fn body(&self) -> Element {
        let body = self.read().body;
        self.element(body)
    }

    /// The `<html>` element
    #[must_use]
    pub fn document_element(&self) -> Element {
        let tree = self.read();
        let html = tree.child_elements(tree.root).next().unwrap_or(tree.body);
        drop(tree);
        self.element(html)
    }

    /// Create a detached element
    #[must_use]
    pub fn create_element(&self, tag: &str) -> Element {
        let node = self.mutate(|tree| tree.create_element(None, tag));
        self.element(node)
    }

    /// Find an attached element by its `id` attribute
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        let node = self.read().get_element_by_id(id);
        node.map(|node| self.element(node))
    }

    /// Number of mutations applied so far
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.shared.changes.borrow()
    }

    /// Subscribe to mutation notifications
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.changes.subscribe()
    }
}

/// Handle to an element node
#[derive(Clone)]
pub struct Element {
    document: Document,
    node: NodeId,
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.document == other.document
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.document.shared).hash(state);
        self.node.hash(state);
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.document.read();
        write!(f, "Element(<{}", tree.tag(self.node))?;
        if let Some(element) = tree.element(self.node) {
            for (name, value) in &element.attrs {
                write!(f, " {name}=\"{value}\"")?;
            }
        }
        write!(f, ">)")
    }
}

impl Element {
    /// Owning document
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Arena id of this element
    #[must_use]
    pub const fn node_id(&self) -> NodeId {
        self.node
    }

    /// Lowercase tag name
    #[must_use]
    pub fn tag_name(&self) -> String {
        self.document.read().tag(self.node).to_string()
    }

    /// Attribute value, if present
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.document
            .read()
            .attr(self.node, name)
            .map(str::to_string)
    }

    /// Whether the attribute is present
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.document.read().attr(self.node, name).is_some()
    }

    /// Set (or replace) an attribute
    pub fn set_attribute(&self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        self.document.mutate(|tree| {
            if let Some(element) = tree.element_mut(self.node) {
                match element.attrs.iter_mut().find(|(key, _)| *key == name) {
                    Some(slot) => slot.1 = value.to_string(),
                    None => element.attrs.push((name, value.to_string())),
                }
            }
        });
    }

    /// Remove an attribute
    pub fn remove_attribute(&self, name: &str) {
        self.document.mutate(|tree| {
            if let Some(element) = tree.element_mut(self.node) {
                element.attrs.retain(|(key, _)| key != name);
            }
        });
    }

    /// Concatenated text of all descendant text nodes
    #[must_use]
    pub fn text_content(&self) -> String {
        self.document.read().text_content(self.node)
    }

    /// Text of the direct text-node children
    #[must_use]
    pub fn own_text(&self) -> String {
        self.document.read().own_text(self.node)
    }

    /// Child elements in order
    #[must_use]
    pub fn children(&self) -> Vec<Element> {
        let nodes: Vec<NodeId> = self.document.read().child_elements(self.node).collect();
        nodes
            .into_iter()
            .map(|node| self.document.element(node))
            .collect()
    }

    /// All element descendants in document order
    #[must_use]
    pub fn descendants(&self) -> Vec<Element> {
        let nodes = self.document.read().descendant_elements(self.node);
        nodes
            .into_iter()
            .map(|node| self.document.element(node))
            .collect()
    }

    /// Parent element, if attached under one
    #[must_use]
    pub fn parent_element(&self) -> Option<Element> {
        let parent = self.document.read().parent_element(self.node);
        parent.map(|node| self.document.element(node))
    }

    /// Whether `other` is this element or one of its descendants
    #[must_use]
    pub fn contains(&self, other: &Element) -> bool {
        self.document == other.document
            && self
                .document
                .read()
                .is_inclusive_ancestor(self.node, other.node)
    }

    /// Append an element as the last child, moving it if already attached
    pub fn append_child(&self, child: &Element) -> QueryResult<()> {
        if self.document != child.document {
            return Err(QueryError::Dom {
                message: "cannot append an element from another document".to_string(),
            });
        }
        self.document
            .mutate(|tree| tree.append(self.node, child.node))
            .map_err(|message| QueryError::Dom { message })
    }

    /// Append a text node
    pub fn append_text(&self, text: &str) {
        self.document.mutate(|tree| {
            tree.create(Some(self.node), NodeData::Text(text.to_string()));
        });
    }

    /// Replace all children with the parsed HTML fragment
    pub fn set_inner_html(&self, html: &str) -> QueryResult<()> {
        let fragment = crate::html::parse_fragment(html)?;
        self.document.mutate(|tree| {
            tree.clear_children(self.node);
            crate::html::build(tree, self.node, fragment);
        });
        Ok(())
    }

    /// Detach this element from its parent
    pub fn remove(&self) {
        self.document.mutate(|tree| tree.detach(self.node));
    }

    /// Current value of a form control (`input`, `textarea`, `select`)
    #[must_use]
    pub fn value(&self) -> String {
        self.document.read().value(self.node)
    }

    /// Set the live value of a form control
    pub fn set_value(&self, value: &str) {
        self.document.mutate(|tree| {
            if let Some(element) = tree.element_mut(self.node) {
                element.value = Some(value.to_string());
            }
        });
    }

    /// Whether this element matches a simple selector list
    pub fn matches(&self, selector: &str) -> QueryResult<bool> {
        let selectors = SelectorList::parse(selector)?;
        Ok(selectors.matches(&self.document.read(), self.node))
    }

    /// Serialized HTML of this element and its subtree
    #[must_use]
    pub fn outer_html(&self) -> String {
        crate::pretty::outer_html(&self.document.read(), self.node)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod document_tests {
        use super::*;

        #[test]
        fn test_new_document_has_body() {
            let document = Document::new();
            assert_eq!(document.body().tag_name(), "body");
            assert_eq!(document.document_element().tag_name(), "html");
        }

        #[test]
        fn test_from_html() {
            let document = Document::from_html(r#"<p id="greeting">Hello</p>"#).unwrap();
            let p = document.get_element_by_id("greeting").unwrap();
            assert_eq!(p.text_content(), "Hello");
            assert_eq!(p.parent_element(), Some(document.body()));
        }

        #[test]
        fn test_revision_counts_mutations() {
            let document = Document::new();
            let before = document.revision();
            document.body().append_text("x");
            document.body().set_attribute("class", "y");
            assert_eq!(document.revision(), before + 2);
        }

        #[test]
        fn test_subscribe_sees_mutation() {
            let document = Document::new();
            let mut changes = document.subscribe();
            document.body().append_text("x");
            assert!(changes.has_changed().unwrap());
            let _ = changes.borrow_and_update();
            assert!(!changes.has_changed().unwrap());
        }
    }

    mod element_tests {
        use super::*;

        #[test]
        fn test_attributes() {
            let document = Document::new();
            let input = document.create_element("INPUT");
            assert_eq!(input.tag_name(), "input");
            input.set_attribute("Placeholder", "Name");
            assert_eq!(input.attribute("placeholder").as_deref(), Some("Name"));
            input.set_attribute("placeholder", "Email");
            assert_eq!(input.attribute("placeholder").as_deref(), Some("Email"));
            input.remove_attribute("placeholder");
            assert!(!input.has_attribute("placeholder"));
        }

        #[test]
        fn test_own_text_vs_text_content() {
            let document = Document::from_html("<div>Hello <b>world</b>!</div>").unwrap();
            let div = document.body().children().remove(0);
            assert_eq!(div.own_text(), "Hello !");
            assert_eq!(div.text_content(), "Hello world!");
        }

        #[test]
        fn test_append_moves_element() {
            let document = Document::from_html("<div id=a></div><div id=b></div>").unwrap();
            let a = document.get_element_by_id("a").unwrap();
            let b = document.get_element_by_id("b").unwrap();
            let span = document.create_element("span");
            a.append_child(&span).unwrap();
            b.append_child(&span).unwrap();
            assert!(a.children().is_empty());
            assert_eq!(b.children(), vec![span]);
        }

        #[test]
        fn test_append_rejects_cycles() {
            let document = Document::from_html("<div id=a><p id=b></p></div>").unwrap();
            let a = document.get_element_by_id("a").unwrap();
            let b = document.get_element_by_id("b").unwrap();
            assert!(matches!(b.append_child(&a), Err(QueryError::Dom { .. })));
        }

        #[test]
        fn test_append_rejects_foreign_document() {
            let one = Document::new();
            let two = Document::new();
            let foreign = two.create_element("p");
            assert!(one.body().append_child(&foreign).is_err());
        }

        #[test]
        fn test_remove_detaches() {
            let document = Document::from_html("<p id=gone>bye</p>").unwrap();
            let p = document.get_element_by_id("gone").unwrap();
            p.remove();
            assert!(document.get_element_by_id("gone").is_none());
            assert!(p.parent_element().is_none());
        }

        #[test]
        fn test_detached_nodes_keep_their_slot() {
            let document = Document::from_html(r#"<div id=app><p id=old>old</p></div>"#).unwrap();
            let app = document.get_element_by_id("app").unwrap();
            let old = document.get_element_by_id("old").unwrap();
            app.set_inner_html("<p>new</p>").unwrap();

            assert!(old.parent_element().is_none());
            assert_eq!(old.text_content(), "old");
            app.append_child(&old).unwrap();
            assert_eq!(old.parent_element(), Some(app.clone()));
            assert_eq!(app.text_content(), "newold");
        }

        #[test]
        fn test_contains() {
            let document = Document::from_html("<ul><li>one</li></ul>").unwrap();
            let body = document.body();
            let li = body.descendants().pop().unwrap();
            assert!(body.contains(&li));
            assert!(li.contains(&li));
            assert!(!li.contains(&body));
        }

        #[test]
        fn test_form_values() {
            let document = Document::from_html(
                r#"<input id=name value="Ada"><textarea id=bio>Engineer</textarea>
                   <select id=lang><option value="rs">Rust</option><option value="go" selected>Go</option></select>"#,
            )
            .unwrap();
            let name = document.get_element_by_id("name").unwrap();
            assert_eq!(name.value(), "Ada");
            name.set_value("Grace");
            assert_eq!(name.value(), "Grace");
            assert_eq!(document.get_element_by_id("bio").unwrap().value(), "Engineer");
            assert_eq!(document.get_element_by_id("lang").unwrap().value(), "go");
        }

        #[test]
        fn test_identity_equality() {
            let document = Document::from_html("<p id=x></p>").unwrap();
            let first = document.get_element_by_id("x").unwrap();
            let second = document.get_element_by_id("x").unwrap();
            assert_eq!(first, second);
            assert_ne!(first, document.body());
        }

        #[test]
        fn test_debug_shows_tag_and_attributes() {
            let document = Document::from_html(r#"<button data-testid="go">Go</button>"#).unwrap();
            let button = document.body().children().remove(0);
            assert_eq!(format!("{button:?}"), r#"Element(<button data-testid="go">)"#);
        }
    }
}
