//! In-memory host document.
//!
//! Structure down to elements lives in an `ego_tree::Tree`. Element content
//! set through [`Document::set_inner_html`] is kept as one serialized
//! [`DomNode::Markup`] run and written back byte for byte, the way a browser
//! hands `innerHTML` around without the pipeline ever re-serializing it.
use ego_tree::{NodeId, NodeRef, Tree};
use pulldown_cmark_escape::{escape_html, escape_html_body_text};
use scraper::Html;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
    Document,
    Element(ElementData),
    /// Serialized HTML, emitted verbatim
    Markup(String),
}

/// One child-list change: `added_nodes` were attached under `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Registration(u64);

#[derive(Debug)]
struct Observation {
    registration: Registration,
    target: NodeId,
    tx: mpsc::UnboundedSender<MutationRecord>,
}

#[derive(Debug)]
struct Inner {
    tree: Tree<DomNode>,
    observations: Vec<Observation>,
    next_registration: u64,
}

impl Inner {
    /// Deliver a record to every observation whose target is the mutated
    /// node or one of its ancestors.
    fn notify(&mut self, record: MutationRecord) {
        self.observations.retain(|o| !o.tx.is_closed());
        let Some(node) = self.tree.get(record.target) else {
            return;
        };
        let chain: Vec<NodeId> = std::iter::once(node.id())
            .chain(node.ancestors().map(|a| a.id()))
            .collect();
        for observation in &self.observations {
            if chain.contains(&observation.target) {
                let _ = observation.tx.send(record.clone());
            }
        }
    }

    fn is_parent_node(&self, node: NodeId) -> bool {
        self.tree.get(node).is_some_and(|n| {
            matches!(n.value(), DomNode::Element(_) | DomNode::Document)
        })
    }

    fn inner_html(&self, node: NodeId) -> Option<String> {
        if !self.is_parent_node(node) {
            return None;
        }
        let node = self.tree.get(node)?;
        let mut out = String::new();
        for child in node.children() {
            serialize(child, &mut out);
        }
        Some(out)
    }

    fn set_inner_html(&mut self, node: NodeId, html: &str) -> bool {
        if !self.is_parent_node(node) {
            return false;
        }
        let children: Vec<NodeId> = match self.tree.get(node) {
            Some(n) => n.children().map(|c| c.id()).collect(),
            None => return false,
        };
        for child in children {
            if let Some(mut child) = self.tree.get_mut(child) {
                child.detach();
            }
        }
        let Some(mut target) = self.tree.get_mut(node) else {
            return false;
        };
        let markup = target.append(DomNode::Markup(html.to_string())).id();
        self.notify(MutationRecord {
            target: node,
            added_nodes: vec![markup],
        });
        true
    }
}

/// Shared handle to a document; clones see the same tree.
#[derive(Debug, Clone)]
pub struct Document {
    inner: Arc<Mutex<Inner>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                tree: Tree::new(DomNode::Document),
                observations: Vec::new(),
                next_registration: 0,
            })),
        }
    }

    /// Build a document from a full HTML page.
    pub fn parse(html: &str) -> Self {
        let source = Html::parse_document(html);
        let document = Self::new();
        {
            let mut inner = document.lock();
            let root = inner.tree.root().id();
            import(&mut inner.tree, root, *source.root_element(), false);
        }
        document
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn root(&self) -> NodeId {
        self.lock().tree.root().id()
    }

    /// Serialize the whole document.
    pub fn html(&self) -> String {
        let inner = self.lock();
        let mut out = String::new();
        for child in inner.tree.root().children() {
            serialize(child, &mut out);
        }
        out
    }

    pub fn element(&self, node: NodeId) -> Option<ElementData> {
        match self.lock().tree.get(node)?.value() {
            DomNode::Element(data) => Some(data.clone()),
            _ => None,
        }
    }

    /// Serialized content of an element, `None` for anything else.
    pub fn inner_html(&self, node: NodeId) -> Option<String> {
        self.lock().inner_html(node)
    }

    pub fn outer_html(&self, node: NodeId) -> Option<String> {
        let inner = self.lock();
        let node = inner.tree.get(node)?;
        let mut out = String::new();
        serialize(node, &mut out);
        Some(out)
    }

    /// Replace an element's children with `html`, kept verbatim.
    ///
    /// Returns false when `node` is not an element.
    pub fn set_inner_html(&self, node: NodeId, html: &str) -> bool {
        self.lock().set_inner_html(node, html)
    }

    /// Like [`Document::set_inner_html`], but only while the content still
    /// serializes to `expected`. Returns false and leaves the node alone
    /// otherwise.
    pub fn replace_inner_html(
        &self,
        node: NodeId,
        expected: &str,
        html: &str,
    ) -> bool {
        let mut inner = self.lock();
        if inner.inner_html(node).as_deref() != Some(expected) {
            return false;
        }
        inner.set_inner_html(node, html)
    }

    /// Parse `html` as a fragment and append its top-level nodes to `parent`.
    pub fn append_html(&self, parent: NodeId, html: &str) -> Vec<NodeId> {
        let fragment = Html::parse_fragment(html);
        let mut inner = self.lock();
        if !inner.is_parent_node(parent) {
            return Vec::new();
        }
        let raw_text = match inner.tree.get(parent).map(|n| n.value()) {
            Some(DomNode::Element(data)) => {
                RAW_TEXT_ELEMENTS.contains(&data.tag.as_str())
            }
            _ => false,
        };
        let added: Vec<NodeId> = fragment
            .root_element()
            .children()
            .filter_map(|child| import(&mut inner.tree, parent, child, raw_text))
            .collect();
        if !added.is_empty() {
            inner.notify(MutationRecord {
                target: parent,
                added_nodes: added.clone(),
            });
        }
        added
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> bool {
        let mut inner = self.lock();
        let Some(mut target) = inner.tree.get_mut(node) else {
            return false;
        };
        match target.value() {
            DomNode::Element(data) => {
                data.set_attr(name, value);
                true
            }
            _ => false,
        }
    }

    /// First element in document order satisfying `pred`.
    pub fn find_first(
        &self,
        pred: impl Fn(&ElementData) -> bool,
    ) -> Option<NodeId> {
        let inner = self.lock();
        let found = inner.tree.root().descendants().find_map(|n| match n.value()
        {
            DomNode::Element(data) if pred(data) => Some(n.id()),
            _ => None,
        });
        found
    }

    pub fn body(&self) -> Option<NodeId> {
        self.find_first(|e| e.tag == "body")
    }

    /// Element ids in the subtree of `node`, itself included, in pre-order.
    pub fn subtree_elements(&self, node: NodeId) -> Vec<NodeId> {
        let inner = self.lock();
        let Some(node) = inner.tree.get(node) else {
            return Vec::new();
        };
        let elements = node
            .descendants()
            .filter(|n| matches!(n.value(), DomNode::Element(_)))
            .map(|n| n.id())
            .collect();
        elements
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let inner = self.lock();
        let is_ancestor = inner
            .tree
            .get(node)
            .is_some_and(|n| n.ancestors().any(|a| a.id() == ancestor));
        is_ancestor
    }

    /// Start receiving child-list records for `target` and its whole subtree.
    pub fn observe(
        &self,
        target: NodeId,
    ) -> (Registration, mpsc::UnboundedReceiver<MutationRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        let registration = Registration(inner.next_registration);
        inner.next_registration += 1;
        inner.observations.push(Observation {
            registration,
            target,
            tx,
        });
        (registration, rx)
    }

    pub fn disconnect(&self, registration: Registration) {
        self.lock()
            .observations
            .retain(|o| o.registration != registration);
    }

    pub fn observer_count(&self) -> usize {
        let mut inner = self.lock();
        inner.observations.retain(|o| !o.tx.is_closed());
        inner.observations.len()
    }
}

/// Copy a scraper subtree under `parent`, returning the id of the copy.
fn import(
    tree: &mut Tree<DomNode>,
    parent: NodeId,
    source: NodeRef<'_, scraper::Node>,
    raw_text: bool,
) -> Option<NodeId> {
    let value = match source.value() {
        scraper::Node::Element(el) => DomNode::Element(ElementData {
            tag: el.name().to_string(),
            attrs: el
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }),
        scraper::Node::Text(text) => {
            let text: &str = text;
            if raw_text {
                DomNode::Markup(text.to_string())
            } else {
                let mut escaped = String::new();
                let _ = escape_html_body_text(&mut escaped, text);
                DomNode::Markup(escaped)
            }
        }
        scraper::Node::Comment(comment) => {
            let comment: &str = comment;
            DomNode::Markup(format!("<!--{}-->", comment))
        }
        _ => return None,
    };

    let raw_children = match &value {
        DomNode::Element(data) => RAW_TEXT_ELEMENTS.contains(&data.tag.as_str()),
        _ => false,
    };
    let id = tree.get_mut(parent)?.append(value).id();
    for child in source.children() {
        import(tree, id, child, raw_children);
    }
    Some(id)
}

fn serialize(node: NodeRef<'_, DomNode>, out: &mut String) {
    match node.value() {
        DomNode::Document => {
            for child in node.children() {
                serialize(child, out);
            }
        }
        DomNode::Markup(html) => out.push_str(html),
        DomNode::Element(data) => {
            out.push('<');
            out.push_str(&data.tag);
            for (name, value) in &data.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                let _ = escape_html(&mut *out, value);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&data.tag.as_str()) {
                return;
            }
            for child in node.children() {
                serialize(child, out);
            }
            out.push_str("</");
            out.push_str(&data.tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    const PAGE: &str = r#"<html><head></head><body><div id="chat"><p>old</p></div><footer id="bar"></footer></body></html>"#;

    fn by_id(document: &Document, id: &str) -> NodeId {
        document.find_first(|e| e.attr("id") == Some(id)).unwrap()
    }

    #[test]
    fn test_parse_and_serialize() {
        let document = Document::parse(PAGE);
        assert_snapshot!(document.html(), @r#"<html><head></head><body><div id="chat"><p>old</p></div><footer id="bar"></footer></body></html>"#);
    }

    #[test]
    fn test_set_inner_html_is_verbatim() {
        let document = Document::parse(PAGE);
        let chat = by_id(&document, "chat");
        let html = "a  <b   >x</b> &amp; <br/>";
        assert!(document.set_inner_html(chat, html));
        assert_eq!(document.inner_html(chat).unwrap(), html);
    }

    #[test]
    fn test_append_html_escapes_text() {
        let document = Document::parse(PAGE);
        let bar = by_id(&document, "bar");
        let added = document.append_html(bar, "<span>1 &lt; 2</span>tail");
        assert_eq!(added.len(), 2);
        assert_snapshot!(document.inner_html(bar).unwrap(), @"<span>1 &lt; 2</span>tail");
    }

    #[test]
    fn test_inner_html_of_markup_is_none() {
        let document = Document::parse(PAGE);
        let bar = by_id(&document, "bar");
        let added = document.append_html(bar, "text");
        assert_eq!(document.inner_html(added[0]), None);
        assert!(!document.set_inner_html(added[0], "x"));
    }

    #[tokio::test]
    async fn test_observe_subtree() {
        let document = Document::parse(PAGE);
        let chat = by_id(&document, "chat");
        let bar = by_id(&document, "bar");
        let (_, mut rx) = document.observe(chat);

        let paragraph = document.find_first(|e| e.tag == "p").unwrap();
        let added = document.append_html(paragraph, "<i>deep</i>");
        document.append_html(bar, "<i>elsewhere</i>");

        let record = rx.recv().await.unwrap();
        assert_eq!(record.target, paragraph);
        assert_eq!(record.added_nodes, added);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disconnect() {
        let document = Document::parse(PAGE);
        let chat = by_id(&document, "chat");
        let (registration, mut rx) = document.observe(chat);
        assert_eq!(document.observer_count(), 1);

        document.disconnect(registration);
        document.append_html(chat, "<p>new</p>");
        assert_eq!(document.observer_count(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_subtree_elements() {
        let document = Document::parse(
            r#"<html><body><div id="a">x<p id="b"><i id="c"></i></p></div><p id="d"></p></body></html>"#,
        );
        let a = by_id(&document, "a");
        let ids: Vec<_> = document
            .subtree_elements(a)
            .into_iter()
            .map(|n| document.element(n).unwrap().attr("id").unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(document.is_ancestor(a, by_id(&document, "c")));
        assert!(!document.is_ancestor(a, by_id(&document, "d")));
        assert!(!document.is_ancestor(a, a));
    }

    #[test]
    fn test_set_attribute() {
        let document = Document::parse(PAGE);
        let bar = by_id(&document, "bar");
        document.set_attribute(bar, "class", "a \"b\"");
        assert_snapshot!(
            document.outer_html(bar).unwrap(),
            @r#"<footer id="bar" class="a &quot;b&quot;"></footer>"#
        );
    }

    #[test]
    fn test_replace_inner_html_requires_unchanged_content() {
        let document = Document::parse(PAGE);
        let chat = by_id(&document, "chat");
        assert!(!document.replace_inner_html(chat, "<p>stale</p>", "new"));
        assert_eq!(document.inner_html(chat).unwrap(), "<p>old</p>");

        assert!(document.replace_inner_html(chat, "<p>old</p>", "new"));
        assert_eq!(document.inner_html(chat).unwrap(), "new");
    }
}
