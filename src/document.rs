use indextree::{Arena, NodeId};

use crate::id::{Name, NameId, NameLookup, NamespaceId, NamespaceLookup, PrefixId, PrefixLookup};
use crate::scope::XML_NAMESPACE;
use crate::xmlvalue::{Element, Text, Value, ValueType};

/// A node in a [`Tree`]. A lightweight value that can be copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node(NodeId);

impl Node {
    #[inline]
    pub(crate) fn new(node_id: NodeId) -> Self {
        Node(node_id)
    }

    #[inline]
    pub(crate) fn get(&self) -> NodeId {
        self.0
    }
}

/// Arena storage for element trees built from a
/// [`Reader`](crate::Reader).
///
/// Names, namespace URIs and prefixes are interned: equality of
/// [`NameId`]s is equality of `(namespace, local name)` pairs, and
/// prefixes take no part in it.
pub struct Tree {
    pub(crate) arena: Arena<Value>,
    pub(crate) namespace_lookup: NamespaceLookup,
    pub(crate) prefix_lookup: PrefixLookup,
    pub(crate) name_lookup: NameLookup,
    pub(crate) no_namespace_id: NamespaceId,
    pub(crate) empty_prefix_id: PrefixId,
    pub(crate) xml_namespace_id: NamespaceId,
}

impl Tree {
    /// Create an empty `Tree`.
    pub fn new() -> Self {
        let mut namespace_lookup = NamespaceLookup::new();
        let no_namespace_id = namespace_lookup.get_id(String::new());
        let xml_namespace_id = namespace_lookup.get_id(XML_NAMESPACE.to_string());
        let mut prefix_lookup = PrefixLookup::new();
        let empty_prefix_id = prefix_lookup.get_id(String::new());
        Tree {
            arena: Arena::new(),
            namespace_lookup,
            prefix_lookup,
            name_lookup: NameLookup::new(),
            no_namespace_id,
            empty_prefix_id,
            xml_namespace_id,
        }
    }

    // ---- interning ----

    /// The id of the empty namespace ("no namespace").
    pub fn no_namespace(&self) -> NamespaceId {
        self.no_namespace_id
    }

    /// The id of the fixed XML namespace bound to the `xml` prefix.
    pub fn xml_namespace(&self) -> NamespaceId {
        self.xml_namespace_id
    }

    /// Intern a namespace URI. The empty URI is "no namespace".
    pub fn add_namespace(&mut self, uri: &str) -> NamespaceId {
        self.namespace_lookup.get_id(uri.to_string())
    }

    /// Intern a prefix. The empty prefix stands for the default namespace.
    pub fn add_prefix(&mut self, prefix: &str) -> PrefixId {
        self.prefix_lookup.get_id(prefix.to_string())
    }

    /// Intern a name without a namespace.
    pub fn add_name(&mut self, local: &str) -> NameId {
        let name = Name::new(local, self.no_namespace_id);
        self.name_lookup.get_id(name)
    }

    /// Intern a name in a namespace.
    pub fn add_name_ns(&mut self, local: &str, namespace_id: NamespaceId) -> NameId {
        let name = Name::new(local, namespace_id);
        self.name_lookup.get_id(name)
    }

    /// The URI for an interned namespace id.
    pub fn namespace_str(&self, namespace_id: NamespaceId) -> &str {
        self.namespace_lookup.get_value(namespace_id)
    }

    /// The prefix for an interned prefix id.
    pub fn prefix_str(&self, prefix_id: PrefixId) -> &str {
        self.prefix_lookup.get_value(prefix_id)
    }

    /// The `(local name, namespace id)` pair for an interned name.
    pub fn name_parts(&self, name_id: NameId) -> (&str, NamespaceId) {
        let name = self.name_lookup.get_value(name_id);
        (&name.local, name.namespace_id)
    }

    // ---- creation ----

    /// Create a standalone element node.
    pub fn new_element(&mut self, name_id: NameId) -> Node {
        Node::new(self.arena.new_node(Value::Element(Element::new(name_id))))
    }

    /// Create a standalone text node.
    pub fn new_text(&mut self, text: &str) -> Node {
        Node::new(
            self.arena
                .new_node(Value::Text(Text::new(text.to_string()))),
        )
    }

    /// Append `child` as the last child of `parent`.
    pub fn append(&mut self, parent: Node, child: Node) {
        parent.get().append(child.get(), &mut self.arena);
    }

    // ---- access ----

    /// The value of a node.
    pub fn value(&self, node: Node) -> &Value {
        self.arena
            .get(node.get())
            .expect("node does not belong to this tree")
            .get()
    }

    /// The mutable value of a node.
    pub fn value_mut(&mut self, node: Node) -> &mut Value {
        self.arena
            .get_mut(node.get())
            .expect("node does not belong to this tree")
            .get_mut()
    }

    /// The type of a node's value.
    pub fn value_type(&self, node: Node) -> ValueType {
        self.value(node).value_type()
    }

    /// The element value of a node, if it is an element.
    pub fn element(&self, node: Node) -> Option<&Element> {
        match self.value(node) {
            Value::Element(element) => Some(element),
            _ => None,
        }
    }

    /// The mutable element value of a node, if it is an element.
    pub fn element_mut(&mut self, node: Node) -> Option<&mut Element> {
        match self.value_mut(node) {
            Value::Element(element) => Some(element),
            _ => None,
        }
    }

    /// The text value of a node, if it is a text node.
    pub fn text(&self, node: Node) -> Option<&Text> {
        match self.value(node) {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The string of a text node.
    pub fn text_str(&self, node: Node) -> Option<&str> {
        self.text(node).map(|text| text.get())
    }

    /// The parent of a node.
    pub fn parent(&self, node: Node) -> Option<Node> {
        self.arena
            .get(node.get())
            .and_then(|n| n.parent())
            .map(Node::new)
    }

    /// The first child of a node.
    pub fn first_child(&self, node: Node) -> Option<Node> {
        node.get().children(&self.arena).next().map(Node::new)
    }

    /// The children of a node, in document order.
    pub fn children(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.get().children(&self.arena).map(Node::new)
    }

    /// The text content of an element with only text children; `Some("")`
    /// for a childless element, `None` for mixed content.
    pub fn text_content_str(&self, node: Node) -> Option<&str> {
        let mut children = self.children(node);
        match children.next() {
            None => Some(""),
            Some(child) => {
                if children.next().is_some() {
                    return None;
                }
                self.text_str(child)
            }
        }
    }

    // ---- comparison ----

    /// Infoset equality of two subtrees: namespace, local name, attributes,
    /// text and child structure. Prefixes and namespace declarations take
    /// no part: two documents that spell the same infoset with different
    /// prefixes compare equal.
    pub fn compare(&self, a: Node, b: Node) -> bool {
        match (self.value(a), self.value(b)) {
            (Value::Element(ea), Value::Element(eb)) => {
                if ea.name_id != eb.name_id {
                    return false;
                }
                if ea.attributes.len() != eb.attributes.len() {
                    return false;
                }
                for (name, value) in ea.attributes.iter() {
                    if eb.attributes.get(name).map(|v| v.as_str()) != Some(value.as_str()) {
                        return false;
                    }
                }
                let mut children_a = self.children(a);
                let mut children_b = self.children(b);
                loop {
                    match (children_a.next(), children_b.next()) {
                        (None, None) => return true,
                        (Some(ca), Some(cb)) => {
                            if !self.compare(ca, cb) {
                                return false;
                            }
                        }
                        _ => return false,
                    }
                }
            }
            (Value::Text(ta), Value::Text(tb)) => ta.get() == tb.get(),
            _ => false,
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
