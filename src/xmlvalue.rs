use vector_map::VecMap;

use crate::id::{NameId, NamespaceId, PrefixId};

/// The type of a tree node, for callers that only need to branch on it.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ValueType {
    /// Element: name, attributes, namespace declarations.
    Element,
    /// Text content.
    Text,
}

/// A value in the tree built by [`Tree::build`](crate::Tree::build).
///
/// The tree carries the minimal infoset: elements and text. Comments and
/// processing instructions are visible in token mode on the reader but have
/// no tree representation.
#[derive(Debug, Clone)]
pub enum Value {
    /// Element: name, attributes, namespace declarations.
    Element(Element),
    /// Text content.
    Text(Text),
}

impl Value {
    /// Returns the type of the value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Element(_) => ValueType::Element,
            Value::Text(_) => ValueType::Text,
        }
    }
}

/// A map of NameId to String for attributes, in document order.
pub type Attributes = VecMap<NameId, String>;
/// A map of PrefixId to NamespaceId for the namespace declarations an
/// element introduces, in document order.
pub type Prefixes = VecMap<PrefixId, NamespaceId>;

/// An element value.
///
/// `prefixes` holds exactly the bindings the element's start tag introduced
/// into scope, no more and no fewer; bindings inherited from ancestors are
/// not repeated here.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub(crate) name_id: NameId,
    pub(crate) prefixes: Prefixes,
    pub(crate) attributes: Attributes,
}

impl Element {
    pub(crate) fn new(name_id: NameId) -> Self {
        Element {
            name_id,
            prefixes: Prefixes::new(),
            attributes: Attributes::new(),
        }
    }

    /// The name of the element.
    pub fn name(&self) -> NameId {
        self.name_id
    }

    /// The attributes of the element.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Get an attribute by name.
    pub fn get_attribute(&self, name_id: NameId) -> Option<&str> {
        self.attributes.get(&name_id).map(|s| s.as_str())
    }

    /// Set an attribute value.
    pub fn set_attribute<S: Into<String>>(&mut self, name_id: NameId, value: S) {
        self.attributes.insert(name_id, value.into());
    }

    /// Add a prefix to namespace declaration.
    pub fn set_prefix(&mut self, prefix_id: PrefixId, namespace_id: NamespaceId) {
        self.prefixes.insert(prefix_id, namespace_id);
    }

    /// The namespace a prefix is declared to map to on this element.
    ///
    /// This does not consult ancestor declarations.
    pub fn get_namespace(&self, prefix_id: PrefixId) -> Option<NamespaceId> {
        self.prefixes.get(&prefix_id).copied()
    }

    /// The namespace declarations this element introduces.
    pub fn prefixes(&self) -> &Prefixes {
        &self.prefixes
    }
}

/// A text value.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub(crate) text: String,
}

impl Text {
    pub(crate) fn new(text: String) -> Self {
        Text { text }
    }

    /// Get the text.
    pub fn get(&self) -> &str {
        &self.text
    }

    /// Set the text.
    pub fn set<S: Into<String>>(&mut self, text: S) {
        self.text = text.into();
    }
}
