//! Document trees handed to the validation engine
//!
//! The engine never parses XML itself; it walks [`Node`] values. `Node::parse`
//! is a thin adapter over `roxmltree` for callers holding XML text.

use crate::error::{Error, Result};
use crate::namespaces::QName;
use indexmap::IndexMap;

/// An element in the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Element qualified name
    pub name: QName,
    /// Attributes keyed by their qualified name, in document order
    pub attributes: IndexMap<QName, String>,
    /// Child elements in document order
    pub children: Vec<Node>,
    /// Concatenated direct text content (if any)
    pub text: Option<String>,
}

impl Node {
    /// Create a new element with no attributes, children or text
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: IndexMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Add an attribute
    pub fn with_attribute(mut self, name: QName, value: impl Into<String>) -> Self {
        self.attributes.insert(name, value.into());
        self
    }

    /// Add a child element
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.name.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace.as_deref()
    }

    /// Get an attribute value by its exact qualified name
    pub fn attribute(&self, name: &QName) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Text content, or the empty string when the element has none
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Child elements with the given qualified name
    pub fn children_named<'a>(&'a self, name: &'a QName) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| &c.name == name)
    }

    /// Parse the root element of an XML document
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|e| Error::MalformedInput(e.to_string()))?;
        Ok(Self::from_element(doc.root_element()))
    }

    fn from_element(elem: roxmltree::Node<'_, '_>) -> Self {
        let tag = elem.tag_name();
        let mut node = Node::new(QName::new(tag.namespace(), tag.name()));

        for attr in elem.attributes() {
            node.attributes.insert(
                QName::new(attr.namespace(), attr.name()),
                attr.value().to_string(),
            );
        }

        let mut text: Option<String> = None;
        for child in elem.children() {
            if child.is_element() {
                node.children.push(Self::from_element(child));
            } else if let (true, Some(t)) = (child.is_text(), child.text()) {
                text.get_or_insert_with(String::new).push_str(t);
            }
        }
        node.text = text;
        node
    }
}
