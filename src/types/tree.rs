//! Document Tree
//!
//! The typed, attributed, hierarchical model produced by parsing. A tree
//! represents collection/teamproject/namespace/class/member structure and is
//! the unit exchanged between the parser, the merge engine, and the page
//! flattener.
//!
//! Node identity for merge purposes is the `(tag, attributes)` pair, compared
//! as an unordered attribute set. Child order matters for rendering, never
//! for equivalence.

use serde::{Deserialize, Serialize};

/// Well-known node tags.
pub mod tag {
    pub const COLLECTION: &str = "collection";
    pub const TEAMPROJECT: &str = "teamproject";
    pub const NAMESPACE: &str = "namespace";
    pub const CLASS: &str = "class";
    pub const PROPERTIES: &str = "properties";
    pub const PROPERTY: &str = "property";
    pub const METHODS: &str = "methods";
    pub const METHOD: &str = "method";
    pub const ACCESSORS: &str = "accessors";
    pub const ACCESSOR: &str = "accessor";
    pub const PARAMS: &str = "params";
    pub const PARAM: &str = "param";
    pub const ATTRIBUTE: &str = "attribute";
    pub const SCOPE: &str = "scope";
    pub const MODIFIERS: &str = "modifiers";
    pub const RETURNTYPE: &str = "returntype";
    pub const RETURNS: &str = "returns";
    pub const SUMMARY: &str = "summary";
}

/// Well-known attribute names.
pub mod attr {
    pub const NAME: &str = "name";
    pub const BASECLASS: &str = "baseclass";
    pub const TYPE: &str = "type";
    pub const REQUIRED: &str = "required";
}

/// A single structural unit of the document tree.
///
/// Attribute keys are unique; insertion order is preserved for serialization
/// but ignored by [`DocNode::equivalent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocNode {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<DocNode>,
    text: Option<String>,
}

impl DocNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Create a leaf element carrying only text content.
    pub fn text_node(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(tag).with_text(text)
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: DocNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Set an attribute, overwriting any existing value under the same key.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The `name` attribute, present on every addressable node.
    pub fn name(&self) -> Option<&str> {
        self.attr(attr::NAME)
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn push(&mut self, child: DocNode) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[DocNode] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<DocNode> {
        &mut self.children
    }

    /// First direct child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&DocNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Text content of the first direct child with the given tag, or `""`.
    pub fn child_text(&self, tag: &str) -> &str {
        self.child(tag).and_then(|c| c.text()).unwrap_or("")
    }

    pub fn has_child(&self, tag: &str) -> bool {
        self.child(tag).is_some()
    }

    /// All descendants (any depth) with the given tag, in document order.
    pub fn descendants<'a>(&'a self, tag: &'a str) -> Vec<&'a DocNode> {
        let mut out = Vec::new();
        for child in &self.children {
            if child.tag == tag {
                out.push(child);
            }
            out.extend(child.descendants(tag));
        }
        out
    }

    /// Apply `f` to every descendant with the given tag.
    pub fn for_each_descendant_mut<F>(&mut self, tag: &str, f: &mut F)
    where
        F: FnMut(&mut DocNode),
    {
        for child in &mut self.children {
            if child.tag == tag {
                f(child);
            }
            child.for_each_descendant_mut(tag, f);
        }
    }

    /// Structural equivalence: same tag and the same attribute set, compared
    /// as an unordered collection of key/value pairs.
    pub fn equivalent(&self, other: &DocNode) -> bool {
        if self.tag != other.tag {
            return false;
        }
        if self.attributes.len() != other.attributes.len() {
            return false;
        }
        self.attributes
            .iter()
            .all(|(k, v)| other.attr(k) == Some(v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_attr_overwrites() {
        let mut node = DocNode::new(tag::PARAM).with_attr("name", "foo");
        node.set_attr("name", "bar");
        assert_eq!(node.attr("name"), Some("bar"));
        assert_eq!(node.attributes().len(), 1);
    }

    #[test]
    fn test_equivalence_ignores_attribute_order() {
        let a = DocNode::new(tag::CLASS)
            .with_attr("name", "Widget")
            .with_attr("baseclass", "Base");
        let b = DocNode::new(tag::CLASS)
            .with_attr("baseclass", "Base")
            .with_attr("name", "Widget");
        assert!(a.equivalent(&b));
        assert!(b.equivalent(&a));
    }

    #[test]
    fn test_equivalence_breaks_on_value_change() {
        let a = DocNode::new(tag::CLASS).with_attr("name", "Widget");
        let b = DocNode::new(tag::CLASS).with_attr("name", "Gadget");
        assert!(!a.equivalent(&b));
    }

    #[test]
    fn test_equivalence_breaks_on_attribute_count() {
        let a = DocNode::new(tag::CLASS).with_attr("name", "Widget");
        let b = DocNode::new(tag::CLASS)
            .with_attr("name", "Widget")
            .with_attr("baseclass", "Base");
        assert!(!a.equivalent(&b));
        assert!(!b.equivalent(&a));
    }

    #[test]
    fn test_equivalence_breaks_on_tag() {
        let a = DocNode::new(tag::CLASS).with_attr("name", "Widget");
        let b = DocNode::new(tag::METHOD).with_attr("name", "Widget");
        assert!(!a.equivalent(&b));
    }

    #[test]
    fn test_equivalence_no_attributes() {
        assert!(DocNode::new(tag::PARAMS).equivalent(&DocNode::new(tag::PARAMS)));
    }

    #[test]
    fn test_descendants_document_order() {
        let tree = DocNode::new(tag::METHOD)
            .with_child(
                DocNode::new(tag::PARAMS)
                    .with_child(DocNode::new(tag::PARAM).with_attr("name", "a"))
                    .with_child(DocNode::new(tag::PARAM).with_attr("name", "b")),
            )
            .with_child(DocNode::new(tag::RETURNTYPE));
        let params = tree.descendants(tag::PARAM);
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].attr("name"), Some("a"));
        assert_eq!(params[1].attr("name"), Some("b"));
    }

    #[test]
    fn test_for_each_descendant_mut() {
        let mut tree = DocNode::new(tag::METHOD).with_child(
            DocNode::new(tag::PARAMS).with_child(DocNode::new(tag::PARAM).with_attr("name", "a")),
        );
        tree.for_each_descendant_mut(tag::PARAM, &mut |p| p.set_attr("type", "int"));
        assert_eq!(tree.descendants(tag::PARAM)[0].attr("type"), Some("int"));
    }
}
