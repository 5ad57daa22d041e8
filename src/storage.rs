//! Tree Persistence
//!
//! Saves the cumulative document tree as indented XML and loads it back at
//! the start of the next run, which is what makes successive runs
//! incremental: the freshly parsed trees are merged into the loaded one
//! rather than into an empty root.
//!
//! Loading trims surrounding whitespace from element text, so the indented
//! on-disk form and the in-memory form agree on content.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::types::tree::{attr, tag};
use crate::types::{DocNode, Result, SrcWikiError};

/// Serialize a tree to an XML document string.
pub fn to_xml(tree: &DocNode) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(|e| SrcWikiError::Storage(format!("xml write failed: {e}")))?;
    write_node(&mut writer, tree)?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| SrcWikiError::Storage(format!("invalid utf-8 in xml output: {e}")))
}

fn write_node<W: std::io::Write>(writer: &mut Writer<W>, node: &DocNode) -> Result<()> {
    let mut start = BytesStart::new(node.tag());
    for (key, value) in node.attributes() {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let text = node.text().filter(|t| !t.is_empty());
    if node.children().is_empty() && text.is_none() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| SrcWikiError::Storage(format!("xml write failed: {e}")))?;
        return Ok(());
    }

    let end = start.to_end().into_owned();
    writer
        .write_event(Event::Start(start))
        .map_err(|e| SrcWikiError::Storage(format!("xml write failed: {e}")))?;
    if let Some(text) = text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| SrcWikiError::Storage(format!("xml write failed: {e}")))?;
    }
    for child in node.children() {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(end))
        .map_err(|e| SrcWikiError::Storage(format!("xml write failed: {e}")))?;
    Ok(())
}

/// Parse an XML document string back into a tree.
pub fn from_xml(s: &str) -> Result<DocNode> {
    let mut reader = Reader::from_str(s);
    let mut stack: Vec<DocNode> = Vec::new();
    let mut root: Option<DocNode> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(element_node(&e)?),
            Event::Empty(e) => {
                let node = element_node(&e)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|err| SrcWikiError::Storage(format!("bad text content: {err}")))?;
                let trimmed = text.trim();
                if !trimmed.is_empty()
                    && let Some(open) = stack.last_mut()
                {
                    open.set_text(trimmed);
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| SrcWikiError::Storage("unbalanced element".into()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or_else(|| SrcWikiError::Storage("document has no root element".into()))
}

fn element_node(e: &BytesStart<'_>) -> Result<DocNode> {
    let qname = e.name();
    let name = std::str::from_utf8(qname.as_ref())
        .map_err(|err| SrcWikiError::Storage(format!("bad element name: {err}")))?;
    let mut node = DocNode::new(name);
    for attribute in e.attributes() {
        let attribute =
            attribute.map_err(|err| SrcWikiError::Storage(format!("bad attribute: {err}")))?;
        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|err| SrcWikiError::Storage(format!("bad attribute key: {err}")))?
            .to_string();
        let value = attribute
            .unescape_value()
            .map_err(|err| SrcWikiError::Storage(format!("bad attribute value: {err}")))?
            .into_owned();
        node.set_attr(key, value);
    }
    Ok(node)
}

fn attach(stack: &mut Vec<DocNode>, root: &mut Option<DocNode>, node: DocNode) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push(node),
        None => {
            if root.is_some() {
                return Err(SrcWikiError::Storage("multiple root elements".into()));
            }
            *root = Some(node);
        }
    }
    Ok(())
}

/// Write the tree to `path`, creating parent directories as needed.
pub fn save(tree: &DocNode, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_xml(tree)?)?;
    Ok(())
}

pub fn load(path: &Path) -> Result<DocNode> {
    from_xml(&fs::read_to_string(path)?)
}

/// Load the persisted tree, or start a fresh collection root when no
/// previous run has saved one.
pub fn load_or_default(path: &Path, collection_name: &str) -> Result<DocNode> {
    if path.exists() {
        load(path)
    } else {
        Ok(DocNode::new(tag::COLLECTION).with_attr(attr::NAME, collection_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_tree() -> DocNode {
        DocNode::new(tag::COLLECTION)
            .with_attr(attr::NAME, "Docs")
            .with_child(
                DocNode::new(tag::TEAMPROJECT)
                    .with_attr(attr::NAME, "Core")
                    .with_child(
                        DocNode::new(tag::NAMESPACE)
                            .with_attr(attr::NAME, "Acme")
                            .with_child(
                                DocNode::new(tag::CLASS)
                                    .with_attr(attr::NAME, "Widget")
                                    .with_child(DocNode::text_node(tag::SCOPE, "public"))
                                    .with_child(DocNode::text_node(
                                        tag::SUMMARY,
                                        "A widget & its parts <here>.",
                                    )),
                            ),
                    ),
            )
    }

    #[test]
    fn test_round_trip() {
        let tree = sample_tree();
        let xml = to_xml(&tree).unwrap();
        let loaded = from_xml(&xml).unwrap();
        assert_eq!(loaded, tree);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("tree.xml");
        let tree = sample_tree();

        save(&tree, &path).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, tree);
    }

    #[test]
    fn test_loaded_tree_is_merge_stable() {
        // An incremental run that re-parses identical sources must leave
        // the loaded tree unchanged.
        let tree = sample_tree();
        let mut loaded = from_xml(&to_xml(&tree).unwrap()).unwrap();
        crate::merge::merge_into(&mut loaded, &tree);
        assert_eq!(loaded, tree);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let tree = load_or_default(&dir.path().join("absent.xml"), "Docs").unwrap();
        assert_eq!(tree.tag(), tag::COLLECTION);
        assert_eq!(tree.name(), Some("Docs"));
        assert!(tree.children().is_empty());
    }

    #[test]
    fn test_special_characters_in_attributes() {
        let tree = DocNode::new(tag::CLASS).with_attr(attr::NAME, "Pair<K,V> & \"more\"");
        let xml = to_xml(&tree).unwrap();
        let loaded = from_xml(&xml).unwrap();
        assert_eq!(loaded.name(), Some("Pair<K,V> & \"more\""));
    }

    #[test]
    fn test_escaped_entities_survive() {
        // Page text carries pre-escaped entities; they must not collapse.
        let tree = DocNode::text_node(tag::RETURNS, "<pre>\na&nbsp;=&nbsp;1\n</pre>");
        let xml = to_xml(&tree).unwrap();
        let loaded = from_xml(&xml).unwrap();
        assert_eq!(loaded.text(), tree.text());
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(from_xml("<collection><teamproject></collection>").is_err());
        assert!(from_xml("").is_err());
    }

    #[test]
    fn test_empty_leaf_round_trips_as_empty_element() {
        let tree = DocNode::new(tag::PARAMS);
        let xml = to_xml(&tree).unwrap();
        assert!(xml.contains("<params/>"));
    }
}
