//! Doc-Comment Interpreter
//!
//! Converts the block of `///` documentation lines preceding a declaration
//! into structured tree nodes. The stripped lines are wrapped in a synthetic
//! root element and parsed as an XML fragment:
//!
//! - `param` tags collect under a single `params` node; a missing `name`
//!   attribute is forced to `"UnnamedParam"` so every parameter stays
//!   addressable for signature reconciliation.
//! - `returns` may contribute a sibling `returntype` node from its `type`
//!   attribute; inner content that parses as a self-contained fragment is
//!   replaced by an indented `<pre>` rendering with spaces escaped.
//! - `summary` is dropped when nothing but the comment leader remains.
//! - any other tag becomes a same-named node carrying its inner content.
//!
//! A block that fails to parse as markup is dropped wholesale and the
//! declaration keeps its signature-derived nodes; the caller branches on the
//! `Option` rather than relying on unwinding.

use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::Event;
use regex::Regex;

use crate::types::tree::{attr, tag};
use crate::types::DocNode;

/// Placeholder identity for doc-comment parameters declared without a name.
pub const UNNAMED_PARAM: &str = "UnnamedParam";

static COMMENT_LEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*///\s*(.+)$").expect("comment leader pattern"));

/// Interpret a raw block of `///` lines into member children, in document
/// order with any collected `params` node last.
///
/// Returns `None` when the block is empty or is not well-formed markup.
pub fn interpret(raw: &str) -> Option<Vec<DocNode>> {
    let stripped = COMMENT_LEADER.replace_all(raw, "$1");
    if stripped.trim().is_empty() {
        return None;
    }

    let wrapped = format!("<headers>{}</headers>", stripped);
    parse_headers(&wrapped)
}

fn parse_headers(wrapped: &str) -> Option<Vec<DocNode>> {
    let mut reader = Reader::from_str(wrapped);
    let mut nodes = Vec::new();
    let mut params: Option<DocNode> = None;

    // Consume the synthetic root, then walk its direct children. Free text
    // between tags is skipped; only elements produce nodes.
    match reader.read_event().ok()? {
        Event::Start(e) if e.name().as_ref() == b"headers" => {}
        _ => return None,
    }

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = element_name(e.name().as_ref())?;
                let attributes = element_attributes(&e)?;
                let inner = reader.read_text(e.name()).ok()?.into_owned();
                handle_element(&name, attributes, &inner, &mut nodes, &mut params);
            }
            Ok(Event::Empty(e)) => {
                let name = element_name(e.name().as_ref())?;
                let attributes = element_attributes(&e)?;
                handle_element(&name, attributes, "", &mut nodes, &mut params);
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"headers" => break,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return None,
        }
    }

    if let Some(params) = params {
        nodes.push(params);
    }
    Some(nodes)
}

fn element_name(raw: &[u8]) -> Option<String> {
    std::str::from_utf8(raw).ok().map(str::to_string)
}

fn element_attributes(e: &quick_xml::events::BytesStart<'_>) -> Option<Vec<(String, String)>> {
    let mut out = Vec::new();
    for attribute in e.attributes() {
        let attribute = attribute.ok()?;
        let key = element_name(attribute.key.as_ref())?;
        let value = attribute.unescape_value().ok()?.into_owned();
        out.push((key, value));
    }
    Some(out)
}

fn handle_element(
    name: &str,
    attributes: Vec<(String, String)>,
    inner: &str,
    nodes: &mut Vec<DocNode>,
    params: &mut Option<DocNode>,
) {
    let value = inner.trim();
    match name {
        tag::PARAM => {
            let mut param = DocNode::text_node(tag::PARAM, value);
            for (key, val) in attributes {
                param.set_attr(key, val);
            }
            if param.attr(attr::NAME).is_none() {
                param.set_attr(attr::NAME, UNNAMED_PARAM);
            }
            params
                .get_or_insert_with(|| DocNode::new(tag::PARAMS))
                .push(param);
        }
        tag::RETURNS => {
            if let Some((_, return_type)) = attributes.iter().find(|(k, _)| k == attr::TYPE) {
                nodes.push(DocNode::text_node(tag::RETURNTYPE, return_type.clone()));
            }
            let text = match pretty_fragment(value) {
                Some(pretty) => {
                    format!("<pre>\n{}\n</pre>", pretty.replace(' ', "&nbsp;"))
                }
                None => value.to_string(),
            };
            nodes.push(DocNode::text_node(tag::RETURNS, text));
        }
        tag::SUMMARY => {
            if !value.is_empty() && value != "///" {
                nodes.push(DocNode::text_node(tag::SUMMARY, value));
            }
        }
        other => {
            nodes.push(DocNode::text_node(other, value));
        }
    }
}

/// Re-parse embedded example markup and return an indented rendering, or
/// `None` when it is not a self-contained fragment (single root, well
/// formed). The caller keeps the raw content on `None`.
fn pretty_fragment(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }

    let mut reader = Reader::from_str(value);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
                writer.write_event(Event::Start(e.into_owned())).ok()?;
            }
            Ok(Event::Empty(e)) => {
                if depth == 0 {
                    roots += 1;
                }
                writer.write_event(Event::Empty(e.into_owned())).ok()?;
            }
            Ok(Event::End(e)) => {
                depth = depth.checked_sub(1)?;
                writer.write_event(Event::End(e.into_owned())).ok()?;
            }
            Ok(Event::Text(e)) => {
                // Bare text outside a root makes this prose, not markup.
                if depth == 0 && !e.unescape().ok()?.trim().is_empty() {
                    return None;
                }
                writer.write_event(Event::Text(e.into_owned())).ok()?;
            }
            Ok(event) => {
                writer.write_event(event.into_owned()).ok()?;
            }
            Err(_) => return None,
        }
    }

    if roots != 1 || depth != 0 {
        return None;
    }
    String::from_utf8(writer.into_inner()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_and_param() {
        let raw = "/// <summary>Runs the job.</summary>\n/// <param name=\"count\">How many times.</param>\n";
        let nodes = interpret(raw).unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].tag(), tag::SUMMARY);
        assert_eq!(nodes[0].text(), Some("Runs the job."));

        let params = &nodes[1];
        assert_eq!(params.tag(), tag::PARAMS);
        let param = &params.children()[0];
        assert_eq!(param.attr("name"), Some("count"));
        assert_eq!(param.text(), Some("How many times."));
    }

    #[test]
    fn test_param_without_name_gets_placeholder() {
        let raw = "/// <param>mystery input</param>\n";
        let nodes = interpret(raw).unwrap();
        let param = &nodes[0].children()[0];
        assert_eq!(param.attr("name"), Some(UNNAMED_PARAM));
    }

    #[test]
    fn test_param_keeps_extra_attributes() {
        let raw = "/// <param name=\"id\" required=\"yes\">the id</param>\n";
        let nodes = interpret(raw).unwrap();
        let param = &nodes[0].children()[0];
        assert_eq!(param.attr("required"), Some("yes"));
        assert_eq!(param.attr("name"), Some("id"));
    }

    #[test]
    fn test_empty_summary_dropped() {
        let raw = "/// <summary>///</summary>\n/// <remarks>kept</remarks>\n";
        let nodes = interpret(raw).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].tag(), "remarks");
        assert_eq!(nodes[0].text(), Some("kept"));
    }

    #[test]
    fn test_blank_summary_dropped() {
        let raw = "/// <summary>   </summary>\n";
        let nodes = interpret(raw).unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_returns_type_attribute_emits_returntype() {
        let raw = "/// <returns type=\"bool\">whether it worked</returns>\n";
        let nodes = interpret(raw).unwrap();
        assert_eq!(nodes[0].tag(), tag::RETURNTYPE);
        assert_eq!(nodes[0].text(), Some("bool"));
        assert_eq!(nodes[1].tag(), tag::RETURNS);
        assert_eq!(nodes[1].text(), Some("whether it worked"));
    }

    #[test]
    fn test_returns_with_markup_example_pretty_printed() {
        let raw = "/// <returns><result><code>0</code></result></returns>\n";
        let nodes = interpret(raw).unwrap();
        let text = nodes[0].text().unwrap();
        assert!(text.starts_with("<pre>\n"));
        assert!(text.ends_with("\n</pre>"));
        // Indentation spaces are escaped for rendering fidelity.
        assert!(text.contains("&nbsp;"));
        assert!(!text[5..text.len() - 6].contains(' '));
    }

    #[test]
    fn test_returns_with_prose_kept_raw() {
        let raw = "/// <returns>zero on success</returns>\n";
        let nodes = interpret(raw).unwrap();
        assert_eq!(nodes[0].text(), Some("zero on success"));
    }

    #[test]
    fn test_unknown_tag_passes_through() {
        let raw = "/// <example>x = 1</example>\n";
        let nodes = interpret(raw).unwrap();
        assert_eq!(nodes[0].tag(), "example");
        assert_eq!(nodes[0].text(), Some("x = 1"));
    }

    #[test]
    fn test_malformed_block_dropped() {
        assert!(interpret("/// <summary>unclosed\n").is_none());
        assert!(interpret("/// a < b\n").is_none());
    }

    #[test]
    fn test_empty_block() {
        assert!(interpret("").is_none());
        // A bare leader is not markup; it parses as free text and yields
        // no nodes.
        assert_eq!(interpret("///\n"), Some(vec![]));
    }

    #[test]
    fn test_self_closing_param() {
        let raw = "/// <param name=\"flag\"/>\n";
        let nodes = interpret(raw).unwrap();
        let param = &nodes[0].children()[0];
        assert_eq!(param.attr("name"), Some("flag"));
        assert_eq!(param.text(), Some(""));
    }
}
