//! Wiki Page Flattening
//!
//! Turns the hierarchical document tree into a flat list of addressable
//! pages. A node becomes a page when the traversal can name it: the dotted
//! chain of ancestor names for containers, the full parameter-type
//! signature for methods. The same flattening applied to the previous
//! tree and the new one yields the purge set by title difference.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::wiki::{TITLE_MAX_LEN, UNKNOWN_PARAM_TYPE};
use crate::types::tree::{attr, tag};
use crate::types::{DocNode, Result, SrcWikiError};

/// Characters a wiki title may not carry.
static RESERVED_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[\]{}<>]").expect("reserved chars pattern"));

// =============================================================================
// Page Model
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageKind {
    Collection,
    TeamProject,
    Namespace,
    Class,
    Method,
}

impl PageKind {
    /// Map a tree tag to its page kind. A tag with no mapping reaching this
    /// point is a traversal contract violation and aborts the flatten.
    fn from_tag(t: &str) -> Result<Self> {
        match t {
            tag::COLLECTION => Ok(Self::Collection),
            tag::TEAMPROJECT => Ok(Self::TeamProject),
            tag::NAMESPACE => Ok(Self::Namespace),
            tag::CLASS => Ok(Self::Class),
            tag::METHOD => Ok(Self::Method),
            other => Err(SrcWikiError::UnknownPageKind(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collection => "Collection",
            Self::TeamProject => "TeamProject",
            Self::Namespace => "Namespace",
            Self::Class => "Class",
            Self::Method => "Method",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiPage {
    pub title: String,
    pub kind: PageKind,
    pub text: String,
}

// =============================================================================
// Title Filters
// =============================================================================

/// Publish-time title filter. An empty rule set admits every title; a
/// non-empty set admits titles matching at least one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleFilter {
    Contains(String),
    Equals(String),
}

impl TitleFilter {
    pub fn matches(&self, title: &str) -> bool {
        match self {
            Self::Contains(needle) => title.contains(needle.as_str()),
            Self::Equals(expected) => title == expected,
        }
    }
}

pub fn admits(filters: &[TitleFilter], title: &str) -> bool {
    filters.is_empty() || filters.iter().any(|f| f.matches(title))
}

// =============================================================================
// Flattening
// =============================================================================

/// Flatten a tree into its page list, in traversal order starting at the
/// collection root. Members whose explicit scope is outside `allowlist` are
/// skipped along with their sub-trees; an absent scope passes.
pub fn collect_pages(root: &DocNode, allowlist: &[String]) -> Result<Vec<WikiPage>> {
    let mut pages = Vec::new();
    visit(root, root.name().unwrap_or(""), allowlist, &mut pages)?;
    Ok(pages)
}

fn visit(
    node: &DocNode,
    page_name: &str,
    allowlist: &[String],
    pages: &mut Vec<WikiPage>,
) -> Result<()> {
    let kind = PageKind::from_tag(node.tag())?;
    let title = sanitize_title(page_name);
    pages.push(WikiPage {
        title: title.clone(),
        kind,
        text: render(node, allowlist),
    });

    for child in node.children() {
        if child.tag() == tag::METHODS {
            for method in child.children().iter().filter(|c| c.tag() == tag::METHOD) {
                if method.name().is_some() && scope_visible(method, allowlist) {
                    let link = method_signature(&title, method);
                    visit(method, &link, allowlist, pages)?;
                }
            }
        } else if let Some(name) = child.name()
            && scope_visible(child, allowlist)
        {
            visit(child, &format!("{title}.{name}"), allowlist, pages)?;
        }
    }
    Ok(())
}

fn scope_visible(node: &DocNode, allowlist: &[String]) -> bool {
    match node.child(tag::SCOPE) {
        None => true,
        Some(scope) => {
            let scope = scope.text().unwrap_or("");
            allowlist.iter().any(|s| s == scope)
        }
    }
}

/// Full method page name: `ns.name(type,type)` over every parameter in
/// declaration order, with `unknown` standing in for untyped ones.
pub fn method_signature(ns: &str, method: &DocNode) -> String {
    let types: Vec<&str> = method
        .descendants(tag::PARAM)
        .iter()
        .map(|p| p.attr(attr::TYPE).unwrap_or(UNKNOWN_PARAM_TYPE))
        .collect();
    let name = method.name().unwrap_or("");
    sanitize_title(&format!("{ns}.{name}({})", types.join(",")))
}

/// Replace reserved characters and clamp to the title length limit.
pub fn sanitize_title(title: &str) -> String {
    let title = RESERVED_CHARS.replace_all(title, "-");
    title.chars().take(TITLE_MAX_LEN).collect()
}

/// Accessor names visible under `allowlist`: an accessor with an explicit
/// scope stands on its own, one without inherits the parent property's.
pub fn visible_accessors<'a>(property: &'a DocNode, allowlist: &[String]) -> Vec<&'a str> {
    let parent_scope = property.child_text(tag::SCOPE);
    let allowed = |scope: &str| allowlist.iter().any(|s| s == scope);

    let Some(accessors) = property.child(tag::ACCESSORS) else {
        return Vec::new();
    };
    accessors
        .children()
        .iter()
        .filter(|a| a.tag() == tag::ACCESSOR)
        .filter(|a| {
            let scope = a.child_text(tag::SCOPE);
            allowed(scope) || (scope.is_empty() && allowed(parent_scope))
        })
        .filter_map(|a| a.name())
        .collect()
}

/// Plain-text page body. Rendering stays deliberately minimal; the page
/// model, not the markup, is the product.
fn render(node: &DocNode, allowlist: &[String]) -> String {
    let mut lines: Vec<String> = Vec::new();

    let summary = node.child_text(tag::SUMMARY);
    if !summary.is_empty() {
        lines.push(summary.to_string());
    }

    if let Some(properties) = node.child(tag::PROPERTIES) {
        for property in properties.children().iter().filter(|c| c.tag() == tag::PROPERTY) {
            let accessors = visible_accessors(property, allowlist).join("/");
            lines.push(format!(
                "{} {} {{ {} }}",
                property.child_text(tag::RETURNTYPE),
                property.name().unwrap_or(""),
                accessors
            ));
        }
    }

    if let Some(returns) = node.child(tag::RETURNS).and_then(|r| r.text())
        && !returns.is_empty()
    {
        lines.push(format!("Returns: {returns}"));
    }

    lines.join("\n")
}

// =============================================================================
// Publish-Boundary Diff
// =============================================================================

/// Pages present in `old` whose title no longer appears in `new`; these are
/// the pages to purge from the wiki.
pub fn purge_set(old: &[WikiPage], new: &[WikiPage]) -> Vec<WikiPage> {
    let keep: HashSet<&str> = new.iter().map(|p| p.title.as_str()).collect();
    old.iter()
        .filter(|p| !keep.contains(p.title.as_str()))
        .cloned()
        .collect()
}
