//! Structural Parser
//!
//! Heuristic extraction of namespace/class/property/method structure from
//! raw C# source text using layered pattern matching and brace-depth
//! scanning. This is explicitly not a compiler front end: spans that match
//! no pattern are silently absent from the tree, and exactly one top-level
//! namespace block per file is assumed (nested or multiple namespaces are
//! not recognized).
//!
//! The produced sub-tree has the shape
//! `collection → teamproject → namespace(s) → class → {property|method}`
//! and is immutable once returned; the merge engine folds it into the
//! cumulative tree.

use std::sync::LazyLock;

use regex::Regex;

use super::doc_comment;
use crate::types::tree::{attr, tag};
use crate::types::DocNode;

// Pattern table. All patterns are case-insensitive like the member keywords
// they recognize. Class and namespace bodies are captured greedily to the
// last closing brace, which is what bounds the "outermost matching brace
// pair" under the single-namespace assumption.
static NAMESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*namespace\s+([a-zA-Z0-9_\-.]+)\s*\{([\s\S]*)\}\s*$")
        .expect("namespace pattern")
});

static CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)((?:\s*///.*\n)+)?\s*(?:\[(.*)\])?\s*(public|private|protected|internal)?(?:\s+(static|partial|sealed))?\s+class\s+([a-zA-Z0-9\-_]+(?:<[a-zA-Z0-9\-_]+>)?)\s*(?::\s*([a-zA-Z0-9\-_.]+)\s*)?\{([\s\S]*)\}",
    )
    .expect("class pattern")
});

// Property candidates end at the opening brace; whether the brace really
// opens an accessor block is decided by a separate anchored probe, since
// the regex engine has no lookahead.
static PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)((?:\s*///.*\n)+)?\s*(?:\[(.*)\])?\s*(?:(public|private|protected|internal)\s+)(?:(static|override|delegate)*\s+)?(?:([a-zA-Z0-9\-_\[\].]+|<[a-zA-Z0-9\-_\[\]<>., ]+>)\s+)([a-zA-Z0-9\-_]+)\s*\{",
    )
    .expect("property pattern")
});

static ACCESSOR_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:(?:public|private|protected|internal)\s+)?(?:get|set)\s*\{")
        .expect("accessor opener pattern")
});

static ACCESSOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)((?:public|private|protected|internal)\s+)?(get|set)\s*\{")
        .expect("accessor pattern")
});

static METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)((?:\s*///.*\n)+)?\s*(?:\[(.*)\])?\s*(?:(public|private|protected|internal)\s+)(?:(static|override|delegate)*\s+)?(?:([a-zA-Z0-9\-_\[\].]+|<[a-zA-Z0-9\-_\[\]<>., ]+>)\s+)?([a-zA-Z0-9\-_]+)\s*\(([^)]*)\)\s*\{",
    )
    .expect("method pattern")
});

/// Pattern-based structural parser: raw text + path ancestry → document
/// sub-tree. Stateless apart from its configuration; safe to share across
/// workers.
pub struct StructureParser {
    collection_name: String,
    scope_allowlist: Vec<String>,
}

impl StructureParser {
    /// `scope_allowlist` is the configured set of access-scope keywords a
    /// class must carry to be accepted into the tree.
    pub fn new(collection_name: impl Into<String>, scope_allowlist: &[String]) -> Self {
        Self {
            collection_name: collection_name.into(),
            scope_allowlist: scope_allowlist.to_vec(),
        }
    }

    fn scope_allowed(&self, scope: &str) -> bool {
        self.scope_allowlist.iter().any(|s| s == scope)
    }

    /// Parse one file. `ancestry` holds the folder segments from the
    /// workspace root to the file, excluding the filename; the first segment
    /// names the team project. A file with no recognizable namespace yields
    /// a tree with no namespace children.
    pub fn parse(&self, contents: &str, ancestry: &[String]) -> DocNode {
        let contents = contents.replace('\r', "");
        let mut root = DocNode::new(tag::COLLECTION).with_attr(attr::NAME, &self.collection_name);

        match ancestry.split_first() {
            Some((teamproject, rest)) => {
                let mut node = DocNode::new(tag::TEAMPROJECT).with_attr(attr::NAME, teamproject);
                self.parse_namespaces(&mut node, rest, &contents);
                root.push(node);
            }
            // File directly at the workspace root: no teamproject level.
            None => self.parse_namespaces(&mut root, &[], &contents),
        }

        root
    }

    fn parse_namespaces(&self, parent: &mut DocNode, ancestry: &[String], s: &str) {
        let Some(caps) = NAMESPACE.captures(s) else {
            return;
        };
        let declared: Vec<&str> = caps[1].split('.').collect();
        let body = caps.get(2).map_or("", |m| m.as_str());

        // Folder segments often mirror leading namespace segments; drop
        // matching segments from the start of the ancestry so they are not
        // emitted twice.
        let declared_lower: Vec<String> = declared.iter().map(|d| d.to_lowercase()).collect();
        let mut remaining = ancestry;
        while let Some((first, rest)) = remaining.split_first() {
            if declared_lower.contains(&first.to_lowercase()) {
                remaining = rest;
            } else {
                break;
            }
        }

        let mut names: Vec<String> = remaining.iter().map(|a| a.replace(' ', "")).collect();
        names.extend(declared.iter().map(|d| d.to_string()));

        // Build the chain innermost-first, then wrap outward.
        let Some(innermost_name) = names.last() else {
            return;
        };
        let mut chain = DocNode::new(tag::NAMESPACE).with_attr(attr::NAME, innermost_name);
        self.parse_classes(&mut chain, body);
        for name in names[..names.len() - 1].iter().rev() {
            chain = DocNode::new(tag::NAMESPACE)
                .with_attr(attr::NAME, name)
                .with_child(chain);
        }
        parent.push(chain);
    }

    fn parse_classes(&self, namespace: &mut DocNode, s: &str) {
        for caps in CLASS.captures_iter(s) {
            let scope = caps.get(3).map_or("", |m| m.as_str());
            if !self.scope_allowed(scope) {
                continue;
            }

            let mut class = DocNode::new(tag::CLASS);
            append_doc_comment(&mut class, caps.get(1).map_or("", |m| m.as_str()));
            push_text_if_nonempty(&mut class, tag::ATTRIBUTE, caps.get(2));
            if !scope.is_empty() {
                class.push(DocNode::text_node(tag::SCOPE, scope));
            }
            push_text_if_nonempty(&mut class, tag::MODIFIERS, caps.get(4));
            class.set_attr(attr::NAME, &caps[5]);
            if let Some(base) = caps.get(6).filter(|m| !m.as_str().is_empty()) {
                class.set_attr(attr::BASECLASS, base.as_str());
            }

            let body = caps.get(7).map_or("", |m| m.as_str());
            self.parse_properties(&mut class, body);
            self.parse_methods(&mut class, body);

            namespace.push(class);
        }
    }

    fn parse_properties(&self, class: &mut DocNode, s: &str) {
        let mut properties: Option<DocNode> = None;

        for caps in PROPERTY.captures_iter(s) {
            let Some(whole) = caps.get(0) else { continue };
            let rest = &s[whole.end()..];
            if !ACCESSOR_OPENER.is_match(rest) {
                continue;
            }

            let mut property = member_prefix(tag::PROPERTY, &caps);

            let body = accessor_block(rest);
            let mut accessors: Option<DocNode> = None;
            for acc in ACCESSOR.captures_iter(body) {
                let mut accessor = DocNode::new(tag::ACCESSOR);
                if let Some(scope) = acc.get(1).map(|m| m.as_str().trim()).filter(|s| !s.is_empty())
                {
                    accessor.push(DocNode::text_node(tag::SCOPE, scope));
                }
                accessor.set_attr(attr::NAME, &acc[2]);
                accessors
                    .get_or_insert_with(|| DocNode::new(tag::ACCESSORS))
                    .push(accessor);
            }
            if let Some(accessors) = accessors {
                property.push(accessors);
            }

            properties
                .get_or_insert_with(|| DocNode::new(tag::PROPERTIES))
                .push(property);
        }

        if let Some(properties) = properties {
            class.push(properties);
        }
    }

    fn parse_methods(&self, class: &mut DocNode, s: &str) {
        let mut methods: Option<DocNode> = None;

        for caps in METHOD.captures_iter(s) {
            let mut method = member_prefix(tag::METHOD, &caps);

            let params_text = caps.get(7).map_or("", |m| m.as_str());
            if !params_text.trim().is_empty() {
                reconcile_parameters(&mut method, params_text);
            }

            methods
                .get_or_insert_with(|| DocNode::new(tag::METHODS))
                .push(method);
        }

        if let Some(methods) = methods {
            class.push(methods);
        }
    }
}

/// Build the shared member prefix: doc-comment children, attribute blob,
/// scope, modifiers, return type, and the `name` attribute.
fn member_prefix(member_tag: &str, caps: &regex::Captures<'_>) -> DocNode {
    let mut member = DocNode::new(member_tag);
    append_doc_comment(&mut member, caps.get(1).map_or("", |m| m.as_str()));
    push_text_if_nonempty(&mut member, tag::ATTRIBUTE, caps.get(2));
    push_text_if_nonempty(&mut member, tag::SCOPE, caps.get(3));
    push_text_if_nonempty(&mut member, tag::MODIFIERS, caps.get(4));
    // The doc comment may already have contributed a returntype via a typed
    // returns tag; the signature only fills the gap.
    if !member.has_child(tag::RETURNTYPE) {
        member.push(DocNode::text_node(
            tag::RETURNTYPE,
            caps.get(5).map_or("", |m| m.as_str()),
        ));
    }
    member.set_attr(attr::NAME, &caps[6]);
    member
}

fn append_doc_comment(member: &mut DocNode, raw: &str) {
    if let Some(children) = doc_comment::interpret(raw) {
        for child in children {
            member.push(child);
        }
    }
}

fn push_text_if_nonempty(node: &mut DocNode, child_tag: &str, m: Option<regex::Match<'_>>) {
    if let Some(m) = m
        && !m.as_str().is_empty()
    {
        node.push(DocNode::text_node(child_tag, m.as_str()));
    }
}

/// The accessor-block body: everything from the character after the opening
/// brace (already consumed by the property match) to its matching close,
/// found by depth counting starting at 1.
fn accessor_block(rest: &str) -> &str {
    let mut depth = 1usize;
    for (i, b) in rest.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return &rest[..i];
                }
            }
            _ => {}
        }
    }
    rest
}

/// Reconcile signature parameters against doc-comment `param` nodes.
///
/// Each comma-separated token that splits into exactly two words is a
/// `(type, name)` pair; anything else is dropped. A pair whose name matches
/// an existing doc-comment param backfills that param's `type`; pairs with
/// no doc-comment counterpart are synthesized into the `params` block.
fn reconcile_parameters(method: &mut DocNode, params_text: &str) {
    let pairs: Vec<(String, String)> = params_text
        .split(',')
        .filter_map(|token| {
            let mut words = token.split_whitespace();
            match (words.next(), words.next(), words.next()) {
                (Some(ty), Some(name), None) => Some((name.to_string(), ty.to_string())),
                _ => None,
            }
        })
        .collect();

    let documented: Vec<String> = method
        .descendants(tag::PARAM)
        .iter()
        .filter_map(|p| p.name().map(str::to_string))
        .collect();

    if documented.is_empty() {
        // No doc-comment params: the signature alone defines the block.
        let mut params = DocNode::new(tag::PARAMS);
        for (name, ty) in pairs {
            params.push(
                DocNode::new(tag::PARAM)
                    .with_attr(attr::NAME, name)
                    .with_attr(attr::TYPE, ty),
            );
        }
        method.push(params);
        return;
    }

    for (name, ty) in pairs {
        if documented.contains(&name) {
            method.for_each_descendant_mut(tag::PARAM, &mut |param| {
                if param.name() == Some(name.as_str()) {
                    param.set_attr(attr::TYPE, ty.clone());
                }
            });
        } else if let Some(params) = method
            .children_mut()
            .iter_mut()
            .find(|c| c.tag() == tag::PARAMS)
        {
            params.push(
                DocNode::new(tag::PARAM)
                    .with_attr(attr::NAME, name)
                    .with_attr(attr::TYPE, ty),
            );
        }
    }
}
