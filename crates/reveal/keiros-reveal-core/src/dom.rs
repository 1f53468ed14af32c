//! Read-only DOM access used while wiring the page.
//!
//! The core never touches a live document. Hosts implement [`DomQuery`] (the wasm
//! adapter forwards to JS callbacks); [`StaticDom`] is an in-memory snapshot for
//! tests, fixtures and hosts that prefer to ship the relevant nodes as JSON.

use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::Chars;

use serde::{Deserialize, Serialize};

use crate::ids::ElementId;

pub trait DomQuery {
    /// All elements matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<ElementId>;
    /// Descendants of `root` matching `selector`, in document order.
    fn query_within(&self, root: ElementId, selector: &str) -> Vec<ElementId>;
    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;
    fn previous_sibling(&self, element: ElementId) -> Option<ElementId>;
    fn next_sibling(&self, element: ElementId) -> Option<ElementId>;

    fn query_first(&self, selector: &str) -> Option<ElementId> {
        self.query_all(selector).into_iter().next()
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.attribute(element, "class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: ElementId,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub parent: Option<ElementId>,
}

/// Snapshot of element nodes in document order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticDom {
    pub nodes: Vec<NodeSnapshot>,
}

impl StaticDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node; ids are handed out in insertion (document) order.
    pub fn push(&mut self, tag: &str, classes: &[&str], parent: Option<ElementId>) -> ElementId {
        let id = ElementId(self.nodes.len() as u32);
        self.nodes.push(NodeSnapshot {
            id,
            tag: tag.to_string(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            attributes: BTreeMap::new(),
            parent,
        });
        id
    }

    pub fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(node) = self.node_mut(element) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn index_of(&self, element: ElementId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == element)
    }

    fn node(&self, element: ElementId) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|n| n.id == element)
    }

    fn node_mut(&mut self, element: ElementId) -> Option<&mut NodeSnapshot> {
        self.nodes.iter_mut().find(|n| n.id == element)
    }

    fn is_descendant(&self, node: &NodeSnapshot, root: ElementId) -> bool {
        let mut cur = node.parent;
        while let Some(p) = cur {
            if p == root {
                return true;
            }
            cur = self.node(p).and_then(|n| n.parent);
        }
        false
    }

    fn matches(&self, node: &NodeSnapshot, selector: &SelectorList) -> bool {
        selector
            .0
            .iter()
            .any(|complex| self.matches_complex(node, complex))
    }

    /// Right-to-left descendant matching; greedy ancestor search is exact for ` ` only.
    fn matches_complex(&self, node: &NodeSnapshot, complex: &[Compound]) -> bool {
        let Some((last, rest)) = complex.split_last() else {
            return false;
        };
        if !last.matches(node) {
            return false;
        }
        let mut remaining = rest.iter().rev().peekable();
        let mut cur = node.parent.and_then(|p| self.node(p));
        while let Some(anc) = cur {
            let Some(want) = remaining.peek() else {
                break;
            };
            if want.matches(anc) {
                remaining.next();
            }
            cur = anc.parent.and_then(|p| self.node(p));
        }
        remaining.peek().is_none()
    }

    fn select(&self, selector: &str, keep: impl Fn(&NodeSnapshot) -> bool) -> Vec<ElementId> {
        let Some(list) = SelectorList::parse(selector) else {
            log::debug!("unsupported selector '{selector}'");
            return Vec::new();
        };
        self.nodes
            .iter()
            .filter(|n| keep(n) && self.matches(n, &list))
            .map(|n| n.id)
            .collect()
    }
}

impl DomQuery for StaticDom {
    fn query_all(&self, selector: &str) -> Vec<ElementId> {
        self.select(selector, |_| true)
    }

    fn query_within(&self, root: ElementId, selector: &str) -> Vec<ElementId> {
        self.select(selector, |n| self.is_descendant(n, root))
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        let node = self.node(element)?;
        match name {
            "class" => Some(node.classes.join(" ")),
            _ => node.attributes.get(name).cloned(),
        }
    }

    fn previous_sibling(&self, element: ElementId) -> Option<ElementId> {
        let idx = self.index_of(element)?;
        let parent = self.nodes[idx].parent;
        self.nodes[..idx]
            .iter()
            .rev()
            .find(|n| n.parent == parent)
            .map(|n| n.id)
    }

    fn next_sibling(&self, element: ElementId) -> Option<ElementId> {
        let idx = self.index_of(element)?;
        let parent = self.nodes[idx].parent;
        self.nodes[idx + 1..]
            .iter()
            .find(|n| n.parent == parent)
            .map(|n| n.id)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrOp)>,
}

impl Compound {
    fn matches(&self, node: &NodeSnapshot) -> bool {
        if let Some(tag) = &self.tag {
            if !node.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.attributes.get("id") != Some(id) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| node.classes.contains(c)) {
            return false;
        }
        self.attrs.iter().all(|(name, op)| {
            let value = node.attributes.get(name);
            match op {
                AttrOp::Exists => value.is_some(),
                AttrOp::Equals(v) => value == Some(v),
                AttrOp::Prefix(p) => value.is_some_and(|v| v.starts_with(p.as_str())),
            }
        })
    }
}

/// Comma-separated list of descendant chains of compound selectors.
#[derive(Clone, Debug, PartialEq)]
struct SelectorList(Vec<Vec<Compound>>);

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl SelectorList {
    fn parse(input: &str) -> Option<Self> {
        let mut list = Vec::new();
        for part in split_outside_brackets(input, |c| c == ',') {
            let chain = split_outside_brackets(part, char::is_whitespace)
                .into_iter()
                .filter(|s| !s.is_empty())
                .map(parse_compound)
                .collect::<Option<Vec<_>>>()?;
            if chain.is_empty() {
                return None;
            }
            list.push(chain);
        }
        if list.is_empty() {
            None
        } else {
            Some(Self(list))
        }
    }
}

fn split_outside_brackets(input: &str, sep: impl Fn(char) -> bool) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, c) if depth == 0 && sep(c) => {
                out.push(input[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    out.push(input[start..].trim());
    out
}

fn take_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut s = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident(c) {
            break;
        }
        s.push(c);
        chars.next();
    }
    s
}

fn parse_compound(input: &str) -> Option<Compound> {
    let mut out = Compound::default();
    let mut chars = input.chars().peekable();

    if chars.peek().copied().is_some_and(is_ident) {
        out.tag = Some(take_ident(&mut chars));
    } else if chars.peek() == Some(&'*') {
        chars.next();
    }

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                let name = take_ident(&mut chars);
                if name.is_empty() {
                    return None;
                }
                out.classes.push(name);
            }
            '#' => {
                let name = take_ident(&mut chars);
                if name.is_empty() {
                    return None;
                }
                out.id = Some(name);
            }
            '[' => {
                let mut body = String::new();
                let mut quote: Option<char> = None;
                loop {
                    let c = chars.next()?;
                    match (quote, c) {
                        (None, ']') => break,
                        (Some(q), c) if c == q => quote = None,
                        (None, '"' | '\'') => quote = Some(c),
                        _ => body.push(c),
                    }
                }
                out.attrs.push(parse_attr(&body)?);
            }
            _ => return None,
        }
    }
    Some(out)
}

fn parse_attr(body: &str) -> Option<(String, AttrOp)> {
    if let Some((name, value)) = body.split_once("^=") {
        return Some((name.trim().to_string(), AttrOp::Prefix(value.to_string())));
    }
    if let Some((name, value)) = body.split_once('=') {
        return Some((name.trim().to_string(), AttrOp::Equals(value.to_string())));
    }
    let name = body.trim();
    if name.is_empty() || !name.chars().all(is_ident) {
        return None;
    }
    Some((name.to_string(), AttrOp::Exists))
}
