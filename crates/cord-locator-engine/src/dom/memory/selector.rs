//! The `querySelector` subset needed to resolve stored element selectors:
//! type, `#id`, `.class` and `:nth-child(n)` compounds joined by descendant
//! or `>` combinators.

use std::sync::OnceLock;

use regex::Regex;

use super::{MemoryDom, NodeId};
use crate::dom::{Dom, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    nth_child: Option<usize>,
}

/// Compounds left to right; the combinator of the first one is unused
#[derive(Debug, PartialEq)]
struct ComplexSelector {
    parts: Vec<(Combinator, Compound)>,
}

fn compound_regex() -> &'static Regex {
    static COMPOUND_REGEX: OnceLock<Regex> = OnceLock::new();
    COMPOUND_REGEX.get_or_init(|| {
        Regex::new(
            r"^(?P<tag>[A-Za-z][A-Za-z0-9-]*|\*)?(?P<rest>(?:[#.][A-Za-z0-9_-]+)*)(?::nth-child\((?P<nth>\d+)\))?$",
        )
        .expect("Invalid compound selector regex")
    })
}

fn simple_selector_regex() -> &'static Regex {
    static SIMPLE_REGEX: OnceLock<Regex> = OnceLock::new();
    SIMPLE_REGEX.get_or_init(|| {
        Regex::new(r"(?P<kind>[#.])(?P<name>[A-Za-z0-9_-]+)").expect("Invalid simple selector regex")
    })
}

fn parse_compound(token: &str) -> Option<Compound> {
    let captures = compound_regex().captures(token)?;
    let mut compound = Compound {
        tag: captures
            .name("tag")
            .map(|tag| tag.as_str())
            .filter(|tag| *tag != "*")
            .map(str::to_ascii_uppercase),
        nth_child: match captures.name("nth") {
            Some(nth) => Some(nth.as_str().parse().ok()?),
            None => None,
        },
        ..Compound::default()
    };
    if let Some(rest) = captures.name("rest") {
        for simple in simple_selector_regex().captures_iter(rest.as_str()) {
            let name = simple["name"].to_string();
            match &simple["kind"] {
                "#" => compound.id = Some(name),
                _ => compound.classes.push(name),
            }
        }
    }
    Some(compound)
}

fn parse(selector: &str) -> Option<ComplexSelector> {
    let spaced = selector.replace('>', " > ");
    let mut parts = Vec::new();
    let mut pending = None;
    for token in spaced.split_whitespace() {
        if token == ">" {
            if parts.is_empty() || pending.is_some() {
                return None;
            }
            pending = Some(Combinator::Child);
            continue;
        }
        let combinator = pending.take().unwrap_or(Combinator::Descendant);
        parts.push((combinator, parse_compound(token)?));
    }
    if parts.is_empty() || pending.is_some() {
        return None;
    }
    Some(ComplexSelector { parts })
}

fn element_position(dom: &MemoryDom, element: NodeId) -> usize {
    let Some(parent) = dom.parent_node(&element) else {
        return 1;
    };
    dom.child_nodes(&parent)
        .into_iter()
        .filter(|sibling| dom.node_kind(sibling) == NodeKind::Element)
        .position(|sibling| sibling == element)
        .map_or(1, |index| index + 1)
}

fn compound_matches(dom: &MemoryDom, element: NodeId, compound: &Compound) -> bool {
    if compound
        .tag
        .as_ref()
        .is_some_and(|tag| dom.node_name(&element) != *tag)
    {
        return false;
    }
    if compound.id.is_some() && dom.element_id(&element) != compound.id {
        return false;
    }
    let classes = dom.classes(element);
    if !compound
        .classes
        .iter()
        .all(|class_name| classes.contains(class_name))
    {
        return false;
    }
    compound
        .nth_child
        .is_none_or(|nth| element_position(dom, element) == nth)
}

/// Match `selector.parts[..=index]` with `element` as the subject of the last part
fn matches_from(dom: &MemoryDom, element: NodeId, selector: &ComplexSelector, index: usize) -> bool {
    let (combinator, compound) = &selector.parts[index];
    if !compound_matches(dom, element, compound) {
        return false;
    }
    if index == 0 {
        return true;
    }
    match combinator {
        Combinator::Child => dom
            .parent_element(&element)
            .is_some_and(|parent| matches_from(dom, parent, selector, index - 1)),
        Combinator::Descendant => {
            let mut ancestor = dom.parent_element(&element);
            while let Some(candidate) = ancestor {
                if matches_from(dom, candidate, selector, index - 1) {
                    return true;
                }
                ancestor = dom.parent_element(&candidate);
            }
            false
        }
    }
}

/// First element in document order matching `selector`
pub(super) fn query(dom: &MemoryDom, selector: &str) -> Option<NodeId> {
    let Some(parsed) = parse(selector) else {
        log::debug!("Unsupported selector: {selector}");
        return None;
    };
    let last = parsed.parts.len() - 1;
    dom.preorder()
        .into_iter()
        .filter(|node| dom.node_kind(node) == NodeKind::Element)
        .find(|element| matches_from(dom, *element, &parsed, last))
}
