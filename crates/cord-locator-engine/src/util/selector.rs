use std::sync::OnceLock;

use regex::Regex;

use crate::dom::{Dom, NodeKind};

/// Produces a CSS selector that uniquely identifies an element in its document.
///
/// Selectors are stored with annotations and re-queried on later page loads,
/// so they must only depend on the page markup.
pub trait SelectorGenerator {
    fn selector_for<D: Dom>(&self, dom: &D, element: &D::Node) -> Option<String>;
}

/// `#id` when the element has a unique id, otherwise a `tag:nth-child(n)`
/// chain from the closest ancestor that can be identified
#[derive(Debug, Default, Clone, Copy)]
pub struct PathSelectorGenerator;

fn identifier_regex() -> &'static Regex {
    static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("Invalid identifier regex"))
}

impl PathSelectorGenerator {
    fn unique_id_selector<D: Dom>(dom: &D, element: &D::Node) -> Option<String> {
        let id = dom.element_id(element)?;
        if !identifier_regex().is_match(&id) {
            return None;
        }
        let selector = format!("#{id}");
        (dom.query_selector(&selector).as_ref() == Some(element)).then_some(selector)
    }

    fn path_step<D: Dom>(dom: &D, element: &D::Node) -> String {
        let tag = dom.node_name(element).to_ascii_lowercase();
        let Some(parent) = dom.parent_node(element) else {
            return tag;
        };
        let position = dom
            .child_nodes(&parent)
            .into_iter()
            .filter(|sibling| dom.node_kind(sibling) == NodeKind::Element)
            .position(|sibling| &sibling == element)
            .unwrap_or(0);
        format!("{tag}:nth-child({})", position + 1)
    }
}

impl SelectorGenerator for PathSelectorGenerator {
    fn selector_for<D: Dom>(&self, dom: &D, element: &D::Node) -> Option<String> {
        if dom.node_kind(element) != NodeKind::Element {
            return None;
        }

        let mut steps = Vec::new();
        let mut current = element.clone();
        loop {
            if let Some(id_selector) = Self::unique_id_selector(dom, &current) {
                steps.push(id_selector);
                break;
            }
            match dom.parent_element(&current) {
                Some(parent) => {
                    steps.push(Self::path_step(dom, &current));
                    current = parent;
                }
                None => {
                    // Reached <html>
                    steps.push(dom.node_name(&current).to_ascii_lowercase());
                    break;
                }
            }
        }
        steps.reverse();
        let selector = steps.join(" > ");

        // A selector that resolves to another element is worse than none
        (dom.query_selector(&selector).as_ref() == Some(element)).then_some(selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementInit, MemoryDom};
    use crate::tests::viewport;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unique_id_is_preferred() {
        let mut dom = MemoryDom::new(viewport());
        let body = dom.body_id();
        let section = dom.append_element(body, ElementInit::new("section").id("pricing"));

        let selector = PathSelectorGenerator.selector_for(&dom, &section);

        assert_eq!(selector.as_deref(), Some("#pricing"));
    }

    #[test]
    fn test_path_starts_at_closest_identified_ancestor() {
        let mut dom = MemoryDom::new(viewport());
        let body = dom.body_id();
        let article = dom.append_element(body, ElementInit::new("article").id("post"));
        dom.append_element(article, ElementInit::new("h1"));
        dom.append_text(article, "\n", None);
        let second = dom.append_element(article, ElementInit::new("p"));

        let selector = PathSelectorGenerator.selector_for(&dom, &second).unwrap();

        assert_eq!(selector, "#post > p:nth-child(2)");
        assert_eq!(dom.query_selector(&selector), Some(second));
    }

    #[test]
    fn test_duplicate_ids_fall_back_to_path() {
        let mut dom = MemoryDom::new(viewport());
        let body = dom.body_id();
        dom.append_element(body, ElementInit::new("div").id("card"));
        let second = dom.append_element(body, ElementInit::new("div").id("card"));

        let selector = PathSelectorGenerator.selector_for(&dom, &second).unwrap();

        assert_eq!(selector, "html > body:nth-child(1) > div:nth-child(2)");
        assert_eq!(dom.query_selector(&selector), Some(second));
    }

    #[test]
    fn test_text_nodes_have_no_selector() {
        let mut dom = MemoryDom::new(viewport());
        let body = dom.body_id();
        let text = dom.append_text(body, "loose text", None);

        assert_eq!(PathSelectorGenerator.selector_for(&dom, &text), None);
    }
}
