//! DOM query and traversal helpers shared by the capture and re-location code.
//!
//! Everything here degrades to `None` / `false` / an empty list when the page
//! does not provide what we look for.

pub mod caret;
pub mod selector;
pub mod text;

use crate::dom::{Dom, DomRange, NodeKind};
use text::slice_utf16;

pub use caret::{
    Caret, CaretPositionResolver, CaretRangeResolver, PointToCaretResolver,
    caret_position_from_point, select_caret_resolver,
};
pub use selector::{PathSelectorGenerator, SelectorGenerator};

pub fn is_text_node<D: Dom>(dom: &D, node: &D::Node) -> bool {
    dom.node_name(node) == "#text"
}

pub fn is_input_or_text_area<D: Dom>(dom: &D, node: &D::Node) -> bool {
    matches!(dom.node_name(node).as_str(), "TEXTAREA" | "INPUT")
}

pub fn is_iframe<D: Dom>(dom: &D, element: &D::Node) -> bool {
    dom.node_name(element) == "IFRAME"
}

pub fn is_media_element<D: Dom>(dom: &D, element: &D::Node) -> bool {
    matches!(dom.node_name(element).as_str(), "VIDEO" | "AUDIO")
}

/// `Node.contains`: true if `node` is `ancestor` or one of its descendants
pub fn contains<D: Dom>(dom: &D, ancestor: &D::Node, node: &D::Node) -> bool {
    let mut current = Some(node.clone());
    while let Some(candidate) = current {
        if &candidate == ancestor {
            return true;
        }
        current = dom.parent_node(&candidate);
    }
    false
}

/// Child indices from the root of the tree down to `node`
pub(crate) fn tree_path<D: Dom>(dom: &D, node: &D::Node) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = node.clone();
    while let Some(parent) = dom.parent_node(&current) {
        let index = dom
            .child_nodes(&parent)
            .iter()
            .position(|child| child == &current)
            .unwrap_or(0);
        path.push(index);
        current = parent;
    }
    path.reverse();
    path
}

/// Closest node that is an inclusive ancestor of both `a` and `b`
pub fn common_ancestor<D: Dom>(dom: &D, a: &D::Node, b: &D::Node) -> Option<D::Node> {
    let mut ancestors_of_a = Vec::new();
    let mut current = Some(a.clone());
    while let Some(node) = current {
        current = dom.parent_node(&node);
        ancestors_of_a.push(node);
    }

    let mut current = Some(b.clone());
    while let Some(node) = current {
        if ancestors_of_a.contains(&node) {
            return Some(node);
        }
        current = dom.parent_node(&node);
    }
    None
}

/// Boundary points compared as paths: `(node, offset)` is `path(node) + [offset]`.
///
/// Lexicographic order of these keys is document order, and "before node X"
/// is simply `path(X)`.
struct RangeKeys {
    start: Vec<usize>,
    end: Vec<usize>,
}

impl RangeKeys {
    fn new<D: Dom>(dom: &D, range: &DomRange<D::Node>) -> Self {
        let mut start = tree_path(dom, &range.start_container);
        start.push(range.start_offset);
        let mut end = tree_path(dom, &range.end_container);
        end.push(range.end_offset);
        Self { start, end }
    }

    /// `Range.intersectsNode` for the node at `path`
    fn intersects(&self, path: &[usize]) -> bool {
        let Some((last, parent_path)) = path.split_last() else {
            return true;
        };
        let mut after = parent_path.to_vec();
        after.push(last + 1);
        path < self.end.as_slice() && after.as_slice() > self.start.as_slice()
    }
}

/// All nodes intersecting `range` that satisfy `predicate`, in document order.
///
/// The walk starts at the range's common ancestor and stops as soon as the
/// end container has been accepted.
pub fn get_nodes_from_range<D: Dom>(
    dom: &D,
    range: &DomRange<D::Node>,
    predicate: impl Fn(&D::Node) -> bool,
) -> Vec<D::Node> {
    let Some(root) = common_ancestor(dom, &range.start_container, &range.end_container) else {
        return Vec::new();
    };
    let keys = RangeKeys::new(dom, range);

    let mut nodes = Vec::new();
    let mut stack = vec![(root.clone(), tree_path(dom, &root))];
    while let Some((node, path)) = stack.pop() {
        if keys.intersects(&path) && predicate(&node) {
            nodes.push(node.clone());
            if node == range.end_container {
                break;
            }
        }

        let children = dom.child_nodes(&node);
        for (index, child) in children.into_iter().enumerate().rev() {
            let mut child_path = path.clone();
            child_path.push(index);
            stack.push((child, child_path));
        }
    }
    nodes
}

/// `Range.toString()`: concatenated text of the text nodes in the range
pub fn range_to_string<D: Dom>(dom: &D, range: &DomRange<D::Node>) -> String {
    let text_nodes = get_nodes_from_range(dom, range, |node| is_text_node(dom, node));
    let mut text = String::new();
    for node in text_nodes {
        let content = dom.text_content(&node);
        let start = if node == range.start_container {
            range.start_offset
        } else {
            0
        };
        let end = if node == range.end_container {
            range.end_offset
        } else {
            usize::MAX
        };
        text.push_str(&slice_utf16(&content, start, end));
    }
    text
}

fn is_element_scrollable<D: Dom>(dom: &D, element: &D::Node) -> bool {
    if dom.node_kind(element) != NodeKind::Element {
        return false;
    }
    let style = dom.computed_style(element);
    style.overflow_y.is_scrollable() || style.overflow_x.is_scrollable()
}

/// Closest scroll container of `node`, not including the document scroller
pub fn get_scroll_container<D: Dom>(dom: &D, node: &D::Node) -> Option<D::Node> {
    let mut parent = dom.parent_element(node);
    while let Some(candidate) = parent {
        if dom.node_name(&candidate) == "BODY" {
            break;
        }
        if is_element_scrollable(dom, &candidate) {
            return Some(candidate);
        }
        parent = dom.parent_element(&candidate);
    }
    None
}

/// Document scroller followed by every scrollable ancestor, outermost first
fn get_scroll_parents<D: Dom>(dom: &D, node: &D::Node) -> Vec<D::Node> {
    let mut scroll_parents = Vec::new();
    let mut parent = dom.parent_element(node);
    while let Some(candidate) = parent {
        if dom.node_name(&candidate) == "BODY" {
            break;
        }
        if is_element_scrollable(dom, &candidate) {
            scroll_parents.push(candidate.clone());
        }
        parent = dom.parent_element(&candidate);
    }
    scroll_parents.reverse();

    match dom.scrolling_element() {
        Some(top_level) => std::iter::once(top_level).chain(scroll_parents).collect(),
        None => scroll_parents,
    }
}

/// Scroll parents of `element` that can actually scroll right now.
///
/// `overflow: auto` containers whose content fits are dropped; the document
/// element is always kept.
pub fn get_active_scroll_parents<D: Dom>(dom: &D, element: &D::Node) -> Vec<D::Node> {
    get_scroll_parents(dom, element)
        .into_iter()
        .filter(|candidate| {
            dom.node_name(candidate) == "HTML" || dom.scroll_metrics(candidate).has_overflow()
        })
        .collect()
}

/// Fixed elements (headers, footers) do not scroll with the content, so they
/// make poor anchors
pub fn is_fixed_or_inside_fixed_element<D: Dom>(dom: &D, element: &D::Node) -> bool {
    let mut current = element.clone();
    loop {
        if dom.computed_style(&current).position == crate::dom::Position::Fixed {
            return true;
        }
        match dom.parent_element(&current) {
            Some(parent) if dom.node_name(&parent) != "BODY" => current = parent,
            _ => return false,
        }
    }
}
