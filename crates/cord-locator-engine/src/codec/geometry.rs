use serde::{Deserialize, Serialize};

use crate::dom::{Dom, DomRange};
use crate::types::{Point, Rect};
use crate::util::text::utf16_len;
use crate::util::{get_nodes_from_range, is_input_or_text_area, is_text_node};

/// Slack before a selection counts as scrolled out of view
pub const SELECTION_TOO_FAR_OFF_SCREEN_PX: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffScreenDirection {
    Up,
    Down,
}

/// The part of `node`'s text that `range` covers
fn selected_bounds<D: Dom>(dom: &D, range: &DomRange<D::Node>, node: &D::Node) -> (usize, usize) {
    let start = if *node == range.start_container {
        range.start_offset
    } else {
        0
    };
    let end = if *node == range.end_container {
        range.end_offset
    } else {
        utf16_len(&dom.text_content(node))
    };
    (start, end)
}

/// Text nodes in the range with something other than whitespace in them
pub fn selection_text_nodes<D: Dom>(dom: &D, range: &DomRange<D::Node>) -> Vec<D::Node> {
    get_nodes_from_range(dom, range, |node| {
        is_text_node(dom, node) && !dom.text_content(node).trim().is_empty()
    })
}

/// `Range.getClientRects()` restricted to text, in document order
pub fn range_client_rects<D: Dom>(dom: &D, range: &DomRange<D::Node>) -> Vec<Rect> {
    get_nodes_from_range(dom, range, |node| is_text_node(dom, node))
        .into_iter()
        .flat_map(|node| {
            let (start, end) = selected_bounds(dom, range, &node);
            if start >= end {
                return Vec::new();
            }
            dom.text_client_rects(&node, start, end)
        })
        .collect()
}

/// Where to anchor a pin for a fresh selection.
///
/// Right edge and vertical middle of the rightmost selected line box that is
/// fully on screen and left of `right_limit` (the sidebar edge, or the frame
/// width inside an iframe). When everything is covered, the middle of the
/// uncovered part of the first line. Inputs fall back to the pointer, so
/// they get `None`.
pub fn rightmost_highlighted_visible_point<D: Dom>(
    dom: &D,
    range: &DomRange<D::Node>,
    target: &D::Node,
    right_limit: f64,
) -> Option<Point> {
    if is_input_or_text_area(dom, target) {
        return None;
    }

    let inner_height = dom.viewport().height;
    let text_nodes = selection_text_nodes(dom, range);
    let mut rightmost: Option<Rect> = None;
    for node in &text_nodes {
        let (start, end) = selected_bounds(dom, range, node);
        for rect in dom.text_client_rects(node, start, end) {
            let hidden = rect.right > right_limit || rect.top < 0.0 || rect.bottom > inner_height;
            if hidden {
                continue;
            }
            if rect.right > rightmost.map_or(0.0, |best| best.right) {
                rightmost = Some(rect);
            }
        }
    }

    if let Some(rect) = rightmost {
        return Some(Point::new(rect.right, (rect.top + rect.bottom) / 2.0));
    }

    let topmost = text_nodes
        .first()
        .and_then(|node| {
            let (start, end) = selected_bounds(dom, range, node);
            dom.text_client_rects(node, start, end).into_iter().next()
        })
        .or_else(|| range_client_rects(dom, range).into_iter().next())?;
    let half_visible_width = (right_limit - topmost.left) / 2.0;
    Some(Point::new(right_limit - half_visible_width, topmost.top))
}

/// Whether the last line of the selection is far enough outside the
/// viewport that it should be scrolled to
pub fn selection_off_screen_direction<D: Dom>(
    dom: &D,
    range: &DomRange<D::Node>,
    additional_margins: f64,
) -> Option<OffScreenDirection> {
    let bottommost = range_client_rects(dom, range).pop()?;
    let inner_height = dom.viewport().height;

    if bottommost.top + bottommost.height() + additional_margins - inner_height
        > SELECTION_TOO_FAR_OFF_SCREEN_PX
    {
        return Some(OffScreenDirection::Down);
    }
    if bottommost.top + additional_margins < -SELECTION_TOO_FAR_OFF_SCREEN_PX {
        return Some(OffScreenDirection::Up);
    }
    None
}
