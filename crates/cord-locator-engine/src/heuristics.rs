//! Where an annotation should be drawn right now.
//!
//! Positions are stored relative to the closest scroll container so they
//! survive scrolling. These functions turn them back into something that can
//! be rendered and decide whether the result is currently visible.

use serde::{Deserialize, Serialize};

use crate::dom::{Dom, ScrollMetrics};
use crate::matcher::position_from_text_config;
use crate::types::{LocationTextConfig, Point, Rect};
use crate::util::{
    contains, get_active_scroll_parents, get_scroll_container, is_fixed_or_inside_fixed_element,
    is_iframe,
};

/// Id of the element hosting the annotation action modal; it never anchors a location
pub const ACTION_MODAL_ID: &str = "cord-action-modal";

const SUITABLE_LARGE_ELEMENT_TAGS: [&str; 4] = ["VIDEO", "IMG", "EMBED", "IFRAME"];
const MAX_SUITABLE_ELEMENT_HEIGHT: f64 = 800.0;

const SEARCH_STEP_PX: f64 = 25.0;
const SEARCH_RADIUS_PX: f64 = 500.0;
const SEARCH_JITTER_PX: [f64; 9] = [0.0, -10.0, 10.0, -20.0, 20.0, -30.0, 30.0, -40.0, 40.0];

/// Whether `element` is specific enough to anchor a point annotation
pub fn is_element_suitable_for_doc_location<D: Dom>(dom: &D, element: &D::Node) -> bool {
    if SUITABLE_LARGE_ELEMENT_TAGS.contains(&dom.node_name(element).as_str()) {
        return true;
    }
    if dom.element_id(element).as_deref() == Some(ACTION_MODAL_ID) {
        return false;
    }

    let rect = dom.bounding_client_rect(element);
    // Also excludes `display: none`
    let takes_space = rect.width() != 0.0 && rect.height() != 0.0;
    let scroll_height = dom.scroll_metrics(element).scroll_height;
    let height = if scroll_height != 0.0 {
        scroll_height
    } else {
        rect.height()
    };
    takes_space && height < MAX_SUITABLE_ELEMENT_HEIGHT
}

/// Sample points for one search ring: mostly left/right, less far up/down
fn ring_points(x: f64, y: f64, distance: f64) -> Vec<Point> {
    SEARCH_JITTER_PX
        .iter()
        .flat_map(|adj| {
            [
                Point::new(x + distance, y + adj),
                Point::new(x - distance, y + adj),
                Point::new(x + adj, y + distance / 2.0),
                Point::new(x + adj, y - distance / 2.0),
            ]
        })
        .collect()
}

/// Look around `(x, y)` for a replacement anchor when `original` is
/// unsuitable (too large, hidden or zero-area).
///
/// Candidates outside the original's scroll container, inside `exclude`
/// (our own UI), iframes and fixed elements are skipped.
pub fn find_suitable_element_for_doc_location<D: Dom>(
    dom: &D,
    x: f64,
    y: f64,
    original: &D::Node,
    exclude: Option<&D::Node>,
) -> Option<D::Node> {
    let scroll_container = dom
        .first_element_child(original)
        .and_then(|child| get_scroll_container(dom, &child));

    let rings = (1..)
        .map(|step| step as f64 * SEARCH_STEP_PX)
        .take_while(|distance| *distance <= SEARCH_RADIUS_PX);
    for distance in rings {
        for point in ring_points(x, y, distance) {
            let Some(element) = dom.element_from_point(point) else {
                continue;
            };
            if is_iframe(dom, &element) {
                continue;
            }
            if scroll_container
                .as_ref()
                .is_some_and(|container| !contains(dom, container, &element))
            {
                continue;
            }
            if exclude.is_some_and(|excluded| contains(dom, excluded, &element)) {
                continue;
            }
            if is_fixed_or_inside_fixed_element(dom, &element) {
                continue;
            }
            if is_element_suitable_for_doc_location(dom, &element) {
                return Some(element);
            }
        }
    }
    None
}

/// Input to [`compute_annotation_position_using_heuristics`]
#[derive(Debug, Clone)]
pub struct PositionRequest<N> {
    pub target: N,
    /// Text fingerprint; takes precedence over the raw coordinates when it
    /// can still be matched
    pub text_config: Option<LocationTextConfig>,
    /// Anything right of this is covered (e.g. by the sidebar)
    pub right_boundary: f64,
    pub x_vs_viewport: f64,
    pub y_vs_viewport: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationPosition<N> {
    pub visible: bool,
    pub has_inner_scroll_container: bool,
    pub closest_scroll_parent: N,
    pub closest_scroll_parent_rect: Rect,
    pub x_vs_closest_scroll_parent: f64,
    pub y_vs_closest_scroll_parent: f64,
}

/// Position of an annotation relative to its closest scroll container.
///
/// `None` when the point lies outside the container's scrollable area, i.e.
/// it could never be scrolled into view.
pub fn compute_annotation_position_using_heuristics<D: Dom>(
    dom: &D,
    request: &PositionRequest<D::Node>,
) -> Option<AnnotationPosition<D::Node>> {
    // Inner containers need their scroll offset added, the document does not
    let inner_scroll_container = get_active_scroll_parents(dom, &request.target)
        .into_iter()
        .filter(|parent| dom.node_name(parent) != "HTML")
        .last();
    let has_inner_scroll_container = inner_scroll_container.is_some();
    let closest_scroll_parent = match inner_scroll_container {
        Some(container) => container,
        None => dom.document_element()?,
    };
    let closest_scroll_parent_rect = dom.bounding_client_rect(&closest_scroll_parent);

    let mut position = Point::new(request.x_vs_viewport, request.y_vs_viewport);
    if let Some(text_config) = &request.text_config {
        if let Some(from_text) = position_from_text_config(dom, &request.target, text_config) {
            position = from_text;
        }
    }

    let metrics = dom.scroll_metrics(&closest_scroll_parent);
    let mut x_vs_closest_scroll_parent = position.x - closest_scroll_parent_rect.x();
    let mut y_vs_closest_scroll_parent = position.y - closest_scroll_parent_rect.y();
    if has_inner_scroll_container {
        x_vs_closest_scroll_parent += metrics.scroll_left;
        y_vs_closest_scroll_parent += metrics.scroll_top;
    }

    let cant_scroll_to_annotation = y_vs_closest_scroll_parent < 0.0
        || y_vs_closest_scroll_parent > metrics.scroll_height
        || x_vs_closest_scroll_parent < 0.0
        || x_vs_closest_scroll_parent > metrics.scroll_width;
    if cant_scroll_to_annotation {
        log::debug!(
            "Annotation at ({x_vs_closest_scroll_parent}, {y_vs_closest_scroll_parent}) is outside its scroll container"
        );
        return None;
    }

    let inner_height = dom.viewport().height;
    let off_screen = position.y < 0.0
        || position.x < 0.0
        || position.y >= inner_height
        || position.x >= request.right_boundary;
    let outside_scroll_container =
        has_inner_scroll_container && !closest_scroll_parent_rect.contains(position);

    Some(AnnotationPosition {
        visible: !off_screen && !outside_scroll_container,
        has_inner_scroll_container,
        closest_scroll_parent,
        closest_scroll_parent_rect,
        x_vs_closest_scroll_parent,
        y_vs_closest_scroll_parent,
    })
}

/// Scroll offsets to request from a scroll container
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollTarget {
    pub top: f64,
    pub left: f64,
}

/// Whole-pixel scroll target inside `[0, max scroll]`.
///
/// Flooring avoids sub-pixel oscillation; the clamp tolerates bounds that
/// shrank since they were measured.
pub fn clamp_scroll_target(metrics: &ScrollMetrics, x: f64, y: f64) -> ScrollTarget {
    let max_top = (metrics.scroll_height - metrics.client_height).max(0.0);
    let max_left = (metrics.scroll_width - metrics.client_width).max(0.0);
    ScrollTarget {
        top: y.max(0.0).min(max_top).floor(),
        left: x.max(0.0).min(max_left).floor(),
    }
}

pub fn position_relative_to_element<D: Dom>(dom: &D, position: Point, element: &D::Node) -> Point {
    let rect = dom.bounding_client_rect(element);
    Point::new(position.x - rect.x(), position.y - rect.y())
}

/// Map a point inside an iframe's viewport to the embedding page's viewport
pub fn iframe_position_to_viewport_position<D: Dom>(
    dom: &D,
    position: Point,
    iframe: &D::Node,
) -> Point {
    let rect = dom.bounding_client_rect(iframe);
    Point::new(position.x + rect.x(), position.y + rect.y())
}
