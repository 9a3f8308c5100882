//! Point to text caret resolution.
//!
//! Browsers expose one of two APIs for this: `caretRangeFromPoint`
//! (Chromium, WebKit) and `caretPositionFromPoint` (Firefox). The matching
//! resolver is picked once per document by [`select_caret_resolver`].

use crate::dom::Dom;
use crate::logger::BasicLogger;
use crate::types::Point;
use crate::util::is_text_node;

/// A position inside a text node
#[derive(Debug, Clone, PartialEq)]
pub struct Caret<N> {
    pub text_node: N,
    pub offset: usize,
}

pub trait PointToCaretResolver<D: Dom> {
    /// Name of the browser API behind this resolver
    fn api_name(&self) -> &'static str;

    /// Caret under `point`, `None` unless it lands inside a text node
    fn caret_at(&self, dom: &D, point: Point) -> Option<Caret<D::Node>>;
}

/// Backed by `document.caretRangeFromPoint`
#[derive(Debug, Default, Clone, Copy)]
pub struct CaretRangeResolver;

impl<D: Dom> PointToCaretResolver<D> for CaretRangeResolver {
    fn api_name(&self) -> &'static str {
        "caretRangeFromPoint"
    }

    fn caret_at(&self, dom: &D, point: Point) -> Option<Caret<D::Node>> {
        let range = dom.caret_range_from_point(point)?;
        if !is_text_node(dom, &range.start_container) {
            return None;
        }
        Some(Caret {
            text_node: range.start_container,
            offset: range.start_offset,
        })
    }
}

/// Backed by `document.caretPositionFromPoint`
#[derive(Debug, Default, Clone, Copy)]
pub struct CaretPositionResolver;

impl<D: Dom> PointToCaretResolver<D> for CaretPositionResolver {
    fn api_name(&self) -> &'static str {
        "caretPositionFromPoint"
    }

    fn caret_at(&self, dom: &D, point: Point) -> Option<Caret<D::Node>> {
        let (node, offset) = dom.caret_position_from_point(point)?;
        if !is_text_node(dom, &node) {
            return None;
        }
        Some(Caret {
            text_node: node,
            offset,
        })
    }
}

/// Pick the resolver for this document, preferring `caretRangeFromPoint`
pub fn select_caret_resolver<D: Dom>(
    dom: &D,
    logger: &dyn BasicLogger,
) -> Option<Box<dyn PointToCaretResolver<D>>> {
    let capabilities = dom.caret_capabilities();
    if capabilities.caret_range_from_point {
        Some(Box::new(CaretRangeResolver))
    } else if capabilities.caret_position_from_point {
        Some(Box::new(CaretPositionResolver))
    } else {
        logger.log_warning(
            "Neither caretRangeFromPoint or caretPositionFromPoint supported in browser",
            None,
        );
        None
    }
}

/// One-off caret lookup; callers resolving many points should keep the
/// resolver from [`select_caret_resolver`] instead
pub fn caret_position_from_point<D: Dom>(
    dom: &D,
    point: Point,
    logger: &dyn BasicLogger,
) -> Option<Caret<D::Node>> {
    select_caret_resolver(dom, logger)?.caret_at(dom, point)
}
