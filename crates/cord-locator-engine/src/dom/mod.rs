/*!
 * # DOM abstraction
 *
 * The engine runs against pages it does not control, so every DOM access
 * goes through the traits in this module:
 *
 * - **`Dom`**: read-only queries (tree structure, computed style, layout,
 *   hit testing, caret APIs). Everything the capture and re-location code
 *   needs.
 * - **`BrowserDom`**: the few side effects the highlight driver performs
 *   (selection, focus, input selection ranges, body classes, stylesheets).
 *
 * Node handles are an associated type so a `web-sys` backed implementation
 * can use real `Node`s while [`memory::MemoryDom`] uses arena indices.
 *
 * Offsets follow DOM semantics: UTF-16 code units inside text nodes, child
 * indices inside elements.
 */

pub mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RangeError;
use crate::types::{Point, Rect};
use crate::util::text::utf16_len;

pub use memory::{ElementInit, MemoryDom, NodeId, PageFixture, TextLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    DocumentType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Clip,
    Scroll,
    Auto,
}

impl Overflow {
    /// Anything but `visible` and `hidden` lets the user scroll the element
    pub fn is_scrollable(self) -> bool {
        !matches!(self, Overflow::Visible | Overflow::Hidden)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Display {
    #[default]
    Block,
    Inline,
    None,
}

/// The subset of `getComputedStyle` the engine looks at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComputedStyle {
    pub overflow_x: Overflow,
    pub overflow_y: Overflow,
    pub position: Position,
    pub visibility: Visibility,
    pub display: Display,
    pub opacity: f64,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            overflow_x: Overflow::Visible,
            overflow_y: Overflow::Visible,
            position: Position::Static,
            visibility: Visibility::Visible,
            display: Display::Block,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_left: f64,
    pub scroll_height: f64,
    pub scroll_width: f64,
    pub client_height: f64,
    pub client_width: f64,
}

impl ScrollMetrics {
    /// True when the content is larger than the box in either direction
    pub fn has_overflow(&self) -> bool {
        self.scroll_height > self.client_height || self.scroll_width > self.client_width
    }
}

/// State of an `<input>` or `<textarea>`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InputState {
    pub value: String,
    pub selection_start: Option<usize>,
    pub selection_end: Option<usize>,
    pub disabled: bool,
}

/// `window.innerWidth` / `window.innerHeight`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Which point-to-caret API the document offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaretCapabilities {
    /// Chromium / WebKit `document.caretRangeFromPoint`
    pub caret_range_from_point: bool,
    /// Firefox `document.caretPositionFromPoint`
    pub caret_position_from_point: bool,
}

/// Read access to a document
pub trait Dom {
    type Node: Clone + PartialEq + fmt::Debug;

    /// `document.documentElement`
    fn document_element(&self) -> Option<Self::Node>;

    /// `document.scrollingElement`, falling back to the document element
    fn scrolling_element(&self) -> Option<Self::Node> {
        self.document_element()
    }

    fn body(&self) -> Option<Self::Node>;

    fn node_kind(&self, node: &Self::Node) -> NodeKind;

    /// `Node.nodeName`: upper-case tag name for elements, `#text` for text
    fn node_name(&self, node: &Self::Node) -> String;

    fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;

    fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn text_content(&self, node: &Self::Node) -> String;

    fn element_id(&self, element: &Self::Node) -> Option<String>;

    fn computed_style(&self, element: &Self::Node) -> ComputedStyle;

    fn bounding_client_rect(&self, element: &Self::Node) -> Rect;

    /// `getClientRects()`; empty for nodes that are not rendered
    fn client_rects(&self, node: &Self::Node) -> Vec<Rect>;

    fn scroll_metrics(&self, element: &Self::Node) -> ScrollMetrics;

    /// `None` unless the element is an input or textarea
    fn input_state(&self, element: &Self::Node) -> Option<InputState>;

    fn query_selector(&self, selector: &str) -> Option<Self::Node>;

    fn element_from_point(&self, point: Point) -> Option<Self::Node>;

    /// Bounding rect of a collapsed range at `offset` inside a text node
    fn caret_rect(&self, text_node: &Self::Node, offset: usize) -> Option<Rect>;

    /// Client rects of the `[start, end)` slice of a text node
    fn text_client_rects(&self, text_node: &Self::Node, start: usize, end: usize) -> Vec<Rect>;

    fn viewport(&self) -> Viewport;

    fn caret_capabilities(&self) -> CaretCapabilities;

    fn caret_range_from_point(&self, _point: Point) -> Option<DomRange<Self::Node>> {
        None
    }

    fn caret_position_from_point(&self, _point: Point) -> Option<(Self::Node, usize)> {
        None
    }

    /// `Node.parentElement`
    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node> {
        self.parent_node(node)
            .filter(|parent| self.node_kind(parent) == NodeKind::Element)
    }

    fn first_element_child(&self, node: &Self::Node) -> Option<Self::Node> {
        self.child_nodes(node)
            .into_iter()
            .find(|child| self.node_kind(child) == NodeKind::Element)
    }

    /// Position of `node` in its parent's child list
    fn child_index(&self, node: &Self::Node) -> Option<usize> {
        let parent = self.parent_node(node)?;
        self.child_nodes(&parent)
            .iter()
            .position(|child| child == node)
    }
}

/// Side effects used by the highlight driver
pub trait BrowserDom: Dom {
    /// `window.getSelection()`; `None` when the page has no selection API
    fn selection(&self) -> Option<DomSelection<Self::Node>>;

    fn clear_selection(&mut self);

    fn add_selection_range(&mut self, range: DomRange<Self::Node>);

    /// `document.activeElement`
    fn active_element(&self) -> Option<Self::Node>;

    fn focus(&mut self, element: &Self::Node);

    fn blur(&mut self, element: &Self::Node);

    fn set_disabled(&mut self, element: &Self::Node, disabled: bool);

    /// `HTMLInputElement.setSelectionRange`
    fn set_selection_range(
        &mut self,
        element: &Self::Node,
        start: usize,
        end: usize,
    ) -> Result<(), RangeError>;

    fn add_body_class(&mut self, class_name: &str);

    fn remove_body_class(&mut self, class_name: &str);

    fn body_classes(&self) -> Vec<String>;

    fn append_stylesheet(&mut self, id: &str, css: &str);

    fn remove_stylesheet(&mut self, id: &str);

    fn has_stylesheet(&self, id: &str) -> bool;
}

/// A DOM `Range`: two boundary points
#[derive(Debug, Clone, PartialEq)]
pub struct DomRange<N> {
    pub start_container: N,
    pub start_offset: usize,
    pub end_container: N,
    pub end_offset: usize,
}

impl<N: Clone + PartialEq + fmt::Debug> DomRange<N> {
    /// Build a range, failing the same way `setStart`/`setEnd` throw
    pub fn new<D: Dom<Node = N>>(
        dom: &D,
        start_container: N,
        start_offset: usize,
        end_container: N,
        end_offset: usize,
    ) -> Result<Self, RangeError> {
        check_boundary(dom, &start_container, start_offset)?;
        check_boundary(dom, &end_container, end_offset)?;
        Ok(Self {
            start_container,
            start_offset,
            end_container,
            end_offset,
        })
    }

    pub fn collapsed<D: Dom<Node = N>>(dom: &D, node: N, offset: usize) -> Result<Self, RangeError> {
        Self::new(dom, node.clone(), offset, node, offset)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start_container == self.end_container && self.start_offset == self.end_offset
    }
}

/// Length of a node in range-offset units
pub fn node_length<D: Dom>(dom: &D, node: &D::Node) -> usize {
    match dom.node_kind(node) {
        NodeKind::Text | NodeKind::Comment => utf16_len(&dom.text_content(node)),
        NodeKind::Element => dom.child_nodes(node).len(),
        NodeKind::DocumentType => 0,
    }
}

fn check_boundary<D: Dom>(dom: &D, node: &D::Node, offset: usize) -> Result<(), RangeError> {
    if dom.node_kind(node) == NodeKind::DocumentType {
        return Err(RangeError::InvalidNodeType(dom.node_name(node)));
    }
    let length = node_length(dom, node);
    if offset > length {
        return Err(RangeError::OffsetOutOfBounds { offset, length });
    }
    Ok(())
}

/// Snapshot of `window.getSelection()`
#[derive(Debug, Clone, PartialEq)]
pub struct DomSelection<N> {
    pub ranges: Vec<DomRange<N>>,
}

impl<N> DomSelection<N> {
    pub fn new(ranges: Vec<DomRange<N>>) -> Self {
        Self { ranges }
    }

    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn range_at(&self, index: usize) -> Option<&DomRange<N>> {
        self.ranges.get(index)
    }

    pub fn is_collapsed(&self) -> bool
    where
        N: PartialEq,
    {
        self.ranges.iter().all(|range| {
            range.start_container == range.end_container && range.start_offset == range.end_offset
        })
    }
}
