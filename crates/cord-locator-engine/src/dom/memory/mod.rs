//! Arena-backed DOM with caller-supplied layout.
//!
//! There is no layout engine: every element carries the rect a browser would
//! report, and text nodes carry an optional single-line [`TextLayout`] from
//! which caret and range rects are derived. That is enough to drive the
//! capture / re-location code deterministically in tests, fixtures and the
//! command-line replay tool.

mod fixture;
mod selector;

use serde::{Deserialize, Serialize};

use crate::dom::{
    BrowserDom, CaretCapabilities, ComputedStyle, Display, Dom, DomRange, DomSelection, InputState,
    NodeKind, ScrollMetrics, Viewport, Visibility,
};
use crate::error::RangeError;
use crate::types::{Point, Rect};
use crate::util::text::utf16_len;

pub use fixture::{FixtureElement, FixtureNode, PageFixture};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Geometry of a text node laid out on a single line with fixed-width glyphs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayout {
    /// Top-left corner of the first glyph, viewport coordinates
    pub origin: Point,
    /// Width of one UTF-16 code unit
    pub char_width: f64,
    pub line_height: f64,
}

impl TextLayout {
    fn x_at(&self, offset: usize) -> f64 {
        self.origin.x + offset as f64 * self.char_width
    }

    fn span_rect(&self, start: usize, end: usize) -> Rect {
        Rect {
            top: self.origin.y,
            left: self.x_at(start),
            right: self.x_at(end),
            bottom: self.origin.y + self.line_height,
        }
    }
}

/// Builder for a new element
#[derive(Debug, Clone)]
pub struct ElementInit {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    style: ComputedStyle,
    rect: Rect,
    scroll: Option<ScrollMetrics>,
    input: Option<InputState>,
}

impl ElementInit {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_uppercase(),
            id: None,
            classes: Vec::new(),
            style: ComputedStyle::default(),
            rect: Rect::default(),
            scroll: None,
            input: None,
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class_name: &str) -> Self {
        self.classes.push(class_name.to_string());
        self
    }

    pub fn style(mut self, style: ComputedStyle) -> Self {
        self.style = style;
        self
    }

    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    /// Without explicit metrics the content is assumed to fit the box
    pub fn scroll(mut self, scroll: ScrollMetrics) -> Self {
        self.scroll = Some(scroll);
        self
    }

    pub fn input(mut self, input: InputState) -> Self {
        self.input = Some(input);
        self
    }
}

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    style: ComputedStyle,
    rect: Rect,
    scroll: ScrollMetrics,
    input: Option<InputState>,
}

#[derive(Debug, Clone)]
enum NodeContent {
    Element(ElementData),
    Text {
        content: String,
        layout: Option<TextLayout>,
    },
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    content: NodeContent,
}

#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<NodeData>,
    document_element: NodeId,
    body: NodeId,
    viewport: Viewport,
    caret_capabilities: CaretCapabilities,
    /// `None` models a page where `window.getSelection()` returns null
    selection: Option<Vec<DomRange<NodeId>>>,
    active_element: Option<NodeId>,
    stylesheets: Vec<(String, String)>,
}

impl MemoryDom {
    /// Empty `<html><body></body></html>` document filling the viewport
    pub fn new(viewport: Viewport) -> Self {
        let page = Rect::from_xywh(0.0, 0.0, viewport.width, viewport.height);
        let mut dom = Self::with_root(
            viewport,
            ElementInit::new("html").rect(page).scroll(ScrollMetrics {
                scroll_height: viewport.height,
                scroll_width: viewport.width,
                client_height: viewport.height,
                client_width: viewport.width,
                ..ScrollMetrics::default()
            }),
        );
        let html = dom.document_element;
        dom.body = dom.append_element(html, ElementInit::new("body").rect(page));
        dom
    }

    fn with_root(viewport: Viewport, root: ElementInit) -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document_element: NodeId(0),
            body: NodeId(0),
            viewport,
            caret_capabilities: CaretCapabilities {
                caret_range_from_point: true,
                caret_position_from_point: false,
            },
            selection: Some(Vec::new()),
            active_element: None,
            stylesheets: Vec::new(),
        };
        dom.document_element = dom.push_node(None, NodeContent::Element(element_data(root)));
        dom
    }

    pub fn document_element_id(&self) -> NodeId {
        self.document_element
    }

    pub fn body_id(&self) -> NodeId {
        self.body
    }

    fn push_node(&mut self, parent: Option<NodeId>, content: NodeContent) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            parent,
            children: Vec::new(),
            content,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id).content {
            NodeContent::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].content {
            NodeContent::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn append_element(&mut self, parent: NodeId, init: ElementInit) -> NodeId {
        self.push_node(Some(parent), NodeContent::Element(element_data(init)))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str, layout: Option<TextLayout>) -> NodeId {
        self.push_node(
            Some(parent),
            NodeContent::Text {
                content: text.to_string(),
                layout,
            },
        )
    }

    pub fn append_comment(&mut self, parent: NodeId, data: &str) -> NodeId {
        self.push_node(Some(parent), NodeContent::Comment(data.to_string()))
    }

    /// Insert a text node at `index` in `parent`'s child list
    pub fn insert_text(
        &mut self,
        parent: NodeId,
        index: usize,
        text: &str,
        layout: Option<TextLayout>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            parent: Some(parent),
            children: Vec::new(),
            content: NodeContent::Text {
                content: text.to_string(),
                layout,
            },
        });
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, id);
        id
    }

    /// Detach a node (and its subtree) from its parent
    pub fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != node);
        }
        if self.active_element == Some(node) {
            self.active_element = None;
        }
    }

    /// Replace the data of a text or comment node
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        match &mut self.nodes[node.0].content {
            NodeContent::Text { content, .. } => *content = text.to_string(),
            NodeContent::Comment(data) => *data = text.to_string(),
            NodeContent::Element(_) => {
                log::debug!("set_text ignored on element {node:?}");
            }
        }
    }

    pub fn set_text_layout(&mut self, node: NodeId, new_layout: Option<TextLayout>) {
        if let NodeContent::Text { layout, .. } = &mut self.nodes[node.0].content {
            *layout = new_layout;
        }
    }

    pub fn set_rect(&mut self, element: NodeId, rect: Rect) {
        if let Some(data) = self.element_mut(element) {
            data.rect = rect;
        }
    }

    pub fn set_style(&mut self, element: NodeId, style: ComputedStyle) {
        if let Some(data) = self.element_mut(element) {
            data.style = style;
        }
    }

    pub fn set_scroll(&mut self, element: NodeId, scroll: ScrollMetrics) {
        if let Some(data) = self.element_mut(element) {
            data.scroll = scroll;
        }
    }

    pub fn set_input_value(&mut self, element: NodeId, value: &str) {
        if let Some(input) = self.element_mut(element).and_then(|data| data.input.as_mut()) {
            input.value = value.to_string();
        }
    }

    pub fn set_input_selection(&mut self, element: NodeId, start: usize, end: usize) {
        if let Some(input) = self.element_mut(element).and_then(|data| data.input.as_mut()) {
            input.selection_start = Some(start);
            input.selection_end = Some(end);
        }
    }

    pub fn set_caret_capabilities(&mut self, capabilities: CaretCapabilities) {
        self.caret_capabilities = capabilities;
    }

    pub fn set_selection_supported(&mut self, supported: bool) {
        self.selection = if supported { Some(Vec::new()) } else { None };
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn classes(&self, element: NodeId) -> &[String] {
        self.element(element)
            .map(|data| data.classes.as_slice())
            .unwrap_or(&[])
    }

    pub fn stylesheet(&self, id: &str) -> Option<&str> {
        self.stylesheets
            .iter()
            .find(|(sheet_id, _)| sheet_id == id)
            .map(|(_, css)| css.as_str())
    }

    /// All nodes of the attached tree in document order
    fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![self.document_element];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.node(node).children.iter().rev().copied());
        }
        order
    }

    /// False when the node or one of its ancestors has `display: none`
    fn is_rendered(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if self
                .element(id)
                .is_some_and(|element| element.style.display == Display::None)
            {
                return false;
            }
            current = self.node(id).parent;
        }
        true
    }

    fn text_layout(&self, node: NodeId) -> Option<(&str, TextLayout)> {
        match &self.node(node).content {
            NodeContent::Text {
                content,
                layout: Some(layout),
            } if self.is_rendered(node) => Some((content.as_str(), *layout)),
            _ => None,
        }
    }

    /// Text node whose line box is under `point`, with the nearest offset
    fn text_hit(&self, point: Point) -> Option<(NodeId, usize)> {
        self.preorder()
            .into_iter()
            .filter_map(|node| {
                let (content, layout) = self.text_layout(node)?;
                let length = utf16_len(content);
                let line = layout.span_rect(0, length);
                let inside = point.y >= line.top
                    && point.y < line.bottom
                    && point.x >= line.left
                    && point.x <= line.right;
                if !inside || layout.char_width <= 0.0 {
                    return None;
                }
                let offset = ((point.x - layout.origin.x) / layout.char_width).round() as usize;
                Some((node, offset.min(length)))
            })
            .last()
    }

    fn caret_hit(&self, point: Point) -> Option<(NodeId, usize)> {
        self.text_hit(point)
            .or_else(|| self.element_from_point(point).map(|element| (element, 0)))
    }
}

fn element_data(init: ElementInit) -> ElementData {
    let scroll = init.scroll.unwrap_or(ScrollMetrics {
        scroll_height: init.rect.height(),
        scroll_width: init.rect.width(),
        client_height: init.rect.height(),
        client_width: init.rect.width(),
        ..ScrollMetrics::default()
    });
    ElementData {
        tag: init.tag,
        id: init.id,
        classes: init.classes,
        style: init.style,
        rect: init.rect,
        scroll,
        input: init.input,
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn document_element(&self) -> Option<NodeId> {
        Some(self.document_element)
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn node_kind(&self, node: &NodeId) -> NodeKind {
        match self.node(*node).content {
            NodeContent::Element(_) => NodeKind::Element,
            NodeContent::Text { .. } => NodeKind::Text,
            NodeContent::Comment(_) => NodeKind::Comment,
        }
    }

    fn node_name(&self, node: &NodeId) -> String {
        match &self.node(*node).content {
            NodeContent::Element(element) => element.tag.clone(),
            NodeContent::Text { .. } => "#text".to_string(),
            NodeContent::Comment(_) => "#comment".to_string(),
        }
    }

    fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
        self.node(*node).parent
    }

    fn child_nodes(&self, node: &NodeId) -> Vec<NodeId> {
        self.node(*node).children.clone()
    }

    fn text_content(&self, node: &NodeId) -> String {
        match &self.node(*node).content {
            NodeContent::Text { content, .. } => content.clone(),
            NodeContent::Comment(data) => data.clone(),
            NodeContent::Element(_) => {
                let mut text = String::new();
                let mut stack = vec![*node];
                while let Some(id) = stack.pop() {
                    if let NodeContent::Text { content, .. } = &self.node(id).content {
                        text.push_str(content);
                    }
                    stack.extend(self.node(id).children.iter().rev().copied());
                }
                text
            }
        }
    }

    fn element_id(&self, element: &NodeId) -> Option<String> {
        self.element(*element).and_then(|data| data.id.clone())
    }

    fn computed_style(&self, element: &NodeId) -> ComputedStyle {
        self.element(*element)
            .map(|data| data.style)
            .unwrap_or_default()
    }

    fn bounding_client_rect(&self, element: &NodeId) -> Rect {
        if !self.is_rendered(*element) {
            return Rect::default();
        }
        match &self.node(*element).content {
            NodeContent::Element(data) => data.rect,
            NodeContent::Text { .. } => self
                .client_rects(element)
                .into_iter()
                .next()
                .unwrap_or_default(),
            NodeContent::Comment(_) => Rect::default(),
        }
    }

    fn client_rects(&self, node: &NodeId) -> Vec<Rect> {
        if !self.is_rendered(*node) {
            return Vec::new();
        }
        match &self.node(*node).content {
            NodeContent::Element(data) => vec![data.rect],
            NodeContent::Text {
                content,
                layout: Some(layout),
            } => vec![layout.span_rect(0, utf16_len(content))],
            _ => Vec::new(),
        }
    }

    fn scroll_metrics(&self, element: &NodeId) -> ScrollMetrics {
        self.element(*element)
            .map(|data| data.scroll)
            .unwrap_or_default()
    }

    fn input_state(&self, element: &NodeId) -> Option<InputState> {
        self.element(*element).and_then(|data| data.input.clone())
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        selector::query(self, selector)
    }

    fn element_from_point(&self, point: Point) -> Option<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|node| {
                self.element(*node).is_some_and(|data| {
                    data.style.visibility == Visibility::Visible && data.rect.contains(point)
                }) && self.is_rendered(*node)
            })
            .last()
    }

    fn caret_rect(&self, text_node: &NodeId, offset: usize) -> Option<Rect> {
        let (content, layout) = self.text_layout(*text_node)?;
        if offset > utf16_len(content) {
            return None;
        }
        Some(layout.span_rect(offset, offset))
    }

    fn text_client_rects(&self, text_node: &NodeId, start: usize, end: usize) -> Vec<Rect> {
        let Some((content, layout)) = self.text_layout(*text_node) else {
            return Vec::new();
        };
        let length = utf16_len(content);
        let end = end.min(length);
        let start = start.min(end);
        vec![layout.span_rect(start, end)]
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn caret_capabilities(&self) -> CaretCapabilities {
        self.caret_capabilities
    }

    fn caret_range_from_point(&self, point: Point) -> Option<DomRange<NodeId>> {
        if !self.caret_capabilities.caret_range_from_point {
            return None;
        }
        let (node, offset) = self.caret_hit(point)?;
        DomRange::collapsed(self, node, offset).ok()
    }

    fn caret_position_from_point(&self, point: Point) -> Option<(NodeId, usize)> {
        if !self.caret_capabilities.caret_position_from_point {
            return None;
        }
        self.caret_hit(point)
    }
}

impl BrowserDom for MemoryDom {
    fn selection(&self) -> Option<DomSelection<NodeId>> {
        self.selection
            .as_ref()
            .map(|ranges| DomSelection::new(ranges.clone()))
    }

    fn clear_selection(&mut self) {
        if let Some(ranges) = self.selection.as_mut() {
            ranges.clear();
        }
    }

    fn add_selection_range(&mut self, range: DomRange<NodeId>) {
        // Browsers only keep a single range
        if let Some(ranges) = self.selection.as_mut() {
            if ranges.is_empty() {
                ranges.push(range);
            }
        }
    }

    fn active_element(&self) -> Option<NodeId> {
        self.active_element.or(Some(self.body))
    }

    fn focus(&mut self, element: &NodeId) {
        let disabled = self
            .element(*element)
            .and_then(|data| data.input.as_ref())
            .is_some_and(|input| input.disabled);
        if !disabled {
            self.active_element = Some(*element);
        }
    }

    fn blur(&mut self, element: &NodeId) {
        if self.active_element == Some(*element) {
            self.active_element = None;
        }
    }

    fn set_disabled(&mut self, element: &NodeId, disabled: bool) {
        if let Some(input) = self.element_mut(*element).and_then(|data| data.input.as_mut()) {
            input.disabled = disabled;
        }
    }

    fn set_selection_range(
        &mut self,
        element: &NodeId,
        start: usize,
        end: usize,
    ) -> Result<(), RangeError> {
        let tag = self.node_name(element);
        let Some(input) = self.element_mut(*element).and_then(|data| data.input.as_mut()) else {
            return Err(RangeError::InvalidNodeType(tag));
        };
        if input.disabled {
            return Ok(());
        }
        let length = utf16_len(&input.value);
        let end = end.min(length);
        input.selection_start = Some(start.min(end));
        input.selection_end = Some(end);
        Ok(())
    }

    fn add_body_class(&mut self, class_name: &str) {
        let body = self.body;
        if let Some(data) = self.element_mut(body) {
            if !data.classes.iter().any(|class| class == class_name) {
                data.classes.push(class_name.to_string());
            }
        }
    }

    fn remove_body_class(&mut self, class_name: &str) {
        let body = self.body;
        if let Some(data) = self.element_mut(body) {
            data.classes.retain(|class| class != class_name);
        }
    }

    fn body_classes(&self) -> Vec<String> {
        self.classes(self.body).to_vec()
    }

    fn append_stylesheet(&mut self, id: &str, css: &str) {
        self.remove_stylesheet(id);
        self.stylesheets.push((id.to_string(), css.to_string()));
    }

    fn remove_stylesheet(&mut self, id: &str) {
        self.stylesheets.retain(|(sheet_id, _)| sheet_id != id);
    }

    fn has_stylesheet(&self, id: &str) -> bool {
        self.stylesheets.iter().any(|(sheet_id, _)| sheet_id == id)
    }
}
