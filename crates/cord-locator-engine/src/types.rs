use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shortest `textToMatch` window we accept when fingerprinting a point
pub const MATCHING_TEXT_MINIMUM_LENGTH: usize = 15;
/// Total window we try to capture around a point (half before, half after)
pub const MATCHING_TEXT_TARGET_LENGTH: usize = 50;

/// Unique identifier for an annotation
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Serializable description of a text range on a page.
///
/// Offsets are UTF-16 code units, the unit browsers use for DOM ranges, so a
/// config captured in a browser stays valid here and vice versa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightedTextConfig {
    pub start_element_selector: String,
    pub end_element_selector: String,
    pub start_node_index: usize,
    pub end_node_index: usize,
    pub start_node_offset: usize,
    pub end_node_offset: usize,
    /// Raw selected text, or `sha256:<salt>:<hash>` when captured in hashing mode
    pub selected_text: String,
    /// Older records were stored without this field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_to_display: Option<String>,
}

/// Text fingerprint around a clicked point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationTextConfig {
    pub text_to_match: String,
    /// Offset of the click within the text node
    pub selected_char_offset: usize,
    /// Offset of `text_to_match` within the text node
    pub text_to_match_offset: usize,
    /// Computed caret position minus the raw pointer position
    pub x_vs_pointer: f64,
    pub y_vs_pointer: f64,
    /// Index of the text node within its parent's child nodes
    pub node_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in CSS pixels, `DOMRect` style
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            top: y,
            left: x,
            right: x + width,
            bottom: y + height,
        }
    }

    pub fn x(&self) -> f64 {
        self.left
    }

    pub fn y(&self) -> f64 {
        self.top
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Half-open containment, matching how browsers hit-test boxes
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            top: self.top + dy,
            left: self.left + dx,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }
}
