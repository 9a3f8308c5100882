//! Shared fixtures for the engine's unit tests

use std::cell::RefCell;

use serde_json::Value;

use crate::dom::{ElementInit, MemoryDom, NodeId, TextLayout, Viewport};
use crate::logger::BasicLogger;
use crate::types::{Point, Rect};

pub const CHAR_WIDTH: f64 = 8.0;
pub const LINE_HEIGHT: f64 = 20.0;
pub const TEXT_ORIGIN: Point = Point { x: 40.0, y: 100.0 };

pub fn viewport() -> Viewport {
    Viewport {
        width: 1280.0,
        height: 800.0,
    }
}

pub fn text_layout(origin: Point) -> TextLayout {
    TextLayout {
        origin,
        char_width: CHAR_WIDTH,
        line_height: LINE_HEIGHT,
    }
}

/// A page holding a single `<p id="intro">` with one laid out text node
pub struct ParagraphPage {
    pub dom: MemoryDom,
    pub paragraph: NodeId,
    pub text: NodeId,
}

impl ParagraphPage {
    /// Pointer position over the caret at `offset`, vertically centred on the line
    pub fn point_at_offset(&self, offset: usize) -> Point {
        Point::new(
            TEXT_ORIGIN.x + offset as f64 * CHAR_WIDTH,
            TEXT_ORIGIN.y + LINE_HEIGHT / 2.0,
        )
    }
}

pub fn paragraph_page(text: &str) -> ParagraphPage {
    let mut dom = MemoryDom::new(viewport());
    let body = dom.body_id();
    let paragraph = dom.append_element(
        body,
        ElementInit::new("p")
            .id("intro")
            .rect(Rect::from_xywh(TEXT_ORIGIN.x, TEXT_ORIGIN.y, 1200.0, LINE_HEIGHT)),
    );
    let text = dom.append_text(paragraph, text, Some(text_layout(TEXT_ORIGIN)));
    ParagraphPage {
        dom,
        paragraph,
        text,
    }
}

/// Keeps everything it is given so tests can assert on diagnostics
#[derive(Debug, Default)]
pub struct RecordingLogger {
    events: RefCell<Vec<(String, Value)>>,
    warnings: RefCell<Vec<String>>,
}

impl RecordingLogger {
    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.borrow().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }
}

impl BasicLogger for RecordingLogger {
    fn log_event(&self, name: &str, props: &Value) {
        self.events
            .borrow_mut()
            .push((name.to_string(), props.clone()));
    }

    fn log_warning(&self, message: &str, _props: Option<&Value>) {
        self.warnings.borrow_mut().push(message.to_string());
    }
}
