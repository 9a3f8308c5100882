use serde::{Deserialize, Serialize};

use super::{ElementInit, MemoryDom, NodeId, TextLayout};
use crate::dom::{CaretCapabilities, ComputedStyle, InputState, ScrollMetrics, Viewport};
use crate::error::FixtureError;
use crate::types::Rect;

/// JSON snapshot of a rendered page, as consumed by `MemoryDom::from_fixture`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFixture {
    pub viewport: Viewport,
    #[serde(default)]
    pub caret_capabilities: Option<CaretCapabilities>,
    /// The `<html>` element
    pub document: FixtureElement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixtureNode {
    Text {
        text: String,
        #[serde(default)]
        layout: Option<TextLayout>,
    },
    Comment {
        comment: String,
    },
    Element(FixtureElement),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureElement {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub style: ComputedStyle,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub scroll: Option<ScrollMetrics>,
    #[serde(default)]
    pub input: Option<InputState>,
    #[serde(default)]
    pub children: Vec<FixtureNode>,
}

impl FixtureElement {
    fn init(&self) -> ElementInit {
        let mut init = ElementInit::new(&self.tag).style(self.style).rect(self.rect);
        if let Some(id) = &self.id {
            init = init.id(id);
        }
        for class_name in &self.classes {
            init = init.class(class_name);
        }
        if let Some(scroll) = self.scroll {
            init = init.scroll(scroll);
        }
        if let Some(input) = &self.input {
            init = init.input(input.clone());
        }
        init
    }
}

impl MemoryDom {
    pub fn from_fixture_json(json: &str) -> Result<Self, FixtureError> {
        let fixture: PageFixture = serde_json::from_str(json)?;
        Self::from_fixture(&fixture)
    }

    pub fn from_fixture(fixture: &PageFixture) -> Result<Self, FixtureError> {
        let root = &fixture.document;
        if !root.tag.eq_ignore_ascii_case("html") {
            return Err(FixtureError::InvalidRoot(root.tag.clone()));
        }

        let mut dom = Self::with_root(fixture.viewport, root.init());
        if let Some(capabilities) = fixture.caret_capabilities {
            dom.caret_capabilities = capabilities;
        }
        let html = dom.document_element;
        dom.build_children(html, &root.children);

        let body = dom
            .node(html)
            .children
            .iter()
            .copied()
            .find(|child| {
                dom.element(*child)
                    .is_some_and(|element| element.tag == "BODY")
            })
            .ok_or(FixtureError::MissingBody)?;
        dom.body = body;
        log::debug!("Loaded page fixture with {} nodes", dom.nodes.len());
        Ok(dom)
    }

    fn build_children(&mut self, parent: NodeId, children: &[FixtureNode]) {
        for child in children {
            match child {
                FixtureNode::Text { text, layout } => {
                    self.append_text(parent, text, *layout);
                }
                FixtureNode::Comment { comment } => {
                    self.append_comment(parent, comment);
                }
                FixtureNode::Element(element) => {
                    let id = self.append_element(parent, element.init());
                    self.build_children(id, &element.children);
                }
            }
        }
    }
}
