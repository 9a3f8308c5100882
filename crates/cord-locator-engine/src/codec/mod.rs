//! Text selection <-> [`HighlightedTextConfig`].
//!
//! Capturing turns a live selection into selectors, child indices and offsets
//! that can be stored. Resolving goes the other way on a page that may have
//! changed since: anything that no longer lines up yields `None` / `false`
//! instead of an error.

mod geometry;

use serde_json::json;

use crate::dom::{Dom, DomRange, DomSelection, Visibility};
use crate::error::{CaptureError, RangeError};
use crate::logger::BasicLogger;
use crate::redact::{TextRedactor, matches_stored_text};
use crate::types::HighlightedTextConfig;
use crate::util::text::{slice_utf16, utf16_len};
use crate::util::{
    SelectorGenerator, get_nodes_from_range, is_input_or_text_area, is_text_node, range_to_string,
};

pub use geometry::{
    OffScreenDirection, SELECTION_TOO_FAR_OFF_SCREEN_PX, range_client_rects,
    rightmost_highlighted_visible_point, selection_off_screen_direction, selection_text_nodes,
};

pub const MAX_TEXT_TO_DISPLAY_LENGTH: usize = 500;

const CREATE_TEXT_ANNOTATION_EVENT: &str = "create-text-annotation";

/// Capture the first range of `selection`.
///
/// `dom` is the document holding the selection, i.e. the iframe's document
/// when the user selected inside one; `in_iframe` is only reported in the
/// capture event. Returns `Ok(None)` when there is nothing to capture or no
/// stable selector exists for the selected elements.
pub fn create_highlighted_text_config<D, S>(
    dom: &D,
    selection: &DomSelection<D::Node>,
    target: &D::Node,
    in_iframe: bool,
    redactor: &dyn TextRedactor,
    selectors: &S,
    logger: &dyn BasicLogger,
) -> Result<Option<HighlightedTextConfig>, CaptureError>
where
    D: Dom,
    S: SelectorGenerator,
{
    let Some(range) = selection.range_at(0) else {
        return Ok(None);
    };

    if is_input_or_text_area(dom, target) {
        return Ok(capture_input_selection(
            dom, target, in_iframe, redactor, selectors, logger,
        ));
    }

    let start_element = dom.parent_element(&range.start_container);
    let end_element = dom.parent_element(&range.end_container);
    let (Some(start_element), Some(end_element)) = (start_element, end_element) else {
        return Err(CaptureError::MissingParentElement);
    };

    let captured = redactor.capture(
        &range_to_string(dom, range),
        Some(range_to_text_to_display(dom, range)),
    );
    logger.log_event(
        CREATE_TEXT_ANNOTATION_EVENT,
        &json!({
            "targetNodeName": dom.node_name(&start_element),
            "insideIframe": in_iframe,
            "textLength": utf16_len(&captured.display),
        }),
    );

    let Some(start_element_selector) = selectors.selector_for(dom, &start_element) else {
        return Ok(None);
    };
    let Some(end_element_selector) = selectors.selector_for(dom, &end_element) else {
        return Ok(None);
    };

    Ok(Some(HighlightedTextConfig {
        start_element_selector,
        end_element_selector,
        start_node_index: dom.child_index(&range.start_container).unwrap_or(0),
        end_node_index: dom.child_index(&range.end_container).unwrap_or(0),
        start_node_offset: range.start_offset,
        end_node_offset: range.end_offset,
        selected_text: captured.stored,
        text_to_display: Some(captured.display),
    }))
}

fn capture_input_selection<D, S>(
    dom: &D,
    input: &D::Node,
    in_iframe: bool,
    redactor: &dyn TextRedactor,
    selectors: &S,
    logger: &dyn BasicLogger,
) -> Option<HighlightedTextConfig>
where
    D: Dom,
    S: SelectorGenerator,
{
    let state = dom.input_state(input).unwrap_or_default();
    let start = state.selection_start.unwrap_or(0);
    let end = state.selection_end.unwrap_or(0);
    let captured = redactor.capture(&slice_utf16(&state.value, start, end), None);

    logger.log_event(
        CREATE_TEXT_ANNOTATION_EVENT,
        &json!({
            "targetNodeName": dom.node_name(input),
            "insideIframe": in_iframe,
            "textLength": utf16_len(&captured.stored),
        }),
    );

    let selector = selectors.selector_for(dom, input)?;
    Some(HighlightedTextConfig {
        start_element_selector: selector.clone(),
        end_element_selector: selector,
        start_node_index: 0,
        end_node_index: 0,
        start_node_offset: start,
        end_node_offset: end,
        selected_text: captured.stored,
        text_to_display: Some(captured.display),
    })
}

/// Rebuild the stored range on the current page
pub fn get_text_highlight_range<D: Dom>(
    dom: &D,
    config: &HighlightedTextConfig,
) -> Option<DomRange<D::Node>> {
    let start_element = dom.query_selector(&config.start_element_selector)?;
    let end_element = dom.query_selector(&config.end_element_selector)?;
    let start_node = dom
        .child_nodes(&start_element)
        .get(config.start_node_index)
        .cloned()?;
    let end_node = dom
        .child_nodes(&end_element)
        .get(config.end_node_index)
        .cloned()?;

    match DomRange::new(
        dom,
        start_node,
        config.start_node_offset,
        end_node,
        config.end_node_offset,
    ) {
        Ok(range) => Some(range),
        Err(error @ RangeError::OffsetOutOfBounds { .. }) => {
            // Text was shortened since the annotation was made
            log::debug!("Stored text highlight no longer fits the page: {error}");
            None
        }
        Err(error) => {
            log::warn!("Could not rebuild text highlight range: {error}");
            None
        }
    }
}

/// True if the stored text is rendered on the page right now, in either
/// storage mode
pub fn is_highlighted_text_present<D: Dom>(dom: &D, config: &HighlightedTextConfig) -> bool {
    let Some(start_element) = dom.query_selector(&config.start_element_selector) else {
        return false;
    };
    let Some(end_element) = dom.query_selector(&config.end_element_selector) else {
        return false;
    };
    if dom.client_rects(&start_element).is_empty() || dom.client_rects(&end_element).is_empty() {
        return false;
    }

    if is_input_or_text_area(dom, &start_element) {
        let Some(state) = dom.input_state(&start_element) else {
            return false;
        };
        let value = slice_utf16(&state.value, config.start_node_offset, config.end_node_offset);
        return matches_stored_text(&value, &config.selected_text);
    }

    match get_text_highlight_range(dom, config) {
        Some(range) => matches_stored_text(&range_to_string(dom, &range), &config.selected_text),
        None => false,
    }
}

/// Single-line label for a stored highlight
pub fn get_text_highlight_display_text(config: Option<&HighlightedTextConfig>) -> Option<String> {
    let config = config?;
    let text = config
        .text_to_display
        .as_deref()
        .unwrap_or(&config.selected_text);
    Some(text.replace('\n', " "))
}

fn is_visible<D: Dom>(dom: &D, element: &D::Node) -> bool {
    let rect = dom.bounding_client_rect(element);
    let takes_space = rect.width() != 0.0 || rect.height() != 0.0;
    if !takes_space && dom.client_rects(element).is_empty() {
        return false;
    }
    let style = dom.computed_style(element);
    style.opacity != 0.0 && style.visibility == Visibility::Visible
}

/// What the user saw when selecting: visible text nodes only, with a space
/// between nodes, capped at [`MAX_TEXT_TO_DISPLAY_LENGTH`] code units
pub fn range_to_text_to_display<D: Dom>(dom: &D, range: &DomRange<D::Node>) -> String {
    let nodes = get_nodes_from_range(dom, range, |node| {
        is_text_node(dom, node)
            && dom
                .parent_element(node)
                .is_some_and(|parent| is_visible(dom, &parent))
    });

    let mut text = String::new();
    for node in nodes {
        let should_add_space = !text.trim().is_empty();
        let content = dom.text_content(&node);
        if content.trim().is_empty() {
            if should_add_space {
                text.push(' ');
            }
            continue;
        }

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
        if utf16_len(&text) > MAX_TEXT_TO_DISPLAY_LENGTH {
            text = slice_utf16(&text, 0, MAX_TEXT_TO_DISPLAY_LENGTH);
            break;
        }
        if should_add_space && !text.ends_with(' ') {
            text.push(' ');
        }
    }
    text
}
