//! Showing and hiding a stored text highlight with the page's own selection.
//!
//! At most one highlight is visible at a time. [`TextHighlighter`] owns that
//! slot: `show` fills it, `remove` clears it, and a `remove` for any other
//! annotation is ignored so late callbacks cannot hide a newer highlight.

mod stylesheet;

use std::fmt;

use crate::codec::{get_text_highlight_range, is_highlighted_text_present};
use crate::dom::BrowserDom;
use crate::messaging::{
    FrameMessage, FrameMessenger, HideTextHighlightPayload, ShowTextHighlightPayload,
};
use crate::types::{AnnotationId, HighlightedTextConfig};
use crate::util::{is_iframe, is_input_or_text_area};

pub use stylesheet::{
    CORD_ANNOTATION_ALLOWED_DATA_ATTRIBUTE, SELECTION_STYLESHEET_ID, SelectionStyle,
    create_selection_stylesheet,
};

/// The highlight currently shown, either here or inside `iframe`
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveHighlight<N> {
    pub id: AnnotationId,
    pub config: HighlightedTextConfig,
    pub iframe: Option<N>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    Shown,
    DelegatedToIframe,
    IframeNotFound,
    SendFailed,
    NoSelectionApi,
    TextNotPresent,
    RangeUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    NothingActive,
    /// Another annotation owns the highlight
    StaleId,
    Removed,
    DelegatedToIframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Show(ShowOutcome),
    Remove(RemoveOutcome),
}

pub struct TextHighlighter<N, M> {
    messenger: M,
    style: SelectionStyle,
    stylesheet: String,
    active: Option<ActiveHighlight<N>>,
}

impl<N, M> TextHighlighter<N, M>
where
    N: Clone + PartialEq + fmt::Debug,
    M: FrameMessenger<N>,
{
    pub fn new(messenger: M, style: SelectionStyle) -> Self {
        let stylesheet = create_selection_stylesheet(&style);
        Self {
            messenger,
            style,
            stylesheet,
            active: None,
        }
    }

    pub fn active(&self) -> Option<&ActiveHighlight<N>> {
        self.active.as_ref()
    }

    pub fn style(&self) -> &SelectionStyle {
        &self.style
    }

    /// Select the stored text on the page.
    ///
    /// With `iframe_selectors` the first one names the iframe to delegate to
    /// and the rest travel along in the message for deeper nesting.
    pub fn show<D>(
        &mut self,
        dom: &mut D,
        id: AnnotationId,
        config: &HighlightedTextConfig,
        iframe_selectors: &[String],
    ) -> ShowOutcome
    where
        D: BrowserDom<Node = N>,
    {
        if let Some((selector, remaining)) = iframe_selectors.split_first() {
            return self.delegate_show(dom, id, config, selector, remaining);
        }

        if dom.selection().is_none() {
            log::warn!("No selection");
            return ShowOutcome::NoSelectionApi;
        }
        if !is_highlighted_text_present(dom, config) {
            log::warn!("Highlighted text not found");
            return ShowOutcome::TextNotPresent;
        }

        let input = dom
            .query_selector(&config.start_element_selector)
            .filter(|element| is_input_or_text_area(&*dom, element));
        match input {
            Some(input) => select_input_text(dom, &input, config),
            None => {
                let Some(range) = get_text_highlight_range(dom, config) else {
                    log::warn!("No range available");
                    return ShowOutcome::RangeUnavailable;
                };
                dom.clear_selection();
                // Some embedded editors pop up a toolbar for focused selections
                if let Some(active_element) = dom.active_element() {
                    dom.blur(&active_element);
                }
                dom.add_selection_range(range);
            }
        }

        self.turn_on_styles(dom);
        self.active = Some(ActiveHighlight {
            id,
            config: config.clone(),
            iframe: None,
        });
        ShowOutcome::Shown
    }

    fn delegate_show<D>(
        &mut self,
        dom: &D,
        id: AnnotationId,
        config: &HighlightedTextConfig,
        selector: &str,
        remaining: &[String],
    ) -> ShowOutcome
    where
        D: BrowserDom<Node = N>,
    {
        let Some(iframe) = dom
            .query_selector(selector)
            .filter(|element| is_iframe(dom, element))
        else {
            log::warn!("No iframe matches {selector}");
            return ShowOutcome::IframeNotFound;
        };

        let message = FrameMessage::ShowTextHighlight(ShowTextHighlightPayload {
            annotation_id: id,
            highlighted_text_config: config.clone(),
            iframe_selectors: remaining.to_vec(),
        });
        if let Err(error) = self.messenger.send(&iframe, message) {
            log::warn!("Failed to send text highlight to iframe: {error}");
            return ShowOutcome::SendFailed;
        }

        self.active = Some(ActiveHighlight {
            id,
            config: config.clone(),
            iframe: Some(iframe),
        });
        ShowOutcome::DelegatedToIframe
    }

    /// Undo [`Self::show`] for `id`
    pub fn remove<D>(&mut self, dom: &mut D, id: AnnotationId) -> RemoveOutcome
    where
        D: BrowserDom<Node = N>,
    {
        match &self.active {
            None => return RemoveOutcome::NothingActive,
            Some(active) if active.id != id => {
                log::warn!("Attempting to remove a highlight that is not highlighted");
                return RemoveOutcome::StaleId;
            }
            Some(_) => {}
        }
        let Some(active) = self.active.take() else {
            return RemoveOutcome::NothingActive;
        };

        if let Some(iframe) = active.iframe {
            let message = FrameMessage::HideTextHighlight(HideTextHighlightPayload {
                annotation_id: id,
            });
            if let Err(error) = self.messenger.send(&iframe, message) {
                log::warn!("Failed to send text highlight removal to iframe: {error}");
            }
            return RemoveOutcome::DelegatedToIframe;
        }

        if dom
            .selection()
            .is_some_and(|selection| !selection.is_collapsed())
        {
            dom.clear_selection();
        }

        // Clearing the document selection leaves input selections behind in Firefox
        let input = dom
            .query_selector(&active.config.start_element_selector)
            .filter(|element| is_input_or_text_area(&*dom, element));
        if let Some(input) = input {
            if let Err(error) = dom.set_selection_range(&input, 0, 0) {
                log::debug!("Could not reset input selection: {error}");
            }
            dom.blur(&input);
        }

        self.turn_off_styles(dom);
        RemoveOutcome::Removed
    }

    /// Handle a message posted by the parent frame
    pub fn handle_message<D>(&mut self, dom: &mut D, message: FrameMessage) -> MessageOutcome
    where
        D: BrowserDom<Node = N>,
    {
        match message {
            FrameMessage::ShowTextHighlight(payload) => MessageOutcome::Show(self.show(
                dom,
                payload.annotation_id,
                &payload.highlighted_text_config,
                &payload.iframe_selectors,
            )),
            FrameMessage::HideTextHighlight(payload) => {
                MessageOutcome::Remove(self.remove(dom, payload.annotation_id))
            }
        }
    }

    fn turn_on_styles<D: BrowserDom>(&self, dom: &mut D) {
        if !dom.has_stylesheet(SELECTION_STYLESHEET_ID) {
            dom.append_stylesheet(SELECTION_STYLESHEET_ID, &self.stylesheet);
        }
        dom.add_body_class(&self.style.class_name);
    }

    fn turn_off_styles<D: BrowserDom>(&self, dom: &mut D) {
        dom.remove_stylesheet(SELECTION_STYLESHEET_ID);
        dom.remove_body_class(&self.style.class_name);
    }
}

/// Browsers refuse selection ranges on disabled inputs, so enable it for
/// the duration of the call
fn select_input_text<D: BrowserDom>(dom: &mut D, input: &D::Node, config: &HighlightedTextConfig) {
    let initially_disabled = dom
        .input_state(input)
        .is_some_and(|state| state.disabled);
    if initially_disabled {
        dom.set_disabled(input, false);
    }
    dom.blur(input);
    dom.focus(input);
    if let Err(error) =
        dom.set_selection_range(input, config.start_node_offset, config.end_node_offset)
    {
        log::warn!("{error}");
    }
    dom.set_disabled(input, initially_disabled);
}
