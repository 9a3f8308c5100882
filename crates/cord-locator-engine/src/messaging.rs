//! One-way messages from a page into the iframes it embeds.
//!
//! Highlights inside an iframe have to be drawn by the engine instance
//! running in that frame. The parent only sends a message and records that
//! the highlight lives there; no reply is expected.

use std::sync::mpsc;

use serde::{Deserialize, Serialize};

use crate::error::MessageError;
use crate::types::{AnnotationId, HighlightedTextConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowTextHighlightPayload {
    #[serde(rename = "annotationID")]
    pub annotation_id: AnnotationId,
    pub highlighted_text_config: HighlightedTextConfig,
    /// Selectors of the iframes still to descend into, outermost first
    pub iframe_selectors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HideTextHighlightPayload {
    #[serde(rename = "annotationID")]
    pub annotation_id: AnnotationId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FrameMessage {
    #[serde(rename = "CORD_SHOW_TEXT_HIGHLIGHT")]
    ShowTextHighlight(ShowTextHighlightPayload),
    #[serde(rename = "CORD_HIDE_TEXT_HIGHLIGHT")]
    HideTextHighlight(HideTextHighlightPayload),
}

impl FrameMessage {
    pub fn message_type(&self) -> &'static str {
        match self {
            FrameMessage::ShowTextHighlight(_) => "CORD_SHOW_TEXT_HIGHLIGHT",
            FrameMessage::HideTextHighlight(_) => "CORD_HIDE_TEXT_HIGHLIGHT",
        }
    }

    pub fn to_json(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Delivers a message to the content window of `iframe`
pub trait FrameMessenger<N> {
    fn send(&self, iframe: &N, message: FrameMessage) -> Result<(), MessageError>;
}

/// Queues messages for the host event loop to post
#[derive(Debug, Clone)]
pub struct ChannelMessenger<N> {
    sender: mpsc::Sender<(N, FrameMessage)>,
}

impl<N> ChannelMessenger<N> {
    pub fn new() -> (Self, mpsc::Receiver<(N, FrameMessage)>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl<N: Clone> FrameMessenger<N> for ChannelMessenger<N> {
    fn send(&self, iframe: &N, message: FrameMessage) -> Result<(), MessageError> {
        log::debug!("Posting {} to iframe", message.message_type());
        self.sender
            .send((iframe.clone(), message))
            .map_err(|_| MessageError::ChannelClosed)
    }
}
