use thiserror::Error;

/// Failure to build a `DomRange`, mirroring the exceptions thrown by
/// `Range.setStart` / `Range.setEnd`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("offset {offset} is larger than the node's length ({length})")]
    OffsetOutOfBounds { offset: usize, length: usize },
    #[error("node of type {0} cannot be a range boundary")]
    InvalidNodeType(String),
}

/// Invariant violations while capturing a text selection.
///
/// These indicate a bug at the call site, not drift of the host page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("No start element and/or end element")]
    MissingParentElement,
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("message channel closed")]
    ChannelClosed,
    #[error("Invalid frame message: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Failed to parse page fixture: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Page fixture root must be an <html> element, found {0}")]
    InvalidRoot(String),
    #[error("Page fixture has no <body> element")]
    MissingBody,
}
