pub mod codec;
pub mod dom;
pub mod error;
pub mod heuristics;
pub mod highlight;
pub mod logger;
pub mod matcher;
pub mod messaging;
pub mod redact;
pub mod types;
pub mod util;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use codec::*;
pub use dom::{BrowserDom, Dom, DomRange, DomSelection, MemoryDom, NodeId, PageFixture};
pub use error::*;
pub use heuristics::*;
pub use highlight::*;
pub use logger::*;
pub use matcher::*;
pub use messaging::*;
pub use redact::*;
pub use types::*;
pub use util::{CaretPositionResolver, CaretRangeResolver, PathSelectorGenerator, SelectorGenerator};
