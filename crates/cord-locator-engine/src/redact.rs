//! Privacy mode: salted SHA-256 fingerprints instead of raw page text.
//!
//! Stored hashes look like `sha256:<salt>:<hex digest of "<salt>:<text>">`.
//! The salt is kept in the clear so a later page load can re-hash the live
//! text and compare.

use sha2::{Digest, Sha256};
use uuid::Uuid;

const HASH_ALGORITHM: &str = "sha256";

/// Shown instead of the selected text when annotations are hashed
pub const HASHED_TEXT_PLACEHOLDER: &str = "Annotation";

/// 8 random bytes, hex encoded
fn generate_salt() -> String {
    hex::encode(&Uuid::new_v4().as_bytes()[..8])
}

pub fn hash_with_salt(value: &str, salt: &str) -> String {
    let digest = Sha256::digest(format!("{salt}:{value}").as_bytes());
    format!("{HASH_ALGORITHM}:{salt}:{}", hex::encode(digest))
}

/// Hash `value` with a fresh random salt
pub fn sha256_hash_and_salt(value: &str) -> String {
    hash_with_salt(value, &generate_salt())
}

/// True if `stored` is the salted hash of `value`
pub fn matches_hash(value: &str, stored: &str) -> bool {
    let salt = stored.split(':').nth(1).unwrap_or_default();
    stored == hash_with_salt(value, salt)
}

/// Accepts both storage modes: plain text equality or a matching hash
pub fn matches_stored_text(value: &str, stored: &str) -> bool {
    value == stored || matches_hash(value, stored)
}

/// Text as it is persisted and as it is shown to users
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedText {
    pub stored: String,
    pub display: String,
}

/// Decides what leaves the page when an annotation is captured
pub trait TextRedactor {
    /// `display` is the human readable rendering of `text` when it differs
    /// from the raw selection (e.g. only visible nodes), otherwise `None`
    fn capture(&self, text: &str, display: Option<String>) -> CapturedText;

    /// Point annotations fingerprint nearby text, which hashing cannot support
    fn allows_point_fingerprints(&self) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainText;

impl TextRedactor for PlainText {
    fn capture(&self, text: &str, display: Option<String>) -> CapturedText {
        CapturedText {
            stored: text.to_string(),
            display: display.unwrap_or_else(|| text.to_string()),
        }
    }

    fn allows_point_fingerprints(&self) -> bool {
        true
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HashedText;

impl TextRedactor for HashedText {
    fn capture(&self, text: &str, _display: Option<String>) -> CapturedText {
        CapturedText {
            stored: sha256_hash_and_salt(text),
            display: HASHED_TEXT_PLACEHOLDER.to_string(),
        }
    }

    fn allows_point_fingerprints(&self) -> bool {
        false
    }
}

pub fn redactor_for(hash_annotations: bool) -> Box<dyn TextRedactor> {
    if hash_annotations {
        Box::new(HashedText)
    } else {
        Box::new(PlainText)
    }
}
