//! Path-queryable access to JSON response documents.
//!
//! The parking service has changed its response envelopes several times, so
//! a single value (a token, a user id, a history id) may live at different
//! paths depending on the server version. Callers describe every known
//! location as an ordered list of [`FieldPath`] candidates and let
//! [`Document::first_present`] pick the first one that holds a usable value.
//!
//! ```
//! use parkwatch_core::document::{Document, FieldPath};
//!
//! const TOKEN: &[FieldPath] = &[
//!     FieldPath::text("data.token"),
//!     FieldPath::text("token"),
//! ];
//!
//! let doc = Document::parse(r#"{"token": "abc"}"#).unwrap();
//! assert_eq!(doc.first_present(TOKEN).as_deref(), Some("abc"));
//! ```

use serde_json::Value;
use thiserror::Error;

/// Errors produced while parsing a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The body was empty.
    #[error("empty document")]
    Empty,

    /// The body is not valid JSON.
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Which JSON value types a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Only JSON strings.
    Text,
    /// Only JSON integers.
    Integer,
    /// Strings, or integers rendered in decimal.
    TextOrInteger,
}

/// A dotted path into a document together with the accepted value kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath {
    path: &'static str,
    kind: FieldKind,
}

impl FieldPath {
    /// A field that must hold a string.
    #[must_use]
    pub const fn text(path: &'static str) -> Self {
        Self {
            path,
            kind: FieldKind::Text,
        }
    }

    /// A field that must hold an integer.
    #[must_use]
    pub const fn integer(path: &'static str) -> Self {
        Self {
            path,
            kind: FieldKind::Integer,
        }
    }

    /// A field that may hold a string or an integer.
    #[must_use]
    pub const fn text_or_integer(path: &'static str) -> Self {
        Self {
            path,
            kind: FieldKind::TextOrInteger,
        }
    }

    /// The dotted path, e.g. `data.history.id`.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// The accepted value kind.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }
}

/// A parsed response document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

impl Document {
    /// Parse a response body.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Empty` for a blank body and
    /// `DocumentError::Malformed` if the body is not JSON.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        if text.trim().is_empty() {
            return Err(DocumentError::Empty);
        }
        let root = serde_json::from_str(text)?;
        Ok(Self { root })
    }

    /// Walk a dotted path through nested objects.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.root, |node, segment| node.as_object()?.get(segment))
    }

    /// Read one field, returning its normalized string form.
    ///
    /// Values of the wrong kind, blank strings and the literal `"null"` are
    /// treated as absent.
    #[must_use]
    pub fn get(&self, field: &FieldPath) -> Option<String> {
        let value = self.lookup(field.path)?;
        let raw = match (field.kind, value) {
            (FieldKind::Text | FieldKind::TextOrInteger, Value::String(s)) => s.clone(),
            (FieldKind::Integer | FieldKind::TextOrInteger, Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    i.to_string()
                } else {
                    n.as_u64()?.to_string()
                }
            }
            _ => return None,
        };
        normalize(&raw)
    }

    /// Return the first candidate that holds a usable value.
    #[must_use]
    pub fn first_present(&self, candidates: &[FieldPath]) -> Option<String> {
        self.first_match(candidates).map(|(_, value)| value)
    }

    /// Like [`first_present`](Self::first_present), but also reports which
    /// candidate matched.
    #[must_use]
    pub fn first_match(&self, candidates: &[FieldPath]) -> Option<(FieldPath, String)> {
        candidates
            .iter()
            .find_map(|field| self.get(field).map(|value| (*field, value)))
    }
}

/// Normalize an identity-like string: trim it, and treat blank strings and
/// the literal `"null"` as absent.
#[must_use]
pub fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Return at most `max` characters of `text`, for log excerpts.
#[must_use]
pub fn excerpt(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
