//! Core types used throughout foundryup.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Canonical key of one installable version in the Version Store.
///
/// Either a release tag (`v1.2.3`, `stable`, `nightly`) or a synthesized
/// source-build tag (`{author}-{commit|pr|branch}-{value}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    /// Create a new `Tag`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Tag for a source build: `{author}-{kind}-{value}`.
    ///
    /// Slashes in `value` become dashes so the tag is a single path component.
    pub fn custom(author: &str, kind: &str, value: &str) -> Self {
        Self(format!("{author}-{kind}-{}", value.replace('/', "-")))
    }

    /// True for floating release channels whose contents change over time.
    pub fn is_channel(&self) -> bool {
        self.0 == "stable" || self.0 == "nightly"
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Tag {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Tag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        Self(s)
    }
}
