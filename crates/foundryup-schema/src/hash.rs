use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SchemaError;

/// A validated SHA256 digest (64 lowercase hex characters).
///
/// Attestations and computed file hashes are both normalized through this
/// type, so comparing two digests is a plain equality check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Create a new `Sha256Digest`, validating the input.
    ///
    /// Accepts strings with or without a `sha256:` prefix, in any case.
    ///
    /// # Errors
    ///
    /// Returns an error if the hex portion is not exactly 64 ASCII hex characters.
    pub fn new(s: impl Into<String>) -> Result<Self, SchemaError> {
        let s = s.into();
        let hex = s.trim().strip_prefix("sha256:").unwrap_or(s.trim());

        if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SchemaError::InvalidDigest(s.clone()));
        }

        Ok(Self(hex.to_lowercase()))
    }

    /// Wrap the raw 32-byte output of a hasher.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Get the digest as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn normalizes_case_and_prefix() {
        let upper = format!("sha256:{}", EMPTY.to_uppercase());
        assert_eq!(Sha256Digest::new(upper).unwrap().as_str(), EMPTY);
    }

    #[test]
    fn rejects_short_input() {
        assert!(Sha256Digest::new("abc123").is_err());
    }

    #[test]
    fn rejects_non_hex() {
        let bad = "z".repeat(64);
        assert!(Sha256Digest::new(bad).is_err());
    }

    #[test]
    fn from_bytes_is_lowercase_hex() {
        let d = Sha256Digest::from_bytes(&[0xAB; 32]);
        assert_eq!(d.as_str(), "ab".repeat(32));
    }
}
