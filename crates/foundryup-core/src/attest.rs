//! Provenance attestations.
//!
//! A release publishes `<archive>.attestation.txt`, whose first line links to
//! a signed attestation. The attestation wraps a DSSE envelope whose base64
//! payload is an in-toto statement listing `subject[].name` and
//! `subject[].digest.sha256` for every binary.
//!
//! Two checks use the decoded mapping:
//!
//! - [`check_reuse`] decides whether an existing store entry can be activated
//!   without downloading anything.
//! - [`verify_installed`] checks a freshly extracted entry and reports every
//!   mismatching binary at once.

use std::collections::HashMap;
use std::path::Path;

use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

use foundryup_schema::{BINARIES, Platform, Sha256Digest};

use crate::InstallError;
use crate::hashing::{ContentHasher, is_executable};
use crate::io::download::{FetchError, Fetcher};

/// Attestation artifact could not be decoded.
#[derive(Error, Debug)]
pub enum AttestationError {
    /// Envelope or statement is not the expected JSON.
    #[error("not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// DSSE payload is not base64.
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

#[derive(Deserialize)]
struct Attestation {
    #[serde(rename = "dsseEnvelope")]
    dsse_envelope: Envelope,
}

#[derive(Deserialize)]
struct Envelope {
    payload: String,
}

#[derive(Deserialize)]
struct Statement {
    #[serde(default)]
    subject: Vec<serde_json::Value>,
}

/// Expected content hash per binary name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttestationRecord {
    hashes: HashMap<String, Sha256Digest>,
}

impl AttestationRecord {
    /// Decode an attestation artifact.
    ///
    /// Subjects missing a name or a valid sha256 digest are dropped.
    pub fn parse(artifact: &str) -> Result<Self, AttestationError> {
        let attestation: Attestation = serde_json::from_str(artifact)?;
        let payload = base64::engine::general_purpose::STANDARD
            .decode(attestation.dsse_envelope.payload.trim())?;
        let statement: Statement = serde_json::from_slice(&payload)?;

        let hashes = statement
            .subject
            .iter()
            .filter_map(|subject| {
                let name = subject.get("name")?.as_str()?;
                let sha = subject.get("digest")?.get("sha256")?.as_str()?;
                let digest = Sha256Digest::new(sha).ok()?;
                Some((name.to_string(), digest))
            })
            .collect();

        Ok(Self { hashes })
    }

    /// Expected hash for `bin`: the bare name first, then `<bin>.exe`.
    pub fn expected(&self, bin: &str) -> Option<&Sha256Digest> {
        self.hashes
            .get(bin)
            .or_else(|| self.hashes.get(&format!("{bin}.exe")))
    }

    /// Number of attested binaries.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// True when nothing was attested.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, Sha256Digest)> for AttestationRecord {
    fn from_iter<I: IntoIterator<Item = (N, Sha256Digest)>>(iter: I) -> Self {
        Self {
            hashes: iter.into_iter().map(|(n, d)| (n.into(), d)).collect(),
        }
    }
}

/// Whether this release can be verified at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttestationStatus {
    /// No attestation published; verification is skipped for this run.
    Missing,
    /// Attestation found and decoded.
    Present(AttestationRecord),
}

/// Resolve the attestation pointer at `pointer_url` and decode what it links to.
///
/// An empty pointer, a 404, or a body that reads "not found" yields
/// [`AttestationStatus::Missing`]. Any other fetch failure is fatal.
pub async fn fetch_attestation(
    fetcher: &dyn Fetcher,
    pointer_url: &str,
) -> Result<AttestationStatus, InstallError> {
    let pointer = match fetcher.fetch_text(pointer_url).await {
        Ok(text) => text,
        Err(FetchError::NotFound(_)) => return Ok(AttestationStatus::Missing),
        Err(e) => return Err(InstallError::network("fetching attestation pointer", e)),
    };

    if pointer.to_lowercase().contains("not found") {
        return Ok(AttestationStatus::Missing);
    }
    let Some(link) = pointer.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Ok(AttestationStatus::Missing);
    };

    let artifact_url = format!("{}/download", link.trim_end_matches('/'));
    let artifact = fetcher
        .fetch_text(&artifact_url)
        .await
        .map_err(|e| InstallError::network("fetching attestation", e))?;

    let record = AttestationRecord::parse(&artifact)?;
    tracing::debug!(subjects = record.len(), "decoded attestation");
    Ok(AttestationStatus::Present(record))
}

/// Verdict of [`check_reuse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReuseVerdict {
    /// Every binary is present, executable and matches its attested hash.
    Satisfied,
    /// Something is off; download the release again.
    Refetch { reason: String },
}

/// Decide whether the entry at `dir` already holds this exact release.
pub fn check_reuse(
    dir: &Path,
    platform: Platform,
    record: &AttestationRecord,
    hasher: &dyn ContentHasher,
) -> ReuseVerdict {
    for bin in BINARIES {
        let path = dir.join(platform.binary_file_name(bin));
        if !is_executable(&path) {
            return ReuseVerdict::Refetch {
                reason: format!("{bin} is missing or not executable"),
            };
        }

        let Some(expected) = record.expected(bin) else {
            return ReuseVerdict::Refetch {
                reason: format!("no attested hash for {bin}"),
            };
        };

        match hasher.hash_file(&path) {
            Ok(actual) if &actual == expected => {}
            Ok(actual) => {
                tracing::debug!(bin, %expected, %actual, "cached binary differs");
                return ReuseVerdict::Refetch {
                    reason: format!("{bin} does not match its attested hash"),
                };
            }
            Err(e) => {
                return ReuseVerdict::Refetch {
                    reason: format!("could not hash {bin}: {e}"),
                };
            }
        }
    }

    ReuseVerdict::Satisfied
}

/// Check every binary in a freshly extracted entry.
///
/// # Errors
///
/// Returns [`InstallError::Verification`] naming every binary whose hash is
/// missing from the attestation, unreadable, or different.
pub fn verify_installed(
    dir: &Path,
    platform: Platform,
    record: &AttestationRecord,
    hasher: &dyn ContentHasher,
) -> Result<(), InstallError> {
    let mut failed = Vec::new();

    for bin in BINARIES {
        let path = dir.join(platform.binary_file_name(bin));
        let ok = match (record.expected(bin), hasher.hash_file(&path)) {
            (Some(expected), Ok(actual)) => {
                tracing::debug!(bin, %expected, %actual, "comparing hash");
                &actual == expected
            }
            (None, _) => {
                tracing::warn!(bin, "no attested hash");
                false
            }
            (_, Err(e)) => {
                tracing::warn!(bin, error = %e, "could not hash binary");
                false
            }
        };

        if !ok {
            failed.push(bin.to_string());
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(InstallError::Verification { failed })
    }
}
