//! Domain-specific errors for install, use and build operations

use foundryup_schema::{SchemaError, Tag};
use thiserror::Error;

use crate::attest::AttestationError;
use crate::build::BuildError;
use crate::io::download::FetchError;
use crate::io::extract::ExtractError;

/// Every way an install, use or list can fail.
#[derive(Error, Debug)]
pub enum InstallError {
    /// Bad or conflicting flags.
    #[error("{0}")]
    Usage(String),

    /// A required external command is missing.
    #[error("need '{0}' (command not found)")]
    Environment(String),

    /// Host or override names a platform without releases.
    #[error("{0}")]
    UnsupportedTarget(String),

    /// A download failed.
    #[error("{op} failed: {source}")]
    Network {
        op: &'static str,
        #[source]
        source: FetchError,
    },

    /// Post-install hash check failed for every binary listed.
    #[error("hash verification failed for: {}", .failed.join(", "))]
    Verification { failed: Vec<String> },

    /// A binary about to be replaced is running.
    #[error("'{0}' is currently running; stop the process and try again")]
    Conflict(String),

    /// `--use` named a tag with no store entry.
    #[error("version '{tag}' is not installed{}", available_suffix(.available))]
    NotInstalled { tag: Tag, available: Vec<String> },

    /// Attestation could not be decoded.
    #[error("attestation: {0}")]
    Attestation(#[from] AttestationError),

    /// Release archive could not be unpacked.
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// Source checkout or build failed.
    #[error("build failed: {0}")]
    Build(#[from] BuildError),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error with a short description of the failing step.
    #[error("{context}: {message}")]
    Context {
        context: &'static str,
        message: String,
    },
}

impl InstallError {
    /// Create an error with context for better debugging.
    pub fn context(ctx: &'static str, msg: impl std::fmt::Display) -> Self {
        Self::Context {
            context: ctx,
            message: msg.to_string(),
        }
    }

    /// Wrap a fetch failure with the name of the operation that issued it.
    pub fn network(op: &'static str, source: FetchError) -> Self {
        Self::Network { op, source }
    }
}

impl From<SchemaError> for InstallError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::UnsupportedPlatform(_) => Self::UnsupportedTarget(err.to_string()),
            _ => Self::Usage(err.to_string()),
        }
    }
}

fn available_suffix(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(". Installed versions: {}", available.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_names_every_binary() {
        let e = InstallError::Verification {
            failed: vec!["forge".to_string(), "chisel".to_string()],
        };
        assert_eq!(e.to_string(), "hash verification failed for: forge, chisel");
    }

    #[test]
    fn not_installed_lists_alternatives() {
        let e = InstallError::NotInstalled {
            tag: Tag::from("v9.9.9"),
            available: vec!["nightly".to_string(), "v1.0.0".to_string()],
        };
        assert_eq!(
            e.to_string(),
            "version 'v9.9.9' is not installed. Installed versions: nightly, v1.0.0"
        );
    }

    #[test]
    fn schema_errors_map_to_taxonomy() {
        let e: InstallError = SchemaError::UnsupportedPlatform("foo".to_string()).into();
        assert!(matches!(e, InstallError::UnsupportedTarget(_)));
        let e: InstallError = SchemaError::PrWithBranch.into();
        assert!(matches!(e, InstallError::Usage(_)));
    }
}
