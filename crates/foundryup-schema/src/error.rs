use thiserror::Error;

/// Errors raised while interpreting user input into schema types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// OS name with no published releases.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// `--pr` and `--branch` were both given.
    #[error("can't use --pr and --branch at the same time")]
    PrWithBranch,

    /// `--repo` is not `owner/name`.
    #[error("invalid repository '{0}': expected <owner>/<name>")]
    InvalidRepo(String),

    /// Numeric version that is not valid semver.
    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    /// Digest that is not 64 hex characters.
    #[error("invalid sha256 digest '{0}'")]
    InvalidDigest(String),
}
