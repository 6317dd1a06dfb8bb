//! Shared types for foundryup.
//!
//! Everything in this crate is pure data: no filesystem, network or process
//! access. The IO side lives in `foundryup-core`.

pub mod arch;
pub mod error;
pub mod hash;
pub mod platform;
pub mod spec;
pub mod types;
pub mod version;

// Re-exports
pub use arch::*;
pub use error::SchemaError;
pub use hash::Sha256Digest;
pub use platform::*;
pub use spec::{InstallKind, Resolution, Specifier};
pub use types::*;
pub use version::{is_newer, version_gt};

/// Repository that publishes prebuilt releases.
pub const DEFAULT_REPO: &str = "foundry-rs/foundry";

/// Prefix of every release archive, attestation and manual tarball.
pub const ARTIFACT_NAME: &str = "foundry";

/// The Binary Set: every toolkit version ships exactly these executables.
pub const BINARIES: [&str; 4] = ["forge", "cast", "anvil", "chisel"];
