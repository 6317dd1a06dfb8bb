//! Core library for foundryup.
//!
//! # Overview
//!
//! Turns a resolved version into a verified, active binary set:
//!
//! - [`io::download`] fetches release archives, attestations and manuals.
//! - [`attest`] decodes provenance attestations and checks file hashes.
//! - [`store`] is the per-tag cache of installed binary sets.
//! - [`activate`] copies (or links) one binary set into the active directory.
//! - [`build`] is the source-build fallback for branches, PRs, commits and
//!   local checkouts.
//! - [`install`] wires them together.
//!
//! Every external primitive (HTTP, archive extraction, hashing, process
//! lookup, native builds) sits behind a trait so the flow runs in tests
//! without network or subprocesses.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.foundry/
//! ├── bin/               # Active binary set
//! ├── versions/<tag>/    # One binary set per tag
//! ├── share/man/man1/    # Manual pages
//! └── <author>/          # Source checkouts for remote builds
//! ```

pub mod activate;
pub mod attest;
pub mod build;
pub mod error;
pub mod hashing;
pub mod host;
pub mod install;
pub mod io;
pub mod paths;
pub mod reporter;
pub mod store;

pub use error::InstallError;
pub use paths::Layout;
pub use reporter::{NullReporter, Reporter};

/// User Agent string for network operations
pub const USER_AGENT: &str = concat!("foundryup/", env!("CARGO_PKG_VERSION"));
