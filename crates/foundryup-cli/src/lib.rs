//! foundryup - the Foundry toolchain installer
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! Installs, verifies and switches between versions of the Foundry binaries
//! (`forge`, `cast`, `anvil`, `chisel`).
//!
//! # Architecture
//!
//! - **Flags, not subcommands**: every action is selected by a flag, and all
//!   of them are folded into one immutable [`Config`] before anything runs.
//! - **Capabilities**: the install flow in `foundryup-core` only sees traits;
//!   [`context::Context`] wires the real HTTP, archive, git and cargo
//!   implementations to it.

pub mod cmd;
pub mod context;
pub mod ui;

use std::path::PathBuf;

use clap::Parser;
use foundryup_schema::{DEFAULT_REPO, Specifier};

pub use foundryup_core::USER_AGENT;

/// Version of this installer, derived from git tags at build time.
pub const INSTALLER_VERSION: &str = env!("FOUNDRYUP_INSTALLER_VERSION");

/// Where `--update` looks for the latest installer by default.
pub const DEFAULT_UPDATE_URL: &str =
    "https://raw.githubusercontent.com/foundry-rs/foundry/HEAD/foundryup/foundryup";

#[derive(Debug, Parser)]
#[command(name = "foundryup")]
#[command(about = "The installer for Foundry", disable_version_flag = true)]
pub struct Cli {
    /// Print the installer version
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Update foundryup to the latest release
    #[arg(short = 'U', long)]
    pub update: bool,

    /// Install a specific version: stable, nightly, or x.y.z
    #[arg(short = 'i', long, env = "FOUNDRYUP_VERSION", value_name = "VERSION")]
    pub install: Option<String>,

    /// Activate an already installed version
    #[arg(short = 'u', long = "use", value_name = "VERSION")]
    pub use_version: Option<String>,

    /// List installed versions
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Build and install a branch
    #[arg(short = 'b', long, env = "FOUNDRYUP_BRANCH")]
    pub branch: Option<String>,

    /// Build and install a pull request
    #[arg(short = 'P', long, env = "FOUNDRYUP_PR")]
    pub pr: Option<u64>,

    /// Build and install a specific commit
    #[arg(short = 'C', long, env = "FOUNDRYUP_COMMIT")]
    pub commit: Option<String>,

    /// Build and install from a fork (owner/name)
    #[arg(short = 'r', long, env = "FOUNDRYUP_REPO", default_value = DEFAULT_REPO)]
    pub repo: String,

    /// Build and install a local checkout
    #[arg(short = 'p', long, env = "FOUNDRYUP_LOCAL_REPO")]
    pub path: Option<PathBuf>,

    /// Parallel jobs for source builds (default: all cores)
    #[arg(short = 'j', long, env = "FOUNDRYUP_JOBS")]
    pub jobs: Option<usize>,

    /// Skip attestation hash verification
    #[arg(short = 'f', long, env = "FOUNDRYUP_IGNORE_VERIFICATION")]
    pub force: bool,

    /// Override the detected architecture (amd64, arm64)
    #[arg(long, env = "FOUNDRYUP_ARCH")]
    pub arch: Option<String>,

    /// Override the detected platform (linux, alpine, darwin, win32)
    #[arg(long, env = "FOUNDRYUP_PLATFORM")]
    pub platform: Option<String>,

    #[arg(long, env = "FOUNDRYUP_RELEASE_BASE", hide = true)]
    pub release_base: Option<String>,

    #[arg(long, env = "FOUNDRYUP_UPDATE_URL", hide = true)]
    pub update_url: Option<String>,
}

/// What a single invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Version,
    Update,
    List,
    Use(String),
    Install,
}

/// Immutable run configuration, built once from the parsed flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub action: Action,
    pub specifier: Specifier,
    pub force: bool,
    pub jobs: usize,
    pub arch: Option<String>,
    pub platform: Option<String>,
    pub release_base: Option<String>,
    pub update_url: String,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let action = if cli.version {
            Action::Version
        } else if cli.update {
            Action::Update
        } else if cli.list {
            Action::List
        } else if let Some(tag) = cli.use_version {
            Action::Use(tag)
        } else {
            Action::Install
        };

        Self {
            action,
            specifier: Specifier {
                version: cli.install,
                branch: cli.branch,
                pr: cli.pr,
                commit: cli.commit,
                repo: cli.repo,
                local_path: cli.path,
            },
            force: cli.force,
            jobs: cli.jobs.filter(|j| *j > 0).unwrap_or_else(num_cpus::get),
            arch: cli.arch,
            platform: cli.platform,
            release_base: cli.release_base,
            update_url: cli
                .update_url
                .unwrap_or_else(|| DEFAULT_UPDATE_URL.to_string()),
        }
    }
}
