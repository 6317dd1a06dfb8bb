//! Shared command context.
//!
//! Owns the production capabilities so each command can borrow an
//! [`Installer`] without repeating the wiring.

use std::fmt;

use anyhow::{Context as _, Result};
use foundryup_core::activate::SystemProcessLister;
use foundryup_core::build::{CargoBuilder, GitCheckout};
use foundryup_core::hashing::Sha256Hasher;
use foundryup_core::host::detect_target;
use foundryup_core::install::{Capabilities, Installer, PublishedChannels};
use foundryup_core::io::download::HttpFetcher;
use foundryup_core::io::extract::NativeExtractor;
use foundryup_core::store::CommandProbe;
use foundryup_core::Layout;
use foundryup_schema::Target;

use crate::Config;
use crate::ui::Output;

/// Groups the state every command needs.
pub struct Context {
    pub layout: Layout,
    pub target: Target,
    pub output: Output,
    fetcher: HttpFetcher,
    builder: CargoBuilder,
    checkout: GitCheckout,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("layout", &self.layout)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Resolve the directory layout and release target for this run.
    pub fn new(config: &Config) -> Result<Self> {
        let layout = Layout::from_env().context("could not determine home directory")?;
        let target = detect_target(config.platform.as_deref(), config.arch.as_deref())?;

        Ok(Self {
            layout,
            target,
            output: Output::new(),
            fetcher: HttpFetcher::new(),
            builder: CargoBuilder,
            checkout: GitCheckout::default(),
        })
    }

    pub fn fetcher(&self) -> &HttpFetcher {
        &self.fetcher
    }

    pub fn installer(&self) -> Installer<'_> {
        let caps = Capabilities {
            fetcher: &self.fetcher,
            extractor: &NativeExtractor,
            hasher: &Sha256Hasher,
            builder: &self.builder,
            checkout: &self.checkout,
            processes: &SystemProcessLister,
            probe: &CommandProbe,
            channels: &PublishedChannels,
            reporter: &self.output,
        };
        Installer::new(self.layout.clone(), self.target, caps)
    }
}
