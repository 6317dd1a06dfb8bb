//! Command handlers, one per [`Action`].

pub mod install;
pub mod list;
pub mod self_update;
pub mod r#use;

use anyhow::Result;

use crate::{Action, Config, INSTALLER_VERSION};

/// Dispatch the action selected by the flags.
pub async fn run(config: &Config) -> Result<()> {
    match &config.action {
        Action::Version => {
            println!("foundryup: {INSTALLER_VERSION}");
            Ok(())
        }
        Action::Update => self_update::self_update(config).await,
        Action::List => list::list(config),
        Action::Use(tag) => r#use::use_version(config, tag),
        Action::Install => install::install(config).await,
    }
}
