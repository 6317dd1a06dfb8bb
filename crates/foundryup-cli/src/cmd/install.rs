//! Default action: install (or build) and activate a version.

use anyhow::Result;
use foundryup_core::install::{InstallRequest, Outcome, Verification};

use crate::Config;
use crate::context::Context;

pub async fn install(config: &Config) -> Result<()> {
    let ctx = Context::new(config)?;
    tracing::debug!(release = %ctx.target, root = %ctx.layout.root().display(), "installing");

    let request = InstallRequest {
        specifier: config.specifier.clone(),
        force: config.force,
        jobs: config.jobs,
        release_base: config.release_base.clone(),
    };

    let outcome = ctx.installer().install(&request).await?;
    let msg = match &outcome {
        Outcome::Installed {
            tag,
            verification: Verification::Verified,
        } => format!("installed {tag} (verified)"),
        Outcome::Installed { tag, .. } => format!("installed {tag} (unverified)"),
        Outcome::Reused { tag } => format!("{tag} is up to date"),
        Outcome::Built { tag } => format!("built and installed {tag}"),
        Outcome::Linked { path } => format!("linked binaries from {}", path.display()),
    };
    ctx.output.success(&msg);
    Ok(())
}
