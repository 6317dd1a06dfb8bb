//! Self-update command for foundryup
use std::path::Path;

use anyhow::{Context as _, Result};
use foundryup_core::io::download::Fetcher;
use foundryup_schema::{DEFAULT_REPO, Target, version_gt};
use regex::Regex;

use crate::context::Context;
use crate::{Config, INSTALLER_VERSION};

/// Pull the installer version literal out of the published manifest.
pub fn parse_remote_version(manifest: &str) -> Result<Option<String>> {
    let re = Regex::new(r#"FOUNDRYUP_INSTALLER_VERSION="([0-9][0-9A-Za-z.\-+]*)""#)?;
    Ok(re.captures(manifest).map(|c| c[1].to_string()))
}

/// Where the installer binary for `version` and `target` is published.
pub fn binary_url(base: &str, version: &str, target: Target) -> String {
    let file = target
        .platform
        .binary_file_name(&format!("foundryup_{target}"));
    format!(
        "{}/releases/download/foundryup-v{version}/{file}",
        base.trim_end_matches('/')
    )
}

/// The published version, if it is strictly newer than `current`.
pub async fn newer_version(
    fetcher: &dyn Fetcher,
    manifest_url: &str,
    current: &str,
) -> Result<Option<String>> {
    let manifest = fetcher
        .fetch_text(manifest_url)
        .await
        .context("failed to fetch installer manifest")?;
    let latest = parse_remote_version(&manifest)?
        .context("installer manifest does not declare a version")?;

    Ok(version_gt(&latest, current).then_some(latest))
}

/// Update foundryup itself
pub async fn self_update(config: &Config) -> Result<()> {
    let ctx = Context::new(config)?;
    let output = &ctx.output;

    output.info("checking for foundryup updates...");
    let Some(latest) = newer_version(ctx.fetcher(), &config.update_url, INSTALLER_VERSION).await?
    else {
        output.success(&format!("foundryup is up to date ({INSTALLER_VERSION})"));
        return Ok(());
    };

    output.warning(&format!(
        "update available: {INSTALLER_VERSION} -> {latest}"
    ));

    let base = config
        .release_base
        .clone()
        .unwrap_or_else(|| format!("https://github.com/{DEFAULT_REPO}"));
    let url = binary_url(&base, &latest, ctx.target);
    output.info(&format!("downloading {url}"));

    let tmp_dir = tempfile::tempdir().context("failed to create temporary directory")?;
    let download_path = tmp_dir.path().join("foundryup");
    ctx.fetcher()
        .fetch_to_file(&url, &download_path)
        .await
        .context("failed to download installer")?;

    let exe = std::env::current_exe().context("could not locate the running installer")?;
    replace_executable(&download_path, &exe)?;

    output.success(&format!("foundryup updated to {latest}"));
    Ok(())
}

/// Swap `exe` for `new_binary` via a sibling `.new` file and a rename.
pub fn replace_executable(new_binary: &Path, exe: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(new_binary, std::fs::Permissions::from_mode(0o755))?;
    }

    let staged = exe.with_extension("new");
    std::fs::copy(new_binary, &staged).context("failed to stage update binary")?;
    std::fs::rename(&staged, exe).context("failed to replace foundryup binary")?;
    Ok(())
}
