//! Source-build fallback for branches, pull requests, commits and local checkouts.
//!
//! Source builds skip attestation entirely: the caller chose the code.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use foundryup_schema::Tag;

use crate::store::VersionStore;
use crate::{InstallError, Layout};

/// A checkout or build subprocess failed.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The command could not be started.
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The command exited unsuccessfully.
    #[error("'{command}' exited with {status}")]
    Failed { command: String, status: String },
}

/// Clones and positions a source checkout.
pub trait SourceCheckout: Send + Sync {
    /// Clone `repo` (`owner/name`) into `dest`.
    fn clone_repo(&self, repo: &str, dest: &Path) -> Result<(), BuildError>;

    /// Fetch `branch` and force-check it out, discarding local changes.
    fn checkout_branch(&self, dir: &Path, branch: &str) -> Result<(), BuildError>;

    /// Check out `commit` in `dir`.
    fn checkout_commit(&self, dir: &Path, commit: &str) -> Result<(), BuildError>;

    /// External commands that must be on PATH before any of the above run.
    fn required_commands(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Runs the native build of a checkout.
pub trait NativeBuilder: Send + Sync {
    /// Build every binary in `dir`, returning the directory holding the output.
    fn build(&self, dir: &Path, jobs: usize) -> Result<PathBuf, BuildError>;

    /// Host commands the build shells out to.
    fn required_commands(&self) -> &'static [&'static str] {
        &[]
    }
}

/// [`SourceCheckout`] driving the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCheckout {
    base_url: String,
}

impl Default for GitCheckout {
    fn default() -> Self {
        Self {
            base_url: "https://github.com".to_string(),
        }
    }
}

impl GitCheckout {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl SourceCheckout for GitCheckout {
    fn clone_repo(&self, repo: &str, dest: &Path) -> Result<(), BuildError> {
        let url = format!("{}/{repo}", self.base_url.trim_end_matches('/'));
        run(Command::new("git").arg("clone").arg(&url).arg(dest))
    }

    fn checkout_branch(&self, dir: &Path, branch: &str) -> Result<(), BuildError> {
        let refspec = format!("{branch}:remotes/origin/{branch}");
        run(Command::new("git")
            .current_dir(dir)
            .args(["fetch", "--force", "origin", &refspec]))?;
        run(Command::new("git")
            .current_dir(dir)
            .args(["checkout", "--force", &format!("origin/{branch}")]))
    }

    fn checkout_commit(&self, dir: &Path, commit: &str) -> Result<(), BuildError> {
        run(Command::new("git")
            .current_dir(dir)
            .args(["checkout", "--force", commit]))
    }

    fn required_commands(&self) -> &'static [&'static str] {
        &["git"]
    }
}

/// [`NativeBuilder`] running `cargo build --bins --release`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CargoBuilder;

impl NativeBuilder for CargoBuilder {
    fn build(&self, dir: &Path, jobs: usize) -> Result<PathBuf, BuildError> {
        run(Command::new("cargo")
            .current_dir(dir)
            .args(["build", "--bins", "--release", "--jobs", &jobs.to_string()]))?;
        Ok(dir.join("target").join("release"))
    }

    fn required_commands(&self) -> &'static [&'static str] {
        &["cargo"]
    }
}

fn run(cmd: &mut Command) -> Result<(), BuildError> {
    let command = format!("{cmd:?}");
    tracing::debug!(%command, "running");

    let status = cmd.status().map_err(|source| BuildError::Spawn {
        command: command.clone(),
        source,
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(BuildError::Failed {
            command,
            status: status.to_string(),
        })
    }
}

/// Fail with [`InstallError::Environment`] if any of `commands` is not on PATH.
pub fn require_commands(commands: &[&str]) -> Result<(), InstallError> {
    for command in commands {
        if which::which(command).is_err() {
            return Err(InstallError::Environment((*command).to_string()));
        }
    }
    Ok(())
}

/// Default build parallelism: every available core.
pub fn default_jobs() -> usize {
    num_cpus::get()
}

/// A remote source build request.
#[derive(Debug, Clone)]
pub struct RemoteBuild<'a> {
    /// `owner/name` to clone.
    pub repo: &'a str,
    /// Repository owner; names the checkout directory.
    pub author: &'a str,
    /// Branch or pull ref to fetch.
    pub branch: &'a str,
    /// Commit to pin, if any.
    pub commit: Option<&'a str>,
    /// Store key for the built binaries.
    pub tag: &'a Tag,
}

/// Clone (once), check out, build and move the output into the store.
///
/// Returns the new store entry directory.
pub fn build_remote(
    layout: &Layout,
    store: &VersionStore,
    checkout: &dyn SourceCheckout,
    builder: &dyn NativeBuilder,
    jobs: usize,
    req: &RemoteBuild<'_>,
) -> Result<PathBuf, InstallError> {
    let repo_dir = layout.checkout_dir(req.author);
    if !repo_dir.exists() {
        tracing::info!(repo = req.repo, dest = %repo_dir.display(), "cloning");
        checkout.clone_repo(req.repo, &repo_dir)?;
    }

    checkout.checkout_branch(&repo_dir, req.branch)?;
    if let Some(commit) = req.commit {
        checkout.checkout_commit(&repo_dir, commit)?;
    }

    let output = builder.build(&repo_dir, jobs)?;
    store.write(req.tag, &output)?;
    Ok(store.entry_dir(req.tag))
}

/// Build a local checkout in place, returning its output directory.
pub fn build_local(path: &Path, builder: &dyn NativeBuilder, jobs: usize) -> Result<PathBuf, InstallError> {
    if !path.is_dir() {
        return Err(InstallError::Usage(format!(
            "local path '{}' is not a directory",
            path.display()
        )));
    }
    Ok(builder.build(path, jobs)?)
}
