//! The install flow: resolve, acquire, verify, store, activate.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use foundryup_schema::{InstallKind, Specifier, Tag, Target};

use crate::activate::{ActivationStrategy, Activator, ProcessLister};
use crate::attest::{self, AttestationStatus, ReuseVerdict};
use crate::build::{self, NativeBuilder, RemoteBuild, SourceCheckout};
use crate::hashing::ContentHasher;
use crate::io::download::{Fetcher, ReleaseUrls};
use crate::io::extract::ArchiveExtractor;
use crate::paths::filename_from_url;
use crate::store::{StoreEntry, VersionProbe, VersionStore};
use crate::{InstallError, Layout, Reporter};

/// Maps a channel tag such as `stable` to the release tag it currently names.
pub trait ChannelResolver: Send + Sync {
    /// Release tag `channel` currently points at.
    fn resolve(&self, channel: &Tag) -> Result<Tag, InstallError>;
}

/// The release host publishes channel tags directly, so they resolve to themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublishedChannels;

impl ChannelResolver for PublishedChannels {
    fn resolve(&self, channel: &Tag) -> Result<Tag, InstallError> {
        Ok(channel.clone())
    }
}

/// Every external primitive the install flow touches.
#[derive(Clone, Copy)]
pub struct Capabilities<'a> {
    /// Downloads releases and attestations.
    pub fetcher: &'a dyn Fetcher,
    /// Unpacks release archives.
    pub extractor: &'a dyn ArchiveExtractor,
    /// Hashes binaries for verification.
    pub hasher: &'a dyn ContentHasher,
    /// Compiles source checkouts.
    pub builder: &'a dyn NativeBuilder,
    /// Clones and checks out remote sources.
    pub checkout: &'a dyn SourceCheckout,
    /// Detects running binaries.
    pub processes: &'a dyn ProcessLister,
    /// Reads binary versions.
    pub probe: &'a dyn VersionProbe,
    /// Maps channels to release tags.
    pub channels: &'a dyn ChannelResolver,
    /// User-facing progress output.
    pub reporter: &'a dyn Reporter,
}

impl std::fmt::Debug for Capabilities<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}

/// One install invocation.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    /// What to install.
    pub specifier: Specifier,
    /// Skip post-install hash verification.
    pub force: bool,
    /// Parallelism for source builds.
    pub jobs: usize,
    /// Overrides `https://github.com/{repo}` as the release host.
    pub release_base: Option<String>,
}

impl InstallRequest {
    /// Request with default jobs, verification on, and the default release host.
    pub fn new(specifier: Specifier) -> Self {
        Self {
            specifier,
            force: false,
            jobs: build::default_jobs(),
            release_base: None,
        }
    }
}

/// Whether a prebuilt install was hash-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Every binary matched its attested hash.
    Verified,
    /// Skipped by `--force`.
    SkippedForced,
    /// No attestation was published.
    SkippedMissing,
}

/// What an install ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Prebuilt release downloaded, stored and activated.
    Installed { tag: Tag, verification: Verification },
    /// The store entry already matched the attestation; only activation ran.
    Reused { tag: Tag },
    /// Remote source built into the store and activated.
    Built { tag: Tag },
    /// Local checkout built and linked into the active directory.
    Linked { path: PathBuf },
}

/// Drives installs, switches and listings against one [`Layout`].
pub struct Installer<'a> {
    layout: Layout,
    target: Target,
    caps: Capabilities<'a>,
    search_path: Option<OsString>,
}

impl std::fmt::Debug for Installer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("layout", &self.layout)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl<'a> Installer<'a> {
    /// Installer for `target`, rooted at `layout`.
    pub fn new(layout: Layout, target: Target, caps: Capabilities<'a>) -> Self {
        Self {
            layout,
            target,
            caps,
            search_path: None,
        }
    }

    /// Use `path` instead of `$PATH` for the post-activation checks.
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Directory layout in use.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Version Store for this target.
    pub fn store(&self) -> VersionStore {
        VersionStore::new(&self.layout, self.target.platform)
    }

    fn activator(&self) -> Activator<'_> {
        let activator = Activator::new(
            &self.layout,
            self.target.platform,
            self.caps.processes,
            self.caps.probe,
            self.caps.reporter,
        );
        match &self.search_path {
            Some(path) => activator.with_search_path(path.clone()),
            None => activator,
        }
    }

    /// Resolve `req.specifier` and carry it through to an active binary set.
    pub async fn install(&self, req: &InstallRequest) -> Result<Outcome, InstallError> {
        let resolution = req.specifier.resolve()?;
        let reason = match resolution.kind {
            InstallKind::LocalSource { .. } => "--path is set",
            _ => "building from source",
        };
        for flag in &resolution.ignored {
            self.caps
                .reporter
                .warning(&format!("{flag} is ignored because {reason}"));
        }

        match resolution.kind {
            InstallKind::Prebuilt { version, tag } => {
                let base = req
                    .release_base
                    .clone()
                    .unwrap_or_else(|| format!("https://github.com/{}", req.specifier.repo));
                self.install_prebuilt(&base, version, tag, req.force).await
            }
            InstallKind::RemoteSource {
                repo,
                author,
                branch,
                commit,
                tag,
            } => {
                let remote = RemoteBuild {
                    repo: &repo,
                    author: &author,
                    branch: &branch,
                    commit: commit.as_deref(),
                    tag: &tag,
                };
                self.install_remote(&remote, req.jobs)?;
                Ok(Outcome::Built { tag })
            }
            InstallKind::LocalSource { path } => {
                self.install_local(&path, req.jobs)?;
                Ok(Outcome::Linked { path })
            }
        }
    }

    async fn install_prebuilt(
        &self,
        base: &str,
        version: String,
        tag: Tag,
        force: bool,
    ) -> Result<Outcome, InstallError> {
        let reporter = self.caps.reporter;
        let activator = self.activator();
        activator.ensure_not_running()?;

        let (version, tag) = if tag.is_channel() {
            let resolved = self.caps.channels.resolve(&tag)?;
            if resolved == tag {
                (version, tag)
            } else {
                tracing::debug!(channel = %tag, %resolved, "resolved channel");
                (resolved.to_string(), resolved)
            }
        } else {
            (version, tag)
        };

        let urls = ReleaseUrls::new(base, &tag, &version, self.target);
        let store = self.store();
        let entry = store.entry_dir(&tag);

        reporter.section(&format!("Installing foundry ({tag})"));
        let attestation = attest::fetch_attestation(self.caps.fetcher, &urls.attestation).await?;

        if let AttestationStatus::Present(record) = &attestation {
            if store.exists(&tag) {
                match attest::check_reuse(&entry, self.target.platform, record, self.caps.hasher) {
                    ReuseVerdict::Satisfied => {
                        reporter.info(&format!("version {tag} already installed and verified"));
                        activator.activate(&tag, &entry, ActivationStrategy::Copy)?;
                        return Ok(Outcome::Reused { tag });
                    }
                    ReuseVerdict::Refetch { reason } => {
                        tracing::info!(%tag, %reason, "re-downloading");
                    }
                }
            }
        }

        fs::create_dir_all(self.layout.root())?;
        let scratch = tempfile::Builder::new()
            .prefix(".download-")
            .tempdir_in(self.layout.root())?;

        reporter.info(&format!("downloading {}", urls.archive));
        let archive = scratch.path().join(filename_from_url(&urls.archive));
        self.caps
            .fetcher
            .fetch_to_file(&urls.archive, &archive)
            .await
            .map_err(|e| InstallError::network("downloading release archive", e))?;

        let staging = scratch.path().join("staging");
        self.caps.extractor.extract(&archive, &staging)?;
        store.write(&tag, &staging)?;

        let verification = match (&attestation, force) {
            (_, true) => {
                tracing::warn!(%tag, "verification skipped by request");
                reporter.warning("skipping hash verification (--force)");
                Verification::SkippedForced
            }
            (AttestationStatus::Missing, false) => {
                tracing::warn!(%tag, "no attestation published");
                reporter.warning(&format!(
                    "no attestation found for {tag}; skipping hash verification"
                ));
                Verification::SkippedMissing
            }
            (AttestationStatus::Present(record), false) => {
                // A failed check leaves the entry in place for a later --force or --use.
                let verified =
                    attest::verify_installed(&entry, self.target.platform, record, self.caps.hasher);
                if let Err(InstallError::Verification { failed }) = &verified {
                    for bin in failed {
                        reporter.failed(bin, &tag, "does not match its attested hash");
                    }
                }
                verified?;
                reporter.success("binaries verified against attestation");
                Verification::Verified
            }
        };

        activator.activate(&tag, &entry, ActivationStrategy::Copy)?;

        if self.target.platform.has_manuals() {
            self.install_manuals(&urls.manuals, scratch.path()).await?;
        }

        Ok(Outcome::Installed { tag, verification })
    }

    async fn install_manuals(&self, url: &str, scratch: &Path) -> Result<(), InstallError> {
        let archive = scratch.join(filename_from_url(url));
        self.caps
            .fetcher
            .fetch_to_file(url, &archive)
            .await
            .map_err(|e| InstallError::network("downloading manuals", e))?;

        let man_dir = self.layout.man_dir();
        let pages = self.caps.extractor.extract(&archive, &man_dir)?;
        tracing::debug!(count = pages.len(), dir = %man_dir.display(), "installed manuals");
        Ok(())
    }

    fn install_remote(&self, remote: &RemoteBuild<'_>, jobs: usize) -> Result<(), InstallError> {
        build::require_commands(self.caps.checkout.required_commands())?;
        build::require_commands(self.caps.builder.required_commands())?;

        let activator = self.activator();
        activator.ensure_not_running()?;

        self.caps.reporter.section(&format!(
            "Building {} ({}) from source",
            remote.repo, remote.tag
        ));
        let store = self.store();
        let entry = build::build_remote(
            &self.layout,
            &store,
            self.caps.checkout,
            self.caps.builder,
            jobs,
            remote,
        )?;

        activator.activate(remote.tag, &entry, ActivationStrategy::Copy)?;
        Ok(())
    }

    fn install_local(&self, path: &Path, jobs: usize) -> Result<(), InstallError> {
        build::require_commands(self.caps.builder.required_commands())?;

        let activator = self.activator();
        activator.ensure_not_running()?;

        self.caps
            .reporter
            .section(&format!("Building {}", path.display()));
        let output = build::build_local(path, self.caps.builder, jobs)?;
        activator.activate(&Tag::from("local"), &output, ActivationStrategy::Symlink)?;
        Ok(())
    }

    /// Activate an already-installed tag.
    pub fn use_version(&self, tag: &Tag) -> Result<Vec<PathBuf>, InstallError> {
        let store = self.store();
        if !store.exists(tag) {
            let available = store.tags()?.iter().map(ToString::to_string).collect();
            return Err(InstallError::NotInstalled {
                tag: tag.clone(),
                available,
            });
        }

        self.activator()
            .activate(tag, &store.entry_dir(tag), ActivationStrategy::Copy)
    }

    /// Every installed tag with each binary's self-reported version.
    pub fn list(&self) -> Result<Vec<StoreEntry>, InstallError> {
        Ok(self.store().list(self.caps.probe)?)
    }
}
