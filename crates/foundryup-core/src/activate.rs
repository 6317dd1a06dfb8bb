//! Activation: placing one version's binary set into the active directory.
//!
//! Store entries are activated by copy so the entry stays intact. Local
//! source builds are activated by symlink so rebuilding the checkout updates
//! the active binaries in place.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use foundryup_schema::{BINARIES, Platform, Tag};

use crate::store::VersionProbe;
use crate::{InstallError, Layout, Reporter};

/// Process lookup could not run.
#[derive(Error, Debug)]
pub enum ProcessLookupError {
    /// The lookup tool is missing or failed.
    #[error("process lookup unavailable: {0}")]
    Unavailable(String),
}

/// Answers whether a process with a given name is running.
pub trait ProcessLister: Send + Sync {
    /// True when a process named `name` is running.
    fn is_running(&self, name: &str) -> Result<bool, ProcessLookupError>;
}

/// Uses `pgrep -x` on Unix and `tasklist` on Windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessLister;

impl ProcessLister for SystemProcessLister {
    fn is_running(&self, name: &str) -> Result<bool, ProcessLookupError> {
        if cfg!(windows) {
            let image = format!("{name}.exe");
            let output = Command::new("tasklist")
                .args(["/FI", &format!("IMAGENAME eq {image}"), "/NH"])
                .output()
                .map_err(|e| ProcessLookupError::Unavailable(e.to_string()))?;
            let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
            return Ok(stdout.contains(&image));
        }

        which::which("pgrep").map_err(|e| ProcessLookupError::Unavailable(e.to_string()))?;
        let status = Command::new("pgrep")
            .args(["-x", name])
            .output()
            .map_err(|e| ProcessLookupError::Unavailable(e.to_string()))?
            .status;

        // pgrep: 0 = matched, 1 = no match, anything else = failure
        match status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(ProcessLookupError::Unavailable(format!(
                "pgrep exited with {status}"
            ))),
        }
    }
}

/// How binaries reach the active directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStrategy {
    /// Frozen snapshot of a store entry.
    Copy,
    /// Live link into a local build's output directory.
    Symlink,
}

/// Places binary sets into the active directory.
pub struct Activator<'a> {
    bin_dir: PathBuf,
    platform: Platform,
    processes: &'a dyn ProcessLister,
    probe: &'a dyn VersionProbe,
    reporter: &'a dyn Reporter,
    search_path: Option<OsString>,
}

impl std::fmt::Debug for Activator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Activator")
            .field("bin_dir", &self.bin_dir)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl<'a> Activator<'a> {
    /// Activator writing into `layout`'s active directory.
    pub fn new(
        layout: &Layout,
        platform: Platform,
        processes: &'a dyn ProcessLister,
        probe: &'a dyn VersionProbe,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            bin_dir: layout.bin_dir().to_path_buf(),
            platform,
            processes,
            probe,
            reporter,
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Use `path` instead of `$PATH` for shadowing checks.
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Active binary directory.
    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Fail if any managed binary is running.
    ///
    /// A missing lookup facility only warns.
    pub fn ensure_not_running(&self) -> Result<(), InstallError> {
        for bin in BINARIES {
            match self.processes.is_running(bin) {
                Ok(true) => return Err(InstallError::Conflict(bin.to_string())),
                Ok(false) => {}
                Err(e) => {
                    self.reporter
                        .warning(&format!("could not check for running binaries: {e}"));
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Activate the binary set found in `source_dir`.
    ///
    /// Nothing is touched unless every binary is present in `source_dir` and
    /// none of them is running. Returns the paths placed in the active
    /// directory.
    pub fn activate(
        &self,
        tag: &Tag,
        source_dir: &Path,
        strategy: ActivationStrategy,
    ) -> Result<Vec<PathBuf>, InstallError> {
        self.ensure_not_running()?;

        let missing: Vec<&str> = BINARIES
            .iter()
            .copied()
            .filter(|bin| !source_dir.join(self.platform.binary_file_name(bin)).is_file())
            .collect();
        if !missing.is_empty() {
            return Err(InstallError::context(
                "incomplete binary set",
                format!("{} missing from {}", missing.join(", "), source_dir.display()),
            ));
        }

        fs::create_dir_all(&self.bin_dir)?;

        let mut placed = Vec::with_capacity(BINARIES.len());
        for bin in BINARIES {
            let file_name = self.platform.binary_file_name(bin);
            let src = source_dir.join(&file_name);
            let dest = self.bin_dir.join(&file_name);

            if dest.exists() || dest.is_symlink() {
                fs::remove_file(&dest)?;
            }

            match strategy {
                ActivationStrategy::Copy => {
                    fs::copy(&src, &dest)?;
                }
                ActivationStrategy::Symlink => symlink(&src, &dest)?,
            }

            let version = self
                .probe
                .report(&dest)
                .unwrap_or_else(|| "unknown version".to_string());
            self.reporter.done(bin, tag, &version);

            self.warn_if_shadowed(&file_name, &dest);
            placed.push(dest);
        }

        self.warn_if_not_on_path();
        tracing::info!(%tag, ?strategy, "activated");
        Ok(placed)
    }

    /// Warn when the search path resolves `file_name` to something other than `placed`.
    fn warn_if_shadowed(&self, file_name: &str, placed: &Path) {
        let Ok(found) = which::which_in(file_name, self.search_path.as_ref(), &self.bin_dir)
        else {
            return;
        };

        if found == placed || same_file(&found, placed) {
            return;
        }

        self.reporter.warning(&format!(
            "'{file_name}' on your PATH resolves to {}, which shadows {}. \
             Remove the other installation (e.g. from a system package manager) \
             or move {} earlier in PATH.",
            found.display(),
            placed.display(),
            self.bin_dir.display()
        ));
    }

    fn warn_if_not_on_path(&self) {
        let Some(search_path) = &self.search_path else {
            return;
        };
        let on_path = std::env::split_paths(search_path).any(|p| p == self.bin_dir);
        if !on_path {
            self.reporter
                .warning(&format!("{} is not in your PATH.", self.bin_dir.display()));
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(unix)]
fn symlink(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(src, dest)
}

#[cfg(windows)]
fn symlink(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(src, dest)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::reporter::RecordingReporter;
    use crate::store::tests::{FixedProbe, write_binaries};

    /// Scripted process table.
    pub(crate) enum FakeProcesses {
        None,
        Running(&'static str),
        Unavailable,
    }

    impl ProcessLister for FakeProcesses {
        fn is_running(&self, name: &str) -> Result<bool, ProcessLookupError> {
            match self {
                Self::None => Ok(false),
                Self::Running(running) => Ok(*running == name),
                Self::Unavailable => Err(ProcessLookupError::Unavailable("no pgrep".to_string())),
            }
        }
    }

    fn layout() -> (tempfile::TempDir, Layout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path().join(".foundry"));
        (dir, layout)
    }

    #[test]
    fn copies_full_set_and_reports_versions() {
        let (dir, layout) = layout();
        let src = dir.path().join("v1");
        write_binaries(&src, &BINARIES);

        let reporter = RecordingReporter::default();
        let (processes, probe) = (FakeProcesses::None, FixedProbe("1.0.0"));
        let activator = Activator::new(&layout, Platform::Linux, &processes, &probe, &reporter)
        .with_search_path(layout.bin_dir().as_os_str().to_os_string());

        let placed = activator
            .activate(&Tag::from("v1.0.0"), &src, ActivationStrategy::Copy)
            .unwrap();

        assert_eq!(placed.len(), 4);
        assert_eq!(fs::read(layout.bin_dir().join("anvil")).unwrap(), b"anvil-binary");
        // Copy leaves the source intact
        assert!(src.join("anvil").exists());
        let done = reporter.done.lock().unwrap();
        assert_eq!(done[0], ("forge".to_string(), "forge Version: 1.0.0".to_string()));
        assert!(reporter.warnings.lock().unwrap().is_empty());
    }

    #[test]
    fn running_binary_blocks_activation() {
        let (dir, layout) = layout();
        let src = dir.path().join("v1");
        write_binaries(&src, &BINARIES);

        let (processes, probe) = (FakeProcesses::Running("anvil"), FixedProbe("1.0.0"));
        let activator = Activator::new(
            &layout,
            Platform::Linux,
            &processes,
            &probe,
            &crate::NullReporter,
        );

        let err = activator
            .activate(&Tag::from("v1.0.0"), &src, ActivationStrategy::Copy)
            .unwrap_err();
        assert!(matches!(err, InstallError::Conflict(ref bin) if bin == "anvil"));
        assert!(!layout.bin_dir().join("forge").exists());
    }

    #[test]
    fn unavailable_lookup_only_warns() {
        let (dir, layout) = layout();
        let src = dir.path().join("v1");
        write_binaries(&src, &BINARIES);

        let reporter = RecordingReporter::default();
        let (processes, probe) = (FakeProcesses::Unavailable, FixedProbe("1.0.0"));
        let activator = Activator::new(&layout, Platform::Linux, &processes, &probe, &reporter)
        .with_search_path(layout.bin_dir().as_os_str().to_os_string());

        activator
            .activate(&Tag::from("v1.0.0"), &src, ActivationStrategy::Copy)
            .unwrap();
        let warnings = reporter.warnings.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("could not check"));
    }

    #[test]
    fn incomplete_source_touches_nothing() {
        let (dir, layout) = layout();
        let src = dir.path().join("partial");
        write_binaries(&src, &["forge", "cast", "anvil"]);

        let (processes, probe) = (FakeProcesses::None, FixedProbe("1.0.0"));
        let activator = Activator::new(
            &layout,
            Platform::Linux,
            &processes,
            &probe,
            &crate::NullReporter,
        );

        assert!(
            activator
                .activate(&Tag::from("v1.0.0"), &src, ActivationStrategy::Copy)
                .is_err()
        );
        assert!(!layout.bin_dir().join("forge").exists());
    }

    #[cfg(unix)]
    #[test]
    fn shadowing_binary_is_reported() {
        let (dir, layout) = layout();
        let src = dir.path().join("v1");
        write_binaries(&src, &BINARIES);

        let other = dir.path().join("homebrew-bin");
        write_binaries(&other, &["cast"]);

        let search = std::env::join_paths([other.clone(), layout.bin_dir().to_path_buf()]).unwrap();
        let reporter = RecordingReporter::default();
        Activator::new(
            &layout,
            Platform::Linux,
            &FakeProcesses::None,
            &FixedProbe("1.0.0"),
            &reporter,
        )
        .with_search_path(search)
        .activate(&Tag::from("v1.0.0"), &src, ActivationStrategy::Copy)
        .unwrap();

        let warnings = reporter.warnings.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("'cast'"));
        assert!(warnings[0].contains("homebrew-bin"));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_strategy_links_build_output() {
        let (dir, layout) = layout();
        let out = dir.path().join("checkout/target/release");
        write_binaries(&out, &BINARIES);

        // A stale copy occupying the slot is replaced
        fs::create_dir_all(layout.bin_dir()).unwrap();
        fs::write(layout.bin_dir().join("forge"), b"old").unwrap();

        Activator::new(
            &layout,
            Platform::Linux,
            &FakeProcesses::None,
            &FixedProbe("dev"),
            &crate::NullReporter,
        )
        .with_search_path(layout.bin_dir().as_os_str().to_os_string())
        .activate(&Tag::from("local"), &out, ActivationStrategy::Symlink)
        .unwrap();

        let forge = layout.bin_dir().join("forge");
        assert!(forge.is_symlink());
        assert_eq!(fs::read_link(&forge).unwrap(), out.join("forge"));
    }
}
