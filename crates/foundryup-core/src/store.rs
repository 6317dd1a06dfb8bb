//! The Version Store: one directory per tag under `versions/`, each holding
//! a complete binary set.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use foundryup_schema::{BINARIES, Platform, Tag};

use crate::Layout;

/// Reads a binary's self-reported version string.
pub trait VersionProbe: Send + Sync {
    /// First line of `binary --version`, if it prints one.
    fn report(&self, binary: &Path) -> Option<String>;
}

/// Runs `<binary> --version` and keeps the first line of stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandProbe;

impl VersionProbe for CommandProbe {
    fn report(&self, binary: &Path) -> Option<String> {
        let output = Command::new(binary).arg("--version").output().ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(ToString::to_string)
    }
}

/// State of one binary inside a store entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryStatus {
    /// Not present in the entry.
    Missing,
    /// Present, but `--version` failed or printed nothing.
    Unreported,
    /// First line of the binary's `--version` output.
    Reported(String),
}

/// One installed tag and what each of its binaries reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    /// Store key.
    pub tag: Tag,
    /// Each binary of the set, in install order.
    pub binaries: Vec<(String, BinaryStatus)>,
}

/// Per-tag cache of installed binary sets.
#[derive(Debug, Clone)]
pub struct VersionStore {
    root: PathBuf,
    platform: Platform,
}

impl VersionStore {
    /// Store under `layout`'s versions directory.
    pub fn new(layout: &Layout, platform: Platform) -> Self {
        Self {
            root: layout.versions_dir(),
            platform,
        }
    }

    /// Platform that decides binary file names.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Directory of the entry for `tag`.
    pub fn entry_dir(&self, tag: &Tag) -> PathBuf {
        self.root.join(tag.as_str())
    }

    /// Path of one binary inside a store entry.
    pub fn binary_path(&self, tag: &Tag, bin: &str) -> PathBuf {
        self.entry_dir(tag).join(self.platform.binary_file_name(bin))
    }

    /// True when an entry for `tag` exists, complete or not.
    pub fn exists(&self, tag: &Tag) -> bool {
        self.entry_dir(tag).is_dir()
    }

    /// True when every binary of the set is present.
    pub fn is_complete(&self, tag: &Tag) -> bool {
        BINARIES.iter().all(|bin| self.binary_path(tag, bin).is_file())
    }

    /// Installed tags in lexical order.
    pub fn tags(&self) -> io::Result<Vec<Tag>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut tags: Vec<Tag> = fs::read_dir(&self.root)?
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|e| e.file_name().to_str().map(Tag::from))
            .collect();
        tags.sort();
        Ok(tags)
    }

    /// Every installed tag with each binary's self-reported version.
    pub fn list(&self, probe: &dyn VersionProbe) -> io::Result<Vec<StoreEntry>> {
        Ok(self
            .tags()?
            .into_iter()
            .map(|tag| {
                let binaries = BINARIES
                    .iter()
                    .map(|bin| {
                        let path = self.binary_path(&tag, bin);
                        let status = if !path.is_file() {
                            BinaryStatus::Missing
                        } else {
                            probe
                                .report(&path)
                                .map_or(BinaryStatus::Unreported, BinaryStatus::Reported)
                        };
                        ((*bin).to_string(), status)
                    })
                    .collect();
                StoreEntry { tag, binaries }
            })
            .collect())
    }

    /// Move the binary set found in `source_dir` into the entry for `tag`.
    ///
    /// Creates the entry if needed and overwrites binaries already there.
    /// Returns the names that were placed; binaries absent from `source_dir`
    /// are skipped.
    pub fn write(&self, tag: &Tag, source_dir: &Path) -> io::Result<Vec<String>> {
        let entry = self.entry_dir(tag);
        fs::create_dir_all(&entry)?;

        let mut placed = Vec::new();
        for bin in BINARIES {
            let file_name = self.platform.binary_file_name(bin);
            let src = source_dir.join(&file_name);
            if !src.is_file() {
                tracing::warn!(bin, source = %source_dir.display(), "binary missing from source");
                continue;
            }

            let dest = entry.join(&file_name);
            if dest.exists() || dest.is_symlink() {
                fs::remove_file(&dest)?;
            }
            move_file(&src, &dest)?;
            placed.push(bin.to_string());
        }

        tracing::debug!(%tag, placed = placed.len(), "wrote store entry");
        Ok(placed)
    }
}

/// Rename, falling back to copy + delete across filesystems.
fn move_file(src: &Path, dest: &Path) -> io::Result<()> {
    if fs::rename(src, dest).is_ok() {
        return Ok(());
    }
    fs::copy(src, dest)?;
    fs::remove_file(src)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Reports `<name> <version>` for every binary without running anything.
    pub(crate) struct FixedProbe(pub(crate) &'static str);

    impl VersionProbe for FixedProbe {
        fn report(&self, binary: &Path) -> Option<String> {
            let name = binary.file_stem()?.to_string_lossy().to_string();
            Some(format!("{name} Version: {}", self.0))
        }
    }

    /// Every binary fails to report a version.
    struct SilentProbe;

    impl VersionProbe for SilentProbe {
        fn report(&self, _: &Path) -> Option<String> {
            None
        }
    }

    pub(crate) fn write_binaries(dir: &Path, bins: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        for bin in bins {
            let path = dir.join(bin);
            fs::write(&path, format!("{bin}-binary")).unwrap();
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            }
        }
    }

    fn store() -> (tempfile::TempDir, VersionStore) {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let store = VersionStore::new(&layout, Platform::Linux);
        (dir, store)
    }

    #[test]
    fn empty_store_lists_nothing() {
        let (_dir, store) = store();
        assert!(store.tags().unwrap().is_empty());
        assert!(!store.exists(&Tag::from("v1.0.0")));
    }

    #[test]
    fn write_moves_binaries_into_entry() {
        let (dir, store) = store();
        let staging = dir.path().join("staging");
        write_binaries(&staging, &BINARIES);

        let tag = Tag::from("v1.0.0");
        let placed = store.write(&tag, &staging).unwrap();

        assert_eq!(placed.len(), 4);
        assert!(store.exists(&tag));
        assert!(store.is_complete(&tag));
        assert!(!staging.join("forge").exists());
    }

    #[test]
    fn write_overwrites_previous_contents() {
        let (dir, store) = store();
        let tag = Tag::from("nightly");

        let first = dir.path().join("first");
        write_binaries(&first, &BINARIES);
        store.write(&tag, &first).unwrap();

        let second = dir.path().join("second");
        fs::create_dir_all(&second).unwrap();
        fs::write(second.join("forge"), b"new-forge").unwrap();
        store.write(&tag, &second).unwrap();

        assert_eq!(fs::read(store.binary_path(&tag, "forge")).unwrap(), b"new-forge");
        assert_eq!(
            fs::read(store.binary_path(&tag, "cast")).unwrap(),
            b"cast-binary"
        );
    }

    #[test]
    fn partial_entry_is_not_complete() {
        let (dir, store) = store();
        let staging = dir.path().join("staging");
        write_binaries(&staging, &["forge", "cast"]);

        let tag = Tag::from("v0.9.0");
        assert_eq!(store.write(&tag, &staging).unwrap(), vec!["forge", "cast"]);
        assert!(store.exists(&tag));
        assert!(!store.is_complete(&tag));
    }

    #[test]
    fn list_reports_each_binary() {
        let (dir, store) = store();
        let staging = dir.path().join("a");
        write_binaries(&staging, &BINARIES);
        store.write(&Tag::from("v1.0.0"), &staging).unwrap();

        let partial = dir.path().join("b");
        write_binaries(&partial, &["forge"]);
        store.write(&Tag::from("nightly"), &partial).unwrap();

        let entries = store.list(&FixedProbe("1.0.0")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tag.as_str(), "nightly");
        assert_eq!(
            entries[0].binaries[0],
            (
                "forge".to_string(),
                BinaryStatus::Reported("forge Version: 1.0.0".to_string())
            )
        );
        assert_eq!(
            entries[0].binaries[1],
            ("cast".to_string(), BinaryStatus::Missing)
        );
        assert!(
            entries[1]
                .binaries
                .iter()
                .all(|(_, s)| matches!(s, BinaryStatus::Reported(_)))
        );
    }

    #[test]
    fn silent_binary_is_not_reported_missing() {
        let (dir, store) = store();
        let staging = dir.path().join("a");
        write_binaries(&staging, &["forge"]);
        store.write(&Tag::from("v1.0.0"), &staging).unwrap();

        let entries = store.list(&SilentProbe).unwrap();
        assert_eq!(
            entries[0].binaries[0],
            ("forge".to_string(), BinaryStatus::Unreported)
        );
        assert_eq!(
            entries[0].binaries[1],
            ("cast".to_string(), BinaryStatus::Missing)
        );
    }
}
