//! Version specifier resolution.
//!
//! A [`Specifier`] is the raw user input (flags or environment). Resolving it
//! picks exactly one install strategy and the Version Store key it lands under.

use std::path::PathBuf;

use crate::error::SchemaError;
use crate::types::Tag;
use crate::DEFAULT_REPO;

/// Default channel when no version is requested.
pub const DEFAULT_CHANNEL: &str = "stable";

/// Branch built when a remote source build names none.
pub const DEFAULT_BRANCH: &str = "master";

/// Raw user input describing which version to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    /// Release channel or explicit version (`stable`, `nightly-abc`, `1.2.3`).
    pub version: Option<String>,
    /// Branch to build from source.
    pub branch: Option<String>,
    /// Pull request number to build from source.
    pub pr: Option<u64>,
    /// Commit to build from source.
    pub commit: Option<String>,
    /// `owner/name` on the release host.
    pub repo: String,
    /// Local checkout to build in place. Overrides everything else.
    pub local_path: Option<PathBuf>,
}

impl Default for Specifier {
    fn default() -> Self {
        Self {
            version: None,
            branch: None,
            pr: None,
            commit: None,
            repo: DEFAULT_REPO.to_string(),
            local_path: None,
        }
    }
}

/// How a resolved version gets onto disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallKind {
    /// Download a published release archive.
    Prebuilt {
        /// Version segment of the archive file name.
        version: String,
        /// Release tag; also the Version Store key.
        tag: Tag,
    },
    /// Clone, build and store under a synthesized tag.
    RemoteSource {
        repo: String,
        author: String,
        branch: String,
        commit: Option<String>,
        tag: Tag,
    },
    /// Build a local checkout and link its output.
    LocalSource { path: PathBuf },
}

/// Outcome of [`Specifier::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Chosen install strategy.
    pub kind: InstallKind,
    /// Flags that were given but have no effect on this install kind.
    pub ignored: Vec<&'static str>,
}

impl Resolution {
    /// Version Store key, absent for local builds which are never stored.
    pub fn tag(&self) -> Option<&Tag> {
        match &self.kind {
            InstallKind::Prebuilt { tag, .. } | InstallKind::RemoteSource { tag, .. } => Some(tag),
            InstallKind::LocalSource { .. } => None,
        }
    }
}

impl Specifier {
    /// Resolve into an install kind and tag.
    ///
    /// Priority: local path, then prebuilt release (default repo with no
    /// branch, PR or commit), then remote source build.
    ///
    /// # Errors
    ///
    /// Fails when `--pr` and `--branch` are both given, when `repo` is not
    /// `owner/name`, or when a numeric version is not valid semver.
    pub fn resolve(&self) -> Result<Resolution, SchemaError> {
        if let Some(path) = &self.local_path {
            let mut ignored = Vec::new();
            if self.repo != DEFAULT_REPO {
                ignored.push("--repo");
            }
            if self.branch.is_some() {
                ignored.push("--branch");
            }
            if self.version.is_some() {
                ignored.push("--install");
            }
            if self.pr.is_some() {
                ignored.push("--pr");
            }
            if self.commit.is_some() {
                ignored.push("--commit");
            }
            return Ok(Resolution {
                kind: InstallKind::LocalSource { path: path.clone() },
                ignored,
            });
        }

        let branch = match (self.pr, &self.branch) {
            (Some(_), Some(_)) => return Err(SchemaError::PrWithBranch),
            (Some(pr), None) => Some(format!("refs/pull/{pr}/head")),
            (None, branch) => branch.clone(),
        };

        if self.repo == DEFAULT_REPO && branch.is_none() && self.commit.is_none() {
            let (version, tag) = normalize_release(self.version.as_deref())?;
            return Ok(Resolution {
                kind: InstallKind::Prebuilt { version, tag },
                ignored: Vec::new(),
            });
        }

        let author = match self.repo.split_once('/') {
            Some((author, name)) if !author.is_empty() && !name.is_empty() => author.to_string(),
            _ => return Err(SchemaError::InvalidRepo(self.repo.clone())),
        };
        let branch = branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string());

        let tag = if let Some(commit) = &self.commit {
            Tag::custom(&author, "commit", commit)
        } else if let Some(pr) = self.pr {
            Tag::custom(&author, "pr", &pr.to_string())
        } else {
            Tag::custom(&author, "branch", &branch)
        };

        let mut ignored = Vec::new();
        if self.version.is_some() {
            ignored.push("--install");
        }

        Ok(Resolution {
            kind: InstallKind::RemoteSource {
                repo: self.repo.clone(),
                author,
                branch,
                commit: self.commit.clone(),
                tag,
            },
            ignored,
        })
    }
}

/// Map the requested version to `(archive version, release tag)`.
///
/// Any `nightly*` request downloads a `nightly` archive but keeps its own
/// tag, so `nightly-<sha>` stays pinned. Bare numeric versions gain a `v`.
fn normalize_release(version: Option<&str>) -> Result<(String, Tag), SchemaError> {
    let raw = version.map_or(DEFAULT_CHANNEL, str::trim);

    if raw.starts_with("nightly") {
        return Ok(("nightly".to_string(), Tag::new(raw)));
    }

    let normalized = if raw.starts_with(|c: char| c.is_ascii_digit()) {
        semver::Version::parse(raw).map_err(|_| SchemaError::InvalidVersion(raw.to_string()))?;
        format!("v{raw}")
    } else {
        raw.to_string()
    };

    Ok((normalized.clone(), Tag::new(normalized)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> Specifier {
        Specifier::default()
    }

    #[test]
    fn empty_specifier_is_stable_release() {
        let r = spec().resolve().unwrap();
        assert_eq!(
            r.kind,
            InstallKind::Prebuilt {
                version: "stable".to_string(),
                tag: Tag::from("stable"),
            }
        );
        assert!(r.ignored.is_empty());
    }

    #[test]
    fn pinned_nightly_keeps_its_tag() {
        let s = Specifier {
            version: Some("nightly-0123abcd".to_string()),
            ..spec()
        };
        let r = s.resolve().unwrap();
        assert_eq!(
            r.kind,
            InstallKind::Prebuilt {
                version: "nightly".to_string(),
                tag: Tag::from("nightly-0123abcd"),
            }
        );
        assert!(!r.tag().unwrap().is_channel());
    }

    #[test]
    fn plain_nightly_is_a_channel() {
        let s = Specifier {
            version: Some("nightly".to_string()),
            ..spec()
        };
        let tag = s.resolve().unwrap().tag().cloned().unwrap();
        assert_eq!(tag, Tag::from("nightly"));
        assert!(tag.is_channel());
    }

    #[test]
    fn numeric_version_gets_v_prefix() {
        let s = Specifier {
            version: Some("1.2.3".to_string()),
            ..spec()
        };
        let r = s.resolve().unwrap();
        assert_eq!(
            r.kind,
            InstallKind::Prebuilt {
                version: "v1.2.3".to_string(),
                tag: Tag::from("v1.2.3"),
            }
        );
    }

    #[test]
    fn malformed_numeric_version_is_rejected() {
        let s = Specifier {
            version: Some("1.2".to_string()),
            ..spec()
        };
        assert_eq!(
            s.resolve(),
            Err(SchemaError::InvalidVersion("1.2".to_string()))
        );
    }

    #[test]
    fn local_path_wins_and_reports_ignored_flags() {
        let s = Specifier {
            version: Some("nightly".to_string()),
            branch: Some("dev".to_string()),
            repo: "alice/foundry".to_string(),
            local_path: Some(PathBuf::from("/src/foundry")),
            ..spec()
        };
        let r = s.resolve().unwrap();
        assert_eq!(
            r.kind,
            InstallKind::LocalSource {
                path: PathBuf::from("/src/foundry")
            }
        );
        assert_eq!(r.ignored, vec!["--repo", "--branch", "--install"]);
        assert_eq!(r.tag(), None);
    }

    #[test]
    fn pr_and_branch_conflict() {
        let s = Specifier {
            pr: Some(42),
            branch: Some("dev".to_string()),
            ..spec()
        };
        assert_eq!(s.resolve(), Err(SchemaError::PrWithBranch));
    }

    #[test]
    fn pr_synthesizes_pull_ref() {
        let s = Specifier {
            pr: Some(42),
            ..spec()
        };
        match s.resolve().unwrap().kind {
            InstallKind::RemoteSource {
                branch,
                author,
                tag,
                ..
            } => {
                assert_eq!(branch, "refs/pull/42/head");
                assert_eq!(author, "foundry-rs");
                assert_eq!(tag.as_str(), "foundry-rs-pr-42");
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn custom_repo_defaults_to_master_branch() {
        let s = Specifier {
            repo: "alice/foundry".to_string(),
            ..spec()
        };
        match s.resolve().unwrap().kind {
            InstallKind::RemoteSource { branch, tag, .. } => {
                assert_eq!(branch, "master");
                assert_eq!(tag.as_str(), "alice-branch-master");
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn branch_slashes_become_dashes() {
        let s = Specifier {
            branch: Some("feat/new-cheatcode".to_string()),
            ..spec()
        };
        assert_eq!(
            s.resolve().unwrap().tag().map(Tag::as_str),
            Some("foundry-rs-branch-feat-new-cheatcode")
        );
    }

    #[test]
    fn commit_takes_priority_in_tag() {
        let s = Specifier {
            commit: Some("deadbeef".to_string()),
            pr: Some(7),
            ..spec()
        };
        match s.resolve().unwrap().kind {
            InstallKind::RemoteSource {
                branch,
                commit,
                tag,
                ..
            } => {
                assert_eq!(branch, "refs/pull/7/head");
                assert_eq!(commit.as_deref(), Some("deadbeef"));
                assert_eq!(tag.as_str(), "foundry-rs-commit-deadbeef");
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn repo_without_owner_is_rejected() {
        let s = Specifier {
            repo: "foundry".to_string(),
            ..spec()
        };
        assert_eq!(
            s.resolve(),
            Err(SchemaError::InvalidRepo("foundry".to_string()))
        );
    }
}
