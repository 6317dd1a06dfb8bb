use dirs::home_dir;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use foundryup_schema::Tag;

/// Returns the foundry root directory, or None if the user's home cannot be resolved.
///
/// `FOUNDRY_DIR` wins, then `$XDG_CONFIG_HOME/.foundry`, then `~/.foundry`.
pub fn try_foundry_home() -> Option<PathBuf> {
    resolve_root(
        std::env::var_os("FOUNDRY_DIR"),
        std::env::var_os("XDG_CONFIG_HOME"),
        home_dir(),
    )
}

fn resolve_root(
    foundry_dir: Option<OsString>,
    config_home: Option<OsString>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    let set = |v: Option<OsString>| v.filter(|v| !v.is_empty()).map(PathBuf::from);

    if let Some(dir) = set(foundry_dir) {
        return Some(dir);
    }
    set(config_home)
        .or(home)
        .map(|base| base.join(".foundry"))
}

/// On-disk layout rooted at the foundry directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
    bin: PathBuf,
}

impl Layout {
    /// Layout rooted at `root`, with the active directory at `root/bin`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let bin = root.join("bin");
        Self { root, bin }
    }

    /// Layout from the environment. See [`try_foundry_home`]; `FOUNDRY_BIN_DIR`
    /// moves only the active directory.
    pub fn from_env() -> Option<Self> {
        let mut layout = Self::new(try_foundry_home()?);
        if let Ok(bin) = std::env::var("FOUNDRY_BIN_DIR") {
            layout.bin = PathBuf::from(bin);
        }
        Some(layout)
    }

    /// Root directory: ~/.foundry
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Active binary directory: ~/.foundry/bin
    pub fn bin_dir(&self) -> &Path {
        &self.bin
    }

    /// Version Store: ~/.foundry/versions
    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    /// Store entry for one tag: ~/.foundry/versions/<tag>
    pub fn version_dir(&self, tag: &Tag) -> PathBuf {
        self.versions_dir().join(tag.as_str())
    }

    /// Manual pages: ~/.foundry/share/man/man1
    pub fn man_dir(&self) -> PathBuf {
        self.root.join("share").join("man").join("man1")
    }

    /// Source checkout for remote builds: ~/.foundry/<author>
    pub fn checkout_dir(&self, author: &str) -> PathBuf {
        self.root.join(author)
    }
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}
