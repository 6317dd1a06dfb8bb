//! Release platforms and the `(platform, arch)` target pair.

use crate::arch::Arch;
use crate::error::SchemaError;

/// Operating system family a release is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// glibc Linux.
    Linux,
    /// musl Linux (Alpine).
    Alpine,
    /// macOS.
    Darwin,
    /// Windows.
    Win32,
}

impl Platform {
    /// Map an OS name (as `uname -s` reports it) to a release platform.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedPlatform`] for names outside the
    /// supported families.
    pub fn from_os_name(name: &str) -> Result<Self, SchemaError> {
        let lower = name.to_lowercase();
        match lower.as_str() {
            "linux" => Ok(Self::Linux),
            "alpine" => Ok(Self::Alpine),
            s if s.starts_with("darwin") || s.starts_with("mac") => Ok(Self::Darwin),
            s if s.starts_with("mingw") || s.starts_with("win") => Ok(Self::Win32),
            _ => Err(SchemaError::UnsupportedPlatform(name.to_string())),
        }
    }

    /// Name used in release file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Alpine => "alpine",
            Self::Darwin => "darwin",
            Self::Win32 => "win32",
        }
    }

    /// Archive extension of the binary release, without the leading dot.
    pub fn archive_ext(&self) -> &'static str {
        match self {
            Self::Win32 => "zip",
            _ => "tar.gz",
        }
    }

    /// File name of a managed binary on this platform.
    pub fn binary_file_name(&self, bin: &str) -> String {
        match self {
            Self::Win32 => format!("{bin}.exe"),
            _ => bin.to_string(),
        }
    }

    /// Whether manual pages are published for this platform.
    pub fn has_manuals(&self) -> bool {
        !matches!(self, Self::Win32)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The `(platform, arch)` pair used to build artifact URLs.
///
/// Derived once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    /// Operating system family.
    pub platform: Platform,
    /// CPU architecture.
    pub arch: Arch,
}

impl Target {
    /// Pair `platform` with `arch`.
    pub fn new(platform: Platform, arch: Arch) -> Self {
        Self { platform, arch }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.platform, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn darwin_uses_tarball() {
        let p = Platform::from_os_name("Darwin").unwrap();
        assert_eq!(p, Platform::Darwin);
        assert_eq!(p.archive_ext(), "tar.gz");
    }

    #[test]
    fn mac_prefix_maps_to_darwin() {
        assert_eq!(Platform::from_os_name("macos").unwrap(), Platform::Darwin);
    }

    #[test]
    fn mingw_maps_to_win32_zip() {
        let p = Platform::from_os_name("mingw64_nt-10.0").unwrap();
        assert_eq!(p, Platform::Win32);
        assert_eq!(p.archive_ext(), "zip");
        assert_eq!(p.binary_file_name("forge"), "forge.exe");
        assert!(!p.has_manuals());
    }

    #[test]
    fn windows_maps_to_win32() {
        assert_eq!(Platform::from_os_name("windows").unwrap(), Platform::Win32);
    }

    #[test]
    fn linux_and_alpine() {
        assert_eq!(Platform::from_os_name("linux").unwrap(), Platform::Linux);
        assert_eq!(Platform::from_os_name("alpine").unwrap(), Platform::Alpine);
        assert_eq!(Platform::Alpine.archive_ext(), "tar.gz");
    }

    #[test]
    fn unknown_platform_is_rejected() {
        assert_eq!(
            Platform::from_os_name("foo"),
            Err(SchemaError::UnsupportedPlatform("foo".to_string()))
        );
    }

    #[test]
    fn target_display() {
        let t = Target::new(Platform::Linux, Arch::Arm64);
        assert_eq!(t.to_string(), "linux_arm64");
    }
}
