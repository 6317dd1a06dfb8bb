/// CPU architecture of a release artifact.
///
/// Releases are only published for `amd64` and `arm64`; every other machine
/// name falls back to `amd64`.
///
/// # Example
///
/// ```
/// use foundryup_schema::Arch;
///
/// assert_eq!(Arch::from_machine("aarch64", false), Arch::Arm64);
/// assert_eq!(Arch::from_machine("x86_64", true), Arch::Arm64);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 64-bit x86.
    #[default]
    Amd64,
    /// 64-bit ARM (Apple Silicon, Graviton, ...).
    Arm64,
}

impl Arch {
    /// Map a raw machine name (as `uname -m` reports it) to a release architecture.
    ///
    /// `translated` is true when the process runs under binary translation
    /// (Rosetta 2): the host then reports `x86_64` but native `arm64`
    /// binaries are the right pick.
    pub fn from_machine(machine: &str, translated: bool) -> Self {
        match machine.to_lowercase().as_str() {
            "x86_64" if translated => Self::Arm64,
            "arm64" | "aarch64" => Self::Arm64,
            _ => Self::Amd64,
        }
    }

    /// Convert to the name used in artifact URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
