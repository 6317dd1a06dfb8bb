//! Rendering of installed versions for `--list`.

use std::fmt::Write as _;

use foundryup_core::store::{BinaryStatus, StoreEntry};

/// Render every entry as a block: the tag, then one line per binary.
///
/// Binaries absent from a partial entry show as `not installed`; present
/// ones that print no version show as `no version reported`.
pub fn render_entries(entries: &[StoreEntry]) -> String {
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}", entry.tag);
        for (bin, status) in &entry.binaries {
            let version = match status {
                BinaryStatus::Reported(v) => v.as_str(),
                BinaryStatus::Unreported => "no version reported",
                BinaryStatus::Missing => "not installed",
            };
            let _ = writeln!(out, "  {bin:<8} {version}");
        }
    }
    out
}
