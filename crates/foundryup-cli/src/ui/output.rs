//! Line-oriented terminal output.
//!
//! Progress goes to stdout; warnings and errors go to stderr so they stay
//! visible when stdout is piped.

use crossterm::style::Stylize;
use foundryup_core::Reporter;
use foundryup_schema::Tag;

use super::theme::Theme;

/// Styled printer handed to the install flow as its [`Reporter`].
#[derive(Debug, Clone, Default)]
pub struct Output {
    theme: Theme,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prints a visual section header for an operation phase.
    pub fn section(&self, title: &str) {
        println!();
        println!(
            "{} {}",
            title.bold(),
            "─".repeat(40).with(self.theme.colors.header)
        );
    }

    /// One binary placed into the active directory.
    pub fn done(&self, name: &str, tag: &Tag, detail: &str) {
        let c = &self.theme.colors;
        println!(
            "  {} {} {} {}",
            self.theme.icons.success.with(c.success),
            format!("{name:<8}").with(c.name),
            tag.as_str().with(c.version),
            detail.with(c.header)
        );
    }

    pub fn failed(&self, name: &str, tag: &Tag, reason: &str) {
        let c = &self.theme.colors;
        eprintln!(
            "  {} {} {} {}",
            self.theme.icons.error.with(c.error),
            format!("{name:<8}").with(c.name),
            tag.as_str().with(c.version),
            reason.with(c.error)
        );
    }

    pub fn info(&self, msg: &str) {
        println!("  {} {}", self.theme.icons.info, msg);
    }

    pub fn success(&self, msg: &str) {
        println!(
            "{} {}",
            self.theme.icons.success.with(self.theme.colors.success),
            msg
        );
    }

    pub fn warning(&self, msg: &str) {
        eprintln!(
            "{} {}",
            self.theme.icons.warning.with(self.theme.colors.warning),
            msg.with(self.theme.colors.warning)
        );
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        self.section(title);
    }

    fn done(&self, name: &str, tag: &Tag, detail: &str) {
        self.done(name, tag, detail);
    }

    fn failed(&self, name: &str, tag: &Tag, reason: &str) {
        self.failed(name, tag, reason);
    }

    fn info(&self, msg: &str) {
        self.info(msg);
    }

    fn success(&self, msg: &str) {
        self.success(msg);
    }

    fn warning(&self, msg: &str) {
        self.warning(msg);
    }
}
