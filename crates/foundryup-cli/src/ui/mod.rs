//! Terminal output.
//!
//! - [`theme`] - colors and icons
//! - [`output`] - the [`Output`] handle commands print through
//! - [`list`] - rendering of `--list`

pub mod list;
pub mod output;
pub mod theme;

pub use output::Output;
pub use theme::Theme;
