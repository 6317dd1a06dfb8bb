//! `--list`: every installed version and what its binaries report.

use anyhow::Result;

use crate::Config;
use crate::context::Context;
use crate::ui::list::render_entries;

pub fn list(config: &Config) -> Result<()> {
    let ctx = Context::new(config)?;
    let entries = ctx.installer().list()?;

    if entries.is_empty() {
        println!("No versions installed.");
        println!("Run 'foundryup' to install the latest stable release.");
        return Ok(());
    }

    print!("{}", render_entries(&entries));
    Ok(())
}
