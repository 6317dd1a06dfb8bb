//! `--use`: activate a version that is already in the store.

use anyhow::Result;
use foundryup_schema::Tag;

use crate::Config;
use crate::context::Context;

pub fn use_version(config: &Config, tag: &str) -> Result<()> {
    let ctx = Context::new(config)?;
    let tag = Tag::from(tag);

    ctx.output.section(&format!("Using foundry ({tag})"));
    ctx.installer().use_version(&tag)?;
    ctx.output.success(&format!("now using {tag}"));
    Ok(())
}
