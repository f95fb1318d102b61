use std::io::{self, Write};

use super::super::Ctx;
use crate::Result;
use crate::config::ConfigError;

pub(crate) fn handle(ctx: &Ctx) -> Result<()> {
    let mut out = io::stdout().lock();
    if ctx.json {
        let json = serde_json::to_string_pretty(&ctx.config).map_err(io::Error::other)?;
        writeln!(out, "{json}")?;
        return Ok(());
    }
    let rendered = toml::to_string_pretty(&ctx.config).map_err(ConfigError::from)?;
    write!(out, "{rendered}")?;
    writeln!(out, "# state file: {}", ctx.config.state_file().display())?;
    Ok(())
}
