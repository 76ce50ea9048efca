//! `docgen config`: print the effective settings.

use anyhow::{Context, Result};

use crate::config::Settings;

pub fn run(settings: &Settings) -> Result<()> {
    let rendered = toml::to_string_pretty(settings).context("Cannot render settings as TOML")?;
    println!("{rendered}");
    Ok(())
}
