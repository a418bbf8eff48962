//! Config file command.

use std::path::Path;

use crate::config::{self, Config};

/// Print the config file location and the effective settings, or write the
/// defaults with `init`.
pub fn cmd_config(config: &Config, init: bool) -> anyhow::Result<()> {
    let path = config::config_path().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    if init {
        return init_config(config, &path);
    }

    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn init_config(config: &Config, path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("Config file already exists at {}", path.display());
    }
    config::save(config)?;
    println!("Wrote {}", path.display());
    Ok(())
}
