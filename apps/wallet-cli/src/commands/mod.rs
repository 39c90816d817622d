//! CLI command implementations.

mod config;
mod run;

pub use config::{config_init, config_show};
pub use run::{run, BrowserKind, RunArgs};

use anyhow::Result;
use std::path::PathBuf;
use wallet_config_and_utils::{Config, Paths};

/// Resolve the state directory, honouring `--config`.
pub fn resolve_paths(base_dir: Option<PathBuf>) -> Result<Paths> {
    match base_dir {
        Some(dir) => Ok(Paths::with_base_dir(dir)),
        None => Ok(Paths::new()?),
    }
}

/// Load the effective configuration for `paths`.
pub fn load_config(paths: &Paths) -> Result<Config> {
    Ok(Config::load(paths)?)
}
