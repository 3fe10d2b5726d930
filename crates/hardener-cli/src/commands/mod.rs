pub mod autofix;
pub mod serve;

use anyhow::{Context, Result};
use std::path::Path;

use hardener_runtime::HardenerConfig;

/// Load the config file, or defaults when none was given.
pub fn load_config(path: Option<&Path>) -> Result<HardenerConfig> {
    match path {
        Some(path) => HardenerConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(HardenerConfig::default()),
    }
}
