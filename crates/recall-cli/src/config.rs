use std::path::{Path, PathBuf};

use recall::config::Config;

use crate::error::CliResult;

/// Places searched for a config file when `--config` is not given, in order
pub fn default_config_paths() -> Vec<PathBuf> {
    [
        dirs::home_dir().map(|h| h.join(".recall").join("config.toml")),
        dirs::config_dir().map(|c| c.join("recall").join("config.toml")),
        Some(PathBuf::from("config.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Load the explicit config file, or the first existing default one, or defaults
pub fn load_config(config_path: Option<&Path>) -> CliResult<Config> {
    if let Some(path) = config_path {
        tracing::info!("Loading config from: {}", path.display());
        return Ok(Config::from_file(path)?);
    }

    load_first_existing(&default_config_paths())
}

fn load_first_existing(candidates: &[PathBuf]) -> CliResult<Config> {
    for path in candidates {
        if path.exists() {
            tracing::info!("Loading config from: {}", path.display());
            return Ok(Config::from_file(path)?);
        }
    }

    tracing::info!("No config file found, using defaults");
    Ok(Config::default())
}
