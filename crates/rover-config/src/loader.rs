use rover_core::{Result, RoverError};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::schema::Config;

/// Resolve the config path: explicit path > ROVER_CONFIG env > ~/.rover/config.json
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    if let Ok(p) = std::env::var("ROVER_CONFIG") {
        return PathBuf::from(p);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rover")
        .join("config.json")
}

/// Parse a configuration document read from `path`.
///
/// The result is validated with [`Config::ensure`] and remembers the path it
/// came from.
pub fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Config> {
    let mut config: Config = serde_json::from_slice(bytes).map_err(|e| RoverError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    config.ensure()?;
    config.config_file_path = Some(path.to_path_buf());
    Ok(config)
}

/// Read and parse the configuration file at `path`.
pub fn read_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(RoverError::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    }
    info!(path = %path.display(), "loading configuration");
    let raw = std::fs::read(path)?;
    from_bytes(path, &raw)
}
