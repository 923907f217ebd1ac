use std::path::PathBuf;

use crate::constants::APP_NAME;
use crate::error::{CoreError, CoreResult};

pub fn config_path() -> CoreResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| CoreError::Config("Could not determine config directory".into()))?
        .join(APP_NAME);

    Ok(config_dir.join("config.toml"))
}

/// Where the snapshot cache and run history live unless `data_dir` is configured.
pub fn data_dir() -> CoreResult<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_NAME))
        .ok_or_else(|| CoreError::Config("Could not determine data directory".into()))
}
