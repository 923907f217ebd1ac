//! User configuration at `~/.config/shiftsync/config.toml`.

mod app_config;
mod paths;

pub use app_config::{AppConfig, CalendarTarget, ShiftWebConfig};
pub use paths::{config_path, data_dir};
