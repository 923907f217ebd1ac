use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::config::paths;
use crate::constants::{DEFAULT_HISTORY_LIMIT, DEFAULT_SHIFTWEB_URL, DEFAULT_TITLE, ENV_PREFIX};
use crate::error::{CoreError, CoreResult};

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn is_default_title(title: &String) -> bool {
    title == DEFAULT_TITLE
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn is_default_history_limit(limit: &usize) -> bool {
    *limit == DEFAULT_HISTORY_LIMIT
}

fn default_base_url() -> String {
    DEFAULT_SHIFTWEB_URL.to_string()
}

/// Login for the shift-management site. The password lives in the keyring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftWebConfig {
    pub id: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// A calendar shifts are synced into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarTarget {
    pub name: String,
    /// CalDAV user name; also the keyring key for its app password.
    pub account: String,
    /// Absolute URL of the calendar collection.
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// IANA zone the shift site's wall-clock times are in. System zone if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default = "default_title", skip_serializing_if = "is_default_title")]
    pub title: String,

    #[serde(default)]
    pub notify: bool,

    #[serde(default = "default_history_limit", skip_serializing_if = "is_default_history_limit")]
    pub history_limit: usize,

    /// Overrides where the snapshot cache and history are kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shiftweb: Option<ShiftWebConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calendars: Vec<CalendarTarget>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            timezone: None,
            title: default_title(),
            notify: false,
            history_limit: default_history_limit(),
            data_dir: None,
            shiftweb: None,
            calendars: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load from the default location, with `SHIFTSYNC__*` environment overrides.
    pub fn load() -> CoreResult<Self> {
        Self::load_from(&paths::config_path()?)
    }

    pub fn load_from(path: &Path) -> CoreResult<Self> {
        let config: AppConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CoreError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CoreError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> CoreResult<()> {
        self.save_to(&paths::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> CoreResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoreError::Config(format!("Could not create config directory: {e}")))?;
        }

        std::fs::write(path, content)
            .map_err(|e| CoreError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn validate(&self) -> CoreResult<()> {
        if let Some(tz) = &self.timezone {
            tz.parse::<Tz>()
                .map_err(|_| CoreError::Config(format!("Unknown timezone '{tz}'")))?;
        }

        if self.history_limit == 0 {
            return Err(CoreError::Config("history_limit must be at least 1".into()));
        }

        if let Some(web) = &self.shiftweb {
            if web.id.trim().is_empty() {
                return Err(CoreError::Config("shiftweb.id is empty".into()));
            }
            if !is_http_url(&web.base_url) {
                return Err(CoreError::Config(format!("shiftweb.base_url '{}' is not an http(s) URL", web.base_url)));
            }
        }

        let mut names = HashSet::new();
        for target in &self.calendars {
            if !names.insert(target.name.as_str()) {
                return Err(CoreError::Config(format!("Calendar '{}' is configured twice", target.name)));
            }
            if !is_http_url(&target.url) {
                return Err(CoreError::Config(format!(
                    "Calendar '{}' has invalid url '{}'",
                    target.name, target.url
                )));
            }
        }

        Ok(())
    }

    /// The configured timezone, else `system` (an IANA name), else UTC.
    pub fn resolve_timezone(&self, system: Option<&str>) -> Tz {
        self.timezone
            .as_deref()
            .or(system)
            .and_then(|name| name.parse().ok())
            .unwrap_or(Tz::UTC)
    }

    pub fn data_path(&self) -> CoreResult<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).into_owned())),
            None => paths::data_dir(),
        }
    }

    pub fn calendar(&self, name: &str) -> Option<&CalendarTarget> {
        self.calendars.iter().find(|c| c.name == name)
    }

    /// Targets to sync: the named one, or all of them.
    pub fn targets(&self, only: Option<&str>) -> CoreResult<Vec<&CalendarTarget>> {
        match only {
            Some(name) => self
                .calendar(name)
                .map(|target| vec![target])
                .ok_or_else(|| CoreError::Config(format!("No calendar named '{name}' in config"))),
            None => Ok(self.calendars.iter().collect()),
        }
    }
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("https://") || s.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config.title, "Shift");
        assert_eq!(config.history_limit, 20);
        assert!(config.calendars.is_empty());
        assert!(config.shiftweb.is_none());
    }

    #[test]
    fn test_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"
timezone = "Asia/Tokyo"
title = "Work"
notify = true

[shiftweb]
id = "12345"

[[calendars]]
name = "Work"
account = "me@icloud.com"
url = "https://p01-caldav.icloud.com/123/calendars/abc/"
"#,
        );

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.title, "Work");
        assert!(config.notify);
        assert_eq!(config.shiftweb.as_ref().unwrap().base_url, DEFAULT_SHIFTWEB_URL);
        assert_eq!(config.calendar("Work").unwrap().account, "me@icloud.com");
        assert_eq!(config.resolve_timezone(Some("Europe/Berlin")).name(), "Asia/Tokyo");
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "timezone = \"Mars/Olympus\"\n");
        assert!(matches!(AppConfig::load_from(&path), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_duplicate_calendar_rejected() {
        let mut config = AppConfig::default();
        let target = CalendarTarget {
            name: "Work".into(),
            account: "me".into(),
            url: "https://example.com/cal/".into(),
        };
        config.calendars = vec![target.clone(), target];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.shiftweb = Some(ShiftWebConfig {
            id: "42".into(),
            base_url: default_base_url(),
        });
        config.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("title"), "default title should be omitted:\n{content}");

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.shiftweb, config.shiftweb);
    }

    #[test]
    fn test_timezone_fallbacks() {
        let config = AppConfig::default();
        assert_eq!(config.resolve_timezone(Some("Asia/Tokyo")).name(), "Asia/Tokyo");
        assert_eq!(config.resolve_timezone(Some("garbage")), Tz::UTC);
        assert_eq!(config.resolve_timezone(None), Tz::UTC);
    }

    #[test]
    fn test_targets_filter() {
        let mut config = AppConfig::default();
        config.calendars.push(CalendarTarget {
            name: "Work".into(),
            account: "me".into(),
            url: "https://example.com/cal/".into(),
        });

        assert_eq!(config.targets(None).unwrap().len(), 1);
        assert_eq!(config.targets(Some("Work")).unwrap().len(), 1);
        assert!(config.targets(Some("Home")).is_err());
    }
}
