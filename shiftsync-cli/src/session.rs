//! Wiring shared by the commands: config, timezone, source and stores.

use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use shiftsync_caldav::{CalDavClient, CalDavStore};
use shiftsync_core::config::{AppConfig, CalendarTarget, ShiftWebConfig};
use shiftsync_core::{MonthRange, ShiftRecord, ShiftSource, YearMonth};
use shiftsync_shiftweb::ShiftWebSource;
use tracing::warn;

use crate::credentials;
use crate::utils::tui;

pub fn load_config() -> Result<AppConfig> {
    AppConfig::load().context("Failed to load config")
}

pub fn timezone(config: &AppConfig) -> Tz {
    let system = iana_time_zone::get_timezone().ok();
    config.resolve_timezone(system.as_deref())
}

fn shiftweb(config: &AppConfig) -> Result<&ShiftWebConfig> {
    match &config.shiftweb {
        Some(web) => Ok(web),
        None => bail!(
            "No ShiftWeb account configured.\n\n\
            Set one up with:\n  \
            shiftsync setup"
        ),
    }
}

pub async fn connect_source(config: &AppConfig, tz: Tz) -> Result<ShiftWebSource> {
    let web = shiftweb(config)?;
    let password = credentials::require(credentials::SHIFTWEB_SERVICE, &web.id)?;

    let spinner = tui::create_spinner("Logging in to ShiftWeb".to_string());
    let source = ShiftWebSource::connect(&web.base_url, &web.id, &password, tz, config.title.clone()).await;
    spinner.finish_and_clear();

    Ok(source?)
}

/// Fetch every month in `range`. A month that fails is reported and comes
/// back as `None` so no window covers it.
pub async fn fetch_months(
    source: &dyn ShiftSource,
    range: &MonthRange,
) -> Vec<(YearMonth, Option<Vec<ShiftRecord>>)> {
    let mut fetched = Vec::new();

    for &month in range.months() {
        let spinner = tui::create_spinner(format!("Fetching {month}"));
        let result = source.fetch_month(month).await;
        spinner.finish_and_clear();

        match result {
            Ok(shifts) => fetched.push((month, Some(shifts))),
            Err(e) => {
                warn!(%month, "fetch failed: {e}");
                println!("{} {}", format!("Skipping {month}:").red(), e.to_string().red());
                fetched.push((month, None));
            }
        }
    }

    fetched
}

pub fn require_calendars(config: &AppConfig) -> Result<()> {
    if config.calendars.is_empty() {
        bail!(
            "No calendars configured.\n\n\
            Pick one with:\n  \
            shiftsync setup"
        );
    }
    Ok(())
}

pub fn caldav_client(account: &str) -> Result<CalDavClient> {
    let password = credentials::require(credentials::CALDAV_SERVICE, account)?;
    CalDavClient::new(account, &password)
}

pub fn open_store(target: &CalendarTarget, tz: Tz) -> Result<CalDavStore> {
    let client = caldav_client(&target.account)?;
    CalDavStore::new(client, &target.url, target.name.clone(), tz)
}
