use anyhow::{Result, anyhow};
use dialoguer::Select;
use owo_colors::OwoColorize;
use shiftsync_caldav::discover;
use shiftsync_core::config::CalendarTarget;
use shiftsync_core::constants::DEFAULT_CALDAV_URL;

use super::setup::choose_calendar;
use crate::render::Render;
use crate::session;
use crate::utils::tui;

/// Point a sync target at a different calendar.
///
/// Managed events in the old calendar are purged first so shifts are not
/// left behind in two places.
pub async fn run(name: Option<String>) -> Result<()> {
    let mut config = session::load_config()?;
    session::require_calendars(&config)?;
    let tz = session::timezone(&config);

    let index = match name {
        Some(name) => config
            .calendars
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| anyhow!("No calendar named '{name}' in config"))?,
        None if config.calendars.len() == 1 => 0,
        None => {
            let items: Vec<String> = config.calendars.iter().map(CalendarTarget::render).collect();
            Select::new()
                .with_prompt("Which sync target?")
                .items(&items)
                .default(0)
                .interact()?
        }
    };
    let current = config.calendars[index].clone();
    println!("Currently syncing to {}\n", current.name.bold());

    let client = session::caldav_client(&current.account)?;
    let spinner = tui::create_spinner("Finding calendars".to_string());
    let home = discover(&client, DEFAULT_CALDAV_URL).await;
    spinner.finish_and_clear();

    let chosen = choose_calendar(&client, &home?).await?;
    if chosen.url == current.url {
        println!("Calendar unchanged.");
        return Ok(());
    }

    let old = session::open_store(&current, tz)?;
    let spinner = tui::create_spinner(format!("Removing shifts from {}", current.name));
    let purged = old.purge_managed().await;
    spinner.finish_and_clear();
    println!("Removed {} shifts from {}", purged?, current.name);

    config.calendars[index] = CalendarTarget {
        name: chosen.name,
        account: current.account,
        url: chosen.url,
    };
    config.validate()?;
    config.save()?;

    println!("Now syncing to {}.", config.calendars[index].name.green());
    Ok(())
}
