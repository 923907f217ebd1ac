use anyhow::{Context, Result};
use dialoguer::Select;
use owo_colors::OwoColorize;
use shiftsync_caldav::{CalDavClient, CalendarHome, CalendarInfo, create_calendar, discover, list_calendars};
use shiftsync_core::config::{AppConfig, CalendarTarget, ShiftWebConfig};
use shiftsync_core::constants::{DEFAULT_CALDAV_URL, DEFAULT_SHIFTWEB_URL};
use shiftsync_shiftweb::ShiftWebSource;

use crate::credentials::{self, CALDAV_SERVICE, SHIFTWEB_SERVICE};
use crate::session;
use crate::utils::{prompt, tui};

const DEFAULT_CALENDAR_NAME: &str = "Shifts";

pub async fn run() -> Result<()> {
    let mut config = session::load_config().unwrap_or_default();
    let tz = session::timezone(&config);

    println!("{}\n", "ShiftWeb account".bold());
    let current = config.shiftweb.clone();
    let id = prompt::text("Staff ID", current.as_ref().map(|w| w.id.as_str()))?;
    let base_url = current
        .map(|w| w.base_url)
        .unwrap_or_else(|| DEFAULT_SHIFTWEB_URL.to_string());
    let password = prompt::password("Password")?;

    let spinner = tui::create_spinner("Checking login".to_string());
    let login = ShiftWebSource::connect(&base_url, &id, &password, tz, config.title.clone()).await;
    spinner.finish_and_clear();
    login?;

    credentials::set(SHIFTWEB_SERVICE, &id, &password)?;
    config.shiftweb = Some(ShiftWebConfig { id, base_url });
    println!("{}\n", "Logged in.".green());

    println!("{}\n", "Calendar account".bold());
    println!("For iCloud, create an app-specific password at https://appleid.apple.com\n");
    let account = prompt::text(
        "Account (Apple ID)",
        config.calendars.first().map(|c| c.account.as_str()),
    )?;
    let app_password = prompt::password("App password")?;

    let client = CalDavClient::new(&account, &app_password)?;
    let spinner = tui::create_spinner("Finding calendars".to_string());
    let home = discover(&client, DEFAULT_CALDAV_URL).await;
    spinner.finish_and_clear();
    let home = home.context("Could not sign in to the calendar server")?;

    credentials::set(CALDAV_SERVICE, &account, &app_password)?;

    let chosen = choose_calendar(&client, &home).await?;
    let target = CalendarTarget {
        name: chosen.name,
        account,
        url: chosen.url,
    };

    config.calendars.retain(|c| c.name != target.name && c.url != target.url);
    config.calendars.push(target.clone());
    config.validate()?;
    config.save()?;

    println!("\nShifts will sync to {}.", target.name.green());
    println!("Run `shiftsync` to sync now.");
    Ok(())
}

/// Let the user pick an existing event calendar or create a new one.
pub async fn choose_calendar(client: &CalDavClient, home: &CalendarHome) -> Result<CalendarInfo> {
    let spinner = tui::create_spinner("Listing calendars".to_string());
    let calendars = list_calendars(client, home).await;
    spinner.finish_and_clear();
    let calendars = calendars?;

    let mut items: Vec<String> = calendars.iter().map(|c| c.name.clone()).collect();
    items.push("+ Create a new calendar".to_string());

    let selection = Select::new()
        .with_prompt("Sync shifts into")
        .items(&items)
        .default(0)
        .interact()?;

    if let Some(existing) = calendars.get(selection) {
        return Ok(existing.clone());
    }

    let name = prompt::text("Calendar name", Some(DEFAULT_CALENDAR_NAME))?;
    let spinner = tui::create_spinner(format!("Creating {name}"));
    let created = create_calendar(client, home, &name).await;
    spinner.finish_and_clear();

    created
}
