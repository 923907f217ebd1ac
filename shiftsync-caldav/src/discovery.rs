//! CalDAV discovery flow:
//! 1. PROPFIND on the server root to get the user's principal URL
//! 2. PROPFIND on the principal to get the calendar-home-set URL
//! 3. PROPFIND (depth 1) on the home to list calendar collections

use anyhow::{Context, Result, bail};
use reqwest::Url;
use tracing::info;

use crate::client::CalDavClient;
use crate::xml;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarHome {
    pub principal: Url,
    pub home: Url,
}

/// An event calendar the user can sync into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarInfo {
    pub name: String,
    pub url: String,
}

pub async fn discover(client: &CalDavClient, base_url: &str) -> Result<CalendarHome> {
    let base = Url::parse(base_url).with_context(|| format!("Invalid CalDAV URL: {base_url}"))?;

    let (answered, body) = client
        .propfind(&base, 0, xml::PRINCIPAL_PROPFIND)
        .await
        .context("CalDAV authentication failed. Check the account name and app password")?;
    let principal_href = xml::find_property_href(&body, "current-user-principal")?
        .with_context(|| format!("Could not find principal URL in response. Response body:\n{body}"))?;
    let principal = answered.join(&principal_href)?;

    let (answered, body) = client
        .propfind(&principal, 0, xml::HOME_SET_PROPFIND)
        .await
        .context("Failed to get calendar home")?;
    let home_href = xml::find_property_href(&body, "calendar-home-set")?
        .with_context(|| format!("Could not find calendar-home-set in response. Response body:\n{body}"))?;
    let home = answered.join(&home_href)?;

    Ok(CalendarHome { principal, home })
}

pub async fn list_calendars(client: &CalDavClient, home: &CalendarHome) -> Result<Vec<CalendarInfo>> {
    let (answered, body) = client
        .propfind(&home.home, 1, xml::COLLECTIONS_PROPFIND)
        .await
        .context("Failed to list calendars")?;

    let mut calendars = Vec::new();
    for collection in xml::parse_collections(&body)? {
        if !collection.is_calendar || !collection.holds_events {
            continue;
        }
        let url = answered.join(&collection.href)?;
        if url.path().trim_end_matches('/') == home.home.path().trim_end_matches('/') {
            continue;
        }

        let name = collection.display_name.unwrap_or_else(|| {
            url.path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()).map(str::to_string))
                .unwrap_or_else(|| "Calendar".to_string())
        });
        calendars.push(CalendarInfo {
            name,
            url: url.to_string(),
        });
    }

    Ok(calendars)
}

/// MKCALENDAR a new event calendar under the home with a random collection id.
pub async fn create_calendar(client: &CalDavClient, home: &CalendarHome, display_name: &str) -> Result<CalendarInfo> {
    if display_name.trim().is_empty() {
        bail!("Calendar name cannot be empty");
    }

    let mut home_url = home.home.clone();
    if !home_url.path().ends_with('/') {
        home_url.set_path(&format!("{}/", home_url.path()));
    }
    let url = home_url.join(&format!("{}/", uuid::Uuid::new_v4().to_string().to_uppercase()))?;

    client
        .mkcalendar(&url, xml::mkcalendar(display_name))
        .await
        .with_context(|| format!("Failed to create calendar '{display_name}'"))?;
    info!("created calendar {display_name} at {url}");

    Ok(CalendarInfo {
        name: display_name.to_string(),
        url: url.to_string(),
    })
}
