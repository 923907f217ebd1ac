//! A CalDAV calendar collection as a shiftsync [`CalendarStore`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::{StatusCode, Url};
use shiftsync_core::error::{StoreError, StoreResult};
use shiftsync_core::ics::{generate_ics, parse_event};
use shiftsync_core::marker;
use shiftsync_core::{CalendarStore, RemoteEvent, ShiftId, ShiftRecord, SyncWindow};
use tracing::{debug, info, warn};

use crate::client::CalDavClient;
use crate::xml;

fn caldav_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

pub struct CalDavStore {
    client: CalDavClient,
    calendar: Url,
    label: String,
    tz: Tz,
}

impl CalDavStore {
    /// `calendar_url` is the collection URL; `tz` is used to read floating
    /// times in events written by other clients.
    pub fn new(client: CalDavClient, calendar_url: &str, label: impl Into<String>, tz: Tz) -> Result<Self> {
        let mut calendar = Url::parse(calendar_url).with_context(|| format!("Invalid calendar URL: {calendar_url}"))?;
        if !calendar.path().ends_with('/') {
            calendar.set_path(&format!("{}/", calendar.path()));
        }

        Ok(CalDavStore {
            client,
            calendar,
            label: label.into(),
            tz,
        })
    }

    pub fn calendar_url(&self) -> &Url {
        &self.calendar
    }

    fn event_url(&self, id: &ShiftId) -> Result<Url> {
        Ok(self.calendar.join(&marker::resource_name(id))?)
    }

    fn resource_url(&self, resource: &str) -> Result<Url> {
        self.calendar
            .join(resource)
            .with_context(|| format!("Invalid event href: {resource}"))
    }

    /// PUT without a precondition.
    async fn overwrite(&self, url: &Url, ics: String) -> StoreResult<()> {
        let (status, body) = self.client.put_ics(url, ics, false).await.map_err(write_error)?;
        if status.is_success() {
            Ok(())
        } else {
            Err(StoreError::Write(format!("PUT {url} failed (status {status}): {body}")))
        }
    }

    /// Managed events in the collection, limited to `window` when given.
    async fn fetch(&self, window: Option<&SyncWindow>) -> Result<Vec<RemoteEvent>> {
        let range = window.map(|w| (caldav_datetime(w.start), caldav_datetime(w.end)));
        let body = xml::calendar_query(range.as_ref().map(|(s, e)| (s.as_str(), e.as_str())));

        let response = self.client.report(&self.calendar, body).await?;
        let resources = xml::parse_calendar_resources(&response)?;

        let mut events = Vec::new();
        for resource in resources {
            let Some(parsed) = parse_event(&resource.data, self.tz) else {
                debug!(href = %resource.href, "skipping unparseable calendar object");
                continue;
            };
            match parsed.into_remote(&resource.href) {
                Some(event) => events.push(event),
                None => debug!(href = %resource.href, "skipping foreign event"),
            }
        }

        if let Some(window) = window {
            events.retain(|e| window.contains(e.start));
        }
        Ok(events)
    }

    /// Delete every managed event in the calendar, past ones included.
    ///
    /// Used when the sync target moves to another calendar.
    pub async fn purge_managed(&self) -> Result<usize> {
        let events = self.fetch(None).await?;
        let mut removed = 0;

        for event in &events {
            match self.delete(event).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(resource = %event.resource, "failed to purge event: {e}"),
            }
        }

        info!(calendar = %self.calendar, "purged {removed} of {} managed events", events.len());
        Ok(removed)
    }

    pub async fn display_name(&self) -> Result<Option<String>> {
        let (_, body) = self
            .client
            .propfind(&self.calendar, 0, xml::DISPLAY_NAME_PROPFIND)
            .await?;
        xml::find_display_name(&body)
    }
}

fn write_error(e: anyhow::Error) -> StoreError {
    StoreError::Write(format!("{e:#}"))
}

#[async_trait]
impl CalendarStore for CalDavStore {
    fn name(&self) -> String {
        self.label.clone()
    }

    async fn list_managed(&self, window: &SyncWindow) -> StoreResult<Vec<RemoteEvent>> {
        self.fetch(Some(window))
            .await
            .map_err(|e| StoreError::Unavailable(format!("{e:#}")))
    }

    async fn create(&self, shift: &ShiftRecord) -> StoreResult<()> {
        let url = self.event_url(shift.identity()).map_err(write_error)?;
        let ics = generate_ics(shift, Utc::now());

        let (status, body) = self.client.put_ics(&url, ics.clone(), true).await.map_err(write_error)?;
        match status {
            s if s.is_success() => Ok(()),
            StatusCode::PRECONDITION_FAILED => {
                // The resource exists but was not listed as this shift (another
                // run created it meanwhile, or its content is unreadable).
                warn!(%url, "event already exists, overwriting it");
                self.overwrite(&url, ics).await
            }
            s => Err(StoreError::Write(format!("PUT {url} failed (status {s}): {body}"))),
        }
    }

    async fn update(&self, target: &RemoteEvent, shift: &ShiftRecord) -> StoreResult<()> {
        let url = self.resource_url(&target.resource).map_err(write_error)?;
        self.overwrite(&url, generate_ics(shift, Utc::now())).await
    }

    async fn delete(&self, target: &RemoteEvent) -> StoreResult<()> {
        let url = self.resource_url(&target.resource).map_err(write_error)?;

        let status = self.client.delete(&url).await.map_err(write_error)?;
        // 404: already gone
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(StoreError::Write(format!("DELETE {url} failed (status {status})")))
        }
    }
}
