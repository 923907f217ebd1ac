use async_trait::async_trait;
use chrono_tz::Tz;
use shiftsync_core::{ShiftRecord, ShiftSource, SourceError, YearMonth};
use tracing::info;

use crate::client::ShiftWebClient;
use crate::parse::parse_shifts;

/// Logged-in portal session that yields shifts in `tz` titled `title`.
pub struct ShiftWebSource {
    client: ShiftWebClient,
    tz: Tz,
    title: String,
}

impl ShiftWebSource {
    pub async fn connect(base_url: &str, id: &str, password: &str, tz: Tz, title: impl Into<String>) -> Result<Self, SourceError> {
        let client = ShiftWebClient::login(base_url, id, password)
            .await
            .map_err(|e| SourceError::Login(format!("{e:#}")))?;

        Ok(ShiftWebSource {
            client,
            tz,
            title: title.into(),
        })
    }
}

#[async_trait]
impl ShiftSource for ShiftWebSource {
    async fn fetch_month(&self, month: YearMonth) -> Result<Vec<ShiftRecord>, SourceError> {
        let html = self
            .client
            .month_page(month)
            .await
            .map_err(|e| SourceError::Http(format!("{e:#}")))?;

        let shifts = parse_shifts(&html, month, self.tz, &self.title)?;
        info!(%month, "found {} shifts", shifts.len());
        Ok(shifts)
    }
}
