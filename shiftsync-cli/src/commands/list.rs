use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use owo_colors::OwoColorize;
use shiftsync_core::config::AppConfig;
use shiftsync_core::ics::generate_export;
use shiftsync_core::shift::dedup_desired;
use shiftsync_core::{MonthRange, ShiftRecord};

use crate::session;

pub async fn run(config: AppConfig, range: MonthRange, ics: Option<PathBuf>) -> Result<()> {
    let tz = session::timezone(&config);
    let source = session::connect_source(&config, tz).await?;

    let fetched = session::fetch_months(&source, &range).await;
    let mut shifts = dedup_desired(fetched.into_iter().flat_map(|(_, s)| s.unwrap_or_default()));
    shifts.sort_by_key(ShiftRecord::start_utc);

    println!("{}", format!("Shifts {range}").bold());
    for shift in &shifts {
        println!("  {shift}");
    }
    println!("\n{} {}", shifts.len(), crate::render::pluralize("shift", shifts.len()));

    if let Some(path) = ics {
        std::fs::write(&path, generate_export(&shifts, Utc::now()))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Exported to {}", path.display().green());
    }

    Ok(())
}
