use anyhow::{Result, bail};
use chrono::Utc;
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use shiftsync_core::cache::{History, HistoryEntry, SnapshotCache, in_months};
use shiftsync_core::changes::{self, ChangeSet};
use shiftsync_core::config::AppConfig;
use shiftsync_core::sync::BatchResult;
use shiftsync_core::window::group_contiguous;
use shiftsync_core::{MonthRange, Reconciler, ShiftRecord, YearMonth};
use tracing::warn;

use super::{exit_status, months_label};
use crate::render::{Render, render_result};
use crate::session;
use crate::utils::tui;

pub async fn run(config: AppConfig, range: MonthRange, calendar: Option<String>, verbose: bool) -> Result<()> {
    session::require_calendars(&config)?;
    let targets = config.targets(calendar.as_deref())?;
    let tz = session::timezone(&config);

    let source = session::connect_source(&config, tz).await?;
    let fetched = session::fetch_months(&source, &range).await;

    let batches = group_contiguous(fetched, tz);
    if batches.is_empty() {
        bail!("Could not fetch shifts for any month in {range}");
    }

    let now = Utc::now();
    let mut results = Vec::new();
    let mut history = Vec::new();
    let mut fatal = 0;

    for (i, target) in targets.iter().enumerate() {
        let spinner = tui::create_spinner(target.render());
        let store = session::open_store(target, tz);
        spinner.finish_and_clear();

        println!("{}", target.render());

        let store = match store {
            Ok(store) => store,
            Err(e) => {
                println!("   {}", format!("{e:#}").red());
                history.push(HistoryEntry::from_error(now, &target.name, &range.to_string(), &format!("{e:#}")));
                fatal += 1;
                continue;
            }
        };
        let reconciler = Reconciler::new(&store);

        for batch in &batches {
            let label = months_label(&batch.months);
            let spinner = tui::create_spinner(format!("   Syncing {label}"));
            let result = reconciler.run(&batch.shifts, &batch.window, now).await;
            spinner.finish_and_clear();

            match result {
                Ok(result) => {
                    println!("{}", render_result(&result, tz, verbose));
                    history.push(HistoryEntry::from_result(now, &target.name, &label, &result));
                    results.push(result);
                }
                Err(e) => {
                    println!("   {}", e.to_string().red());
                    history.push(HistoryEntry::from_error(now, &target.name, &label, &e.to_string()));
                    fatal += 1;
                }
            }
        }

        if i < targets.len() - 1 {
            println!();
        }
    }

    let batch = BatchResult(results);
    let (added, updated, deleted) = batch.counts();
    if added > 0 || updated > 0 || deleted > 0 {
        println!("\nSynced: {added} added, {updated} updated, {deleted} deleted");
    }
    let failed = batch.failed_count();
    if failed > 0 {
        println!("{}", format!("{failed} items failed to apply").red());
    }

    if let Err(e) = History::in_dir(&config.data_path()?, config.history_limit).record(history) {
        warn!("could not record history: {e}");
    }

    if fatal == 0 {
        let months: Vec<YearMonth> = batches.iter().flat_map(|b| b.months.clone()).collect();
        let current: Vec<ShiftRecord> = batches.into_iter().flat_map(|b| b.shifts).collect();
        announce_changes(&config, tz, &months, current)?;
    }

    exit_status(fatal)
}

/// Compare with the last successful sync, print what moved and refresh the snapshot.
fn announce_changes(config: &AppConfig, tz: Tz, months: &[YearMonth], current: Vec<ShiftRecord>) -> Result<()> {
    let cache = SnapshotCache::in_dir(&config.data_path()?);
    let mut snapshot = cache.load();

    let current = in_months(months, current);
    let this_month = YearMonth::of(Utc::now().with_timezone(&tz).date_naive()).first_day();
    let changes = snapshot
        .saved_at
        .map(|_| changes::detect(&snapshot.for_months(months), &current, this_month))
        .unwrap_or_default();

    snapshot.replace_months(months, current, Utc::now());
    if let Err(e) = cache.save(&snapshot) {
        warn!("could not save snapshot: {e}");
    }

    if changes.is_empty() {
        return Ok(());
    }

    println!("\n{}", "Schedule changes".bold());
    for line in changes.lines() {
        println!("  {line}");
    }

    if config.notify {
        notify(&changes);
    }
    Ok(())
}

fn notify(changes: &ChangeSet) {
    let body = changes.lines().join("\n");
    let shown = notify_rust::Notification::new()
        .summary(&format!("shiftsync: {} schedule {}", changes.len(), if changes.len() == 1 { "change" } else { "changes" }))
        .body(&body)
        .show();

    if let Err(e) = shown {
        warn!("desktop notification failed: {e}");
    }
}
