use anyhow::{Result, bail};
use chrono::Utc;
use owo_colors::OwoColorize;
use shiftsync_core::config::AppConfig;
use shiftsync_core::window::group_contiguous;
use shiftsync_core::{MonthRange, Reconciler};

use super::{exit_status, months_label};
use crate::render::{Render, render_plan};
use crate::session;
use crate::utils::tui;

/// Show what `sync` would change, without writing anything.
pub async fn run(config: AppConfig, range: MonthRange, calendar: Option<String>, verbose: bool) -> Result<()> {
    session::require_calendars(&config)?;
    let targets = config.targets(calendar.as_deref())?;
    let tz = session::timezone(&config);

    let source = session::connect_source(&config, tz).await?;
    let batches = group_contiguous(session::fetch_months(&source, &range).await, tz);
    if batches.is_empty() {
        bail!("Could not fetch shifts for any month in {range}");
    }

    let now = Utc::now();
    let mut failed = 0;
    for (i, target) in targets.iter().enumerate() {
        println!("{}", target.render());

        let store = match session::open_store(target, tz) {
            Ok(store) => store,
            Err(e) => {
                println!("   {}", format!("{e:#}").red());
                failed += 1;
                continue;
            }
        };
        let reconciler = Reconciler::new(&store);

        for batch in &batches {
            if batches.len() > 1 {
                println!("   {}", months_label(&batch.months).dimmed());
            }

            let spinner = tui::create_spinner("   Comparing".to_string());
            let plan = reconciler.plan(&batch.shifts, &batch.window, now).await;
            spinner.finish_and_clear();

            match plan {
                Ok(plan) => println!("{}", render_plan(&plan, tz, verbose)),
                Err(e) => {
                    println!("   {}", e.to_string().red());
                    failed += 1;
                }
            }
        }

        if i < targets.len() - 1 {
            println!();
        }
    }

    exit_status(failed)
}
