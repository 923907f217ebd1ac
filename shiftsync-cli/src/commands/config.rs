use anyhow::Result;
use owo_colors::OwoColorize;
use shiftsync_core::cache::{History, SnapshotCache};
use shiftsync_core::config::config_path;

use crate::session;

pub fn run() -> Result<()> {
    let config = session::load_config()?;
    let data = config.data_path()?;

    println!("{}", "Paths".bold());
    println!("  Config:    {}", config_path()?.display());
    println!("  Snapshot:  {}", SnapshotCache::in_dir(&data).path().display());
    println!("  History:   {}", History::in_dir(&data, config.history_limit).path().display());

    println!("\n{}", "Settings".bold());
    println!("  Timezone:  {}", session::timezone(&config));
    println!("  Title:     {}", config.title);
    println!("  Notify:    {}", if config.notify { "on" } else { "off" });

    println!("\n{}", "ShiftWeb".bold());
    match &config.shiftweb {
        Some(web) => {
            println!("  ID:        {}", web.id);
            println!("  URL:       {}", web.base_url);
        }
        None => println!("  {}", "(not set up)".dimmed()),
    }

    println!("\n{}", "Calendars".bold());
    if config.calendars.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for target in &config.calendars {
        println!("  {}  {}", target.name, target.account.dimmed());
        println!("    {}", target.url.dimmed());
    }

    Ok(())
}
