use anyhow::Result;
use owo_colors::OwoColorize;
use shiftsync_core::cache::History;

use crate::session;

pub fn run() -> Result<()> {
    let config = session::load_config()?;
    let tz = session::timezone(&config);
    let entries = History::in_dir(&config.data_path()?, config.history_limit).load();

    if entries.is_empty() {
        println!("{}", "No sync runs recorded yet".dimmed());
        return Ok(());
    }

    for entry in entries.iter().rev() {
        let at = entry.at.with_timezone(&tz).format("%Y-%m-%d %H:%M");
        let head = format!("{at}  {}  {}", entry.target, entry.months);

        match &entry.error {
            Some(error) => println!("{}  {}", head, error.red()),
            None => {
                let mut counts = format!(
                    "+{} ~{} -{}",
                    entry.added, entry.updated, entry.deleted
                );
                if entry.failed > 0 {
                    counts.push_str(&format!(" !{}", entry.failed));
                }
                if entry.duplicates_removed > 0 {
                    counts.push_str(&format!(" ({} duplicates)", entry.duplicates_removed));
                }
                println!("{}  {}", head, counts.dimmed());
            }
        }
    }

    Ok(())
}
