//! Colored terminal rendering for shiftsync types.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use shiftsync_core::config::CalendarTarget;
use shiftsync_core::sync::{DiffKind, FailedChange, ShiftDiff};
use shiftsync_core::{RemoteEvent, SyncPlan, SyncResult};

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for DiffKind {
    fn render(&self) -> String {
        colorize_diff(*self, &self.to_string())
    }
}

impl Render for CalendarTarget {
    fn render(&self) -> String {
        format!("📅 {}", self.name)
    }
}

impl Render for FailedChange {
    fn render(&self) -> String {
        format!("{} {} {}", "!".red(), self.shift.red(), format!("({} failed: {})", self.kind.verb(), self.error).dimmed())
    }
}

fn colorize_diff(kind: DiffKind, text: &str) -> String {
    match kind {
        DiffKind::Create => text.green().to_string(),
        DiffKind::Update => text.yellow().to_string(),
        DiffKind::Delete => text.red().to_string(),
    }
}

/// `2025-11-03  10:00-18:00  Store A` in `tz`.
fn event_line(event: &RemoteEvent, tz: Tz) -> String {
    let start = event.start.with_timezone(&tz);
    let end = event.end.with_timezone(&tz);
    format!(
        "{}  {}-{}  {}",
        start.format("%Y-%m-%d"),
        start.format("%H:%M"),
        end.format("%H:%M"),
        event.location
    )
}

fn local_time(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
}

fn render_diff(diff: &ShiftDiff, tz: Tz) -> String {
    let line = match (&diff.new, &diff.old) {
        (Some(shift), _) => shift.to_string(),
        (None, Some(event)) => event_line(event, tz),
        (None, None) => String::new(),
    };
    format!("{} {}", diff.kind.render(), colorize_diff(diff.kind, &line))
}

/// Field-by-field differences for an update.
fn render_field_diffs(diff: &ShiftDiff, tz: Tz) -> Vec<String> {
    let mut lines = Vec::new();
    let (Some(old), Some(new)) = (&diff.old, &diff.new) else {
        return lines;
    };

    if old.title != new.title() {
        lines.push(format!("{}: {} → {}", "title".dimmed(), old.title.red(), new.title().green()));
    }
    if old.location != new.location() {
        lines.push(format!("{}: {} → {}", "location".dimmed(), old.location.red(), new.location().green()));
    }
    if old.start != new.start_utc() {
        lines.push(format!(
            "{}: {} → {}",
            "start".dimmed(),
            local_time(old.start, tz).red(),
            local_time(new.start_utc(), tz).green()
        ));
    }
    if old.end != new.end_utc() {
        lines.push(format!(
            "{}: {} → {}",
            "end".dimmed(),
            local_time(old.end, tz).red(),
            local_time(new.end_utc(), tz).green()
        ));
    }
    if old.memo.as_deref() != new.memo() {
        let old_memo = old.memo.as_deref().unwrap_or("(none)");
        let new_memo = new.memo().unwrap_or("(none)");
        lines.push(format!("{}: {} → {}", "memo".dimmed(), old_memo.red(), new_memo.green()));
    }

    lines
}

/// Show counts instead of individual shifts above this many changes.
const COMPACT_THRESHOLD: usize = 5;

fn render_diff_list(diffs: &[ShiftDiff], tz: Tz, verbose: bool, lines: &mut Vec<String>) {
    if verbose || diffs.len() <= COMPACT_THRESHOLD {
        for diff in diffs {
            lines.push(format!("   {}", render_diff(diff, tz)));
            if diff.kind == DiffKind::Update {
                lines.extend(render_field_diffs(diff, tz).into_iter().map(|l| format!("      {l}")));
            }
        }
        return;
    }

    for (kind, label) in [
        (DiffKind::Create, "new"),
        (DiffKind::Update, "changed"),
        (DiffKind::Delete, "removed"),
    ] {
        let count = diffs.iter().filter(|d| d.kind == kind).count();
        if count > 0 {
            let text = format!("({count} {label} {})", pluralize("shift", count));
            lines.push(format!("   {} {}", kind.render(), colorize_diff(kind, &text)));
        }
    }
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 { word.to_string() } else { format!("{word}s") }
}

/// Dry-run output for `status`.
pub fn render_plan(plan: &SyncPlan, tz: Tz, verbose: bool) -> String {
    let mut lines = Vec::new();

    if plan.is_empty() {
        lines.push("   No changes".dimmed().to_string());
    } else {
        render_diff_list(&plan.diffs(), tz, verbose, &mut lines);
    }

    if !plan.duplicates.is_empty() {
        let text = format!("({} duplicate {} to remove)", plan.duplicates.len(), pluralize("event", plan.duplicates.len()));
        lines.push(format!("   {}", text.dimmed()));
    }
    if !plan.retained_past.is_empty() {
        let text = format!("({} past {} kept)", plan.retained_past.len(), pluralize("shift", plan.retained_past.len()));
        lines.push(format!("   {}", text.dimmed()));
    }

    lines.join("\n")
}

/// What `sync` did for one target.
pub fn render_result(result: &SyncResult, tz: Tz, verbose: bool) -> String {
    let mut lines = Vec::new();
    let diffs = result.diffs();

    if diffs.is_empty() && result.failed.is_empty() {
        lines.push("   No changes".dimmed().to_string());
    } else {
        render_diff_list(&diffs, tz, verbose, &mut lines);
    }

    for failure in &result.failed {
        lines.push(format!("   {}", failure.render()));
    }

    if result.duplicates_removed > 0 {
        let text = format!(
            "({} duplicate {} removed)",
            result.duplicates_removed,
            pluralize("event", result.duplicates_removed)
        );
        lines.push(format!("   {}", text.dimmed()));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use shiftsync_core::ShiftRecord;

    fn shift(day: u32, location: &str) -> ShiftRecord {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        ShiftRecord::new(
            "Shift",
            tz.with_ymd_and_hms(2025, 11, day, 10, 0, 0).unwrap(),
            tz.with_ymd_and_hms(2025, 11, day, 18, 0, 0).unwrap(),
            location,
            None,
        )
        .unwrap()
    }

    fn plain(s: &str) -> String {
        // strip ANSI escapes
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\u{1b}' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_small_plans_list_every_shift() {
        let plan = SyncPlan::compute(&[shift(3, "Store A")], &[], Utc::now());
        let out = plain(&render_plan(&plan, chrono_tz::Asia::Tokyo, false));
        assert!(out.contains("+ 2025-11-03  10:00-18:00  Store A"), "{out}");
    }

    #[test]
    fn test_large_plans_are_compact() {
        let shifts: Vec<_> = (1..=7).map(|d| shift(d, "Store A")).collect();
        let plan = SyncPlan::compute(&shifts, &[], Utc::now());

        let out = plain(&render_plan(&plan, chrono_tz::Asia::Tokyo, false));
        assert!(out.contains("(7 new shifts)"), "{out}");

        let verbose = plain(&render_plan(&plan, chrono_tz::Asia::Tokyo, true));
        assert_eq!(verbose.lines().count(), 7);
    }

    #[test]
    fn test_deletes_render_in_local_time() {
        let event = RemoteEvent::from_shift(&shift(3, "Store A"), "mem://1", None);
        let diff = ShiftDiff::get_diff(Some(event), None).unwrap();
        assert_eq!(plain(&render_diff(&diff, chrono_tz::Asia::Tokyo)), "- 2025-11-03  10:00-18:00  Store A");
    }
}
