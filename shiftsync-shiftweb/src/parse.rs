//! Scraping of the monthly shift table.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use shiftsync_core::{MalformedRecord, ShiftRecord, SourceError, YearMonth};
use tracing::debug;

const OFF_MARKER: char = '●';

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Layout(format!("bad selector {css}: {e}")))
}

/// Year and month printed in the page heading (`2025年11月` or `2025-11`).
fn heading_month(text: &str) -> Option<YearMonth> {
    let patterns = [r"(\d{4})年(\d{1,2})月", r"(\d{4})-(\d{1,2})"];
    patterns.iter().find_map(|pattern| {
        let caps = Regex::new(pattern).ok()?.captures(text)?;
        YearMonth::new(caps[1].parse().ok()?, caps[2].parse().ok()?)
    })
}

/// `11/3(月)` → (11, 3). Anything after the first line or the weekday is ignored.
fn parse_day(text: &str) -> Option<(u32, u32)> {
    let line = text.lines().next()?.trim();
    let date = line.split(['(', '（']).next()?;
    let (month, day) = date.split_once('/')?;
    Some((month.trim().parse().ok()?, day.trim().parse().ok()?))
}

/// `●10:00-18:00` → (10:00, 18:00). `None` for days off.
fn parse_times(text: &str) -> Option<(NaiveTime, NaiveTime)> {
    let (_, times) = text.split_once(OFF_MARKER)?;
    let (start, end) = times.split_once('-')?;
    Some((
        NaiveTime::parse_from_str(start.trim(), "%H:%M").ok()?,
        NaiveTime::parse_from_str(end.trim(), "%H:%M").ok()?,
    ))
}

fn localize(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<FixedOffset>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.fixed_offset())
}

fn cell_text(row: &ElementRef, selector: &Selector) -> String {
    row.select(selector)
        .next()
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

struct Row {
    day: String,
    location: String,
    time: String,
}

impl Row {
    fn into_shift(self, page: YearMonth, tz: Tz, title: &str) -> Result<Option<ShiftRecord>, MalformedRecord> {
        if self.day.is_empty() || self.location.is_empty() {
            return Ok(None);
        }
        let Some((start_time, end_time)) = parse_times(&self.time) else {
            return Ok(None);
        };
        let (month, day) = parse_day(&self.day).ok_or_else(|| MalformedRecord::Unparseable(self.day.clone()))?;

        // The December page lists the first days of January.
        let year = if page.month() == 12 && month == 1 {
            page.year() + 1
        } else {
            page.year()
        };
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| MalformedRecord::Unparseable(self.day.clone()))?;

        let end_date = if end_time < start_time {
            date + Duration::days(1)
        } else {
            date
        };

        let start = localize(tz, date, start_time);
        let end = localize(tz, end_date, end_time);
        let (Some(start), Some(end)) = (start, end) else {
            return Err(MalformedRecord::Unparseable(format!("{} {}", self.day, self.time)));
        };

        ShiftRecord::new(title, start, end, self.location, None).map(Some)
    }
}

/// Shifts listed on one month page.
///
/// `requested` is only used when the heading carries no year. Days off and
/// rows that do not form a valid shift are skipped.
pub fn parse_shifts(html: &str, requested: YearMonth, tz: Tz, title: &str) -> Result<Vec<ShiftRecord>, SourceError> {
    let document = Html::parse_document(html);

    let heading = selector("h3.btn-block")?;
    let page = document
        .select(&heading)
        .next()
        .and_then(|h| heading_month(&h.text().collect::<String>()))
        .unwrap_or(requested);

    let table = selector("table#shiftTable")?;
    let Some(table) = document.select(&table).next() else {
        return Err(SourceError::Layout("shift table not found".to_string()));
    };

    let rows = selector("tr")?;
    let date_cell = selector("td.shiftDate")?;
    let location_cell = selector("td.shiftMisName")?;
    let time_cell = selector("td.shiftTime")?;

    let mut shifts = Vec::new();
    for tr in table.select(&rows).skip(1) {
        let row = Row {
            day: cell_text(&tr, &date_cell),
            location: cell_text(&tr, &location_cell),
            time: cell_text(&tr, &time_cell),
        };

        match row.into_shift(page, tz, title) {
            Ok(Some(shift)) => shifts.push(shift),
            Ok(None) => {}
            Err(e) => debug!(%page, "dropping row: {e}"),
        }
    }

    Ok(shifts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use chrono_tz::Asia::Tokyo;

    fn page(heading: &str, rows: &str) -> String {
        format!(
            r#"<html><body>
<h3 class="btn btn-block">{heading}</h3>
<table id="shiftTable">
  <tr><th>日付</th><th>店舗</th><th>時間</th></tr>
  {rows}
</table>
</body></html>"#
        )
    }

    fn row(date: &str, shop: &str, time: &str) -> String {
        format!(r#"<tr><td class="shiftDate">{date}</td><td class="shiftMisName">{shop}</td><td class="shiftTime">{time}</td></tr>"#)
    }

    fn nov() -> YearMonth {
        YearMonth::new(2025, 11).unwrap()
    }

    #[test]
    fn test_parses_rows_and_skips_days_off() {
        let html = page(
            "2025年11月",
            &[
                row("11/3(月)", "Store A", "●10:00-18:00"),
                row("11/4(火)", "Store A", "休み"),
                row("11/5(水)\n祝", "Store B", "● 09:30 - 13:00"),
            ]
            .concat(),
        );

        let shifts = parse_shifts(&html, nov(), Tokyo, "Shift").unwrap();

        assert_eq!(shifts.len(), 2);
        assert_eq!(shifts[0].location(), "Store A");
        assert_eq!(shifts[0].title(), "Shift");
        assert_eq!(shifts[0].start().to_rfc3339(), "2025-11-03T10:00:00+09:00");
        assert_eq!(shifts[0].end().to_rfc3339(), "2025-11-03T18:00:00+09:00");
        assert_eq!(shifts[1].location(), "Store B");
        assert_eq!(shifts[1].start().minute(), 30);
    }

    #[test]
    fn test_missing_table_is_layout_error() {
        let err = parse_shifts("<html><h3 class=\"btn-block\">2025年11月</h3></html>", nov(), Tokyo, "Shift")
            .unwrap_err();
        assert!(matches!(err, SourceError::Layout(_)));
    }

    #[test]
    fn test_overnight_and_zero_length() {
        let html = page(
            "2025-11",
            &[
                row("11/7(金)", "Bar", "●22:00-02:00"),
                row("11/8(土)", "Bar", "●10:00-10:00"),
            ]
            .concat(),
        );

        let shifts = parse_shifts(&html, nov(), Tokyo, "Shift").unwrap();

        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].end().to_rfc3339(), "2025-11-08T02:00:00+09:00");
    }

    #[test]
    fn test_january_rows_on_december_page_roll_over() {
        let html = page(
            "2025年12月",
            &[
                row("12/31(水)", "Store A", "●10:00-15:00"),
                row("1/1(木)", "Store A", "●10:00-15:00"),
            ]
            .concat(),
        );

        let shifts = parse_shifts(&html, YearMonth::new(2025, 12).unwrap(), Tokyo, "Shift").unwrap();

        assert_eq!(shifts[0].start().to_rfc3339(), "2025-12-31T10:00:00+09:00");
        assert_eq!(shifts[1].start().to_rfc3339(), "2026-01-01T10:00:00+09:00");
    }

    #[test]
    fn test_heading_without_year_uses_requested_month() {
        let html = page("シフト表", &row("11/3(月)", "Store A", "●10:00-18:00"));

        let shifts = parse_shifts(&html, nov(), Tokyo, "Shift").unwrap();
        assert_eq!(shifts[0].start().to_rfc3339(), "2025-11-03T10:00:00+09:00");
    }

    #[test]
    fn test_identity_is_stable_across_scrapes() {
        let html = page("2025年11月", &row("11/3(月)", "Store A", "●10:00-18:00"));

        let a = parse_shifts(&html, nov(), Tokyo, "Shift").unwrap();
        let b = parse_shifts(&html, nov(), Tokyo, "Other title").unwrap();
        assert_eq!(a[0].identity(), b[0].identity());
    }
}
