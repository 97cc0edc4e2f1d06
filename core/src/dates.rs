//! Calendar windows used by heatmaps, insights and charts.
//!
//! Every window is a list of local calendar dates in ascending order.

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::validate_week_key;

/// Length of the default heatmap window, counting today.
pub const LAST_365_DAYS: u32 = 366;
pub const DEFAULT_WINDOW_DAYS: u32 = 7;
/// Upper bound for numeric windows.
pub const MAX_WINDOW_DAYS: u32 = 366;

/// Named window for the protein and habit heatmaps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayRange {
    Week,
    Month,
    Year,
    #[default]
    Last365,
}

impl DisplayRange {
    pub const ALL: [DisplayRange; 4] = [Self::Week, Self::Month, Self::Year, Self::Last365];

    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            "last365" => Some(Self::Last365),
            _ => None,
        }
    }

    /// Like [`DisplayRange::parse`] but unknown keys fall back to `last365`.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        Self::parse(key).unwrap_or_default()
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::Last365 => "last365",
        }
    }
}

#[must_use]
pub fn dates_for(range: DisplayRange, today: NaiveDate) -> Vec<NaiveDate> {
    match range {
        DisplayRange::Week => trailing_days(today, 7),
        DisplayRange::Month => month_to_date(today),
        DisplayRange::Year => year_to_date(today),
        DisplayRange::Last365 => trailing_days(today, LAST_365_DAYS),
    }
}

/// The `days` calendar dates ending at `anchor`, inclusive.
#[must_use]
pub fn trailing_days(anchor: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days)
        .rev()
        .map(|i| anchor - Duration::days(i64::from(i)))
        .collect()
}

#[must_use]
pub fn month_to_date(today: NaiveDate) -> Vec<NaiveDate> {
    let start = today.with_day(1).unwrap_or(today);
    inclusive_span(start, today)
}

#[must_use]
pub fn year_to_date(today: NaiveDate) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
    inclusive_span(start, today)
}

fn inclusive_span(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Last day of the screen-time window for a `YYYY-Www` picker value:
/// Jan 1 of the year plus `(week - 1) * 7` days, advanced to the following
/// Sunday. A Sunday advances a full week.
pub fn week_anchor(week_key: &str) -> Result<NaiveDate> {
    let (year, week) = validate_week_key(week_key)?;
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| anyhow::anyhow!("Year {year} is out of range"))?;
    let start = jan1 + Duration::days(i64::from((week - 1) * 7));
    let to_sunday = 7 - i64::from(start.weekday().num_days_from_sunday());
    Ok(start + Duration::days(to_sunday))
}

/// Parse a stored screen-time window length. Anything unparseable or below 2
/// falls back to 7; values are capped at [`MAX_WINDOW_DAYS`].
#[must_use]
pub fn parse_window_len(raw: &str) -> u32 {
    match raw.trim().parse::<u32>() {
        Ok(n) if n >= 2 => n.min(MAX_WINDOW_DAYS),
        _ => DEFAULT_WINDOW_DAYS,
    }
}

/// Picker value for the week containing `today`: calendar year plus ISO week.
#[must_use]
pub fn current_week_key(today: NaiveDate) -> String {
    format!("{}-W{:02}", today.year(), today.iso_week().week())
}

/// Short `M/D` label for chart axes.
#[must_use]
pub fn short_label(date: NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_week_is_seven_ascending_days_ending_today() {
        for today in [d(2024, 1, 3), d(2024, 3, 1), d(2023, 12, 31)] {
            let dates = dates_for(DisplayRange::Week, today);
            assert_eq!(dates.len(), 7);
            assert_eq!(*dates.last().unwrap(), today);
            assert!(dates.windows(2).all(|w| w[1] - w[0] == Duration::days(1)));
        }
    }

    #[test]
    fn test_week_crosses_year_boundary() {
        let dates = dates_for(DisplayRange::Week, d(2024, 1, 3));
        assert_eq!(dates[0], d(2023, 12, 28));
    }

    #[test]
    fn test_month_starts_on_first_and_ends_today() {
        let today = d(2024, 2, 29);
        let dates = dates_for(DisplayRange::Month, today);
        assert_eq!(dates.len(), 29);
        assert_eq!(dates[0], d(2024, 2, 1));
        assert_eq!(*dates.last().unwrap(), today);
        assert!(dates.iter().all(|x| x.month() == 2));
    }

    #[test]
    fn test_month_on_the_first() {
        let dates = dates_for(DisplayRange::Month, d(2024, 5, 1));
        assert_eq!(dates, vec![d(2024, 5, 1)]);
    }

    #[test]
    fn test_year_to_date() {
        let dates = dates_for(DisplayRange::Year, d(2024, 3, 1));
        assert_eq!(dates.len(), 31 + 29 + 1);
        assert_eq!(dates[0], d(2024, 1, 1));
    }

    #[test]
    fn test_last365_spans_366_days() {
        let today = d(2024, 6, 15);
        let dates = dates_for(DisplayRange::Last365, today);
        assert_eq!(dates.len(), 366);
        assert_eq!(dates[0], d(2023, 6, 16));
        assert_eq!(*dates.last().unwrap(), today);
    }

    #[test]
    fn test_display_range_keys() {
        for range in DisplayRange::ALL {
            assert_eq!(DisplayRange::parse(range.as_str()), Some(range));
        }
        assert_eq!(DisplayRange::from_key("bogus"), DisplayRange::Last365);
    }

    #[test]
    fn test_trailing_days_zero() {
        assert!(trailing_days(d(2024, 1, 1), 0).is_empty());
    }

    #[test]
    fn test_week_anchor_advances_to_sunday() {
        // 2024-01-01 is a Monday -> following Sunday is 2024-01-07
        assert_eq!(week_anchor("2024-W01").unwrap(), d(2024, 1, 7));
        // 2024-01-29 (Monday) -> 2024-02-04
        assert_eq!(week_anchor("2024-W05").unwrap(), d(2024, 2, 4));
    }

    #[test]
    fn test_week_anchor_sunday_moves_a_full_week() {
        // 2023-01-01 is a Sunday
        assert_eq!(week_anchor("2023-W01").unwrap(), d(2023, 1, 8));
    }

    #[test]
    fn test_week_anchor_invalid() {
        assert!(week_anchor("2024-13").is_err());
        assert!(week_anchor("2024-W60").is_err());
    }

    #[test]
    fn test_parse_window_len() {
        assert_eq!(parse_window_len("14"), 14);
        assert_eq!(parse_window_len("1"), 7);
        assert_eq!(parse_window_len("abc"), 7);
        assert_eq!(parse_window_len(""), 7);
        assert_eq!(parse_window_len("5000"), MAX_WINDOW_DAYS);
    }

    #[test]
    fn test_current_week_key() {
        assert_eq!(current_week_key(d(2024, 2, 1)), "2024-W05");
        // ISO week 1 of 2025 starts 2024-12-30; the calendar year is kept
        assert_eq!(current_week_key(d(2024, 12, 31)), "2024-W01");
    }

    #[test]
    fn test_short_label() {
        assert_eq!(short_label(d(2024, 3, 7)), "3/7");
    }
}
