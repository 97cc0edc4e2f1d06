//! Consecutive-day streaks for a single habit.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{HabitHistoryEntry, parse_date_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreakKind {
    #[serde(rename = "streak")]
    Current,
    #[serde(rename = "pb")]
    PersonalBest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreakStats {
    pub current: u32,
    pub best: u32,
}

/// Dates on which `habit` was performed, ascending, one per day.
///
/// Duplicate entries for the same day collapse here, so a repeated date can
/// never break a run. Unparseable dates are skipped.
#[must_use]
pub fn performed_dates(history: &[HabitHistoryEntry], habit: &str) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = history
        .iter()
        .filter(|e| e.habit_name == habit && e.is_performed())
        .filter_map(|e| parse_date_key(&e.date))
        .collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

/// Walk sorted dates once. The run resets to 1 whenever the gap to the
/// previous date is not exactly one day. The current streak only counts when
/// the latest date is today or yesterday.
#[must_use]
pub fn streak_stats_from_dates(dates: &[NaiveDate], today: NaiveDate) -> StreakStats {
    let Some(&latest) = dates.last() else {
        return StreakStats::default();
    };

    let mut best: u32 = 0;
    let mut run: u32 = 0;
    let mut last: Option<NaiveDate> = None;
    for &date in dates {
        run = match last {
            Some(prev) if (date - prev).num_days().abs() == 1 => run + 1,
            _ => 1,
        };
        best = best.max(run);
        last = Some(date);
    }

    let current = if latest == today || latest == today - Duration::days(1) {
        run
    } else {
        0
    };

    StreakStats { current, best }
}

#[must_use]
pub fn streak_stats(history: &[HabitHistoryEntry], habit: &str, today: NaiveDate) -> StreakStats {
    streak_stats_from_dates(&performed_dates(history, habit), today)
}

#[must_use]
pub fn streak(
    history: &[HabitHistoryEntry],
    habit: &str,
    kind: StreakKind,
    today: NaiveDate,
) -> u32 {
    let stats = streak_stats(history, habit, today);
    match kind {
        StreakKind::Current => stats.current,
        StreakKind::PersonalBest => stats.best,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn entry(date: &str, habit: &str, performed: u8) -> HabitHistoryEntry {
        HabitHistoryEntry {
            date: date.to_string(),
            habit_name: habit.to_string(),
            performed,
        }
    }

    fn water_history() -> Vec<HabitHistoryEntry> {
        [
            "2024-01-01",
            "2024-01-02",
            "2024-01-03",
            "2024-01-05",
            "2024-01-06",
        ]
        .iter()
        .map(|date| entry(date, "Water", 1))
        .collect()
    }

    #[test]
    fn test_empty_history_is_zero() {
        let today = d(2024, 1, 6);
        assert_eq!(streak(&[], "Water", StreakKind::Current, today), 0);
        assert_eq!(streak(&[], "Water", StreakKind::PersonalBest, today), 0);
    }

    #[test]
    fn test_water_scenario() {
        let history = water_history();
        let today = d(2024, 1, 6);
        assert_eq!(streak(&history, "Water", StreakKind::PersonalBest, today), 3);
        assert_eq!(streak(&history, "Water", StreakKind::Current, today), 2);
    }

    #[test]
    fn test_current_streak_from_yesterday() {
        let history = water_history();
        assert_eq!(
            streak(&history, "Water", StreakKind::Current, d(2024, 1, 7)),
            2
        );
    }

    #[test]
    fn test_broken_streak_reports_zero() {
        let history = water_history();
        let today = d(2024, 1, 8);
        assert_eq!(streak(&history, "Water", StreakKind::Current, today), 0);
        assert_eq!(streak(&history, "Water", StreakKind::PersonalBest, today), 3);
    }

    #[test]
    fn test_consecutive_dates_pb_equals_count() {
        let start = d(2023, 12, 20);
        for len in 1..=40_u32 {
            let history: Vec<_> = (0..len)
                .map(|i| {
                    let date = start + Duration::days(i64::from(i));
                    entry(&date.format("%Y-%m-%d").to_string(), "Read", 1)
                })
                .collect();
            let today = d(2030, 1, 1);
            assert_eq!(
                streak(&history, "Read", StreakKind::PersonalBest, today),
                len
            );
        }
    }

    #[test]
    fn test_unperformed_entries_are_ignored() {
        let mut history = water_history();
        history.push(entry("2024-01-04", "Water", 0));
        let today = d(2024, 1, 6);
        assert_eq!(streak(&history, "Water", StreakKind::PersonalBest, today), 3);
    }

    #[test]
    fn test_other_habits_are_ignored() {
        let mut history = water_history();
        history.push(entry("2024-01-04", "Run", 1));
        let stats = streak_stats(&history, "Water", d(2024, 1, 6));
        assert_eq!(stats, StreakStats { current: 2, best: 3 });
    }

    #[test]
    fn test_duplicate_dates_do_not_reset_run() {
        let mut history = water_history();
        history.push(entry("2024-01-02", "Water", 1));
        history.push(entry("2024-01-06", "Water", 1));
        let stats = streak_stats(&history, "Water", d(2024, 1, 6));
        assert_eq!(stats, StreakStats { current: 2, best: 3 });
    }

    #[test]
    fn test_unsorted_history() {
        let mut history = water_history();
        history.reverse();
        let stats = streak_stats(&history, "Water", d(2024, 1, 6));
        assert_eq!(stats, StreakStats { current: 2, best: 3 });
    }

    #[test]
    fn test_run_across_month_boundary() {
        let history = vec![
            entry("2024-02-28", "Run", 1),
            entry("2024-02-29", "Run", 1),
            entry("2024-03-01", "Run", 1),
        ];
        let stats = streak_stats(&history, "Run", d(2024, 3, 1));
        assert_eq!(stats, StreakStats { current: 3, best: 3 });
    }

    #[test]
    fn test_streak_kind_serde_keys() {
        assert_eq!(
            serde_json::to_value(StreakKind::PersonalBest).unwrap(),
            serde_json::json!("pb")
        );
        assert_eq!(
            serde_json::to_value(StreakKind::Current).unwrap(),
            serde_json::json!("streak")
        );
    }
}
