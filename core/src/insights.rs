//! Windowed averages and per-habit completion for the performance panel.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::{month_to_date, trailing_days};
use crate::models::{
    HabitHistoryEntry, HabitInsight, InsightSummary, ProteinEntry, ScreenTimeEntry, Snapshot,
    date_key,
};
use crate::streak::streak_stats;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceRange {
    #[default]
    Weekly,
    Last30,
    Calendar,
}

impl PerformanceRange {
    pub const ALL: [PerformanceRange; 3] = [Self::Weekly, Self::Last30, Self::Calendar];

    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "weekly" => Some(Self::Weekly),
            "last30" => Some(Self::Last30),
            "calendar" => Some(Self::Calendar),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Last30 => "last30",
            Self::Calendar => "calendar",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Weekly => "Weekly",
            Self::Last30 => "Last 30 Days",
            Self::Calendar => "Calendar",
        }
    }

    #[must_use]
    pub fn dates(self, today: NaiveDate) -> Vec<NaiveDate> {
        match self {
            Self::Weekly => trailing_days(today, 7),
            Self::Last30 => trailing_days(today, 30),
            Self::Calendar => month_to_date(today),
        }
    }
}

/// Date keys of a window, for membership checks against the string-dated logs.
pub(crate) fn key_set(dates: &[NaiveDate]) -> HashSet<String> {
    dates.iter().map(|d| date_key(*d)).collect()
}

pub(crate) fn protein_sum(entries: &[ProteinEntry], dates: &HashSet<String>) -> f64 {
    entries
        .iter()
        .filter(|e| dates.contains(&e.date))
        .fold(0.0, |acc, e| acc + e.protein_grams)
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn screen_minutes_sum(entries: &[ScreenTimeEntry], dates: &HashSet<String>) -> f64 {
    entries
        .iter()
        .filter(|e| dates.contains(&e.date))
        .fold(0.0, |acc, e| acc + e.total_minutes as f64)
}

/// Number of distinct days in `dates` on which `habit` was performed.
pub(crate) fn completions_in(
    history: &[HabitHistoryEntry],
    habit: &str,
    dates: &HashSet<String>,
) -> u32 {
    let days: HashSet<&str> = history
        .iter()
        .filter(|e| e.habit_name == habit && e.is_performed() && dates.contains(&e.date))
        .map(|e| e.date.as_str())
        .collect();
    u32::try_from(days.len()).unwrap_or(u32::MAX)
}

/// Summarize a window. Averages divide by the number of days in the window,
/// so days without an entry count as zero.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
pub fn summarize(snapshot: &Snapshot, range: PerformanceRange, today: NaiveDate) -> InsightSummary {
    let dates = range.dates(today);
    let day_count = dates.len().max(1);
    let keys = key_set(&dates);
    let days = day_count as f64;

    let avg_protein = protein_sum(&snapshot.protein, &keys) / days;
    let avg_screen_minutes = screen_minutes_sum(&snapshot.screen_time, &keys) / days;

    let habits = snapshot
        .lists
        .visible()
        .into_iter()
        .map(|name| {
            let done = completions_in(&snapshot.habit_history, &name, &keys);
            let stats = streak_stats(&snapshot.habit_history, &name, today);
            HabitInsight {
                icon: snapshot.icons.get(&name).cloned(),
                completion_pct: (100.0 * f64::from(done) / days).round() as u32,
                streak: stats.current,
                personal_best: stats.best,
                name,
            }
        })
        .collect();

    InsightSummary {
        range: range.as_str().to_string(),
        label: range.label().to_string(),
        day_count,
        avg_protein,
        avg_screen_minutes,
        avg_screen_hours: avg_screen_minutes / 60.0,
        habits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HabitLists;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn protein(date: &str, grams: f64) -> ProteinEntry {
        ProteinEntry {
            date: date.to_string(),
            protein_grams: grams,
            foods: std::collections::BTreeMap::new(),
        }
    }

    fn habit(date: &str, name: &str) -> HabitHistoryEntry {
        HabitHistoryEntry {
            date: date.to_string(),
            habit_name: name.to_string(),
            performed: 1,
        }
    }

    #[test]
    fn test_last30_protein_counts_missing_days_as_zero() {
        let snapshot = Snapshot {
            protein: vec![protein("2024-01-01", 50.0), protein("2024-01-02", 0.0)],
            ..Snapshot::default()
        };
        let summary = summarize(&snapshot, PerformanceRange::Last30, d(2024, 1, 2));
        assert_eq!(summary.day_count, 30);
        assert_eq!(summary.label, "Last 30 Days");
        assert!((summary.avg_protein - 50.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_entries_outside_window_are_ignored() {
        let snapshot = Snapshot {
            protein: vec![protein("2024-01-01", 70.0), protein("2024-01-10", 140.0)],
            screen_time: vec![
                ScreenTimeEntry {
                    date: "2024-01-10".to_string(),
                    total_minutes: 420,
                },
                ScreenTimeEntry {
                    date: "2023-12-01".to_string(),
                    total_minutes: 600,
                },
            ],
            ..Snapshot::default()
        };
        let summary = summarize(&snapshot, PerformanceRange::Weekly, d(2024, 1, 10));
        assert_eq!(summary.day_count, 7);
        assert!((summary.avg_protein - 20.0).abs() < 1e-9);
        assert!((summary.avg_screen_minutes - 60.0).abs() < 1e-9);
        assert!((summary.avg_screen_hours - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_calendar_uses_month_to_date() {
        let snapshot = Snapshot {
            protein: vec![protein("2024-03-01", 90.0), protein("2024-02-29", 500.0)],
            ..Snapshot::default()
        };
        let summary = summarize(&snapshot, PerformanceRange::Calendar, d(2024, 3, 3));
        assert_eq!(summary.day_count, 3);
        assert!((summary.avg_protein - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_calendar_on_first_of_month() {
        let summary = summarize(
            &Snapshot::default(),
            PerformanceRange::Calendar,
            d(2024, 4, 1),
        );
        assert_eq!(summary.day_count, 1);
        assert!((summary.avg_protein - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_per_habit_completion_streak_and_order() {
        let mut icons = std::collections::BTreeMap::new();
        icons.insert("Water".to_string(), "💧".to_string());
        let snapshot = Snapshot {
            habit_history: vec![
                habit("2024-01-04", "Water"),
                habit("2024-01-05", "Water"),
                habit("2024-01-06", "Water"),
                habit("2024-01-06", "Stretch"),
                habit("2024-01-06", "Secret"),
            ],
            lists: HabitLists {
                habits: vec!["Water".into(), "Secret".into(), "Stretch".into()],
                hidden: vec!["Secret".into()],
            },
            icons,
            ..Snapshot::default()
        };
        let summary = summarize(&snapshot, PerformanceRange::Weekly, d(2024, 1, 6));
        let names: Vec<&str> = summary.habits.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Water", "Stretch"]);

        let water = &summary.habits[0];
        // 3 of 7 days -> 42.86% -> 43
        assert_eq!(water.completion_pct, 43);
        assert_eq!(water.streak, 3);
        assert_eq!(water.personal_best, 3);
        assert_eq!(water.icon.as_deref(), Some("💧"));

        let stretch = &summary.habits[1];
        assert_eq!(stretch.completion_pct, 14);
        assert!(stretch.icon.is_none());
    }

    #[test]
    fn test_no_habits_no_data() {
        let summary = summarize(&Snapshot::default(), PerformanceRange::Weekly, d(2024, 1, 6));
        assert!(summary.habits.is_empty());
        assert!((summary.avg_protein - 0.0).abs() < f64::EPSILON);
        assert!((summary.avg_screen_minutes - 0.0).abs() < f64::EPSILON);
        assert!(summary.avg_protein.is_sign_positive());
        assert!(summary.avg_screen_hours.is_sign_positive());
    }

    #[test]
    fn test_range_keys() {
        for range in PerformanceRange::ALL {
            assert_eq!(PerformanceRange::parse(range.as_str()), Some(range));
        }
        assert!(PerformanceRange::parse("monthly").is_none());
    }
}
