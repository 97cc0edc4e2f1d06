//! Date-keyed sequences for the protein graph, habit grids and the
//! screen-time chart.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::{DisplayRange, dates_for, short_label, trailing_days};
use crate::models::{
    HabitDay, HabitHistoryEntry, ProteinDay, ProteinEntry, ScreenTimeEntry, ScreenTimePoint,
    Snapshot, TodayHabit, date_key,
};

/// Display order of a heatmap grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridOrder {
    #[default]
    Asc,
    Desc,
}

impl GridOrder {
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    fn apply<T>(self, mut days: Vec<T>) -> Vec<T> {
        if self == Self::Desc {
            days.reverse();
        }
        days
    }
}

/// Protein heat level: 0 for nothing logged, then 50 g steps up to 4 at the
/// 150 g goal.
#[must_use]
pub fn protein_level(grams: f64) -> u8 {
    if grams <= 0.0 {
        0
    } else if grams < 50.0 {
        1
    } else if grams < 100.0 {
        2
    } else if grams < 150.0 {
        3
    } else {
        4
    }
}

#[must_use]
pub fn protein_days(
    entries: &[ProteinEntry],
    range: DisplayRange,
    order: GridOrder,
    today: NaiveDate,
) -> Vec<ProteinDay> {
    let by_date: HashMap<&str, f64> = entries
        .iter()
        .map(|e| (e.date.as_str(), e.protein_grams))
        .collect();
    let days = dates_for(range, today)
        .into_iter()
        .map(|date| {
            let key = date_key(date);
            let grams = by_date.get(key.as_str()).copied().unwrap_or(0.0);
            ProteinDay {
                date: key,
                protein_grams: grams,
                level: protein_level(grams),
            }
        })
        .collect();
    order.apply(days)
}

fn performed_keys<'a>(history: &'a [HabitHistoryEntry], habit: &str) -> HashSet<&'a str> {
    history
        .iter()
        .filter(|e| e.habit_name == habit && e.is_performed())
        .map(|e| e.date.as_str())
        .collect()
}

#[must_use]
pub fn habit_days(
    history: &[HabitHistoryEntry],
    habit: &str,
    range: DisplayRange,
    order: GridOrder,
    today: NaiveDate,
) -> Vec<HabitDay> {
    let done = performed_keys(history, habit);
    let days = dates_for(range, today)
        .into_iter()
        .map(|date| {
            let key = date_key(date);
            HabitDay {
                done: done.contains(key.as_str()),
                date: key,
            }
        })
        .collect();
    order.apply(days)
}

/// `days` points ending at `anchor`, in hours. Missing days are zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn screen_time_series(
    entries: &[ScreenTimeEntry],
    anchor: NaiveDate,
    days: u32,
) -> Vec<ScreenTimePoint> {
    let by_date: HashMap<&str, i64> = entries
        .iter()
        .map(|e| (e.date.as_str(), e.total_minutes))
        .collect();
    trailing_days(anchor, days)
        .into_iter()
        .map(|date| {
            let key = date_key(date);
            let minutes = by_date.get(key.as_str()).copied().unwrap_or(0);
            ScreenTimePoint {
                label: short_label(date),
                hours: minutes as f64 / 60.0,
                date: key,
            }
        })
        .collect()
}

/// Visible habits with their done flag for one date.
#[must_use]
pub fn today_habits(snapshot: &Snapshot, date: NaiveDate) -> Vec<TodayHabit> {
    let key = date_key(date);
    let done: HashSet<&str> = snapshot
        .habit_history
        .iter()
        .filter(|e| e.date == key && e.is_performed())
        .map(|e| e.habit_name.as_str())
        .collect();
    snapshot
        .lists
        .visible()
        .into_iter()
        .map(|name| TodayHabit {
            icon: snapshot.icons.get(&name).cloned(),
            done: done.contains(name.as_str()),
            name,
        })
        .collect()
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

    fn habit(date: &str, name: &str, performed: u8) -> HabitHistoryEntry {
        HabitHistoryEntry {
            date: date.to_string(),
            habit_name: name.to_string(),
            performed,
        }
    }

    #[test]
    fn test_protein_level_boundaries() {
        assert_eq!(protein_level(0.0), 0);
        assert_eq!(protein_level(1.0), 1);
        assert_eq!(protein_level(49.9), 1);
        assert_eq!(protein_level(50.0), 2);
        assert_eq!(protein_level(100.0), 3);
        assert_eq!(protein_level(149.0), 3);
        assert_eq!(protein_level(150.0), 4);
        assert_eq!(protein_level(400.0), 4);
    }

    #[test]
    fn test_protein_days_week() {
        let entries = vec![protein("2024-01-05", 120.0), protein("2024-01-06", 30.0)];
        let days = protein_days(&entries, DisplayRange::Week, GridOrder::Asc, d(2024, 1, 6));
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, "2023-12-31");
        assert_eq!(days[0].level, 0);
        assert_eq!(days[5].level, 3);
        assert_eq!(days[6].level, 1);
    }

    #[test]
    fn test_desc_order_reverses() {
        let days = protein_days(&[], DisplayRange::Week, GridOrder::Desc, d(2024, 1, 6));
        assert_eq!(days[0].date, "2024-01-06");
        assert_eq!(days[6].date, "2023-12-31");
    }

    #[test]
    fn test_habit_days_respects_performed_flag() {
        let history = vec![
            habit("2024-01-05", "Water", 1),
            habit("2024-01-06", "Water", 0),
            habit("2024-01-04", "Run", 1),
        ];
        let days = habit_days(
            &history,
            "Water",
            DisplayRange::Month,
            GridOrder::Asc,
            d(2024, 1, 6),
        );
        assert_eq!(days.len(), 6);
        let done: Vec<bool> = days.iter().map(|x| x.done).collect();
        assert_eq!(done, vec![false, false, false, false, true, false]);
    }

    #[test]
    fn test_screen_time_series_in_hours() {
        let entries = vec![ScreenTimeEntry {
            date: "2024-01-07".to_string(),
            total_minutes: 90,
        }];
        let points = screen_time_series(&entries, d(2024, 1, 7), 7);
        assert_eq!(points.len(), 7);
        assert_eq!(points[0].label, "1/1");
        assert!((points[6].hours - 1.5).abs() < f64::EPSILON);
        assert!((points[0].hours - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_today_habits() {
        let mut icons = std::collections::BTreeMap::new();
        icons.insert("Run".to_string(), "🏃".to_string());
        let snapshot = Snapshot {
            habit_history: vec![
                habit("2024-01-06", "Run", 1),
                habit("2024-01-05", "Water", 1),
            ],
            lists: HabitLists {
                habits: vec!["Water".into(), "Run".into(), "Nap".into()],
                hidden: vec!["Nap".into()],
            },
            icons,
            ..Snapshot::default()
        };
        let list = today_habits(&snapshot, d(2024, 1, 6));
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "Water");
        assert!(!list[0].done);
        assert!(list[1].done);
        assert_eq!(list[1].icon.as_deref(), Some("🏃"));
    }
}
