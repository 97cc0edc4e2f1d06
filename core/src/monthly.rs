//! Trailing 30-day rollup that backs the shareable monthly card.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::dates::trailing_days;
use crate::insights::{completions_in, key_set, protein_sum, screen_minutes_sum};
use crate::models::{DayHeat, MonthlySummary, Snapshot, date_key};
use crate::streak::streak_stats;

pub const MONTHLY_WINDOW_DAYS: u32 = 30;

/// Bucket a day's completion fraction into a heat level 0..=3.
#[must_use]
pub fn heat_level(rate: f64) -> u8 {
    if rate <= 0.0 {
        0
    } else if rate < 0.34 {
        1
    } else if rate < 0.67 {
        2
    } else {
        3
    }
}

#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn build(snapshot: &Snapshot, today: NaiveDate) -> MonthlySummary {
    let dates = trailing_days(today, MONTHLY_WINDOW_DAYS);
    let keys = key_set(&dates);
    let days = f64::from(MONTHLY_WINDOW_DAYS);
    let visible = snapshot.lists.visible();

    let avg_protein = protein_sum(&snapshot.protein, &keys) / days;
    let avg_screen_hours =
        (screen_minutes_sum(&snapshot.screen_time, &keys) / (days * 60.0) * 10.0).round() / 10.0;

    let mut total_completions: u32 = 0;
    let mut active_habits = 0;
    let mut best_streak = 0;
    for habit in &visible {
        let done = completions_in(&snapshot.habit_history, habit, &keys);
        total_completions += done;
        if done > 0 {
            active_habits += 1;
        }
        best_streak = best_streak.max(streak_stats(&snapshot.habit_history, habit, today).best);
    }

    let possible = visible.len() as f64 * days;
    let completion_rate = if possible > 0.0 {
        (100.0 * f64::from(total_completions) / possible).round() as u32
    } else {
        0
    };

    let daily = dates
        .iter()
        .map(|date| {
            let key = date_key(*date);
            let done: HashSet<&str> = snapshot
                .habit_history
                .iter()
                .filter(|e| e.date == key && e.is_performed() && visible.contains(&e.habit_name))
                .map(|e| e.habit_name.as_str())
                .collect();
            let rate = if visible.is_empty() {
                0.0
            } else {
                done.len() as f64 / visible.len() as f64
            };
            DayHeat {
                date: key,
                rate,
                level: heat_level(rate),
            }
        })
        .collect();

    MonthlySummary {
        start_date: dates.first().map(|d| date_key(*d)).unwrap_or_default(),
        end_date: date_key(today),
        avg_protein,
        avg_screen_hours,
        total_completions,
        completion_rate,
        habits_tracked: visible.len(),
        active_habits,
        best_streak,
        daily,
    }
}
