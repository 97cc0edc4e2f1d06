//! Persisted view preferences. Each one lives under its own storage key as a
//! string; anything missing or malformed is replaced with the default and
//! written back.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::dates::{DEFAULT_WINDOW_DAYS, DisplayRange, parse_window_len};
use crate::heatmap::GridOrder;
use crate::insights::PerformanceRange;
use crate::models::{
    HABIT_ORDER, HABIT_RANGE, PERFORMANCE_RANGE, PROTEIN_ORDER, PROTEIN_RANGE, SCREEN_TIME_RANGE,
};
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub performance_range: PerformanceRange,
    pub protein_range: DisplayRange,
    pub habit_range: DisplayRange,
    pub protein_order: GridOrder,
    pub habit_order: GridOrder,
    pub screen_time_range: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            performance_range: PerformanceRange::default(),
            protein_range: DisplayRange::default(),
            habit_range: DisplayRange::default(),
            protein_order: GridOrder::default(),
            habit_order: GridOrder::default(),
            screen_time_range: DEFAULT_WINDOW_DAYS,
        }
    }
}

/// Read one string preference, normalizing through `parse`. The stored value
/// is rewritten whenever it is not already the normalized string.
fn load_one<T: Copy>(
    store: &impl KeyValueStore,
    key: &str,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
    render: impl Fn(T) -> String,
) -> Result<T> {
    let stored = store.get(key)?;
    let value = match &stored {
        Some(Value::String(s)) => parse(s).unwrap_or(default),
        _ => default,
    };
    let normalized = render(value);
    if stored.as_ref().and_then(Value::as_str) != Some(normalized.as_str()) {
        if stored.is_some() {
            warn!(key, value = ?stored, "resetting malformed preference");
        }
        store.set(key, &Value::String(normalized))?;
    }
    Ok(value)
}

impl Preferences {
    pub fn load(store: &impl KeyValueStore) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            performance_range: load_one(
                store,
                PERFORMANCE_RANGE,
                defaults.performance_range,
                PerformanceRange::parse,
                |v| v.as_str().to_string(),
            )?,
            protein_range: load_one(
                store,
                PROTEIN_RANGE,
                defaults.protein_range,
                DisplayRange::parse,
                |v| v.as_str().to_string(),
            )?,
            habit_range: load_one(
                store,
                HABIT_RANGE,
                defaults.habit_range,
                DisplayRange::parse,
                |v| v.as_str().to_string(),
            )?,
            protein_order: load_one(
                store,
                PROTEIN_ORDER,
                defaults.protein_order,
                GridOrder::parse,
                |v| v.as_str().to_string(),
            )?,
            habit_order: load_one(
                store,
                HABIT_ORDER,
                defaults.habit_order,
                GridOrder::parse,
                |v| v.as_str().to_string(),
            )?,
            screen_time_range: load_one(
                store,
                SCREEN_TIME_RANGE,
                defaults.screen_time_range,
                |s| Some(parse_window_len(s)),
                |v| v.to_string(),
            )?,
        })
    }

    pub fn save(&self, store: &impl KeyValueStore) -> Result<()> {
        let pairs = [
            (PERFORMANCE_RANGE, self.performance_range.as_str().to_string()),
            (PROTEIN_RANGE, self.protein_range.as_str().to_string()),
            (HABIT_RANGE, self.habit_range.as_str().to_string()),
            (PROTEIN_ORDER, self.protein_order.as_str().to_string()),
            (HABIT_ORDER, self.habit_order.as_str().to_string()),
            (SCREEN_TIME_RANGE, self.screen_time_range.to_string()),
        ];
        for (key, value) in pairs {
            store.set(key, &Value::String(value))?;
        }
        Ok(())
    }
}
