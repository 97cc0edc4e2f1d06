use std::collections::BTreeMap;

use crate::models::{FoodItem, FoodServing, ProteinEntry};

pub const PROTEIN_GOAL_GRAMS: f64 = 150.0;

/// Foods picked for the day being edited, plus which habit grid is focused.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub selected_foods: BTreeMap<String, FoodServing>,
    pub active_habit: Option<String>,
}

impl Session {
    /// Restore a day's selections from its saved entry, if any.
    #[must_use]
    pub fn from_entry(entry: Option<&ProteinEntry>) -> Self {
        Self {
            selected_foods: entry.map(|e| e.foods.clone()).unwrap_or_default(),
            active_habit: None,
        }
    }

    pub fn add_serving(&mut self, food: &FoodItem) {
        self.selected_foods
            .entry(food.id.to_string())
            .and_modify(|s| s.servings += 1)
            .or_insert_with(|| FoodServing {
                id: food.id,
                name: food.name.clone(),
                protein_per_serving: food.protein_per_serving,
                servings: 1,
            });
    }

    /// Take one serving away; the food drops out when it reaches zero.
    /// Returns false when the food was not selected.
    pub fn remove_serving(&mut self, food_id: i64) -> bool {
        let key = food_id.to_string();
        let Some(serving) = self.selected_foods.get_mut(&key) else {
            return false;
        };
        if serving.servings > 1 {
            serving.servings -= 1;
        } else {
            self.selected_foods.remove(&key);
        }
        true
    }

    #[must_use]
    pub fn total_protein(&self) -> f64 {
        self.selected_foods
            .values()
            .fold(0.0, |acc, f| acc + f.protein())
    }

    #[must_use]
    pub fn goal_progress_pct(&self) -> f64 {
        (self.total_protein() / PROTEIN_GOAL_GRAMS * 100.0).min(100.0)
    }

    /// Pick the habit grid to show: the current one if still visible, else the
    /// default if visible, else the first visible habit.
    pub fn focus_habit(&mut self, visible: &[String], default: Option<&str>) -> Option<&str> {
        let keep = self
            .active_habit
            .as_ref()
            .is_some_and(|h| visible.contains(h));
        if !keep {
            self.active_habit = default
                .filter(|d| visible.iter().any(|v| v == d))
                .map(ToString::to_string)
                .or_else(|| visible.first().cloned());
        }
        self.active_habit.as_deref()
    }
}
