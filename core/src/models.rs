use std::collections::BTreeMap;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

// --- Storage keys ---

pub const PROTEIN_INTAKE: &str = "protein_intake";
pub const HABIT_HISTORY: &str = "habit_history";
pub const SCREENTIME_HISTORY: &str = "screentime_history";
pub const HABITS_LIST: &str = "habits_list";
pub const HIDDEN_HABITS: &str = "hidden_habits";
pub const HABIT_ICONS: &str = "habit_icons";
pub const DEFAULT_HABIT: &str = "default_habit";
pub const FOOD_LIST: &str = "food_list";
pub const WEEKLY_SNIPPETS: &str = "weekly_snippets";

pub const PERFORMANCE_RANGE: &str = "performance_range";
pub const PROTEIN_RANGE: &str = "protein_range";
pub const HABIT_RANGE: &str = "habit_range";
pub const PROTEIN_ORDER: &str = "protein_order";
pub const HABIT_ORDER: &str = "habit_order";
pub const SCREEN_TIME_RANGE: &str = "screen_time_range";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

// --- Log records ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: i64,
    pub name: String,
    pub protein_per_serving: f64,
}

/// A food selected for a day, with how many servings were eaten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodServing {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub protein_per_serving: f64,
    #[serde(default)]
    pub servings: u32,
}

impl FoodServing {
    #[must_use]
    pub fn protein(&self) -> f64 {
        self.protein_per_serving * f64::from(self.servings)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProteinEntry {
    pub date: String,
    #[serde(default)]
    pub protein_grams: f64,
    /// Keyed by food id rendered as a string.
    #[serde(default, deserialize_with = "deserialize_foods")]
    pub foods: BTreeMap<String, FoodServing>,
}

/// Servings saved without an `id` take it from their map key.
fn deserialize_foods<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, FoodServing>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut foods = BTreeMap::<String, FoodServing>::deserialize(deserializer)?;
    for (key, serving) in &mut foods {
        if serving.id == 0 {
            serving.id = key.parse().unwrap_or_default();
        }
    }
    Ok(foods)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitHistoryEntry {
    pub date: String,
    pub habit_name: String,
    #[serde(default, deserialize_with = "deserialize_performed")]
    pub performed: u8,
}

impl HabitHistoryEntry {
    #[must_use]
    pub fn is_performed(&self) -> bool {
        self.performed != 0
    }
}

/// Older backups carry `performed` as a boolean; anything truthy counts as done.
fn deserialize_performed<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let done = match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_or(!s.trim().is_empty(), |v| v != 0.0),
        _ => false,
    };
    Ok(u8::from(done))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenTimeEntry {
    pub date: String,
    #[serde(default)]
    pub total_minutes: i64,
}

impl ScreenTimeEntry {
    /// Split into `(hours, minutes)` for display.
    #[must_use]
    pub fn hours_minutes(&self) -> (i64, i64) {
        (self.total_minutes / 60, self.total_minutes % 60)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySnippet {
    pub week: String,
    #[serde(default)]
    pub content: String,
}

pub type HabitIcons = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HabitLists {
    pub habits: Vec<String>,
    pub hidden: Vec<String>,
}

impl HabitLists {
    /// Habits in list order, minus the hidden ones.
    #[must_use]
    pub fn visible(&self) -> Vec<String> {
        self.habits
            .iter()
            .filter(|h| !self.hidden.contains(h))
            .cloned()
            .collect()
    }

    /// Drop hidden names that are no longer in the habit list.
    /// Returns true when something was removed.
    pub fn prune_hidden(&mut self) -> bool {
        let before = self.hidden.len();
        let habits = &self.habits;
        self.hidden.retain(|h| habits.contains(h));
        self.hidden.len() != before
    }
}

/// In-memory copy of every log the insight engine reads.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub protein: Vec<ProteinEntry>,
    pub habit_history: Vec<HabitHistoryEntry>,
    pub screen_time: Vec<ScreenTimeEntry>,
    pub lists: HabitLists,
    pub icons: HabitIcons,
}

// --- Engine output types ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitInsight {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub completion_pct: u32,
    pub streak: u32,
    pub personal_best: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightSummary {
    pub range: String,
    pub label: String,
    pub day_count: usize,
    pub avg_protein: f64,
    pub avg_screen_minutes: f64,
    pub avg_screen_hours: f64,
    pub habits: Vec<HabitInsight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayHeat {
    pub date: String,
    pub rate: f64,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub start_date: String,
    pub end_date: String,
    pub avg_protein: f64,
    pub avg_screen_hours: f64,
    pub total_completions: u32,
    pub completion_rate: u32,
    pub habits_tracked: usize,
    pub active_habits: usize,
    pub best_streak: u32,
    pub daily: Vec<DayHeat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProteinDay {
    pub date: String,
    pub protein_grams: f64,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitDay {
    pub date: String,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenTimePoint {
    pub date: String,
    pub label: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodayHabit {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub keys_imported: usize,
    pub keys: Vec<String>,
}

// --- Date keys ---

#[must_use]
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[must_use]
pub fn parse_date_key(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

// --- Validation ---

pub fn validate_date(s: &str) -> Result<NaiveDate> {
    match parse_date_key(s) {
        Some(d) => Ok(d),
        None => bail!("Invalid date '{s}'. Must be YYYY-MM-DD"),
    }
}

pub fn validate_habit_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("Habit name must not be empty");
    }
    Ok(trimmed.to_string())
}

pub fn validate_food(name: &str, protein_per_serving: f64) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("Food name must not be empty");
    }
    if !protein_per_serving.is_finite() || protein_per_serving < 0.0 {
        bail!("protein_per_serving must be a non-negative number");
    }
    Ok(trimmed.to_string())
}

/// Validate a `YYYY-Www` week key and return `(year, week)`.
pub fn validate_week_key(key: &str) -> Result<(i32, u32)> {
    let Some((year, week)) = key.trim().split_once("-W") else {
        bail!("Invalid week '{key}'. Must be YYYY-Www (e.g. 2024-W05)");
    };
    let year: i32 = year
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid week year in '{key}'"))?;
    let week: u32 = week
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid week number in '{key}'"))?;
    if !(1..=53).contains(&week) {
        bail!("Week number must be between 1 and 53 (got {week})");
    }
    Ok((year, week))
}

// --- Habit icons ---

const ZERO_WIDTH_JOINER: char = '\u{200D}';

fn is_pictographic(c: char) -> bool {
    matches!(
        u32::from(c),
        0x00A9
            | 0x00AE
            | 0x203C
            | 0x2049
            | 0x2122
            | 0x2139
            | 0x2194..=0x21AA
            | 0x231A..=0x23FF
            | 0x25AA..=0x25FE
            | 0x2600..=0x27BF
            | 0x2934..=0x2935
            | 0x2B05..=0x2B55
            | 0x3030
            | 0x303D
            | 0x3297
            | 0x3299
            | 0x1F000..=0x1FAFF
    )
}

fn is_emoji_modifier(c: char) -> bool {
    matches!(
        u32::from(c),
        0xFE0E..=0xFE0F | 0x20E3 | 0x1F3FB..=0x1F3FF | 0xE0020..=0xE007F
    )
}

/// Return the leading emoji of `input` (including joiner sequences and
/// modifiers), or `None` when the first character is not pictographic.
#[must_use]
pub fn extract_single_emoji(input: &str) -> Option<String> {
    let mut chars = input.trim().chars().peekable();
    let first = chars.next()?;
    if !is_pictographic(first) {
        return None;
    }
    let mut grapheme = String::from(first);
    while let Some(&c) = chars.peek() {
        if is_emoji_modifier(c) {
            grapheme.push(c);
            chars.next();
        } else if c == ZERO_WIDTH_JOINER {
            grapheme.push(c);
            chars.next();
            if let Some(next) = chars.next() {
                grapheme.push(next);
            }
        } else {
            break;
        }
    }
    Some(grapheme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_habit_entry_performed_accepts_bool_and_number() {
        let e: HabitHistoryEntry = serde_json::from_str(
            r#"{"date":"2024-01-01","habit_name":"Water","performed":true}"#,
        )
        .unwrap();
        assert_eq!(e.performed, 1);

        let e: HabitHistoryEntry =
            serde_json::from_str(r#"{"date":"2024-01-01","habit_name":"Water","performed":0}"#)
                .unwrap();
        assert!(!e.is_performed());

        let e: HabitHistoryEntry =
            serde_json::from_str(r#"{"date":"2024-01-01","habit_name":"Water"}"#).unwrap();
        assert!(!e.is_performed());

        let e: HabitHistoryEntry =
            serde_json::from_str(r#"{"date":"2024-01-01","habit_name":"Water","performed":"0"}"#)
                .unwrap();
        assert!(!e.is_performed());
    }

    #[test]
    fn test_habit_entry_serializes_performed_as_number() {
        let e = HabitHistoryEntry {
            date: "2024-01-01".to_string(),
            habit_name: "Water".to_string(),
            performed: 1,
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["performed"], serde_json::json!(1));
    }

    #[test]
    fn test_protein_entry_food_without_id_uses_key() {
        let raw = r#"{"date":"2024-01-01","protein_grams":50,
            "foods":{"102":{"name":"Whey","protein_per_serving":25,"servings":2}}}"#;
        let entry: ProteinEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.foods["102"].id, 102);
        assert!((entry.foods["102"].protein() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_protein_entry_foods_keyed_by_id() {
        let raw = r#"{"date":"2024-01-01","protein_grams":37,
            "foods":{"101":{"id":101,"name":"Egg","protein_per_serving":6,"servings":2},
                     "102":{"id":102,"name":"Whey Protein","protein_per_serving":25,"servings":1}}}"#;
        let entry: ProteinEntry = serde_json::from_str(raw).unwrap();
        assert!((entry.protein_grams - 37.0).abs() < f64::EPSILON);
        assert_eq!(entry.foods.len(), 2);
        assert!((entry.foods["101"].protein() - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_time_hours_minutes() {
        let e = ScreenTimeEntry {
            date: "2024-01-01".to_string(),
            total_minutes: 135,
        };
        assert_eq!(e.hours_minutes(), (2, 15));
    }

    #[test]
    fn test_habit_lists_visible_and_prune() {
        let mut lists = HabitLists {
            habits: vec!["Water".into(), "Read".into(), "Run".into()],
            hidden: vec!["Read".into(), "Gone".into()],
        };
        assert!(lists.prune_hidden());
        assert_eq!(lists.hidden, vec!["Read".to_string()]);
        assert_eq!(lists.visible(), vec!["Water".to_string(), "Run".to_string()]);
        assert!(!lists.prune_hidden());
    }

    #[test]
    fn test_validate_date() {
        assert_eq!(
            validate_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(validate_date("2023-02-29").is_err());
        assert!(validate_date("yesterday").is_err());
    }

    #[test]
    fn test_validate_habit_name() {
        assert_eq!(validate_habit_name("  Water ").unwrap(), "Water");
        assert!(validate_habit_name("   ").is_err());
    }

    #[test]
    fn test_validate_food() {
        assert_eq!(validate_food(" Tofu ", 8.0).unwrap(), "Tofu");
        assert!(validate_food("", 8.0).is_err());
        assert!(validate_food("Tofu", -1.0).is_err());
        assert!(validate_food("Tofu", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_week_key() {
        assert_eq!(validate_week_key("2024-W05").unwrap(), (2024, 5));
        assert!(validate_week_key("2024-05").is_err());
        assert!(validate_week_key("2024-W00").is_err());
        assert!(validate_week_key("2024-W54").is_err());
    }

    #[test]
    fn test_extract_single_emoji() {
        assert_eq!(extract_single_emoji("💧").as_deref(), Some("💧"));
        assert_eq!(extract_single_emoji("💧💧").as_deref(), Some("💧"));
        assert_eq!(extract_single_emoji("🏋️ gym").as_deref(), Some("🏋️"));
        assert_eq!(extract_single_emoji("🧘‍♂️").as_deref(), Some("🧘‍♂️"));
        assert_eq!(extract_single_emoji("🧑‍💻").as_deref(), Some("🧑‍💻"));
        assert!(extract_single_emoji("abc").is_none());
        assert!(extract_single_emoji("").is_none());
    }
}
