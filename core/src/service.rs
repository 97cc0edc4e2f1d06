use std::path::Path;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::dates::{DisplayRange, parse_window_len, week_anchor};
use crate::heatmap::{self, GridOrder};
use crate::insights::{self, PerformanceRange};
use crate::models::{
    DEFAULT_HABIT, FOOD_LIST, FoodItem, HABIT_HISTORY, HABIT_ICONS, HABITS_LIST, HIDDEN_HABITS,
    HabitDay, HabitHistoryEntry, HabitIcons, HabitLists, ImportSummary, InsightSummary,
    MonthlySummary, PROTEIN_INTAKE, ProteinDay, ProteinEntry, SCREENTIME_HISTORY,
    ScreenTimeEntry, ScreenTimePoint, Snapshot, TodayHabit, WEEKLY_SNIPPETS, WeeklySnippet,
    date_key, extract_single_emoji, validate_food, validate_habit_name, validate_week_key,
};
use crate::monthly;
use crate::preferences::Preferences;
use crate::session::Session;
use crate::store::{
    KeyValueStore, RecordList, SqliteStore, read_list, read_map, read_string, str_field, write,
};

fn require_habit(lists: &HabitLists, name: &str) -> Result<String> {
    let name = validate_habit_name(name)?;
    if !lists.habits.contains(&name) {
        bail!("Habit '{name}' not found");
    }
    Ok(name)
}

fn default_foods() -> Vec<FoodItem> {
    vec![
        FoodItem {
            id: 101,
            name: "Egg".to_string(),
            protein_per_serving: 6.0,
        },
        FoodItem {
            id: 102,
            name: "Whey Protein".to_string(),
            protein_per_serving: 25.0,
        },
    ]
}

/// Storage orchestration around the pure insight engine: each operation
/// reads the logs it needs, computes, and writes back before returning.
pub struct HabitService<S = SqliteStore, C = SystemClock> {
    store: S,
    clock: C,
}

impl HabitService {
    pub fn new(db_path: &Path) -> Result<Self> {
        let store = SqliteStore::open(db_path)?;
        Ok(Self::with_parts(store, SystemClock))
    }

    pub fn new_in_memory() -> Result<Self> {
        let store = SqliteStore::open_in_memory()?;
        Ok(Self::with_parts(store, SystemClock))
    }
}

impl<S: KeyValueStore, C: Clock> HabitService<S, C> {
    pub fn with_parts(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // --- Logs ---

    fn protein_log(&self) -> Result<Vec<ProteinEntry>> {
        read_list(&self.store, PROTEIN_INTAKE)
    }

    fn habit_history(&self) -> Result<Vec<HabitHistoryEntry>> {
        read_list(&self.store, HABIT_HISTORY)
    }

    fn screen_time_log(&self) -> Result<Vec<ScreenTimeEntry>> {
        read_list(&self.store, SCREENTIME_HISTORY)
    }

    /// Habit list plus hidden set. Hidden names missing from the habit list
    /// are pruned and the cleaned set is written back.
    pub fn habit_lists(&self) -> Result<HabitLists> {
        let mut lists = HabitLists {
            habits: read_list(&self.store, HABITS_LIST)?,
            hidden: read_list(&self.store, HIDDEN_HABITS)?,
        };
        if lists.prune_hidden() {
            info!(hidden = ?lists.hidden, "pruned stale hidden habits");
            write(&self.store, HIDDEN_HABITS, &lists.hidden)?;
        }
        Ok(lists)
    }

    pub fn icons(&self) -> Result<HabitIcons> {
        read_map(&self.store, HABIT_ICONS)
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            protein: self.protein_log()?,
            habit_history: self.habit_history()?,
            screen_time: self.screen_time_log()?,
            lists: self.habit_lists()?,
            icons: self.icons()?,
        })
    }

    // --- Foods ---

    /// The stored food list, seeded with the built-in foods when empty.
    fn food_records(&self) -> Result<RecordList> {
        let mut records = RecordList::load(&self.store, FOOD_LIST)?;
        if records.is_empty() {
            for food in default_foods() {
                records.push(&food)?;
            }
            records.save(&self.store)?;
            debug!("seeded default foods");
        }
        Ok(records)
    }

    pub fn foods(&self) -> Result<Vec<FoodItem>> {
        Ok(self.food_records()?.decoded())
    }

    pub fn add_food(&self, name: &str, protein_per_serving: f64) -> Result<FoodItem> {
        let name = validate_food(name, protein_per_serving)?;
        let mut records = self.food_records()?;
        let foods: Vec<FoodItem> = records.decoded();
        let mut id = self.clock.timestamp_millis();
        while foods.iter().any(|f| f.id == id) {
            id += 1;
        }
        let food = FoodItem {
            id,
            name,
            protein_per_serving,
        };
        records.push(&food)?;
        records.save(&self.store)?;
        info!(id, name = %food.name, "added food");
        Ok(food)
    }

    pub fn delete_food(&self, id: i64) -> Result<bool> {
        let mut records = self.food_records()?;
        let removed = records.take_where(|v| v.get("id").and_then(Value::as_i64) == Some(id));
        if removed.is_empty() {
            return Ok(false);
        }
        records.save(&self.store)?;
        Ok(true)
    }

    pub fn search_foods(&self, query: &str) -> Result<Vec<FoodItem>> {
        let needle = query.trim().to_lowercase();
        Ok(self
            .foods()?
            .into_iter()
            .filter(|f| f.name.to_lowercase().contains(&needle))
            .collect())
    }

    /// Resolve a food by id, or by case-insensitive name.
    pub fn find_food(&self, query: &str) -> Result<FoodItem> {
        let foods = self.foods()?;
        let query = query.trim();
        let by_id = query
            .parse::<i64>()
            .ok()
            .and_then(|id| foods.iter().position(|f| f.id == id));
        let found = by_id.or_else(|| {
            foods
                .iter()
                .position(|f| f.name.eq_ignore_ascii_case(query))
        });
        match found.map(|i| foods[i].clone()) {
            Some(food) => Ok(food),
            None => bail!("Food '{query}' not found. Add it with: habitdash food add"),
        }
    }

    // --- Protein ---

    pub fn protein_entry(&self, date: NaiveDate) -> Result<Option<ProteinEntry>> {
        let key = date_key(date);
        Ok(self.protein_log()?.into_iter().find(|e| e.date == key))
    }

    pub fn load_session(&self, date: NaiveDate) -> Result<Session> {
        Ok(Session::from_entry(self.protein_entry(date)?.as_ref()))
    }

    /// Save the session's foods as the day's entry, replacing any earlier one.
    pub fn save_protein(&self, date: NaiveDate, session: &Session) -> Result<ProteinEntry> {
        let key = date_key(date);
        let entry = ProteinEntry {
            date: key.clone(),
            protein_grams: session.total_protein(),
            foods: session.selected_foods.clone(),
        };
        let mut log = RecordList::load(&self.store, PROTEIN_INTAKE)?;
        log.take_where(|v| str_field(v, "date") == Some(key.as_str()));
        log.push(&entry)?;
        log.save(&self.store)?;
        info!(date = %key, grams = entry.protein_grams, "saved protein");
        Ok(entry)
    }

    // --- Screen time ---

    pub fn save_screen_time(
        &self,
        date: NaiveDate,
        hours: u32,
        minutes: u32,
    ) -> Result<ScreenTimeEntry> {
        let key = date_key(date);
        let entry = ScreenTimeEntry {
            date: key.clone(),
            total_minutes: i64::from(hours) * 60 + i64::from(minutes),
        };
        let mut log = RecordList::load(&self.store, SCREENTIME_HISTORY)?;
        log.take_where(|v| str_field(v, "date") == Some(key.as_str()));
        log.push(&entry)?;
        log.save(&self.store)?;
        info!(date = %key, minutes = entry.total_minutes, "saved screen time");
        Ok(entry)
    }

    pub fn screen_time(&self, date: NaiveDate) -> Result<Option<ScreenTimeEntry>> {
        let key = date_key(date);
        Ok(self.screen_time_log()?.into_iter().find(|e| e.date == key))
    }

    // --- Habits ---

    pub fn create_habit(&self, name: &str) -> Result<String> {
        let name = validate_habit_name(name)?;
        let mut lists = self.habit_lists()?;
        if lists.habits.contains(&name) {
            bail!("Habit '{name}' already exists");
        }
        lists.habits.push(name.clone());
        write(&self.store, HABITS_LIST, &lists.habits)?;
        info!(habit = %name, "created habit");
        Ok(name)
    }

    /// Remove a habit with all of its history, its icon, and its default
    /// marker. Returns false when no such habit exists.
    pub fn delete_habit(&self, name: &str) -> Result<bool> {
        let name = validate_habit_name(name)?;
        let mut lists = self.habit_lists()?;
        if !lists.habits.contains(&name) {
            return Ok(false);
        }
        lists.habits.retain(|h| *h != name);
        lists.hidden.retain(|h| *h != name);
        write(&self.store, HABITS_LIST, &lists.habits)?;
        write(&self.store, HIDDEN_HABITS, &lists.hidden)?;

        let mut history = RecordList::load(&self.store, HABIT_HISTORY)?;
        let purged = history.take_where(|v| str_field(v, "habit_name") == Some(name.as_str()));
        history.save(&self.store)?;

        let mut icons = self.icons()?;
        if icons.remove(&name).is_some() {
            write(&self.store, HABIT_ICONS, &icons)?;
        }
        if self.default_habit()?.as_deref() == Some(name.as_str()) {
            write(&self.store, DEFAULT_HABIT, &Value::Null)?;
        }

        info!(habit = %name, purged = purged.len(), "deleted habit");
        Ok(true)
    }

    pub fn hide_habit(&self, name: &str) -> Result<()> {
        let mut lists = self.habit_lists()?;
        let name = require_habit(&lists, name)?;
        if !lists.hidden.contains(&name) {
            lists.hidden.push(name);
            write(&self.store, HIDDEN_HABITS, &lists.hidden)?;
        }
        Ok(())
    }

    pub fn unhide_habit(&self, name: &str) -> Result<bool> {
        let name = validate_habit_name(name)?;
        let mut lists = self.habit_lists()?;
        let before = lists.hidden.len();
        lists.hidden.retain(|h| *h != name);
        if lists.hidden.len() == before {
            return Ok(false);
        }
        write(&self.store, HIDDEN_HABITS, &lists.hidden)?;
        Ok(true)
    }

    /// Set a habit's icon to the leading emoji of `raw`.
    pub fn set_icon(&self, name: &str, raw: &str) -> Result<String> {
        let name = require_habit(&self.habit_lists()?, name)?;
        let Some(icon) = extract_single_emoji(raw) else {
            bail!("Icon must start with an emoji (got '{raw}')");
        };
        let mut icons = self.icons()?;
        icons.insert(name, icon.clone());
        write(&self.store, HABIT_ICONS, &icons)?;
        Ok(icon)
    }

    pub fn clear_icon(&self, name: &str) -> Result<bool> {
        let name = validate_habit_name(name)?;
        let mut icons = self.icons()?;
        if icons.remove(&name).is_none() {
            return Ok(false);
        }
        write(&self.store, HABIT_ICONS, &icons)?;
        Ok(true)
    }

    pub fn set_default_habit(&self, name: &str) -> Result<()> {
        let name = require_habit(&self.habit_lists()?, name)?;
        write(&self.store, DEFAULT_HABIT, &name)
    }

    pub fn default_habit(&self) -> Result<Option<String>> {
        read_string(&self.store, DEFAULT_HABIT)
    }

    /// The habit whose grid should be shown, given the one currently focused.
    pub fn focused_habit(&self, active: Option<&str>) -> Result<Option<String>> {
        let visible = self.habit_lists()?.visible();
        let default = self.default_habit()?;
        let mut session = Session {
            active_habit: active.map(ToString::to_string),
            ..Session::default()
        };
        Ok(session
            .focus_habit(&visible, default.as_deref())
            .map(ToString::to_string))
    }

    /// Replace every row for (habit, date) with a single row. Returns
    /// whether any of the replaced rows was performed.
    fn replace_habit_day(
        &self,
        name: &str,
        key: &str,
        done: impl FnOnce(bool) -> bool,
    ) -> Result<bool> {
        let mut history = RecordList::load(&self.store, HABIT_HISTORY)?;
        let previous = history.take_where(|v| {
            str_field(v, "habit_name") == Some(name) && str_field(v, "date") == Some(key)
        });
        let was_done = previous.into_iter().any(|v| {
            serde_json::from_value::<HabitHistoryEntry>(v).is_ok_and(|e| e.is_performed())
        });
        history.push(&HabitHistoryEntry {
            date: key.to_string(),
            habit_name: name.to_string(),
            performed: u8::from(done(was_done)),
        })?;
        history.save(&self.store)?;
        Ok(was_done)
    }

    /// Flip the done flag for a habit on a date. Returns the new state.
    pub fn toggle_habit_day(&self, name: &str, date: NaiveDate) -> Result<bool> {
        let name = require_habit(&self.habit_lists()?, name)?;
        let key = date_key(date);
        let done = !self.replace_habit_day(&name, &key, |was_done| !was_done)?;
        debug!(habit = %name, date = %key, done, "toggled habit day");
        Ok(done)
    }

    /// Set the done flag explicitly.
    pub fn set_habit_day(&self, name: &str, date: NaiveDate, done: bool) -> Result<()> {
        let name = require_habit(&self.habit_lists()?, name)?;
        self.replace_habit_day(&name, &date_key(date), |_| done)?;
        Ok(())
    }

    // --- Views ---

    pub fn preferences(&self) -> Result<Preferences> {
        Preferences::load(&self.store)
    }

    pub fn set_preferences(&self, prefs: &Preferences) -> Result<()> {
        prefs.save(&self.store)
    }

    /// Insight summary for `range`, or the stored range when `None`. An
    /// explicit range is remembered for next time.
    pub fn insights(&self, range: Option<PerformanceRange>) -> Result<InsightSummary> {
        let mut prefs = self.preferences()?;
        if let Some(range) = range {
            prefs.performance_range = range;
            prefs.save(&self.store)?;
        }
        let snapshot = self.snapshot()?;
        Ok(insights::summarize(
            &snapshot,
            prefs.performance_range,
            self.today(),
        ))
    }

    pub fn monthly_summary(&self) -> Result<MonthlySummary> {
        Ok(monthly::build(&self.snapshot()?, self.today()))
    }

    pub fn protein_heatmap(
        &self,
        range: Option<DisplayRange>,
        order: Option<GridOrder>,
    ) -> Result<Vec<ProteinDay>> {
        let mut prefs = self.preferences()?;
        if range.is_some() || order.is_some() {
            prefs.protein_range = range.unwrap_or(prefs.protein_range);
            prefs.protein_order = order.unwrap_or(prefs.protein_order);
            prefs.save(&self.store)?;
        }
        Ok(heatmap::protein_days(
            &self.protein_log()?,
            prefs.protein_range,
            prefs.protein_order,
            self.today(),
        ))
    }

    pub fn habit_grid(
        &self,
        name: &str,
        range: Option<DisplayRange>,
        order: Option<GridOrder>,
    ) -> Result<Vec<HabitDay>> {
        let name = require_habit(&self.habit_lists()?, name)?;
        let mut prefs = self.preferences()?;
        if range.is_some() || order.is_some() {
            prefs.habit_range = range.unwrap_or(prefs.habit_range);
            prefs.habit_order = order.unwrap_or(prefs.habit_order);
            prefs.save(&self.store)?;
        }
        Ok(heatmap::habit_days(
            &self.habit_history()?,
            &name,
            prefs.habit_range,
            prefs.habit_order,
            self.today(),
        ))
    }

    pub fn today_habits(&self, date: NaiveDate) -> Result<Vec<TodayHabit>> {
        Ok(heatmap::today_habits(&self.snapshot()?, date))
    }

    /// Screen-time series ending at the Sunday after `week` (or today).
    /// An explicit day count is remembered for next time.
    pub fn screen_time_chart(
        &self,
        days: Option<u32>,
        week: Option<&str>,
    ) -> Result<Vec<ScreenTimePoint>> {
        let mut prefs = self.preferences()?;
        if let Some(days) = days {
            prefs.screen_time_range = parse_window_len(&days.to_string());
            prefs.save(&self.store)?;
        }
        let anchor = match week {
            Some(week) => week_anchor(week)?,
            None => self.today(),
        };
        Ok(heatmap::screen_time_series(
            &self.screen_time_log()?,
            anchor,
            prefs.screen_time_range,
        ))
    }

    // --- Weekly snippets ---

    pub fn snippet(&self, week: &str) -> Result<Option<WeeklySnippet>> {
        validate_week_key(week)?;
        let week = week.trim();
        let snippets: Vec<WeeklySnippet> = read_list(&self.store, WEEKLY_SNIPPETS)?;
        Ok(snippets.into_iter().find(|s| s.week == week))
    }

    pub fn save_snippet(&self, week: &str, content: &str) -> Result<WeeklySnippet> {
        validate_week_key(week)?;
        let snippet = WeeklySnippet {
            week: week.trim().to_string(),
            content: content.to_string(),
        };
        let mut snippets = RecordList::load(&self.store, WEEKLY_SNIPPETS)?;
        snippets.take_where(|v| str_field(v, "week") == Some(snippet.week.as_str()));
        snippets.push(&snippet)?;
        snippets.save(&self.store)?;
        Ok(snippet)
    }

    // --- Export / Import ---

    /// Every stored key with its raw value.
    pub fn export_all(&self) -> Result<Map<String, Value>> {
        self.store.get_all()
    }

    /// Write every key of a backup object into the store as-is. Keys not in
    /// the backup are left untouched.
    pub fn import_all(&self, data: &Value) -> Result<ImportSummary> {
        let Some(object) = data.as_object() else {
            bail!("Backup must be a JSON object of storage keys");
        };
        for (key, value) in object {
            self.store.set(key, value)?;
        }
        let keys: Vec<String> = object.keys().cloned().collect();
        info!(count = keys.len(), "imported backup");
        Ok(ImportSummary {
            keys_imported: keys.len(),
            keys,
        })
    }

    pub fn clear_all(&self) -> Result<()> {
        self.store.clear()?;
        info!("cleared all data");
        Ok(())
    }
}
