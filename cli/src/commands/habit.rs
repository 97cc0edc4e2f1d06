use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use habitdash_core::service::HabitService;
use habitdash_core::streak::streak_stats;

use super::helpers::{
    heat_cell, json_error, parse_date, parse_display_range, parse_order, print_json, truncate,
};

fn label(name: &str, icon: Option<&String>) -> String {
    match icon {
        Some(icon) => format!("{icon} {name}"),
        None => name.to_string(),
    }
}

pub(crate) fn cmd_habit_create(svc: &HabitService, name: &str, json: bool) -> Result<()> {
    let name = svc.create_habit(name)?;
    if json {
        println!("{}", serde_json::json!({ "created": name }));
    } else {
        println!("Created habit {name}");
    }
    Ok(())
}

pub(crate) fn cmd_habit_delete(svc: &HabitService, name: &str, json: bool) -> Result<()> {
    let deleted = svc.delete_habit(name)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": deleted, "name": name }));
    } else if deleted {
        println!("Deleted habit {name} and its history");
    } else {
        eprintln!("No habit named {name}");
    }
    Ok(())
}

pub(crate) fn cmd_habit_hide(svc: &HabitService, name: &str, json: bool) -> Result<()> {
    svc.hide_habit(name)?;
    if json {
        println!("{}", serde_json::json!({ "hidden": name }));
    } else {
        println!("Hid {name} (history kept)");
    }
    Ok(())
}

pub(crate) fn cmd_habit_unhide(svc: &HabitService, name: &str, json: bool) -> Result<()> {
    let shown = svc.unhide_habit(name)?;
    if json {
        println!("{}", serde_json::json!({ "shown": shown, "name": name }));
    } else if shown {
        println!("Shown: {name}");
    } else {
        eprintln!("{name} is not hidden");
    }
    Ok(())
}

pub(crate) fn cmd_habit_icon(
    svc: &HabitService,
    name: &str,
    icon: Option<&str>,
    clear: bool,
    json: bool,
) -> Result<()> {
    if let Some(icon) = icon.filter(|_| !clear) {
        let icon = svc.set_icon(name, icon)?;
        if json {
            println!("{}", serde_json::json!({ "name": name, "icon": icon }));
        } else {
            println!("Set icon for {name}: {icon}");
        }
        return Ok(());
    }

    let cleared = svc.clear_icon(name)?;
    if json {
        println!("{}", serde_json::json!({ "cleared": cleared, "name": name }));
    } else if cleared {
        println!("Cleared icon for {name}");
    } else {
        eprintln!("{name} has no icon");
    }
    Ok(())
}

/// Set the default habit, or show it when no name is given.
pub(crate) fn cmd_habit_default(svc: &HabitService, name: Option<&str>, json: bool) -> Result<()> {
    if let Some(name) = name {
        svc.set_default_habit(name)?;
    }
    let default = svc.default_habit()?;
    let focused = svc.focused_habit(None)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "default": default, "focused": focused })
        );
    } else {
        match (&default, name) {
            (Some(d), Some(_)) => println!("Default habit set to {d}"),
            (Some(d), None) => println!("Default habit: {d}"),
            (None, _) => println!("No default habit set"),
        }
        if let Some(f) = focused.filter(|f| default.as_ref() != Some(f)) {
            println!("Showing first: {f}");
        }
    }
    Ok(())
}

pub(crate) fn cmd_habit_list(svc: &HabitService, json: bool) -> Result<()> {
    #[derive(Tabled, serde::Serialize)]
    struct HabitRow {
        #[tabled(rename = "Habit")]
        name: String,
        #[tabled(rename = "Icon")]
        icon: String,
        #[tabled(rename = "Hidden")]
        hidden: String,
        #[tabled(rename = "Streak")]
        streak: u32,
        #[tabled(rename = "Best")]
        best: u32,
    }

    let snapshot = svc.snapshot()?;
    let today = svc.today();
    let default = svc.default_habit()?;

    let rows: Vec<HabitRow> = snapshot
        .lists
        .habits
        .iter()
        .map(|h| {
            let stats = streak_stats(&snapshot.habit_history, h, today);
            let mut name = truncate(h, 30);
            if default.as_deref() == Some(h.as_str()) {
                name.push_str(" *");
            }
            HabitRow {
                name,
                icon: snapshot.icons.get(h).cloned().unwrap_or_default(),
                hidden: if snapshot.lists.hidden.contains(h) {
                    "yes".to_string()
                } else {
                    String::new()
                },
                streak: stats.current,
                best: stats.best,
            }
        })
        .collect();

    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        eprintln!("No habits yet. Use `habitdash habit create <name>` to add one.");
        return Ok(());
    }

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_habit_toggle(
    svc: &HabitService,
    name: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date, svc.today())?;
    let done = svc.toggle_habit_day(name, date)?;
    let date_str = date.format("%Y-%m-%d");

    if json {
        println!(
            "{}",
            serde_json::json!({ "name": name, "date": date_str.to_string(), "done": done })
        );
    } else if done {
        println!("✓ {name} done on {date_str}");
    } else {
        println!("✗ {name} not done on {date_str}");
    }
    Ok(())
}

pub(crate) fn cmd_habit_set(
    svc: &HabitService,
    name: &str,
    done: bool,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date, svc.today())?;
    svc.set_habit_day(name, date, done)?;
    let date_str = date.format("%Y-%m-%d");

    if json {
        println!(
            "{}",
            serde_json::json!({ "name": name, "date": date_str.to_string(), "done": done })
        );
    } else {
        let mark = if done { "✓" } else { "✗" };
        println!("{mark} {name} on {date_str}");
    }
    Ok(())
}

/// Done-grid for one habit, or the focused habit when no name is given.
pub(crate) fn cmd_habit_grid(
    svc: &HabitService,
    name: Option<&str>,
    range: Option<&str>,
    order: Option<&str>,
    json: bool,
) -> Result<()> {
    let name = match name {
        Some(n) => n.to_string(),
        None => {
            let Some(focused) = svc.focused_habit(None)? else {
                if json {
                    println!("{}", json_error("No visible habits"));
                } else {
                    eprintln!("No visible habits. Use `habitdash habit create <name>` to add one.");
                }
                process::exit(2);
            };
            focused
        }
    };

    let days = svc.habit_grid(&name, parse_display_range(range)?, parse_order(order)?)?;

    if json {
        return print_json(&serde_json::json!({ "name": name, "days": days }));
    }

    let icons = svc.icons()?;
    println!("{}\n", label(&name, icons.get(&name)));
    for week in days.chunks(7) {
        let cells: String = week
            .iter()
            .map(|d| heat_cell(if d.done { 3 } else { 0 }))
            .collect();
        println!("{}  {cells}", week[0].date);
    }
    Ok(())
}

pub(crate) fn cmd_habit_today(svc: &HabitService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date, svc.today())?;
    let habits = svc.today_habits(date)?;

    if json {
        return print_json(&habits);
    }
    if habits.is_empty() {
        eprintln!("No visible habits");
        process::exit(2);
    }

    println!("=== {} ===\n", date.format("%Y-%m-%d"));
    for h in &habits {
        let mark = if h.done { "✓" } else { " " };
        println!("  [{mark}] {}", label(&h.name, h.icon.as_ref()));
    }
    Ok(())
}
