use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use habitdash_core::models::ProteinEntry;
use habitdash_core::service::HabitService;
use habitdash_core::session::{PROTEIN_GOAL_GRAMS, Session};

use super::helpers::{
    heat_cell, json_error, no_neg_zero, parse_date, parse_display_range, parse_food_spec,
    parse_order, print_json, truncate,
};

fn print_foods_table(session: &Session) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Food")]
        name: String,
        #[tabled(rename = "Servings")]
        servings: u32,
        #[tabled(rename = "Protein/serving")]
        per_serving: String,
        #[tabled(rename = "Protein")]
        protein: String,
    }

    let rows: Vec<FoodRow> = session
        .selected_foods
        .values()
        .map(|f| FoodRow {
            id: f.id,
            name: truncate(&f.name, 30),
            servings: f.servings,
            per_serving: format!("{}g", no_neg_zero(f.protein_per_serving)),
            protein: format!("{}g", no_neg_zero(f.protein())),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

fn print_total(session: &Session) {
    let total = no_neg_zero(session.total_protein());
    let pct = session.goal_progress_pct();
    println!("Total: {total}g of {PROTEIN_GOAL_GRAMS}g goal ({pct:.0}%)");
}

/// Add (and optionally remove) servings for a day, then save the day's entry.
pub(crate) fn cmd_protein_log(
    svc: &HabitService,
    add: &[String],
    remove: &[String],
    replace: bool,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date, svc.today())?;
    let mut session = if replace {
        Session::default()
    } else {
        svc.load_session(date)?
    };

    for spec in add {
        let (name, count) = parse_food_spec(spec)?;
        let food = svc.find_food(&name)?;
        for _ in 0..count {
            session.add_serving(&food);
        }
    }
    for spec in remove {
        let (name, count) = parse_food_spec(spec)?;
        let food = svc.find_food(&name)?;
        for _ in 0..count {
            if !session.remove_serving(food.id) {
                eprintln!("{} is not logged for this day", food.name);
                break;
            }
        }
    }

    let entry = svc.save_protein(date, &session)?;

    if json {
        print_json(&entry)?;
    } else {
        println!("Saved {}g protein for {}", no_neg_zero(entry.protein_grams), entry.date);
        if !session.selected_foods.is_empty() {
            print_foods_table(&session);
        }
        print_total(&session);
    }

    Ok(())
}

pub(crate) fn cmd_protein_show(svc: &HabitService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date, svc.today())?;
    let entry: Option<ProteinEntry> = svc.protein_entry(date)?;

    let Some(entry) = entry else {
        let date_str = date.format("%Y-%m-%d");
        if json {
            println!("{}", json_error(&format!("No protein entry for {date_str}")));
        } else {
            eprintln!("No protein entry for {date_str}");
        }
        process::exit(2);
    };

    if json {
        return print_json(&entry);
    }

    let session = Session::from_entry(Some(&entry));
    println!("=== {} ===\n", entry.date);
    if !session.selected_foods.is_empty() {
        print_foods_table(&session);
    }
    print_total(&session);
    Ok(())
}

pub(crate) fn cmd_protein_graph(
    svc: &HabitService,
    range: Option<&str>,
    order: Option<&str>,
    json: bool,
) -> Result<()> {
    let days = svc.protein_heatmap(parse_display_range(range)?, parse_order(order)?)?;

    if json {
        return print_json(&days);
    }

    for week in days.chunks(7) {
        let cells: String = week.iter().map(|d| heat_cell(d.level)).collect();
        let first = &week[0].date;
        println!("{first}  {cells}");
    }
    println!("\n  · 0g  ░ <50g  ▒ <100g  ▓ <150g  █ 150g+");
    Ok(())
}
