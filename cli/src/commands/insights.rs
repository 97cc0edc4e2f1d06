use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use habitdash_core::service::HabitService;

use super::helpers::{heat_cell, no_neg_zero, parse_performance_range, print_json, truncate};

const MONTHLY_GRID_COLUMNS: usize = 10;

pub(crate) fn cmd_insights(svc: &HabitService, range: Option<&str>, json: bool) -> Result<()> {
    let summary = svc.insights(parse_performance_range(range)?)?;

    if json {
        return print_json(&summary);
    }

    let days = summary.day_count;
    println!("=== {} ({days} days) ===\n", summary.label);
    println!(
        "  Avg protein:      {:.0}g",
        no_neg_zero(summary.avg_protein)
    );
    println!(
        "  Avg screen time:  {:.1}h",
        no_neg_zero(summary.avg_screen_hours)
    );

    if summary.habits.is_empty() {
        println!("\n  No visible habits");
        return Ok(());
    }

    #[derive(Tabled)]
    struct HabitRow {
        #[tabled(rename = "Habit")]
        name: String,
        #[tabled(rename = "Done")]
        completion: String,
        #[tabled(rename = "Streak")]
        streak: String,
        #[tabled(rename = "Best")]
        best: u32,
    }

    let rows: Vec<HabitRow> = summary
        .habits
        .iter()
        .map(|h| HabitRow {
            name: match &h.icon {
                Some(icon) => format!("{icon} {}", truncate(&h.name, 30)),
                None => truncate(&h.name, 30),
            },
            completion: format!("{}%", h.completion_pct),
            streak: if h.streak > 0 {
                format!("🔥{}", h.streak)
            } else {
                "-".to_string()
            },
            best: h.personal_best,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("\n{table}");
    Ok(())
}

pub(crate) fn cmd_monthly(svc: &HabitService, json: bool) -> Result<()> {
    let summary = svc.monthly_summary()?;

    if json {
        return print_json(&summary);
    }

    println!("=== Monthly Summary ===");
    println!("{} to {}\n", summary.start_date, summary.end_date);
    println!(
        "  Avg protein:        {:.0}g",
        no_neg_zero(summary.avg_protein)
    );
    println!(
        "  Avg screen time:    {:.1}h",
        no_neg_zero(summary.avg_screen_hours)
    );
    println!("  Habit completions:  {}", summary.total_completions);
    println!("  Completion rate:    {}%", summary.completion_rate);
    println!(
        "  Active habits:      {}/{}",
        summary.active_habits, summary.habits_tracked
    );
    println!("  Best streak:        {}\n", summary.best_streak);

    for row in summary.daily.chunks(MONTHLY_GRID_COLUMNS) {
        let cells: String = row
            .iter()
            .flat_map(|d| [heat_cell(d.level), ' '])
            .collect();
        println!("  {}", cells.trim_end());
    }
    Ok(())
}
