use anyhow::{Context, Result};
use std::io::{self, Read};
use std::process;

use habitdash_core::dates::current_week_key;
use habitdash_core::service::HabitService;

use super::helpers::{json_error, print_json};

fn resolve_week(svc: &HabitService, week: Option<String>) -> String {
    week.unwrap_or_else(|| current_week_key(svc.today()))
}

pub(crate) fn cmd_snippet_show(svc: &HabitService, week: Option<String>, json: bool) -> Result<()> {
    let week = resolve_week(svc, week);
    let Some(snippet) = svc.snippet(&week)? else {
        if json {
            println!("{}", json_error(&format!("No snippet for {week}")));
        } else {
            eprintln!("No snippet for {week}");
        }
        process::exit(2);
    };

    if json {
        print_json(&snippet)?;
    } else {
        println!("=== {} ===\n", snippet.week);
        println!("{}", snippet.content);
    }
    Ok(())
}

/// Save a note for a week. Reads the note from stdin when no text is given.
pub(crate) fn cmd_snippet_save(
    svc: &HabitService,
    week: Option<String>,
    text: Option<String>,
    json: bool,
) -> Result<()> {
    let week = resolve_week(svc, week);
    let content = match text {
        Some(t) => t,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read snippet from stdin")?;
            buf
        }
    };

    let snippet = svc.save_snippet(&week, &content)?;

    if json {
        print_json(&snippet)?;
    } else {
        println!("Saved snippet for {}", snippet.week);
    }
    Ok(())
}
