use anyhow::{Result, bail};
use std::process;

use habitdash_core::service::HabitService;

use super::helpers::{json_error, parse_date, print_json};

const BAR_WIDTH: f64 = 40.0;

pub(crate) fn cmd_screen_log(
    svc: &HabitService,
    hours: u32,
    minutes: u32,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    if hours > 24 || minutes > 59 {
        bail!("Screen time must be at most 24 hours and 59 minutes (got {hours}h {minutes}m)");
    }
    let date = parse_date(date, svc.today())?;
    let entry = svc.save_screen_time(date, hours, minutes)?;

    if json {
        print_json(&entry)?;
    } else {
        let (h, m) = entry.hours_minutes();
        println!("Logged {h}h {m}m screen time for {}", entry.date);
    }
    Ok(())
}

pub(crate) fn cmd_screen_show(svc: &HabitService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date, svc.today())?;
    let Some(entry) = svc.screen_time(date)? else {
        let date_str = date.format("%Y-%m-%d");
        if json {
            println!("{}", json_error(&format!("No screen time for {date_str}")));
        } else {
            eprintln!("No screen time for {date_str}");
        }
        process::exit(2);
    };

    if json {
        print_json(&entry)?;
    } else {
        let (h, m) = entry.hours_minutes();
        println!("{}: {h}h {m}m", entry.date);
    }
    Ok(())
}

/// Horizontal bar chart in hours, scaled to at least 5 hours.
#[allow(clippy::cast_sign_loss)]
pub(crate) fn cmd_screen_chart(
    svc: &HabitService,
    days: Option<u32>,
    week: Option<&str>,
    json: bool,
) -> Result<()> {
    let points = svc.screen_time_chart(days, week)?;

    if json {
        return print_json(&points);
    }

    let max = points.iter().map(|p| p.hours).fold(5.0_f64, f64::max);
    for p in &points {
        let width = (p.hours / max * BAR_WIDTH).round() as usize;
        println!("{:>5}  {:<40} {:.1}h", p.label, "█".repeat(width), p.hours);
    }
    Ok(())
}
