use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

use habitdash_core::dates::DisplayRange;
use habitdash_core::heatmap::GridOrder;
use habitdash_core::insights::PerformanceRange;

/// Resolve a date argument relative to `today`. Accepts YYYY-MM-DD or
/// today/yesterday/tomorrow; `None` means today.
pub(crate) fn parse_date(date_str: Option<String>, today: NaiveDate) -> Result<NaiveDate> {
    match date_str {
        None => Ok(today),
        Some(s) => match s.as_str() {
            "today" => Ok(today),
            "yesterday" => Ok(today - Duration::days(1)),
            "tomorrow" => Ok(today + Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Split `NAME[:N]` into the food reference and a serving count (default 1).
pub(crate) fn parse_food_spec(s: &str) -> Result<(String, u32)> {
    let (name, count) = match s.rsplit_once(':') {
        Some((name, n)) => {
            let n: u32 = n
                .trim()
                .parse()
                .with_context(|| format!("Invalid serving count in '{s}'. Use NAME or NAME:N"))?;
            (name, n)
        }
        None => (s, 1),
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Food name must not be empty in '{s}'");
    }
    if count == 0 {
        bail!("Serving count must be at least 1");
    }
    Ok((name.to_string(), count))
}

pub(crate) fn parse_display_range(s: Option<&str>) -> Result<Option<DisplayRange>> {
    s.map(|s| {
        DisplayRange::parse(s)
            .with_context(|| format!("Invalid range '{s}'. Use week, month, year or last365"))
    })
    .transpose()
}

pub(crate) fn parse_order(s: Option<&str>) -> Result<Option<GridOrder>> {
    s.map(|s| GridOrder::parse(s).with_context(|| format!("Invalid order '{s}'. Use asc or desc")))
        .transpose()
}

pub(crate) fn parse_performance_range(s: Option<&str>) -> Result<Option<PerformanceRange>> {
    s.map(|s| {
        PerformanceRange::parse(s)
            .with_context(|| format!("Invalid range '{s}'. Use weekly, last30 or calendar"))
    })
    .transpose()
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s
            .char_indices()
            .nth(max.saturating_sub(3))
            .map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

/// One character per heat level, lightest first.
pub(crate) fn heat_cell(level: u8) -> char {
    match level {
        0 => '·',
        1 => '░',
        2 => '▒',
        3 => '▓',
        _ => '█',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()
    }

    #[test]
    fn test_parse_date_none() {
        assert_eq!(parse_date(None, today()).unwrap(), today());
    }

    #[test]
    fn test_parse_date_keywords() {
        assert_eq!(parse_date(Some("today".to_string()), today()).unwrap(), today());
        assert_eq!(
            parse_date(Some("yesterday".to_string()), today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string()), today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string()), today()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string()), today()).is_err());
    }

    #[test]
    fn test_parse_food_spec() {
        assert_eq!(parse_food_spec("Egg").unwrap(), ("Egg".to_string(), 1));
        assert_eq!(parse_food_spec("Egg:3").unwrap(), ("Egg".to_string(), 3));
        assert_eq!(
            parse_food_spec("Whey Protein:2").unwrap(),
            ("Whey Protein".to_string(), 2)
        );
        assert_eq!(parse_food_spec("101").unwrap(), ("101".to_string(), 1));
    }

    #[test]
    fn test_parse_food_spec_invalid() {
        assert!(parse_food_spec("Egg:x").is_err());
        assert!(parse_food_spec("Egg:0").is_err());
        assert!(parse_food_spec(":2").is_err());
    }

    #[test]
    fn test_parse_ranges() {
        assert_eq!(
            parse_display_range(Some("month")).unwrap(),
            Some(DisplayRange::Month)
        );
        assert!(parse_display_range(None).unwrap().is_none());
        assert!(parse_display_range(Some("decade")).is_err());
        assert_eq!(parse_order(Some("desc")).unwrap(), Some(GridOrder::Desc));
        assert!(parse_order(Some("up")).is_err());
        assert_eq!(
            parse_performance_range(Some("calendar")).unwrap(),
            Some(PerformanceRange::Calendar)
        );
        assert!(parse_performance_range(Some("week")).is_err());
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("nope"), r#"{"error":"nope"}"#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("日清カップヌードル", 8), "日清カップ...");
    }

    #[test]
    fn test_truncate_tiny_width() {
        assert_eq!(truncate("hello", 2), "...");
        assert_eq!(truncate("hello", 0), "...");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(5.0), 5.0);
    }

    #[test]
    fn test_heat_cell() {
        assert_eq!(heat_cell(0), '·');
        assert_eq!(heat_cell(4), '█');
        assert_eq!(heat_cell(9), '█');
    }
}
