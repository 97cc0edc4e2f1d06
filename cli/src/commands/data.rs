use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::Value;

use habitdash_core::service::HabitService;

fn default_backup_path(svc: &HabitService) -> PathBuf {
    PathBuf::from(format!("backup-{}.json", svc.today().format("%Y-%m-%d")))
}

/// Write every stored key to a pretty-printed JSON file, or to stdout with `-`.
pub(crate) fn cmd_export(svc: &HabitService, output: Option<PathBuf>, json: bool) -> Result<()> {
    let data = svc.export_all()?;
    let body = serde_json::to_string_pretty(&data)?;

    if output.as_deref() == Some(Path::new("-")) {
        println!("{body}");
        return Ok(());
    }

    let path = output.unwrap_or_else(|| default_backup_path(svc));
    std::fs::write(&path, body)
        .with_context(|| format!("Failed to write backup: {}", path.display()))?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "path": path.display().to_string(), "keys": data.len() })
        );
    } else {
        println!("Exported {} keys to {}", data.len(), path.display());
    }
    Ok(())
}

pub(crate) fn cmd_import(svc: &HabitService, path: &Path, json: bool) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let data: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    let summary = svc.import_all(&data)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Import complete.\n");
        println!("  Keys imported: {}", summary.keys_imported);
        for key in &summary.keys {
            println!("    {key}");
        }
    }
    Ok(())
}

pub(crate) fn cmd_clear(svc: &HabitService, yes: bool, json: bool) -> Result<()> {
    if !yes {
        bail!("Refusing to clear all data without --yes");
    }
    svc.clear_all()?;

    if json {
        println!("{}", serde_json::json!({ "cleared": true }));
    } else {
        println!("All data cleared");
    }
    Ok(())
}
