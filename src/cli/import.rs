//! Import command: ingest one order file or scan a whole import directory

use crate::import::{ingest, ImportReport, ImportWatcher};
use crate::models::PayloadValidator;
use crate::store::OrderStore;
use crate::{Context, OrderdConfig, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;

pub fn run(path: &Path) -> Result<()> {
    let config = OrderdConfig::load_default()?;
    let mut store = OrderStore::open(config.store_path())?;
    let validator = PayloadValidator::new();

    let report = if path.is_dir() {
        import_directory(&config, &mut store, &validator, path)?
    } else {
        import_file(&mut store, &validator, path)?
    };

    print_report(&report);
    Ok(())
}

fn import_directory(
    config: &OrderdConfig,
    store: &mut OrderStore,
    validator: &PayloadValidator,
    dir: &Path,
) -> Result<ImportReport> {
    let mut watcher = ImportWatcher::open(dir, &config.data_dir)?;
    let pending = watcher.pending_files()?;

    if pending.is_empty() {
        println!("{}", "No new order files to import.".yellow());
        return Ok(ImportReport::default());
    }

    let pb = ProgressBar::new(pending.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut total = ImportReport::default();
    for file in &pending {
        if let Some(name) = file.file_name().and_then(|n| n.to_str()) {
            pb.set_message(name.to_string());
        }
        match watcher.process_file(store, validator, file) {
            Ok(report) => total.merge(report),
            Err(e) => total.warnings.push(format!("{}: {:#}", file.display(), e)),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(total)
}

fn import_file(
    store: &mut OrderStore,
    validator: &PayloadValidator,
    path: &Path,
) -> Result<ImportReport> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    ingest::ingest_value(store, validator, &value)
}

fn print_report(report: &ImportReport) {
    println!(
        "{}",
        format!(
            "✓ {} order(s) created, {} already present, {} record(s) skipped",
            report.created, report.skipped_existing, report.skipped_malformed
        )
        .green()
    );
    for warning in &report.warnings {
        eprintln!("{}", format!("⚠ {}", warning).yellow());
    }
}
