use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{error, info};

use crate::db;
use crate::fetch::PageSource;
use crate::parser;
use crate::writer;

/// Batch outcome; `errors` counts drug ids whose pipeline aborted.
pub struct BatchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

impl BatchStats {
    pub fn summary(&self) -> String {
        match self.errors {
            0 => "There were no errors.".to_string(),
            1 => "There was 1 error.".to_string(),
            n => format!("There were {} errors.", n),
        }
    }
}

/// Newline-separated drug ids; surrounding whitespace and blank lines ignored.
pub fn read_drug_ids(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

pub fn scrub_dir(data_dir: &Path, now: DateTime<Local>) -> PathBuf {
    data_dir.join(now.format("drugbank_scrub_%Y%m%d_%H%M%S").to_string())
}

/// Run fetch → extract → persist → load for every id in `list_file`, one at a
/// time. A failing id is logged and counted; the rest still run.
pub fn run_batch(
    conn: &Connection,
    source: &impl PageSource,
    data_dir: &Path,
    list_file: &Path,
) -> Result<BatchStats> {
    let target_dir = scrub_dir(data_dir, Local::now());
    writer::prepare_dir(&target_dir)?;

    let ids = read_drug_ids(list_file)?;
    info!(
        "Starting drugbank scraper ({} ids from {})",
        ids.len(),
        list_file.display()
    );

    let pb = ProgressBar::new(ids.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut stats = BatchStats {
        total: ids.len(),
        ok: 0,
        errors: 0,
    };

    for drug_id in &ids {
        pb.set_message(drug_id.clone());
        info!("Running ETL for drugbank drug id: {}", drug_id);
        match process_drug(conn, source, &target_dir, drug_id) {
            Ok(bonds) => {
                info!(drug_id = drug_id.as_str(), bonds, "loaded");
                stats.ok += 1;
            }
            Err(e) => {
                error!(drug_id = drug_id.as_str(), "{:#}", e);
                stats.errors += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Finished processing {}. {}",
        list_file.display(),
        stats.summary()
    );
    Ok(stats)
}

fn process_drug(
    conn: &Connection,
    source: &impl PageSource,
    target_dir: &Path,
    drug_id: &str,
) -> Result<usize> {
    let html = source.fetch(drug_id)?;
    let html_file = writer::html_path(target_dir, drug_id);
    fs::write(&html_file, &html).with_context(|| format!("Failed to write {:?}", html_file))?;

    let record = parser::process_page(&html)
        .with_context(|| format!("Couldn't extract drug page {}", drug_id))?;
    writer::persist(&record, &writer::json_path(target_dir, drug_id))?;

    db::load_file(conn, drug_id, target_dir)
}

// ── Tests ──
