use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::info;

use crate::parser::{self, record::DrugRecord};

pub fn html_path(dir: &Path, drug_id: &str) -> PathBuf {
    dir.join(format!("{}.html", drug_id))
}

pub fn json_path(dir: &Path, drug_id: &str) -> PathBuf {
    dir.join(format!("{}.json", drug_id))
}

/// Create `dir` if needed; fail if the path exists but is not a directory.
pub fn prepare_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        info!("Creating target directory at {}", dir.display());
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    } else if !dir.is_dir() {
        bail!("Target path {:?} already exists and is not a directory", dir);
    }
    Ok(())
}

/// Pretty JSON, four-space indent. Non-ASCII text is written as-is.
pub fn to_json(record: &DrugRecord) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    record.serialize(&mut ser)?;
    Ok(String::from_utf8(buf)?)
}

pub fn persist(record: &DrugRecord, path: &Path) -> Result<()> {
    info!("Saving JSON data to {}", path.display());
    fs::write(path, to_json(record)?).with_context(|| format!("Failed to write {:?}", path))
}

pub fn read_record(path: &Path) -> Result<DrugRecord> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&json).with_context(|| format!("Malformed drug document {:?}", path))
}

/// `<source_dir>/<id>.html` → `<target_dir>/<id>.json`. Nothing is written
/// when extraction fails.
pub fn convert(drug_id: &str, source_dir: &Path, target_dir: &Path) -> Result<PathBuf> {
    let source = html_path(source_dir, drug_id);
    if !source.is_file() {
        bail!("Source file {:?} doesn't exist", source);
    }
    prepare_dir(target_dir)?;

    info!("Extracting data from HTML file: {}", source.display());
    let html = fs::read_to_string(&source).with_context(|| format!("Failed to read {:?}", source))?;
    let record = parser::process_page(&html)
        .with_context(|| format!("Couldn't convert {:?} to JSON", source))?;

    let target = json_path(target_dir, drug_id);
    persist(&record, &target)?;
    Ok(target)
}

// ── Tests ──
