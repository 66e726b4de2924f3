use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG: &str = "drugbank";
const ENV_PREFIX: &str = "DRUGBANK";

/// Runtime settings, handed explicitly to every stage that needs them.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Parent directory for batch scrub directories.
    pub data_dir: PathBuf,
    /// Drug page URL prefix; the drug id is appended.
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Settings {
    /// Defaults, then `path` (or an optional `drugbank.{toml,ini,...}` in the
    /// working directory), then `DRUGBANK_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG).required(false),
        };

        let settings = Config::builder()
            .set_default("db_path", "data/drugbank.sqlite")?
            .set_default("data_dir", "data")?
            .set_default("base_url", "https://go.drugbank.com/drugs/")?
            .set_default("user_agent", concat!("drugbank_scraper/", env!("CARGO_PKG_VERSION")))?
            .set_default("timeout_secs", 30_i64)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}

// ── Tests ──
