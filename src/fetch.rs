use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::info;

use crate::settings::Settings;
use crate::writer;

/// Anything that can hand back the raw HTML of a drug page.
pub trait PageSource {
    fn fetch(&self, drug_id: &str) -> Result<String>;
}

pub struct PageFetcher {
    client: Client,
    base_url: String,
}

impl PageFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(PageFetcher {
            client,
            base_url: settings.base_url.clone(),
        })
    }

    pub fn page_url(&self, drug_id: &str) -> String {
        format!("{}{}", self.base_url, drug_id)
    }

    /// Download a page into `<target_dir>/<id>.html`.
    pub fn save_page(&self, drug_id: &str, target_dir: &Path) -> Result<PathBuf> {
        writer::prepare_dir(target_dir)?;
        let html = self.fetch(drug_id)?;
        let path = writer::html_path(target_dir, drug_id);
        info!("Writing HTML to file: {}", path.display());
        fs::write(&path, html).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(path)
    }
}

impl PageSource for PageFetcher {
    fn fetch(&self, drug_id: &str) -> Result<String> {
        let url = self.page_url(drug_id);
        info!("Downloading raw HTML from: {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("GET {} returned an error status", url))?;
        response
            .text()
            .with_context(|| format!("Failed to read body of {}", url))
    }
}

// ── Tests ──
