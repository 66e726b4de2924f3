mod db;
mod error;
mod fetch;
mod parser;
mod pipeline;
mod settings;
mod writer;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::settings::Settings;
use crate::fetch::PageFetcher;

#[derive(Parser)]
#[command(name = "drugbank_scraper", about = "DrugBank drug page scraper and loader")]
struct Cli {
    /// Config file (default: ./drugbank.{toml,ini,...} if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the drug and drug_bond tables
    InitDb,
    /// Download one drug page to <target_dir>/<id>.html
    Fetch {
        /// DrugBank drug id (e.g. DB00007)
        drug_id: String,
        target_dir: PathBuf,
    },
    /// Extract <source_dir>/<id>.html into <target_dir>/<id>.json
    Convert {
        drug_id: String,
        source_dir: PathBuf,
        target_dir: PathBuf,
    },
    /// Load <source_dir>/<id>.json into the database
    Load {
        drug_id: String,
        source_dir: PathBuf,
    },
    /// Fetch, extract and load every drug id listed in a file (one per line)
    Run { file: PathBuf },
    /// Show row counts
    Stats,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::InitDb => {
            let conn = db::connect(&settings.db_path)?;
            info!("Running CREATE TABLE commands on {}", settings.db_path.display());
            db::init_schema(&conn)?;
        }
        Commands::Fetch { drug_id, target_dir } => {
            let fetcher = PageFetcher::new(&settings)?;
            let path = fetcher.save_page(&drug_id, &target_dir)?;
            println!("Saved {}", path.display());
        }
        Commands::Convert {
            drug_id,
            source_dir,
            target_dir,
        } => {
            let path = writer::convert(&drug_id, &source_dir, &target_dir)?;
            println!("Saved {}", path.display());
        }
        Commands::Load { drug_id, source_dir } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let bonds = db::load_file(&conn, &drug_id, &source_dir)?;
            println!("Loaded {} ({} bonds)", drug_id, bonds);
        }
        Commands::Run { file } => {
            if !file.is_file() {
                bail!("Drug id list {:?} doesn't exist", file);
            }
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let fetcher = PageFetcher::new(&settings)?;
            let stats = pipeline::run_batch(&conn, &fetcher, &settings.data_dir, &file)?;
            println!(
                "Processed {} drugs ({} ok). {}",
                stats.total,
                stats.ok,
                stats.summary()
            );
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Drugs:        {}", s.drugs);
            for (kind, n) in &s.bonds {
                println!("{:<13} {}", format!("{}:", kind.name()), n);
            }
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    Ok(())
}
