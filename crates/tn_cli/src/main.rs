use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};

use tn_core::merge::NewsBatch;
use tn_core::{MergeConfig, NewsMerger};
use tn_storage::{migrate, JsonStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "Merge ticker news into the shared record store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Merge a batch of fetched articles into the record store
    Merge {
        /// Path to the record store JSON document
        #[arg(long)]
        store: PathBuf,
        /// Path to the batch file: a JSON object mapping ticker to articles
        #[arg(long)]
        batch: PathBuf,
        /// Drop articles older than this many days
        #[arg(long, default_value_t = 7)]
        keep_days: i64,
        /// Keep at most this many articles per ticker
        #[arg(long, default_value_t = 25)]
        max_articles: usize,
    },
    /// One-time backfill of the news fields on an older store
    Migrate {
        /// Path to the record store JSON document
        #[arg(long)]
        store: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Merge {
            store,
            batch,
            keep_days,
            max_articles,
        } => {
            let store = JsonStore::new(store);
            let batch: NewsBatch = serde_json::from_str(&fs::read_to_string(&batch)?)?;

            let mut records = store.load()?;
            let merger = NewsMerger::new(MergeConfig {
                keep_days,
                max_articles,
                ..MergeConfig::default()
            });
            let report = merger.merge_batch(&mut records, &batch, Utc::now());
            store.save(&records)?;

            info!("✅ news merged for {} tickers", report.processed);
            if !report.skipped.is_empty() {
                warn!(
                    "⚠️ skipped {} tickers with no record: {}",
                    report.skipped.len(),
                    report.skipped.join(", ")
                );
            }
        }
        Commands::Migrate { store } => {
            let store = JsonStore::new(store);
            let report = migrate::add_news_fields(&store, Utc::now())?;
            info!(
                "✅ migration done, added {} fields across {} records",
                report.fields_added, report.records
            );
        }
    }

    Ok(())
}
