mod fetch;
mod output;
mod parser;
mod scrape;
mod settings;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use fetch::CategoryClient;
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "twitch_category_scraper",
    about = "Scrape live Twitch streams by category"
)]
struct Cli {
    /// Settings JSON file
    #[arg(long, default_value = "config/settings.example.json")]
    settings: PathBuf,
    /// Input file listing categories (overrides settings)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Output format (overrides settings)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
    /// Max streams per category (overrides settings)
    #[arg(long)]
    max_streams: Option<usize>,
    /// Output directory (overrides settings)
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = settings::load_settings(&cli.settings);
    if let Some(input) = cli.input {
        settings.input_file = input;
    }
    if let Some(dir) = cli.output_dir {
        settings.output_dir = dir;
    }
    if let Some(max) = cli.max_streams {
        settings.max_streams_per_category = max;
    }
    let format = cli
        .format
        .unwrap_or_else(|| output::format_or_json(&settings.output_format));

    let categories = settings::load_categories(&settings.input_file);
    if categories.is_empty() {
        error!("Aborting: no categories to scrape");
        return Ok(());
    }

    let Some(client) = build_client(&settings.http) else {
        return Ok(());
    };
    let records = scrape_all(&client, &categories, settings.max_streams_per_category).await;

    if let Some(path) = save_results(&records, &settings.output_dir, format)? {
        info!("Scraping completed. Dataset saved to {}", path.display());
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    Ok(())
}

/// A bad header or TLS setup ends the run quietly, like a batch with no results.
fn build_client(http: &settings::HttpSettings) -> Option<CategoryClient> {
    match CategoryClient::new(http) {
        Ok(client) => Some(client),
        Err(e) => {
            error!("Aborting: failed to build HTTP client: {}", e);
            None
        }
    }
}

/// Write the dataset, or nothing at all when no category produced records.
fn save_results(
    records: &[parser::streams::StreamRecord],
    output_dir: &Path,
    format: OutputFormat,
) -> anyhow::Result<Option<PathBuf>> {
    if records.is_empty() {
        warn!("No records scraped from any category. Nothing to save.");
        return Ok(None);
    }

    let path = output::save_dataset(records, output_dir, &output::timestamped_basename(), format)
        .context("Failed to save dataset")?;
    Ok(Some(path))
}

/// Scrape categories one at a time; a failed category contributes nothing.
async fn scrape_all(
    client: &CategoryClient,
    categories: &[String],
    max_streams: usize,
) -> Vec<parser::streams::StreamRecord> {
    let pb = ProgressBar::new(categories.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut all = Vec::new();
    for category in categories {
        pb.set_message(category.clone());
        match scrape::scrape_category(client, category, max_streams).await {
            Ok(records) => {
                pb.suspend(|| {
                    info!("Scraped {} streams for category '{}'", records.len(), category)
                });
                all.extend(records);
            }
            Err(e) => {
                pb.suspend(|| error!("Failed to scrape category '{}': {}", category, e));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    all
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
