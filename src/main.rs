use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use shopscrape::scraper::{BrowserSource, JsonFileSource, RecordSource};
use shopscrape::{logging, AppConfig, Pipeline};

/// Scrape a product listing into JSON, an HTML report and a folder of thumbnails.
#[derive(Debug, Parser)]
#[command(name = "shopscrape", version, about)]
struct Cli {
    /// Extra configuration file layered over config/*.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listing page to scrape
    #[arg(short, long)]
    url: Option<String>,

    /// Load products from a saved JSON file instead of the browser
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory the run folder is created in
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Skip thumbnail downloads
    #[arg(long)]
    no_images: bool,

    /// Show the browser window
    #[arg(long)]
    headful: bool,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(url) = &self.url {
            config.scraper.url = url.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.base_dir = dir.clone();
        }
        if self.no_images {
            config.downloads.enabled = false;
        }
        if self.headful {
            config.scraper.headless = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let log_guard = logging::init(&config.logging)?;
    info!("Starting shopscrape...");

    let run_source = config
        .to_toml()
        .unwrap_or_else(|e| format!("# configuration unavailable: {}", e));

    let source: Box<dyn RecordSource> = match &cli.input {
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => Box::new(BrowserSource::new(config.scraper.clone())),
    };

    let pipeline = Pipeline::new(config, run_source);
    match pipeline.run(source.as_ref(), chrono::Local::now()).await {
        Ok(summary) => {
            info!("Output written to {}", summary.context.output_dir.display());
            Ok(())
        }
        Err(e) => {
            error!("An error occurred: {}", e);
            // Flush the file sink before exiting
            drop(log_guard);
            std::process::exit(1);
        }
    }
}
