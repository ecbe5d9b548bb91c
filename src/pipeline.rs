use chrono::{DateTime, TimeZone};
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::images::{DownloadReport, ImageDownloader};
use crate::layout;
use crate::models::RunContext;
use crate::report;
use crate::scraper::RecordSource;
use crate::utils::error::Result;

/// What a finished run produced. `None` marks a step that failed or was skipped.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub context: RunContext,
    pub record_count: usize,
    pub json_path: Option<PathBuf>,
    pub html_path: Option<PathBuf>,
    pub downloads: Option<DownloadReport>,
}

/// Sequences one scrape run: acquire, lay out, report, download.
pub struct Pipeline {
    config: AppConfig,
    run_source: String,
}

impl Pipeline {
    /// `run_source` is the text dumped verbatim into the HTML report.
    pub fn new(config: AppConfig, run_source: impl Into<String>) -> Self {
        Self {
            config,
            run_source: run_source.into(),
        }
    }

    /// Acquisition, context and layout failures end the run. Report and image
    /// failures are logged and the run carries on.
    pub async fn run<Tz>(&self, source: &dyn RecordSource, now: DateTime<Tz>) -> Result<RunSummary>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        info!("Acquiring records from {}", source.describe());
        let records = source.fetch().await?;
        if records.is_empty() {
            warn!("Source returned no products");
        }

        let context = RunContext::new(
            &self.config.scraper.url,
            &self.config.output.base_dir,
            self.config.output.site_id_len,
            now,
        )?;
        layout::initialize(&context).await?;

        let json_path = match report::write_json(&records, &context).await {
            Ok(path) => Some(path),
            Err(e) => {
                error!("Error saving JSON: {}", e);
                None
            }
        };

        let html_path = match report::write_html(&records, &context, &self.run_source).await {
            Ok(path) => Some(path),
            Err(e) => {
                error!("Error generating HTML: {}", e);
                None
            }
        };

        let downloads = if self.config.downloads.enabled {
            match ImageDownloader::new(&self.config.downloads) {
                Ok(downloader) => Some(downloader.download_all(&records, &context.images_dir).await),
                Err(e) => {
                    error!("Error creating HTTP client: {}", e);
                    None
                }
            }
        } else {
            info!("Image downloads disabled, skipping");
            None
        };

        info!(
            "Run {} finished with {} products",
            context.stem(),
            records.len()
        );

        Ok(RunSummary {
            context,
            record_count: records.len(),
            json_path,
            html_path,
            downloads,
        })
    }
}
