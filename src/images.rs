use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};
use url::Url;

use crate::config::DownloadConfig;
use crate::models::{Record, RecordSet};
use crate::utils::error::{AppError, Result};

/// Stand-in for every character that is not alphanumeric.
pub const PLACEHOLDER: char = '_';

/// Used when a thumbnail URL has no usable last path segment.
const FALLBACK_FILENAME: &str = "image";

/// Replaces every non-alphanumeric character with [`PLACEHOLDER`].
///
/// Uses Unicode's notion of alphanumeric, so `"Pokémon 1"` becomes
/// `"Pokémon_1"` and CJK names survive intact.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c } else { PLACEHOLDER })
        .collect()
}

/// Last path segment of `url`, without query string or fragment.
pub fn original_filename(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| AppError::network(url, format!("invalid URL: {}", e)))?;

    let segment = parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_FILENAME);

    Ok(segment.to_string())
}

/// `{sanitized name}_{original filename}`.
pub fn destination_filename(record: &Record) -> Result<String> {
    Ok(format!(
        "{}_{}",
        sanitize(&record.name),
        original_filename(&record.thumbnail)?
    ))
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadFailure {
    pub name: String,
    pub url: String,
    pub reason: String,
}

/// Outcome of one pass over a record set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadReport {
    pub attempted: usize,
    pub saved: Vec<PathBuf>,
    pub failures: Vec<DownloadFailure>,
}

impl DownloadReport {
    pub fn succeeded(&self) -> usize {
        self.saved.len()
    }
}

pub struct ImageDownloader {
    client: Client,
}

impl ImageDownloader {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    /// Streams one thumbnail into `images_dir`, overwriting any previous copy.
    ///
    /// Nothing is written unless the response is 2xx. A transfer that fails
    /// midway leaves no partial file behind.
    pub async fn download(&self, record: &Record, images_dir: &Path) -> Result<PathBuf> {
        let filename = destination_filename(record)?;
        let path = images_dir.join(&filename);
        let url = record.thumbnail.as_str();

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::network(url, format!("HTTP status {}", status)));
        }

        if let Err(e) = stream_to_file(response, &path, url).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }

        Ok(path)
    }

    /// Downloads every thumbnail in order, one at a time. A failure is
    /// logged and recorded, then the next record is tried.
    pub async fn download_all(&self, records: &RecordSet, images_dir: &Path) -> DownloadReport {
        let mut report = DownloadReport::default();

        for record in records {
            report.attempted += 1;

            match self.download(record, images_dir).await {
                Ok(path) => {
                    info!(
                        "Downloaded image: {} for product: {}",
                        path.file_name().unwrap_or_default().to_string_lossy(),
                        record.name
                    );
                    report.saved.push(path);
                }
                Err(e) => {
                    error!(
                        "Failed to download image: {} for product: {}: {}",
                        record.thumbnail, record.name, e
                    );
                    report.failures.push(DownloadFailure {
                        name: record.name.clone(),
                        url: record.thumbnail.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Image download finished: {} saved, {} failed",
            report.succeeded(),
            report.failures.len()
        );
        report
    }
}

async fn stream_to_file(mut response: reqwest::Response, path: &Path, url: &str) -> Result<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| AppError::storage(path, e))?;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| AppError::network(url, e))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::storage(path, e))?;
    }

    file.flush().await.map_err(|e| AppError::storage(path, e))?;
    Ok(())
}
