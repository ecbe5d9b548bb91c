use chrono::{DateTime, TimeZone};
use config::ConfigError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::utils::error::{AppError, Result};

/// Filesystem-safe run timestamp: no separators, no colons.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Everything derived once at the start of a run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunContext {
    pub site_id: String,
    pub timestamp: String,
    pub output_dir: PathBuf,
    pub images_dir: PathBuf,
}

impl RunContext {
    pub fn new<Tz>(
        source_url: &str,
        base_dir: &Path,
        site_id_len: usize,
        now: DateTime<Tz>,
    ) -> Result<Self>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let site_id = site_id(source_url, site_id_len)?;
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        Ok(Self::from_parts(site_id, timestamp, base_dir))
    }

    pub fn from_parts(site_id: impl Into<String>, timestamp: impl Into<String>, base_dir: &Path) -> Self {
        let site_id = site_id.into();
        let timestamp = timestamp.into();
        let output_dir = base_dir.join(format!("{}_{}", site_id, timestamp));
        let images_dir = output_dir.join("images");

        Self {
            site_id,
            timestamp,
            output_dir,
            images_dir,
        }
    }

    /// `{site_id}_{timestamp}`, shared by the folder and both report files.
    pub fn stem(&self) -> String {
        format!("{}_{}", self.site_id, self.timestamp)
    }

    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.json", self.stem()))
    }

    pub fn html_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.html", self.stem()))
    }
}

// The source URL comes from configuration
fn config_error(message: String) -> AppError {
    AppError::Config(ConfigError::Message(message))
}

/// Host of the source URL truncated to `max_len` characters.
pub fn site_id(source_url: &str, max_len: usize) -> Result<String> {
    let url = Url::parse(source_url)
        .map_err(|e| config_error(format!("Invalid source URL '{}': {}", source_url, e)))?;

    // Keep the port like a netloc would
    let host = url
        .host_str()
        .ok_or_else(|| config_error(format!("Source URL '{}' has no host", source_url)))?;
    let netloc = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    // ':' is not filesystem-safe everywhere
    Ok(netloc.chars().take(max_len).map(|c| if c == ':' { '_' } else { c }).collect())
}
