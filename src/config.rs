use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub output: OutputConfig,
    pub downloads: DownloadConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub url: String,
    pub headless: bool,
    pub chrome_path: Option<String>,
    pub user_agent: String,
    pub settle_delay_ms: u64,
    pub navigation_timeout_secs: u64,
    pub selectors: SelectorConfig,
}

/// CSS selectors used to pull products out of the listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub product: String,
    pub name: String,
    pub price: String,
    pub thumbnail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub base_dir: PathBuf,
    pub site_id_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub enabled: bool,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub sinks: Vec<LogSink>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Full,
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogSink {
    Console,
    File { path: PathBuf },
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            url: "https://scrapeme.live/shop/".to_string(),
            headless: true,
            chrome_path: None,
            user_agent: concat!("shopscrape/", env!("CARGO_PKG_VERSION")).to_string(),
            settle_delay_ms: 3000,
            navigation_timeout_secs: 30,
            selectors: SelectorConfig::default(),
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        // WooCommerce product grid
        Self {
            product: "li.product".to_string(),
            name: ".woocommerce-loop-product__title".to_string(),
            price: ".price".to_string(),
            thumbnail: "img".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            site_id_len: 10,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            request_timeout_secs: 30,
            user_agent: concat!("shopscrape/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
            sinks: vec![
                LogSink::File {
                    path: PathBuf::from("scraping.log"),
                },
                LogSink::Console,
            ],
        }
    }
}

impl AppConfig {
    /// Layered load: defaults, `config/` files, an explicit file, then
    /// `SHOPSCRAPE__*` environment variables. Not validated here, so that
    /// command-line overrides can still fix a bad layered value.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        // A missing .env is fine
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        // Missing keys fall back to the serde defaults
        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let s = builder
            // Add environment variables with prefix "SHOPSCRAPE__"
            .add_source(Environment::with_prefix("SHOPSCRAPE").prefix_separator("__").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // Add Chrome path from environment if not set
        if config.scraper.chrome_path.is_none() {
            config.scraper.chrome_path = env::var("CHROME_PATH").ok();
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate scraper configuration
        let url = Url::parse(&self.scraper.url)
            .map_err(|_| ConfigError::Message("Invalid scraper URL format".into()))?;
        if url.host_str().is_none() {
            return Err(ConfigError::Message("Scraper URL must have a host".into()));
        }

        let selectors = &self.scraper.selectors;
        for (field, value) in [
            ("product", &selectors.product),
            ("name", &selectors.name),
            ("price", &selectors.price),
            ("thumbnail", &selectors.thumbnail),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!("Selector '{}' must not be empty", field)));
            }
        }

        // Validate output configuration
        if self.output.site_id_len == 0 {
            return Err(ConfigError::Message("Output site_id_len must be greater than 0".into()));
        }

        // Validate download configuration
        if self.downloads.request_timeout_secs == 0 {
            return Err(ConfigError::Message("Download request_timeout_secs must be greater than 0".into()));
        }

        // Validate logging configuration
        if self.logging.sinks.is_empty() {
            return Err(ConfigError::Message("Logging needs at least one sink".into()));
        }

        for sink in &self.logging.sinks {
            if let LogSink::File { path } = sink {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::Message("Logging file sink path must not be empty".into()));
                }
            }
        }

        Ok(())
    }

    /// Effective configuration as TOML, embedded in the HTML report.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
