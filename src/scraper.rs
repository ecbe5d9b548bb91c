use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use scraper::{ElementRef, Html, Selector};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{ScraperConfig, SelectorConfig};
use crate::models::{Price, Record, RecordSet};
use crate::utils::error::{AppError, Result};

/// Anything that can hand the pipeline a batch of products.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Human-readable origin, used in log lines.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<RecordSet>;
}

/// Loads the listing in Chrome and extracts products with CSS selectors.
pub struct BrowserSource {
    config: ScraperConfig,
}

impl BrowserSource {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RecordSource for BrowserSource {
    fn describe(&self) -> String {
        format!("browser: {}", self.config.url)
    }

    async fn fetch(&self) -> Result<RecordSet> {
        let config = self.config.clone();

        // headless_chrome is blocking
        let (html, final_url) = tokio::task::spawn_blocking(move || load_page(&config))
            .await
            .map_err(|e| AppError::DataAcquisition(format!("Browser task failed: {}", e)))??;

        let base_url = Url::parse(&final_url)
            .or_else(|_| Url::parse(&self.config.url))
            .map_err(|e| AppError::DataAcquisition(format!("Invalid page URL '{}': {}", final_url, e)))?;

        let records = extract_products(&html, &base_url, &self.config.selectors)?;
        info!("Extracted {} products from {}", records.len(), base_url);
        Ok(records)
    }
}

/// Closes the tab however the scrape ends.
struct TabGuard(Arc<Tab>);

impl Drop for TabGuard {
    fn drop(&mut self) {
        let _ = self.0.close(true);
    }
}

fn launch_options(config: &ScraperConfig) -> Result<LaunchOptions<'static>> {
    let mut launch_options = LaunchOptions::default_builder()
        .headless(config.headless)
        .sandbox(false) // Often needed in containerized environments
        .args(vec![
            std::ffi::OsStr::new("--no-sandbox"),
            std::ffi::OsStr::new("--disable-dev-shm-usage"),
            std::ffi::OsStr::new("--disable-gpu"),
            std::ffi::OsStr::new("--disable-extensions"),
        ])
        .build()
        .map_err(|e| AppError::DataAcquisition(format!("Failed to create launch options: {}", e)))?;

    // Set Chrome path if provided
    if let Some(chrome_path) = &config.chrome_path {
        launch_options.path = Some(PathBuf::from(chrome_path));
    }

    Ok(launch_options)
}

/// Returns the rendered page HTML and the URL after redirects.
fn load_page(config: &ScraperConfig) -> Result<(String, String)> {
    let browser = Browser::new(launch_options(config)?)
        .map_err(|e| AppError::DataAcquisition(format!("Failed to launch browser: {}", e)))?;

    let tab = TabGuard(
        browser
            .new_tab()
            .map_err(|e| AppError::DataAcquisition(format!("Failed to create tab: {}", e)))?,
    );

    tab.0
        .set_user_agent(&config.user_agent, None, None)
        .map_err(|e| AppError::DataAcquisition(format!("Failed to set user agent: {}", e)))?;

    let timeout = Duration::from_secs(config.navigation_timeout_secs);
    tab.0.set_default_timeout(timeout);

    info!("Navigating to {}", config.url);
    tab.0
        .navigate_to(&config.url)
        .map_err(|e| AppError::DataAcquisition(format!("Navigation failed: {}", e)))?
        .wait_until_navigated()
        .map_err(|e| AppError::DataAcquisition(format!("Page load failed: {}", e)))?;

    tab.0
        .wait_for_element_with_custom_timeout(&config.selectors.product, timeout)
        .map_err(|e| {
            AppError::DataAcquisition(format!(
                "Wait for selector '{}' failed: {}",
                config.selectors.product, e
            ))
        })?;

    // Late-loading images and prices
    info!("Waiting {} ms for page to settle...", config.settle_delay_ms);
    std::thread::sleep(Duration::from_millis(config.settle_delay_ms));

    let html = tab
        .0
        .get_content()
        .map_err(|e| AppError::DataAcquisition(format!("Failed to get page content: {}", e)))?;

    // Get final URL after redirects
    let final_url = {
        let url = tab.0.get_url();
        if url.is_empty() {
            config.url.clone()
        } else {
            url
        }
    };

    info!("Page loaded successfully");
    Ok((html, final_url))
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| AppError::DataAcquisition(format!("Invalid CSS selector '{}': {:?}", selector, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pulls one record per product element out of a listing page.
///
/// Products without a name or thumbnail are skipped. A missing price is kept
/// as empty text since prices are never interpreted.
pub fn extract_products(html: &str, base_url: &Url, selectors: &SelectorConfig) -> Result<RecordSet> {
    let document = Html::parse_document(html);
    let product_selector = parse_selector(&selectors.product)?;
    let name_selector = parse_selector(&selectors.name)?;
    let price_selector = parse_selector(&selectors.price)?;
    let thumbnail_selector = parse_selector(&selectors.thumbnail)?;

    let mut products = Vec::new();

    for (index, element) in document.select(&product_selector).enumerate() {
        let name = element
            .select(&name_selector)
            .next()
            .map(element_text)
            .filter(|name| !name.is_empty());

        let Some(name) = name else {
            warn!("Skipping product #{}: no name matched '{}'", index, selectors.name);
            continue;
        };

        let price = element
            .select(&price_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let thumbnail = element
            .select(&thumbnail_selector)
            .next()
            .and_then(|img| {
                // Lazy-loaded cards carry an empty or data: placeholder in src
                ["src", "data-src"]
                    .into_iter()
                    .filter_map(|attr| img.value().attr(attr))
                    .map(str::trim)
                    .find(|src| !src.is_empty() && !src.starts_with("data:"))
            })
            .and_then(|src| base_url.join(src).ok());

        let Some(thumbnail) = thumbnail else {
            warn!("Skipping product '{}': no thumbnail matched '{}'", name, selectors.thumbnail);
            continue;
        };

        debug!("Found product '{}' ({})", name, thumbnail);
        products.push(Record::new(name, Price::Text(price), thumbnail.to_string()));
    }

    Ok(RecordSet::new(products))
}

/// Reads a previously saved record set, e.g. the JSON report of an earlier run.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    fn describe(&self) -> String {
        format!("file: {}", self.path.display())
    }

    async fn fetch(&self) -> Result<RecordSet> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::DataAcquisition(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        let records: RecordSet = serde_json::from_str(&contents).map_err(|e| {
            AppError::DataAcquisition(format!("Malformed records in {}: {}", self.path.display(), e))
        })?;
        info!("Loaded {} products from {}", records.len(), self.path.display());
        Ok(records)
    }
}
