pub mod config;
pub mod images;
pub mod layout;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod scraper;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use models::{Price, Record, RecordSet, RunContext};
pub use pipeline::{Pipeline, RunSummary};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
