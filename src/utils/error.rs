use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Data acquisition error: {0}")]
    DataAcquisition(String),

    #[error("Storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Render error: {0}")]
    Render(#[from] askama::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl AppError {
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Storage {
            path: path.into(),
            source,
        }
    }

    pub fn network(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        AppError::Network {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error must end the run. Report and image failures are
    /// recoverable; everything that leaves the output tree untrustworthy is not.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::DataAcquisition(_) | AppError::Storage { .. } | AppError::Config(_)
        )
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        AppError::Network {
            url,
            message: err.to_string(),
        }
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = AppError::storage("out/images", io_err);
        assert_eq!(err.to_string(), "Storage error at out/images: denied");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_network_error_is_recoverable() {
        let err = AppError::network("https://example.com/a.png", "HTTP status 404 Not Found");
        assert_eq!(
            err.to_string(),
            "Network error for https://example.com/a.png: HTTP status 404 Not Found"
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let app_err: AppError = json_err.into();
        assert!(matches!(app_err, AppError::Serialization(_)));
        assert!(!app_err.is_fatal());
    }

    #[test]
    fn test_data_acquisition_is_fatal() {
        let err = AppError::DataAcquisition("Failed to launch browser".to_string());
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Data acquisition error: Failed to launch browser");
    }
}
