//! Error types for carpark-finder

use thiserror::Error;

/// Main error type for carpark-finder operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Cannot resolve location: {0}")]
    Resolution(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid radius: {0}")]
    InvalidRadius(String),

    #[error("Invalid vehicle: {0}")]
    InvalidVehicle(String),

    #[error("Provider error: {0}")]
    Provider(String),

    /// Upstream failure that may clear up on its own (timeout, 5xx)
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Server error: {0}")]
    Server(String),
}

impl Error {
    /// Whether another attempt could succeed
    ///
    /// Only transport failures and server-side errors are worth retrying;
    /// missing credentials, client errors and malformed bodies are not.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            _ => false,
        }
    }
}

/// Result type alias for carpark-finder operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_classification() {
        assert!(Error::Unavailable("503".to_string()).is_retriable());
        assert!(!Error::Provider("404".to_string()).is_retriable());
        assert!(!Error::Resolution("nowhere".to_string()).is_retriable());
        assert!(!Error::Config("bad".to_string()).is_retriable());
    }
}
