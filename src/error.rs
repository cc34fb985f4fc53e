//! Error types and handling for the city guide

use thiserror::Error;

/// Main error type for the city guide
#[derive(Error, Debug)]
pub enum GuideError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Transport failures talking to an external service
    #[error("Network error: {message}")]
    Network { message: String },

    /// External service answered with an error status
    #[error("API error: {message}")]
    Api { message: String },

    /// Response or file content could not be interpreted
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// A required column is absent from a tabular file
    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    /// Lookup of a catalog or session key failed
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Delimited file errors
    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl GuideError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn missing_column<S: Into<String>>(column: S) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            GuideError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            GuideError::Network { .. } | GuideError::Api { .. } => {
                "Unable to reach the map data service. Please check your internet connection."
                    .to_string()
            }
            GuideError::Parse { .. } | GuideError::Csv { .. } | GuideError::MissingColumn { .. } => {
                "Overlay unavailable: the data could not be read.".to_string()
            }
            GuideError::NotFound { message } => format!("Not found: {message}"),
            GuideError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for GuideError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GuideError::parse(err.to_string())
        } else {
            GuideError::network(err.to_string())
        }
    }
}
