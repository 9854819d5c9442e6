use std::error::Error;
use std::fmt;

/// Failures of a single fetch cycle.
///
/// The `Display` text is what ends up in `PresentationState::error`, so it
/// is written for a person looking at the menu, not for a log file.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AlertError {
    #[error("Datadog API credentials are missing. Please set your API key and App key.")]
    MissingCredentials,

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response from Datadog API: {0}")]
    InvalidResponse(String),

    #[error("Could not reach Datadog API: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    HttpError(u16),

    #[error("Failed to decode response from Datadog API: {0}")]
    DecodingError(String),
}

/// Unified application error.
///
/// Covers configuration, the persisted settings file, the background
/// engine going away, and fetch failures seen through a `MonitorHandle`.
#[derive(Debug)]
pub enum AppError {
    Config(String),
    Settings(String),
    Io(std::io::Error),
    Engine(String),
    Fetch(AlertError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Config error: {}", msg),
            AppError::Settings(msg) => write!(f, "Settings error: {}", msg),
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Engine(msg) => write!(f, "Engine error: {}", msg),
            AppError::Fetch(err) => write!(f, "Fetch error: {}", err),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Fetch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<AlertError> for AppError {
    fn from(err: AlertError) -> Self {
        AppError::Fetch(err)
    }
}
