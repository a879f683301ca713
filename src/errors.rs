/*!
 * Error types for the storycast application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

use crate::pipeline::Stage;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The generation call did not answer in time
    #[error("Generation timed out after {0} seconds")]
    Timeout(u64),

    /// The provider answered with nothing usable
    #[error("Provider returned an empty response")]
    EmptyResponse,
}

impl ProviderError {
    /// Map a non-success HTTP status to the matching variant
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors that can occur while assembling download packages
#[derive(Error, Debug)]
pub enum PackageError {
    /// The zip writer refused an entry or could not finish
    #[error("Failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Writing into the in-memory buffer failed
    #[error("Failed to write archive entry: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by pipeline actions.
///
/// None of these is fatal to a session: the state is left exactly as it was
/// before the failing action and the action may be retried.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required upstream input is missing
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// The stage has not been unlocked yet
    #[error("Stage '{stage}' is locked until the previous stage is confirmed (current stage: {cursor})")]
    StageLocked {
        /// Stage the action targeted
        stage: Stage,
        /// Cursor value at the time of the action
        cursor: u8,
    },

    /// The generation capability failed
    #[error("Generation failed: {0}")]
    Generation(#[from] ProviderError),

    /// An uploaded or library document is not valid UTF-8
    #[error("'{0}' is not valid UTF-8 text")]
    Encoding(String),

    /// A language code that is not part of the configured set
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    /// A call for the same destination is still outstanding
    #[error("A generation for {0} is already in progress")]
    Busy(String),

    /// Package assembly failed
    #[error("Package error: {0}")]
    Package(#[from] PackageError),

    /// Reading an input file failed
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
