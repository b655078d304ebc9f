/*!
 * Error types for the cineseed application.
 *
 * This module contains custom error types for the different stages of a
 * seeding pass, using the thiserror crate for ergonomic error definitions.
 * Per-movie subtitle failures are expressed as `FetchError`, which the fetch
 * orchestrator catches and records without aborting the batch.
 */

use thiserror::Error;

/// Errors that can occur when talking to a remote API (OpenSubtitles, TMDB)
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

    /// Error establishing or maintaining a connection, including timeouts
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur while turning subtitle text into captions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubtitleError {
    /// Content contained no usable caption block
    #[error("No valid captions found ({skipped_blocks} malformed block(s) skipped)")]
    NoCaptions {
        /// Number of blocks that were rejected while parsing
        skipped_blocks: usize,
    },

    /// Timecode could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Errors raised by the persistence layer when writing a script
#[derive(Error, Debug)]
pub enum PersistError {
    /// The movie already owns a script
    #[error("Script already exists for movie {movie_id}")]
    DuplicateScript {
        /// Local movie id
        movie_id: i64,
    },

    /// The referenced movie does not exist
    #[error("Movie {movie_id} does not exist")]
    MovieNotFound {
        /// Local movie id
        movie_id: i64,
    },

    /// Underlying storage failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for PersistError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<PersistError>() {
            Ok(persist_error) => persist_error,
            Err(other) => Self::Storage(format!("{:#}", other)),
        }
    }
}

/// Failure taxonomy of the subtitle fetch orchestrator
#[derive(Error, Debug)]
pub enum FetchError {
    /// Timeouts, transport failures and non-success status codes
    #[error("Network error: {0}")]
    Network(ProviderError),

    /// A response body or the subtitle content was unusable
    #[error("Parse error: {0}")]
    Parse(String),

    /// The provider returned no candidate subtitle
    #[error("No subtitles found: {0}")]
    NotFound(String),

    /// A script already exists for the movie
    #[error("Script already exists for movie {movie_id}")]
    Duplicate {
        /// Local movie id
        movie_id: i64,
    },

    /// Storage failed while checking or writing the script
    #[error("Persistence error: {0}")]
    Persist(PersistError),
}

impl From<ProviderError> for FetchError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::ParseError(message) => Self::Parse(message),
            other => Self::Network(other),
        }
    }
}

impl From<SubtitleError> for FetchError {
    fn from(error: SubtitleError) -> Self {
        Self::Parse(error.to_string())
    }
}

impl From<PersistError> for FetchError {
    fn from(error: PersistError) -> Self {
        match error {
            PersistError::DuplicateScript { movie_id } => Self::Duplicate { movie_id },
            other => Self::Persist(other),
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from the persistence layer
    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    /// Error from the subtitle fetch pipeline
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
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
