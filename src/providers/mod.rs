/*!
 * Provider implementations for the remote services used while seeding.
 *
 * This module contains client implementations for:
 * - OpenSubtitles: subtitle search and download
 * - TMDB: movie discovery and metadata
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One subtitle upload returned by a search
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCandidate {
    /// Provider-side subtitle id
    pub subtitle_id: String,
    /// Language code of the upload
    pub language: String,
    /// Popularity as reported by the provider
    pub download_count: u64,
    /// Downloadable files, in provider order
    pub file_ids: Vec<i64>,
}

/// Temporary link granted for one file download
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadLink {
    /// URL holding the raw subtitle text
    pub link: String,
    pub file_name: String,
    /// Downloads left in the current quota window
    pub remaining: Option<i64>,
}

/// Movie summary returned by a discovery listing
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredMovie {
    pub tmdb_id: i64,
    pub title: String,
    pub genre_ids: Vec<i64>,
}

/// Crew entry of a movie
#[derive(Debug, Clone, PartialEq)]
pub struct CrewEntry {
    pub name: String,
    pub job: String,
}

/// Cast entry of a movie, in billing order
#[derive(Debug, Clone, PartialEq)]
pub struct CastEntry {
    pub name: String,
    pub character: String,
}

/// Release certification for one country
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseCertification {
    /// ISO 3166-1 country code
    pub country: String,
    /// Certifications of each release in that country
    pub certifications: Vec<String>,
}

/// Full metadata of one movie
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MovieDetails {
    pub tmdb_id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    /// Relative poster path as returned by the API
    pub poster_path: Option<String>,
    /// Relative backdrop path as returned by the API
    pub backdrop_path: Option<String>,
    pub runtime: Option<i64>,
    pub genre_ids: Vec<i64>,
    pub crew: Vec<CrewEntry>,
    pub cast: Vec<CastEntry>,
    pub release_certifications: Vec<ReleaseCertification>,
}

/// Source of subtitle files
///
/// A download is a three step exchange: search candidates for a movie, ask
/// for a temporary link to one file, then fetch the raw text behind the link.
#[async_trait]
pub trait SubtitleProvider: Send + Sync + Debug {
    /// Search subtitle uploads for a TMDB movie id in the given language
    async fn search(&self, tmdb_id: i64, language: &str) -> Result<Vec<SubtitleCandidate>, ProviderError>;

    /// Request a temporary download link for a file
    async fn request_download(&self, file_id: i64) -> Result<DownloadLink, ProviderError>;

    /// Fetch the raw subtitle text behind a download link
    async fn fetch_content(&self, link: &DownloadLink) -> Result<String, ProviderError>;
}

/// Source of movie metadata
#[async_trait]
pub trait MovieMetadataProvider: Send + Sync + Debug {
    /// One page of popular movies (pages start at 1)
    async fn discover_movies(&self, page: u32) -> Result<Vec<DiscoveredMovie>, ProviderError>;

    /// Detailed metadata including credits and release dates
    async fn movie_details(&self, tmdb_id: i64) -> Result<MovieDetails, ProviderError>;
}

/// Map a transport error to a provider error
pub(crate) fn map_request_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() || error.is_connect() {
        ProviderError::ConnectionError(error.to_string())
    } else if error.is_decode() {
        ProviderError::ParseError(error.to_string())
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}

/// Turn a non-success response into the matching provider error
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());
    log::error!("API error ({}): {}", status, error_text);

    Err(status_error(status.as_u16(), error_text))
}

fn status_error(status_code: u16, message: String) -> ProviderError {
    match status_code {
        401 | 403 => ProviderError::AuthenticationError(message),
        429 => ProviderError::RateLimitExceeded(message),
        _ => ProviderError::ApiError { status_code, message },
    }
}

pub mod opensubtitles;
pub mod tmdb;
