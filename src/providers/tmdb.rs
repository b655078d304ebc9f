use std::time::Duration;
use async_trait::async_trait;
use serde::Deserialize;
use reqwest::Client;
use log::debug;
use url::Url;

use crate::errors::ProviderError;
use super::{
    check_status, map_request_error, CastEntry, CrewEntry, DiscoveredMovie, MovieDetails,
    MovieMetadataProvider, ReleaseCertification,
};

/// Default public API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.themoviedb.org/3";

/// TMDB client for movie discovery and metadata
#[derive(Debug)]
pub struct Tmdb {
    /// HTTP client for API requests
    client: Client,
    /// API key passed as a query parameter
    api_key: String,
    /// API endpoint URL (empty means the public API)
    endpoint: String,
    /// Response language, e.g. "ko-KR"
    language: String,
}

/// One page of the discover endpoint
#[derive(Debug, Deserialize)]
pub struct DiscoverResponse {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<DiscoverResult>,
    #[serde(default)]
    pub total_pages: u32,
}

/// Movie entry of a discover page
#[derive(Debug, Deserialize)]
pub struct DiscoverResult {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

/// Movie details with credits and release dates appended
#[derive(Debug, Deserialize)]
pub struct DetailsResponse {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub runtime: Option<i64>,
    #[serde(default)]
    pub genres: Vec<GenreEntry>,
    #[serde(default)]
    pub credits: Credits,
    #[serde(default)]
    pub release_dates: ReleaseDates,
}

#[derive(Debug, Deserialize)]
pub struct GenreEntry {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastCredit>,
    #[serde(default)]
    pub crew: Vec<CrewCredit>,
}

#[derive(Debug, Deserialize)]
pub struct CastCredit {
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CrewCredit {
    pub name: String,
    #[serde(default)]
    pub job: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReleaseDates {
    #[serde(default)]
    pub results: Vec<CountryReleases>,
}

#[derive(Debug, Deserialize)]
pub struct CountryReleases {
    pub iso_3166_1: String,
    #[serde(default)]
    pub release_dates: Vec<ReleaseEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseEntry {
    #[serde(default)]
    pub certification: Option<String>,
}

impl From<DiscoverResult> for DiscoveredMovie {
    fn from(result: DiscoverResult) -> Self {
        Self {
            tmdb_id: result.id,
            title: result.title,
            genre_ids: result.genre_ids,
        }
    }
}

impl From<DetailsResponse> for MovieDetails {
    fn from(details: DetailsResponse) -> Self {
        Self {
            tmdb_id: details.id,
            title: details.title,
            overview: details.overview.filter(|o| !o.is_empty()),
            release_date: details.release_date.filter(|d| !d.is_empty()),
            poster_path: details.poster_path,
            backdrop_path: details.backdrop_path,
            runtime: details.runtime,
            genre_ids: details.genres.iter().map(|g| g.id).collect(),
            crew: details
                .credits
                .crew
                .into_iter()
                .map(|c| CrewEntry { name: c.name, job: c.job })
                .collect(),
            cast: details
                .credits
                .cast
                .into_iter()
                .map(|c| CastEntry {
                    name: c.name,
                    character: c.character.unwrap_or_default(),
                })
                .collect(),
            release_certifications: details
                .release_dates
                .results
                .into_iter()
                .map(|country| ReleaseCertification {
                    country: country.iso_3166_1,
                    certifications: country
                        .release_dates
                        .into_iter()
                        .map(|r| r.certification.unwrap_or_default())
                        .collect(),
                })
                .collect(),
        }
    }
}

impl Tmdb {
    /// Create a new TMDB client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        language: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            language: language.into(),
        }
    }

    fn api_url(&self, path: &str, extra: &[(&str, String)]) -> Result<Url, ProviderError> {
        let base = if self.endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            self.endpoint.trim_end_matches('/')
        };

        let mut params = vec![
            ("api_key", self.api_key.clone()),
            ("language", self.language.clone()),
        ];
        params.extend(extra.iter().map(|(k, v)| (*k, v.clone())));

        Url::parse_with_params(&format!("{}/{}", base, path), &params)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid TMDB URL: {}", e)))
    }

    /// URL of one discover page
    pub fn discover_url(&self, page: u32) -> Result<Url, ProviderError> {
        self.api_url("discover/movie", &[("page", page.to_string())])
    }

    /// URL of the details of one movie, with credits and release dates
    pub fn details_url(&self, tmdb_id: i64) -> Result<Url, ProviderError> {
        self.api_url(
            &format!("movie/{}", tmdb_id),
            &[("append_to_response", "credits,release_dates".to_string())],
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, ProviderError> {
        let response = self.client.get(url)
            .send()
            .await
            .map_err(map_request_error)?;

        check_status(response).await?
            .json::<T>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse TMDB response: {}", e)))
    }
}

#[async_trait]
impl MovieMetadataProvider for Tmdb {
    async fn discover_movies(&self, page: u32) -> Result<Vec<DiscoveredMovie>, ProviderError> {
        debug!("Fetching TMDB discover page {}", page);
        let response: DiscoverResponse = self.get_json(self.discover_url(page)?).await?;
        Ok(response.results.into_iter().map(DiscoveredMovie::from).collect())
    }

    async fn movie_details(&self, tmdb_id: i64) -> Result<MovieDetails, ProviderError> {
        debug!("Fetching TMDB details for movie {}", tmdb_id);
        let response: DetailsResponse = self.get_json(self.details_url(tmdb_id)?).await?;
        Ok(response.into())
    }
}
