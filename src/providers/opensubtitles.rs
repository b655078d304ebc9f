use std::time::Duration;
use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use reqwest::Client;
use log::debug;
use url::Url;

use crate::errors::ProviderError;
use super::{check_status, map_request_error, DownloadLink, SubtitleCandidate, SubtitleProvider};

/// Default public API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.opensubtitles.com/api/v1";

/// OpenSubtitles client for searching and downloading subtitles
#[derive(Debug)]
pub struct OpenSubtitles {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (empty means the public API)
    endpoint: String,
    /// User agent sent with every API call
    user_agent: String,
}

/// Response of the subtitle search endpoint
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// Matching uploads
    #[serde(default)]
    pub data: Vec<SearchResult>,
}

/// One search result
#[derive(Debug, Deserialize)]
pub struct SearchResult {
    /// Provider-side id
    pub id: String,
    /// Upload details
    pub attributes: SearchAttributes,
}

/// Attributes of an uploaded subtitle
#[derive(Debug, Deserialize)]
pub struct SearchAttributes {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub download_count: Option<u64>,
    #[serde(default)]
    pub files: Vec<SearchFile>,
}

/// Downloadable file of an upload
#[derive(Debug, Deserialize)]
pub struct SearchFile {
    pub file_id: i64,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Body of a download request
#[derive(Debug, Serialize)]
pub struct DownloadRequest {
    pub file_id: i64,
}

/// Response of the download endpoint
#[derive(Debug, Deserialize)]
pub struct DownloadResponse {
    /// Temporary link to the raw file
    pub link: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub remaining: Option<i64>,
}

impl From<SearchResult> for SubtitleCandidate {
    fn from(result: SearchResult) -> Self {
        Self {
            subtitle_id: result.id,
            language: result.attributes.language.unwrap_or_default(),
            download_count: result.attributes.download_count.unwrap_or(0),
            file_ids: result.attributes.files.iter().map(|f| f.file_id).collect(),
        }
    }
}

impl From<DownloadResponse> for DownloadLink {
    fn from(response: DownloadResponse) -> Self {
        Self {
            link: response.link,
            file_name: response.file_name,
            remaining: response.remaining,
        }
    }
}

impl OpenSubtitles {
    /// Create a new OpenSubtitles client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        user_agent: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            user_agent: user_agent.into(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        let base = if self.endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/{}", base, path)
    }

    /// Build the search URL with its query string
    pub fn search_url(&self, tmdb_id: i64, language: &str) -> Result<Url, ProviderError> {
        Url::parse_with_params(
            &self.api_url("subtitles"),
            &[("tmdb_id", tmdb_id.to_string()), ("languages", language.to_string())],
        )
        .map_err(|e| ProviderError::RequestFailed(format!("Invalid search URL: {}", e)))
    }
}

#[async_trait]
impl SubtitleProvider for OpenSubtitles {
    async fn search(&self, tmdb_id: i64, language: &str) -> Result<Vec<SubtitleCandidate>, ProviderError> {
        let url = self.search_url(tmdb_id, language)?;
        debug!("Searching subtitles: {}", url);

        let response = self.client.get(url)
            .header("Content-Type", "application/json")
            .header("Api-Key", &self.api_key)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(map_request_error)?;

        let search_response = check_status(response).await?
            .json::<SearchResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse search response: {}", e)))?;

        Ok(search_response.data.into_iter().map(SubtitleCandidate::from).collect())
    }

    async fn request_download(&self, file_id: i64) -> Result<DownloadLink, ProviderError> {
        let response = self.client.post(self.api_url("download"))
            .header("Content-Type", "application/json")
            .header("Api-Key", &self.api_key)
            .header("User-Agent", &self.user_agent)
            .json(&DownloadRequest { file_id })
            .send()
            .await
            .map_err(map_request_error)?;

        let download_response = check_status(response).await?
            .json::<DownloadResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse download response: {}", e)))?;

        if let Some(remaining) = download_response.remaining {
            debug!("Download quota remaining: {}", remaining);
        }

        Ok(download_response.into())
    }

    async fn fetch_content(&self, link: &DownloadLink) -> Result<String, ProviderError> {
        let response = self.client.get(&link.link)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(map_request_error)?;

        let bytes = check_status(response).await?
            .bytes()
            .await
            .map_err(map_request_error)?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
