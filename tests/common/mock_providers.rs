/*!
 * Mock provider implementations for testing
 *
 * This module provides mock implementations of the subtitle and movie
 * metadata providers to avoid external API calls in tests. Every call is
 * recorded in an `ApiCallTracker`.
 */

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use cineseed::errors::ProviderError;
use cineseed::providers::{
    CastEntry, CrewEntry, DiscoveredMovie, DownloadLink, MovieDetails, MovieMetadataProvider,
    ReleaseCertification, SubtitleCandidate, SubtitleProvider,
};

/// Tracks API calls to ensure no actual external requests are made
#[derive(Debug, Default)]
pub struct ApiCallTracker {
    /// Count of search calls
    pub search_calls: usize,
    /// Count of download link requests
    pub download_calls: usize,
    /// Count of content fetches
    pub content_calls: usize,
    /// Start time of every search call
    pub search_times: Vec<Instant>,
    /// Completion time of every subtitle call, successful or not
    pub call_ends: Vec<Instant>,
    /// Last request received
    pub last_request: Option<String>,
}

impl ApiCallTracker {
    /// Total number of calls of any kind
    pub fn call_count(&self) -> usize {
        self.search_calls + self.download_calls + self.content_calls
    }
}

/// Type of error to simulate
#[derive(Debug, Clone, Copy, Default)]
pub enum MockErrorType {
    /// Authentication error (invalid API key)
    #[default]
    Auth,
    /// Connection error
    Connection,
    /// Rate limit error
    RateLimit,
    /// API error
    Api,
    /// Unparseable response body
    Parse,
}

impl MockErrorType {
    fn to_error(self) -> ProviderError {
        match self {
            MockErrorType::Auth => ProviderError::AuthenticationError("Invalid API key".into()),
            MockErrorType::Connection => ProviderError::ConnectionError("Connection failed".into()),
            MockErrorType::RateLimit => ProviderError::RateLimitExceeded("Rate limit exceeded".into()),
            MockErrorType::Api => ProviderError::ApiError {
                status_code: 500,
                message: "Internal server error".into(),
            },
            MockErrorType::Parse => ProviderError::ParseError("Unexpected body".into()),
        }
    }
}

#[derive(Debug, Default)]
struct SubtitleFailures {
    search: Option<MockErrorType>,
    download: Option<MockErrorType>,
    content: Option<MockErrorType>,
}

/// Mock subtitle provider
///
/// Every movie gets one candidate whose single file id is `tmdb_id * 10`,
/// unless configured otherwise.
#[derive(Debug)]
pub struct MockSubtitleProvider {
    tracker: Arc<Mutex<ApiCallTracker>>,
    content: String,
    no_results: HashSet<i64>,
    no_files: HashSet<i64>,
    failures: Mutex<SubtitleFailures>,
    latency: Duration,
}

impl MockSubtitleProvider {
    /// Create a mock serving the given subtitle content for every movie
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(ApiCallTracker::default())),
            content: content.into(),
            no_results: HashSet::new(),
            no_files: HashSet::new(),
            failures: Mutex::new(SubtitleFailures::default()),
            latency: Duration::ZERO,
        }
    }

    /// Make every call take this long before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Get the API call tracker
    pub fn tracker(&self) -> Arc<Mutex<ApiCallTracker>> {
        self.tracker.clone()
    }

    /// Return an empty search result for this movie
    pub fn without_results_for(mut self, tmdb_id: i64) -> Self {
        self.no_results.insert(tmdb_id);
        self
    }

    /// Return a candidate without files for this movie
    pub fn without_files_for(mut self, tmdb_id: i64) -> Self {
        self.no_files.insert(tmdb_id);
        self
    }

    /// Fail every search call
    pub fn fail_search(&self, error_type: MockErrorType) {
        self.failures.lock().unwrap().search = Some(error_type);
    }

    /// Fail every download link request
    pub fn fail_download(&self, error_type: MockErrorType) {
        self.failures.lock().unwrap().download = Some(error_type);
    }

    /// Fail every content fetch
    pub fn fail_content(&self, error_type: MockErrorType) {
        self.failures.lock().unwrap().content = Some(error_type);
    }

    /// Stop failing
    pub fn recover(&self) {
        *self.failures.lock().unwrap() = SubtitleFailures::default();
    }

    /// Simulate the round trip and record when the call completed
    async fn respond(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.tracker.lock().unwrap().call_ends.push(Instant::now());
    }
}

#[async_trait]
impl SubtitleProvider for MockSubtitleProvider {
    async fn search(&self, tmdb_id: i64, language: &str) -> Result<Vec<SubtitleCandidate>, ProviderError> {
        {
            let mut tracker = self.tracker.lock().unwrap();
            tracker.search_calls += 1;
            tracker.search_times.push(Instant::now());
            tracker.last_request = Some(format!("search tmdb_id={} languages={}", tmdb_id, language));
        }
        self.respond().await;

        if let Some(error_type) = self.failures.lock().unwrap().search {
            return Err(error_type.to_error());
        }
        if self.no_results.contains(&tmdb_id) {
            return Ok(Vec::new());
        }

        let file_ids = if self.no_files.contains(&tmdb_id) { Vec::new() } else { vec![tmdb_id * 10] };
        Ok(vec![
            SubtitleCandidate {
                subtitle_id: format!("sub-{}", tmdb_id),
                language: language.to_string(),
                download_count: 100,
                file_ids,
            },
            SubtitleCandidate {
                subtitle_id: format!("sub-{}-alt", tmdb_id),
                language: language.to_string(),
                download_count: 5000,
                file_ids: vec![tmdb_id * 10 + 1],
            },
        ])
    }

    async fn request_download(&self, file_id: i64) -> Result<DownloadLink, ProviderError> {
        {
            let mut tracker = self.tracker.lock().unwrap();
            tracker.download_calls += 1;
            tracker.last_request = Some(format!("download file_id={}", file_id));
        }
        self.respond().await;

        if let Some(error_type) = self.failures.lock().unwrap().download {
            return Err(error_type.to_error());
        }

        Ok(DownloadLink {
            link: format!("https://dl.example/{}.srt", file_id),
            file_name: format!("{}.srt", file_id),
            remaining: Some(99),
        })
    }

    async fn fetch_content(&self, link: &DownloadLink) -> Result<String, ProviderError> {
        {
            let mut tracker = self.tracker.lock().unwrap();
            tracker.content_calls += 1;
            tracker.last_request = Some(format!("get {}", link.link));
        }
        self.respond().await;

        if let Some(error_type) = self.failures.lock().unwrap().content {
            return Err(error_type.to_error());
        }

        Ok(self.content.clone())
    }
}

/// Mock movie metadata provider serving fixed discover pages
#[derive(Debug)]
pub struct MockMovieProvider {
    tracker: Arc<Mutex<ApiCallTracker>>,
    pages: Vec<Vec<DiscoveredMovie>>,
    failing_details: HashSet<i64>,
    failing_discover: bool,
    details_calls: Mutex<HashMap<i64, usize>>,
}

impl MockMovieProvider {
    /// Create a mock with `pages` pages of `per_page` movies, ids starting at 100
    pub fn new(pages: usize, per_page: usize) -> Self {
        let pages = (0..pages)
            .map(|page| {
                (0..per_page)
                    .map(|i| {
                        let tmdb_id = 100 + (page * per_page + i) as i64;
                        DiscoveredMovie {
                            tmdb_id,
                            title: format!("Movie {}", tmdb_id),
                            genre_ids: vec![28, 18, 999_999],
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            tracker: Arc::new(Mutex::new(ApiCallTracker::default())),
            pages,
            failing_details: HashSet::new(),
            failing_discover: false,
            details_calls: Mutex::new(HashMap::new()),
        }
    }

    /// Get the API call tracker
    pub fn tracker(&self) -> Arc<Mutex<ApiCallTracker>> {
        self.tracker.clone()
    }

    /// Fail the details request of one movie
    pub fn failing_details_for(mut self, tmdb_id: i64) -> Self {
        self.failing_details.insert(tmdb_id);
        self
    }

    /// Fail every discover request
    pub fn failing_discover(mut self) -> Self {
        self.failing_discover = true;
        self
    }

    /// Number of details requests made for a movie
    pub fn details_calls(&self, tmdb_id: i64) -> usize {
        self.details_calls.lock().unwrap().get(&tmdb_id).copied().unwrap_or(0)
    }

    /// Details every mocked movie returns
    pub fn details_for(tmdb_id: i64) -> MovieDetails {
        MovieDetails {
            tmdb_id,
            title: format!("Movie {}", tmdb_id),
            overview: Some("An overview".to_string()),
            release_date: Some("2020-01-01".to_string()),
            poster_path: Some(format!("/poster{}.jpg", tmdb_id)),
            backdrop_path: None,
            runtime: Some(120),
            genre_ids: vec![28, 18],
            crew: vec![
                CrewEntry { name: "A Writer".to_string(), job: "Screenplay".to_string() },
                CrewEntry { name: "The Director".to_string(), job: "Director".to_string() },
            ],
            cast: (1..=6)
                .map(|i| CastEntry { name: format!("Actor {}", i), character: format!("Role {}", i) })
                .collect(),
            release_certifications: vec![ReleaseCertification {
                country: "US".to_string(),
                certifications: vec!["".to_string(), "PG-13".to_string()],
            }],
        }
    }
}

#[async_trait]
impl MovieMetadataProvider for MockMovieProvider {
    async fn discover_movies(&self, page: u32) -> Result<Vec<DiscoveredMovie>, ProviderError> {
        {
            let mut tracker = self.tracker.lock().unwrap();
            tracker.search_calls += 1;
            tracker.last_request = Some(format!("discover page={}", page));
        }

        if self.failing_discover {
            return Err(MockErrorType::Api.to_error());
        }

        let index = page.saturating_sub(1) as usize;
        Ok(self.pages.get(index).cloned().unwrap_or_default())
    }

    async fn movie_details(&self, tmdb_id: i64) -> Result<MovieDetails, ProviderError> {
        {
            let mut tracker = self.tracker.lock().unwrap();
            tracker.download_calls += 1;
            tracker.last_request = Some(format!("details {}", tmdb_id));
        }
        *self.details_calls.lock().unwrap().entry(tmdb_id).or_insert(0) += 1;

        if self.failing_details.contains(&tmdb_id) {
            return Err(MockErrorType::Connection.to_error());
        }

        Ok(Self::details_for(tmdb_id))
    }
}
