use anyhow::{Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::difficulty::DifficultyThresholds;
use crate::errors::AppError;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// SQLite database file (default location under the user data directory if unset)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Subtitle source (OpenSubtitles)
    #[serde(default)]
    pub subtitles: SubtitleSourceConfig,

    /// Movie metadata source (TMDB)
    #[serde(default)]
    pub movies: MovieSourceConfig,

    /// Vocabulary word lists
    #[serde(default)]
    pub vocabulary: VocabularyConfig,

    /// Difficulty classifier thresholds
    #[serde(default)]
    pub classifier: DifficultyThresholds,
}

/// OpenSubtitles configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubtitleSourceConfig {
    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "default_opensubtitles_endpoint")]
    pub endpoint: String,

    // @field: Subtitle language requested from the search endpoint
    #[serde(default = "default_subtitle_language")]
    pub language: String,

    // @field: User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Minimum delay between two movies' requests
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

impl Default for SubtitleSourceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_opensubtitles_endpoint(),
            language: default_subtitle_language(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

/// TMDB configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieSourceConfig {
    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "default_tmdb_endpoint")]
    pub endpoint: String,

    // @field: Metadata language (BCP 47, e.g. "ko-KR")
    #[serde(default = "default_movie_language")]
    pub language: String,

    // @field: Number of movies to seed
    #[serde(default = "default_movie_count")]
    pub movie_count: usize,

    #[serde(default = "default_poster_base_url")]
    pub poster_base_url: String,

    #[serde(default = "default_backdrop_base_url")]
    pub backdrop_base_url: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MovieSourceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_tmdb_endpoint(),
            language: default_movie_language(),
            movie_count: default_movie_count(),
            poster_base_url: default_poster_base_url(),
            backdrop_base_url: default_backdrop_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Vocabulary word list configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VocabularyConfig {
    /// Directory holding one subdirectory per category
    #[serde(default = "default_vocabulary_directory")]
    pub directory: PathBuf,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            directory: default_vocabulary_directory(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// One step of a seeding pass
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SeedStep {
    Vocabulary,
    Genres,
    Movies,
    Subtitles,
}

impl SeedStep {
    /// All steps in execution order
    pub const ORDER: [SeedStep; 4] = [
        SeedStep::Vocabulary,
        SeedStep::Genres,
        SeedStep::Movies,
        SeedStep::Subtitles,
    ];
}

impl fmt::Display for SeedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedStep::Vocabulary => write!(f, "vocabulary"),
            SeedStep::Genres => write!(f, "genres"),
            SeedStep::Movies => write!(f, "movies"),
            SeedStep::Subtitles => write!(f, "subtitles"),
        }
    }
}

impl std::str::FromStr for SeedStep {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "vocabulary" => Ok(SeedStep::Vocabulary),
            "genres" => Ok(SeedStep::Genres),
            "movies" => Ok(SeedStep::Movies),
            "subtitles" => Ok(SeedStep::Subtitles),
            _ => Err(anyhow::anyhow!("Invalid seed step: {}", s)),
        }
    }
}

fn default_opensubtitles_endpoint() -> String {
    crate::providers::opensubtitles::DEFAULT_ENDPOINT.to_string()
}

fn default_tmdb_endpoint() -> String {
    crate::providers::tmdb::DEFAULT_ENDPOINT.to_string()
}

fn default_subtitle_language() -> String {
    "en".to_string()
}

fn default_movie_language() -> String {
    "ko-KR".to_string()
}

fn default_user_agent() -> String {
    format!("cineseed v{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_movie_count() -> usize {
    15
}

fn default_poster_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_backdrop_base_url() -> String {
    "https://image.tmdb.org/t/p/original".to_string()
}

fn default_vocabulary_directory() -> PathBuf {
    PathBuf::from("voca")
}

fn config_error(message: impl Into<String>) -> anyhow::Error {
    AppError::Config(message.into()).into()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        crate::language_utils::validate_language_code(&self.subtitles.language)
            .map_err(|e| config_error(format!("subtitles.language: {}", e)))?;
        crate::language_utils::validate_language_code(crate::language_utils::primary_subtag(&self.movies.language))
            .map_err(|e| config_error(format!("movies.language: {}", e)))?;

        let thresholds = &self.classifier;
        for (name, value) in [
            ("advanced_threshold", thresholds.advanced_threshold),
            ("intermediate_threshold", thresholds.intermediate_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(config_error(format!("classifier.{} must be within [0, 1], got {}", name, value)));
            }
        }
        if thresholds.advanced_threshold > thresholds.intermediate_threshold {
            return Err(config_error(
                "classifier.advanced_threshold must not exceed classifier.intermediate_threshold",
            ));
        }

        if self.movies.movie_count == 0 {
            return Err(config_error("movies.movie_count must be at least 1"));
        }
        if self.subtitles.timeout_secs == 0 || self.movies.timeout_secs == 0 {
            return Err(config_error("timeout_secs must be at least 1"));
        }

        Ok(())
    }

    /// Validate, then check the API keys needed by the given steps
    pub fn validate_for_steps(&self, steps: &[SeedStep]) -> Result<()> {
        self.validate()?;

        if steps.contains(&SeedStep::Movies) && self.movies.api_key.trim().is_empty() {
            return Err(config_error("TMDB API key is required for the movies step"));
        }
        if steps.contains(&SeedStep::Subtitles) && self.subtitles.api_key.trim().is_empty() {
            return Err(config_error("OpenSubtitles API key is required for the subtitles step"));
        }

        Ok(())
    }

    /// Load the configuration file, writing a default one if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {:?}", path))?;
        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: None,
            log_level: LogLevel::default(),
            subtitles: SubtitleSourceConfig::default(),
            movies: MovieSourceConfig::default(),
            vocabulary: VocabularyConfig::default(),
            classifier: DifficultyThresholds::default(),
        }
    }
}
