use anyhow::{Result, Context};
use log::{error, warn, info};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{Config, SeedStep};
use crate::database::models::StoreStats;
use crate::database::{Repository, SeedStore};
use crate::difficulty::{DifficultyClassifier, Lexicon};
use crate::language_utils;
use crate::movie_seeder::{self, GenreReport, MovieReport, MovieSeeder};
use crate::providers::opensubtitles::OpenSubtitles;
use crate::providers::tmdb::Tmdb;
use crate::providers::{MovieMetadataProvider, SubtitleProvider};
use crate::subtitle_fetcher::{BatchReport, SubtitleFetcher};
use crate::vocabulary::{VocabularyLoader, VocabularyReport};

// @module: Application controller for database seeding

/// Aggregated result of a seeding pass
#[derive(Debug, Default)]
pub struct SeedReport {
    pub vocabulary: Option<VocabularyReport>,
    pub genres: Option<GenreReport>,
    pub movies: Option<MovieReport>,
    pub subtitles: Option<BatchReport>,
    /// Steps that failed, with their error message
    pub failures: Vec<(SeedStep, String)>,
    pub elapsed: Duration,
}

impl SeedReport {
    pub fn failed_steps(&self) -> Vec<SeedStep> {
        self.failures.iter().map(|(step, _)| *step).collect()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(report) = &self.vocabulary {
            writeln!(f, "Vocabulary: {}", report)?;
        }
        if let Some(report) = &self.genres {
            writeln!(f, "Genres: {}", report)?;
        }
        if let Some(report) = &self.movies {
            writeln!(f, "Movies: {}", report)?;
        }
        if let Some(report) = &self.subtitles {
            writeln!(f, "Subtitles: {}", report)?;
        }
        for (step, message) in &self.failures {
            writeln!(f, "Step {} failed: {}", step, message)?;
        }
        write!(f, "Finished in {}", format_duration(self.elapsed))
    }
}

/// Main application controller for seeding
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Storage for seeded records
    store: Arc<dyn SeedStore>,
}

impl Controller {
    /// Create a controller backed by the configured SQLite database
    pub fn with_config(config: Config) -> Result<Self> {
        let repository = match &config.database_path {
            Some(path) => Repository::new(crate::database::DatabaseConnection::new(path)?),
            None => Repository::new_default()?,
        };

        Ok(Self::with_store(config, Arc::new(repository)))
    }

    /// Create a controller over an existing store
    pub fn with_store(config: Config, store: Arc<dyn SeedStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn SeedStore> {
        Arc::clone(&self.store)
    }

    /// Run the given steps against the configured remote services
    pub async fn seed(&self, steps: &[SeedStep]) -> Result<SeedReport> {
        self.config
            .validate_for_steps(steps)
            .context("Configuration validation failed")?;

        let subtitles = &self.config.subtitles;
        let subtitle_provider: Arc<dyn SubtitleProvider> = Arc::new(OpenSubtitles::new(
            subtitles.api_key.clone(),
            subtitles.endpoint.clone(),
            subtitles.user_agent.clone(),
            subtitles.timeout_secs,
        ));

        let movies = &self.config.movies;
        let movie_provider: Arc<dyn MovieMetadataProvider> = Arc::new(Tmdb::new(
            movies.api_key.clone(),
            movies.endpoint.clone(),
            movies.language.clone(),
            movies.timeout_secs,
        ));

        Ok(self.seed_with_providers(steps, subtitle_provider, movie_provider).await)
    }

    /// Run the given steps in their fixed order
    ///
    /// A failing step is logged and recorded; the following steps still run.
    pub async fn seed_with_providers(
        &self,
        steps: &[SeedStep],
        subtitle_provider: Arc<dyn SubtitleProvider>,
        movie_provider: Arc<dyn MovieMetadataProvider>,
    ) -> SeedReport {
        let start_time = Instant::now();
        let mut report = SeedReport::default();

        for step in SeedStep::ORDER.into_iter().filter(|step| steps.contains(step)) {
            info!("Seeding {}", step);

            let result = match step {
                SeedStep::Vocabulary => self.seed_vocabulary().await.map(|r| report.vocabulary = Some(r)),
                SeedStep::Genres => movie_seeder::seed_genres(self.store.as_ref())
                    .await
                    .map(|r| report.genres = Some(r)),
                SeedStep::Movies => self
                    .seed_movies(Arc::clone(&movie_provider))
                    .await
                    .map(|r| report.movies = Some(r)),
                SeedStep::Subtitles => self
                    .seed_subtitles(Arc::clone(&subtitle_provider))
                    .await
                    .map(|r| report.subtitles = Some(r)),
            };

            if let Err(e) = result {
                error!("Seed step {} failed: {:#}", step, e);
                report.failures.push((step, format!("{:#}", e)));
            }
        }

        report.elapsed = start_time.elapsed();
        info!("Seeding complete in {}", format_duration(report.elapsed));
        report
    }

    async fn seed_vocabulary(&self) -> Result<VocabularyReport> {
        let loader = VocabularyLoader::new(self.store());
        let report = loader.load_directory(&self.config.vocabulary.directory).await?;
        info!("Vocabulary: {}", report);
        Ok(report)
    }

    async fn seed_movies(&self, provider: Arc<dyn MovieMetadataProvider>) -> Result<MovieReport> {
        let movies = &self.config.movies;
        let seeder = MovieSeeder::new(
            provider,
            self.store(),
            movies.movie_count,
            movies.poster_base_url.clone(),
            movies.backdrop_base_url.clone(),
        );

        let progress_bar = Self::progress_bar(movies.movie_count as u64, "movies");
        let report = seeder.run(&progress_bar).await?;
        info!("Movies: {}", report);
        Ok(report)
    }

    async fn seed_subtitles(&self, provider: Arc<dyn SubtitleProvider>) -> Result<BatchReport> {
        let language = language_utils::normalize_to_part1(&self.config.subtitles.language)?;
        let classifier = self.build_classifier().await?;

        let mut fetcher = SubtitleFetcher::new(provider, self.store(), classifier, language)
            .with_request_delay(Duration::from_millis(self.config.subtitles.request_delay_ms));

        let progress_bar = Self::progress_bar(0, "movies");
        let report = fetcher.run_all(&progress_bar).await?;
        info!("Subtitles: {}", report);
        Ok(report)
    }

    /// Classifier over the vocabulary currently stored
    pub async fn build_classifier(&self) -> Result<DifficultyClassifier> {
        let words = self.store.list_vocabulary().await?;
        let lexicon = Lexicon::from_records(&words);
        if lexicon.is_empty() {
            warn!("No vocabulary loaded; every script will be classified as beginner");
        }
        Ok(DifficultyClassifier::new(lexicon, self.config.classifier))
    }

    /// Row counts of the store
    pub async fn stats(&self) -> Result<StoreStats> {
        self.store.stats().await
    }

    fn progress_bar(len: u64, unit: &str) -> ProgressBar {
        let progress_bar = ProgressBar::new(len);
        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
            unit
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }
}

/// Format a duration as `1h 2m 3s`, `2m 3s` or `3.456s`
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, duration.subsec_millis())
    }
}
