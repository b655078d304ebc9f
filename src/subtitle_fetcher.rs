/*!
 * Subtitle fetch orchestration.
 *
 * For each movie the fetcher walks a fixed sequence of states:
 *
 * `Pending -> Searching -> Downloading -> Parsing -> Classifying -> Persisting -> Done`
 *
 * A movie that already owns a script ends in `Skipped` without any network
 * call. Any error ends the movie in `Failed`; the error is recorded in the
 * movie's outcome and the batch moves on to the next movie.
 */

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use log::{debug, error, info, warn};
use tokio::time::Instant;

use crate::database::models::{MovieRecord, NewCaption, NewScript};
use crate::database::SeedStore;
use crate::difficulty::{DifficultyClassifier, DifficultyLevel};
use crate::errors::{FetchError, PersistError, SubtitleError};
use crate::providers::SubtitleProvider;
use crate::subtitle_processor::{content_hash, Caption, SrtParser};

/// Default pause between the end of one network attempt and the start of the next
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(1000);

/// Position of a movie in the fetch pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchState {
    Pending,
    Searching,
    Downloading,
    Parsing,
    Classifying,
    Persisting,
    Done,
    /// The movie already had a script
    Skipped,
    Failed,
}

impl FetchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchState::Done | FetchState::Skipped | FetchState::Failed)
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchState::Pending => "pending",
            FetchState::Searching => "searching",
            FetchState::Downloading => "downloading",
            FetchState::Parsing => "parsing",
            FetchState::Classifying => "classifying",
            FetchState::Persisting => "persisting",
            FetchState::Done => "done",
            FetchState::Skipped => "skipped",
            FetchState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// What happened to one movie
#[derive(Debug)]
pub struct MovieOutcome {
    /// Local movie id
    pub movie_id: i64,
    pub tmdb_id: i64,
    pub title: String,
    /// Terminal state
    pub state: FetchState,
    pub script_id: Option<i64>,
    pub difficulty: Option<DifficultyLevel>,
    pub caption_count: usize,
    /// Malformed subtitle blocks skipped while parsing
    pub skipped_blocks: usize,
    pub error: Option<FetchError>,
    /// State the movie was in when it failed
    pub failed_during: Option<FetchState>,
}

impl MovieOutcome {
    fn new(movie: &MovieRecord, state: FetchState) -> Self {
        Self {
            movie_id: movie.id,
            tmdb_id: movie.tmdb_id,
            title: movie.title.clone(),
            state,
            script_id: None,
            difficulty: None,
            caption_count: 0,
            skipped_blocks: 0,
            error: None,
            failed_during: None,
        }
    }
}

/// Outcome of one batch
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Per-movie outcomes in processing order
    pub outcomes: Vec<MovieOutcome>,
}

impl BatchReport {
    fn count(&self, state: FetchState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }

    pub fn done(&self) -> usize {
        self.count(FetchState::Done)
    }

    pub fn skipped(&self) -> usize {
        self.count(FetchState::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(FetchState::Failed)
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} movie(s): {} done, {} skipped, {} failed",
            self.total(),
            self.done(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Script built from downloaded content, ready to persist
struct PreparedScript {
    script: NewScript,
    skipped_blocks: usize,
}

/// Sequential subtitle fetcher with request throttling
pub struct SubtitleFetcher {
    provider: Arc<dyn SubtitleProvider>,
    store: Arc<dyn SeedStore>,
    classifier: DifficultyClassifier,
    /// Subtitle language requested from the provider
    language: String,
    /// Pause after each network attempt
    request_delay: Duration,
    /// End of the previous network attempt
    last_attempt_end: Option<Instant>,
}

impl SubtitleFetcher {
    pub fn new(
        provider: Arc<dyn SubtitleProvider>,
        store: Arc<dyn SeedStore>,
        classifier: DifficultyClassifier,
        language: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            store,
            classifier,
            language: language.into(),
            request_delay: DEFAULT_REQUEST_DELAY,
            last_attempt_end: None,
        }
    }

    /// Set the pause between the end of one attempt and the start of the next
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    /// Process every stored movie in order
    pub async fn run_all(&mut self, progress: &ProgressBar) -> anyhow::Result<BatchReport> {
        let movies = self.store.list_movies().await?;
        Ok(self.run_batch(&movies, progress).await)
    }

    /// Process the given movies one at a time
    pub async fn run_batch(&mut self, movies: &[MovieRecord], progress: &ProgressBar) -> BatchReport {
        progress.set_length(movies.len() as u64);
        let mut report = BatchReport::default();

        for (index, movie) in movies.iter().enumerate() {
            progress.set_message(movie.title.clone());
            info!("Processing movie {}/{}: {}", index + 1, movies.len(), movie.title);

            let outcome = self.process_movie(movie).await;
            match outcome.state {
                FetchState::Done => info!(
                    "Stored {} captions for {} ({})",
                    outcome.caption_count,
                    movie.title,
                    outcome.difficulty.map(|d| d.to_string()).unwrap_or_default()
                ),
                FetchState::Skipped => info!("Skipping {}: script already exists", movie.title),
                _ => {}
            }

            report.outcomes.push(outcome);
            progress.inc(1);
        }

        progress.finish_with_message(report.to_string());
        report
    }

    /// Run one movie through the pipeline; never fails, errors land in the outcome
    pub async fn process_movie(&mut self, movie: &MovieRecord) -> MovieOutcome {
        match self.store.find_script_by_movie(movie.id).await {
            Ok(Some(_)) => {
                debug!("Movie {} ({}): {} -> {}", movie.id, movie.title, FetchState::Pending, FetchState::Skipped);
                return MovieOutcome::new(movie, FetchState::Skipped);
            }
            Ok(None) => {}
            Err(e) => {
                let error = FetchError::Persist(PersistError::from(e));
                return self.fail(movie, FetchState::Pending, error);
            }
        }

        self.throttle().await;

        let mut state = FetchState::Pending;
        let result = self.fetch_and_store(movie, &mut state).await;
        self.last_attempt_end = Some(Instant::now());

        match result {
            Ok(outcome) => outcome,
            Err(FetchError::Duplicate { .. }) => {
                self.transition(movie, &mut state, FetchState::Skipped);
                MovieOutcome::new(movie, FetchState::Skipped)
            }
            Err(error) => self.fail(movie, state, error),
        }
    }

    async fn fetch_and_store(
        &self,
        movie: &MovieRecord,
        state: &mut FetchState,
    ) -> Result<MovieOutcome, FetchError> {
        self.transition(movie, state, FetchState::Searching);
        let candidates = self.provider.search(movie.tmdb_id, &self.language).await?;
        let candidate = candidates.first().ok_or_else(|| {
            FetchError::NotFound(format!("no {} subtitles for TMDB id {}", self.language, movie.tmdb_id))
        })?;
        let file_id = *candidate.file_ids.first().ok_or_else(|| {
            FetchError::NotFound(format!("subtitle {} has no downloadable file", candidate.subtitle_id))
        })?;

        self.transition(movie, state, FetchState::Downloading);
        let link = self.provider.request_download(file_id).await?;
        let content = self.provider.fetch_content(&link).await?;

        self.transition(movie, state, FetchState::Parsing);
        let parsed = SrtParser::parse(&content);
        if parsed.is_empty() {
            return Err(SubtitleError::NoCaptions { skipped_blocks: parsed.skipped_blocks }.into());
        }

        self.transition(movie, state, FetchState::Classifying);
        let prepared = PreparedScript {
            script: self.build_script(movie.id, Some(file_id), &content, &parsed.captions),
            skipped_blocks: parsed.skipped_blocks,
        };

        self.transition(movie, state, FetchState::Persisting);
        let stored = self.store.create_script(&prepared.script).await?;

        self.transition(movie, state, FetchState::Done);
        let mut outcome = MovieOutcome::new(movie, FetchState::Done);
        outcome.script_id = Some(stored.id);
        outcome.difficulty = Some(stored.difficulty);
        outcome.caption_count = prepared.script.captions.len();
        outcome.skipped_blocks = prepared.skipped_blocks;
        Ok(outcome)
    }

    /// Label every caption and the script as a whole
    fn build_script(
        &self,
        movie_id: i64,
        source_file_id: Option<i64>,
        content: &str,
        captions: &[Caption],
    ) -> NewScript {
        let new_captions = captions
            .iter()
            .map(|caption| NewCaption {
                seq_num: caption.seq_num as i64,
                start_ms: caption.start_ms as i64,
                end_ms: caption.end_ms as i64,
                text: caption.text.clone(),
                difficulty: self.classifier.classify_caption(caption),
            })
            .collect();

        NewScript {
            movie_id,
            difficulty: self.classifier.classify_script(captions),
            source_file_id,
            content_hash: content_hash(content),
            captions: new_captions,
        }
    }

    fn transition(&self, movie: &MovieRecord, state: &mut FetchState, next: FetchState) {
        debug!("Movie {} ({}): {} -> {}", movie.id, movie.title, state, next);
        *state = next;
    }

    fn fail(&self, movie: &MovieRecord, during: FetchState, error: FetchError) -> MovieOutcome {
        match &error {
            FetchError::NotFound(_) => warn!(
                "No subtitles for movie {} '{}' (TMDB {}): {}",
                movie.id, movie.title, movie.tmdb_id, error
            ),
            _ => error!(
                "Failed to fetch subtitles for movie {} '{}' (TMDB {}) while {}: {}",
                movie.id, movie.title, movie.tmdb_id, during, error
            ),
        }
        debug!("Movie {} ({}): {} -> {}", movie.id, movie.title, during, FetchState::Failed);

        let mut outcome = MovieOutcome::new(movie, FetchState::Failed);
        outcome.failed_during = Some(during);
        outcome.error = Some(error);
        outcome
    }

    /// Wait until `request_delay` has passed since the previous attempt finished
    async fn throttle(&self) {
        if let Some(end) = self.last_attempt_end {
            let resume_at = end + self.request_delay;
            let wait = resume_at.saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                debug!("Throttling subtitle requests for {:?}", wait);
                tokio::time::sleep_until(resume_at).await;
            }
        }
    }
}
