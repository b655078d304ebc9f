/*!
 * Integration tests for complete seeding passes through the controller
 */

use std::path::Path;
use std::sync::Arc;
use anyhow::Result;

use cineseed::app_config::{Config, SeedStep};
use cineseed::app_controller::Controller;
use cineseed::database::models::StoreStats;
use cineseed::database::{Repository, SeedStore};
use cineseed::difficulty::DifficultyLevel;
use cineseed::movie_seeder::TMDB_GENRES;
use cineseed::providers::{MovieMetadataProvider, SubtitleProvider};
use crate::common;
use crate::common::memory_store::MemoryStore;
use crate::common::mock_providers::{MockErrorType, MockMovieProvider, MockSubtitleProvider};

/// Subtitles rich in SAT vocabulary from the shared word list fixture
const ADVANCED_SRT: &str = "1
00:00:01,000 --> 00:00:03,000
Fame is ephemeral.

2
00:00:04,000 --> 00:00:06,000
Phones are ubiquitous now.
";

fn test_config(vocabulary_dir: &Path, movie_count: usize) -> Config {
    let mut config = Config::default();
    config.vocabulary.directory = vocabulary_dir.to_path_buf();
    config.movies.movie_count = movie_count;
    config.movies.api_key = "tmdb-test-key".to_string();
    config.subtitles.api_key = "os-test-key".to_string();
    config.subtitles.request_delay_ms = 0;
    config
}

fn providers(
    subtitles: &Arc<MockSubtitleProvider>,
    movies: &Arc<MockMovieProvider>,
) -> (Arc<dyn SubtitleProvider>, Arc<dyn MovieMetadataProvider>) {
    (subtitles.clone(), movies.clone())
}

/// Test a full pass over every step
#[tokio::test]
async fn test_seed_allSteps_shouldPopulateStore() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let vocabulary_dir = common::create_vocabulary_dir(temp_dir.path())?;
    let repository = Repository::new_in_memory()?;
    let controller = Controller::with_store(test_config(&vocabulary_dir, 3), Arc::new(repository.clone()));
    let subtitle_provider = Arc::new(MockSubtitleProvider::new(ADVANCED_SRT).without_results_for(101));
    let movie_provider = Arc::new(MockMovieProvider::new(2, 2));
    let (subtitles, movies) = providers(&subtitle_provider, &movie_provider);

    let report = controller.seed_with_providers(&SeedStep::ORDER, subtitles, movies).await;

    assert!(report.is_success(), "{}", report);
    assert_eq!(report.vocabulary.unwrap().inserted, 9);
    assert_eq!(report.genres.unwrap().inserted, TMDB_GENRES.len());
    assert_eq!(report.movies.unwrap().inserted, 3);
    let batch = report.subtitles.as_ref().unwrap();
    assert_eq!((batch.done(), batch.failed()), (2, 1));

    assert_eq!(
        controller.stats().await?,
        StoreStats {
            movies: 3,
            genres: TMDB_GENRES.len() as i64,
            scripts: 2,
            captions: 4,
            vocabulary_words: 9,
        }
    );

    let movie = repository.find_movie_by_tmdb_id(100).await?.unwrap();
    let script = repository.find_script_by_movie(movie.id).await?.unwrap();
    assert_eq!(script.difficulty, DifficultyLevel::Advanced);
    Ok(())
}

/// Test that a second pass skips everything already stored
#[tokio::test]
async fn test_seed_twice_shouldBeIdempotent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let vocabulary_dir = common::create_vocabulary_dir(temp_dir.path())?;
    let controller = Controller::with_store(
        test_config(&vocabulary_dir, 2),
        Arc::new(Repository::new_in_memory()?),
    );
    let subtitle_provider = Arc::new(MockSubtitleProvider::new(common::SAMPLE_SRT));
    let movie_provider = Arc::new(MockMovieProvider::new(1, 2));

    let (subtitles, movies) = providers(&subtitle_provider, &movie_provider);
    controller.seed_with_providers(&SeedStep::ORDER, subtitles, movies).await;
    let stats_after_first = controller.stats().await?;
    let subtitle_calls = subtitle_provider.tracker().lock().unwrap().call_count();

    let (subtitles, movies) = providers(&subtitle_provider, &movie_provider);
    let report = controller.seed_with_providers(&SeedStep::ORDER, subtitles, movies).await;

    assert!(report.is_success());
    assert_eq!(report.vocabulary.unwrap().inserted, 0);
    assert_eq!(report.genres.unwrap().inserted, 0);
    assert_eq!(report.movies.unwrap().existing, 2);
    assert_eq!(report.subtitles.as_ref().unwrap().skipped(), 2);
    assert_eq!(controller.stats().await?, stats_after_first);
    assert_eq!(subtitle_provider.tracker().lock().unwrap().call_count(), subtitle_calls);
    Ok(())
}

/// Test that a failing step is recorded and later steps still run
#[tokio::test]
async fn test_seed_withFailingMoviesStep_shouldContinue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let vocabulary_dir = common::create_vocabulary_dir(temp_dir.path())?;
    let store = Arc::new(MemoryStore::new());
    let controller = Controller::with_store(test_config(&vocabulary_dir, 2), store.clone());
    let subtitle_provider = Arc::new(MockSubtitleProvider::new(common::SAMPLE_SRT));
    let movie_provider = Arc::new(MockMovieProvider::new(1, 2).failing_discover());
    let (subtitles, movies) = providers(&subtitle_provider, &movie_provider);

    let report = controller.seed_with_providers(&SeedStep::ORDER, subtitles, movies).await;

    assert!(!report.is_success());
    assert_eq!(report.failed_steps(), vec![SeedStep::Movies]);
    assert!(report.vocabulary.is_some());
    assert_eq!(report.subtitles.as_ref().unwrap().total(), 0);
    assert!(report.to_string().contains("Step movies failed"));
    Ok(())
}

/// Test running only the requested steps
#[tokio::test]
async fn test_seed_withSubset_shouldRunOnlyRequestedSteps() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let vocabulary_dir = common::create_vocabulary_dir(temp_dir.path())?;
    let store = Arc::new(MemoryStore::new());
    let controller = Controller::with_store(test_config(&vocabulary_dir, 2), store.clone());
    let subtitle_provider = Arc::new(MockSubtitleProvider::new(common::SAMPLE_SRT));
    let movie_provider = Arc::new(MockMovieProvider::new(1, 2));
    let (subtitles, movies) = providers(&subtitle_provider, &movie_provider);

    let report = controller
        .seed_with_providers(&[SeedStep::Genres, SeedStep::Vocabulary], subtitles, movies)
        .await;

    assert!(report.is_success());
    assert!(report.movies.is_none());
    assert!(report.subtitles.is_none());
    assert_eq!(movie_provider.tracker().lock().unwrap().call_count(), 0);
    assert_eq!(subtitle_provider.tracker().lock().unwrap().call_count(), 0);
    assert_eq!(store.stats().await?.vocabulary_words, 9);
    Ok(())
}

/// Test that subtitle failures do not fail the subtitles step
#[tokio::test]
async fn test_seed_withSubtitleOutage_shouldRecordPerMovieFailures() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let store = Arc::new(MemoryStore::new());
    let controller = Controller::with_store(test_config(&temp_dir.path().join("voca"), 2), store.clone());
    let subtitle_provider = Arc::new(MockSubtitleProvider::new(common::SAMPLE_SRT));
    subtitle_provider.fail_search(MockErrorType::Api);
    let movie_provider = Arc::new(MockMovieProvider::new(1, 2));
    let (subtitles, movies) = providers(&subtitle_provider, &movie_provider);

    let report = controller.seed_with_providers(&SeedStep::ORDER, subtitles, movies).await;

    assert!(report.is_success());
    assert_eq!(report.vocabulary.unwrap().files, 0);
    assert_eq!(report.subtitles.as_ref().unwrap().failed(), 2);
    assert_eq!(store.script_count(), 0);
    Ok(())
}

/// Test that seeding against the real clients checks keys before any request
#[tokio::test]
async fn test_seed_withMissingApiKey_shouldFailValidation() -> Result<()> {
    let mut config = Config::default();
    config.movies.api_key.clear();
    let controller = Controller::with_store(config, Arc::new(MemoryStore::new()));

    assert!(controller.seed(&[SeedStep::Movies]).await.is_err());
    Ok(())
}

/// Test opening a controller on a database file
#[tokio::test]
async fn test_withConfig_withDatabasePath_shouldPersistAcrossControllers() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let vocabulary_dir = common::create_vocabulary_dir(temp_dir.path())?;
    let mut config = test_config(&vocabulary_dir, 1);
    config.database_path = Some(temp_dir.path().join("seed.db"));

    let first = Controller::with_config(config.clone())?;
    let (subtitles, movies) = providers(
        &Arc::new(MockSubtitleProvider::new(common::SAMPLE_SRT)),
        &Arc::new(MockMovieProvider::new(1, 1)),
    );
    first.seed_with_providers(&[SeedStep::Vocabulary, SeedStep::Genres], subtitles, movies).await;
    drop(first);

    let second = Controller::with_config(config)?;
    let stats = second.stats().await?;
    assert_eq!(stats.vocabulary_words, 9);
    assert_eq!(stats.genres, TMDB_GENRES.len() as i64);

    let classifier = second.build_classifier().await?;
    assert_eq!(classifier.lexicon().len(), 9);
    Ok(())
}
