/*!
 * # cineseed - database seeding for a movie-subtitle vocabulary app
 *
 * A Rust library that fills the database of an English learning application
 * built around movie subtitles.
 *
 * ## Features
 *
 * - Load vocabulary word lists (TOEIC, SAT, business, daily) from text files
 * - Seed the TMDB genre table
 * - Fetch popular movies with credits and certifications from TMDB
 * - Fetch subtitles from OpenSubtitles:
 *   - Parse SRT content into timed captions
 *   - Classify each caption and the whole script by vocabulary difficulty
 *   - Persist the script and its captions atomically
 * - Idempotent: re-running a pass skips everything already stored
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: SRT parsing and caption text cleanup
 * - `difficulty`: Vocabulary-based difficulty classification
 * - `subtitle_fetcher`: Per-movie fetch pipeline with throttling
 * - `movie_seeder`: Genre and TMDB movie seeding
 * - `vocabulary`: Word list discovery and loading
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Client implementations for remote services:
 *   - `providers::opensubtitles`: OpenSubtitles API client
 *   - `providers::tmdb`: TMDB API client
 * - `database`: SQLite persistence behind the `SeedStore` trait
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod subtitle_processor;
pub mod difficulty;
pub mod subtitle_fetcher;
pub mod movie_seeder;
pub mod vocabulary;
pub mod app_controller;
pub mod language_utils;
pub mod providers;
pub mod database;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::{Config, SeedStep};
pub use app_controller::{Controller, SeedReport};
pub use subtitle_processor::{Caption, ParsedSubtitles, SrtParser};
pub use difficulty::{DifficultyClassifier, DifficultyLevel, DifficultyThresholds, Lexicon};
pub use subtitle_fetcher::{BatchReport, FetchState, MovieOutcome, SubtitleFetcher};
pub use database::{DatabaseConnection, Repository, SeedStore};
pub use language_utils::{language_codes_match, normalize_to_part1, get_language_name};
pub use errors::{AppError, FetchError, PersistError, ProviderError, SubtitleError};
