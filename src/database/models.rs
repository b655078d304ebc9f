/*!
 * Database entity models and DTOs.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data. `New*` types carry the values
 * of a row that has not been written yet.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::difficulty::DifficultyLevel;

/// Vocabulary list a word was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VocabularyCategory {
    /// TOEIC exam word list
    Toeic,
    /// SAT exam word list
    Sat,
    /// Business English word list
    Business,
    /// Everyday conversation word list
    Daily,
}

impl VocabularyCategory {
    pub const ALL: [VocabularyCategory; 4] = [
        VocabularyCategory::Toeic,
        VocabularyCategory::Sat,
        VocabularyCategory::Business,
        VocabularyCategory::Daily,
    ];
}

impl fmt::Display for VocabularyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VocabularyCategory::Toeic => write!(f, "TOEIC"),
            VocabularyCategory::Sat => write!(f, "SAT"),
            VocabularyCategory::Business => write!(f, "BUSINESS"),
            VocabularyCategory::Daily => write!(f, "DAILY"),
        }
    }
}

impl std::str::FromStr for VocabularyCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "toeic" => Ok(VocabularyCategory::Toeic),
            "sat" => Ok(VocabularyCategory::Sat),
            "business" => Ok(VocabularyCategory::Business),
            "daily" => Ok(VocabularyCategory::Daily),
            _ => Err(anyhow::anyhow!("Invalid vocabulary category: {}", s)),
        }
    }
}

/// Outcome of an idempotent insert
#[derive(Debug, Clone, PartialEq)]
pub enum Upsert<T> {
    /// The row did not exist and was written
    Inserted(T),
    /// A row with the same key already existed and was left untouched
    Existing(T),
}

impl<T> Upsert<T> {
    pub fn was_inserted(&self) -> bool {
        matches!(self, Upsert::Inserted(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Upsert::Inserted(value) | Upsert::Existing(value) => value,
        }
    }
}

/// Cast member as stored on a movie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    pub character: String,
}

/// Movie row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    /// Local row id
    pub id: i64,
    /// TMDB movie id
    pub tmdb_id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    /// Full poster image URL
    pub poster_path: Option<String>,
    /// Full backdrop image URL
    pub backdrop_path: Option<String>,
    /// Runtime in minutes
    pub runtime: Option<i64>,
    /// US certification (e.g. "PG-13")
    pub rating: Option<String>,
    pub director: Option<String>,
    pub cast: Vec<CastMember>,
    pub created_at: String,
}

/// Movie values to insert
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewMovie {
    pub tmdb_id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub runtime: Option<i64>,
    pub rating: Option<String>,
    pub director: Option<String>,
    pub cast: Vec<CastMember>,
}

impl NewMovie {
    /// Minimal movie with only the identifying fields set
    pub fn new(tmdb_id: i64, title: impl Into<String>) -> Self {
        Self {
            tmdb_id,
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Genre row, keyed by the TMDB genre id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreRecord {
    pub id: i64,
    pub name: String,
}

/// Script row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptRecord {
    pub id: i64,
    pub movie_id: i64,
    pub difficulty: DifficultyLevel,
    /// Subtitle provider file id the content was downloaded from
    pub source_file_id: Option<i64>,
    /// SHA-256 of the downloaded subtitle content
    pub content_hash: String,
    pub caption_count: i64,
    pub created_at: String,
}

/// Caption row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionRecord {
    pub id: i64,
    pub script_id: i64,
    pub seq_num: i64,
    pub start_ms: i64,
    pub end_ms: i64,
    pub text: String,
    pub difficulty: DifficultyLevel,
}

/// Caption values to insert along with a script
#[derive(Debug, Clone, PartialEq)]
pub struct NewCaption {
    pub seq_num: i64,
    pub start_ms: i64,
    pub end_ms: i64,
    pub text: String,
    pub difficulty: DifficultyLevel,
}

/// A script together with all of its captions, written as one unit
#[derive(Debug, Clone, PartialEq)]
pub struct NewScript {
    pub movie_id: i64,
    pub difficulty: DifficultyLevel,
    pub source_file_id: Option<i64>,
    pub content_hash: String,
    pub captions: Vec<NewCaption>,
}

/// Vocabulary word row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyWordRecord {
    pub id: i64,
    pub word: String,
    pub meaning: String,
    pub category: VocabularyCategory,
}

/// Vocabulary word values to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVocabularyWord {
    pub word: String,
    pub meaning: String,
    pub category: VocabularyCategory,
}

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub movies: i64,
    pub genres: i64,
    pub scripts: i64,
    pub captions: i64,
    pub vocabulary_words: i64,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Movies: {}, Genres: {}, Scripts: {}, Captions: {}, Vocabulary words: {}",
            self.movies, self.genres, self.scripts, self.captions, self.vocabulary_words
        )
    }
}
