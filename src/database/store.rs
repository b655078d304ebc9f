/*!
 * Storage interface used by the seeding steps.
 *
 * Every write is either an explicit "insert if absent" with a matching
 * `find_*` lookup, or the all-or-nothing `create_script`. Seeding code only
 * talks to this trait, so it can run against SQLite or an in-memory double.
 */

use anyhow::Result;
use async_trait::async_trait;

use crate::errors::PersistError;
use super::models::{
    CaptionRecord, GenreRecord, MovieRecord, NewMovie, NewScript, NewVocabularyWord,
    ScriptRecord, StoreStats, Upsert, VocabularyCategory, VocabularyWordRecord,
};

#[async_trait]
pub trait SeedStore: Send + Sync {
    /// Look up a movie by its TMDB id
    async fn find_movie_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<MovieRecord>>;

    /// Insert a movie unless one with the same TMDB id exists
    async fn insert_movie_if_absent(&self, movie: &NewMovie) -> Result<Upsert<MovieRecord>>;

    /// All movies ordered by local id
    async fn list_movies(&self) -> Result<Vec<MovieRecord>>;

    async fn find_genre(&self, genre_id: i64) -> Result<Option<GenreRecord>>;

    async fn insert_genre_if_absent(&self, genre: &GenreRecord) -> Result<Upsert<GenreRecord>>;

    /// Link a movie to a genre; returns false when the link already existed
    async fn link_movie_genre(&self, movie_id: i64, genre_id: i64) -> Result<bool>;

    async fn list_movie_genres(&self, movie_id: i64) -> Result<Vec<GenreRecord>>;

    async fn find_script_by_movie(&self, movie_id: i64) -> Result<Option<ScriptRecord>>;

    /// Write a script and all of its captions atomically
    ///
    /// Fails with `PersistError::DuplicateScript` if the movie already owns a
    /// script and with `PersistError::MovieNotFound` for an unknown movie.
    async fn create_script(&self, script: &NewScript) -> Result<ScriptRecord, PersistError>;

    /// Captions of a script ordered by sequence number
    async fn list_captions(&self, script_id: i64) -> Result<Vec<CaptionRecord>>;

    async fn find_vocabulary_word(
        &self,
        word: &str,
        category: VocabularyCategory,
    ) -> Result<Option<VocabularyWordRecord>>;

    async fn insert_vocabulary_word_if_absent(
        &self,
        word: &NewVocabularyWord,
    ) -> Result<Upsert<VocabularyWordRecord>>;

    async fn list_vocabulary(&self) -> Result<Vec<VocabularyWordRecord>>;

    async fn stats(&self) -> Result<StoreStats>;
}
