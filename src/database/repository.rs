/*!
 * Repository layer for database operations.
 *
 * This module implements `SeedStore` on top of SQLite, abstracting away the
 * SQL details and providing type-safe access. Idempotent inserts check for an
 * existing row inside the same transaction before writing.
 */

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::errors::PersistError;
use super::connection::DatabaseConnection;
use super::models::{
    CaptionRecord, GenreRecord, MovieRecord, NewMovie, NewScript, NewVocabularyWord,
    ScriptRecord, StoreStats, Upsert, VocabularyCategory, VocabularyWordRecord,
};
use super::store::SeedStore;

const MOVIE_COLUMNS: &str = "id, tmdb_id, title, overview, release_date, poster_path, backdrop_path, \
                             runtime, rating, director, cast_json, created_at";

const SCRIPT_COLUMNS: &str =
    "id, movie_id, difficulty, source_file_id, content_hash, caption_count, created_at";

/// SQLite-backed repository
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

// =========================================================================
// Row mapping helpers
// =========================================================================

fn parse_text_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = anyhow::Error>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: anyhow::Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

fn movie_from_row(row: &Row) -> rusqlite::Result<MovieRecord> {
    let cast_json: String = row.get(10)?;
    let cast = serde_json::from_str(&cast_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(MovieRecord {
        id: row.get(0)?,
        tmdb_id: row.get(1)?,
        title: row.get(2)?,
        overview: row.get(3)?,
        release_date: row.get(4)?,
        poster_path: row.get(5)?,
        backdrop_path: row.get(6)?,
        runtime: row.get(7)?,
        rating: row.get(8)?,
        director: row.get(9)?,
        cast,
        created_at: row.get(11)?,
    })
}

fn script_from_row(row: &Row) -> rusqlite::Result<ScriptRecord> {
    Ok(ScriptRecord {
        id: row.get(0)?,
        movie_id: row.get(1)?,
        difficulty: parse_text_column(row, 2)?,
        source_file_id: row.get(3)?,
        content_hash: row.get(4)?,
        caption_count: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn vocabulary_from_row(row: &Row) -> rusqlite::Result<VocabularyWordRecord> {
    Ok(VocabularyWordRecord {
        id: row.get(0)?,
        word: row.get(1)?,
        meaning: row.get(2)?,
        category: parse_text_column(row, 3)?,
    })
}

fn find_movie_by_tmdb_id_sync(conn: &Connection, tmdb_id: i64) -> Result<Option<MovieRecord>> {
    let sql = format!("SELECT {} FROM movies WHERE tmdb_id = ?1", MOVIE_COLUMNS);
    Ok(conn.query_row(&sql, [tmdb_id], movie_from_row).optional()?)
}

fn find_genre_sync(conn: &Connection, genre_id: i64) -> Result<Option<GenreRecord>> {
    Ok(conn
        .query_row("SELECT id, name FROM genres WHERE id = ?1", [genre_id], |row| {
            Ok(GenreRecord {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .optional()?)
}

fn find_script_by_movie_sync(conn: &Connection, movie_id: i64) -> Result<Option<ScriptRecord>> {
    let sql = format!("SELECT {} FROM scripts WHERE movie_id = ?1", SCRIPT_COLUMNS);
    Ok(conn.query_row(&sql, [movie_id], script_from_row).optional()?)
}

fn find_vocabulary_word_sync(
    conn: &Connection,
    word: &str,
    category: VocabularyCategory,
) -> Result<Option<VocabularyWordRecord>> {
    Ok(conn
        .query_row(
            "SELECT id, word, meaning, category FROM vocabulary_words WHERE word = ?1 AND category = ?2",
            params![word, category.to_string()],
            vocabulary_from_row,
        )
        .optional()?)
}

fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}

#[async_trait]
impl SeedStore for Repository {
    // =========================================================================
    // Movie Operations
    // =========================================================================

    async fn find_movie_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<MovieRecord>> {
        self.db
            .execute_async(move |conn| find_movie_by_tmdb_id_sync(conn, tmdb_id))
            .await
    }

    async fn insert_movie_if_absent(&self, movie: &NewMovie) -> Result<Upsert<MovieRecord>> {
        let movie = movie.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .transaction_async(move |tx| {
                if let Some(existing) = find_movie_by_tmdb_id_sync(tx, movie.tmdb_id)? {
                    return Ok(Upsert::Existing(existing));
                }

                let cast_json = serde_json::to_string(&movie.cast)?;
                tx.execute(
                    r#"
                    INSERT INTO movies (
                        tmdb_id, title, overview, release_date, poster_path, backdrop_path,
                        runtime, rating, director, cast_json, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                    "#,
                    params![
                        movie.tmdb_id,
                        movie.title,
                        movie.overview,
                        movie.release_date,
                        movie.poster_path,
                        movie.backdrop_path,
                        movie.runtime,
                        movie.rating,
                        movie.director,
                        cast_json,
                        now,
                    ],
                )?;

                let inserted = find_movie_by_tmdb_id_sync(tx, movie.tmdb_id)?
                    .ok_or_else(|| anyhow!("Movie {} missing after insert", movie.tmdb_id))?;
                Ok(Upsert::Inserted(inserted))
            })
            .await
    }

    async fn list_movies(&self) -> Result<Vec<MovieRecord>> {
        self.db
            .execute_async(|conn| {
                let sql = format!("SELECT {} FROM movies ORDER BY id", MOVIE_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let movies = stmt
                    .query_map([], movie_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(movies)
            })
            .await
    }

    // =========================================================================
    // Genre Operations
    // =========================================================================

    async fn find_genre(&self, genre_id: i64) -> Result<Option<GenreRecord>> {
        self.db
            .execute_async(move |conn| find_genre_sync(conn, genre_id))
            .await
    }

    async fn insert_genre_if_absent(&self, genre: &GenreRecord) -> Result<Upsert<GenreRecord>> {
        let genre = genre.clone();

        self.db
            .transaction_async(move |tx| {
                if let Some(existing) = find_genre_sync(tx, genre.id)? {
                    return Ok(Upsert::Existing(existing));
                }
                tx.execute(
                    "INSERT INTO genres (id, name) VALUES (?1, ?2)",
                    params![genre.id, genre.name],
                )?;
                Ok(Upsert::Inserted(genre))
            })
            .await
    }

    async fn link_movie_genre(&self, movie_id: i64, genre_id: i64) -> Result<bool> {
        self.db
            .execute_async(move |conn| {
                let changed = conn.execute(
                    "INSERT OR IGNORE INTO movie_genres (movie_id, genre_id) VALUES (?1, ?2)",
                    [movie_id, genre_id],
                )?;
                Ok(changed > 0)
            })
            .await
    }

    async fn list_movie_genres(&self, movie_id: i64) -> Result<Vec<GenreRecord>> {
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT g.id, g.name
                    FROM genres g
                    INNER JOIN movie_genres mg ON mg.genre_id = g.id
                    WHERE mg.movie_id = ?1
                    ORDER BY g.id
                    "#,
                )?;
                let genres = stmt
                    .query_map([movie_id], |row| {
                        Ok(GenreRecord {
                            id: row.get(0)?,
                            name: row.get(1)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(genres)
            })
            .await
    }

    // =========================================================================
    // Script Operations
    // =========================================================================

    async fn find_script_by_movie(&self, movie_id: i64) -> Result<Option<ScriptRecord>> {
        self.db
            .execute_async(move |conn| find_script_by_movie_sync(conn, movie_id))
            .await
    }

    async fn create_script(&self, script: &NewScript) -> Result<ScriptRecord, PersistError> {
        let script = script.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .transaction_async(move |tx| {
                let movie_exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM movies WHERE id = ?1)",
                    [script.movie_id],
                    |row| row.get(0),
                )?;
                if !movie_exists {
                    return Err(PersistError::MovieNotFound { movie_id: script.movie_id }.into());
                }

                if find_script_by_movie_sync(tx, script.movie_id)?.is_some() {
                    return Err(PersistError::DuplicateScript { movie_id: script.movie_id }.into());
                }

                tx.execute(
                    r#"
                    INSERT INTO scripts (movie_id, difficulty, source_file_id, content_hash, caption_count, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![
                        script.movie_id,
                        script.difficulty.to_string(),
                        script.source_file_id,
                        script.content_hash,
                        script.captions.len() as i64,
                        now,
                    ],
                )?;
                let script_id = tx.last_insert_rowid();

                {
                    let mut stmt = tx.prepare(
                        r#"
                        INSERT INTO captions (script_id, seq_num, start_ms, end_ms, text, difficulty)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                        "#,
                    )?;
                    for caption in &script.captions {
                        stmt.execute(params![
                            script_id,
                            caption.seq_num,
                            caption.start_ms,
                            caption.end_ms,
                            caption.text,
                            caption.difficulty.to_string(),
                        ])?;
                    }
                }

                debug!(
                    "Stored script {} with {} captions for movie {}",
                    script_id,
                    script.captions.len(),
                    script.movie_id
                );

                find_script_by_movie_sync(tx, script.movie_id)?
                    .ok_or_else(|| anyhow!("Script for movie {} missing after insert", script.movie_id))
            })
            .await
            .map_err(PersistError::from)
    }

    async fn list_captions(&self, script_id: i64) -> Result<Vec<CaptionRecord>> {
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, script_id, seq_num, start_ms, end_ms, text, difficulty
                    FROM captions
                    WHERE script_id = ?1
                    ORDER BY seq_num
                    "#,
                )?;
                let captions = stmt
                    .query_map([script_id], |row| {
                        Ok(CaptionRecord {
                            id: row.get(0)?,
                            script_id: row.get(1)?,
                            seq_num: row.get(2)?,
                            start_ms: row.get(3)?,
                            end_ms: row.get(4)?,
                            text: row.get(5)?,
                            difficulty: parse_text_column(row, 6)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(captions)
            })
            .await
    }

    // =========================================================================
    // Vocabulary Operations
    // =========================================================================

    async fn find_vocabulary_word(
        &self,
        word: &str,
        category: VocabularyCategory,
    ) -> Result<Option<VocabularyWordRecord>> {
        let word = word.to_string();

        self.db
            .execute_async(move |conn| find_vocabulary_word_sync(conn, &word, category))
            .await
    }

    async fn insert_vocabulary_word_if_absent(
        &self,
        word: &NewVocabularyWord,
    ) -> Result<Upsert<VocabularyWordRecord>> {
        let word = word.clone();

        self.db
            .transaction_async(move |tx| {
                if let Some(existing) = find_vocabulary_word_sync(tx, &word.word, word.category)? {
                    return Ok(Upsert::Existing(existing));
                }
                tx.execute(
                    "INSERT INTO vocabulary_words (word, meaning, category) VALUES (?1, ?2, ?3)",
                    params![word.word, word.meaning, word.category.to_string()],
                )?;
                Ok(Upsert::Inserted(VocabularyWordRecord {
                    id: tx.last_insert_rowid(),
                    word: word.word,
                    meaning: word.meaning,
                    category: word.category,
                }))
            })
            .await
    }

    async fn list_vocabulary(&self) -> Result<Vec<VocabularyWordRecord>> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, word, meaning, category FROM vocabulary_words ORDER BY category, word",
                )?;
                let words = stmt
                    .query_map([], vocabulary_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(words)
            })
            .await
    }

    async fn stats(&self) -> Result<StoreStats> {
        self.db
            .execute_async(|conn| {
                Ok(StoreStats {
                    movies: count_rows(conn, "movies")?,
                    genres: count_rows(conn, "genres")?,
                    scripts: count_rows(conn, "scripts")?,
                    captions: count_rows(conn, "captions")?,
                    vocabulary_words: count_rows(conn, "vocabulary_words")?,
                })
            })
            .await
    }
}
