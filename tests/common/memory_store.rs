/*!
 * In-memory `SeedStore` for tests that do not need SQLite
 */

use async_trait::async_trait;
use anyhow::Result;
use std::sync::Mutex;

use cineseed::database::models::{
    CaptionRecord, GenreRecord, MovieRecord, NewMovie, NewScript, NewVocabularyWord,
    ScriptRecord, StoreStats, Upsert, VocabularyCategory, VocabularyWordRecord,
};
use cineseed::database::SeedStore;
use cineseed::errors::PersistError;

#[derive(Debug, Default)]
struct State {
    movies: Vec<MovieRecord>,
    genres: Vec<GenreRecord>,
    movie_genres: Vec<(i64, i64)>,
    scripts: Vec<ScriptRecord>,
    captions: Vec<CaptionRecord>,
    vocabulary: Vec<VocabularyWordRecord>,
    /// Number of `create_script` calls that should fail with a storage error
    failing_script_writes: usize,
}

/// Vec-backed store guarded by a mutex
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` script writes fail
    pub fn fail_script_writes(&self, count: usize) {
        self.state.lock().unwrap().failing_script_writes = count;
    }

    /// Number of scripts stored
    pub fn script_count(&self) -> usize {
        self.state.lock().unwrap().scripts.len()
    }
}

#[async_trait]
impl SeedStore for MemoryStore {
    async fn find_movie_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<MovieRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.movies.iter().find(|m| m.tmdb_id == tmdb_id).cloned())
    }

    async fn insert_movie_if_absent(&self, movie: &NewMovie) -> Result<Upsert<MovieRecord>> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.movies.iter().find(|m| m.tmdb_id == movie.tmdb_id) {
            return Ok(Upsert::Existing(existing.clone()));
        }

        let record = MovieRecord {
            id: state.movies.len() as i64 + 1,
            tmdb_id: movie.tmdb_id,
            title: movie.title.clone(),
            overview: movie.overview.clone(),
            release_date: movie.release_date.clone(),
            poster_path: movie.poster_path.clone(),
            backdrop_path: movie.backdrop_path.clone(),
            runtime: movie.runtime,
            rating: movie.rating.clone(),
            director: movie.director.clone(),
            cast: movie.cast.clone(),
            created_at: "now".to_string(),
        };
        state.movies.push(record.clone());
        Ok(Upsert::Inserted(record))
    }

    async fn list_movies(&self) -> Result<Vec<MovieRecord>> {
        Ok(self.state.lock().unwrap().movies.clone())
    }

    async fn find_genre(&self, genre_id: i64) -> Result<Option<GenreRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.genres.iter().find(|g| g.id == genre_id).cloned())
    }

    async fn insert_genre_if_absent(&self, genre: &GenreRecord) -> Result<Upsert<GenreRecord>> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.genres.iter().find(|g| g.id == genre.id) {
            return Ok(Upsert::Existing(existing.clone()));
        }
        state.genres.push(genre.clone());
        Ok(Upsert::Inserted(genre.clone()))
    }

    async fn link_movie_genre(&self, movie_id: i64, genre_id: i64) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if state.movie_genres.contains(&(movie_id, genre_id)) {
            return Ok(false);
        }
        state.movie_genres.push((movie_id, genre_id));
        Ok(true)
    }

    async fn list_movie_genres(&self, movie_id: i64) -> Result<Vec<GenreRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .genres
            .iter()
            .filter(|g| state.movie_genres.contains(&(movie_id, g.id)))
            .cloned()
            .collect())
    }

    async fn find_script_by_movie(&self, movie_id: i64) -> Result<Option<ScriptRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.scripts.iter().find(|s| s.movie_id == movie_id).cloned())
    }

    async fn create_script(&self, script: &NewScript) -> Result<ScriptRecord, PersistError> {
        let mut state = self.state.lock().unwrap();

        if state.failing_script_writes > 0 {
            state.failing_script_writes -= 1;
            return Err(PersistError::Storage("simulated write failure".to_string()));
        }
        if !state.movies.iter().any(|m| m.id == script.movie_id) {
            return Err(PersistError::MovieNotFound { movie_id: script.movie_id });
        }
        if state.scripts.iter().any(|s| s.movie_id == script.movie_id) {
            return Err(PersistError::DuplicateScript { movie_id: script.movie_id });
        }

        let record = ScriptRecord {
            id: state.scripts.len() as i64 + 1,
            movie_id: script.movie_id,
            difficulty: script.difficulty,
            source_file_id: script.source_file_id,
            content_hash: script.content_hash.clone(),
            caption_count: script.captions.len() as i64,
            created_at: "now".to_string(),
        };

        let first_caption_id = state.captions.len() as i64 + 1;
        for (offset, caption) in script.captions.iter().enumerate() {
            state.captions.push(CaptionRecord {
                id: first_caption_id + offset as i64,
                script_id: record.id,
                seq_num: caption.seq_num,
                start_ms: caption.start_ms,
                end_ms: caption.end_ms,
                text: caption.text.clone(),
                difficulty: caption.difficulty,
            });
        }
        state.scripts.push(record.clone());
        Ok(record)
    }

    async fn list_captions(&self, script_id: i64) -> Result<Vec<CaptionRecord>> {
        let state = self.state.lock().unwrap();
        let mut captions: Vec<CaptionRecord> =
            state.captions.iter().filter(|c| c.script_id == script_id).cloned().collect();
        captions.sort_by_key(|c| c.seq_num);
        Ok(captions)
    }

    async fn find_vocabulary_word(
        &self,
        word: &str,
        category: VocabularyCategory,
    ) -> Result<Option<VocabularyWordRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .vocabulary
            .iter()
            .find(|w| w.word == word && w.category == category)
            .cloned())
    }

    async fn insert_vocabulary_word_if_absent(
        &self,
        word: &NewVocabularyWord,
    ) -> Result<Upsert<VocabularyWordRecord>> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .vocabulary
            .iter()
            .find(|w| w.word == word.word && w.category == word.category)
        {
            return Ok(Upsert::Existing(existing.clone()));
        }

        let record = VocabularyWordRecord {
            id: state.vocabulary.len() as i64 + 1,
            word: word.word.clone(),
            meaning: word.meaning.clone(),
            category: word.category,
        };
        state.vocabulary.push(record.clone());
        Ok(Upsert::Inserted(record))
    }

    async fn list_vocabulary(&self) -> Result<Vec<VocabularyWordRecord>> {
        Ok(self.state.lock().unwrap().vocabulary.clone())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let state = self.state.lock().unwrap();
        Ok(StoreStats {
            movies: state.movies.len() as i64,
            genres: state.genres.len() as i64,
            scripts: state.scripts.len() as i64,
            captions: state.captions.len() as i64,
            vocabulary_words: state.vocabulary.len() as i64,
        })
    }
}
