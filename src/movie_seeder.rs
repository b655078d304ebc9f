/*!
 * Genre and movie metadata seeding.
 *
 * Genres come from the fixed TMDB genre list. Movies are discovered page by
 * page from TMDB, enriched with credits and release certifications, and
 * inserted unless a movie with the same TMDB id already exists.
 */

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use indicatif::ProgressBar;
use log::{debug, info, warn};

use crate::database::models::{CastMember, GenreRecord, NewMovie};
use crate::database::SeedStore;
use crate::errors::ProviderError;
use crate::providers::{MovieDetails, MovieMetadataProvider};

/// TMDB movie genres as `(id, name)`
pub const TMDB_GENRES: [(i64, &str); 19] = [
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

/// Number of cast members kept per movie
pub const TOP_CAST_SIZE: usize = 5;

/// Upper bound on discover pages, as served by TMDB
pub const MAX_DISCOVER_PAGES: u32 = 500;

/// Counts of a genre seeding pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenreReport {
    pub inserted: usize,
    pub existing: usize,
}

impl fmt::Display for GenreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} inserted, {} already present", self.inserted, self.existing)
    }
}

/// Insert the TMDB genres that are not stored yet
pub async fn seed_genres(store: &dyn SeedStore) -> Result<GenreReport> {
    let mut report = GenreReport::default();

    for (id, name) in TMDB_GENRES {
        let genre = GenreRecord { id, name: name.to_string() };
        if store.insert_genre_if_absent(&genre).await?.was_inserted() {
            debug!("Added genre {} ({})", name, id);
            report.inserted += 1;
        } else {
            report.existing += 1;
        }
    }

    Ok(report)
}

/// Counts of a movie seeding pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovieReport {
    /// Movies for which details were fetched
    pub processed: usize,
    pub inserted: usize,
    pub existing: usize,
    /// Movies whose details request failed
    pub failed: usize,
    pub genre_links: usize,
}

impl fmt::Display for MovieReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed: {} inserted, {} already present, {} failed, {} genre link(s)",
            self.processed, self.inserted, self.existing, self.failed, self.genre_links
        )
    }
}

/// Name of the first crew member credited as director
pub fn find_director(details: &MovieDetails) -> Option<String> {
    details
        .crew
        .iter()
        .find(|member| member.job == "Director")
        .map(|member| member.name.clone())
}

/// Top billed cast members
pub fn top_cast(details: &MovieDetails) -> Vec<CastMember> {
    details
        .cast
        .iter()
        .take(TOP_CAST_SIZE)
        .map(|entry| CastMember {
            name: entry.name.clone(),
            character: entry.character.clone(),
        })
        .collect()
}

/// First non-empty US certification
pub fn us_certification(details: &MovieDetails) -> Option<String> {
    details
        .release_certifications
        .iter()
        .find(|release| release.country == "US")?
        .certifications
        .iter()
        .find(|certification| !certification.trim().is_empty())
        .cloned()
}

/// Join a base image URL and a relative image path
fn image_url(base: &str, path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{}{}", base.trim_end_matches('/'), p))
}

/// Seeds movies from a metadata provider
pub struct MovieSeeder {
    provider: Arc<dyn MovieMetadataProvider>,
    store: Arc<dyn SeedStore>,
    /// Number of movies to process
    movie_count: usize,
    poster_base_url: String,
    backdrop_base_url: String,
}

impl MovieSeeder {
    pub fn new(
        provider: Arc<dyn MovieMetadataProvider>,
        store: Arc<dyn SeedStore>,
        movie_count: usize,
        poster_base_url: impl Into<String>,
        backdrop_base_url: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            store,
            movie_count,
            poster_base_url: poster_base_url.into(),
            backdrop_base_url: backdrop_base_url.into(),
        }
    }

    /// Build the stored movie from its details
    pub fn build_movie(&self, details: &MovieDetails) -> NewMovie {
        NewMovie {
            tmdb_id: details.tmdb_id,
            title: details.title.clone(),
            overview: details.overview.clone(),
            release_date: details.release_date.clone(),
            poster_path: image_url(&self.poster_base_url, details.poster_path.as_deref()),
            backdrop_path: image_url(&self.backdrop_base_url, details.backdrop_path.as_deref()),
            runtime: details.runtime,
            rating: us_certification(details),
            director: find_director(details),
            cast: top_cast(details),
        }
    }

    /// Page through discovery until enough movies were processed
    ///
    /// A failed discover page aborts the pass with that error. A failed
    /// details request only skips the movie.
    pub async fn run(&self, progress: &ProgressBar) -> Result<MovieReport> {
        let mut report = MovieReport::default();
        progress.set_length(self.movie_count as u64);

        let mut page = 1;
        'pages: while report.processed + report.failed < self.movie_count && page <= MAX_DISCOVER_PAGES {
            let movies = self.provider.discover_movies(page).await?;
            if movies.is_empty() {
                info!("TMDB discovery exhausted at page {}", page);
                break;
            }

            for discovered in movies {
                if report.processed + report.failed >= self.movie_count {
                    break 'pages;
                }
                progress.set_message(discovered.title.clone());

                match self.provider.movie_details(discovered.tmdb_id).await {
                    Ok(details) => {
                        report.processed += 1;
                        self.store_movie(&details, &discovered.genre_ids, &mut report).await?;
                    }
                    Err(e) => {
                        report.failed += 1;
                        log_details_error(discovered.tmdb_id, &discovered.title, &e);
                    }
                }
                progress.inc(1);
            }

            page += 1;
        }

        progress.finish_with_message(report.to_string());
        Ok(report)
    }

    async fn store_movie(&self, details: &MovieDetails, listed_genres: &[i64], report: &mut MovieReport) -> Result<()> {
        let upsert = self.store.insert_movie_if_absent(&self.build_movie(details)).await?;
        if upsert.was_inserted() {
            report.inserted += 1;
            info!("Added movie: {}", details.title);
        } else {
            report.existing += 1;
            debug!("Movie already present: {}", details.title);
        }
        let movie = upsert.into_inner();

        let genre_ids = if listed_genres.is_empty() { &details.genre_ids } else { listed_genres };
        for &genre_id in genre_ids {
            if self.store.find_genre(genre_id).await?.is_none() {
                debug!("Genre {} not seeded, skipping link for {}", genre_id, details.title);
                continue;
            }
            if self.store.link_movie_genre(movie.id, genre_id).await? {
                report.genre_links += 1;
            }
        }

        Ok(())
    }
}

fn log_details_error(tmdb_id: i64, title: &str, error: &ProviderError) {
    warn!("Skipping movie {} ({}): details request failed: {}", title, tmdb_id, error);
}
