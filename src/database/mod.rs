/*!
 * Database module for persistent storage of seeded content.
 *
 * This module provides SQLite-based persistence for:
 * - Movies, genres and their links
 * - Subtitle scripts with their timed captions
 * - Vocabulary words grouped by category
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;
pub mod store;

// Re-export main types
pub use connection::DatabaseConnection;
pub use repository::Repository;
pub use store::SeedStore;
