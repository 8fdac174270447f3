//! Storage Layer - SQLite-backed persistence
//!
//! One database file holds every relation:
//! - preferences (singleton), feature_flags
//! - emails, accounts, password_hygiene, social_media, privacy_settings
//! - analytics (opt-in event log)

pub mod schema;
pub mod sqlite;

pub use sqlite::{DbStats, PREFERENCES_ID, Snapshot, SqliteStore};
