//! # Organizio - local digital-declutter store
//!
//! Keeps the records a user collects while decluttering their digital life
//! (email accounts, online accounts, password hygiene notes, social media
//! accounts, privacy settings) in a local SQLite file, next to the user's
//! preferences, the local feature flags and an opt-in analytics log.
//!
//! Organizio provides:
//! - A closed set of relations with static column schemas ([`Relation`])
//! - A SQLite-backed store with idempotent schema creation and seeding
//! - An asynchronous operation gateway that never surfaces an error to its caller
//! - A command-line front end driving the gateway

pub mod relation;
pub mod fields;
pub mod record;
pub mod analytics;
pub mod storage;
pub mod gateway;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use relation::{Column, ColumnKind, Relation};
pub use fields::{Fields, Row};
pub use record::{
    AccountRecord, AccountStatus, AnalyticsEvent, EmailRecord, FeatureFlag, LastLogin,
    PasswordHygieneRecord, Preferences, PreferencesUpdate, PrivacySettingRecord, Record,
    SocialMediaRecord, Theme,
};
pub use storage::SqliteStore;
pub use gateway::{Category, Gateway, Request, Response, WriteAck};

/// Result type alias for Organizio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Organizio operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    #[error("Unknown column '{column}' for relation {relation}")]
    UnknownColumn { relation: Relation, column: String },

    #[error("Invalid value for '{column}': {reason}")]
    InvalidField { column: String, reason: String },

    #[error("Operation '{operation}' is not supported on relation {relation}")]
    Unsupported {
        relation: Relation,
        operation: &'static str,
    },

    #[error("Store is closed")]
    Closed,

    #[error("Unknown request: {0}")]
    UnknownRequest(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
