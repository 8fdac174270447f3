//! Relations - the closed set of tables the store knows about
//!
//! Every relation maps to a static column schema. Callers address tables and
//! columns only through these definitions, never through raw identifiers:
//! - `preferences`: singleton row holding theme and analytics opt-in
//! - `feature_flags`: seeded catalog of local feature switches
//! - `emails`, `accounts`, `password_hygiene`, `social_media`, `privacy_settings`: user records
//! - `analytics`: opt-in event log

use crate::record::{ACCOUNT_STATUS_TOKENS, LAST_LOGIN_TOKENS, THEME_TOKENS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Scores (importance, password strength) live on a 0-5 scale
pub const SCORE_RANGE: (i64, i64) = (0, 5);

/// How a column is stored and exchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Integer identity assigned by the engine
    Id,
    /// Free text or an enumerated token
    Text,
    /// Signed integer (scores, references)
    Integer,
    /// Boolean in memory, 0/1 on disk
    Bool,
    /// Opaque JSON payload stored as text
    Json,
    /// ISO-8601 text maintained by the engine
    Timestamp,
}

/// Static description of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Declared NOT NULL in the schema
    pub required: bool,
    /// Inclusive bounds for integer columns
    pub range: Option<(i64, i64)>,
    /// Accepted tokens for enumerated text columns
    pub tokens: Option<&'static [&'static str]>,
}

impl Column {
    const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            range: None,
            tokens: None,
        }
    }

    const fn id() -> Self {
        Self::new("id", ColumnKind::Id)
    }

    const fn text(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    const fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Integer)
    }

    const fn boolean(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Bool)
    }

    const fn json(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Json)
    }

    const fn timestamp(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Timestamp)
    }

    const fn score(name: &'static str) -> Self {
        Self::integer(name).range(SCORE_RANGE.0, SCORE_RANGE.1)
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn range(mut self, min: i64, max: i64) -> Self {
        self.range = Some((min, max));
        self
    }

    const fn tokens(mut self, tokens: &'static [&'static str]) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Whether callers may supply a value for this column
    pub fn is_writable(&self) -> bool {
        !matches!(self.kind, ColumnKind::Id | ColumnKind::Timestamp)
    }
}

const PREFERENCES_COLUMNS: &[Column] = &[
    Column::id(),
    Column::text("theme").tokens(THEME_TOKENS),
    Column::boolean("analytics_enabled"),
    Column::timestamp("created_at"),
    Column::timestamp("updated_at"),
];

const FEATURE_FLAG_COLUMNS: &[Column] = &[
    Column::id(),
    Column::text("feature_name").required(),
    Column::boolean("is_enabled"),
    Column::boolean("is_premium"),
    Column::timestamp("created_at"),
    Column::timestamp("updated_at"),
];

const EMAIL_COLUMNS: &[Column] = &[
    Column::id(),
    Column::text("service").required(),
    Column::text("email").required(),
    Column::text("last_login").tokens(LAST_LOGIN_TOKENS),
    Column::score("importance"),
    Column::text("action_needed"),
    Column::text("notes"),
    Column::timestamp("created_at"),
    Column::timestamp("updated_at"),
];

const ACCOUNT_COLUMNS: &[Column] = &[
    Column::id(),
    Column::text("service").required(),
    Column::text("username").required(),
    Column::text("url"),
    Column::text("last_login").tokens(LAST_LOGIN_TOKENS),
    Column::score("importance"),
    Column::text("status").tokens(ACCOUNT_STATUS_TOKENS),
    Column::text("notes"),
    Column::timestamp("created_at"),
    Column::timestamp("updated_at"),
];

const PASSWORD_HYGIENE_COLUMNS: &[Column] = &[
    Column::id(),
    Column::integer("account_id"),
    Column::text("service").required(),
    Column::score("strength"),
    Column::text("last_updated"),
    Column::boolean("needs_update"),
    Column::boolean("unique_password"),
    Column::boolean("two_factor_enabled"),
    Column::text("notes"),
    Column::timestamp("created_at"),
    Column::timestamp("updated_at"),
];

const SOCIAL_MEDIA_COLUMNS: &[Column] = &[
    Column::id(),
    Column::text("platform").required(),
    Column::text("username").required(),
    Column::text("profile_url"),
    Column::text("last_post_date"),
    Column::text("post_frequency"),
    Column::score("importance"),
    Column::text("action_needed"),
    Column::text("notes"),
    Column::timestamp("created_at"),
    Column::timestamp("updated_at"),
];

const PRIVACY_SETTING_COLUMNS: &[Column] = &[
    Column::id(),
    Column::text("category").required(),
    Column::text("setting_name").required(),
    Column::text("current_status"),
    Column::text("recommended_status"),
    Column::score("importance"),
    Column::text("action_needed"),
    Column::text("notes"),
    Column::timestamp("created_at"),
    Column::timestamp("updated_at"),
];

const ANALYTICS_COLUMNS: &[Column] = &[
    Column::id(),
    Column::text("event_type").required(),
    Column::json("event_data"),
    Column::timestamp("timestamp"),
];

/// Every table in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Preferences,
    FeatureFlags,
    Emails,
    Accounts,
    PasswordHygiene,
    SocialMedia,
    PrivacySettings,
    Analytics,
}

impl Relation {
    /// Table name in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Preferences => "preferences",
            Relation::FeatureFlags => "feature_flags",
            Relation::Emails => "emails",
            Relation::Accounts => "accounts",
            Relation::PasswordHygiene => "password_hygiene",
            Relation::SocialMedia => "social_media",
            Relation::PrivacySettings => "privacy_settings",
            Relation::Analytics => "analytics",
        }
    }

    /// Get all relations, in schema creation order
    pub fn all() -> &'static [Relation] {
        &[
            Relation::Preferences,
            Relation::FeatureFlags,
            Relation::Emails,
            Relation::Accounts,
            Relation::PasswordHygiene,
            Relation::SocialMedia,
            Relation::PrivacySettings,
            Relation::Analytics,
        ]
    }

    /// Column schema, in table order
    pub fn columns(&self) -> &'static [Column] {
        match self {
            Relation::Preferences => PREFERENCES_COLUMNS,
            Relation::FeatureFlags => FEATURE_FLAG_COLUMNS,
            Relation::Emails => EMAIL_COLUMNS,
            Relation::Accounts => ACCOUNT_COLUMNS,
            Relation::PasswordHygiene => PASSWORD_HYGIENE_COLUMNS,
            Relation::SocialMedia => SOCIAL_MEDIA_COLUMNS,
            Relation::PrivacySettings => PRIVACY_SETTING_COLUMNS,
            Relation::Analytics => ANALYTICS_COLUMNS,
        }
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns().iter().find(|c| c.name == name)
    }

    /// Comma-separated column list for SELECT statements
    pub fn select_list(&self) -> String {
        self.columns()
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The relation holds exactly one row at id 1
    pub fn is_singleton(&self) -> bool {
        matches!(self, Relation::Preferences)
    }

    /// The relation carries an `updated_at` column refreshed on writes
    pub fn has_updated_at(&self) -> bool {
        self.column("updated_at").is_some()
    }
}

impl FromStr for Relation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.to_lowercase();
        Relation::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == name)
            .ok_or_else(|| Error::UnknownRelation(s.to_string()))
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relation() {
        assert_eq!("emails".parse::<Relation>().unwrap(), Relation::Emails);
        assert_eq!("Password_Hygiene".parse::<Relation>().unwrap(), Relation::PasswordHygiene);
        assert!(matches!("users".parse::<Relation>(), Err(Error::UnknownRelation(_))));
    }

    #[test]
    fn test_every_relation_has_identity_first() {
        for relation in Relation::all() {
            let first = relation.columns()[0];
            assert_eq!(first.name, "id", "{} must start with id", relation);
            assert_eq!(first.kind, ColumnKind::Id);
        }
    }

    #[test]
    fn test_access_policy() {
        assert!(Relation::Preferences.is_singleton());
        assert!(!Relation::FeatureFlags.is_singleton());
        assert!(!Relation::Analytics.has_updated_at());
        assert!(Relation::Emails.has_updated_at());
    }

    #[test]
    fn test_score_columns_are_bounded() {
        let importance = Relation::Accounts.column("importance").unwrap();
        assert_eq!(importance.range, Some((0, 5)));
        let status = Relation::Accounts.column("status").unwrap();
        assert!(status.tokens.unwrap().contains(&"delete"));
        assert!(!Relation::Emails.column("created_at").unwrap().is_writable());
    }
}
