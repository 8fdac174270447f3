//! Typed records - the in-memory model of each relation
//!
//! Rows come out of the store as [`crate::Row`] maps; every type here can be
//! decoded from one. Booleans are real `bool`s, enumerated text columns are
//! enums, and timestamps stay as the ISO-8601 strings the engine wrote.

use crate::relation::Relation;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Accepted values of `preferences.theme`
pub const THEME_TOKENS: &[&str] = &["light", "dark"];

/// Accepted values of `last_login` columns
pub const LAST_LOGIN_TOKENS: &[&str] = &[
    "today",
    "this-week",
    "this-month",
    "3-months",
    "6-months",
    "year",
    "more-than-year",
    "unknown",
];

/// Accepted values of `accounts.status`
pub const ACCOUNT_STATUS_TOKENS: &[&str] = &["active", "inactive", "delete", "unknown"];

/// A type decodable from rows of one relation
pub trait Record: DeserializeOwned {
    const RELATION: Relation;
}

/// Accepts `true`/`false` as well as the `1`/`0` integers UI layers tend to send.
/// `null` reads as absent.
fn opt_bool_or_int<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    }))
}

/// Nullable numeric and boolean columns decode NULL as the column default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `unique_password` defaults to true in the schema
fn null_as_true<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

/// UI colour theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(Error::InvalidField {
                column: "theme".to_string(),
                reason: format!("expected one of {}, got '{}'", THEME_TOKENS.join("/"), s),
            }),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How long ago an account was last used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LastLogin {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "this-week")]
    ThisWeek,
    #[serde(rename = "this-month")]
    ThisMonth,
    #[serde(rename = "3-months")]
    ThreeMonths,
    #[serde(rename = "6-months")]
    SixMonths,
    #[serde(rename = "year")]
    Year,
    #[serde(rename = "more-than-year")]
    MoreThanYear,
    #[serde(rename = "unknown")]
    Unknown,
}

impl LastLogin {
    /// Unused for a year or longer; a candidate for deletion
    pub fn is_stale(&self) -> bool {
        matches!(self, LastLogin::Year | LastLogin::MoreThanYear)
    }

    pub fn label(&self) -> &'static str {
        match self {
            LastLogin::Today => "Today",
            LastLogin::ThisWeek => "This week",
            LastLogin::ThisMonth => "This month",
            LastLogin::ThreeMonths => "Within 3 months",
            LastLogin::SixMonths => "Within 6 months",
            LastLogin::Year => "Within a year",
            LastLogin::MoreThanYear => "More than a year ago",
            LastLogin::Unknown => "Unknown",
        }
    }
}

/// What the user intends to do with an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    /// Marked for deletion
    Delete,
    Unknown,
}

/// Coarse grouping of a 0-5 importance score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportanceTier {
    Low,
    Medium,
    High,
}

impl ImportanceTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=1 => ImportanceTier::Low,
            2..=3 => ImportanceTier::Medium,
            _ => ImportanceTier::High,
        }
    }
}

/// The singleton preferences row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub id: i64,
    pub theme: Theme,
    pub analytics_enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Record for Preferences {
    const RELATION: Relation = Relation::Preferences;
}

/// New values for the preferences row. A field left as `None` keeps its
/// stored value, so `{"theme":"dark"}` alone does not touch the opt-in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(
        default,
        deserialize_with = "opt_bool_or_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub analytics_enabled: Option<bool>,
}

impl PreferencesUpdate {
    pub fn theme(theme: Theme) -> Self {
        Self { theme: Some(theme), analytics_enabled: None }
    }

    pub fn analytics(enabled: bool) -> Self {
        Self { theme: None, analytics_enabled: Some(enabled) }
    }

    /// Nothing to change
    pub fn is_empty(&self) -> bool {
        self.theme.is_none() && self.analytics_enabled.is_none()
    }
}

/// A local feature switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlag {
    pub id: i64,
    pub feature_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_premium: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl FeatureFlag {
    /// Human label: `bulk_actions` becomes `Bulk Actions`
    pub fn display_name(&self) -> String {
        self.feature_name
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Record for FeatureFlag {
    const RELATION: Relation = Relation::FeatureFlags;
}

/// Whether the flag called `name` exists and is switched on
pub fn is_feature_enabled(flags: &[FeatureFlag], name: &str) -> bool {
    flags.iter().any(|f| f.feature_name == name && f.is_enabled)
}

/// Whether any premium feature is switched on
pub fn has_premium_enabled(flags: &[FeatureFlag]) -> bool {
    flags.iter().any(|f| f.is_premium && f.is_enabled)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub id: i64,
    pub service: String,
    pub email: String,
    pub last_login: Option<LastLogin>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub importance: u8,
    pub action_needed: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Record for EmailRecord {
    const RELATION: Relation = Relation::Emails;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: i64,
    pub service: String,
    pub username: String,
    pub url: Option<String>,
    pub last_login: Option<LastLogin>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub importance: u8,
    pub status: Option<AccountStatus>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Record for AccountRecord {
    const RELATION: Relation = Relation::Accounts;
}

/// Metadata about a password. The password itself is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHygieneRecord {
    pub id: i64,
    /// Owning account; the row is removed with it
    pub account_id: Option<i64>,
    pub service: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strength: u8,
    pub last_updated: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub needs_update: bool,
    #[serde(deserialize_with = "null_as_true")]
    pub unique_password: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub two_factor_enabled: bool,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Record for PasswordHygieneRecord {
    const RELATION: Relation = Relation::PasswordHygiene;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialMediaRecord {
    pub id: i64,
    pub platform: String,
    pub username: String,
    pub profile_url: Option<String>,
    pub last_post_date: Option<String>,
    pub post_frequency: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub importance: u8,
    pub action_needed: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Record for SocialMediaRecord {
    const RELATION: Relation = Relation::SocialMedia;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacySettingRecord {
    pub id: i64,
    pub category: String,
    pub setting_name: String,
    pub current_status: Option<String>,
    pub recommended_status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub importance: u8,
    pub action_needed: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Record for PrivacySettingRecord {
    const RELATION: Relation = Relation::PrivacySettings;
}

/// One entry of the opt-in analytics log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub id: i64,
    pub event_type: String,
    #[serde(default)]
    pub event_data: serde_json::Value,
    pub timestamp: String,
}

impl Record for AnalyticsEvent {
    const RELATION: Relation = Relation::Analytics;
}
