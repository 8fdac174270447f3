//! Named requests and their results

use crate::fields::{Fields, Row};
use crate::record::{AnalyticsEvent, FeatureFlag, Preferences, PreferencesUpdate};
use crate::relation::Relation;
use crate::storage::{DbStats, Snapshot, SqliteStore};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// User-record categories exposed by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Email,
    Account,
    Password,
    SocialAccount,
    PrivacySetting,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Email,
            Category::Account,
            Category::Password,
            Category::SocialAccount,
            Category::PrivacySetting,
        ]
    }

    /// Entity name used by save/update/delete requests
    pub fn singular(&self) -> &'static str {
        match self {
            Category::Email => "email",
            Category::Account => "account",
            Category::Password => "password",
            Category::SocialAccount => "social-account",
            Category::PrivacySetting => "privacy-setting",
        }
    }

    /// List name used by get requests
    pub fn plural(&self) -> &'static str {
        match self {
            Category::Email => "emails",
            Category::Account => "accounts",
            Category::Password => "passwords",
            Category::SocialAccount => "social-accounts",
            Category::PrivacySetting => "privacy-settings",
        }
    }

    pub fn relation(&self) -> Relation {
        match self {
            Category::Email => Relation::Emails,
            Category::Account => Relation::Accounts,
            Category::Password => Relation::PasswordHygiene,
            Category::SocialAccount => Relation::SocialMedia,
            Category::PrivacySetting => Relation::PrivacySettings,
        }
    }

    fn from_singular(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.singular() == name)
    }

    fn from_plural(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.plural() == name)
    }
}

/// Accepts the entity name, the list name or the table name.
impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.singular() == name || c.plural() == name || c.relation().as_str() == name)
            .ok_or_else(|| Error::UnknownRelation(s.to_string()))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.singular())
    }
}

/// Row count reported by a successful write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteAck {
    pub changes: usize,
}

impl WriteAck {
    pub fn new(changes: usize) -> Self {
        Self { changes }
    }
}

/// One gateway capability
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    GetRecords(Category),
    SaveRecord(Category, Fields),
    UpdateRecord(Category, i64, Fields),
    DeleteRecord(Category, i64),
    GetPreferences,
    SavePreferences(PreferencesUpdate),
    GetFeatureFlags,
    UpdateFeatureFlag { name: String, enabled: bool },
    GetAnalytics,
    SaveAnalyticsEvent { event_type: String, data: Value },
    ClearAnalytics,
    ExportData,
    GetStats,
}

/// Payload of `save-analytics-event`
#[derive(Debug, Deserialize)]
struct AnalyticsEventInput {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Value,
}

impl Request {
    /// Wire name of the request
    pub fn name(&self) -> String {
        match self {
            Request::GetRecords(c) => format!("get-{}", c.plural()),
            Request::SaveRecord(c, _) => format!("save-{}", c.singular()),
            Request::UpdateRecord(c, _, _) => format!("update-{}", c.singular()),
            Request::DeleteRecord(c, _) => format!("delete-{}", c.singular()),
            Request::GetPreferences => "get-preferences".to_string(),
            Request::SavePreferences(_) => "save-preferences".to_string(),
            Request::GetFeatureFlags => "get-feature-flags".to_string(),
            Request::UpdateFeatureFlag { .. } => "update-feature-flag".to_string(),
            Request::GetAnalytics => "get-analytics".to_string(),
            Request::SaveAnalyticsEvent { .. } => "save-analytics-event".to_string(),
            Request::ClearAnalytics => "clear-analytics".to_string(),
            Request::ExportData => "export-data".to_string(),
            Request::GetStats => "get-stats".to_string(),
        }
    }

    /// Build a request from its wire name and positional JSON arguments.
    pub fn from_named(name: &str, args: Vec<Value>) -> Result<Self> {
        let mut args = Args::new(name, args);

        let request = match name {
            "get-preferences" => Request::GetPreferences,
            "save-preferences" => Request::SavePreferences(args.parse(0, "preferences")?),
            "get-feature-flags" => Request::GetFeatureFlags,
            "update-feature-flag" => Request::UpdateFeatureFlag {
                name: args.string(0, "feature name")?,
                enabled: args.flag(1, "enabled")?,
            },
            "get-analytics" => Request::GetAnalytics,
            "save-analytics-event" => {
                let input: AnalyticsEventInput = args.parse(0, "event")?;
                Request::SaveAnalyticsEvent {
                    event_type: input.event_type,
                    data: input.data,
                }
            }
            "clear-analytics" => Request::ClearAnalytics,
            "export-data" => Request::ExportData,
            "get-stats" => Request::GetStats,
            _ => Self::record_request(name, &mut args)?,
        };

        Ok(request)
    }

    fn record_request(name: &str, args: &mut Args) -> Result<Self> {
        let unknown = || Error::UnknownRequest(name.to_string());
        let (verb, entity) = name.split_once('-').ok_or_else(unknown)?;

        let request = match verb {
            "get" => Request::GetRecords(Category::from_plural(entity).ok_or_else(unknown)?),
            "save" => {
                let category = Category::from_singular(entity).ok_or_else(unknown)?;
                Request::SaveRecord(category, args.fields(0)?)
            }
            "update" => {
                let category = Category::from_singular(entity).ok_or_else(unknown)?;
                Request::UpdateRecord(category, args.id(0)?, args.fields(1)?)
            }
            "delete" => {
                let category = Category::from_singular(entity).ok_or_else(unknown)?;
                Request::DeleteRecord(category, args.id(0)?)
            }
            _ => return Err(unknown()),
        };
        Ok(request)
    }

    /// Result returned when the request cannot be served
    pub fn neutral(&self) -> Response {
        match self {
            Request::GetRecords(_) => Response::Records(Vec::new()),
            Request::SaveRecord(..) => Response::Id(None),
            Request::GetPreferences => Response::Preferences(None),
            Request::GetFeatureFlags => Response::FeatureFlags(Vec::new()),
            Request::GetAnalytics => Response::Analytics(Vec::new()),
            Request::ExportData => Response::Snapshot(None),
            Request::GetStats => Response::Stats(None),
            Request::UpdateRecord(..)
            | Request::DeleteRecord(..)
            | Request::SavePreferences(_)
            | Request::UpdateFeatureFlag { .. }
            | Request::SaveAnalyticsEvent { .. }
            | Request::ClearAnalytics => Response::Ack(None),
        }
    }

    /// Run against the store. Called on the worker thread only.
    pub(crate) fn execute(self, store: &SqliteStore) -> Result<Response> {
        let response = match self {
            Request::GetRecords(c) => Response::Records(store.get_all(c.relation())?),
            Request::SaveRecord(c, fields) => {
                Response::Id(Some(store.insert(c.relation(), &fields)?))
            }
            Request::UpdateRecord(c, id, fields) => {
                Response::ack(store.update(c.relation(), id, &fields)?)
            }
            Request::DeleteRecord(c, id) => Response::ack(store.delete(c.relation(), id)?),
            Request::GetPreferences => Response::Preferences(store.get_preferences()?),
            Request::SavePreferences(update) => Response::ack(store.update_preferences(&update)?),
            Request::GetFeatureFlags => Response::FeatureFlags(store.get_feature_flags()?),
            Request::UpdateFeatureFlag { name, enabled } => {
                Response::ack(store.update_feature_flag(&name, enabled)?)
            }
            Request::GetAnalytics => Response::Analytics(store.get_analytics()?),
            Request::SaveAnalyticsEvent { event_type, data } => Response::Ack(
                store
                    .add_analytics_event(&event_type, &data)?
                    .map(|_| WriteAck::new(1)),
            ),
            Request::ClearAnalytics => Response::ack(store.clear_analytics()?),
            Request::ExportData => Response::Snapshot(Some(store.export()?)),
            Request::GetStats => Response::Stats(Some(store.stats()?)),
        };
        Ok(response)
    }
}

/// Result of a request. Failures are the neutral value of the same variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Records(Vec<Row>),
    Id(Option<i64>),
    Ack(Option<WriteAck>),
    Preferences(Option<Preferences>),
    FeatureFlags(Vec<FeatureFlag>),
    Analytics(Vec<AnalyticsEvent>),
    Snapshot(Option<Snapshot>),
    Stats(Option<DbStats>),
}

impl Response {
    fn ack(changes: usize) -> Self {
        Response::Ack(Some(WriteAck::new(changes)))
    }

    pub fn into_json(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Positional argument reader for [`Request::from_named`]
struct Args<'a> {
    request: &'a str,
    values: Vec<Value>,
}

impl<'a> Args<'a> {
    fn new(request: &'a str, values: Vec<Value>) -> Self {
        Self { request, values }
    }

    fn invalid(&self, reason: impl std::fmt::Display) -> Error {
        Error::InvalidRequest(format!("{}: {}", self.request, reason))
    }

    fn take(&mut self, idx: usize, what: &str) -> Result<Value> {
        match self.values.get_mut(idx) {
            Some(value) => Ok(value.take()),
            None => Err(self.invalid(format!("missing argument {} ({})", idx + 1, what))),
        }
    }

    fn parse<T: serde::de::DeserializeOwned>(&mut self, idx: usize, what: &str) -> Result<T> {
        let value = self.take(idx, what)?;
        serde_json::from_value(value).map_err(|e| self.invalid(format!("bad {}: {}", what, e)))
    }

    fn fields(&mut self, idx: usize) -> Result<Fields> {
        let value = self.take(idx, "fields")?;
        Fields::from_json(value).map_err(|e| self.invalid(e))
    }

    fn id(&mut self, idx: usize) -> Result<i64> {
        let value = self.take(idx, "id")?;
        let id = match &value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        };
        id.ok_or_else(|| self.invalid(format!("expected an integer id, got {}", value)))
    }

    fn string(&mut self, idx: usize, what: &str) -> Result<String> {
        match self.take(idx, what)? {
            Value::String(s) => Ok(s),
            other => Err(self.invalid(format!("expected {} as text, got {}", what, other))),
        }
    }

    fn flag(&mut self, idx: usize, what: &str) -> Result<bool> {
        match self.take(idx, what)? {
            Value::Bool(b) => Ok(b),
            Value::Number(n) if matches!(n.as_i64(), Some(0 | 1)) => Ok(n.as_i64() == Some(1)),
            other => Err(self.invalid(format!("expected {} as a boolean, got {}", what, other))),
        }
    }
}
