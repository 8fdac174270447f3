//! SQLite storage implementation

use std::path::{Path, PathBuf};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use rusqlite::types::Value as SqlValue;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::{Result, Error};
use crate::fields::{Fields, Row};
use crate::record::{
    AccountRecord, AnalyticsEvent, EmailRecord, FeatureFlag, PasswordHygieneRecord, Preferences,
    PreferencesUpdate, PrivacySettingRecord, Record, SocialMediaRecord, Theme,
};
use crate::relation::Relation;
use super::schema;

/// Identity of the preferences singleton
pub const PREFERENCES_ID: i64 = 1;

/// SQLite-backed store for every relation
pub struct SqliteStore {
    conn: Option<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open a database file (creates it and its directory if needed)
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Some(conn),
            path: Some(path.to_path_buf()),
        };
        store.initialize_schema()?;
        info!("Database initialized at: {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn: Some(conn), path: None };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Location of the database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// True once [`close`](Self::close) has run
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(Error::Closed)
    }

    /// Create missing tables and seed defaults. Safe to run on every start:
    /// nothing is dropped and seeds only go into empty tables.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.pragma_update(None, "foreign_keys", true)?;

        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }

        if self.count(Relation::Preferences)? == 0 {
            debug!("Seeding default preferences");
            conn.execute(
                "INSERT INTO preferences (id, theme, analytics_enabled) VALUES (?1, ?2, ?3)",
                params![PREFERENCES_ID, Theme::default().as_str(), false],
            )?;
        }

        if self.count(Relation::FeatureFlags)? == 0 {
            debug!("Seeding {} default feature flags", schema::DEFAULT_FEATURE_FLAGS.len());
            let tx = conn.unchecked_transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO feature_flags (feature_name, is_enabled, is_premium) VALUES (?1, ?2, ?3)",
                )?;
                for (name, enabled, premium) in schema::DEFAULT_FEATURE_FLAGS {
                    stmt.execute(params![name, enabled, premium])?;
                }
            }
            tx.commit()?;
        }

        Ok(())
    }

    /// Preferences has a single fixed row and only its own accessors touch it.
    fn ensure_generic(relation: Relation, operation: &'static str) -> Result<()> {
        if relation.is_singleton() {
            return Err(Error::Unsupported { relation, operation });
        }
        Ok(())
    }

    /// Count rows in a relation
    pub fn count(&self, relation: Relation) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", relation);
        let count: i64 = self.conn()?.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Generic Operations ==========

    /// Get every row of a relation, in storage order
    pub fn get_all(&self, relation: Relation) -> Result<Vec<Row>> {
        Self::ensure_generic(relation, "get_all")?;
        let sql = format!("SELECT {} FROM {}", relation.select_list(), relation);
        let mut stmt = self.conn()?.prepare(&sql)?;

        let rows = stmt
            .query_map([], |row| Row::from_sql(relation, row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Get a single row by ID
    pub fn get_by_id(&self, relation: Relation, id: i64) -> Result<Option<Row>> {
        Self::ensure_generic(relation, "get_by_id")?;
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", relation.select_list(), relation);
        self.conn()?
            .query_row(&sql, [id], |row| Row::from_sql(relation, row))
            .optional()
            .map_err(Into::into)
    }

    /// Get every row of a relation as its typed record
    pub fn list<T: Record>(&self) -> Result<Vec<T>> {
        self.get_all(T::RELATION)?
            .into_iter()
            .map(Row::into_record)
            .collect()
    }

    /// Insert a record and return its new ID.
    ///
    /// Missing required columns and dangling references are rejected by the
    /// engine and surface as [`Error::Storage`].
    pub fn insert(&self, relation: Relation, fields: &Fields) -> Result<i64> {
        Self::ensure_generic(relation, "insert")?;
        let values = fields.to_sql(relation)?;
        let conn = self.conn()?;

        if values.is_empty() {
            conn.execute(&format!("INSERT INTO {} DEFAULT VALUES", relation), [])?;
        } else {
            let columns = values.iter().map(|(c, _)| *c).collect::<Vec<_>>().join(", ");
            let placeholders = (1..=values.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!("INSERT INTO {} ({}) VALUES ({})", relation, columns, placeholders);
            conn.execute(&sql, params_from_iter(values.iter().map(|(_, v)| v)))?;
        }

        let id = conn.last_insert_rowid();
        debug!("Inserted {} #{}", relation, id);
        Ok(id)
    }

    /// Overwrite the given fields on one record and refresh its `updated_at`.
    /// Returns the number of rows changed (0 for an unknown ID or no fields).
    pub fn update(&self, relation: Relation, id: i64, fields: &Fields) -> Result<usize> {
        Self::ensure_generic(relation, "update")?;
        let values = fields.to_sql(relation)?;
        if values.is_empty() {
            return Ok(0);
        }

        let mut assignments: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
            .collect();
        if relation.has_updated_at() {
            assignments.push(format!("updated_at = {}", schema::NOW));
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            relation,
            assignments.join(", "),
            values.len() + 1
        );
        let mut bound: Vec<SqlValue> = values.into_iter().map(|(_, v)| v).collect();
        bound.push(SqlValue::Integer(id));

        let changed = self.conn()?.execute(&sql, params_from_iter(bound.iter()))?;
        debug!("Updated {} #{} ({} row(s))", relation, id, changed);
        Ok(changed)
    }

    /// Delete a record by ID. Dependent rows go with it.
    pub fn delete(&self, relation: Relation, id: i64) -> Result<usize> {
        Self::ensure_generic(relation, "delete")?;
        let sql = format!("DELETE FROM {} WHERE id = ?1", relation);
        let removed = self.conn()?.execute(&sql, [id])?;
        debug!("Deleted {} #{} ({} row(s))", relation, id, removed);
        Ok(removed)
    }

    // ========== Preferences ==========

    /// Get the preferences singleton
    pub fn get_preferences(&self) -> Result<Option<Preferences>> {
        let relation = Relation::Preferences;
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", relation.select_list(), relation);
        self.conn()?
            .query_row(&sql, [PREFERENCES_ID], |row| Row::from_sql(relation, row))
            .optional()?
            .map(Row::into_record)
            .transpose()
    }

    /// Set whichever of theme and analytics opt-in the update carries; the other
    /// keeps its stored value. Changes nothing if the singleton is missing.
    pub fn update_preferences(&self, update: &PreferencesUpdate) -> Result<usize> {
        if update.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "UPDATE preferences SET theme = COALESCE(?1, theme), \
             analytics_enabled = COALESCE(?2, analytics_enabled), updated_at = {} WHERE id = ?3",
            schema::NOW
        );
        let changed = self.conn()?.execute(
            &sql,
            params![update.theme.map(|t| t.as_str()), update.analytics_enabled, PREFERENCES_ID],
        )?;
        if changed == 0 {
            debug!("Preferences row missing; update skipped");
        }
        Ok(changed)
    }

    // ========== Feature Flags ==========

    /// Get all feature flags
    pub fn get_feature_flags(&self) -> Result<Vec<FeatureFlag>> {
        self.list::<FeatureFlag>()
    }

    /// Switch a flag on or off by name. An unknown name changes nothing.
    pub fn update_feature_flag(&self, name: &str, enabled: bool) -> Result<usize> {
        let sql = format!(
            "UPDATE feature_flags SET is_enabled = ?1, updated_at = {} WHERE feature_name = ?2",
            schema::NOW
        );
        let changed = self.conn()?.execute(&sql, params![enabled, name])?;
        debug!("Feature flag {} -> {} ({} row(s))", name, enabled, changed);
        Ok(changed)
    }

    // ========== Analytics ==========

    /// Append an analytics event if the user opted in.
    ///
    /// Returns `None` without writing anything while analytics is disabled.
    pub fn add_analytics_event(
        &self,
        event_type: &str,
        event_data: &serde_json::Value,
    ) -> Result<Option<i64>> {
        let opted_in = self
            .get_preferences()?
            .map(|p| p.analytics_enabled)
            .unwrap_or(false);
        if !opted_in {
            debug!("Analytics disabled; dropping '{}' event", event_type);
            return Ok(None);
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO analytics (event_type, event_data) VALUES (?1, ?2)",
            params![event_type, serde_json::to_string(event_data)?],
        )?;
        Ok(Some(conn.last_insert_rowid()))
    }

    /// Get analytics events, most recent first
    pub fn get_analytics(&self) -> Result<Vec<AnalyticsEvent>> {
        let relation = Relation::Analytics;
        let sql = format!(
            "SELECT {} FROM {} ORDER BY timestamp DESC, id DESC",
            relation.select_list(),
            relation
        );
        let mut stmt = self.conn()?.prepare(&sql)?;

        let rows = stmt
            .query_map([], |row| Row::from_sql(relation, row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(Row::into_record).collect()
    }

    /// Delete every analytics event
    pub fn clear_analytics(&self) -> Result<usize> {
        let removed = self.conn()?.execute("DELETE FROM analytics", [])?;
        info!("Cleared {} analytics event(s)", removed);
        Ok(removed)
    }

    // ========== Bulk Operations ==========

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            emails: self.count(Relation::Emails)?,
            accounts: self.count(Relation::Accounts)?,
            passwords: self.count(Relation::PasswordHygiene)?,
            social_media: self.count(Relation::SocialMedia)?,
            privacy_settings: self.count(Relation::PrivacySettings)?,
            feature_flags: self.count(Relation::FeatureFlags)?,
            analytics_events: self.count(Relation::Analytics)?,
        })
    }

    /// Snapshot of everything the user has stored
    pub fn export(&self) -> Result<Snapshot> {
        let sql = format!("SELECT {}", schema::NOW);
        let exported_at: String = self.conn()?.query_row(&sql, [], |row| row.get(0))?;

        Ok(Snapshot {
            exported_at,
            preferences: self.get_preferences()?,
            feature_flags: self.get_feature_flags()?,
            emails: self.list()?,
            accounts: self.list()?,
            passwords: self.list()?,
            social_media: self.list()?,
            privacy_settings: self.list()?,
            analytics: self.get_analytics()?,
        })
    }

    /// Release the database file. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| e)?;
            debug!("Database connection closed");
        }
        Ok(())
    }
}

/// Database statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbStats {
    pub emails: usize,
    pub accounts: usize,
    pub passwords: usize,
    pub social_media: usize,
    pub privacy_settings: usize,
    pub feature_flags: usize,
    pub analytics_events: usize,
}

impl DbStats {
    /// Label/value pairs in display order
    pub fn rows(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("Emails", self.emails),
            ("Accounts", self.accounts),
            ("Passwords", self.passwords),
            ("Social media", self.social_media),
            ("Privacy settings", self.privacy_settings),
            ("Feature flags", self.feature_flags),
            ("Analytics events", self.analytics_events),
        ]
    }
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        for (label, value) in self.rows() {
            writeln!(f, "  {}: {}", label, value)?;
        }
        Ok(())
    }
}

/// Full export of the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub exported_at: String,
    pub preferences: Option<Preferences>,
    pub feature_flags: Vec<FeatureFlag>,
    pub emails: Vec<EmailRecord>,
    pub accounts: Vec<AccountRecord>,
    pub passwords: Vec<PasswordHygieneRecord>,
    pub social_media: Vec<SocialMediaRecord>,
    pub privacy_settings: Vec<PrivacySettingRecord>,
    pub analytics: Vec<AnalyticsEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_email() -> Fields {
        Fields::new()
            .set("service", "Gmail")
            .set("email", "a@b.com")
            .set("importance", 4)
    }

    fn sample_account(service: &str) -> Fields {
        Fields::new()
            .set("service", service)
            .set("username", "me")
            .set("status", "active")
    }

    fn opt_in(store: &SqliteStore, enabled: bool) {
        let update = PreferencesUpdate::analytics(enabled);
        assert_eq!(store.update_preferences(&update).unwrap(), 1);
    }

    #[test]
    fn test_schema_matches_relations() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.conn().unwrap();

        for relation in Relation::all() {
            let sql = format!("PRAGMA table_info({})", relation);
            let mut stmt = conn.prepare(&sql).unwrap();
            let names: Vec<String> = stmt
                .query_map([], |row| row.get(1))
                .unwrap()
                .collect::<rusqlite::Result<_>>()
                .unwrap();
            let expected: Vec<&str> = relation.columns().iter().map(|c| c.name).collect();
            assert_eq!(names, expected, "column mismatch in {}", relation);
        }
    }

    #[test]
    fn test_initialization_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("organizio.db");

        let mut store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count(Relation::Preferences).unwrap(), 1);
        assert_eq!(store.count(Relation::FeatureFlags).unwrap(), 10);
        store.insert(Relation::Emails, &sample_email()).unwrap();
        store.close().unwrap();

        let mut store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count(Relation::Preferences).unwrap(), 1);
        assert_eq!(store.count(Relation::FeatureFlags).unwrap(), 10);
        assert_eq!(store.count(Relation::Emails).unwrap(), 1);

        // A partially emptied catalog is left alone on the next start
        store
            .conn()
            .unwrap()
            .execute("DELETE FROM feature_flags WHERE feature_name = 'bulk_actions'", [])
            .unwrap();
        store.close().unwrap();

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count(Relation::FeatureFlags).unwrap(), 9);
    }

    #[test]
    fn test_default_preferences_and_flags() {
        let store = SqliteStore::open_in_memory().unwrap();

        let prefs = store.get_preferences().unwrap().unwrap();
        assert_eq!(prefs.id, 1);
        assert_eq!(prefs.theme, Theme::Light);
        assert!(!prefs.analytics_enabled);

        let flags = store.get_feature_flags().unwrap();
        assert_eq!(flags.len(), 10);
        let bulk = flags.iter().find(|f| f.feature_name == "bulk_actions").unwrap();
        assert!(!bulk.is_enabled);
        assert!(bulk.is_premium);
        let email = flags.iter().find(|f| f.feature_name == "email_organizer").unwrap();
        assert!(email.is_enabled);
        assert!(!email.is_premium);
    }

    #[test]
    fn test_preferences_singleton() {
        let store = SqliteStore::open_in_memory().unwrap();

        for (theme, enabled) in [(Theme::Dark, true), (Theme::Light, false), (Theme::Dark, false)] {
            let update = PreferencesUpdate {
                theme: Some(theme),
                analytics_enabled: Some(enabled),
            };
            assert_eq!(store.update_preferences(&update).unwrap(), 1);
        }

        assert_eq!(store.count(Relation::Preferences).unwrap(), 1);
        let prefs = store.get_preferences().unwrap().unwrap();
        assert_eq!(prefs.id, 1);
        assert_eq!(prefs.theme, Theme::Dark);
        assert!(!prefs.analytics_enabled);
    }

    #[test]
    fn test_update_preferences_without_singleton_is_noop() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.conn().unwrap().execute("DELETE FROM preferences", []).unwrap();

        let changed = store.update_preferences(&PreferencesUpdate::analytics(true)).unwrap();
        assert_eq!(changed, 0);
        assert!(store.get_preferences().unwrap().is_none());
    }

    #[test]
    fn test_partial_preferences_update_keeps_other_field() {
        let store = SqliteStore::open_in_memory().unwrap();
        let both = PreferencesUpdate {
            theme: Some(Theme::Dark),
            analytics_enabled: Some(true),
        };
        store.update_preferences(&both).unwrap();

        assert_eq!(store.update_preferences(&PreferencesUpdate::theme(Theme::Light)).unwrap(), 1);
        let prefs = store.get_preferences().unwrap().unwrap();
        assert_eq!(prefs.theme, Theme::Light);
        assert!(prefs.analytics_enabled);

        store.update_preferences(&PreferencesUpdate::theme(Theme::Dark)).unwrap();
        assert_eq!(store.update_preferences(&PreferencesUpdate::analytics(false)).unwrap(), 1);
        let prefs = store.get_preferences().unwrap().unwrap();
        assert_eq!(prefs.theme, Theme::Dark);
        assert!(!prefs.analytics_enabled);

        // Nothing to change leaves the row and its timestamp alone
        assert_eq!(store.update_preferences(&PreferencesUpdate::default()).unwrap(), 0);
        assert_eq!(store.get_preferences().unwrap().unwrap(), prefs);
    }

    #[test]
    fn test_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();

        let id = store.insert(Relation::Emails, &sample_email()).unwrap();
        let row = store.get_by_id(Relation::Emails, id).unwrap().unwrap();

        assert_eq!(row.id(), Some(id));
        assert_eq!(row.get_str("service"), Some("Gmail"));
        assert_eq!(row.get_str("email"), Some("a@b.com"));
        assert_eq!(row.get("importance"), Some(&json!(4)));

        let email: EmailRecord = row.into_record().unwrap();
        assert_eq!(email.importance, 4);
        assert!(email.last_login.is_none());
        assert!(store.get_by_id(Relation::Emails, id + 100).unwrap().is_none());
    }

    #[test]
    fn test_booleans_decode_as_booleans() {
        let store = SqliteStore::open_in_memory().unwrap();
        let fields = Fields::new()
            .set("service", "Bank")
            .set("two_factor_enabled", true);
        let id = store.insert(Relation::PasswordHygiene, &fields).unwrap();

        let row = store.get_by_id(Relation::PasswordHygiene, id).unwrap().unwrap();
        assert_eq!(row.get("two_factor_enabled"), Some(&json!(true)));
        assert_eq!(row.get("unique_password"), Some(&json!(true)));
        assert_eq!(row.get("needs_update"), Some(&json!(false)));
    }

    #[test]
    fn test_update_touches_only_target_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.insert(Relation::Accounts, &sample_account("Netflix")).unwrap();
        let second = store.insert(Relation::Accounts, &sample_account("Hulu")).unwrap();
        store
            .conn()
            .unwrap()
            .execute("UPDATE accounts SET updated_at = '2000-01-01T00:00:00.000Z'", [])
            .unwrap();

        let changed = store
            .update(Relation::Accounts, first, &Fields::new().set("status", "delete"))
            .unwrap();
        assert_eq!(changed, 1);

        let accounts: Vec<AccountRecord> = store.list().unwrap();
        let updated = accounts.iter().find(|a| a.id == first).unwrap();
        let untouched = accounts.iter().find(|a| a.id == second).unwrap();
        assert_eq!(updated.status, Some(crate::record::AccountStatus::Delete));
        assert_eq!(updated.service, "Netflix");
        assert_ne!(updated.updated_at, "2000-01-01T00:00:00.000Z");
        assert_eq!(untouched.status, Some(crate::record::AccountStatus::Active));
        assert_eq!(untouched.updated_at, "2000-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_not_found_is_not_an_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        let fields = Fields::new().set("notes", "gone");
        assert_eq!(store.update(Relation::Emails, 42, &fields).unwrap(), 0);
        assert_eq!(store.delete(Relation::Emails, 42).unwrap(), 0);
        assert_eq!(store.update(Relation::Emails, 42, &Fields::new()).unwrap(), 0);
    }

    #[test]
    fn test_cascade_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        let account = store.insert(Relation::Accounts, &sample_account("Bank")).unwrap();
        let other = store.insert(Relation::Accounts, &sample_account("Shop")).unwrap();

        let hygiene = Fields::new()
            .set("account_id", account)
            .set("service", "Bank")
            .set("strength", 2);
        let hygiene_id = store.insert(Relation::PasswordHygiene, &hygiene).unwrap();

        store.delete(Relation::Accounts, other).unwrap();
        assert!(store.get_by_id(Relation::PasswordHygiene, hygiene_id).unwrap().is_some());

        store.delete(Relation::Accounts, account).unwrap();
        assert!(store.get_by_id(Relation::PasswordHygiene, hygiene_id).unwrap().is_none());
    }

    #[test]
    fn test_constraint_violations_propagate() {
        let store = SqliteStore::open_in_memory().unwrap();

        let missing_email = Fields::new().set("service", "Gmail");
        assert!(matches!(
            store.insert(Relation::Emails, &missing_email),
            Err(Error::Storage(_))
        ));

        let dangling = Fields::new().set("account_id", 999).set("service", "Ghost");
        assert!(matches!(
            store.insert(Relation::PasswordHygiene, &dangling),
            Err(Error::Storage(_))
        ));

        assert!(matches!(
            store.insert(Relation::Emails, &Fields::new()),
            Err(Error::Storage(_))
        ));
    }

    #[test]
    fn test_generic_access_policy() {
        let store = SqliteStore::open_in_memory().unwrap();

        assert!(matches!(
            store.get_all(Relation::Preferences),
            Err(Error::Unsupported { .. })
        ));
        assert!(matches!(
            store.update(Relation::Preferences, 1, &Fields::new().set("theme", "dark")),
            Err(Error::Unsupported { .. })
        ));
        assert!(matches!(
            store.delete(Relation::Preferences, 1),
            Err(Error::Unsupported { .. })
        ));
        assert_eq!(store.get_all(Relation::FeatureFlags).unwrap().len(), 10);

        let id = store
            .insert(Relation::FeatureFlags, &Fields::new().set("feature_name", "beta_dashboard"))
            .unwrap();
        let flag: FeatureFlag = store
            .get_by_id(Relation::FeatureFlags, id)
            .unwrap()
            .unwrap()
            .into_record()
            .unwrap();
        assert!(!flag.is_enabled);
        assert_eq!(store.delete(Relation::FeatureFlags, id).unwrap(), 1);
    }

    #[test]
    fn test_unknown_flag_is_noop() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.update_feature_flag("does-not-exist", true).unwrap(), 0);

        assert_eq!(store.update_feature_flag("bulk_actions", true).unwrap(), 1);
        let flags = store.get_feature_flags().unwrap();
        assert!(crate::record::is_feature_enabled(&flags, "bulk_actions"));
        assert!(crate::record::has_premium_enabled(&flags));
    }

    #[test]
    fn test_analytics_opt_in_gate() {
        let store = SqliteStore::open_in_memory().unwrap();

        assert_eq!(store.add_analytics_event("x", &json!({})).unwrap(), None);
        assert_eq!(store.count(Relation::Analytics).unwrap(), 0);

        opt_in(&store, true);
        assert!(store.add_analytics_event("x", &json!({"module": "email"})).unwrap().is_some());
        let events = store.get_analytics().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "x");
        assert_eq!(events[0].event_data, json!({"module": "email"}));

        // Opting out keeps what was already recorded
        opt_in(&store, false);
        assert_eq!(store.add_analytics_event("y", &json!(null)).unwrap(), None);
        assert_eq!(store.get_analytics().unwrap().len(), 1);
    }

    #[test]
    fn test_analytics_newest_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        opt_in(&store, true);

        let conn = store.conn().unwrap();
        for (event_type, ts) in [
            ("b", "2026-01-02T00:00:00.000Z"),
            ("c", "2026-01-03T00:00:00.000Z"),
            ("a", "2026-01-01T00:00:00.000Z"),
        ] {
            conn.execute(
                "INSERT INTO analytics (event_type, event_data, timestamp) VALUES (?1, 'null', ?2)",
                params![event_type, ts],
            )
            .unwrap();
        }

        let events = store.get_analytics().unwrap();
        let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["c", "b", "a"]);
        assert!(events.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_clear_analytics() {
        let store = SqliteStore::open_in_memory().unwrap();
        opt_in(&store, true);
        for i in 0..5 {
            store.add_analytics_event("page_view", &json!({ "n": i })).unwrap();
        }

        assert_eq!(store.clear_analytics().unwrap(), 5);
        assert!(store.get_analytics().unwrap().is_empty());
        assert_eq!(store.clear_analytics().unwrap(), 0);
    }

    #[test]
    fn test_stats_and_export() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(Relation::Emails, &sample_email()).unwrap();
        let account = store.insert(Relation::Accounts, &sample_account("Bank")).unwrap();
        store
            .insert(
                Relation::PasswordHygiene,
                &Fields::new().set("account_id", account).set("service", "Bank"),
            )
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.emails, 1);
        assert_eq!(stats.passwords, 1);
        assert_eq!(stats.feature_flags, 10);
        assert!(stats.to_string().contains("Accounts: 1"));

        let snapshot = store.export().unwrap();
        assert_eq!(snapshot.emails[0].email, "a@b.com");
        assert_eq!(snapshot.passwords[0].account_id, Some(account));
        assert_eq!(snapshot.feature_flags.len(), 10);
        assert!(snapshot.preferences.is_some());
        assert!(snapshot.exported_at.ends_with('Z'));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.close().unwrap();
        store.close().unwrap();

        assert!(store.is_closed());
        assert!(matches!(store.get_all(Relation::Emails), Err(Error::Closed)));
        assert!(matches!(store.get_preferences(), Err(Error::Closed)));
    }
}
