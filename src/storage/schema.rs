//! Database schema definitions

/// SQL expression producing the current UTC time as ISO-8601 with milliseconds
pub const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// SQL to create the preferences table (singleton row at id 1)
pub const CREATE_PREFERENCES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS preferences (
    id INTEGER PRIMARY KEY,
    theme TEXT DEFAULT 'light',
    analytics_enabled INTEGER DEFAULT 0,
    created_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)
"#;

/// SQL to create the feature_flags table
pub const CREATE_FEATURE_FLAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS feature_flags (
    id INTEGER PRIMARY KEY,
    feature_name TEXT NOT NULL UNIQUE,
    is_enabled INTEGER DEFAULT 0,
    is_premium INTEGER DEFAULT 0,
    created_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)
"#;

/// SQL to create the emails table
pub const CREATE_EMAILS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS emails (
    id INTEGER PRIMARY KEY,
    service TEXT NOT NULL,
    email TEXT NOT NULL,
    last_login TEXT,
    importance INTEGER DEFAULT 0,
    action_needed TEXT,
    notes TEXT,
    created_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)
"#;

/// SQL to create the accounts table
pub const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    service TEXT NOT NULL,
    username TEXT NOT NULL,
    url TEXT,
    last_login TEXT,
    importance INTEGER DEFAULT 0,
    status TEXT,
    notes TEXT,
    created_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)
"#;

/// SQL to create the password_hygiene table.
/// Holds metadata about passwords only, never the passwords themselves.
pub const CREATE_PASSWORD_HYGIENE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS password_hygiene (
    id INTEGER PRIMARY KEY,
    account_id INTEGER,
    service TEXT NOT NULL,
    strength INTEGER DEFAULT 0,
    last_updated TEXT,
    needs_update INTEGER DEFAULT 0,
    unique_password INTEGER DEFAULT 1,
    two_factor_enabled INTEGER DEFAULT 0,
    notes TEXT,
    created_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
)
"#;

/// SQL to create the social_media table
pub const CREATE_SOCIAL_MEDIA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS social_media (
    id INTEGER PRIMARY KEY,
    platform TEXT NOT NULL,
    username TEXT NOT NULL,
    profile_url TEXT,
    last_post_date TEXT,
    post_frequency TEXT,
    importance INTEGER DEFAULT 0,
    action_needed TEXT,
    notes TEXT,
    created_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)
"#;

/// SQL to create the privacy_settings table
pub const CREATE_PRIVACY_SETTINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS privacy_settings (
    id INTEGER PRIMARY KEY,
    category TEXT NOT NULL,
    setting_name TEXT NOT NULL,
    current_status TEXT,
    recommended_status TEXT,
    importance INTEGER DEFAULT 0,
    action_needed TEXT,
    notes TEXT,
    created_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)
"#;

/// SQL to create the analytics table (opt-in, local only)
pub const CREATE_ANALYTICS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS analytics (
    id INTEGER PRIMARY KEY,
    event_type TEXT NOT NULL,
    event_data TEXT,
    timestamp TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_password_hygiene_account ON password_hygiene(account_id)",
    "CREATE INDEX IF NOT EXISTS idx_analytics_timestamp ON analytics(timestamp)",
];

/// Seed catalog: (feature name, enabled, premium)
pub const DEFAULT_FEATURE_FLAGS: &[(&str, bool, bool)] = &[
    ("email_organizer", true, false),
    ("account_manager", true, false),
    ("password_hygiene_basic", true, false),
    ("password_hygiene_advanced", false, true),
    ("social_media_basic", true, false),
    ("social_media_advanced", false, true),
    ("privacy_coach_basic", true, false),
    ("privacy_coach_advanced", false, true),
    ("bulk_actions", false, true),
    ("detailed_reports", false, true),
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_PREFERENCES_TABLE,
        CREATE_FEATURE_FLAGS_TABLE,
        CREATE_EMAILS_TABLE,
        CREATE_ACCOUNTS_TABLE,
        CREATE_PASSWORD_HYGIENE_TABLE,
        CREATE_SOCIAL_MEDIA_TABLE,
        CREATE_PRIVACY_SETTINGS_TABLE,
        CREATE_ANALYTICS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
