pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const MAIL: &str = "📧";
    pub const KEY: &str = "🔑";
    pub const PERSON: &str = "👤";
    pub const PHONE: &str = "📱";
    pub const SHIELD: &str = "🛡️";
    pub const NEW: &str = "✨";
    pub const MOD: &str = "📝";
    pub const DEL: &str = "🗑️";
    pub const STAR: &str = "⭐";
    pub const PACKAGE: &str = "📦";
}
