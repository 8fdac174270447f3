use crate::fields::Row;
use crate::record::LastLogin;
use crate::relation::{Column, ColumnKind, Relation};
use crate::storage::DbStats;
use serde_json::Value;
use tabled::{builder::Builder, settings::Style};

/// Longest cell text shown before truncation
const MAX_CELL: usize = 40;

/// Row counts per table, with a total across the user records
pub fn stats_table(stats: &DbStats) -> String {
    let records = stats.emails
        + stats.accounts
        + stats.passwords
        + stats.social_media
        + stats.privacy_settings;

    let mut builder = Builder::default();
    builder.push_record(["Table", "Rows"]);
    for (label, count) in stats.rows() {
        builder.push_record([label.to_string(), count.to_string()]);
    }
    builder.push_record(["Records in total".to_string(), records.to_string()]);

    builder.build().with(Style::rounded()).to_string()
}

/// Render rows of a relation, one column per schema column except the
/// timestamps the store maintains.
pub fn records_table(relation: Relation, rows: &[Row]) -> String {
    let columns: Vec<&Column> = relation
        .columns()
        .iter()
        .filter(|c| c.kind != ColumnKind::Timestamp)
        .collect();

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.name.to_string()));
    for row in rows {
        builder.push_record(columns.iter().map(|c| cell(c, row.get(c.name))));
    }

    builder.build().with(Style::rounded()).to_string()
}

fn cell(column: &Column, value: Option<&Value>) -> String {
    let text = match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) if column.name == "last_login" => {
            serde_json::from_value::<LastLogin>(Value::String(s.clone()))
                .map(|login| login.label().to_string())
                .unwrap_or_else(|_| s.clone())
        }
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "yes".to_string(),
        Some(Value::Bool(false)) => "no".to_string(),
        Some(other) => other.to_string(),
    };

    if text.chars().count() > MAX_CELL {
        let cut: String = text.chars().take(MAX_CELL - 1).collect();
        format!("{}…", cut)
    } else {
        text
    }
}
