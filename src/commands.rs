use organizio::analytics::AnalyticsSummary;
use organizio::config::{self, OrganizioConfig};
use organizio::output::{emit_success, OutputMode};
use organizio::record::{
    has_premium_enabled, AccountRecord, AccountStatus, EmailRecord, ImportanceTier, LastLogin,
};
use organizio::ui::{
    self, created, deleted, header, info, modified, records_table, section, stats_table, success,
    summary_row, Icons,
};
use organizio::{Category, Fields, Gateway, PreferencesUpdate, Request, Row, Theme};
use owo_colors::OwoColorize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

/// Parse `key=value` assignments. Values that read as JSON (numbers,
/// booleans, null) keep their type; everything else is text.
pub fn parse_assignments(assignments: &[String]) -> anyhow::Result<Fields> {
    let mut fields = Fields::new();
    for assignment in assignments {
        let (key, raw) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("expected key=value, got '{}'", assignment))?;
        let key = key.trim();
        if key.is_empty() {
            anyhow::bail!("missing field name in '{}'", assignment);
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        fields.insert(key, value);
    }
    Ok(fields)
}

pub async fn run_init(
    gateway: &Gateway,
    db_path: &Path,
    config_path: Option<PathBuf>,
    write_config: bool,
    force: bool,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let Some(stats) = gateway.get_stats().await else {
        anyhow::bail!("Database at {} is not readable", db_path.display());
    };
    tracing::debug!("{}", stats);

    let written = if write_config {
        let path = config_path.unwrap_or_else(config::default_config_path);
        let config = OrganizioConfig {
            database: Some(db_path.display().to_string()),
            log_level: None,
        };
        config::write_config(&path, &config, force)?;
        Some(path)
    } else {
        None
    };

    if output_mode.is_human() {
        header("Organizio");
        info("Database", &db_path.display().to_string());
        if let Some(path) = &written {
            info("Config", &path.display().to_string());
        }
        println!("{}", stats_table(&stats));
        success("Ready");
    } else {
        let data = serde_json::json!({
            "database": db_path,
            "config": written,
            "stats": stats,
        });
        emit_success(output_mode, "init", data)?;
    }
    Ok(())
}

pub async fn run_stats(gateway: &Gateway, output_mode: OutputMode) -> anyhow::Result<()> {
    let Some(stats) = gateway.get_stats().await else {
        anyhow::bail!("Failed to read statistics");
    };

    if output_mode.is_human() {
        println!("{} {}", Icons::STATS, "Organizio Statistics".style(ui::theme().header.clone()));
        println!("{}", stats_table(&stats));
    } else {
        emit_success(output_mode, "stats", stats)?;
    }
    Ok(())
}

pub async fn run_list(gateway: &Gateway, category: Category, output_mode: OutputMode) -> anyhow::Result<()> {
    let rows = gateway.get_records(category).await;

    if !output_mode.is_human() {
        return emit_success(output_mode, "list", rows);
    }

    section(&format!(" {} {} ", icon_for(category), category.plural()));
    if rows.is_empty() {
        println!("{}", ui::muted("Nothing stored yet."));
        return Ok(());
    }

    println!("{}", records_table(category.relation(), &rows));
    summary_row("Total:", &rows.len().to_string());
    print_review_hints(category, rows)?;
    Ok(())
}

fn icon_for(category: Category) -> &'static str {
    match category {
        Category::Email => Icons::MAIL,
        Category::Account => Icons::PERSON,
        Category::Password => Icons::KEY,
        Category::SocialAccount => Icons::PHONE,
        Category::PrivacySetting => Icons::SHIELD,
    }
}

/// Counts that point at what to clean up next, then the stale entries by name
fn print_review_hints(category: Category, rows: Vec<Row>) -> anyhow::Result<()> {
    let entries: Vec<(String, Option<LastLogin>, u8)> = match category {
        Category::Email => rows
            .into_iter()
            .map(|r| r.into_record::<EmailRecord>().map(|e| (e.email, e.last_login, e.importance)))
            .collect::<organizio::Result<_>>()?,
        Category::Account => {
            let accounts = rows
                .into_iter()
                .map(Row::into_record::<AccountRecord>)
                .collect::<organizio::Result<Vec<_>>>()?;
            let marked = accounts
                .iter()
                .filter(|a| a.status == Some(AccountStatus::Delete))
                .count();
            summary_row("Marked for deletion:", &marked.to_string());
            accounts
                .into_iter()
                .map(|a| (format!("{} ({})", a.service, a.username), a.last_login, a.importance))
                .collect()
        }
        _ => return Ok(()),
    };

    let theme = ui::theme();
    let stale: Vec<(&str, LastLogin)> = entries
        .iter()
        .filter_map(|(name, login, _)| login.filter(LastLogin::is_stale).map(|l| (name.as_str(), l)))
        .collect();
    let high = entries
        .iter()
        .filter(|(_, _, score)| ImportanceTier::from_score(*score) == ImportanceTier::High)
        .count();

    let high_style = theme.importance(ImportanceTier::High);
    summary_row("High importance:", &high.to_string().style(high_style).to_string());
    summary_row(
        "Unused for a year or more:",
        &stale.len().to_string().style(theme.stale.clone()).to_string(),
    );
    for (name, login) in stale {
        println!("    {} {}", name, login.label().style(theme.last_login(login)));
    }
    Ok(())
}

pub async fn run_add(
    gateway: &Gateway,
    category: Category,
    fields: Fields,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let Some(id) = gateway.save_record(category, fields).await else {
        anyhow::bail!("Failed to save {} (run with --verbose for details)", category);
    };

    if output_mode.is_human() {
        created(&format!("Saved {} #{}", category, id));
    } else {
        emit_success(output_mode, "add", serde_json::json!({ "id": id }))?;
    }
    Ok(())
}

pub async fn run_edit(
    gateway: &Gateway,
    category: Category,
    id: i64,
    fields: Fields,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let Some(ack) = gateway.update_record(category, id, fields).await else {
        anyhow::bail!("Failed to update {} #{}", category, id);
    };

    if output_mode.is_human() {
        if ack.changes == 0 {
            ui::warn(&format!("No {} with id {}", category, id));
        } else {
            modified(&format!("Updated {} #{}", category, id));
        }
    } else {
        emit_success(output_mode, "edit", ack)?;
    }
    Ok(())
}

pub async fn run_remove(
    gateway: &Gateway,
    category: Category,
    id: i64,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let Some(ack) = gateway.delete_record(category, id).await else {
        anyhow::bail!("Failed to delete {} #{}", category, id);
    };

    if output_mode.is_human() {
        if ack.changes == 0 {
            ui::warn(&format!("No {} with id {}", category, id));
        } else {
            deleted(&format!("Deleted {} #{}", category, id));
        }
    } else {
        emit_success(output_mode, "remove", ack)?;
    }
    Ok(())
}

pub async fn run_show_prefs(gateway: &Gateway, output_mode: OutputMode) -> anyhow::Result<()> {
    let Some(prefs) = gateway.get_preferences().await else {
        anyhow::bail!("Preferences are not available");
    };

    if output_mode.is_human() {
        section(" Preferences ");
        summary_row("Theme:", prefs.theme.as_str());
        summary_row("Analytics:", if prefs.analytics_enabled { "enabled" } else { "disabled" });
        summary_row("Updated:", &prefs.updated_at);
    } else {
        emit_success(output_mode, "prefs", prefs)?;
    }
    Ok(())
}

/// Options left unset keep their stored value.
pub async fn run_set_prefs(
    gateway: &Gateway,
    theme: Option<Theme>,
    analytics: Option<bool>,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let update = PreferencesUpdate {
        theme,
        analytics_enabled: analytics,
    };
    if update.is_empty() {
        anyhow::bail!("nothing to change; pass --theme and/or --analytics");
    }

    let Some(ack) = gateway.save_preferences(update).await else {
        anyhow::bail!("Failed to save preferences");
    };

    if output_mode.is_human() {
        match gateway.get_preferences().await {
            Some(prefs) if ack.changes > 0 => success(&format!(
                "Theme {}, analytics {}",
                prefs.theme,
                if prefs.analytics_enabled { "on" } else { "off" }
            )),
            _ => ui::warn("Preferences row is missing; nothing changed"),
        }
    } else {
        emit_success(output_mode, "prefs set", ack)?;
    }
    Ok(())
}

#[derive(Tabled)]
struct FlagRow {
    #[tabled(rename = "Feature")]
    name: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Enabled")]
    enabled: &'static str,
    #[tabled(rename = "Tier")]
    tier: &'static str,
}

pub async fn run_show_flags(gateway: &Gateway, output_mode: OutputMode) -> anyhow::Result<()> {
    let flags = gateway.get_feature_flags().await;

    if !output_mode.is_human() {
        let data = serde_json::json!({
            "premium_enabled": has_premium_enabled(&flags),
            "flags": flags,
        });
        return emit_success(output_mode, "flags", data);
    }

    let rows: Vec<FlagRow> = flags
        .iter()
        .map(|f| FlagRow {
            name: f.display_name(),
            key: f.feature_name.clone(),
            enabled: if f.is_enabled { "yes" } else { "no" },
            tier: if f.is_premium { "premium" } else { "free" },
        })
        .collect();

    section(" Feature flags ");
    println!("{}", Table::new(&rows).with(Style::rounded()));
    if has_premium_enabled(&flags) {
        println!("{} {}", Icons::STAR, "Premium features active".style(ui::theme().premium.clone()));
    }
    Ok(())
}

pub async fn run_set_flag(
    gateway: &Gateway,
    name: &str,
    enabled: bool,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let Some(ack) = gateway.update_feature_flag(name, enabled).await else {
        anyhow::bail!("Failed to update feature flag '{}'", name);
    };

    if output_mode.is_human() {
        if ack.changes == 0 {
            ui::warn(&format!("No feature flag named '{}'", name));
        } else {
            success(&format!("{} {}", name, if enabled { "enabled" } else { "disabled" }));
        }
    } else {
        emit_success(output_mode, "flags set", ack)?;
    }
    Ok(())
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "When")]
    timestamp: String,
    #[tabled(rename = "Type")]
    event_type: String,
    #[tabled(rename = "Data")]
    data: String,
}

pub async fn run_analytics_list(gateway: &Gateway, output_mode: OutputMode) -> anyhow::Result<()> {
    let events = gateway.get_analytics().await;

    if !output_mode.is_human() {
        return emit_success(output_mode, "analytics list", events);
    }

    if events.is_empty() {
        println!("{}", ui::muted("No analytics events recorded."));
        return Ok(());
    }

    let rows: Vec<EventRow> = events
        .into_iter()
        .map(|e| EventRow {
            timestamp: e.timestamp,
            event_type: e.event_type,
            data: e.event_data.to_string(),
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
    Ok(())
}

pub async fn run_analytics_summary(gateway: &Gateway, output_mode: OutputMode) -> anyhow::Result<()> {
    let summary = AnalyticsSummary::from_events(&gateway.get_analytics().await);

    if output_mode.is_human() {
        println!("{}", summary);
    } else {
        emit_success(output_mode, "analytics summary", summary)?;
    }
    Ok(())
}

pub async fn run_analytics_clear(gateway: &Gateway, output_mode: OutputMode) -> anyhow::Result<()> {
    let Some(ack) = gateway.clear_analytics().await else {
        anyhow::bail!("Failed to clear analytics");
    };

    if output_mode.is_human() {
        deleted(&format!("Removed {} analytics event(s)", ack.changes));
    } else {
        emit_success(output_mode, "analytics clear", ack)?;
    }
    Ok(())
}

pub async fn run_analytics_log(
    gateway: &Gateway,
    event_type: &str,
    data: Option<String>,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let data = match data {
        Some(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        None => Value::Null,
    };
    let ack = gateway.save_analytics_event(event_type, data).await;

    if output_mode.is_human() {
        match ack {
            Some(_) => success(&format!("Recorded '{}'", event_type)),
            None => ui::warn("Event not recorded (analytics disabled or store unavailable)"),
        }
    } else {
        emit_success(output_mode, "analytics log", serde_json::json!({ "recorded": ack.is_some() }))?;
    }
    Ok(())
}

pub async fn run_export(gateway: &Gateway, out: Option<PathBuf>, output_mode: OutputMode) -> anyhow::Result<()> {
    let Some(snapshot) = gateway.export_data().await else {
        anyhow::bail!("Failed to export data");
    };

    let Some(path) = out else {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    };

    config::ensure_parent_dir(&path)?;
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot)?)?;

    if output_mode.is_human() {
        println!("{} Exported to {}", Icons::PACKAGE, path.display());
    } else {
        emit_success(output_mode, "export", serde_json::json!({ "path": path }))?;
    }
    Ok(())
}

/// Send a raw named request; the reply is always printed as JSON.
pub async fn run_call(gateway: &Gateway, name: &str, args: Option<String>) -> anyhow::Result<()> {
    let args = match args {
        None => Vec::new(),
        Some(raw) => match serde_json::from_str::<Value>(&raw)? {
            Value::Array(items) => items,
            single => vec![single],
        },
    };

    let request = Request::from_named(name, args)?;
    let response = gateway.call(request).await;
    println!("{}", serde_json::to_string_pretty(&response.into_json())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_assignments() {
        let fields = parse_assignments(&[
            "service=Gmail".to_string(),
            "email=a@b.com".to_string(),
            "importance=4".to_string(),
            "notes=null".to_string(),
            "url=https://x.y/?a=b".to_string(),
        ])
        .unwrap();

        assert_eq!(fields.get("service"), Some(&json!("Gmail")));
        assert_eq!(fields.get("importance"), Some(&json!(4)));
        assert_eq!(fields.get("notes"), Some(&json!(null)));
        assert_eq!(fields.get("url"), Some(&json!("https://x.y/?a=b")));
    }

    #[tokio::test]
    async fn test_numeric_assignment_saves_as_text() {
        let store = organizio::storage::SqliteStore::open_in_memory().unwrap();
        let gateway = Gateway::new(store).unwrap();

        let fields = parse_assignments(&["service=Bank".to_string(), "username=12345".to_string()]).unwrap();
        assert_eq!(fields.get("username"), Some(&json!(12345)));
        let id = gateway.save_record(Category::Account, fields).await.unwrap();

        let rows = gateway.get_records(Category::Account).await;
        assert_eq!(rows[0].id(), Some(id));
        assert_eq!(rows[0].get_str("username"), Some("12345"));
        gateway.shutdown().await;
    }

    #[test]
    fn test_parse_assignments_rejects_bare_words() {
        assert!(parse_assignments(&["service".to_string()]).is_err());
        assert!(parse_assignments(&["=x".to_string()]).is_err());
    }
}
