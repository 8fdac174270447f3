use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "organizio";
pub const DATABASE_FILE: &str = "organizio.db";
pub const CONFIG_FILE: &str = "organizio.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct OrganizioConfig {
    pub database: Option<String>,
    pub log_level: Option<String>,
}

/// Per-user application data directory, `./.organizio` on platforms without one
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_DIR_NAME)))
}

pub fn default_config_path() -> PathBuf {
    app_data_dir().join(CONFIG_FILE)
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(DATABASE_FILE)
}

pub fn default_database_path() -> PathBuf {
    default_database_path_in(&app_data_dir())
}

/// Flag beats config file beats the default location.
pub fn resolve_database_path(flag: Option<&Path>, config: Option<&OrganizioConfig>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    config
        .and_then(|c| c.database.as_deref())
        .map(PathBuf::from)
        .unwrap_or_else(default_database_path)
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<OrganizioConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: OrganizioConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &OrganizioConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    ensure_parent_dir(path)?;
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join(CONFIG_FILE);
        let config = OrganizioConfig {
            database: Some("/tmp/declutter.db".to_string()),
            log_level: Some("debug".to_string()),
        };

        write_config(&path, &config, false).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), Some(config.clone()));

        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &OrganizioConfig::default(), true).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), Some(OrganizioConfig::default()));
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "database = [").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_database_path_precedence() {
        let config = OrganizioConfig {
            database: Some("from-config.db".to_string()),
            log_level: None,
        };
        let flag = PathBuf::from("from-flag.db");

        assert_eq!(resolve_database_path(Some(&flag), Some(&config)), flag);
        assert_eq!(
            resolve_database_path(None, Some(&config)),
            PathBuf::from("from-config.db")
        );
        assert_eq!(resolve_database_path(None, None), default_database_path());
        assert!(default_database_path().ends_with(Path::new(APP_DIR_NAME).join(DATABASE_FILE)));
    }
}
