//! Application configuration.
//!
//! Values come from an optional TOML file and are then overridden by
//! `SCHOOLMAP_*` environment variables.

use anyhow::{anyhow, Context};
use schoolmap_api::ServerSettings;
use schoolmap_core::{default_log_level, normalize_level, LoggingConfig, DEFAULT_LIMIT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub preview: PreviewSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_level")]
    pub level: String,
    /// Relative paths resolve against the working directory.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default)]
    pub echo_stderr: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_dir: default_log_dir(),
            echo_stderr: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_preview_limit")]
    pub limit: u32,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            limit: default_preview_limit(),
        }
    }
}

fn default_level() -> String {
    default_log_level().to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_preview_limit() -> u32 {
    DEFAULT_LIMIT
}

impl AppConfig {
    /// Loads `path` when given, applies process environment overrides and
    /// validates the result.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Supported variables:
    /// - `SCHOOLMAP_HOST`, `SCHOOLMAP_PORT`
    /// - `SCHOOLMAP_DB_PATH`
    /// - `SCHOOLMAP_LOG_LEVEL`, `SCHOOLMAP_LOG_DIR`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(host) = lookup("SCHOOLMAP_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SCHOOLMAP_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| anyhow!("invalid SCHOOLMAP_PORT value: {port}"))?;
        }
        if let Some(path) = lookup("SCHOOLMAP_DB_PATH") {
            self.storage.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = lookup("SCHOOLMAP_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(dir) = lookup("SCHOOLMAP_LOG_DIR") {
            self.logging.log_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        normalize_level(&self.logging.level).map_err(|err| anyhow!("[logging] {err}"))?;
        if self.preview.base_url.trim().is_empty() {
            return Err(anyhow!("preview.base_url must not be empty"));
        }
        Ok(())
    }

    /// The store path; required by every command that touches the database.
    pub fn db_path(&self) -> anyhow::Result<&Path> {
        self.storage
            .db_path
            .as_deref()
            .ok_or_else(|| anyhow!("storage.db_path is not set (config file or SCHOOLMAP_DB_PATH)"))
    }

    pub fn logging_config(&self) -> anyhow::Result<LoggingConfig> {
        let log_dir = if self.logging.log_dir.is_absolute() {
            self.logging.log_dir.clone()
        } else {
            std::env::current_dir()
                .context("failed to resolve working directory")?
                .join(&self.logging.log_dir)
        };
        Ok(LoggingConfig {
            level: self.logging.level.clone(),
            log_dir,
            echo_stderr: self.logging.echo_stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use std::collections::HashMap;
    use std::path::Path;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn parses_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schoolmap.toml");
        std::fs::write(
            &path,
            r#"
[server]
host = "0.0.0.0"
port = 9000

[storage]
db_path = "/var/lib/schoolmap/schools.db"

[logging]
level = "warn"
log_dir = "/var/log/schoolmap"
echo_stderr = true

[preview]
base_url = "http://maps.internal:9000"
limit = 20
"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.db_path().unwrap(), Path::new("/var/lib/schoolmap/schools.db"));
        assert_eq!(config.logging.level, "warn");
        assert!(config.logging.echo_stderr);
        assert_eq!(config.preview.limit, 20);
        config.validate().unwrap();
    }

    #[test]
    fn empty_file_takes_defaults_but_needs_db_path() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.preview.limit, 100);
        assert_eq!(config.preview.base_url, "http://127.0.0.1:8080");
        assert!(config.db_path().is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config: AppConfig = toml::from_str("[server]\nport = 9000\n").unwrap();
        config
            .apply_overrides(lookup_from(&[
                ("SCHOOLMAP_PORT", "7070"),
                ("SCHOOLMAP_DB_PATH", "/tmp/schools.db"),
                ("SCHOOLMAP_LOG_LEVEL", "trace"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 7070);
        assert_eq!(config.db_path().unwrap(), Path::new("/tmp/schools.db"));
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(lookup_from(&[("SCHOOLMAP_PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("SCHOOLMAP_PORT"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn log_level_aliases_match_the_logger() {
        let mut config = AppConfig::default();
        for level in ["warning", " WARN ", "Debug"] {
            config.logging.level = level.to_string();
            config.validate().unwrap();
        }
    }

    #[test]
    fn relative_log_dir_resolves_to_absolute() {
        let config = AppConfig::default();
        let logging = config.logging_config().unwrap();
        assert!(logging.log_dir.is_absolute());
        assert!(logging.log_dir.ends_with("logs"));
    }
}
