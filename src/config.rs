//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MSGTRIAGE_CONFIG` (environment variable)
//! 2. `~/.config/msgtriage/config.toml` (Linux/macOS)
//!    `%APPDATA%\msgtriage\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Authenticity scoring settings.
    pub scoring: ScoringConfig,
    /// Attachment risk classification settings.
    pub attachments: AttachmentsConfig,
    /// Persistence settings.
    pub database: DatabaseConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
}

/// Authenticity scoring settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Relay domain token that must appear inside the parenthesized details
    /// of a `Received-SPF` annotation for it to count (e.g. `"corp.example"`
    /// matches `Received-SPF: Pass (mx1.corp.example: ...)`).
    ///
    /// When unset, any parenthesized details qualify.
    pub internal_domain: Option<String>,
}

/// Attachment risk classification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentsConfig {
    /// Extensions appended to the built-in risky table, with or without a
    /// leading dot (e.g. `["iso", ".lnk"]`).
    pub extra_risky_extensions: Vec<String>,
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Default SQLite database path for `scan`, overridable with `--db`.
    pub path: PathBuf,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("msgtriage.db"),
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    // 1. Environment variable override
    if let Ok(env_path) = std::env::var("MSGTRIAGE_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    // 2. Standard config directory
    dirs::config_dir().map(|d| d.join("msgtriage").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("msgtriage")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("msgtriage.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert!(cfg.scoring.internal_domain.is_none());
        assert!(cfg.attachments.extra_risky_extensions.is_empty());
        assert_eq!(cfg.database.path, PathBuf::from("msgtriage.db"));
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.general.log_level, cfg.general.log_level);
        assert_eq!(parsed.database.path, cfg.database.path);
    }

    #[test]
    fn test_save_and_reload_via_env_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::env::set_var("MSGTRIAGE_CONFIG", &path);

        let mut cfg = Config::default();
        cfg.scoring.internal_domain = Some("corp.example".to_string());
        save_config(&cfg).expect("save");
        let reloaded = load_config();
        std::env::remove_var("MSGTRIAGE_CONFIG");

        assert_eq!(
            reloaded.scoring.internal_domain.as_deref(),
            Some("corp.example")
        );
    }

    #[test]
    fn test_cache_dir_override_controls_log_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cfg = Config::default();
        cfg.general.cache_dir = Some(dir.path().to_path_buf());
        assert_eq!(cache_dir(&cfg), dir.path());
        assert_eq!(log_file_path(&cfg), dir.path().join("msgtriage.log"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[scoring]
internal_domain = "corp.example"

[attachments]
extra_risky_extensions = ["iso", ".lnk"]
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.scoring.internal_domain.as_deref(), Some("corp.example"));
        assert_eq!(cfg.attachments.extra_risky_extensions.len(), 2);
        // Other fields use defaults
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.database.path, PathBuf::from("msgtriage.db"));
    }
}
