//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILCASES_CONFIG` (environment variable)
//! 2. `~/.config/mailcases/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailcases\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cluster::engine::DEFAULT_MAX_DAYS;
use crate::model::label::{DECLINED_CODE, INTERNAL_CODE};
use crate::model::record::DEFAULT_DATE_FORMAT;
use crate::stats::evaluation::ScoreWeights;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Case grouping settings.
    pub clustering: ClusteringConfig,
    /// Detected-label conventions.
    pub labels: LabelsConfig,
    /// Export defaults.
    pub export: ExportConfig,
    /// Practitioner evaluation weights.
    pub evaluation: ScoreWeights,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Case grouping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Maximum day distance for the actor-proximity fallback.
    pub max_days: i64,
    /// `strftime` format of the `Datetime` column, reused for exported dates.
    pub date_format: String,
}

/// Detected-label conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    /// Code that marks a case as declined.
    pub declined_code: u32,
    /// Code forced onto same-domain messages.
    pub internal_code: u32,
    /// Apply the same-domain rule after importing labels.
    pub mark_internal: bool,
}

/// Export defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Default output directory.
    pub output_dir: Option<PathBuf>,
    /// Field separator for input and output tables.
    pub csv_separator: char,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            max_days: DEFAULT_MAX_DAYS,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            declined_code: DECLINED_CODE,
            internal_code: INTERNAL_CODE,
            mark_internal: true,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            csv_separator: ';',
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
    if let Ok(env_path) = std::env::var("MAILCASES_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mailcases").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailcases")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.clustering.max_days, 14);
        assert_eq!(cfg.clustering.date_format, "%Y-%m-%d %H:%M:%S");
        assert_eq!(cfg.labels.declined_code, 2);
        assert_eq!(cfg.labels.internal_code, 3);
        assert_eq!(cfg.export.csv_separator, ';');
        assert_eq!(cfg.evaluation.messages, 0.65);
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.clustering.max_days, cfg.clustering.max_days);
        assert_eq!(parsed.export.csv_separator, cfg.export.csv_separator);
        assert_eq!(parsed.evaluation, cfg.evaluation);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[clustering]
max_days = 7

[evaluation]
duration = 0.1
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.clustering.max_days, 7);
        assert_eq!(cfg.evaluation.duration, 0.1);
        // Other fields use defaults
        assert_eq!(cfg.clustering.date_format, DEFAULT_DATE_FORMAT);
        assert_eq!(cfg.evaluation.headcount, 0.2);
        assert!(cfg.labels.mark_internal);
    }

    #[test]
    fn test_cache_dir_override() {
        let mut cfg = Config::default();
        cfg.general.cache_dir = Some(PathBuf::from("/tmp/mc-cache"));
        assert_eq!(cache_dir(&cfg), PathBuf::from("/tmp/mc-cache"));
    }
}
