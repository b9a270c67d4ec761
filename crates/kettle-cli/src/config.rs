//! Configuration file management for kettle.
//!
//! Provides a TOML-based config file at `~/.config/kettle/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use kettle_core::llm::{GEMINI_API_KEY_ENV, GeminiModel};
use kettle_db::config::DbConfig;

/// Environment variable overriding the generation model.
pub const MODEL_ENV: &str = "KETTLE_MODEL";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub model: ModelSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: DbConfig::DEFAULT_URL.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ModelSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Generation model; automatic selection when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Model used by `kettle parse`; the backend default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the kettle config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/kettle` or `~/.config/kettle`,
/// also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("kettle");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("kettle")
}

/// Return the path to the kettle config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(config, &config_path())
}

pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // The file may hold an API key.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolved database configuration.
///
/// `cli_db_url` > `KETTLE_DATABASE_URL` > `config_file.database.url` >
/// `DbConfig::DEFAULT_URL`.
pub fn resolve_db(cli_db_url: Option<&str>) -> DbConfig {
    resolve_db_with(cli_db_url, load_config().ok().as_ref())
}

fn resolve_db_with(cli_db_url: Option<&str>, file: Option<&ConfigFile>) -> DbConfig {
    let db_url = if let Some(url) = cli_db_url {
        url.to_string()
    } else if let Some(url) = env_value(DbConfig::ENV_VAR) {
        url
    } else if let Some(cfg) = file {
        cfg.database.url.clone()
    } else {
        DbConfig::DEFAULT_URL.to_string()
    };
    DbConfig::new(db_url)
}

/// Fully resolved model configuration, ready for use.
#[derive(Debug)]
pub struct ModelConfig {
    pub api_key: String,
    /// Generation model override; `None` selects per profile.
    pub model: Option<String>,
    pub parse_model: Option<String>,
    pub base_url: Option<String>,
}

impl ModelConfig {
    /// Resolve using the chain: CLI flag > env var > config file.
    ///
    /// - API key: `GEMINI_API_KEY` > `config_file.model.api_key` > error
    /// - Model: `cli_model` > `KETTLE_MODEL` > `config_file.model.model` > automatic
    pub fn resolve(cli_model: Option<&str>) -> Result<Self> {
        Self::resolve_with(cli_model, load_config().ok().as_ref())
    }

    fn resolve_with(cli_model: Option<&str>, file: Option<&ConfigFile>) -> Result<Self> {
        let section = file.map(|f| &f.model);

        let api_key = if let Some(key) = env_value(GEMINI_API_KEY_ENV) {
            key
        } else if let Some(key) = section.and_then(|s| s.api_key.clone()) {
            key
        } else {
            bail!(
                "model API key not found; set {GEMINI_API_KEY_ENV} or run `kettle init --api-key ...`"
            );
        };

        let model = cli_model
            .map(str::to_owned)
            .or_else(|| env_value(MODEL_ENV))
            .or_else(|| section.and_then(|s| s.model.clone()));

        Ok(Self {
            api_key,
            model,
            parse_model: section.and_then(|s| s.parse_model.clone()),
            base_url: section.and_then(|s| s.base_url.clone()),
        })
    }

    /// Build the HTTP client for this configuration.
    pub fn client(&self) -> GeminiModel {
        let client = GeminiModel::new(self.api_key.clone());
        match &self.base_url {
            Some(url) => client.with_base_url(url.clone()),
            None => client,
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
